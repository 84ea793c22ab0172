/// Options for a Head request sent to an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadOption {
    /// Ask the general network for its head instead of going through
    /// subjective initialisation with trusted peers.
    DisableSubjectiveInit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadParams {
    pub disable_subjective_init: bool,
}

impl HeadParams {
    pub fn from_options(options: &[HeadOption]) -> Self {
        let mut params = Self::default();
        for option in options {
            match option {
                HeadOption::DisableSubjectiveInit => params.disable_subjective_init = true,
            }
        }
        params
    }
}
