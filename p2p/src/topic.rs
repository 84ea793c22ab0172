/// Header gossip topic.
///
/// ## Topic Format
///
/// ```text
/// /{network}/header-sub/{version}
///
/// Example: /devnet/header-sub/v0.0.1
/// ```
///
/// Peers on different networks never share a topic, so headers of one
/// chain are never validated against another.
use libp2p::gossipsub::{IdentTopic, TopicHash};

/// Topic name for header messages.
pub const HEADER_TOPIC: &str = "header-sub";

/// Protocol version suffix.
pub const HEADER_TOPIC_VERSION: &str = "v0.0.1";

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct HeaderTopic {
    /// Network identifier, e.g. `devnet`.
    pub network: String,
}

impl HeaderTopic {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
        }
    }

    /// Parse a topic string into a HeaderTopic.
    ///
    /// # Errors
    ///
    /// Returns an error if the topic string is malformed
    pub fn from_string(topic_str: &str) -> Result<Self, String> {
        let parts: Vec<&str> = topic_str.split('/').collect();
        let [empty, network, name, version] = parts.as_slice() else {
            return Err(format!("Invalid topic format: '{topic_str}'"));
        };

        if !empty.is_empty() || network.is_empty() {
            return Err(format!("Invalid topic format: '{topic_str}'"));
        }

        if *name != HEADER_TOPIC {
            return Err(format!("Unknown topic: '{name}'"));
        }

        if *version != HEADER_TOPIC_VERSION {
            return Err(format!(
                "Invalid version: expected '{HEADER_TOPIC_VERSION}', got '{version}'"
            ));
        }

        Ok(Self::new(*network))
    }

    pub fn hash(&self) -> TopicHash {
        IdentTopic::from(self.clone()).hash()
    }
}

impl std::fmt::Display for HeaderTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}/{HEADER_TOPIC}/{HEADER_TOPIC_VERSION}", self.network)
    }
}

impl From<HeaderTopic> for IdentTopic {
    fn from(topic: HeaderTopic) -> IdentTopic {
        IdentTopic::new(topic.to_string())
    }
}
