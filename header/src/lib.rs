pub mod head;
pub mod header;
pub mod interfaces;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod headertest;

pub use head::{HeadOption, HeadParams};
pub use header::{age, verify, verify_range, Header, ValidationError, VerifyError, CLOCK_DRIFT};
pub use interfaces::{
    Exchange, ExchangeError, Store, StoreError, Subscriber, Subscription, SubscriptionError,
    Verifier,
};
pub use types::Hash;
pub use libp2p::gossipsub::MessageAcceptance;

#[cfg(test)]
mod tests;
