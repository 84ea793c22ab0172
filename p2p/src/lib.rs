pub mod local;
pub mod subscription;
pub mod topic;

pub use local::{LocalExchange, MAX_RANGE_REQUEST_SIZE};
pub use subscription::{GossipSubscriber, GossipSubscription};
pub use topic::HeaderTopic;

#[cfg(test)]
mod tests;
