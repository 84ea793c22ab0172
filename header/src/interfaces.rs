/// Collaborator contracts consumed by the syncer.
///
/// - **Store**: persisted, append-only, gap-free chain of headers
/// - **Exchange**: request/response access to headers held by peers
/// - **Subscriber**: gossip topic delivering validated headers
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use libp2p::gossipsub::MessageAcceptance;
use thiserror::Error;

use crate::header::{Header, VerifyError};
use crate::head::HeadOption;
use crate::types::Hash;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store has no head")]
    NoHead,
    #[error("header not found")]
    NotFound,
    #[error("non-adjacent header: head is at {head}, attempted {attempted}")]
    NonAdjacent { head: u64, attempted: u64 },
    #[error("header at height {height} does not link to its predecessor")]
    BrokenLink { height: u64 },
    #[error("store is already initialized")]
    AlreadyInitialized,
    #[error(transparent)]
    Verify(#[from] VerifyError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    #[error("no peers available")]
    NoPeers,
    #[error("request timed out")]
    Timeout,
    #[error("header not found")]
    NotFound,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Verify(#[from] VerifyError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    #[error("subscription closed")]
    Closed,
}

/// Persisted chain of headers.
#[async_trait]
pub trait Store<H: Header>: Send + Sync {
    /// Highest stored header. Fails with [`StoreError::NoHead`] when uninitialized.
    async fn head(&self) -> Result<H, StoreError>;

    async fn get(&self, hash: &Hash) -> Result<H, StoreError>;

    async fn get_by_height(&self, height: u64) -> Result<H, StoreError>;

    async fn has(&self, hash: &Hash) -> bool;

    /// Height of the head, zero when uninitialized.
    async fn height(&self) -> u64;

    /// Appends a contiguous batch on top of the head. All or nothing.
    async fn append(&self, headers: Vec<H>) -> Result<(), StoreError>;

    /// One-time bootstrap with a trusted header.
    async fn init(&self, header: H) -> Result<(), StoreError>;
}

/// Request/response access to headers held by remote peers.
#[async_trait]
pub trait Exchange<H: Header>: Send + Sync {
    async fn head(&self, options: &[HeadOption]) -> Result<H, ExchangeError>;

    async fn get(&self, hash: &Hash) -> Result<H, ExchangeError>;

    async fn get_by_height(&self, height: u64) -> Result<H, ExchangeError>;

    async fn get_range_by_height(&self, from: u64, amount: u64) -> Result<Vec<H>, ExchangeError>;

    /// Headers `from.height() + 1 ..= from.height() + amount`, verified to chain from `from`.
    async fn get_verified_range(&self, from: &H, amount: u64) -> Result<Vec<H>, ExchangeError>;
}

/// Topic validator invoked for every received gossip header.
pub type Verifier<H> = Arc<dyn Fn(H) -> BoxFuture<'static, MessageAcceptance> + Send + Sync>;

/// Gossip topic of headers.
pub trait Subscriber<H: Header>: Send + Sync {
    fn subscribe(&self) -> Result<Box<dyn Subscription<H>>, SubscriptionError>;

    /// Registers the validator deciding Accept/Reject/Ignore for incoming headers,
    /// replacing any previous one.
    fn set_verifier(&self, verifier: Verifier<H>) -> Result<(), SubscriptionError>;
}

#[async_trait]
pub trait Subscription<H: Header>: Send {
    /// Next validated header, blocking until one arrives.
    async fn next_header(&mut self) -> Result<H, SubscriptionError>;

    fn cancel(&mut self);
}
