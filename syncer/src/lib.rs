//! Header synchronization for light clients.
//!
//! Keeps a verified, gap-free, height-ordered chain of headers in a
//! [`header::Store`] by combining three sources:
//!
//! - **Store**: the locally trusted (subjective) head
//! - **Exchange**: request/response fetches that close gaps
//! - **Gossip**: newly produced headers, which become sync targets
//!
//! ## Architecture
//!
//! 1. Gossip headers enter through [`Syncer::incoming_network_head`]
//! 2. The first caller to claim a height wins; duplicates are ignored
//! 3. Accepted headers become the sync target and are cached in [`Ranges`]
//! 4. The catch-up loop commits cached runs directly and fetches the gaps
//!    between them from the exchange
//! 5. Headers reach the store strictly in ascending, contiguous order
pub mod config;
pub mod error;
pub mod options;
pub mod ranges;
pub mod states;
mod sync_head;
pub mod syncer;

pub use config::*;
pub use error::SyncError;
pub use options::{Parameters, ParametersError};
pub use ranges::{Range, Ranges};
pub use states::SyncState;
pub use syncer::{SyncReport, Syncer};

#[cfg(test)]
mod tests;
