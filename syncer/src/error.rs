use header::{ExchangeError, StoreError, SubscriptionError, VerifyError};
use thiserror::Error;

use crate::options::ParametersError;
use crate::states::SyncState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error(transparent)]
    Verify(#[from] VerifyError),
    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
    #[error(transparent)]
    Parameters(#[from] ParametersError),
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidTransition { from: SyncState, to: SyncState },
    #[error("exchange returned no headers from height {from}")]
    EmptyResponse { from: u64 },
    #[error("sync cancelled")]
    Cancelled,
}
