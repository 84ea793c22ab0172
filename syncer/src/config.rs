/// Syncer operational constants: request sizes, timeouts and retry limits.
use std::time::Duration;

/// Default estimate of the chain's block time.
pub const DEFAULT_BLOCK_TIME: Duration = Duration::from_secs(6);

/// Default window within which a subjective head is trusted (one week).
pub const DEFAULT_TRUSTING_PERIOD: Duration = Duration::from_secs(168 * 60 * 60);

/// Maximum headers requested from the exchange or committed in one batch.
pub const DEFAULT_MAX_REQUEST_SIZE: u64 = 512;

/// Deadline for a single Head request to the exchange.
pub const HEAD_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Lower bound for the sync loop tick, regardless of the configured block time.
pub const MIN_SYNC_INTERVAL: Duration = Duration::from_millis(10);

/// First delay after a failed catch-up batch.
pub const RETRY_BACKOFF_MIN: Duration = Duration::from_millis(100);

/// Upper bound for the exponential retry delay.
pub const RETRY_BACKOFF_MAX: Duration = Duration::from_secs(10);
