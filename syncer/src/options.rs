use std::time::Duration;

use thiserror::Error;

use crate::config::{DEFAULT_BLOCK_TIME, DEFAULT_MAX_REQUEST_SIZE, DEFAULT_TRUSTING_PERIOD};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParametersError {
    #[error("block time must be positive")]
    ZeroBlockTime,
    #[error("trusting period must be positive")]
    ZeroTrustingPeriod,
    #[error("max request size must be positive")]
    ZeroRequestSize,
}

/// Syncer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameters {
    /// Expected time between blocks. Sets the cadence at which the sync
    /// target is recomputed and how old a subjective head may be before a
    /// network head is requested.
    pub block_time: Duration,

    /// Maximum age of a subjective head that still allows requesting the
    /// network head without subjective initialisation.
    pub trusting_period: Duration,

    pub max_request_size: u64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            block_time: DEFAULT_BLOCK_TIME,
            trusting_period: DEFAULT_TRUSTING_PERIOD,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
        }
    }
}

impl Parameters {
    pub fn with_block_time(mut self, block_time: Duration) -> Self {
        self.block_time = block_time;
        self
    }

    pub fn with_trusting_period(mut self, trusting_period: Duration) -> Self {
        self.trusting_period = trusting_period;
        self
    }

    pub fn with_max_request_size(mut self, max_request_size: u64) -> Self {
        self.max_request_size = max_request_size;
        self
    }

    pub fn validate(&self) -> Result<(), ParametersError> {
        if self.block_time.is_zero() {
            return Err(ParametersError::ZeroBlockTime);
        }
        if self.trusting_period.is_zero() {
            return Err(ParametersError::ZeroTrustingPeriod);
        }
        if self.max_request_size == 0 {
            return Err(ParametersError::ZeroRequestSize);
        }
        Ok(())
    }

    /// Age up to which the subjective head is considered the network head.
    pub fn recency_threshold(&self) -> Duration {
        self.block_time + self.block_time / 2
    }
}
