/// Header capability set.
///
/// Every component that syncs, caches or stores headers is written against
/// [`Header`] rather than a concrete header type. Cryptographic rules live in
/// the implementing type; this module only enforces the chain-shape rules
/// shared by every header type.
use std::fmt::Debug;
use std::time::{Duration, SystemTime};

use thiserror::Error;

use crate::types::Hash;

/// Maximum tolerated clock skew for headers claiming a timestamp in the future.
pub const CLOCK_DRIFT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("zero height")]
    ZeroHeight,
    #[error("empty chain id")]
    EmptyChainId,
    #[error("invalid header: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("header failed validation: {0}")]
    Validation(#[from] ValidationError),
    #[error("chain id mismatch: trusted {trusted}, untrusted {untrusted}")]
    ChainIdMismatch { trusted: String, untrusted: String },
    #[error("height {untrusted} is not above trusted height {trusted}")]
    NonIncreasingHeight { trusted: u64, untrusted: u64 },
    #[error("header at height {height} is not newer than its trusted header")]
    NonMonotonicTime { height: u64 },
    #[error("header at height {height} is from the future")]
    FromFuture { height: u64 },
    #[error("header at height {height} does not link to trusted hash {expected}, got {actual}")]
    BrokenLink {
        height: u64,
        expected: Hash,
        actual: Hash,
    },
    #[error("untrusted header at height {height}: {reason}")]
    Untrusted { height: u64, reason: String },
}

/// Capabilities a concrete header type must provide.
pub trait Header: Clone + Debug + Send + Sync + 'static {
    fn hash(&self) -> Hash;

    fn height(&self) -> u64;

    /// Hash of the header at `height() - 1`.
    fn last_header(&self) -> Hash;

    fn time(&self) -> SystemTime;

    fn chain_id(&self) -> &str;

    /// Stateless self-check of the header.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Verifies a non-adjacent `untrusted` header against `self`.
    fn verify(&self, untrusted: &Self) -> Result<(), VerifyError>;

    fn is_zero(&self) -> bool {
        self.hash().is_zero()
    }
}

/// Verifies `untrusted` against the already trusted header.
///
/// Adjacent headers must link by hash. Non-adjacent headers are handed to
/// [`Header::verify`] of the trusted header.
pub fn verify<H: Header>(trusted: &H, untrusted: &H) -> Result<(), VerifyError> {
    untrusted.validate()?;

    if trusted.chain_id() != untrusted.chain_id() {
        return Err(VerifyError::ChainIdMismatch {
            trusted: trusted.chain_id().to_string(),
            untrusted: untrusted.chain_id().to_string(),
        });
    }

    if untrusted.height() <= trusted.height() {
        return Err(VerifyError::NonIncreasingHeight {
            trusted: trusted.height(),
            untrusted: untrusted.height(),
        });
    }

    if untrusted.time() <= trusted.time() {
        return Err(VerifyError::NonMonotonicTime {
            height: untrusted.height(),
        });
    }

    if untrusted.time() > SystemTime::now() + CLOCK_DRIFT {
        return Err(VerifyError::FromFuture {
            height: untrusted.height(),
        });
    }

    if untrusted.height() == trusted.height() + 1 {
        if untrusted.last_header() != trusted.hash() {
            return Err(VerifyError::BrokenLink {
                height: untrusted.height(),
                expected: trusted.hash(),
                actual: untrusted.last_header(),
            });
        }
        return Ok(());
    }

    trusted.verify(untrusted)
}

/// Verifies a contiguous run of headers starting right after `trusted`.
pub fn verify_range<H: Header>(trusted: &H, headers: &[H]) -> Result<(), VerifyError> {
    let mut tip = trusted;
    for header in headers {
        if header.height() != tip.height() + 1 {
            return Err(VerifyError::Untrusted {
                height: header.height(),
                reason: format!("expected height {}", tip.height() + 1),
            });
        }
        verify(tip, header)?;
        tip = header;
    }
    Ok(())
}

/// Age of a header relative to the local clock. Headers from the future have zero age.
pub fn age<H: Header>(header: &H) -> Duration {
    SystemTime::now()
        .duration_since(header.time())
        .unwrap_or_default()
}
