/// Deterministic header fixtures for tests and local simulations.
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::header::{Header, ValidationError, VerifyError};
use crate::interfaces::{Subscriber, Subscription, SubscriptionError, Verifier};
use crate::types::Hash;

pub const DUMMY_CHAIN_ID: &str = "dummy-chain";

/// Spacing between consecutive generated headers.
pub const DUMMY_BLOCK_TIME: Duration = Duration::from_millis(100);

pub const DEFAULT_GENESIS_AGE: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyHeader {
    pub chain_id: String,
    pub previous_hash: Hash,
    pub height: u64,
    pub time: SystemTime,
    /// Makes non-adjacent verification against this header fail.
    pub verify_failure: bool,
    hash: Hash,
}

impl DummyHeader {
    pub fn new(chain_id: &str, previous_hash: Hash, height: u64, time: SystemTime) -> Self {
        let mut header = Self {
            chain_id: chain_id.to_string(),
            previous_hash,
            height,
            time,
            verify_failure: false,
            hash: Hash::ZERO,
        };
        header.hash = header.compute_hash();
        header
    }

    /// Recomputes the hash after fields were changed by hand.
    pub fn rehash(&mut self) {
        self.hash = self.compute_hash();
    }

    fn compute_hash(&self) -> Hash {
        let nanos = self
            .time
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();

        let mut hasher = Sha256::new();
        hasher.update(self.chain_id.as_bytes());
        hasher.update(self.height.to_be_bytes());
        hasher.update(self.previous_hash.as_bytes());
        hasher.update(nanos.to_be_bytes());
        hasher.update([self.verify_failure as u8]);
        Hash(hasher.finalize().into())
    }
}

impl Header for DummyHeader {
    fn hash(&self) -> Hash {
        self.hash
    }

    fn height(&self) -> u64 {
        self.height
    }

    fn last_header(&self) -> Hash {
        self.previous_hash
    }

    fn time(&self) -> SystemTime {
        self.time
    }

    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.height == 0 {
            return Err(ValidationError::ZeroHeight);
        }
        if self.chain_id.is_empty() {
            return Err(ValidationError::EmptyChainId);
        }
        if self.hash != self.compute_hash() {
            return Err(ValidationError::Invalid("hash mismatch".to_string()));
        }
        Ok(())
    }

    fn verify(&self, untrusted: &Self) -> Result<(), VerifyError> {
        if untrusted.verify_failure {
            return Err(VerifyError::Untrusted {
                height: untrusted.height,
                reason: "dummy verification failure".to_string(),
            });
        }
        Ok(())
    }
}

/// Generator of a single linear chain of [`DummyHeader`]s.
#[derive(Debug, Clone)]
pub struct TestSuite {
    head: DummyHeader,
}

impl Default for TestSuite {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSuite {
    pub fn new() -> Self {
        Self::with_genesis_age(DEFAULT_GENESIS_AGE)
    }

    /// Starts the chain with a genesis header timestamped `age` ago.
    pub fn with_genesis_age(age: Duration) -> Self {
        let time = SystemTime::now() - age;
        Self {
            head: DummyHeader::new(DUMMY_CHAIN_ID, Hash::ZERO, 1, time),
        }
    }

    pub fn head(&self) -> DummyHeader {
        self.head.clone()
    }

    pub fn next_header(&mut self) -> DummyHeader {
        let next = DummyHeader::new(
            DUMMY_CHAIN_ID,
            self.head.hash(),
            self.head.height + 1,
            self.head.time + DUMMY_BLOCK_TIME,
        );
        self.head = next.clone();
        next
    }

    pub fn gen_dummy_headers(&mut self, amount: usize) -> Vec<DummyHeader> {
        (0..amount).map(|_| self.next_header()).collect()
    }
}

/// Subscriber that records the verifier and never delivers headers.
#[derive(Default)]
pub struct DummySubscriber {
    verifier: Mutex<Option<Verifier<DummyHeader>>>,
}

impl DummySubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verifier(&self) -> Option<Verifier<DummyHeader>> {
        self.verifier.lock().clone()
    }
}

impl Subscriber<DummyHeader> for DummySubscriber {
    fn subscribe(&self) -> Result<Box<dyn Subscription<DummyHeader>>, SubscriptionError> {
        Ok(Box::new(DummySubscription))
    }

    fn set_verifier(&self, verifier: Verifier<DummyHeader>) -> Result<(), SubscriptionError> {
        *self.verifier.lock() = Some(verifier);
        Ok(())
    }
}

pub struct DummySubscription;

#[async_trait]
impl Subscription<DummyHeader> for DummySubscription {
    async fn next_header(&mut self) -> Result<DummyHeader, SubscriptionError> {
        futures::future::pending().await
    }

    fn cancel(&mut self) {}
}
