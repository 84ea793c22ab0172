use async_trait::async_trait;
use header::headertest::{DummyHeader, TestSuite};
use header::{Exchange, ExchangeError, Hash, HeadOption, Header, Store, StoreError};
use parking_lot::Mutex;

use crate::{init, InitError, MemStore};

// Mock exchange serving a single known header
struct MockExchange {
    header: Option<DummyHeader>,
    requested: Mutex<Vec<Hash>>,
}

impl MockExchange {
    fn new(header: Option<DummyHeader>) -> Self {
        Self {
            header,
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Exchange<DummyHeader> for MockExchange {
    async fn head(&self, _options: &[HeadOption]) -> Result<DummyHeader, ExchangeError> {
        self.header.clone().ok_or(ExchangeError::NoPeers)
    }

    async fn get(&self, hash: &Hash) -> Result<DummyHeader, ExchangeError> {
        self.requested.lock().push(*hash);
        self.header
            .clone()
            .filter(|h| h.hash() == *hash)
            .ok_or(ExchangeError::NotFound)
    }

    async fn get_by_height(&self, _height: u64) -> Result<DummyHeader, ExchangeError> {
        Err(ExchangeError::NotFound)
    }

    async fn get_range_by_height(
        &self,
        _from: u64,
        _amount: u64,
    ) -> Result<Vec<DummyHeader>, ExchangeError> {
        Err(ExchangeError::NotFound)
    }

    async fn get_verified_range(
        &self,
        _from: &DummyHeader,
        _amount: u64,
    ) -> Result<Vec<DummyHeader>, ExchangeError> {
        Err(ExchangeError::NotFound)
    }
}

#[tokio::test]
async fn test_init_uninitialized_store() {
    let suite = TestSuite::new();
    let trusted = suite.head();
    let store = MemStore::new();
    let exchange = MockExchange::new(Some(trusted.clone()));

    init(&store, &exchange, trusted.hash()).await.expect("init");

    assert_eq!(store.head().await, Ok(trusted.clone()));
    assert_eq!(*exchange.requested.lock(), vec![trusted.hash()]);
}

#[tokio::test]
async fn test_init_is_noop_when_head_exists() {
    let suite = TestSuite::new();
    let store = MemStore::with_head(suite.head());
    let exchange = MockExchange::new(None);

    init(&store, &exchange, Hash([1; 32])).await.expect("init");

    assert!(exchange.requested.lock().is_empty());
    assert_eq!(store.height().await, 1);
}

#[tokio::test]
async fn test_init_propagates_exchange_error() {
    let store = MemStore::<DummyHeader>::new();
    let exchange = MockExchange::new(None);

    let err = init(&store, &exchange, Hash([1; 32])).await.unwrap_err();

    assert_eq!(err, InitError::Exchange(ExchangeError::NotFound));
    assert_eq!(store.head().await, Err(StoreError::NoHead));
}
