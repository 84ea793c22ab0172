use header::headertest::TestSuite;
use header::{Hash, Header, Store, StoreError};

use crate::MemStore;

#[tokio::test]
async fn test_uninitialized_store_has_no_head() {
    let store = MemStore::<header::headertest::DummyHeader>::new();
    assert_eq!(store.head().await, Err(StoreError::NoHead));
    assert_eq!(store.height().await, 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_append_contiguous_batch() {
    let mut suite = TestSuite::new();
    let store = MemStore::with_head(suite.head());

    let headers = suite.gen_dummy_headers(10);
    store.append(headers.clone()).await.expect("append");

    assert_eq!(store.height().await, 11);
    assert_eq!(store.head().await, Ok(headers[9].clone()));
    assert_eq!(store.get(&headers[4].hash()).await, Ok(headers[4].clone()));
    assert_eq!(store.get_by_height(3).await, Ok(headers[1].clone()));
    assert!(store.has(&headers[0].hash()).await);
    assert_eq!(store.len(), 11);
}

#[tokio::test]
async fn test_append_rejects_gap_without_partial_commit() {
    let mut suite = TestSuite::new();
    let store = MemStore::with_head(suite.head());

    let mut headers = suite.gen_dummy_headers(5);
    headers.remove(2);

    assert_eq!(
        store.append(headers).await,
        Err(StoreError::NonAdjacent { head: 3, attempted: 5 })
    );
    assert_eq!(store.height().await, 1);
}

#[tokio::test]
async fn test_append_rejects_broken_link() {
    let mut suite = TestSuite::new();
    let store = MemStore::with_head(suite.head());

    let mut header = suite.next_header();
    header.previous_hash = Hash([9; 32]);
    header.rehash();

    assert_eq!(
        store.append(vec![header]).await,
        Err(StoreError::BrokenLink { height: 2 })
    );
}

#[tokio::test]
async fn test_append_to_uninitialized_store() {
    let mut suite = TestSuite::new();
    let store = MemStore::new();

    assert_eq!(
        store.append(suite.gen_dummy_headers(1)).await,
        Err(StoreError::NoHead)
    );
    assert_eq!(store.append(Vec::new()).await, Ok(()));
}

#[tokio::test]
async fn test_init_once() {
    let suite = TestSuite::new();
    let store = MemStore::new();

    store.init(suite.head()).await.expect("init");
    assert_eq!(store.head().await, Ok(suite.head()));
    assert_eq!(
        store.init(suite.head()).await,
        Err(StoreError::AlreadyInitialized)
    );
}

#[tokio::test]
async fn test_get_range_stops_at_head() {
    let mut suite = TestSuite::new();
    let store = MemStore::with_head(suite.head());
    store.append(suite.gen_dummy_headers(4)).await.expect("append");

    let range = store.get_range(2, 10);
    let heights: Vec<u64> = range.iter().map(Header::height).collect();
    assert_eq!(heights, vec![2, 3, 4, 5]);
}
