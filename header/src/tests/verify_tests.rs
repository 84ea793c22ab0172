use std::time::{Duration, SystemTime};

use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::headertest::{DummyHeader, TestSuite};
use crate::{age, verify, verify_range, Hash, Header, ValidationError, VerifyError};

fn chain(amount: usize) -> (DummyHeader, Vec<DummyHeader>) {
    let mut suite = TestSuite::new();
    let head = suite.head();
    (head, suite.gen_dummy_headers(amount))
}

#[test]
fn test_verify_adjacent() {
    let (head, headers) = chain(1);
    assert_eq!(verify(&head, &headers[0]), Ok(()));
}

#[test]
fn test_verify_non_adjacent_delegates_to_header() {
    let (head, headers) = chain(5);
    assert_eq!(verify(&head, &headers[4]), Ok(()));

    let mut bad = headers[4].clone();
    bad.verify_failure = true;
    bad.rehash();
    assert!(matches!(
        verify(&head, &bad),
        Err(VerifyError::Untrusted { height: 6, .. })
    ));
}

#[test]
fn test_verify_broken_link() {
    let (head, headers) = chain(1);
    let mut bad = headers[0].clone();
    bad.previous_hash = Hash([7; 32]);
    bad.rehash();

    assert!(matches!(
        verify(&head, &bad),
        Err(VerifyError::BrokenLink { height: 2, .. })
    ));
}

#[rstest]
#[case(0)]
#[case(1)]
fn test_verify_rejects_non_increasing_height(#[case] offset: u64) {
    let (head, headers) = chain(2);
    let trusted = &headers[1];
    let mut untrusted = head.clone();
    untrusted.height = trusted.height - offset;
    untrusted.time = trusted.time + Duration::from_millis(1);
    untrusted.rehash();

    assert!(matches!(
        verify(trusted, &untrusted),
        Err(VerifyError::NonIncreasingHeight { .. })
    ));
}

#[test]
fn test_verify_rejects_other_chain() {
    let (head, headers) = chain(1);
    let mut other = headers[0].clone();
    other.chain_id = "other-chain".to_string();
    other.rehash();

    assert!(matches!(
        verify(&head, &other),
        Err(VerifyError::ChainIdMismatch { .. })
    ));
}

#[test]
fn test_verify_rejects_header_from_future() {
    let (head, _) = chain(0);
    let future = DummyHeader::new(
        &head.chain_id,
        head.hash(),
        head.height + 1,
        SystemTime::now() + Duration::from_secs(3600),
    );

    assert!(matches!(
        verify(&head, &future),
        Err(VerifyError::FromFuture { height: 2 })
    ));
}

#[test]
fn test_verify_rejects_invalid_header() {
    let (head, headers) = chain(1);
    let mut tampered = headers[0].clone();
    tampered.height = 0;

    assert_eq!(
        verify(&head, &tampered),
        Err(VerifyError::Validation(ValidationError::ZeroHeight))
    );
}

#[test]
fn test_verify_range() {
    let (head, headers) = chain(10);
    assert_eq!(verify_range(&head, &headers), Ok(()));
    assert_eq!(verify_range(&head, &[]), Ok(()));
}

#[test]
fn test_verify_range_rejects_gap() {
    let (head, mut headers) = chain(10);
    headers.remove(3);

    assert!(matches!(
        verify_range(&head, &headers),
        Err(VerifyError::Untrusted { height: 6, .. })
    ));
}

#[test]
fn test_age() {
    let suite = TestSuite::with_genesis_age(Duration::from_secs(3600));
    let head_age = age(&suite.head());
    assert!(head_age >= Duration::from_secs(3600));
    assert!(head_age < Duration::from_secs(3700));

    let mut future = suite.head();
    future.time = SystemTime::now() + Duration::from_secs(60);
    assert_eq!(age(&future), Duration::ZERO);
}
