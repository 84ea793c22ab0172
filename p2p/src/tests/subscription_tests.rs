use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::FutureExt;
use header::headertest::{DummyHeader, TestSuite};
use header::{MessageAcceptance, Subscriber, Subscription, SubscriptionError, Verifier};
use libp2p_identity::PeerId;

use crate::{GossipSubscriber, HeaderTopic};

fn subscriber() -> GossipSubscriber<DummyHeader> {
    GossipSubscriber::new(HeaderTopic::new("test"))
}

#[tokio::test]
async fn test_accepted_header_reaches_subscription() {
    let gossip = subscriber();
    let mut sub = gossip.subscribe().expect("subscribe");

    let mut suite = TestSuite::new();
    let header = suite.next_header();

    let result = gossip.deliver(PeerId::random(), header.clone()).await;
    assert!(matches!(result, MessageAcceptance::Accept));
    assert_eq!(sub.next_header().await, Ok(header));
}

#[tokio::test]
async fn test_invalid_header_rejected_before_verifier() {
    let gossip = subscriber();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let verifier: Verifier<DummyHeader> = Arc::new(move |_header: DummyHeader| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { MessageAcceptance::Accept }.boxed()
    });
    gossip.set_verifier(verifier).expect("set verifier");

    let mut suite = TestSuite::new();
    let mut header = suite.next_header();
    header.height = 0;

    let result = gossip.deliver(PeerId::random(), header).await;
    assert!(matches!(result, MessageAcceptance::Reject));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_ignored_header_not_delivered() {
    let gossip = subscriber();
    let verifier: Verifier<DummyHeader> =
        Arc::new(|_header: DummyHeader| async { MessageAcceptance::Ignore }.boxed());
    gossip.set_verifier(verifier).expect("set verifier");

    let mut sub = gossip.subscribe().expect("subscribe");
    let mut suite = TestSuite::new();
    let ignored = suite.next_header();

    let result = gossip.deliver(PeerId::random(), ignored).await;
    assert!(matches!(result, MessageAcceptance::Ignore));

    // Replace the verifier and check only the later header arrives
    let verifier: Verifier<DummyHeader> =
        Arc::new(|_header: DummyHeader| async { MessageAcceptance::Accept }.boxed());
    gossip.set_verifier(verifier).expect("set verifier");
    let accepted = suite.next_header();
    gossip.deliver(PeerId::random(), accepted.clone()).await;

    assert_eq!(sub.next_header().await, Ok(accepted));
}

#[tokio::test]
async fn test_cancelled_subscription_is_closed() {
    let gossip = subscriber();
    let mut sub = gossip.subscribe().expect("subscribe");
    sub.cancel();

    assert_eq!(sub.next_header().await, Err(SubscriptionError::Closed));
}

#[tokio::test]
async fn test_dropped_topic_closes_subscription() {
    let gossip = subscriber();
    let mut sub = gossip.subscribe().expect("subscribe");
    drop(gossip);

    assert_eq!(sub.next_header().await, Err(SubscriptionError::Closed));
}
