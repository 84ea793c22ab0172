use rstest::rstest;

use crate::topic::{HeaderTopic, HEADER_TOPIC, HEADER_TOPIC_VERSION};

#[test]
fn test_topic_string_format() {
    let topic = HeaderTopic::new("devnet");
    assert_eq!(topic.to_string(), "/devnet/header-sub/v0.0.1");
}

#[test]
fn test_topic_roundtrip() {
    let topic = HeaderTopic::new("mocha");
    let parsed = HeaderTopic::from_string(&topic.to_string()).expect("valid topic");
    assert_eq!(parsed, topic);
    assert_eq!(parsed.hash(), topic.hash());
}

#[rstest]
#[case("devnet/header-sub/v0.0.1")]
#[case("//header-sub/v0.0.1")]
#[case("/devnet/block/v0.0.1")]
#[case("/devnet/header-sub/v9")]
#[case("/devnet/header-sub")]
fn test_invalid_topics(#[case] topic: &str) {
    assert!(HeaderTopic::from_string(topic).is_err());
}

#[test]
fn test_topic_constants() {
    assert_eq!(HEADER_TOPIC, "header-sub");
    assert_eq!(HEADER_TOPIC_VERSION, "v0.0.1");
}
