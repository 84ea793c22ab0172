use std::time::Duration;

use rstest::rstest;

use crate::{
    Parameters, ParametersError, DEFAULT_BLOCK_TIME, DEFAULT_MAX_REQUEST_SIZE,
    DEFAULT_TRUSTING_PERIOD,
};

#[test]
fn test_defaults() {
    let params = Parameters::default();
    assert_eq!(params.block_time, DEFAULT_BLOCK_TIME);
    assert_eq!(params.trusting_period, DEFAULT_TRUSTING_PERIOD);
    assert_eq!(params.max_request_size, DEFAULT_MAX_REQUEST_SIZE);
    assert_eq!(params.validate(), Ok(()));
}

#[test]
fn test_builders_override_defaults() {
    let params = Parameters::default()
        .with_block_time(Duration::from_millis(250))
        .with_trusting_period(Duration::from_secs(3600))
        .with_max_request_size(64);

    assert_eq!(params.block_time, Duration::from_millis(250));
    assert_eq!(params.trusting_period, Duration::from_secs(3600));
    assert_eq!(params.max_request_size, 64);
}

#[test]
fn test_recency_threshold_is_one_and_a_half_blocks() {
    let params = Parameters::default().with_block_time(Duration::from_secs(6));
    assert_eq!(params.recency_threshold(), Duration::from_secs(9));
}

#[rstest]
#[case::block_time(Parameters::default().with_block_time(Duration::ZERO), ParametersError::ZeroBlockTime)]
#[case::trusting_period(Parameters::default().with_trusting_period(Duration::ZERO), ParametersError::ZeroTrustingPeriod)]
#[case::request_size(Parameters::default().with_max_request_size(0), ParametersError::ZeroRequestSize)]
fn test_validate_rejects_zero(#[case] params: Parameters, #[case] expected: ParametersError) {
    assert_eq!(params.validate(), Err(expected));
}
