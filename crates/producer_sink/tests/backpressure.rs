mod common;

use std::time::{Duration, Instant};

use producer_sink::prelude::*;
use serde_json::json;

use common::{loopback_sink, message};

/// An address nothing is listening on: bind, resolve, release.
fn vacant_endpoint() -> String {
	let (mut sink, endpoint) = loopback_sink("SinkNotAvailable");
	sink.cleanup();
	endpoint
}

#[test]
fn saturated_send_gives_up_after_budget() {
	let endpoint = vacant_endpoint();
	let attempts = 4;
	let delay = Duration::from_millis(50);
	let config = SendConfig::new(&endpoint, "ProducerRetry")
		.with_linger(Duration::ZERO)
		.with_outbound_capacity(1)
		.with_retry(RetryPolicy::fixed(attempts, delay));
	let mut producer = Producer::new(&config).unwrap();
	let msg = message(json!({"identity": "ProducerRetry", "data": "Info from producer 1"}));

	// Fills the single queue slot.
	assert!(producer.send(&msg).unwrap());

	let start = Instant::now();
	let report = producer.send_detailed(&msg).unwrap();
	let elapsed = start.elapsed();

	assert!(!report.delivered);
	assert_eq!(report.attempts, attempts);
	assert!(elapsed >= delay * (attempts - 1), "gave up too early: {elapsed:?}");
	assert!(elapsed < Duration::from_secs(5), "send stalled: {elapsed:?}");

	// The budget is reset for every call.
	let start = Instant::now();
	assert!(!producer.send(&msg).unwrap());
	assert!(start.elapsed() >= delay * (attempts - 1));

	producer.cleanup();
}

#[test]
fn exponential_backoff_stays_bounded() {
	let endpoint = vacant_endpoint();
	let policy = RetryPolicy::exponential(4, Duration::from_millis(10), 2, Duration::from_millis(25));
	let config = SendConfig::new(&endpoint, "ProducerBackoff")
		.with_linger(Duration::ZERO)
		.with_outbound_capacity(1)
		.with_retry(policy);
	let mut producer = Producer::new(&config).unwrap();
	let msg = message(json!({"n": 1}));

	assert!(producer.send(&msg).unwrap());

	let start = Instant::now();
	assert!(!producer.send(&msg).unwrap());
	let elapsed = start.elapsed();
	// 10 + 20 + 25 ms of sleeping.
	assert!(elapsed >= policy.worst_case(), "gave up too early: {elapsed:?}");
	assert!(elapsed < Duration::from_secs(5), "send stalled: {elapsed:?}");
}

#[test]
fn successful_send_uses_one_attempt() {
	let (_sink, endpoint) = loopback_sink("sink");
	let config = SendConfig::new(&endpoint, "producer")
		.with_linger(Duration::ZERO)
		.with_retry(RetryPolicy::fixed(5, Duration::from_secs(10)));
	let mut producer = Producer::new(&config).unwrap();

	let start = Instant::now();
	let report = producer.send_detailed(&message(json!({"fast": true}))).unwrap();
	assert!(report.delivered);
	assert_eq!(report.attempts, 1);
	assert!(start.elapsed() < Duration::from_secs(1));
}
