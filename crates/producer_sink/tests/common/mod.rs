#![allow(dead_code)]

use std::time::{Duration, Instant};

use producer_sink::prelude::*;

/// Binds a sink on an ephemeral loopback port and returns it with the
/// address producers should connect to.
pub fn loopback_sink(identity: &str) -> (Sink, String) {
	let config = ReceiveConfig::new("tcp://127.0.0.1:*", identity).with_linger(Duration::ZERO);
	let sink = Sink::new(&config).expect("bind loopback sink");
	let endpoint = sink.last_endpoint().expect("resolve bound endpoint");
	(sink, endpoint)
}

pub fn producer_config(address: &str, identity: &str) -> SendConfig {
	SendConfig::new(address, identity).with_linger(Duration::from_secs(1))
}

/// Polls `sink` until a message arrives or `deadline` elapses.
pub fn receive_within(sink: &mut Sink, deadline: Duration) -> Option<Message> {
	let start = Instant::now();
	while start.elapsed() < deadline {
		if let Some(msg) = sink.receive().expect("receive") {
			return Some(msg);
		}
	}
	None
}

pub fn message(value: serde_json::Value) -> Message {
	producer_sink::message::to_message(&value).expect("object literal")
}
