//! Sending half: outbound queue limit and the bounded-retry enqueue loop.

use std::thread;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::config::SendConfig;
use crate::context::Context;
use crate::endpoint::{Endpoint, Role};
use crate::error::Result;
use crate::message::{self, Message};
use crate::peer::SendReport;
use crate::retry::RetryPolicy;

pub(crate) struct PushPeer {
	pub(crate) endpoint: Endpoint,
	retry: RetryPolicy,
}

impl PushPeer {
	pub(crate) fn create(peer: &'static str, config: &SendConfig, context: Option<&Context>) -> Result<Self> {
		let endpoint = Endpoint::create(peer, &config.peer, Role::Send, context)?;
		endpoint
			.socket()?
			.set_sndhwm(i32::try_from(config.outbound_capacity).unwrap_or(i32::MAX))?;

		Ok(Self {
			endpoint,
			retry: config.retry,
		})
	}

	/// Enqueues `message` without ever blocking on a full queue.
	///
	/// A full queue costs one unit of the retry budget and a pause; the send
	/// gives up once the budget is spent. Each attempt enqueues the whole
	/// frame or nothing.
	pub(crate) fn send(&self, message: &Message) -> Result<SendReport> {
		let socket = self.endpoint.socket()?;
		let frame = message::encode(message)?;
		let mut budget = self.retry.budget();

		loop {
			match socket.send(&frame[..], zmq::DONTWAIT) {
				Ok(()) => {
					let attempts = budget.failures() + 1;
					trace!(
						peer = %self.endpoint.identity(),
						address = %self.endpoint.address(),
						bytes = frame.len(),
						attempts,
						"message enqueued"
					);
					return Ok(SendReport {
						delivered: true,
						attempts,
					});
				}
				Err(zmq::Error::EAGAIN) => match budget.on_failure() {
					Some(delay) => {
						debug!(
							peer = %self.endpoint.identity(),
							address = %self.endpoint.address(),
							failures = budget.failures(),
							delay_ms = saturating_millis(delay),
							"outbound queue full, retrying"
						);
						thread::sleep(delay);
					}
					None => {
						warn!(
							peer = %self.endpoint.identity(),
							address = %self.endpoint.address(),
							attempts = budget.failures(),
							"retry budget exhausted, message not sent"
						);
						return Ok(SendReport {
							delivered: false,
							attempts: budget.failures(),
						});
					}
				},
				Err(e) => return Err(e.into()),
			}
		}
	}
}

/// Whole milliseconds in `delay`, saturating instead of wrapping.
fn saturating_millis(delay: Duration) -> u64 {
	u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}
