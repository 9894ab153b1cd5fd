//! Receiving half: poll for readability, then decode one frame.

use std::time::Duration;

use tracing::{trace, warn};

use crate::config::ReceiveConfig;
use crate::context::Context;
use crate::endpoint::{Endpoint, Role};
use crate::error::Result;
use crate::message::{self, Message};

/// Bounded wait for inbound readiness on a single socket.
#[derive(Debug, Clone, Copy)]
struct Poller {
	events: zmq::PollEvents,
	timeout_ms: i64,
}

impl Poller {
	fn readable(timeout: Duration) -> Self {
		Self {
			events: zmq::POLLIN,
			timeout_ms: i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX),
		}
	}

	/// Returns true if `socket` became readable within the timeout.
	fn wait(&self, socket: &zmq::Socket) -> Result<bool> {
		let mut items = [socket.as_poll_item(self.events)];
		match zmq::poll(&mut items, self.timeout_ms) {
			Ok(0) => Ok(false),
			Ok(_) => Ok(items[0].is_readable()),
			// Interrupted by a signal; report nothing so the caller can unwind.
			Err(zmq::Error::EINTR) => Ok(false),
			Err(e) => Err(e.into()),
		}
	}
}

pub(crate) struct PullPeer {
	pub(crate) endpoint: Endpoint,
	poller: Poller,
}

impl PullPeer {
	pub(crate) fn create(peer: &'static str, config: &ReceiveConfig, context: Option<&Context>) -> Result<Self> {
		let endpoint = Endpoint::create(peer, &config.peer, Role::Receive, context)?;
		endpoint
			.socket()?
			.set_rcvhwm(i32::try_from(config.inbound_capacity).unwrap_or(i32::MAX))?;

		Ok(Self {
			endpoint,
			poller: Poller::readable(config.poll_timeout),
		})
	}

	pub(crate) fn receive(&self) -> Result<Option<Message>> {
		let socket = self.endpoint.socket()?;
		if !self.poller.wait(socket)? {
			return Ok(None);
		}

		let frame = match socket.recv_bytes(zmq::DONTWAIT) {
			Ok(frame) => frame,
			Err(zmq::Error::EAGAIN) => return Ok(None),
			Err(e) => return Err(e.into()),
		};

		match message::decode(&frame) {
			Ok(msg) => {
				trace!(
					peer = %self.endpoint.identity(),
					address = %self.endpoint.address(),
					bytes = frame.len(),
					"message received"
				);
				Ok(Some(msg))
			}
			Err(e) => {
				warn!(
					peer = %self.endpoint.identity(),
					address = %self.endpoint.address(),
					error = %e,
					"discarding malformed message"
				);
				Err(e)
			}
		}
	}
}
