//! Capabilities implemented by producers and sinks.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::address::Address;
use crate::error::Result;
use crate::message::{self, Message};

/// Resource ownership common to every peer.
pub trait Lifecycle {
	/// Diagnostic label given at construction.
	fn identity(&self) -> &str;

	/// Address the peer connected or bound to.
	fn address(&self) -> &Address;

	/// Closes the socket and terminates an owned context.
	///
	/// Idempotent. Dropping the peer performs the same release, so calling
	/// this explicitly only matters when the release must happen at a known
	/// point (e.g. before a linger-bounded shutdown).
	fn cleanup(&mut self);

	/// True once [`Lifecycle::cleanup`] has run.
	fn is_closed(&self) -> bool;
}

/// Result of one send, with the number of enqueue attempts it took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReport {
	pub delivered: bool,
	pub attempts: u32,
}

/// Non-blocking, bounded-retry delivery.
pub trait Sendable: Lifecycle {
	/// Hands `message` to the transport, retrying while the outbound queue is
	/// full until the retry budget runs out.
	///
	/// # Errors
	///
	/// Saturation is not an error; it is reported through
	/// [`SendReport::delivered`]. Errors are limited to a closed peer or an
	/// unexpected transport failure.
	fn send_detailed(&mut self, message: &Message) -> Result<SendReport>;

	/// Like [`Sendable::send_detailed`], reporting only whether the message
	/// was handed to the transport.
	fn send(&mut self, message: &Message) -> Result<bool> {
		self.send_detailed(message).map(|report| report.delivered)
	}

	/// Serializes `value` into a message and sends it.
	fn send_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<bool>
	where
		Self: Sized,
	{
		let message = message::to_message(value)?;
		self.send(&message)
	}
}

/// Timeout-bounded retrieval of one message.
pub trait Receivable: Lifecycle {
	/// Waits up to the poll timeout for one message.
	///
	/// Returns `Ok(None)` when nothing arrived in time. An empty object is a
	/// valid message and is returned as `Ok(Some(_))`.
	///
	/// # Errors
	///
	/// Returns [`crate::Error::MalformedMessage`] for a payload that is not a
	/// JSON object. The peer stays usable afterwards.
	fn receive(&mut self) -> Result<Option<Message>>;

	/// Receives one message and converts it into `T`.
	fn receive_json<T: DeserializeOwned>(&mut self) -> Result<Option<T>>
	where
		Self: Sized,
	{
		self.receive()?.map(message::from_message).transpose()
	}
}
