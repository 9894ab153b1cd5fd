//! Producer end: a sending peer connected to a sink.

use tracing::debug;

use crate::address::Address;
use crate::config::SendConfig;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::peer::{Lifecycle, SendReport, Sendable};
use crate::push::PushPeer;

/// Pushes messages to a sink at a known address.
///
/// Messages from one producer reach the transport in call order. A producer
/// is driven by one thread at a time.
pub struct Producer {
	inner: PushPeer,
}

impl Producer {
	/// Creates a producer with its own messaging context and connects it.
	///
	/// # Errors
	///
	/// * [`Error::RoleMismatch`] if `config` asks for a receive role.
	/// * [`Error::AddressInvalid`] for a malformed address.
	/// * [`Error::Connection`] for a wildcard address or a connect rejected by
	///   the transport.
	pub fn new(config: &SendConfig) -> Result<Self> {
		Self::build(config, None)
	}

	/// Creates a producer on a caller-owned context.
	///
	/// The context is not terminated by [`Lifecycle::cleanup`].
	pub fn with_context(config: &SendConfig, context: &Context) -> Result<Self> {
		Self::build(config, Some(context))
	}

	fn build(config: &SendConfig, context: Option<&Context>) -> Result<Self> {
		let inner = PushPeer::create("Producer", config, context)?;
		let endpoint = &inner.endpoint;
		let address = endpoint.address();

		if address.is_wildcard() {
			return Err(Error::Connection {
				address: address.to_string(),
				reason: "a producer needs a concrete target, not a wildcard".into(),
			});
		}
		endpoint
			.socket()?
			.connect(address.as_str())
			.map_err(|e| Error::Connection {
				address: address.to_string(),
				reason: e.to_string(),
			})?;

		debug!(peer = %endpoint.identity(), address = %address, "producer connected");
		Ok(Self { inner })
	}
}

impl Lifecycle for Producer {
	fn identity(&self) -> &str {
		self.inner.endpoint.identity()
	}

	fn address(&self) -> &Address {
		self.inner.endpoint.address()
	}

	fn cleanup(&mut self) {
		self.inner.endpoint.cleanup();
	}

	fn is_closed(&self) -> bool {
		self.inner.endpoint.is_closed()
	}
}

impl Sendable for Producer {
	fn send_detailed(&mut self, message: &Message) -> Result<SendReport> {
		self.inner.send(message)
	}
}

impl std::fmt::Debug for Producer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Producer")
			.field("identity", &self.identity())
			.field("address", &self.address().as_str())
			.field("closed", &self.is_closed())
			.finish()
	}
}
