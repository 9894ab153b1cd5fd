//! Sink end: a receiving peer bound to a listening address.

use tracing::debug;

use crate::address::Address;
use crate::config::ReceiveConfig;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::peer::{Lifecycle, Receivable};
use crate::pull::PullPeer;

/// Collects messages pushed by any number of producers.
///
/// Arrival order across producers is decided by the transport. The consume
/// loop belongs to the caller: each [`Receivable::receive`] is one bounded
/// poll.
pub struct Sink {
	inner: PullPeer,
}

impl Sink {
	/// Creates a sink with its own messaging context and binds it.
	///
	/// # Errors
	///
	/// * [`Error::RoleMismatch`] if `config` asks for a send role.
	/// * [`Error::AddressInvalid`] for a malformed address.
	/// * [`Error::Bind`] if the address is in use or cannot be bound.
	pub fn new(config: &ReceiveConfig) -> Result<Self> {
		Self::build(config, None)
	}

	/// Creates a sink on a caller-owned context.
	pub fn with_context(config: &ReceiveConfig, context: &Context) -> Result<Self> {
		Self::build(config, Some(context))
	}

	fn build(config: &ReceiveConfig, context: Option<&Context>) -> Result<Self> {
		let inner = PullPeer::create("Sink", config, context)?;
		let endpoint = &inner.endpoint;
		let address = endpoint.address();

		endpoint
			.socket()?
			.bind(address.as_str())
			.map_err(|e| Error::Bind {
				address: address.to_string(),
				reason: e.to_string(),
			})?;

		debug!(peer = %endpoint.identity(), address = %address, "sink bound");
		Ok(Self { inner })
	}

	/// Concrete address the socket is bound to.
	///
	/// Resolves wildcards and ephemeral ports, e.g. `tcp://127.0.0.1:*`
	/// becomes `tcp://127.0.0.1:49152`.
	pub fn last_endpoint(&self) -> Result<String> {
		let endpoint = self.inner.endpoint.socket()?.get_last_endpoint()?;
		Ok(endpoint.unwrap_or_else(|raw| String::from_utf8_lossy(&raw).into_owned()))
	}
}

impl Lifecycle for Sink {
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

impl Receivable for Sink {
	fn receive(&mut self) -> Result<Option<Message>> {
		self.inner.receive()
	}
}

impl std::fmt::Debug for Sink {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Sink")
			.field("identity", &self.identity())
			.field("address", &self.address().as_str())
			.field("closed", &self.is_closed())
			.finish()
	}
}
