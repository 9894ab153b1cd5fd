//! Socket ownership shared by every peer.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::address::Address;
use crate::config::PeerConfig;
use crate::context::{Context, PeerContext};
use crate::error::{Error, Result};

/// Direction of a peer's socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	/// Outbound only (PUSH).
	Send,
	/// Inbound only (PULL).
	Receive,
}

impl Role {
	const fn socket_type(self) -> zmq::SocketType {
		match self {
			Self::Send => zmq::PUSH,
			Self::Receive => zmq::PULL,
		}
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Send => "send",
			Self::Receive => "receive",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A socket bound to one address and role, plus the context that made it.
///
/// Nothing is connected or bound here; that is up to the concrete peer.
pub(crate) struct Endpoint {
	address: Address,
	identity: String,
	role: Role,
	socket: Option<zmq::Socket>,
	context: Option<PeerContext>,
}

impl Endpoint {
	/// Validates the configuration and opens a socket for `role`.
	///
	/// Any resource acquired before a failure is released before the error is
	/// returned.
	pub(crate) fn create(
		peer: &'static str,
		config: &PeerConfig,
		role: Role,
		context: Option<&Context>,
	) -> Result<Self> {
		if let Some(requested) = config.role
			&& requested != role
		{
			return Err(Error::RoleMismatch {
				peer,
				expected: role,
				actual: requested,
			});
		}
		let address = Address::parse(&config.address)?;

		let context = PeerContext::acquire(context);
		let socket = context.get().raw().socket(role.socket_type())?;
		socket.set_linger(linger_millis(config.linger))?;

		debug!(
			peer = %config.identity,
			address = %address,
			role = %role,
			owned_context = context.is_owned(),
			"socket created"
		);

		Ok(Self {
			address,
			identity: config.identity.clone(),
			role,
			socket: Some(socket),
			context: Some(context),
		})
	}

	pub(crate) fn address(&self) -> &Address {
		&self.address
	}

	pub(crate) fn identity(&self) -> &str {
		&self.identity
	}

	pub(crate) const fn role(&self) -> Role {
		self.role
	}

	/// Returns the live socket, or [`Error::Closed`] after cleanup.
	pub(crate) fn socket(&self) -> Result<&zmq::Socket> {
		self.socket.as_ref().ok_or_else(|| Error::Closed(self.identity.clone()))
	}

	pub(crate) const fn is_closed(&self) -> bool {
		self.socket.is_none()
	}

	/// Closes the socket, then terminates the context if this endpoint owns it.
	///
	/// Safe to call repeatedly; later calls are no-ops.
	pub(crate) fn cleanup(&mut self) {
		let closed_socket = self.socket.take().is_some();
		let context = self.context.take();
		let terminated_context = context.as_ref().is_some_and(PeerContext::is_owned);
		// Dropping the last handle of an owned context blocks until linger expires.
		drop(context);

		if closed_socket {
			debug!(
				peer = %self.identity,
				address = %self.address,
				terminated_context,
				"endpoint cleaned up"
			);
		}
	}
}

impl Drop for Endpoint {
	fn drop(&mut self) {
		self.cleanup();
	}
}

fn linger_millis(linger: Option<Duration>) -> i32 {
	match linger {
		None => -1,
		Some(d) => i32::try_from(d.as_millis()).unwrap_or(i32::MAX),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;

	fn config(address: &str) -> PeerConfig {
		PeerConfig {
			linger: Some(Duration::ZERO),
			..PeerConfig::new(address, "endpoint-test")
		}
	}

	#[test]
	fn role_override_must_match() {
		let mut cfg = config("tcp://127.0.0.1:5557");
		cfg.role = Some(Role::Receive);
		let err = Endpoint::create("Producer", &cfg, Role::Send, None).err().unwrap();
		assert_eq!(err.kind(), ErrorKind::RoleMismatch);

		cfg.role = Some(Role::Send);
		let mut ep = Endpoint::create("Producer", &cfg, Role::Send, None).unwrap();
		assert_eq!(ep.role(), Role::Send);
		ep.cleanup();
	}

	#[test]
	fn cleanup_is_idempotent() {
		let mut ep = Endpoint::create("Sink", &config("inproc://cleanup"), Role::Receive, None).unwrap();
		assert!(!ep.is_closed());
		ep.cleanup();
		ep.cleanup();
		assert!(ep.is_closed());
		assert_eq!(ep.socket().err().unwrap().kind(), ErrorKind::Closed);
	}

	#[test]
	fn shared_context_outlives_endpoint() {
		let ctx = Context::new();
		let mut first = Endpoint::create("Sink", &config("inproc://a"), Role::Receive, Some(&ctx)).unwrap();
		first.cleanup();

		let mut second = Endpoint::create("Sink", &config("inproc://b"), Role::Receive, Some(&ctx)).unwrap();
		assert!(second.socket().is_ok());
		second.cleanup();
	}

	#[test]
	fn linger_maps_to_transport_units() {
		assert_eq!(linger_millis(None), -1);
		assert_eq!(linger_millis(Some(Duration::from_millis(250))), 250);
		assert_eq!(linger_millis(Some(Duration::from_secs(u64::MAX))), i32::MAX);
	}
}
