//! Error types for peer construction and messaging.

use std::path::PathBuf;

use thiserror::Error;

use crate::endpoint::Role;

/// Errors produced by producers, sinks and their configuration.
#[derive(Debug, Error)]
pub enum Error {
	/// The address is malformed or exceeds a transport limit.
	#[error("invalid address '{address}': {reason}")]
	AddressInvalid {
		/// The rejected address.
		address: String,
		/// Why the address was rejected.
		reason: String,
	},

	/// A peer was configured with a socket role it cannot use.
	#[error("'{peer}' end instantiated with the wrong socket role: expected {expected}, got {actual}")]
	RoleMismatch {
		/// Concrete peer type name.
		peer: &'static str,
		/// Role the peer type requires.
		expected: Role,
		/// Role that was requested.
		actual: Role,
	},

	/// The transport rejected an outbound connection.
	#[error("unable to connect to '{address}': {reason}")]
	Connection {
		/// Target address.
		address: String,
		/// Transport or validation failure.
		reason: String,
	},

	/// The transport rejected a listening bind.
	#[error("unable to bind '{address}': {reason}")]
	Bind {
		/// Listening address.
		address: String,
		/// Transport or validation failure.
		reason: String,
	},

	/// A payload could not be encoded or decoded as a JSON object.
	#[error("malformed message: {0}")]
	MalformedMessage(String),

	/// The peer was already cleaned up.
	#[error("peer '{0}' has been cleaned up")]
	Closed(String),

	/// Any other transport failure.
	#[error("transport error: {0}")]
	Transport(#[from] zmq::Error),

	/// A configuration file could not be read or parsed.
	#[error("configuration error in {path}: {reason}")]
	Config {
		/// Path to the offending file.
		path: PathBuf,
		/// Read or parse failure.
		reason: String,
	},
}

/// Fieldless discriminant of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// See [`Error::AddressInvalid`].
	AddressInvalid,
	/// See [`Error::RoleMismatch`].
	RoleMismatch,
	/// See [`Error::Connection`].
	Connection,
	/// See [`Error::Bind`].
	Bind,
	/// See [`Error::MalformedMessage`].
	MalformedMessage,
	/// See [`Error::Closed`].
	Closed,
	/// See [`Error::Transport`].
	Transport,
	/// See [`Error::Config`].
	Config,
}

impl Error {
	/// Returns the kind of this error.
	pub const fn kind(&self) -> ErrorKind {
		match self {
			Self::AddressInvalid { .. } => ErrorKind::AddressInvalid,
			Self::RoleMismatch { .. } => ErrorKind::RoleMismatch,
			Self::Connection { .. } => ErrorKind::Connection,
			Self::Bind { .. } => ErrorKind::Bind,
			Self::MalformedMessage(_) => ErrorKind::MalformedMessage,
			Self::Closed(_) => ErrorKind::Closed,
			Self::Transport(_) => ErrorKind::Transport,
			Self::Config { .. } => ErrorKind::Config,
		}
	}

	pub(crate) fn address_invalid(address: &str, reason: impl Into<String>) -> Self {
		Self::AddressInvalid {
			address: address.to_string(),
			reason: reason.into(),
		}
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::MalformedMessage(err.to_string())
	}
}

/// Result type for producer/sink operations.
pub type Result<T> = std::result::Result<T, Error>;
