//! Peer configuration.
//!
//! Configuration is plain data with builder-style setters and can also be
//! loaded from a TOML file:
//!
//! ```toml
//! [producer]
//! identity = "producer-1"
//! address = "tcp://127.0.0.1:5557"
//! linger_ms = 0
//! outbound_capacity = 1000
//!
//! [producer.retry]
//! attempts = 10
//! delay_ms = 1000
//! backoff = { kind = "exponential", factor = 2, max_delay_ms = 8000 }
//!
//! [sink]
//! identity = "sink"
//! address = "tcp://*:5557"
//! poll_timeout_ms = 10
//! ```
//!
//! Durations are whole milliseconds. An absent `linger_ms` means a close waits
//! indefinitely for pending messages to flush.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::endpoint::Role;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

/// Default high water mark for both directions.
pub const DEFAULT_QUEUE_CAPACITY: u32 = 1000;

/// Default wait for readability in [`crate::Sink::receive`].
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// Settings shared by every peer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
	/// Diagnostic label; never transmitted.
	pub identity: String,
	/// Target address for producers, listening address for sinks.
	pub address: String,
	/// How long closing waits for unsent messages. `None` waits forever.
	#[serde(rename = "linger_ms", with = "serde_millis::option")]
	pub linger: Option<Duration>,
	/// Explicit socket role. Must match the concrete peer when set.
	pub role: Option<Role>,
}

impl PeerConfig {
	pub fn new(address: impl Into<String>, identity: impl Into<String>) -> Self {
		Self {
			identity: identity.into(),
			address: address.into(),
			linger: None,
			role: None,
		}
	}
}

/// Configuration of a sending peer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SendConfig {
	#[serde(flatten)]
	pub peer: PeerConfig,
	/// Outbound high water mark; `0` leaves the queue unbounded.
	pub outbound_capacity: u32,
	pub retry: RetryPolicy,
}

impl Default for SendConfig {
	fn default() -> Self {
		Self {
			peer: PeerConfig::default(),
			outbound_capacity: DEFAULT_QUEUE_CAPACITY,
			retry: RetryPolicy::default(),
		}
	}
}

impl SendConfig {
	pub fn new(address: impl Into<String>, identity: impl Into<String>) -> Self {
		Self {
			peer: PeerConfig::new(address, identity),
			..Self::default()
		}
	}

	#[must_use]
	pub fn with_linger(mut self, linger: Duration) -> Self {
		self.peer.linger = Some(linger);
		self
	}

	#[must_use]
	pub fn with_role(mut self, role: Role) -> Self {
		self.peer.role = Some(role);
		self
	}

	#[must_use]
	pub fn with_outbound_capacity(mut self, capacity: u32) -> Self {
		self.outbound_capacity = capacity;
		self
	}

	#[must_use]
	pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;
		self
	}
}

/// Configuration of a receiving peer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReceiveConfig {
	#[serde(flatten)]
	pub peer: PeerConfig,
	#[serde(rename = "poll_timeout_ms", with = "serde_millis")]
	pub poll_timeout: Duration,
	/// Inbound high water mark; `0` leaves the queue unbounded.
	pub inbound_capacity: u32,
}

impl Default for ReceiveConfig {
	fn default() -> Self {
		Self {
			peer: PeerConfig::default(),
			poll_timeout: DEFAULT_POLL_TIMEOUT,
			inbound_capacity: DEFAULT_QUEUE_CAPACITY,
		}
	}
}

impl ReceiveConfig {
	pub fn new(address: impl Into<String>, identity: impl Into<String>) -> Self {
		Self {
			peer: PeerConfig::new(address, identity),
			..Self::default()
		}
	}

	#[must_use]
	pub fn with_linger(mut self, linger: Duration) -> Self {
		self.peer.linger = Some(linger);
		self
	}

	#[must_use]
	pub fn with_role(mut self, role: Role) -> Self {
		self.peer.role = Some(role);
		self
	}

	#[must_use]
	pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
		self.poll_timeout = timeout;
		self
	}

	#[must_use]
	pub fn with_inbound_capacity(mut self, capacity: u32) -> Self {
		self.inbound_capacity = capacity;
		self
	}
}

/// Contents of a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
	pub producer: SendConfig,
	pub sink: ReceiveConfig,
}

impl FileConfig {
	/// Reads and parses a TOML configuration file.
	///
	/// # Errors
	///
	/// Returns [`Error::Config`] if the file cannot be read or parsed.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
			path: path.to_path_buf(),
			reason: e.to_string(),
		})?;
		Self::parse(&text).map_err(|reason| Error::Config {
			path: path.to_path_buf(),
			reason,
		})
	}

	fn parse(text: &str) -> std::result::Result<Self, String> {
		toml::from_str(text).map_err(|e| e.to_string())
	}
}

/// Serde adapters for durations written as whole milliseconds.
pub(crate) mod serde_millis {
	use std::time::Duration;

	use serde::{Deserialize, Deserializer};

	pub(crate) fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
		u64::deserialize(de).map(Duration::from_millis)
	}

	pub(crate) mod option {
		use super::*;

		pub(crate) fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Duration>, D::Error> {
			Option::<u64>::deserialize(de).map(|ms| ms.map(Duration::from_millis))
		}
	}
}
