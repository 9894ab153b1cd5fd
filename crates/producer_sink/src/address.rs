//! Transport address parsing and validation.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Longest accepted `ipc://` address, scheme prefix included.
pub const MAX_IPC_ADDRESS_LEN: usize = 133;

/// Transport scheme of an [`Address`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
	/// `tcp://host:port`
	Tcp,
	/// `ipc://path`, a local socket file.
	Ipc,
	/// `inproc://name`, within one context.
	Inproc,
	/// `pgm://iface;group:port`
	Pgm,
	/// `epgm://iface;group:port`
	Epgm,
}

impl Scheme {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Tcp => "tcp",
			Self::Ipc => "ipc",
			Self::Inproc => "inproc",
			Self::Pgm => "pgm",
			Self::Epgm => "epgm",
		}
	}

	fn parse(s: &str) -> Option<Self> {
		Some(match s {
			"tcp" => Self::Tcp,
			"ipc" => Self::Ipc,
			"inproc" => Self::Inproc,
			"pgm" => Self::Pgm,
			"epgm" => Self::Epgm,
			_ => return None,
		})
	}
}

impl fmt::Display for Scheme {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A validated `scheme://target` transport address.
///
/// Validation happens before any socket is created, so a bad address never
/// costs a context or file descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
	raw: String,
	scheme: Scheme,
}

impl Address {
	/// Parses and validates an address.
	///
	/// # Errors
	///
	/// Returns [`Error::AddressInvalid`] if the scheme is missing or unknown,
	/// the target is empty, or an `ipc://` address is longer than
	/// [`MAX_IPC_ADDRESS_LEN`].
	pub fn parse(raw: &str) -> Result<Self> {
		let Some((scheme, target)) = raw.split_once("://") else {
			return Err(Error::address_invalid(raw, "expected 'scheme://target'"));
		};
		let scheme = Scheme::parse(scheme)
			.ok_or_else(|| Error::address_invalid(raw, format!("unsupported scheme '{scheme}'")))?;
		if target.is_empty() {
			return Err(Error::address_invalid(raw, "empty target"));
		}
		if scheme == Scheme::Ipc && raw.chars().count() > MAX_IPC_ADDRESS_LEN {
			return Err(Error::address_invalid(
				raw,
				format!("IPC addresses cannot be longer than {MAX_IPC_ADDRESS_LEN} characters"),
			));
		}
		if matches!(scheme, Scheme::Tcp | Scheme::Pgm | Scheme::Epgm) && !has_port(target) {
			return Err(Error::address_invalid(raw, "missing port"));
		}

		Ok(Self {
			raw: raw.to_string(),
			scheme,
		})
	}

	pub fn as_str(&self) -> &str {
		&self.raw
	}

	pub const fn scheme(&self) -> Scheme {
		self.scheme
	}

	/// Returns true when the host or port is `*`.
	///
	/// Wildcards are only meaningful for a bind; an outbound connection needs
	/// a concrete target.
	pub fn is_wildcard(&self) -> bool {
		match self.scheme {
			Scheme::Tcp | Scheme::Pgm | Scheme::Epgm => {
				let target = &self.raw[self.scheme.as_str().len() + 3..];
				let (host, port) = target.rsplit_once(':').unwrap_or((target, ""));
				let host = host.rsplit_once(';').map_or(host, |(_, h)| h);
				host == "*" || port == "*"
			}
			Scheme::Ipc | Scheme::Inproc => false,
		}
	}
}

/// True if a `:port` follows the host, skipping colons inside `[ipv6]`.
fn has_port(target: &str) -> bool {
	let after_host = target.rfind(']').map_or(target, |end| &target[end + 1..]);
	after_host.contains(':')
}

impl FromStr for Address {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		Self::parse(s)
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.raw)
	}
}

impl AsRef<str> for Address {
	fn as_ref(&self) -> &str {
		&self.raw
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;
	use rstest::rstest;

	use super::*;
	use crate::error::ErrorKind;

	#[rstest]
	#[case::tcp_connect("tcp://127.0.0.1:5557", Scheme::Tcp, false)]
	#[case::tcp_bind("tcp://*:5557", Scheme::Tcp, true)]
	#[case::tcp_ephemeral("tcp://127.0.0.1:*", Scheme::Tcp, true)]
	#[case::ipc("ipc:///tmp/sink.sock", Scheme::Ipc, false)]
	#[case::inproc("inproc://work", Scheme::Inproc, false)]
	#[case::ipv6("tcp://[::1]:5557", Scheme::Tcp, false)]
	#[case::epgm("epgm://eth0;239.192.1.1:5555", Scheme::Epgm, false)]
	fn parses_valid_addresses(#[case] raw: &str, #[case] scheme: Scheme, #[case] wildcard: bool) {
		let addr = Address::parse(raw).expect("valid address");
		assert_eq!(addr.scheme(), scheme);
		assert_eq!(addr.is_wildcard(), wildcard);
		assert_eq!(addr.as_str(), raw);
	}

	#[rstest]
	#[case::no_scheme("127.0.0.1:5557")]
	#[case::unknown_scheme("http://127.0.0.1:5557")]
	#[case::empty_target("tcp://")]
	#[case::missing_port("tcp://127.0.0.1")]
	#[case::ipv6_missing_port("tcp://[::1]")]
	#[case::empty("")]
	fn rejects_malformed_addresses(#[case] raw: &str) {
		let err = Address::parse(raw).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::AddressInvalid);
	}

	#[test]
	fn ipc_limit_is_inclusive() {
		let at_limit = format!("ipc://{}", "a".repeat(MAX_IPC_ADDRESS_LEN - "ipc://".len()));
		assert_eq!(at_limit.len(), MAX_IPC_ADDRESS_LEN);
		assert!(Address::parse(&at_limit).is_ok());

		let over = format!("{at_limit}a");
		assert_eq!(Address::parse(&over).unwrap_err().kind(), ErrorKind::AddressInvalid);
	}

	#[test]
	fn ipc_limit_counts_characters_not_bytes() {
		let wide = format!("ipc://{}", "é".repeat(MAX_IPC_ADDRESS_LEN - "ipc://".len()));
		assert_eq!(wide.chars().count(), MAX_IPC_ADDRESS_LEN);
		assert!(wide.len() > MAX_IPC_ADDRESS_LEN);
		assert!(Address::parse(&wide).is_ok());

		let over = format!("{wide}é");
		assert_eq!(Address::parse(&over).unwrap_err().kind(), ErrorKind::AddressInvalid);
	}

	proptest! {
		#[test]
		fn ipc_length_decides_validity(path in "[a-zé/_.]{1,300}") {
			let raw = format!("ipc://{path}");
			let parsed = Address::parse(&raw);
			prop_assert_eq!(parsed.is_ok(), raw.chars().count() <= MAX_IPC_ADDRESS_LEN);
		}

		#[test]
		fn tcp_length_is_unbounded(len in 1usize..300) {
			let raw = format!("tcp://{}:5557", "h".repeat(len));
			prop_assert!(Address::parse(&raw).is_ok());
		}
	}
}
