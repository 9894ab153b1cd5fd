//! Asynchronous Producer-Sink messaging over ZeroMQ PUSH/PULL sockets.
//!
//! Many [`Producer`]s push JSON objects towards a [`Sink`], which pulls them
//! off at its own pace. Neither end ever blocks without bound:
//!
//! * A send that finds the outbound queue full retries a limited number of
//!   times ([`RetryPolicy`]) and then reports failure instead of stalling.
//! * A receive waits at most its poll timeout and returns `None` if nothing
//!   arrived.
//!
//! ```no_run
//! use producer_sink::prelude::*;
//! use serde_json::json;
//!
//! # fn main() -> producer_sink::Result<()> {
//! let mut sink = Sink::new(&ReceiveConfig::new("tcp://*:5557", "sink"))?;
//! let mut producer = Producer::new(&SendConfig::new("tcp://127.0.0.1:5557", "producer-1"))?;
//!
//! producer.send_json(&json!({"identity": "producer-1", "data": "x"}))?;
//! while sink.receive()?.is_none() {}
//!
//! producer.cleanup();
//! sink.cleanup();
//! # Ok(())
//! # }
//! ```
//!
//! Peers release their socket (and their context, if they created it) on
//! [`Lifecycle::cleanup`] or on drop, whichever comes first.

pub mod address;
pub mod config;
pub mod context;
mod endpoint;
pub mod error;
pub mod message;
pub mod peer;
pub mod producer;
mod pull;
mod push;
pub mod retry;
pub mod sink;

pub use address::{Address, MAX_IPC_ADDRESS_LEN, Scheme};
pub use config::{FileConfig, PeerConfig, ReceiveConfig, SendConfig};
pub use context::Context;
pub use endpoint::Role;
pub use error::{Error, ErrorKind, Result};
pub use message::Message;
pub use peer::{Lifecycle, Receivable, SendReport, Sendable};
pub use producer::Producer;
pub use retry::{Backoff, RetryPolicy};
pub use sink::Sink;

/// Everything needed to build and drive peers.
pub mod prelude {
	pub use crate::{
		Context, Lifecycle, Message, Producer, Receivable, ReceiveConfig, RetryPolicy, Role, SendConfig, Sendable, Sink,
	};
}
