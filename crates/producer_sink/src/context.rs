//! Messaging context shared between peers.

/// Handle to a messaging context that creates sockets.
///
/// Cloning is cheap and every clone refers to the same underlying context.
/// The context terminates once the last clone is dropped, which waits for all
/// of its sockets to close (honoring their linger).
#[derive(Clone)]
pub struct Context {
	inner: zmq::Context,
}

impl Context {
	pub fn new() -> Self {
		Self {
			inner: zmq::Context::new(),
		}
	}

	pub(crate) fn raw(&self) -> &zmq::Context {
		&self.inner
	}
}

impl Default for Context {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for Context {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Context").finish_non_exhaustive()
	}
}

/// Context held by an endpoint, tagged with who terminates it.
pub(crate) enum PeerContext {
	/// Created by the endpoint; terminated on cleanup.
	Owned(Context),
	/// Supplied by the caller; only the endpoint's handle is released.
	Shared(Context),
}

impl PeerContext {
	pub(crate) fn acquire(supplied: Option<&Context>) -> Self {
		match supplied {
			Some(ctx) => Self::Shared(ctx.clone()),
			None => Self::Owned(Context::new()),
		}
	}

	pub(crate) fn get(&self) -> &Context {
		match self {
			Self::Owned(ctx) | Self::Shared(ctx) => ctx,
		}
	}

	pub(crate) const fn is_owned(&self) -> bool {
		matches!(self, Self::Owned(_))
	}
}
