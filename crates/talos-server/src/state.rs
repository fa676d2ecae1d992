//! Server lifecycle state machine.
//!
//! The state advances strictly forward: `Starting → Serving → Draining →
//! Stopped`. Transitions never go backwards and never skip checks; an
//! attempt to move to an earlier or equal state is a no-op.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Where the server is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ServerState {
    /// Configuration loaded, datastore opening, listener not yet bound.
    Starting = 0,
    /// Listener bound, requests flowing.
    Serving = 1,
    /// Listener closed, in-flight requests finishing.
    Draining = 2,
    /// Everything closed, including the datastore.
    Stopped = 3,
}

impl ServerState {
    /// Stable lower-case name, used in logs and the debug endpoint.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Serving => "serving",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Starting,
            1 => Self::Serving,
            2 => Self::Draining,
            _ => Self::Stopped,
        }
    }
}

impl std::fmt::Display for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cloneable handle on the current [`ServerState`].
///
/// Shared between the lifecycle controller, the accept loop, and the debug
/// endpoint. Advancing is monotonic; concurrent observers may briefly read
/// a stale state but never a regressed one.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<AtomicU8>,
}

impl SharedState {
    /// Creates a handle starting at [`ServerState::Starting`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    #[must_use]
    pub fn current(&self) -> ServerState {
        ServerState::from_u8(self.inner.load(Ordering::SeqCst))
    }

    /// Advances to `next` if it is strictly later than the current state.
    ///
    /// Returns whether this call performed the transition. Under a race the
    /// furthest state wins.
    pub fn advance(&self, next: ServerState) -> bool {
        self.inner.fetch_max(next as u8, Ordering::SeqCst) < next as u8
    }

    /// Whether new connections should still be accepted.
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        self.current() == ServerState::Serving
    }
}
