//! Per-request context types.
//!
//! A [`RequestContext`] is created by the middleware chain when a request
//! enters the service, handed to the matched handler, and discarded when the
//! response leaves. It is never shared between requests.

use std::net::SocketAddr;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps request IDs sortable in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an existing UUID, e.g. one propagated from an upstream header.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request-scoped state injected by the middleware chain.
///
/// Carries the request ID, the peer address, and an optional principal
/// (identity/session placeholder, authentication itself is a collaborator's
/// concern). Handlers receive the context by value alongside the request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request.
    request_id: RequestId,

    /// Remote peer address, when known.
    remote_addr: Option<SocketAddr>,

    /// Identity placeholder filled in by an upstream collaborator.
    principal: Option<String>,

    /// When the request entered the pipeline.
    started_at: Instant,
}

impl RequestContext {
    /// Creates a fresh context with a new request ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            remote_addr: None,
            principal: None,
            started_at: Instant::now(),
        }
    }

    /// Attaches the remote peer address.
    #[must_use]
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Attaches a principal.
    #[must_use]
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the remote peer address, if known.
    #[must_use]
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Returns the principal, if one was attached.
    #[must_use]
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Returns how long this request has been in flight.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
