//! Datastore boundary contract.
//!
//! The lifecycle controller owns exactly one datastore handle. It opens the
//! handle during startup, after the listener binds but before any
//! connection is accepted, and closes it exactly once during shutdown,
//! after all in-flight requests have drained. The implementation behind the
//! trait (connection pool, ORM, whatever) is a collaborator and out of scope
//! here; this contract only pins down *when* open and close happen.
//!
//! Open failures are fatal at startup and are reported as an explicit
//! [`DatastoreError`], never a panic. Close failures during teardown are
//! logged and swallowed by the controller, since the process is exiting
//! anyway.

use crate::handler::BoxFuture;
use thiserror::Error;

/// Errors surfaced across the datastore boundary.
#[derive(Error, Debug)]
pub enum DatastoreError {
    /// Opening the connection failed. Fatal at startup.
    #[error("failed to open datastore: {0}")]
    OpenFailed(String),

    /// Closing the connection failed. Non-fatal during teardown.
    #[error("failed to close datastore: {0}")]
    CloseFailed(String),
}

/// Contract between the lifecycle controller and a backing store.
///
/// The controller guarantees:
///
/// - `open` is called at most once, before the service reaches its serving
///   state and accepts its first connection;
/// - `close` is called exactly once, only after the listener has stopped
///   accepting and in-flight requests have been given the chance to finish.
///
/// Concurrency safety of whatever handle `open` establishes is the
/// implementor's responsibility; request handlers may use it concurrently.
pub trait Datastore: Send + Sync + 'static {
    /// Human-readable name used in lifecycle log lines.
    fn name(&self) -> &str {
        "datastore"
    }

    /// Establishes the backing connection.
    fn open(&mut self) -> BoxFuture<'_, Result<(), DatastoreError>>;

    /// Tears the backing connection down.
    fn close(&mut self) -> BoxFuture<'_, Result<(), DatastoreError>>;
}
