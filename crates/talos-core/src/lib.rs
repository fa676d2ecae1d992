//! Core types and boundary traits for the Talos service substrate.
//!
//! This crate defines the vocabulary shared by the router, middleware, and
//! server crates:
//!
//! - [`RequestContext`] / [`RequestId`]: per-request scoped state
//! - [`Datastore`]: the contract a backing store must satisfy so the
//!   lifecycle controller can open and close it at the right moments
//! - [`Handler`] and the [`Request`]/[`Response`] aliases used end to end

pub mod context;
pub mod datastore;
pub mod handler;

pub use context::{RequestContext, RequestId};
pub use datastore::{Datastore, DatastoreError};
pub use handler::{handler_fn, BoxFuture, Handler, Request, Response};
