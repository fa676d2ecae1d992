//! # Talos Middleware
//!
//! The fixed-order request pipeline for the Talos service substrate.
//!
//! Every request passes through the same chain, in the same order:
//!
//! | Stage | Middleware     | Purpose                                      |
//! |-------|----------------|----------------------------------------------|
//! | 1     | Status Count   | Bucket responses by status class             |
//! | 2     | Access Log     | One redacted structured log line per request |
//! | 3     | Recover        | Convert handler panics into 500 responses    |
//!
//! The pipeline also creates the per-request [`talos_core::RequestContext`]
//! as the request enters, carrying the request ID and peer address to the
//! handler. Stages cannot be reordered or disabled.
//!
//! ## Example
//!
//! ```rust
//! use talos_middleware::{Pipeline, Redactor};
//!
//! let pipeline = Pipeline::new(Redactor::new("SECRET"));
//! assert_eq!(pipeline.stage_names().len(), 3);
//! ```

pub mod middleware;
pub mod pipeline;
pub mod redact;
pub mod stages;
pub mod types;

pub use middleware::{Middleware, Next};
pub use pipeline::Pipeline;
pub use redact::{Redactor, REDACTED};
pub use stages::{AccessLogStage, RecoverStage, StatusCountStage, StatusCounters, StatusSnapshot};
pub use types::{Request, Response, ResponseExt};
