//! Core middleware trait and chain plumbing.
//!
//! Talos runs a fixed-order pipeline. Stages cannot be reordered, disabled,
//! or inserted between core stages; every request flows through the same
//! chain. Stages implement [`Middleware`] and call [`Next::run`] to hand the
//! request downstream.
//!
//! # Example
//!
//! ```ignore
//! use talos_middleware::{Middleware, Next};
//! use talos_core::{BoxFuture, Request, RequestContext, Response};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut RequestContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             let response = next.run(ctx, request).await;
//!             tracing::debug!(elapsed = ?ctx.elapsed(), "request finished");
//!             response
//!         })
//!     }
//! }
//! ```

use talos_core::{BoxFuture, Request, RequestContext, Response};

/// A single stage in the request pipeline.
///
/// # Invariants
///
/// - A stage MUST call `next.run()` exactly once unless it short-circuits
///   with its own response.
/// - A stage MUST NOT swallow the downstream response.
pub trait Middleware: Send + Sync + 'static {
    /// Name of this stage, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request through this stage.
    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// Callback invoking the rest of the chain.
///
/// Consumed by [`Next::run`], so a stage can only hand off once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Stage {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(Box<dyn FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send + 'a>),
}

impl<'a> Next<'a> {
    /// Wraps the chain in one more stage.
    pub(crate) fn stage(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Stage {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates the terminal link that invokes the handler.
    pub(crate) fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Invokes the next stage or the handler.
    pub async fn run(self, ctx: &mut RequestContext, request: Request) -> Response {
        match self.inner {
            NextInner::Stage { middleware, next } => middleware.process(ctx, request, *next).await,
            NextInner::Handler(handler) => handler(ctx, request).await,
        }
    }
}
