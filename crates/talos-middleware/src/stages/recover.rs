//! Panic recovery.
//!
//! The innermost stage, wrapping the handler directly. A panicking handler
//! must take down its own request only, never the connection task or the
//! process, so the panic is caught here and converted into a 500 that the
//! counting and logging stages observe like any other response.

use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use talos_core::{BoxFuture, Request, RequestContext, Response};

use crate::middleware::{Middleware, Next};
use crate::types::ResponseExt;

/// Middleware stage converting handler panics into 500 responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoverStage;

impl RecoverStage {
    /// Creates the stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}

impl Middleware for RecoverStage {
    fn name(&self) -> &'static str {
        "recover"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let request_id = ctx.request_id();
            match AssertUnwindSafe(next.run(ctx, request)).catch_unwind().await {
                Ok(response) => response,
                Err(payload) => {
                    tracing::error!(
                        request_id = %request_id,
                        panic = panic_message(payload.as_ref()),
                        "handler panicked"
                    );
                    Response::json_error(
                        http::StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "internal server error",
                    )
                }
            }
        })
    }
}
