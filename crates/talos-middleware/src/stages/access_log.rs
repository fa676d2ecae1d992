//! Access logging with secret redaction.
//!
//! Emits exactly one structured log line per request after the downstream
//! chain produces a response. Anything derived from request data (the path
//! and query) is scrubbed through the [`Redactor`] first, so a configured
//! secret marker never reaches the log sink. Logging never alters the
//! response.

use talos_core::{BoxFuture, Request, RequestContext, Response};

use crate::middleware::{Middleware, Next};
use crate::redact::Redactor;

/// Middleware stage emitting one redacted access log line per request.
#[derive(Debug, Clone)]
pub struct AccessLogStage {
    redactor: Redactor,
}

impl AccessLogStage {
    /// Creates the stage with the given redactor.
    #[must_use]
    pub fn new(redactor: Redactor) -> Self {
        Self { redactor }
    }

    fn scrubbed_target(&self, request: &Request) -> String {
        let target = request
            .uri()
            .path_and_query()
            .map_or_else(|| request.uri().path().to_string(), ToString::to_string);
        self.redactor.scrub(&target).into_owned()
    }
}

impl Middleware for AccessLogStage {
    fn name(&self) -> &'static str {
        "access_log"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let method = request.method().clone();
            let target = self.scrubbed_target(&request);

            let response = next.run(ctx, request).await;

            tracing::info!(
                target: "talos::access",
                request_id = %ctx.request_id(),
                remote = ?ctx.remote_addr(),
                method = %method,
                path = %target,
                status = response.status().as_u16(),
                duration_ms = ctx.elapsed().as_millis() as u64,
                "request"
            );

            response
        })
    }
}
