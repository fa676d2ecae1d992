//! The fixed-order request pipeline.
//!
//! Every request flows through the same three stages around the handler:
//!
//! ```text
//! Request → StatusCount → AccessLog → Recover → Handler
//!                 ↓            ↓          ↓        ↓
//! Response ←──────┴────────────┴──────────┴────────┘
//! ```
//!
//! Counting sits outermost so recovered panics and error responses are
//! counted like any other response. Recovery sits innermost so the log line
//! and the counters both see the substituted 500. The pipeline itself
//! creates the [`RequestContext`] as the request enters, which is how every
//! downstream stage and the handler get the request ID and peer address.
//!
//! The order is fixed at construction and cannot be changed by callers.

use std::net::SocketAddr;
use std::sync::Arc;

use talos_core::{BoxFuture, Request, RequestContext, Response};

use crate::middleware::{Middleware, Next};
use crate::redact::Redactor;
use crate::stages::{AccessLogStage, RecoverStage, StatusCountStage, StatusCounters};

/// The assembled pipeline, shared across all connections.
pub struct Pipeline {
    stages: Vec<Arc<dyn Middleware>>,
    counters: Arc<StatusCounters>,
}

impl Pipeline {
    /// Builds the pipeline with the given redaction marker.
    ///
    /// # Example
    ///
    /// ```rust
    /// use talos_middleware::{Pipeline, Redactor};
    ///
    /// let pipeline = Pipeline::new(Redactor::new("SECRET"));
    /// assert_eq!(pipeline.stage_names(), ["status_count", "access_log", "recover"]);
    /// ```
    #[must_use]
    pub fn new(redactor: Redactor) -> Self {
        let counters = Arc::new(StatusCounters::new());
        let stages: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(StatusCountStage::new(Arc::clone(&counters))),
            Arc::new(AccessLogStage::new(redactor)),
            Arc::new(RecoverStage::new()),
        ];
        Self { stages, counters }
    }

    /// The counters fed by the counting stage, for the debug endpoint.
    #[must_use]
    pub fn counters(&self) -> Arc<StatusCounters> {
        Arc::clone(&self.counters)
    }

    /// Stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs a request through the pipeline to the handler.
    ///
    /// Creates the per-request context, threading `remote_addr` into it when
    /// the listener knows the peer.
    pub async fn process<H>(
        &self,
        remote_addr: Option<SocketAddr>,
        request: Request,
        handler: H,
    ) -> Response
    where
        H: FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let mut ctx = RequestContext::new();
        if let Some(addr) = remote_addr {
            ctx = ctx.with_remote_addr(addr);
        }

        let mut next = Next::handler(handler);
        for stage in self.stages.iter().rev() {
            next = Next::stage(stage.as_ref(), next);
        }

        next.run(&mut ctx, request).await
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}
