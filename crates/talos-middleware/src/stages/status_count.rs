//! Response status counting.
//!
//! The outermost stage of the pipeline. Buckets every response into its
//! status class (1xx through 5xx), increments an in-process counter that the
//! debug endpoint reads, and mirrors the increment to the metrics recorder.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use talos_core::{BoxFuture, Request, RequestContext, Response};

use crate::middleware::{Middleware, Next};

/// Shared per-status-class response counters.
///
/// Counters only ever increase. Reads and writes are relaxed; the snapshot
/// is advisory, not a consistent cut.
#[derive(Debug, Default)]
pub struct StatusCounters {
    informational: AtomicU64,
    success: AtomicU64,
    redirect: AtomicU64,
    client_error: AtomicU64,
    server_error: AtomicU64,
}

/// Point-in-time copy of [`StatusCounters`], serializable for debug output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// 1xx responses.
    pub informational: u64,
    /// 2xx responses.
    pub success: u64,
    /// 3xx responses.
    pub redirect: u64,
    /// 4xx responses.
    pub client_error: u64,
    /// 5xx responses.
    pub server_error: u64,
}

impl StatusCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one response with the given status.
    pub fn record(&self, status: http::StatusCode) {
        let slot = match status.as_u16() {
            100..=199 => &self.informational,
            200..=299 => &self.success,
            300..=399 => &self.redirect,
            400..=499 => &self.client_error,
            _ => &self.server_error,
        };
        slot.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            informational: self.informational.load(Ordering::Relaxed),
            success: self.success.load(Ordering::Relaxed),
            redirect: self.redirect.load(Ordering::Relaxed),
            client_error: self.client_error.load(Ordering::Relaxed),
            server_error: self.server_error.load(Ordering::Relaxed),
        }
    }

    /// Total responses recorded across all classes.
    #[must_use]
    pub fn total(&self) -> u64 {
        let s = self.snapshot();
        s.informational + s.success + s.redirect + s.client_error + s.server_error
    }
}

fn status_class(status: http::StatusCode) -> &'static str {
    match status.as_u16() {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

/// Middleware stage feeding [`StatusCounters`] and the metrics recorder.
#[derive(Debug, Clone)]
pub struct StatusCountStage {
    counters: Arc<StatusCounters>,
}

impl StatusCountStage {
    /// Creates the stage around a shared counter set.
    #[must_use]
    pub fn new(counters: Arc<StatusCounters>) -> Self {
        Self { counters }
    }
}

impl Middleware for StatusCountStage {
    fn name(&self) -> &'static str {
        "status_count"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let response = next.run(ctx, request).await;

            self.counters.record(response.status());
            metrics::counter!(
                "talos_requests_total",
                "class" => status_class(response.status()),
            )
            .increment(1);

            response
        })
    }
}
