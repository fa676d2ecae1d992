//! The `/debug/vars` endpoint.
//!
//! Serves a small JSON snapshot of server internals. Unauthenticated, so
//! it is mounted only when `debug_endpoints` is set in the configuration.

use std::time::Instant;

use bytes::Bytes;
use http_body_util::Full;
use talos_core::Response;
use talos_middleware::StatusCounters;

use crate::state::SharedState;

/// Builds the `/debug/vars` response.
#[must_use]
pub fn vars_response(
    state: &SharedState,
    counters: &StatusCounters,
    started_at: Instant,
    routes: usize,
) -> Response {
    let body = serde_json::json!({
        "state": state.current().as_str(),
        "uptime_secs": started_at.elapsed().as_secs(),
        "routes": routes,
        "responses": counters.snapshot(),
    });

    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .expect("failed to build debug response")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ServerState;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_vars_shape() {
        let state = SharedState::new();
        state.advance(ServerState::Serving);
        let counters = StatusCounters::new();
        counters.record(http::StatusCode::OK);

        let response = vars_response(&state, &counters, Instant::now(), 3);
        assert_eq!(response.status(), http::StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["state"], "serving");
        assert_eq!(value["routes"], 3);
        assert_eq!(value["responses"]["success"], 1);
    }
}
