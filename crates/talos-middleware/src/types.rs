//! Common types used throughout the request pipeline.

use bytes::Bytes;
use http_body_util::Full;

pub use talos_core::{Request, Response};

/// Extension trait for building error responses.
pub trait ResponseExt {
    /// Creates a plain-text error response with the given status code.
    fn error(status: http::StatusCode, message: &str) -> Response;

    /// Creates a JSON error response with a machine-readable code.
    fn json_error(status: http::StatusCode, code: &str, message: &str) -> Response;
}

impl ResponseExt for Response {
    fn error(status: http::StatusCode, message: &str) -> Response {
        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Full::new(Bytes::from(message.to_string())))
            .expect("failed to build error response")
    }

    fn json_error(status: http::StatusCode, code: &str, message: &str) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": code,
                "message": message
            }
        });

        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .expect("failed to build JSON error response")
    }
}
