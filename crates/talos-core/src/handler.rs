//! Handler types and HTTP aliases.
//!
//! Endpoint logic is an external collaborator: the handler registry injects
//! concrete handlers into the router at startup, and this module only fixes
//! the shape those handlers must have.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;

use crate::context::RequestContext;

/// A boxed future, used wherever the core needs type-erased async work.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The HTTP request type flowing through the pipeline.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type flowing through the pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// A type-erased endpoint handler.
///
/// Handlers receive the request context by value and own it for the
/// duration of the request. They must always return a response; faults are
/// recovered by the middleware chain.
pub type Handler =
    Arc<dyn Fn(RequestContext, Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// Wraps an async function as a [`Handler`].
///
/// # Example
///
/// ```
/// use talos_core::handler::{handler_fn, Request, Response};
/// use talos_core::RequestContext;
/// use bytes::Bytes;
/// use http_body_util::Full;
///
/// let h = handler_fn(|_ctx: RequestContext, _req: Request| async {
///     http::Response::new(Full::new(Bytes::from("ok")))
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(RequestContext, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |ctx, req| Box::pin(f(ctx, req)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[tokio::test]
    async fn test_handler_fn_invocation() {
        let h = handler_fn(|_ctx, _req| async {
            http::Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::from("hello")))
                .unwrap()
        });

        let req = http::Request::builder()
            .uri("/")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let resp = h(RequestContext::new(), req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
