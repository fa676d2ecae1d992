//! End-to-end tests running the full lifecycle over real sockets.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use talos_config::TalosConfig;
use talos_core::{handler_fn, BoxFuture, Datastore, DatastoreError};
use talos_server::{HandlerRegistry, Lifecycle, ServerState};

fn test_config() -> TalosConfig {
    TalosConfig {
        listen: "127.0.0.1:0".to_string(),
        ..TalosConfig::default()
    }
}

fn ok_body(body: &'static str) -> talos_core::Response {
    http::Response::builder()
        .status(StatusCode::OK)
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap()
}

/// Issues one HTTP/1.1 request over a raw socket and returns the raw
/// response text.
async fn raw_request(addr: SocketAddr, method: &str, target: &str, host: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    let request = format!("{method} {target} HTTP/1.1\r\nHost: {host}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.expect("write");

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.expect("read");
    String::from_utf8(response).expect("utf-8 response")
}

fn status_of(response: &str) -> u16 {
    response
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("status line")
}

async fn spawn_service(
    lifecycle: Lifecycle,
) -> (
    SocketAddr,
    tokio::task::JoinHandle<Result<(), talos_server::LifecycleError>>,
) {
    let mut bound = lifecycle.bound_addr();
    let handle = tokio::spawn(lifecycle.run_until_shutdown());

    let addr = tokio::time::timeout(Duration::from_secs(2), bound.wait_for(Option::is_some))
        .await
        .expect("listener should bind")
        .expect("lifecycle should not drop the sender")
        .expect("bound address");

    (addr, handle)
}

#[tokio::test]
async fn test_dispatch_matrix() {
    let mut registry = HandlerRegistry::new();
    registry.get("/health", "healthCheck", handler_fn(|_ctx, _req| async { ok_body("healthy") }));
    registry.get(
        "/users/{id}",
        "getUser",
        handler_fn(|_ctx, req| async move {
            let params = req
                .extensions()
                .get::<talos_router::Params>()
                .cloned()
                .unwrap_or_default();
            let body = format!("user {}", params.get("id").unwrap_or("?"));
            http::Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::from(body)))
                .unwrap()
        }),
    );
    registry.register(
        "admin.example.com",
        http::Method::GET,
        "/ops",
        "adminOps",
        handler_fn(|_ctx, _req| async { ok_body("admin") }),
    );

    let lifecycle = Lifecycle::new(test_config(), registry);
    let shutdown = lifecycle.shutdown_handle();
    let (addr, handle) = spawn_service(lifecycle).await;

    // Matched route.
    let response = raw_request(addr, "GET", "/health", "localhost").await;
    assert_eq!(status_of(&response), 200);
    assert!(response.ends_with("healthy"));

    // Path parameter extraction.
    let response = raw_request(addr, "GET", "/users/42", "localhost").await;
    assert_eq!(status_of(&response), 200);
    assert!(response.ends_with("user 42"));

    // Unknown path.
    let response = raw_request(addr, "GET", "/missing", "localhost").await;
    assert_eq!(status_of(&response), 404);

    // Known path, wrong method, with Allow header.
    let response = raw_request(addr, "DELETE", "/health", "localhost").await;
    assert_eq!(status_of(&response), 405);
    assert!(response.to_lowercase().contains("allow: get"));

    // Host-scoped route, reachable only under its host.
    let response = raw_request(addr, "GET", "/ops", "admin.example.com").await;
    assert_eq!(status_of(&response), 200);
    let response = raw_request(addr, "GET", "/ops", "public.example.com").await;
    assert_eq!(status_of(&response), 404);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("lifecycle should stop")
        .expect("no panic")
        .expect("clean shutdown");
}

#[tokio::test]
async fn test_panicking_handler_returns_500_and_service_survives() {
    let mut registry = HandlerRegistry::new();
    registry.get("/boom", "boom", handler_fn(|_ctx, _req| async { panic!("handler bug") }));
    registry.get("/health", "healthCheck", handler_fn(|_ctx, _req| async { ok_body("healthy") }));

    let lifecycle = Lifecycle::new(test_config(), registry);
    let shutdown = lifecycle.shutdown_handle();
    let (addr, handle) = spawn_service(lifecycle).await;

    let response = raw_request(addr, "GET", "/boom", "localhost").await;
    assert_eq!(status_of(&response), 500);

    // The panic took down its request only.
    let response = raw_request(addr, "GET", "/health", "localhost").await;
    assert_eq!(status_of(&response), 200);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("lifecycle should stop")
        .expect("no panic")
        .expect("clean shutdown");
}

#[tokio::test]
async fn test_in_flight_requests_finish_during_drain() {
    let mut registry = HandlerRegistry::new();
    registry.get(
        "/slow",
        "slowOp",
        handler_fn(|_ctx, _req| async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            ok_body("slow done")
        }),
    );

    let lifecycle = Lifecycle::new(test_config(), registry);
    let shutdown = lifecycle.shutdown_handle();
    let state = lifecycle.state();
    let (addr, handle) = spawn_service(lifecycle).await;

    let mut clients = Vec::new();
    for _ in 0..4 {
        clients.push(tokio::spawn(async move {
            raw_request(addr, "GET", "/slow", "localhost").await
        }));
    }

    // Let the requests reach the handlers, then stop the service.
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.trigger();

    // The listener is gone once the drain starts: new connections are
    // refused while the in-flight requests below still finish.
    tokio::time::sleep(Duration::from_millis(50)).await;
    match TcpStream::connect(addr).await {
        Err(_) => {}
        Ok(mut stream) => {
            // A connection picked up from the accept backlog gets no service.
            let late = b"GET /slow HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n";
            let _ = stream.write_all(late).await;
            let mut response = Vec::new();
            let _ = stream.read_to_end(&mut response).await;
            assert!(response.is_empty(), "draining service must not answer new connections");
        }
    }

    for client in clients {
        let response = tokio::time::timeout(Duration::from_secs(2), client)
            .await
            .expect("in-flight request should complete")
            .expect("client should not panic");
        assert_eq!(status_of(&response), 200);
        assert!(response.ends_with("slow done"));
    }

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("lifecycle should stop")
        .expect("no panic")
        .expect("clean shutdown");
    assert_eq!(state.current(), ServerState::Stopped);
}

#[tokio::test]
async fn test_drain_deadline_abandons_stuck_requests() {
    let mut registry = HandlerRegistry::new();
    registry.get(
        "/stuck",
        "stuckOp",
        handler_fn(|_ctx, _req| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            ok_body("never")
        }),
    );

    let config = TalosConfig {
        listen: "127.0.0.1:0".to_string(),
        drain_deadline_secs: Some(1),
        ..TalosConfig::default()
    };
    let lifecycle = Lifecycle::new(config, registry);
    let shutdown = lifecycle.shutdown_handle();
    let (addr, handle) = spawn_service(lifecycle).await;

    let _client = tokio::spawn(async move {
        raw_request(addr, "GET", "/stuck", "localhost").await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.trigger();

    // The stuck request cannot finish, so the deadline must end the drain.
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("drain deadline should end the lifecycle")
        .expect("no panic")
        .expect("deadline expiry is not an error");
}

#[tokio::test]
async fn test_forced_shutdown_cuts_drain_short() {
    let mut registry = HandlerRegistry::new();
    registry.get(
        "/stuck",
        "stuckOp",
        handler_fn(|_ctx, _req| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            ok_body("never")
        }),
    );

    // No deadline: only a forced stop can end this drain.
    let config = TalosConfig {
        listen: "127.0.0.1:0".to_string(),
        drain_deadline_secs: None,
        ..TalosConfig::default()
    };
    let lifecycle = Lifecycle::new(config, registry);
    let shutdown = lifecycle.shutdown_handle();
    let forced = lifecycle.forced_handle();
    let (addr, handle) = spawn_service(lifecycle).await;

    let _client = tokio::spawn(async move {
        raw_request(addr, "GET", "/stuck", "localhost").await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(50)).await;
    forced.trigger();

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("forced stop should end the lifecycle")
        .expect("no panic")
        .expect("forced stop is not an error");
}

#[tokio::test]
async fn test_debug_endpoint_gated_by_config() {
    let registry = HandlerRegistry::new();
    let lifecycle = Lifecycle::new(test_config(), registry);
    let shutdown = lifecycle.shutdown_handle();
    let (addr, handle) = spawn_service(lifecycle).await;

    // Off by default.
    let response = raw_request(addr, "GET", "/debug/vars", "localhost").await;
    assert_eq!(status_of(&response), 404);

    shutdown.trigger();
    handle.await.unwrap().unwrap();

    // Enabled by configuration.
    let config = TalosConfig {
        listen: "127.0.0.1:0".to_string(),
        debug_endpoints: true,
        ..TalosConfig::default()
    };
    let lifecycle = Lifecycle::new(config, HandlerRegistry::new());
    let shutdown = lifecycle.shutdown_handle();
    let (addr, handle) = spawn_service(lifecycle).await;

    let response = raw_request(addr, "GET", "/debug/vars", "localhost").await;
    assert_eq!(status_of(&response), 200);
    assert!(response.contains("\"state\":\"serving\""));

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_truncated_body_yields_counted_400() {
    let config = TalosConfig {
        listen: "127.0.0.1:0".to_string(),
        debug_endpoints: true,
        ..TalosConfig::default()
    };
    let lifecycle = Lifecycle::new(config, HandlerRegistry::new());
    let shutdown = lifecycle.shutdown_handle();
    let (addr, handle) = spawn_service(lifecycle).await;

    // Promise 100 body bytes, send 3, then close the write half: the body
    // read fails before dispatch ever runs.
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    let partial =
        b"POST /ingest HTTP/1.1\r\nHost: localhost\r\nContent-Length: 100\r\nConnection: close\r\n\r\nabc";
    stream.write_all(partial).await.expect("write");
    stream.shutdown().await.expect("half-close");

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.expect("read");
    let response = String::from_utf8(response).expect("utf-8 response");
    assert_eq!(status_of(&response), 400);

    // The failed request went through the pipeline like any other.
    let vars = raw_request(addr, "GET", "/debug/vars", "localhost").await;
    assert!(vars.contains("\"client_error\":1"));

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[derive(Debug)]
struct OrderedStore {
    events: Arc<std::sync::Mutex<Vec<&'static str>>>,
    closes: Arc<AtomicUsize>,
}

impl Datastore for OrderedStore {
    fn name(&self) -> &str {
        "ordered"
    }

    fn open(&mut self) -> BoxFuture<'_, Result<(), DatastoreError>> {
        Box::pin(async move {
            self.events.lock().unwrap().push("open");
            Ok(())
        })
    }

    fn close(&mut self) -> BoxFuture<'_, Result<(), DatastoreError>> {
        Box::pin(async move {
            self.events.lock().unwrap().push("close");
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

#[tokio::test]
async fn test_datastore_closes_once_after_requests_drain() {
    let events = Arc::new(std::sync::Mutex::new(Vec::new()));
    let closes = Arc::new(AtomicUsize::new(0));

    let store_events = Arc::clone(&events);
    let request_events = Arc::clone(&events);

    let mut registry = HandlerRegistry::new();
    registry.get(
        "/work",
        "workOp",
        handler_fn(move |_ctx, _req| {
            let events = Arc::clone(&request_events);
            async move {
                tokio::time::sleep(Duration::from_millis(150)).await;
                events.lock().unwrap().push("request done");
                ok_body("worked")
            }
        }),
    );

    let lifecycle = Lifecycle::new(test_config(), registry).with_datastore(OrderedStore {
        events: store_events,
        closes: Arc::clone(&closes),
    });
    let shutdown = lifecycle.shutdown_handle();
    let (addr, handle) = spawn_service(lifecycle).await;

    let client = tokio::spawn(async move {
        raw_request(addr, "GET", "/work", "localhost").await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.trigger();

    let response = client.await.unwrap();
    assert_eq!(status_of(&response), 200);

    handle.await.unwrap().unwrap();

    // The datastore closed exactly once, strictly after the last request.
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    let log = events.lock().unwrap().clone();
    assert_eq!(log, vec!["open", "request done", "close"]);
}
