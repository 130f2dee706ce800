//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::{Path, Request};
use axum::http::{HeaderMap, Response, StatusCode, Version};
use axum::response::IntoResponse;
use axum::routing::{any, get};
use axum::Router;
use futures_util::Stream;
use tokio::net::TcpListener;

use service_gateway::config::{GatewayConfig, ServiceConfig};
use service_gateway::forwarding::{ForwardingEngine, Transport, TransportError};
use service_gateway::http::HttpServer;
use service_gateway::lifecycle::Shutdown;
use service_gateway::routing::ServiceTable;

pub const DOWNLOAD_SIZE: usize = 256 * 1024;

/// Deterministic payload for download tests.
pub fn download_payload() -> Vec<u8> {
    (0..DOWNLOAD_SIZE).map(|i| (i % 251) as u8).collect()
}

/// What the mock downstream saw.
pub fn echo_json(method: &str, uri: &str, version: Version, headers: &HeaderMap, body: &[u8]) -> serde_json::Value {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        map.entry(name.as_str().to_string())
            .or_default()
            .push(value.to_str().unwrap_or("").to_string());
    }
    serde_json::json!({
        "method": method,
        "uri": uri,
        "version": format!("{version:?}"),
        "headers": map,
        "body": String::from_utf8_lossy(body),
    })
}

async fn echo(request: Request) -> impl IntoResponse {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    let json = echo_json(
        parts.method.as_str(),
        &parts.uri.to_string(),
        parts.version,
        &parts.headers,
        &body,
    );
    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .header("x-downstream", "echo")
        .header("proxy-authenticate", "Basic")
        .body(Body::from(json.to_string()))
        .unwrap()
}

async fn status(Path((_service, code)): Path<(String, u16)>) -> Response<Body> {
    Response::builder()
        .status(code)
        .header("x-downstream", "status")
        .body(Body::from(format!("downstream said {code}")))
        .unwrap()
}

async fn untyped() -> Response<Body> {
    Response::builder().status(StatusCode::OK).body(Body::from("{\"ok\":true}")).unwrap()
}

async fn download(Path((_service, _name)): Path<(String, String)>) -> Response<Body> {
    let chunks: Vec<Result<Bytes, Infallible>> = download_payload()
        .chunks(16 * 1024)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/octet-stream")
        .body(Body::from_stream(futures_util::stream::iter(chunks)))
        .unwrap()
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "too late"
}

/// Start a mock downstream on an ephemeral port.
///
/// Routes:
/// - `/api/{service}/echo`: JSON description of the received request
/// - `/api/{service}/status/{code}`: that status, no Content-Type
/// - `/api/{service}/untyped`: 200 without Content-Type
/// - `/api/{service}/download/{name}`: streamed binary payload
/// - `/api/{service}/slow`: answers after five seconds
pub async fn start_downstream() -> SocketAddr {
    let app = Router::new()
        .route("/api/{service}/echo", any(echo))
        .route("/api/{service}/status/{code}", any(status))
        .route("/api/{service}/untyped", get(untyped))
        .route("/api/{service}/download/{name}", get(download))
        .route("/api/{service}/slow", get(slow));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Config with the three standard services pointed at `downstream`.
pub fn config_for(downstream: SocketAddr) -> GatewayConfig {
    let base = format!("http://{downstream}");
    let mut config = GatewayConfig::default();
    config.services.0.clear();
    config.services.push(ServiceConfig::new("auth", base.clone()));
    config.services.push(ServiceConfig::new("file", base.clone()).with_stream_prefix("download/"));
    config.services.push(ServiceConfig::new("search", base));
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config
}

/// A running gateway. Dropping it shuts the server down.
pub struct Gateway {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl Gateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `engine` on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig, engine: ForwardingEngine) -> Gateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let server = HttpServer::with_engine(config, Arc::new(engine));
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    Gateway { addr, shutdown }
}

/// Serve a gateway with the real transport built from `config`.
pub async fn start_default_gateway(config: GatewayConfig) -> Gateway {
    let engine = ForwardingEngine::from_config(&config);
    start_gateway(config, engine).await
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Engine over a test transport with the given deadline.
pub fn engine_with(transport: Arc<dyn Transport>, deadline: Duration) -> ForwardingEngine {
    let config = config_for("127.0.0.1:9".parse().unwrap());
    ForwardingEngine::new(ServiceTable::from_config(&config.services), transport, deadline)
}

/// Snapshot of an outbound request.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub uri: String,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Records every request and answers with a fixed response.
pub struct RecordingTransport {
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<Recorded>>,
    status: StatusCode,
    content_type: Option<&'static str>,
    body: &'static str,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::answering(StatusCode::OK, Some("application/json"), "{}")
    }

    pub fn answering(status: StatusCode, content_type: Option<&'static str>, body: &'static str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            status,
            content_type,
            body,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last(&self) -> Recorded {
        self.requests.lock().unwrap().last().cloned().expect("no request recorded")
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: axum::http::Request<Body>) -> Result<Response<Body>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
        self.requests.lock().unwrap().push(Recorded {
            method: parts.method.to_string(),
            uri: parts.uri.to_string(),
            version: parts.version,
            headers: parts.headers,
            body,
        });

        let mut builder = Response::builder()
            .status(self.status)
            .header("connection", "close, x-hop")
            .header("x-hop", "1")
            .header("keep-alive", "timeout=5")
            .header("x-downstream", "recorded");
        if let Some(ct) = self.content_type {
            builder = builder.header("content-type", ct);
        }
        Ok(builder.body(Body::from(self.body)).unwrap())
    }
}

/// Always fails with the given error.
pub struct FailingTransport(pub TransportError);

#[async_trait]
impl Transport for FailingTransport {
    async fn send(&self, _request: axum::http::Request<Body>) -> Result<Response<Body>, TransportError> {
        Err(self.0.clone())
    }
}

/// Never answers. Tracks whether the pending send was dropped.
#[derive(Default)]
pub struct StalledTransport {
    pub calls: AtomicUsize,
    pub dropped: Arc<AtomicBool>,
}

struct SetOnDrop(Arc<AtomicBool>);

impl Drop for SetOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for StalledTransport {
    async fn send(&self, _request: axum::http::Request<Body>) -> Result<Response<Body>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _guard = SetOnDrop(self.dropped.clone());
        std::future::pending().await
    }
}

/// Panics inside the handler.
pub struct PanickingTransport;

#[async_trait]
impl Transport for PanickingTransport {
    async fn send(&self, _request: axum::http::Request<Body>) -> Result<Response<Body>, TransportError> {
        panic!("transport exploded");
    }
}

/// Body stream that counts how many chunks were pulled and whether it was dropped.
///
/// With `stall_after`, the stream stays pending after that many chunks.
/// With `fail_after`, it yields an error after that many chunks.
pub struct CountingStream {
    chunks: Vec<Bytes>,
    next: usize,
    pub pulled: Arc<AtomicUsize>,
    pub dropped: Arc<AtomicBool>,
    stall_after: Option<usize>,
    fail_after: Option<usize>,
}

impl CountingStream {
    pub fn new(chunks: Vec<Bytes>) -> Self {
        Self {
            chunks,
            next: 0,
            pulled: Arc::new(AtomicUsize::new(0)),
            dropped: Arc::new(AtomicBool::new(false)),
            stall_after: None,
            fail_after: None,
        }
    }

    pub fn stall_after(mut self, n: usize) -> Self {
        self.stall_after = Some(n);
        self
    }

    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

impl Stream for CountingStream {
    type Item = Result<Bytes, std::io::Error>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.stall_after == Some(this.next) {
            return Poll::Pending;
        }
        if this.fail_after == Some(this.next) {
            return Poll::Ready(Some(Err(std::io::Error::other("downstream reset"))));
        }
        match this.chunks.get(this.next).cloned() {
            Some(chunk) => {
                this.next += 1;
                this.pulled.fetch_add(1, Ordering::SeqCst);
                Poll::Ready(Some(Ok(chunk)))
            }
            None => Poll::Ready(None),
        }
    }
}

impl Drop for CountingStream {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

/// Answers once with a 200 whose body is a prepared [`CountingStream`].
pub struct StreamingTransport {
    stream: Mutex<Option<CountingStream>>,
}

impl StreamingTransport {
    pub fn new(stream: CountingStream) -> Self {
        Self { stream: Mutex::new(Some(stream)) }
    }
}

#[async_trait]
impl Transport for StreamingTransport {
    async fn send(&self, _request: axum::http::Request<Body>) -> Result<Response<Body>, TransportError> {
        let stream = self
            .stream
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| TransportError::Protocol("stream already taken".into()))?;
        Ok(Response::builder()
            .status(StatusCode::OK)
            .header("content-type", "application/octet-stream")
            .body(Body::from_stream(stream))
            .unwrap())
    }
}

/// Chunks `"chunk-0"`, `"chunk-1"`, ...
pub fn numbered_chunks(n: usize) -> Vec<Bytes> {
    (0..n).map(|i| Bytes::from(format!("chunk-{i};"))).collect()
}
