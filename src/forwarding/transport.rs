//! Downstream transport.
//!
//! # Responsibilities
//! - Send one outbound request over the shared connection pool
//! - Resolve as soon as response headers arrive (the body stays a stream)
//! - Classify failures as connect vs. protocol errors
//!
//! # Design Decisions
//! - A trait seam so the engine can be exercised without sockets
//! - The pool (hyper-util legacy client) is shared and safe for concurrent use
//! - With prior knowledge enabled a second, HTTP/2-only pool carries HTTP/2 requests;
//!   HTTP/1.x requests always use the HTTP/1 pool so the version is never raised
//! - No retries: request bodies are streamed and cannot be replayed

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, Version};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};

use crate::config::{DownstreamConfig, TimeoutConfig};

/// Why a request never produced downstream response headers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// TCP connect, DNS or connect timeout.
    #[error("connect failed: {0}")]
    Connect(String),
    /// The connection broke or the peer spoke invalid HTTP.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Sends outbound requests to downstream services.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return once response headers are available.
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, TransportError>;

    /// Highest protocol version this transport can speak. Requests are downgraded to it.
    fn max_version(&self) -> Version {
        Version::HTTP_11
    }
}

/// Transport backed by pooled hyper clients.
#[derive(Clone)]
pub struct HyperTransport {
    http1: Client<HttpConnector, Body>,
    /// Present only with `http2_prior_knowledge`.
    http2: Option<Client<HttpConnector, Body>>,
}

impl HyperTransport {
    pub fn new(timeouts: &TimeoutConfig, downstream: &DownstreamConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_nodelay(true);
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let build = |http2_only: bool| {
            Client::builder(TokioExecutor::new())
                .pool_timer(TokioTimer::new())
                .pool_idle_timeout(Duration::from_secs(downstream.pool_idle_timeout_secs))
                .pool_max_idle_per_host(downstream.pool_max_idle_per_host)
                .http2_only(http2_only)
                .build(connector.clone())
        };

        let http1 = build(false);
        let http2 = downstream.http2_prior_knowledge.then(|| build(true));

        Self { http1, http2 }
    }

    /// The pool that speaks the request's version.
    fn client_for(&self, version: Version) -> &Client<HttpConnector, Body> {
        match &self.http2 {
            Some(http2) if version == Version::HTTP_2 => http2,
            _ => &self.http1,
        }
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, TransportError> {
        let client = self.client_for(request.version());
        match client.request(request).await {
            Ok(response) => Ok(into_axum(response)),
            Err(e) if e.is_connect() => Err(TransportError::Connect(describe(&e))),
            Err(e) => Err(TransportError::Protocol(describe(&e))),
        }
    }

    fn max_version(&self) -> Version {
        if self.http2.is_some() {
            Version::HTTP_2
        } else {
            Version::HTTP_11
        }
    }
}

/// Box the hyper body so it can be relayed as an axum body. Nothing is read here.
fn into_axum(response: Response<Incoming>) -> Response<Body> {
    response.map(Body::new)
}

/// Flatten an error and its sources into one line.
fn describe(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
