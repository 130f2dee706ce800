//! The forwarding engine.
//!
//! One call to [`ForwardingEngine::forward`] handles one inbound request end to end:
//! resolve the service, build the outbound request, dispatch it, relay the response.
//! The engine holds only the immutable route table and the shared transport.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, Response};
use axum::response::IntoResponse;
use tokio_util::sync::CancellationToken;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::forwarding::outbound;
use crate::forwarding::transport::{HyperTransport, Transport, TransportError};
use crate::http::response::{relay, RelayContext};
use crate::observability::metrics;
use crate::resilience::timeouts::{guarded, Guarded};
use crate::routing::{InboundPath, ServiceTable, API_PREFIX};

/// Result of a forward.
#[derive(Debug)]
pub enum Forwarded {
    /// A response for the client: relayed from downstream or a gateway error.
    Relayed(Response<Body>),
    /// The client disconnected; nothing is sent.
    ClientGone,
}

/// Outcome of a single downstream call.
#[derive(Debug)]
pub enum Dispatch {
    Response(Response<Body>),
    ConnectFailure(TransportError),
    Timeout,
    Cancelled,
}

pub struct ForwardingEngine {
    table: ServiceTable,
    transport: Arc<dyn Transport>,
    deadline: Duration,
}

impl ForwardingEngine {
    pub fn new(table: ServiceTable, transport: Arc<dyn Transport>, deadline: Duration) -> Self {
        Self { table, transport, deadline }
    }

    /// Engine with the pooled hyper transport described by `config`.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let transport = HyperTransport::new(&config.timeouts, &config.downstream);
        Self::new(
            ServiceTable::from_config(&config.services),
            Arc::new(transport),
            Duration::from_secs(config.timeouts.request_secs),
        )
    }

    pub fn table(&self) -> &ServiceTable {
        &self.table
    }

    /// Forward one request. Never fails: every error becomes a response.
    ///
    /// Metrics carry the configured route name, or `unknown` when nothing resolved, so the
    /// label set stays bounded by the route table.
    pub async fn forward(&self, request: Request<Body>, cancel: CancellationToken) -> Forwarded {
        let start = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let mut resolved = None;
        let result = self.try_forward(request, &cancel, &mut resolved).await;
        let service = resolved.unwrap_or(metrics::UNKNOWN_SERVICE);

        match result {
            Ok(Forwarded::Relayed(response)) => {
                metrics::record_request(service, response.status().as_u16(), "relayed", start);
                Forwarded::Relayed(response)
            }
            Ok(Forwarded::ClientGone) => {
                tracing::info!(%method, %path, service, "Client disconnected; dropping request");
                metrics::record_request(service, 499, "client_gone", start);
                Forwarded::ClientGone
            }
            Err(err) => {
                match &err {
                    GatewayError::ServiceNotFound { .. } | GatewayError::Timeout { .. } => {
                        tracing::warn!(%method, %path, error = %err, "Forward failed")
                    }
                    GatewayError::Unreachable { .. } | GatewayError::Internal { .. } => {
                        tracing::error!(%method, %path, error = %err, "Forward failed")
                    }
                }
                metrics::record_request(service, err.status().as_u16(), err.outcome(), start);
                Forwarded::Relayed(err.into_response())
            }
        }
    }

    async fn try_forward<'a>(
        &'a self,
        request: Request<Body>,
        cancel: &CancellationToken,
        resolved: &mut Option<&'a str>,
    ) -> Result<Forwarded, GatewayError> {
        let (parts, body) = request.into_parts();
        let path = parts.uri.path();

        let inbound = InboundPath::parse(path).ok_or_else(|| GatewayError::ServiceNotFound {
            service: String::new(),
        })?;
        let route = self.table.resolve(inbound.service).ok_or_else(|| GatewayError::ServiceNotFound {
            service: inbound.service.to_string(),
        })?;
        *resolved = Some(route.name());

        let target = route
            .target_uri(inbound.service, inbound.downstream, parts.uri.query())
            .map_err(|e| GatewayError::Internal {
                reason: format!("invalid target for '{}': {e}", route.name()),
            })?;

        tracing::debug!(
            method = %parts.method,
            service = route.name(),
            target = %target,
            "Forwarding request"
        );

        let outbound = outbound::build(&parts, body, target, self.transport.max_version());

        let response = match self.dispatch(outbound, cancel).await {
            Dispatch::Response(response) => response,
            Dispatch::Cancelled => return Ok(Forwarded::ClientGone),
            Dispatch::Timeout => {
                return Err(GatewayError::Timeout { service: route.name().to_string() });
            }
            Dispatch::ConnectFailure(e) => {
                return Err(GatewayError::Unreachable {
                    service: route.name().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let ctx = RelayContext {
            service: route.name(),
            streaming_route: route.streams(inbound.downstream),
            api_path: path.contains(API_PREFIX),
        };
        relay(response, ctx, cancel).await
    }

    /// Send the request, racing the deadline and the client's cancellation.
    pub async fn dispatch(&self, request: Request<Body>, cancel: &CancellationToken) -> Dispatch {
        match guarded(self.transport.send(request), self.deadline, cancel).await {
            Guarded::Completed(Ok(response)) => Dispatch::Response(response),
            Guarded::Completed(Err(e)) => Dispatch::ConnectFailure(e),
            Guarded::Elapsed => Dispatch::Timeout,
            Guarded::Cancelled => Dispatch::Cancelled,
        }
    }
}
