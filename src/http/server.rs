//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: `/api/{*rest}` for forwarding, `/health` for liveness
//! - Wire up middleware (request ID, tracing, panic recovery)
//! - Tie each forward to a cancellation token that fires when the client goes away
//! - Serve until the shutdown signal, then drain in-flight requests

use std::any::Any;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::forwarding::{Forwarded, ForwardingEngine};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::lifecycle::shutdown::wait as wait_for_shutdown;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ForwardingEngine>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server whose engine is built from `config`.
    pub fn new(config: GatewayConfig) -> Self {
        let engine = Arc::new(ForwardingEngine::from_config(&config));
        Self::with_engine(config, engine)
    }

    /// Create a server around an existing engine.
    pub fn with_engine(config: GatewayConfig, engine: Arc<ForwardingEngine>) -> Self {
        let router = build_router(AppState { engine });
        Self { router, config }
    }

    /// Run the server, accepting connections on the given listener until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            services = self.config.services.0.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The router, for serving it with a different runtime setup.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Build the Axum router with all middleware layers.
///
/// Layers are listed innermost first; the request ID is assigned before the trace span opens.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/{*rest}", any(gateway_handler))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                request_id = %request_id(request.headers()),
                method = %request.method(),
                path = %request.uri().path(),
            )
        }))
        .layer(set_request_id_layer())
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Forward one request.
///
/// If the connection drops before the engine returns, this future is dropped with it and the
/// guard cancels the token, aborting the downstream call.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    let forwarded = state.engine.forward(request, cancel).await;
    let _ = guard.disarm();

    match forwarded {
        Forwarded::Relayed(response) => response,
        Forwarded::ClientGone => (client_closed_request(), Body::empty()).into_response(),
    }
}

/// Non-standard 499, used only for logs and metrics since nobody is listening.
fn client_closed_request() -> StatusCode {
    StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let reason = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(reason = %reason, "Handler panicked");
    GatewayError::Internal { reason }.into_response()
}
