//! Gateway error taxonomy.
//!
//! Every way a forward can fail maps to exactly one variant, and every variant maps to a
//! fixed status/message pair. Downstream 4xx/5xx responses are not errors here: they are
//! relayed verbatim. A client that went away is not an error either.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub const UNREACHABLE_MESSAGE: &str = "Cannot reach downstream service";
pub const TIMEOUT_MESSAGE: &str = "Downstream service timed out";
pub const INTERNAL_MESSAGE: &str = "Internal gateway error";

/// Errors that can occur while forwarding a request.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The logical service name is not in the route table. No network call was made.
    #[error("service '{service}' not found")]
    ServiceNotFound { service: String },

    /// Connect, DNS or protocol failure talking to the downstream service.
    #[error("downstream '{service}' unreachable: {reason}")]
    Unreachable { service: String, reason: String },

    /// The downstream service did not answer within the deadline.
    #[error("downstream '{service}' timed out")]
    Timeout { service: String },

    /// Anything else that went wrong inside the gateway.
    #[error("internal gateway error: {reason}")]
    Internal { reason: String },
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::ServiceNotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::Unreachable { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client. Never includes internal detail.
    pub fn public_message(&self) -> String {
        match self {
            GatewayError::ServiceNotFound { service } if service.is_empty() => {
                "Service not found".to_string()
            }
            GatewayError::ServiceNotFound { service } => format!("Service '{service}' not found"),
            GatewayError::Unreachable { .. } => UNREACHABLE_MESSAGE.to_string(),
            GatewayError::Timeout { .. } => TIMEOUT_MESSAGE.to_string(),
            GatewayError::Internal { .. } => INTERNAL_MESSAGE.to_string(),
        }
    }

    /// Metrics label.
    pub fn outcome(&self) -> &'static str {
        match self {
            GatewayError::ServiceNotFound { .. } => "not_found",
            GatewayError::Unreachable { .. } => "unreachable",
            GatewayError::Timeout { .. } => "timeout",
            GatewayError::Internal { .. } => "internal",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}
