//! Response relay.
//!
//! # Responsibilities
//! - Copy status and filtered headers from the downstream response
//! - Pick the relay path: stream, buffered success, or downstream error
//! - Default Content-Type for buffered bodies
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body (file downloads)
//! - Downstream 4xx/5xx are relayed verbatim, never reinterpreted
//! - Buffered reads observe client cancellation

use axum::body::{self, Body};
use axum::http::{header, HeaderValue, Response, StatusCode};
use tokio_util::sync::CancellationToken;

use crate::error::GatewayError;
use crate::forwarding::Forwarded;
use crate::http::stream::StreamRelay;
use crate::resilience::timeouts::cancellable;
use crate::security::headers::copy_response_headers;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
pub const ERROR_CONTENT_TYPE: &str = "text/plain";

/// How a downstream response is returned to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPath {
    /// 2xx on a streaming route: body copied chunk by chunk.
    Stream,
    /// Any other 2xx: body read into memory first.
    Buffered,
    /// Non-2xx: body read into memory and relayed with the downstream status.
    Error,
}

impl RelayPath {
    pub fn classify(status: StatusCode, streaming_route: bool) -> Self {
        match (status.is_success(), streaming_route) {
            (true, true) => RelayPath::Stream,
            (true, false) => RelayPath::Buffered,
            (false, _) => RelayPath::Error,
        }
    }
}

/// Per-request facts the relay needs.
#[derive(Debug, Clone, Copy)]
pub struct RelayContext<'a> {
    pub service: &'a str,
    /// The downstream path is configured for streaming.
    pub streaming_route: bool,
    /// The inbound request path contains `/api/`.
    pub api_path: bool,
}

/// Default Content-Type for a buffered success.
pub fn default_content_type(api_path: bool) -> HeaderValue {
    HeaderValue::from_static(if api_path { JSON_CONTENT_TYPE } else { TEXT_CONTENT_TYPE })
}

/// Turn a downstream response into the client response.
pub async fn relay(
    downstream: Response<Body>,
    ctx: RelayContext<'_>,
    cancel: &CancellationToken,
) -> Result<Forwarded, GatewayError> {
    let (parts, body) = downstream.into_parts();
    let path = RelayPath::classify(parts.status, ctx.streaming_route);
    let mut headers = copy_response_headers(&parts.headers);

    tracing::debug!(service = ctx.service, status = %parts.status, path = ?path, "Relaying downstream response");

    let body = match path {
        RelayPath::Stream => Body::from_stream(StreamRelay::new(body, cancel.clone(), ctx.service)),
        RelayPath::Buffered | RelayPath::Error => {
            let bytes = match cancellable(body::to_bytes(body, usize::MAX), cancel).await {
                None => return Ok(Forwarded::ClientGone),
                Some(Ok(bytes)) => bytes,
                Some(Err(e)) => {
                    return Err(GatewayError::Unreachable {
                        service: ctx.service.to_string(),
                        reason: format!("reading response body: {e}"),
                    })
                }
            };

            let content_type = parts.headers.get(header::CONTENT_TYPE).cloned().unwrap_or_else(|| {
                if path == RelayPath::Buffered {
                    default_content_type(ctx.api_path)
                } else {
                    HeaderValue::from_static(ERROR_CONTENT_TYPE)
                }
            });
            headers.insert(header::CONTENT_TYPE, content_type);
            Body::from(bytes)
        }
    };

    let mut response = Response::new(body);
    *response.status_mut() = parts.status;
    *response.headers_mut() = headers;
    Ok(Forwarded::Relayed(response))
}
