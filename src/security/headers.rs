//! Header filtering across the proxy boundary.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers from forwarded requests and relayed responses
//! - Keep content headers with the body they describe
//! - Build a fresh header map per request
//!
//! # Design Decisions
//! - Names are compared lowercased (`HeaderName` is always lowercase); values pass through untouched
//! - Multi-value headers are appended value by value, preserving order
//! - Only the fixed exclusion sets are filtered; everything else, including `Authorization`
//!   and names listed in a `Connection` header, passes through
//! - The serving layer adds `x-request-id` when the client sent none, so it reaches the
//!   downstream service as an ordinary inbound header
//! - A header that cannot be placed is dropped with a diagnostic, never an error

use axum::http::header::{self, HeaderMap, HeaderName};

/// Never copied onto the outbound request. Content-Type and Content-Length travel with the body.
pub const REQUEST_EXCLUDED: &[&str] = &[
    "host",
    "content-length",
    "content-type",
    "transfer-encoding",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "trailers",
    "upgrade",
];

/// Never relayed back to the client. Content-Length is recomputed by the serving layer.
pub const RESPONSE_EXCLUDED: &[&str] = &[
    "transfer-encoding",
    "connection",
    "upgrade",
    "content-length",
    "host",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "trailers",
];

/// Headers that describe a body rather than the message.
const CONTENT_HEADERS: &[&str] = &[
    "allow",
    "content-disposition",
    "content-encoding",
    "content-language",
    "content-location",
    "content-md5",
    "content-range",
    "expires",
    "last-modified",
];

fn listed(name: &HeaderName, list: &[&str]) -> bool {
    list.contains(&name.as_str())
}

/// Whether the header belongs to the body's header set.
pub fn is_content_header(name: &HeaderName) -> bool {
    listed(name, CONTENT_HEADERS) || *name == header::CONTENT_TYPE || *name == header::CONTENT_LENGTH
}

/// Copy inbound request headers onto a fresh outbound map.
///
/// Content headers other than Content-Type/Content-Length are only kept when a body is
/// attached; otherwise they are dropped. Returns the number of dropped content headers.
pub fn copy_request_headers(inbound: &HeaderMap, outbound: &mut HeaderMap, has_body: bool) -> usize {
    let mut dropped = 0;

    for (name, value) in inbound.iter() {
        if listed(name, REQUEST_EXCLUDED) {
            continue;
        }
        if is_content_header(name) && !has_body {
            tracing::debug!(header = %name, "Dropping content header: request has no body");
            dropped += 1;
            continue;
        }
        outbound.append(name.clone(), value.clone());
    }

    dropped
}

/// Build the response header map from a downstream response.
pub fn copy_response_headers(downstream: &HeaderMap) -> HeaderMap {
    let mut relayed = HeaderMap::with_capacity(downstream.len());

    for (name, value) in downstream.iter() {
        if listed(name, RESPONSE_EXCLUDED) {
            continue;
        }
        if let Err(e) = relayed.try_append(name.clone(), value.clone()) {
            tracing::warn!(header = %name, error = %e, "Failed to relay response header");
        }
    }

    relayed
}
