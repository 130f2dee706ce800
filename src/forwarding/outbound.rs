//! Outbound request construction.
//!
//! # Responsibilities
//! - Copy method verbatim and point the request at the resolved target
//! - Negotiate the protocol version (downgrade only)
//! - Attach the inbound body as a stream when the request carries content
//! - Copy headers through the hop-by-hop filter

use axum::body::{Body, HttpBody};
use axum::http::{header, request, HeaderMap, Method, Request, Uri, Version};

use crate::security::headers::copy_request_headers;

/// Map a protocol label such as `HTTP/1.1` to a version. Unknown or empty labels mean HTTP/1.1.
pub fn parse_protocol(label: &str) -> Version {
    let label = label.trim();
    let Some(number) = label
        .get(..5)
        .filter(|scheme| scheme.eq_ignore_ascii_case("HTTP/"))
        .map(|_| &label[5..])
    else {
        return Version::HTTP_11;
    };

    let mut parts = number.splitn(2, '.');
    match (parts.next(), parts.next()) {
        (Some("1"), Some("0")) => Version::HTTP_10,
        (Some("1"), Some("1")) => Version::HTTP_11,
        (Some("2"), _) => Version::HTTP_2,
        _ => Version::HTTP_11,
    }
}

/// The label the serving layer reports for a version.
pub fn protocol_label(version: Version) -> &'static str {
    if version == Version::HTTP_09 {
        "HTTP/0.9"
    } else if version == Version::HTTP_10 {
        "HTTP/1.0"
    } else if version == Version::HTTP_11 {
        "HTTP/1.1"
    } else if version == Version::HTTP_2 {
        "HTTP/2"
    } else if version == Version::HTTP_3 {
        "HTTP/3"
    } else {
        ""
    }
}

/// Version to send: the inbound version, lowered to what the transport speaks. Never raised.
pub fn negotiate_version(inbound: Version, ceiling: Version) -> Version {
    std::cmp::min(parse_protocol(protocol_label(inbound)), ceiling)
}

/// Methods that conventionally carry a request body.
pub fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

/// The last transfer coding is `chunked`.
pub fn is_chunked(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::TRANSFER_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .last()
        .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}

/// Positive Content-Length, if any.
pub fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|len| *len > 0)
}

/// Whether the inbound request says it has content.
///
/// HTTP/2 has no chunked coding and Content-Length is optional, so an open body stream counts.
fn has_content(parts: &request::Parts, body: &Body) -> bool {
    content_length(&parts.headers).is_some()
        || is_chunked(&parts.headers)
        || (parts.version == Version::HTTP_2 && !body.is_end_stream())
}

/// Build the outbound request. The body is moved, never buffered.
pub fn build(parts: &request::Parts, body: Body, target: Uri, ceiling: Version) -> Request<Body> {
    let attach = carries_body(&parts.method) && has_content(parts, &body);

    let mut outbound = Request::new(Body::empty());
    *outbound.method_mut() = parts.method.clone();
    *outbound.uri_mut() = target;
    *outbound.version_mut() = negotiate_version(parts.version, ceiling);

    let headers = outbound.headers_mut();
    copy_request_headers(&parts.headers, headers, attach);

    if attach {
        for value in parts.headers.get_all(header::CONTENT_TYPE) {
            headers.append(header::CONTENT_TYPE, value.clone());
        }
        let chunked = is_chunked(&parts.headers);
        if !chunked {
            if let Some(value) = parts.headers.get(header::CONTENT_LENGTH) {
                headers.insert(header::CONTENT_LENGTH, value.clone());
            }
        }
        // Inbound bodies are forward-only streams; nothing can have been consumed before us.
        tracing::debug!(
            content_length = ?content_length(&parts.headers),
            chunked,
            "Attaching inbound body as stream"
        );
        *outbound.body_mut() = body;
    }

    outbound
}
