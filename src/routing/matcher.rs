//! Inbound path matching.
//!
//! # Responsibilities
//! - Split `/api/{service}/{rest}` into logical service name and downstream path
//! - Match downstream path prefixes (stream classification)
//!
//! # Design Decisions
//! - Works on the raw (still percent-encoded) path so the downstream path is forwarded verbatim
//! - Prefix matching is case-sensitive, like the paths themselves
//! - No regex to guarantee O(n) matching

/// Path prefix every routed request starts with.
pub const API_PREFIX: &str = "/api/";

/// An inbound path split into its routing parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundPath<'a> {
    /// Logical service name, exactly as the client sent it.
    pub service: &'a str,
    /// Remainder after the service segment, without the separating slash. May be empty.
    pub downstream: &'a str,
}

impl<'a> InboundPath<'a> {
    /// Parse a raw request path. Returns `None` when the path is not under `/api/`
    /// or the service segment is empty.
    pub fn parse(path: &'a str) -> Option<Self> {
        let rest = path.strip_prefix(API_PREFIX)?;
        let (service, downstream) = match rest.split_once('/') {
            Some((service, downstream)) => (service, downstream),
            None => (rest, ""),
        };
        if service.is_empty() {
            return None;
        }
        Some(Self { service, downstream })
    }
}

/// Matches the downstream path against a prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher. Leading slashes are ignored on both sides.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_start_matches('/').to_string(),
        }
    }

    pub fn matches(&self, downstream_path: &str) -> bool {
        downstream_path.trim_start_matches('/').starts_with(&self.prefix)
    }
}
