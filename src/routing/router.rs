//! Route lookup.
//!
//! # Responsibilities
//! - Store the service table (logical name → base URL)
//! - Resolve a logical service name, case-insensitively
//! - Build the downstream target URI
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) lookup via HashMap keyed by the lowercased name
//! - Explicit `None` for unknown services rather than a silent default

use std::collections::HashMap;

use axum::http::uri::{InvalidUri, Uri};

use crate::config::ServicesConfig;
use crate::routing::matcher::PathPrefixMatcher;

/// A resolved downstream service.
#[derive(Debug, Clone)]
pub struct ServiceRoute {
    name: String,
    base_url: String,
    stream_matchers: Vec<PathPrefixMatcher>,
}

impl ServiceRoute {
    pub fn new(name: impl Into<String>, base_url: &str, stream_prefixes: &[String]) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            stream_matchers: stream_prefixes.iter().map(PathPrefixMatcher::new).collect(),
        }
    }

    /// Configured name of the service.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build `{base}/api/{service}/{downstream}?{query}`.
    ///
    /// Leading slashes of `downstream` are stripped and the segment is omitted when empty.
    /// The query is forwarded verbatim, so repeated keys and their order survive.
    pub fn target_uri(
        &self,
        service: &str,
        downstream: &str,
        query: Option<&str>,
    ) -> Result<Uri, InvalidUri> {
        let mut target = format!("{}/api/{}", self.base_url, service);

        let downstream = downstream.trim_start_matches('/');
        if !downstream.is_empty() {
            target.push('/');
            target.push_str(downstream);
        }
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            target.push('?');
            target.push_str(query);
        }

        target.parse()
    }

    /// Whether a successful response for `downstream` should be streamed to the client.
    pub fn streams(&self, downstream: &str) -> bool {
        self.stream_matchers.iter().any(|m| m.matches(downstream))
    }
}

/// Immutable table of downstream services.
#[derive(Debug, Clone, Default)]
pub struct ServiceTable {
    routes: HashMap<String, ServiceRoute>,
}

impl ServiceTable {
    /// Compile the table from configuration.
    pub fn from_config(services: &ServicesConfig) -> Self {
        let routes = services
            .iter()
            .map(|s| {
                let route = ServiceRoute::new(s.name.trim(), &s.base_url, &s.stream_prefixes);
                (s.name.trim().to_ascii_lowercase(), route)
            })
            .collect();
        Self { routes }
    }

    /// Look up a service by logical name (case-insensitive).
    pub fn resolve(&self, service: &str) -> Option<&ServiceRoute> {
        self.routes.get(&service.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServiceConfig, ServicesConfig};

    fn table() -> ServiceTable {
        ServiceTable::from_config(&ServicesConfig(vec![
            ServiceConfig::new("auth", "http://auth:5001/"),
            ServiceConfig::new("file", "http://files:5002").with_stream_prefix("download/"),
        ]))
    }

    #[test]
    fn resolves_case_insensitively() {
        let table = table();
        assert_eq!(table.resolve("AUTH").unwrap().name(), "auth");
        assert_eq!(table.resolve("File").unwrap().base_url(), "http://files:5002");
        assert!(table.resolve("search").is_none());
    }

    #[test]
    fn builds_target_uri() {
        let table = table();
        let auth = table.resolve("auth").unwrap();

        assert_eq!(
            auth.target_uri("auth", "users/7", Some("a=1&b=2&a=3")).unwrap(),
            "http://auth:5001/api/auth/users/7?a=1&b=2&a=3"
        );
        assert_eq!(auth.target_uri("Auth", "", None).unwrap(), "http://auth:5001/api/Auth");
        assert_eq!(
            auth.target_uri("auth", "//login", Some("")).unwrap(),
            "http://auth:5001/api/auth/login"
        );
        assert_eq!(
            auth.target_uri("auth", "", Some("q=x%20y")).unwrap(),
            "http://auth:5001/api/auth?q=x%20y"
        );
    }

    #[test]
    fn stream_classification_is_per_service() {
        let table = table();
        assert!(table.resolve("file").unwrap().streams("download/9"));
        assert!(!table.resolve("file").unwrap().streams("metadata/9"));
        assert!(!table.resolve("auth").unwrap().streams("download/9"));
    }
}
