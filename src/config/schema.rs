//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Logical service name to downstream base URL table.
    pub services: ServicesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Outbound connection pool settings.
    pub downstream: DownstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// The route table. Serialized as a `[[services]]` array.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ServicesConfig(pub Vec<ServiceConfig>);

impl Default for ServicesConfig {
    fn default() -> Self {
        Self(vec![
            ServiceConfig::new("auth", "http://localhost:5001"),
            ServiceConfig::new("file", "http://localhost:5002").with_stream_prefix("download/"),
            ServiceConfig::new("search", "http://localhost:5003"),
        ])
    }
}

impl ServicesConfig {
    pub fn iter(&self) -> std::slice::Iter<'_, ServiceConfig> {
        self.0.iter()
    }

    pub fn push(&mut self, service: ServiceConfig) {
        self.0.push(service);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single downstream service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Logical name, matched case-insensitively against the path segment after `/api/`.
    pub name: String,

    /// Base URL of the downstream service (e.g., "http://127.0.0.1:5002").
    pub base_url: String,

    /// Downstream path prefixes whose successful responses are streamed instead of buffered.
    #[serde(default)]
    pub stream_prefixes: Vec<String>,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            stream_prefixes: Vec::new(),
        }
    }

    pub fn with_stream_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.stream_prefixes.push(prefix.into());
        self
    }
}

/// Timeout configuration for downstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Deadline for downstream response headers in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 100,
        }
    }
}

/// Outbound client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Idle pooled connections are closed after this many seconds.
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle connections kept per downstream host.
    pub pool_max_idle_per_host: usize,

    /// Speak HTTP/2 without negotiation. When false the transport tops out at HTTP/1.1
    /// and HTTP/2 requests are downgraded.
    pub http2_prior_knowledge: bool,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            pool_idle_timeout_secs: 90,
            pool_max_idle_per_host: 32,
            http2_prior_knowledge: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
