//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the route table (unique names, usable base URLs)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no services configured")]
    NoServices,
    #[error("service #{index} has an empty name")]
    EmptyServiceName { index: usize },
    #[error("service name '{name}' must be a single path segment")]
    InvalidServiceName { name: String },
    #[error("service '{name}' is defined more than once")]
    DuplicateService { name: String },
    #[error("service '{name}' has invalid base_url '{url}': {reason}")]
    InvalidBaseUrl { name: String, url: String, reason: String },
    #[error("service '{name}' has an empty stream prefix")]
    EmptyStreamPrefix { name: String },
    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },
    #[error("{field} '{value}' is not a socket address")]
    InvalidAddress { field: &'static str, value: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.services.is_empty() {
        errors.push(ValidationError::NoServices);
    }

    let mut seen = HashSet::new();
    for (index, service) in config.services.iter().enumerate() {
        let name = service.name.trim();
        if name.is_empty() {
            errors.push(ValidationError::EmptyServiceName { index });
            continue;
        }
        if name.contains('/') || name.contains('?') {
            errors.push(ValidationError::InvalidServiceName { name: name.to_string() });
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            errors.push(ValidationError::DuplicateService { name: name.to_string() });
        }

        match Url::parse(&service.base_url) {
            Ok(url) if url.scheme() == "http" && url.host_str().is_some() => {}
            Ok(url) => errors.push(ValidationError::InvalidBaseUrl {
                name: name.to_string(),
                url: service.base_url.clone(),
                reason: format!("expected an http:// URL with a host, got scheme '{}'", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError::InvalidBaseUrl {
                name: name.to_string(),
                url: service.base_url.clone(),
                reason: e.to_string(),
            }),
        }

        if service.stream_prefixes.iter().any(|p| p.trim_start_matches('/').is_empty()) {
            errors.push(ValidationError::EmptyStreamPrefix { name: name.to_string() });
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "timeouts.connect_secs" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "timeouts.request_secs" });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
