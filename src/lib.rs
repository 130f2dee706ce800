//! Service gateway: a reverse proxy that forwards `/api/{service}/{path}` to named
//! downstream services.

pub mod config;
pub mod error;
pub mod forwarding;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use forwarding::ForwardingEngine;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
