//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (request_id, service, target, status) instead of formatted strings
//! - Request ID flows from the trace layer into every event of a request
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
