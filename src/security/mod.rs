//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request headers
//!     → headers.rs (strip hop-by-hop, route content headers)
//!     → outbound request
//!
//! Downstream response headers
//!     → headers.rs (strip hop-by-hop and Content-Length)
//!     → client response
//! ```
//!
//! # Design Decisions
//! - Authorization is forwarded untouched; the downstream services own auth
//! - Every request gets its own header map

pub mod headers;
