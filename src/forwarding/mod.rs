//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request + cancellation token
//!     → routing (resolve service, build target URI)
//!     → outbound.rs (method, version, headers, streamed body)
//!     → transport.rs (send, resolve on response headers)
//!     → engine.rs dispatch: Response | ConnectFailure | Timeout | Cancelled
//!     → http::response (stream / buffered / error relay)
//! ```
//!
//! # Design Decisions
//! - Exactly one outbound request per inbound request
//! - Request bodies are moved, never buffered
//! - Failures are values (`Dispatch`, `GatewayError`), matched explicitly

pub mod engine;
pub mod outbound;
pub mod transport;

pub use engine::{Dispatch, Forwarded, ForwardingEngine};
pub use transport::{HyperTransport, Transport, TransportError};
