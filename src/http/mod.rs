//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, cancellation per request)
//!     → request.rs (request ID)
//!     → [forwarding engine resolves, builds, dispatches]
//!     → response.rs (pick relay path, buffer or stream)
//!     → stream.rs (chunk-by-chunk relay for large bodies)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod stream;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use response::{RelayContext, RelayPath};
pub use server::{build_router, AppState, HttpServer};
pub use stream::StreamRelay;
