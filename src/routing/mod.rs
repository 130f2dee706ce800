//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming path /api/{service}/{rest}?{query}
//!     → matcher.rs (split service name and downstream path)
//!     → router.rs (service table lookup)
//!     → Return: ServiceRoute or None (404, no network call)
//!
//! Table Compilation (at startup):
//!     ServiceConfig[]
//!     → lowercase names
//!     → compile stream prefix matchers
//!     → Freeze as immutable ServiceTable
//! ```
//!
//! # Design Decisions
//! - Table compiled at startup, immutable at runtime
//! - Data-driven: adding a service is a config change, not a code path
//! - Deterministic: same input always resolves to the same service

pub mod matcher;
pub mod router;

pub use matcher::{InboundPath, PathPrefixMatcher, API_PREFIX};
pub use router::{ServiceRoute, ServiceTable};
