//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to downstream:
//!     → timeouts.rs (enforce headers deadline, observe client cancellation)
//!     → Guarded::{Completed, Elapsed, Cancelled}
//!     → forwarding engine maps Elapsed → 504, Cancelled → no response
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every downstream call has a deadline
//! - No retries: forwarded requests may carry non-idempotent, streamed bodies

pub mod timeouts;
