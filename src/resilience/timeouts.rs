//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap downstream calls with a deadline
//! - Observe the client's cancellation signal while waiting
//! - Tell the two apart: a deadline is a 504, a cancellation is silence
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Cancellation is checked first, so a client that left is never reported as a timeout
//! - The wrapped future is dropped on either outcome, releasing whatever it owned

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Outcome of a guarded wait.
#[derive(Debug)]
pub enum Guarded<T> {
    /// The future finished in time.
    Completed(T),
    /// The deadline elapsed first.
    Elapsed,
    /// The cancellation token fired first.
    Cancelled,
}

/// Await `fut` unless `deadline` elapses or `cancel` fires.
pub async fn guarded<F>(fut: F, deadline: Duration, cancel: &CancellationToken) -> Guarded<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Guarded::Cancelled,
        res = tokio::time::timeout(deadline, fut) => match res {
            Ok(value) => Guarded::Completed(value),
            Err(_) => Guarded::Elapsed,
        },
    }
}

/// Await `fut` unless `cancel` fires. No deadline.
pub async fn cancellable<F>(fut: F, cancel: &CancellationToken) -> Option<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        value = fut => Some(value),
    }
}
