// First-settled race between an operation and a timer

use std::future::Future;
use std::time::Duration;

/// Outcome of racing a fallible operation against a timer
#[derive(Debug, PartialEq, Eq)]
pub enum RaceOutcome<T, E> {
    /// The operation settled first and succeeded
    Succeeded(T),
    /// The operation settled first and failed
    Failed(E),
    /// The timer fired first
    TimedOut,
}

impl<T, E> RaceOutcome<T, E> {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, RaceOutcome::TimedOut)
    }
}

/// Run `operation` until it settles or `limit` elapses, whichever comes first.
///
/// Exactly one outcome is produced. The losing branch is dropped when this
/// returns: a timed-out operation is cancelled at its next suspension point
/// and the timer is released if the operation wins.
pub async fn race_with_timeout<F, T, E>(operation: F, limit: Duration) -> RaceOutcome<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    tokio::select! {
        // Prefer the operation when both are ready in the same poll
        biased;
        result = operation => match result {
            Ok(value) => RaceOutcome::Succeeded(value),
            Err(error) => RaceOutcome::Failed(error),
        },
        _ = tokio::time::sleep(limit) => RaceOutcome::TimedOut,
    }
}
