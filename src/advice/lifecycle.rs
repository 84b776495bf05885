// Advice request lifecycle state machine with validation

use thiserror::Error;

/// Phase of a single advice request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestPhase {
    Received,
    Validating,
    Rejected,
    Generating,
    Succeeded,
    TimedOut,
    Failed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhaseTransitionError {
    #[error("Invalid request phase transition from {from:?} to {to:?}")]
    InvalidTransition { from: RequestPhase, to: RequestPhase },

    #[error("Request already in terminal phase: {0:?}")]
    AlreadyTerminal(RequestPhase),
}

/// Validates if a request can move from one phase to another
pub fn can_transition(from: RequestPhase, to: RequestPhase) -> bool {
    use RequestPhase::*;

    matches!(
        (from, to),
        (Received, Validating)
            | (Validating, Rejected)
            | (Validating, Generating)
            // Setup faults after validation end the request before generation
            | (Validating, Failed)
            | (Generating, Succeeded)
            | (Generating, TimedOut)
            | (Generating, Failed)
    )
}

/// Check if a phase is terminal (reported directly to the caller)
pub fn is_terminal_phase(phase: RequestPhase) -> bool {
    matches!(
        phase,
        RequestPhase::Rejected
            | RequestPhase::Succeeded
            | RequestPhase::TimedOut
            | RequestPhase::Failed
    )
}

/// Tracks the phases one request has passed through
#[derive(Debug, Clone)]
pub struct RequestLifecycle {
    request_id: String,
    history: Vec<RequestPhase>,
}

impl RequestLifecycle {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            history: vec![RequestPhase::Received],
        }
    }

    pub fn current(&self) -> RequestPhase {
        self.history
            .last()
            .copied()
            .unwrap_or(RequestPhase::Received)
    }

    pub fn history(&self) -> &[RequestPhase] {
        &self.history
    }

    pub fn is_finished(&self) -> bool {
        is_terminal_phase(self.current())
    }

    /// Validate and record a transition
    pub fn advance(&mut self, to: RequestPhase) -> Result<RequestPhase, PhaseTransitionError> {
        let from = self.current();
        if is_terminal_phase(from) {
            return Err(PhaseTransitionError::AlreadyTerminal(from));
        }
        if !can_transition(from, to) {
            return Err(PhaseTransitionError::InvalidTransition { from, to });
        }

        log::debug!(
            "[advice {}] {:?} -> {:?}",
            self.request_id,
            from,
            to
        );
        self.history.push(to);
        Ok(to)
    }
}
