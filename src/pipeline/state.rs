//! Per-request pipeline state machine.
//!
//! # State Transitions
//! ```text
//! Received → Admitted | Rejected
//! Admitted → Processing → CompletedOk | CompletedError
//! CompletedOk → CompletedError              (success response could not be mapped)
//! Rejected | CompletedOk | CompletedError → Delivering → Sent | SendFailed
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Received,
    Admitted,
    Rejected,
    Processing,
    CompletedOk,
    CompletedError,
    Delivering,
    Sent,
    SendFailed,
}

impl PipelineState {
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Received, Admitted)
                | (Received, Rejected)
                | (Admitted, Processing)
                | (Processing, CompletedOk)
                | (Processing, CompletedError)
                | (CompletedOk, CompletedError)
                | (Rejected, Delivering)
                | (CompletedOk, Delivering)
                | (CompletedError, Delivering)
                | (Delivering, Sent)
                | (Delivering, SendFailed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Sent | PipelineState::SendFailed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Received => "received",
            PipelineState::Admitted => "admitted",
            PipelineState::Rejected => "rejected",
            PipelineState::Processing => "processing",
            PipelineState::CompletedOk => "completed_ok",
            PipelineState::CompletedError => "completed_error",
            PipelineState::Delivering => "delivering",
            PipelineState::Sent => "sent",
            PipelineState::SendFailed => "send_failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::PipelineState::*;

    #[test]
    fn happy_paths_are_valid() {
        for path in [
            &[Received, Admitted, Processing, CompletedOk, Delivering, Sent][..],
            &[Received, Admitted, Processing, CompletedError, Delivering, SendFailed][..],
            &[Received, Rejected, Delivering, Sent][..],
        ] {
            for pair in path.windows(2) {
                assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn rejected_never_reaches_processing() {
        assert!(!Rejected.can_transition_to(Processing));
        assert!(!Received.can_transition_to(Processing));
        assert!(!Sent.can_transition_to(Delivering));
        assert!(!CompletedError.can_transition_to(CompletedOk));
    }

    #[test]
    fn only_delivery_outcomes_are_terminal() {
        assert!(Sent.is_terminal());
        assert!(SendFailed.is_terminal());
        assert!(!Delivering.is_terminal());
        assert!(!CompletedOk.is_terminal());
    }
}
