use crate::ErrorCode;

/// Host-observable execution state machine for one procedure run.
///
/// The lifecycle is `Init → Loaded → Reset → ExecuteNext → {Read, Write,
/// Wait}* → Ended`, with `Errored` latching the first failure. A value
/// never returns to `Init`; a fresh VM does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ExecutionState {
    /// Freshly constructed, no procedure loaded.
    #[default]
    Init,
    /// A procedure buffer is loaded and ready for reset.
    Loaded,
    /// Reset requested; per-run state is cleared on the next step.
    Reset,
    /// Ready to decode the next instruction.
    ExecuteNext,
    /// Suspended inside a read operation.
    Read,
    /// Suspended inside a write operation.
    Write,
    /// Suspended inside a wait operation.
    Wait,
    /// The procedure ran to completion.
    Ended,
    /// An error is latched and no further progress is possible without
    /// a reset.
    Errored(ErrorCode),
}

impl ExecutionState {
    /// Returns the latched error, if this state is errored.
    #[must_use]
    pub const fn latched_error(self) -> Option<ErrorCode> {
        match self {
            Self::Errored(code) => Some(code),
            _ => None,
        }
    }

    /// Returns `true` for the terminal states `Ended` and `Errored`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Errored(_))
    }

    /// Returns `true` while a run is in flight and a reset is forbidden.
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        matches!(
            self,
            Self::ExecuteNext | Self::Read | Self::Write | Self::Wait
        )
    }

    /// Returns `true` while suspended inside an operation state machine.
    #[must_use]
    pub const fn is_suspended(self) -> bool {
        matches!(self, Self::Read | Self::Write | Self::Wait)
    }
}

#[cfg(test)]
mod tests {
    use super::ExecutionState;
    use crate::ErrorCode;

    #[test]
    fn execution_state_default_is_init() {
        assert_eq!(ExecutionState::default(), ExecutionState::Init);
    }

    #[test]
    fn latched_error_reports_only_errored_variant() {
        assert_eq!(ExecutionState::Init.latched_error(), None);
        assert_eq!(ExecutionState::Ended.latched_error(), None);
        assert_eq!(
            ExecutionState::Errored(ErrorCode::TimedOut).latched_error(),
            Some(ErrorCode::TimedOut)
        );
    }

    #[test]
    fn in_flight_states_match_reset_gating_contract() {
        assert!(ExecutionState::ExecuteNext.is_in_flight());
        assert!(ExecutionState::Read.is_in_flight());
        assert!(ExecutionState::Write.is_in_flight());
        assert!(ExecutionState::Wait.is_in_flight());

        assert!(!ExecutionState::Init.is_in_flight());
        assert!(!ExecutionState::Loaded.is_in_flight());
        assert!(!ExecutionState::Reset.is_in_flight());
        assert!(!ExecutionState::Ended.is_in_flight());
        assert!(!ExecutionState::Errored(ErrorCode::Aborted).is_in_flight());
    }

    #[test]
    fn terminal_states_are_ended_and_errored_only() {
        assert!(ExecutionState::Ended.is_terminal());
        assert!(ExecutionState::Errored(ErrorCode::UnknownOpcode).is_terminal());
        assert!(!ExecutionState::Wait.is_terminal());
        assert!(!ExecutionState::Loaded.is_terminal());
    }
}
