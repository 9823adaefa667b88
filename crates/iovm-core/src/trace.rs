use crate::{ErrorCode, ExecutionState};

/// Deterministic trace events emitted at step boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TraceEvent {
    /// An instruction byte was fetched for decoding.
    InstructionFetched {
        /// Procedure offset of the instruction byte.
        offset: usize,
        /// The raw instruction byte.
        byte: u8,
    },
    /// An operation yielded back to the caller mid-flight.
    OperationSuspended {
        /// Which operation family is suspended.
        state: ExecutionState,
    },
    /// An operation's state machine reported completion.
    OperationCompleted {
        /// Which operation family completed.
        state: ExecutionState,
    },
    /// An error was latched and the run terminated.
    ErrorLatched {
        /// Procedure offset of the failing instruction.
        offset: usize,
        /// The latched error.
        error: ErrorCode,
    },
    /// The procedure ran to completion.
    ProgramEnded {
        /// Final cursor offset.
        offset: usize,
    },
}

/// Sink trait for deterministic trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

/// Discards every event; backs the sink-free `exec` entry point.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn on_event(&mut self, _event: TraceEvent) {}
}
