//! Core execution engine for the IOVM, a small resumable I/O virtual
//! machine.
//!
//! A client authors a byte-encoded procedure of reads, writes, and waits
//! against host memory targets; the host buffers the whole procedure,
//! loads it into a [`Vm`], and drives execution one cooperative step at a
//! time. Every actual memory touch is delegated to a [`Host`]
//! implementation, which may suspend mid-operation and be resumed on the
//! next step.

/// Stable error taxonomy and policy classes.
pub mod error;
pub use error::{ErrorClass, ErrorCode};

/// Execution-state machine and the channel register file.
pub mod state;
pub use state::{
    Channel, ChannelRegisters, ExecutionState, RegisterFile, ADDRESS_MASK, CHANNEL_COUNT,
};

/// Memory-target descriptors and the reference target table.
pub mod target;
pub use target::{
    validate_read_access, validate_write_access, MemoryTarget, TargetDescriptor,
    TARGET_AUTO_ADVANCE_BIT, TARGET_ID_MASK,
};

/// Instruction byte layout and the canonical opcode table.
pub mod encoding;
pub use encoding::{
    decode_instruction, encode_abort_instruction, encode_instruction, CmpOperator, Instruction,
    Opcode, WaitCondition, INST_ABORT_BIT, INST_CHANNEL_MASK, INST_CHANNEL_SHIFT,
    INST_OPCODE_MASK, INST_RESERVED_BIT,
};

/// Borrowed procedure buffer with the fetch cursor.
pub mod program;
pub use program::ProcedureBuffer;

/// Per-operation records driven by the host state machines.
pub mod operation;
pub use operation::{ActiveOperation, Opstate, ReadState, WaitState, WriteState};

/// The host callback contract.
pub mod host;
pub use host::Host;

/// Deterministic trace events and sinks.
pub mod trace;
pub use trace::{NullTraceSink, TraceEvent, TraceSink};

/// The execution engine itself.
pub mod vm;
pub use vm::Vm;

/// In-memory procedure builder.
pub mod asm;
pub use asm::ProcedureBuilder;

/// Procedure disassembly.
pub mod disasm;
pub use disasm::{disassemble, DisassemblyRow};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
