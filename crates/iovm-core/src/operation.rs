//! Per-operation records driven by the host state machines.
//!
//! Each I/O opcode family owns a small record that the engine fills from
//! the channel registers on entry and hands to the host callback, once per
//! `exec` step, until the host marks it completed or fails.

use crate::encoding::CmpOperator;
use crate::state::Channel;
use crate::target::TargetDescriptor;

/// Progress indicator of the active operation's state machine.
///
/// The engine sets `Init` on entry; the host moves it to `Continue` while
/// yielding and to `Completed` when the operation is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Opstate {
    /// First callback invocation for this operation.
    #[default]
    Init,
    /// The host yielded mid-operation and wants another step.
    Continue,
    /// The operation finished; the engine resumes decoding.
    Completed,
}

/// Working record of an in-flight read operation.
///
/// `address` and `remaining` are host-owned working state; the engine
/// consults only `opstate` and computes auto-advance from `start_address`
/// and `length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ReadState {
    /// State-machine progress.
    pub opstate: Opstate,
    /// Channel the operation was issued on.
    pub channel: Channel,
    /// Memory-target descriptor from the channel registers.
    pub target: TargetDescriptor,
    /// Address the operation started at.
    pub start_address: u32,
    /// Host working address, initially `start_address`.
    pub address: u32,
    /// Total transfer length (`1..=65536`).
    pub length: u32,
    /// Host working countdown, initially `length`.
    pub remaining: u32,
}

impl ReadState {
    /// Raw 16-bit length encoding for client framing (65536 encodes as 0).
    #[must_use]
    pub const fn length_raw(&self) -> u16 {
        (self.length & 0xFFFF) as u16
    }
}

/// Working record of an in-flight write operation.
///
/// The payload lives in the procedure buffer at `data_offset`; the engine
/// passes the full payload slice to every callback invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct WriteState {
    /// State-machine progress.
    pub opstate: Opstate,
    /// Channel the operation was issued on.
    pub channel: Channel,
    /// Memory-target descriptor from the channel registers.
    pub target: TargetDescriptor,
    /// Address the operation started at.
    pub start_address: u32,
    /// Host working address, initially `start_address`.
    pub address: u32,
    /// Total transfer length (`1..=65536`).
    pub length: u32,
    /// Host working countdown, initially `length`.
    pub remaining: u32,
    /// Absolute procedure offset of the payload's first byte.
    pub data_offset: usize,
}

impl WriteState {
    /// Raw 16-bit length encoding for client framing (65536 encodes as 0).
    #[must_use]
    pub const fn length_raw(&self) -> u16 {
        (self.length & 0xFFFF) as u16
    }
}

/// Working record of an in-flight wait operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct WaitState {
    /// State-machine progress.
    pub opstate: Opstate,
    /// Channel the operation was issued on.
    pub channel: Channel,
    /// Memory-target descriptor from the channel registers.
    pub target: TargetDescriptor,
    /// Address of the byte being polled.
    pub address: u32,
    /// Comparison value.
    pub expected: u8,
    /// Comparison mask applied before comparing.
    pub mask: u8,
    /// Comparison operator for the while-condition.
    pub comparison: CmpOperator,
    /// Timeout in host-defined ticks, from the channel registers.
    pub timeout: u32,
}

impl WaitState {
    /// Tests a polled byte against the wait's while-condition.
    ///
    /// `true` means the condition still holds and the host keeps waiting;
    /// `false` means the wait is satisfied and the host should complete
    /// the operation.
    #[must_use]
    pub const fn keeps_waiting(&self, byte: u8) -> bool {
        self.comparison.compare(byte & self.mask, self.expected)
    }
}

/// The single active operation, discriminated alongside the execution
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ActiveOperation {
    /// No operation in flight.
    #[default]
    Idle,
    /// A read is in flight.
    Read(ReadState),
    /// A write is in flight.
    Write(WriteState),
    /// A wait is in flight.
    Wait(WaitState),
}
