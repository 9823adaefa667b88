//! The host callback contract consumed by `exec`.

use crate::operation::{ReadState, WaitState, WriteState};
use crate::ErrorCode;

/// Embedder-supplied transport driving the actual memory I/O.
///
/// The engine never blocks: a state-machine callback that cannot finish
/// instantly leaves the record's opstate at [`Continue`] and returns
/// `Ok(())`; the engine suspends and re-invokes it on the next `exec`
/// call. Returning an error terminates the run with that error latched.
///
/// [`Continue`]: crate::operation::Opstate::Continue
pub trait Host {
    /// Advances the current read operation by one step.
    ///
    /// The host reads from `op.target`/`op.address`, updates the working
    /// fields, and delivers data to the client (conventionally through
    /// [`Host::send_read`]).
    ///
    /// # Errors
    ///
    /// Any [`ErrorCode`] terminates the run.
    fn read_state_machine(&mut self, op: &mut ReadState) -> Result<(), ErrorCode>;

    /// Advances the current write operation by one step.
    ///
    /// `data` is the complete payload from the procedure buffer; the host
    /// tracks its own progress through it via `op.remaining`.
    ///
    /// # Errors
    ///
    /// Any [`ErrorCode`] terminates the run.
    fn write_state_machine(&mut self, op: &mut WriteState, data: &[u8]) -> Result<(), ErrorCode>;

    /// Advances the current wait operation by one step.
    ///
    /// The host polls one byte, tests it with
    /// [`WaitState::keeps_waiting`], and owns the timeout clock seeded by
    /// `op.timeout` (reset when `op.opstate` is [`Init`]).
    ///
    /// # Errors
    ///
    /// [`ErrorCode::TimedOut`] on timer expiry; any other [`ErrorCode`]
    /// also terminates the run.
    ///
    /// [`Init`]: crate::operation::Opstate::Init
    fn wait_state_machine(&mut self, op: &mut WaitState) -> Result<(), ErrorCode>;

    /// Reads a single byte synchronously, used by abort probes.
    ///
    /// # Errors
    ///
    /// A memory-target [`ErrorCode`] when the target or address is
    /// invalid.
    fn try_read_byte(&mut self, target_id: u8, address: u32) -> Result<u8, ErrorCode>;

    /// Notifies the client that the program terminated.
    ///
    /// Invoked exactly once per run, on the first transition to a
    /// terminal state, whether the outcome is success or failure.
    fn send_end(&mut self);

    /// Transmits read results to the client.
    ///
    /// Never invoked by the engine; a host's `read_state_machine`
    /// conventionally routes completed data through this method so
    /// transports share one delivery surface.
    fn send_read(&mut self, length_raw: u16, data: &[u8]) {
        let _ = (length_raw, data);
    }

    /// Notifies the client that an abort probe tripped.
    ///
    /// Invoked by the engine immediately before the terminal
    /// [`Host::send_end`] for an aborted run.
    fn send_abort(&mut self) {}
}
