//! The execution engine: lifecycle, decode loop, and operation dispatch.
//!
//! One `exec` call is one cooperative step: it runs until the procedure
//! ends, an error latches, or an operation's host state machine yields.
//! Configuration opcodes and single-call operations never force an extra
//! step.

use crate::encoding::{decode_instruction, Instruction, Opcode, WaitCondition};
use crate::host::Host;
use crate::operation::{ActiveOperation, Opstate, ReadState, WaitState, WriteState};
use crate::program::ProcedureBuffer;
use crate::state::{Channel, ExecutionState, RegisterFile};
use crate::target::TargetDescriptor;
use crate::trace::{NullTraceSink, TraceEvent, TraceSink};
use crate::ErrorCode;

/// Outcome of executing one instruction inside the decode loop.
enum Flow {
    /// Keep decoding.
    Continue,
    /// An operation yielded; return to the caller.
    Yield,
}

/// A resumable I/O virtual machine over a borrowed procedure buffer.
///
/// The engine owns its register file and operation records and borrows
/// the procedure for the duration of a load/execute cycle. All memory
/// I/O is delegated to a [`Host`] passed into each step.
#[derive(Debug)]
pub struct Vm<'p> {
    program: ProcedureBuffer<'p>,
    state: ExecutionState,
    registers: RegisterFile,
    operation: ActiveOperation,
    /// Offset of the instruction currently (or last) being executed.
    instruction_offset: usize,
}

impl Default for Vm<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'p> Vm<'p> {
    /// Creates a zeroed VM in the `Init` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: ProcedureBuffer::empty(),
            state: ExecutionState::Init,
            registers: RegisterFile::default(),
            operation: ActiveOperation::Idle,
            instruction_offset: 0,
        }
    }

    /// Loads a buffered procedure, transitioning `Init` to `Loaded`.
    ///
    /// An empty slice is a valid (empty) procedure.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::InvalidOperationForState`] unless the VM is in
    /// the `Init` state.
    pub fn load(&mut self, procedure: &'p [u8]) -> Result<(), ErrorCode> {
        if self.state != ExecutionState::Init {
            return Err(ErrorCode::InvalidOperationForState);
        }
        self.program = ProcedureBuffer::new(procedure);
        self.state = ExecutionState::Loaded;
        Ok(())
    }

    /// Requests a reset so the loaded procedure can run (again).
    ///
    /// Per-run state is cleared by the first `exec` after the reset;
    /// register contents survive.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::InvalidOperationForState`] before a procedure
    /// is loaded and while a run is in flight.
    pub fn exec_reset(&mut self) -> Result<(), ErrorCode> {
        if self.state == ExecutionState::Init || self.state.is_in_flight() {
            return Err(ErrorCode::InvalidOperationForState);
        }
        self.state = ExecutionState::Reset;
        Ok(())
    }

    /// Observes the current execution state.
    #[must_use]
    pub const fn state(&self) -> ExecutionState {
        self.state
    }

    /// Returns the latched error, if the VM is in the `Errored` state.
    #[must_use]
    pub const fn latched_error(&self) -> Option<ErrorCode> {
        self.state.latched_error()
    }

    /// Read access to the channel register file.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Observes the active operation record.
    #[must_use]
    pub const fn operation(&self) -> &ActiveOperation {
        &self.operation
    }

    /// Offset of the instruction currently (or last) being executed,
    /// for error reporting.
    #[must_use]
    pub const fn instruction_offset(&self) -> usize {
        self.instruction_offset
    }

    /// Current procedure cursor offset.
    #[must_use]
    pub const fn procedure_offset(&self) -> usize {
        self.program.offset()
    }

    /// Runs one cooperative step without tracing.
    ///
    /// # Errors
    ///
    /// The latched [`ErrorCode`] when the run terminates with a failure;
    /// idempotent once a terminal state is reached.
    pub fn exec<H: Host>(&mut self, host: &mut H) -> Result<(), ErrorCode> {
        self.exec_traced(host, &mut NullTraceSink)
    }

    /// Runs one cooperative step, reporting events to `sink`.
    ///
    /// # Errors
    ///
    /// See [`Vm::exec`].
    pub fn exec_traced<H: Host>(
        &mut self,
        host: &mut H,
        sink: &mut dyn TraceSink,
    ) -> Result<(), ErrorCode> {
        match self.state {
            ExecutionState::Errored(code) => return Err(code),
            ExecutionState::Ended => return Ok(()),
            ExecutionState::Init => return Err(ErrorCode::InvalidOperationForState),
            ExecutionState::Read | ExecutionState::Write | ExecutionState::Wait => {
                match self.step_active_operation(host, sink) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Yield) => return Ok(()),
                    Err(code) => return Err(self.latch(code, host, sink)),
                }
            }
            ExecutionState::Loaded | ExecutionState::Reset | ExecutionState::ExecuteNext => {}
        }

        if self.state == ExecutionState::Loaded {
            self.state = ExecutionState::Reset;
        }
        if self.state == ExecutionState::Reset {
            self.program.rewind();
            self.operation = ActiveOperation::Idle;
            self.instruction_offset = 0;
            self.state = ExecutionState::ExecuteNext;
        }

        while self.state == ExecutionState::ExecuteNext {
            if self.program.is_exhausted() {
                self.finish_run(host, sink);
                return Ok(());
            }

            self.instruction_offset = self.program.offset();
            let byte = match self.program.fetch_u8() {
                Ok(byte) => byte,
                Err(code) => return Err(self.latch(code, host, sink)),
            };
            sink.on_event(TraceEvent::InstructionFetched {
                offset: self.instruction_offset,
                byte,
            });

            let Some(instruction) = decode_instruction(byte) else {
                return Err(self.latch(ErrorCode::UnknownOpcode, host, sink));
            };

            match self.execute_instruction(instruction, host, sink) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Yield) => return Ok(()),
                Err(code) => return Err(self.latch(code, host, sink)),
            }
        }

        Ok(())
    }

    fn execute_instruction<H: Host>(
        &mut self,
        instruction: Instruction,
        host: &mut H,
        sink: &mut dyn TraceSink,
    ) -> Result<Flow, ErrorCode> {
        let channel = instruction.channel;
        match instruction.opcode {
            Opcode::End => {
                self.finish_run(host, sink);
                Ok(Flow::Continue)
            }
            Opcode::SetAddr8 => {
                let value = self.program.fetch_u8()?;
                self.registers.set_address(channel, u32::from(value));
                Ok(Flow::Continue)
            }
            Opcode::SetAddr16 => {
                let value = self.program.fetch_u16_le()?;
                self.registers.set_address(channel, u32::from(value));
                Ok(Flow::Continue)
            }
            Opcode::SetAddr24 => {
                let value = self.program.fetch_u24_le()?;
                self.registers.set_address(channel, value);
                Ok(Flow::Continue)
            }
            Opcode::SetTarget => {
                let raw = self.program.fetch_u8()?;
                self.registers
                    .set_target(channel, TargetDescriptor::from_raw(raw));
                Ok(Flow::Continue)
            }
            Opcode::SetLength => {
                let raw = self.program.fetch_u16_le()?;
                self.registers.set_length_raw(channel, raw);
                Ok(Flow::Continue)
            }
            Opcode::SetCompareMask => {
                let compare = self.program.fetch_u8()?;
                let mask = self.program.fetch_u8()?;
                self.registers.set_compare_mask(channel, compare, mask);
                Ok(Flow::Continue)
            }
            Opcode::SetTimeout => {
                let timeout = self.program.fetch_u32_le()?;
                self.registers.set_timeout(channel, timeout);
                Ok(Flow::Continue)
            }
            Opcode::Read => self.enter_read(channel, host, sink),
            Opcode::Write => self.enter_write(channel, host, sink),
            Opcode::WaitWhileNeq
            | Opcode::WaitWhileEq
            | Opcode::WaitWhileLt
            | Opcode::WaitWhileGt
            | Opcode::WaitWhileLte
            | Opcode::WaitWhileGte => {
                let Some(condition) = instruction.opcode.wait_condition() else {
                    return Err(ErrorCode::UnknownOpcode);
                };
                if instruction.abort {
                    self.execute_abort_probe(channel, condition, host)
                } else {
                    self.enter_wait(channel, condition, host, sink)
                }
            }
        }
    }

    fn enter_read<H: Host>(
        &mut self,
        channel: Channel,
        host: &mut H,
        sink: &mut dyn TraceSink,
    ) -> Result<Flow, ErrorCode> {
        let regs = *self.registers.channel(channel);
        self.operation = ActiveOperation::Read(ReadState {
            opstate: Opstate::Init,
            channel,
            target: regs.target,
            start_address: regs.address,
            address: regs.address,
            length: regs.length,
            remaining: regs.length,
        });
        self.state = ExecutionState::Read;
        self.step_active_operation(host, sink)
    }

    fn enter_write<H: Host>(
        &mut self,
        channel: Channel,
        host: &mut H,
        sink: &mut dyn TraceSink,
    ) -> Result<Flow, ErrorCode> {
        let regs = *self.registers.channel(channel);
        // reserve the payload before entering the machine so execution
        // resumes at the instruction after the data
        let data_offset = self.program.offset();
        self.program.skip(regs.length as usize)?;

        self.operation = ActiveOperation::Write(WriteState {
            opstate: Opstate::Init,
            channel,
            target: regs.target,
            start_address: regs.address,
            address: regs.address,
            length: regs.length,
            remaining: regs.length,
            data_offset,
        });
        self.state = ExecutionState::Write;
        self.step_active_operation(host, sink)
    }

    fn enter_wait<H: Host>(
        &mut self,
        channel: Channel,
        condition: WaitCondition,
        host: &mut H,
        sink: &mut dyn TraceSink,
    ) -> Result<Flow, ErrorCode> {
        let regs = *self.registers.channel(channel);
        self.operation = ActiveOperation::Wait(WaitState {
            opstate: Opstate::Init,
            channel,
            target: regs.target,
            address: regs.address,
            expected: regs.compare,
            mask: regs.mask,
            comparison: condition.comparison(),
            timeout: regs.timeout,
        });
        self.state = ExecutionState::Wait;
        self.step_active_operation(host, sink)
    }

    fn execute_abort_probe<H: Host>(
        &mut self,
        channel: Channel,
        condition: WaitCondition,
        host: &mut H,
    ) -> Result<Flow, ErrorCode> {
        let regs = *self.registers.channel(channel);
        let byte = host.try_read_byte(regs.target.target_id(), regs.address)?;
        if condition.comparison().compare(byte & regs.mask, regs.compare) {
            host.send_abort();
            return Err(ErrorCode::Aborted);
        }
        Ok(Flow::Continue)
    }

    /// Runs one host invocation of the active operation's state machine.
    fn step_active_operation<H: Host>(
        &mut self,
        host: &mut H,
        sink: &mut dyn TraceSink,
    ) -> Result<Flow, ErrorCode> {
        let completed = match &mut self.operation {
            ActiveOperation::Read(op) => {
                host.read_state_machine(op)?;
                let done = op.opstate == Opstate::Completed;
                done.then_some((op.channel, op.target, op.start_address, op.length))
            }
            ActiveOperation::Write(op) => {
                let data = self.program.slice_at(op.data_offset, op.length as usize)?;
                host.write_state_machine(op, data)?;
                let done = op.opstate == Opstate::Completed;
                done.then_some((op.channel, op.target, op.start_address, op.length))
            }
            ActiveOperation::Wait(op) => {
                host.wait_state_machine(op)?;
                let done = op.opstate == Opstate::Completed;
                done.then_some((op.channel, op.target, 0, 0))
            }
            ActiveOperation::Idle => return Err(ErrorCode::InvalidOperationForState),
        };

        match completed {
            Some((channel, target, start_address, length)) => {
                let finished = self.state;
                if matches!(finished, ExecutionState::Read | ExecutionState::Write)
                    && target.auto_advance()
                {
                    self.registers
                        .set_address(channel, start_address.wrapping_add(length));
                }
                self.operation = ActiveOperation::Idle;
                self.state = ExecutionState::ExecuteNext;
                sink.on_event(TraceEvent::OperationCompleted { state: finished });
                Ok(Flow::Continue)
            }
            None => {
                sink.on_event(TraceEvent::OperationSuspended { state: self.state });
                Ok(Flow::Yield)
            }
        }
    }

    /// Transitions to `Ended` and notifies the host once.
    fn finish_run<H: Host>(&mut self, host: &mut H, sink: &mut dyn TraceSink) {
        self.state = ExecutionState::Ended;
        self.operation = ActiveOperation::Idle;
        sink.on_event(TraceEvent::ProgramEnded {
            offset: self.program.offset(),
        });
        host.send_end();
    }

    /// Latches an error, notifies the host once, and returns the code.
    fn latch<H: Host>(
        &mut self,
        code: ErrorCode,
        host: &mut H,
        sink: &mut dyn TraceSink,
    ) -> ErrorCode {
        self.state = ExecutionState::Errored(code);
        sink.on_event(TraceEvent::ErrorLatched {
            offset: self.instruction_offset,
            error: code,
        });
        host.send_end();
        code
    }
}
