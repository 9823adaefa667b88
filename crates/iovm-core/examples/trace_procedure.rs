//! Runs a small procedure against an in-memory host and prints the
//! disassembly listing plus the trace event stream.

use std::collections::HashMap;

use iovm_core::{
    disassemble, validate_read_access, validate_write_access, Channel, ErrorCode, Host,
    MemoryTarget, Opstate, ProcedureBuilder, ReadState, TargetDescriptor, TraceEvent, TraceSink,
    Vm, WaitCondition, WaitState, WriteState,
};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

#[derive(Default)]
struct DemoHost {
    memory: HashMap<(u8, u32), u8>,
}

impl Host for DemoHost {
    fn read_state_machine(&mut self, op: &mut ReadState) -> Result<(), ErrorCode> {
        let target = validate_read_access(op.target.target_id())?;
        let mut data = Vec::with_capacity(op.length as usize);
        while op.remaining > 0 {
            let byte = self
                .memory
                .get(&(target.as_u8(), op.address))
                .copied()
                .unwrap_or(0);
            data.push(byte);
            op.address = op.address.wrapping_add(1);
            op.remaining -= 1;
        }
        println!("host: read {} bytes: {data:02x?}", op.length);
        op.opstate = Opstate::Completed;
        Ok(())
    }

    fn write_state_machine(&mut self, op: &mut WriteState, data: &[u8]) -> Result<(), ErrorCode> {
        let target = validate_write_access(op.target.target_id())?;
        for byte in data {
            self.memory.insert((target.as_u8(), op.address), *byte);
            op.address = op.address.wrapping_add(1);
            op.remaining -= 1;
        }
        println!("host: wrote {} bytes: {data:02x?}", data.len());
        op.opstate = Opstate::Completed;
        Ok(())
    }

    fn wait_state_machine(&mut self, op: &mut WaitState) -> Result<(), ErrorCode> {
        // pretend the device becomes ready immediately
        let byte = op.expected;
        assert!(!op.keeps_waiting(byte));
        op.opstate = Opstate::Completed;
        Ok(())
    }

    fn try_read_byte(&mut self, target_id: u8, address: u32) -> Result<u8, ErrorCode> {
        let target = validate_read_access(target_id)?;
        Ok(self
            .memory
            .get(&(target.as_u8(), address))
            .copied()
            .unwrap_or(0))
    }

    fn send_end(&mut self) {
        println!("host: program ended");
    }
}

struct StdoutSink;

impl TraceSink for StdoutSink {
    fn on_event(&mut self, event: TraceEvent) {
        println!("trace: {event:?}");
    }
}

fn main() {
    let mut builder = ProcedureBuilder::new();
    builder
        .set_addr24(Channel::C0, 0x7E_0010)
        .set_target(
            Channel::C0,
            TargetDescriptor::new(MemoryTarget::WorkRam.as_u8(), true),
        )
        .write(Channel::C0, &[0xDE, 0xAD, 0xBE, 0xEF])
        .set_addr24(Channel::C0, 0x7E_0010)
        .set_length_raw(Channel::C0, 4)
        .read(Channel::C0)
        .set_compare_mask(Channel::C1, 0x00, 0xFF)
        .wait_while(Channel::C1, WaitCondition::NotEqual)
        .end();
    let procedure = builder.finish();

    println!("listing:");
    for row in disassemble(&procedure) {
        println!("  {}", row.listing_line());
    }

    let mut vm = Vm::new();
    let mut host = DemoHost::default();
    let mut sink = StdoutSink;
    vm.load(&procedure).expect("fresh VM accepts a load");

    while !vm.state().is_terminal() {
        if let Err(error) = vm.exec_traced(&mut host, &mut sink) {
            println!("run failed: {error}");
            break;
        }
    }
    println!("final state: {:?}", vm.state());
}
