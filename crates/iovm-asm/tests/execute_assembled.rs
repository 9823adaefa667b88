//! End-to-end coverage: assemble source text, then execute the binary on
//! the core engine against an in-memory host.

use std::collections::HashMap;

use iovm_asm::assemble_source;
use tempfile as _;

use iovm_core::{
    validate_read_access, validate_write_access, Channel, ErrorCode, ExecutionState, Host,
    MemoryTarget, Opstate, ReadState, Vm, WaitState, WriteState,
};

#[derive(Default)]
struct MemoryHost {
    memory: HashMap<(u8, u32), u8>,
    delivered: Vec<Vec<u8>>,
    ends: usize,
}

impl Host for MemoryHost {
    fn read_state_machine(&mut self, op: &mut ReadState) -> Result<(), ErrorCode> {
        let target = validate_read_access(op.target.target_id())?;
        let mut data = Vec::with_capacity(op.length as usize);
        while op.remaining > 0 {
            data.push(
                self.memory
                    .get(&(target.as_u8(), op.address))
                    .copied()
                    .unwrap_or(0),
            );
            op.address = op.address.wrapping_add(1);
            op.remaining -= 1;
        }
        self.delivered.push(data);
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
        op.opstate = Opstate::Completed;
        Ok(())
    }

    fn wait_state_machine(&mut self, op: &mut WaitState) -> Result<(), ErrorCode> {
        let target = validate_read_access(op.target.target_id())?;
        let byte = self
            .memory
            .get(&(target.as_u8(), op.address))
            .copied()
            .unwrap_or(0);
        if op.keeps_waiting(byte) {
            op.opstate = Opstate::Continue;
        } else {
            op.opstate = Opstate::Completed;
        }
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
        self.ends += 1;
    }
}

const COPY_PROCEDURE: &str = "\
; write a pattern into work RAM, then read it back
seta24 c0, 0x7E0040
settv  c0, wram
setlen c0, 3
write  c0, de ad bf
seta24 c1, 0x7E0040
settv  c1, wram, advance
setlen c1, 3
read   c1
end
";

#[test]
fn assembled_write_then_read_round_trips_through_host_memory() {
    let output = assemble_source(COPY_PROCEDURE).expect("valid source");
    assert!(output.warnings.is_empty());

    let mut vm = Vm::new();
    let mut host = MemoryHost::default();
    vm.load(&output.binary).expect("load");
    assert_eq!(vm.exec(&mut host), Ok(()));
    assert_eq!(vm.state(), ExecutionState::Ended);

    assert_eq!(host.delivered, [vec![0xDE, 0xAD, 0xBF]]);
    assert_eq!(
        host.memory.get(&(MemoryTarget::WorkRam.as_u8(), 0x7E_0042)),
        Some(&0xBF)
    );
    assert_eq!(vm.registers().channel(Channel::C1).address, 0x7E_0043);
    assert_eq!(vm.registers().channel(Channel::C0).address, 0x7E_0040);
    assert_eq!(host.ends, 1);
}

#[test]
fn assembled_wait_suspends_until_the_device_flag_clears() {
    let source = "\
seta24 c2, 0x002100
settv  c2, wram
setcmpmsk c2, 0x80, 0x80
wait.eq c2
end
";
    let output = assemble_source(source).expect("valid source");

    let mut vm = Vm::new();
    let mut host = MemoryHost::default();
    host.memory
        .insert((MemoryTarget::WorkRam.as_u8(), 0x2100), 0xFF);
    vm.load(&output.binary).expect("load");

    // busy flag set: the wait yields
    assert_eq!(vm.exec(&mut host), Ok(()));
    assert_eq!(vm.state(), ExecutionState::Wait);
    assert_eq!(vm.exec(&mut host), Ok(()));
    assert_eq!(vm.state(), ExecutionState::Wait);

    // flag clears: the same procedure runs to completion
    host.memory
        .insert((MemoryTarget::WorkRam.as_u8(), 0x2100), 0x05);
    assert_eq!(vm.exec(&mut host), Ok(()));
    assert_eq!(vm.state(), ExecutionState::Ended);
    assert_eq!(host.ends, 1);
}

#[test]
fn assembled_abort_probe_stops_a_mismatched_procedure() {
    let source = "\
seta24 c0, 0x00FFC0
settv  c0, rom
setcmpmsk c0, 0x21, 0xFF
abort.neq c0
end
";
    let output = assemble_source(source).expect("valid source");

    // version byte differs from the expected 0x21
    let mut vm = Vm::new();
    let mut host = MemoryHost::default();
    host.memory
        .insert((MemoryTarget::Rom.as_u8(), 0xFFC0), 0x20);
    vm.load(&output.binary).expect("load");
    assert_eq!(vm.exec(&mut host), Err(ErrorCode::Aborted));
    assert_eq!(vm.state(), ExecutionState::Errored(ErrorCode::Aborted));

    // matching version byte: the probe passes
    let mut vm = Vm::new();
    let mut host = MemoryHost::default();
    host.memory
        .insert((MemoryTarget::Rom.as_u8(), 0xFFC0), 0x21);
    vm.load(&output.binary).expect("load");
    assert_eq!(vm.exec(&mut host), Ok(()));
    assert_eq!(vm.state(), ExecutionState::Ended);
}
