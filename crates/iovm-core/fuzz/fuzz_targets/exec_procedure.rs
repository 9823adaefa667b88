#![no_main]

use iovm_core::{
    decode_instruction, ErrorCode, Host, Opstate, ReadState, Vm, WaitState, WriteState,
};
use libfuzzer_sys::fuzz_target;

#[derive(Default)]
struct PermissiveHost;

impl Host for PermissiveHost {
    fn read_state_machine(&mut self, op: &mut ReadState) -> Result<(), ErrorCode> {
        op.opstate = Opstate::Completed;
        Ok(())
    }

    fn write_state_machine(&mut self, op: &mut WriteState, _data: &[u8]) -> Result<(), ErrorCode> {
        op.opstate = Opstate::Completed;
        Ok(())
    }

    fn wait_state_machine(&mut self, op: &mut WaitState) -> Result<(), ErrorCode> {
        op.opstate = Opstate::Completed;
        Ok(())
    }

    fn try_read_byte(&mut self, _target_id: u8, _address: u32) -> Result<u8, ErrorCode> {
        Ok(0)
    }

    fn send_end(&mut self) {}
}

fuzz_target!(|data: &[u8]| {
    for byte in data.iter().take(16) {
        let _ = decode_instruction(*byte);
    }

    let mut vm = Vm::new();
    let mut host = PermissiveHost;
    if vm.load(data).is_err() {
        return;
    }

    // an immediately-completing host reaches a terminal state in one step
    let _ = vm.exec(&mut host);
    assert!(vm.state().is_terminal());

    let _ = iovm_core::disassemble(data);
});
