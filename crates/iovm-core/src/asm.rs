//! In-memory procedure builder for clients and tests.
//!
//! Emits the flat byte encoding one instruction at a time. The builder is
//! deliberately 1:1 with the instruction table; it does not insert
//! configuration opcodes on the caller's behalf except for
//! [`ProcedureBuilder::write`], which pairs the payload with its length.

use crate::encoding::{encode_abort_instruction, encode_instruction, Opcode, WaitCondition};
use crate::state::Channel;
use crate::target::TargetDescriptor;

/// Builds a byte-encoded procedure.
#[derive(Debug, Clone, Default)]
pub struct ProcedureBuilder {
    bytes: Vec<u8>,
}

impl ProcedureBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Number of bytes emitted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` when nothing has been emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consumes the builder, returning the encoded procedure.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }

    /// Emits a raw byte verbatim.
    pub fn emit(&mut self, byte: u8) -> &mut Self {
        self.bytes.push(byte);
        self
    }

    /// Emits `end`.
    pub fn end(&mut self) -> &mut Self {
        self.emit(encode_instruction(Opcode::End, Channel::C0))
    }

    /// Emits `seta8 ch, value`.
    pub fn set_addr8(&mut self, channel: Channel, value: u8) -> &mut Self {
        self.emit(encode_instruction(Opcode::SetAddr8, channel))
            .emit(value)
    }

    /// Emits `seta16 ch, value`.
    pub fn set_addr16(&mut self, channel: Channel, value: u16) -> &mut Self {
        self.emit(encode_instruction(Opcode::SetAddr16, channel));
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Emits `seta24 ch, value` (the upper address byte is discarded).
    pub fn set_addr24(&mut self, channel: Channel, value: u32) -> &mut Self {
        self.emit(encode_instruction(Opcode::SetAddr24, channel));
        self.bytes.extend_from_slice(&value.to_le_bytes()[..3]);
        self
    }

    /// Emits `settv ch, descriptor`.
    pub fn set_target(&mut self, channel: Channel, target: TargetDescriptor) -> &mut Self {
        self.emit(encode_instruction(Opcode::SetTarget, channel))
            .emit(target.raw())
    }

    /// Emits `setlen ch, length` using the raw 16-bit encoding
    /// (0 encodes 65536).
    pub fn set_length_raw(&mut self, channel: Channel, raw: u16) -> &mut Self {
        self.emit(encode_instruction(Opcode::SetLength, channel));
        self.bytes.extend_from_slice(&raw.to_le_bytes());
        self
    }

    /// Emits `setcmpmsk ch, compare, mask`.
    pub fn set_compare_mask(&mut self, channel: Channel, compare: u8, mask: u8) -> &mut Self {
        self.emit(encode_instruction(Opcode::SetCompareMask, channel))
            .emit(compare)
            .emit(mask)
    }

    /// Emits `settim ch, timeout`.
    pub fn set_timeout(&mut self, channel: Channel, timeout: u32) -> &mut Self {
        self.emit(encode_instruction(Opcode::SetTimeout, channel));
        self.bytes.extend_from_slice(&timeout.to_le_bytes());
        self
    }

    /// Emits `read ch` (length comes from the channel registers).
    pub fn read(&mut self, channel: Channel) -> &mut Self {
        self.emit(encode_instruction(Opcode::Read, channel))
    }

    /// Emits `setlen` for the payload length, `write ch`, and the payload.
    ///
    /// Payloads longer than 65536 bytes are truncated to the encoding
    /// maximum.
    pub fn write(&mut self, channel: Channel, data: &[u8]) -> &mut Self {
        let data = if data.len() > 0x0001_0000 {
            &data[..0x0001_0000]
        } else {
            data
        };
        self.set_length_raw(channel, (data.len() & 0xFFFF) as u16);
        self.write_raw(channel, data)
    }

    /// Emits `write ch` and the payload without a `setlen`; the caller
    /// guarantees the channel's length register already matches.
    pub fn write_raw(&mut self, channel: Channel, data: &[u8]) -> &mut Self {
        self.emit(encode_instruction(Opcode::Write, channel));
        self.bytes.extend_from_slice(data);
        self
    }

    /// Emits `wait.<cond> ch`.
    pub fn wait_while(&mut self, channel: Channel, condition: WaitCondition) -> &mut Self {
        self.emit(encode_instruction(condition.opcode(), channel))
    }

    /// Emits `abort.<cond> ch`.
    pub fn abort_if(&mut self, channel: Channel, condition: WaitCondition) -> &mut Self {
        self.emit(encode_abort_instruction(condition, channel))
    }
}

#[cfg(test)]
mod tests {
    use super::ProcedureBuilder;
    use crate::encoding::WaitCondition;
    use crate::state::Channel;
    use crate::target::TargetDescriptor;

    #[test]
    fn builder_emits_the_documented_encoding() {
        let mut builder = ProcedureBuilder::new();
        builder
            .set_addr24(Channel::C2, 0x00F5_0010)
            .set_target(Channel::C2, TargetDescriptor::new(7, true))
            .set_length_raw(Channel::C2, 2)
            .read(Channel::C2)
            .end();

        assert_eq!(
            builder.finish(),
            [
                0x23, 0x10, 0x00, 0xF5, // seta24 c2, 0xF50010
                0x24, 0x87, // settv c2, sram+advance
                0x25, 0x02, 0x00, // setlen c2, 2
                0x28, // read c2
                0x00, // end
            ]
        );
    }

    #[test]
    fn write_pairs_payload_with_its_length() {
        let mut builder = ProcedureBuilder::new();
        builder.write(Channel::C3, &[0xAA, 0x55]).end();

        assert_eq!(
            builder.finish(),
            [
                0x35, 0x02, 0x00, // setlen c3, 2
                0x39, 0xAA, 0x55, // write c3 + payload
                0x00, // end
            ]
        );
    }

    #[test]
    fn wait_and_abort_share_the_condition_encoding() {
        let mut builder = ProcedureBuilder::new();
        builder
            .wait_while(Channel::C1, WaitCondition::NotEqual)
            .abort_if(Channel::C1, WaitCondition::NotEqual);

        let bytes = builder.finish();
        assert_eq!(bytes.len(), 2);
        assert_eq!(bytes[0], 0x1A);
        assert_eq!(bytes[1], 0x1A | 0x40);
    }

    #[test]
    fn seta24_discards_the_top_address_byte() {
        let mut builder = ProcedureBuilder::new();
        builder.set_addr24(Channel::C0, 0xAB12_3456);
        assert_eq!(builder.finish(), [0x03, 0x56, 0x34, 0x12]);
    }
}
