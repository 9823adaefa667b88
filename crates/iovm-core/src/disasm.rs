//! Procedure disassembly into human-readable listing rows.
//!
//! Disassembly is stateful: write payloads are skipped by tracking each
//! channel's `setlen` as the walk progresses. The walk assumes a freshly
//! constructed VM, where every length register starts at zero; procedures
//! relying on register state carried over from a previous run will not
//! list correctly.

use crate::encoding::{decode_instruction, Instruction, Opcode};
use crate::state::{Channel, CHANNEL_COUNT};
use crate::target::{MemoryTarget, TargetDescriptor};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Procedure offset of the instruction byte.
    pub offset: usize,
    /// Raw bytes of the instruction, operands, and any write payload.
    pub bytes: Vec<u8>,
    /// The instruction mnemonic (e.g. `seta24`, `wait.neq`).
    pub mnemonic: String,
    /// The formatted operands (e.g. `c2, 0xF50010`).
    pub operands: String,
    /// Whether this row is an illegal or truncated encoding.
    pub is_illegal: bool,
}

impl DisassemblyRow {
    /// Formats the row as one listing line.
    #[must_use]
    pub fn listing_line(&self) -> String {
        if self.operands.is_empty() {
            format!("{:06x}  {}", self.offset, self.mnemonic)
        } else {
            format!("{:06x}  {} {}", self.offset, self.mnemonic, self.operands)
        }
    }
}

/// Disassembles a complete procedure into listing rows.
#[must_use]
pub fn disassemble(procedure: &[u8]) -> Vec<DisassemblyRow> {
    let mut rows = Vec::new();
    let mut lengths = [0u32; CHANNEL_COUNT];
    let mut offset = 0usize;

    while offset < procedure.len() {
        let byte = procedure[offset];
        let Some(instruction) = decode_instruction(byte) else {
            rows.push(DisassemblyRow {
                offset,
                bytes: vec![byte],
                mnemonic: ".byte".to_owned(),
                operands: format!("0x{byte:02x}"),
                is_illegal: true,
            });
            offset += 1;
            continue;
        };

        let payload_len = if instruction.opcode == Opcode::Write {
            lengths[instruction.channel.index()] as usize
        } else {
            0
        };
        let body_len = 1 + instruction.opcode.operand_len() + payload_len;

        let Some(bytes) = procedure.get(offset..offset + body_len) else {
            rows.push(DisassemblyRow {
                offset,
                bytes: procedure[offset..].to_vec(),
                mnemonic: mnemonic_for(instruction),
                operands: "<truncated>".to_owned(),
                is_illegal: true,
            });
            break;
        };

        if instruction.opcode == Opcode::SetLength {
            let raw = u16::from_le_bytes([bytes[1], bytes[2]]);
            lengths[instruction.channel.index()] =
                if raw == 0 { 0x0001_0000 } else { u32::from(raw) };
        }

        rows.push(DisassemblyRow {
            offset,
            bytes: bytes.to_vec(),
            mnemonic: mnemonic_for(instruction),
            operands: operands_for(instruction, bytes),
            is_illegal: false,
        });
        offset += body_len;
    }

    rows
}

fn mnemonic_for(instruction: Instruction) -> String {
    if let Some(condition) = instruction.opcode.wait_condition() {
        let family = if instruction.abort { "abort" } else { "wait" };
        return format!("{family}.{}", condition.suffix());
    }
    match instruction.opcode {
        Opcode::End => "end",
        Opcode::SetAddr8 => "seta8",
        Opcode::SetAddr16 => "seta16",
        Opcode::SetAddr24 => "seta24",
        Opcode::SetTarget => "settv",
        Opcode::SetLength => "setlen",
        Opcode::SetCompareMask => "setcmpmsk",
        Opcode::SetTimeout => "settim",
        Opcode::Read => "read",
        Opcode::Write => "write",
        // wait family handled above
        _ => "wait",
    }
    .to_owned()
}

fn channel_name(channel: Channel) -> String {
    format!("c{}", channel.index())
}

fn operands_for(instruction: Instruction, bytes: &[u8]) -> String {
    let channel = channel_name(instruction.channel);
    match instruction.opcode {
        Opcode::End => String::new(),
        Opcode::SetAddr8 => format!("{channel}, 0x{:02x}", bytes[1]),
        Opcode::SetAddr16 => {
            let value = u16::from_le_bytes([bytes[1], bytes[2]]);
            format!("{channel}, 0x{value:04x}")
        }
        Opcode::SetAddr24 => {
            let value =
                u32::from(bytes[1]) | (u32::from(bytes[2]) << 8) | (u32::from(bytes[3]) << 16);
            format!("{channel}, 0x{value:06x}")
        }
        Opcode::SetTarget => {
            let descriptor = TargetDescriptor::from_raw(bytes[1]);
            let target = MemoryTarget::from_u8(descriptor.target_id()).map_or_else(
                || format!("0x{:02x}", descriptor.target_id()),
                |known| known.name().to_owned(),
            );
            if descriptor.auto_advance() {
                format!("{channel}, {target}, advance")
            } else {
                format!("{channel}, {target}")
            }
        }
        Opcode::SetLength => {
            let raw = u16::from_le_bytes([bytes[1], bytes[2]]);
            let length = if raw == 0 { 0x0001_0000 } else { u32::from(raw) };
            format!("{channel}, {length}")
        }
        Opcode::SetCompareMask => {
            format!("{channel}, 0x{:02x}, 0x{:02x}", bytes[1], bytes[2])
        }
        Opcode::SetTimeout => {
            let value = u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
            format!("{channel}, {value}")
        }
        Opcode::Write => {
            let payload: Vec<String> = bytes[1..].iter().map(|b| format!("{b:02x}")).collect();
            if payload.is_empty() {
                channel
            } else {
                format!("{channel}, {}", payload.join(" "))
            }
        }
        _ => channel,
    }
}

#[cfg(test)]
mod tests {
    use super::disassemble;
    use crate::asm::ProcedureBuilder;
    use crate::encoding::WaitCondition;
    use crate::state::Channel;
    use crate::target::TargetDescriptor;

    #[test]
    fn listing_matches_assembler_syntax() {
        let mut builder = ProcedureBuilder::new();
        builder
            .set_addr24(Channel::C2, 0x00F5_0010)
            .set_target(Channel::C2, TargetDescriptor::new(7, true))
            .set_length_raw(Channel::C2, 2)
            .read(Channel::C2)
            .end();
        let procedure = builder.finish();

        let rows = disassemble(&procedure);
        let lines: Vec<String> = rows
            .iter()
            .map(|row| format!("{} {}", row.mnemonic, row.operands).trim_end().to_owned())
            .collect();
        assert_eq!(
            lines,
            [
                "seta24 c2, 0xf50010",
                "settv c2, sram, advance",
                "setlen c2, 2",
                "read c2",
                "end",
            ]
        );
        assert!(rows.iter().all(|row| !row.is_illegal));
    }

    #[test]
    fn write_payload_is_skipped_using_tracked_lengths() {
        let mut builder = ProcedureBuilder::new();
        builder.write(Channel::C3, &[0xAA, 0x55]).end();
        let procedure = builder.finish();

        let rows = disassemble(&procedure);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].mnemonic, "write");
        assert_eq!(rows[1].operands, "c3, aa 55");
        assert_eq!(rows[1].bytes.len(), 3);
        assert_eq!(rows[2].mnemonic, "end");
    }

    #[test]
    fn illegal_bytes_are_flagged_and_the_walk_continues() {
        let procedure = [0x80, 0x00];
        let rows = disassemble(&procedure);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_illegal);
        assert_eq!(rows[0].mnemonic, ".byte");
        assert_eq!(rows[1].mnemonic, "end");
        assert!(!rows[1].is_illegal);
    }

    #[test]
    fn truncated_operands_end_the_walk_with_a_flagged_row() {
        // seta24 with a missing operand byte
        let procedure = [0x23, 0x10, 0x00];
        let rows = disassemble(&procedure);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_illegal);
        assert_eq!(rows[0].operands, "<truncated>");
    }

    #[test]
    fn abort_probes_use_the_abort_mnemonic_family() {
        let mut builder = ProcedureBuilder::new();
        builder
            .abort_if(Channel::C1, WaitCondition::GreaterThanOrEqual)
            .wait_while(Channel::C1, WaitCondition::Equal)
            .end();
        let rows = disassemble(&builder.finish());
        assert_eq!(rows[0].mnemonic, "abort.gte");
        assert_eq!(rows[0].operands, "c1");
        assert_eq!(rows[1].mnemonic, "wait.eq");
    }
}
