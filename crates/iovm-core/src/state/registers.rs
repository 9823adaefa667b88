use crate::target::TargetDescriptor;

/// Number of per-operation register channels.
pub const CHANNEL_COUNT: usize = 4;

/// Valid bits of a channel address register (24-bit address space).
pub const ADDRESS_MASK: u32 = 0x00FF_FFFF;

/// Register channel selector encoded in bits 4..=5 of an instruction byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Channel {
    C0 = 0,
    C1 = 1,
    C2 = 2,
    C3 = 3,
}

impl Channel {
    /// Ordered list of all channels.
    pub const ALL: [Self; CHANNEL_COUNT] = [Self::C0, Self::C1, Self::C2, Self::C3];

    /// Returns the array index for this channel (`0..=3`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decodes a 2-bit channel field.
    #[must_use]
    pub const fn from_u2(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::C0,
            1 => Self::C1,
            2 => Self::C2,
            _ => Self::C3,
        }
    }
}

/// Operand registers for a single channel.
///
/// Configuration opcodes populate these; I/O opcodes consume them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ChannelRegisters {
    /// 24-bit start address.
    pub address: u32,
    /// Memory-target descriptor.
    pub target: TargetDescriptor,
    /// Translated transfer length (`1..=65536`; 0 until the program sets it).
    pub length: u32,
    /// Comparison value for wait/abort.
    pub compare: u8,
    /// Comparison mask for wait/abort.
    pub mask: u8,
    /// Wait timeout in host-defined ticks.
    pub timeout: u32,
}

impl Default for ChannelRegisters {
    fn default() -> Self {
        Self {
            address: 0,
            target: TargetDescriptor::default(),
            length: 0,
            compare: 0,
            mask: 0xFF,
            timeout: 0,
        }
    }
}

/// The engine-owned register file, one register set per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    channels: [ChannelRegisters; CHANNEL_COUNT],
}

impl RegisterFile {
    /// Returns the register set for `channel`.
    #[must_use]
    pub const fn channel(&self, channel: Channel) -> &ChannelRegisters {
        &self.channels[channel.index()]
    }

    /// Writes a channel's address register, masked to 24 bits.
    pub const fn set_address(&mut self, channel: Channel, address: u32) {
        self.channels[channel.index()].address = address & ADDRESS_MASK;
    }

    /// Writes a channel's target descriptor.
    pub const fn set_target(&mut self, channel: Channel, target: TargetDescriptor) {
        self.channels[channel.index()].target = target;
    }

    /// Writes a channel's length register from its raw 16-bit encoding
    /// (0 encodes the maximum, 65536).
    pub const fn set_length_raw(&mut self, channel: Channel, raw: u16) {
        self.channels[channel.index()].length = if raw == 0 { 0x0001_0000 } else { raw as u32 };
    }

    /// Writes a channel's comparison value and mask.
    pub const fn set_compare_mask(&mut self, channel: Channel, compare: u8, mask: u8) {
        let regs = &mut self.channels[channel.index()];
        regs.compare = compare;
        regs.mask = mask;
    }

    /// Writes a channel's timeout register.
    pub const fn set_timeout(&mut self, channel: Channel, timeout: u32) {
        self.channels[channel.index()].timeout = timeout;
    }
}

#[cfg(test)]
mod tests {
    use super::{Channel, RegisterFile, ADDRESS_MASK};

    #[test]
    fn channel_decode_covers_all_two_bit_values() {
        for (bits, channel) in Channel::ALL.into_iter().enumerate() {
            assert_eq!(Channel::from_u2(bits as u8), channel);
            assert_eq!(channel.index(), bits);
        }
        // upper bits are ignored by the 2-bit decode
        assert_eq!(Channel::from_u2(0x06), Channel::C2);
    }

    #[test]
    fn default_registers_are_zero_except_mask() {
        let file = RegisterFile::default();
        for channel in Channel::ALL {
            let regs = file.channel(channel);
            assert_eq!(regs.address, 0);
            assert_eq!(regs.target.raw(), 0);
            assert_eq!(regs.length, 0);
            assert_eq!(regs.compare, 0);
            assert_eq!(regs.mask, 0xFF);
            assert_eq!(regs.timeout, 0);
        }
    }

    #[test]
    fn address_writes_are_masked_to_24_bits() {
        let mut file = RegisterFile::default();
        file.set_address(Channel::C1, 0xFF12_3456);
        assert_eq!(file.channel(Channel::C1).address, 0x0012_3456);
        assert_eq!(file.channel(Channel::C1).address & !ADDRESS_MASK, 0);
        assert_eq!(file.channel(Channel::C0).address, 0);
    }

    #[test]
    fn zero_length_encodes_the_family_maximum() {
        let mut file = RegisterFile::default();
        file.set_length_raw(Channel::C2, 0);
        assert_eq!(file.channel(Channel::C2).length, 65536);

        file.set_length_raw(Channel::C2, 1);
        assert_eq!(file.channel(Channel::C2).length, 1);

        file.set_length_raw(Channel::C2, 0xFFFF);
        assert_eq!(file.channel(Channel::C2).length, 65535);
    }

    #[test]
    fn compare_mask_writes_land_on_one_channel_only() {
        let mut file = RegisterFile::default();
        file.set_compare_mask(Channel::C3, 0x55, 0x0F);
        assert_eq!(file.channel(Channel::C3).compare, 0x55);
        assert_eq!(file.channel(Channel::C3).mask, 0x0F);
        assert_eq!(file.channel(Channel::C2).mask, 0xFF);
    }
}
