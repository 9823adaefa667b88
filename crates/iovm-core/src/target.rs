//! Memory-target descriptors and the reference target table.
//!
//! The engine treats target ids as opaque 6-bit values; the reference
//! enumeration and its access policy exist for hosts that expose the
//! conventional console memory regions.

use crate::ErrorCode;

/// Descriptor bit carrying the auto-advance flag.
pub const TARGET_AUTO_ADVANCE_BIT: u8 = 0x80;

/// Descriptor bits carrying the memory-target id.
pub const TARGET_ID_MASK: u8 = 0x3F;

/// A channel's packed target descriptor byte.
///
/// Bit 7 enables auto-advance (the channel address register is bumped by
/// the transfer length when a read or write completes). Bit 6 is reserved
/// and ignored. Bits 0..=5 identify the memory target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TargetDescriptor(u8);

impl TargetDescriptor {
    /// Wraps a raw descriptor byte.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Builds a descriptor from a target id and the auto-advance flag.
    #[must_use]
    pub const fn new(target_id: u8, auto_advance: bool) -> Self {
        let mut raw = target_id & TARGET_ID_MASK;
        if auto_advance {
            raw |= TARGET_AUTO_ADVANCE_BIT;
        }
        Self(raw)
    }

    /// Returns the raw descriptor byte.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Returns the opaque memory-target id (bits 0..=5).
    #[must_use]
    pub const fn target_id(self) -> u8 {
        self.0 & TARGET_ID_MASK
    }

    /// Returns `true` when auto-advance is enabled for this channel.
    #[must_use]
    pub const fn auto_advance(self) -> bool {
        self.0 & TARGET_AUTO_ADVANCE_BIT != 0
    }
}

/// Reference memory-target table used by the bundled hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum MemoryTarget {
    /// Console work RAM.
    WorkRam = 0,
    /// Video RAM.
    VideoRam = 1,
    /// Palette RAM.
    PaletteRam = 2,
    /// Object attribute memory.
    ObjectMemory = 3,
    /// Audio coprocessor RAM.
    AudioRam = 4,
    /// Dedicated expansion region.
    Expansion = 5,
    /// Cartridge ROM.
    Rom = 6,
    /// Battery-backed save RAM.
    SaveRam = 7,
}

impl MemoryTarget {
    /// Ordered list of all reference targets.
    pub const ALL: [Self; 8] = [
        Self::WorkRam,
        Self::VideoRam,
        Self::PaletteRam,
        Self::ObjectMemory,
        Self::AudioRam,
        Self::Expansion,
        Self::Rom,
        Self::SaveRam,
    ];

    /// Returns the stable target id.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decodes a target id into a reference target.
    ///
    /// `None` means the id is outside the reference table; hosts map that
    /// to [`ErrorCode::MemoryTargetUndefined`].
    #[must_use]
    pub const fn from_u8(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::WorkRam),
            1 => Some(Self::VideoRam),
            2 => Some(Self::PaletteRam),
            3 => Some(Self::ObjectMemory),
            4 => Some(Self::AudioRam),
            5 => Some(Self::Expansion),
            6 => Some(Self::Rom),
            7 => Some(Self::SaveRam),
            _ => None,
        }
    }

    /// Returns the assembler/disassembler name for this target.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::WorkRam => "wram",
            Self::VideoRam => "vram",
            Self::PaletteRam => "cgram",
            Self::ObjectMemory => "oam",
            Self::AudioRam => "aram",
            Self::Expansion => "exp",
            Self::Rom => "rom",
            Self::SaveRam => "sram",
        }
    }

    /// Resolves an assembler name back to a reference target.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|target| target.name() == name)
    }
}

/// Validates read legality for a reference target.
///
/// Every reference target is readable; the helper exists so host policy
/// stays symmetric with [`validate_write_access`].
///
/// # Errors
///
/// Returns [`ErrorCode::MemoryTargetUndefined`] when `target_id` is outside
/// the reference table.
pub const fn validate_read_access(target_id: u8) -> Result<MemoryTarget, ErrorCode> {
    match MemoryTarget::from_u8(target_id) {
        Some(target) => Ok(target),
        None => Err(ErrorCode::MemoryTargetUndefined),
    }
}

/// Validates write legality for a reference target.
///
/// # Errors
///
/// Returns [`ErrorCode::MemoryTargetUndefined`] for ids outside the
/// reference table and [`ErrorCode::MemoryTargetNotWritable`] for ROM.
pub const fn validate_write_access(target_id: u8) -> Result<MemoryTarget, ErrorCode> {
    match MemoryTarget::from_u8(target_id) {
        Some(MemoryTarget::Rom) => Err(ErrorCode::MemoryTargetNotWritable),
        Some(target) => Ok(target),
        None => Err(ErrorCode::MemoryTargetUndefined),
    }
}
