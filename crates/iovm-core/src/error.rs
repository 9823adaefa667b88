use thiserror::Error;

/// Coarse error classes used for host policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ErrorClass {
    /// Misuse of the public API or a malformed procedure.
    Program,
    /// Memory-target fault surfaced by a host callback.
    Memory,
    /// First-class program outcome (timeout, abort).
    Flow,
}

/// Stable error taxonomy latched by the execution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum ErrorCode {
    /// Operand or payload fetch ran past the end of the procedure buffer,
    /// or a callback parameter was out of band.
    #[error("parameter or buffer offset out of range")]
    OutOfRange = 0x01,
    /// Public API call made in a state that forbids it.
    #[error("operation not permitted in the current execution state")]
    InvalidOperationForState = 0x02,
    /// The decoder saw an instruction byte outside the defined encoding.
    #[error("unknown opcode byte")]
    UnknownOpcode = 0x03,
    /// A wait operation exhausted its host timer.
    #[error("wait timed out")]
    TimedOut = 0x04,
    /// An abort probe's comparison matched.
    #[error("program aborted by abort probe")]
    Aborted = 0x05,
    /// The host has no memory target with the requested id.
    #[error("memory target undefined")]
    MemoryTargetUndefined = 0x06,
    /// The address is outside the memory target's range.
    #[error("address out of range for memory target")]
    MemoryTargetAddressOutOfRange = 0x07,
    /// The memory target cannot be read.
    #[error("memory target not readable")]
    MemoryTargetNotReadable = 0x08,
    /// The memory target cannot be written.
    #[error("memory target not writable")]
    MemoryTargetNotWritable = 0x09,
}

impl ErrorCode {
    /// Converts an error code to its stable wire value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a stable wire value back into an error code.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::OutOfRange),
            0x02 => Some(Self::InvalidOperationForState),
            0x03 => Some(Self::UnknownOpcode),
            0x04 => Some(Self::TimedOut),
            0x05 => Some(Self::Aborted),
            0x06 => Some(Self::MemoryTargetUndefined),
            0x07 => Some(Self::MemoryTargetAddressOutOfRange),
            0x08 => Some(Self::MemoryTargetNotReadable),
            0x09 => Some(Self::MemoryTargetNotWritable),
            _ => None,
        }
    }

    /// Returns the policy class for this error code.
    #[must_use]
    pub const fn class(self) -> ErrorClass {
        match self {
            Self::OutOfRange | Self::InvalidOperationForState | Self::UnknownOpcode => {
                ErrorClass::Program
            }
            Self::MemoryTargetUndefined
            | Self::MemoryTargetAddressOutOfRange
            | Self::MemoryTargetNotReadable
            | Self::MemoryTargetNotWritable => ErrorClass::Memory,
            Self::TimedOut | Self::Aborted => ErrorClass::Flow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorClass, ErrorCode};

    #[test]
    fn stable_code_roundtrip_is_bijective_for_defined_values() {
        for code in 0x01u8..=0x09 {
            let error = ErrorCode::from_u8(code).expect("defined taxonomy code");
            assert_eq!(error.as_u8(), code);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!(ErrorCode::from_u8(0x00).is_none());
        assert!(ErrorCode::from_u8(0x0A).is_none());
        assert!(ErrorCode::from_u8(0xFF).is_none());
    }

    #[test]
    fn class_mapping_matches_error_taxonomy() {
        assert_eq!(ErrorCode::OutOfRange.class(), ErrorClass::Program);
        assert_eq!(
            ErrorCode::InvalidOperationForState.class(),
            ErrorClass::Program
        );
        assert_eq!(ErrorCode::UnknownOpcode.class(), ErrorClass::Program);
        assert_eq!(ErrorCode::TimedOut.class(), ErrorClass::Flow);
        assert_eq!(ErrorCode::Aborted.class(), ErrorClass::Flow);
        assert_eq!(ErrorCode::MemoryTargetUndefined.class(), ErrorClass::Memory);
        assert_eq!(
            ErrorCode::MemoryTargetNotWritable.class(),
            ErrorClass::Memory
        );
    }
}
