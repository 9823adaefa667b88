//! Line parser for the IOVM procedure text format.
//!
//! One statement per line; `;` starts a comment. Mnemonics match the
//! core disassembler's output, so a listing reassembles to the same
//! bytes. Channels are written `c0`..`c3`; integers are decimal or
//! `0x`-prefixed hex; write payloads are whitespace-separated hex bytes.

use std::fmt;

use iovm_core::{Channel, MemoryTarget, TargetDescriptor, WaitCondition};

/// A parsed statement, 1:1 with the instruction table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `end`
    End,
    /// `seta8 ch, value`
    SetAddr8 {
        /// Target channel.
        channel: Channel,
        /// 8-bit address value.
        value: u8,
    },
    /// `seta16 ch, value`
    SetAddr16 {
        /// Target channel.
        channel: Channel,
        /// 16-bit address value.
        value: u16,
    },
    /// `seta24 ch, value`
    SetAddr24 {
        /// Target channel.
        channel: Channel,
        /// 24-bit address value.
        value: u32,
    },
    /// `settv ch, target[, advance]`
    SetTarget {
        /// Target channel.
        channel: Channel,
        /// Packed descriptor byte.
        descriptor: TargetDescriptor,
    },
    /// `setlen ch, length` (1..=65536)
    SetLength {
        /// Target channel.
        channel: Channel,
        /// Raw 16-bit encoding (0 encodes 65536).
        raw: u16,
    },
    /// `setcmpmsk ch, compare, mask`
    SetCompareMask {
        /// Target channel.
        channel: Channel,
        /// Comparison value.
        compare: u8,
        /// Comparison mask.
        mask: u8,
    },
    /// `settim ch, timeout`
    SetTimeout {
        /// Target channel.
        channel: Channel,
        /// Timeout in host ticks.
        timeout: u32,
    },
    /// `read ch`
    Read {
        /// Target channel.
        channel: Channel,
    },
    /// `write ch, b0 b1 ...`
    Write {
        /// Target channel.
        channel: Channel,
        /// Inline payload bytes.
        data: Vec<u8>,
    },
    /// `wait.<cond> ch`
    WaitWhile {
        /// Target channel.
        channel: Channel,
        /// Polled condition.
        condition: WaitCondition,
    },
    /// `abort.<cond> ch`
    AbortIf {
        /// Target channel.
        channel: Channel,
        /// Probed condition.
        condition: WaitCondition,
    },
}

/// Classification of line parse failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The mnemonic is not in the instruction table.
    UnknownMnemonic(String),
    /// The wait/abort condition suffix is not recognised.
    UnknownCondition(String),
    /// A required operand is missing.
    MissingOperand(&'static str),
    /// More operands than the statement accepts.
    TooManyOperands,
    /// The channel operand is not `c0`..`c3`.
    InvalidChannel(String),
    /// An integer operand did not parse.
    InvalidInteger(String),
    /// An integer operand is outside its field's range.
    IntegerOutOfRange {
        /// The offending source token.
        token: String,
        /// Inclusive maximum for the field.
        max: u64,
    },
    /// The target operand is neither a known name nor an id.
    InvalidTarget(String),
    /// The length operand is outside 1..=65536.
    InvalidLength(u64),
    /// A payload token is not a hex byte.
    InvalidPayloadByte(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMnemonic(name) => write!(f, "unknown mnemonic `{name}`"),
            Self::UnknownCondition(name) => write!(f, "unknown condition `{name}`"),
            Self::MissingOperand(what) => write!(f, "missing {what} operand"),
            Self::TooManyOperands => write!(f, "too many operands"),
            Self::InvalidChannel(token) => {
                write!(f, "invalid channel `{token}` (expected c0..c3)")
            }
            Self::InvalidInteger(token) => write!(f, "invalid integer `{token}`"),
            Self::IntegerOutOfRange { token, max } => {
                write!(f, "value `{token}` exceeds maximum {max}")
            }
            Self::InvalidTarget(token) => write!(f, "invalid memory target `{token}`"),
            Self::InvalidLength(value) => {
                write!(f, "length {value} outside 1..=65536")
            }
            Self::InvalidPayloadByte(token) => {
                write!(f, "invalid payload byte `{token}`")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses one source line into a statement.
///
/// Returns `Ok(None)` for blank and comment-only lines.
///
/// # Errors
///
/// Returns a [`ParseError`] describing the first problem on the line.
pub fn parse_line(line: &str) -> Result<Option<Statement>, ParseError> {
    let code = line.split(';').next().unwrap_or("").trim();
    if code.is_empty() {
        return Ok(None);
    }

    let (mnemonic, rest) = match code.split_once(char::is_whitespace) {
        Some((mnemonic, rest)) => (mnemonic, rest.trim()),
        None => (code, ""),
    };

    let operands: Vec<&str> = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(str::trim).collect()
    };

    if let Some((family, suffix)) = mnemonic.split_once('.') {
        let condition = parse_condition(suffix)?;
        let channel = parse_single_channel(&operands)?;
        return match family {
            "wait" => Ok(Some(Statement::WaitWhile { channel, condition })),
            "abort" => Ok(Some(Statement::AbortIf { channel, condition })),
            _ => Err(ParseError::UnknownMnemonic(mnemonic.to_owned())),
        };
    }

    match mnemonic {
        "end" => {
            if operands.is_empty() {
                Ok(Some(Statement::End))
            } else {
                Err(ParseError::TooManyOperands)
            }
        }
        "seta8" => {
            let (channel, value) = parse_channel_and_int(&operands, "address", 0xFF)?;
            Ok(Some(Statement::SetAddr8 {
                channel,
                value: value as u8,
            }))
        }
        "seta16" => {
            let (channel, value) = parse_channel_and_int(&operands, "address", 0xFFFF)?;
            Ok(Some(Statement::SetAddr16 {
                channel,
                value: value as u16,
            }))
        }
        "seta24" => {
            let (channel, value) = parse_channel_and_int(&operands, "address", 0x00FF_FFFF)?;
            Ok(Some(Statement::SetAddr24 {
                channel,
                value: value as u32,
            }))
        }
        "settv" => parse_settv(&operands).map(Some),
        "setlen" => {
            let (channel, value) = parse_channel_and_int(&operands, "length", 65536)?;
            if value == 0 {
                return Err(ParseError::InvalidLength(value));
            }
            Ok(Some(Statement::SetLength {
                channel,
                raw: (value & 0xFFFF) as u16,
            }))
        }
        "setcmpmsk" => {
            if operands.len() != 3 {
                return Err(if operands.len() < 3 {
                    ParseError::MissingOperand("compare/mask")
                } else {
                    ParseError::TooManyOperands
                });
            }
            let channel = parse_channel(operands[0])?;
            let compare = parse_int(operands[1], 0xFF)? as u8;
            let mask = parse_int(operands[2], 0xFF)? as u8;
            Ok(Some(Statement::SetCompareMask {
                channel,
                compare,
                mask,
            }))
        }
        "settim" => {
            let (channel, value) = parse_channel_and_int(&operands, "timeout", u64::from(u32::MAX))?;
            Ok(Some(Statement::SetTimeout {
                channel,
                timeout: value as u32,
            }))
        }
        "read" => Ok(Some(Statement::Read {
            channel: parse_single_channel(&operands)?,
        })),
        "write" => parse_write(&operands).map(Some),
        other => Err(ParseError::UnknownMnemonic(other.to_owned())),
    }
}

fn parse_condition(suffix: &str) -> Result<WaitCondition, ParseError> {
    WaitCondition::ALL
        .into_iter()
        .find(|condition| condition.suffix() == suffix)
        .ok_or_else(|| ParseError::UnknownCondition(suffix.to_owned()))
}

fn parse_channel(token: &str) -> Result<Channel, ParseError> {
    match token {
        "c0" => Ok(Channel::C0),
        "c1" => Ok(Channel::C1),
        "c2" => Ok(Channel::C2),
        "c3" => Ok(Channel::C3),
        other => Err(ParseError::InvalidChannel(other.to_owned())),
    }
}

fn parse_single_channel(operands: &[&str]) -> Result<Channel, ParseError> {
    match operands {
        [] => Err(ParseError::MissingOperand("channel")),
        [token] => parse_channel(token),
        _ => Err(ParseError::TooManyOperands),
    }
}

fn parse_int(token: &str, max: u64) -> Result<u64, ParseError> {
    let parsed = token.strip_prefix("0x").map_or_else(
        || token.parse::<u64>(),
        |hex| u64::from_str_radix(hex, 16),
    );
    let value = parsed.map_err(|_| ParseError::InvalidInteger(token.to_owned()))?;
    if value > max {
        return Err(ParseError::IntegerOutOfRange {
            token: token.to_owned(),
            max,
        });
    }
    Ok(value)
}

fn parse_channel_and_int(
    operands: &[&str],
    what: &'static str,
    max: u64,
) -> Result<(Channel, u64), ParseError> {
    match operands {
        [] => Err(ParseError::MissingOperand("channel")),
        [_] => Err(ParseError::MissingOperand(what)),
        [channel, value] => Ok((parse_channel(channel)?, parse_int(value, max)?)),
        _ => Err(ParseError::TooManyOperands),
    }
}

fn parse_settv(operands: &[&str]) -> Result<Statement, ParseError> {
    let (channel, target, advance) = match operands {
        [] => return Err(ParseError::MissingOperand("channel")),
        [_] => return Err(ParseError::MissingOperand("target")),
        [channel, target] => (parse_channel(channel)?, *target, false),
        [channel, target, "advance"] => (parse_channel(channel)?, *target, true),
        [_, _, other] => return Err(ParseError::InvalidTarget((*other).to_owned())),
        _ => return Err(ParseError::TooManyOperands),
    };

    let target_id = if let Some(known) = MemoryTarget::from_name(target) {
        known.as_u8()
    } else {
        let id = parse_int(target, u64::from(iovm_core::TARGET_ID_MASK))
            .map_err(|_| ParseError::InvalidTarget(target.to_owned()))?;
        id as u8
    };

    Ok(Statement::SetTarget {
        channel,
        descriptor: TargetDescriptor::new(target_id, advance),
    })
}

fn parse_write(operands: &[&str]) -> Result<Statement, ParseError> {
    let (channel, payload) = match operands {
        [] => return Err(ParseError::MissingOperand("channel")),
        [channel] => (parse_channel(channel)?, ""),
        [channel, payload] => (parse_channel(channel)?, *payload),
        _ => return Err(ParseError::TooManyOperands),
    };

    let mut data = Vec::new();
    for token in payload.split_whitespace() {
        let byte = u8::from_str_radix(token.strip_prefix("0x").unwrap_or(token), 16)
            .map_err(|_| ParseError::InvalidPayloadByte(token.to_owned()))?;
        data.push(byte);
    }
    Ok(Statement::Write { channel, data })
}
