//! Statement encoding into the flat procedure byte format.

use std::fmt;

use iovm_core::{Channel, ProcedureBuilder, CHANNEL_COUNT};

use crate::parser::Statement;

/// A non-fatal diagnostic produced while encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeWarning {
    /// A `write` payload length disagrees with the channel's pending
    /// `setlen`; the engine will consume the `setlen` amount regardless.
    PayloadLengthMismatch {
        /// The write's channel.
        channel: Channel,
        /// Length the channel register will hold at runtime.
        declared: u32,
        /// Bytes actually present in the payload.
        actual: usize,
    },
    /// A `write` appears before any `setlen` on its channel; the fresh-VM
    /// length register is zero, so no payload bytes will be consumed.
    WriteWithoutLength {
        /// The write's channel.
        channel: Channel,
    },
}

impl fmt::Display for EncodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadLengthMismatch {
                channel,
                declared,
                actual,
            } => write!(
                f,
                "write payload on c{} has {actual} bytes but setlen declares {declared}",
                channel.index()
            ),
            Self::WriteWithoutLength { channel } => write!(
                f,
                "write on c{} has no preceding setlen; no payload will be consumed",
                channel.index()
            ),
        }
    }
}

/// Tracks per-channel lengths and appends encoded statements.
#[derive(Debug, Default)]
pub struct Encoder {
    builder: ProcedureBuilder,
    lengths: [Option<u32>; CHANNEL_COUNT],
    warnings: Vec<(usize, EncodeWarning)>,
}

impl Encoder {
    /// Creates an empty encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes one statement, recording any warning against `line`.
    pub fn push(&mut self, line: usize, statement: &Statement) {
        match statement {
            Statement::End => {
                self.builder.end();
            }
            Statement::SetAddr8 { channel, value } => {
                self.builder.set_addr8(*channel, *value);
            }
            Statement::SetAddr16 { channel, value } => {
                self.builder.set_addr16(*channel, *value);
            }
            Statement::SetAddr24 { channel, value } => {
                self.builder.set_addr24(*channel, *value);
            }
            Statement::SetTarget {
                channel,
                descriptor,
            } => {
                self.builder.set_target(*channel, *descriptor);
            }
            Statement::SetLength { channel, raw } => {
                self.lengths[channel.index()] =
                    Some(if *raw == 0 { 0x0001_0000 } else { u32::from(*raw) });
                self.builder.set_length_raw(*channel, *raw);
            }
            Statement::SetCompareMask {
                channel,
                compare,
                mask,
            } => {
                self.builder.set_compare_mask(*channel, *compare, *mask);
            }
            Statement::SetTimeout { channel, timeout } => {
                self.builder.set_timeout(*channel, *timeout);
            }
            Statement::Read { channel } => {
                self.builder.read(*channel);
            }
            Statement::Write { channel, data } => {
                match self.lengths[channel.index()] {
                    Some(declared) if declared as usize != data.len() => {
                        self.warnings.push((
                            line,
                            EncodeWarning::PayloadLengthMismatch {
                                channel: *channel,
                                declared,
                                actual: data.len(),
                            },
                        ));
                    }
                    None => {
                        self.warnings
                            .push((line, EncodeWarning::WriteWithoutLength { channel: *channel }));
                    }
                    Some(_) => {}
                }
                self.builder.write_raw(*channel, data);
            }
            Statement::WaitWhile { channel, condition } => {
                self.builder.wait_while(*channel, *condition);
            }
            Statement::AbortIf { channel, condition } => {
                self.builder.abort_if(*channel, *condition);
            }
        }
    }

    /// Consumes the encoder, returning the binary and the warnings with
    /// their 1-indexed source lines.
    #[must_use]
    pub fn finish(self) -> (Vec<u8>, Vec<(usize, EncodeWarning)>) {
        (self.builder.finish(), self.warnings)
    }
}
