//! Line-tagged error and warning wrappers for assembly runs.

use std::fmt;

use crate::encoder::EncodeWarning;
use crate::parser::ParseError;

/// A fatal assembly error tied to its 1-indexed source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleError {
    /// 1-indexed source line.
    pub line: usize,
    /// The parse failure on that line.
    pub kind: ParseError,
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: error: {}", self.line, self.kind)
    }
}

impl std::error::Error for AssembleError {}

/// A non-fatal assembly warning tied to its 1-indexed source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleWarning {
    /// 1-indexed source line.
    pub line: usize,
    /// The diagnostic for that line.
    pub kind: EncodeWarning,
}

impl fmt::Display for AssembleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: warning: {}", self.line, self.kind)
    }
}
