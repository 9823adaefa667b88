//! Text assembler for IOVM procedures.

use iovm_core as _;

/// Assembly pipeline entry points.
pub mod assembler;
/// Statement encoding into procedure bytes.
pub mod encoder;
/// Line-tagged error and warning wrappers.
pub mod errors;
/// Source line parsing.
pub mod parser;

pub use assembler::{assemble_source, AssembleOutput};
pub use errors::{AssembleError, AssembleWarning};
