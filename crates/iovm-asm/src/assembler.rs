//! The assembly pipeline: parse every line, then encode.
//!
//! Parsing collects all errors before giving up, so a source file with
//! several mistakes reports them in one run.

use crate::encoder::Encoder;
use crate::errors::{AssembleError, AssembleWarning};
use crate::parser::parse_line;

/// Result of a successful assembly run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleOutput {
    /// The encoded procedure.
    pub binary: Vec<u8>,
    /// Non-fatal diagnostics in source order.
    pub warnings: Vec<AssembleWarning>,
}

/// Assembles procedure source text into its binary encoding.
///
/// # Errors
///
/// Returns every parse error found, in source order; the binary is only
/// produced when the whole source parses.
pub fn assemble_source(source: &str) -> Result<AssembleOutput, Vec<AssembleError>> {
    let mut statements = Vec::new();
    let mut errors = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let line_no = index + 1;
        match parse_line(line) {
            Ok(Some(statement)) => statements.push((line_no, statement)),
            Ok(None) => {}
            Err(kind) => errors.push(AssembleError {
                line: line_no,
                kind,
            }),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let mut encoder = Encoder::new();
    for (line_no, statement) in &statements {
        encoder.push(*line_no, statement);
    }
    let (binary, warnings) = encoder.finish();

    Ok(AssembleOutput {
        binary,
        warnings: warnings
            .into_iter()
            .map(|(line, kind)| AssembleWarning { line, kind })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::assemble_source;

    const SCENARIO: &str = "\
; read two bytes of save RAM into the client
seta24 c2, 0xF50010
settv  c2, sram, advance
setlen c2, 2
read   c2
end
";

    #[test]
    fn a_complete_procedure_assembles_to_the_expected_bytes() {
        let output = assemble_source(SCENARIO).expect("valid source");
        assert_eq!(
            output.binary,
            [
                0x23, 0x10, 0x00, 0xF5, // seta24 c2
                0x24, 0x87, // settv c2, sram+advance
                0x25, 0x02, 0x00, // setlen c2, 2
                0x28, // read c2
                0x00, // end
            ]
        );
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn all_parse_errors_are_reported_together() {
        let source = "seta8 c9, 1\nread c0\nbogus\n";
        let errors = assemble_source(source).expect_err("two bad lines");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, 1);
        assert_eq!(errors[1].line, 3);
    }

    #[test]
    fn warnings_surface_with_their_source_lines() {
        let source = "setlen c3, 4\nwrite c3, aa 55\nend\n";
        let output = assemble_source(source).expect("valid source");
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].line, 2);
    }

    #[test]
    fn listing_output_reassembles_to_the_same_binary() {
        let output = assemble_source(SCENARIO).expect("valid source");
        let listing: String = iovm_core::disassemble(&output.binary)
            .iter()
            .map(|row| {
                if row.operands.is_empty() {
                    format!("{}\n", row.mnemonic)
                } else {
                    format!("{} {}\n", row.mnemonic, row.operands)
                }
            })
            .collect();
        let second = assemble_source(&listing).expect("listing reassembles");
        assert_eq!(second.binary, output.binary);
    }
}
