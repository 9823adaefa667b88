//! CLI entry point for the `iovm-asm` binary.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use iovm_asm::assemble_source;
use iovm_core as _;
#[cfg(test)]
use tempfile as _;

const HELP_TEXT: &str = "Usage: iovm-asm <input> [-o <output>] [--listing] [--help]";

#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    listing: bool,
}

#[derive(Debug)]
enum ParseResult {
    Args(CliArgs),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut listing = false;

    while let Some(arg) = args.next() {
        if arg == "--help" {
            return Ok(ParseResult::Help);
        }

        if arg == "--listing" {
            listing = true;
            continue;
        }

        if arg == "-o" {
            let value = args
                .next()
                .ok_or_else(|| String::from("missing value for -o"))?;
            output = Some(PathBuf::from(value));
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if input.is_some() {
            return Err(String::from("multiple input paths provided"));
        }
        input = Some(PathBuf::from(arg));
    }

    let input = input.ok_or_else(|| String::from("missing input path"))?;
    Ok(ParseResult::Args(CliArgs {
        input,
        output,
        listing,
    }))
}

fn default_output(input: &Path) -> PathBuf {
    let mut output = input.to_path_buf();
    output.set_extension("bin");
    output
}

fn run(args: CliArgs) -> Result<(), String> {
    let source = std::fs::read_to_string(&args.input)
        .map_err(|error| format!("cannot read {}: {error}", args.input.display()))?;

    let output = match assemble_source(&source) {
        Ok(output) => output,
        Err(errors) => {
            let mut rendered = String::new();
            for error in &errors {
                rendered.push_str(&format!("{}: {error}\n", args.input.display()));
            }
            return Err(rendered.trim_end().to_owned());
        }
    };

    for warning in &output.warnings {
        eprintln!("{}: {warning}", args.input.display());
    }

    if args.listing {
        for row in iovm_core::disassemble(&output.binary) {
            println!("{}", row.listing_line());
        }
    }

    let output_path = args
        .output
        .unwrap_or_else(|| default_output(&args.input));
    std::fs::write(&output_path, &output.binary)
        .map_err(|error| format!("cannot write {}: {error}", output_path.display()))?;

    Ok(())
}

fn main() -> ExitCode {
    match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{HELP_TEXT}");
            ExitCode::SUCCESS
        }
        Ok(ParseResult::Args(args)) => match run(args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => {
                eprintln!("{message}");
                ExitCode::FAILURE
            }
        },
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{HELP_TEXT}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{default_output, parse_args, CliArgs, ParseResult};
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn args<'a>(items: &'a [&'a str]) -> impl Iterator<Item = OsString> + 'a {
        items.iter().map(OsString::from)
    }

    #[test]
    fn parses_input_output_and_listing_flags() {
        let parsed = parse_args(args(&["proc.iovm", "-o", "proc.bin", "--listing"]))
            .expect("valid arguments");
        match parsed {
            ParseResult::Args(cli) => assert_eq!(
                cli,
                CliArgs {
                    input: PathBuf::from("proc.iovm"),
                    output: Some(PathBuf::from("proc.bin")),
                    listing: true,
                }
            ),
            ParseResult::Help => panic!("expected parsed arguments"),
        }
    }

    #[test]
    fn help_flag_wins() {
        assert!(matches!(
            parse_args(args(&["--help"])),
            Ok(ParseResult::Help)
        ));
        assert!(matches!(
            parse_args(args(&["proc.iovm", "--help"])),
            Ok(ParseResult::Help)
        ));
    }

    #[test]
    fn missing_or_duplicate_inputs_are_rejected() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["a.iovm", "b.iovm"])).is_err());
        assert!(parse_args(args(&["-o"])).is_err());
        assert!(parse_args(args(&["--frobnicate"])).is_err());
    }

    #[test]
    fn default_output_swaps_the_extension() {
        assert_eq!(
            default_output(&PathBuf::from("dir/proc.iovm")),
            PathBuf::from("dir/proc.bin")
        );
    }
}
