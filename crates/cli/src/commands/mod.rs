mod check;
mod fmt;
mod parse;
mod tokens;
mod units;

pub(crate) use check::cmd_check;
pub(crate) use fmt::cmd_fmt;
pub(crate) use parse::cmd_parse;
pub(crate) use tokens::cmd_tokens;
pub(crate) use units::cmd_units;

use std::path::Path;
use std::process;

use pluto_core::source::{FileSystemProvider, SourceProvider};
use pluto_core::Diagnostic;

use crate::{report_error, OutputFormat};

/// Read a source file or exit 1.
fn read_or_exit(file: &Path, output: OutputFormat, quiet: bool) -> String {
    match FileSystemProvider.read_source(file) {
        Ok(text) => text,
        Err(e) => {
            report_error(
                &format!("could not read '{}': {}", file.display(), e),
                output,
                quiet,
            );
            process::exit(1);
        }
    }
}

/// `file:line:col: kind error: message`
fn diagnostic_line(file: &Path, d: &Diagnostic) -> String {
    format!(
        "{}:{}:{}: {} error: {}",
        file.display(),
        d.span.line,
        d.span.column,
        d.kind,
        d.message
    )
}

/// Print a fatal diagnostic to stderr and exit 1.
fn fail_with(file: &Path, d: &Diagnostic, output: OutputFormat, quiet: bool) -> ! {
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::to_string_pretty(&d.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", d));
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("{}", diagnostic_line(file, d));
            }
        }
    }
    process::exit(1);
}
