use std::path::Path;
use std::process;

use pluto_core::{Diagnostic, SourceFile};

use super::{diagnostic_line, fail_with, read_or_exit};
use crate::OutputFormat;

pub(crate) fn cmd_check(
    file: &Path,
    recover: bool,
    max_errors: usize,
    output: OutputFormat,
    quiet: bool,
) {
    let text = read_or_exit(file, output, quiet);

    // Lexical errors are fatal in both modes.
    let (ast, diagnostics): (Option<SourceFile>, Vec<Diagnostic>) = if recover {
        match pluto_core::parse_source_recovering(&text, max_errors) {
            Ok((ast, diags)) => (Some(ast), diags),
            Err(d) => (None, vec![d]),
        }
    } else {
        match pluto_core::parse_source(&text) {
            Ok(ast) => (Some(ast), Vec::new()),
            Err(d) => (None, vec![d]),
        }
    };
    tracing::debug!(diagnostics = diagnostics.len(), recover, "check finished");

    match output {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "file": file.display().to_string(),
                "ok": diagnostics.is_empty(),
                "diagnostics": diagnostics.iter().map(Diagnostic::to_json_value).collect::<Vec<_>>(),
            });
            let json = serde_json::to_string_pretty(&report)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", json);
        }
        OutputFormat::Text => {
            if diagnostics.is_empty() {
                if !quiet {
                    let (procs, decls) = ast
                        .as_ref()
                        .map_or((0, 0), |a| (a.procedures().count(), a.declarations().count()));
                    println!(
                        "{}: ok ({} procedure(s), {} declaration(s))",
                        file.display(),
                        procs,
                        decls
                    );
                }
            } else if !recover {
                fail_with(file, &diagnostics[0], output, quiet);
            } else if !quiet {
                for d in &diagnostics {
                    eprintln!("{}", diagnostic_line(file, d));
                }
                eprintln!("{}: {} error(s)", file.display(), diagnostics.len());
            }
        }
    }

    if !diagnostics.is_empty() {
        process::exit(1);
    }
}
