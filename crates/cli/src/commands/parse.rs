use std::path::Path;

use super::{fail_with, read_or_exit};
use crate::OutputFormat;

/// The AST is always JSON; `--output` only changes how errors look.
pub(crate) fn cmd_parse(file: &Path, output: OutputFormat, quiet: bool) {
    let text = read_or_exit(file, output, quiet);
    match pluto_core::parse_source(&text) {
        Ok(ast) => {
            let pretty = serde_json::to_string_pretty(&ast)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        Err(d) => fail_with(file, &d, output, quiet),
    }
}
