use std::path::Path;

use pluto_core::{highlight, lexer};

use super::{fail_with, read_or_exit};
use crate::OutputFormat;

pub(crate) fn cmd_tokens(file: &Path, output: OutputFormat, quiet: bool) {
    let text = read_or_exit(file, output, quiet);
    let tokens = match lexer::lex(&text) {
        Ok(t) => t,
        Err(d) => fail_with(file, &d, output, quiet),
    };
    let highlights = highlight::classify(&tokens);

    match output {
        OutputFormat::Json => {
            let rows: Vec<_> = tokens
                .iter()
                .zip(&highlights)
                .map(|(sp, h)| {
                    serde_json::json!({
                        "line": sp.span.line,
                        "column": sp.span.column,
                        "kind": sp.token.kind(),
                        "category": h.category.name(),
                        "lexeme": sp.token.lexeme(),
                    })
                })
                .collect();
            let json = serde_json::to_string_pretty(&rows)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", json);
        }
        OutputFormat::Text => {
            for (sp, h) in tokens.iter().zip(&highlights) {
                println!(
                    "{:>4}:{:<3} {:<20} {}",
                    sp.span.line,
                    sp.span.column,
                    h.category.name(),
                    sp.token.lexeme()
                );
            }
        }
    }
}
