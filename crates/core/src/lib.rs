#![allow(clippy::result_large_err)]
//! pluto-core: lexer, parser and AST for Pluto spacecraft procedures.
//!
//! A Pluto source file holds procedures (`preconditions` / `main` /
//! `confirmation` phases made of activity calls, wait-guards, assignments,
//! conditionals and loops) and the namespace/type declarations they refer
//! to. This crate turns that text into an owned AST; executing procedures
//! is left to the consumer.
//!
//! # Public API
//!
//! - [`parse_source()`] / [`parse_source_recovering()`] -- text to [`SourceFile`]
//! - [`parse_expression()`], [`parse_declaration()`], [`parse_procedure()`]
//!   -- parse a single construct
//! - [`lexer::lex()`] and the token-level [`parser`] entry points
//! - [`printer`] -- canonical source output
//! - [`highlight`] -- token categories for editors
//! - [`Diagnostic`] -- the single error record for every stage

pub mod ast;
pub mod error;
pub mod highlight;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod source;
pub mod units;

// ── Convenience re-exports ───────────────────────────────────────────

pub use ast::{Block, BlockKind, Declaration, Expression, Item, Procedure, SourceFile, Statement};
pub use error::{Diagnostic, DiagnosticKind};
pub use parser::DEFAULT_MAX_ERRORS;
pub use source::{FileSystemProvider, InMemoryProvider, SourceError, SourceProvider};
pub use units::QuantityKind;

/// Lex and parse a whole file, stopping at the first error.
pub fn parse_source(src: &str) -> Result<SourceFile, Diagnostic> {
    let tokens = lexer::lex(src)?;
    parser::parse(&tokens)
}

/// Lex and parse with panic-mode recovery. `Err` only when lexing fails;
/// syntax problems come back in the diagnostic list next to whatever
/// could be parsed.
pub fn parse_source_recovering(
    src: &str,
    max_errors: usize,
) -> Result<(SourceFile, Vec<Diagnostic>), Diagnostic> {
    let tokens = lexer::lex(src)?;
    Ok(parser::parse_recovering(&tokens, max_errors))
}

pub fn parse_expression(src: &str) -> Result<Expression, Diagnostic> {
    let tokens = lexer::lex(src)?;
    parser::parse_expression(&tokens)
}

pub fn parse_declaration(src: &str) -> Result<Declaration, Diagnostic> {
    let tokens = lexer::lex(src)?;
    parser::parse_declaration(&tokens)
}

pub fn parse_procedure(src: &str) -> Result<Procedure, Diagnostic> {
    let tokens = lexer::lex(src)?;
    parser::parse_procedure(&tokens)
}
