//! Recursive-descent parser over the lexer's token stream.
//!
//! Expressions use precedence climbing (see `expressions`), statements and
//! blocks are dispatched on their leading keyword (`statements`), and
//! top-level items are procedures (`procedure`) or namespace/type
//! declarations (`declarations`).
//!
//! Two modes share the same grammar code:
//! - strict ([`parse`]): the first diagnostic aborts the parse;
//! - recovering ([`parse_recovering`]): syntax errors inside a block are
//!   recorded and the parser skips to the next statement boundary, so one
//!   pass can report several problems. Unterminated blocks stay fatal.

use crate::ast::{Block, BlockKind, Declaration, Expression, Item, Procedure, SourceFile};
use crate::error::Diagnostic;
use crate::lexer::{Keyword, Span, Spanned, Token};

mod declarations;
mod expressions;
mod procedure;
mod statements;

pub use expressions::{is_right_assoc, precedence};
pub use statements::closing_keyword;

/// Default maximum number of errors collected in recovering mode.
pub const DEFAULT_MAX_ERRORS: usize = 10;

/// Deepest allowed nesting of expressions, blocks, namespaces and type
/// annotations. Deeper input is a syntax error instead of a stack overflow.
pub const MAX_NESTING: usize = 128;

static EOF: Spanned = Spanned {
    token: Token::Eof,
    span: Span {
        start: 0,
        end: 0,
        line: 1,
        column: 1,
    },
};

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    recovering: bool,
    max_errors: usize,
    errors: Vec<Diagnostic>,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned]) -> Self {
        Parser {
            tokens,
            pos: 0,
            recovering: false,
            max_errors: DEFAULT_MAX_ERRORS,
            errors: Vec::new(),
            depth: 0,
        }
    }

    fn recovering(tokens: &'a [Spanned], max_errors: usize) -> Self {
        Parser {
            recovering: true,
            // A zero cap would stop the parse before it records anything.
            max_errors: max_errors.max(1),
            ..Parser::new(tokens)
        }
    }

    fn cur(&self) -> &'a Spanned {
        self.tokens
            .get(self.pos)
            .or(self.tokens.last())
            .unwrap_or(&EOF)
    }

    fn peek(&self) -> &'a Token {
        &self.cur().token
    }

    fn peek_at(&self, n: usize) -> &'a Token {
        self.tokens
            .get(self.pos + n)
            .map_or(&EOF.token, |s| &s.token)
    }

    fn cur_span(&self) -> Span {
        self.cur().span
    }

    fn cur_line(&self) -> u32 {
        self.cur().line()
    }

    fn advance(&mut self) -> &'a Spanned {
        let t = self.cur();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn at_eof(&self) -> bool {
        self.peek() == &Token::Eof
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        self.peek().is_keyword(kw)
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.at_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<Span, Diagnostic> {
        if self.at_keyword(kw) {
            Ok(self.advance().span)
        } else {
            let want = format!("'{}'", kw);
            Err(self.err_expected(&[want.as_str()]))
        }
    }

    fn expect(&mut self, token: Token) -> Result<Span, Diagnostic> {
        if self.peek() == &token {
            Ok(self.advance().span)
        } else {
            let want = token.describe();
            Err(self.err_expected(&[want.as_str()]))
        }
    }

    fn take_ident(&mut self, what: &str) -> Result<String, Diagnostic> {
        if let Token::Ident(name) = self.peek() {
            self.advance();
            Ok(name.clone())
        } else {
            Err(self.err_expected(&[what]))
        }
    }

    /// Name after a `.` or in a struct field: identifiers, plus unit
    /// spellings that are shaped like identifiers (`Bus1.V`).
    fn take_member_name(&mut self, what: &str) -> Result<String, Diagnostic> {
        match self.peek() {
            Token::Ident(name) => {
                self.advance();
                Ok(name.clone())
            }
            Token::Unit(u) if u.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
                self.advance();
                Ok(u.clone())
            }
            _ => Err(self.err_expected(&[what])),
        }
    }

    fn err_expected(&self, expected: &[&str]) -> Diagnostic {
        Diagnostic::expected(self.cur_span(), expected, self.peek().describe())
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, Diagnostic>,
    ) -> Result<T, Diagnostic> {
        if self.depth >= MAX_NESTING {
            return Err(Diagnostic {
                found: Some(self.peek().describe()),
                ..Diagnostic::syntax(
                    self.cur_span(),
                    format!("nesting is deeper than {} levels", MAX_NESTING),
                )
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn skip_semicolons(&mut self) {
        while self.eat(&Token::Semicolon) {}
    }

    /// Keep a diagnostic in recovering mode (up to `max_errors`).
    fn record(&mut self, d: Diagnostic) {
        if self.errors.len() < self.max_errors {
            self.errors.push(d);
        }
    }

    fn error_limit_reached(&self) -> bool {
        self.errors.len() >= self.max_errors
    }

    // -- Top-level items ----------------------------------------

    fn parse_file(&mut self) -> Result<SourceFile, Diagnostic> {
        let mut items = Vec::new();
        loop {
            self.skip_semicolons();
            if self.at_eof() {
                break;
            }
            items.push(self.parse_item()?);
        }
        Ok(SourceFile { items })
    }

    fn parse_item(&mut self) -> Result<Item, Diagnostic> {
        match self.peek() {
            Token::Keyword(Keyword::Procedure) => Ok(Item::Procedure(self.parse_procedure()?)),
            Token::Keyword(Keyword::Namespace) | Token::Keyword(Keyword::Type) => {
                Ok(Item::Declaration(self.parse_declaration()?))
            }
            _ => Err(self.err_expected(&["'procedure'", "'namespace'", "'type'"])),
        }
    }

    fn is_item_keyword(&self) -> bool {
        matches!(
            self.peek(),
            Token::Keyword(Keyword::Procedure | Keyword::Namespace | Keyword::Type)
        )
    }

    /// True when the previous token is `end` (so `procedure` here closes one).
    fn after_end(&self) -> bool {
        self.pos > 0
            && self
                .tokens
                .get(self.pos - 1)
                .is_some_and(|s| s.token.is_keyword(Keyword::End))
    }

    /// Skip to the next top-level item keyword outside any braces.
    fn recover_to_next_item(&mut self) {
        let start = self.pos;
        let mut depth: i32 = 0;
        loop {
            match self.peek() {
                Token::Eof => break,
                Token::LBrace => depth += 1,
                Token::RBrace => depth = (depth - 1).max(0),
                _ if depth == 0 && self.is_item_keyword() && self.pos > start && !self.after_end() => {
                    break
                }
                _ => {}
            }
            self.advance();
        }
        tracing::trace!(skipped = self.pos - start, "recovered to next item");
    }

    fn parse_file_recovering(&mut self) -> SourceFile {
        let mut items = Vec::new();
        loop {
            self.skip_semicolons();
            if self.at_eof() || self.error_limit_reached() {
                break;
            }
            match self.parse_item() {
                Ok(item) => items.push(item),
                Err(d) => {
                    let fatal = d.is_fatal();
                    self.record(d);
                    if fatal {
                        break;
                    }
                    self.recover_to_next_item();
                }
            }
        }
        SourceFile { items }
    }

    fn expect_eof(&self) -> Result<(), Diagnostic> {
        if self.at_eof() {
            Ok(())
        } else {
            Err(self.err_expected(&["end of input"]))
        }
    }
}

// ──────────────────────────────────────────────
// Entry points
// ──────────────────────────────────────────────

/// Parse a whole source file, stopping at the first error.
pub fn parse(tokens: &[Spanned]) -> Result<SourceFile, Diagnostic> {
    let mut p = Parser::new(tokens);
    let file = p.parse_file()?;
    tracing::debug!(items = file.items.len(), "parsed source file");
    Ok(file)
}

/// Parse in panic-mode recovery.
///
/// Returns the items that could be built plus every diagnostic collected
/// (at most `max_errors`). Statements that fail to parse are dropped from
/// their block; items whose header or block framing is broken are dropped
/// entirely. An unterminated block ends the parse and is reported last.
pub fn parse_recovering(tokens: &[Spanned], max_errors: usize) -> (SourceFile, Vec<Diagnostic>) {
    let mut p = Parser::recovering(tokens, max_errors);
    let file = p.parse_file_recovering();
    tracing::debug!(
        items = file.items.len(),
        diagnostics = p.errors.len(),
        "parsed source file in recovering mode"
    );
    (file, p.errors)
}

/// Parse a single expression that must span the whole token stream.
pub fn parse_expression(tokens: &[Spanned]) -> Result<Expression, Diagnostic> {
    let mut p = Parser::new(tokens);
    let e = p.parse_expr()?;
    p.expect_eof()?;
    Ok(e)
}

/// Parse a single `namespace` or `type` declaration.
pub fn parse_declaration(tokens: &[Spanned]) -> Result<Declaration, Diagnostic> {
    let mut p = Parser::new(tokens);
    let d = p.parse_declaration()?;
    p.skip_semicolons();
    p.expect_eof()?;
    Ok(d)
}

/// Parse a single `procedure ... end procedure`.
pub fn parse_procedure(tokens: &[Spanned]) -> Result<Procedure, Diagnostic> {
    let mut p = Parser::new(tokens);
    let proc_ = p.parse_procedure()?;
    p.skip_semicolons();
    p.expect_eof()?;
    Ok(proc_)
}

/// Parse statements up to and including `end <kind>`. The opening keyword
/// is assumed to have been consumed by the caller.
pub fn parse_block(tokens: &[Spanned], kind: BlockKind) -> Result<Block, Diagnostic> {
    let mut p = Parser::new(tokens);
    let opened_line = p.cur_line();
    let block = p.parse_statements(kind, opened_line, false)?;
    p.expect_end(kind, opened_line)?;
    p.skip_semicolons();
    p.expect_eof()?;
    Ok(block)
}
