use crate::error::Diagnostic;
use crate::units;
use serde::{Deserialize, Serialize};
use std::fmt;

// ──────────────────────────────────────────────
// Positions
// ──────────────────────────────────────────────

/// Source position of a token: byte offsets plus 1-based line/column
/// (column counted in characters).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// ──────────────────────────────────────────────
// Keywords
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Keyword {
    Procedure,
    Preconditions,
    Main,
    Confirmation,
    End,
    If,
    Then,
    Elsif,
    Else,
    While,
    For,
    In,
    Do,
    Wait,
    Until,
    Initiate,
    Confirm,
    And,
    Or,
    Not,
    Mod,
    Namespace,
    Type,
    Struct,
}

/// Keyword sub-kind, for highlighting and other tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordClass {
    /// Procedure and block framing: `procedure`, `main`, `end`, ...
    Structure,
    /// `if`, `while`, `for`, ...
    Control,
    /// `initiate`, `confirm`, `wait`, `until`
    Activity,
    /// `namespace`, `type`, `struct`
    Declaration,
    /// `and`, `or`, `not`, `mod`
    Operator,
}

impl Keyword {
    const TABLE: [(&'static str, Keyword); 24] = [
        ("procedure", Keyword::Procedure),
        ("preconditions", Keyword::Preconditions),
        ("main", Keyword::Main),
        ("confirmation", Keyword::Confirmation),
        ("end", Keyword::End),
        ("if", Keyword::If),
        ("then", Keyword::Then),
        ("elsif", Keyword::Elsif),
        ("else", Keyword::Else),
        ("while", Keyword::While),
        ("for", Keyword::For),
        ("in", Keyword::In),
        ("do", Keyword::Do),
        ("wait", Keyword::Wait),
        ("until", Keyword::Until),
        ("initiate", Keyword::Initiate),
        ("confirm", Keyword::Confirm),
        ("and", Keyword::And),
        ("or", Keyword::Or),
        ("not", Keyword::Not),
        ("mod", Keyword::Mod),
        ("namespace", Keyword::Namespace),
        ("type", Keyword::Type),
        ("struct", Keyword::Struct),
    ];

    pub fn from_word(word: &str) -> Option<Keyword> {
        Self::TABLE
            .iter()
            .find(|(s, _)| *s == word)
            .map(|(_, k)| *k)
    }

    pub fn as_str(self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(_, k)| *k == self)
            .map(|(s, _)| *s)
            .unwrap_or("?")
    }

    pub fn class(self) -> KeywordClass {
        use Keyword::*;
        match self {
            Procedure | Preconditions | Main | Confirmation | End => KeywordClass::Structure,
            If | Then | Elsif | Else | While | For | In | Do => KeywordClass::Control,
            Wait | Until | Initiate | Confirm => KeywordClass::Activity,
            Namespace | Type | Struct => KeywordClass::Declaration,
            And | Or | Not | Mod => KeywordClass::Operator,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────────────────────────────────
// Tokens
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    Ident(String),
    /// Numeric literal, lexeme kept verbatim (`1e3`, `0x1F`, `2.50`)
    Number(String),
    /// String literal (content without quotes, escapes resolved)
    Str(String),
    Bool(bool),
    /// Unit spelling from the unit table
    Unit(String),
    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Semicolon,
    Colon,
    // Operators
    Assign,
    EqEq,
    Neq,
    LtGt,
    Lt,
    Lte,
    Gt,
    Gte,
    Plus,
    Minus,
    Star,
    Slash,
    StarStar,
    Eof,
}

/// Coarse token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Keyword,
    Identifier,
    Number,
    String,
    Boolean,
    Unit,
    Operator,
    Punctuation,
    Eof,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Keyword(k) if k.class() == KeywordClass::Operator => TokenKind::Operator,
            Token::Keyword(_) => TokenKind::Keyword,
            Token::Ident(_) => TokenKind::Identifier,
            Token::Number(_) => TokenKind::Number,
            Token::Str(_) => TokenKind::String,
            Token::Bool(_) => TokenKind::Boolean,
            Token::Unit(_) => TokenKind::Unit,
            Token::LParen
            | Token::RParen
            | Token::LBrace
            | Token::RBrace
            | Token::LBracket
            | Token::RBracket
            | Token::Comma
            | Token::Dot
            | Token::Semicolon
            | Token::Colon => TokenKind::Punctuation,
            Token::Eof => TokenKind::Eof,
            _ => TokenKind::Operator,
        }
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        matches!(self, Token::Keyword(k) if *k == kw)
    }

    /// Source-like text of the token (strings re-quoted).
    pub fn lexeme(&self) -> String {
        match self {
            Token::Keyword(k) => k.as_str().to_owned(),
            Token::Ident(s) | Token::Number(s) | Token::Unit(s) => s.clone(),
            Token::Str(s) => format!("{:?}", s),
            Token::Bool(b) => b.to_string(),
            Token::Eof => String::new(),
            other => other.symbol().to_owned(),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Semicolon => ";",
            Token::Colon => ":",
            Token::Assign => "=",
            Token::EqEq => "==",
            Token::Neq => "!=",
            Token::LtGt => "<>",
            Token::Lt => "<",
            Token::Lte => "<=",
            Token::Gt => ">",
            Token::Gte => ">=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::StarStar => "**",
            _ => "",
        }
    }

    /// Human description used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Token::Keyword(k) => format!("keyword '{}'", k),
            Token::Ident(s) => format!("identifier '{}'", s),
            Token::Number(s) => format!("number '{}'", s),
            Token::Str(_) => "string literal".to_owned(),
            Token::Bool(b) => format!("'{}'", b),
            Token::Unit(s) => format!("unit '{}'", s),
            Token::Eof => "end of input".to_owned(),
            other => format!("'{}'", other.symbol()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
}

impl Spanned {
    pub fn line(&self) -> u32 {
        self.span.line
    }
}

// ──────────────────────────────────────────────
// Lexer
// ──────────────────────────────────────────────

struct Cursor<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Cursor {
            src,
            chars: src.char_indices().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).map(|(_, c)| *c)
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map_or(self.src.len(), |(offset, _)| *offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    /// Advance until the byte offset reaches `target`.
    fn bump_to(&mut self, target: usize) {
        while self.offset() < target && self.bump().is_some() {}
    }

    fn mark(&self) -> Span {
        let offset = self.offset();
        Span {
            start: offset,
            end: offset,
            line: self.line,
            column: self.column,
        }
    }

    fn close(&self, mut span: Span) -> Span {
        span.end = self.offset();
        span
    }

    fn rest(&self) -> &'a str {
        &self.src[self.offset()..]
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Tokenize `src`. Whitespace and comments are dropped; the returned vector
/// always ends with a single `Token::Eof`.
pub fn lex(src: &str) -> Result<Vec<Spanned>, Diagnostic> {
    let mut cur = Cursor::new(src);
    let mut tokens = Vec::new();

    while let Some(c) = cur.peek() {
        // Line comment
        if c == '#' {
            while cur.peek().is_some_and(|c| c != '\n') {
                cur.bump();
            }
            continue;
        }

        // Block comment
        if c == '/' && cur.peek_at(1) == Some('*') {
            let start = cur.mark();
            cur.bump_n(2);
            loop {
                match cur.peek() {
                    None => {
                        return Err(Diagnostic::lexical(
                            cur.close(start),
                            "unterminated block comment",
                        ))
                    }
                    Some('*') if cur.peek_at(1) == Some('/') => {
                        cur.bump_n(2);
                        break;
                    }
                    Some(_) => {
                        cur.bump();
                    }
                }
            }
            continue;
        }

        if c.is_whitespace() {
            cur.bump();
            continue;
        }

        let start = cur.mark();

        if c == '"' || c == '\'' {
            let s = lex_string(&mut cur, c)?;
            tokens.push(Spanned {
                token: Token::Str(s),
                span: cur.close(start),
            });
            continue;
        }

        if c.is_ascii_digit() {
            let lexeme = lex_number(&mut cur)?;
            tokens.push(Spanned {
                token: Token::Number(lexeme),
                span: cur.close(start),
            });
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let token = lex_word(&mut cur);
            tokens.push(Spanned {
                token,
                span: cur.close(start),
            });
            continue;
        }

        if c == '%' {
            cur.bump();
            tokens.push(Spanned {
                token: Token::Unit("%".to_owned()),
                span: cur.close(start),
            });
            continue;
        }

        let next = cur.peek_at(1);
        let (token, width) = match (c, next) {
            ('=', Some('=')) => (Token::EqEq, 2),
            ('!', Some('=')) => (Token::Neq, 2),
            ('<', Some('>')) => (Token::LtGt, 2),
            ('<', Some('=')) => (Token::Lte, 2),
            ('>', Some('=')) => (Token::Gte, 2),
            ('*', Some('*')) => (Token::StarStar, 2),
            ('=', _) => (Token::Assign, 1),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('{', _) => (Token::LBrace, 1),
            ('}', _) => (Token::RBrace, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            (',', _) => (Token::Comma, 1),
            ('.', _) => (Token::Dot, 1),
            (';', _) => (Token::Semicolon, 1),
            (':', _) => (Token::Colon, 1),
            _ => {
                cur.bump();
                return Err(Diagnostic::unexpected_char(cur.close(start), c));
            }
        };
        cur.bump_n(width);
        tokens.push(Spanned {
            token,
            span: cur.close(start),
        });
    }

    tokens.push(Spanned {
        token: Token::Eof,
        span: cur.mark(),
    });
    tracing::debug!(tokens = tokens.len(), bytes = src.len(), "lexed source");
    Ok(tokens)
}

fn lex_string(cur: &mut Cursor<'_>, quote: char) -> Result<String, Diagnostic> {
    let start = cur.mark();
    cur.bump();
    let mut s = String::new();
    loop {
        match cur.peek() {
            None | Some('\n') => {
                return Err(Diagnostic::lexical(
                    cur.close(start),
                    "unterminated string literal",
                ))
            }
            Some(c) if c == quote => {
                cur.bump();
                return Ok(s);
            }
            Some('\\') => {
                cur.bump();
                match cur.bump() {
                    None => {
                        return Err(Diagnostic::lexical(
                            cur.close(start),
                            "unterminated escape in string",
                        ))
                    }
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some('0') => s.push('\0'),
                    Some('\\') => s.push('\\'),
                    Some('"') => s.push('"'),
                    Some('\'') => s.push('\''),
                    Some(other) => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            Some(c) => {
                s.push(c);
                cur.bump();
            }
        }
    }
}

fn lex_number(cur: &mut Cursor<'_>) -> Result<String, Diagnostic> {
    let start = cur.mark();
    let begin = cur.offset();

    // Prefixed integers: 0x.., 0b.., 0o..
    if cur.peek() == Some('0') {
        let radix = match cur.peek_at(1) {
            Some('x') | Some('X') => Some(16),
            Some('b') | Some('B') => Some(2),
            Some('o') | Some('O') => Some(8),
            _ => None,
        };
        if let Some(radix) = radix {
            cur.bump_n(2);
            let digits_start = cur.offset();
            while cur.peek().is_some_and(|c| c.is_digit(radix)) {
                cur.bump();
            }
            if cur.offset() == digits_start {
                return Err(Diagnostic::lexical(
                    cur.close(start),
                    "malformed numeric literal: missing digits after radix prefix",
                ));
            }
            check_number_end(cur, start)?;
            return Ok(cur.src[begin..cur.offset()].to_owned());
        }
    }

    while cur.peek().is_some_and(|c| c.is_ascii_digit()) {
        cur.bump();
    }
    if cur.peek() == Some('.') && cur.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
        cur.bump();
        while cur.peek().is_some_and(|c| c.is_ascii_digit()) {
            cur.bump();
        }
    }
    // An `e` without exponent digits ends the number, so `5eV` is a
    // number glued to a unit and `1e` fails in `check_number_end`.
    if matches!(cur.peek(), Some('e') | Some('E')) {
        let signed = matches!(cur.peek_at(1), Some('+') | Some('-'));
        let first_digit = if signed { cur.peek_at(2) } else { cur.peek_at(1) };
        if first_digit.is_some_and(|c| c.is_ascii_digit()) {
            cur.bump_n(if signed { 2 } else { 1 });
            while cur.peek().is_some_and(|c| c.is_ascii_digit()) {
                cur.bump();
            }
        }
    }
    check_number_end(cur, start)?;
    Ok(cur.src[begin..cur.offset()].to_owned())
}

/// A number may be glued to a unit spelling (`60degC`) but not to any
/// other word.
fn check_number_end(cur: &Cursor<'_>, start: Span) -> Result<(), Diagnostic> {
    match cur.peek() {
        Some(c) if is_word_char(c) && units::longest_match(cur.rest()).is_none() => {
            Err(Diagnostic::lexical(
                cur.close(start),
                format!("malformed numeric literal: unexpected '{}' after digits", c),
            ))
        }
        _ => Ok(()),
    }
}

fn lex_word(cur: &mut Cursor<'_>) -> Token {
    let begin = cur.offset();
    let word_len = cur
        .rest()
        .find(|c: char| !is_word_char(c))
        .unwrap_or(cur.rest().len());
    let word = &cur.src[begin..begin + word_len];

    if let Some(kw) = Keyword::from_word(word) {
        cur.bump_to(begin + word_len);
        return Token::Keyword(kw);
    }
    match word {
        "true" | "false" => {
            cur.bump_to(begin + word_len);
            return Token::Bool(word == "true");
        }
        _ => {}
    }
    if let Some(len) = units::longest_match(cur.rest()) {
        // Compound spellings (`deg/s`) may extend past the plain word.
        if len >= word_len {
            let unit = cur.src[begin..begin + len].to_owned();
            cur.bump_to(begin + len);
            return Token::Unit(unit);
        }
    }
    cur.bump_to(begin + word_len);
    Token::Ident(word.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        lex(src)
            .expect("lex should succeed")
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn keywords_identifiers_and_booleans() {
        assert_eq!(
            tokens("procedure Deploy true endx"),
            vec![
                Token::Keyword(Keyword::Procedure),
                Token::Ident("Deploy".into()),
                Token::Bool(true),
                Token::Ident("endx".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let src = "x # trailing comment\n/* block\n comment */ y";
        assert_eq!(
            tokens(src),
            vec![Token::Ident("x".into()), Token::Ident("y".into()), Token::Eof]
        );
    }

    #[test]
    fn number_forms_keep_their_lexeme() {
        assert_eq!(
            tokens("42 3.25 1e3 2.5E-4 0x1F 0b101"),
            vec![
                Token::Number("42".into()),
                Token::Number("3.25".into()),
                Token::Number("1e3".into()),
                Token::Number("2.5E-4".into()),
                Token::Number("0x1F".into()),
                Token::Number("0b101".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn sign_is_not_part_of_a_number() {
        assert_eq!(
            tokens("-5"),
            vec![Token::Minus, Token::Number("5".into()), Token::Eof]
        );
    }

    #[test]
    fn units_split_from_adjacent_numbers() {
        assert_eq!(
            tokens("60degC 28 V 5 deg/s 1361 W/m2 50%"),
            vec![
                Token::Number("60".into()),
                Token::Unit("degC".into()),
                Token::Number("28".into()),
                Token::Unit("V".into()),
                Token::Number("5".into()),
                Token::Unit("deg/s".into()),
                Token::Number("1361".into()),
                Token::Unit("W/m2".into()),
                Token::Number("50".into()),
                Token::Unit("%".into()),
                Token::Eof,
            ]
        );
        assert_eq!(
            tokens("5eV 2.5e3eV"),
            vec![
                Token::Number("5".into()),
                Token::Unit("eV".into()),
                Token::Number("2.5e3".into()),
                Token::Unit("eV".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn division_by_identifier_is_not_a_unit() {
        assert_eq!(
            tokens("distance/time"),
            vec![
                Token::Ident("distance".into()),
                Token::Slash,
                Token::Ident("time".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn compound_units_need_no_spaces() {
        assert_eq!(
            tokens("L/min L / min mol/L"),
            vec![
                Token::Unit("L/min".into()),
                Token::Ident("L".into()),
                Token::Slash,
                Token::Ident("min".into()),
                Token::Unit("mol/L".into()),
                Token::Eof,
            ]
        );
        assert_eq!(tokens("s")[0], Token::Unit("s".into()));
    }

    #[test]
    fn operators_use_longest_match() {
        assert_eq!(
            tokens("== != <> <= >= ** = < > * /"),
            vec![
                Token::EqEq,
                Token::Neq,
                Token::LtGt,
                Token::Lte,
                Token::Gte,
                Token::StarStar,
                Token::Assign,
                Token::Lt,
                Token::Gt,
                Token::Star,
                Token::Slash,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn strings_with_both_quotes_and_escapes() {
        assert_eq!(
            tokens(r#""a\"b\n" 'it\'s'"#),
            vec![
                Token::Str("a\"b\n".into()),
                Token::Str("it's".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn spans_track_lines_columns_and_offsets() {
        let toks = lex("main\n  x = 1").unwrap();
        assert_eq!(
            toks[1].span,
            Span {
                start: 7,
                end: 8,
                line: 2,
                column: 3
            }
        );
        assert_eq!(toks[3].span.line, 2);
        assert_eq!(toks[3].span.column, 7);
    }

    #[test]
    fn unexpected_character_is_a_lex_error() {
        let err = lex("x = 1 ! 2").unwrap_err();
        assert_eq!(err.kind, crate::error::DiagnosticKind::Lexical);
        assert_eq!(err.found.as_deref(), Some("!"));
        assert_eq!(err.span.column, 7);
    }

    #[test]
    fn malformed_literals_are_lex_errors() {
        assert!(lex("1e").is_err());
        assert!(lex("0x").is_err());
        assert!(lex("12abc").is_err());
        assert!(lex("\"open").is_err());
        assert!(lex("/* open").is_err());
    }

    #[test]
    fn keyword_classes() {
        assert_eq!(Keyword::Main.class(), KeywordClass::Structure);
        assert_eq!(Keyword::Elsif.class(), KeywordClass::Control);
        assert_eq!(Keyword::Initiate.class(), KeywordClass::Activity);
        assert_eq!(Keyword::Struct.class(), KeywordClass::Declaration);
        assert_eq!(Keyword::Mod.class(), KeywordClass::Operator);
        assert_eq!(Token::Keyword(Keyword::Or).kind(), TokenKind::Operator);
    }
}
