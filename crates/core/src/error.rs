use crate::lexer::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which stage of parsing rejected the input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Unrecognised character or malformed literal. Aborts tokenization.
    Lexical,
    /// Unexpected token for the current grammar position.
    Syntax,
    /// End of input reached before a required `end <kind>`.
    UnterminatedBlock,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::Lexical => "lexical",
            DiagnosticKind::Syntax => "syntax",
            DiagnosticKind::UnterminatedBlock => "unterminated block",
        };
        f.write_str(s)
    }
}

/// A lexing or parsing error.
///
/// Strict parsing returns the first one as `Err`; recovering parsing
/// collects several of them alongside a partial AST.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, thiserror::Error)]
#[error("{kind} error at {span}: {message}")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
    /// Token descriptions that would have been accepted (syntax errors only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expected: Vec<String>,
    /// Description of the offending token or character.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found: Option<String>,
}

impl Diagnostic {
    pub fn lexical(span: Span, message: impl Into<String>) -> Self {
        Diagnostic {
            kind: DiagnosticKind::Lexical,
            message: message.into(),
            span,
            expected: Vec::new(),
            found: None,
        }
    }

    pub fn unexpected_char(span: Span, c: char) -> Self {
        Diagnostic {
            found: Some(c.to_string()),
            ..Diagnostic::lexical(span, format!("unexpected character '{}'", c))
        }
    }

    pub fn syntax(span: Span, message: impl Into<String>) -> Self {
        Diagnostic {
            kind: DiagnosticKind::Syntax,
            message: message.into(),
            span,
            expected: Vec::new(),
            found: None,
        }
    }

    /// "expected X, found Y" with the expected set recorded for tooling.
    pub fn expected(span: Span, expected: &[&str], found: impl Into<String>) -> Self {
        let found = found.into();
        let message = format!("expected {}, found {}", describe_expected(expected), found);
        Diagnostic {
            kind: DiagnosticKind::Syntax,
            message,
            span,
            expected: expected.iter().map(|s| (*s).to_owned()).collect(),
            found: Some(found),
        }
    }

    pub fn unterminated(span: Span, block: &str, opened_line: u32) -> Self {
        Diagnostic {
            kind: DiagnosticKind::UnterminatedBlock,
            message: format!(
                "'{}' block opened on line {} is missing 'end {}' before end of input",
                block, opened_line, block
            ),
            span,
            expected: vec![format!("'end {}'", block)],
            found: Some("end of input".to_owned()),
        }
    }

    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind, DiagnosticKind::Syntax)
    }

    /// Serialize to JSON. All fields are always present (null or empty for
    /// missing values) so consumers can rely on a fixed shape.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "kind":     self.kind,
            "message":  self.message,
            "line":     self.span.line,
            "column":   self.span.column,
            "offset":   self.span.start,
            "end":      self.span.end,
            "expected": self.expected,
            "found":    self.found,
        })
    }
}

fn describe_expected(expected: &[&str]) -> String {
    match expected {
        [] => "something else".to_owned(),
        [one] => (*one).to_owned(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    }
}
