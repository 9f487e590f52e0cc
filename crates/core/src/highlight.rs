//! Token classification for editors and `pluto tokens`.
//!
//! Works on the token stream alone, using neighbouring tokens for context,
//! so it also gives sensible results for files that do not parse.

use serde::Serialize;

use crate::lexer::{Keyword, KeywordClass, Span, Spanned, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Keyword(KeywordClass),
    ProcedureName,
    Namespace,
    Type,
    Field,
    Property,
    /// Function call or activity reference.
    Function,
    Variable,
    Number,
    String,
    Boolean,
    Unit,
    Operator,
    Punctuation,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::Keyword(KeywordClass::Structure) => "keyword.structure",
            Category::Keyword(KeywordClass::Control) => "keyword.control",
            Category::Keyword(KeywordClass::Activity) => "keyword.activity",
            Category::Keyword(KeywordClass::Declaration) => "keyword.declaration",
            Category::Keyword(KeywordClass::Operator) => "keyword.operator",
            Category::ProcedureName => "procedure",
            Category::Namespace => "namespace",
            Category::Type => "type",
            Category::Field => "field",
            Category::Property => "property",
            Category::Function => "function",
            Category::Variable => "variable",
            Category::Number => "number",
            Category::String => "string",
            Category::Boolean => "boolean",
            Category::Unit => "unit",
            Category::Operator => "operator",
            Category::Punctuation => "punctuation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub span: Span,
    pub category: Category,
}

/// One highlight per token, in order. `Eof` is skipped.
pub fn classify(tokens: &[Spanned]) -> Vec<Highlight> {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, sp)| sp.token != Token::Eof)
        .map(|(i, sp)| Highlight {
            span: sp.span,
            category: classify_token(tokens, i),
        })
        .collect()
}

fn classify_token(tokens: &[Spanned], i: usize) -> Category {
    let token = &tokens[i].token;
    match token {
        Token::Keyword(Keyword::And)
            if prev(tokens, i).is_some_and(|t| t.is_keyword(Keyword::Initiate))
                && next(tokens, i).is_some_and(|t| t.is_keyword(Keyword::Confirm)) =>
        {
            Category::Keyword(KeywordClass::Activity)
        }
        Token::Keyword(k) => Category::Keyword(k.class()),
        Token::Ident(_) => classify_name(tokens, i),
        Token::Unit(_) => {
            let after_dot = prev(tokens, i) == Some(&Token::Dot);
            let before_colon = next(tokens, i) == Some(&Token::Colon);
            if after_dot || before_colon {
                classify_name(tokens, i)
            } else {
                Category::Unit
            }
        }
        Token::Number(_) => Category::Number,
        Token::Str(_) => Category::String,
        Token::Bool(_) => Category::Boolean,
        other => match other.kind() {
            TokenKind::Punctuation => Category::Punctuation,
            _ => Category::Operator,
        },
    }
}

fn prev(tokens: &[Spanned], i: usize) -> Option<&Token> {
    i.checked_sub(1).and_then(|j| tokens.get(j)).map(|sp| &sp.token)
}

fn next(tokens: &[Spanned], i: usize) -> Option<&Token> {
    tokens.get(i + 1).map(|sp| &sp.token)
}

fn is_name(token: &Token) -> bool {
    matches!(token, Token::Ident(_) | Token::Unit(_))
}

fn is_binary_operator(token: &Token) -> bool {
    matches!(
        token,
        Token::EqEq
            | Token::Neq
            | Token::LtGt
            | Token::Lt
            | Token::Lte
            | Token::Gt
            | Token::Gte
            | Token::Plus
            | Token::Minus
            | Token::Star
            | Token::Slash
            | Token::StarStar
            | Token::Keyword(Keyword::And | Keyword::Or | Keyword::Mod)
    )
}

/// First and last segment indices of the dotted path containing `i`.
fn path_bounds(tokens: &[Spanned], i: usize) -> (usize, usize) {
    let mut start = i;
    while start >= 2 && tokens[start - 1].token == Token::Dot && is_name(&tokens[start - 2].token) {
        start -= 2;
    }
    let mut last = i;
    while last + 2 < tokens.len() && tokens[last + 1].token == Token::Dot && is_name(&tokens[last + 2].token) {
        last += 2;
    }
    (start, last)
}

/// Index just past a parenthesised argument list starting at `i`, or `i`.
fn skip_arguments(tokens: &[Spanned], i: usize) -> usize {
    if tokens.get(i).map(|sp| &sp.token) != Some(&Token::LParen) {
        return i;
    }
    let mut depth = 0usize;
    for (j, sp) in tokens.iter().enumerate().skip(i) {
        match sp.token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth -= 1;
                if depth == 0 {
                    return j + 1;
                }
            }
            Token::Eof => return j,
            _ => {}
        }
    }
    tokens.len()
}

fn classify_name(tokens: &[Spanned], i: usize) -> Category {
    let (start, last) = path_bounds(tokens, i);
    let before = prev(tokens, start);

    match before {
        Some(Token::Keyword(Keyword::Namespace)) => return Category::Namespace,
        Some(Token::Keyword(Keyword::Type)) => return Category::Type,
        Some(Token::Keyword(Keyword::Procedure))
            if !prev(tokens, start - 1).is_some_and(|t| t.is_keyword(Keyword::End)) =>
        {
            return Category::ProcedureName
        }
        _ => {}
    }

    if next(tokens, i) == Some(&Token::Colon) {
        return Category::Field;
    }
    let type_position = matches!(before, Some(Token::Colon | Token::LBracket))
        || (start >= 2 && tokens[start - 2].token.is_keyword(Keyword::Type));
    if type_position {
        return Category::Type;
    }

    // Activity reference after `initiate` / `confirm`, using the same
    // ordered choice as the parser for `confirm`.
    let activity = match before {
        Some(Token::Keyword(Keyword::Initiate)) => true,
        Some(Token::Keyword(Keyword::Confirm)) => {
            let after = skip_arguments(tokens, last + 1);
            !tokens.get(after).is_some_and(|sp| is_binary_operator(&sp.token))
        }
        _ => false,
    };
    let called = next(tokens, last) == Some(&Token::LParen);

    if i == last && (activity || called) {
        Category::Function
    } else if activity {
        Category::Namespace
    } else if i == start {
        Category::Variable
    } else {
        Category::Property
    }
}
