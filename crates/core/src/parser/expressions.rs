use super::Parser;
use crate::ast::{Argument, BinaryOp, Expression, NumberLiteral, Path, UnaryOp, UnitTag};
use crate::error::Diagnostic;
use crate::lexer::{Keyword, Token};
use crate::units;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

/// Binding power table, lowest to highest. Unary prefix operators bind
/// tighter than every binary level, including `**`.
fn binary_op_info(token: &Token) -> Option<(u8, Assoc, BinaryOp)> {
    match token {
        Token::Keyword(Keyword::Or) => Some((1, Assoc::Left, BinaryOp::Or)),
        Token::Keyword(Keyword::And) => Some((2, Assoc::Left, BinaryOp::And)),
        Token::EqEq => Some((3, Assoc::Left, BinaryOp::Eq)),
        Token::Neq => Some((3, Assoc::Left, BinaryOp::Ne)),
        Token::LtGt => Some((3, Assoc::Left, BinaryOp::LtGt)),
        Token::Lt => Some((4, Assoc::Left, BinaryOp::Lt)),
        Token::Lte => Some((4, Assoc::Left, BinaryOp::Le)),
        Token::Gt => Some((4, Assoc::Left, BinaryOp::Gt)),
        Token::Gte => Some((4, Assoc::Left, BinaryOp::Ge)),
        Token::Plus => Some((5, Assoc::Left, BinaryOp::Add)),
        Token::Minus => Some((5, Assoc::Left, BinaryOp::Sub)),
        Token::Star => Some((6, Assoc::Left, BinaryOp::Mul)),
        Token::Slash => Some((6, Assoc::Left, BinaryOp::Div)),
        Token::Keyword(Keyword::Mod) => Some((6, Assoc::Left, BinaryOp::Mod)),
        Token::StarStar => Some((7, Assoc::Right, BinaryOp::Pow)),
        _ => None,
    }
}

/// Precedence of a binary operator in the table above.
pub fn precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => 1,
        BinaryOp::And => 2,
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::LtGt => 3,
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 4,
        BinaryOp::Add | BinaryOp::Sub => 5,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 6,
        BinaryOp::Pow => 7,
    }
}

/// Only `**` groups to the right.
pub fn is_right_assoc(op: BinaryOp) -> bool {
    op == BinaryOp::Pow
}

impl<'a> Parser<'a> {
    pub(super) fn parse_expr(&mut self) -> Result<Expression, Diagnostic> {
        self.nested(|p| p.parse_binary(1))
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expression, Diagnostic> {
        let mut left = self.parse_unary()?;
        while let Some((prec, assoc, op)) = binary_op_info(self.peek()) {
            if prec < min_prec {
                break;
            }
            self.advance();
            let next_prec = if assoc == Assoc::Left { prec + 1 } else { prec };
            let right = self.nested(|p| p.parse_binary(next_prec))?;
            left = Expression::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, Diagnostic> {
        let op = match self.peek() {
            Token::Keyword(Keyword::Not) => UnaryOp::Not,
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Plus,
            _ => return self.parse_primary(),
        };
        self.advance();
        let operand = self.nested(|p| p.parse_unary())?;
        Ok(Expression::unary(op, operand))
    }

    fn parse_primary(&mut self) -> Result<Expression, Diagnostic> {
        match self.peek() {
            Token::Number(lexeme) => {
                let line = self.cur_line();
                self.advance();
                let number = NumberLiteral::new(lexeme.as_str());
                // Fuse with a unit spelling that follows on the same line.
                if let Token::Unit(spelling) = self.peek() {
                    if self.cur_line() == line {
                        if let Some(kind) = units::lookup(spelling) {
                            self.advance();
                            return Ok(Expression::UnitValue {
                                number,
                                unit: UnitTag {
                                    spelling: spelling.clone(),
                                    kind,
                                },
                            });
                        }
                    }
                }
                Ok(Expression::Number { value: number })
            }
            Token::Str(s) => {
                self.advance();
                Ok(Expression::String { value: s.clone() })
            }
            Token::Bool(b) => {
                self.advance();
                Ok(Expression::Boolean { value: *b })
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(Expression::Parenthesized {
                    inner: Box::new(inner),
                })
            }
            Token::Ident(_) => {
                let path = self.parse_path()?;
                if self.peek() == &Token::LParen {
                    let arguments = self.parse_arguments()?;
                    return Ok(Expression::FunctionCall {
                        name: path,
                        arguments,
                    });
                }
                if path.is_bare() {
                    let Path(mut segments) = path;
                    Ok(Expression::Identifier {
                        name: segments.remove(0),
                    })
                } else {
                    Ok(Expression::PropertyAccess { path })
                }
            }
            Token::Unit(u) => Err(Diagnostic {
                found: Some(self.peek().describe()),
                expected: vec!["expression".to_owned()],
                ..Diagnostic::syntax(
                    self.cur_span(),
                    format!("unit '{}' must follow a numeric literal", u),
                )
            }),
            _ => Err(self.err_expected(&["expression"])),
        }
    }

    /// `ident ('.' member)*`
    pub(super) fn parse_path(&mut self) -> Result<Path, Diagnostic> {
        let mut segments = vec![self.take_ident("identifier")?];
        while self.peek() == &Token::Dot {
            self.advance();
            segments.push(self.take_member_name("identifier after '.'")?);
        }
        Ok(Path(segments))
    }

    /// `'(' [argument (',' argument)* [',']] ')'` where an argument is
    /// `name = expr` or `expr`.
    pub(super) fn parse_arguments(&mut self) -> Result<Vec<Argument>, Diagnostic> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        while self.peek() != &Token::RParen {
            let arg = match (self.peek(), self.peek_at(1)) {
                (Token::Ident(name), Token::Assign) => {
                    self.advance();
                    self.advance();
                    Argument::Named {
                        name: name.clone(),
                        value: self.parse_expr()?,
                    }
                }
                _ => Argument::Positional {
                    value: self.parse_expr()?,
                },
            };
            args.push(arg);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RParen)?;
        Ok(args)
    }

    /// True if the next token would extend an expression (a binary operator),
    /// which rules out the activity-reference reading after `confirm`.
    pub(super) fn continues_expression(&self) -> bool {
        binary_op_info(self.peek()).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse_expression;
    use crate::ast::{Argument, BinaryOp, Expression, Path, UnaryOp};
    use crate::error::{Diagnostic, DiagnosticKind};
    use crate::lexer;
    use crate::units::QuantityKind;

    fn expr(src: &str) -> Expression {
        let tokens = lexer::lex(src).expect("lex");
        parse_expression(&tokens).expect("parse")
    }

    fn expr_err(src: &str) -> Diagnostic {
        let tokens = lexer::lex(src).expect("lex");
        parse_expression(&tokens).expect_err("should fail")
    }

    fn id(name: &str) -> Expression {
        Expression::ident(name)
    }

    #[test]
    fn or_binds_looser_than_and() {
        assert_eq!(
            expr("a or b and c"),
            Expression::binary(
                BinaryOp::Or,
                id("a"),
                Expression::binary(BinaryOp::And, id("b"), id("c"))
            )
        );
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(
            expr("2 ** 3 ** 2"),
            Expression::binary(
                BinaryOp::Pow,
                Expression::number("2"),
                Expression::binary(BinaryOp::Pow, Expression::number("3"), Expression::number("2"))
            )
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(
            expr("a - b - c"),
            Expression::binary(
                BinaryOp::Sub,
                Expression::binary(BinaryOp::Sub, id("a"), id("b")),
                id("c")
            )
        );
    }

    #[test]
    fn unary_binds_tighter_than_power() {
        assert_eq!(
            expr("-x ** 2"),
            Expression::binary(
                BinaryOp::Pow,
                Expression::unary(UnaryOp::Neg, id("x")),
                Expression::number("2")
            )
        );
    }

    #[test]
    fn mod_is_multiplicative() {
        assert_eq!(
            expr("a + b mod c"),
            Expression::binary(
                BinaryOp::Add,
                id("a"),
                Expression::binary(BinaryOp::Mod, id("b"), id("c"))
            )
        );
    }

    #[test]
    fn unit_value_fuses_with_space_or_without() {
        for src in ["60 degC", "60degC"] {
            match expr(src) {
                Expression::UnitValue { number, unit } => {
                    assert_eq!(number.lexeme, "60");
                    assert_eq!(unit.spelling, "degC");
                    assert_eq!(unit.kind, QuantityKind::Temperature);
                }
                other => panic!("expected UnitValue, got {:?}", other),
            }
        }
    }

    #[test]
    fn unit_starting_with_e_fuses_without_space() {
        for src in ["5eV", "5 eV"] {
            match expr(src) {
                Expression::UnitValue { number, unit } => {
                    assert_eq!(number.lexeme, "5");
                    assert_eq!(unit.spelling, "eV");
                    assert_eq!(unit.kind, QuantityKind::Energy);
                }
                other => panic!("expected UnitValue, got {:?}", other),
            }
        }
    }

    #[test]
    fn bare_unit_is_a_syntax_error() {
        let err = expr_err("60 + degC");
        assert_eq!(err.kind, DiagnosticKind::Syntax);
        assert!(err.message.contains("degC"), "{}", err.message);
    }

    #[test]
    fn unit_on_next_line_does_not_fuse() {
        let err = expr_err("60\nV");
        assert_eq!(err.kind, DiagnosticKind::Syntax);
    }

    #[test]
    fn property_access_and_calls() {
        assert_eq!(
            expr("Bus1.Voltage"),
            Expression::PropertyAccess {
                path: Path::from("Bus1.Voltage")
            }
        );
        assert_eq!(
            expr("Bus1.V"),
            Expression::PropertyAccess {
                path: Path::from("Bus1.V")
            }
        );
        assert_eq!(
            expr("max(a, limit = 3)"),
            Expression::FunctionCall {
                name: Path::single("max"),
                arguments: vec![
                    Argument::Positional { value: id("a") },
                    Argument::Named {
                        name: "limit".into(),
                        value: Expression::number("3")
                    },
                ],
            }
        );
    }

    #[test]
    fn parentheses_are_kept() {
        assert_eq!(
            expr("(a or b) and c"),
            Expression::binary(
                BinaryOp::And,
                Expression::Parenthesized {
                    inner: Box::new(Expression::binary(BinaryOp::Or, id("a"), id("b")))
                },
                id("c")
            )
        );
    }

    #[test]
    fn keyword_cannot_be_an_identifier() {
        let err = expr_err("a + main");
        assert_eq!(err.expected, vec!["expression"]);
        assert_eq!(err.found.as_deref(), Some("keyword 'main'"));
    }

    #[test]
    fn missing_close_paren_reports_position() {
        let err = expr_err("(a + b");
        assert_eq!(err.found.as_deref(), Some("end of input"));
        assert_eq!(err.expected, vec!["')'"]);
    }
}
