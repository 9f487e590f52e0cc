use super::Parser;
use crate::ast::{ActivityMode, Argument, Block, BlockKind, ConditionalBranch, Path, Statement};
use crate::error::Diagnostic;
use crate::lexer::{Keyword, Token};

/// Keyword that follows `end` to close a block of this kind.
pub fn closing_keyword(kind: BlockKind) -> Keyword {
    match kind {
        BlockKind::Procedure => Keyword::Procedure,
        BlockKind::Preconditions => Keyword::Preconditions,
        BlockKind::Main => Keyword::Main,
        BlockKind::Confirmation => Keyword::Confirmation,
        BlockKind::If => Keyword::If,
        BlockKind::While => Keyword::While,
        BlockKind::For => Keyword::For,
    }
}

impl<'a> Parser<'a> {
    pub(super) fn unterminated(&self, kind: BlockKind, opened_line: u32) -> Diagnostic {
        Diagnostic::unterminated(self.cur_span(), kind.as_str(), opened_line)
    }

    /// Statements up to (not including) the closing `end`. With
    /// `stop_at_branch`, `elsif` and `else` also end the run.
    pub(super) fn parse_statements(
        &mut self,
        kind: BlockKind,
        opened_line: u32,
        stop_at_branch: bool,
    ) -> Result<Block, Diagnostic> {
        self.nested(|p| p.parse_statement_run(kind, opened_line, stop_at_branch))
    }

    fn parse_statement_run(
        &mut self,
        kind: BlockKind,
        opened_line: u32,
        stop_at_branch: bool,
    ) -> Result<Block, Diagnostic> {
        let mut statements = Vec::new();
        loop {
            self.skip_semicolons();
            match self.peek() {
                Token::Eof => return Err(self.unterminated(kind, opened_line)),
                Token::Keyword(Keyword::End) => break,
                Token::Keyword(Keyword::Elsif | Keyword::Else) if stop_at_branch => break,
                _ => {}
            }
            let start = self.pos;
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(d) if self.recovering && !d.is_fatal() => {
                    let error_line = d.span.line;
                    self.record(d);
                    self.synchronize(start, error_line, stop_at_branch);
                }
                Err(d) => return Err(d),
            }
        }
        Ok(Block { statements })
    }

    /// Consume `end <kind>`.
    pub(super) fn expect_end(&mut self, kind: BlockKind, opened_line: u32) -> Result<(), Diagnostic> {
        let closer = closing_keyword(kind);
        let want = format!("'end {}'", closer);
        match (self.peek(), self.peek_at(1)) {
            (Token::Keyword(Keyword::End), Token::Keyword(k)) if *k == closer => {
                self.advance();
                self.advance();
                Ok(())
            }
            (Token::Eof, _) => Err(self.unterminated(kind, opened_line)),
            (Token::Keyword(Keyword::End), Token::Eof) => {
                self.advance();
                Err(self.unterminated(kind, opened_line))
            }
            (Token::Keyword(Keyword::End), other) => {
                let found = format!("'end {}'", other.lexeme());
                let d = Diagnostic::expected(self.cur_span(), &[want.as_str()], found);
                // Step over the mismatched closer so recovery makes progress.
                self.advance();
                if matches!(other, Token::Keyword(_)) {
                    self.advance();
                }
                Err(d)
            }
            _ => Err(self.err_expected(&[want.as_str()])),
        }
    }

    /// Panic-mode skip after a failed statement. Stops after a `;`, before
    /// a block closer, or before the first token on a later line than the
    /// error once at least one token has been skipped.
    fn synchronize(&mut self, start: usize, error_line: u32, stop_at_branch: bool) {
        let from = self.pos;
        loop {
            match self.peek() {
                Token::Eof | Token::Keyword(Keyword::End) => break,
                Token::Keyword(Keyword::Elsif | Keyword::Else) if stop_at_branch => break,
                Token::Semicolon => {
                    self.advance();
                    break;
                }
                _ if self.pos > start && self.cur_line() > error_line => break,
                _ => {
                    self.advance();
                }
            }
        }
        tracing::trace!(skipped = self.pos - from, "recovered to next statement");
    }

    fn parse_statement(&mut self) -> Result<Statement, Diagnostic> {
        let line = self.cur_line();
        let stmt = match self.peek() {
            Token::Keyword(Keyword::Initiate) => self.parse_initiate(line)?,
            Token::Keyword(Keyword::Confirm) => self.parse_confirm(line)?,
            Token::Keyword(Keyword::Wait) => {
                self.advance();
                self.expect_keyword(Keyword::Until)?;
                Statement::WaitUntil {
                    condition: self.parse_expr()?,
                    line,
                }
            }
            Token::Keyword(Keyword::If) => self.parse_if(line)?,
            Token::Keyword(Keyword::While) => self.parse_while(line)?,
            Token::Keyword(Keyword::For) => self.parse_for(line)?,
            Token::Ident(name) if self.peek_at(1) == &Token::Assign => {
                self.advance();
                self.advance();
                Statement::Assignment {
                    target: name.clone(),
                    value: self.parse_expr()?,
                    line,
                }
            }
            Token::Keyword(k) if *k != Keyword::Not => {
                return Err(self.err_expected(&["statement"]));
            }
            _ => Statement::Expression {
                value: self.parse_expr()?,
                line,
            },
        };
        self.eat(&Token::Semicolon);
        Ok(stmt)
    }

    fn parse_activity_ref(&mut self) -> Result<(Path, Vec<Argument>), Diagnostic> {
        let reference = self.parse_path()?;
        let arguments = if self.peek() == &Token::LParen {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok((reference, arguments))
    }

    /// `initiate X` or `initiate and confirm X`.
    fn parse_initiate(&mut self, line: u32) -> Result<Statement, Diagnostic> {
        self.advance();
        let mode = if self.eat_keyword(Keyword::And) {
            self.expect_keyword(Keyword::Confirm)?;
            ActivityMode::InitiateAndConfirm
        } else {
            ActivityMode::Initiate
        };
        let (reference, arguments) = self.parse_activity_ref()?;
        Ok(Statement::ActivityCall {
            mode,
            reference,
            arguments,
            line,
        })
    }

    /// `confirm` is an ordered choice: an activity reference with optional
    /// arguments wins whenever it parses and is not the left operand of a
    /// binary operator; otherwise the operand is a boolean expression.
    fn parse_confirm(&mut self, line: u32) -> Result<Statement, Diagnostic> {
        self.advance();
        if let Token::Ident(_) = self.peek() {
            let save = self.pos;
            if let Ok((reference, arguments)) = self.parse_activity_ref() {
                if !self.continues_expression() {
                    return Ok(Statement::ActivityCall {
                        mode: ActivityMode::Confirm,
                        reference,
                        arguments,
                        line,
                    });
                }
            }
            self.pos = save;
        }
        Ok(Statement::ConfirmCheck {
            condition: self.parse_expr()?,
            line,
        })
    }

    fn parse_if(&mut self, line: u32) -> Result<Statement, Diagnostic> {
        self.advance();
        let mut branches = Vec::new();
        loop {
            let condition = self.parse_expr()?;
            self.expect_keyword(Keyword::Then)?;
            let body = self.parse_statements(BlockKind::If, line, true)?;
            branches.push(ConditionalBranch { condition, body });
            if !self.eat_keyword(Keyword::Elsif) {
                break;
            }
        }
        let else_body = if self.eat_keyword(Keyword::Else) {
            Some(self.parse_statements(BlockKind::If, line, false)?)
        } else {
            None
        };
        self.expect_end(BlockKind::If, line)?;
        Ok(Statement::Conditional {
            branches,
            else_body,
            line,
        })
    }

    fn parse_while(&mut self, line: u32) -> Result<Statement, Diagnostic> {
        self.advance();
        let condition = self.parse_expr()?;
        self.expect_keyword(Keyword::Do)?;
        let body = self.parse_statements(BlockKind::While, line, false)?;
        self.expect_end(BlockKind::While, line)?;
        Ok(Statement::While {
            condition,
            body,
            line,
        })
    }

    fn parse_for(&mut self, line: u32) -> Result<Statement, Diagnostic> {
        self.advance();
        let variable = self.take_ident("loop variable")?;
        self.expect_keyword(Keyword::In)?;
        let iterable = self.parse_expr()?;
        self.expect_keyword(Keyword::Do)?;
        let body = self.parse_statements(BlockKind::For, line, false)?;
        self.expect_end(BlockKind::For, line)?;
        Ok(Statement::For {
            variable,
            iterable,
            body,
            line,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::{parse_block, parse_recovering};
    use crate::ast::*;
    use crate::error::{Diagnostic, DiagnosticKind};
    use crate::lexer;

    fn block(src: &str, kind: BlockKind) -> Block {
        let tokens = lexer::lex(src).expect("lex");
        parse_block(&tokens, kind).expect("parse")
    }

    fn main_block(src: &str) -> Vec<Statement> {
        block(&format!("{}\nend main", src), BlockKind::Main).statements
    }

    fn block_err(src: &str, kind: BlockKind) -> Diagnostic {
        let tokens = lexer::lex(src).expect("lex");
        parse_block(&tokens, kind).expect_err("should fail")
    }

    fn assign(target: &str, value: &str, line: u32) -> Statement {
        Statement::Assignment {
            target: target.into(),
            value: Expression::number(value),
            line,
        }
    }

    #[test]
    fn confirm_prefers_activity_reference() {
        let stmts = main_block("confirm PowerOn");
        assert_eq!(
            stmts,
            vec![Statement::ActivityCall {
                mode: ActivityMode::Confirm,
                reference: Path::single("PowerOn"),
                arguments: vec![],
                line: 1,
            }]
        );
    }

    #[test]
    fn confirm_with_arguments_is_still_an_activity() {
        let stmts = main_block("confirm eps.SwitchOn(Line = 3)");
        match &stmts[0] {
            Statement::ActivityCall {
                mode,
                reference,
                arguments,
                ..
            } => {
                assert_eq!(*mode, ActivityMode::Confirm);
                assert_eq!(reference, &Path::from("eps.SwitchOn"));
                assert_eq!(arguments.len(), 1);
            }
            other => panic!("expected activity call, got {:?}", other),
        }
    }

    #[test]
    fn confirm_with_operator_is_a_check() {
        let stmts = main_block("confirm Bus1.Voltage >= 28 V");
        match &stmts[0] {
            Statement::ConfirmCheck { condition, .. } => {
                assert!(matches!(
                    condition,
                    Expression::Binary {
                        op: BinaryOp::Ge,
                        ..
                    }
                ));
            }
            other => panic!("expected confirm check, got {:?}", other),
        }
        assert!(matches!(
            main_block("confirm not Ready")[0],
            Statement::ConfirmCheck { .. }
        ));
    }

    #[test]
    fn initiate_modes() {
        let stmts = main_block("initiate Heater\ninitiate and confirm PowerOn(Bus=1)");
        assert!(matches!(
            &stmts[0],
            Statement::ActivityCall {
                mode: ActivityMode::Initiate,
                ..
            }
        ));
        assert_eq!(
            stmts[1],
            Statement::ActivityCall {
                mode: ActivityMode::InitiateAndConfirm,
                reference: Path::single("PowerOn"),
                arguments: vec![Argument::Named {
                    name: "Bus".into(),
                    value: Expression::number("1")
                }],
                line: 2,
            }
        );
    }

    #[test]
    fn initiate_and_requires_confirm() {
        let err = block_err("initiate and PowerOn end main", BlockKind::Main);
        assert_eq!(err.expected, vec!["'confirm'"]);
    }

    #[test]
    fn nested_conditional() {
        let stmts = main_block("if a then x=1 elsif b then x=2 else x=3 end if");
        assert_eq!(
            stmts,
            vec![Statement::Conditional {
                branches: vec![
                    ConditionalBranch {
                        condition: Expression::ident("a"),
                        body: Block {
                            statements: vec![assign("x", "1", 1)]
                        },
                    },
                    ConditionalBranch {
                        condition: Expression::ident("b"),
                        body: Block {
                            statements: vec![assign("x", "2", 1)]
                        },
                    },
                ],
                else_body: Some(Block {
                    statements: vec![assign("x", "3", 1)]
                }),
                line: 1,
            }]
        );
    }

    #[test]
    fn loops() {
        let stmts = main_block(
            "while Count < 3 do\n  Count = Count + 1\nend while\nfor i in Channels do\n  initiate Sample(i)\nend for",
        );
        assert!(matches!(&stmts[0], Statement::While { body, .. } if body.len() == 1));
        match &stmts[1] {
            Statement::For {
                variable,
                iterable,
                body,
                line,
            } => {
                assert_eq!(variable, "i");
                assert_eq!(iterable, &Expression::ident("Channels"));
                assert_eq!(body.len(), 1);
                assert_eq!(*line, 4);
            }
            other => panic!("expected for loop, got {:?}", other),
        }
    }

    #[test]
    fn wait_until_and_expression_statement() {
        let stmts = main_block("wait until Ready; Log(\"done\");");
        assert!(matches!(&stmts[0], Statement::WaitUntil { .. }));
        assert!(matches!(
            &stmts[1],
            Statement::Expression {
                value: Expression::FunctionCall { .. },
                ..
            }
        ));
    }

    #[test]
    fn semicolons_are_optional() {
        assert_eq!(main_block("x = 1; y = 2").len(), 2);
        assert_eq!(main_block("x = 1\ny = 2").len(), 2);
        assert_eq!(main_block(";;x = 1;;").len(), 1);
    }

    #[test]
    fn mismatched_end_names_both_blocks() {
        let err = block_err("while a do x = 1 end if end main", BlockKind::Main);
        assert_eq!(err.kind, DiagnosticKind::Syntax);
        assert_eq!(err.message, "expected 'end while', found 'end if'");
    }

    #[test]
    fn unterminated_if_reports_opening_line() {
        let err = block_err("x = 1\nif a then\n  y = 2\n", BlockKind::Main);
        assert_eq!(err.kind, DiagnosticKind::UnterminatedBlock);
        assert!(err.message.contains("'if' block opened on line 2"), "{}", err.message);
    }

    #[test]
    fn end_of_input_mid_statement_is_syntax() {
        let err = block_err("x = ", BlockKind::Main);
        assert_eq!(err.kind, DiagnosticKind::Syntax);
        assert_eq!(err.found.as_deref(), Some("end of input"));
    }

    #[test]
    fn unit_spellings_are_not_names() {
        for src in ["initiate A end main", "for s in Items do end for end main", "m = 1 end main"] {
            let err = block_err(src, BlockKind::Main);
            assert_eq!(err.kind, DiagnosticKind::Syntax, "{}", src);
        }
        let b = block("initiate Wheel.A end main", BlockKind::Main);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn keywords_are_not_statements() {
        let err = block_err("then x = 1 end main", BlockKind::Main);
        assert_eq!(err.expected, vec!["statement"]);
    }

    #[test]
    fn else_after_else_is_rejected() {
        let err = block_err("if a then x = 1 else x = 2 else x = 3 end if end main", BlockKind::Main);
        assert_eq!(err.expected, vec!["statement"]);
    }

    #[test]
    fn recovery_inside_nested_block_keeps_outer_statements() {
        let src = "procedure P\nmain\n  if a then\n    x = )\n    y = 1\n  end if\n  z = 2\nend main\nend procedure\n";
        let tokens = lexer::lex(src).unwrap();
        let (file, errors) = parse_recovering(&tokens, 10);
        assert_eq!(errors.len(), 1, "errors: {:?}", errors);
        let main = &file.procedures().next().unwrap().main;
        assert_eq!(main.len(), 2);
        match &main.statements[0] {
            Statement::Conditional { branches, .. } => assert_eq!(branches[0].body.len(), 1),
            other => panic!("expected conditional, got {:?}", other),
        }
    }

    #[test]
    fn recovery_stops_at_branch_keywords() {
        let src = "procedure P main if a then x = ) else y = 1 end if end main end procedure";
        let tokens = lexer::lex(src).unwrap();
        let (file, errors) = parse_recovering(&tokens, 10);
        assert_eq!(errors.len(), 1);
        match &file.procedures().next().unwrap().main.statements[0] {
            Statement::Conditional { else_body, .. } => {
                assert_eq!(else_body.as_ref().map(Block::len), Some(1));
            }
            other => panic!("expected conditional, got {:?}", other),
        };
    }
}
