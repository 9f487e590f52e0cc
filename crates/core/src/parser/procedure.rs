use super::Parser;
use crate::ast::{Block, BlockKind, Procedure};
use crate::error::Diagnostic;
use crate::lexer::Keyword;

impl<'a> Parser<'a> {
    /// `procedure <Name> [preconditions] main [confirmation] end procedure`
    pub(super) fn parse_procedure(&mut self) -> Result<Procedure, Diagnostic> {
        let line = self.cur_line();
        self.expect_keyword(Keyword::Procedure)?;
        let name = self.take_ident("procedure name")?;

        let preconditions = if self.at_keyword(Keyword::Preconditions) {
            Some(self.parse_section(BlockKind::Preconditions)?)
        } else {
            None
        };

        if !self.at_keyword(Keyword::Main) {
            if self.at_eof() {
                return Err(self.unterminated(BlockKind::Procedure, line));
            }
            let expected: &[&str] = if preconditions.is_some() {
                &["'main'"]
            } else {
                &["'preconditions'", "'main'"]
            };
            return Err(self.err_expected(expected));
        }
        let main = self.parse_section(BlockKind::Main)?;

        let confirmation = if self.at_keyword(Keyword::Confirmation) {
            Some(self.parse_section(BlockKind::Confirmation)?)
        } else {
            None
        };

        if !self.at_keyword(Keyword::End) && !self.at_eof() {
            let expected: &[&str] = if confirmation.is_some() {
                &["'end procedure'"]
            } else {
                &["'confirmation'", "'end procedure'"]
            };
            return Err(self.err_expected(expected));
        }
        self.expect_end(BlockKind::Procedure, line)?;

        tracing::trace!(procedure = %name, line, "parsed procedure");
        Ok(Procedure {
            name,
            preconditions,
            main,
            confirmation,
            line,
        })
    }

    /// One of the three procedure sections, from its keyword through its `end`.
    fn parse_section(&mut self, kind: BlockKind) -> Result<Block, Diagnostic> {
        let opened_line = self.cur_line();
        self.advance();
        let block = self.parse_statements(kind, opened_line, false)?;
        self.expect_end(kind, opened_line)?;
        Ok(block)
    }
}
