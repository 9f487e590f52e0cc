use super::Parser;
use crate::ast::{
    Declaration, NamespaceDecl, NumberKind, NumberLiteral, PrimitiveType, StructField, TypeAnnotation,
    TypeDecl, TypeDefinition,
};
use crate::error::Diagnostic;
use crate::lexer::{Keyword, Token};

const DECL_START: [&str; 2] = ["'namespace'", "'type'"];

impl<'a> Parser<'a> {
    pub(super) fn parse_declaration(&mut self) -> Result<Declaration, Diagnostic> {
        match self.peek() {
            Token::Keyword(Keyword::Namespace) => Ok(Declaration::Namespace(self.parse_namespace()?)),
            Token::Keyword(Keyword::Type) => Ok(Declaration::Type(self.parse_type_decl()?)),
            _ => Err(self.err_expected(&DECL_START)),
        }
    }

    /// `namespace a.b { <declarations> }`
    fn parse_namespace(&mut self) -> Result<NamespaceDecl, Diagnostic> {
        let line = self.cur_line();
        self.advance();
        let path = self.parse_path()?;
        self.expect(Token::LBrace)?;
        let mut children = Vec::new();
        loop {
            self.skip_semicolons();
            match self.peek() {
                Token::RBrace => {
                    self.advance();
                    break;
                }
                Token::Keyword(Keyword::Namespace | Keyword::Type) => {
                    children.push(self.nested(|p| p.parse_declaration())?);
                }
                _ => return Err(self.err_expected(&["'namespace'", "'type'", "'}'"])),
            }
        }
        Ok(NamespaceDecl {
            path,
            children,
            line,
        })
    }

    /// `type <Name> (struct {...} | <primitive> | [T; N])`
    fn parse_type_decl(&mut self) -> Result<TypeDecl, Diagnostic> {
        let line = self.cur_line();
        self.advance();
        let name = self.take_ident("type name")?;
        let definition = match self.parse_type_annotation()? {
            TypeAnnotation::Struct { fields } => TypeDefinition::Struct { fields },
            TypeAnnotation::Primitive { primitive } => TypeDefinition::Primitive { primitive },
            TypeAnnotation::Array { element, size } => TypeDefinition::Array { element, size },
            TypeAnnotation::Named { path } => {
                return Err(Diagnostic {
                    expected: vec!["'struct'".into(), "'['".into(), "primitive type".into()],
                    found: Some(format!("identifier '{}'", path)),
                    ..Diagnostic::syntax(
                        self.cur_span(),
                        format!(
                            "type '{}' must be defined as a struct, a primitive or an array, not as '{}'",
                            name, path
                        ),
                    )
                })
            }
        };
        Ok(TypeDecl {
            name,
            definition,
            line,
        })
    }

    /// Type in field or element position. A bare name that is not a
    /// primitive refers to another declared type.
    pub(super) fn parse_type_annotation(&mut self) -> Result<TypeAnnotation, Diagnostic> {
        match self.peek() {
            Token::Keyword(Keyword::Struct) => Ok(TypeAnnotation::Struct {
                fields: self.parse_struct_body()?,
            }),
            Token::LBracket => self.parse_array_type(),
            Token::Ident(_) => {
                let path = self.parse_path()?;
                if let [single] = path.segments() {
                    if let Some(primitive) = PrimitiveType::from_name(single) {
                        return Ok(TypeAnnotation::Primitive { primitive });
                    }
                }
                Ok(TypeAnnotation::Named { path })
            }
            _ => Err(self.err_expected(&["type"])),
        }
    }

    /// `struct { name: T, ... }`, trailing comma optional.
    fn parse_struct_body(&mut self) -> Result<Vec<StructField>, Diagnostic> {
        self.expect_keyword(Keyword::Struct)?;
        self.expect(Token::LBrace)?;
        let mut fields = Vec::new();
        while self.peek() != &Token::RBrace {
            let name = self.take_member_name("field name")?;
            self.expect(Token::Colon)?;
            let ty = self.nested(|p| p.parse_type_annotation())?;
            fields.push(StructField { name, ty });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RBrace)?;
        Ok(fields)
    }

    /// `[T; N]` with `N` an integer literal.
    fn parse_array_type(&mut self) -> Result<TypeAnnotation, Diagnostic> {
        self.expect(Token::LBracket)?;
        let element = self.nested(|p| p.parse_type_annotation())?;
        self.expect(Token::Semicolon)?;
        let size = match self.peek() {
            Token::Number(lexeme) => {
                let literal = NumberLiteral::new(lexeme.as_str());
                match literal.as_u64() {
                    Some(n) if literal.kind == NumberKind::Integer => {
                        self.advance();
                        n
                    }
                    _ => {
                        return Err(Diagnostic {
                            expected: vec!["integer literal".into()],
                            found: Some(self.peek().describe()),
                            ..Diagnostic::syntax(
                                self.cur_span(),
                                format!("array size must be an integer literal, found '{}'", lexeme),
                            )
                        })
                    }
                }
            }
            _ => return Err(self.err_expected(&["integer literal"])),
        };
        self.expect(Token::RBracket)?;
        Ok(TypeAnnotation::Array {
            element: Box::new(element),
            size,
        })
    }
}
