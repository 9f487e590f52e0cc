//! AST produced by the parser.
//!
//! Nodes are plain owned values: the parser builds them bottom-up and hands
//! the whole tree to the caller. Statements and top-level items carry the
//! line of their first token; expressions carry no positions so that two
//! parses of equivalent text compare equal.

use crate::units::QuantityKind;
use serde::Serialize;
use std::fmt;

// ──────────────────────────────────────────────
// Source file
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct SourceFile {
    pub items: Vec<Item>,
}

impl SourceFile {
    pub fn procedures(&self) -> impl Iterator<Item = &Procedure> {
        self.items.iter().filter_map(|item| match item {
            Item::Procedure(p) => Some(p),
            _ => None,
        })
    }

    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.items.iter().filter_map(|item| match item {
            Item::Declaration(d) => Some(d),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum Item {
    Procedure(Procedure),
    Declaration(Declaration),
}

// ──────────────────────────────────────────────
// Procedures and statements
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Procedure {
    pub name: String,
    pub preconditions: Option<Block>,
    pub main: Block,
    pub confirmation: Option<Block>,
    pub line: u32,
}

/// Statements in execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Which `end <kind>` closes a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Procedure,
    Preconditions,
    Main,
    Confirmation,
    If,
    While,
    For,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Procedure => "procedure",
            BlockKind::Preconditions => "preconditions",
            BlockKind::Main => "main",
            BlockKind::Confirmation => "confirmation",
            BlockKind::If => "if",
            BlockKind::While => "while",
            BlockKind::For => "for",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityMode {
    /// `initiate X`: dispatch without waiting.
    Initiate,
    /// `confirm X`: block until an initiated activity confirms.
    Confirm,
    /// `initiate and confirm X`
    InitiateAndConfirm,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Statement {
    ActivityCall {
        mode: ActivityMode,
        reference: Path,
        arguments: Vec<Argument>,
        line: u32,
    },
    /// `confirm <boolean expression>` where the operand is not an activity reference.
    ConfirmCheck {
        condition: Expression,
        line: u32,
    },
    WaitUntil {
        condition: Expression,
        line: u32,
    },
    Assignment {
        target: String,
        value: Expression,
        line: u32,
    },
    Conditional {
        branches: Vec<ConditionalBranch>,
        else_body: Option<Block>,
        line: u32,
    },
    While {
        condition: Expression,
        body: Block,
        line: u32,
    },
    For {
        variable: String,
        iterable: Expression,
        body: Block,
        line: u32,
    },
    Expression {
        value: Expression,
        line: u32,
    },
}

impl Statement {
    pub fn line(&self) -> u32 {
        match self {
            Statement::ActivityCall { line, .. }
            | Statement::ConfirmCheck { line, .. }
            | Statement::WaitUntil { line, .. }
            | Statement::Assignment { line, .. }
            | Statement::Conditional { line, .. }
            | Statement::While { line, .. }
            | Statement::For { line, .. }
            | Statement::Expression { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalBranch {
    pub condition: Expression,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "arg", rename_all = "snake_case")]
pub enum Argument {
    Positional { value: Expression },
    Named { name: String, value: Expression },
}

impl Argument {
    pub fn value(&self) -> &Expression {
        match self {
            Argument::Positional { value } | Argument::Named { value, .. } => value,
        }
    }
}

// ──────────────────────────────────────────────
// Expressions
// ──────────────────────────────────────────────

/// Dotted name: `PowerOn`, `Bus1.Voltage`, `eps.pcdu.SwitchOn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Path(pub Vec<String>);

impl Path {
    pub fn single(name: impl Into<String>) -> Self {
        Path(vec![name.into()])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_bare(&self) -> bool {
        self.0.len() == 1
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Path(s.split('.').map(str::to_owned).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberKind {
    Integer,
    Decimal,
}

/// Numeric literal with its source spelling preserved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberLiteral {
    pub lexeme: String,
    pub kind: NumberKind,
}

impl NumberLiteral {
    pub fn new(lexeme: impl Into<String>) -> Self {
        let lexeme = lexeme.into();
        let lower = lexeme.to_ascii_lowercase();
        let prefixed = lower.starts_with("0x") || lower.starts_with("0b") || lower.starts_with("0o");
        let kind = if !prefixed && (lower.contains('.') || lower.contains('e')) {
            NumberKind::Decimal
        } else {
            NumberKind::Integer
        };
        NumberLiteral { lexeme, kind }
    }

    /// Integer value, honouring `0x`/`0b`/`0o` prefixes. `None` for decimals
    /// and values that overflow.
    pub fn as_u64(&self) -> Option<u64> {
        if self.kind != NumberKind::Integer {
            return None;
        }
        let lower = self.lexeme.to_ascii_lowercase();
        let (digits, radix) = match lower.get(..2) {
            Some("0x") => (&lower[2..], 16),
            Some("0b") => (&lower[2..], 2),
            Some("0o") => (&lower[2..], 8),
            _ => (lower.as_str(), 10),
        };
        u64::from_str_radix(digits, radix).ok()
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.as_u64() {
            Some(n) => Some(n as f64),
            None => self.lexeme.parse().ok(),
        }
    }
}

/// Unit spelling together with its quantity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitTag {
    pub spelling: String,
    pub kind: QuantityKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    /// `<>`, kept apart from `!=` so the spelling survives printing
    LtGt,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::LtGt => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "mod",
            BinaryOp::Pow => "**",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expression {
    Identifier {
        name: String,
    },
    Number {
        value: NumberLiteral,
    },
    UnitValue {
        number: NumberLiteral,
        unit: UnitTag,
    },
    String {
        value: String,
    },
    Boolean {
        value: bool,
    },
    /// `a.b.c`, always at least two segments
    PropertyAccess {
        path: Path,
    },
    FunctionCall {
        name: Path,
        arguments: Vec<Argument>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Parenthesized {
        inner: Box<Expression>,
    },
}

impl Expression {
    pub fn ident(name: impl Into<String>) -> Self {
        Expression::Identifier { name: name.into() }
    }

    pub fn number(lexeme: impl Into<String>) -> Self {
        Expression::Number {
            value: NumberLiteral::new(lexeme),
        }
    }

    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }
}

// ──────────────────────────────────────────────
// Declarations
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decl", rename_all = "snake_case")]
pub enum Declaration {
    Namespace(NamespaceDecl),
    Type(TypeDecl),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespaceDecl {
    pub path: Path,
    pub children: Vec<Declaration>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDecl {
    pub name: String,
    pub definition: TypeDefinition,
    pub line: u32,
}

/// Right-hand side of `type <name> ...`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "def", rename_all = "snake_case")]
pub enum TypeDefinition {
    Struct { fields: Vec<StructField> },
    Primitive { primitive: PrimitiveType },
    Array { element: Box<TypeAnnotation>, size: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructField {
    pub name: String,
    pub ty: TypeAnnotation,
}

/// Type in field or array-element position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "ty", rename_all = "snake_case")]
pub enum TypeAnnotation {
    Primitive { primitive: PrimitiveType },
    Array { element: Box<TypeAnnotation>, size: u64 },
    Struct { fields: Vec<StructField> },
    Named { path: Path },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
    String,
}

impl PrimitiveType {
    const NAMES: [(&'static str, PrimitiveType); 12] = [
        ("u8", PrimitiveType::U8),
        ("u16", PrimitiveType::U16),
        ("u32", PrimitiveType::U32),
        ("u64", PrimitiveType::U64),
        ("i8", PrimitiveType::I8),
        ("i16", PrimitiveType::I16),
        ("i32", PrimitiveType::I32),
        ("i64", PrimitiveType::I64),
        ("f32", PrimitiveType::F32),
        ("f64", PrimitiveType::F64),
        ("bool", PrimitiveType::Bool),
        ("string", PrimitiveType::String),
    ];

    pub fn from_name(name: &str) -> Option<PrimitiveType> {
        Self::NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, p)| *p)
    }

    pub fn name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(_, p)| *p == self)
            .map(|(n, _)| *n)
            .unwrap_or("?")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_literal_kinds() {
        assert_eq!(NumberLiteral::new("42").kind, NumberKind::Integer);
        assert_eq!(NumberLiteral::new("0xE1").kind, NumberKind::Integer);
        assert_eq!(NumberLiteral::new("4.5").kind, NumberKind::Decimal);
        assert_eq!(NumberLiteral::new("1e3").kind, NumberKind::Decimal);
    }

    #[test]
    fn number_literal_values() {
        assert_eq!(NumberLiteral::new("0x1F").as_u64(), Some(31));
        assert_eq!(NumberLiteral::new("0b101").as_u64(), Some(5));
        assert_eq!(NumberLiteral::new("17").as_u64(), Some(17));
        assert_eq!(NumberLiteral::new("2.5").as_u64(), None);
        assert_eq!(NumberLiteral::new("2.5e1").as_f64(), Some(25.0));
    }

    #[test]
    fn path_display_and_parse() {
        let p = Path::from("eps.pcdu.SwitchOn");
        assert_eq!(p.segments().len(), 3);
        assert!(!p.is_bare());
        assert_eq!(p.to_string(), "eps.pcdu.SwitchOn");
        assert!(Path::single("PowerOn").is_bare());
    }

    #[test]
    fn primitive_names_round_trip() {
        for name in ["u8", "i64", "f32", "bool", "string"] {
            let p = PrimitiveType::from_name(name).unwrap();
            assert_eq!(p.name(), name);
        }
        assert_eq!(PrimitiveType::from_name("u128"), None);
    }

    #[test]
    fn expression_serializes_with_tag() {
        let e = Expression::binary(BinaryOp::Ge, Expression::ident("v"), Expression::number("28"));
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["expr"], "binary");
        assert_eq!(json["op"], "ge");
        assert_eq!(json["left"]["name"], "v");
        assert_eq!(json["right"]["value"]["lexeme"], "28");
    }
}
