//! Canonical source printer.
//!
//! Output re-parses to a structurally identical AST: operators are spaced,
//! blocks are indented by two spaces, and parentheses appear where the tree
//! has `Parenthesized` or where the shape would otherwise not survive a
//! re-parse.

use crate::ast::{
    ActivityMode, Argument, Block, Declaration, Expression, Item, NamespaceDecl, Procedure,
    SourceFile, Statement, StructField, TypeAnnotation, TypeDecl, TypeDefinition,
};
use crate::parser::{is_right_assoc, precedence};

const INDENT: &str = "  ";

pub fn print_expression(expr: &Expression) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

/// One statement at indentation zero, without a trailing newline.
///
/// A `ConfirmCheck` whose condition is a bare name, property or call
/// (a shape the parser never builds) prints with parentheses, so it
/// reads back as a check on a `Parenthesized` condition rather than an
/// identical tree.
pub fn print_statement(stmt: &Statement) -> String {
    let mut p = Printer::default();
    p.statement(stmt);
    p.out.trim_end().to_owned()
}

pub fn print_source_file(file: &SourceFile) -> String {
    let mut p = Printer::default();
    for (i, item) in file.items.iter().enumerate() {
        if i > 0 {
            p.out.push('\n');
        }
        match item {
            Item::Procedure(proc_) => p.procedure(proc_),
            Item::Declaration(decl) => p.declaration(decl),
        }
    }
    p.out
}

// ──────────────────────────────────────────────
// Expressions
// ──────────────────────────────────────────────

fn write_expr(out: &mut String, expr: &Expression) {
    match expr {
        Expression::Identifier { name } => out.push_str(name),
        Expression::Number { value } => out.push_str(&value.lexeme),
        Expression::UnitValue { number, unit } => {
            out.push_str(&number.lexeme);
            out.push(' ');
            out.push_str(&unit.spelling);
        }
        Expression::String { value } => write_string(out, value),
        Expression::Boolean { value } => out.push_str(if *value { "true" } else { "false" }),
        Expression::PropertyAccess { path } => out.push_str(&path.to_string()),
        Expression::FunctionCall { name, arguments } => {
            out.push_str(&name.to_string());
            write_args(out, arguments);
        }
        Expression::Binary { op, left, right } => {
            let prec = precedence(*op);
            let right_assoc = is_right_assoc(*op);
            write_operand(out, left, |p| p < prec || (p == prec && right_assoc));
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            write_operand(out, right, |p| p < prec || (p == prec && !right_assoc));
        }
        Expression::Unary { op, operand } => {
            out.push_str(op.symbol());
            if op.symbol().ends_with(|c: char| c.is_ascii_alphabetic()) {
                out.push(' ');
            }
            // Prefix operators bind tighter than any binary operator.
            write_operand(out, operand, |_| true);
        }
        Expression::Parenthesized { inner } => {
            out.push('(');
            write_expr(out, inner);
            out.push(')');
        }
    }
}

/// Write a binary or unary operand, wrapping a binary child in parentheses
/// when `needs_parens(child_precedence)` says so.
fn write_operand(out: &mut String, expr: &Expression, needs_parens: impl Fn(u8) -> bool) {
    match expr {
        Expression::Binary { op, .. } if needs_parens(precedence(*op)) => {
            out.push('(');
            write_expr(out, expr);
            out.push(')');
        }
        _ => write_expr(out, expr),
    }
}

fn write_args(out: &mut String, args: &[Argument]) {
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        match arg {
            Argument::Positional { value } => write_expr(out, value),
            Argument::Named { name, value } => {
                out.push_str(name);
                out.push_str(" = ");
                write_expr(out, value);
            }
        }
    }
    out.push(')');
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out.push('"');
}

// ──────────────────────────────────────────────
// Statements and items
// ──────────────────────────────────────────────

#[derive(Default)]
struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn procedure(&mut self, proc_: &Procedure) {
        self.line(&format!("procedure {}", proc_.name));
        self.indent += 1;
        if let Some(block) = &proc_.preconditions {
            self.section("preconditions", block);
        }
        self.section("main", &proc_.main);
        if let Some(block) = &proc_.confirmation {
            self.section("confirmation", block);
        }
        self.indent -= 1;
        self.line("end procedure");
    }

    fn section(&mut self, keyword: &str, block: &Block) {
        self.line(keyword);
        self.block(block);
        self.line(&format!("end {}", keyword));
    }

    fn block(&mut self, block: &Block) {
        self.indent += 1;
        let stmts = &block.statements;
        for (i, stmt) in stmts.iter().enumerate() {
            // Newlines are not significant, so a following statement that
            // starts with `-`, `+` or `(` would glue onto this one.
            let separate = stmts.get(i + 1).is_some_and(|next| match next {
                Statement::Expression { value, .. } => {
                    let text = print_expression(value);
                    text.starts_with(['-', '+', '('])
                }
                _ => false,
            });
            self.statement(stmt);
            if separate {
                self.out.pop();
                self.out.push_str(";\n");
            }
        }
        self.indent -= 1;
    }

    fn statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::ActivityCall {
                mode,
                reference,
                arguments,
                ..
            } => {
                let head = match mode {
                    ActivityMode::Initiate => "initiate",
                    ActivityMode::Confirm => "confirm",
                    ActivityMode::InitiateAndConfirm => "initiate and confirm",
                };
                let mut text = format!("{} {}", head, reference);
                if !arguments.is_empty() {
                    write_args(&mut text, arguments);
                }
                self.line(&text);
            }
            Statement::ConfirmCheck { condition, .. } => {
                // A bare reference or call after `confirm` would read back as
                // an activity call.
                let text = match condition {
                    Expression::Identifier { .. }
                    | Expression::PropertyAccess { .. }
                    | Expression::FunctionCall { .. } => format!("({})", print_expression(condition)),
                    _ => print_expression(condition),
                };
                self.line(&format!("confirm {}", text));
            }
            Statement::WaitUntil { condition, .. } => {
                self.line(&format!("wait until {}", print_expression(condition)));
            }
            Statement::Assignment { target, value, .. } => {
                self.line(&format!("{} = {}", target, print_expression(value)));
            }
            Statement::Conditional {
                branches,
                else_body,
                ..
            } => {
                for (i, branch) in branches.iter().enumerate() {
                    let kw = if i == 0 { "if" } else { "elsif" };
                    self.line(&format!("{} {} then", kw, print_expression(&branch.condition)));
                    self.block(&branch.body);
                }
                if let Some(body) = else_body {
                    self.line("else");
                    self.block(body);
                }
                self.line("end if");
            }
            Statement::While { condition, body, .. } => {
                self.line(&format!("while {} do", print_expression(condition)));
                self.block(body);
                self.line("end while");
            }
            Statement::For {
                variable,
                iterable,
                body,
                ..
            } => {
                self.line(&format!("for {} in {} do", variable, print_expression(iterable)));
                self.block(body);
                self.line("end for");
            }
            Statement::Expression { value, .. } => self.line(&print_expression(value)),
        }
    }

    fn declaration(&mut self, decl: &Declaration) {
        match decl {
            Declaration::Namespace(ns) => self.namespace(ns),
            Declaration::Type(ty) => self.type_decl(ty),
        }
    }

    fn namespace(&mut self, ns: &NamespaceDecl) {
        if ns.children.is_empty() {
            self.line(&format!("namespace {} {{}}", ns.path));
            return;
        }
        self.line(&format!("namespace {} {{", ns.path));
        self.indent += 1;
        for child in &ns.children {
            self.declaration(child);
        }
        self.indent -= 1;
        self.line("}");
    }

    fn type_decl(&mut self, decl: &TypeDecl) {
        let def = match &decl.definition {
            TypeDefinition::Struct { fields } => struct_text(fields),
            TypeDefinition::Primitive { primitive } => primitive.name().to_owned(),
            TypeDefinition::Array { element, size } => array_text(element, *size),
        };
        self.line(&format!("type {} {}", decl.name, def));
    }
}

fn annotation_text(ty: &TypeAnnotation) -> String {
    match ty {
        TypeAnnotation::Primitive { primitive } => primitive.name().to_owned(),
        TypeAnnotation::Array { element, size } => array_text(element, *size),
        TypeAnnotation::Struct { fields } => struct_text(fields),
        TypeAnnotation::Named { path } => path.to_string(),
    }
}

fn array_text(element: &TypeAnnotation, size: u64) -> String {
    format!("[{}; {}]", annotation_text(element), size)
}

fn struct_text(fields: &[StructField]) -> String {
    if fields.is_empty() {
        return "struct {}".to_owned();
    }
    let body: Vec<String> = fields
        .iter()
        .map(|f| format!("{}: {}", f.name, annotation_text(&f.ty)))
        .collect();
    format!("struct {{ {} }}", body.join(", "))
}
