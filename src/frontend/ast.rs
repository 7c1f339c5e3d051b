//! Abstract Syntax Tree definitions for Pascal8
//!
//! The node set is closed: every pass walks it with exhaustive `match`es.

use crate::utils::Span;

/// A complete program (compilation unit)
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub name: Ident,
    pub decls: Vec<Decl>,
    pub body: Compound,
}

/// Top-level declarations
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Var(VarDecl),
    Proc(ProcDecl),
}

/// `var name: type;` or `const name: type;`, also used for parameters
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: Ident,
    pub ty: TypeRef,
    pub is_const: bool,
}

/// Reference to a type by name
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub name: Ident,
}

/// Procedure declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ProcDecl {
    pub name: Ident,
    pub params: Vec<VarDecl>,
    pub decls: Vec<VarDecl>,
    pub body: Compound,
}

/// `begin ... end`
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// Statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Compound(Compound),
    Assign(Assignment),
    Call(ProcCall),
    If(IfStmt),
}

/// `target := expr`
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Ident,
    pub value: Expr,
}

/// `name(args)` as a statement
#[derive(Debug, Clone, PartialEq)]
pub struct ProcCall {
    pub name: Ident,
    pub args: Vec<Expr>,
}

/// `if cond then stmt [else stmt]`
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Variable reference
    Var(Ident),
    /// Integer literal, kept as source text until lowering
    IntLit { text: String, span: Span },
    Unary {
        op: UnOp,
        expr: Box<Expr>,
        span: Span,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Var(ident) => ident.span,
            Expr::IntLit { span, .. } => *span,
            Expr::Unary { span, .. } => *span,
            Expr::Binary { span, .. } => *span,
        }
    }

    /// Variable references and literals can be combined into the
    /// accumulator without spilling it
    pub fn is_leaf(&self) -> bool {
        matches!(self, Expr::Var(_) | Expr::IntLit { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// -
    Neg,
    /// +
    Plus,
}

/// Identifier with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}
