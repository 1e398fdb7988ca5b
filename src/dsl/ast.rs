//! Abstract syntax tree for tweenscript.

use std::rc::Rc;

/// A statement with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `name = expr` or `obj.prop = expr`.
    Assignment { target: Expr, value: Expr },
    Expr(Expr),
    /// `wait(expr)`.
    Wait(Expr),
    /// `repeat count { body }`.
    Repeat { count: Expr, body: Vec<Stmt> },
    /// `func name(params) { body }`.
    FuncDef(Rc<FuncDef>),
    /// `return [expr]`.
    Return(Option<Expr>),
}

/// A user function. Shared so that function values can outlive the parse tree walk.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

/// An expression with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Call { callee: Box<Expr>, args: Vec<Arg> },
    Member { target: Box<Expr>, name: String },
    Ident(String),
    Number(f64),
    Bool(bool),
    String(String),
    Array(Vec<Expr>),
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// `Type(args){k: v}` or `Type{k: v}`.
    ObjectConstructor {
        type_name: String,
        args: Vec<Arg>,
        props: Vec<(String, Expr)>,
    },
    /// A string literal assembled from text and expression parts at run time.
    Interp(Vec<InterpPart>),
}

/// A call argument, positional or `name: value`.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Positional(Expr),
    Named(String, Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterpPart {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    /// Binding power; every binary operator is left-associative.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 20,
            BinaryOp::Add | BinaryOp::Sub => 10,
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::LtEq
            | BinaryOp::GtEq => 5,
            BinaryOp::And => 3,
            BinaryOp::Or => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl Expr {
    pub fn new(kind: ExprKind, line: usize, col: usize) -> Self {
        Self { kind, line, col }
    }
}
