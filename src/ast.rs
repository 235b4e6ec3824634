//! The abstract syntax tree the core operates on.
//!
//! Lexing and parsing MyLang source text is out of scope; these types are the
//! hand-off contract with that (external) stage. They are plain tagged-variant
//! (sum type) nodes — no linked-list-of-children, no runtime downcasts — deserialised
//! with `serde_json` from the path given as the compiler's first CLI argument. Every
//! node carries its own [`Span`] rather than relying on a shared base-node header.

use serde::{Deserialize, Serialize};

use crate::location::Span;
use crate::types::TypeName;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramAst {
    pub name: String,
    pub locals: Vec<VarDecl>,
    pub type_decls: Vec<TypeDecl>,
    pub functions: Vec<FunctionDecl>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub ty: TypeName,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TypeDecl {
    Array(ArrayTypeDecl),
    Class(ClassTypeDecl),
}

impl TypeDecl {
    pub fn name(&self) -> &str {
        match self {
            TypeDecl::Array(d) => &d.name,
            TypeDecl::Class(d) => &d.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TypeDecl::Array(d) => d.span,
            TypeDecl::Class(d) => d.span,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayTypeDecl {
    pub name: String,
    /// The declared length expression; must fold to a positive compile-time constant.
    pub length: Expr,
    pub element: TypeName,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassTypeDecl {
    pub name: String,
    pub superclass: Option<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<FunctionDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeName,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<ParamDecl>,
    /// `None` means the declared return type is `void`.
    pub return_type: Option<TypeName>,
    pub locals: Vec<VarDecl>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeName,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Stmt {
    Expr { expr: Expr, span: Span },
    Print { expr: Expr, span: Span },
    Return { expr: Option<Expr>, span: Span },
    Break { span: Span },
    Continue { span: Span },
    If {
        /// `(condition, body)` for `if`, followed by each `elif`.
        branches: Vec<(Expr, Block)>,
        else_branch: Option<Block>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Block,
        span: Span,
    },
    /// `repeat B until E`: executes `body` once, then exits once `cond` becomes true.
    Repeat {
        body: Block,
        cond: Expr,
        span: Span,
    },
    Foreach {
        var: String,
        array: Expr,
        body: Block,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr { span, .. }
            | Stmt::Print { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Break { span }
            | Stmt::Continue { span }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Repeat { span, .. }
            | Stmt::Foreach { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use BinaryOperator::*;
        let s = match self {
            Or => "or",
            And => "and",
            BitOr => "|",
            BitXor => "^",
            BitAnd => "&",
            Shl => "<<",
            Shr => ">>",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Rem => "%",
            Eq => "==",
            Ne => "!=",
            Le => "<=",
            Ge => ">=",
            Lt => "<",
            Gt => ">",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expr {
    IntLiteral { value: i64, span: Span },
    BoolLiteral { value: bool, span: Span },
    StringLiteral { value: String, span: Span },
    This { span: Span },
    Ident { name: String, span: Span },
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Assign {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    FieldAccess {
        base: Box<Expr>,
        field: String,
        span: Span,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    /// `callee` is evaluated in call position: an `Ident` resolves to a free function,
    /// a `FieldAccess` resolves to a method on its base.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::IntLiteral { span, .. }
            | Expr::BoolLiteral { span, .. }
            | Expr::StringLiteral { span, .. }
            | Expr::This { span }
            | Expr::Ident { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Assign { span, .. }
            | Expr::FieldAccess { span, .. }
            | Expr::Index { span, .. }
            | Expr::Call { span, .. } => *span,
        }
    }
}
