//! Fixture-construction and assertion helpers shared by the integration tests
//! under `tests/`. Since lexing/parsing is out of scope, fixtures build
//! [`ProgramAst`] values directly rather than parsing source text.

use mylangc::ast::{
    ArrayTypeDecl, Block, ClassTypeDecl, Expr, FieldDecl, FunctionDecl, ParamDecl, ProgramAst,
    Stmt, TypeDecl, VarDecl,
};
use mylangc::error::CompileError;
use mylangc::location::Span;

pub fn span() -> Span {
    Span::default()
}

pub fn int(value: i64) -> Expr {
    Expr::IntLiteral { value, span: span() }
}

pub fn boolean(value: bool) -> Expr {
    Expr::BoolLiteral { value, span: span() }
}

pub fn string(value: &str) -> Expr {
    Expr::StringLiteral {
        value: value.to_string(),
        span: span(),
    }
}

pub fn ident(name: &str) -> Expr {
    Expr::Ident {
        name: name.to_string(),
        span: span(),
    }
}

pub fn this() -> Expr {
    Expr::This { span: span() }
}

pub fn binary(op: mylangc::ast::BinaryOperator, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span: span(),
    }
}

pub fn assign(lhs: Expr, rhs: Expr) -> Expr {
    Expr::Assign {
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        span: span(),
    }
}

pub fn field(base: Expr, name: &str) -> Expr {
    Expr::FieldAccess {
        base: Box::new(base),
        field: name.to_string(),
        span: span(),
    }
}

pub fn index(base: Expr, idx: Expr) -> Expr {
    Expr::Index {
        base: Box::new(base),
        index: Box::new(idx),
        span: span(),
    }
}

pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call {
        callee: Box::new(callee),
        args,
        span: span(),
    }
}

pub fn var(name: &str, ty: &str) -> VarDecl {
    VarDecl {
        name: name.to_string(),
        ty: ty.to_string(),
        span: span(),
    }
}

pub fn param(name: &str, ty: &str) -> ParamDecl {
    ParamDecl {
        name: name.to_string(),
        ty: ty.to_string(),
        span: span(),
    }
}

pub fn field_decl(name: &str, ty: &str) -> FieldDecl {
    FieldDecl {
        name: name.to_string(),
        ty: ty.to_string(),
        span: span(),
    }
}

pub fn block(statements: Vec<Stmt>) -> Block {
    Block { statements, span: span() }
}

pub fn print(expr: Expr) -> Stmt {
    Stmt::Print { expr, span: span() }
}

pub fn ret(expr: Option<Expr>) -> Stmt {
    Stmt::Return { expr, span: span() }
}

pub fn brk() -> Stmt {
    Stmt::Break { span: span() }
}

pub fn cont() -> Stmt {
    Stmt::Continue { span: span() }
}

pub fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expr { expr, span: span() }
}

pub fn if_stmt(branches: Vec<(Expr, Block)>, else_branch: Option<Block>) -> Stmt {
    Stmt::If {
        branches,
        else_branch,
        span: span(),
    }
}

pub fn while_stmt(cond: Expr, body: Block) -> Stmt {
    Stmt::While { cond, body, span: span() }
}

pub fn repeat_stmt(body: Block, cond: Expr) -> Stmt {
    Stmt::Repeat { body, cond, span: span() }
}

pub fn foreach_stmt(var: &str, array: Expr, body: Block) -> Stmt {
    Stmt::Foreach {
        var: var.to_string(),
        array,
        body,
        span: span(),
    }
}

pub fn function(
    name: &str,
    params: Vec<ParamDecl>,
    return_type: Option<&str>,
    locals: Vec<VarDecl>,
    body: Block,
) -> FunctionDecl {
    FunctionDecl {
        name: name.to_string(),
        params,
        return_type: return_type.map(str::to_string),
        locals,
        body,
        span: span(),
    }
}

pub fn array_type(name: &str, length: Expr, element: &str) -> TypeDecl {
    TypeDecl::Array(ArrayTypeDecl {
        name: name.to_string(),
        length,
        element: element.to_string(),
        span: span(),
    })
}

pub fn class_type(
    name: &str,
    superclass: Option<&str>,
    fields: Vec<FieldDecl>,
    methods: Vec<FunctionDecl>,
) -> TypeDecl {
    TypeDecl::Class(ClassTypeDecl {
        name: name.to_string(),
        superclass: superclass.map(str::to_string),
        fields,
        methods,
        span: span(),
    })
}

/// A minimal valid program: no declared types or functions, `locals` and `body`
/// as given. `name` becomes the emitted top-level function's IR label.
pub fn program(name: &str, locals: Vec<VarDecl>, type_decls: Vec<TypeDecl>, functions: Vec<FunctionDecl>, body: Block) -> ProgramAst {
    ProgramAst {
        name: name.to_string(),
        locals,
        type_decls,
        functions,
        body,
        span: span(),
    }
}

/// Compiles `ast` and panics with the error if compilation fails, matching the
/// `.expect()`-style assertions the teacher's own test harness uses.
pub fn compile_ok(ast: &ProgramAst) -> String {
    mylangc::driver::compile(ast).expect("program is expected to compile")
}

/// Compiles `ast` and panics if it unexpectedly succeeds.
pub fn compile_err(ast: &ProgramAst) -> CompileError {
    match mylangc::driver::compile(ast) {
        Ok(ir) => panic!("expected compilation to fail, got IR:\n{ir}"),
        Err(err) => err,
    }
}

/// Asserts every needle appears (in order of first occurrence) somewhere in `ir`.
pub fn assert_ir_contains(ir: &str, needles: &[&str]) {
    for needle in needles {
        assert!(
            ir.contains(needle),
            "expected IR to contain {needle:?}, got:\n{ir}"
        );
    }
}
