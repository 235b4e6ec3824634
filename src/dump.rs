//! A plain-text structural dump of a [`ProgramAst`], one node per line, indented by
//! nesting depth. Used by the `--dump-ast-only` CLI flag to inspect the AST hand-off
//! without running semantic analysis or code generation.

use std::fmt::Write as _;

use crate::ast::{BinaryOperator, Block, Expr, FunctionDecl, ProgramAst, Stmt, TypeDecl};

pub fn dump(ast: &ProgramAst) -> String {
    let mut out = String::new();
    writeln!(out, "program {}", ast.name).unwrap();
    for local in &ast.locals {
        writeln!(out, "  var {} is {}", local.name, local.ty).unwrap();
    }
    for decl in &ast.type_decls {
        dump_type_decl(&mut out, decl, 1);
    }
    for function in &ast.functions {
        dump_function(&mut out, function, 1);
    }
    writeln!(out, "  body").unwrap();
    dump_block(&mut out, &ast.body, 2);
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn dump_type_decl(out: &mut String, decl: &TypeDecl, depth: usize) {
    match decl {
        TypeDecl::Array(d) => {
            indent(out, depth);
            writeln!(out, "type {} is array[{}] of {}", d.name, render_expr(&d.length), d.element).unwrap();
        }
        TypeDecl::Class(d) => {
            indent(out, depth);
            match &d.superclass {
                Some(sup) => writeln!(out, "type {} extends {}", d.name, sup).unwrap(),
                None => writeln!(out, "type {}", d.name).unwrap(),
            }
            for field in &d.fields {
                indent(out, depth + 1);
                writeln!(out, "field {} is {}", field.name, field.ty).unwrap();
            }
            for method in &d.methods {
                dump_function(out, method, depth + 1);
            }
        }
    }
}

fn dump_function(out: &mut String, function: &FunctionDecl, depth: usize) {
    indent(out, depth);
    let params: Vec<String> = function
        .params
        .iter()
        .map(|p| format!("{} is {}", p.name, p.ty))
        .collect();
    let return_ty = function.return_type.as_deref().unwrap_or("void");
    writeln!(
        out,
        "fun {}({}) -> {}",
        function.name,
        params.join(", "),
        return_ty
    )
    .unwrap();
    for local in &function.locals {
        indent(out, depth + 1);
        writeln!(out, "var {} is {}", local.name, local.ty).unwrap();
    }
    dump_block(out, &function.body, depth + 1);
}

fn dump_block(out: &mut String, block: &Block, depth: usize) {
    for stmt in &block.statements {
        dump_stmt(out, stmt, depth);
    }
}

fn dump_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
    indent(out, depth);
    match stmt {
        Stmt::Expr { expr, .. } => writeln!(out, "{}", render_expr(expr)).unwrap(),
        Stmt::Print { expr, .. } => writeln!(out, "print {}", render_expr(expr)).unwrap(),
        Stmt::Return { expr: Some(e), .. } => writeln!(out, "return {}", render_expr(e)).unwrap(),
        Stmt::Return { expr: None, .. } => writeln!(out, "return").unwrap(),
        Stmt::Break { .. } => writeln!(out, "break").unwrap(),
        Stmt::Continue { .. } => writeln!(out, "continue").unwrap(),
        Stmt::If {
            branches,
            else_branch,
            ..
        } => {
            for (i, (cond, body)) in branches.iter().enumerate() {
                if i == 0 {
                    writeln!(out, "if {}", render_expr(cond)).unwrap();
                } else {
                    indent(out, depth);
                    writeln!(out, "elif {}", render_expr(cond)).unwrap();
                }
                dump_block(out, body, depth + 1);
            }
            if let Some(else_block) = else_branch {
                indent(out, depth);
                writeln!(out, "else").unwrap();
                dump_block(out, else_block, depth + 1);
            }
        }
        Stmt::While { cond, body, .. } => {
            writeln!(out, "while {}", render_expr(cond)).unwrap();
            dump_block(out, body, depth + 1);
        }
        Stmt::Repeat { body, cond, .. } => {
            writeln!(out, "repeat").unwrap();
            dump_block(out, body, depth + 1);
            indent(out, depth);
            writeln!(out, "until {}", render_expr(cond)).unwrap();
        }
        Stmt::Foreach {
            var, array, body, ..
        } => {
            writeln!(out, "foreach {} in {}", var, render_expr(array)).unwrap();
            dump_block(out, body, depth + 1);
        }
    }
}

fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::IntLiteral { value, .. } => value.to_string(),
        Expr::BoolLiteral { value, .. } => value.to_string(),
        Expr::StringLiteral { value, .. } => format!("{:?}", value),
        Expr::This { .. } => "this".to_string(),
        Expr::Ident { name, .. } => name.clone(),
        Expr::Binary { op, left, right, .. } => {
            format!("({} {} {})", render_expr(left), render_operator(*op), render_expr(right))
        }
        Expr::Assign { lhs, rhs, .. } => format!("{} := {}", render_expr(lhs), render_expr(rhs)),
        Expr::FieldAccess { base, field, .. } => format!("{}.{}", render_expr(base), field),
        Expr::Index { base, index, .. } => format!("{}[{}]", render_expr(base), render_expr(index)),
        Expr::Call { callee, args, .. } => {
            let args: Vec<String> = args.iter().map(render_expr).collect();
            format!("{}({})", render_expr(callee), args.join(", "))
        }
    }
}

fn render_operator(op: BinaryOperator) -> String {
    op.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Span;

    #[test]
    fn test_dump_empty_program() {
        let ast = ProgramAst {
            name: "Empty".into(),
            locals: vec![],
            type_decls: vec![],
            functions: vec![],
            body: Block {
                statements: vec![],
                span: Span::default(),
            },
            span: Span::default(),
        };
        let out = dump(&ast);
        assert!(out.starts_with("program Empty\n"));
        assert!(out.contains("body\n"));
    }

    #[test]
    fn test_dump_print_statement() {
        let ast = ProgramAst {
            name: "P".into(),
            locals: vec![],
            type_decls: vec![],
            functions: vec![],
            body: Block {
                statements: vec![Stmt::Print {
                    expr: Expr::IntLiteral {
                        value: 42,
                        span: Span::default(),
                    },
                    span: Span::default(),
                }],
                span: Span::default(),
            },
            span: Span::default(),
        };
        assert!(dump(&ast).contains("print 42"));
    }
}
