//! End-to-end checks for error conditions raised outside of constant-folding and
//! structural layout (covered by `constant_folding.rs` and `inheritance.rs`).

use mylangc::error::CompileError;
use test_utils::*;

#[test]
fn function_with_non_void_return_type_must_return_on_every_path() {
    let f = function("identity", vec![param("x", "integer")], Some("integer"), vec![], block(vec![]));
    let ast = program("NoReturn", vec![], vec![], vec![f], block(vec![]));
    assert!(matches!(compile_err(&ast), CompileError::MissingReturn(_, _)));
}

#[test]
fn break_outside_any_loop_is_rejected() {
    let ast = program("LooseBreak", vec![], vec![], vec![], block(vec![brk()]));
    assert!(matches!(compile_err(&ast), CompileError::BreakOutsideLoop(_)));
}

#[test]
fn continue_outside_any_loop_is_rejected() {
    let ast = program("LooseContinue", vec![], vec![], vec![], block(vec![cont()]));
    assert!(matches!(
        compile_err(&ast),
        CompileError::ContinueOutsideLoop(_)
    ));
}

#[test]
fn assigning_to_this_is_not_an_lvalue() {
    let method = function(
        "reset",
        vec![],
        None,
        vec![],
        block(vec![expr_stmt(assign(this(), int(0)))]),
    );
    let types = vec![class_type("Thing", None, vec![], vec![method])];
    let ast = program("AssignThis", vec![], types, vec![], block(vec![]));
    assert!(matches!(compile_err(&ast), CompileError::NotAnLvalue(_)));
}

#[test]
fn calling_an_undeclared_function_is_unresolved() {
    let ast = program(
        "GhostCall",
        vec![],
        vec![],
        vec![],
        block(vec![expr_stmt(call(ident("doesNotExist"), vec![]))]),
    );
    assert!(matches!(
        compile_err(&ast),
        CompileError::UnresolvedIdentifier(_, _)
    ));
}

#[test]
fn indexing_a_constant_out_of_range_is_rejected() {
    let ast = program(
        "OutOfRange",
        vec![var("xs", "Nums")],
        vec![array_type("Nums", int(3), "integer")],
        vec![],
        block(vec![expr_stmt(index(ident("xs"), int(3)))]),
    );
    assert!(matches!(
        compile_err(&ast),
        CompileError::ConstantIndexOutOfRange(_, _)
    ));
}

#[test]
fn printing_a_class_value_is_unprintable() {
    let types = vec![class_type("Thing", None, vec![], vec![])];
    let ast = program(
        "PrintClass",
        vec![var("t", "Thing")],
        types,
        vec![],
        block(vec![print(ident("t"))]),
    );
    assert!(matches!(
        compile_err(&ast),
        CompileError::UnprintableType(_, _)
    ));
}
