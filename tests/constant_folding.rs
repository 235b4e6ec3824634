//! End-to-end checks for the Constant Evaluator's effect on emitted IR: array
//! lengths, short-circuited conditions, and the independent divide-by-zero check.

use mylangc::ast::BinaryOperator;
use mylangc::error::CompileError;
use test_utils::*;

#[test]
fn array_length_must_be_a_positive_constant() {
    let ast = program(
        "BadArray",
        vec![],
        vec![array_type("Nums", int(0), "integer")],
        vec![],
        block(vec![]),
    );
    assert!(matches!(
        compile_err(&ast),
        CompileError::InvalidArrayLength(_, _)
    ));
}

#[test]
fn constant_true_left_operand_short_circuits_or_without_lowering_the_right_side() {
    // `true or (x / 0)` must never lower the right side, since the left alone
    // decides the result — if it were lowered, the constant zero divisor would be
    // rejected by the division-by-zero check.
    let rhs = binary(BinaryOperator::Div, ident("x"), int(0));
    let expr = binary(BinaryOperator::Or, boolean(true), rhs);
    let ast = program("Fold", vec![], vec![], vec![], block(vec![print(expr)]));

    let ir = compile_ok(&ast);
    assert!(!ir.contains("sdiv"));
    assert_ir_contains(&ir, &["call i32 (i8*, ...) @printf"]);
}

#[test]
fn division_by_constant_zero_is_rejected_even_when_not_fully_foldable() {
    let ast = program(
        "DivZero",
        vec![var("x", "integer")],
        vec![],
        vec![],
        block(vec![expr_stmt(assign(
            ident("x"),
            binary(BinaryOperator::Div, ident("x"), int(0)),
        ))]),
    );
    assert!(matches!(compile_err(&ast), CompileError::DivisionByZero(_)));
}

#[test]
fn while_with_constant_condition_never_emits_a_conditional_branch() {
    let ast = program(
        "DeadLoop",
        vec![],
        vec![],
        vec![],
        block(vec![while_stmt(boolean(false), block(vec![print(int(1))]))]),
    );
    let ir = compile_ok(&ast);
    assert!(!ir.contains("br i1"));
    assert!(ir.contains("br label %"));
}
