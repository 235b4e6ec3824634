//! End-to-end checks for the IR shape of `if`/`elif`/`else` and `while`.

use mylangc::ast::BinaryOperator;
use test_utils::*;

#[test]
fn if_elif_else_emits_one_check_block_per_branch() {
    let ast = program(
        "Branches",
        vec![var("x", "integer")],
        vec![],
        vec![],
        block(vec![if_stmt(
            vec![
                (binary(BinaryOperator::Eq, ident("x"), int(0)), block(vec![print(int(1))])),
                (binary(BinaryOperator::Eq, ident("x"), int(1)), block(vec![print(int(2))])),
            ],
            Some(block(vec![print(int(3))])),
        )]),
    );

    let ir = compile_ok(&ast);
    assert_ir_contains(
        &ir,
        &[
            "icmp eq i32",
            "br i1",
            "call i32 (i8*, ...) @printf",
        ],
    );
    // Two conditions plus one unconditional fallthrough into the else body.
    assert_eq!(ir.matches("br i1").count(), 2);
}

#[test]
fn while_loop_branches_back_to_its_own_condition_check() {
    let ast = program(
        "Loop",
        vec![var("x", "integer")],
        vec![],
        vec![],
        block(vec![while_stmt(
            binary(BinaryOperator::Lt, ident("x"), int(10)),
            block(vec![expr_stmt(assign(
                ident("x"),
                binary(BinaryOperator::Add, ident("x"), int(1)),
            ))]),
        )]),
    );

    let ir = compile_ok(&ast);
    assert_ir_contains(&ir, &["icmp slt i32", "br i1", "add nsw i32"]);
}

#[test]
fn break_and_continue_resolve_through_patched_loop_labels() {
    let ast = program(
        "LoopControl",
        vec![var("x", "integer")],
        vec![],
        vec![],
        block(vec![while_stmt(
            boolean(true),
            block(vec![if_stmt(
                vec![(binary(BinaryOperator::Gt, ident("x"), int(5)), block(vec![brk()]))],
                None,
            )]),
        )]),
    );

    let ir = compile_ok(&ast);
    // No raw placeholder bytes should survive into the rendered IR.
    assert!(!ir.contains('\u{80}'));
    assert!(!ir.contains('\u{81}'));
}
