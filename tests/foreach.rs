//! End-to-end checks for `foreach`'s desugaring to a private counter loop.

use test_utils::*;

#[test]
fn foreach_over_an_array_local_loads_each_element_into_the_loop_variable() {
    let ast = program(
        "Sum",
        vec![var("xs", "Nums"), var("total", "integer"), var("n", "integer")],
        vec![array_type("Nums", int(3), "integer")],
        vec![],
        block(vec![foreach_stmt(
            "n",
            ident("xs"),
            block(vec![expr_stmt(assign(
                ident("total"),
                binary(mylangc::ast::BinaryOperator::Add, ident("total"), ident("n")),
            ))]),
        )]),
    );

    let ir = compile_ok(&ast);
    assert_ir_contains(
        &ir,
        &[
            "icmp slt i32",
            "getelementptr inbounds [3 x i32], [3 x i32]* %",
            "add nsw i32",
        ],
    );
}

#[test]
fn foreach_variable_must_already_be_a_declared_local() {
    let ast = program(
        "UndeclaredLoopVar",
        vec![var("xs", "Nums")],
        vec![array_type("Nums", int(3), "integer")],
        vec![],
        block(vec![foreach_stmt("missing", ident("xs"), block(vec![]))]),
    );
    assert!(matches!(
        compile_err(&ast),
        mylangc::error::CompileError::UnresolvedIdentifier(_, _)
    ));
}

#[test]
fn foreach_over_a_field_access_expression_is_rejected() {
    let method = function(
        "sumField",
        vec![],
        None,
        vec![var("n", "integer")],
        block(vec![foreach_stmt(
            "n",
            field(this(), "xs"),
            block(vec![]),
        )]),
    );
    let types = vec![
        array_type("Nums", int(3), "integer"),
        class_type("Holder", None, vec![field_decl("xs", "Nums")], vec![method]),
    ];
    let ast = program("FieldForeach", vec![], types, vec![], block(vec![]));
    assert!(matches!(
        compile_err(&ast),
        mylangc::error::CompileError::IncompatibleOperand(_, _)
    ));
}
