//! End-to-end checks for single-inheritance class layout and field access through
//! superclass-prefix GEP chains.

use test_utils::*;

fn base_and_derived() -> Vec<mylangc::ast::TypeDecl> {
    vec![
        class_type("Base", None, vec![field_decl("b", "integer")], vec![]),
        class_type(
            "Derived",
            Some("Base"),
            vec![field_decl("d", "integer")],
            vec![],
        ),
    ]
}

#[test]
fn derived_class_embeds_its_base_as_the_first_member() {
    let ast = program("Layout", vec![], base_and_derived(), vec![], block(vec![]));
    let ir = compile_ok(&ast);
    assert_ir_contains(
        &ir,
        &[
            "%class.Base = type { i32 }",
            "%class.Derived = type { %class.Base, i32 }",
        ],
    );
}

#[test]
fn method_reading_an_inherited_field_walks_the_superclass_prefix() {
    let get_b = function(
        "getB",
        vec![],
        Some("integer"),
        vec![],
        block(vec![ret(Some(ident("b")))]),
    );
    let types = vec![
        class_type("Base", None, vec![field_decl("b", "integer")], vec![]),
        class_type(
            "Derived",
            Some("Base"),
            vec![field_decl("d", "integer")],
            vec![get_b],
        ),
    ];
    let ast = program("Inherit", vec![], types, vec![], block(vec![]));
    let ir = compile_ok(&ast);
    // Two `i32 0` prefix indices (self, then one step up into Base) before the
    // field ordinal itself.
    assert_ir_contains(
        &ir,
        &["getelementptr inbounds %class.Derived, %class.Derived* %0, i32 0, i32 0, i32 0"],
    );
}

#[test]
fn field_shadowing_an_ancestor_field_is_rejected() {
    let types = vec![
        class_type("Base", None, vec![field_decl("b", "integer")], vec![]),
        class_type("Derived", Some("Base"), vec![field_decl("b", "boolean")], vec![]),
    ];
    let ast = program("Shadow", vec![], types, vec![], block(vec![]));
    assert!(matches!(
        compile_err(&ast),
        mylangc::error::CompileError::FieldShadowing(_, _)
    ));
}

#[test]
fn field_and_method_with_the_same_name_collide() {
    let clash = function("x", vec![], None, vec![], block(vec![]));
    let types = vec![class_type(
        "Clashing",
        None,
        vec![field_decl("x", "integer")],
        vec![clash],
    )];
    let ast = program("Clash", vec![], types, vec![], block(vec![]));
    assert!(matches!(
        compile_err(&ast),
        mylangc::error::CompileError::FieldMethodCollision(_, _)
    ));
}

#[test]
fn structural_cycle_between_classes_is_reported() {
    let types = vec![
        class_type("A", None, vec![field_decl("b", "B")], vec![]),
        class_type("B", None, vec![field_decl("a", "A")], vec![]),
    ];
    let ast = program("Cycle", vec![], types, vec![], block(vec![]));
    assert!(matches!(
        compile_err(&ast),
        mylangc::error::CompileError::StructuralCycle(_, _)
    ));
}
