//! The Program Driver: orchestrates the whole pipeline from a deserialised
//! [`ProgramAst`] to a rendered [`crate::ir::Module`] — populate the type registry,
//! resolve layout, build the global function table, then lower every method, free
//! function, and the top-level program body in turn.

use log::{debug, info};

use crate::ast::{ClassTypeDecl, FunctionDecl, ProgramAst, TypeDecl};
use crate::codegen::Lowerer;
use crate::const_eval::{self, ConstValue};
use crate::error::{
    CompileError, FieldMethodCollision, FieldShadowing, InvalidArrayLength, MissingReturn,
};
use crate::ir::{Module, StringTable};
use crate::layout;
use crate::symbols::{FunctionScope, GlobalFunctionTable};
use crate::types::{ArrayDecl, ClassDecl, ClassField, FunctionSig, Type, TypeRegistry};

/// Runs the full pipeline and returns the rendered LLVM IR text.
pub fn compile(ast: &ProgramAst) -> Result<String, CompileError> {
    info!("populating type registry for program '{}'", ast.name);
    let mut registry = populate_types(ast)?;

    debug!("resolving structural layout");
    let layout = layout::resolve(&mut registry)?;

    let globals = populate_globals(ast, &registry)?;
    let mut strings = StringTable::new();

    let mut functions = Vec::new();
    for class in &layout.class_order {
        let decl = registry.class(class).unwrap().clone();
        let mut method_names: Vec<&String> = decl.methods.keys().collect();
        method_names.sort();
        for method_name in method_names {
            let sig = &decl.methods[method_name];
            let method_decl = find_method_decl(ast, class, method_name)
                .expect("every registered method signature has a matching declaration");
            info!("lowering method {}.{}", class, method_name);
            let ir = lower_function(
                &registry,
                &layout.field_index,
                &globals,
                &mut strings,
                method_decl,
                Some(class.clone()),
                sig.clone(),
                &format!("class.{}.{}", class, method_name),
            )?;
            functions.push(ir);
        }
    }

    for function in &ast.functions {
        let sig = globals
            .get(&function.name)
            .cloned()
            .expect("every free function was registered into the global table");
        let label = if function.name == "main" {
            "...main".to_string()
        } else {
            function.name.clone()
        };
        info!("lowering function {}", function.name);
        let ir = lower_function(
            &registry, &layout.field_index, &globals, &mut strings, function, None, sig, &label,
        )?;
        functions.push(ir);
    }

    info!("lowering top-level program body");
    let top_level = FunctionDecl {
        name: ast.name.clone(),
        params: Vec::new(),
        return_type: None,
        locals: ast.locals.clone(),
        body: ast.body.clone(),
        span: ast.span,
    };
    let main_sig = FunctionSig {
        params: Vec::new(),
        return_type: Type::Integer,
    };
    let main_ir = lower_program_entry(
        &registry,
        &layout.field_index,
        &globals,
        &mut strings,
        &top_level,
        main_sig,
    )?;
    functions.push(main_ir);

    let module = Module {
        type_decls: layout.class_type_lines,
        strings,
        functions,
    };
    Ok(module.render())
}

/// Two passes: first claim every declared name (arrays fully, classes as empty
/// skeletons) so field types can refer to any sibling type; then resolve each
/// class's fields and methods now that every name exists.
fn populate_types(ast: &ProgramAst) -> Result<TypeRegistry, CompileError> {
    let mut registry = TypeRegistry::new();
    let mut raw_classes: Vec<&ClassTypeDecl> = Vec::new();

    for decl in &ast.type_decls {
        match decl {
            TypeDecl::Array(d) => {
                let length = match const_eval::eval(&d.length)? {
                    Some(ConstValue::Int(n)) if n > 0 => n as u32,
                    _ => {
                        return Err(CompileError::InvalidArrayLength(
                            InvalidArrayLength {
                                array: d.name.clone(),
                            },
                            d.span,
                        ))
                    }
                };
                registry.register_array(ArrayDecl {
                    name: d.name.clone(),
                    length,
                    element: d.element.clone(),
                    span: d.span,
                })?;
            }
            TypeDecl::Class(d) => {
                registry.register_class(ClassDecl {
                    name: d.name.clone(),
                    superclass: d.superclass.clone(),
                    fields: Vec::new(),
                    methods: std::collections::HashMap::new(),
                    span: d.span,
                })?;
                raw_classes.push(d);
            }
        }
    }

    for d in raw_classes {
        let mut fields = Vec::new();
        for (ordinal, field) in d.fields.iter().enumerate() {
            if let Some(super_name) = &d.superclass {
                if crate::symbols::resolve_field(super_name, &field.name, &registry).is_some() {
                    return Err(CompileError::FieldShadowing(
                        FieldShadowing {
                            class: d.name.clone(),
                            field: field.name.clone(),
                            ancestor: super_name.clone(),
                        },
                        field.span,
                    ));
                }
            }
            let ty = registry.resolve(&field.ty, field.span)?;
            fields.push(ClassField {
                ordinal,
                name: field.name.clone(),
                ty,
                span: field.span,
            });
        }

        let mut methods = std::collections::HashMap::new();
        for method in &d.methods {
            if fields.iter().any(|f| f.name == method.name) {
                return Err(CompileError::FieldMethodCollision(
                    FieldMethodCollision {
                        class: d.name.clone(),
                        name: method.name.clone(),
                    },
                    method.span,
                ));
            }
            methods.insert(method.name.clone(), function_sig(&registry, method)?);
        }

        registry.replace_class(ClassDecl {
            name: d.name.clone(),
            superclass: d.superclass.clone(),
            fields,
            methods,
            span: d.span,
        });
    }

    Ok(registry)
}

fn function_sig(registry: &TypeRegistry, decl: &FunctionDecl) -> Result<FunctionSig, CompileError> {
    let mut params = Vec::new();
    for p in &decl.params {
        params.push(registry.resolve(&p.ty, p.span)?);
    }
    let return_type = match &decl.return_type {
        Some(name) => registry.resolve(name, decl.span)?,
        None => Type::Void,
    };
    Ok(FunctionSig { params, return_type })
}

fn populate_globals(
    ast: &ProgramAst,
    registry: &TypeRegistry,
) -> Result<GlobalFunctionTable, CompileError> {
    let mut globals = GlobalFunctionTable::new();
    for function in &ast.functions {
        let sig = function_sig(registry, function)?;
        globals.register(function.name.clone(), sig)?;
    }
    Ok(globals)
}

fn find_method_decl<'a>(
    ast: &'a ProgramAst,
    class: &str,
    method: &str,
) -> Option<&'a FunctionDecl> {
    ast.type_decls.iter().find_map(|decl| match decl {
        TypeDecl::Class(c) if c.name == class => c.methods.iter().find(|m| m.name == method),
        _ => None,
    })
}

fn lower_function(
    registry: &TypeRegistry,
    field_index: &layout::FieldIndex,
    globals: &GlobalFunctionTable,
    strings: &mut StringTable,
    decl: &FunctionDecl,
    class: Option<String>,
    sig: FunctionSig,
    label: &str,
) -> Result<String, CompileError> {
    let param_names: Vec<(String, Type)> = decl
        .params
        .iter()
        .zip(sig.params.iter())
        .map(|(p, t)| (p.name.clone(), t.clone()))
        .collect();
    let local_names: Vec<(String, Type)> = decl
        .locals
        .iter()
        .map(|l| Ok((l.name.clone(), registry.resolve(&l.ty, l.span)?)))
        .collect::<Result<_, CompileError>>()?;

    let scope = FunctionScope::new(
        param_names,
        local_names.clone(),
        class.clone(),
        sig.return_type.clone(),
    );

    let mut lowerer = Lowerer::new(registry, field_index, globals, &scope, strings);
    lowerer.prologue(
        &sig.params,
        &local_names.iter().map(|(_, t)| t.clone()).collect::<Vec<_>>(),
        class.is_some(),
    );
    lowerer.lower_block(&decl.body)?;
    finalize_control_flow(&mut lowerer, &sig.return_type, &decl.name, decl.span)?;

    let body_text = lowerer.emit.buffer_str();
    let header = function_header(registry, label, &sig, class.as_deref());
    Ok(format!("define {} #1 {{\n{}}}", header, body_text))
}

/// Like [`lower_function`] but for the implicit top-level program body, which always
/// returns `i32 0` and never takes `this` or declared parameters.
fn lower_program_entry(
    registry: &TypeRegistry,
    field_index: &layout::FieldIndex,
    globals: &GlobalFunctionTable,
    strings: &mut StringTable,
    decl: &FunctionDecl,
    sig: FunctionSig,
) -> Result<String, CompileError> {
    let local_names: Vec<(String, Type)> = decl
        .locals
        .iter()
        .map(|l| Ok((l.name.clone(), registry.resolve(&l.ty, l.span)?)))
        .collect::<Result<_, CompileError>>()?;

    let scope = FunctionScope::new(Vec::new(), local_names.clone(), None, Type::Integer);
    let mut lowerer = Lowerer::new(registry, field_index, globals, &scope, strings);
    lowerer.prologue(
        &[],
        &local_names.iter().map(|(_, t)| t.clone()).collect::<Vec<_>>(),
        false,
    );
    lowerer.lower_block(&decl.body)?;
    if lowerer.emit.block_isover {
        if lowerer.emit.terminated_bybr {
            lowerer.emit.emit("  unreachable");
        }
    } else {
        lowerer.emit.emit("  ret i32 0");
    }

    let body_text = lowerer.emit.buffer_str();
    let header = function_header(registry, "main", &sig, None);
    Ok(format!("define {} #2 {{\n{}}}", header, body_text))
}

fn function_header(registry: &TypeRegistry, label: &str, sig: &FunctionSig, class: Option<&str>) -> String {
    let mut params = Vec::new();
    if let Some(class) = class {
        let fragment = registry
            .ir_fragment(class)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("%class.{}", class));
        params.push(format!("{}* %0", fragment));
    }
    let offset = if class.is_some() { 1 } else { 0 };
    for (i, ty) in sig.params.iter().enumerate() {
        params.push(format!("{} %{}", registry.llvm_type_of(ty), i + offset));
    }
    format!(
        "{} @{}({})",
        registry.llvm_type_of(&sig.return_type),
        label,
        params.join(", ")
    )
}

/// If the body fell off the end without a terminator: a `void` function gets an
/// implicit `ret void`, anything else is the "doesn't return on all paths" error.
/// A block that ended via a break/continue placeholder rather than `ret` is closed
/// with an explicit `unreachable` instead, since the placeholder's own `br` already
/// terminates it but never resolves to a function-level return.
fn finalize_control_flow(
    lowerer: &mut Lowerer<'_>,
    return_type: &Type,
    name: &str,
    span: crate::location::Span,
) -> Result<(), CompileError> {
    if lowerer.emit.block_isover {
        if lowerer.emit.terminated_bybr {
            lowerer.emit.emit("  unreachable");
        }
        return Ok(());
    }
    if *return_type == Type::Void {
        lowerer.emit.emit("  ret void");
        return Ok(());
    }
    Err(CompileError::MissingReturn(
        MissingReturn {
            function: name.to_string(),
        },
        span,
    ))
}
