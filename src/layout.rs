//! The Layout Resolver: orders array and class declarations by structural dependency
//! (Kahn's algorithm) and emits the LLVM `%class.*` type declarations in that order.
//!
//! Arrays are never given a named LLVM type of their own — they resolve to an inline
//! anonymous `[N x <elem>]` fragment — but their *element* fragments must still be
//! resolved in dependency order before anything nests them, hence the same topological
//! treatment as classes.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{CompileError, StructuralCycle};
use crate::location::Span;
use crate::types::TypeRegistry;

/// The struct index of every field, keyed by class name then field name, including the
/// +1 offset a superclass prefix introduces.
pub type FieldIndex = HashMap<String, HashMap<String, usize>>;

pub struct LayoutResult {
    /// `%class.C = type { ... }` lines, in legal (dependency-first) emission order.
    pub class_type_lines: Vec<String>,
    pub field_index: FieldIndex,
    /// Class names in the same dependency-first order as `class_type_lines`, for
    /// callers (the driver) that need a deterministic class emission order too.
    pub class_order: Vec<String>,
}

pub fn resolve(registry: &mut TypeRegistry) -> Result<LayoutResult, CompileError> {
    let array_order = topo_order(
        registry.arrays().map(|a| a.name.clone()).collect(),
        |name| array_dependencies(registry, name),
        |a, b| format!("array '{}' is of type '{}'", a, b),
    )?;

    for name in &array_order {
        let decl = registry.array(name).unwrap().clone();
        let elem_fragment = primitive_or_registry_fragment(registry, &decl.element);
        let fragment = format!("[{} x {}]", decl.length, elem_fragment);
        registry.set_ir_fragment(name, fragment);
    }

    let class_order = topo_order(
        registry.classes().map(|c| c.name.clone()).collect(),
        |name| class_dependencies(registry, name),
        |a, b| format!("class '{}' extends or embeds '{}'", a, b),
    )?;

    let mut class_type_lines = Vec::new();
    let mut field_index: FieldIndex = HashMap::new();

    for name in &class_order {
        let decl = registry.class(name).unwrap().clone();
        let mut member_fragments = Vec::new();
        let mut indices = HashMap::new();
        let mut next_index = 0usize;

        if let Some(super_name) = &decl.superclass {
            let super_fragment = registry
                .ir_fragment(super_name)
                .expect("superclass emitted earlier by topological order")
                .to_string();
            member_fragments.push(super_fragment);
            next_index = 1;
        }

        if decl.fields.is_empty() && decl.superclass.is_none() {
            member_fragments.push("i8".to_string());
            next_index = 1;
        } else {
            for field in &decl.fields {
                let fragment = registry.llvm_type_of(&field.ty);
                member_fragments.push(fragment);
                indices.insert(field.name.clone(), next_index);
                next_index += 1;
            }
        }

        let class_fragment = format!("%class.{}", name);
        registry.set_ir_fragment(name, class_fragment.clone());
        class_type_lines.push(format!(
            "{} = type {{ {} }}",
            class_fragment,
            member_fragments.join(", ")
        ));
        field_index.insert(name.clone(), indices);
    }

    Ok(LayoutResult {
        class_type_lines,
        field_index,
        class_order,
    })
}

fn primitive_or_registry_fragment(registry: &TypeRegistry, name: &str) -> String {
    match name {
        "integer" => "i32".to_string(),
        "boolean" => "i8".to_string(),
        _ => registry
            .ir_fragment(name)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("%{}", name)),
    }
}

fn array_dependencies(registry: &TypeRegistry, name: &str) -> Vec<String> {
    let decl = match registry.array(name) {
        Some(d) => d,
        None => return vec![],
    };
    if registry.array(&decl.element).is_some() {
        vec![decl.element.clone()]
    } else {
        vec![]
    }
}

fn class_dependencies(registry: &TypeRegistry, name: &str) -> Vec<String> {
    let decl = match registry.class(name) {
        Some(d) => d,
        None => return vec![],
    };
    let mut deps = Vec::new();
    if let Some(sup) = &decl.superclass {
        deps.push(sup.clone());
    }
    for field in &decl.fields {
        if let crate::types::Type::Class { name } = &field.ty {
            deps.push(name.clone());
        }
    }
    deps
}

/// Kahn's algorithm over an explicit dependency function: `deps(v)` must be emitted
/// before `v`. Returns the nodes in legal emission order, or a [`CompileError`]
/// describing the cycle if one exists.
fn topo_order(
    nodes: Vec<String>,
    deps: impl Fn(&str) -> Vec<String>,
    describe_edge: impl Fn(&str, &str) -> String,
) -> Result<Vec<String>, CompileError> {
    let node_set: HashSet<&str> = nodes.iter().map(|s| s.as_str()).collect();
    let mut in_degree: HashMap<String, usize> = HashMap::new();
    let mut dependents: HashMap<String, Vec<String>> = HashMap::new();

    for n in &nodes {
        let d: Vec<String> = deps(n)
            .into_iter()
            .filter(|dep| node_set.contains(dep.as_str()))
            .collect();
        in_degree.insert(n.clone(), d.len());
        for dep in d {
            dependents.entry(dep).or_default().push(n.clone());
        }
    }

    // Deterministic order independent of hash-map iteration.
    let mut ready: Vec<String> = in_degree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(n, _)| n.clone())
        .collect();
    ready.sort();
    let mut queue: VecDeque<String> = ready.into();

    let mut order = Vec::new();
    while let Some(n) = queue.pop_front() {
        order.push(n.clone());
        if let Some(deps) = dependents.get(&n) {
            let mut newly_ready = Vec::new();
            for dependent in deps {
                let deg = in_degree.get_mut(dependent).unwrap();
                *deg -= 1;
                if *deg == 0 {
                    newly_ready.push(dependent.clone());
                }
            }
            newly_ready.sort();
            for r in newly_ready {
                queue.push_back(r);
            }
        }
    }

    if order.len() == nodes.len() {
        return Ok(order);
    }

    // A cycle remains among the unresolved vertices; report it with a single DFS.
    let remaining: HashSet<&str> = in_degree
        .iter()
        .filter(|(n, deg)| **deg > 0 && !order.contains(n))
        .map(|(n, _)| n.as_str())
        .collect();

    let start = *remaining.iter().min().expect("cycle implies nonempty remainder");
    let path = find_cycle_path(start, &deps, &remaining);
    let mut message_parts = Vec::new();
    for window in path.windows(2) {
        message_parts.push(describe_edge(window[0], window[1]));
    }
    Err(CompileError::StructuralCycle(
        StructuralCycle {
            path: path.into_iter().map(String::from).collect(),
        },
        Span::default(),
    ))
}

/// Pure DFS (no node mutation) that returns the cycle path starting at `start`, found
/// by walking dependency edges until a node repeats.
fn find_cycle_path<'a>(
    start: &'a str,
    deps: &impl Fn(&str) -> Vec<String>,
    remaining: &HashSet<&'a str>,
) -> Vec<&'a str> {
    let mut path = vec![start];
    let mut current = start;
    loop {
        let next = deps(current)
            .into_iter()
            .find(|d| remaining.contains(d.as_str()))
            .expect("remaining vertex must have an unresolved dependency");
        let next: &str = remaining.get(next.as_str()).copied().unwrap_or(start);
        if path.contains(&next) {
            path.push(next);
            break;
        }
        path.push(next);
        current = next;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArrayDecl, ClassDecl, ClassField, Type};
    use std::collections::HashMap as Map;

    #[test]
    fn test_simple_array_chain() {
        let mut reg = TypeRegistry::new();
        reg.register_array(ArrayDecl {
            name: "Inner".into(),
            length: 2,
            element: "integer".into(),
            span: Span::default(),
        })
        .unwrap();
        reg.register_array(ArrayDecl {
            name: "Outer".into(),
            length: 3,
            element: "Inner".into(),
            span: Span::default(),
        })
        .unwrap();

        let result = resolve(&mut reg).unwrap();
        assert!(result.class_type_lines.is_empty());
        assert_eq!(reg.ir_fragment("Inner"), Some("[2 x i32]"));
        assert_eq!(reg.ir_fragment("Outer"), Some("[3 x [2 x i32]]"));
    }

    #[test]
    fn test_array_cycle_detected() {
        let mut reg = TypeRegistry::new();
        reg.register_array(ArrayDecl {
            name: "A".into(),
            length: 2,
            element: "B".into(),
            span: Span::default(),
        })
        .unwrap();
        reg.register_array(ArrayDecl {
            name: "B".into(),
            length: 2,
            element: "A".into(),
            span: Span::default(),
        })
        .unwrap();

        assert!(matches!(
            resolve(&mut reg),
            Err(CompileError::StructuralCycle(_, _))
        ));
    }

    #[test]
    fn test_single_inheritance_layout() {
        let mut reg = TypeRegistry::new();
        reg.register_class(ClassDecl {
            name: "Base".into(),
            superclass: None,
            fields: vec![ClassField {
                ordinal: 0,
                name: "b".into(),
                ty: Type::Integer,
                span: Span::default(),
            }],
            methods: Map::new(),
            span: Span::default(),
        })
        .unwrap();
        reg.register_class(ClassDecl {
            name: "Derived".into(),
            superclass: Some("Base".into()),
            fields: vec![ClassField {
                ordinal: 0,
                name: "d".into(),
                ty: Type::Integer,
                span: Span::default(),
            }],
            methods: Map::new(),
            span: Span::default(),
        })
        .unwrap();

        let result = resolve(&mut reg).unwrap();
        assert_eq!(result.class_type_lines[0], "%class.Base = type { i32 }");
        assert_eq!(
            result.class_type_lines[1],
            "%class.Derived = type { %class.Base, i32 }"
        );
        assert_eq!(result.field_index["Derived"]["d"], 1);
    }

    #[test]
    fn test_empty_class_gets_placeholder_field() {
        let mut reg = TypeRegistry::new();
        reg.register_class(ClassDecl {
            name: "Empty".into(),
            superclass: None,
            fields: vec![],
            methods: Map::new(),
            span: Span::default(),
        })
        .unwrap();

        let result = resolve(&mut reg).unwrap();
        assert_eq!(result.class_type_lines[0], "%class.Empty = type { i8 }");
    }
}
