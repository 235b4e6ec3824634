//! The Symbol Resolver: resolves every identifier in expression position to exactly
//! one of a parameter slot, a function local, a current-class field (walking the
//! inheritance chain outward), or — in call position only — a global function.

use std::collections::HashMap;

use crate::error::{CompileError, UnknownMember, UnresolvedIdentifier};
use crate::location::Span;
use crate::types::{FunctionSig, Type, TypeRegistry};

/// What a bare identifier in expression position resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameResolution {
    Parameter { ordinal: usize, ty: Type },
    Local { ordinal: usize, ty: Type },
    /// Resolved to a field of the current class (or one of its ancestors).
    /// `steps_up` is how many superclass-prefix `getelementptr`s must be walked
    /// before indexing the field itself: 0 if the field is declared on the current
    /// class, 1 if on its immediate superclass, and so on.
    Field {
        owner_class: String,
        steps_up: usize,
        ty: Type,
    },
}

/// The lexical scope of a single function or method body: its parameters, its locals,
/// and — for methods — the class it belongs to. Immutable once built; this is the
/// "per-function scope information" half of the context split called for by the
/// propagation-via-mutable-struct redesign.
#[derive(Debug, Clone)]
pub struct FunctionScope {
    parameters: HashMap<String, (usize, Type)>,
    locals: HashMap<String, (usize, Type)>,
    pub class: Option<String>,
    pub return_type: Type,
}

impl FunctionScope {
    pub fn new(
        parameters: Vec<(String, Type)>,
        locals: Vec<(String, Type)>,
        class: Option<String>,
        return_type: Type,
    ) -> Self {
        let parameters = parameters
            .into_iter()
            .enumerate()
            .map(|(i, (name, ty))| (name, (i, ty)))
            .collect();
        let locals = locals
            .into_iter()
            .enumerate()
            .map(|(i, (name, ty))| (name, (i, ty)))
            .collect();
        Self {
            parameters,
            locals,
            class,
            return_type,
        }
    }

    pub fn parameter(&self, name: &str) -> Option<(usize, &Type)> {
        self.parameters.get(name).map(|(i, t)| (*i, t))
    }

    pub fn local(&self, name: &str) -> Option<(usize, &Type)> {
        self.locals.get(name).map(|(i, t)| (*i, t))
    }

    /// Resolves `name` using the fixed priority: parameter, local, current-class field
    /// (walking the superclass chain outward). Returns the "used before declared"
    /// error on complete failure.
    pub fn resolve(
        &self,
        name: &str,
        registry: &TypeRegistry,
        span: Span,
    ) -> Result<NameResolution, CompileError> {
        if let Some((ordinal, ty)) = self.parameter(name) {
            return Ok(NameResolution::Parameter {
                ordinal,
                ty: ty.clone(),
            });
        }
        if let Some((ordinal, ty)) = self.local(name) {
            return Ok(NameResolution::Local {
                ordinal,
                ty: ty.clone(),
            });
        }
        if let Some(class) = &self.class {
            if let Some((owner_class, steps_up, ty)) = resolve_field(class, name, registry) {
                return Ok(NameResolution::Field {
                    owner_class,
                    steps_up,
                    ty,
                });
            }
        }
        Err(CompileError::UnresolvedIdentifier(
            UnresolvedIdentifier {
                name: name.to_string(),
            },
            span,
        ))
    }
}

/// Field access `E.f` where `E` resolved to class `class`: search `class`'s own
/// members first, then its superclass chain outward. Shared by `this`-implicit field
/// lookups inside a method and by explicit `a.b` field access on any receiver.
pub fn resolve_field(
    class: &str,
    field: &str,
    registry: &TypeRegistry,
) -> Option<(String, usize, Type)> {
    for (steps_up, ancestor) in registry.ancestry(class).into_iter().enumerate() {
        if let Some(decl) = registry.class(ancestor) {
            if let Some(f) = decl.fields.iter().find(|f| f.name == field) {
                return Some((ancestor.to_string(), steps_up, f.ty.clone()));
            }
        }
    }
    None
}

/// Method access `E.m`: identical search, returning the method's signature and which
/// ancestor declares it instead of a field type.
pub fn resolve_method(
    class: &str,
    method: &str,
    registry: &TypeRegistry,
) -> Option<(String, FunctionSig)> {
    for ancestor in registry.ancestry(class) {
        if let Some(decl) = registry.class(ancestor) {
            if let Some(sig) = decl.methods.get(method) {
                return Some((ancestor.to_string(), sig.clone()));
            }
        }
    }
    None
}

pub fn member_not_found(ty: &Type, member: &str, span: Span) -> CompileError {
    CompileError::UnknownMember(
        UnknownMember {
            ty: ty.to_string(),
            member: member.to_string(),
        },
        span,
    )
}

/// The program-wide table of free function signatures. Global function names are only
/// resolved here when an identifier appears in call position; a bare identifier never
/// resolves to a function.
#[derive(Default)]
pub struct GlobalFunctionTable {
    functions: HashMap<String, FunctionSig>,
}

impl GlobalFunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: String, sig: FunctionSig) -> Result<(), CompileError> {
        if self.functions.contains_key(&name) {
            return Err(CompileError::Redeclaration(
                crate::error::Redeclaration { name },
                Span::default(),
            ));
        }
        self.functions.insert(name, sig);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSig> {
        self.functions.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClassDecl, ClassField};
    use std::collections::HashMap as Map;

    fn registry_with_inheritance() -> TypeRegistry {
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
        reg
    }

    #[test]
    fn test_parameter_priority() {
        let scope = FunctionScope::new(
            vec![("x".into(), Type::Integer)],
            vec![("x".into(), Type::Boolean)],
            None,
            Type::Void,
        );
        let reg = TypeRegistry::new();
        let resolved = scope.resolve("x", &reg, Span::default()).unwrap();
        assert_eq!(
            resolved,
            NameResolution::Parameter {
                ordinal: 0,
                ty: Type::Integer
            }
        );
    }

    #[test]
    fn test_field_resolution_walks_superclass() {
        let reg = registry_with_inheritance();
        let scope = FunctionScope::new(vec![], vec![], Some("Derived".into()), Type::Void);

        let resolved = scope.resolve("b", &reg, Span::default()).unwrap();
        assert_eq!(
            resolved,
            NameResolution::Field {
                owner_class: "Base".into(),
                steps_up: 1,
                ty: Type::Integer
            }
        );
    }

    #[test]
    fn test_unresolved_identifier_errors() {
        let scope = FunctionScope::new(vec![], vec![], None, Type::Void);
        let reg = TypeRegistry::new();
        assert!(scope.resolve("ghost", &reg, Span::default()).is_err());
    }
}
