//! The compiler's error taxonomy.
//!
//! Every fatal condition is reported through [`CompileError`], a flat enum of sub-error
//! structs grouped by category (declaration, resolution, type, value, control-flow — see
//! the error handling design). Each variant pairs its payload with the [`Span`] at which
//! it was raised; the top-level [`fmt::Display`] always delegates to `span.to_string(..)`
//! so every message shares the same `<l>.<c>-<l>.<c> error: <msg>` shape.

use std::fmt;

use crate::location::Span;
use crate::types::Type;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    Redeclaration(Redeclaration, Span),
    UndeclaredType(UndeclaredType, Span),
    InvalidArrayLength(InvalidArrayLength, Span),
    FieldShadowing(FieldShadowing, Span),
    FieldMethodCollision(FieldMethodCollision, Span),
    StructuralCycle(StructuralCycle, Span),

    UnresolvedIdentifier(UnresolvedIdentifier, Span),
    UnknownMember(UnknownMember, Span),
    ThisOutsideMethod(Span),

    IncompatibleOperand(IncompatibleOperand, Span),
    TypeMismatch(TypeMismatch, Span),
    NotAnLvalue(Span),
    UnprintableType(UnprintableType, Span),

    DivisionByZero(Span),
    ConstantIndexOutOfRange(ConstantIndexOutOfRange, Span),

    BreakOutsideLoop(Span),
    ContinueOutsideLoop(Span),
    MissingReturn(MissingReturn, Span),
}

impl CompileError {
    pub fn span(&self) -> Span {
        use CompileError::*;
        match self {
            Redeclaration(_, s)
            | UndeclaredType(_, s)
            | InvalidArrayLength(_, s)
            | FieldShadowing(_, s)
            | FieldMethodCollision(_, s)
            | StructuralCycle(_, s)
            | UnresolvedIdentifier(_, s)
            | UnknownMember(_, s)
            | ThisOutsideMethod(s)
            | IncompatibleOperand(_, s)
            | TypeMismatch(_, s)
            | NotAnLvalue(s)
            | UnprintableType(_, s)
            | DivisionByZero(s)
            | ConstantIndexOutOfRange(_, s)
            | BreakOutsideLoop(s)
            | ContinueOutsideLoop(s)
            | MissingReturn(_, s) => *s,
        }
    }

    fn message(&self) -> String {
        use CompileError::*;
        match self {
            Redeclaration(e, _) => e.to_string(),
            UndeclaredType(e, _) => e.to_string(),
            InvalidArrayLength(e, _) => e.to_string(),
            FieldShadowing(e, _) => e.to_string(),
            FieldMethodCollision(e, _) => e.to_string(),
            StructuralCycle(e, _) => e.to_string(),
            UnresolvedIdentifier(e, _) => e.to_string(),
            UnknownMember(e, _) => e.to_string(),
            ThisOutsideMethod(_) => "'this' used outside of a method".to_string(),
            IncompatibleOperand(e, _) => e.to_string(),
            TypeMismatch(e, _) => e.to_string(),
            NotAnLvalue(_) => "assignment target is not an lvalue".to_string(),
            UnprintableType(e, _) => e.to_string(),
            DivisionByZero(_) => "division by zero".to_string(),
            ConstantIndexOutOfRange(e, _) => e.to_string(),
            BreakOutsideLoop(_) => "'break' used outside of a loop".to_string(),
            ContinueOutsideLoop(_) => "'continue' used outside of a loop".to_string(),
            MissingReturn(e, _) => e.to_string(),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.span().to_string(self.message()))
    }
}

impl std::error::Error for CompileError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redeclaration {
    pub name: String,
}

impl fmt::Display for Redeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is already declared", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndeclaredType {
    pub name: String,
}

impl fmt::Display for UndeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "undeclared type '{}'", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidArrayLength {
    pub array: String,
}

impl fmt::Display for InvalidArrayLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "array '{}' must have a positive, compile-time constant length",
            self.array
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldShadowing {
    pub class: String,
    pub field: String,
    pub ancestor: String,
}

impl fmt::Display for FieldShadowing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field '{}' of class '{}' shadows a field already declared in ancestor '{}'",
            self.field, self.class, self.ancestor
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMethodCollision {
    pub class: String,
    pub name: String,
}

impl fmt::Display for FieldMethodCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' in class '{}' is declared as both a field and a method",
            self.name, self.class
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralCycle {
    pub path: Vec<String>,
}

impl fmt::Display for StructuralCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "structural cycle detected: {}", self.path.join(" -> "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedIdentifier {
    pub name: String,
}

impl fmt::Display for UnresolvedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "variable '{}' is used before declared", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMember {
    pub ty: String,
    pub member: String,
}

impl fmt::Display for UnknownMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' has no member named '{}'", self.ty, self.member)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompatibleOperand {
    pub operator: String,
    pub operand: Type,
}

impl fmt::Display for IncompatibleOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "operator '{}' cannot be applied to type '{}'",
            self.operator, self.operand
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    pub expected: Type,
    pub found: Type,
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected type '{}', found '{}'",
            self.expected, self.found
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnprintableType {
    pub ty: Type,
}

impl fmt::Display for UnprintableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot print a value of type '{}'", self.ty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantIndexOutOfRange {
    pub index: i64,
    pub length: u32,
}

impl fmt::Display for ConstantIndexOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "constant index {} is out of range for array of length {}",
            self.index, self.length
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingReturn {
    pub function: String,
}

impl fmt::Display for MissingReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "function '{}' does not return on all control paths",
            self.function
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let err = CompileError::DivisionByZero(Span::new(2, 3, 2, 8));
        assert_eq!(err.to_string(), "2.3-2.8 error: division by zero");
    }

    #[test]
    fn test_unresolved_identifier_message() {
        let err = CompileError::UnresolvedIdentifier(
            UnresolvedIdentifier { name: "x".into() },
            Span::default(),
        );
        assert!(err.to_string().contains("variable 'x' is used before declared"));
    }
}
