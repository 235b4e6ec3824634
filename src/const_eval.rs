//! Constant folding over pure integer/boolean expression subtrees.
//!
//! Used to validate array-length declarations, to short-circuit constant conditions
//! in `if`/`while`/`repeat`, and to reject a constant division/modulus by zero at
//! compile time rather than let it reach codegen.

use crate::ast::{BinaryOperator, Expr};
use crate::error::CompileError;
use crate::location::Span;

/// The value a constant subtree folds to. Booleans and integers share the same
/// arithmetic during folding (booleans coerce to 0/1) because the source language's
/// int/bool implicit-conversion rule applies here too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstValue {
    Int(i64),
    Bool(bool),
}

impl ConstValue {
    fn as_int(self) -> i64 {
        match self {
            ConstValue::Int(i) => i,
            ConstValue::Bool(b) => b as i64,
        }
    }
}

/// Attempts to fold `expr` to a constant. Returns `Ok(None)` if the subtree contains
/// an identifier, call, access, or `this` — anything that can only be known at
/// runtime — rather than treating that as an error. Returns `Err` only for folding
/// failures that are themselves fatal (constant division/modulus by zero).
pub fn eval(expr: &Expr) -> Result<Option<ConstValue>, CompileError> {
    match expr {
        Expr::IntLiteral { value, .. } => Ok(Some(ConstValue::Int(*value))),
        Expr::BoolLiteral { value, .. } => Ok(Some(ConstValue::Bool(*value))),
        Expr::StringLiteral { .. }
        | Expr::This { .. }
        | Expr::Ident { .. }
        | Expr::FieldAccess { .. }
        | Expr::Index { .. }
        | Expr::Call { .. }
        | Expr::Assign { .. } => Ok(None),
        Expr::Binary {
            op,
            left,
            right,
            span,
        } => eval_binary(*op, left, right, *span),
    }
}

fn eval_binary(
    op: BinaryOperator,
    left: &Expr,
    right: &Expr,
    span: Span,
) -> Result<Option<ConstValue>, CompileError> {
    let (Some(l), Some(r)) = (eval(left)?, eval(right)?) else {
        return Ok(None);
    };

    use BinaryOperator::*;
    let value = match op {
        Or => ConstValue::Bool(truthy(l) || truthy(r)),
        And => ConstValue::Bool(truthy(l) && truthy(r)),
        BitOr => ConstValue::Int(l.as_int() | r.as_int()),
        BitXor => ConstValue::Int(l.as_int() ^ r.as_int()),
        BitAnd => ConstValue::Int(l.as_int() & r.as_int()),
        Shl => ConstValue::Int(l.as_int() << r.as_int()),
        Shr => ConstValue::Int(l.as_int() >> r.as_int()),
        Add => ConstValue::Int(l.as_int() + r.as_int()),
        Sub => ConstValue::Int(l.as_int() - r.as_int()),
        Mul => ConstValue::Int(l.as_int() * r.as_int()),
        Div => {
            if r.as_int() == 0 {
                return Err(CompileError::DivisionByZero(span));
            }
            ConstValue::Int(l.as_int() / r.as_int())
        }
        Rem => {
            if r.as_int() == 0 {
                return Err(CompileError::DivisionByZero(span));
            }
            ConstValue::Int(l.as_int() % r.as_int())
        }
        Eq => ConstValue::Bool(l.as_int() == r.as_int()),
        Ne => ConstValue::Bool(l.as_int() != r.as_int()),
        Le => ConstValue::Bool(l.as_int() <= r.as_int()),
        Ge => ConstValue::Bool(l.as_int() >= r.as_int()),
        Lt => ConstValue::Bool(l.as_int() < r.as_int()),
        Gt => ConstValue::Bool(l.as_int() > r.as_int()),
    };

    Ok(Some(value))
}

fn truthy(v: ConstValue) -> bool {
    v.as_int() != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i64) -> Expr {
        Expr::IntLiteral {
            value: v,
            span: Span::default(),
        }
    }

    fn binary(op: BinaryOperator, l: Expr, r: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(l),
            right: Box::new(r),
            span: Span::default(),
        }
    }

    #[test]
    fn test_folds_addition() {
        let expr = binary(BinaryOperator::Add, int(40), int(2));
        assert_eq!(eval(&expr).unwrap(), Some(ConstValue::Int(42)));
    }

    #[test]
    fn test_identifier_is_not_constant() {
        let expr = Expr::Ident {
            name: "x".into(),
            span: Span::default(),
        };
        assert_eq!(eval(&expr).unwrap(), None);
    }

    #[test]
    fn test_division_by_zero_is_fatal() {
        let expr = binary(BinaryOperator::Div, int(1), int(0));
        assert!(matches!(eval(&expr), Err(CompileError::DivisionByZero(_))));
    }

    #[test]
    fn test_mixed_with_nonconstant_operand_is_not_constant() {
        let expr = binary(
            BinaryOperator::Add,
            int(1),
            Expr::Ident {
                name: "x".into(),
                span: Span::default(),
            },
        );
        assert_eq!(eval(&expr).unwrap(), None);
    }
}
