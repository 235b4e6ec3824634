//! The Expression Lowerer: walks an expression tree producing LLVM IR plus a
//! [`ResultDescriptor`], implementing the operator table, implicit int/bool
//! conversions, method dispatch, and field/array access (including upcasts through
//! superclass prefixes).

use crate::ast::{BinaryOperator, Expr};
use crate::const_eval::{self, ConstValue};
use crate::error::{CompileError, IncompatibleOperand, TypeMismatch};
use crate::location::Span;
use crate::symbols::{resolve_field, resolve_method, NameResolution};
use crate::types::Type;

use super::{Lowerer, ResultDescriptor};

impl<'a> Lowerer<'a> {
    /// Top-level recursive entry point. Leaf expressions (literals, identifiers,
    /// `this`) are returned as [`ResultDescriptor::Simple`] without emitting anything;
    /// everything else is fully lowered.
    pub fn lower_expr(&mut self, expr: &Expr) -> Result<ResultDescriptor, CompileError> {
        match expr {
            Expr::IntLiteral { .. }
            | Expr::BoolLiteral { .. }
            | Expr::StringLiteral { .. }
            | Expr::This { .. }
            | Expr::Ident { .. } => Ok(ResultDescriptor::Simple(expr.clone())),

            Expr::Binary { .. } => self.lower_binary(expr),
            Expr::Assign { lhs, rhs, span } => self.lower_assign(lhs, rhs, *span),
            Expr::FieldAccess { base, field, span } => self.lower_field_access(base, field, *span),
            Expr::Index { base, index, span } => self.lower_index(base, index, *span),
            Expr::Call { callee, args, span } => self.lower_call(callee, args, *span),
        }
    }

    /// Collapses a [`ResultDescriptor`] into an operand: the LLVM text to use directly
    /// (a literal, or a `%N` register reference) and its type. Loads through a pointer
    /// if necessary; resolves a still-`Simple` identifier/`this` to its storage slot.
    pub fn operand(&mut self, desc: ResultDescriptor, span: Span) -> Result<(String, Type), CompileError> {
        match desc {
            ResultDescriptor::Simple(expr) => match expr {
                Expr::IntLiteral { value, .. } => Ok((value.to_string(), Type::Integer)),
                Expr::BoolLiteral { value, .. } => {
                    Ok((if value { "1" } else { "0" }.to_string(), Type::Boolean))
                }
                Expr::Ident { name, .. } => {
                    let (ssa, ty, _) = self.resolve_slot(&name, span)?;
                    let reg = format!("%{}", self.load(ssa, &ty));
                    Ok((reg, ty))
                }
                Expr::This { .. } => {
                    let class = self
                        .scope
                        .class
                        .clone()
                        .ok_or(CompileError::ThisOutsideMethod(span))?;
                    let this_ssa = self.this_ssa().ok_or(CompileError::ThisOutsideMethod(span))?;
                    Ok((format!("%{}", this_ssa), Type::Class { name: class }))
                }
                other => Err(CompileError::IncompatibleOperand(
                    IncompatibleOperand {
                        operator: "use".into(),
                        operand: Type::Void,
                    },
                    other.span(),
                )),
            },
            ResultDescriptor::Pointer { ssa, ty, .. } => {
                let loaded = self.load(ssa, &ty);
                Ok((format!("%{}", loaded), ty))
            }
            ResultDescriptor::Value { ssa, ty } => Ok((format!("%{}", ssa), ty)),
            ResultDescriptor::Function { .. } => Err(CompileError::IncompatibleOperand(
                IncompatibleOperand {
                    operator: "use".into(),
                    operand: Type::Void,
                },
                span,
            )),
            ResultDescriptor::None => Err(CompileError::IncompatibleOperand(
                IncompatibleOperand {
                    operator: "use".into(),
                    operand: Type::Void,
                },
                span,
            )),
        }
    }

    fn load(&mut self, ptr_ssa: u32, ty: &Type) -> u32 {
        let llvm_ty = self.registry.llvm_type_of(ty);
        let dest = self.emit.next_ssa();
        self.emit.emit(&format!(
            "  %{} = load {}, {}* %{}, align 4",
            dest, llvm_ty, llvm_ty, ptr_ssa
        ));
        dest
    }

    /// Resolves a bare identifier to `(pointer-ssa, type, is_lvalue)` through the fixed
    /// parameter/local/field priority chain.
    pub fn resolve_slot(&mut self, name: &str, span: Span) -> Result<(u32, Type, bool), CompileError> {
        match self.scope.resolve(name, self.registry, span)? {
            NameResolution::Parameter { ordinal, ty } => Ok((self.param_slot(ordinal), ty, true)),
            NameResolution::Local { ordinal, ty } => Ok((self.local_slot(ordinal), ty, true)),
            NameResolution::Field {
                owner_class,
                steps_up,
                ty,
            } => {
                let this_class = self
                    .scope
                    .class
                    .clone()
                    .ok_or(CompileError::ThisOutsideMethod(span))?;
                let this_ssa = self.this_ssa().ok_or(CompileError::ThisOutsideMethod(span))?;
                let ptr =
                    self.gep_field_named(this_ssa, &this_class, &owner_class, steps_up, name, span)?;
                Ok((ptr, ty, true))
            }
        }
    }

    fn this_ssa(&self) -> Option<u32> {
        self.this_slot
    }

    fn param_slot(&self, ordinal: usize) -> u32 {
        self.param_slots[ordinal]
    }

    pub(super) fn local_slot(&self, ordinal: usize) -> u32 {
        self.local_slots[ordinal]
    }

    fn lower_binary(&mut self, expr: &Expr) -> Result<ResultDescriptor, CompileError> {
        let Expr::Binary {
            op,
            left,
            right,
            span,
        } = expr
        else {
            unreachable!()
        };

        if let Some(folded) = const_eval::eval(expr)? {
            return Ok(ResultDescriptor::Simple(const_literal(folded, *span)));
        }

        use BinaryOperator::*;
        if matches!(op, Or | And) {
            return self.lower_short_circuit(*op, left, right, *span);
        }

        if matches!(op, Div | Rem) {
            if let Some(ConstValue::Int(0)) = const_eval::eval(right)? {
                return Err(CompileError::DivisionByZero(*span));
            }
        }

        let left_desc = self.lower_expr(left)?;
        let (left_text, left_ty) = self.operand(left_desc, *span)?;
        let right_desc = self.lower_expr(right)?;
        let (right_text, right_ty) = self.operand(right_desc, *span)?;

        let (left_text, right_text, operand_ty) =
            self.unify_int_bool(&left_text, &left_ty, &right_text, &right_ty, *span)?;

        let result_is_bool = matches!(
            op,
            Eq | Ne | Le | Ge | Lt | Gt
        );
        let llvm_ty = self.registry.llvm_type_of(&operand_ty);

        let mnemonic = match op {
            BitOr => "or",
            BitXor => "xor",
            BitAnd => "and",
            Shl => "shl",
            Shr => "ashr",
            Add => "add nsw",
            Sub => "sub nsw",
            Mul => "mul nsw",
            Div => "sdiv",
            Rem => "srem",
            Eq | Ne | Le | Ge | Lt | Gt => "icmp",
            Or | And => unreachable!("handled above"),
        };

        let dest = self.emit.next_ssa();
        if mnemonic == "icmp" {
            let predicate = match op {
                Eq => "eq",
                Ne => "ne",
                Le => "sle",
                Ge => "sge",
                Lt => "slt",
                Gt => "sgt",
                _ => unreachable!(),
            };
            self.emit.emit(&format!(
                "  %{} = icmp {} {} {}, {}",
                dest, predicate, llvm_ty, left_text, right_text
            ));
            let widened = self.emit.next_ssa();
            self.emit
                .emit(&format!("  %{} = zext i1 %{} to i8", widened, dest));
            return Ok(ResultDescriptor::Value {
                ssa: widened,
                ty: Type::Boolean,
            });
        }

        self.emit.emit(&format!(
            "  %{} = {} {} {}, {}",
            dest, mnemonic, llvm_ty, left_text, right_text
        ));

        let result_ty = if result_is_bool {
            Type::Boolean
        } else {
            operand_ty
        };
        Ok(ResultDescriptor::Value {
            ssa: dest,
            ty: result_ty,
        })
    }

    /// `I -> B`: `icmp ne i32 %v, 0` then `zext i1 -> i8`. `B -> I`: `zext i8 -> i32`.
    /// Returns the (possibly converted) operand texts and the common type they now share.
    fn unify_int_bool(
        &mut self,
        left_text: &str,
        left_ty: &Type,
        right_text: &str,
        right_ty: &Type,
        span: Span,
    ) -> Result<(String, String, Type), CompileError> {
        if left_ty == right_ty {
            if !matches!(left_ty, Type::Integer | Type::Boolean) {
                return Err(CompileError::IncompatibleOperand(
                    IncompatibleOperand {
                        operator: "binary".into(),
                        operand: left_ty.clone(),
                    },
                    span,
                ));
            }
            return Ok((left_text.to_string(), right_text.to_string(), left_ty.clone()));
        }

        match (left_ty, right_ty) {
            (Type::Integer, Type::Boolean) => {
                let converted = self.convert_bool_to_int(right_text);
                Ok((left_text.to_string(), converted, Type::Integer))
            }
            (Type::Boolean, Type::Integer) => {
                let converted = self.convert_bool_to_int(left_text);
                Ok((converted, right_text.to_string(), Type::Integer))
            }
            _ => Err(CompileError::TypeMismatch(
                TypeMismatch {
                    expected: left_ty.clone(),
                    found: right_ty.clone(),
                },
                span,
            )),
        }
    }

    fn convert_bool_to_int(&mut self, value: &str) -> String {
        let dest = self.emit.next_ssa();
        self.emit
            .emit(&format!("  %{} = zext i8 {} to i32", dest, value));
        format!("%{}", dest)
    }

    fn convert_int_to_bool(&mut self, value: &str) -> String {
        let cmp = self.emit.next_ssa();
        self.emit
            .emit(&format!("  %{} = icmp ne i32 {}, 0", cmp, value));
        let widened = self.emit.next_ssa();
        self.emit
            .emit(&format!("  %{} = zext i1 %{} to i8", widened, cmp));
        format!("%{}", widened)
    }

    fn lower_short_circuit(
        &mut self,
        op: BinaryOperator,
        left: &Expr,
        right: &Expr,
        span: Span,
    ) -> Result<ResultDescriptor, CompileError> {
        if let Some(folded) = const_eval::eval(left)? {
            let truthy = matches!(folded, ConstValue::Bool(true))
                || matches!(folded, ConstValue::Int(v) if v != 0);
            return if (op == BinaryOperator::Or) == truthy {
                Ok(ResultDescriptor::Simple(const_literal(
                    ConstValue::Bool(truthy == (op == BinaryOperator::Or)),
                    span,
                )))
            } else {
                self.lower_expr(right)
            };
        }

        let left_desc = self.lower_expr(left)?;
        let (left_text, left_ty) = self.operand(left_desc, span)?;
        let left_bool = self.ensure_bool(&left_text, &left_ty);

        let right_block = self.emit.new_block();
        let join_block = self.emit.new_block();
        let entry_block = self.emit.current_block;

        let short_circuit_value = if op == BinaryOperator::Or { "1" } else { "0" };
        let (then_label, else_label) = if op == BinaryOperator::Or {
            (join_block, right_block)
        } else {
            (right_block, join_block)
        };
        self.emit.emit(&format!(
            "  br i1 %{}, label %{}, label %{}",
            self.truncate_to_i1(&left_bool),
            then_label,
            else_label
        ));

        self.emit.emit(&format!("{}:", right_block));
        self.emit.current_block = right_block;
        let right_desc = self.lower_expr(right)?;
        let (right_text, right_ty) = self.operand(right_desc, span)?;
        let right_bool = self.ensure_bool(&right_text, &right_ty);
        let right_exit_block = self.emit.current_block;
        self.emit.emit(&format!("  br label %{}", join_block));

        self.emit
            .emit(&format!("{}: ; preds = %{}, %{}", join_block, entry_block, right_exit_block));
        self.emit.current_block = join_block;
        let phi = self.emit.next_ssa();
        self.emit.emit(&format!(
            "  %{} = phi i8 [ {}, %{} ], [ {}, %{} ]",
            phi, short_circuit_value, entry_block, right_bool, right_exit_block
        ));

        Ok(ResultDescriptor::Value {
            ssa: phi,
            ty: Type::Boolean,
        })
    }

    pub(super) fn ensure_bool(&mut self, text: &str, ty: &Type) -> String {
        match ty {
            Type::Boolean => text.to_string(),
            Type::Integer => self.convert_int_to_bool(text),
            _ => text.to_string(),
        }
    }

    pub(super) fn truncate_to_i1(&mut self, i8_value: &str) -> u32 {
        let dest = self.emit.next_ssa();
        self.emit
            .emit(&format!("  %{} = icmp ne i8 {}, 0", dest, i8_value));
        dest
    }

    fn lower_assign(
        &mut self,
        lhs: &Expr,
        rhs: &Expr,
        span: Span,
    ) -> Result<ResultDescriptor, CompileError> {
        if matches!(lhs, Expr::This { .. } | Expr::StringLiteral { .. }) {
            return Err(CompileError::NotAnLvalue(span));
        }

        let lhs_desc = self.lower_expr(lhs)?;
        let (ptr_ssa, ptr_ty, is_lvalue) = match lhs_desc {
            ResultDescriptor::Simple(Expr::Ident { name, .. }) => self.resolve_slot(&name, span)?,
            ResultDescriptor::Pointer { ssa, ty, is_lvalue } => (ssa, ty, is_lvalue),
            _ => return Err(CompileError::NotAnLvalue(span)),
        };
        if !is_lvalue {
            return Err(CompileError::NotAnLvalue(span));
        }

        let rhs_desc = self.lower_expr(rhs)?;
        let (rhs_text, rhs_ty) = self.operand(rhs_desc, span)?;
        let converted = self.convert_to(&rhs_text, &rhs_ty, &ptr_ty, span)?;

        let llvm_ty = self.registry.llvm_type_of(&ptr_ty);
        self.emit.emit(&format!(
            "  store {} {}, {}* %{}, align 4",
            llvm_ty, converted, llvm_ty, ptr_ssa
        ));

        Ok(ResultDescriptor::Value {
            ssa: ptr_ssa,
            ty: ptr_ty,
        })
    }

    /// Converts `value` (of `from`) to `to` when they differ only by int/bool;
    /// errors for any other mismatch.
    pub fn convert_to(
        &mut self,
        value: &str,
        from: &Type,
        to: &Type,
        span: Span,
    ) -> Result<String, CompileError> {
        if from == to {
            return Ok(value.to_string());
        }
        match (from, to) {
            (Type::Boolean, Type::Integer) => Ok(self.convert_bool_to_int(value)),
            (Type::Integer, Type::Boolean) => Ok(self.convert_int_to_bool(value)),
            _ => Err(CompileError::TypeMismatch(
                TypeMismatch {
                    expected: to.clone(),
                    found: from.clone(),
                },
                span,
            )),
        }
    }

    fn lower_field_access(
        &mut self,
        base: &Expr,
        field: &str,
        span: Span,
    ) -> Result<ResultDescriptor, CompileError> {
        let (base_ssa, base_class) = self.lower_receiver(base, span)?;

        if let Some((owner, steps_up, ty)) = resolve_field(&base_class, field, self.registry) {
            let ptr = self.gep_field_named(base_ssa, &base_class, &owner, steps_up, field, span)?;
            return Ok(ResultDescriptor::Pointer {
                ssa: ptr,
                ty,
                is_lvalue: true,
            });
        }
        if let Some((owner, sig)) = resolve_method(&base_class, field, self.registry) {
            return Ok(ResultDescriptor::Function {
                class: Some(base_class),
                this_ssa: Some(base_ssa),
                owner,
                name: field.to_string(),
                sig,
            });
        }
        Err(crate::symbols::member_not_found(
            &Type::Class { name: base_class },
            field,
            span,
        ))
    }

    /// Lowers `base` to a pointer-to-class value, returning that pointer's SSA id and
    /// the class it points to (needed by both field access and method calls).
    fn lower_receiver(&mut self, base: &Expr, span: Span) -> Result<(u32, String), CompileError> {
        match base {
            Expr::This { .. } => {
                let class = self
                    .scope
                    .class
                    .clone()
                    .ok_or(CompileError::ThisOutsideMethod(span))?;
                let ssa = self.this_ssa().ok_or(CompileError::ThisOutsideMethod(span))?;
                Ok((ssa, class))
            }
            _ => {
                let desc = self.lower_expr(base)?;
                match desc {
                    ResultDescriptor::Simple(Expr::Ident { name, .. }) => {
                        let (ssa, ty, _) = self.resolve_slot(&name, span)?;
                        match ty {
                            Type::Class { name } => Ok((ssa, name)),
                            other => Err(CompileError::IncompatibleOperand(
                                IncompatibleOperand {
                                    operator: ".".into(),
                                    operand: other,
                                },
                                span,
                            )),
                        }
                    }
                    ResultDescriptor::Pointer { ssa, ty, .. } => match ty {
                        Type::Class { name } => Ok((ssa, name)),
                        other => Err(CompileError::IncompatibleOperand(
                            IncompatibleOperand {
                                operator: ".".into(),
                                operand: other,
                            },
                            span,
                        )),
                    },
                    _ => Err(CompileError::IncompatibleOperand(
                        IncompatibleOperand {
                            operator: ".".into(),
                            operand: Type::Void,
                        },
                        span,
                    )),
                }
            }
        }
    }

    /// `base` is a pointer to `base_class`; `owner_class` is the ancestor (found via
    /// `steps_up` superclass-prefix steps from `base_class`) that actually declares
    /// `field`.
    fn gep_field_named(
        &mut self,
        base: u32,
        base_class: &str,
        owner_class: &str,
        steps_up: usize,
        field: &str,
        span: Span,
    ) -> Result<u32, CompileError> {
        let mut indices = vec!["i32 0".to_string()];
        for _ in 0..steps_up {
            indices.push("i32 0".to_string());
        }
        let field_ordinal = *self
            .field_index
            .get(owner_class)
            .and_then(|fields| fields.get(field))
            .ok_or(crate::symbols::member_not_found(
                &Type::Class {
                    name: owner_class.to_string(),
                },
                field,
                span,
            ))?;
        indices.push(format!("i32 {}", field_ordinal));

        let pointee_fragment = self
            .registry
            .ir_fragment(base_class)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("%class.{}", base_class));

        let dest = self.emit.next_ssa();
        self.emit.emit(&format!(
            "  %{} = getelementptr inbounds {}, {}* %{}, {}",
            dest,
            pointee_fragment,
            pointee_fragment,
            base,
            indices.join(", ")
        ));
        Ok(dest)
    }

    fn lower_index(
        &mut self,
        base: &Expr,
        index: &Expr,
        span: Span,
    ) -> Result<ResultDescriptor, CompileError> {
        let Expr::Ident { name, .. } = base else {
            return Err(CompileError::IncompatibleOperand(
                IncompatibleOperand {
                    operator: "[]".into(),
                    operand: Type::Void,
                },
                span,
            ));
        };
        let (base_ssa, base_ty, _) = self.resolve_slot(name, span)?;
        let Type::Array { length, element } = &base_ty else {
            return Err(CompileError::IncompatibleOperand(
                IncompatibleOperand {
                    operator: "[]".into(),
                    operand: base_ty,
                },
                span,
            ));
        };

        if let Some(ConstValue::Int(i)) = const_eval::eval(index)? {
            if i < 0 || i as u64 >= *length as u64 {
                return Err(CompileError::ConstantIndexOutOfRange(
                    crate::error::ConstantIndexOutOfRange {
                        index: i,
                        length: *length,
                    },
                    span,
                ));
            }
        }

        let index_desc = self.lower_expr(index)?;
        let (index_text, _) = self.operand(index_desc, span)?;

        let element_ty = self.registry.resolve(element, span).unwrap_or(Type::Integer);
        let array_fragment = format!("[{} x {}]", length, self.registry.llvm_type_of(&element_ty));

        let dest = self.emit.next_ssa();
        self.emit.emit(&format!(
            "  %{} = getelementptr inbounds {}, {}* %{}, i32 0, i32 {}",
            dest, array_fragment, array_fragment, base_ssa, index_text
        ));

        Ok(ResultDescriptor::Pointer {
            ssa: dest,
            ty: element_ty,
            is_lvalue: true,
        })
    }

    fn lower_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        span: Span,
    ) -> Result<ResultDescriptor, CompileError> {
        let (fn_label, this_arg, sig) = match callee {
            Expr::Ident { name, .. } => {
                let sig = self
                    .globals
                    .get(name)
                    .cloned()
                    .ok_or(CompileError::UnresolvedIdentifier(
                        crate::error::UnresolvedIdentifier { name: name.clone() },
                        span,
                    ))?;
                let label = if name == "main" {
                    "@...main".to_string()
                } else {
                    format!("@{}", name)
                };
                (label, None, sig)
            }
            Expr::FieldAccess { base, field, .. } => {
                let (base_ssa, base_class) = self.lower_receiver(base, span)?;
                let (owner, sig) = resolve_method(&base_class, field, self.registry).ok_or(
                    crate::symbols::member_not_found(
                        &Type::Class { name: base_class.clone() },
                        field,
                        span,
                    ),
                )?;
                (
                    format!("@class.{}.{}", owner, field),
                    Some((base_ssa, base_class)),
                    sig,
                )
            }
            _ => {
                return Err(CompileError::IncompatibleOperand(
                    IncompatibleOperand {
                        operator: "call".into(),
                        operand: Type::Void,
                    },
                    span,
                ))
            }
        };

        if args.len() != sig.params.len() {
            return Err(CompileError::TypeMismatch(
                TypeMismatch {
                    expected: sig.return_type.clone(),
                    found: sig.return_type.clone(),
                },
                span,
            ));
        }

        let mut arg_texts = Vec::new();
        if let Some((this_ssa, receiver_class)) = this_arg {
            let fragment = self
                .registry
                .ir_fragment(&receiver_class)
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("%class.{}", receiver_class));
            arg_texts.push(format!("{}* %{}", fragment, this_ssa));
        }
        for (arg, expected_ty) in args.iter().zip(sig.params.iter()) {
            let desc = self.lower_expr(arg)?;
            let (text, ty) = self.operand(desc, span)?;
            let converted = self.convert_to(&text, &ty, expected_ty, span)?;
            let llvm_ty = self.registry.llvm_type_of(expected_ty);
            arg_texts.push(format!("{} {}", llvm_ty, converted));
        }

        let return_llvm_ty = self.registry.llvm_type_of(&sig.return_type);
        if matches!(sig.return_type, Type::Void) {
            self.emit.emit(&format!(
                "  call void {}({})",
                fn_label,
                arg_texts.join(", ")
            ));
            return Ok(ResultDescriptor::None);
        }

        let dest = self.emit.next_ssa();
        self.emit.emit(&format!(
            "  %{} = call {} {}({})",
            dest,
            return_llvm_ty,
            fn_label,
            arg_texts.join(", ")
        ));
        Ok(ResultDescriptor::Value {
            ssa: dest,
            ty: sig.return_type,
        })
    }
}

fn const_literal(value: ConstValue, span: Span) -> Expr {
    match value {
        ConstValue::Int(i) => Expr::IntLiteral { value: i, span },
        ConstValue::Bool(b) => Expr::BoolLiteral { value: b, span },
    }
}
