//! `if`/`elif`/`else`, `while`, `repeat`/`until`, and `foreach` lowering. Each loop
//! form wraps its body in [`super::context::EmitState::enter_loop`]/`patch_loop` so
//! `break`/`continue` inside it resolve to this loop's exit/continue labels rather
//! than an outer one.

use crate::ast::{Expr, Stmt};
use crate::const_eval::{self, ConstValue};
use crate::error::CompileError;
use crate::location::Span;
use crate::types::Type;

use super::Lowerer;

impl<'a> Lowerer<'a> {
    /// Emits a branch on `cond` from the current block to `true_label`/`false_label`.
    /// A compile-time-constant condition collapses to an unconditional branch, never
    /// emitting the comparison at all.
    fn branch_on_condition(
        &mut self,
        cond: &Expr,
        true_label: u32,
        false_label: u32,
        span: Span,
    ) -> Result<(), CompileError> {
        if let Some(folded) = const_eval::eval(cond)? {
            let truthy = matches!(folded, ConstValue::Bool(true))
                || matches!(folded, ConstValue::Int(v) if v != 0);
            let target = if truthy { true_label } else { false_label };
            self.emit.emit(&format!("  br label %{}", target));
            return Ok(());
        }

        let desc = self.lower_expr(cond)?;
        let (text, ty) = self.operand(desc, span)?;
        let bool_text = self.ensure_bool(&text, &ty);
        let i1 = self.truncate_to_i1(&bool_text);
        self.emit.emit(&format!(
            "  br i1 %{}, label %{}, label %{}",
            i1, true_label, false_label
        ));
        Ok(())
    }

    fn label(id: u32) -> String {
        id.to_string()
    }

    fn start_block(&mut self, id: u32) {
        self.emit.emit(&format!("{}:", id));
        self.emit.current_block = id;
        self.emit.block_isover = false;
        self.emit.terminated_bybr = false;
    }

    fn branch_to_end_if_open(&mut self, end_label: u32) {
        if !self.emit.block_isover {
            self.emit.emit(&format!("  br label %{}", end_label));
        }
    }

    pub(super) fn lower_if(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        let Stmt::If {
            branches,
            else_branch,
            span,
        } = stmt
        else {
            unreachable!("lower_if called with a non-If statement")
        };

        let end_label = self.emit.new_block();
        let check_labels: Vec<u32> = branches.iter().map(|_| self.emit.new_block()).collect();
        let body_labels: Vec<u32> = branches.iter().map(|_| self.emit.new_block()).collect();
        let else_label = else_branch.as_ref().map(|_| self.emit.new_block());

        self.emit.emit(&format!("  br label %{}", check_labels[0]));

        for (i, (cond, body)) in branches.iter().enumerate() {
            self.start_block(check_labels[i]);
            let fallthrough = check_labels
                .get(i + 1)
                .copied()
                .or(else_label)
                .unwrap_or(end_label);
            self.branch_on_condition(cond, body_labels[i], fallthrough, *span)?;

            self.start_block(body_labels[i]);
            self.lower_block(body)?;
            self.branch_to_end_if_open(end_label);
        }

        if let Some(else_block) = else_branch {
            self.start_block(else_label.expect("else_label set whenever else_branch is Some"));
            self.lower_block(else_block)?;
            self.branch_to_end_if_open(end_label);
        }

        self.start_block(end_label);
        Ok(())
    }

    pub(super) fn lower_while(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        let Stmt::While { cond, body, span } = stmt else {
            unreachable!("lower_while called with a non-While statement")
        };

        let cond_label = self.emit.new_block();
        let body_label = self.emit.new_block();
        let exit_label = self.emit.new_block();

        self.emit.emit(&format!("  br label %{}", cond_label));
        self.emit.enter_loop();

        self.start_block(cond_label);
        self.branch_on_condition(cond, body_label, exit_label, *span)?;

        self.start_block(body_label);
        self.lower_block(body)?;
        self.branch_to_end_if_open(cond_label);

        self.emit
            .patch_loop(&Self::label(exit_label), &Self::label(cond_label));
        self.start_block(exit_label);
        Ok(())
    }

    /// `repeat B until E`: `B` runs once unconditionally, then the loop re-enters `B`
    /// until `E` becomes true. `continue` resolves to the condition check, matching a
    /// do-while's "re-test, then maybe loop again" shape.
    pub(super) fn lower_repeat(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        let Stmt::Repeat { body, cond, span } = stmt else {
            unreachable!("lower_repeat called with a non-Repeat statement")
        };

        let body_label = self.emit.new_block();
        let cond_label = self.emit.new_block();
        let exit_label = self.emit.new_block();

        self.emit.emit(&format!("  br label %{}", body_label));
        self.emit.enter_loop();

        self.start_block(body_label);
        self.lower_block(body)?;
        self.branch_to_end_if_open(cond_label);

        self.start_block(cond_label);
        self.branch_on_condition(cond, exit_label, body_label, *span)?;

        self.emit
            .patch_loop(&Self::label(exit_label), &Self::label(cond_label));
        self.start_block(exit_label);
        Ok(())
    }

    /// `foreach var in array do ... end foreach`: desugars to a private `i32` index
    /// counter from `0` to the array's length. `var` must already be a declared local
    /// (the restriction recorded for this construct); each iteration loads the element
    /// at the current index into it before running the body.
    pub(super) fn lower_foreach(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        let Stmt::Foreach {
            var,
            array,
            body,
            span,
        } = stmt
        else {
            unreachable!("lower_foreach called with a non-Foreach statement")
        };

        let Expr::Ident { name: array_name, .. } = array else {
            return Err(CompileError::IncompatibleOperand(
                crate::error::IncompatibleOperand {
                    operator: "foreach".into(),
                    operand: Type::Void,
                },
                *span,
            ));
        };
        let (array_ssa, array_ty, _) = self.resolve_slot(array_name, *span)?;
        let Type::Array { length, element } = array_ty else {
            return Err(CompileError::IncompatibleOperand(
                crate::error::IncompatibleOperand {
                    operator: "foreach".into(),
                    operand: array_ty,
                },
                *span,
            ));
        };

        let (var_ordinal, var_ty) = self
            .scope
            .local(var)
            .map(|(i, t)| (i, t.clone()))
            .ok_or(CompileError::UnresolvedIdentifier(
                crate::error::UnresolvedIdentifier { name: var.clone() },
                *span,
            ))?;
        let var_slot = self.local_slot(var_ordinal);
        let element_ty = self.registry.resolve(&element, *span).unwrap_or(Type::Integer);
        let array_fragment = format!("[{} x {}]", length, self.registry.llvm_type_of(&element_ty));

        let counter_slot = self.emit.next_ssa();
        self.emit
            .emit(&format!("  %{} = alloca i32, align 4", counter_slot));
        self.emit
            .emit(&format!("  store i32 0, i32* %{}, align 4", counter_slot));

        let cond_label = self.emit.new_block();
        let body_label = self.emit.new_block();
        let incr_label = self.emit.new_block();
        let exit_label = self.emit.new_block();

        self.emit.emit(&format!("  br label %{}", cond_label));
        self.emit.enter_loop();

        self.start_block(cond_label);
        let counter = self.emit.next_ssa();
        self.emit.emit(&format!(
            "  %{} = load i32, i32* %{}, align 4",
            counter, counter_slot
        ));
        let in_range = self.emit.next_ssa();
        self.emit.emit(&format!(
            "  %{} = icmp slt i32 %{}, {}",
            in_range, counter, length
        ));
        self.emit.emit(&format!(
            "  br i1 %{}, label %{}, label %{}",
            in_range, body_label, exit_label
        ));

        self.start_block(body_label);
        let counter = self.emit.next_ssa();
        self.emit.emit(&format!(
            "  %{} = load i32, i32* %{}, align 4",
            counter, counter_slot
        ));
        let elem_ptr = self.emit.next_ssa();
        self.emit.emit(&format!(
            "  %{} = getelementptr inbounds {}, {}* %{}, i32 0, i32 %{}",
            elem_ptr, array_fragment, array_fragment, array_ssa, counter
        ));
        let elem_llvm_ty = self.registry.llvm_type_of(&element_ty);
        let elem_value = self.emit.next_ssa();
        self.emit.emit(&format!(
            "  %{} = load {}, {}* %{}, align 4",
            elem_value, elem_llvm_ty, elem_llvm_ty, elem_ptr
        ));
        let var_llvm_ty = self.registry.llvm_type_of(&var_ty);
        self.emit.emit(&format!(
            "  store {} %{}, {}* %{}, align 4",
            var_llvm_ty, elem_value, var_llvm_ty, var_slot
        ));
        self.lower_block(body)?;
        self.branch_to_end_if_open(incr_label);

        self.start_block(incr_label);
        let counter = self.emit.next_ssa();
        self.emit.emit(&format!(
            "  %{} = load i32, i32* %{}, align 4",
            counter, counter_slot
        ));
        let next = self.emit.next_ssa();
        self.emit
            .emit(&format!("  %{} = add nsw i32 %{}, 1", next, counter));
        self.emit.emit(&format!(
            "  store i32 %{}, i32* %{}, align 4",
            next, counter_slot
        ));
        self.emit.emit(&format!("  br label %{}", cond_label));

        self.emit
            .patch_loop(&Self::label(exit_label), &Self::label(incr_label));
        self.start_block(exit_label);
        Ok(())
    }
}
