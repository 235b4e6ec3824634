//! The Statement Lowerer: `print`, `return`, `break`/`continue`, and block
//! sequencing. Control structures (`if`, `while`, `repeat`, `foreach`) live in
//! [`super::control_flow`] since they share the loop-entry/patch dance.

use crate::ast::{Expr, Stmt};
use crate::error::{CompileError, UnprintableType};
use crate::location::Span;
use crate::types::Type;

use super::Lowerer;

impl<'a> Lowerer<'a> {
    /// Lowers a block, statement by statement. Once a statement terminates the block
    /// (`return`, or a `break`/`continue` placeholder), later statements in the same
    /// block are still lowered — for their own diagnostics — but into a discarded sink
    /// rather than the live instruction stream, matching the "duplicated-effort"
    /// behaviour recorded for dead code after a terminator, without leaving
    /// instructions after the block's terminator.
    pub fn lower_block(&mut self, block: &crate::ast::Block) -> Result<(), CompileError> {
        for stmt in &block.statements {
            if self.emit.block_isover {
                let mark = self.emit.begin_dead_code();
                let result = self.lower_stmt(stmt);
                self.emit.end_dead_code(mark);
                result?;
            } else {
                self.lower_stmt(stmt)?;
            }
        }
        Ok(())
    }

    pub fn lower_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Expr { expr, .. } => {
                self.lower_expr(expr)?;
                Ok(())
            }
            Stmt::Print { expr, span } => self.lower_print(expr, *span),
            Stmt::Return { expr, span } => self.lower_return(expr.as_ref(), *span),
            Stmt::Break { span } => self.lower_break(*span),
            Stmt::Continue { span } => self.lower_continue(*span),
            Stmt::If { .. } => self.lower_if(stmt),
            Stmt::While { .. } => self.lower_while(stmt),
            Stmt::Repeat { .. } => self.lower_repeat(stmt),
            Stmt::Foreach { .. } => self.lower_foreach(stmt),
        }
    }

    fn lower_print(&mut self, expr: &Expr, span: Span) -> Result<(), CompileError> {
        if let Expr::StringLiteral { value, .. } = expr {
            let id = self.strings.intern(value);
            let len = value.len() + 1;
            let dest = self.emit.next_ssa();
            self.emit.emit(&format!(
                "  %{} = call i32 (i8*, ...) @printf(i8* getelementptr inbounds ([{} x i8], [{} x i8]* @.str{}, i32 0, i32 0))",
                dest, len, len, id
            ));
            return Ok(());
        }

        let desc = self.lower_expr(expr)?;
        let (text, ty) = self.operand(desc, span)?;
        match ty {
            Type::Integer => {
                let dest = self.emit.next_ssa();
                self.emit.emit(&format!(
                    "  %{} = call i32 (i8*, ...) @printf(i8* getelementptr inbounds ([3 x i8], [3 x i8]* @.str2, i32 0, i32 0), i32 {})",
                    dest, text
                ));
                Ok(())
            }
            Type::Boolean => {
                let widened = self.emit.next_ssa();
                self.emit
                    .emit(&format!("  %{} = zext i8 {} to i32", widened, text));
                let dest = self.emit.next_ssa();
                self.emit.emit(&format!(
                    "  %{} = call i32 (i8*, ...) @printf(i8* getelementptr inbounds ([3 x i8], [3 x i8]* @.str2, i32 0, i32 0), i32 %{})",
                    dest, widened
                ));
                Ok(())
            }
            other => Err(CompileError::UnprintableType(
                UnprintableType { ty: other },
                span,
            )),
        }
    }

    fn lower_return(&mut self, expr: Option<&Expr>, span: Span) -> Result<(), CompileError> {
        match expr {
            None => {
                if self.scope.return_type != Type::Void {
                    return Err(CompileError::TypeMismatch(
                        crate::error::TypeMismatch {
                            expected: self.scope.return_type.clone(),
                            found: Type::Void,
                        },
                        span,
                    ));
                }
                self.emit.emit("  ret void");
            }
            Some(expr) => {
                let desc = self.lower_expr(expr)?;
                let (text, ty) = self.operand(desc, span)?;
                let return_ty = self.scope.return_type.clone();
                let converted = self.convert_to(&text, &ty, &return_ty, span)?;
                let llvm_ty = self.registry.llvm_type_of(&return_ty);
                self.emit
                    .emit(&format!("  ret {} {}", llvm_ty, converted));
            }
        }
        self.emit.block_isover = true;
        self.emit.terminated_bybr = false;
        Ok(())
    }

    fn lower_break(&mut self, span: Span) -> Result<(), CompileError> {
        if !self.emit.in_loop() {
            return Err(CompileError::BreakOutsideLoop(span));
        }
        self.emit.emit_break();
        Ok(())
    }

    fn lower_continue(&mut self, span: Span) -> Result<(), CompileError> {
        if !self.emit.in_loop() {
            return Err(CompileError::ContinueOutsideLoop(span));
        }
        self.emit.emit_continue();
        Ok(())
    }
}
