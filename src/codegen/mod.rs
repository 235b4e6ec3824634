//! Code generation: walks a type-checked function body and emits textual LLVM IR.
//!
//! The context is split the way the design notes require: [`crate::symbols::FunctionScope`]
//! is the immutable per-function scope (parameters, locals, class, return type) and
//! [`context::EmitState`] is the mutable emission state (SSA counter, current block,
//! reachability flags, break/continue lists) — the only part actually threaded through
//! recursive lowering.

pub mod context;
pub mod control_flow;
pub mod expr;
pub mod stmt;

use crate::ir::StringTable;
use crate::layout::FieldIndex;
use crate::symbols::{FunctionScope, GlobalFunctionTable};
use crate::types::TypeRegistry;

pub use context::{EmitState, BREAK_SENTINEL, CONTINUE_SENTINEL, HOLE_WIDTH};

/// Everything one function or method body's lowering needs: the program-wide
/// read-only tables, plus this function's own scope and mutable emission state.
pub struct Lowerer<'a> {
    pub registry: &'a TypeRegistry,
    pub field_index: &'a FieldIndex,
    pub globals: &'a GlobalFunctionTable,
    pub scope: &'a FunctionScope,
    pub strings: &'a mut StringTable,
    pub emit: EmitState,
    /// `alloca` SSA ids for each parameter/local, indexed by ordinal. Populated by
    /// [`Lowerer::prologue`] before the body is lowered.
    pub param_slots: Vec<u32>,
    pub local_slots: Vec<u32>,
    /// The incoming `this` argument register, for methods. Never re-alloca'd since
    /// `this` is never reassigned.
    pub this_slot: Option<u32>,
}

impl<'a> Lowerer<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        field_index: &'a FieldIndex,
        globals: &'a GlobalFunctionTable,
        scope: &'a FunctionScope,
        strings: &'a mut StringTable,
    ) -> Self {
        Self {
            registry,
            field_index,
            globals,
            scope,
            strings,
            emit: EmitState::new(),
            param_slots: Vec::new(),
            local_slots: Vec::new(),
            this_slot: None,
        }
    }

    /// Emits the function entry sequence: an `alloca` (+ `store` of the incoming
    /// argument) for every parameter and every local, and records `this`'s incoming
    /// register directly (it has no slot of its own). `param_types`/`local_types` are
    /// in ordinal order, matching [`crate::symbols::FunctionScope`].
    ///
    /// Unnamed LLVM values are numbered in the order they're textually introduced, so
    /// every incoming argument register (`this` first, then each parameter, matching
    /// the `define` line) must be reserved up front before any instruction consumes a
    /// number of its own.
    pub fn prologue(
        &mut self,
        param_types: &[crate::types::Type],
        local_types: &[crate::types::Type],
        has_this: bool,
    ) {
        if has_this {
            self.this_slot = Some(self.emit.next_ssa());
        }
        let incoming: Vec<u32> = param_types.iter().map(|_| self.emit.next_ssa()).collect();

        for (ty, incoming_reg) in param_types.iter().zip(incoming.iter()) {
            let llvm_ty = self.registry.llvm_type_of(ty);
            let slot = self.emit.next_ssa();
            self.emit
                .emit(&format!("  %{} = alloca {}, align 4", slot, llvm_ty));
            self.emit.emit(&format!(
                "  store {} %{}, {}* %{}, align 4",
                llvm_ty, incoming_reg, llvm_ty, slot
            ));
            self.param_slots.push(slot);
        }
        for ty in local_types {
            let llvm_ty = self.registry.llvm_type_of(ty);
            let slot = self.emit.next_ssa();
            self.emit
                .emit(&format!("  %{} = alloca {}, align 4", slot, llvm_ty));
            self.local_slots.push(slot);
        }
    }
}

/// The tagged payload threaded through expression lowering recursion (data model §3).
#[derive(Debug, Clone)]
pub enum ResultDescriptor {
    /// A leaf literal, identifier, or `this` that hasn't been materialised to an SSA
    /// value yet — or a subtree the constant evaluator folded entirely.
    Simple(crate::ast::Expr),
    Pointer {
        ssa: u32,
        ty: crate::types::Type,
        is_lvalue: bool,
    },
    Value {
        ssa: u32,
        ty: crate::types::Type,
    },
    Function {
        class: Option<String>,
        this_ssa: Option<u32>,
        owner: String,
        name: String,
        sig: crate::types::FunctionSig,
    },
    None,
}
