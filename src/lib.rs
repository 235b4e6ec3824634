//! Semantic analyser and LLVM-IR code generator for the MyLang teaching language.
//!
//! Lexing and parsing are out of scope — [`ast::ProgramAst`] is the hand-off contract
//! with that (external) stage. [`driver::compile`] runs the whole pipeline: populate
//! the type registry, resolve structural layout, then lower every method, free
//! function, and the top-level program body to textual LLVM IR.

pub mod ast;
pub mod codegen;
pub mod const_eval;
pub mod driver;
pub mod dump;
pub mod error;
pub mod ir;
pub mod layout;
pub mod location;
pub mod symbols;
pub mod types;
