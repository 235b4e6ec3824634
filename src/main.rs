//! # mylangc
//!
//! This binary is the semantic analyser and LLVM-IR code generator for the MyLang
//! teaching language. It reads a serialised program AST (as produced by the MyLang
//! front end, which is out of scope here), resolves structural layout and types,
//! and lowers the program to textual LLVM IR.
mod cli;

use cli::Cli;

use std::fs;

use log::{error, info};
use mylangc::{ast::ProgramAst, driver, dump};

fn main() -> anyhow::Result<()> {
    let args = Cli::init();

    simple_logger::init_with_level(args.log_level()).unwrap();

    info!("reading program ast from {}", args.ast.display());
    let raw = fs::read_to_string(&args.ast)?;
    let ast: ProgramAst = serde_json::from_str(&raw)?;

    fs::write(&args.ast_dump, dump::dump(&ast))?;

    if args.dump_ast_only {
        return Ok(());
    }

    match driver::compile(&ast) {
        Ok(ir) => {
            fs::write(&args.ir_output, ir)?;
            Ok(())
        }
        Err(err) => {
            error!("{}", err);
            fs::write(&args.ir_output, format!("{}\n", err))?;
            std::process::exit(1);
        }
    }
}
