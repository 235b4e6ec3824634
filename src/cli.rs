//! # Cli
//!
//! This module contains everything needed for parsing the CLI arguments for the
//! MyLang compiler.

use clap::Parser;

/// Struct containing the CLI configuration for `mylangc`.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// The path to the serialised program AST (JSON), as produced by the MyLang
    /// front end.
    #[arg(index = 1)]
    pub ast: std::path::PathBuf,

    /// The path the structural AST dump is written to.
    #[arg(index = 2)]
    pub ast_dump: std::path::PathBuf,

    /// The path the rendered LLVM IR is written to.
    #[arg(index = 3)]
    pub ir_output: std::path::PathBuf,

    /// Write the AST dump and exit without emitting IR.
    #[arg(long)]
    pub dump_ast_only: bool,

    /// Raise the log level. Repeatable: `-v` for warnings, `-vv` for info,
    /// `-vvv` for debug, `-vvvv` for trace. Absent, only errors are logged.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }

    pub fn log_level(&self) -> log::Level {
        match self.verbose {
            0 => log::Level::Error,
            1 => log::Level::Warn,
            2 => log::Level::Info,
            3 => log::Level::Debug,
            _ => log::Level::Trace,
        }
    }
}
