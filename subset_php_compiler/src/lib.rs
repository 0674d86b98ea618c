//! Two-pass compiler from PHP expression trees to Rust source.
//!
//! The analysis pass types every node and decides how each local is
//! stored. The generation pass emits Rust text that runs against
//! `subset_php_runtime`, using raw `i64`/`f64`/`bool` code wherever the
//! analysis proved it safe.

// Diagnostics go through debug::debug_log, never eprintln!().
#![deny(clippy::print_stderr)]

// Core modules
pub mod error;
pub mod ir;
pub mod span;
pub mod types;

// Analysis pass: types, variable usage, storage decisions
pub mod analyze;

// Generation pass and its output sink
pub mod codegen;
pub mod runtime_api;
pub mod sink;

// Configuration and the compiled unit cache
pub mod cache;
pub mod config;
mod debug;

// Rust API for programmatic use
pub mod api;
pub use api::{compile_function, compile_unit, CodegenStats, CompiledUnit};
pub use cache::{cached_unit_count, clear_cache, compile_unit_cached, source_hash};

pub use analyze::{Analyzer, FunctionFacts, Signature, SignatureLookup, SignatureTable, Storage};
pub use codegen::{CodegenConfig, ExprGenerator, FunctionGenerator};
pub use config::CompilerConfig;
pub use error::{CompileError, CompileResult};
pub use ir::{CompilationUnit, Expr, ExprFactory, FunctionDecl};
pub use sink::{PhpWriter, Sink};
pub use types::ExprType;
