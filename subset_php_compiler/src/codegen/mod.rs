//! Rust code generation from analyzed expression trees
//!
//! [`ExprGenerator`] turns one analyzed node into a Rust source fragment
//! for a requested evaluation context. The analysis facts are read-only
//! here. Literals are interned in the [`Sink`] pool, and nothing else is
//! written to the sink until [`FunctionGenerator`] emits a whole function.
//!
//! Naming in emitted code:
//!
//! - `v_<name>`: PHP local, `p_<name>`: incoming parameter
//! - `q_this`: the receiver of a method
//! - `_sym`: cells of the dynamic symbol table frame
//! - `_l<n>`: analyzer-allocated temps
//! - `_C<n>`, `_S<n>`, `_K<n>`: pooled constants
//! - other `_`-prefixed names are block-local

mod assign;
mod calls;
mod expressions;
mod function;
mod operations;
mod typed;

pub use function::FunctionGenerator;

use serde::{Deserialize, Serialize};

use crate::analyze::{FunctionFacts, SignatureLookup, Storage, VarId};
use crate::error::fault;
use crate::ir::{Expr, FunctionInfo};
use crate::runtime_api as rt;
use crate::sink::Sink;
use crate::types::ExprType;

/// Configuration for code generation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodegenConfig {
    /// Indentation string
    pub indent: String,
    /// Whether to emit a `// file:line:col` comment ahead of each statement
    pub emit_comments: bool,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            emit_comments: true,
        }
    }
}

impl CodegenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a release configuration (no comments)
    pub fn release() -> Self {
        Self {
            indent: "    ".to_string(),
            emit_comments: false,
        }
    }
}

/// Counters collected while generating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenCounters {
    /// Operators emitted on raw `i64`/`f64` operands
    pub specialized_ops: usize,
    /// Operators emitted as generic `Value` methods
    pub dynamic_fallbacks: usize,
}

impl GenCounters {
    pub fn add(&mut self, other: GenCounters) {
        self.specialized_ops += other.specialized_ops;
        self.dynamic_fallbacks += other.dynamic_fallbacks;
    }
}

/// Rust identifier fragment for a PHP name. ASCII letters, digits and `_`
/// pass through; any other character becomes `_u<hex>_`.
pub(crate) fn escape_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push_str(&format!("_u{:x}_", c as u32));
        }
    }
    out
}

pub(crate) fn var_ident(name: &str) -> String {
    format!("v_{}", escape_ident(name))
}

pub(crate) fn param_ident(name: &str) -> String {
    format!("p_{}", escape_ident(name))
}

pub(crate) fn function_ident(name: &str) -> String {
    format!("f_{}", escape_ident(name))
}

/// Box a raw fragment of type `ty` into a `Value`
pub(crate) fn box_raw(raw: &str, ty: ExprType) -> String {
    match ty {
        ExprType::Long => rt::FROM_LONG.apply(&[raw]),
        ExprType::Double => rt::FROM_DOUBLE.apply(&[raw]),
        ExprType::Boolean => rt::FROM_BOOL.apply(&[raw]),
        ExprType::String => rt::FROM_STRING.apply(&[raw]),
        ExprType::Unknown | ExprType::Value => raw.to_string(),
    }
}

/// Faults on a node the analyzer never visited
pub(crate) fn require_analyzed(expr: &Expr) {
    if !expr.is_analyzed() {
        fault(&expr.location, "expression used before analysis");
    }
}

/// Evaluation context a fragment is requested in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ctx {
    Value,
    Boolean,
    Long,
    Double,
    Str,
}

impl Ctx {
    /// Raw context matching a static type, if there is one
    pub(crate) fn of_type(ty: ExprType) -> Option<Ctx> {
        match ty {
            ExprType::Long => Some(Ctx::Long),
            ExprType::Double => Some(Ctx::Double),
            ExprType::Boolean => Some(Ctx::Boolean),
            ExprType::String => Some(Ctx::Str),
            ExprType::Unknown | ExprType::Value => None,
        }
    }

    pub(crate) fn ty(self) -> ExprType {
        match self {
            Ctx::Value => ExprType::Value,
            Ctx::Boolean => ExprType::Boolean,
            Ctx::Long => ExprType::Long,
            Ctx::Double => ExprType::Double,
            Ctx::Str => ExprType::String,
        }
    }
}

/// Expression generator for one function body
pub struct ExprGenerator<'a> {
    facts: &'a FunctionFacts,
    info: &'a FunctionInfo,
    config: &'a CodegenConfig,
    signatures: &'a dyn SignatureLookup,
    sink: &'a mut dyn Sink,
    /// Nesting level of the statements being generated
    depth: usize,
    counters: GenCounters,
}

impl std::fmt::Debug for ExprGenerator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExprGenerator")
            .field("depth", &self.depth)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

impl<'a> ExprGenerator<'a> {
    pub fn new(
        facts: &'a FunctionFacts,
        info: &'a FunctionInfo,
        config: &'a CodegenConfig,
        signatures: &'a dyn SignatureLookup,
        sink: &'a mut dyn Sink,
    ) -> Self {
        Self {
            facts,
            info,
            config,
            signatures,
            sink,
            depth: 1,
            counters: GenCounters::default(),
        }
    }

    pub fn counters(&self) -> GenCounters {
        self.counters
    }

    pub fn facts(&self) -> &FunctionFacts {
        self.facts
    }

    // ========== Variables ==========

    /// Storage and identifier of an analyzed variable node's slot
    pub(crate) fn var_storage(&self, id: VarId) -> (Storage, String) {
        let var = self.facts.var(id);
        (var.storage, var_ident(&var.name))
    }

    /// `Var` cell of a symbol-table variable
    pub(crate) fn symbol_cell(index: usize) -> String {
        format!("_sym[{}]", index)
    }

    /// `Var` cell of a superglobal
    pub(crate) fn global_cell(&mut self, name: &str) -> String {
        let name = self.sink.intern_string(name);
        rt::GET_GLOBAL_VAR.apply(&[&name])
    }

    // ========== Literals ==========

    /// Pooled raw string, or the shared empty string
    pub(crate) fn str_constant(&mut self, value: &str) -> String {
        if value.is_empty() {
            "PhpStr::EMPTY".to_string()
        } else {
            self.sink.intern_string(value)
        }
    }

    pub(crate) fn class_constant(&mut self, name: &str) -> String {
        self.sink.intern_class_reference(name)
    }

    fn indent(&self, depth: usize) -> String {
        self.config.indent.repeat(depth)
    }
}
