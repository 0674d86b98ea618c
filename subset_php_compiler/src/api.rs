//! Rust API for compiling expression trees.
//!
//! `compile_function` runs both passes over one declaration into a caller
//! supplied sink. `compile_unit` compiles a whole unit into a fresh
//! [`PhpWriter`] and turns internal faults into errors.

use serde::{Deserialize, Serialize};

use crate::analyze::{Analyzer, FunctionFacts, SignatureLookup};
use crate::cache::source_hash;
use crate::codegen::{CodegenConfig, FunctionGenerator, GenCounters};
use crate::error::{catch_fault, CompileResult};
use crate::ir::{CompilationUnit, FunctionDecl};
use crate::sink::{PhpWriter, Sink};

/// Counters for one compiled unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodegenStats {
    pub functions_compiled: usize,
    /// Operators emitted on raw `i64`/`f64` operands
    pub specialized_ops: usize,
    /// Operators emitted as generic `Value` methods
    pub dynamic_fallbacks: usize,
    pub pool_entries: usize,
}

impl CodegenStats {
    pub fn merge(&mut self, other: &CodegenStats) {
        self.functions_compiled += other.functions_compiled;
        self.specialized_ops += other.specialized_ops;
        self.dynamic_fallbacks += other.dynamic_fallbacks;
        self.pool_entries += other.pool_entries;
    }

    fn record(&mut self, counters: GenCounters) {
        self.functions_compiled += 1;
        self.specialized_ops += counters.specialized_ops;
        self.dynamic_fallbacks += counters.dynamic_fallbacks;
    }
}

/// Generated module for one compilation unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledUnit {
    /// SHA-256 of the unit, the codegen configuration and the signature
    /// table, lowercase hex
    pub source_hash: String,
    pub file: Option<String>,
    /// Complete Rust module source
    pub code: String,
    pub stats: CodegenStats,
    /// Compiled function names, in unit order
    pub functions: Vec<String>,
}

/// Analyze `decl` and emit it into `sink`. The declaration must not have
/// been analyzed yet (see [`FunctionDecl::reset_analysis`]).
pub fn compile_function(
    decl: &FunctionDecl,
    signatures: &dyn SignatureLookup,
    config: &CodegenConfig,
    sink: &mut dyn Sink,
) -> FunctionFacts {
    compile_function_counted(decl, signatures, config, sink).0
}

fn compile_function_counted(
    decl: &FunctionDecl,
    signatures: &dyn SignatureLookup,
    config: &CodegenConfig,
    sink: &mut dyn Sink,
) -> (FunctionFacts, GenCounters) {
    let facts = Analyzer::new(signatures).analyze_function(decl);
    let counters = FunctionGenerator::new(config, signatures).generate(decl, &facts, sink);
    (facts, counters)
}

/// Compile every function of `unit` into one module.
///
/// The unit is compiled from a fresh copy, so it may be compiled any
/// number of times. A fault in any function fails the whole unit.
pub fn compile_unit(
    unit: &CompilationUnit,
    signatures: &dyn SignatureLookup,
    config: &CodegenConfig,
) -> CompileResult<CompiledUnit> {
    let source_hash = source_hash(unit, signatures, config)?;
    let mut writer = PhpWriter::new();
    let (mut stats, functions) = catch_fault(|| {
        let mut stats = CodegenStats::default();
        let mut functions = Vec::with_capacity(unit.functions.len());
        for decl in &unit.functions {
            let decl = decl.clone();
            let (_, counters) = compile_function_counted(&decl, signatures, config, &mut writer);
            stats.record(counters);
            functions.push(decl.name.clone());
        }
        (stats, functions)
    })?;
    stats.pool_entries = writer.pool_len();
    Ok(CompiledUnit {
        source_hash,
        file: unit.file.clone(),
        code: writer.finish(),
        stats,
        functions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::SignatureTable;
    use crate::error::CompileError;
    use crate::ir::{Expr, ExprFactory, Param};

    fn unit_with(body: Vec<Expr>) -> CompilationUnit {
        CompilationUnit::new(Some("t.php"), vec![FunctionDecl::new("t", vec![], body, None)])
    }

    #[test]
    fn test_stats_merge() {
        let mut a = CodegenStats {
            functions_compiled: 1,
            specialized_ops: 2,
            dynamic_fallbacks: 3,
            pool_entries: 4,
        };
        let b = a;
        a.merge(&b);
        assert_eq!(a.functions_compiled, 2);
        assert_eq!(a.dynamic_fallbacks, 6);
        assert_eq!(a.pool_entries, 8);
    }

    #[test]
    fn test_compile_unit_lists_functions() {
        let f = ExprFactory::new(Some("t.php"));
        let loc = f.location(1, 1);
        let unit = CompilationUnit::new(
            Some("t.php"),
            vec![
                FunctionDecl::new("a", vec![], vec![], Some(f.create_long(loc.clone(), 1))),
                FunctionDecl::new("b", vec![Param::new("x")], vec![], Some(f.create_var(loc, "x"))),
            ],
        );
        let compiled = compile_unit(&unit, &SignatureTable::builtins(), &CodegenConfig::new()).unwrap();
        assert_eq!(compiled.functions, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(compiled.stats.functions_compiled, 2);
        assert_eq!(compiled.file.as_deref(), Some("t.php"));
        assert!(compiled.code.contains("pub fn f_a("));
        assert!(compiled.code.contains("pub fn f_b(env: &mut dyn Environment, p_x: Value)"));
        assert_eq!(compiled.source_hash.len(), 64);
    }

    #[test]
    fn test_fault_becomes_error() {
        let f = ExprFactory::new(Some("t.php"));
        let loc = f.location(4, 2);
        // `$this` is not assignable
        let bad = f.create_assign(loc.clone(), f.create_this(loc.clone()), f.create_long(loc, 1));
        let err = compile_unit(&unit_with(vec![bad]), &SignatureTable::new(), &CodegenConfig::new())
            .unwrap_err();
        match err {
            CompileError::InternalFault { location, .. } => assert_eq!(location.line, 4),
            other => panic!("expected a fault, got {:?}", other),
        }
    }

    #[test]
    fn test_unit_compiles_twice() {
        let f = ExprFactory::new(None);
        let loc = f.location(1, 1);
        let unit = unit_with(vec![f.create_assign(
            loc.clone(),
            f.create_var(loc.clone(), "a"),
            f.create_long(loc, 1),
        )]);
        let signatures = SignatureTable::new();
        let first = compile_unit(&unit, &signatures, &CodegenConfig::new()).unwrap();
        let second = compile_unit(&unit, &signatures, &CodegenConfig::new()).unwrap();
        assert_eq!(first, second);
        assert!(!unit.functions[0].body[0].is_analyzed());
    }
}
