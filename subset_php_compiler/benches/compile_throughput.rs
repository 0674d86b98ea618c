use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use subset_php_compiler::ir::{BinaryOp, Param};
use subset_php_compiler::{
    clear_cache, compile_unit, compile_unit_cached, CodegenConfig, CompilationUnit, CompilerConfig,
    ExprFactory, FunctionDecl, SignatureTable,
};

/// A unit of `count` small functions mixing typed arithmetic, string
/// constants and builtin calls
fn build_unit(count: usize) -> CompilationUnit {
    let f = ExprFactory::new(Some("bench.php"));
    let functions = (0..count)
        .map(|i| {
            let loc = f.location(i as u32 + 1, 1);
            let body = vec![
                f.create_assign(
                    loc.clone(),
                    f.create_var(loc.clone(), "n"),
                    f.create_binary(
                        loc.clone(),
                        BinaryOp::Mul,
                        f.create_long(loc.clone(), i as i64),
                        f.create_long(loc.clone(), 3),
                    ),
                ),
                f.create_assign(
                    loc.clone(),
                    f.create_var(loc.clone(), "s"),
                    f.create_binary(
                        loc.clone(),
                        BinaryOp::Concat,
                        f.create_string(loc.clone(), "item-"),
                        f.create_var(loc.clone(), "n"),
                    ),
                ),
                f.create_call(loc.clone(), "sort", vec![f.create_var(loc.clone(), "list")]),
                f.create_call(loc.clone(), "strlen", vec![f.create_var(loc.clone(), "s")]),
            ];
            let result = f.create_binary(
                loc.clone(),
                BinaryOp::Add,
                f.create_var(loc.clone(), "x"),
                f.create_var(loc, "n"),
            );
            FunctionDecl::new(&format!("fn{}", i), vec![Param::new("x")], body, Some(result))
        })
        .collect();
    CompilationUnit::new(Some("bench.php"), functions)
}

fn bench_compile(c: &mut Criterion) {
    let unit = build_unit(50);
    let signatures = SignatureTable::builtins();

    c.bench_function("compile_unit_uncached", |b| {
        let config = CodegenConfig::release();
        b.iter(|| {
            let compiled = compile_unit(black_box(&unit), &signatures, &config).expect("compile");
            black_box(compiled);
        })
    });

    c.bench_function("compile_unit_cached_hit", |b| {
        let config = CompilerConfig::release();
        clear_cache();
        compile_unit_cached(&unit, &signatures, &config).expect("warm cache");
        b.iter(|| {
            let compiled =
                compile_unit_cached(black_box(&unit), &signatures, &config).expect("compile");
            black_box(compiled);
        })
    });
}

criterion_group!(benches, bench_compile);
criterion_main!(benches);
