//! Build script compiling the scenario functions to Rust
//!
//! Each scenario is a small PHP function built with `ExprFactory`. The
//! compiled unit is written to `$OUT_DIR/scenarios.rs` and included by
//! `src/lib.rs`, so every build runs the whole pipeline on real trees and
//! rustc type-checks the result.

// Build scripts should panic on errors (standard Rust build script pattern)
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::env;
use std::fs;
use std::path::Path;

use subset_php_compiler::ir::{ArrayEntry, BinaryOp, CapturedVar, IncludeMode, Param};
use subset_php_compiler::span::Location;
use subset_php_compiler::{
    compile_unit, CodegenConfig, CompilationUnit, Expr, ExprFactory, FunctionDecl, SignatureTable,
};

struct Builder {
    f: ExprFactory,
    line: u32,
}

impl Builder {
    fn new() -> Self {
        Builder {
            f: ExprFactory::new(Some("scenarios.php")),
            line: 0,
        }
    }

    fn loc(&mut self) -> Location {
        self.line += 1;
        self.f.location(self.line, 1)
    }

    fn var(&mut self, name: &str) -> Expr {
        let loc = self.loc();
        self.f.create_var(loc, name)
    }

    fn long(&mut self, value: i64) -> Expr {
        let loc = self.loc();
        self.f.create_long(loc, value)
    }

    fn string(&mut self, value: &str) -> Expr {
        let loc = self.loc();
        self.f.create_string(loc, value)
    }

    fn assign(&mut self, target: Expr, value: Expr) -> Expr {
        let loc = self.loc();
        self.f.create_assign(loc, target, value)
    }

    fn assign_ref(&mut self, target: Expr, value: Expr) -> Expr {
        let loc = self.loc();
        self.f.create_assign_ref(loc, target, value)
    }

    fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        let loc = self.loc();
        self.f.create_binary(loc, op, left, right)
    }

    fn elem(&mut self, base: &str, index: i64) -> Expr {
        let base = self.var(base);
        let index = self.long(index);
        let loc = self.loc();
        self.f.create_array_get(loc, base, index)
    }

    fn array(&mut self, values: &[i64]) -> Expr {
        let entries = values
            .iter()
            .map(|&v| ArrayEntry {
                key: None,
                value: self.long(v),
                by_ref: false,
            })
            .collect();
        let loc = self.loc();
        self.f.create_array_literal(loc, entries)
    }

    fn list(&mut self, targets: Vec<Option<Expr>>, value: Expr) -> Expr {
        let loc = self.loc();
        self.f.create_list(loc, targets, value)
    }

    fn closure(&mut self, decl: FunctionDecl, captured: &[(&str, bool)]) -> Expr {
        let captured = captured
            .iter()
            .map(|&(name, by_ref)| CapturedVar {
                name: name.to_string(),
                by_ref,
            })
            .collect();
        let loc = self.loc();
        self.f.create_closure(loc, decl, captured)
    }

    fn call_value(&mut self, callee: &str, args: Vec<Expr>) -> Expr {
        let callee = self.var(callee);
        let loc = self.loc();
        self.f.create_dynamic_call(loc, callee, args)
    }
}

fn scenarios() -> CompilationUnit {
    let mut b = Builder::new();
    let mut functions = Vec::new();

    // return ($s = "x") . "y";
    let target = b.var("s");
    let value = b.string("x");
    let stored = b.assign(target, value);
    let tail = b.string("y");
    let result = b.binary(BinaryOp::Concat, stored, tail);
    functions.push(FunctionDecl::new("assign_in_concat", vec![], vec![], Some(result)));

    // $t = ($u = array(4, 5)); return $t[1] + $u[0];
    let inner_target = b.var("u");
    let arr = b.array(&[4, 5]);
    let inner = b.assign(inner_target, arr);
    let outer_target = b.var("t");
    let outer = b.assign(outer_target, inner);
    let left = b.elem("t", 1);
    let right = b.elem("u", 0);
    let result = b.binary(BinaryOp::Add, left, right);
    functions.push(FunctionDecl::new("chained_assign", vec![], vec![outer], Some(result)));

    // $y = 1; $x = &$y; $x = 3; return $y;
    let y = b.var("y");
    let one = b.long(1);
    let s1 = b.assign(y, one);
    let x = b.var("x");
    let y = b.var("y");
    let s2 = b.assign_ref(x, y);
    let x = b.var("x");
    let three = b.long(3);
    let s3 = b.assign(x, three);
    let result = b.var("y");
    functions.push(FunctionDecl::new("ref_pair", vec![], vec![s1, s2, s3], Some(result)));

    // $a = array(); $a[0] = 1; $a[1] = 5; return $a[0] + $a[1];
    let a = b.var("a");
    let empty = b.array(&[]);
    let s1 = b.assign(a, empty);
    let e0 = b.elem("a", 0);
    let one = b.long(1);
    let s2 = b.assign(e0, one);
    let e1 = b.elem("a", 1);
    let five = b.long(5);
    let s3 = b.assign(e1, five);
    let left = b.elem("a", 0);
    let right = b.elem("a", 1);
    let result = b.binary(BinaryOp::Add, left, right);
    functions.push(FunctionDecl::new("element_writes", vec![], vec![s1, s2, s3], Some(result)));

    // $a = array(1, 2); $r = &$a[1]; $r = 7; return $a[1];
    let a = b.var("a");
    let arr = b.array(&[1, 2]);
    let s1 = b.assign(a, arr);
    let r = b.var("r");
    let e1 = b.elem("a", 1);
    let s2 = b.assign_ref(r, e1);
    let r = b.var("r");
    let seven = b.long(7);
    let s3 = b.assign(r, seven);
    let result = b.elem("a", 1);
    functions.push(FunctionDecl::new("element_ref", vec![], vec![s1, s2, s3], Some(result)));

    // list($a, , $b) = array(1, 9, 2); return $a + $b;
    let a = b.var("a");
    let bv = b.var("b");
    let arr = b.array(&[1, 9, 2]);
    let s1 = b.list(vec![Some(a), None, Some(bv)], arr);
    let left = b.var("a");
    let right = b.var("b");
    let result = b.binary(BinaryOp::Add, left, right);
    functions.push(FunctionDecl::new("list_statement", vec![], vec![s1], Some(result)));

    // $all = list($a, $b) = array(3, 4); return $all[0] + $all[1] + $b;
    let a = b.var("a");
    let bv = b.var("b");
    let arr = b.array(&[3, 4]);
    let listed = b.list(vec![Some(a), Some(bv)], arr);
    let all = b.var("all");
    let s1 = b.assign(all, listed);
    let left = b.elem("all", 0);
    let right = b.elem("all", 1);
    let sum = b.binary(BinaryOp::Add, left, right);
    let last = b.var("b");
    let result = b.binary(BinaryOp::Add, sum, last);
    functions.push(FunctionDecl::new("list_value", vec![], vec![s1], Some(result)));

    // $i = 1; $i++; return $i;
    let i = b.var("i");
    let one = b.long(1);
    let s1 = b.assign(i, one);
    let i = b.var("i");
    let loc = b.loc();
    let s2 = b.f.create_increment(loc, i, 1, true);
    let result = b.var("i");
    functions.push(FunctionDecl::new("post_increment", vec![], vec![s1, s2], Some(result)));

    // $s = "abc"; $s{1} = "X"; return $s;
    let s = b.var("s");
    let abc = b.string("abc");
    let s1 = b.assign(s, abc);
    let s = b.var("s");
    let index = b.long(1);
    let loc = b.loc();
    let at = b.f.create_char_at(loc, s, index);
    let x = b.string("X");
    let s2 = b.assign(at, x);
    let result = b.var("s");
    functions.push(FunctionDecl::new("char_write", vec![], vec![s1, s2], Some(result)));

    // $k = 40; $f = function ($n) use ($k) { return $k + $n; }; return $f(2);
    let k = b.var("k");
    let forty = b.long(40);
    let s1 = b.assign(k, forty);
    let left = b.var("k");
    let right = b.var("n");
    let sum = b.binary(BinaryOp::Add, left, right);
    let body = FunctionDecl::new("{closure}", vec![Param::new("n")], vec![], Some(sum));
    let closure = b.closure(body, &[("k", false)]);
    let fv = b.var("f");
    let s2 = b.assign(fv, closure);
    let two = b.long(2);
    let result = b.call_value("f", vec![two]);
    functions.push(FunctionDecl::new("closure_by_value", vec![], vec![s1, s2], Some(result)));

    // $t = 1; $g = function () use (&$t) { $t = 10; }; $g(); return $t;
    let t = b.var("t");
    let one = b.long(1);
    let s1 = b.assign(t, one);
    let t = b.var("t");
    let ten = b.long(10);
    let inner = b.assign(t, ten);
    let body = FunctionDecl::new("{closure}", vec![], vec![inner], None);
    let closure = b.closure(body, &[("t", true)]);
    let g = b.var("g");
    let s2 = b.assign(g, closure);
    let s3 = b.call_value("g", vec![]);
    let result = b.var("t");
    functions.push(FunctionDecl::new("closure_by_ref", vec![], vec![s1, s2, s3], Some(result)));

    // $x = 1; include "vars.php"; return $x + $y;
    let x = b.var("x");
    let one = b.long(1);
    let s1 = b.assign(x, one);
    let path = b.string("vars.php");
    let loc = b.loc();
    let s2 = b.f.create_include(loc, path, IncludeMode::Include);
    let left = b.var("x");
    let right = b.var("y");
    let result = b.binary(BinaryOp::Add, left, right);
    functions.push(FunctionDecl::new("symbol_frame", vec![], vec![s1, s2], Some(result)));

    CompilationUnit::new(Some("scenarios.php"), functions)
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let compiled = compile_unit(
        &scenarios(),
        &SignatureTable::builtins(),
        &CodegenConfig::new(),
    )
    .expect("scenario unit compiles");

    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("scenarios.rs");
    fs::write(&dest_path, compiled.code).unwrap();
}
