use super::*;
use crate::ir::{ArrayEntry, CapturedVar, ExprFactory, IncludeMode, Param};
use crate::span::Location;

fn f() -> ExprFactory {
    ExprFactory::new(Some("a.php"))
}

fn loc() -> Location {
    Location::new(Some("a.php"), 1, 1)
}

fn analyze(decl: &FunctionDecl) -> FunctionFacts {
    Analyzer::new(&SignatureTable::builtins()).analyze_function(decl)
}

fn body(stmts: Vec<Expr>) -> FunctionDecl {
    FunctionDecl::new("t", vec![], stmts, None)
}

fn var_storage(facts: &FunctionFacts, name: &str) -> Storage {
    facts.var_named(name).map(|v| v.storage).unwrap_or_else(|| panic!("no ${}", name))
}

// ========== Types ==========

#[test]
fn test_literal_comparison_is_boolean_over_longs() {
    let f = f();
    let cmp = f.create_binary(loc(), BinaryOp::Gt, f.create_long(loc(), 5), f.create_long(loc(), 3));
    let decl = body(vec![cmp]);
    analyze(&decl);
    let ExprKind::Binary { left, right, .. } = &decl.body[0].kind else {
        panic!("not a binary node");
    };
    assert_eq!(decl.body[0].expr_type(), ExprType::Boolean);
    assert_eq!(left.expr_type(), ExprType::Long);
    assert_eq!(right.expr_type(), ExprType::Long);
}

#[test]
fn test_binary_result_types() {
    use ExprType::*;
    assert_eq!(binary_result_type(BinaryOp::Add, Long, Long), Value);
    assert_eq!(binary_result_type(BinaryOp::Add, Long, Double), Double);
    assert_eq!(binary_result_type(BinaryOp::Mul, Double, Double), Double);
    assert_eq!(binary_result_type(BinaryOp::Add, Double, String), Value);
    assert_eq!(binary_result_type(BinaryOp::Div, Double, Double), Value);
    assert_eq!(binary_result_type(BinaryOp::BitAnd, Long, Long), Long);
    assert_eq!(binary_result_type(BinaryOp::BitAnd, Long, Value), Value);
    assert_eq!(binary_result_type(BinaryOp::Shl, Value, Value), Long);
    assert_eq!(binary_result_type(BinaryOp::Concat, Long, Long), String);
    assert_eq!(binary_result_type(BinaryOp::Identical, Value, Value), Boolean);
}

#[test]
fn test_unary_result_types() {
    use ExprType::*;
    assert_eq!(unary_result_type(UnaryOp::Neg, Long), Value);
    assert_eq!(unary_result_type(UnaryOp::Neg, Double), Double);
    assert_eq!(unary_result_type(UnaryOp::Plus, Long), Long);
    assert_eq!(unary_result_type(UnaryOp::BitNot, Long), Long);
    assert_eq!(unary_result_type(UnaryOp::BitNot, Double), Value);
    assert_eq!(unary_result_type(UnaryOp::Not, Value), Boolean);
    assert_eq!(unary_result_type(UnaryOp::ToString, Long), String);
    assert_eq!(unary_result_type(UnaryOp::Suppress, Double), Double);
    assert_eq!(unary_result_type(UnaryOp::Ref, Long), Value);
}

#[test]
fn test_assignment_type_flows_to_later_reads() {
    let f = f();
    let decl = FunctionDecl::new(
        "t",
        vec![],
        vec![f.create_assign(loc(), f.create_var(loc(), "i"), f.create_long(loc(), 1))],
        Some(f.create_var(loc(), "i")),
    );
    let facts = analyze(&decl);
    assert_eq!(decl.result.as_ref().map(|r| r.expr_type()), Some(ExprType::Long));
    assert_eq!(var_storage(&facts, "i"), Storage::Typed(ExprType::Long));
}

#[test]
fn test_read_before_assignment_is_value() {
    let f = f();
    let decl = body(vec![
        f.create_binary(loc(), BinaryOp::Add, f.create_var(loc(), "n"), f.create_long(loc(), 1)),
        f.create_assign(loc(), f.create_var(loc(), "n"), f.create_long(loc(), 2)),
    ]);
    let facts = analyze(&decl);
    let var = facts.var_named("n").unwrap();
    assert!(var.flags.read_unassigned);
    assert_eq!(var.storage, Storage::Value);
}

#[test]
fn test_mixed_assignments_widen_to_value() {
    let f = f();
    let decl = body(vec![
        f.create_assign(loc(), f.create_var(loc(), "x"), f.create_long(loc(), 1)),
        f.create_assign(loc(), f.create_var(loc(), "x"), f.create_string(loc(), "one")),
    ]);
    let facts = analyze(&decl);
    let var = facts.var_named("x").unwrap();
    assert_eq!(var.assigned_type, ExprType::Value);
    assert_eq!(var.storage, Storage::Value);
}

#[test]
fn test_string_locals_stay_boxed() {
    let f = f();
    let decl = body(vec![f.create_assign(
        loc(),
        f.create_var(loc(), "s"),
        f.create_string(loc(), "abc"),
    )]);
    let facts = analyze(&decl);
    assert_eq!(facts.var_named("s").unwrap().assigned_type, ExprType::String);
    assert_eq!(var_storage(&facts, "s"), Storage::Value);
}

// ========== Flags and storage ==========

#[test]
fn test_reference_assignment_marks_both_sides() {
    let f = f();
    // $x = &$y; $x = 3;
    let decl = body(vec![
        f.create_assign_ref(loc(), f.create_var(loc(), "x"), f.create_var(loc(), "y")),
        f.create_assign(loc(), f.create_var(loc(), "x"), f.create_long(loc(), 3)),
    ]);
    let facts = analyze(&decl);
    for name in ["x", "y"] {
        let var = facts.var_named(name).unwrap();
        assert!(var.flags.is_reference, "${} not a reference", name);
        assert_eq!(var.storage, Storage::Ref);
    }
    let ExprKind::Assign { target, .. } = &decl.body[1].kind else {
        panic!("not an assignment");
    };
    assert_eq!(target.expr_type(), ExprType::Long);
}

#[test]
fn test_element_write_marks_base_modified() {
    let f = f();
    let elem = f.create_array_get(loc(), f.create_var(loc(), "a"), f.create_long(loc(), 0));
    let decl = body(vec![f.create_assign(loc(), elem, f.create_long(loc(), 1))]);
    let facts = analyze(&decl);
    let var = facts.var_named("a").unwrap();
    assert!(var.flags.is_modified);
    assert!(!var.flags.is_reference);
    assert_eq!(var.storage, Storage::Value);
}

#[test]
fn test_increment_prevents_narrowing() {
    let f = f();
    let decl = body(vec![
        f.create_assign(loc(), f.create_var(loc(), "i"), f.create_long(loc(), 0)),
        f.create_increment(loc(), f.create_var(loc(), "i"), 1, true),
    ]);
    let facts = analyze(&decl);
    assert!(facts.var_named("i").unwrap().flags.is_modified);
    assert_eq!(var_storage(&facts, "i"), Storage::Value);
}

#[test]
fn test_unknown_callee_takes_arguments_by_reference() {
    let f = f();
    let decl = body(vec![
        f.create_assign(loc(), f.create_var(loc(), "a"), f.create_long(loc(), 1)),
        f.create_call(loc(), "mystery", vec![f.create_var(loc(), "a")]),
    ]);
    let facts = analyze(&decl);
    let var = facts.var_named("a").unwrap();
    assert!(var.flags.is_reference);
    assert!(var.flags.is_modified);
    assert_eq!(var.storage, Storage::Ref);
}

#[test]
fn test_by_value_builtin_leaves_argument_alone() {
    let f = f();
    let decl = body(vec![
        f.create_assign(loc(), f.create_var(loc(), "s"), f.create_long(loc(), 1)),
        f.create_call(loc(), "strlen", vec![f.create_var(loc(), "s")]),
    ]);
    let facts = analyze(&decl);
    assert!(!facts.var_named("s").unwrap().flags.is_reference);
    assert_eq!(var_storage(&facts, "s"), Storage::Typed(ExprType::Long));
}

#[test]
fn test_by_ref_builtin_position() {
    let f = f();
    let decl = body(vec![f.create_call(
        loc(),
        "preg_match",
        vec![
            f.create_var(loc(), "re"),
            f.create_var(loc(), "subject"),
            f.create_var(loc(), "m"),
        ],
    )]);
    let facts = analyze(&decl);
    assert!(!facts.var_named("re").unwrap().flags.is_reference);
    assert!(!facts.var_named("subject").unwrap().flags.is_reference);
    assert!(facts.var_named("m").unwrap().flags.is_reference);
}

#[test]
fn test_arguments_are_never_narrowed() {
    let f = f();
    let decl = FunctionDecl::new(
        "t",
        vec![Param::new("n"), Param::by_ref("out")],
        vec![f.create_assign(loc(), f.create_var(loc(), "n"), f.create_long(loc(), 1))],
        None,
    );
    let facts = analyze(&decl);
    assert!(facts.var_named("n").unwrap().flags.is_argument);
    assert_eq!(var_storage(&facts, "n"), Storage::Value);
    assert_eq!(var_storage(&facts, "out"), Storage::Ref);
}

#[test]
fn test_unset_variable_stays_boxed() {
    let f = f();
    let decl = body(vec![
        f.create_assign(loc(), f.create_var(loc(), "t"), f.create_long(loc(), 1)),
        f.create_unset(loc(), f.create_var(loc(), "t")),
    ]);
    let facts = analyze(&decl);
    assert!(facts.var_named("t").unwrap().flags.is_unset);
    assert_eq!(var_storage(&facts, "t"), Storage::Value);
}

#[test]
fn test_superglobals_are_global() {
    let f = f();
    let read = f.create_array_get(loc(), f.create_var(loc(), "_GET"), f.create_string(loc(), "q"));
    let decl = body(vec![read]);
    let facts = analyze(&decl);
    assert_eq!(var_storage(&facts, "_GET"), Storage::Global);
    assert!(is_superglobal("GLOBALS"));
    assert!(!is_superglobal("get"));
}

#[test]
fn test_flags_only_grow() {
    let f = f();
    // A later plain assignment does not clear the reference flag.
    let decl = body(vec![
        f.create_assign_ref(loc(), f.create_var(loc(), "r"), f.create_var(loc(), "s")),
        f.create_assign(loc(), f.create_var(loc(), "r"), f.create_long(loc(), 1)),
        f.create_assign(loc(), f.create_var(loc(), "r"), f.create_long(loc(), 2)),
    ]);
    let facts = analyze(&decl);
    let flags = facts.var_named("r").unwrap().flags;
    assert!(flags.is_reference);
    assert!(flags.is_assigned);
}

// ========== Destructuring ==========

#[test]
fn test_list_allocates_one_temp_and_assigns_in_order() {
    let f = f();
    // list($a, $b) = $arr;
    let list = f.create_list(
        loc(),
        vec![Some(f.create_var(loc(), "a")), Some(f.create_var(loc(), "b"))],
        f.create_var(loc(), "arr"),
    );
    let decl = body(vec![list]);
    let facts = analyze(&decl);
    assert_eq!(facts.temps(), &["_l0".to_string()]);
    assert_eq!(decl.body[0].temp(), "_l0");

    let names: Vec<&str> = facts.vars().iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["arr", "a", "b"]);
    for name in ["a", "b"] {
        let var = facts.var_named(name).unwrap();
        assert!(var.flags.is_assigned);
        assert_eq!(var.assigned_type, ExprType::Value);
    }
}

#[test]
fn test_list_skips_empty_slots() {
    let f = f();
    let list = f.create_list(
        loc(),
        vec![None, Some(f.create_var(loc(), "second"))],
        f.create_var(loc(), "pair"),
    );
    let decl = body(vec![list]);
    let facts = analyze(&decl);
    assert_eq!(facts.vars().len(), 2);
    assert!(facts.var_named("second").unwrap().flags.is_assigned);
}

#[test]
fn test_temps_are_distinct_per_list() {
    let f = f();
    let one = f.create_list(loc(), vec![Some(f.create_var(loc(), "a"))], f.create_var(loc(), "x"));
    let two = f.create_list(loc(), vec![Some(f.create_var(loc(), "b"))], f.create_var(loc(), "y"));
    let facts = analyze(&body(vec![one, two]));
    assert_eq!(facts.temps(), &["_l0".to_string(), "_l1".to_string()]);
}

// ========== Symbol table ==========

#[test]
fn test_include_uses_symbol_table() {
    let f = f();
    let decl = body(vec![
        f.create_assign(loc(), f.create_var(loc(), "x"), f.create_long(loc(), 1)),
        f.create_include(loc(), f.create_var(loc(), "path"), IncludeMode::Include),
    ]);
    let facts = analyze(&decl);
    assert!(facts.uses_symbol_table());
    let x = facts.var_named("x").unwrap();
    assert!(x.flags.is_symbol_table_visible);
    assert!(matches!(x.storage, Storage::Symbol(_)));
    assert_eq!(facts.symbol_names(), &["x".to_string(), "path".to_string()]);
}

#[test]
fn test_compact_uses_symbol_table() {
    let f = f();
    let decl = body(vec![f.create_call(loc(), "compact", vec![f.create_string(loc(), "a")])]);
    assert!(analyze(&decl).uses_symbol_table());
}

#[test]
fn test_symbol_table_info_flag() {
    let info = FunctionInfo {
        uses_symbol_table: true,
        ..FunctionInfo::default()
    };
    let f = f();
    let decl = FunctionDecl::new(
        "t",
        vec![Param::new("p")],
        vec![f.create_assign(loc(), f.create_var(loc(), "q"), f.create_long(loc(), 1))],
        None,
    )
    .with_info(info);
    let facts = analyze(&decl);
    assert_eq!(var_storage(&facts, "p"), Storage::Symbol(0));
    assert_eq!(var_storage(&facts, "q"), Storage::Symbol(1));
}

#[test]
fn test_types_after_include_are_value() {
    let f = f();
    let decl = FunctionDecl::new(
        "t",
        vec![],
        vec![
            f.create_assign(loc(), f.create_var(loc(), "n"), f.create_long(loc(), 1)),
            f.create_include(loc(), f.create_string(loc(), "x.php"), IncludeMode::Require),
        ],
        Some(f.create_var(loc(), "n")),
    );
    analyze(&decl);
    assert_eq!(decl.result.as_ref().map(|r| r.expr_type()), Some(ExprType::Value));
}

// ========== Flow ==========

#[test]
fn test_conditional_branches_merge() {
    let f = f();
    // $c ? ($v = 1) : ($v = 2.5); $v
    let cond = f.create_conditional(
        loc(),
        f.create_var(loc(), "c"),
        f.create_assign(loc(), f.create_var(loc(), "v"), f.create_long(loc(), 1)),
        f.create_assign(loc(), f.create_var(loc(), "v"), f.create_double(loc(), 2.5)),
    );
    let decl = FunctionDecl::new("t", vec![], vec![cond], Some(f.create_var(loc(), "v")));
    analyze(&decl);
    assert_eq!(decl.body[0].expr_type(), ExprType::Value);
    assert_eq!(decl.result.as_ref().map(|r| r.expr_type()), Some(ExprType::Value));
}

#[test]
fn test_one_armed_assignment_is_maybe_assigned() {
    let f = f();
    // $c && ($v = 1); $v + 1
    let guarded = f.create_binary(
        loc(),
        BinaryOp::And,
        f.create_var(loc(), "c"),
        f.create_assign(loc(), f.create_var(loc(), "v"), f.create_long(loc(), 1)),
    );
    let read = f.create_binary(loc(), BinaryOp::Add, f.create_var(loc(), "v"), f.create_long(loc(), 1));
    let facts = analyze(&body(vec![guarded, read]));
    let v = facts.var_named("v").unwrap();
    assert!(v.flags.read_unassigned);
    assert_eq!(v.storage, Storage::Value);
}

#[test]
fn test_both_branches_same_type_stays_narrow() {
    let f = f();
    let cond = f.create_conditional(
        loc(),
        f.create_var(loc(), "c"),
        f.create_assign(loc(), f.create_var(loc(), "v"), f.create_long(loc(), 1)),
        f.create_assign(loc(), f.create_var(loc(), "v"), f.create_long(loc(), 2)),
    );
    let decl = FunctionDecl::new("t", vec![], vec![cond], Some(f.create_var(loc(), "v")));
    let facts = analyze(&decl);
    assert_eq!(decl.result.as_ref().map(|r| r.expr_type()), Some(ExprType::Long));
    assert_eq!(var_storage(&facts, "v"), Storage::Typed(ExprType::Long));
}

// ========== Closures ==========

#[test]
fn test_closure_captures() {
    let f = f();
    let inner = FunctionDecl::new(
        "{closure}",
        vec![Param::new("arg")],
        vec![f.create_assign(loc(), f.create_var(loc(), "total"), f.create_var(loc(), "arg"))],
        None,
    );
    let closure = f.create_closure(
        loc(),
        inner,
        vec![
            CapturedVar {
                name: "total".to_string(),
                by_ref: true,
            },
            CapturedVar {
                name: "seed".to_string(),
                by_ref: false,
            },
        ],
    );
    let decl = body(vec![
        f.create_assign(loc(), f.create_var(loc(), "seed"), f.create_long(loc(), 7)),
        f.create_assign(loc(), f.create_var(loc(), "fn"), closure),
    ]);
    let facts = analyze(&decl);
    assert_eq!(var_storage(&facts, "total"), Storage::Ref);
    assert_eq!(var_storage(&facts, "seed"), Storage::Typed(ExprType::Long));

    let ExprKind::Assign { value, .. } = &decl.body[1].kind else {
        panic!("not an assignment");
    };
    let inner = value.closure_facts();
    assert!(inner.var_named("total").unwrap().flags.is_argument);
    assert_eq!(inner.storage(inner.lookup("total").unwrap()), Storage::Ref);
    assert_eq!(inner.storage(inner.lookup("seed").unwrap()), Storage::Value);
    assert!(inner.var_named("arg").unwrap().flags.is_argument);
}

// ========== Array literals and misc ==========

#[test]
fn test_by_ref_array_entry_is_reference() {
    let f = f();
    let lit = f.create_array_literal(
        loc(),
        vec![ArrayEntry {
            key: None,
            value: f.create_var(loc(), "held"),
            by_ref: true,
        }],
    );
    let facts = analyze(&body(vec![lit]));
    assert_eq!(var_storage(&facts, "held"), Storage::Ref);
}

#[test]
fn test_unset_this_faults() {
    let f = f();
    let decl = body(vec![f.create_unset(loc(), f.create_this(loc()))])
        .with_info(FunctionInfo::method("A"));
    let message = catch_message(|| {
        analyze(&decl);
    });
    assert!(message.contains("cannot unset $this"), "got {}", message);
}

#[test]
fn test_analysis_twice_faults_without_reset() {
    let f = f();
    let mut decl = body(vec![f.create_long(loc(), 1)]);
    analyze(&decl);
    assert!(crate::error::catch_fault(|| analyze(&decl)).is_err());
    decl.reset_analysis();
    assert!(crate::error::catch_fault(|| analyze(&decl)).is_ok());
}

#[test]
fn test_class_scope_resolution() {
    let info = FunctionInfo::static_method("Shape");
    assert_eq!(resolve_class_scope("self", &info), "Shape");
    assert_eq!(resolve_class_scope("STATIC", &info), "Shape");
    assert_eq!(resolve_class_scope("parent", &info), "parent");
    assert_eq!(resolve_class_scope("self", &FunctionInfo::default()), "self");
}

/// Message of an internal fault raised by `work`
fn catch_message(work: impl FnOnce()) -> String {
    match crate::error::catch_fault(work) {
        Err(err) => err.to_string(),
        Ok(()) => "no fault".to_string(),
    }
}
