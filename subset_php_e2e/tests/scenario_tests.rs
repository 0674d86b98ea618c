//! Run each compiled scenario against `TestHost` and check its result

use subset_php_e2e::host::{TestHost, INCLUDED_Y};
use subset_php_e2e::scenarios;
use subset_php_runtime::prelude::Value;

fn long_of(value: Value) -> Option<i64> {
    value.to_value().as_long()
}

fn string_of(value: Value) -> String {
    value.to_string_value().as_str().to_string()
}

// ========== Assignment ==========

#[test]
fn test_assignment_in_value_context() {
    let mut env = TestHost::new();
    assert_eq!(string_of(scenarios::f_assign_in_concat(&mut env)), "xy");
}

#[test]
fn test_chained_assignment_copies_array() {
    let mut env = TestHost::new();
    assert_eq!(long_of(scenarios::f_chained_assign(&mut env)), Some(9));
}

#[test]
fn test_reference_pair_shares_cell() {
    let mut env = TestHost::new();
    assert_eq!(long_of(scenarios::f_ref_pair(&mut env)), Some(3));
}

// ========== Arrays and strings ==========

#[test]
fn test_array_element_writes() {
    let mut env = TestHost::new();
    assert_eq!(long_of(scenarios::f_element_writes(&mut env)), Some(6));
}

#[test]
fn test_reference_to_array_element() {
    let mut env = TestHost::new();
    assert_eq!(long_of(scenarios::f_element_ref(&mut env)), Some(7));
}

#[test]
fn test_list_as_statement_skips_holes() {
    let mut env = TestHost::new();
    assert_eq!(long_of(scenarios::f_list_statement(&mut env)), Some(3));
}

#[test]
fn test_list_yields_its_array() {
    let mut env = TestHost::new();
    assert_eq!(long_of(scenarios::f_list_value(&mut env)), Some(11));
}

#[test]
fn test_post_increment() {
    let mut env = TestHost::new();
    assert_eq!(long_of(scenarios::f_post_increment(&mut env)), Some(2));
}

#[test]
fn test_char_write() {
    let mut env = TestHost::new();
    assert_eq!(string_of(scenarios::f_char_write(&mut env)), "aXc");
}

// ========== Closures ==========

#[test]
fn test_closure_captures_by_value() {
    let mut env = TestHost::new();
    assert_eq!(long_of(scenarios::f_closure_by_value(&mut env)), Some(42));
}

#[test]
fn test_closure_writes_through_reference_capture() {
    let mut env = TestHost::new();
    assert_eq!(long_of(scenarios::f_closure_by_ref(&mut env)), Some(10));
}

// ========== Symbol tables ==========

#[test]
fn test_include_sees_symbol_frame() {
    let mut env = TestHost::new();
    let result = scenarios::f_symbol_frame(&mut env);
    assert_eq!(long_of(result), Some(1 + INCLUDED_Y));
    assert_eq!(env.included, vec!["vars.php".to_string()]);
    assert_eq!(env.frame_depth(), 0);
}
