use subset_php_runtime::prelude::*;

#[allow(unused_mut, unused_variables, unused_assignments, unreachable_code, non_snake_case)]
pub fn f_add(env: &mut dyn Environment, p_a: Value, p_b: Value) -> Value {
    let mut v_n: bool = false;
    let mut v_a: Value = p_a;
    let mut v_b: Value = p_b;
    v_n = (5_i64 > 3_i64);
    v_a.clone().add(&v_b.clone())
}

#[allow(unused_mut, unused_variables, unused_assignments, unreachable_code, non_snake_case)]
pub fn f_scale(env: &mut dyn Environment) -> Value {
    let mut v_d: f64 = 0.0_f64;
    let mut v_i: i64 = 0_i64;
    v_d = (0.5_f64 * 4.0_f64);
    v_i = 7_i64;
    add_long(v_i, 1_i64)
}
