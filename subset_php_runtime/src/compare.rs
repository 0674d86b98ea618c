//! Loose and strict comparison
//!
//! PHP 5 comparison rules, in order:
//! - null against a string compares `""` with the string
//! - a boolean or null on either side compares both sides as booleans
//! - two numeric strings compare as numbers, other string pairs bytewise
//! - a number against a string compares the string's numeric value
//! - arrays compare by size, then element by element
//! - an array is greater than any scalar
//!
//! `None` means the operands are not ordered (NaN, arrays with different
//! keys, distinct objects); every ordered comparison is then false.

use std::cmp::Ordering;

use crate::array::PhpArray;
use crate::convert::{self, Number};
use crate::object::{Callable, ObjectRef};
use crate::value::Value;

fn compare_numbers(a: Number, b: Number) -> Option<Ordering> {
    match (a, b) {
        (Number::Long(x), Number::Long(y)) => Some(x.cmp(&y)),
        (x, y) => x.to_double().partial_cmp(&y.to_double()),
    }
}

fn compare_arrays(a: &PhpArray, b: &PhpArray) -> Option<Ordering> {
    match a.len().cmp(&b.len()) {
        Ordering::Equal => {}
        other => return Some(other),
    }
    for (key, value) in a.iter() {
        let other = b.get(key)?;
        match loose_compare(value, other)? {
            Ordering::Equal => {}
            unequal => return Some(unequal),
        }
    }
    Some(Ordering::Equal)
}

/// Three-way loose comparison
pub fn loose_compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Ref(x), _) => loose_compare(&x.to_value(), b),
        (_, Value::Ref(y)) => loose_compare(a, &y.to_value()),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, Value::Str(s)) => Some("".cmp(s.as_str())),
        (Value::Str(s), Value::Null) => Some(s.as_str().cmp("")),
        (Value::Bool(_) | Value::Null, _) | (_, Value::Bool(_) | Value::Null) => {
            Some(a.to_boolean().cmp(&b.to_boolean()))
        }
        (Value::Long(x), Value::Long(y)) => Some(x.cmp(y)),
        (Value::Long(_) | Value::Double(_), Value::Long(_) | Value::Double(_)) => {
            compare_numbers(a.to_number(), b.to_number())
        }
        (Value::Str(x), Value::Str(y)) => {
            match (
                convert::numeric_string(x.as_str()),
                convert::numeric_string(y.as_str()),
            ) {
                (Some(nx), Some(ny)) => compare_numbers(nx, ny),
                _ => Some(x.cmp(y)),
            }
        }
        (Value::Long(_) | Value::Double(_), Value::Str(_))
        | (Value::Str(_), Value::Long(_) | Value::Double(_)) => {
            compare_numbers(a.to_number(), b.to_number())
        }
        (Value::Array(x), Value::Array(y)) => compare_arrays(x, y),
        (Value::Array(_), _) => Some(Ordering::Greater),
        (_, Value::Array(_)) => Some(Ordering::Less),
        (Value::Object(x), Value::Object(y)) if ObjectRef::ptr_eq(x, y) => Some(Ordering::Equal),
        (Value::Closure(x), Value::Closure(y)) if Callable::ptr_eq(x, y) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Strict comparison (`===`)
pub fn identical(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Ref(x), _) => identical(&x.to_value(), b),
        (_, Value::Ref(y)) => identical(a, &y.to_value()),
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Long(x), Value::Long(y)) => x == y,
        (Value::Double(x), Value::Double(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .zip(y.iter())
                    .all(|((kx, vx), (ky, vy))| kx == ky && identical(vx, vy))
        }
        (Value::Object(x), Value::Object(y)) => ObjectRef::ptr_eq(x, y),
        (Value::Closure(x), Value::Closure(y)) => Callable::ptr_eq(x, y),
        _ => false,
    }
}

impl Value {
    /// `==`
    pub fn eq(&self, other: &Value) -> bool {
        loose_compare(self, other) == Some(Ordering::Equal)
    }

    /// `===`
    pub fn eql(&self, other: &Value) -> bool {
        identical(self, other)
    }

    /// `<`
    pub fn lt(&self, other: &Value) -> bool {
        loose_compare(self, other) == Some(Ordering::Less)
    }

    /// `<=`
    pub fn leq(&self, other: &Value) -> bool {
        matches!(
            loose_compare(self, other),
            Some(Ordering::Less | Ordering::Equal)
        )
    }

    /// `>`
    pub fn gt(&self, other: &Value) -> bool {
        loose_compare(self, other) == Some(Ordering::Greater)
    }

    /// `>=`
    pub fn geq(&self, other: &Value) -> bool {
        matches!(
            loose_compare(self, other),
            Some(Ordering::Greater | Ordering::Equal)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_and_strings() {
        assert!(Value::NULL.eq(&Value::EMPTY_STRING));
        assert!(!Value::NULL.eq(&Value::from_static("0")));
        assert!(Value::NULL.lt(&Value::from_static("a")));
    }

    #[test]
    fn test_booleans_compare_as_booleans() {
        assert!(Value::TRUE.eq(&Value::from_static("abc")));
        assert!(Value::FALSE.eq(&Value::from_static("0")));
        assert!(Value::TRUE.eq(&Value::from_long(-3)));
        assert!(Value::FALSE.lt(&Value::TRUE));
    }

    #[test]
    fn test_numeric_strings() {
        assert!(Value::from_static("10").eq(&Value::from_static("1e1")));
        assert!(Value::from_static("abc").eq(&Value::from_long(0)));
        assert!(Value::from_static("9").lt(&Value::from_static("10")));
        assert!(Value::from_static("b").gt(&Value::from_static("abc")));
    }

    #[test]
    fn test_mixed_numbers() {
        assert!(Value::from_long(1).lt(&Value::from_double(1.5)));
        assert!(Value::from_double(2.0).eq(&Value::from_long(2)));
        assert!(!Value::from_double(f64::NAN).eq(&Value::from_double(f64::NAN)));
        assert!(!Value::from_double(f64::NAN).lt(&Value::from_long(1)));
    }

    #[test]
    fn test_arrays() {
        let mut a = Value::new_array();
        a.append(Value::from_long(1));
        let mut b = Value::new_array();
        b.append(Value::from_static("1"));
        assert!(a.eq(&b));
        assert!(!a.eql(&b));
        assert!(a.gt(&Value::from_long(100)));
        b.append(Value::from_long(2));
        assert!(a.lt(&b));
    }

    #[test]
    fn test_identity() {
        assert!(Value::from_long(1).eql(&Value::from_long(1)));
        assert!(!Value::from_long(1).eql(&Value::from_double(1.0)));
        assert!(!Value::from_static("1").eql(&Value::from_long(1)));
    }
}
