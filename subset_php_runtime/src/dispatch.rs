//! Arithmetic and dynamic operator dispatch
//!
//! Two families live here. The `Value` methods (`add`, `sub`, ...) are the
//! generic forms compiled code falls back to. The free `*_long` helpers take
//! raw operands and are what the compiler emits when both operands are
//! statically longs; they must agree with the generic forms on every input.

// SAFETY: shift counts are range-checked to 0..64 before the i64→u32 cast.
#![allow(clippy::cast_sign_loss)]

use crate::array::PhpArray;
use crate::convert::Number;
use crate::value::Value;
use std::rc::Rc;

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    Identical,
    NotIdentical,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinOp {
    /// PHP operator spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Identical => "===",
            BinOp::NotIdentical => "!==",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
        }
    }

    pub const ALL: [BinOp; 18] = [
        BinOp::Add,
        BinOp::Sub,
        BinOp::Mul,
        BinOp::Div,
        BinOp::Mod,
        BinOp::Lt,
        BinOp::Gt,
        BinOp::Le,
        BinOp::Ge,
        BinOp::Eq,
        BinOp::Ne,
        BinOp::Identical,
        BinOp::NotIdentical,
        BinOp::BitAnd,
        BinOp::BitOr,
        BinOp::BitXor,
        BinOp::Shl,
        BinOp::Shr,
    ];
}

/// Generic (boxed) evaluation of a binary operator
pub fn dynamic_binop(op: BinOp, lhs: &Value, rhs: &Value) -> Value {
    match op {
        BinOp::Add => lhs.add(rhs),
        BinOp::Sub => lhs.sub(rhs),
        BinOp::Mul => lhs.mul(rhs),
        BinOp::Div => lhs.div(rhs),
        BinOp::Mod => lhs.modulo(rhs),
        BinOp::Lt => Value::from_bool(lhs.lt(rhs)),
        BinOp::Gt => Value::from_bool(lhs.gt(rhs)),
        BinOp::Le => Value::from_bool(lhs.leq(rhs)),
        BinOp::Ge => Value::from_bool(lhs.geq(rhs)),
        BinOp::Eq => Value::from_bool(lhs.eq(rhs)),
        BinOp::Ne => Value::from_bool(!lhs.eq(rhs)),
        BinOp::Identical => Value::from_bool(lhs.eql(rhs)),
        BinOp::NotIdentical => Value::from_bool(!lhs.eql(rhs)),
        BinOp::BitAnd => lhs.bit_and(rhs),
        BinOp::BitOr => lhs.bit_or(rhs),
        BinOp::BitXor => lhs.bit_xor(rhs),
        BinOp::Shl => lhs.shl(rhs),
        BinOp::Shr => lhs.shr(rhs),
    }
}

/// Specialized evaluation for two longs, mirroring the code the compiler
/// emits for that case.
pub fn raw_long_binop(op: BinOp, a: i64, b: i64) -> Value {
    match op {
        BinOp::Add => add_long(a, b),
        BinOp::Sub => sub_long(a, b),
        BinOp::Mul => mul_long(a, b),
        BinOp::Div => div_long(a, b),
        BinOp::Mod => mod_long(a, b),
        BinOp::Lt => Value::from_bool(a < b),
        BinOp::Gt => Value::from_bool(a > b),
        BinOp::Le => Value::from_bool(a <= b),
        BinOp::Ge => Value::from_bool(a >= b),
        BinOp::Eq | BinOp::Identical => Value::from_bool(a == b),
        BinOp::Ne | BinOp::NotIdentical => Value::from_bool(a != b),
        BinOp::BitAnd => Value::from_long(a & b),
        BinOp::BitOr => Value::from_long(a | b),
        BinOp::BitXor => Value::from_long(a ^ b),
        BinOp::Shl => Value::from_long(shl_long(a, b)),
        BinOp::Shr => Value::from_long(shr_long(a, b)),
    }
}

// ========== Raw long helpers ==========

/// `+` on longs, overflowing into a double
pub fn add_long(a: i64, b: i64) -> Value {
    match a.checked_add(b) {
        Some(r) => Value::Long(r),
        None => Value::Double(a as f64 + b as f64),
    }
}

pub fn sub_long(a: i64, b: i64) -> Value {
    match a.checked_sub(b) {
        Some(r) => Value::Long(r),
        None => Value::Double(a as f64 - b as f64),
    }
}

pub fn mul_long(a: i64, b: i64) -> Value {
    match a.checked_mul(b) {
        Some(r) => Value::Long(r),
        None => Value::Double(a as f64 * b as f64),
    }
}

/// `/` on longs: exact quotients stay long, division by zero is false
pub fn div_long(a: i64, b: i64) -> Value {
    if b == 0 {
        return Value::FALSE;
    }
    match (a.checked_rem(b), a.checked_div(b)) {
        (Some(0), Some(q)) => Value::Long(q),
        _ => Value::Double(a as f64 / b as f64),
    }
}

pub fn div_double(a: f64, b: f64) -> Value {
    if b == 0.0 {
        Value::FALSE
    } else {
        Value::Double(a / b)
    }
}

/// `%` on longs; the result takes the sign of the dividend
pub fn mod_long(a: i64, b: i64) -> Value {
    if b == 0 {
        return Value::FALSE;
    }
    Value::Long(a.checked_rem(b).unwrap_or(0))
}

pub fn neg_long(a: i64) -> Value {
    match a.checked_neg() {
        Some(r) => Value::Long(r),
        None => Value::Double(-(a as f64)),
    }
}

/// `<<` on longs. Counts outside `0..64` shift everything out.
pub fn shl_long(a: i64, b: i64) -> i64 {
    if (0..64).contains(&b) {
        a.wrapping_shl(b as u32)
    } else {
        0
    }
}

/// `>>` on longs (arithmetic shift)
pub fn shr_long(a: i64, b: i64) -> i64 {
    if (0..64).contains(&b) {
        a >> b
    } else if a < 0 {
        -1
    } else {
        0
    }
}

fn number_value(n: Number) -> Value {
    match n {
        Number::Long(v) => Value::Long(v),
        Number::Double(d) => Value::Double(d),
    }
}

// ========== Generic operators ==========

impl Value {
    /// `+`; two arrays give their union
    pub fn add(&self, other: &Value) -> Value {
        if let (Value::Array(a), Value::Array(b)) = (self.to_value(), other.to_value()) {
            let mut union: PhpArray = (*a).clone();
            for (key, value) in b.iter() {
                if !union.contains_key(key) {
                    union.insert(key.clone(), value.to_value());
                }
            }
            return Value::Array(Rc::new(union));
        }
        match (self.to_number(), other.to_number()) {
            (Number::Long(x), Number::Long(y)) => add_long(x, y),
            (x, y) => Value::Double(x.to_double() + y.to_double()),
        }
    }

    pub fn sub(&self, other: &Value) -> Value {
        match (self.to_number(), other.to_number()) {
            (Number::Long(x), Number::Long(y)) => sub_long(x, y),
            (x, y) => Value::Double(x.to_double() - y.to_double()),
        }
    }

    pub fn mul(&self, other: &Value) -> Value {
        match (self.to_number(), other.to_number()) {
            (Number::Long(x), Number::Long(y)) => mul_long(x, y),
            (x, y) => Value::Double(x.to_double() * y.to_double()),
        }
    }

    pub fn div(&self, other: &Value) -> Value {
        match (self.to_number(), other.to_number()) {
            (Number::Long(x), Number::Long(y)) => div_long(x, y),
            (x, y) => div_double(x.to_double(), y.to_double()),
        }
    }

    /// `%` (operands are converted to longs)
    pub fn modulo(&self, other: &Value) -> Value {
        mod_long(self.to_long(), other.to_long())
    }

    /// Unary `-`
    pub fn neg(&self) -> Value {
        match self.to_number() {
            Number::Long(v) => neg_long(v),
            Number::Double(d) => Value::Double(-d),
        }
    }

    /// Unary `+`
    pub fn pos(&self) -> Value {
        number_value(self.to_number())
    }

    pub fn bit_and(&self, other: &Value) -> Value {
        Value::Long(self.to_long() & other.to_long())
    }

    pub fn bit_or(&self, other: &Value) -> Value {
        Value::Long(self.to_long() | other.to_long())
    }

    pub fn bit_xor(&self, other: &Value) -> Value {
        Value::Long(self.to_long() ^ other.to_long())
    }

    pub fn bit_not(&self) -> Value {
        Value::Long(!self.to_long())
    }

    pub fn shl(&self, other: &Value) -> Value {
        Value::Long(shl_long(self.to_long(), other.to_long()))
    }

    pub fn shr(&self, other: &Value) -> Value {
        Value::Long(shr_long(self.to_long(), other.to_long()))
    }

    /// `.`
    pub fn concat(&self, other: &Value) -> Value {
        Value::Str(self.to_string_value().concat(&other.to_string_value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_promotes_to_double() {
        assert!(add_long(i64::MAX, 1).is_double());
        assert!(sub_long(i64::MIN, 1).is_double());
        assert!(mul_long(i64::MAX, 2).is_double());
        assert!(neg_long(i64::MIN).is_double());
        assert_eq!(add_long(2, 3).as_long(), Some(5));
    }

    #[test]
    fn test_division() {
        assert_eq!(div_long(6, 3).as_long(), Some(2));
        assert!(div_long(7, 2).is_double());
        assert!(div_long(i64::MIN, -1).is_double());
        assert!(!div_long(1, 0).to_boolean());
        assert_eq!(mod_long(-7, 3).as_long(), Some(-1));
        assert_eq!(mod_long(i64::MIN, -1).as_long(), Some(0));
    }

    #[test]
    fn test_shifts() {
        assert_eq!(shl_long(1, 3), 8);
        assert_eq!(shl_long(1, 64), 0);
        assert_eq!(shr_long(-16, 2), -4);
        assert_eq!(shr_long(-1, 100), -1);
    }

    #[test]
    fn test_generic_arithmetic_on_strings() {
        let v = Value::from_static("1.5").add(&Value::from_long(1));
        assert!(v.is_double());
        assert_eq!(v.to_double(), 2.5);
        assert_eq!(Value::from_static("3").mul(&Value::from_static("4")).as_long(), Some(12));
        assert_eq!(Value::from_static("7").modulo(&Value::from_double(2.9)).as_long(), Some(1));
    }

    #[test]
    fn test_array_union() {
        let mut a = Value::new_array();
        a.append(Value::from_long(1));
        let mut b = Value::new_array();
        b.append(Value::from_long(9));
        b.append(Value::from_long(2));
        let u = a.add(&b);
        assert_eq!(u.get_index(0).as_long(), Some(1));
        assert_eq!(u.get_index(1).as_long(), Some(2));
    }

    #[test]
    fn test_operator_spelling() {
        assert_eq!(BinOp::NotIdentical.as_str(), "!==");
        assert_eq!(BinOp::ALL.len(), 18);
    }
}
