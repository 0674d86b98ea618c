//! Boxed PHP values
//!
//! `Value` is the generic representation compiled code falls back to when
//! the compiler could not prove a narrower type. Specialized code paths use
//! raw `i64`, `f64`, `bool` and `PhpStr` instead and box through the
//! `from_*` constructors.

use std::cell::RefMut;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use crate::array::{ArrayKey, PhpArray};
use crate::convert::{self, Number};
use crate::dispatch::add_long;
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::object::{Callable, ObjectRef};
use crate::string::PhpStr;
use crate::var::Var;

/// Dynamic PHP value
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    Str(PhpStr),
    /// Copy-on-write array
    Array(Rc<PhpArray>),
    Object(ObjectRef),
    Closure(Callable),
    /// Reference slot inside an array or object field
    Ref(Var),
}

/// Mutable access to an array element, possibly through a reference cell
#[derive(Debug)]
pub enum ElemMut<'a> {
    Direct(&'a mut Value),
    Shared(RefMut<'a, Value>),
}

impl Deref for ElemMut<'_> {
    type Target = Value;

    fn deref(&self) -> &Value {
        match self {
            ElemMut::Direct(v) => v,
            ElemMut::Shared(v) => v,
        }
    }
}

impl DerefMut for ElemMut<'_> {
    fn deref_mut(&mut self) -> &mut Value {
        match self {
            ElemMut::Direct(v) => v,
            ElemMut::Shared(v) => v,
        }
    }
}

impl Value {
    // ========== Constants and constructors ==========

    pub const NULL: Value = Value::Null;
    pub const TRUE: Value = Value::Bool(true);
    pub const FALSE: Value = Value::Bool(false);
    /// The shared empty string
    pub const EMPTY_STRING: Value = Value::Str(PhpStr::EMPTY);

    pub const fn from_long(v: i64) -> Value {
        Value::Long(v)
    }

    pub const fn from_double(v: f64) -> Value {
        Value::Double(v)
    }

    pub const fn from_bool(v: bool) -> Value {
        Value::Bool(v)
    }

    pub const fn from_static(s: &'static str) -> Value {
        Value::Str(PhpStr::from_static(s))
    }

    pub fn from_string(s: PhpStr) -> Value {
        Value::Str(s)
    }

    pub fn new_array() -> Value {
        Value::Array(Rc::new(PhpArray::new()))
    }

    pub fn closure<F>(f: F) -> Value
    where
        F: Fn(&mut dyn Environment, &[Value]) -> Value + 'static,
    {
        Value::Closure(Callable::new(f))
    }

    // ========== Type predicates ==========

    /// PHP type name, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "boolean",
            Value::Long(_) => "integer",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) | Value::Closure(_) => "object",
            Value::Ref(var) => var.borrow().type_name(),
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            Value::Ref(var) => var.borrow().as_long(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.type_name() == "NULL"
    }

    /// `isset($x)`
    pub fn is_set(&self) -> bool {
        !self.is_null()
    }

    pub fn is_array(&self) -> bool {
        self.type_name() == "array"
    }

    pub fn is_bool(&self) -> bool {
        self.type_name() == "boolean"
    }

    pub fn is_long(&self) -> bool {
        self.type_name() == "integer"
    }

    pub fn is_double(&self) -> bool {
        self.type_name() == "double"
    }

    pub fn is_string(&self) -> bool {
        self.type_name() == "string"
    }

    pub fn is_object(&self) -> bool {
        self.type_name() == "object"
    }

    pub fn is_numeric(&self) -> bool {
        match self {
            Value::Long(_) | Value::Double(_) => true,
            Value::Str(s) => convert::numeric_string(s.as_str()).is_some(),
            Value::Ref(var) => var.borrow().is_numeric(),
            _ => false,
        }
    }

    /// `empty($x)`
    pub fn is_empty(&self) -> bool {
        !self.to_boolean()
    }

    // ========== Conversions ==========

    /// The value itself, with a reference slot unwrapped
    pub fn to_value(&self) -> Value {
        match self {
            Value::Ref(var) => var.to_value(),
            other => other.clone(),
        }
    }

    /// Copy for assignment by value. Arrays are shared until written.
    pub fn copy(&self) -> Value {
        self.to_value()
    }

    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Long(v) => *v != 0,
            Value::Double(d) => *d != 0.0,
            Value::Str(s) => s.to_boolean(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(_) | Value::Closure(_) => true,
            Value::Ref(var) => var.borrow().to_boolean(),
        }
    }

    pub fn to_long(&self) -> i64 {
        match self {
            Value::Null => 0,
            Value::Bool(b) => i64::from(*b),
            Value::Long(v) => *v,
            Value::Double(d) => convert::double_to_long(*d),
            Value::Str(s) => s.to_long(),
            Value::Array(a) => i64::from(!a.is_empty()),
            Value::Object(_) | Value::Closure(_) => 1,
            Value::Ref(var) => var.borrow().to_long(),
        }
    }

    pub fn to_double(&self) -> f64 {
        match self {
            Value::Double(d) => *d,
            Value::Str(s) => s.to_double(),
            Value::Ref(var) => var.borrow().to_double(),
            other => other.to_long() as f64,
        }
    }

    pub fn to_string_value(&self) -> PhpStr {
        match self {
            Value::Null => PhpStr::EMPTY,
            Value::Bool(b) => PhpStr::from_bool(*b),
            Value::Long(v) => PhpStr::from_long(*v),
            Value::Double(d) => PhpStr::from_double(*d),
            Value::Str(s) => s.clone(),
            Value::Array(_) => PhpStr::from_static("Array"),
            Value::Object(o) => o.class_name(),
            Value::Closure(_) => PhpStr::from_static("Closure"),
            Value::Ref(var) => var.borrow().to_string_value(),
        }
    }

    /// Numeric value in arithmetic and loose comparison
    pub fn to_number(&self) -> Number {
        match self {
            Value::Long(v) => Number::Long(*v),
            Value::Double(d) => Number::Double(*d),
            Value::Str(s) => convert::string_to_number(s.as_str()),
            Value::Ref(var) => var.borrow().to_number(),
            other => Number::Long(other.to_long()),
        }
    }

    /// `(array)` cast
    pub fn to_array(&self) -> Value {
        match self {
            Value::Array(_) => self.clone(),
            Value::Null => Value::new_array(),
            Value::Object(o) => Value::Array(Rc::new(o.fields())),
            Value::Ref(var) => var.borrow().to_array(),
            other => {
                let mut array = PhpArray::new();
                array.push(other.clone());
                Value::Array(Rc::new(array))
            }
        }
    }

    /// `(object)` cast
    pub fn to_object(&self) -> Value {
        match self {
            Value::Object(_) => self.clone(),
            Value::Ref(var) => var.borrow().to_object(),
            other => {
                let object = ObjectRef::new(PhpStr::from_static("stdClass"));
                match other {
                    Value::Null => {}
                    Value::Array(a) => {
                        for (key, value) in a.iter() {
                            object.put_field(&key.to_value().to_string_value(), value.to_value());
                        }
                    }
                    scalar => object.put_field(&PhpStr::from_static("scalar"), scalar.clone()),
                }
                Value::Object(object)
            }
        }
    }

    /// Unboxing accessor for a value the compiler proved to be a long
    pub fn long_value(&self) -> i64 {
        match self {
            Value::Long(v) => *v,
            other => other.to_long(),
        }
    }

    /// Unboxing accessor for a value the compiler proved to be a double
    pub fn double_value(&self) -> f64 {
        match self {
            Value::Double(d) => *d,
            other => other.to_double(),
        }
    }

    /// Unboxing accessor for a value the compiler proved to be a boolean
    pub fn bool_value(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            other => other.to_boolean(),
        }
    }

    // ========== Element reads ==========

    /// `$a[$k]` in read position
    pub fn get(&self, key: &Value) -> Value {
        match self {
            Value::Array(a) => a
                .get(&ArrayKey::from_value(key))
                .map(Value::to_value)
                .unwrap_or(Value::Null),
            Value::Str(_) => self.char_at(key),
            Value::Ref(var) => var.borrow().get(key),
            _ => Value::Null,
        }
    }

    pub fn get_index(&self, index: i64) -> Value {
        self.get(&Value::Long(index))
    }

    /// `isset($a[$k])`
    pub fn isset_at(&self, key: &Value) -> bool {
        match self {
            Value::Array(a) => a
                .get(&ArrayKey::from_value(key))
                .map(Value::is_set)
                .unwrap_or(false),
            Value::Str(s) => {
                let index = key.to_long();
                index >= 0 && (index as usize) < s.as_str().chars().count()
            }
            Value::Ref(var) => var.borrow().isset_at(key),
            _ => false,
        }
    }

    /// `$s{$i}` in read position
    pub fn char_at(&self, index: &Value) -> Value {
        Value::Str(self.to_string_value().char_at(index.to_long()))
    }

    // ========== In-place writes ==========

    /// The array behind this slot. Anything that is not an array is
    /// replaced by a fresh one.
    fn array_mut(&mut self) -> &mut PhpArray {
        match self {
            Value::Array(a) => Rc::make_mut(a),
            other => {
                *other = Value::new_array();
                other.array_mut()
            }
        }
    }

    fn is_nonempty_string(&self) -> bool {
        matches!(self, Value::Str(s) if !s.is_empty())
    }

    /// Mutable element `$a[$k]`, for nested writes such as `$a[$k][] = $v`
    pub fn elem_mut(&mut self, key: &Value) -> ElemMut<'_> {
        match self {
            Value::Ref(var) => ElemMut::Shared(RefMut::map(var.borrow_mut(), |inner| {
                inner.array_mut().slot_mut(ArrayKey::from_value(key))
            })),
            other => ElemMut::Direct(other.array_mut().slot_mut(ArrayKey::from_value(key))),
        }
    }

    /// Mutable fresh element `$a[]`
    pub fn tail_mut(&mut self) -> ElemMut<'_> {
        match self {
            Value::Ref(var) => {
                ElemMut::Shared(RefMut::map(var.borrow_mut(), |inner| inner.array_mut().append_slot()))
            }
            other => ElemMut::Direct(other.array_mut().append_slot()),
        }
    }

    fn put_element(&mut self, key: &Value, value: Value) -> Value {
        self.array_mut()
            .insert(ArrayKey::from_value(key), value.clone());
        value
    }

    /// `$a[$k] = $v`
    pub fn put(&mut self, key: &Value, value: Value) -> Value {
        let value = value.to_value();
        match self {
            Value::Ref(var) => var.borrow_mut().put(key, value),
            other if other.is_nonempty_string() => other.set_char_at(key, value),
            other => other.put_element(key, value),
        }
    }

    /// `$a[] = $v`
    pub fn append(&mut self, value: Value) -> Value {
        let value = value.to_value();
        match self {
            Value::Ref(var) => var.borrow_mut().append(value),
            other => {
                other.array_mut().push(value.clone());
                value
            }
        }
    }

    /// `$a[$k] =& $var`
    pub fn put_ref(&mut self, key: &Value, var: Var) -> Value {
        match self {
            Value::Ref(cell) => cell.borrow_mut().put_ref(key, var),
            other => {
                let value = var.to_value();
                *other.array_mut().slot_mut(ArrayKey::from_value(key)) = Value::Ref(var);
                value
            }
        }
    }

    /// `$a[] =& $var`
    pub fn append_ref(&mut self, var: Var) -> Value {
        match self {
            Value::Ref(cell) => cell.borrow_mut().append_ref(var),
            other => {
                let value = var.to_value();
                *other.array_mut().append_slot() = Value::Ref(var);
                value
            }
        }
    }

    /// `&$a[$k]`: the element becomes a shared cell
    pub fn get_ref(&mut self, key: &Value) -> Var {
        match self {
            Value::Ref(var) => var.borrow_mut().get_ref(key),
            other => other.array_mut().slot_mut(ArrayKey::from_value(key)).make_ref(),
        }
    }

    /// Turn this slot into a reference slot and return its cell
    pub fn make_ref(&mut self) -> Var {
        if let Value::Ref(var) = self {
            return var.clone();
        }
        let var = Var::from_value(std::mem::take(self));
        *self = Value::Ref(var.clone());
        var
    }

    /// `unset($a[$k])`
    pub fn remove(&mut self, key: &Value) {
        match self {
            Value::Ref(var) => var.borrow_mut().remove(key),
            Value::Array(a) => {
                Rc::make_mut(a).remove(&ArrayKey::from_value(key));
            }
            _ => {}
        }
    }

    /// `$s{$i} = $c`. Empty strings and non-strings take the array path.
    pub fn set_char_at(&mut self, index: &Value, value: Value) -> Value {
        match self {
            Value::Ref(var) => var.borrow_mut().set_char_at(index, value),
            Value::Str(s) if !s.is_empty() => {
                let updated = s.with_char_at(index.to_long(), &value.to_string_value());
                *s = updated;
                value
            }
            other => other.put_element(index, value),
        }
    }

    /// `++$x` / `--$x`
    pub fn pre_increment(&mut self, delta: i64) -> Value {
        if let Value::Ref(var) = self {
            return var.borrow_mut().pre_increment(delta);
        }
        let updated = self.incremented(delta);
        *self = updated.clone();
        updated
    }

    /// `$x++` / `$x--`
    pub fn post_increment(&mut self, delta: i64) -> Value {
        if let Value::Ref(var) = self {
            return var.borrow_mut().post_increment(delta);
        }
        let old = self.clone();
        *self = old.incremented(delta);
        old
    }

    fn incremented(&self, delta: i64) -> Value {
        match self {
            Value::Null if delta > 0 => Value::Long(1),
            Value::Long(v) => add_long(*v, delta),
            Value::Double(d) => Value::Double(d + delta as f64),
            Value::Str(s) if s.is_empty() => {
                if delta > 0 {
                    Value::from_static("1")
                } else {
                    Value::Long(-1)
                }
            }
            Value::Str(s) => match convert::numeric_string(s.as_str()) {
                Some(Number::Long(v)) => add_long(v, delta),
                Some(Number::Double(d)) => Value::Double(d + delta as f64),
                None if delta > 0 => Value::Str(PhpStr::from(increment_string(s.as_str()))),
                None => self.clone(),
            },
            other => other.clone(),
        }
    }

    // ========== Objects ==========

    pub fn get_field(&self, env: &mut dyn Environment, name: PhpStr) -> Value {
        match self {
            Value::Object(o) => match o.get_field(&name) {
                Some(value) => value,
                None => {
                    env.warning(&format!("Undefined property: {}::${}", o.class_name(), name));
                    Value::Null
                }
            },
            Value::Ref(var) => var.to_value().get_field(env, name),
            _ => {
                env.warning("Trying to get property of non-object");
                Value::Null
            }
        }
    }

    pub fn put_field(&self, env: &mut dyn Environment, name: PhpStr, value: Value) -> Value {
        let value = value.to_value();
        match self {
            Value::Object(o) => o.put_field(&name, value.clone()),
            Value::Ref(var) => {
                var.to_value().put_field(env, name, value.clone());
            }
            _ => env.warning("Attempt to assign property of non-object"),
        }
        value
    }

    pub fn get_field_ref(&self, env: &mut dyn Environment, name: PhpStr) -> Var {
        match self {
            Value::Object(o) => o.field_ref(&name),
            Value::Ref(var) => var.to_value().get_field_ref(env, name),
            _ => {
                env.warning("Attempt to modify property of non-object");
                Var::new()
            }
        }
    }

    pub fn put_field_ref(&self, env: &mut dyn Environment, name: PhpStr, var: Var) -> Value {
        match self {
            Value::Object(o) => {
                let value = var.to_value();
                o.put_field_ref(&name, var);
                value
            }
            Value::Ref(cell) => cell.to_value().put_field_ref(env, name, var),
            _ => {
                env.warning("Attempt to assign property of non-object");
                Value::Null
            }
        }
    }

    pub fn unset_field(&self, env: &mut dyn Environment, name: PhpStr) {
        match self {
            Value::Object(o) => o.unset_field(&name),
            Value::Ref(var) => var.to_value().unset_field(env, name),
            _ => {}
        }
    }

    /// `clone $o`
    pub fn clone_object(&self, env: &mut dyn Environment) -> Value {
        match self.to_value() {
            Value::Object(o) => Value::Object(o.duplicate()),
            _ => env.fatal(RuntimeError::type_error("__clone method called on non-object")),
        }
    }

    fn dispatch_method(&self, env: &mut dyn Environment, name: PhpStr, args: Vec<Value>) -> Value {
        if !self.is_object() {
            env.fatal(RuntimeError::non_object_call(name.as_str()));
        }
        env.call_method(self, name, args)
    }

    pub fn call_method_n(&self, env: &mut dyn Environment, name: PhpStr, args: Vec<Value>) -> Value {
        self.dispatch_method(env, name, args)
    }

    pub fn call_method0(&self, env: &mut dyn Environment, name: PhpStr) -> Value {
        self.dispatch_method(env, name, Vec::new())
    }

    pub fn call_method1(&self, env: &mut dyn Environment, name: PhpStr, a0: Value) -> Value {
        self.dispatch_method(env, name, vec![a0])
    }

    pub fn call_method2(&self, env: &mut dyn Environment, name: PhpStr, a0: Value, a1: Value) -> Value {
        self.dispatch_method(env, name, vec![a0, a1])
    }

    pub fn call_method3(
        &self,
        env: &mut dyn Environment,
        name: PhpStr,
        a0: Value,
        a1: Value,
        a2: Value,
    ) -> Value {
        self.dispatch_method(env, name, vec![a0, a1, a2])
    }

    pub fn call_method4(
        &self,
        env: &mut dyn Environment,
        name: PhpStr,
        a0: Value,
        a1: Value,
        a2: Value,
        a3: Value,
    ) -> Value {
        self.dispatch_method(env, name, vec![a0, a1, a2, a3])
    }

    pub fn call_method5(
        &self,
        env: &mut dyn Environment,
        name: PhpStr,
        a0: Value,
        a1: Value,
        a2: Value,
        a3: Value,
        a4: Value,
    ) -> Value {
        self.dispatch_method(env, name, vec![a0, a1, a2, a3, a4])
    }
}

/// Alphanumeric string increment: `"a"` to `"b"`, `"Az"` to `"Ba"`,
/// `"zz"` to `"aaa"`.
fn increment_string(s: &str) -> String {
    let mut bytes = s.as_bytes().to_vec();
    let mut i = bytes.len();
    loop {
        if i == 0 {
            let prefix = match bytes[0] {
                b'0' => b'1',
                b'A' => b'A',
                _ => b'a',
            };
            bytes.insert(0, prefix);
            break;
        }
        i -= 1;
        match bytes[i] {
            b'z' => bytes[i] = b'a',
            b'Z' => bytes[i] = b'A',
            b'9' => bytes[i] = b'0',
            b'a'..=b'y' | b'A'..=b'Y' | b'0'..=b'8' => {
                bytes[i] += 1;
                break;
            }
            _ => break,
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

impl From<PhpStr> for Value {
    fn from(s: PhpStr) -> Self {
        Value::Str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::NULL.to_boolean());
        assert!(!Value::from_static("0").to_boolean());
        assert!(Value::from_static("0.0").to_boolean());
        assert!(!Value::from_double(0.0).to_boolean());
        assert!(!Value::new_array().to_boolean());
    }

    #[test]
    fn test_assignment_copies_arrays() {
        let mut a = Value::new_array();
        a.append(Value::from_long(1));
        let mut b = a.copy();
        b.append(Value::from_long(2));
        assert_eq!(a.to_array().to_long(), 1);
        assert!(!a.isset_at(&Value::from_long(1)));
        assert!(b.isset_at(&Value::from_long(1)));
    }

    #[test]
    fn test_autovivify_nested_write() {
        let mut a = Value::NULL;
        a.elem_mut(&Value::from_static("x")).put(&Value::from_long(0), Value::from_long(5));
        let inner = a.get(&Value::from_static("x"));
        assert_eq!(inner.get_index(0).as_long(), Some(5));
    }

    #[test]
    fn test_element_reference_is_shared() {
        let mut a = Value::new_array();
        a.put(&Value::from_long(0), Value::from_long(1));
        let r = a.get_ref(&Value::from_long(0));
        r.set(Value::from_long(2));
        assert_eq!(a.get_index(0).as_long(), Some(2));
        a.put(&Value::from_long(0), Value::from_long(3));
        assert_eq!(r.to_value().as_long(), Some(3));
    }

    #[test]
    fn test_nested_write_through_reference_element() {
        let mut a = Value::new_array();
        let cell = Var::from_value(Value::new_array());
        a.put_ref(&Value::from_long(0), cell.clone());
        a.elem_mut(&Value::from_long(0)).append(Value::from_long(7));
        assert_eq!(cell.to_value().get_index(0).as_long(), Some(7));
    }

    #[test]
    fn test_string_offsets() {
        let mut s = Value::from_static("cat");
        assert_eq!(s.get(&Value::from_long(0)).to_string_value().as_str(), "c");
        s.put(&Value::from_long(0), Value::from_static("b"));
        assert_eq!(s.to_string_value().as_str(), "bat");
        let mut empty = Value::EMPTY_STRING;
        empty.set_char_at(&Value::from_long(0), Value::from_static("x"));
        assert!(empty.is_array());
    }

    #[test]
    fn test_increments() {
        let mut v = Value::NULL;
        assert!(v.post_increment(1).is_null());
        assert_eq!(v.as_long(), Some(1));
        let mut m = Value::from_long(i64::MAX);
        assert!(m.pre_increment(1).is_double());
        let mut s = Value::from_static("Az");
        s.pre_increment(1);
        assert_eq!(s.to_string_value().as_str(), "Ba");
        let mut z = Value::from_static("zz");
        z.pre_increment(1);
        assert_eq!(z.to_string_value().as_str(), "aaa");
        let mut d = Value::NULL;
        d.pre_increment(-1);
        assert!(d.is_null());
    }

    #[test]
    fn test_unboxing_accessors() {
        assert_eq!(Value::from_long(4).long_value(), 4);
        assert_eq!(Value::from_static("12abc").long_value(), 12);
        assert_eq!(Value::from_double(2.5).double_value(), 2.5);
        assert!(Value::TRUE.bool_value());
    }

    #[test]
    fn test_casts() {
        let arr = Value::from_long(3).to_array();
        assert_eq!(arr.get_index(0).as_long(), Some(3));
        assert!(Value::NULL.to_object().is_object());
        assert_eq!(Value::from_double(1e25).to_string_value().as_str(), "1.0E+25");
    }
}
