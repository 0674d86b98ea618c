//! Reference cells
//!
//! A `Var` is the storage of a PHP variable that has been bound by
//! reference. Clones share the cell, so a write through one handle is
//! visible through every other. A `Var` never holds a `Value::Ref`.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::value::Value;

/// Shared mutable variable cell
#[derive(Debug, Clone, Default)]
pub struct Var(Rc<RefCell<Value>>);

impl Var {
    /// New cell holding null
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Self {
        Var(Rc::new(RefCell::new(value.to_value())))
    }

    pub fn to_value(&self) -> Value {
        self.0.borrow().clone()
    }

    /// Copy of the current value, for assignment by value
    pub fn copy(&self) -> Value {
        self.0.borrow().copy()
    }

    /// Store a value and return it
    pub fn set(&self, value: Value) -> Value {
        let value = value.to_value();
        *self.0.borrow_mut() = value.clone();
        value
    }

    pub fn borrow(&self) -> Ref<'_, Value> {
        self.0.borrow()
    }

    /// Mutable access for in-place updates (`$a[] = 1` through a reference)
    pub fn borrow_mut(&self) -> RefMut<'_, Value> {
        self.0.borrow_mut()
    }

    pub fn long_value(&self) -> i64 {
        self.0.borrow().long_value()
    }

    pub fn double_value(&self) -> f64 {
        self.0.borrow().double_value()
    }

    pub fn bool_value(&self) -> bool {
        self.0.borrow().bool_value()
    }

    /// `each($a)`: the current key/value pair as
    /// `[1 => v, "value" => v, 0 => k, "key" => k]`, or false at the end.
    pub fn each(&self) -> Value {
        let entry = match &mut *self.0.borrow_mut() {
            Value::Array(array) => Rc::make_mut(array).next_entry(),
            _ => None,
        };
        match entry {
            Some((key, value)) => {
                let mut result = Value::new_array();
                let key = key.to_value();
                result.put(&Value::from_long(1), value.clone());
                result.put(&Value::from_static("value"), value);
                result.put(&Value::from_long(0), key.clone());
                result.put(&Value::from_static("key"), key);
                result
            }
            None => Value::FALSE,
        }
    }

    /// Whether two handles share one cell
    pub fn ptr_eq(a: &Var, b: &Var) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

/// Argument `i` of a packed argument list, by value
pub fn arg_value(args: &[Value], i: usize) -> Value {
    args.get(i).map(Value::copy).unwrap_or(Value::NULL)
}

/// Argument `i` of a packed argument list, by reference
pub fn arg_ref(args: &[Value], i: usize) -> Var {
    match args.get(i) {
        Some(Value::Ref(var)) => var.clone(),
        Some(other) => Var::from_value(other.clone()),
        None => Var::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_storage() {
        let x = Var::new();
        let y = x.clone();
        y.set(Value::from_long(3));
        assert_eq!(x.to_value().as_long(), Some(3));
        assert!(Var::ptr_eq(&x, &y));
    }

    #[test]
    fn test_set_unwraps_references() {
        let inner = Var::from_value(Value::from_long(1));
        let outer = Var::new();
        outer.set(Value::Ref(inner.clone()));
        inner.set(Value::from_long(2));
        assert_eq!(outer.to_value().as_long(), Some(1));
    }

    #[test]
    fn test_each_walks_array() {
        let mut arr = Value::new_array();
        arr.append(Value::from_static("a"));
        let var = Var::from_value(arr);
        let first = var.each();
        assert_eq!(first.get(&Value::from_static("key")).as_long(), Some(0));
        assert_eq!(first.get(&Value::from_long(1)).to_string_value().as_str(), "a");
        assert!(!var.each().to_boolean());
    }

    #[test]
    fn test_packed_arguments() {
        let cell = Var::from_value(Value::from_long(7));
        let args = vec![Value::from_long(1), Value::Ref(cell.clone())];
        assert_eq!(arg_value(&args, 0).as_long(), Some(1));
        assert_eq!(arg_value(&args, 1).as_long(), Some(7));
        assert!(arg_value(&args, 2).is_null());
        assert!(Var::ptr_eq(&arg_ref(&args, 1), &cell));
    }
}
