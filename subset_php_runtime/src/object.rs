//! Object handles, class references and closures
//!
//! The class table and method dispatch belong to the environment; this
//! module only holds the per-instance state compiled code touches
//! directly (field storage and identity).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::array::{ArrayKey, PhpArray};
use crate::env::Environment;
use crate::string::PhpStr;
use crate::value::Value;
use crate::var::Var;

/// Compile-time class reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassRef {
    name: &'static str,
}

impl ClassRef {
    pub const fn new(name: &'static str) -> Self {
        ClassRef { name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Per-instance state
#[derive(Debug, Clone)]
pub struct PhpObject {
    pub class_name: PhpStr,
    pub fields: PhpArray,
}

/// Shared handle to an object. Clones are the same object.
#[derive(Debug, Clone)]
pub struct ObjectRef(Rc<RefCell<PhpObject>>);

impl ObjectRef {
    pub fn new(class_name: PhpStr) -> Self {
        ObjectRef(Rc::new(RefCell::new(PhpObject {
            class_name,
            fields: PhpArray::new(),
        })))
    }

    pub fn class_name(&self) -> PhpStr {
        self.0.borrow().class_name.clone()
    }

    pub fn get_field(&self, name: &PhpStr) -> Option<Value> {
        let key = ArrayKey::Str(name.clone());
        self.0.borrow().fields.get(&key).map(Value::to_value)
    }

    pub fn put_field(&self, name: &PhpStr, value: Value) {
        self.0
            .borrow_mut()
            .fields
            .insert(ArrayKey::Str(name.clone()), value);
    }

    /// Reference to a field, converting the slot into a shared cell
    pub fn field_ref(&self, name: &PhpStr) -> Var {
        let mut object = self.0.borrow_mut();
        let slot = object.fields.slot_mut(ArrayKey::Str(name.clone()));
        slot.make_ref()
    }

    pub fn put_field_ref(&self, name: &PhpStr, var: Var) {
        *self
            .0
            .borrow_mut()
            .fields
            .slot_mut(ArrayKey::Str(name.clone())) = Value::Ref(var);
    }

    pub fn unset_field(&self, name: &PhpStr) {
        self.0
            .borrow_mut()
            .fields
            .remove(&ArrayKey::Str(name.clone()));
    }

    /// Shallow copy with the same class (`clone $o`)
    pub fn duplicate(&self) -> ObjectRef {
        let object = self.0.borrow();
        let mut fields = PhpArray::new();
        for (key, value) in object.fields.iter() {
            fields.insert(key.clone(), value.to_value());
        }
        ObjectRef(Rc::new(RefCell::new(PhpObject {
            class_name: object.class_name.clone(),
            fields,
        })))
    }

    pub fn fields(&self) -> PhpArray {
        self.0.borrow().fields.clone()
    }

    pub fn ptr_eq(a: &ObjectRef, b: &ObjectRef) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

/// Compiled closure body
pub type ClosureFn = dyn Fn(&mut dyn Environment, &[Value]) -> Value;

/// Closure value
#[derive(Clone)]
pub struct Callable(Rc<ClosureFn>);

impl Callable {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut dyn Environment, &[Value]) -> Value + 'static,
    {
        Callable(Rc::new(f))
    }

    pub fn invoke(&self, env: &mut dyn Environment, args: &[Value]) -> Value {
        (self.0)(env, args)
    }

    pub fn ptr_eq(a: &Callable, b: &Callable) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Closure")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields() {
        let o = ObjectRef::new(PhpStr::from_static("Point"));
        let x = PhpStr::from_static("x");
        assert!(o.get_field(&x).is_none());
        o.put_field(&x, Value::from_long(1));
        assert_eq!(o.get_field(&x).and_then(|v| v.as_long()), Some(1));
        o.unset_field(&x);
        assert!(o.get_field(&x).is_none());
    }

    #[test]
    fn test_field_ref_shares_slot() {
        let o = ObjectRef::new(PhpStr::from_static("Point"));
        let x = PhpStr::from_static("x");
        let r = o.field_ref(&x);
        r.set(Value::from_long(9));
        assert_eq!(o.get_field(&x).and_then(|v| v.as_long()), Some(9));
    }

    #[test]
    fn test_duplicate_is_a_new_object() {
        let o = ObjectRef::new(PhpStr::from_static("Point"));
        let x = PhpStr::from_static("x");
        o.put_field(&x, Value::from_long(1));
        let c = o.duplicate();
        c.put_field(&x, Value::from_long(2));
        assert!(!ObjectRef::ptr_eq(&o, &c));
        assert_eq!(o.get_field(&x).and_then(|v| v.as_long()), Some(1));
        assert_eq!(c.class_name().as_str(), "Point");
    }
}
