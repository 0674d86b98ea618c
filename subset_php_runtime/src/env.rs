//! The environment contract
//!
//! Compiled functions receive `env: &mut dyn Environment`. The host
//! application implements this trait (function and class tables, globals,
//! include machinery, output). Fixed-arity call forms default to the packed
//! forms so an implementation only needs the `_n` variants.

use crate::error::RuntimeError;
use crate::object::ClassRef;
use crate::string::PhpStr;
use crate::value::Value;
use crate::var::Var;

/// Host services used by compiled code
pub trait Environment {
    // ========== Calls ==========

    /// Call a named function
    fn call_n(&mut self, name: PhpStr, args: Vec<Value>) -> Value;

    /// Call a callable value (closure, function name, `[obj, method]`)
    fn call_value_n(&mut self, callee: &Value, args: Vec<Value>) -> Value;

    /// Call a method on an object value
    fn call_method(&mut self, receiver: &Value, name: PhpStr, args: Vec<Value>) -> Value;

    fn call_static_method_n(&mut self, class: ClassRef, name: PhpStr, args: Vec<Value>) -> Value;

    fn new_object_n(&mut self, class: ClassRef, args: Vec<Value>) -> Value;

    fn call0(&mut self, name: PhpStr) -> Value {
        self.call_n(name, Vec::new())
    }

    fn call1(&mut self, name: PhpStr, a0: Value) -> Value {
        self.call_n(name, vec![a0])
    }

    fn call2(&mut self, name: PhpStr, a0: Value, a1: Value) -> Value {
        self.call_n(name, vec![a0, a1])
    }

    fn call3(&mut self, name: PhpStr, a0: Value, a1: Value, a2: Value) -> Value {
        self.call_n(name, vec![a0, a1, a2])
    }

    fn call4(&mut self, name: PhpStr, a0: Value, a1: Value, a2: Value, a3: Value) -> Value {
        self.call_n(name, vec![a0, a1, a2, a3])
    }

    fn call5(
        &mut self,
        name: PhpStr,
        a0: Value,
        a1: Value,
        a2: Value,
        a3: Value,
        a4: Value,
    ) -> Value {
        self.call_n(name, vec![a0, a1, a2, a3, a4])
    }

    fn call_value0(&mut self, callee: &Value) -> Value {
        self.call_value_n(callee, Vec::new())
    }

    fn call_value1(&mut self, callee: &Value, a0: Value) -> Value {
        self.call_value_n(callee, vec![a0])
    }

    fn call_value2(&mut self, callee: &Value, a0: Value, a1: Value) -> Value {
        self.call_value_n(callee, vec![a0, a1])
    }

    fn call_value3(&mut self, callee: &Value, a0: Value, a1: Value, a2: Value) -> Value {
        self.call_value_n(callee, vec![a0, a1, a2])
    }

    fn call_value4(&mut self, callee: &Value, a0: Value, a1: Value, a2: Value, a3: Value) -> Value {
        self.call_value_n(callee, vec![a0, a1, a2, a3])
    }

    fn call_value5(
        &mut self,
        callee: &Value,
        a0: Value,
        a1: Value,
        a2: Value,
        a3: Value,
        a4: Value,
    ) -> Value {
        self.call_value_n(callee, vec![a0, a1, a2, a3, a4])
    }

    fn call_static_method0(&mut self, class: ClassRef, name: PhpStr) -> Value {
        self.call_static_method_n(class, name, Vec::new())
    }

    fn call_static_method1(&mut self, class: ClassRef, name: PhpStr, a0: Value) -> Value {
        self.call_static_method_n(class, name, vec![a0])
    }

    fn call_static_method2(&mut self, class: ClassRef, name: PhpStr, a0: Value, a1: Value) -> Value {
        self.call_static_method_n(class, name, vec![a0, a1])
    }

    fn call_static_method3(
        &mut self,
        class: ClassRef,
        name: PhpStr,
        a0: Value,
        a1: Value,
        a2: Value,
    ) -> Value {
        self.call_static_method_n(class, name, vec![a0, a1, a2])
    }

    fn call_static_method4(
        &mut self,
        class: ClassRef,
        name: PhpStr,
        a0: Value,
        a1: Value,
        a2: Value,
        a3: Value,
    ) -> Value {
        self.call_static_method_n(class, name, vec![a0, a1, a2, a3])
    }

    fn call_static_method5(
        &mut self,
        class: ClassRef,
        name: PhpStr,
        a0: Value,
        a1: Value,
        a2: Value,
        a3: Value,
        a4: Value,
    ) -> Value {
        self.call_static_method_n(class, name, vec![a0, a1, a2, a3, a4])
    }

    fn new_object0(&mut self, class: ClassRef) -> Value {
        self.new_object_n(class, Vec::new())
    }

    fn new_object1(&mut self, class: ClassRef, a0: Value) -> Value {
        self.new_object_n(class, vec![a0])
    }

    fn new_object2(&mut self, class: ClassRef, a0: Value, a1: Value) -> Value {
        self.new_object_n(class, vec![a0, a1])
    }

    fn new_object3(&mut self, class: ClassRef, a0: Value, a1: Value, a2: Value) -> Value {
        self.new_object_n(class, vec![a0, a1, a2])
    }

    fn new_object4(&mut self, class: ClassRef, a0: Value, a1: Value, a2: Value, a3: Value) -> Value {
        self.new_object_n(class, vec![a0, a1, a2, a3])
    }

    fn new_object5(
        &mut self,
        class: ClassRef,
        a0: Value,
        a1: Value,
        a2: Value,
        a3: Value,
        a4: Value,
    ) -> Value {
        self.new_object_n(class, vec![a0, a1, a2, a3, a4])
    }

    // ========== Classes and constants ==========

    /// Class named by a runtime value (`$cls::m()`)
    fn resolve_class(&mut self, name: &Value) -> ClassRef;

    /// Late static binding class (`static::`)
    fn called_class(&mut self) -> ClassRef;

    fn parent_class(&mut self, class: ClassRef) -> ClassRef;

    fn get_constant(&mut self, name: PhpStr) -> Value;

    fn get_class_constant(&mut self, class: ClassRef, name: PhpStr) -> Value;

    fn get_static_field(&mut self, class: ClassRef, name: PhpStr) -> Var;

    fn bind_static_field(&mut self, class: ClassRef, name: PhpStr, var: Var) -> Value;

    // ========== Globals and the symbol table ==========

    fn get_global_var(&mut self, name: PhpStr) -> Var;

    fn bind_global(&mut self, name: PhpStr, var: Var) -> Value;

    fn unset_global(&mut self, name: PhpStr);

    /// Open a name-indexed scope for the current call and return its cells
    /// in the order of `names`.
    fn push_symbols(&mut self, names: &[PhpStr]) -> Vec<Var>;

    fn pop_symbols(&mut self);

    /// Rebind a name in the current scope to another cell
    fn rebind_symbol(&mut self, name: PhpStr, var: Var);

    fn unset_symbol(&mut self, name: PhpStr);

    // ========== Include, exit, diagnostics ==========

    fn include(&mut self, path: &Value) -> Value;

    fn include_once(&mut self, path: &Value) -> Value;

    fn require(&mut self, path: &Value) -> Value;

    fn require_once(&mut self, path: &Value) -> Value;

    fn exit(&mut self, status: &Value) -> !;

    fn die(&mut self, message: &Value) -> !;

    /// Start an `@` region and return a token for `end_silence`
    fn begin_silence(&mut self) -> usize;

    fn end_silence(&mut self, token: usize);

    fn warning(&mut self, message: &str);

    fn fatal(&mut self, error: RuntimeError) -> !;
}
