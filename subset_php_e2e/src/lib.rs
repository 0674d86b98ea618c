//! Compiled scenario functions and a host to run them
//!
//! `build.rs` compiles the scenario unit with `subset_php_compiler`; the
//! generated functions are included here as `scenarios`. `host::TestHost`
//! is an `Environment` with symbol frames, globals and closure calls, and
//! enough of an `include` to define a variable in the caller's frame.

pub mod scenarios {
    include!(concat!(env!("OUT_DIR"), "/scenarios.rs"));
}

pub mod host {
    use std::collections::HashMap;

    use subset_php_runtime::prelude::*;

    /// Value `include` assigns to `$y` in the including frame
    pub const INCLUDED_Y: i64 = 41;

    #[derive(Debug, Default)]
    pub struct TestHost {
        frames: Vec<HashMap<String, Var>>,
        globals: HashMap<String, Var>,
        /// Paths passed to `include`, in call order
        pub included: Vec<String>,
    }

    impl TestHost {
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of symbol frames still pushed
        pub fn frame_depth(&self) -> usize {
            self.frames.len()
        }

        fn frame_var(&mut self, name: &str) -> Var {
            match self.frames.last_mut() {
                Some(frame) => frame.entry(name.to_string()).or_default().clone(),
                None => self.fatal(RuntimeError::type_error("no symbol table to bind into")),
            }
        }
    }

    impl Environment for TestHost {
        fn call_n(&mut self, name: PhpStr, _args: Vec<Value>) -> Value {
            self.fatal(RuntimeError::undefined_call(format!("function {}()", name.as_str())))
        }

        fn call_value_n(&mut self, callee: &Value, args: Vec<Value>) -> Value {
            match callee.to_value() {
                Value::Closure(callable) => callable.invoke(self, &args),
                other => self.fatal(RuntimeError::type_error(format!(
                    "{} is not callable",
                    other.type_name()
                ))),
            }
        }

        fn call_method(&mut self, _receiver: &Value, name: PhpStr, _args: Vec<Value>) -> Value {
            self.fatal(RuntimeError::undefined_call(format!("method {}()", name.as_str())))
        }

        fn call_static_method_n(&mut self, _class: ClassRef, name: PhpStr, _args: Vec<Value>) -> Value {
            self.fatal(RuntimeError::undefined_call(format!("method {}()", name.as_str())))
        }

        fn new_object_n(&mut self, _class: ClassRef, _args: Vec<Value>) -> Value {
            self.fatal(RuntimeError::type_error("classes are not supported"))
        }

        fn resolve_class(&mut self, _name: &Value) -> ClassRef {
            self.fatal(RuntimeError::type_error("classes are not supported"))
        }

        fn called_class(&mut self) -> ClassRef {
            self.fatal(RuntimeError::type_error("no called class"))
        }

        fn parent_class(&mut self, _class: ClassRef) -> ClassRef {
            self.fatal(RuntimeError::type_error("no parent class"))
        }

        fn get_constant(&mut self, name: PhpStr) -> Value {
            Value::from_string(name)
        }

        fn get_class_constant(&mut self, _class: ClassRef, _name: PhpStr) -> Value {
            self.fatal(RuntimeError::type_error("classes are not supported"))
        }

        fn get_static_field(&mut self, _class: ClassRef, _name: PhpStr) -> Var {
            self.fatal(RuntimeError::type_error("classes are not supported"))
        }

        fn bind_static_field(&mut self, _class: ClassRef, _name: PhpStr, _var: Var) -> Value {
            self.fatal(RuntimeError::type_error("classes are not supported"))
        }

        fn get_global_var(&mut self, name: PhpStr) -> Var {
            self.globals.entry(name.as_str().to_string()).or_default().clone()
        }

        fn bind_global(&mut self, name: PhpStr, var: Var) -> Value {
            let value = var.to_value();
            self.globals.insert(name.as_str().to_string(), var);
            value
        }

        fn unset_global(&mut self, name: PhpStr) {
            self.globals.remove(name.as_str());
        }

        fn push_symbols(&mut self, names: &[PhpStr]) -> Vec<Var> {
            let mut frame = HashMap::new();
            let cells = names
                .iter()
                .map(|name| {
                    let var = Var::new();
                    frame.insert(name.as_str().to_string(), var.clone());
                    var
                })
                .collect();
            self.frames.push(frame);
            cells
        }

        fn pop_symbols(&mut self) {
            self.frames.pop();
        }

        fn rebind_symbol(&mut self, name: PhpStr, var: Var) {
            if let Some(frame) = self.frames.last_mut() {
                frame.insert(name.as_str().to_string(), var);
            }
        }

        fn unset_symbol(&mut self, name: PhpStr) {
            if let Some(frame) = self.frames.last_mut() {
                frame.remove(name.as_str());
            }
        }

        fn include(&mut self, path: &Value) -> Value {
            self.included.push(path.to_string_value().as_str().to_string());
            self.frame_var("y").set(Value::from_long(INCLUDED_Y));
            Value::from_long(1)
        }

        fn include_once(&mut self, path: &Value) -> Value {
            self.include(path)
        }

        fn require(&mut self, path: &Value) -> Value {
            self.include(path)
        }

        fn require_once(&mut self, path: &Value) -> Value {
            self.include(path)
        }

        fn exit(&mut self, status: &Value) -> ! {
            panic!("exit: {}", status.to_string_value().as_str())
        }

        fn die(&mut self, message: &Value) -> ! {
            panic!("die: {}", message.to_string_value().as_str())
        }

        fn begin_silence(&mut self) -> usize {
            0
        }

        fn end_silence(&mut self, _token: usize) {}

        fn warning(&mut self, _message: &str) {}

        fn fatal(&mut self, error: RuntimeError) -> ! {
            panic!("fatal: {}", error)
        }
    }
}
