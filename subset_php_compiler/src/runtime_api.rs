//! Names and arities of the runtime operations emitted code calls
//!
//! These names appear verbatim in generated source and must match
//! `subset_php_runtime`. The generator goes through this table rather
//! than spelling operation names inline.

/// What an operation is called on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Receiver {
    /// Method of a boxed `Value`
    Value,
    /// Method of a `Var` cell
    Var,
    /// Method of a raw `PhpStr`
    Str,
    /// Method of the `env: &mut dyn Environment` parameter
    Env,
    /// Free function or associated constructor
    Free,
}

/// One runtime operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuntimeOp {
    pub name: &'static str,
    pub receiver: Receiver,
    /// Argument count, excluding the receiver
    pub arity: usize,
}

impl RuntimeOp {
    const fn new(name: &'static str, receiver: Receiver, arity: usize) -> Self {
        Self {
            name,
            receiver,
            arity,
        }
    }

    /// `receiver.name(args)`
    pub fn on(&self, receiver: &str, args: &[&str]) -> String {
        debug_assert!(matches!(
            self.receiver,
            Receiver::Value | Receiver::Var | Receiver::Str
        ));
        debug_assert_eq!(args.len(), self.arity, "arity of {}", self.name);
        format!("{}.{}({})", receiver, self.name, args.join(", "))
    }

    /// `env.name(args)` or `name(args)`
    pub fn apply(&self, args: &[&str]) -> String {
        debug_assert_eq!(args.len(), self.arity, "arity of {}", self.name);
        match self.receiver {
            Receiver::Env => format!("env.{}({})", self.name, args.join(", ")),
            _ => format!("{}({})", self.name, args.join(", ")),
        }
    }
}

/// Largest argument count with a fixed-arity call form
pub const MAX_FIXED_ARITY: usize = 5;

/// Call operations with `name0`..`name5` fixed-arity forms and a packed
/// `name_n` form taking a `Vec<Value>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallFamily {
    pub base: &'static str,
    pub receiver: Receiver,
    /// Leading arguments before the call arguments (environment, name,
    /// class)
    pub leading: usize,
}

impl CallFamily {
    const fn new(base: &'static str, receiver: Receiver, leading: usize) -> Self {
        Self {
            base,
            receiver,
            leading,
        }
    }

    /// Operation name for `argc` call arguments
    pub fn op_name(&self, argc: usize) -> String {
        if argc <= MAX_FIXED_ARITY {
            format!("{}{}", self.base, argc)
        } else {
            format!("{}_n", self.base)
        }
    }

    /// Emit the call. `receiver` is ignored for environment families.
    pub fn emit(&self, receiver: &str, leading: &[&str], args: &[String]) -> String {
        debug_assert_eq!(leading.len(), self.leading, "leading args of {}", self.base);
        let mut all: Vec<String> = leading.iter().map(|s| s.to_string()).collect();
        if args.len() <= MAX_FIXED_ARITY {
            all.extend(args.iter().cloned());
        } else {
            all.push(format!("vec![{}]", args.join(", ")));
        }
        let name = self.op_name(args.len());
        match self.receiver {
            Receiver::Env => format!("env.{}({})", name, all.join(", ")),
            _ => format!("{}.{}({})", receiver, name, all.join(", ")),
        }
    }
}

pub const CALL: CallFamily = CallFamily::new("call", Receiver::Env, 1);
pub const CALL_VALUE: CallFamily = CallFamily::new("call_value", Receiver::Env, 1);
pub const CALL_METHOD: CallFamily = CallFamily::new("call_method", Receiver::Value, 2);
pub const CALL_STATIC_METHOD: CallFamily = CallFamily::new("call_static_method", Receiver::Env, 2);
pub const NEW_OBJECT: CallFamily = CallFamily::new("new_object", Receiver::Env, 1);

macro_rules! runtime_ops {
    ($($ident:ident = $name:literal, $recv:ident, $arity:literal;)*) => {
        $(pub const $ident: RuntimeOp = RuntimeOp::new($name, Receiver::$recv, $arity);)*

        /// Every single-form operation
        pub const ALL: &[RuntimeOp] = &[$($ident),*];
    };
}

runtime_ops! {
    // Comparison
    LT = "lt", Value, 1;
    LEQ = "leq", Value, 1;
    GT = "gt", Value, 1;
    GEQ = "geq", Value, 1;
    EQ = "eq", Value, 1;
    EQL = "eql", Value, 1;
    // Arithmetic
    ADD = "add", Value, 1;
    SUB = "sub", Value, 1;
    MUL = "mul", Value, 1;
    DIV = "div", Value, 1;
    MODULO = "modulo", Value, 1;
    NEG = "neg", Value, 0;
    POS = "pos", Value, 0;
    BIT_AND = "bit_and", Value, 1;
    BIT_OR = "bit_or", Value, 1;
    BIT_XOR = "bit_xor", Value, 1;
    BIT_NOT = "bit_not", Value, 0;
    SHL = "shl", Value, 1;
    SHR = "shr", Value, 1;
    STR_CONCAT = "concat", Str, 1;
    STR_TO_BOOLEAN = "to_boolean", Str, 0;
    STR_TO_LONG = "to_long", Str, 0;
    STR_TO_DOUBLE = "to_double", Str, 0;
    // Conversion
    TO_BOOLEAN = "to_boolean", Value, 0;
    TO_LONG = "to_long", Value, 0;
    TO_DOUBLE = "to_double", Value, 0;
    TO_STRING = "to_string_value", Value, 0;
    TO_ARRAY = "to_array", Value, 0;
    TO_OBJECT = "to_object", Value, 0;
    COPY = "copy", Value, 0;
    LONG_VALUE = "long_value", Value, 0;
    DOUBLE_VALUE = "double_value", Value, 0;
    BOOL_VALUE = "bool_value", Value, 0;
    // Elements
    GET = "get", Value, 1;
    GET_INDEX = "get_index", Value, 1;
    ISSET_AT = "isset_at", Value, 1;
    CHAR_AT = "char_at", Value, 1;
    ELEM_MUT = "elem_mut", Value, 1;
    TAIL_MUT = "tail_mut", Value, 0;
    PUT = "put", Value, 2;
    APPEND = "append", Value, 1;
    PUT_REF = "put_ref", Value, 2;
    APPEND_REF = "append_ref", Value, 1;
    GET_REF = "get_ref", Value, 1;
    MAKE_REF = "make_ref", Value, 0;
    REMOVE = "remove", Value, 1;
    SET_CHAR_AT = "set_char_at", Value, 2;
    PRE_INCREMENT = "pre_increment", Value, 1;
    POST_INCREMENT = "post_increment", Value, 1;
    // Objects
    GET_FIELD = "get_field", Value, 2;
    PUT_FIELD = "put_field", Value, 3;
    GET_FIELD_REF = "get_field_ref", Value, 2;
    PUT_FIELD_REF = "put_field_ref", Value, 3;
    UNSET_FIELD = "unset_field", Value, 2;
    CLONE_OBJECT = "clone_object", Value, 1;
    // Reference cells
    VAR_TO_VALUE = "to_value", Var, 0;
    VAR_COPY = "copy", Var, 0;
    VAR_SET = "set", Var, 1;
    VAR_BORROW_MUT = "borrow_mut", Var, 0;
    VAR_LONG_VALUE = "long_value", Var, 0;
    VAR_DOUBLE_VALUE = "double_value", Var, 0;
    VAR_BOOL_VALUE = "bool_value", Var, 0;
    VAR_EACH = "each", Var, 0;
    // Environment
    RESOLVE_CLASS = "resolve_class", Env, 1;
    CALLED_CLASS = "called_class", Env, 0;
    PARENT_CLASS = "parent_class", Env, 1;
    GET_CONSTANT = "get_constant", Env, 1;
    GET_CLASS_CONSTANT = "get_class_constant", Env, 2;
    GET_STATIC_FIELD = "get_static_field", Env, 2;
    BIND_STATIC_FIELD = "bind_static_field", Env, 3;
    GET_GLOBAL_VAR = "get_global_var", Env, 1;
    BIND_GLOBAL = "bind_global", Env, 2;
    UNSET_GLOBAL = "unset_global", Env, 1;
    PUSH_SYMBOLS = "push_symbols", Env, 1;
    POP_SYMBOLS = "pop_symbols", Env, 0;
    REBIND_SYMBOL = "rebind_symbol", Env, 2;
    UNSET_SYMBOL = "unset_symbol", Env, 1;
    INCLUDE = "include", Env, 1;
    INCLUDE_ONCE = "include_once", Env, 1;
    REQUIRE = "require", Env, 1;
    REQUIRE_ONCE = "require_once", Env, 1;
    EXIT = "exit", Env, 1;
    DIE = "die", Env, 1;
    BEGIN_SILENCE = "begin_silence", Env, 0;
    END_SILENCE = "end_silence", Env, 1;
    // Raw helpers
    ADD_LONG = "add_long", Free, 2;
    SUB_LONG = "sub_long", Free, 2;
    MUL_LONG = "mul_long", Free, 2;
    DIV_LONG = "div_long", Free, 2;
    DIV_DOUBLE = "div_double", Free, 2;
    MOD_LONG = "mod_long", Free, 2;
    NEG_LONG = "neg_long", Free, 1;
    SHL_LONG = "shl_long", Free, 2;
    SHR_LONG = "shr_long", Free, 2;
    ARG_VALUE = "arg_value", Free, 2;
    ARG_REF = "arg_ref", Free, 2;
    // Constructors
    FROM_LONG = "Value::from_long", Free, 1;
    FROM_DOUBLE = "Value::from_double", Free, 1;
    FROM_BOOL = "Value::from_bool", Free, 1;
    FROM_STRING = "Value::from_string", Free, 1;
    STR_FROM_LONG = "PhpStr::from_long", Free, 1;
    STR_FROM_DOUBLE = "PhpStr::from_double", Free, 1;
    STR_FROM_BOOL = "PhpStr::from_bool", Free, 1;
    CLOSURE = "Value::closure", Free, 1;
    NEW_ARRAY = "Value::new_array", Free, 0;
    VAR_NEW = "Var::new", Free, 0;
    VAR_FROM_VALUE = "Var::from_value", Free, 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_operations_are_unique_per_receiver() {
        let mut seen = HashSet::new();
        for op in ALL {
            assert!(seen.insert((op.receiver, op.name)), "duplicate {}", op.name);
        }
    }

    #[test]
    fn test_emit_forms() {
        assert_eq!(GT.on("v_a", &["&v_b"]), "v_a.gt(&v_b)");
        assert_eq!(ADD_LONG.apply(&["1_i64", "2_i64"]), "add_long(1_i64, 2_i64)");
        assert_eq!(GET_CONSTANT.apply(&["_S0"]), "env.get_constant(_S0)");
    }

    #[test]
    fn test_call_family_threshold() {
        let five: Vec<String> = (0..5).map(|i| format!("_a{}", i)).collect();
        assert_eq!(
            CALL.emit("", &["_S0"], &five),
            "env.call5(_S0, _a0, _a1, _a2, _a3, _a4)"
        );
        let six: Vec<String> = (0..6).map(|i| format!("_a{}", i)).collect();
        assert_eq!(
            CALL.emit("", &["_S0"], &six),
            "env.call_n(_S0, vec![_a0, _a1, _a2, _a3, _a4, _a5])"
        );
        assert_eq!(
            CALL_METHOD.emit("_r", &["env", "_S1"], &[]),
            "_r.call_method0(env, _S1)"
        );
    }
}
