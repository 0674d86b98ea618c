//! Operator and mode enums carried by expression nodes

use serde::{Deserialize, Serialize};

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // String
    Concat,
    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    // Comparison
    Eq,
    NotEq,
    Lt,
    Leq,
    Gt,
    Geq,
    // Identity (=== and !==)
    Identical,
    NotIdentical,
    // Logical
    And,
    Or,
    Xor,
}

impl BinaryOp {
    /// PHP spelling, for diagnostics and comments
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Concat => ".",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Leq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Geq => ">=",
            BinaryOp::Identical => "===",
            BinaryOp::NotIdentical => "!==",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Xor => "xor",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::Leq
                | BinaryOp::Gt
                | BinaryOp::Geq
        )
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, BinaryOp::Identical | BinaryOp::NotIdentical)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::Xor)
    }

    /// `&&` and `||` evaluate their right operand conditionally
    pub fn is_short_circuit(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// Unary operators, including casts and the `&`, `@` and `clone` prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    /// `&expr`
    Ref,
    /// `@expr`
    Suppress,
    Clone,
    ToLong,
    ToDouble,
    ToString,
    ToBoolean,
    ToArray,
    ToObject,
}

/// `include` family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncludeMode {
    Include,
    IncludeOnce,
    Require,
    RequireOnce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitKind {
    Exit,
    Die,
}

/// Builtin type tests the factory turns into dedicated nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypePredicate {
    IsSet,
    Empty,
    IsArray,
    IsBool,
    IsNull,
    IsNumeric,
    IsObject,
    IsString,
    IsLong,
    IsDouble,
}

impl TypePredicate {
    /// Map a PHP function name (case-insensitive) to a predicate
    pub fn from_function_name(name: &str) -> Option<Self> {
        let predicate = match name.to_ascii_lowercase().as_str() {
            "isset" => TypePredicate::IsSet,
            "empty" => TypePredicate::Empty,
            "is_array" => TypePredicate::IsArray,
            "is_bool" => TypePredicate::IsBool,
            "is_null" => TypePredicate::IsNull,
            "is_numeric" => TypePredicate::IsNumeric,
            "is_object" => TypePredicate::IsObject,
            "is_string" => TypePredicate::IsString,
            "is_long" | "is_int" | "is_integer" => TypePredicate::IsLong,
            "is_float" | "is_double" | "is_real" => TypePredicate::IsDouble,
            _ => return None,
        };
        Some(predicate)
    }

    /// `Value` method implementing the predicate
    pub fn runtime_name(&self) -> &'static str {
        match self {
            TypePredicate::IsSet => "is_set",
            TypePredicate::Empty => "is_empty",
            TypePredicate::IsArray => "is_array",
            TypePredicate::IsBool => "is_bool",
            TypePredicate::IsNull => "is_null",
            TypePredicate::IsNumeric => "is_numeric",
            TypePredicate::IsObject => "is_object",
            TypePredicate::IsString => "is_string",
            TypePredicate::IsLong => "is_long",
            TypePredicate::IsDouble => "is_double",
        }
    }
}
