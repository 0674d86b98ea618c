//! Static expression types
//!
//! `ExprType` is what the analyzer proves about the result of an
//! expression. The narrow types are claims: a node typed `Long` promises
//! that its raw-`i64` code path behaves exactly like the generic one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Analysis result for one expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExprType {
    /// Not analyzed yet / no information (bottom of the join)
    #[default]
    Unknown,
    /// Generic boxed value
    Value,
    Long,
    Double,
    String,
    Boolean,
}

impl ExprType {
    /// Least upper bound: `Unknown` is the identity, distinct claims
    /// widen to `Value`.
    pub fn join(self, other: ExprType) -> ExprType {
        match (self, other) {
            (ExprType::Unknown, t) | (t, ExprType::Unknown) => t,
            (a, b) if a == b => a,
            _ => ExprType::Value,
        }
    }

    pub fn is_long(self) -> bool {
        self == ExprType::Long
    }

    pub fn is_double(self) -> bool {
        self == ExprType::Double
    }

    /// Long or Double
    pub fn is_number(self) -> bool {
        matches!(self, ExprType::Long | ExprType::Double)
    }

    pub fn is_boolean(self) -> bool {
        self == ExprType::Boolean
    }

    pub fn is_string(self) -> bool {
        self == ExprType::String
    }

    /// Long, Double or Boolean: the types an unboxed local can hold
    pub fn is_raw_scalar(self) -> bool {
        matches!(self, ExprType::Long | ExprType::Double | ExprType::Boolean)
    }

    /// Rust type of the raw representation
    pub fn to_rust_type(self) -> &'static str {
        match self {
            ExprType::Long => "i64",
            ExprType::Double => "f64",
            ExprType::Boolean => "bool",
            ExprType::String => "PhpStr",
            ExprType::Unknown | ExprType::Value => "Value",
        }
    }
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExprType::Unknown => "unknown",
            ExprType::Value => "value",
            ExprType::Long => "long",
            ExprType::Double => "double",
            ExprType::String => "string",
            ExprType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join() {
        assert_eq!(ExprType::Unknown.join(ExprType::Long), ExprType::Long);
        assert_eq!(ExprType::Long.join(ExprType::Long), ExprType::Long);
        assert_eq!(ExprType::Long.join(ExprType::Double), ExprType::Value);
        assert_eq!(ExprType::Boolean.join(ExprType::Unknown), ExprType::Boolean);
        assert_eq!(ExprType::Value.join(ExprType::String), ExprType::Value);
    }

    #[test]
    fn test_predicates_are_exclusive() {
        let narrow = [
            ExprType::Long,
            ExprType::Double,
            ExprType::String,
            ExprType::Boolean,
        ];
        for t in narrow {
            let claims = [t.is_long(), t.is_double(), t.is_string(), t.is_boolean()];
            assert_eq!(claims.iter().filter(|c| **c).count(), 1);
        }
        assert!(!ExprType::Boolean.is_number());
        assert!(ExprType::Double.is_number());
    }
}
