//! subset_php runtime library
//!
//! Runtime support for Rust code emitted by `subset_php_compiler`. It
//! includes:
//!
//! - `Value` for dynamically typed PHP values
//! - `Var` reference cells and copy-on-write `PhpArray`s
//! - PHP 5 loose comparison and arithmetic, plus the raw long helpers the
//!   compiler emits for statically typed operands
//! - the `Environment` trait compiled functions are called with
//!
//! Every name the compiler writes into generated code resolves through
//! `prelude`.

pub mod array;
pub mod compare;
pub mod convert;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod object;
pub mod string;
pub mod value;
pub mod var;

/// Prelude module for generated code
///
/// # Example
/// ```
/// use subset_php_runtime::prelude::*;
///
/// let v = Value::from_long(2).add(&Value::from_static("3"));
/// assert_eq!(v.as_long(), Some(5));
/// ```
pub mod prelude {
    pub use super::array::{ArrayKey, PhpArray};
    pub use super::dispatch::{
        add_long, div_double, div_long, dynamic_binop, mod_long, mul_long, neg_long,
        raw_long_binop, shl_long, shr_long, sub_long, BinOp,
    };
    pub use super::env::Environment;
    pub use super::error::RuntimeError;
    pub use super::object::{Callable, ClassRef, ObjectRef};
    pub use super::string::PhpStr;
    pub use super::value::{ElemMut, Value};
    pub use super::var::{arg_ref, arg_value, Var};
}

pub use prelude::*;
