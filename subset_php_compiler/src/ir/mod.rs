//! Expression tree
//!
//! - `expr`: the node sum type and its analysis caches
//! - `ops`: operator enums
//! - `function`: function declarations and compilation units
//! - `factory`: node construction used by the front end

mod expr;
mod factory;
mod function;
mod ops;

pub use expr::{ArrayEntry, Callee, CapturedVar, ClassName, Expr, ExprKind, Literal};
pub use factory::ExprFactory;
pub use function::{CompilationUnit, FunctionDecl, FunctionInfo, Param};
pub use ops::{BinaryOp, ExitKind, IncludeMode, TypePredicate, UnaryOp};
