//! Runtime error types for compiled PHP code
//!
//! Errors raised by generated code are reported to the environment through
//! `Environment::fatal`, which never returns.

use thiserror::Error;

/// Runtime error type
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Operation applied to a value of the wrong type
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Call to an undefined function or method
    #[error("Call to undefined {0}")]
    UndefinedCall(String),

    /// `$x->m()` where `$x` is not an object
    #[error("Call to a member function {0}() on a non-object")]
    NonObjectCall(String),
}

impl RuntimeError {
    pub fn type_error<S: Into<String>>(msg: S) -> Self {
        RuntimeError::TypeError(msg.into())
    }

    /// `what` names the callee, e.g. `function foo()`
    pub fn undefined_call<S: Into<String>>(what: S) -> Self {
        RuntimeError::UndefinedCall(what.into())
    }

    pub fn non_object_call<S: Into<String>>(method: S) -> Self {
        RuntimeError::NonObjectCall(method.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RuntimeError::type_error("Unsupported operand types");
        assert_eq!(format!("{}", err), "TypeError: Unsupported operand types");

        let err = RuntimeError::undefined_call("function foo()");
        assert_eq!(format!("{}", err), "Call to undefined function foo()");

        assert_eq!(
            RuntimeError::non_object_call("area").to_string(),
            "Call to a member function area() on a non-object"
        );
    }
}
