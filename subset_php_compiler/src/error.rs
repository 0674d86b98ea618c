//! Compiler errors and internal faults
//!
//! The analysis and code generation passes have no recoverable error path.
//! A malformed tree or an illegal context request is a bug in the caller,
//! raised with [`fault`] as a panic carrying an [`InternalFault`]. The unit
//! driver converts that panic into `CompileError::InternalFault` so the
//! surrounding build can go on with other units.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

use crate::span::Location;

/// Compilation error
#[derive(Debug, Error)]
pub enum CompileError {
    /// Programming error in the tree producer or in the compiler itself
    #[error("{location}: internal compiler fault: {message}")]
    InternalFault { location: Location, message: String },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// File could not be read or written
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// Compiled unit cache could not be encoded or validated
    #[error("Cache error: {0}")]
    Cache(String),
}

/// Result type for compiler operations
pub type CompileResult<T> = Result<T, CompileError>;

/// Panic payload for internal faults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalFault {
    pub location: Location,
    pub message: String,
}

impl fmt::Display for InternalFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

impl From<InternalFault> for CompileError {
    fn from(fault: InternalFault) -> Self {
        CompileError::InternalFault {
            location: fault.location,
            message: fault.message,
        }
    }
}

/// Abort compilation of the current unit.
pub fn fault(location: &Location, message: impl Into<String>) -> ! {
    panic::panic_any(InternalFault {
        location: location.clone(),
        message: message.into(),
    })
}

/// Run one unit of work, turning an internal fault into an error.
/// Any other panic keeps unwinding.
pub(crate) fn catch_fault<T>(work: impl FnOnce() -> T) -> CompileResult<T> {
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(value) => Ok(value),
        Err(payload) => match payload.downcast::<InternalFault>() {
            Ok(fault) => Err((*fault).into()),
            Err(other) => panic::resume_unwind(other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_becomes_error() {
        let result: CompileResult<()> =
            catch_fault(|| fault(&Location::at(3, 7), "unset on $this"));
        match result {
            Err(CompileError::InternalFault { location, message }) => {
                assert_eq!(location, Location::at(3, 7));
                assert_eq!(message, "unset on $this");
            }
            other => panic!("expected a fault, got {:?}", other),
        }
    }

    #[test]
    fn test_error_display() {
        let err = CompileError::InternalFault {
            location: Location::new(Some("a.php"), 1, 2),
            message: "bad tree".to_string(),
        };
        assert_eq!(err.to_string(), "a.php:1:2: internal compiler fault: bad tree");
    }

    #[test]
    fn test_catch_fault_passes_values_through() {
        assert_eq!(catch_fault(|| 41 + 1).ok(), Some(42));
    }
}
