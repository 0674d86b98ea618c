use serde::{Deserialize, Serialize};
use std::fmt;

/// Source position of an expression, 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    pub file: Option<String>,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(file: Option<&str>, line: u32, column: u32) -> Self {
        Self {
            file: file.map(str::to_string),
            line,
            column,
        }
    }

    /// Location without a file name, for tests and synthesized nodes.
    pub fn at(line: u32, column: u32) -> Self {
        Self::new(None, line, column)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}
