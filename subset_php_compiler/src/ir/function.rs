//! Function declarations and compilation units

use serde::{Deserialize, Serialize};

use super::expr::Expr;

/// Formal parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub by_ref: bool,
}

impl Param {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            by_ref: false,
        }
    }

    pub fn by_ref(name: &str) -> Self {
        Self {
            name: name.to_string(),
            by_ref: true,
        }
    }
}

/// Facts about the enclosing function supplied by the program model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub is_method: bool,
    /// Non-static method: `$this` exists
    pub has_receiver: bool,
    pub is_static: bool,
    /// Class that declares the method, for `self::`
    pub declaring_class: Option<String>,
    /// Set by the front end for `$$name` and similar dynamic variable use
    pub uses_symbol_table: bool,
    pub is_closure: bool,
}

impl FunctionInfo {
    pub fn is_method(&self) -> bool {
        self.is_method
    }

    pub fn has_receiver(&self) -> bool {
        self.has_receiver
    }

    /// Instance method of `class`
    pub fn method(class: &str) -> Self {
        Self {
            is_method: true,
            has_receiver: true,
            declaring_class: Some(class.to_string()),
            ..Self::default()
        }
    }

    /// Static method of `class`
    pub fn static_method(class: &str) -> Self {
        Self {
            is_method: true,
            is_static: true,
            declaring_class: Some(class.to_string()),
            ..Self::default()
        }
    }

    /// Info for a closure defined inside a function with this info.
    /// The closure sees the same `$this` and class scope.
    pub fn closure_of(parent: &FunctionInfo) -> Self {
        Self {
            is_method: false,
            has_receiver: parent.has_receiver,
            is_static: parent.is_static,
            declaring_class: parent.declaring_class.clone(),
            uses_symbol_table: false,
            is_closure: true,
        }
    }
}

/// Function body in expression-statement form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub info: FunctionInfo,
    /// Expression statements, evaluated in order
    pub body: Vec<Expr>,
    /// Returned expression; `NULL` when absent
    pub result: Option<Expr>,
}

impl FunctionDecl {
    pub fn new(name: &str, params: Vec<Param>, body: Vec<Expr>, result: Option<Expr>) -> Self {
        Self {
            name: name.to_string(),
            params,
            info: FunctionInfo::default(),
            body,
            result,
        }
    }

    pub fn with_info(mut self, info: FunctionInfo) -> Self {
        self.info = info;
        self
    }

    /// Body statements followed by the result expression
    pub fn expressions(&self) -> impl Iterator<Item = &Expr> {
        self.body.iter().chain(self.result.iter())
    }

    pub fn reset_analysis(&mut self) {
        for expr in self.body.iter_mut().chain(self.result.iter_mut()) {
            expr.reset_analysis();
        }
    }
}

/// One source file worth of functions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub file: Option<String>,
    pub functions: Vec<FunctionDecl>,
}

impl CompilationUnit {
    pub fn new(file: Option<&str>, functions: Vec<FunctionDecl>) -> Self {
        Self {
            file: file.map(str::to_string),
            functions,
        }
    }

    pub fn reset_analysis(&mut self) {
        for function in &mut self.functions {
            function.reset_analysis();
        }
    }
}
