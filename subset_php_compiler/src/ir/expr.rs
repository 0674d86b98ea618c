//! Expression nodes
//!
//! A closed sum type over every expression form the compiler handles. Nodes
//! own their children. The only mutable state is the write-once
//! [`AnalysisCache`] the analyzer fills in; the tree itself is never
//! rewritten after construction.

use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};

use super::function::FunctionDecl;
use super::ops::{BinaryOp, ExitKind, IncludeMode, TypePredicate, UnaryOp};
use crate::analyze::{FunctionFacts, VarId};
use crate::error::fault;
use crate::span::Location;
use crate::types::ExprType;

/// Literal payload, already parsed by the front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    String(String),
}

/// Target of a function call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Callee {
    /// `foo(..)`
    Named(String),
    /// `$f(..)`
    Dynamic(Box<Expr>),
}

/// Class operand of `new`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassName {
    /// `new A`, including `self`, `parent` and `static`
    Named(String),
    /// `new $cls`
    Dynamic(Box<Expr>),
}

/// Variable listed in a closure's `use (..)` clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedVar {
    pub name: String,
    pub by_ref: bool,
}

/// One `key => value` entry of an `array(..)` literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayEntry {
    pub key: Option<Expr>,
    pub value: Expr,
    /// `key => &$value`
    pub by_ref: bool,
}

/// Expression node variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Literal(Literal),
    Variable {
        name: String,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
        is_ref: bool,
    },
    /// `list($a, , $b) = value`; `None` entries are holes
    ListAssign {
        targets: Vec<Option<Expr>>,
        value: Box<Expr>,
    },
    Call {
        callee: Callee,
        args: Vec<Expr>,
    },
    /// `$o->m(..)`, or `A::m(..)` when `is_static` (the receiver is then the
    /// class name: a string literal, or any expression for `$cls::m()`)
    MethodCall {
        receiver: Box<Expr>,
        method_name: String,
        args: Vec<Expr>,
        is_static: bool,
    },
    NewObject {
        class_name: ClassName,
        args: Vec<Expr>,
    },
    /// `$a[i]`, or `$a[]` when `index` is `None`
    ArrayAccess {
        base: Box<Expr>,
        index: Option<Box<Expr>>,
    },
    ArrayIsSet {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    ArrayUnset {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    ClassConst {
        class_name: String,
        const_name: String,
    },
    ThisRef,
    Closure {
        decl: Box<FunctionDecl>,
        captured: Vec<CapturedVar>,
    },
    /// `$o->name`
    ObjectField {
        base: Box<Expr>,
        name: String,
    },
    /// `A::$name`
    ClassField {
        class_name: String,
        name: String,
    },
    /// `$s{i}`
    CharAt {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    /// `test ? then : else`, or `test ?: else` when `then_expr` is `None`
    Conditional {
        test: Box<Expr>,
        then_expr: Option<Box<Expr>>,
        else_expr: Box<Expr>,
    },
    /// `++$x`, `$x--`, ...
    Increment {
        target: Box<Expr>,
        delta: i64,
        is_post: bool,
    },
    Include {
        path: Box<Expr>,
        mode: IncludeMode,
    },
    Exit {
        kind: ExitKind,
        message: Option<Box<Expr>>,
    },
    ArrayLiteral {
        entries: Vec<ArrayEntry>,
    },
    TypePredicate {
        predicate: TypePredicate,
        arg: Box<Expr>,
    },
    /// `each($a)`
    Each {
        array: Box<Expr>,
    },
    /// Global constant `FOO`
    Constant {
        name: String,
    },
    /// `unset($x)` / `unset($o->f)`
    Unset {
        target: Box<Expr>,
    },
}

/// Per-node analysis results. Each cell is written at most once per
/// analysis pass and only read by the generator.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    ty: OnceCell<ExprType>,
    slot: OnceCell<VarId>,
    temp: OnceCell<String>,
    closure: OnceCell<Box<FunctionFacts>>,
}

impl Clone for AnalysisCache {
    /// A copied subtree starts unanalyzed.
    fn clone(&self) -> Self {
        AnalysisCache::default()
    }
}

impl PartialEq for AnalysisCache {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

/// Expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub location: Location,
    #[serde(skip)]
    cache: AnalysisCache,
}

impl Expr {
    pub fn new(kind: ExprKind, location: Location) -> Self {
        Self {
            kind,
            location,
            cache: AnalysisCache::default(),
        }
    }

    // ========== Analysis cache ==========

    pub(crate) fn set_expr_type(&self, ty: ExprType) {
        if self.cache.ty.set(ty).is_err() {
            fault(&self.location, "expression analyzed twice in one pass");
        }
    }

    pub(crate) fn set_slot(&self, slot: VarId) {
        if self.cache.slot.set(slot).is_err() {
            fault(&self.location, "variable slot resolved twice");
        }
    }

    pub(crate) fn set_temp(&self, name: String) {
        if self.cache.temp.set(name).is_err() {
            fault(&self.location, "temp allocated twice for one node");
        }
    }

    pub(crate) fn set_closure_facts(&self, facts: FunctionFacts) {
        if self.cache.closure.set(Box::new(facts)).is_err() {
            fault(&self.location, "closure analyzed twice");
        }
    }

    /// Whether the analyzer has visited this node
    pub fn is_analyzed(&self) -> bool {
        self.cache.ty.get().is_some()
    }

    /// Static type of the node. Faults before analysis.
    pub fn expr_type(&self) -> ExprType {
        match self.cache.ty.get() {
            Some(ty) => *ty,
            None => fault(&self.location, "expression used before analysis"),
        }
    }

    /// Resolved variable slot. Faults on anything but an analyzed variable.
    pub fn slot(&self) -> VarId {
        match self.cache.slot.get() {
            Some(slot) => *slot,
            None => fault(&self.location, "variable slot requested before analysis"),
        }
    }

    /// Temp variable the analyzer allocated for this node
    pub fn temp(&self) -> &str {
        match self.cache.temp.get() {
            Some(name) => name,
            None => fault(&self.location, "temp requested before analysis"),
        }
    }

    pub fn closure_facts(&self) -> &FunctionFacts {
        match self.cache.closure.get() {
            Some(facts) => facts,
            None => fault(&self.location, "closure facts requested before analysis"),
        }
    }

    /// Clear every cache in the subtree so a fresh pass can run.
    pub fn reset_analysis(&mut self) {
        self.cache = AnalysisCache::default();
        if let ExprKind::Closure { decl, .. } = &mut self.kind {
            decl.reset_analysis();
        }
        self.for_each_child_mut(&mut |child| child.reset_analysis());
    }

    // ========== Capability predicates ==========

    fn cached_type(&self) -> ExprType {
        self.cache.ty.get().copied().unwrap_or_default()
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(_))
    }

    pub fn is_long(&self) -> bool {
        self.cached_type().is_long()
    }

    pub fn is_double(&self) -> bool {
        self.cached_type().is_double()
    }

    pub fn is_number(&self) -> bool {
        self.cached_type().is_number()
    }

    pub fn is_boolean(&self) -> bool {
        self.cached_type().is_boolean()
    }

    pub fn is_string(&self) -> bool {
        self.cached_type().is_string()
    }

    /// Evaluating the node yields an addressable slot
    pub fn is_ref(&self) -> bool {
        match &self.kind {
            ExprKind::Variable { .. } | ExprKind::ObjectField { .. } | ExprKind::ClassField { .. } => {
                true
            }
            ExprKind::ArrayAccess { .. } => true,
            ExprKind::Unary {
                op: UnaryOp::Ref,
                operand,
            } => operand.is_ref(),
            _ => false,
        }
    }

    /// Variable name, if this is a plain variable
    pub fn variable_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Variable { name } => Some(name),
            _ => None,
        }
    }

    // ========== Traversal ==========

    /// Visit direct children in evaluation order. Closure bodies are a
    /// separate scope and are not visited.
    pub fn for_each_child(&self, f: &mut dyn FnMut(&Expr)) {
        match &self.kind {
            ExprKind::Literal(_)
            | ExprKind::Variable { .. }
            | ExprKind::ClassConst { .. }
            | ExprKind::ThisRef
            | ExprKind::ClassField { .. }
            | ExprKind::Constant { .. }
            | ExprKind::Closure { .. } => {}
            ExprKind::Binary { left, right, .. } => {
                f(left);
                f(right);
            }
            ExprKind::Unary { operand, .. } => f(operand),
            ExprKind::Assign { target, value, .. } => {
                f(value);
                f(target);
            }
            ExprKind::ListAssign { targets, value } => {
                f(value);
                for target in targets.iter().flatten() {
                    f(target);
                }
            }
            ExprKind::Call { callee, args } => {
                if let Callee::Dynamic(callee) = callee {
                    f(callee);
                }
                args.iter().for_each(|arg| f(arg));
            }
            ExprKind::MethodCall { receiver, args, .. } => {
                f(receiver);
                args.iter().for_each(|arg| f(arg));
            }
            ExprKind::NewObject { class_name, args } => {
                if let ClassName::Dynamic(class) = class_name {
                    f(class);
                }
                args.iter().for_each(|arg| f(arg));
            }
            ExprKind::ArrayAccess { base, index } => {
                f(base);
                if let Some(index) = index {
                    f(index);
                }
            }
            ExprKind::ArrayIsSet { base, index }
            | ExprKind::ArrayUnset { base, index }
            | ExprKind::CharAt { base, index } => {
                f(base);
                f(index);
            }
            ExprKind::ObjectField { base, .. } => f(base),
            ExprKind::Conditional {
                test,
                then_expr,
                else_expr,
            } => {
                f(test);
                if let Some(then_expr) = then_expr {
                    f(then_expr);
                }
                f(else_expr);
            }
            ExprKind::Increment { target, .. } => f(target),
            ExprKind::Include { path, .. } => f(path),
            ExprKind::Exit { message, .. } => {
                if let Some(message) = message {
                    f(message);
                }
            }
            ExprKind::ArrayLiteral { entries } => {
                for entry in entries {
                    if let Some(key) = &entry.key {
                        f(key);
                    }
                    f(&entry.value);
                }
            }
            ExprKind::TypePredicate { arg, .. } => f(arg),
            ExprKind::Each { array } => f(array),
            ExprKind::Unset { target } => f(target),
        }
    }

    fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut Expr)) {
        match &mut self.kind {
            ExprKind::Literal(_)
            | ExprKind::Variable { .. }
            | ExprKind::ClassConst { .. }
            | ExprKind::ThisRef
            | ExprKind::ClassField { .. }
            | ExprKind::Constant { .. }
            | ExprKind::Closure { .. } => {}
            ExprKind::Binary { left, right, .. } => {
                f(left);
                f(right);
            }
            ExprKind::Unary { operand, .. } => f(operand),
            ExprKind::Assign { target, value, .. } => {
                f(value);
                f(target);
            }
            ExprKind::ListAssign { targets, value } => {
                f(value);
                for target in targets.iter_mut().flatten() {
                    f(target);
                }
            }
            ExprKind::Call { callee, args } => {
                if let Callee::Dynamic(callee) = callee {
                    f(callee);
                }
                args.iter_mut().for_each(|arg| f(arg));
            }
            ExprKind::MethodCall { receiver, args, .. } => {
                f(receiver);
                args.iter_mut().for_each(|arg| f(arg));
            }
            ExprKind::NewObject { class_name, args } => {
                if let ClassName::Dynamic(class) = class_name {
                    f(class);
                }
                args.iter_mut().for_each(|arg| f(arg));
            }
            ExprKind::ArrayAccess { base, index } => {
                f(base);
                if let Some(index) = index {
                    f(index);
                }
            }
            ExprKind::ArrayIsSet { base, index }
            | ExprKind::ArrayUnset { base, index }
            | ExprKind::CharAt { base, index } => {
                f(base);
                f(index);
            }
            ExprKind::ObjectField { base, .. } => f(base),
            ExprKind::Conditional {
                test,
                then_expr,
                else_expr,
            } => {
                f(test);
                if let Some(then_expr) = then_expr {
                    f(then_expr);
                }
                f(else_expr);
            }
            ExprKind::Increment { target, .. } => f(target),
            ExprKind::Include { path, .. } => f(path),
            ExprKind::Exit { message, .. } => {
                if let Some(message) = message {
                    f(message);
                }
            }
            ExprKind::ArrayLiteral { entries } => {
                for entry in entries {
                    if let Some(key) = &mut entry.key {
                        f(key);
                    }
                    f(&mut entry.value);
                }
            }
            ExprKind::TypePredicate { arg, .. } => f(arg),
            ExprKind::Each { array } => f(array),
            ExprKind::Unset { target } => f(target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ExprFactory;

    fn child_names(expr: &Expr) -> Vec<String> {
        let mut names = Vec::new();
        expr.for_each_child(&mut |child| {
            let name = match &child.kind {
                ExprKind::Variable { name } => name.clone(),
                ExprKind::Literal(Literal::Long(v)) => v.to_string(),
                _ => "?".to_string(),
            };
            names.push(name);
        });
        names
    }

    #[test]
    fn test_children_follow_evaluation_order() {
        let f = ExprFactory::new(None);
        let loc = f.location(1, 1);
        let assign = f.create_assign(
            loc.clone(),
            f.create_var(loc.clone(), "a"),
            f.create_var(loc.clone(), "b"),
        );
        assert_eq!(child_names(&assign), vec!["b", "a"]);

        let list = f.create_list(
            loc.clone(),
            vec![Some(f.create_var(loc.clone(), "x")), None, Some(f.create_var(loc.clone(), "y"))],
            f.create_var(loc.clone(), "arr"),
        );
        assert_eq!(child_names(&list), vec!["arr", "x", "y"]);

        let sum = f.create_binary(
            loc.clone(),
            BinaryOp::Add,
            f.create_long(loc.clone(), 1),
            f.create_long(loc, 2),
        );
        assert_eq!(child_names(&sum), vec!["1", "2"]);
    }
}
