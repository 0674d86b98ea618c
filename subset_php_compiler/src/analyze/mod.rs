//! Analysis pass
//!
//! A single left-to-right walk over a function body that assigns an
//! [`ExprType`] to every node and records variable usage in an
//! [`AnalysisContext`]. Every node is visited exactly once, through exactly
//! one of the entry points: [`Analyzer::analyze`] for reads, or one of the
//! lvalue forms (`analyze_assign`, `analyze_assign_ref`,
//! `analyze_set_modified`, `analyze_set_reference`, `analyze_unset`).
//!
//! The narrow types are only claimed where the raw code path the generator
//! picks for them behaves exactly like the boxed one.

mod context;
mod signatures;
#[cfg(test)]
mod tests;

pub use context::{
    is_superglobal, AnalysisContext, FlowState, FunctionFacts, Storage, VarFacts, VarFlags, VarId,
    SUPERGLOBALS,
};
pub use signatures::{Signature, SignatureLookup, SignatureTable};

use crate::debug::{analyze_debug_enabled, debug_log};
use crate::error::fault;
use crate::ir::{
    BinaryOp, Callee, ClassName, Expr, ExprKind, FunctionDecl, FunctionInfo, Literal, UnaryOp,
};
use crate::types::ExprType;

/// Functions that read or write the caller's locals by name
const SYMBOL_TABLE_FUNCTIONS: &[&str] = &["extract", "compact", "get_defined_vars", "func_get_args"];

/// Analysis driver
pub struct Analyzer<'s> {
    signatures: &'s dyn SignatureLookup,
}

impl std::fmt::Debug for Analyzer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer").finish_non_exhaustive()
    }
}

impl<'s> Analyzer<'s> {
    pub fn new(signatures: &'s dyn SignatureLookup) -> Self {
        Self { signatures }
    }

    /// Analyze a whole function and freeze its facts.
    pub fn analyze_function(&self, decl: &FunctionDecl) -> FunctionFacts {
        let mut ctx = AnalysisContext::new(&decl.info);
        for param in &decl.params {
            ctx.declare_argument(&param.name, param.by_ref);
        }
        self.analyze_body(decl, ctx)
    }

    fn analyze_body(&self, decl: &FunctionDecl, mut ctx: AnalysisContext<'_>) -> FunctionFacts {
        for expr in decl.expressions() {
            self.analyze(expr, &mut ctx);
        }
        if analyze_debug_enabled() {
            debug_log(format_args!(
                "[analyze] function {} (temps: {}, symbol table: {})",
                decl.name,
                ctx.temps().len(),
                ctx.uses_symbol_table()
            ));
        }
        ctx.finish()
    }

    /// Read-position analysis
    pub fn analyze(&self, expr: &Expr, ctx: &mut AnalysisContext<'_>) -> ExprType {
        let ty = self.analyze_kind(expr, ctx);
        expr.set_expr_type(ty);
        ty
    }

    fn analyze_kind(&self, expr: &Expr, ctx: &mut AnalysisContext<'_>) -> ExprType {
        match &expr.kind {
            ExprKind::Literal(lit) => match lit {
                Literal::Null => ExprType::Value,
                Literal::Bool(_) => ExprType::Boolean,
                Literal::Long(_) => ExprType::Long,
                Literal::Double(_) => ExprType::Double,
                Literal::String(_) => ExprType::String,
            },

            ExprKind::Variable { name } => {
                let id = ctx.lookup_or_declare(name);
                expr.set_slot(id);
                ctx.read_var(id)
            }

            ExprKind::Binary { op, left, right } => {
                let left_ty = self.analyze(left, ctx);
                let right_ty = if op.is_short_circuit() {
                    let skipped = ctx.save_flow();
                    let ty = self.analyze(right, ctx);
                    ctx.merge_flow(&skipped);
                    ty
                } else {
                    self.analyze(right, ctx)
                };
                binary_result_type(*op, left_ty, right_ty)
            }

            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Ref => {
                    self.analyze_set_reference(operand, ctx);
                    ExprType::Value
                }
                _ => {
                    let ty = self.analyze(operand, ctx);
                    unary_result_type(*op, ty)
                }
            },

            ExprKind::Assign {
                target,
                value,
                is_ref: false,
            } => {
                let ty = self.analyze(value, ctx);
                self.analyze_assign(target, ty, ctx);
                ty
            }

            ExprKind::Assign {
                target,
                value,
                is_ref: true,
            } => {
                self.analyze_set_reference(value, ctx);
                self.analyze_assign_ref(target, ctx);
                ExprType::Value
            }

            ExprKind::ListAssign { targets, value } => {
                let temp = ctx.allocate_temp();
                expr.set_temp(temp);
                self.analyze(value, ctx);
                for target in targets.iter().flatten() {
                    self.analyze_assign(target, ExprType::Value, ctx);
                }
                ExprType::Value
            }

            ExprKind::Call { callee, args } => {
                let signature = match callee {
                    Callee::Named(name) => self.signatures.function_signature(name),
                    Callee::Dynamic(callee) => {
                        self.analyze(callee, ctx);
                        None
                    }
                };
                self.analyze_arguments(args, signature.as_ref(), ctx);
                if let Callee::Named(name) = callee {
                    if uses_caller_symbols(name, args.len()) {
                        ctx.mark_uses_dynamic_symbol_table();
                    }
                }
                ExprType::Value
            }

            ExprKind::MethodCall {
                receiver,
                method_name,
                args,
                is_static,
            } => {
                self.analyze(receiver, ctx);
                let signature = if *is_static {
                    let class = static_class_name(receiver, ctx.info());
                    self.signatures.method_signature(class.as_deref(), method_name)
                } else {
                    self.signatures.method_signature(None, method_name)
                };
                self.analyze_arguments(args, signature.as_ref(), ctx);
                ExprType::Value
            }

            ExprKind::NewObject { class_name, args } => {
                let signature = match class_name {
                    ClassName::Named(name) => {
                        let class = resolve_class_scope(name, ctx.info());
                        self.signatures.method_signature(Some(&class), "__construct")
                    }
                    ClassName::Dynamic(class) => {
                        self.analyze(class, ctx);
                        None
                    }
                };
                self.analyze_arguments(args, signature.as_ref(), ctx);
                ExprType::Value
            }

            ExprKind::ArrayAccess { base, index } => {
                self.analyze(base, ctx);
                match index {
                    Some(index) => {
                        self.analyze(index, ctx);
                    }
                    None => fault(&expr.location, "cannot use [] for reading"),
                }
                ExprType::Value
            }

            ExprKind::ArrayIsSet { base, index } => {
                self.analyze(base, ctx);
                self.analyze(index, ctx);
                ExprType::Boolean
            }

            ExprKind::ArrayUnset { base, index } => {
                self.analyze_set_modified(base, ctx);
                self.analyze(index, ctx);
                ExprType::Value
            }

            ExprKind::ClassConst { .. } | ExprKind::ThisRef | ExprKind::Constant { .. } => {
                ExprType::Value
            }

            ExprKind::Closure { decl, captured } => {
                for capture in captured {
                    let id = ctx.lookup_or_declare(&capture.name);
                    if capture.by_ref {
                        ctx.set_reference(id);
                    } else {
                        ctx.read_var(id);
                    }
                }
                let mut inner = AnalysisContext::new(&decl.info);
                for capture in captured {
                    inner.declare_argument(&capture.name, capture.by_ref);
                }
                for param in &decl.params {
                    inner.declare_argument(&param.name, param.by_ref);
                }
                expr.set_closure_facts(self.analyze_body(decl, inner));
                ExprType::Value
            }

            ExprKind::ObjectField { base, .. } => {
                self.analyze(base, ctx);
                ExprType::Value
            }

            ExprKind::ClassField { .. } => ExprType::Value,

            ExprKind::CharAt { base, index } => {
                self.analyze(base, ctx);
                self.analyze(index, ctx);
                ExprType::Value
            }

            ExprKind::Conditional {
                test,
                then_expr,
                else_expr,
            } => {
                let test_ty = self.analyze(test, ctx);
                let before = ctx.save_flow();
                match then_expr {
                    Some(then_expr) => {
                        let then_ty = self.analyze(then_expr, ctx);
                        let after_then = ctx.replace_flow(before);
                        let else_ty = self.analyze(else_expr, ctx);
                        ctx.merge_flow(&after_then);
                        then_ty.join(else_ty)
                    }
                    None => {
                        let else_ty = self.analyze(else_expr, ctx);
                        ctx.merge_flow(&before);
                        test_ty.join(else_ty)
                    }
                }
            }

            ExprKind::Increment { target, .. } => {
                if !target.is_ref() {
                    fault(&target.location, "increment of a non-addressable expression");
                }
                self.analyze_set_modified(target, ctx);
                ExprType::Value
            }

            ExprKind::Include { path, .. } => {
                self.analyze(path, ctx);
                ctx.mark_uses_dynamic_symbol_table();
                ExprType::Value
            }

            ExprKind::Exit { message, .. } => {
                if let Some(message) = message {
                    self.analyze(message, ctx);
                }
                ExprType::Value
            }

            ExprKind::ArrayLiteral { entries } => {
                for entry in entries {
                    if let Some(key) = &entry.key {
                        self.analyze(key, ctx);
                    }
                    if entry.by_ref {
                        self.analyze_set_reference(&entry.value, ctx);
                    } else {
                        self.analyze(&entry.value, ctx);
                    }
                }
                ExprType::Value
            }

            ExprKind::TypePredicate { arg, .. } => {
                self.analyze(arg, ctx);
                ExprType::Boolean
            }

            ExprKind::Each { array } => {
                self.analyze_set_reference(array, ctx);
                ExprType::Value
            }

            ExprKind::Unset { target } => {
                self.analyze_unset(target, ctx);
                ExprType::Value
            }
        }
    }

    /// Arguments in order. Parameters declared by reference, and every
    /// argument of a callee without a known signature, get the
    /// conservative by-reference treatment.
    fn analyze_arguments(
        &self,
        args: &[Expr],
        signature: Option<&Signature>,
        ctx: &mut AnalysisContext<'_>,
    ) {
        for (i, arg) in args.iter().enumerate() {
            let by_ref = signature.map_or(true, |s| s.is_by_ref(i));
            if by_ref {
                self.analyze_ref_argument(arg, ctx);
            } else {
                self.analyze(arg, ctx);
            }
        }
    }

    /// `analyze_set_modified` plus `analyze_set_reference` on one node
    fn analyze_ref_argument(&self, arg: &Expr, ctx: &mut AnalysisContext<'_>) {
        match &arg.kind {
            ExprKind::Variable { name } => {
                let id = ctx.lookup_or_declare(name);
                arg.set_slot(id);
                ctx.set_modified(id);
                ctx.set_reference(id);
                arg.set_expr_type(ExprType::Value);
            }
            _ => self.analyze_set_reference(arg, ctx),
        }
    }

    // ========== Lvalue analysis ==========

    /// `target = <value of type ty>`
    pub fn analyze_assign(&self, target: &Expr, ty: ExprType, ctx: &mut AnalysisContext<'_>) {
        let target_ty = match &target.kind {
            ExprKind::Variable { name } => {
                let id = ctx.lookup_or_declare(name);
                target.set_slot(id);
                ctx.assign_var(id, ty);
                ty
            }
            ExprKind::ArrayAccess { base, index } => {
                self.analyze_set_modified(base, ctx);
                if let Some(index) = index {
                    self.analyze(index, ctx);
                }
                ExprType::Value
            }
            ExprKind::CharAt { base, index } => {
                self.analyze_set_modified(base, ctx);
                self.analyze(index, ctx);
                ExprType::Value
            }
            ExprKind::ObjectField { base, .. } => {
                self.analyze_set_modified(base, ctx);
                ExprType::Value
            }
            ExprKind::ClassField { .. } => ExprType::Value,
            _ => fault(&target.location, "assignment to a non-addressable expression"),
        };
        target.set_expr_type(target_ty);
    }

    /// `target =& <reference>`
    pub fn analyze_assign_ref(&self, target: &Expr, ctx: &mut AnalysisContext<'_>) {
        match &target.kind {
            ExprKind::Variable { name } => {
                let id = ctx.lookup_or_declare(name);
                target.set_slot(id);
                ctx.assign_var(id, ExprType::Value);
                ctx.set_reference(id);
            }
            ExprKind::ArrayAccess { base, index } => {
                self.analyze_set_modified(base, ctx);
                if let Some(index) = index {
                    self.analyze(index, ctx);
                }
            }
            ExprKind::ObjectField { base, .. } => self.analyze_set_modified(base, ctx),
            ExprKind::ClassField { .. } => {}
            _ => fault(&target.location, "reference assignment to a non-addressable expression"),
        }
        target.set_expr_type(ExprType::Value);
    }

    /// The node is written in place (element write, increment).
    /// Non-addressable nodes are analyzed as plain reads.
    pub fn analyze_set_modified(&self, expr: &Expr, ctx: &mut AnalysisContext<'_>) {
        match &expr.kind {
            ExprKind::Variable { name } => {
                let id = ctx.lookup_or_declare(name);
                expr.set_slot(id);
                ctx.set_modified(id);
            }
            ExprKind::ArrayAccess { base, index } => {
                self.analyze_set_modified(base, ctx);
                if let Some(index) = index {
                    self.analyze(index, ctx);
                }
            }
            ExprKind::CharAt { base, index } => {
                self.analyze_set_modified(base, ctx);
                self.analyze(index, ctx);
            }
            ExprKind::ObjectField { base, .. } => self.analyze_set_modified(base, ctx),
            ExprKind::ClassField { .. } | ExprKind::ThisRef => {}
            _ => {
                self.analyze(expr, ctx);
                return;
            }
        }
        expr.set_expr_type(ExprType::Value);
    }

    /// The node's address is taken. Non-addressable nodes are analyzed
    /// as plain reads.
    pub fn analyze_set_reference(&self, expr: &Expr, ctx: &mut AnalysisContext<'_>) {
        match &expr.kind {
            ExprKind::Variable { name } => {
                let id = ctx.lookup_or_declare(name);
                expr.set_slot(id);
                ctx.set_reference(id);
            }
            ExprKind::ArrayAccess { base, index } => {
                self.analyze_set_modified(base, ctx);
                if let Some(index) = index {
                    self.analyze(index, ctx);
                }
            }
            ExprKind::ObjectField { base, .. } => self.analyze_set_modified(base, ctx),
            ExprKind::ClassField { .. } => {}
            ExprKind::Unary {
                op: UnaryOp::Ref,
                operand,
            } => self.analyze_set_reference(operand, ctx),
            _ => {
                self.analyze(expr, ctx);
                return;
            }
        }
        expr.set_expr_type(ExprType::Value);
    }

    /// `unset(target)`
    pub fn analyze_unset(&self, target: &Expr, ctx: &mut AnalysisContext<'_>) {
        match &target.kind {
            ExprKind::Variable { name } => {
                let id = ctx.lookup_or_declare(name);
                target.set_slot(id);
                ctx.unset_var(id);
            }
            ExprKind::ArrayAccess {
                base,
                index: Some(index),
            } => {
                self.analyze_set_modified(base, ctx);
                self.analyze(index, ctx);
            }
            ExprKind::ObjectField { base, .. } => self.analyze_set_modified(base, ctx),
            ExprKind::ThisRef => fault(&target.location, "cannot unset $this"),
            _ => fault(&target.location, "unset of a non-addressable expression"),
        }
        target.set_expr_type(ExprType::Value);
    }
}

fn uses_caller_symbols(name: &str, arg_count: usize) -> bool {
    let lower = name.to_ascii_lowercase();
    SYMBOL_TABLE_FUNCTIONS.contains(&lower.as_str()) || (lower == "parse_str" && arg_count == 1)
}

/// `self` and `static` name the declaring class for signature lookup
pub(crate) fn resolve_class_scope(name: &str, info: &FunctionInfo) -> String {
    match name.to_ascii_lowercase().as_str() {
        "self" | "static" => info
            .declaring_class
            .clone()
            .unwrap_or_else(|| name.to_string()),
        _ => name.to_string(),
    }
}

/// Class named by the receiver of a static call, when it is literal
pub(crate) fn static_class_name(receiver: &Expr, info: &FunctionInfo) -> Option<String> {
    match &receiver.kind {
        ExprKind::Literal(Literal::String(name)) => Some(resolve_class_scope(name, info)),
        _ => None,
    }
}

/// Result type of a binary operator over analyzed operands
pub fn binary_result_type(op: BinaryOp, left: ExprType, right: ExprType) -> ExprType {
    match op {
        _ if op.is_comparison() || op.is_identity() || op.is_logical() => ExprType::Boolean,
        BinaryOp::Shl | BinaryOp::Shr => ExprType::Long,
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
            if left.is_long() && right.is_long() {
                ExprType::Long
            } else {
                ExprType::Value
            }
        }
        BinaryOp::Concat => ExprType::String,
        // long op long can overflow into a double, so only the mixed and
        // double forms are narrow.
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => {
            if left.is_number() && right.is_number() && (left.is_double() || right.is_double()) {
                ExprType::Double
            } else {
                ExprType::Value
            }
        }
        _ => ExprType::Value,
    }
}

/// Result type of a unary operator over an analyzed operand
pub fn unary_result_type(op: UnaryOp, operand: ExprType) -> ExprType {
    match op {
        UnaryOp::Not | UnaryOp::ToBoolean => ExprType::Boolean,
        UnaryOp::ToLong => ExprType::Long,
        UnaryOp::ToDouble => ExprType::Double,
        UnaryOp::ToString => ExprType::String,
        UnaryOp::Neg if operand.is_double() => ExprType::Double,
        UnaryOp::Plus if operand.is_number() => operand,
        UnaryOp::BitNot if operand.is_long() => ExprType::Long,
        UnaryOp::Suppress => operand,
        _ => ExprType::Value,
    }
}
