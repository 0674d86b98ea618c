//! Raw evaluation contexts
//!
//! A node whose static type matches the requested context always takes its
//! specialized path here. Anything else is generated in its own best
//! context and converted.

use super::{box_raw, Ctx, ExprGenerator};
use crate::analyze::Storage;
use crate::error::fault;
use crate::ir::{BinaryOp, Expr, ExprKind, Literal, TypePredicate, UnaryOp};
use crate::runtime_api as rt;
use crate::sink::{double_literal, long_literal};
use crate::types::ExprType;

impl ExprGenerator<'_> {
    /// Rust `bool`
    pub fn generate_boolean(&mut self, expr: &Expr) -> String {
        let ty = expr.expr_type();
        match &expr.kind {
            ExprKind::Literal(Literal::Bool(b)) => b.to_string(),
            ExprKind::Variable { .. } => self.variable_raw(expr, Ctx::Boolean),
            ExprKind::Binary { op, left, right }
                if op.is_comparison() || op.is_identity() || op.is_logical() =>
            {
                self.binary_boolean(*op, left, right)
            }
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => format!("(!{})", self.generate_boolean(operand)),
            ExprKind::Unary {
                op: UnaryOp::ToBoolean,
                operand,
            } => self.generate_boolean(operand),
            ExprKind::ArrayIsSet { base, index } => {
                let base = self.generate(base);
                let index = self.generate(index);
                rt::ISSET_AT.on(&base, &[&format!("&{}", index)])
            }
            ExprKind::TypePredicate { predicate, arg } => self.type_predicate(*predicate, arg),
            _ => self.generate_shared(expr, ty, Ctx::Boolean),
        }
    }

    /// Rust `i64`
    pub fn generate_long(&mut self, expr: &Expr) -> String {
        let ty = expr.expr_type();
        match &expr.kind {
            ExprKind::Literal(Literal::Long(v)) => long_literal(*v),
            ExprKind::Variable { .. } => self.variable_raw(expr, Ctx::Long),
            ExprKind::Binary { op, left, right } if ty.is_long() => {
                self.binary_long(*op, left, right)
            }
            ExprKind::Unary {
                op: UnaryOp::ToLong,
                operand,
            } => self.generate_long(operand),
            ExprKind::Unary {
                op: UnaryOp::Plus,
                operand,
            } if ty.is_long() => self.generate_long(operand),
            ExprKind::Unary {
                op: UnaryOp::BitNot,
                operand,
            } if ty.is_long() => {
                self.counters.specialized_ops += 1;
                format!("(!{})", self.generate_long(operand))
            }
            _ => self.generate_shared(expr, ty, Ctx::Long),
        }
    }

    /// Rust `f64`
    pub fn generate_double(&mut self, expr: &Expr) -> String {
        let ty = expr.expr_type();
        match &expr.kind {
            ExprKind::Literal(Literal::Double(d)) => double_literal(*d),
            ExprKind::Literal(Literal::Long(v)) => double_literal(*v as f64),
            ExprKind::Variable { .. } => self.variable_raw(expr, Ctx::Double),
            ExprKind::Binary { op, left, right } if ty.is_double() => {
                self.binary_double(*op, left, right)
            }
            ExprKind::Unary {
                op: UnaryOp::ToDouble,
                operand,
            } => self.generate_double(operand),
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand,
            } if ty.is_double() => {
                self.counters.specialized_ops += 1;
                format!("(-{})", self.generate_double(operand))
            }
            ExprKind::Unary {
                op: UnaryOp::Plus,
                operand,
            } if ty.is_double() => self.generate_double(operand),
            _ => self.generate_shared(expr, ty, Ctx::Double),
        }
    }

    /// Raw `PhpStr`
    pub fn generate_string(&mut self, expr: &Expr) -> String {
        let ty = expr.expr_type();
        match &expr.kind {
            ExprKind::Literal(Literal::String(s)) => self.str_constant(s),
            ExprKind::Variable { .. } => self.variable_raw(expr, Ctx::Str),
            ExprKind::Binary {
                op: BinaryOp::Concat,
                left,
                right,
            } => {
                let left = self.generate_string(left);
                let right = self.generate_string(right);
                rt::STR_CONCAT.on(&left, &[&format!("&{}", right)])
            }
            ExprKind::Unary {
                op: UnaryOp::ToString,
                operand,
            } => self.generate_string(operand),
            _ => self.generate_shared(expr, ty, Ctx::Str),
        }
    }

    /// Forms with a path in every raw context, then the conversion
    /// fallback
    fn generate_shared(&mut self, expr: &Expr, ty: ExprType, ctx: Ctx) -> String {
        match &expr.kind {
            ExprKind::Conditional {
                test,
                then_expr,
                else_expr,
            } => self.generate_conditional(test, then_expr.as_deref(), else_expr, ctx),
            ExprKind::Unary {
                op: UnaryOp::Suppress,
                operand,
            } => self.generate_suppress(operand, ctx),
            ExprKind::Assign {
                target,
                value,
                is_ref: false,
            } if ty == ctx.ty() => self.assign_raw(target, value, ctx),
            _ => self.convert_node(expr, ty, ctx),
        }
    }

    /// Generate in the node's own context and convert to `ctx`
    fn convert_node(&mut self, expr: &Expr, ty: ExprType, ctx: Ctx) -> String {
        match Ctx::of_type(ty) {
            Some(own) if own == ctx => fault(
                &expr.location,
                format!("no {} code path for this expression", ty),
            ),
            Some(own) => {
                let raw = self.generate_in(expr, own);
                convert_raw(&raw, ty, ctx)
            }
            None => {
                let value = self.generate(expr);
                unbox(&value, ctx)
            }
        }
    }

    /// Variable read in a raw context
    fn variable_raw(&mut self, expr: &Expr, ctx: Ctx) -> String {
        let id = expr.slot();
        let (storage, ident) = self.var_storage(id);
        match storage {
            Storage::Typed(ty) => convert_raw(&ident, ty, ctx),
            Storage::Value => unbox(&ident, ctx),
            Storage::Ref => unbox_var(&ident, ctx),
            Storage::Symbol(i) => unbox_var(&Self::symbol_cell(i), ctx),
            Storage::Global => {
                let name = self.facts.var(id).name.clone();
                let cell = self.global_cell(&name);
                unbox_var(&cell, ctx)
            }
        }
    }

    fn type_predicate(&mut self, predicate: TypePredicate, arg: &Expr) -> String {
        let value = self.generate(arg);
        format!("{}.{}()", value, predicate.runtime_name())
    }
}

/// Convert a raw fragment of type `from` to context `ctx`
pub(crate) fn convert_raw(raw: &str, from: ExprType, ctx: Ctx) -> String {
    match (from, ctx) {
        (_, Ctx::Value) => box_raw(raw, from),
        (ExprType::Long, Ctx::Long)
        | (ExprType::Double, Ctx::Double)
        | (ExprType::Boolean, Ctx::Boolean)
        | (ExprType::String, Ctx::Str) => raw.to_string(),
        (ExprType::Long, Ctx::Boolean) => format!("({} != 0)", raw),
        (ExprType::Double, Ctx::Boolean) => format!("({} != 0.0)", raw),
        (ExprType::Boolean, Ctx::Long) => format!("({} as i64)", raw),
        (ExprType::Long, Ctx::Double) => format!("({} as f64)", raw),
        (ExprType::Boolean, Ctx::Double) => format!("(({} as i64) as f64)", raw),
        // PHP's double to integer conversion is not a Rust cast.
        (ExprType::Double, Ctx::Long) => rt::TO_LONG.on(&box_raw(raw, from), &[]),
        (ExprType::String, Ctx::Boolean) => rt::STR_TO_BOOLEAN.on(raw, &[]),
        (ExprType::String, Ctx::Long) => rt::STR_TO_LONG.on(raw, &[]),
        (ExprType::String, Ctx::Double) => rt::STR_TO_DOUBLE.on(raw, &[]),
        (ExprType::Long, Ctx::Str) => rt::STR_FROM_LONG.apply(&[raw]),
        (ExprType::Double, Ctx::Str) => rt::STR_FROM_DOUBLE.apply(&[raw]),
        (ExprType::Boolean, Ctx::Str) => rt::STR_FROM_BOOL.apply(&[raw]),
        (ExprType::Unknown | ExprType::Value, _) => unbox(raw, ctx),
    }
}

/// Raw view of a boxed `Value` fragment
fn unbox(value: &str, ctx: Ctx) -> String {
    match ctx {
        Ctx::Value => value.to_string(),
        Ctx::Boolean => rt::BOOL_VALUE.on(value, &[]),
        Ctx::Long => rt::LONG_VALUE.on(value, &[]),
        Ctx::Double => rt::DOUBLE_VALUE.on(value, &[]),
        Ctx::Str => rt::TO_STRING.on(value, &[]),
    }
}

/// Raw view of a `Var` cell fragment
fn unbox_var(cell: &str, ctx: Ctx) -> String {
    match ctx {
        Ctx::Value => rt::VAR_TO_VALUE.on(cell, &[]),
        Ctx::Boolean => rt::VAR_BOOL_VALUE.on(cell, &[]),
        Ctx::Long => rt::VAR_LONG_VALUE.on(cell, &[]),
        Ctx::Double => rt::VAR_DOUBLE_VALUE.on(cell, &[]),
        Ctx::Str => rt::TO_STRING.on(&rt::VAR_TO_VALUE.on(cell, &[]), &[]),
    }
}
