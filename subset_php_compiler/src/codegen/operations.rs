//! Operator emission
//!
//! Binary operators pick one of three paths from the operand types:
//!
//! 1. both operands `Long`: raw `i64` operation, through the overflow-aware
//!    helpers where the result can leave the `i64` range
//! 2. both operands numeric (a comparison also accepts `Double` against
//!    `String`), neither `Boolean`: raw `f64` operation
//! 3. otherwise: the generic `Value` method

use super::{box_raw, Ctx, ExprGenerator};
use crate::error::fault;
use crate::ir::{BinaryOp, Expr, UnaryOp};
use crate::runtime_api as rt;
use crate::types::ExprType;

/// Both operands proven `Long`
pub(crate) fn long_pair(left: ExprType, right: ExprType) -> bool {
    left.is_long() && right.is_long()
}

/// Operands that may be combined as raw `f64`. Booleans never qualify:
/// PHP compares a boolean against anything as a boolean.
pub(crate) fn numeric_pair(op: BinaryOp, left: ExprType, right: ExprType) -> bool {
    if left.is_boolean() || right.is_boolean() {
        return false;
    }
    if left.is_number() && right.is_number() {
        return true;
    }
    op.is_comparison()
        && ((left.is_double() && right.is_string()) || (left.is_string() && right.is_double()))
}

/// Rust spelling of a raw comparison or arithmetic operator
fn rust_operator(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::BitAnd => "&",
        BinaryOp::BitOr => "|",
        BinaryOp::BitXor => "^",
        BinaryOp::Eq | BinaryOp::Identical => "==",
        BinaryOp::NotEq | BinaryOp::NotIdentical => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Leq => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Geq => ">=",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
        BinaryOp::Xor => "^",
        BinaryOp::Concat | BinaryOp::Shl | BinaryOp::Shr => "",
    }
}

impl ExprGenerator<'_> {
    /// Comparison, identity and logical operators as Rust `bool`
    pub(crate) fn binary_boolean(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> String {
        let (lt, rt_) = (left.expr_type(), right.expr_type());
        match op {
            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => {
                let l = self.generate_boolean(left);
                let r = self.generate_boolean(right);
                format!("({} {} {})", l, rust_operator(op), r)
            }

            BinaryOp::Identical | BinaryOp::NotIdentical => {
                if (lt == rt_ && lt.is_raw_scalar()) || (lt.is_string() && rt_.is_string()) {
                    self.counters.specialized_ops += 1;
                    let ctx = Ctx::of_type(lt).unwrap_or(Ctx::Value);
                    let l = self.generate_in(left, ctx);
                    let r = self.generate_in(right, ctx);
                    format!("({} {} {})", l, rust_operator(op), r)
                } else {
                    self.counters.dynamic_fallbacks += 1;
                    let l = self.generate(left);
                    let r = self.generate(right);
                    let same = rt::EQL.on(&l, &[&format!("&{}", r)]);
                    if op == BinaryOp::NotIdentical {
                        format!("(!{})", same)
                    } else {
                        same
                    }
                }
            }

            _ if op.is_comparison() => {
                if long_pair(lt, rt_) {
                    self.counters.specialized_ops += 1;
                    let l = self.generate_long(left);
                    let r = self.generate_long(right);
                    format!("({} {} {})", l, rust_operator(op), r)
                } else if numeric_pair(op, lt, rt_) {
                    self.counters.specialized_ops += 1;
                    let l = self.generate_double(left);
                    let r = self.generate_double(right);
                    format!("({} {} {})", l, rust_operator(op), r)
                } else {
                    self.counters.dynamic_fallbacks += 1;
                    let l = self.generate(left);
                    let r = self.generate(right);
                    let r = format!("&{}", r);
                    match op {
                        BinaryOp::Eq => rt::EQ.on(&l, &[&r]),
                        BinaryOp::NotEq => format!("(!{})", rt::EQ.on(&l, &[&r])),
                        BinaryOp::Lt => rt::LT.on(&l, &[&r]),
                        BinaryOp::Leq => rt::LEQ.on(&l, &[&r]),
                        BinaryOp::Gt => rt::GT.on(&l, &[&r]),
                        _ => rt::GEQ.on(&l, &[&r]),
                    }
                }
            }

            _ => fault(&left.location, format!("'{}' is not a boolean operator", op.as_str())),
        }
    }

    /// Operators analyzed as `Long`
    pub(crate) fn binary_long(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> String {
        let l = self.generate_long(left);
        let r = self.generate_long(right);
        self.counters.specialized_ops += 1;
        match op {
            BinaryOp::Shl => rt::SHL_LONG.apply(&[&l, &r]),
            BinaryOp::Shr => rt::SHR_LONG.apply(&[&l, &r]),
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
                format!("({} {} {})", l, rust_operator(op), r)
            }
            _ => fault(&left.location, format!("'{}' has no raw long form", op.as_str())),
        }
    }

    /// Operators analyzed as `Double`
    pub(crate) fn binary_double(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> String {
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => {
                self.counters.specialized_ops += 1;
                let l = self.generate_double(left);
                let r = self.generate_double(right);
                format!("({} {} {})", l, rust_operator(op), r)
            }
            _ => fault(&left.location, format!("'{}' has no raw double form", op.as_str())),
        }
    }

    /// Operators whose result stays boxed
    pub(crate) fn binary_value(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> String {
        let (lt, rt_) = (left.expr_type(), right.expr_type());
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
                if long_pair(lt, rt_) =>
            {
                self.counters.specialized_ops += 1;
                let l = self.generate_long(left);
                let r = self.generate_long(right);
                let helper = match op {
                    BinaryOp::Add => rt::ADD_LONG,
                    BinaryOp::Sub => rt::SUB_LONG,
                    BinaryOp::Mul => rt::MUL_LONG,
                    BinaryOp::Div => rt::DIV_LONG,
                    _ => rt::MOD_LONG,
                };
                helper.apply(&[&l, &r])
            }

            BinaryOp::Div if numeric_pair(op, lt, rt_) => {
                self.counters.specialized_ops += 1;
                let l = self.generate_double(left);
                let r = self.generate_double(right);
                rt::DIV_DOUBLE.apply(&[&l, &r])
            }

            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul if numeric_pair(op, lt, rt_) => {
                box_raw(&self.binary_double(op, left, right), ExprType::Double)
            }

            BinaryOp::Concat => {
                box_raw(&self.generate_in_str_concat(left, right), ExprType::String)
            }

            _ if op.is_comparison() || op.is_identity() || op.is_logical() => {
                box_raw(&self.binary_boolean(op, left, right), ExprType::Boolean)
            }

            _ => {
                self.counters.dynamic_fallbacks += 1;
                let l = self.generate(left);
                let r = self.generate(right);
                let method = match op {
                    BinaryOp::Add => rt::ADD,
                    BinaryOp::Sub => rt::SUB,
                    BinaryOp::Mul => rt::MUL,
                    BinaryOp::Div => rt::DIV,
                    BinaryOp::Mod => rt::MODULO,
                    BinaryOp::BitAnd => rt::BIT_AND,
                    BinaryOp::BitOr => rt::BIT_OR,
                    BinaryOp::BitXor => rt::BIT_XOR,
                    BinaryOp::Shl => rt::SHL,
                    _ => rt::SHR,
                };
                method.on(&l, &[&format!("&{}", r)])
            }
        }
    }

    fn generate_in_str_concat(&mut self, left: &Expr, right: &Expr) -> String {
        let l = self.generate_string(left);
        let r = self.generate_string(right);
        rt::STR_CONCAT.on(&l, &[&format!("&{}", r)])
    }

    /// Unary operators in value context
    pub(crate) fn unary_value(&mut self, expr: &Expr, op: UnaryOp, operand: &Expr) -> String {
        let ty = expr.expr_type();
        if op != UnaryOp::Ref {
            if let Some(ctx) = Ctx::of_type(ty) {
                return box_raw(&self.generate_in(expr, ctx), ty);
            }
        }
        match op {
            UnaryOp::Neg if operand.is_long() => {
                self.counters.specialized_ops += 1;
                let operand = self.generate_long(operand);
                rt::NEG_LONG.apply(&[&operand])
            }
            UnaryOp::Neg => {
                self.counters.dynamic_fallbacks += 1;
                rt::NEG.on(&self.generate(operand), &[])
            }
            UnaryOp::Plus => rt::POS.on(&self.generate(operand), &[]),
            UnaryOp::BitNot => {
                self.counters.dynamic_fallbacks += 1;
                rt::BIT_NOT.on(&self.generate(operand), &[])
            }
            UnaryOp::Ref => format!("Value::Ref({})", self.generate_ref(operand)),
            UnaryOp::Suppress => self.generate_suppress(operand, Ctx::Value),
            UnaryOp::Clone => rt::CLONE_OBJECT.on(&self.generate(operand), &["env"]),
            UnaryOp::ToArray => rt::TO_ARRAY.on(&self.generate(operand), &[]),
            UnaryOp::ToObject => rt::TO_OBJECT.on(&self.generate(operand), &[]),
            UnaryOp::Not
            | UnaryOp::ToBoolean
            | UnaryOp::ToLong
            | UnaryOp::ToDouble
            | UnaryOp::ToString => fault(&expr.location, "conversion analyzed as a boxed value"),
        }
    }
}
