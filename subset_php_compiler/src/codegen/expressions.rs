use super::{box_raw, require_analyzed, Ctx, ExprGenerator};
use crate::analyze::Storage;
use crate::error::fault;
use crate::ir::{ArrayEntry, ExitKind, Expr, ExprKind, IncludeMode, Literal, UnaryOp};
use crate::runtime_api as rt;
use crate::sink::PoolValue;
use crate::types::ExprType;

impl ExprGenerator<'_> {
    // ========== Context dispatch ==========

    pub(crate) fn generate_in(&mut self, expr: &Expr, ctx: Ctx) -> String {
        match ctx {
            Ctx::Value => self.generate(expr),
            Ctx::Boolean => self.generate_boolean(expr),
            Ctx::Long => self.generate_long(expr),
            Ctx::Double => self.generate_double(expr),
            Ctx::Str => self.generate_string(expr),
        }
    }

    /// Boxed `Value` of the node
    pub fn generate(&mut self, expr: &Expr) -> String {
        let ty = expr.expr_type();
        match &expr.kind {
            ExprKind::Literal(lit) => self.literal_value(lit),

            ExprKind::Variable { .. } => self.read_variable(expr),

            ExprKind::ThisRef => self.this_value(),

            ExprKind::Binary { op, left, right } => match Ctx::of_type(ty) {
                Some(ctx) => box_raw(&self.generate_in(expr, ctx), ty),
                None => self.binary_value(*op, left, right),
            },

            ExprKind::Unary { op, operand } => self.unary_value(expr, *op, operand),

            ExprKind::Assign {
                target,
                value,
                is_ref: false,
            } => self.generate_assign(target, value),

            ExprKind::Assign {
                target,
                value,
                is_ref: true,
            } => self.generate_assign_ref(target, value),

            ExprKind::ListAssign { targets, value } => self.generate_list(expr, targets, value, true),

            ExprKind::Call { callee, args } => self.generate_call(callee, args),

            ExprKind::MethodCall {
                receiver,
                method_name,
                args,
                is_static,
            } => {
                if *is_static {
                    self.generate_static_method_call(receiver, method_name, args)
                } else {
                    self.generate_method_call(receiver, method_name, args)
                }
            }

            ExprKind::NewObject { class_name, args } => self.generate_new(class_name, args),

            ExprKind::ArrayAccess { base, index } => match index {
                Some(index) => {
                    let base = self.generate(base);
                    let index = self.generate(index);
                    rt::GET.on(&base, &[&format!("&{}", index)])
                }
                None => fault(&expr.location, "cannot use [] for reading"),
            },

            ExprKind::ArrayIsSet { .. } | ExprKind::TypePredicate { .. } => {
                box_raw(&self.generate_boolean(expr), ExprType::Boolean)
            }

            ExprKind::ArrayUnset { base, index } => self.generate_array_unset(base, index),

            ExprKind::ClassConst {
                class_name,
                const_name,
            } => {
                let mut prelude = Vec::new();
                let class = self.class_ref(class_name, &mut prelude);
                let name = self.str_constant(const_name);
                let get = rt::GET_CLASS_CONSTANT.apply(&[&class, &name]);
                block(prelude, get)
            }

            ExprKind::Constant { name } => {
                let name = self.str_constant(name);
                rt::GET_CONSTANT.apply(&[&name])
            }

            ExprKind::Closure { decl, captured } => self.generate_closure(expr, decl, captured),

            ExprKind::ObjectField { base, name } => {
                let base = self.generate(base);
                let name = self.str_constant(name);
                rt::GET_FIELD.on(&base, &["env", &name])
            }

            ExprKind::ClassField { class_name, name } => {
                let mut prelude = Vec::new();
                let cell = self.static_field_cell(class_name, name, &mut prelude);
                block(prelude, rt::VAR_TO_VALUE.on(&cell, &[]))
            }

            ExprKind::CharAt { base, index } => {
                let base = self.generate(base);
                let index = self.generate(index);
                rt::CHAR_AT.on(&base, &[&format!("&{}", index)])
            }

            ExprKind::Conditional {
                test,
                then_expr,
                else_expr,
            } => self.generate_conditional(test, then_expr.as_deref(), else_expr, Ctx::Value),

            ExprKind::Increment {
                target,
                delta,
                is_post,
            } => self.generate_increment(target, *delta, *is_post),

            ExprKind::Include { path, mode } => {
                let path = self.generate(path);
                let op = match mode {
                    IncludeMode::Include => rt::INCLUDE,
                    IncludeMode::IncludeOnce => rt::INCLUDE_ONCE,
                    IncludeMode::Require => rt::REQUIRE,
                    IncludeMode::RequireOnce => rt::REQUIRE_ONCE,
                };
                format!("{{ let _p = {}; {} }}", path, op.apply(&["&_p"]))
            }

            ExprKind::Exit { kind, message } => {
                let message = match message {
                    Some(message) => self.generate(message),
                    None => "Value::NULL".to_string(),
                };
                let op = match kind {
                    ExitKind::Exit => rt::EXIT,
                    ExitKind::Die => rt::DIE,
                };
                format!("{{ let _m = {}; {} }}", message, op.apply(&["&_m"]))
            }

            ExprKind::ArrayLiteral { entries } => self.generate_array_literal(entries),

            ExprKind::Each { array } => {
                let cell = self.generate_ref(array);
                rt::VAR_EACH.on(&cell, &[])
            }

            ExprKind::Unset { target } => self.generate_unset(target),
        }
    }

    /// Boxed value safe to store: never aliases the storage it was read
    /// from.
    pub fn generate_copy(&mut self, expr: &Expr) -> String {
        require_analyzed(expr);
        match &expr.kind {
            ExprKind::Variable { .. } => {
                let id = expr.slot();
                let (storage, ident) = self.var_storage(id);
                match storage {
                    Storage::Value => rt::COPY.on(&ident, &[]),
                    Storage::Ref => rt::VAR_COPY.on(&ident, &[]),
                    Storage::Symbol(i) => rt::VAR_COPY.on(&Self::symbol_cell(i), &[]),
                    Storage::Global => {
                        let name = self.facts.var(id).name.clone();
                        let cell = self.global_cell(&name);
                        rt::VAR_COPY.on(&cell, &[])
                    }
                    Storage::Typed(_) => self.generate(expr),
                }
            }
            ExprKind::Unary {
                op: UnaryOp::Ref,
                operand,
            } => {
                let cell = self.generate_ref(operand);
                rt::VAR_COPY.on(&cell, &[])
            }
            _ => self.generate(expr),
        }
    }

    /// Statement form, including the trailing `;`
    pub fn generate_top(&mut self, expr: &Expr) -> String {
        require_analyzed(expr);
        match &expr.kind {
            ExprKind::Assign {
                target,
                value,
                is_ref: false,
            } => {
                if let ExprKind::Variable { .. } = &target.kind {
                    let (storage, ident) = self.var_storage(target.slot());
                    match storage {
                        Storage::Typed(ty) => {
                            let raw = self.raw_assign_source(value, ty);
                            return format!("{} = {};", ident, raw);
                        }
                        Storage::Value => {
                            let value = self.generate_copy(value);
                            return format!("{} = {};", ident, value);
                        }
                        _ => {}
                    }
                }
                format!("{};", self.generate(expr))
            }
            ExprKind::ListAssign { targets, value } => {
                format!("{};", self.generate_list(expr, targets, value, false))
            }
            ExprKind::Assign { is_ref: true, .. }
            | ExprKind::Call { .. }
            | ExprKind::MethodCall { .. }
            | ExprKind::NewObject { .. }
            | ExprKind::ArrayUnset { .. }
            | ExprKind::Increment { .. }
            | ExprKind::Include { .. }
            | ExprKind::Exit { .. }
            | ExprKind::Each { .. }
            | ExprKind::Unset { .. } => format!("{};", self.generate(expr)),
            _ => format!("let _ = {};", self.generate(expr)),
        }
    }

    // ========== Leaves ==========

    pub(crate) fn literal_value(&mut self, lit: &Literal) -> String {
        match lit {
            Literal::Null => "Value::NULL".to_string(),
            Literal::Bool(true) => "Value::TRUE".to_string(),
            Literal::Bool(false) => "Value::FALSE".to_string(),
            Literal::Long(v) => self.sink.intern_value(&PoolValue::Long(*v)),
            Literal::Double(d) => self.sink.intern_value(&PoolValue::Double(*d)),
            Literal::String(s) if s.is_empty() => "Value::EMPTY_STRING".to_string(),
            Literal::String(s) => self.sink.intern_value(&PoolValue::Str(s.clone())),
        }
    }

    fn read_variable(&mut self, expr: &Expr) -> String {
        let id = expr.slot();
        let (storage, ident) = self.var_storage(id);
        match storage {
            Storage::Typed(ty) => box_raw(&ident, ty),
            Storage::Value => format!("{}.clone()", ident),
            Storage::Ref => rt::VAR_TO_VALUE.on(&ident, &[]),
            Storage::Symbol(i) => rt::VAR_TO_VALUE.on(&Self::symbol_cell(i), &[]),
            Storage::Global => {
                let name = self.facts.var(id).name.clone();
                let cell = self.global_cell(&name);
                rt::VAR_TO_VALUE.on(&cell, &[])
            }
        }
    }

    pub(crate) fn this_value(&self) -> String {
        if self.info.has_receiver() {
            "q_this.clone()".to_string()
        } else {
            "Value::NULL".to_string()
        }
    }

    // ========== Compound forms ==========

    /// `test ? then : else` in any context. `test ?: else` yields the test
    /// value itself when it is truthy.
    pub(crate) fn generate_conditional(
        &mut self,
        test: &Expr,
        then_expr: Option<&Expr>,
        else_expr: &Expr,
        ctx: Ctx,
    ) -> String {
        match then_expr {
            Some(then_expr) => {
                let test = self.generate_boolean(test);
                let then_code = self.generate_in(then_expr, ctx);
                let else_code = self.generate_in(else_expr, ctx);
                format!("(if {} {{ {} }} else {{ {} }})", test, then_code, else_code)
            }
            None => {
                let test_ty = test.expr_type();
                let else_code = self.generate_in(else_expr, ctx);
                if ctx != Ctx::Value && test_ty == ctx.ty() {
                    let test = self.generate_in(test, ctx);
                    let truthy = match ctx {
                        Ctx::Boolean => "_t".to_string(),
                        Ctx::Long => "_t != 0".to_string(),
                        Ctx::Double => "_t != 0.0".to_string(),
                        _ => rt::STR_TO_BOOLEAN.on("_t", &[]),
                    };
                    format!(
                        "{{ let _t = {}; if {} {{ _t }} else {{ {} }} }}",
                        test, truthy, else_code
                    )
                } else {
                    let test = self.generate(test);
                    let taken = match ctx {
                        Ctx::Value => "_t".to_string(),
                        Ctx::Boolean => "true".to_string(),
                        Ctx::Long => rt::TO_LONG.on("_t", &[]),
                        Ctx::Double => rt::TO_DOUBLE.on("_t", &[]),
                        Ctx::Str => rt::TO_STRING.on("_t", &[]),
                    };
                    format!(
                        "{{ let _t = {}; if {} {{ {} }} else {{ {} }} }}",
                        test,
                        rt::TO_BOOLEAN.on("_t", &[]),
                        taken,
                        else_code
                    )
                }
            }
        }
    }

    /// `@expr` in any context
    pub(crate) fn generate_suppress(&mut self, operand: &Expr, ctx: Ctx) -> String {
        let inner = self.generate_in(operand, ctx);
        format!(
            "{{ let _s = {}; let _r = {}; {}; _r }}",
            rt::BEGIN_SILENCE.apply(&[]),
            inner,
            rt::END_SILENCE.apply(&["_s"])
        )
    }

    fn generate_array_literal(&mut self, entries: &[ArrayEntry]) -> String {
        if entries.is_empty() {
            return format!("{}()", rt::NEW_ARRAY.name);
        }
        let mut code = format!("{{ let mut _arr = {}(); ", rt::NEW_ARRAY.name);
        for entry in entries {
            let key = entry.key.as_ref().map(|key| self.generate(key));
            let value = if entry.by_ref {
                self.generate_ref(&entry.value)
            } else {
                self.generate_copy(&entry.value)
            };
            let store = match (key, entry.by_ref) {
                (Some(key), false) => {
                    code.push_str(&format!("let _k = {}; ", key));
                    rt::PUT.on("_arr", &["&_k", "_v"])
                }
                (Some(key), true) => {
                    code.push_str(&format!("let _k = {}; ", key));
                    rt::PUT_REF.on("_arr", &["&_k", "_v"])
                }
                (None, false) => rt::APPEND.on("_arr", &["_v"]),
                (None, true) => rt::APPEND_REF.on("_arr", &["_v"]),
            };
            code.push_str(&format!("let _v = {}; {}; ", value, store));
        }
        code.push_str("_arr }");
        code
    }
}

/// `{ prelude; tail }`, or just `tail` with an empty prelude
pub(crate) fn block(prelude: Vec<String>, tail: String) -> String {
    if prelude.is_empty() {
        tail
    } else {
        format!("{{ {} {} }}", prelude.join(" "), tail)
    }
}
