//! Writes: assignment, reference binding, unset, increment, `list()`
//!
//! A write target is lowered to a *place*: a Rust expression denoting a
//! `&mut Value` (directly, or through a `RefMut`/`ElemMut` guard), plus a
//! prelude of `let` bindings for the keys and object handles it needs.
//! The assigned value is evaluated into `_v` ahead of the prelude, and
//! the place operation is bound to `_res` so every guard is dropped before
//! the enclosing block yields.

use super::expressions::block;
use super::{box_raw, Ctx, ExprGenerator};
use crate::analyze::Storage;
use crate::error::fault;
use crate::ir::{Expr, ExprKind, UnaryOp};
use crate::runtime_api as rt;
use crate::types::ExprType;

/// `{ prelude let _res = op; _res }`
fn finish_place(prelude: Vec<String>, op: String) -> String {
    block(prelude, format!("{{ let _res = {}; _res }}", op))
}

impl ExprGenerator<'_> {
    // ========== Places ==========

    /// Place expression for `expr`, pushing the bindings it needs
    fn emit_place(&mut self, expr: &Expr, prelude: &mut Vec<String>) -> String {
        match &expr.kind {
            ExprKind::Variable { .. } => {
                let id = expr.slot();
                let (storage, ident) = self.var_storage(id);
                match storage {
                    Storage::Value => ident,
                    Storage::Ref => rt::VAR_BORROW_MUT.on(&ident, &[]),
                    Storage::Symbol(i) => rt::VAR_BORROW_MUT.on(&Self::symbol_cell(i), &[]),
                    Storage::Global => {
                        let name = self.facts.var(id).name.clone();
                        let cell = self.global_cell(&name);
                        rt::VAR_BORROW_MUT.on(&cell, &[])
                    }
                    Storage::Typed(ty) => fault(
                        &expr.location,
                        format!("in-place write to ${} stored as raw {}", self.facts.var(id).name, ty),
                    ),
                }
            }

            ExprKind::ArrayAccess { base, index } => {
                let base = self.emit_place(base, prelude);
                let key = index.as_ref().map(|index| self.bind_key(index, prelude));
                match key {
                    Some(key) => rt::ELEM_MUT.on(&base, &[&format!("&{}", key)]),
                    None => rt::TAIL_MUT.on(&base, &[]),
                }
            }

            ExprKind::ObjectField { base, name } => {
                let object = self.bind_object(base, prelude);
                let name = self.str_constant(name);
                let cell = rt::GET_FIELD_REF.on(&object, &["env", &name]);
                rt::VAR_BORROW_MUT.on(&cell, &[])
            }

            ExprKind::ClassField { class_name, name } => {
                let cell = self.static_field_cell(class_name, name, prelude);
                rt::VAR_BORROW_MUT.on(&cell, &[])
            }

            // Writes through a non-addressable base land in a scratch copy.
            ExprKind::Call { .. }
            | ExprKind::MethodCall { .. }
            | ExprKind::NewObject { .. }
            | ExprKind::ThisRef
            | ExprKind::Conditional { .. }
            | ExprKind::Constant { .. }
            | ExprKind::ClassConst { .. } => {
                let scratch = format!("_b{}", prelude.len());
                let value = self.generate(expr);
                prelude.push(format!("let mut {} = {};", scratch, value));
                scratch
            }

            _ => fault(&expr.location, "write to a non-addressable expression"),
        }
    }

    /// `let _k<n> = <key>;`
    fn bind_key(&mut self, index: &Expr, prelude: &mut Vec<String>) -> String {
        let name = format!("_k{}", prelude.len());
        let key = self.generate(index);
        prelude.push(format!("let {} = {};", name, key));
        name
    }

    /// `let _o<n> = <object>;`
    fn bind_object(&mut self, base: &Expr, prelude: &mut Vec<String>) -> String {
        let name = format!("_o{}", prelude.len());
        let object = self.generate(base);
        prelude.push(format!("let {} = {};", name, object));
        name
    }

    // ========== Assignment ==========

    /// Raw source for a store into a raw local of type `ty`
    pub(crate) fn raw_assign_source(&mut self, value: &Expr, ty: ExprType) -> String {
        match Ctx::of_type(ty) {
            Some(ctx) => self.generate_in(value, ctx),
            None => fault(&value.location, format!("raw local of type {}", ty)),
        }
    }

    /// `target = value` in value context
    pub(crate) fn generate_assign(&mut self, target: &Expr, value: &Expr) -> String {
        if let ExprKind::Variable { .. } = &target.kind {
            if let (Storage::Typed(ty), ident) = self.var_storage(target.slot()) {
                let raw = self.raw_assign_source(value, ty);
                return format!("{{ {} = {}; {} }}", ident, raw, box_raw(&ident, ty));
            }
        }
        let value = self.generate_copy(value);
        self.emit_assign_value(target, &value)
    }

    /// `target = value` where the node's type matches `ctx`
    pub(crate) fn assign_raw(&mut self, target: &Expr, value: &Expr, ctx: Ctx) -> String {
        if let ExprKind::Variable { .. } = &target.kind {
            if let (Storage::Typed(ty), ident) = self.var_storage(target.slot()) {
                let raw = self.raw_assign_source(value, ty);
                return format!("{{ {} = {}; {} }}", ident, raw, ident);
            }
        }
        let raw = self.generate_in(value, ctx);
        let held = if ctx == Ctx::Str { "_t.clone()" } else { "_t" };
        let store = self.emit_assign_value(target, &box_raw(held, ctx.ty()));
        format!("{{ let _t = {}; let _ = {}; _t }}", raw, store)
    }

    /// Store an already generated boxed `value` into `target`
    fn emit_assign_value(&mut self, target: &Expr, value: &str) -> String {
        match &target.kind {
            ExprKind::Variable { .. } => {
                let id = target.slot();
                let (storage, ident) = self.var_storage(id);
                match storage {
                    Storage::Value => format!("{{ {} = {}; {}.clone() }}", ident, value, ident),
                    Storage::Ref => {
                        format!("{{ let _v = {}; {} }}", value, rt::VAR_SET.on(&ident, &["_v"]))
                    }
                    Storage::Symbol(i) => format!(
                        "{{ let _v = {}; {} }}",
                        value,
                        rt::VAR_SET.on(&Self::symbol_cell(i), &["_v"])
                    ),
                    Storage::Global => {
                        let name = self.facts.var(id).name.clone();
                        let cell = self.global_cell(&name);
                        format!("{{ let _v = {}; {} }}", value, rt::VAR_SET.on(&cell, &["_v"]))
                    }
                    Storage::Typed(_) => {
                        fault(&target.location, "boxed store into a raw local")
                    }
                }
            }

            ExprKind::ArrayAccess { base, index } => {
                let mut prelude = vec![format!("let _v = {};", value)];
                let place = self.emit_place(base, &mut prelude);
                let key = index.as_ref().map(|index| self.bind_key(index, &mut prelude));
                let op = match key {
                    Some(key) => rt::PUT.on(&place, &[&format!("&{}", key), "_v"]),
                    None => rt::APPEND.on(&place, &["_v"]),
                };
                finish_place(prelude, op)
            }

            ExprKind::CharAt { base, index } => self.emit_set_char_at(base, index, value),

            ExprKind::ObjectField { base, name } => {
                let mut prelude = vec![format!("let _v = {};", value)];
                let object = self.bind_object(base, &mut prelude);
                let name = self.str_constant(name);
                block(prelude, rt::PUT_FIELD.on(&object, &["env", &name, "_v"]))
            }

            ExprKind::ClassField { class_name, name } => {
                let mut prelude = vec![format!("let _v = {};", value)];
                let cell = self.static_field_cell(class_name, name, &mut prelude);
                block(prelude, rt::VAR_SET.on(&cell, &["_v"]))
            }

            _ => fault(&target.location, "assignment to a non-addressable expression"),
        }
    }

    /// `$s{i} = value`
    fn emit_set_char_at(&mut self, base: &Expr, index: &Expr, value: &str) -> String {
        let mut prelude = vec![format!("let _v = {};", value)];
        let place = self.emit_place(base, &mut prelude);
        let key = self.bind_key(index, &mut prelude);
        let op = rt::SET_CHAR_AT.on(&place, &[&format!("&{}", key), "_v"]);
        finish_place(prelude, op)
    }

    /// `target =& value`
    pub(crate) fn generate_assign_ref(&mut self, target: &Expr, value: &Expr) -> String {
        let cell = self.generate_ref(value);
        let mut prelude = vec![format!("let _r = {};", cell)];
        match &target.kind {
            ExprKind::Variable { .. } => {
                let id = target.slot();
                let (storage, ident) = self.var_storage(id);
                match storage {
                    Storage::Ref => {
                        prelude.push(format!("{} = _r.clone();", ident));
                    }
                    Storage::Symbol(i) => {
                        let name = self.facts.var(id).name.clone();
                        let name = self.str_constant(&name);
                        prelude.push(format!("{} = _r.clone();", Self::symbol_cell(i)));
                        prelude.push(format!("{};", rt::REBIND_SYMBOL.apply(&[&name, "_r.clone()"])));
                    }
                    Storage::Global => {
                        let name = self.facts.var(id).name.clone();
                        let name = self.str_constant(&name);
                        return block(prelude, rt::BIND_GLOBAL.apply(&[&name, "_r"]));
                    }
                    Storage::Value | Storage::Typed(_) => fault(
                        &target.location,
                        format!("reference bound to ${} without a cell", self.facts.var(id).name),
                    ),
                }
                block(prelude, rt::VAR_TO_VALUE.on("_r", &[]))
            }

            ExprKind::ArrayAccess { base, index } => {
                let place = self.emit_place(base, &mut prelude);
                let key = index.as_ref().map(|index| self.bind_key(index, &mut prelude));
                let op = match key {
                    Some(key) => rt::PUT_REF.on(&place, &[&format!("&{}", key), "_r"]),
                    None => rt::APPEND_REF.on(&place, &["_r"]),
                };
                finish_place(prelude, op)
            }

            ExprKind::ObjectField { base, name } => {
                let object = self.bind_object(base, &mut prelude);
                let name = self.str_constant(name);
                block(prelude, rt::PUT_FIELD_REF.on(&object, &["env", &name, "_r"]))
            }

            ExprKind::ClassField { class_name, name } => {
                let class = self.class_ref(class_name, &mut prelude);
                let name = self.str_constant(name);
                block(prelude, rt::BIND_STATIC_FIELD.apply(&[&class, &name, "_r"]))
            }

            _ => fault(&target.location, "reference assignment to a non-addressable expression"),
        }
    }

    // ========== References ==========

    /// `Var` cell for `&expr`. Non-addressable values get a fresh cell.
    pub fn generate_ref(&mut self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Variable { .. } => {
                let id = expr.slot();
                let (storage, ident) = self.var_storage(id);
                match storage {
                    Storage::Ref => format!("{}.clone()", ident),
                    Storage::Symbol(i) => format!("{}.clone()", Self::symbol_cell(i)),
                    Storage::Global => {
                        let name = self.facts.var(id).name.clone();
                        self.global_cell(&name)
                    }
                    Storage::Value | Storage::Typed(_) => fault(
                        &expr.location,
                        format!("${} was not analyzed as a reference", self.facts.var(id).name),
                    ),
                }
            }

            ExprKind::ArrayAccess { base, index } => {
                let mut prelude = Vec::new();
                let place = self.emit_place(base, &mut prelude);
                let key = index.as_ref().map(|index| self.bind_key(index, &mut prelude));
                let op = match key {
                    Some(key) => rt::GET_REF.on(&place, &[&format!("&{}", key)]),
                    None => rt::MAKE_REF.on(&rt::TAIL_MUT.on(&place, &[]), &[]),
                };
                finish_place(prelude, op)
            }

            ExprKind::ObjectField { base, name } => {
                let mut prelude = Vec::new();
                let object = self.bind_object(base, &mut prelude);
                let name = self.str_constant(name);
                block(prelude, rt::GET_FIELD_REF.on(&object, &["env", &name]))
            }

            ExprKind::ClassField { class_name, name } => {
                let mut prelude = Vec::new();
                let cell = self.static_field_cell(class_name, name, &mut prelude);
                block(prelude, cell)
            }

            ExprKind::Unary {
                op: UnaryOp::Ref,
                operand,
            } => self.generate_ref(operand),

            ExprKind::Literal(_) | ExprKind::ClassConst { .. } | ExprKind::ThisRef => {
                fault(&expr.location, "reference to a non-addressable expression")
            }

            _ => {
                let value = self.generate(expr);
                rt::VAR_FROM_VALUE.apply(&[&value])
            }
        }
    }

    // ========== Unset ==========

    /// `unset(target)`
    pub(crate) fn generate_unset(&mut self, target: &Expr) -> String {
        match &target.kind {
            ExprKind::Variable { .. } => {
                let id = target.slot();
                let (storage, ident) = self.var_storage(id);
                match storage {
                    Storage::Value => format!("{{ {} = Value::NULL; Value::NULL }}", ident),
                    Storage::Ref => {
                        format!("{{ {} = {}; Value::NULL }}", ident, rt::VAR_NEW.apply(&[]))
                    }
                    Storage::Symbol(i) => {
                        let name = self.facts.var(id).name.clone();
                        let name = self.str_constant(&name);
                        format!(
                            "{{ {} = {}; {}; Value::NULL }}",
                            Self::symbol_cell(i),
                            rt::VAR_NEW.apply(&[]),
                            rt::UNSET_SYMBOL.apply(&[&name])
                        )
                    }
                    Storage::Global => {
                        let name = self.facts.var(id).name.clone();
                        let name = self.str_constant(&name);
                        format!("{{ {}; Value::NULL }}", rt::UNSET_GLOBAL.apply(&[&name]))
                    }
                    Storage::Typed(_) => fault(&target.location, "unset of a raw local"),
                }
            }

            ExprKind::ArrayAccess {
                base,
                index: Some(index),
            } => self.generate_array_unset(base, index),

            ExprKind::ObjectField { base, name } => {
                let mut prelude = Vec::new();
                let object = self.bind_object(base, &mut prelude);
                let name = self.str_constant(name);
                prelude.push(format!("{};", rt::UNSET_FIELD.on(&object, &["env", &name])));
                block(prelude, "Value::NULL".to_string())
            }

            ExprKind::ThisRef => fault(&target.location, "cannot unset $this"),

            _ => fault(&target.location, "unset of a non-addressable expression"),
        }
    }

    /// `unset($a[$k])`
    pub(crate) fn generate_array_unset(&mut self, base: &Expr, index: &Expr) -> String {
        let mut prelude = Vec::new();
        let place = self.emit_place(base, &mut prelude);
        let key = self.bind_key(index, &mut prelude);
        prelude.push(format!("{};", rt::REMOVE.on(&place, &[&format!("&{}", key)])));
        block(prelude, "Value::NULL".to_string())
    }

    // ========== Increment and list ==========

    /// `++$x`, `$x--`, ...
    pub(crate) fn generate_increment(&mut self, target: &Expr, delta: i64, is_post: bool) -> String {
        let mut prelude = Vec::new();
        let place = self.emit_place(target, &mut prelude);
        let delta = format!("{}_i64", delta);
        let op = if is_post {
            rt::POST_INCREMENT.on(&place, &[&delta])
        } else {
            rt::PRE_INCREMENT.on(&place, &[&delta])
        };
        finish_place(prelude, op)
    }

    /// `list(..) = value`. Targets are assigned left to right from the
    /// node's temp. As a statement (`yield_value` false) the block yields
    /// nothing.
    pub(crate) fn generate_list(
        &mut self,
        expr: &Expr,
        targets: &[Option<Expr>],
        value: &Expr,
        yield_value: bool,
    ) -> String {
        let temp = expr.temp().to_string();
        let value = self.generate_copy(value);
        let mut code = format!("{{ {} = {}; ", temp, value);
        for (i, target) in targets.iter().enumerate() {
            if let Some(target) = target {
                let element = rt::GET_INDEX.on(&temp, &[&format!("{}_i64", i)]);
                let store = self.emit_assign_value(target, &element);
                code.push_str(&format!("let _ = {}; ", store));
            }
        }
        if yield_value {
            code.push_str(&format!("{}.clone() }}", temp));
        } else {
            code.push('}');
        }
        code
    }
}
