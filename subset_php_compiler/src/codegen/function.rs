//! Whole-function emission
//!
//! A compiled function has the shape
//!
//! ```text
//! #[allow(..)]
//! pub fn f_<name>(env: &mut dyn Environment, [q_this: &Value,] p_a: Value, p_b: Var) -> Value {
//!     <symbol table frame>
//!     <locals, by storage>
//!     <parameter bindings, by storage>
//!     <temps>
//!     <statements>
//!     <result>
//! }
//! ```
//!
//! Functions with more than [`rt::MAX_FIXED_ARITY`] parameters take
//! `args: &[Value]` instead and unpack it with `arg_value`/`arg_ref`.
//! Closures reuse the same body emission inside a `Value::closure`.

use super::{box_raw, function_ident, param_ident, CodegenConfig, ExprGenerator, GenCounters};
use crate::analyze::{FunctionFacts, SignatureLookup, Storage, VarId};
use crate::error::fault;
use crate::ir::{CapturedVar, Expr, FunctionDecl};
use crate::runtime_api as rt;
use crate::sink::{double_literal, long_literal, Sink};
use crate::span::Location;
use crate::types::ExprType;

const FUNCTION_ATTRIBUTE: &str =
    "#[allow(unused_mut, unused_variables, unused_assignments, unreachable_code, non_snake_case)]";

/// Incoming value for one declared argument
#[derive(Debug, Clone)]
pub(crate) struct ArgBinding {
    pub name: String,
    /// `source` is a `Var` rather than a `Value`
    pub by_ref: bool,
    pub source: String,
}

/// Zero value of a raw local
fn raw_zero(ty: ExprType) -> String {
    match ty {
        ExprType::Long => long_literal(0),
        ExprType::Double => double_literal(0.0),
        ExprType::Boolean => "false".to_string(),
        _ => "Value::NULL".to_string(),
    }
}

impl ExprGenerator<'_> {
    /// Body lines of `decl`, after the signature. Argument names bound by
    /// `bindings` are not declared as locals.
    pub(crate) fn emit_body(&mut self, decl: &FunctionDecl, bindings: &[ArgBinding]) -> Vec<String> {
        let facts = self.facts;
        let ind = self.indent(self.depth);
        let mut lines = Vec::new();

        if facts.uses_symbol_table() {
            let names: Vec<String> = facts
                .symbol_names()
                .iter()
                .map(|name| self.str_constant(name))
                .collect();
            let push = rt::PUSH_SYMBOLS.apply(&[&format!("&[{}]", names.join(", "))]);
            lines.push(format!("{}let mut _sym: Vec<Var> = {};", ind, push));
        }

        for var in facts.vars().iter().filter(|v| !v.flags.is_argument) {
            let ident = super::var_ident(&var.name);
            match var.storage {
                Storage::Typed(ty) => lines.push(format!(
                    "{}let mut {}: {} = {};",
                    ind,
                    ident,
                    ty.to_rust_type(),
                    raw_zero(ty)
                )),
                Storage::Value => {
                    lines.push(format!("{}let mut {}: Value = Value::NULL;", ind, ident))
                }
                Storage::Ref => lines.push(format!(
                    "{}let mut {}: Var = {};",
                    ind,
                    ident,
                    rt::VAR_NEW.apply(&[])
                )),
                Storage::Symbol(_) | Storage::Global => {}
            }
        }

        for binding in bindings {
            let line = self.bind_argument(binding, &decl.name);
            lines.push(format!("{}{}", ind, line));
        }

        for temp in facts.temps() {
            lines.push(format!("{}let mut {}: Value = Value::NULL;", ind, temp));
        }

        for expr in &decl.body {
            if self.config.emit_comments {
                lines.push(format!("{}// {}", ind, expr.location));
            }
            let statement = self.generate_top(expr);
            lines.push(format!("{}{}", ind, statement));
        }

        let result = match &decl.result {
            Some(result) => self.generate(result),
            None => "Value::NULL".to_string(),
        };
        if facts.uses_symbol_table() {
            lines.push(format!("{}let _ret = {};", ind, result));
            lines.push(format!("{}{};", ind, rt::POP_SYMBOLS.apply(&[])));
            lines.push(format!("{}_ret", ind));
        } else {
            lines.push(format!("{}{}", ind, result));
        }
        lines
    }

    /// Bind one incoming argument to its variable's storage
    fn bind_argument(&mut self, binding: &ArgBinding, function: &str) -> String {
        let facts = self.facts;
        let id = match facts.lookup(&binding.name) {
            Some(id) => id,
            None => fault(
                &Location::default(),
                format!("argument ${} of {} was never analyzed", binding.name, function),
            ),
        };
        let ident = super::var_ident(&binding.name);
        let source = &binding.source;
        match (facts.storage(id), binding.by_ref) {
            (Storage::Ref, true) => format!("let mut {}: Var = {};", ident, source),
            (Storage::Ref, false) => format!(
                "let mut {}: Var = {};",
                ident,
                rt::VAR_FROM_VALUE.apply(&[source])
            ),
            (Storage::Value, false) => format!("let mut {}: Value = {};", ident, source),
            (Storage::Symbol(i), true) => {
                let name = self.str_constant(&binding.name);
                let cell = Self::symbol_cell(i);
                format!(
                    "{} = {}; {};",
                    cell,
                    source,
                    rt::REBIND_SYMBOL.apply(&[&name, &format!("{}.clone()", cell)])
                )
            }
            (Storage::Symbol(i), false) => {
                format!("let _ = {};", rt::VAR_SET.on(&Self::symbol_cell(i), &[source]))
            }
            (Storage::Global, true) => {
                let name = self.str_constant(&binding.name);
                format!("let _ = {};", rt::BIND_GLOBAL.apply(&[&name, source]))
            }
            (Storage::Global, false) => {
                let cell = self.global_cell(&binding.name);
                format!("let _ = {};", rt::VAR_SET.on(&cell, &[source]))
            }
            (storage, by_ref) => fault(
                &Location::default(),
                format!(
                    "argument ${} of {} (by_ref: {}) cannot live in {:?}",
                    binding.name, function, by_ref, storage
                ),
            ),
        }
    }

    // ========== Closures ==========

    /// `Var` cell of a variable of this function, by slot
    fn var_cell(&mut self, id: VarId, location: &Location) -> String {
        let facts = self.facts;
        let var = facts.var(id);
        match var.storage {
            Storage::Ref => format!("{}.clone()", super::var_ident(&var.name)),
            Storage::Symbol(i) => format!("{}.clone()", Self::symbol_cell(i)),
            Storage::Global => {
                let name = var.name.clone();
                self.global_cell(&name)
            }
            Storage::Value | Storage::Typed(_) => fault(
                location,
                format!("${} captured by reference without a cell", var.name),
            ),
        }
    }

    /// Copy of a variable of this function, by slot
    fn var_copy(&mut self, id: VarId) -> String {
        let facts = self.facts;
        let var = facts.var(id);
        let ident = super::var_ident(&var.name);
        match var.storage {
            Storage::Typed(ty) => box_raw(&ident, ty),
            Storage::Value => rt::COPY.on(&ident, &[]),
            Storage::Ref => rt::VAR_COPY.on(&ident, &[]),
            Storage::Symbol(i) => rt::VAR_COPY.on(&Self::symbol_cell(i), &[]),
            Storage::Global => {
                let name = var.name.clone();
                let cell = self.global_cell(&name);
                rt::VAR_COPY.on(&cell, &[])
            }
        }
    }

    /// `function (..) use (..) { .. }` as a boxed closure value
    pub(crate) fn generate_closure(
        &mut self,
        expr: &Expr,
        decl: &FunctionDecl,
        captured: &[CapturedVar],
    ) -> String {
        let mut prelude = Vec::new();
        let mut bindings = Vec::new();
        for (i, capture) in captured.iter().enumerate() {
            let id = match self.facts.lookup(&capture.name) {
                Some(id) => id,
                None => fault(&expr.location, format!("capture ${} was never analyzed", capture.name)),
            };
            let value = if capture.by_ref {
                self.var_cell(id, &expr.location)
            } else {
                self.var_copy(id)
            };
            prelude.push(format!("let _c{} = {};", i, value));
            bindings.push(ArgBinding {
                name: capture.name.clone(),
                by_ref: capture.by_ref,
                source: format!("_c{}.clone()", i),
            });
        }
        if decl.info.has_receiver() {
            prelude.push(format!("let _this = {};", self.this_value()));
        }
        for (i, param) in decl.params.iter().enumerate() {
            let index = i.to_string();
            let source = if param.by_ref {
                rt::ARG_REF.apply(&["args", &index])
            } else {
                rt::ARG_VALUE.apply(&["args", &index])
            };
            bindings.push(ArgBinding {
                name: param.name.clone(),
                by_ref: param.by_ref,
                source,
            });
        }

        let facts = expr.closure_facts();
        let depth = self.depth + 1;
        let (lines, counters) = {
            let mut inner = ExprGenerator::new(
                facts,
                &decl.info,
                self.config,
                self.signatures,
                &mut *self.sink,
            );
            inner.depth = depth;
            let mut lines = Vec::new();
            if decl.info.has_receiver() {
                lines.push(format!("{}let q_this: &Value = &_this;", inner.indent(depth)));
            }
            lines.extend(inner.emit_body(decl, &bindings));
            (lines, inner.counters())
        };
        self.counters.add(counters);

        let closure = format!(
            "{}(move |env: &mut dyn Environment, args: &[Value]| -> Value {{\n{}\n{}}})",
            rt::CLOSURE.name,
            lines.join("\n"),
            self.indent(self.depth)
        );
        if prelude.is_empty() {
            closure
        } else {
            format!("{{ {} {} }}", prelude.join(" "), closure)
        }
    }
}

/// Emits whole functions into a [`Sink`]
pub struct FunctionGenerator<'a> {
    config: &'a CodegenConfig,
    signatures: &'a dyn SignatureLookup,
}

impl std::fmt::Debug for FunctionGenerator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionGenerator")
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}

impl<'a> FunctionGenerator<'a> {
    pub fn new(config: &'a CodegenConfig, signatures: &'a dyn SignatureLookup) -> Self {
        Self { config, signatures }
    }

    /// Emit `decl`, analyzed into `facts`, as one Rust function
    pub fn generate(
        &self,
        decl: &FunctionDecl,
        facts: &FunctionFacts,
        sink: &mut dyn Sink,
    ) -> GenCounters {
        let packed = decl.params.len() > rt::MAX_FIXED_ARITY;
        let mut params = vec!["env: &mut dyn Environment".to_string()];
        if decl.info.has_receiver() {
            params.push("q_this: &Value".to_string());
        }
        let mut bindings = Vec::with_capacity(decl.params.len());
        if packed {
            params.push("args: &[Value]".to_string());
        }
        for (i, param) in decl.params.iter().enumerate() {
            let source = if packed {
                let index = i.to_string();
                if param.by_ref {
                    rt::ARG_REF.apply(&["args", &index])
                } else {
                    rt::ARG_VALUE.apply(&["args", &index])
                }
            } else {
                let ident = param_ident(&param.name);
                let ty = if param.by_ref { "Var" } else { "Value" };
                params.push(format!("{}: {}", ident, ty));
                ident
            };
            bindings.push(ArgBinding {
                name: param.name.clone(),
                by_ref: param.by_ref,
                source,
            });
        }

        let mut body = ExprGenerator::new(facts, &decl.info, self.config, self.signatures, sink);
        let lines = body.emit_body(decl, &bindings);
        let counters = body.counters();

        let text = format!(
            "{}\npub fn {}({}) -> Value {{\n{}\n}}\n\n",
            FUNCTION_ATTRIBUTE,
            function_ident(&decl.name),
            params.join(", "),
            lines.join("\n")
        );
        sink.emit_fragment(&text);
        counters
    }
}
