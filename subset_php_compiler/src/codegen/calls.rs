//! Calls, object construction and class references
//!
//! Every argument is bound to a `_a<i>` local before the call so that no
//! environment call is nested inside another one's argument list.

use super::expressions::block;
use super::ExprGenerator;
use crate::analyze::{resolve_class_scope, static_class_name, Signature};
use crate::ir::{Callee, ClassName, Expr, ExprKind, Literal};
use crate::runtime_api as rt;

impl ExprGenerator<'_> {
    // ========== Class references ==========

    /// `ClassRef` expression for a class named in source. `static` and
    /// unresolvable `self`/`parent` are bound from the environment in the
    /// prelude.
    pub(crate) fn class_ref(&mut self, name: &str, prelude: &mut Vec<String>) -> String {
        let declaring = self.info.declaring_class.clone();
        match name.to_ascii_lowercase().as_str() {
            "self" => match declaring {
                Some(class) => self.class_constant(&class),
                None => self.bind_class(rt::CALLED_CLASS.apply(&[]), prelude),
            },
            "static" => self.bind_class(rt::CALLED_CLASS.apply(&[]), prelude),
            "parent" => {
                let child = match declaring {
                    Some(class) => self.class_constant(&class),
                    None => self.bind_class(rt::CALLED_CLASS.apply(&[]), prelude),
                };
                self.bind_class(rt::PARENT_CLASS.apply(&[&child]), prelude)
            }
            _ => self.class_constant(name),
        }
    }

    /// Class given by a runtime value, as in `new $cls` or `$cls::m()`
    fn dynamic_class_ref(&mut self, class: &Expr, prelude: &mut Vec<String>) -> String {
        let value = self.generate(class);
        prelude.push(format!("let _n = {};", value));
        self.bind_class(rt::RESOLVE_CLASS.apply(&["&_n"]), prelude)
    }

    fn bind_class(&mut self, source: String, prelude: &mut Vec<String>) -> String {
        let name = format!("_cls{}", prelude.len());
        prelude.push(format!("let {} = {};", name, source));
        name
    }

    /// `Var` cell of `Class::$name`
    pub(crate) fn static_field_cell(
        &mut self,
        class_name: &str,
        name: &str,
        prelude: &mut Vec<String>,
    ) -> String {
        let class = self.class_ref(class_name, prelude);
        let name = self.str_constant(name);
        rt::GET_STATIC_FIELD.apply(&[&class, &name])
    }

    // ========== Arguments ==========

    /// Bind each argument to `_a<i>`. By-reference parameters, and every
    /// parameter of a callee without a signature, receive the argument's
    /// cell when it has one.
    fn call_arguments(
        &mut self,
        args: &[Expr],
        signature: Option<&Signature>,
        prelude: &mut Vec<String>,
    ) -> Vec<String> {
        let mut names = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let by_ref = signature.map_or(true, |s| s.is_by_ref(i));
            let value = if by_ref && arg.is_ref() {
                format!("Value::Ref({})", self.generate_ref(arg))
            } else {
                self.generate_copy(arg)
            };
            let name = format!("_a{}", i);
            prelude.push(format!("let {} = {};", name, value));
            names.push(name);
        }
        names
    }

    // ========== Calls ==========

    /// `f(..)` or `$f(..)`
    pub(crate) fn generate_call(&mut self, callee: &Callee, args: &[Expr]) -> String {
        let mut prelude = Vec::new();
        match callee {
            Callee::Named(name) => {
                let signature = self.signatures.function_signature(name);
                let args = self.call_arguments(args, signature.as_ref(), &mut prelude);
                let name = self.str_constant(name);
                block(prelude, rt::CALL.emit("", &[&name], &args))
            }
            Callee::Dynamic(callee) => {
                let callee = self.generate(callee);
                prelude.push(format!("let _f = {};", callee));
                let args = self.call_arguments(args, None, &mut prelude);
                block(prelude, rt::CALL_VALUE.emit("", &["&_f"], &args))
            }
        }
    }

    /// `$o->m(..)`
    pub(crate) fn generate_method_call(
        &mut self,
        receiver: &Expr,
        method_name: &str,
        args: &[Expr],
    ) -> String {
        let receiver = self.generate(receiver);
        let mut prelude = vec![format!("let _o = {};", receiver)];
        let signature = self.signatures.method_signature(None, method_name);
        let args = self.call_arguments(args, signature.as_ref(), &mut prelude);
        let name = self.str_constant(method_name);
        block(prelude, rt::CALL_METHOD.emit("_o", &["env", &name], &args))
    }

    /// `A::m(..)` or `$cls::m(..)`
    pub(crate) fn generate_static_method_call(
        &mut self,
        receiver: &Expr,
        method_name: &str,
        args: &[Expr],
    ) -> String {
        let mut prelude = Vec::new();
        let class = match &receiver.kind {
            ExprKind::Literal(Literal::String(name)) => self.class_ref(name, &mut prelude),
            _ => self.dynamic_class_ref(receiver, &mut prelude),
        };
        let scope = static_class_name(receiver, self.info);
        let signature = self.signatures.method_signature(scope.as_deref(), method_name);
        let args = self.call_arguments(args, signature.as_ref(), &mut prelude);
        let name = self.str_constant(method_name);
        block(prelude, rt::CALL_STATIC_METHOD.emit("", &[&class, &name], &args))
    }

    /// `new A(..)` or `new $cls(..)`
    pub(crate) fn generate_new(&mut self, class_name: &ClassName, args: &[Expr]) -> String {
        let mut prelude = Vec::new();
        let (class, signature) = match class_name {
            ClassName::Named(name) => {
                let class = self.class_ref(name, &mut prelude);
                let scope = resolve_class_scope(name, self.info);
                let signature = self.signatures.method_signature(Some(&scope), "__construct");
                (class, signature)
            }
            ClassName::Dynamic(class) => (self.dynamic_class_ref(class, &mut prelude), None),
        };
        let args = self.call_arguments(args, signature.as_ref(), &mut prelude);
        block(prelude, rt::NEW_OBJECT.emit("", &[&class], &args))
    }
}
