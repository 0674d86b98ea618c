//! Node construction
//!
//! The front end builds trees through `ExprFactory` rather than raw
//! `ExprKind` values. Besides attaching locations, the factory recognises
//! the call forms that compile to dedicated nodes (`isset`, `each`, type
//! tests) and desugars compound assignment.

use super::expr::{ArrayEntry, Callee, CapturedVar, ClassName, Expr, ExprKind, Literal};
use super::function::FunctionDecl;
use super::ops::{BinaryOp, ExitKind, IncludeMode, TypePredicate, UnaryOp};
use crate::span::Location;

/// Builds expression nodes for one source file
#[derive(Debug, Clone, Default)]
pub struct ExprFactory {
    file: Option<String>,
}

impl ExprFactory {
    pub fn new(file: Option<&str>) -> Self {
        Self {
            file: file.map(str::to_string),
        }
    }

    /// Location in this factory's file
    pub fn location(&self, line: u32, column: u32) -> Location {
        Location::new(self.file.as_deref(), line, column)
    }

    // ========== Literals ==========

    pub fn create_null(&self, loc: Location) -> Expr {
        Expr::new(ExprKind::Literal(Literal::Null), loc)
    }

    pub fn create_bool(&self, loc: Location, value: bool) -> Expr {
        Expr::new(ExprKind::Literal(Literal::Bool(value)), loc)
    }

    pub fn create_long(&self, loc: Location, value: i64) -> Expr {
        Expr::new(ExprKind::Literal(Literal::Long(value)), loc)
    }

    pub fn create_double(&self, loc: Location, value: f64) -> Expr {
        Expr::new(ExprKind::Literal(Literal::Double(value)), loc)
    }

    pub fn create_string(&self, loc: Location, value: &str) -> Expr {
        Expr::new(ExprKind::Literal(Literal::String(value.to_string())), loc)
    }

    // ========== Variables and operators ==========

    /// `$name`; `$this` becomes a `ThisRef` node
    pub fn create_var(&self, loc: Location, name: &str) -> Expr {
        if name == "this" {
            return self.create_this(loc);
        }
        Expr::new(
            ExprKind::Variable {
                name: name.to_string(),
            },
            loc,
        )
    }

    pub fn create_this(&self, loc: Location) -> Expr {
        Expr::new(ExprKind::ThisRef, loc)
    }

    pub fn create_binary(&self, loc: Location, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            loc,
        )
    }

    pub fn create_unary(&self, loc: Location, op: UnaryOp, operand: Expr) -> Expr {
        Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            loc,
        )
    }

    // ========== Assignment ==========

    pub fn create_assign(&self, loc: Location, target: Expr, value: Expr) -> Expr {
        Expr::new(
            ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
                is_ref: false,
            },
            loc,
        )
    }

    pub fn create_assign_ref(&self, loc: Location, target: Expr, value: Expr) -> Expr {
        Expr::new(
            ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
                is_ref: true,
            },
            loc,
        )
    }

    /// `$a op= value` becomes `$a = $a op value`
    pub fn create_assign_op(&self, loc: Location, op: BinaryOp, target: Expr, value: Expr) -> Expr {
        let read = target.clone();
        let combined = self.create_binary(loc.clone(), op, read, value);
        self.create_assign(loc, target, combined)
    }

    pub fn create_list(&self, loc: Location, targets: Vec<Option<Expr>>, value: Expr) -> Expr {
        Expr::new(
            ExprKind::ListAssign {
                targets,
                value: Box::new(value),
            },
            loc,
        )
    }

    // ========== Calls ==========

    /// Function call. Builtins with dedicated nodes are recognised here.
    pub fn create_call(&self, loc: Location, name: &str, mut args: Vec<Expr>) -> Expr {
        if args.len() == 1 {
            let lower = name.to_ascii_lowercase();
            if lower == "each" {
                return self.create_each(loc, args.remove(0));
            }
            if lower == "isset" {
                let arg = args.remove(0);
                return match arg.kind {
                    ExprKind::ArrayAccess {
                        base,
                        index: Some(index),
                    } => Expr::new(ExprKind::ArrayIsSet { base, index }, loc),
                    kind => self.create_type_predicate(
                        loc,
                        TypePredicate::IsSet,
                        Expr::new(kind, arg.location),
                    ),
                };
            }
            if let Some(predicate) = TypePredicate::from_function_name(name) {
                return self.create_type_predicate(loc, predicate, args.remove(0));
            }
        }
        Expr::new(
            ExprKind::Call {
                callee: Callee::Named(name.to_string()),
                args,
            },
            loc,
        )
    }

    /// `$f(..)`
    pub fn create_dynamic_call(&self, loc: Location, callee: Expr, args: Vec<Expr>) -> Expr {
        Expr::new(
            ExprKind::Call {
                callee: Callee::Dynamic(Box::new(callee)),
                args,
            },
            loc,
        )
    }

    pub fn create_type_predicate(&self, loc: Location, predicate: TypePredicate, arg: Expr) -> Expr {
        Expr::new(
            ExprKind::TypePredicate {
                predicate,
                arg: Box::new(arg),
            },
            loc,
        )
    }

    pub fn create_each(&self, loc: Location, array: Expr) -> Expr {
        Expr::new(
            ExprKind::Each {
                array: Box::new(array),
            },
            loc,
        )
    }

    pub fn create_method_call(&self, loc: Location, receiver: Expr, name: &str, args: Vec<Expr>) -> Expr {
        Expr::new(
            ExprKind::MethodCall {
                receiver: Box::new(receiver),
                method_name: name.to_string(),
                args,
                is_static: false,
            },
            loc,
        )
    }

    /// `A::m(..)`
    pub fn create_static_method_call(&self, loc: Location, class: &str, name: &str, args: Vec<Expr>) -> Expr {
        let receiver = self.create_string(loc.clone(), class);
        self.create_dynamic_static_method_call(loc, receiver, name, args)
    }

    /// `$cls::m(..)`
    pub fn create_dynamic_static_method_call(
        &self,
        loc: Location,
        class: Expr,
        name: &str,
        args: Vec<Expr>,
    ) -> Expr {
        Expr::new(
            ExprKind::MethodCall {
                receiver: Box::new(class),
                method_name: name.to_string(),
                args,
                is_static: true,
            },
            loc,
        )
    }

    pub fn create_new(&self, loc: Location, class: &str, args: Vec<Expr>) -> Expr {
        Expr::new(
            ExprKind::NewObject {
                class_name: ClassName::Named(class.to_string()),
                args,
            },
            loc,
        )
    }

    pub fn create_dynamic_new(&self, loc: Location, class: Expr, args: Vec<Expr>) -> Expr {
        Expr::new(
            ExprKind::NewObject {
                class_name: ClassName::Dynamic(Box::new(class)),
                args,
            },
            loc,
        )
    }

    // ========== Arrays, fields, constants ==========

    pub fn create_array_get(&self, loc: Location, base: Expr, index: Expr) -> Expr {
        Expr::new(
            ExprKind::ArrayAccess {
                base: Box::new(base),
                index: Some(Box::new(index)),
            },
            loc,
        )
    }

    /// `$a[]`
    pub fn create_array_tail(&self, loc: Location, base: Expr) -> Expr {
        Expr::new(
            ExprKind::ArrayAccess {
                base: Box::new(base),
                index: None,
            },
            loc,
        )
    }

    pub fn create_array_literal(&self, loc: Location, entries: Vec<ArrayEntry>) -> Expr {
        Expr::new(ExprKind::ArrayLiteral { entries }, loc)
    }

    pub fn create_field_get(&self, loc: Location, base: Expr, name: &str) -> Expr {
        Expr::new(
            ExprKind::ObjectField {
                base: Box::new(base),
                name: name.to_string(),
            },
            loc,
        )
    }

    pub fn create_class_field(&self, loc: Location, class: &str, name: &str) -> Expr {
        Expr::new(
            ExprKind::ClassField {
                class_name: class.to_string(),
                name: name.to_string(),
            },
            loc,
        )
    }

    pub fn create_class_const(&self, loc: Location, class: &str, name: &str) -> Expr {
        Expr::new(
            ExprKind::ClassConst {
                class_name: class.to_string(),
                const_name: name.to_string(),
            },
            loc,
        )
    }

    /// Global constant; `true`, `false` and `null` fold to literals
    pub fn create_constant(&self, loc: Location, name: &str) -> Expr {
        match name.to_ascii_lowercase().as_str() {
            "true" => self.create_bool(loc, true),
            "false" => self.create_bool(loc, false),
            "null" => self.create_null(loc),
            _ => Expr::new(
                ExprKind::Constant {
                    name: name.to_string(),
                },
                loc,
            ),
        }
    }

    pub fn create_char_at(&self, loc: Location, base: Expr, index: Expr) -> Expr {
        Expr::new(
            ExprKind::CharAt {
                base: Box::new(base),
                index: Box::new(index),
            },
            loc,
        )
    }

    /// `unset(target)`; element targets become `ArrayUnset`
    pub fn create_unset(&self, loc: Location, target: Expr) -> Expr {
        match target.kind {
            ExprKind::ArrayAccess {
                base,
                index: Some(index),
            } => Expr::new(ExprKind::ArrayUnset { base, index }, loc),
            kind => Expr::new(
                ExprKind::Unset {
                    target: Box::new(Expr::new(kind, target.location)),
                },
                loc,
            ),
        }
    }

    // ========== Control-like expressions ==========

    pub fn create_closure(&self, loc: Location, decl: FunctionDecl, captured: Vec<CapturedVar>) -> Expr {
        Expr::new(
            ExprKind::Closure {
                decl: Box::new(decl),
                captured,
            },
            loc,
        )
    }

    pub fn create_conditional(&self, loc: Location, test: Expr, then_expr: Expr, else_expr: Expr) -> Expr {
        Expr::new(
            ExprKind::Conditional {
                test: Box::new(test),
                then_expr: Some(Box::new(then_expr)),
                else_expr: Box::new(else_expr),
            },
            loc,
        )
    }

    /// `test ?: else`
    pub fn create_short_conditional(&self, loc: Location, test: Expr, else_expr: Expr) -> Expr {
        Expr::new(
            ExprKind::Conditional {
                test: Box::new(test),
                then_expr: None,
                else_expr: Box::new(else_expr),
            },
            loc,
        )
    }

    pub fn create_increment(&self, loc: Location, target: Expr, delta: i64, is_post: bool) -> Expr {
        Expr::new(
            ExprKind::Increment {
                target: Box::new(target),
                delta,
                is_post,
            },
            loc,
        )
    }

    pub fn create_include(&self, loc: Location, path: Expr, mode: IncludeMode) -> Expr {
        Expr::new(
            ExprKind::Include {
                path: Box::new(path),
                mode,
            },
            loc,
        )
    }

    pub fn create_exit(&self, loc: Location, message: Option<Expr>) -> Expr {
        Expr::new(
            ExprKind::Exit {
                kind: ExitKind::Exit,
                message: message.map(Box::new),
            },
            loc,
        )
    }

    pub fn create_die(&self, loc: Location, message: Option<Expr>) -> Expr {
        Expr::new(
            ExprKind::Exit {
                kind: ExitKind::Die,
                message: message.map(Box::new),
            },
            loc,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f() -> ExprFactory {
        ExprFactory::new(Some("t.php"))
    }

    #[test]
    fn test_this_variable_becomes_this_ref() {
        let f = f();
        let e = f.create_var(f.location(1, 1), "this");
        assert_eq!(e.kind, ExprKind::ThisRef);
    }

    #[test]
    fn test_isset_on_element_becomes_array_isset() {
        let f = f();
        let loc = f.location(1, 1);
        let elem = f.create_array_get(loc.clone(), f.create_var(loc.clone(), "a"), f.create_long(loc.clone(), 1));
        let e = f.create_call(loc.clone(), "isset", vec![elem]);
        assert!(matches!(e.kind, ExprKind::ArrayIsSet { .. }));

        let e = f.create_call(loc.clone(), "isset", vec![f.create_var(loc, "x")]);
        assert!(matches!(
            e.kind,
            ExprKind::TypePredicate {
                predicate: TypePredicate::IsSet,
                ..
            }
        ));
    }

    #[test]
    fn test_type_tests_and_each() {
        let f = f();
        let loc = f.location(2, 5);
        let e = f.create_call(loc.clone(), "IS_INT", vec![f.create_var(loc.clone(), "x")]);
        assert!(matches!(
            e.kind,
            ExprKind::TypePredicate {
                predicate: TypePredicate::IsLong,
                ..
            }
        ));
        let e = f.create_call(loc.clone(), "each", vec![f.create_var(loc.clone(), "a")]);
        assert!(matches!(e.kind, ExprKind::Each { .. }));
        let e = f.create_call(loc.clone(), "strlen", vec![f.create_var(loc, "a")]);
        assert!(matches!(e.kind, ExprKind::Call { .. }));
    }

    #[test]
    fn test_compound_assignment_desugars() {
        let f = f();
        let loc = f.location(1, 1);
        let e = f.create_assign_op(
            loc.clone(),
            BinaryOp::Concat,
            f.create_var(loc.clone(), "s"),
            f.create_string(loc.clone(), "x"),
        );
        let expected = f.create_assign(
            loc.clone(),
            f.create_var(loc.clone(), "s"),
            f.create_binary(
                loc.clone(),
                BinaryOp::Concat,
                f.create_var(loc.clone(), "s"),
                f.create_string(loc, "x"),
            ),
        );
        assert_eq!(e, expected);
    }

    #[test]
    fn test_unset_routing() {
        let f = f();
        let loc = f.location(1, 1);
        let elem = f.create_array_get(loc.clone(), f.create_var(loc.clone(), "a"), f.create_long(loc.clone(), 0));
        assert!(matches!(f.create_unset(loc.clone(), elem).kind, ExprKind::ArrayUnset { .. }));
        let var = f.create_var(loc.clone(), "a");
        assert!(matches!(f.create_unset(loc, var).kind, ExprKind::Unset { .. }));
    }

    #[test]
    fn test_constant_folding_of_keywords() {
        let f = f();
        let loc = f.location(1, 1);
        assert_eq!(
            f.create_constant(loc.clone(), "TRUE").kind,
            ExprKind::Literal(Literal::Bool(true))
        );
        assert!(matches!(
            f.create_constant(loc, "PHP_EOL").kind,
            ExprKind::Constant { .. }
        ));
    }
}
