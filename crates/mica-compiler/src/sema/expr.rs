//! Expression typing.

use mica_core::types::{
    arithmetic_result, is_assignable, is_castable, is_equality, is_logical, is_relational,
    negation_result,
};
use mica_core::{DiagnosticKind, Span, Type};
use mica_parser::ast::*;

use super::{Analyzer, Binding};
use crate::symbols::{OUTERMOST, Symbol};

/// Type of a literal value.
pub(crate) fn literal_type(literal: &Literal<'_>) -> Type {
    match literal {
        Literal::Int(_) => Type::Int,
        Literal::Double(_) => Type::Double,
        Literal::Char(_) => Type::Char,
        Literal::Bool(_) => Type::Bool,
        Literal::String(_) => Type::String,
        Literal::Null => Type::Null,
    }
}

/// The parts of a method signature a call site needs.
struct Callee {
    name: String,
    binding: Binding,
    return_type: Type,
    params: Vec<Type>,
}

impl Analyzer {
    /// Type an expression and record the result against its id.
    pub(super) fn check_expr(&mut self, expr: &Expr<'_>) -> Type {
        let ty = self.infer(expr);
        self.decorations.insert(expr.id, ty.clone());
        ty
    }

    fn infer(&mut self, expr: &Expr<'_>) -> Type {
        match expr.kind {
            ExprKind::Literal(literal) => literal_type(&literal),
            ExprKind::Name(ident) => self.name_type(expr.id, ident),
            ExprKind::Field(field) => self.field_type(field),
            ExprKind::Index(index) => self.index_type(index),
            ExprKind::Call(call) => self.call_type(expr.id, call),
            ExprKind::Unary(unary) => self.unary_type(unary, expr.span),
            ExprKind::Binary(binary) => self.binary_type(binary, expr.span),
            ExprKind::Cast(cast) => self.cast_type(cast, expr.span),
            ExprKind::NewObject(class) => self.new_object_type(class),
            ExprKind::NewArray(new_array) => self.new_array_type(new_array),
        }
    }

    /// Resolve a written type, reporting unknown class names.
    pub(super) fn resolve_type(&mut self, ty: &TypeExpr<'_>) -> Type {
        if let Some(class) = ty.class_name()
            && self.globals.class(class.name).is_none()
        {
            self.report(
                DiagnosticKind::UndeclaredIdentifier,
                class.span,
                format!("type '{}' is not declared", class.name),
            );
            return Type::Unknown;
        }
        ty.to_type()
    }

    /// [`Self::resolve_type`] without the diagnostic.
    pub(super) fn declared_type(&self, ty: &TypeExpr<'_>) -> Type {
        match ty.class_name() {
            Some(class) if self.globals.class(class.name).is_none() => Type::Unknown,
            _ => ty.to_type(),
        }
    }

    // =========================================
    // Designators
    // =========================================

    fn name_type(&mut self, id: ExprId, ident: Ident<'_>) -> Type {
        let found = self
            .lookup(ident.name)
            .map(|(symbol, binding)| (symbol.value_type().cloned(), symbol.kind_name(), binding));
        match found {
            Some((Some(ty), _, binding)) => {
                self.decorations.bind(id, binding);
                ty
            }
            Some((None, kind, _)) => {
                self.mismatch(
                    ident.span,
                    format!("'{}' is a {kind}, not a variable", ident.name),
                );
                Type::Unknown
            }
            None => {
                self.report(
                    DiagnosticKind::UndeclaredIdentifier,
                    ident.span,
                    format!("'{}' is not declared", ident.name),
                );
                Type::Unknown
            }
        }
    }

    fn field_type(&mut self, field: &FieldExpr<'_>) -> Type {
        let object = self.check_expr(field.object);
        let name = field.field;
        let class = match object {
            Type::Class(class) => class,
            Type::Unknown => return Type::Unknown,
            other => {
                self.mismatch(
                    name.span,
                    format!(
                        "cannot access field '{}' of non-class type {other}",
                        name.name
                    ),
                );
                return Type::Unknown;
            }
        };

        let member = self.class_members(&class).map(|members| {
            members
                .lookup_level(name.name, OUTERMOST)
                .map(|symbol| (symbol.value_type().cloned(), symbol.kind_name()))
        });
        match member {
            None => Type::Unknown,
            Some(Some((Some(ty), _))) => ty,
            Some(Some((None, kind))) => {
                self.mismatch(
                    name.span,
                    format!("'{class}.{}' is a {kind}, not a field", name.name),
                );
                Type::Unknown
            }
            Some(None) => {
                self.report(
                    DiagnosticKind::UndeclaredIdentifier,
                    name.span,
                    format!("class '{class}' has no field '{}'", name.name),
                );
                Type::Unknown
            }
        }
    }

    fn index_type(&mut self, index: &IndexExpr<'_>) -> Type {
        let array = self.check_expr(index.array);
        let position = self.check_expr(index.index);
        if !matches!(position, Type::Int | Type::Unknown) {
            self.mismatch(
                index.index.span,
                format!("array index must be int, found {position}"),
            );
        }
        match array {
            Type::Array(element) => *element,
            Type::Unknown => Type::Unknown,
            other => {
                self.mismatch(
                    index.array.span,
                    format!("cannot index non-array type {other}"),
                );
                Type::Unknown
            }
        }
    }

    // =========================================
    // Calls
    // =========================================

    fn call_type(&mut self, id: ExprId, call: &CallExpr<'_>) -> Type {
        let callee = self.resolve_callee(call);
        if let Some(callee) = &callee {
            self.decorations.bind(id, callee.binding.clone());
        }
        let args: Vec<(Type, Span)> = call
            .args
            .iter()
            .map(|arg| (self.check_expr(arg), arg.span))
            .collect();

        let Some(callee) = callee else {
            return Type::Unknown;
        };

        if args.len() != callee.params.len() {
            self.report(
                DiagnosticKind::ArityMismatch,
                call.name.span,
                format!(
                    "'{}' expects {} argument(s), found {}",
                    callee.name,
                    callee.params.len(),
                    args.len()
                ),
            );
            return callee.return_type;
        }

        for (position, (param, (arg, span))) in callee.params.iter().zip(&args).enumerate() {
            if !is_assignable(param, arg) {
                self.mismatch(
                    *span,
                    format!(
                        "argument {} of '{}' expects {param}, found {arg}",
                        position + 1,
                        callee.name
                    ),
                );
            }
        }
        callee.return_type
    }

    fn resolve_callee(&mut self, call: &CallExpr<'_>) -> Option<Callee> {
        let name = call.name;
        let Some(receiver) = call.receiver else {
            let found = self.lookup(name.name).map(|(symbol, _)| match symbol {
                Symbol::Method(method) => Ok(Callee {
                    name: method.name.clone(),
                    binding: match method.builtin {
                        Some(builtin) => Binding::Builtin(builtin),
                        None => Binding::Method {
                            owner: method.owner.clone(),
                        },
                    },
                    return_type: method.return_type.clone(),
                    params: method.param_types().cloned().collect(),
                }),
                other => Err(other.kind_name()),
            });
            return match found {
                Some(Ok(callee)) => Some(callee),
                Some(Err(kind)) => {
                    self.mismatch(
                        name.span,
                        format!("'{}' is a {kind}, not a method", name.name),
                    );
                    None
                }
                None => {
                    self.report(
                        DiagnosticKind::UndeclaredIdentifier,
                        name.span,
                        format!("method '{}' is not declared", name.name),
                    );
                    None
                }
            };
        };

        let class = match self.check_expr(receiver) {
            Type::Class(class) => class,
            Type::Unknown => return None,
            other => {
                self.mismatch(
                    name.span,
                    format!(
                        "cannot call method '{}' on non-class type {other}",
                        name.name
                    ),
                );
                return None;
            }
        };

        let found = self.class_members(&class).map(|members| {
            members
                .lookup_level(name.name, OUTERMOST)
                .map(|symbol| match symbol {
                    Symbol::Method(method) => Ok(Callee {
                        name: format!("{class}.{}", method.name),
                        binding: Binding::Method {
                            owner: Some(class.clone()),
                        },
                        return_type: method.return_type.clone(),
                        params: method.param_types().cloned().collect(),
                    }),
                    other => Err(other.kind_name()),
                })
        });
        match found {
            None => None,
            Some(Some(Ok(callee))) => Some(callee),
            Some(Some(Err(kind))) => {
                self.mismatch(
                    name.span,
                    format!("'{class}.{}' is a {kind}, not a method", name.name),
                );
                None
            }
            Some(None) => {
                self.report(
                    DiagnosticKind::UndeclaredIdentifier,
                    name.span,
                    format!("class '{class}' has no method '{}'", name.name),
                );
                None
            }
        }
    }

    // =========================================
    // Operators
    // =========================================

    fn unary_type(&mut self, unary: &UnaryExpr<'_>, span: Span) -> Type {
        let operand = self.check_expr(unary.operand);
        let result = match unary.op {
            UnaryOp::Neg => negation_result(&operand),
            UnaryOp::Not => is_logical(&operand).then_some(Type::Bool),
        };
        result.unwrap_or_else(|| {
            self.mismatch(
                span,
                format!("operator {} cannot be applied to {operand}", unary.op),
            );
            Type::Unknown
        })
    }

    fn binary_type(&mut self, binary: &BinaryExpr<'_>, span: Span) -> Type {
        let lhs = self.check_expr(binary.lhs);
        let rhs = self.check_expr(binary.rhs);
        let result = match binary.op.class() {
            OperatorClass::Arithmetic => arithmetic_result(&lhs, &rhs),
            OperatorClass::Relational => is_relational(&lhs, &rhs).then_some(Type::Bool),
            OperatorClass::Equality => is_equality(&lhs, &rhs).then_some(Type::Bool),
            OperatorClass::Logical => {
                (is_logical(&lhs) && is_logical(&rhs)).then_some(Type::Bool)
            }
        };
        result.unwrap_or_else(|| {
            self.mismatch(
                span,
                format!(
                    "operator {} cannot be applied to {lhs} and {rhs}",
                    binary.op
                ),
            );
            Type::Unknown
        })
    }

    fn cast_type(&mut self, cast: &CastExpr<'_>, span: Span) -> Type {
        let target = self.resolve_type(&cast.target);
        let operand = self.check_expr(cast.operand);
        if is_castable(&target, &operand) {
            target
        } else {
            self.report(
                DiagnosticKind::InvalidCast,
                span,
                format!("cannot cast {operand} to {target}"),
            );
            Type::Unknown
        }
    }

    // =========================================
    // Allocation
    // =========================================

    fn new_object_type(&mut self, class: Ident<'_>) -> Type {
        if self.globals.class(class.name).is_some() {
            Type::class(class.name)
        } else {
            self.report(
                DiagnosticKind::UndeclaredIdentifier,
                class.span,
                format!("type '{}' is not declared", class.name),
            );
            Type::Unknown
        }
    }

    fn new_array_type(&mut self, new_array: &NewArrayExpr<'_>) -> Type {
        let element = self.resolve_type(&new_array.element);
        let length = self.check_expr(new_array.length);
        if !matches!(length, Type::Int | Type::Unknown) {
            self.mismatch(
                new_array.length.span,
                format!("array length must be int, found {length}"),
            );
        }
        if element.is_unknown() {
            Type::Unknown
        } else {
            Type::array_of(element)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{analyze_source, kinds};
    use mica_core::DiagnosticKind::*;

    fn body(stmts: &str) -> String {
        format!("class P {{ int x; int get() {{ return x; }} }}\nvoid main() {{ {stmts} }}")
    }

    #[test]
    fn undeclared_name() {
        assert_eq!(kinds(&body("y = 1;")), vec![UndeclaredIdentifier]);
    }

    #[test]
    fn unknown_suppresses_cascades() {
        // `y` is undeclared; neither the `+` nor the assignment reports again.
        assert_eq!(
            kinds(&body("int z; z = y + 1 * 2;")),
            vec![UndeclaredIdentifier]
        );
    }

    #[test]
    fn arithmetic_needs_numbers() {
        assert_eq!(kinds(&body("int a; a = 1 + true;")), vec![TypeMismatch]);
        assert_eq!(kinds(&body("double d; d = 1 + 2.5;")), vec![]);
    }

    #[test]
    fn int_widens_but_double_does_not_narrow() {
        assert!(kinds(&body("double d; d = 3;")).is_empty());
        assert_eq!(kinds(&body("int i; i = 3.0;")), vec![TypeMismatch]);
        assert!(kinds(&body("int i; i = (int) 3.7;")).is_empty());
    }

    #[test]
    fn invalid_cast() {
        assert_eq!(
            kinds(&body("int i; i = (int) \"text\";")),
            vec![InvalidCast]
        );
        assert_eq!(kinds(&body("P p; p = (P) 3;")), vec![InvalidCast]);
    }

    #[test]
    fn field_and_method_access() {
        assert!(kinds(&body("P p; p = new P(); p.x = p.get();")).is_empty());
        assert_eq!(
            kinds(&body("P p; p = new P(); p.z = 1;")),
            vec![UndeclaredIdentifier]
        );
        assert_eq!(
            kinds(&body("P p; p = new P(); p.nope();")),
            vec![UndeclaredIdentifier]
        );
        assert_eq!(kinds(&body("int i; i = 1; i.x = 2;")), vec![TypeMismatch]);
        assert_eq!(
            kinds(&body("P p; p = new P(); p.get = 2;")),
            vec![TypeMismatch]
        );
    }

    #[test]
    fn arity_and_argument_types() {
        let source = "int add(int a, int b) { return a + b; }\n\
                      void main() { int r; r = add(1); r = add(1, 'c'); r = add(1, 2); }";
        assert_eq!(kinds(source), vec![ArityMismatch, TypeMismatch]);
    }

    #[test]
    fn double_parameter_accepts_int_argument() {
        let source = "double half(double d) { return d / 2; }\nvoid main() { write(half(3)); }";
        assert!(kinds(source).is_empty());
    }

    #[test]
    fn builtins() {
        let source = "void main() { int[] a; char c; a = new int[3]; write(len(a));\
                      c = chr(ord('a') + 1); write(len(c)); }";
        assert_eq!(kinds(source), vec![TypeMismatch]);
    }

    #[test]
    fn calling_a_variable_is_a_mismatch() {
        assert_eq!(kinds(&body("int f; f();")), vec![TypeMismatch]);
    }

    #[test]
    fn method_used_as_value() {
        let source = "int f() { return 1; }\nvoid main() { int x; x = f; }";
        assert_eq!(kinds(source), vec![TypeMismatch]);
    }

    #[test]
    fn arrays() {
        assert!(kinds(&body("int[] a; a = new int[4]; a[0] = a[1] + 2;")).is_empty());
        assert_eq!(
            kinds(&body("int[] a; a = new int[4]; a[true] = 1;")),
            vec![TypeMismatch]
        );
        assert_eq!(kinds(&body("int a; a[0] = 1;")), vec![TypeMismatch]);
        assert_eq!(
            kinds(&body("int[] a; a = new int['x'];")),
            vec![TypeMismatch]
        );
        assert_eq!(
            kinds(&body("int[] a; a = new double[2];")),
            vec![TypeMismatch]
        );
    }

    #[test]
    fn comparisons_and_logic() {
        assert!(kinds(&body("bool b; b = 1 < 2.5 && 'a' < 'b' || !(1 == 1);")).is_empty());
        assert_eq!(kinds(&body("bool b; b = 1 && true;")), vec![TypeMismatch]);
        assert_eq!(kinds(&body("bool b; b = 'a' < 1;")), vec![TypeMismatch]);
        assert!(kinds(&body("P p; bool b; b = p == null;")).is_empty());
    }

    #[test]
    fn unknown_class_in_new() {
        let analysis = analyze_source(&body("P p; p = new Q();"));
        let diagnostic = analysis.diagnostics.iter().next().unwrap();
        assert_eq!(diagnostic.kind, UndeclaredIdentifier);
        assert!(diagnostic.message.contains("'Q'"));
        assert_eq!(analysis.diagnostics.len(), 1);
    }
}
