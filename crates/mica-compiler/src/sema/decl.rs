//! Classes, globals and method declarations.

use mica_core::{DiagnosticKind, Type};
use mica_parser::ast::{ClassDecl, ClassMember, MethodDecl, ReturnType, VarDecl};
use tracing::trace;

use super::{Analyzer, ClassScope, ReturnChecker};
use crate::symbols::SymbolTable;

impl Analyzer {
    /// True for the declaration a class name was registered with; a
    /// duplicate declaration of the same name is not.
    fn is_registered(&self, class: &ClassDecl<'_>) -> bool {
        self.globals
            .class(class.name.name)
            .is_some_and(|symbol| symbol.span == class.name.span)
    }

    /// Record the fields and method signatures of a class before any
    /// method body is checked.
    ///
    /// Nothing is reported here: the same declarations are checked again,
    /// with diagnostics, when the class body is analyzed.
    pub(super) fn declare_members(&mut self, class: &ClassDecl<'_>) {
        if !self.is_registered(class) {
            return;
        }
        let mut members = SymbolTable::new();
        for member in class.members {
            match member {
                ClassMember::Field(field) => {
                    let ty = self.declared_type(&field.ty);
                    for name in field.names {
                        let _ = members.insert_variable(name.name, ty.clone(), name.span);
                    }
                }
                ClassMember::Method(method) => {
                    let name = method.name;
                    let return_type = match &method.return_type {
                        ReturnType::Void(_) => Type::Void,
                        ReturnType::Type(ty) => self.declared_type(ty),
                    };
                    let owner = Some(class.name.name);
                    let inserted = members.insert_method(name.name, return_type, owner, name.span);
                    if inserted.is_err() {
                        continue;
                    }
                    members.open_scope();
                    for param in method.params {
                        let ty = self.declared_type(&param.ty);
                        let param = param.name;
                        let _ = members.insert_param(Some(name.name), param.name, ty, param.span);
                    }
                    members.close_scope();
                }
            }
        }
        trace!(
            class = class.name.name,
            members = members.len(),
            "declared members"
        );
        self.globals.restore_members(class.name.name, members);
    }

    pub(super) fn check_class(&mut self, class: &ClassDecl<'_>) {
        let name = class.name.name;
        // A duplicate declaration is still checked, and its table dropped.
        let registered = self.is_registered(class);
        trace!(class = name, registered, "analyzing class");

        self.class = Some(ClassScope {
            name: name.to_string(),
            members: SymbolTable::new(),
            registered,
        });
        for member in class.members {
            match member {
                ClassMember::Field(field) => self.check_var_decl(field),
                ClassMember::Method(method) => self.check_method(method, Some(name)),
            }
        }

        if let Some(scope) = self.class.take()
            && scope.registered
        {
            self.globals.restore_members(&scope.name, scope.members);
        }
    }

    pub(super) fn check_global(&mut self, var: &VarDecl<'_>) {
        self.check_var_decl(var);
    }

    /// Globals and fields share one rule: declare each name in the current table.
    fn check_var_decl(&mut self, var: &VarDecl<'_>) {
        let ty = self.resolve_type(&var.ty);
        for name in var.names {
            if let Err(err) = self
                .scope_mut()
                .insert_variable(name.name, ty.clone(), name.span)
            {
                self.duplicate(err, name.span);
            }
        }
    }

    pub(super) fn check_method(&mut self, method: &MethodDecl<'_>, owner: Option<&str>) {
        let name = method.name;
        trace!(method = name.name, owner, "analyzing method");

        let return_type = match &method.return_type {
            ReturnType::Void(_) => Type::Void,
            ReturnType::Type(ty) => self.resolve_type(ty),
        };

        let inserted = self
            .scope_mut()
            .insert_method(name.name, return_type.clone(), owner, name.span);
        let signature_owner = match inserted {
            Ok(()) => Some(name.name),
            Err(err) => {
                self.duplicate(err, name.span);
                None
            }
        };

        self.scope_mut().open_scope();
        for param in method.params {
            let ty = self.resolve_type(&param.ty);
            let declared = self
                .scope_mut()
                .insert_param(signature_owner, param.name.name, ty, param.name.span);
            if let Err(err) = declared {
                self.duplicate(err, param.name.span);
            }
        }

        self.return_type = return_type;
        for stmt in method.body.stmts {
            self.check_stmt(stmt);
        }
        if self.return_type != Type::Void && !ReturnChecker::all_paths_return(&method.body) {
            self.report(
                DiagnosticKind::MissingReturn,
                name.span,
                format!(
                    "method '{}' does not return a value on every path",
                    name.name
                ),
            );
        }
        self.return_type = Type::Void;
        self.scope_mut().close_scope();
    }
}
