//! Level-scoped symbol storage.

use mica_core::{Span, Type};
use thiserror::Error;

use super::symbol::*;

/// The outermost level: globals, or members when the table belongs to a class.
pub const OUTERMOST: i32 = -1;

/// Rejected insertion of a name already declared at the current level.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("'{name}' is already declared {}", previous.location())]
pub struct AlreadyDeclared {
    pub name: String,
    pub previous: Span,
}

/// Symbols organised by nesting level.
///
/// Entries are kept in insertion order and lookups scan from the newest
/// entry backwards, so the innermost declaration of a name always wins.
/// Closing a scope drops every symbol at that level, except at the
/// outermost level which persists for the life of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    level: i32,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// An empty table at the outermost level.
    pub fn new() -> Self {
        Self {
            symbols: Vec::new(),
            level: OUTERMOST,
        }
    }

    /// A global table with `len`, `ord` and `chr` already declared.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        for builtin in Builtin::ALL {
            let param = ParameterSymbol {
                var: VariableSymbol {
                    name: "value".into(),
                    is_array: builtin.param_type().is_array(),
                    ty: builtin.param_type(),
                    level: 0,
                    span: Span::default(),
                },
                ordinal: 0,
            };
            table.symbols.push(Symbol::Method(MethodSymbol {
                name: builtin.name().into(),
                return_type: builtin.return_type(),
                params: vec![param],
                level: OUTERMOST,
                span: Span::default(),
                owner: None,
                builtin: Some(builtin),
            }));
        }
        table
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    // =========================================
    // Scopes
    // =========================================

    pub fn open_scope(&mut self) {
        self.level += 1;
    }

    /// Drop the symbols of the current level and step out of it.
    ///
    /// Does nothing at the outermost level.
    pub fn close_scope(&mut self) {
        if self.level == OUTERMOST {
            return;
        }
        let level = self.level;
        self.symbols.retain(|s| s.level() != level);
        self.level -= 1;
    }

    // =========================================
    // Insertion
    // =========================================

    fn check_fresh(&self, name: &str) -> Result<(), AlreadyDeclared> {
        match self.lookup_current_level(name) {
            Some(existing) => Err(AlreadyDeclared {
                name: name.to_string(),
                previous: existing.span(),
            }),
            None => Ok(()),
        }
    }

    pub fn insert_variable(
        &mut self,
        name: &str,
        ty: Type,
        span: Span,
    ) -> Result<(), AlreadyDeclared> {
        self.check_fresh(name)?;
        self.symbols.push(Symbol::Variable(VariableSymbol {
            name: name.to_string(),
            is_array: ty.is_array(),
            ty,
            level: self.level,
            span,
        }));
        Ok(())
    }

    /// Declare a parameter at the current level.
    ///
    /// When `method` names a visible method, the parameter is also appended
    /// to that method's signature. Returns the parameter's ordinal.
    pub fn insert_param(
        &mut self,
        method: Option<&str>,
        name: &str,
        ty: Type,
        span: Span,
    ) -> Result<usize, AlreadyDeclared> {
        self.check_fresh(name)?;
        let level = self.level;
        let ordinal = self
            .symbols
            .iter()
            .filter(|s| matches!(s, Symbol::Parameter(p) if p.var.level == level))
            .count();
        let param = ParameterSymbol {
            var: VariableSymbol {
                name: name.to_string(),
                is_array: ty.is_array(),
                ty,
                level,
                span,
            },
            ordinal,
        };
        if let Some(method) = method.and_then(|m| self.method_mut(m)) {
            method.params.push(param.clone());
        }
        self.symbols.push(Symbol::Parameter(param));
        Ok(ordinal)
    }

    /// Declare a method with an empty parameter list.
    pub fn insert_method(
        &mut self,
        name: &str,
        return_type: Type,
        owner: Option<&str>,
        span: Span,
    ) -> Result<(), AlreadyDeclared> {
        self.check_fresh(name)?;
        self.symbols.push(Symbol::Method(MethodSymbol {
            name: name.to_string(),
            return_type,
            params: Vec::new(),
            level: self.level,
            span,
            owner: owner.map(str::to_string),
            builtin: None,
        }));
        Ok(())
    }

    /// Declare a class with an empty member table.
    pub fn insert_class(&mut self, name: &str, span: Span) -> Result<(), AlreadyDeclared> {
        self.check_fresh(name)?;
        self.symbols.push(Symbol::Class(ClassSymbol {
            name: name.to_string(),
            members: SymbolTable::new(),
            level: self.level,
            span,
        }));
        Ok(())
    }

    // =========================================
    // Lookup
    // =========================================

    /// The innermost visible symbol with this name.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().rev().find(|s| s.name() == name)
    }

    /// A symbol declared at exactly the current level.
    pub fn lookup_current_level(&self, name: &str) -> Option<&Symbol> {
        self.lookup_level(name, self.level)
    }

    pub fn lookup_level(&self, name: &str, level: i32) -> Option<&Symbol> {
        // Levels never decrease towards the end of the vector, so the scan
        // can stop at the first symbol below the wanted level.
        self.symbols
            .iter()
            .rev()
            .take_while(|s| s.level() >= level)
            .find(|s| s.level() == level && s.name() == name)
    }

    /// Symbols at the outermost level, in declaration order.
    pub fn outermost(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| s.level() == OUTERMOST)
    }

    pub fn class(&self, name: &str) -> Option<&ClassSymbol> {
        self.lookup_level(name, OUTERMOST)
            .and_then(Symbol::as_class)
    }

    pub fn method(&self, name: &str) -> Option<&MethodSymbol> {
        self.lookup_level(name, OUTERMOST)
            .and_then(Symbol::as_method)
    }

    /// Global variables in declaration order.
    pub fn globals(&self) -> impl Iterator<Item = &VariableSymbol> {
        self.outermost().filter_map(Symbol::as_variable)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassSymbol> {
        self.outermost().filter_map(Symbol::as_class)
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodSymbol> {
        self.outermost().filter_map(Symbol::as_method)
    }

    fn method_mut(&mut self, name: &str) -> Option<&mut MethodSymbol> {
        self.symbols.iter_mut().rev().find_map(|s| match s {
            Symbol::Method(m) if m.name == name => Some(m),
            _ => None,
        })
    }

    fn class_mut(&mut self, name: &str) -> Option<&mut ClassSymbol> {
        self.symbols.iter_mut().rev().find_map(|s| match s {
            Symbol::Class(c) if c.name == name && c.level == OUTERMOST => Some(c),
            _ => None,
        })
    }

    /// Install a member table built while this table was also borrowed.
    pub fn restore_members(&mut self, class: &str, members: SymbolTable) {
        if let Some(c) = self.class_mut(class) {
            c.members = members;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(col: u32) -> Span {
        Span::new(1, col, 1)
    }

    #[test]
    fn duplicate_at_same_level_is_rejected() {
        let mut table = SymbolTable::new();
        table.insert_variable("x", Type::Int, span(1)).unwrap();
        let err = table
            .insert_variable("x", Type::Double, span(5))
            .unwrap_err();
        assert_eq!(err.previous, span(1));
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.lookup("x").and_then(Symbol::value_type),
            Some(&Type::Int)
        );
    }

    #[test]
    fn inner_scope_shadows_and_restores() {
        let mut table = SymbolTable::new();
        table.insert_variable("x", Type::Int, span(1)).unwrap();
        table.open_scope();
        table.insert_variable("x", Type::Char, span(2)).unwrap();
        assert_eq!(
            table.lookup("x").and_then(Symbol::value_type),
            Some(&Type::Char)
        );
        table.close_scope();
        assert_eq!(
            table.lookup("x").and_then(Symbol::value_type),
            Some(&Type::Int)
        );
    }

    #[test]
    fn close_at_outermost_keeps_globals() {
        let mut table = SymbolTable::new();
        table.insert_variable("g", Type::Bool, span(1)).unwrap();
        table.close_scope();
        assert_eq!(table.level(), OUTERMOST);
        assert!(table.lookup("g").is_some());
    }

    #[test]
    fn open_close_cycles_leave_lookups_unchanged() {
        let mut table = SymbolTable::with_builtins();
        table.insert_variable("g", Type::Int, span(1)).unwrap();
        table.insert_class("Point", span(2)).unwrap();
        table.open_scope();
        table.insert_variable("x", Type::Double, span(3)).unwrap();
        table.insert_variable("g", Type::Char, span(4)).unwrap();

        let names = ["g", "x", "Point", "len", "tmp"];
        let snapshot = |table: &SymbolTable| {
            names.map(|name| {
                let visible = table.lookup(name).cloned();
                (visible, table.lookup_current_level(name).cloned())
            })
        };
        let before = snapshot(&table);
        for round in 0..10 {
            table.open_scope();
            if round % 2 == 0 {
                table
                    .insert_variable("x", Type::Bool, span(10 + round))
                    .unwrap();
                table
                    .insert_variable("tmp", Type::Int, span(20 + round))
                    .unwrap();
            }
            table.close_scope();
        }
        assert_eq!(table.level(), 0);
        assert_eq!(snapshot(&table), before);

        table.close_scope();
        let outermost = snapshot(&table);
        for _ in 0..3 {
            table.close_scope();
        }
        assert_eq!(table.level(), OUTERMOST);
        assert_eq!(snapshot(&table), outermost);
        assert_eq!(
            table.lookup("g").and_then(Symbol::value_type),
            Some(&Type::Int)
        );
        assert!(table.lookup("x").is_none());
    }

    #[test]
    fn lookup_current_level_ignores_outer() {
        let mut table = SymbolTable::new();
        table.insert_variable("x", Type::Int, span(1)).unwrap();
        table.open_scope();
        assert!(table.lookup_current_level("x").is_none());
        assert!(table.insert_variable("x", Type::Int, span(3)).is_ok());
    }

    #[test]
    fn params_attach_to_method() {
        let mut table = SymbolTable::new();
        table.insert_method("f", Type::Int, None, span(1)).unwrap();
        table.open_scope();
        assert_eq!(
            table.insert_param(Some("f"), "a", Type::Int, span(2)),
            Ok(0)
        );
        assert_eq!(
            table.insert_param(Some("f"), "b", Type::Double, span(3)),
            Ok(1)
        );
        assert!(
            table
                .insert_param(Some("f"), "a", Type::Int, span(4))
                .is_err()
        );
        table.close_scope();

        let f = table.method("f").unwrap();
        assert_eq!(f.arity(), 2);
        assert_eq!(f.params[1].var.ty, Type::Double);
        assert!(table.lookup("a").is_none());
    }

    #[test]
    fn builtins_are_preloaded() {
        let table = SymbolTable::with_builtins();
        let len = table.method("len").unwrap();
        assert_eq!(len.builtin, Some(Builtin::Len));
        assert_eq!(len.return_type, Type::Int);
        assert_eq!(table.method("chr").unwrap().return_type, Type::Char);
        assert_eq!(table.globals().count(), 0);
    }

    #[test]
    fn class_members_are_restored() {
        let mut table = SymbolTable::new();
        table.insert_class("Point", span(1)).unwrap();
        let mut members = SymbolTable::new();
        members.insert_variable("x", Type::Int, span(2)).unwrap();
        members.insert_variable("y", Type::Int, span(3)).unwrap();
        table.restore_members("Point", members);

        let point = table.class("Point").unwrap();
        assert_eq!(point.field_index("y"), Some(1));
        assert_eq!(point.fields().count(), 2);
    }
}
