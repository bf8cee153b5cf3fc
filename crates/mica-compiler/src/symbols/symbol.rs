//! Symbol kinds stored in a [`SymbolTable`](super::SymbolTable).

use mica_core::{Span, SymbolHash, Type};

use super::SymbolTable;

/// Library methods that are preloaded into every global table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `int len(T[] a)`
    Len,
    /// `int ord(char c)`
    Ord,
    /// `char chr(int i)`
    Chr,
}

impl Builtin {
    pub const ALL: [Builtin; 3] = [Builtin::Len, Builtin::Ord, Builtin::Chr];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Len => "len",
            Builtin::Ord => "ord",
            Builtin::Chr => "chr",
        }
    }

    pub fn return_type(self) -> Type {
        match self {
            Builtin::Len | Builtin::Ord => Type::Int,
            Builtin::Chr => Type::Char,
        }
    }

    /// The single parameter type. `len` accepts an array of any element type.
    pub fn param_type(self) -> Type {
        match self {
            Builtin::Len => Type::array_of(Type::Unknown),
            Builtin::Ord => Type::Char,
            Builtin::Chr => Type::Int,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableSymbol {
    pub name: String,
    pub ty: Type,
    pub is_array: bool,
    pub level: i32,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSymbol {
    pub var: VariableSymbol,
    /// Zero-based position in the parameter list.
    pub ordinal: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSymbol {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<ParameterSymbol>,
    pub level: i32,
    pub span: Span,
    /// Declaring class, `None` for global methods.
    pub owner: Option<String>,
    pub builtin: Option<Builtin>,
}

impl MethodSymbol {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn param_types(&self) -> impl Iterator<Item = &Type> {
        self.params.iter().map(|p| &p.var.ty)
    }

    pub fn returns_value(&self) -> bool {
        self.return_type != Type::Void
    }

    pub fn hash(&self) -> SymbolHash {
        SymbolHash::for_method(self.owner.as_deref(), &self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassSymbol {
    pub name: String,
    /// Fields and methods, all at the member table's outermost level.
    pub members: SymbolTable,
    pub level: i32,
    pub span: Span,
}

impl ClassSymbol {
    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &VariableSymbol> {
        self.members.outermost().filter_map(Symbol::as_variable)
    }

    /// Slot of a field in the object layout.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&VariableSymbol> {
        self.fields().find(|f| f.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodSymbol> {
        self.members
            .outermost()
            .filter_map(Symbol::as_method)
            .find(|m| m.name == name)
    }

    pub fn hash(&self) -> SymbolHash {
        SymbolHash::from_class(&self.name)
    }
}

/// A named entity: variable, parameter, method or class.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Variable(VariableSymbol),
    Parameter(ParameterSymbol),
    Method(MethodSymbol),
    Class(ClassSymbol),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Variable(v) => &v.name,
            Symbol::Parameter(p) => &p.var.name,
            Symbol::Method(m) => &m.name,
            Symbol::Class(c) => &c.name,
        }
    }

    pub fn level(&self) -> i32 {
        match self {
            Symbol::Variable(v) => v.level,
            Symbol::Parameter(p) => p.var.level,
            Symbol::Method(m) => m.level,
            Symbol::Class(c) => c.level,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Symbol::Variable(v) => v.span,
            Symbol::Parameter(p) => p.var.span,
            Symbol::Method(m) => m.span,
            Symbol::Class(c) => c.span,
        }
    }

    /// Human readable kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Symbol::Variable(_) => "variable",
            Symbol::Parameter(_) => "parameter",
            Symbol::Method(_) => "method",
            Symbol::Class(_) => "class",
        }
    }

    /// The value type of a variable or parameter.
    pub fn value_type(&self) -> Option<&Type> {
        match self {
            Symbol::Variable(v) => Some(&v.ty),
            Symbol::Parameter(p) => Some(&p.var.ty),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&VariableSymbol> {
        match self {
            Symbol::Variable(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodSymbol> {
        match self {
            Symbol::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassSymbol> {
        match self {
            Symbol::Class(c) => Some(c),
            _ => None,
        }
    }
}
