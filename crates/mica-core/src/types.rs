//! The Mica type model and its compatibility rules.
//!
//! Everything here is a pure predicate or classification. Failures are
//! reported by the caller; this module never produces diagnostics.
//!
//! [`Type::Unknown`] is the error-recovery sentinel: any rule with an
//! `Unknown` operand succeeds (and yields `Unknown` where a type is produced),
//! so one bad sub-expression does not cascade into further errors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A Mica type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Int,
    Double,
    Char,
    Bool,
    String,
    Void,
    /// Type of the `null` literal.
    Null,
    /// Error-recovery sentinel, compatible with everything.
    Unknown,
    /// A user-declared class, by name.
    Class(String),
    /// An array of the element type.
    Array(Box<Type>),
}

impl Type {
    pub fn array_of(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn class(name: impl Into<String>) -> Type {
        Type::Class(name.into())
    }

    /// The element type if this is an array.
    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Double)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    /// Types whose values are handles and may hold `null`.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::String | Type::Class(_) | Type::Array(_) | Type::Null
        )
    }

    /// Types `write` can print.
    pub fn is_printable(&self) -> bool {
        matches!(
            self,
            Type::Int | Type::Double | Type::Char | Type::Bool | Type::String | Type::Unknown
        )
    }

    /// Types `read` can parse into. Same set as the printable scalars.
    pub fn is_readable(&self) -> bool {
        self.is_printable()
    }

    /// Valid switch selector types.
    pub fn is_switchable(&self) -> bool {
        matches!(self, Type::Int | Type::Char | Type::Unknown)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Double => write!(f, "double"),
            Type::Char => write!(f, "char"),
            Type::Bool => write!(f, "bool"),
            Type::String => write!(f, "string"),
            Type::Void => write!(f, "void"),
            Type::Null => write!(f, "null"),
            Type::Unknown => write!(f, "<unknown>"),
            Type::Class(name) => write!(f, "{name}"),
            Type::Array(elem) => write!(f, "{elem}[]"),
        }
    }
}

// ============================================================================
// Compatibility rules
// ============================================================================

/// Whether a value of `source` may be stored into a location of `target`.
///
/// Holds when the types are identical, for `int -> double` widening, for
/// `null` into any class, array or string, and whenever either side is
/// `Unknown`. Arrays are invariant; an `Unknown` element type matches any
/// element type (used by builtins such as `len`).
pub fn is_assignable(target: &Type, source: &Type) -> bool {
    match (target, source) {
        (Type::Unknown, _) | (_, Type::Unknown) => true,
        (Type::Double, Type::Int) => true,
        (Type::Class(_) | Type::Array(_) | Type::String, Type::Null) => true,
        (Type::Array(t), Type::Array(s)) => t.is_unknown() || s.is_unknown() || t == s,
        (Type::Void, _) | (_, Type::Void) => false,
        _ => target == source,
    }
}

/// Whether storing `source` into `target` needs an explicit widening step.
pub fn needs_widening(target: &Type, source: &Type) -> bool {
    matches!((target, source), (Type::Double, Type::Int))
}

/// Result type of `+ - * / %`, or `None` when the operands are not numeric.
pub fn arithmetic_result(lhs: &Type, rhs: &Type) -> Option<Type> {
    match (lhs, rhs) {
        (Type::Unknown, _) | (_, Type::Unknown) => Some(Type::Unknown),
        (Type::Double, r) if r.is_numeric() => Some(Type::Double),
        (l, Type::Double) if l.is_numeric() => Some(Type::Double),
        (Type::Int, Type::Int) => Some(Type::Int),
        _ => None,
    }
}

/// The common operand type of a binary operator, if widening applies.
///
/// `int` against `double` promotes to `double`; everything else compares as is.
pub fn promoted_operand(lhs: &Type, rhs: &Type) -> Option<Type> {
    match (lhs, rhs) {
        (Type::Int, Type::Double) | (Type::Double, Type::Int) => Some(Type::Double),
        _ => None,
    }
}

/// Whether `< <= > >=` accept the operands.
pub fn is_relational(lhs: &Type, rhs: &Type) -> bool {
    match (lhs, rhs) {
        (Type::Unknown, _) | (_, Type::Unknown) => true,
        (Type::Char, Type::Char) => true,
        (l, r) => l.is_numeric() && r.is_numeric(),
    }
}

/// Whether `== !=` accept the operands.
pub fn is_equality(lhs: &Type, rhs: &Type) -> bool {
    match (lhs, rhs) {
        (Type::Unknown, _) | (_, Type::Unknown) => true,
        (l, r) if l.is_numeric() && r.is_numeric() => true,
        (Type::Null, other) | (other, Type::Null) => other.is_reference(),
        (Type::Char, Type::Char) | (Type::Bool, Type::Bool) | (Type::String, Type::String) => {
            true
        }
        (Type::Class(a), Type::Class(b)) => a == b,
        (Type::Array(a), Type::Array(b)) => a == b,
        _ => false,
    }
}

/// Whether `&& || !` accept the operand.
pub fn is_logical(operand: &Type) -> bool {
    matches!(operand, Type::Bool | Type::Unknown)
}

/// Result type of unary minus, or `None` for non-numeric operands.
pub fn negation_result(operand: &Type) -> Option<Type> {
    match operand {
        Type::Int | Type::Double | Type::Unknown => Some(operand.clone()),
        _ => None,
    }
}

/// Whether `(target) source` is a legal cast.
///
/// Casts convert between numeric types, or restate an identical class type.
pub fn is_castable(target: &Type, source: &Type) -> bool {
    match (target, source) {
        (Type::Unknown, _) | (_, Type::Unknown) => true,
        (t, s) if t.is_numeric() && s.is_numeric() => true,
        (Type::Class(a), Type::Class(b)) => a == b,
        _ => false,
    }
}
