//! Runtime values.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use mica_compiler::ValueKind;

use super::memory::Handle;

/// A value on the operand stack, in a slot, or inside a heap object.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Double(f64),
    Char(char),
    Bool(bool),
    Str(Rc<str>),
    Null,
    Ref(Handle),
}

impl Value {
    /// The value an uninitialized slot of this kind holds.
    pub fn default_for(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Int => Value::Int(0),
            ValueKind::Double => Value::Double(0.0),
            ValueKind::Char => Value::Char('\0'),
            ValueKind::Bool => Value::Bool(false),
            ValueKind::String | ValueKind::Reference => Value::Null,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::Char(_) => "char",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Null => "null",
            Value::Ref(_) => "reference",
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Char(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Ordering used by `< <= > >=`; `None` for operands that do not compare.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
            (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// The text `write` prints.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => f.write_str(s),
            Value::Null => f.write_str("null"),
            Value::Ref(handle) => write!(f, "<object {handle}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_slot_kind() {
        assert_eq!(Value::default_for(ValueKind::Int), Value::Int(0));
        assert_eq!(Value::default_for(ValueKind::Bool), Value::Bool(false));
        assert!(Value::default_for(ValueKind::String).is_null());
        assert!(Value::default_for(ValueKind::Reference).is_null());
    }

    #[test]
    fn printing() {
        assert_eq!(Value::Int(-4).to_string(), "-4");
        assert_eq!(Value::Double(2.5).to_string(), "2.5");
        assert_eq!(Value::Double(3.0).to_string(), "3");
        assert_eq!(Value::Char('z').to_string(), "z");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Str("hi".into()).to_string(), "hi");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn comparisons() {
        assert_eq!(Value::Int(1).compare(&Value::Int(2)), Some(Ordering::Less));
        assert_eq!(
            Value::Char('b').compare(&Value::Char('a')),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Double(f64::NAN).compare(&Value::Double(1.0)), None);
        assert_eq!(Value::Int(1).compare(&Value::Double(1.0)), None);
    }

    #[test]
    fn strings_compare_by_content() {
        assert_eq!(Value::Str("a".into()), Value::Str(Rc::from("a")));
        assert_ne!(Value::Str("a".into()), Value::Null);
    }
}
