//! Deterministic handles for classes and methods.
//!
//! A [`SymbolHash`] is computed from a qualified name, so a call site can
//! reference a method before the backend has seen its definition and the
//! artifact stays stable across compilations of the same source.

use std::fmt;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants.
///
/// A class named `f` and a global method named `f` must not collide.
pub mod hash_constants {
    /// Separator between an owner and a member name.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for class handles.
    pub const CLASS: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for global method handles.
    pub const FUNCTION: u64 = 0x5ea77ffbcdf5f302;

    /// Domain marker for instance method handles.
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;
}

/// A 64-bit handle identifying a class or a method.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolHash(pub u64);

impl SymbolHash {
    pub const EMPTY: SymbolHash = SymbolHash(0);

    /// Handle of a class.
    pub fn from_class(name: &str) -> Self {
        SymbolHash(xxh64(name.as_bytes(), hash_constants::CLASS))
    }

    /// Handle of a global method.
    pub fn from_function(name: &str) -> Self {
        SymbolHash(xxh64(name.as_bytes(), hash_constants::FUNCTION))
    }

    /// Handle of a method declared inside `owner`.
    pub fn from_method(owner: &str, name: &str) -> Self {
        let owner = xxh64(owner.as_bytes(), hash_constants::CLASS);
        let name = xxh64(name.as_bytes(), hash_constants::METHOD);
        SymbolHash(owner.wrapping_mul(hash_constants::SEP).rotate_left(17) ^ name)
    }

    /// Handle for a method with an optional owning class.
    pub fn for_method(owner: Option<&str>, name: &str) -> Self {
        match owner {
            Some(owner) => Self::from_method(owner, name),
            None => Self::from_function(name),
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for SymbolHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolHash({:#018x})", self.0)
    }
}

impl fmt::Display for SymbolHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:016x}", self.0)
    }
}
