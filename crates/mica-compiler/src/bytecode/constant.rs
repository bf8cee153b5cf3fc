//! Module-level constant pool.

use mica_core::SymbolHash;
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Values referenced by bytecode operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Int(i32),
    Double(f64),
    Char(char),
    String(String),
    /// Target of a `CALL`.
    Method(SymbolHash),
    /// Target of a `NEW`.
    Class(SymbolHash),
}

/// Hashable mirror of [`Constant`] used for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstantKey {
    Int(i32),
    Double(OrderedFloat<f64>),
    Char(char),
    String(String),
    Method(SymbolHash),
    Class(SymbolHash),
}

impl From<&Constant> for ConstantKey {
    fn from(constant: &Constant) -> Self {
        match constant {
            Constant::Int(v) => ConstantKey::Int(*v),
            Constant::Double(v) => ConstantKey::Double(OrderedFloat(*v)),
            Constant::Char(c) => ConstantKey::Char(*c),
            Constant::String(s) => ConstantKey::String(s.clone()),
            Constant::Method(h) => ConstantKey::Method(*h),
            Constant::Class(h) => ConstantKey::Class(*h),
        }
    }
}

/// Constants shared by every function of a module, each stored once.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    constants: Vec<Constant>,
    index: FxHashMap<ConstantKey, u32>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constant, or return the index of an identical one.
    pub fn add(&mut self, constant: Constant) -> u32 {
        let key = ConstantKey::from(&constant);
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.constants.len() as u32;
        self.constants.push(constant);
        self.index.insert(key, idx);
        idx
    }

    pub fn get(&self, index: u32) -> Option<&Constant> {
        self.constants.get(index as usize)
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    pub fn into_constants(self) -> Vec<Constant> {
        self.constants
    }

    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduplicates_equal_values() {
        let mut pool = ConstantPool::new();
        let a = pool.add(Constant::Int(100));
        let b = pool.add(Constant::Int(200));
        let c = pool.add(Constant::Int(100));
        assert_eq!((a, b, c), (0, 1, 0));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn doubles_compare_by_value() {
        let mut pool = ConstantPool::new();
        let a = pool.add(Constant::Double(1.5));
        let b = pool.add(Constant::Double(1.5));
        let nan = pool.add(Constant::Double(f64::NAN));
        assert_eq!(a, b);
        assert_eq!(pool.add(Constant::Double(f64::NAN)), nan);
    }

    #[test]
    fn kinds_do_not_collide() {
        let mut pool = ConstantPool::new();
        let hash = SymbolHash::from_class("Point");
        let class = pool.add(Constant::Class(hash));
        let method = pool.add(Constant::Method(hash));
        assert_ne!(class, method);
        assert_ne!(
            pool.add(Constant::Char('a')),
            pool.add(Constant::Int('a' as i32))
        );
        assert_eq!(pool.get(class), Some(&Constant::Class(hash)));
    }

    #[test]
    fn strings() {
        let mut pool = ConstantPool::new();
        let idx = pool.add(Constant::String("hello".into()));
        assert_eq!(pool.add(Constant::String("hello".into())), idx);
        assert_eq!(pool.constants(), &[Constant::String("hello".into())]);
    }
}
