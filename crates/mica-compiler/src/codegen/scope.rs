//! Block-structured locals of the method being generated.
//!
//! Slots come from the backend and are never reused, so leaving a block
//! only hides its names; the slots stay reserved.

use mica_core::Type;
use rustc_hash::FxHashMap;

/// A local variable or parameter bound to a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVar {
    pub ty: Type,
    pub slot: u32,
    /// Block depth of the declaration; parameters live at depth 0.
    pub depth: u32,
}

#[derive(Debug, Default)]
pub struct LocalScope {
    variables: FxHashMap<String, LocalVar>,
    depth: u32,
    /// Bindings hidden by a declaration at `.0`, restored when that depth closes.
    shadowed: Vec<(u32, String, LocalVar)>,
}

impl LocalScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    pub fn pop_scope(&mut self) {
        let depth = self.depth;
        self.variables.retain(|_, var| var.depth < depth);
        while let Some((at, _, _)) = self.shadowed.last()
            && *at == depth
        {
            if let Some((_, name, var)) = self.shadowed.pop() {
                self.variables.insert(name, var);
            }
        }
        self.depth = depth.saturating_sub(1);
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Bind `name` to `slot` in the innermost block.
    pub fn declare(&mut self, name: &str, ty: Type, slot: u32) {
        let var = LocalVar {
            ty,
            slot,
            depth: self.depth,
        };
        if let Some(previous) = self.variables.insert(name.to_string(), var)
            && previous.depth < self.depth
        {
            self.shadowed.push((self.depth, name.to_string(), previous));
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&LocalVar> {
        self.variables.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_declaration_shadows_until_block_closes() {
        let mut scope = LocalScope::new();
        scope.declare("x", Type::Int, 0);

        scope.push_scope();
        scope.declare("x", Type::Double, 1);
        assert_eq!(scope.lookup("x").map(|v| v.slot), Some(1));
        assert_eq!(scope.lookup("x").map(|v| &v.ty), Some(&Type::Double));

        scope.pop_scope();
        assert_eq!(scope.lookup("x").map(|v| v.slot), Some(0));
    }

    #[test]
    fn block_locals_disappear() {
        let mut scope = LocalScope::new();
        scope.push_scope();
        scope.declare("tmp", Type::Char, 3);
        assert_eq!(scope.depth(), 1);
        scope.pop_scope();
        assert!(scope.lookup("tmp").is_none());
        assert_eq!(scope.depth(), 0);
    }

    #[test]
    fn nested_shadowing_restores_each_level() {
        let mut scope = LocalScope::new();
        scope.declare("i", Type::Int, 0);
        scope.push_scope();
        scope.declare("i", Type::Int, 1);
        scope.push_scope();
        scope.declare("i", Type::Int, 2);

        scope.pop_scope();
        assert_eq!(scope.lookup("i").unwrap().slot, 1);
        scope.pop_scope();
        assert_eq!(scope.lookup("i").unwrap().slot, 0);
    }
}
