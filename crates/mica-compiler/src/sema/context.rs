//! Tracks which statements a `break` may leave.

/// A construct that `break` exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakable {
    Loop,
    Switch,
}

/// Stack of enclosing loops and switches, innermost last.
#[derive(Debug, Default)]
pub struct BreakContext {
    stack: Vec<Breakable>,
}

impl BreakContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, kind: Breakable) {
        self.stack.push(kind);
    }

    pub fn exit(&mut self) -> Option<Breakable> {
        self.stack.pop()
    }

    pub fn can_break(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn innermost(&self) -> Option<Breakable> {
        self.stack.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_cannot_break() {
        let context = BreakContext::new();
        assert!(!context.can_break());
        assert_eq!(context.innermost(), None);
    }

    #[test]
    fn nesting() {
        let mut context = BreakContext::new();
        context.enter(Breakable::Loop);
        context.enter(Breakable::Switch);
        assert_eq!(context.depth(), 2);
        assert_eq!(context.innermost(), Some(Breakable::Switch));
        assert_eq!(context.exit(), Some(Breakable::Switch));
        assert_eq!(context.innermost(), Some(Breakable::Loop));
        context.exit();
        assert!(!context.can_break());
    }
}
