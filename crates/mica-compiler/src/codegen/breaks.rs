//! Targets of `break` statements.

use mica_core::{CodeGenError, Span};

use crate::emit::Label;

/// End labels of the enclosing loops and switches, innermost last.
#[derive(Debug, Default)]
pub struct BreakLabels {
    targets: Vec<Label>,
}

impl BreakLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, end: Label) {
        self.targets.push(end);
    }

    pub fn exit(&mut self) -> Option<Label> {
        self.targets.pop()
    }

    /// Where a `break` at `span` jumps to.
    pub fn target(&self, span: Span) -> Result<Label, CodeGenError> {
        self.targets
            .last()
            .copied()
            .ok_or(CodeGenError::BreakOutsideBreakable { span })
    }

    pub fn depth(&self) -> usize {
        self.targets.len()
    }
}
