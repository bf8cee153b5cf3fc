//! Append-only object heap.
//!
//! Objects live until the VM is dropped; a handle is the position of its
//! object and stays valid for the whole run.

use std::fmt;

use mica_compiler::ValueKind;
use mica_core::SymbolHash;

use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u32);

impl Handle {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HeapObject {
    Instance {
        class: SymbolHash,
        fields: Vec<Value>,
    },
    Array {
        element: ValueKind,
        items: Vec<Value>,
    },
}

#[derive(Debug, Default)]
pub struct ObjectHeap {
    objects: Vec<HeapObject>,
}

impl ObjectHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, object: HeapObject) -> Handle {
        let handle = Handle(self.objects.len() as u32);
        self.objects.push(object);
        handle
    }

    pub fn get(&self, handle: Handle) -> Option<&HeapObject> {
        self.objects.get(handle.0 as usize)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut HeapObject> {
        self.objects.get_mut(handle.0 as usize)
    }

    /// Number of objects allocated so far.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
