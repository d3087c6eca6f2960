//! Scope frames and variable cells.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runner::ds::value::Value;

/// A single mutable slot, shared by reference between the frame that
/// declared it and any closures that captured that frame. Mutation through
/// one handle is visible through all of them.
pub type CellRef = Rc<RefCell<Value>>;

pub fn new_cell(value: Value) -> CellRef {
    Rc::new(RefCell::new(value))
}

/// One lexical nesting level: a key-unique mapping from identifier to cell.
///
/// A frame is owned by exactly one position in a context's stack but may be
/// referenced by any number of captured function values.
pub struct ScopeFrame {
    vars: RefCell<HashMap<String, CellRef>>,
}

/// Shared handle to a frame. Snapshots copy lists of these, never frame
/// contents.
pub type FrameRef = Rc<ScopeFrame>;

impl ScopeFrame {
    pub fn new() -> FrameRef {
        Rc::new(ScopeFrame {
            vars: RefCell::new(HashMap::new()),
        })
    }

    pub fn get(&self, name: &str) -> Option<CellRef> {
        self.vars.borrow().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.borrow().contains_key(name)
    }

    /// Create (or replace) the cell for `name` in this frame.
    pub fn define(&self, name: impl Into<String>, value: Value) -> CellRef {
        let cell = new_cell(value);
        self.vars.borrow_mut().insert(name.into(), cell.clone());
        cell
    }

    /// Install an existing cell under `name`, aliasing whatever already
    /// shares it.
    pub fn define_cell(&self, name: impl Into<String>, cell: CellRef) {
        self.vars.borrow_mut().insert(name.into(), cell);
    }

    pub fn names(&self) -> Vec<String> {
        self.vars.borrow().keys().cloned().collect()
    }
}
