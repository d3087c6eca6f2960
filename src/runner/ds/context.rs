//! Evaluation context: the live frame stack plus shared host handles.

use std::cell::RefCell;
use std::collections::HashMap;
use std::mem;
use std::rc::Rc;

use crate::runner::ds::frame::{CellRef, FrameRef, ScopeFrame};
use crate::runner::ds::value::Value;
use crate::runner::host::HostEnv;
use crate::runner::module::ModuleGraph;

/// The export map a module under evaluation writes into.
pub type ExportMap = Rc<RefCell<HashMap<String, Value>>>;

/// One evaluation's view of the world: a stack of scope frames (bottom is
/// the root frame) plus shared handles to the host environment and the
/// module graph.
///
/// Cloning a context copies the stack *vector* only; the frames, and the
/// cells inside them, stay shared.
pub struct EvalContext {
    stack: Vec<FrameRef>,
    host: Rc<HostEnv>,
    modules: Rc<RefCell<ModuleGraph>>,
    exports: Option<ExportMap>,
}

impl EvalContext {
    pub fn new(host: Rc<HostEnv>) -> Self {
        EvalContext {
            stack: vec![ScopeFrame::new()],
            host,
            modules: Rc::new(RefCell::new(ModuleGraph::new())),
            exports: None,
        }
    }

    /// Build a context over an existing frame snapshot (closure invocation
    /// without a caller context).
    pub fn over_snapshot(
        snapshot: Vec<FrameRef>,
        host: Rc<HostEnv>,
        modules: Rc<RefCell<ModuleGraph>>,
    ) -> Self {
        let mut stack = snapshot;
        if stack.is_empty() {
            stack.push(ScopeFrame::new());
        }
        EvalContext {
            stack,
            host,
            modules,
            exports: None,
        }
    }

    pub fn host(&self) -> &Rc<HostEnv> {
        &self.host
    }

    pub fn modules(&self) -> &Rc<RefCell<ModuleGraph>> {
        &self.modules
    }

    /// Top-down scan for the nearest cell bound to `name`.
    pub fn lookup(&self, name: &str) -> Option<CellRef> {
        for frame in self.stack.iter().rev() {
            if let Some(cell) = frame.get(name) {
                return Some(cell);
            }
        }
        None
    }

    pub fn get_var(&self, name: &str) -> Option<Value> {
        self.lookup(name).map(|cell| cell.borrow().clone())
    }

    /// Loose assignment: mutate the nearest existing cell, or implicitly
    /// declare in the innermost frame when no frame binds the name.
    pub fn assign(&mut self, name: &str, value: Value) {
        match self.lookup(name) {
            Some(cell) => *cell.borrow_mut() = value,
            None => {
                self.innermost().define(name, value);
            }
        }
    }

    /// Declaration: always create (or shadow) in the innermost frame.
    pub fn declare(&mut self, name: &str, value: Value) -> CellRef {
        self.innermost().define(name, value)
    }

    pub fn innermost(&self) -> &FrameRef {
        // The stack is never empty: construction seeds a root frame and
        // pop_frame refuses to remove it.
        &self.stack[self.stack.len() - 1]
    }

    pub fn push_frame(&mut self) {
        self.stack.push(ScopeFrame::new());
    }

    pub fn pop_frame(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Shallow aliasing copy of the frame list. This is what a function
    /// definition captures.
    pub fn snapshot_stack(&self) -> Vec<FrameRef> {
        self.stack.clone()
    }

    /// Run `f` inside one fresh frame, restoring the prior depth on every
    /// exit path (including error returns from `f`).
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut EvalContext) -> R) -> R {
        let depth = self.stack.len();
        self.push_frame();
        let out = f(self);
        self.stack.truncate(depth);
        out
    }

    /// Swap in a captured snapshot, push one fresh frame over it, run `f`,
    /// and restore the caller's stack afterwards no matter how `f` exits.
    pub fn with_stack<R>(
        &mut self,
        snapshot: Vec<FrameRef>,
        f: impl FnOnce(&mut EvalContext) -> R,
    ) -> R {
        let saved = mem::replace(&mut self.stack, snapshot);
        self.push_frame();
        let out = f(self);
        self.stack = saved;
        out
    }

    /// Independent stack vector over the same frames; host env, module
    /// graph and export map stay shared.
    pub fn clone_context(&self) -> EvalContext {
        EvalContext {
            stack: self.stack.clone(),
            host: self.host.clone(),
            modules: self.modules.clone(),
            exports: self.exports.clone(),
        }
    }

    /// The module export map, created on first use.
    pub fn exports(&mut self) -> ExportMap {
        match &self.exports {
            Some(map) => map.clone(),
            None => {
                let map: ExportMap = Rc::new(RefCell::new(HashMap::new()));
                self.exports = Some(map.clone());
                map
            }
        }
    }

    /// The export map if any `export` has run, without creating one.
    pub fn taken_exports(&self) -> Option<ExportMap> {
        self.exports.clone()
    }
}
