//! Function values: a body plus a captured frame snapshot.

use std::cell::RefCell;
use std::rc::Rc;

use uuid::Uuid;

use crate::ast::{Expr, ParamPattern};
use crate::runner::ds::context::EvalContext;
use crate::runner::ds::error::ScriptError;
use crate::runner::ds::value::Value;
use crate::runner::eval::Completion;
use crate::runner::host::HostEnv;
use crate::runner::module::ModuleGraph;
use crate::runner::ds::frame::FrameRef;

/// Every invocation publishes its raw argument list in the parameter frame
/// under this name. `auto_apply` re-binds from it.
pub const ARGS_KEY: &str = "__args__";

/// A first-class function: parameter patterns, a shared body tree, and a
/// shallow snapshot of the frame stack taken at definition time.
///
/// The snapshot copies frame *references*; cells visible at definition time
/// stay shared between the closure and its surroundings, which is what makes
/// counter-style mutation through a closure observable outside it.
pub struct FunctionValue {
    id: Uuid,
    pub name: Option<String>,
    pub params: Vec<ParamPattern>,
    pub body: Rc<Expr>,
    captured: Vec<FrameRef>,
    host: Rc<HostEnv>,
    modules: Rc<RefCell<ModuleGraph>>,
}

impl FunctionValue {
    /// Capture the current stack. Called when a function-definition node is
    /// evaluated.
    pub fn capture(
        name: Option<String>,
        params: Vec<ParamPattern>,
        body: Rc<Expr>,
        ctx: &EvalContext,
    ) -> Rc<Self> {
        Rc::new(FunctionValue {
            id: Uuid::new_v4(),
            name,
            params,
            body,
            captured: ctx.snapshot_stack(),
            host: ctx.host().clone(),
            modules: ctx.modules().clone(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// In-evaluation call path: runs the body over the captured snapshot
    /// using the caller's context, restoring the caller's stack afterwards.
    pub fn invoke(&self, ctx: &mut EvalContext, args: &[Value]) -> Result<Value, ScriptError> {
        ctx.with_stack(self.captured.clone(), |inner| self.run_body(inner, args))
    }

    /// Host-facing entry point: builds a private context over the captured
    /// snapshot, so no caller stack is required (or touched). Extra
    /// arguments are ignored; missing ones bind the absence marker.
    pub fn apply(&self, args: &[Value]) -> Result<Value, ScriptError> {
        let mut ctx =
            EvalContext::over_snapshot(self.captured.clone(), self.host.clone(), self.modules.clone());
        ctx.scoped(|inner| self.run_body(inner, args))
    }

    /// Alias for [`apply`](Self::apply) that pins its isolation contract in
    /// the name: every `apply` already runs over a private stack, never a
    /// caller's. Captured cells are still shared; serializing mutation of
    /// those is the host's responsibility.
    pub fn thread_safe_apply(&self, args: &[Value]) -> Result<Value, ScriptError> {
        self.apply(args)
    }

    /// Re-invoke using the ambient argument list of the nearest enclosing
    /// call (the `__args__` slot).
    pub fn auto_apply(&self, ctx: &mut EvalContext) -> Result<Value, ScriptError> {
        match ctx.get_var(ARGS_KEY) {
            Some(Value::List(items)) => {
                let args: Vec<Value> = items.borrow().clone();
                self.invoke(ctx, &args)
            }
            _ => {
                let needs_args = self
                    .params
                    .iter()
                    .any(|p| matches!(p, ParamPattern::Destructure(_)));
                if needs_args {
                    return Err(ScriptError::Structural(format!(
                        "cannot auto-apply '{}': no ambient arguments to destructure",
                        self.name.as_deref().unwrap_or("<anonymous>")
                    )));
                }
                self.invoke(ctx, &[])
            }
        }
    }

    fn run_body(&self, ctx: &mut EvalContext, args: &[Value]) -> Result<Value, ScriptError> {
        self.bind_params(ctx, args);
        match self.body.evaluate(ctx)? {
            Completion::Return(v) => Ok(v),
            Completion::Normal(v) => Ok(v),
            Completion::Break | Completion::Continue => Err(ScriptError::Structural(
                "break/continue escaped a function body".to_string(),
            )),
        }
    }

    /// Bind declared parameters into the innermost (freshly pushed) frame.
    fn bind_params(&self, ctx: &mut EvalContext, args: &[Value]) {
        for (i, pattern) in self.params.iter().enumerate() {
            let arg = args.get(i).cloned().unwrap_or(Value::Absent);
            match pattern {
                ParamPattern::Name(name) => {
                    ctx.declare(name, arg);
                }
                ParamPattern::Destructure(keys) => {
                    for key in keys {
                        let bound = destructure_key(&arg, key);
                        ctx.declare(key, bound);
                    }
                }
            }
        }
        ctx.declare(ARGS_KEY, Value::list(args.to_vec()));
    }
}

/// One key of a destructuring pattern: map entry, host property, or the
/// absence marker when the argument carries neither.
fn destructure_key(arg: &Value, key: &str) -> Value {
    match arg {
        Value::Map(m) => m.borrow().get(key).cloned().unwrap_or(Value::Absent),
        Value::Host(obj) => crate::runner::host::host_property(obj, key).unwrap_or(Value::Absent),
        _ => Value::Absent,
    }
}
