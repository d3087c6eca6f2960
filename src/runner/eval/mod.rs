//! Tree evaluation.
//!
//! Control flow never travels as an error: `break`, `continue` and `return`
//! are [`Completion`] sentinels that composite nodes inspect and either
//! consume (loops eat `Break`/`Continue`, function bodies eat `Return`) or
//! pass upward untouched.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::runner::ds::context::{EvalContext, ExportMap};
use crate::runner::ds::error::ScriptError;
use crate::runner::ds::value::{TypeTag, Value};
use crate::runner::host::HostEnv;
use crate::runner::module;

pub mod call;
pub mod control;
pub mod expression;
pub mod member;

/// How one node finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Normal(Value),
    Break,
    Continue,
    Return(Value),
}

impl Completion {
    /// The carried value; sentinels without one yield the absence marker.
    pub fn into_value(self) -> Value {
        match self {
            Completion::Normal(v) | Completion::Return(v) => v,
            Completion::Break | Completion::Continue => Value::Absent,
        }
    }
}

pub type EvalResult = Result<Completion, ScriptError>;

/// Unwrap a child completion to its value in operand position. An abrupt
/// completion returns to the caller unchanged; only loops and function
/// boundaries may consume one.
macro_rules! operand {
    ($completion:expr) => {
        match $completion? {
            $crate::runner::eval::Completion::Normal(v) => v,
            abrupt => return Ok(abrupt),
        }
    };
}
pub(crate) use operand;

impl Expr {
    /// Evaluate this node against a context.
    pub fn evaluate(&self, ctx: &mut EvalContext) -> EvalResult {
        match self {
            Expr::Literal(_)
            | Expr::Identifier(_)
            | Expr::ListLit(_)
            | Expr::MapLit(_)
            | Expr::Unary { .. }
            | Expr::Binary { .. }
            | Expr::Logical { .. }
            | Expr::Conditional { .. }
            | Expr::Assign { .. }
            | Expr::Declare { .. }
            | Expr::FunctionDef { .. }
            | Expr::Throw(_) => expression::evaluate(self, ctx),

            Expr::Block(_)
            | Expr::If { .. }
            | Expr::While { .. }
            | Expr::For { .. }
            | Expr::ForIn { .. }
            | Expr::Switch { .. }
            | Expr::Break
            | Expr::Continue
            | Expr::Return(_)
            | Expr::Try { .. } => control::evaluate(self, ctx),

            Expr::Call { .. } | Expr::Member { .. } | Expr::Index { .. } => {
                match member::eval_chain(ctx, self)? {
                    member::Chained::Value(v) => Ok(Completion::Normal(v)),
                    member::Chained::Cut => Ok(Completion::Normal(Value::Absent)),
                    member::Chained::Abrupt(completion) => Ok(completion),
                }
            }

            Expr::Import(node) => {
                module::eval_import(ctx, node)?;
                Ok(Completion::Normal(Value::Absent))
            }
            Expr::Export(node) => module::eval_export(ctx, node),
        }
    }

    /// Best-effort type of this node, for diagnostics. Never evaluates
    /// anything; unresolvable shapes report `Unknown`.
    pub fn static_type(&self, ctx: &EvalContext) -> TypeTag {
        match self {
            Expr::Literal(Literal::Null) => TypeTag::Null,
            Expr::Literal(Literal::Bool(_)) => TypeTag::Bool,
            Expr::Literal(Literal::Int(_)) => TypeTag::Int,
            Expr::Literal(Literal::Float(_)) => TypeTag::Float,
            Expr::Literal(Literal::Str(_)) => TypeTag::Str,
            Expr::Identifier(name) => ctx
                .get_var(name)
                .map(|v| v.type_tag())
                .unwrap_or(TypeTag::Unknown),
            Expr::ListLit(_) => TypeTag::List,
            Expr::MapLit(_) => TypeTag::Map,
            Expr::FunctionDef { .. } => TypeTag::Function,
            Expr::Unary { op: UnaryOp::Not, .. } => TypeTag::Bool,
            Expr::Unary {
                op: UnaryOp::Neg,
                operand,
            } => match operand.static_type(ctx) {
                t @ (TypeTag::Int | TypeTag::Float) => t,
                _ => TypeTag::Unknown,
            },
            Expr::Binary { op, left, right } => match op {
                BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge => TypeTag::Bool,
                _ => match (left.static_type(ctx), right.static_type(ctx)) {
                    (TypeTag::Str, _) | (_, TypeTag::Str) if *op == BinaryOp::Add => TypeTag::Str,
                    (TypeTag::Int, TypeTag::Int) => TypeTag::Int,
                    (TypeTag::Int | TypeTag::Float, TypeTag::Int | TypeTag::Float) => {
                        TypeTag::Float
                    }
                    _ => TypeTag::Unknown,
                },
            },
            Expr::Conditional {
                consequent,
                alternate,
                ..
            } => {
                let a = consequent.static_type(ctx);
                let b = alternate.static_type(ctx);
                if a == b {
                    a
                } else {
                    TypeTag::Unknown
                }
            }
            Expr::Assign { value, .. } => value.static_type(ctx),
            Expr::Block(body) => body
                .last()
                .map(|e| e.static_type(ctx))
                .unwrap_or(TypeTag::Absent),
            _ => TypeTag::Unknown,
        }
    }
}

/// Evaluate a tree to a value over a fresh context.
pub fn evaluate(
    root: &Expr,
    bindings: HashMap<String, Value>,
    host: Rc<HostEnv>,
) -> Result<Value, ScriptError> {
    let mut ctx = EvalContext::new(host);
    for (name, value) in bindings {
        ctx.declare(&name, value);
    }
    evaluate_in(root, &mut ctx)
}

/// Evaluate a tree as a module: the result value plus whatever it exported.
pub fn evaluate_module(
    root: &Expr,
    bindings: HashMap<String, Value>,
    host: Rc<HostEnv>,
) -> Result<(Value, ExportMap), ScriptError> {
    let mut ctx = EvalContext::new(host);
    for (name, value) in bindings {
        ctx.declare(&name, value);
    }
    let value = evaluate_in(root, &mut ctx)?;
    let exports = ctx.exports();
    Ok((value, exports))
}

/// Evaluate a tree against an existing context. A top-level `return` yields
/// its value; a stray `break`/`continue` is a malformed tree.
pub fn evaluate_in(root: &Expr, ctx: &mut EvalContext) -> Result<Value, ScriptError> {
    match root.evaluate(ctx)? {
        Completion::Break | Completion::Continue => Err(ScriptError::Structural(
            "break/continue outside a loop".to_string(),
        )),
        done => Ok(done.into_value()),
    }
}
