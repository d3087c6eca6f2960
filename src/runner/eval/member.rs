//! Property and index resolution, and the optional-chaining walk.

use log::debug;

use crate::ast::Expr;
use crate::runner::ds::context::EvalContext;
use crate::runner::ds::error::ScriptError;
use crate::runner::ds::value::Value;
use crate::runner::eval::{call, Completion};
use crate::runner::host::{common_ops, host_property};

/// Intermediate result while walking a postfix chain. `Cut` records that an
/// optional link hit null/absent: the whole remaining chain collapses to
/// the absence marker, and nothing further in it (including call
/// arguments) is evaluated. `Abrupt` carries a `break`/`continue`/`return`
/// sentinel raised inside an operand out to the enclosing consumer.
pub(crate) enum Chained {
    Value(Value),
    Cut,
    Abrupt(Completion),
}

/// Argument list evaluation either yields values or stops at the first
/// abrupt operand.
enum ArgsOutcome {
    Values(Vec<Value>),
    Abrupt(Completion),
}

/// Evaluate a `Member`/`Index`/`Call` spine, threading optional-chain cuts
/// through without touching unevaluated operands.
pub(crate) fn eval_chain(ctx: &mut EvalContext, expr: &Expr) -> Result<Chained, ScriptError> {
    match expr {
        Expr::Member {
            object,
            property,
            optional,
        } => {
            let base = match eval_chain(ctx, object)? {
                Chained::Value(v) => v,
                short => return Ok(short),
            };
            if base.is_nil() {
                if *optional {
                    return Ok(Chained::Cut);
                }
                return Err(ScriptError::PropertyResolution {
                    target_type: base.type_name(),
                    name: property.clone(),
                });
            }
            read_property(&base, property).map(Chained::Value)
        }

        Expr::Index {
            object,
            index,
            optional,
        } => {
            let base = match eval_chain(ctx, object)? {
                Chained::Value(v) => v,
                short => return Ok(short),
            };
            if base.is_nil() {
                if *optional {
                    return Ok(Chained::Cut);
                }
                return Err(ScriptError::Type(format!(
                    "cannot index {}",
                    base.type_name()
                )));
            }
            let idx = match index.evaluate(ctx)? {
                Completion::Normal(v) => v,
                abrupt => return Ok(Chained::Abrupt(abrupt)),
            };
            read_index(&base, &idx).map(Chained::Value)
        }

        Expr::Call { callee, args } => match callee.as_ref() {
            // `obj.m(...)` dispatches as a method on obj, not as a plain
            // read followed by a call.
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let target = match eval_chain(ctx, object)? {
                    Chained::Value(v) => v,
                    short => return Ok(short),
                };
                if target.is_nil() {
                    if *optional {
                        return Ok(Chained::Cut);
                    }
                    return Err(ScriptError::MethodNotFound {
                        target_type: target.type_name(),
                        name: property.clone(),
                    });
                }
                let arg_values = match eval_args(ctx, args)? {
                    ArgsOutcome::Values(values) => values,
                    ArgsOutcome::Abrupt(abrupt) => return Ok(Chained::Abrupt(abrupt)),
                };
                call::call_method(ctx, &target, property, &arg_values).map(Chained::Value)
            }
            Expr::Identifier(name) => {
                let callee_value = match ctx.get_var(name) {
                    Some(v) => v,
                    // An unbound call head falls back to the host function
                    // table before counting as unresolved.
                    None => match ctx.host().fun(name) {
                        Some(f) => {
                            debug!("'{}' resolved through the host function table", name);
                            Value::Native(f)
                        }
                        None => return Err(ScriptError::UnresolvedReference(name.clone())),
                    },
                };
                let arg_values = match eval_args(ctx, args)? {
                    ArgsOutcome::Values(values) => values,
                    ArgsOutcome::Abrupt(abrupt) => return Ok(Chained::Abrupt(abrupt)),
                };
                call::invoke_value(ctx, &callee_value, &arg_values, name).map(Chained::Value)
            }
            other => {
                let callee_value = match eval_chain(ctx, other)? {
                    Chained::Value(v) => v,
                    short => return Ok(short),
                };
                let arg_values = match eval_args(ctx, args)? {
                    ArgsOutcome::Values(values) => values,
                    ArgsOutcome::Abrupt(abrupt) => return Ok(Chained::Abrupt(abrupt)),
                };
                call::invoke_value(ctx, &callee_value, &arg_values, "<expression>")
                    .map(Chained::Value)
            }
        },

        other => match other.evaluate(ctx)? {
            Completion::Normal(v) => Ok(Chained::Value(v)),
            abrupt => Ok(Chained::Abrupt(abrupt)),
        },
    }
}

fn eval_args(ctx: &mut EvalContext, args: &[Expr]) -> Result<ArgsOutcome, ScriptError> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        match arg.evaluate(ctx)? {
            Completion::Normal(v) => out.push(v),
            abrupt => return Ok(ArgsOutcome::Abrupt(abrupt)),
        }
    }
    Ok(ArgsOutcome::Values(out))
}

/// Non-nil property read. Stages: host capabilities, map key (missing key
/// reads as the absence marker), numeric list slot, then the common
/// fallback names.
pub(crate) fn read_property(base: &Value, name: &str) -> Result<Value, ScriptError> {
    match base {
        Value::Host(obj) => {
            if let Some(v) = host_property(obj, name) {
                return Ok(v);
            }
        }
        Value::Map(m) => {
            return Ok(m.borrow().get(name).cloned().unwrap_or(Value::Absent));
        }
        Value::List(l) => {
            if let Ok(i) = name.parse::<usize>() {
                return Ok(l.borrow().get(i).cloned().unwrap_or(Value::Absent));
            }
        }
        _ => {}
    }
    if let Some(v) = common_ops::common_property(base, name) {
        return Ok(v);
    }
    Err(ScriptError::PropertyResolution {
        target_type: base.type_name(),
        name: name.to_string(),
    })
}

pub(crate) fn read_index(base: &Value, idx: &Value) -> Result<Value, ScriptError> {
    match (base, idx) {
        (Value::List(l), Value::Int(i)) => {
            if *i < 0 {
                return Ok(Value::Absent);
            }
            Ok(l.borrow().get(*i as usize).cloned().unwrap_or(Value::Absent))
        }
        (Value::Map(m), Value::Str(key)) => {
            Ok(m.borrow().get(key).cloned().unwrap_or(Value::Absent))
        }
        (Value::Str(s), Value::Int(i)) => {
            if *i < 0 {
                return Ok(Value::Absent);
            }
            Ok(s.chars()
                .nth(*i as usize)
                .map(|c| Value::Str(c.to_string()))
                .unwrap_or(Value::Absent))
        }
        _ => Err(ScriptError::Type(format!(
            "cannot index {} with {}",
            base.type_name(),
            idx.type_name()
        ))),
    }
}

/// `base.name = value`
pub(crate) fn write_property(base: &Value, name: &str, value: Value) -> Result<(), ScriptError> {
    match base {
        Value::Map(m) => {
            m.borrow_mut().insert(name.to_string(), value);
            Ok(())
        }
        Value::Host(obj) => {
            if obj.class().write(obj.as_ref(), name, value)? {
                Ok(())
            } else {
                Err(ScriptError::PropertyResolution {
                    target_type: obj.type_name().to_string(),
                    name: name.to_string(),
                })
            }
        }
        other => Err(ScriptError::Type(format!(
            "cannot set a property on {}",
            other.type_name()
        ))),
    }
}

/// `base[idx] = value`. Writing one slot past the end of a list appends.
pub(crate) fn write_index(base: &Value, idx: &Value, value: Value) -> Result<(), ScriptError> {
    match (base, idx) {
        (Value::List(l), Value::Int(i)) => {
            let mut items = l.borrow_mut();
            let i = *i;
            if i < 0 || i as usize > items.len() {
                return Err(ScriptError::Type(format!(
                    "index {} out of range for list of {}",
                    i,
                    items.len()
                )));
            }
            let i = i as usize;
            if i == items.len() {
                items.push(value);
            } else {
                items[i] = value;
            }
            Ok(())
        }
        (Value::Map(m), Value::Str(key)) => {
            m.borrow_mut().insert(key.clone(), value);
            Ok(())
        }
        _ => Err(ScriptError::Type(format!(
            "cannot index-assign {} with {}",
            base.type_name(),
            idx.type_name()
        ))),
    }
}
