//! Invocation and method dispatch.

use std::rc::Rc;

use log::debug;

use crate::runner::ds::context::EvalContext;
use crate::runner::ds::error::ScriptError;
use crate::runner::ds::value::Value;
use crate::runner::host::{common_ops, HostObject};

/// Call an already-resolved callable value. `label` only feeds diagnostics.
pub(crate) fn invoke_value(
    ctx: &mut EvalContext,
    callee: &Value,
    args: &[Value],
    label: &str,
) -> Result<Value, ScriptError> {
    match callee {
        Value::Function(func) => func.invoke(ctx, args),
        Value::Native(func) => {
            let name = func.name.clone();
            func.call(ctx, args).map_err(|source| wrap_invocation(name, source))
        }
        other => Err(ScriptError::Type(format!(
            "'{}' is not callable ({})",
            label,
            other.type_name()
        ))),
    }
}

/// `target.name(args)`.
///
/// Resolution order: host invoke capability, scored host overloads,
/// callable map entry, map-to-host coercion retry, common fallback
/// operations, and finally a method-not-found failure naming the receiver
/// type and the member.
pub(crate) fn call_method(
    ctx: &mut EvalContext,
    target: &Value,
    name: &str,
    args: &[Value],
) -> Result<Value, ScriptError> {
    match target {
        Value::Host(obj) => return call_host_method(ctx, obj, name, args),

        Value::Map(entries) => {
            let callable = entries.borrow().get(name).cloned();
            if let Some(v @ (Value::Function(_) | Value::Native(_))) = callable {
                return invoke_value(ctx, &v, args, name);
            }
            // A plain map standing in for a host value: coerce through the
            // first registered class that can build itself from a map and
            // answers this method, then dispatch again.
            let host = ctx.host().clone();
            for class in host.classes() {
                if !class.has_method(name) {
                    continue;
                }
                if let Some(from_map) = class.from_map() {
                    debug!("retrying '{}' after coercing a map to {}", name, class.name);
                    let coerced = from_map(&entries.borrow())?;
                    return call_host_method(ctx, &coerced, name, args);
                }
            }
        }

        Value::Function(_) | Value::Native(_) if name == "apply" => {
            // fn-value convenience: `f.apply([a, b])`
            let list = match args.get(0) {
                Some(Value::List(l)) => l.borrow().clone(),
                _ => args.to_vec(),
            };
            return invoke_value(ctx, target, &list, name);
        }

        _ => {}
    }

    // Only names in the common-method table enter the fallback at all;
    // anything else is a straight resolution failure.
    if common_ops::is_common_method(name) {
        if let Some(result) = common_ops::call_common(target, name, args) {
            return result;
        }
    }
    Err(ScriptError::MethodNotFound {
        target_type: target.type_name(),
        name: name.to_string(),
    })
}

/// Host-object dispatch: invoke capability first, then the overload table.
pub fn call_host_method(
    ctx: &mut EvalContext,
    obj: &Rc<dyn HostObject>,
    name: &str,
    args: &[Value],
) -> Result<Value, ScriptError> {
    let class = obj.class();
    if let Some(invoker) = class.invoker() {
        if let Some(result) = invoker(ctx, obj, name, args) {
            return result.map_err(|source| wrap_invocation(name.to_string(), source));
        }
    }
    if let Some(overload) = class.find_method(name, args) {
        return overload
            .call(ctx, obj, args)
            .map_err(|source| wrap_invocation(name.to_string(), source));
    }
    // Map arguments may stand in for host values the same way a map
    // receiver does: coerce them through a registered class's map
    // constructor and score the overloads again.
    if class.has_method(name) && args.iter().any(|a| matches!(a, Value::Map(_))) {
        if let Some(coerced) = coerce_map_args(ctx, args) {
            if let Some(overload) = class.find_method(name, &coerced) {
                debug!("'{}' on {} matched after map-argument coercion", name, obj.type_name());
                return overload
                    .call(ctx, obj, &coerced)
                    .map_err(|source| wrap_invocation(name.to_string(), source));
            }
        }
    }
    debug!("no overload of '{}' matched on {}", name, obj.type_name());
    Err(ScriptError::MethodNotFound {
        target_type: obj.type_name().to_string(),
        name: name.to_string(),
    })
}

/// Rebuild an argument list with every map argument replaced by a host
/// object, using the first registered class whose map constructor accepts
/// it. `None` when no argument could be converted.
fn coerce_map_args(ctx: &EvalContext, args: &[Value]) -> Option<Vec<Value>> {
    let host = ctx.host().clone();
    let mut out = Vec::with_capacity(args.len());
    let mut changed = false;
    for arg in args {
        let entries = match arg {
            Value::Map(m) => m.borrow().clone(),
            other => {
                out.push(other.clone());
                continue;
            }
        };
        let mut replacement = None;
        for class in host.classes() {
            if let Some(from_map) = class.from_map() {
                if let Ok(coerced) = from_map(&entries) {
                    replacement = Some(Value::Host(coerced));
                    changed = true;
                    break;
                }
            }
        }
        out.push(replacement.unwrap_or_else(|| arg.clone()));
    }
    if changed {
        Some(out)
    } else {
        None
    }
}

/// Failures inside host callables surface as catchable invocation errors;
/// a script-level throw crossing a host boundary stays recoverable.
fn wrap_invocation(method: String, source: ScriptError) -> ScriptError {
    ScriptError::InvocationTarget {
        method,
        source: Box::new(source),
    }
}
