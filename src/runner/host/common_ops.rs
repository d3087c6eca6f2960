//! Fallback convenience operations on strings, lists and maps.
//!
//! These answer after every host-specific resolution stage has declined,
//! so a host class can shadow any of them.

use std::collections::HashSet;

use crate::runner::ds::error::ScriptError;
use crate::runner::ds::value::Value;

lazy_static! {
    static ref COMMON_METHODS: HashSet<&'static str> = [
        "len", "upper", "lower", "trim", "contains", "indexOf", "substring", "startsWith",
        "endsWith", "replace", "split", "push", "pop", "join", "keys", "values", "has", "get",
        "put", "remove",
    ]
    .iter()
    .copied()
    .collect();
}

pub fn is_common_method(name: &str) -> bool {
    COMMON_METHODS.contains(name)
}

/// Property names answered for plain values when nothing else resolves.
pub fn common_property(target: &Value, name: &str) -> Option<Value> {
    match (target, name) {
        (Value::Str(s), "length") => Some(Value::Int(s.chars().count() as i64)),
        (Value::List(l), "length") => Some(Value::Int(l.borrow().len() as i64)),
        (Value::Map(m), "length") | (Value::Map(m), "size") => {
            Some(Value::Int(m.borrow().len() as i64))
        }
        _ => None,
    }
}

/// Dispatch a fallback method. `None` means the name/receiver pair is not a
/// common operation and the caller should report resolution failure.
pub fn call_common(target: &Value, name: &str, args: &[Value]) -> Option<Result<Value, ScriptError>> {
    match target {
        Value::Str(s) => string_op(s, name, args),
        Value::List(_) => list_op(target, name, args),
        Value::Map(_) => map_op(target, name, args),
        _ => None,
    }
}

fn want_str(args: &[Value], i: usize, op: &str) -> Result<String, ScriptError> {
    match args.get(i) {
        Some(Value::Str(s)) => Ok(s.clone()),
        other => Err(ScriptError::Type(format!(
            "{}() expects a string argument, got {}",
            op,
            other.map(|v| v.type_name()).unwrap_or_else(|| "nothing".to_string())
        ))),
    }
}

fn want_int(args: &[Value], i: usize, op: &str) -> Result<i64, ScriptError> {
    match args.get(i).and_then(Value::as_int) {
        Some(n) => Ok(n),
        None => Err(ScriptError::Type(format!("{}() expects an int argument", op))),
    }
}

fn string_op(s: &str, name: &str, args: &[Value]) -> Option<Result<Value, ScriptError>> {
    let out = match name {
        "len" => Ok(Value::Int(s.chars().count() as i64)),
        "upper" => Ok(Value::Str(s.to_uppercase())),
        "lower" => Ok(Value::Str(s.to_lowercase())),
        "trim" => Ok(Value::Str(s.trim().to_string())),
        "contains" => want_str(args, 0, "contains").map(|needle| Value::Bool(s.contains(&needle))),
        "startsWith" => {
            want_str(args, 0, "startsWith").map(|p| Value::Bool(s.starts_with(&p)))
        }
        "endsWith" => want_str(args, 0, "endsWith").map(|p| Value::Bool(s.ends_with(&p))),
        "indexOf" => want_str(args, 0, "indexOf").map(|needle| {
            match s.find(&needle) {
                Some(byte_pos) => Value::Int(s[..byte_pos].chars().count() as i64),
                None => Value::Int(-1),
            }
        }),
        "substring" => (|| {
            let chars: Vec<char> = s.chars().collect();
            let start = want_int(args, 0, "substring")?.max(0) as usize;
            let end = match args.get(1) {
                Some(v) => match v.as_int() {
                    Some(n) => n.max(0) as usize,
                    None => {
                        return Err(ScriptError::Type(
                            "substring() expects int bounds".to_string(),
                        ))
                    }
                },
                None => chars.len(),
            };
            let start = start.min(chars.len());
            let end = end.clamp(start, chars.len());
            Ok(Value::Str(chars[start..end].iter().collect()))
        })(),
        "replace" => (|| {
            let from = want_str(args, 0, "replace")?;
            let to = want_str(args, 1, "replace")?;
            Ok(Value::Str(s.replace(&from, &to)))
        })(),
        "split" => want_str(args, 0, "split").map(|sep| {
            Value::list(
                s.split(sep.as_str())
                    .map(|part| Value::Str(part.to_string()))
                    .collect(),
            )
        }),
        _ => return None,
    };
    Some(out)
}

fn list_op(target: &Value, name: &str, args: &[Value]) -> Option<Result<Value, ScriptError>> {
    let items = match target {
        Value::List(l) => l,
        _ => return None,
    };
    let out = match name {
        "len" => Ok(Value::Int(items.borrow().len() as i64)),
        "push" => {
            let v = args.get(0).cloned().unwrap_or(Value::Absent);
            items.borrow_mut().push(v);
            Ok(target.clone())
        }
        "pop" => Ok(items.borrow_mut().pop().unwrap_or(Value::Absent)),
        "contains" => {
            let needle = args.get(0).cloned().unwrap_or(Value::Absent);
            Ok(Value::Bool(items.borrow().iter().any(|v| *v == needle)))
        }
        "indexOf" => {
            let needle = args.get(0).cloned().unwrap_or(Value::Absent);
            Ok(Value::Int(
                items
                    .borrow()
                    .iter()
                    .position(|v| *v == needle)
                    .map(|i| i as i64)
                    .unwrap_or(-1),
            ))
        }
        "join" => want_str(args, 0, "join").map(|sep| {
            Value::Str(
                items
                    .borrow()
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(&sep),
            )
        }),
        _ => return None,
    };
    Some(out)
}

fn map_op(target: &Value, name: &str, args: &[Value]) -> Option<Result<Value, ScriptError>> {
    let entries = match target {
        Value::Map(m) => m,
        _ => return None,
    };
    let out = match name {
        "len" => Ok(Value::Int(entries.borrow().len() as i64)),
        "keys" => {
            let mut keys: Vec<String> = entries.borrow().keys().cloned().collect();
            keys.sort();
            Ok(Value::list(keys.into_iter().map(Value::Str).collect()))
        }
        "values" => {
            let map = entries.borrow();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            Ok(Value::list(
                keys.into_iter().filter_map(|k| map.get(k).cloned()).collect(),
            ))
        }
        "has" => want_str(args, 0, "has").map(|k| Value::Bool(entries.borrow().contains_key(&k))),
        "get" => want_str(args, 0, "get")
            .map(|k| entries.borrow().get(&k).cloned().unwrap_or(Value::Absent)),
        "put" => (|| {
            let k = want_str(args, 0, "put")?;
            let v = args.get(1).cloned().unwrap_or(Value::Absent);
            entries.borrow_mut().insert(k, v);
            Ok(target.clone())
        })(),
        "remove" => want_str(args, 0, "remove")
            .map(|k| entries.borrow_mut().remove(&k).unwrap_or(Value::Absent)),
        _ => return None,
    };
    Some(out)
}
