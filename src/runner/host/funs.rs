//! Default global function table.
//!
//! Hosts get this table for free from `HostEnv::new` and may override any
//! entry by re-registering the name.

use std::collections::HashMap;
use std::rc::Rc;

use uuid::Uuid;

use crate::runner::ds::error::ScriptError;
use crate::runner::ds::value::{NativeFunction, Value};

pub fn default_funs() -> HashMap<String, Rc<NativeFunction>> {
    let mut table: HashMap<String, Rc<NativeFunction>> = HashMap::new();

    table.insert(
        "iif".to_string(),
        NativeFunction::new("iif", |_ctx, args| {
            let cond = args.get(0).map(Value::truthy).unwrap_or(false);
            let pick = if cond { args.get(1) } else { args.get(2) };
            Ok(pick.cloned().unwrap_or(Value::Absent))
        }),
    );

    table.insert(
        "typeOf".to_string(),
        NativeFunction::new("typeOf", |_ctx, args| {
            let v = args.get(0).cloned().unwrap_or(Value::Absent);
            Ok(Value::Str(v.type_name()))
        }),
    );

    table.insert(
        "len".to_string(),
        NativeFunction::new("len", |_ctx, args| match args.get(0) {
            Some(Value::Str(s)) => Ok(Value::Int(s.chars().count() as i64)),
            Some(Value::List(l)) => Ok(Value::Int(l.borrow().len() as i64)),
            Some(Value::Map(m)) => Ok(Value::Int(m.borrow().len() as i64)),
            Some(other) => Err(ScriptError::Type(format!(
                "len() takes a string, list or map, got {}",
                other.type_name()
            ))),
            None => Err(ScriptError::Type("len() takes one argument".to_string())),
        }),
    );

    table.insert(
        "uuid".to_string(),
        NativeFunction::new("uuid", |_ctx, _args| {
            Ok(Value::Str(Uuid::new_v4().to_string()))
        }),
    );

    table.insert(
        "print".to_string(),
        NativeFunction::new("print", |_ctx, args| {
            let line = args
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            log::info!(target: "rill::script", "{}", line);
            Ok(Value::Absent)
        }),
    );

    table.insert(
        "str".to_string(),
        NativeFunction::new("str", |_ctx, args| {
            Ok(Value::Str(
                args.get(0).cloned().unwrap_or(Value::Absent).to_string(),
            ))
        }),
    );

    table
}
