//! Script modules: export maps, the per-graph module cache, and evaluation
//! of import/export nodes.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::debug;

use crate::ast::{BindingName, ExportExpr, Expr, ImportExpr, DEFAULT_EXPORT_KEY};
use crate::runner::ds::context::{EvalContext, ExportMap};
use crate::runner::ds::error::ScriptError;
use crate::runner::ds::value::{NativeFunction, Value};
use crate::runner::eval::{operand, Completion, EvalResult};
use crate::runner::host::host_property;

/// A resolved module namespace: the export map produced by evaluating the
/// module once.
#[derive(Clone)]
pub struct ImportUnit {
    pub exports: ExportMap,
}

impl ImportUnit {
    /// The namespace as a script value. Shares the underlying map, so two
    /// importers see the same entries.
    pub fn as_value(&self) -> Value {
        Value::Map(self.exports.clone())
    }
}

/// Path-keyed cache of evaluated modules. One graph per root context; every
/// module loaded through it (transitively included) shares the cache.
pub struct ModuleGraph {
    units: HashMap<String, ImportUnit>,
    loading: HashSet<String>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        ModuleGraph {
            units: HashMap::new(),
            loading: HashSet::new(),
        }
    }

    pub fn cached(&self, path: &str) -> Option<ImportUnit> {
        self.units.get(path).cloned()
    }
}

impl Default for ModuleGraph {
    fn default() -> Self {
        ModuleGraph::new()
    }
}

/// Resolve and evaluate a script module, at most once per path per graph.
pub fn load_script(ctx: &mut EvalContext, path: &str) -> Result<ImportUnit, ScriptError> {
    if let Some(unit) = ctx.modules().borrow().cached(path) {
        debug!("module cache hit for '{}'", path);
        return Ok(unit);
    }
    {
        let mut graph = ctx.modules().borrow_mut();
        if !graph.loading.insert(path.to_string()) {
            return Err(ScriptError::Import {
                path: path.to_string(),
                detail: "cyclic import".to_string(),
            });
        }
    }

    let outcome = evaluate_fresh(ctx, path);

    ctx.modules().borrow_mut().loading.remove(path);
    let unit = outcome?;
    ctx.modules()
        .borrow_mut()
        .units
        .insert(path.to_string(), unit.clone());
    Ok(unit)
}

fn evaluate_fresh(ctx: &mut EvalContext, path: &str) -> Result<ImportUnit, ScriptError> {
    let tree = match ctx.host().resolver() {
        Some(resolver) => resolver.resolve(path)?,
        None => {
            return Err(ScriptError::Import {
                path: path.to_string(),
                detail: "no module resolver installed".to_string(),
            })
        }
    };
    debug!("evaluating module '{}'", path);
    // Fresh root frame; host env and module graph are shared so nested
    // imports land in the same cache.
    let mut module_ctx =
        EvalContext::over_snapshot(Vec::new(), ctx.host().clone(), ctx.modules().clone());
    tree.evaluate(&mut module_ctx)?;
    let exports = module_ctx.exports();
    Ok(ImportUnit { exports })
}

pub fn eval_import(ctx: &mut EvalContext, node: &ImportExpr) -> Result<(), ScriptError> {
    match node {
        ImportExpr::Script { path, binding, names } => {
            let unit = load_script(ctx, path)?;
            if let Some(binding) = binding {
                ctx.declare(binding, unit.as_value());
            }
            for name in names {
                let value = unit
                    .exports
                    .borrow()
                    .get(&name.source)
                    .cloned()
                    .ok_or_else(|| ScriptError::Import {
                        path: path.clone(),
                        detail: format!("no export named '{}'", name.source),
                    })?;
                ctx.declare(name.bound_name(), value);
            }
            Ok(())
        }
        ImportExpr::HostObject { name, binding, names } => {
            let object = ctx
                .host()
                .object(name)
                .ok_or_else(|| ScriptError::Import {
                    path: name.clone(),
                    detail: "no such object in the host registry".to_string(),
                })?;
            if let Some(binding) = binding {
                ctx.declare(binding, object.clone());
            }
            for entry in names {
                let value = registry_member(&object, entry)?;
                ctx.declare(entry.bound_name(), value);
            }
            Ok(())
        }
        ImportExpr::HostStatic { name, binding } => {
            let host = ctx.host().clone();
            let surface = host.static_surface(name).ok_or_else(|| ScriptError::Import {
                path: name.clone(),
                detail: "no such static surface".to_string(),
            })?;
            match binding {
                Some(binding) => {
                    let map: HashMap<String, Value> = surface
                        .iter()
                        .map(|(k, f)| (k.clone(), Value::Native(f.clone())))
                        .collect();
                    ctx.declare(binding, Value::map(map));
                }
                None => {
                    for (k, f) in surface {
                        ctx.declare(k, Value::Native(f.clone()));
                    }
                }
            }
            Ok(())
        }
    }
}

/// A named member of a registry object: a property when the object has one,
/// otherwise a callable bound to the object's same-named method.
fn registry_member(object: &Value, entry: &BindingName) -> Result<Value, ScriptError> {
    match object {
        Value::Map(m) => m
            .borrow()
            .get(&entry.source)
            .cloned()
            .ok_or_else(|| ScriptError::Import {
                path: entry.source.clone(),
                detail: "registry object has no such member".to_string(),
            }),
        Value::Host(obj) => {
            if let Some(v) = host_property(obj, &entry.source) {
                return Ok(v);
            }
            if obj.class().has_method(&entry.source) {
                let bound = obj.clone();
                let method = entry.source.clone();
                let name = entry.source.clone();
                return Ok(Value::Native(NativeFunction::new(name, move |ctx, args| {
                    crate::runner::eval::call::call_host_method(ctx, &bound, &method, args)
                })));
            }
            Err(ScriptError::Import {
                path: entry.source.clone(),
                detail: format!("'{}' has no such member", obj.type_name()),
            })
        }
        other => Err(ScriptError::Import {
            path: entry.source.clone(),
            detail: format!("cannot import members from {}", other.type_name()),
        }),
    }
}

pub fn eval_export(ctx: &mut EvalContext, node: &ExportExpr) -> EvalResult {
    match node {
        ExportExpr::Named(name) => {
            let value = ctx
                .get_var(name)
                .ok_or_else(|| ScriptError::UnresolvedReference(name.clone()))?;
            ctx.exports().borrow_mut().insert(name.clone(), value);
        }
        ExportExpr::Renamed(names) => {
            for entry in names {
                let value = ctx
                    .get_var(&entry.source)
                    .ok_or_else(|| ScriptError::UnresolvedReference(entry.source.clone()))?;
                ctx.exports()
                    .borrow_mut()
                    .insert(entry.bound_name().to_string(), value);
            }
        }
        ExportExpr::Decl(inner) => {
            let name = match inner.as_ref() {
                Expr::Declare { name, .. } => name.clone(),
                Expr::FunctionDef { name: Some(name), .. } => name.clone(),
                _ => {
                    return Err(ScriptError::Structural(
                        "export declaration must name a binding".to_string(),
                    ))
                }
            };
            operand!(inner.evaluate(ctx));
            let value = ctx
                .get_var(&name)
                .ok_or_else(|| ScriptError::UnresolvedReference(name.clone()))?;
            ctx.exports().borrow_mut().insert(name, value);
        }
        ExportExpr::Default(inner) => {
            let value = operand!(inner.evaluate(ctx));
            ctx.exports()
                .borrow_mut()
                .insert(DEFAULT_EXPORT_KEY.to_string(), value);
        }
    }
    Ok(Completion::Normal(Value::Absent))
}
