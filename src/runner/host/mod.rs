//! Host integration surface.
//!
//! Everything a script can reach outside its own tree comes through here:
//! the global function table, the named object registry, static surfaces,
//! host classes (accessor/method tables for host-provided objects) and the
//! module resolver.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::Expr;
use crate::runner::ds::context::EvalContext;
use crate::runner::ds::error::ScriptError;
use crate::runner::ds::value::{NativeFunction, TypeTag, Value};

pub mod common_ops;
pub mod funs;

/// An opaque host value handed to scripts. Member and method access on it
/// routes through its [`HostClass`].
pub trait HostObject {
    fn type_name(&self) -> &str;
    fn class(&self) -> Rc<HostClass>;
    /// Downcast hook used by accessor and method closures.
    fn as_any(&self) -> &dyn Any;
}

pub type Accessor = Box<dyn Fn(&dyn HostObject) -> Value>;
pub type Mutator = Box<dyn Fn(&dyn HostObject, Value) -> Result<(), ScriptError>>;
pub type MethodFn =
    Box<dyn Fn(&mut EvalContext, &Rc<dyn HostObject>, &[Value]) -> Result<Value, ScriptError>>;
/// Takes over method dispatch entirely when it returns `Some`.
pub type Invoker = Box<
    dyn Fn(
        &mut EvalContext,
        &Rc<dyn HostObject>,
        &str,
        &[Value],
    ) -> Option<Result<Value, ScriptError>>,
>;
/// Answers property reads before the accessor table is consulted.
pub type Provider = Box<dyn Fn(&dyn HostObject, &str) -> Option<Value>>;
pub type FromMap = Box<dyn Fn(&HashMap<String, Value>) -> Result<Rc<dyn HostObject>, ScriptError>>;

/// One callable signature of a host method. Dispatch picks among same-name
/// overloads by scoring arguments against `params`.
pub struct MethodOverload {
    pub params: Vec<TypeTag>,
    run: MethodFn,
}

impl MethodOverload {
    pub fn call(
        &self,
        ctx: &mut EvalContext,
        target: &Rc<dyn HostObject>,
        args: &[Value],
    ) -> Result<Value, ScriptError> {
        (self.run)(ctx, target, args)
    }
}

/// The script-visible shape of one host type: named accessors, mutators,
/// method overloads and the optional capabilities (custom invoke, custom
/// property provider, map coercion).
pub struct HostClass {
    pub name: String,
    accessors: HashMap<String, Accessor>,
    mutators: HashMap<String, Mutator>,
    methods: HashMap<String, Vec<MethodOverload>>,
    invoker: Option<Invoker>,
    provider: Option<Provider>,
    from_map: Option<FromMap>,
}

impl HostClass {
    pub fn builder(name: impl Into<String>) -> HostClassBuilder {
        HostClassBuilder {
            inner: HostClass {
                name: name.into(),
                accessors: HashMap::new(),
                mutators: HashMap::new(),
                methods: HashMap::new(),
                invoker: None,
                provider: None,
                from_map: None,
            },
        }
    }

    pub fn read(&self, obj: &dyn HostObject, name: &str) -> Option<Value> {
        if let Some(provider) = &self.provider {
            if let Some(v) = provider(obj, name) {
                return Some(v);
            }
        }
        self.accessors.get(name).map(|get| get(obj))
    }

    pub fn write(&self, obj: &dyn HostObject, name: &str, value: Value) -> Result<bool, ScriptError> {
        match self.mutators.get(name) {
            Some(set) => {
                set(obj, value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn invoker(&self) -> Option<&Invoker> {
        self.invoker.as_ref()
    }

    pub fn from_map(&self) -> Option<&FromMap> {
        self.from_map.as_ref()
    }

    /// Highest-scoring arity-matching overload, first wins on ties.
    ///
    /// Per argument: exact tag = 2, assignable (int where float is wanted,
    /// or an `Unknown` slot) = 1, null/absent = 1; any unassignable
    /// argument disqualifies the overload.
    pub fn find_method(&self, name: &str, args: &[Value]) -> Option<&MethodOverload> {
        let overloads = self.methods.get(name)?;
        let mut best: Option<(u32, &MethodOverload)> = None;
        for overload in overloads {
            if overload.params.len() != args.len() {
                continue;
            }
            let mut total = 0u32;
            let mut viable = true;
            for (want, arg) in overload.params.iter().zip(args) {
                match score_arg(*want, arg) {
                    Some(s) => total += s,
                    None => {
                        viable = false;
                        break;
                    }
                }
            }
            if !viable {
                continue;
            }
            match best {
                Some((b, _)) if b >= total => {}
                _ => best = Some((total, overload)),
            }
        }
        best.map(|(_, overload)| overload)
    }
}

fn score_arg(want: TypeTag, arg: &Value) -> Option<u32> {
    if arg.is_nil() {
        return Some(1);
    }
    let tag = arg.type_tag();
    if tag == want {
        return Some(2);
    }
    match (want, tag) {
        (TypeTag::Unknown, _) => Some(1),
        (TypeTag::Float, TypeTag::Int) => Some(1),
        _ => None,
    }
}

pub struct HostClassBuilder {
    inner: HostClass,
}

impl HostClassBuilder {
    pub fn accessor(
        mut self,
        name: impl Into<String>,
        get: impl Fn(&dyn HostObject) -> Value + 'static,
    ) -> Self {
        self.inner.accessors.insert(name.into(), Box::new(get));
        self
    }

    pub fn mutator(
        mut self,
        name: impl Into<String>,
        set: impl Fn(&dyn HostObject, Value) -> Result<(), ScriptError> + 'static,
    ) -> Self {
        self.inner.mutators.insert(name.into(), Box::new(set));
        self
    }

    pub fn method(
        mut self,
        name: impl Into<String>,
        params: Vec<TypeTag>,
        run: impl Fn(&mut EvalContext, &Rc<dyn HostObject>, &[Value]) -> Result<Value, ScriptError>
            + 'static,
    ) -> Self {
        self.inner
            .methods
            .entry(name.into())
            .or_insert_with(Vec::new)
            .push(MethodOverload {
                params,
                run: Box::new(run),
            });
        self
    }

    pub fn invoker(
        mut self,
        f: impl Fn(
                &mut EvalContext,
                &Rc<dyn HostObject>,
                &str,
                &[Value],
            ) -> Option<Result<Value, ScriptError>>
            + 'static,
    ) -> Self {
        self.inner.invoker = Some(Box::new(f));
        self
    }

    pub fn provider(
        mut self,
        f: impl Fn(&dyn HostObject, &str) -> Option<Value> + 'static,
    ) -> Self {
        self.inner.provider = Some(Box::new(f));
        self
    }

    pub fn from_map(
        mut self,
        f: impl Fn(&HashMap<String, Value>) -> Result<Rc<dyn HostObject>, ScriptError> + 'static,
    ) -> Self {
        self.inner.from_map = Some(Box::new(f));
        self
    }

    pub fn build(self) -> Rc<HostClass> {
        Rc::new(self.inner)
    }
}

/// Property read through the class capabilities, with no fallback chain.
pub fn host_property(obj: &Rc<dyn HostObject>, name: &str) -> Option<Value> {
    obj.class().read(obj.as_ref(), name)
}

/// Supplies module trees for `import ... from 'path'`.
pub trait ModuleResolver {
    fn resolve(&self, path: &str) -> Result<Expr, ScriptError>;
}

/// Everything the host wires up before evaluation starts. Immutable once
/// wrapped in `Rc` and handed to a context.
pub struct HostEnv {
    funs: HashMap<String, Rc<NativeFunction>>,
    objects: HashMap<String, Value>,
    statics: HashMap<String, HashMap<String, Rc<NativeFunction>>>,
    classes: Vec<Rc<HostClass>>,
    resolver: Option<Box<dyn ModuleResolver>>,
}

impl HostEnv {
    /// A host environment preloaded with the default function table.
    pub fn new() -> Self {
        HostEnv {
            funs: funs::default_funs(),
            objects: HashMap::new(),
            statics: HashMap::new(),
            classes: Vec::new(),
            resolver: None,
        }
    }

    /// Register or override a global function.
    pub fn register_fun(&mut self, name: impl Into<String>, f: Rc<NativeFunction>) {
        self.funs.insert(name.into(), f);
    }

    pub fn fun(&self, name: &str) -> Option<Rc<NativeFunction>> {
        self.funs.get(name).cloned()
    }

    /// Register a named singleton reachable via `import '@name'`.
    pub fn register_object(&mut self, name: impl Into<String>, value: Value) {
        self.objects.insert(name.into(), value);
    }

    pub fn object(&self, name: &str) -> Option<Value> {
        self.objects.get(name).cloned()
    }

    /// Register a static surface: a fixed set of invocable names bound
    /// without an instance.
    pub fn register_static(
        &mut self,
        name: impl Into<String>,
        surface: HashMap<String, Rc<NativeFunction>>,
    ) {
        self.statics.insert(name.into(), surface);
    }

    pub fn static_surface(&self, name: &str) -> Option<&HashMap<String, Rc<NativeFunction>>> {
        self.statics.get(name)
    }

    /// Register a host class so map-coercion dispatch can find it.
    pub fn register_class(&mut self, class: Rc<HostClass>) {
        self.classes.push(class);
    }

    pub fn classes(&self) -> &[Rc<HostClass>] {
        &self.classes
    }

    pub fn set_resolver(&mut self, resolver: impl ModuleResolver + 'static) {
        self.resolver = Some(Box::new(resolver));
    }

    pub fn resolver(&self) -> Option<&dyn ModuleResolver> {
        self.resolver.as_deref()
    }
}

impl Default for HostEnv {
    fn default() -> Self {
        HostEnv::new()
    }
}
