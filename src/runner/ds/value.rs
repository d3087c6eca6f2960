//! Runtime values.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::runner::ds::context::EvalContext;
use crate::runner::ds::error::ScriptError;
use crate::runner::ds::function::FunctionValue;
use crate::runner::host::HostObject;

/// A dynamically-typed runtime value.
///
/// `Absent` is the absence marker: the value of a declared-but-unassigned
/// binding, a missing argument, or a short-circuited optional chain. It is
/// distinct from `Null`, which is a value a script can deliberately produce.
pub enum Value {
    Absent,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<HashMap<String, Value>>>),
    Function(Rc<FunctionValue>),
    /// A host-provided callable (registry method binding, static surface
    /// entry, or a callable placed into a map by the host).
    Native(Rc<NativeFunction>),
    Host(Rc<dyn HostObject>),
}

/// Best-effort type tag reported by `Expr::static_type` and used in
/// diagnostics. Not a checked type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Absent,
    Null,
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
    Function,
    Host,
    Unknown,
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Absent => "absent",
            TypeTag::Null => "null",
            TypeTag::Bool => "bool",
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::Str => "string",
            TypeTag::List => "list",
            TypeTag::Map => "map",
            TypeTag::Function => "function",
            TypeTag::Host => "host object",
            TypeTag::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// A callable implemented by the host rather than by script code.
pub struct NativeFunction {
    pub name: String,
    run: Box<dyn Fn(&mut EvalContext, &[Value]) -> Result<Value, ScriptError>>,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<String>,
        run: impl Fn(&mut EvalContext, &[Value]) -> Result<Value, ScriptError> + 'static,
    ) -> Rc<Self> {
        Rc::new(NativeFunction {
            name: name.into(),
            run: Box::new(run),
        })
    }

    pub fn call(&self, ctx: &mut EvalContext, args: &[Value]) -> Result<Value, ScriptError> {
        (self.run)(ctx, args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

impl Value {
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn map(entries: HashMap<String, Value>) -> Value {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    pub fn str(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Absent => TypeTag::Absent,
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::Str(_) => TypeTag::Str,
            Value::List(_) => TypeTag::List,
            Value::Map(_) => TypeTag::Map,
            Value::Function(_) | Value::Native(_) => TypeTag::Function,
            Value::Host(_) => TypeTag::Host,
        }
    }

    /// Name reported in "not found on ..." diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Value::Host(h) => h.type_name().to_string(),
            other => other.type_tag().to_string(),
        }
    }

    /// True for both the absence marker and user-level null.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Absent | Value::Null)
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Absent | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Value::Absent => Value::Absent,
            Value::Null => Value::Null,
            Value::Bool(b) => Value::Bool(*b),
            Value::Int(n) => Value::Int(*n),
            Value::Float(f) => Value::Float(*f),
            Value::Str(s) => Value::Str(s.clone()),
            Value::List(l) => Value::List(l.clone()),
            Value::Map(m) => Value::Map(m.clone()),
            Value::Function(f) => Value::Function(f.clone()),
            Value::Native(f) => Value::Native(f.clone()),
            Value::Host(h) => Value::Host(h.clone()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Absent, Value::Absent) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            // Mixed numerics compare by value, matching `==` in scripts.
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.id() == b.id(),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Host(a), Value::Host(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => write!(f, ""),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(l) => {
                let items = l.borrow();
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                let entries = m.borrow();
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Function(func) => match &func.name {
                Some(name) => write!(f, "function {}", name),
                None => write!(f, "function"),
            },
            Value::Native(func) => write!(f, "native {}", func.name),
            Value::Host(h) => write!(f, "<{}>", h.type_name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => write!(f, "Value::Absent"),
            Value::Null => write!(f, "Value::Null"),
            Value::Bool(b) => write!(f, "Value::Bool({})", b),
            Value::Int(n) => write!(f, "Value::Int({})", n),
            Value::Float(v) => write!(f, "Value::Float({})", v),
            Value::Str(s) => write!(f, "Value::Str({:?})", s),
            Value::List(l) => write!(f, "Value::List({:?})", l.borrow()),
            Value::Map(m) => write!(f, "Value::Map({:?})", m.borrow()),
            Value::Function(func) => write!(f, "Value::Function({:?})", func.name),
            Value::Native(func) => write!(f, "Value::Native({})", func.name),
            Value::Host(h) => write!(f, "Value::Host({})", h.type_name()),
        }
    }
}
