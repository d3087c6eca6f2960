//! Runtime error taxonomy.
//!
//! Two of these are catchable by a script-level `try`: `UserThrow` and
//! `InvocationTarget`. Everything else is a defect in the tree or the host
//! wiring and aborts evaluation.

use thiserror::Error;

use crate::runner::ds::value::Value;

/// How far a catch handler unwraps nested invocation wrappers before giving
/// up and binding the outermost message instead.
const CATCH_UNWRAP_DEPTH: usize = 8;

#[derive(Debug, Error)]
pub enum ScriptError {
    /// An identifier read that no frame in the stack can satisfy.
    #[error("'{0}' is not defined")]
    UnresolvedReference(String),

    /// Non-optional property access that every resolution stage declined.
    #[error("no property '{name}' on {target_type}")]
    PropertyResolution { target_type: String, name: String },

    #[error("no method '{name}' on {target_type}")]
    MethodNotFound { target_type: String, name: String },

    /// `throw <value>` from script code.
    #[error("script threw: {0}")]
    UserThrow(Value),

    /// A host-side callable failed while servicing a script call. The
    /// original failure rides along as the source.
    #[error("call to '{method}' failed")]
    InvocationTarget {
        method: String,
        #[source]
        source: Box<ScriptError>,
    },

    /// Malformed tree shape: stray break/continue at the top level, an
    /// export outside a module, and the like.
    #[error("{0}")]
    Structural(String),

    #[error("{0}")]
    Type(String),

    #[error("import of '{path}' failed: {detail}")]
    Import { path: String, detail: String },

    /// Raised by host callables that want a free-form failure.
    #[error("{0}")]
    Host(String),
}

impl ScriptError {
    /// Whether a script-level `try` may intercept this error.
    pub fn is_catchable(&self) -> bool {
        matches!(
            self,
            ScriptError::UserThrow(_) | ScriptError::InvocationTarget { .. }
        )
    }

    /// The value a catch clause binds for this error.
    ///
    /// Invocation wrappers are peeled off looking for the user's thrown
    /// payload; past the depth limit (or when the innermost cause is not a
    /// user throw) the handler gets the message string instead.
    pub fn catch_payload(&self) -> Value {
        let mut err = self;
        for _ in 0..CATCH_UNWRAP_DEPTH {
            match err {
                ScriptError::UserThrow(v) => return v.clone(),
                ScriptError::InvocationTarget { source, .. } => err = source,
                _ => break,
            }
        }
        Value::Str(err.to_string())
    }
}
