//! rill is an embeddable, dynamically-typed expression runtime. Hosts hand
//! it a tree of [`ast::Expr`] nodes (built by an upstream parser or
//! assembled directly through [`ast::build`]) and get back a value.
//!
//! The interesting parts live in the scope model: functions capture a
//! shallow snapshot of the frame stack at definition time, so closures keep
//! live, shared access to the variables they could see, while `let` loop
//! headers mint a fresh cell per iteration. `break`/`continue`/`return`
//! travel as completion sentinels rather than errors, and member/method
//! access resolves dynamically against maps, lists, strings and
//! host-registered object classes.
//!
//! ```
//! use std::collections::HashMap;
//! use std::rc::Rc;
//!
//! use rill::ast::{build, BinaryOp};
//! use rill::{evaluate, HostEnv, Value};
//!
//! let tree = build::block(vec![
//!     build::let_decl("x", build::int(2)),
//!     build::binary(BinaryOp::Add, build::ident("x"), build::int(3)),
//! ]);
//! let out = evaluate(&tree, HashMap::new(), Rc::new(HostEnv::new())).unwrap();
//! assert_eq!(out, Value::Int(5));
//! ```
//!
//! Hosts extend the runtime through [`HostEnv`]: a global function table,
//! an object registry reachable via `import '@name'`, static surfaces,
//! host classes with accessor/method tables, and a module resolver for
//! script imports.

#[macro_use]
extern crate lazy_static;

pub mod ast;
pub mod runner;

pub use crate::runner::ds::context::EvalContext;
pub use crate::runner::ds::error::ScriptError;
pub use crate::runner::ds::function::FunctionValue;
pub use crate::runner::ds::value::{NativeFunction, TypeTag, Value};
pub use crate::runner::eval::{evaluate, evaluate_in, evaluate_module, Completion};
pub use crate::runner::host::{HostClass, HostEnv, HostObject, ModuleResolver};
