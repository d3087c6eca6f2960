//! Expression-node vocabulary.
//!
//! The runtime never sees source text; an upstream parser (or the host
//! itself) hands it a tree of [`Expr`] nodes. Every node is immutable and
//! owns its children by value, so the same tree can be evaluated any number
//! of times against different contexts.

use std::rc::Rc;

pub mod build;

/// One node of an expression tree.
///
/// Nodes are evaluated through `Expr::evaluate` (defined in the runner so
/// the AST stays a plain data vocabulary) and report a best-effort
/// `Expr::static_type` used for diagnostics only.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Identifier(String),
    /// `[a, b, c]`
    ListLit(Vec<Expr>),
    /// `{k: v, ...}` — insertion order is not significant.
    MapLit(Vec<(String, Expr)>),

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `&&` / `||` with short-circuit evaluation.
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `test ? consequent : alternate`
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },

    /// Assignment to a name, member or index target.
    Assign {
        target: AssignTarget,
        value: Box<Expr>,
    },
    /// `let x = init;` / `var x = init;`
    ///
    /// Both forms create the binding in the innermost frame; the kind only
    /// changes per-iteration behavior when used as a `for` header.
    Declare {
        kind: DeclKind,
        name: String,
        init: Option<Box<Expr>>,
    },

    /// `{ ...; ... }` — introduces a scope frame.
    Block(Vec<Expr>),
    If {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Option<Box<Expr>>,
    },
    While {
        test: Box<Expr>,
        body: Box<Expr>,
    },
    /// Classic three-clause `for`. When `init` is a `Declare` with kind
    /// `Let`, the loop variable gets a fresh cell each iteration.
    For {
        init: Option<Box<Expr>>,
        test: Option<Box<Expr>>,
        update: Option<Box<Expr>>,
        body: Box<Expr>,
    },
    /// `for (x in xs)` — iterates list elements or map keys.
    ForIn {
        name: String,
        iterable: Box<Expr>,
        body: Box<Expr>,
    },
    Switch {
        discriminant: Box<Expr>,
        cases: Vec<SwitchCase>,
    },
    Break,
    Continue,
    Return(Option<Box<Expr>>),

    /// Function definition. Evaluating this node produces a function value
    /// capturing the current frame stack; a named definition also binds the
    /// name in the current scope.
    FunctionDef {
        name: Option<String>,
        params: Vec<ParamPattern>,
        body: Rc<Expr>,
    },
    /// `f(a, b)` / `obj.m(a)` / `obj?.m(a)` — method dispatch happens when
    /// the callee is a `Member` node.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `obj.name` / `obj?.name`
    Member {
        object: Box<Expr>,
        property: String,
        optional: bool,
    },
    /// `obj[index]` / `obj?.[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
    },

    Throw(Box<Expr>),
    Try {
        block: Box<Expr>,
        handler: Option<CatchClause>,
        finalizer: Option<Box<Expr>>,
    },

    Import(ImportExpr),
    Export(ExportExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeclKind {
    Let,
    Var,
}

/// Assignment target forms.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Name(String),
    Member {
        object: Box<Expr>,
        property: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
}

/// A declared function parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamPattern {
    /// Plain positional name.
    Name(String),
    /// `({a, b})` — binds the listed keys off the single corresponding
    /// argument.
    Destructure(Vec<String>),
}

/// One `case`/`default` arm of a switch.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` marks the default arm.
    pub test: Option<Expr>,
    pub body: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: String,
    pub body: Box<Expr>,
}

/// One `name` or `name as alias` entry of a selective import/export list.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingName {
    pub source: String,
    pub alias: Option<String>,
}

impl BindingName {
    pub fn plain(source: impl Into<String>) -> Self {
        BindingName {
            source: source.into(),
            alias: None,
        }
    }

    pub fn renamed(source: impl Into<String>, alias: impl Into<String>) -> Self {
        BindingName {
            source: source.into(),
            alias: Some(alias.into()),
        }
    }

    /// The name the binding lands under in the importing scope.
    pub fn bound_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.source)
    }
}

/// Import statement forms.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportExpr {
    /// `import X from 'path'` / `import {a, b as c} from 'path'`
    Script {
        path: String,
        /// Bare namespace binding, when present.
        binding: Option<String>,
        /// Selective bindings copied into the importing frame.
        names: Vec<BindingName>,
    },
    /// `import '@name'` — a host-registered singleton fetched through the
    /// object registry.
    HostObject {
        name: String,
        binding: Option<String>,
        names: Vec<BindingName>,
    },
    /// A fixed host surface of invocable names, bound without an instance.
    HostStatic {
        name: String,
        binding: Option<String>,
    },
}

/// Export statement forms.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportExpr {
    /// `export x` — exports an existing binding under its own name.
    Named(String),
    /// `export {x as y, z}`
    Renamed(Vec<BindingName>),
    /// `export let x = ...` / `export function f ...`
    Decl(Box<Expr>),
    /// `export default expr` — written under the reserved `"default"` key.
    Default(Box<Expr>),
}

/// Reserved key `export default` writes under.
pub const DEFAULT_EXPORT_KEY: &str = "default";
