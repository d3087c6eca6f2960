//! Convenience constructors for assembling expression trees.
//!
//! Hosts that generate trees programmatically (and the test suite) use
//! these instead of spelling out every `Box`.

use std::rc::Rc;

use super::{
    AssignTarget, BinaryOp, CatchClause, DeclKind, Expr, ExportExpr, ImportExpr, Literal,
    LogicalOp, ParamPattern, SwitchCase, UnaryOp,
};

pub fn null() -> Expr {
    Expr::Literal(Literal::Null)
}

pub fn boolean(b: bool) -> Expr {
    Expr::Literal(Literal::Bool(b))
}

pub fn int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

pub fn float(f: f64) -> Expr {
    Expr::Literal(Literal::Float(f))
}

pub fn str(s: impl Into<String>) -> Expr {
    Expr::Literal(Literal::Str(s.into()))
}

pub fn ident(name: impl Into<String>) -> Expr {
    Expr::Identifier(name.into())
}

pub fn list(items: Vec<Expr>) -> Expr {
    Expr::ListLit(items)
}

pub fn map(entries: Vec<(&str, Expr)>) -> Expr {
    Expr::MapLit(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::Unary {
        op,
        operand: Box::new(operand),
    }
}

pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn logical(op: LogicalOp, left: Expr, right: Expr) -> Expr {
    Expr::Logical {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn conditional(test: Expr, consequent: Expr, alternate: Expr) -> Expr {
    Expr::Conditional {
        test: Box::new(test),
        consequent: Box::new(consequent),
        alternate: Box::new(alternate),
    }
}

pub fn assign(name: impl Into<String>, value: Expr) -> Expr {
    Expr::Assign {
        target: AssignTarget::Name(name.into()),
        value: Box::new(value),
    }
}

pub fn assign_member(object: Expr, property: impl Into<String>, value: Expr) -> Expr {
    Expr::Assign {
        target: AssignTarget::Member {
            object: Box::new(object),
            property: property.into(),
        },
        value: Box::new(value),
    }
}

pub fn assign_index(object: Expr, index: Expr, value: Expr) -> Expr {
    Expr::Assign {
        target: AssignTarget::Index {
            object: Box::new(object),
            index: Box::new(index),
        },
        value: Box::new(value),
    }
}

pub fn let_decl(name: impl Into<String>, init: Expr) -> Expr {
    Expr::Declare {
        kind: DeclKind::Let,
        name: name.into(),
        init: Some(Box::new(init)),
    }
}

pub fn var_decl(name: impl Into<String>, init: Expr) -> Expr {
    Expr::Declare {
        kind: DeclKind::Var,
        name: name.into(),
        init: Some(Box::new(init)),
    }
}

pub fn block(body: Vec<Expr>) -> Expr {
    Expr::Block(body)
}

pub fn if_expr(test: Expr, consequent: Expr) -> Expr {
    Expr::If {
        test: Box::new(test),
        consequent: Box::new(consequent),
        alternate: None,
    }
}

pub fn if_else(test: Expr, consequent: Expr, alternate: Expr) -> Expr {
    Expr::If {
        test: Box::new(test),
        consequent: Box::new(consequent),
        alternate: Some(Box::new(alternate)),
    }
}

pub fn while_loop(test: Expr, body: Expr) -> Expr {
    Expr::While {
        test: Box::new(test),
        body: Box::new(body),
    }
}

pub fn for_loop(init: Expr, test: Expr, update: Expr, body: Expr) -> Expr {
    Expr::For {
        init: Some(Box::new(init)),
        test: Some(Box::new(test)),
        update: Some(Box::new(update)),
        body: Box::new(body),
    }
}

pub fn for_in(name: impl Into<String>, iterable: Expr, body: Expr) -> Expr {
    Expr::ForIn {
        name: name.into(),
        iterable: Box::new(iterable),
        body: Box::new(body),
    }
}

pub fn switch(discriminant: Expr, cases: Vec<SwitchCase>) -> Expr {
    Expr::Switch {
        discriminant: Box::new(discriminant),
        cases,
    }
}

pub fn case(test: Expr, body: Vec<Expr>) -> SwitchCase {
    SwitchCase {
        test: Some(test),
        body,
    }
}

pub fn default_case(body: Vec<Expr>) -> SwitchCase {
    SwitchCase { test: None, body }
}

pub fn ret(value: Expr) -> Expr {
    Expr::Return(Some(Box::new(value)))
}

pub fn ret_empty() -> Expr {
    Expr::Return(None)
}

pub fn function(
    name: Option<&str>,
    params: Vec<ParamPattern>,
    body: Expr,
) -> Expr {
    Expr::FunctionDef {
        name: name.map(|n| n.to_string()),
        params,
        body: Rc::new(body),
    }
}

pub fn param(name: impl Into<String>) -> ParamPattern {
    ParamPattern::Name(name.into())
}

pub fn destructure(names: Vec<&str>) -> ParamPattern {
    ParamPattern::Destructure(names.iter().map(|n| n.to_string()).collect())
}

pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call {
        callee: Box::new(callee),
        args,
    }
}

pub fn call_name(name: impl Into<String>, args: Vec<Expr>) -> Expr {
    call(ident(name), args)
}

pub fn member(object: Expr, property: impl Into<String>) -> Expr {
    Expr::Member {
        object: Box::new(object),
        property: property.into(),
        optional: false,
    }
}

pub fn opt_member(object: Expr, property: impl Into<String>) -> Expr {
    Expr::Member {
        object: Box::new(object),
        property: property.into(),
        optional: true,
    }
}

pub fn index(object: Expr, idx: Expr) -> Expr {
    Expr::Index {
        object: Box::new(object),
        index: Box::new(idx),
        optional: false,
    }
}

pub fn method_call(object: Expr, method: impl Into<String>, args: Vec<Expr>) -> Expr {
    call(member(object, method), args)
}

pub fn opt_method_call(object: Expr, method: impl Into<String>, args: Vec<Expr>) -> Expr {
    call(opt_member(object, method), args)
}

pub fn throw(value: Expr) -> Expr {
    Expr::Throw(Box::new(value))
}

pub fn try_catch(block: Expr, param: impl Into<String>, handler: Expr) -> Expr {
    Expr::Try {
        block: Box::new(block),
        handler: Some(CatchClause {
            param: param.into(),
            body: Box::new(handler),
        }),
        finalizer: None,
    }
}

pub fn try_finally(block: Expr, finalizer: Expr) -> Expr {
    Expr::Try {
        block: Box::new(block),
        handler: None,
        finalizer: Some(Box::new(finalizer)),
    }
}

pub fn try_catch_finally(
    block: Expr,
    param: impl Into<String>,
    handler: Expr,
    finalizer: Expr,
) -> Expr {
    Expr::Try {
        block: Box::new(block),
        handler: Some(CatchClause {
            param: param.into(),
            body: Box::new(handler),
        }),
        finalizer: Some(Box::new(finalizer)),
    }
}

pub fn import(node: ImportExpr) -> Expr {
    Expr::Import(node)
}

pub fn export(node: ExportExpr) -> Expr {
    Expr::Export(node)
}
