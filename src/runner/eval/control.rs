//! Blocks, branches, loops, switch and try. This is where sentinels get
//! consumed.

use crate::ast::{DeclKind, Expr, SwitchCase};
use crate::runner::ds::context::EvalContext;
use crate::runner::ds::error::ScriptError;
use crate::runner::ds::value::Value;
use crate::runner::eval::{operand, Completion, EvalResult};

pub fn evaluate(expr: &Expr, ctx: &mut EvalContext) -> EvalResult {
    match expr {
        Expr::Block(body) => ctx.scoped(|ctx| eval_sequence(body, ctx)),

        Expr::If {
            test,
            consequent,
            alternate,
        } => {
            if operand!(test.evaluate(ctx)).truthy() {
                consequent.evaluate(ctx)
            } else {
                match alternate {
                    Some(alternate) => alternate.evaluate(ctx),
                    None => Ok(Completion::Normal(Value::Absent)),
                }
            }
        }

        Expr::While { test, body } => {
            loop {
                if !operand!(test.evaluate(ctx)).truthy() {
                    break;
                }
                match ctx.scoped(|ctx| body.evaluate(ctx))? {
                    Completion::Break => break,
                    Completion::Continue | Completion::Normal(_) => {}
                    ret @ Completion::Return(_) => return Ok(ret),
                }
            }
            Ok(Completion::Normal(Value::Absent))
        }

        Expr::For {
            init,
            test,
            update,
            body,
        } => ctx.scoped(|ctx| eval_for(ctx, init, test, update, body)),

        Expr::ForIn {
            name,
            iterable,
            body,
        } => eval_for_in(ctx, name, iterable, body),

        Expr::Switch {
            discriminant,
            cases,
        } => eval_switch(ctx, discriminant, cases),

        Expr::Break => Ok(Completion::Break),
        Expr::Continue => Ok(Completion::Continue),

        Expr::Return(operand) => {
            let v = match operand {
                Some(operand) => operand!(operand.evaluate(ctx)),
                None => Value::Null,
            };
            Ok(Completion::Return(v))
        }

        Expr::Try {
            block,
            handler,
            finalizer,
        } => eval_try(ctx, block, handler.as_ref(), finalizer.as_deref()),

        other => Err(ScriptError::Structural(format!(
            "node not handled by the control evaluator: {:?}",
            other
        ))),
    }
}

/// Run expressions in order; any sentinel short-circuits the rest. The
/// sequence's value is the last normally-completed expression's value.
fn eval_sequence(body: &[Expr], ctx: &mut EvalContext) -> EvalResult {
    let mut last = Value::Absent;
    for expr in body {
        match expr.evaluate(ctx)? {
            Completion::Normal(v) => last = v,
            sentinel => return Ok(sentinel),
        }
    }
    Ok(Completion::Normal(last))
}

fn eval_for(
    ctx: &mut EvalContext,
    init: &Option<Box<Expr>>,
    test: &Option<Box<Expr>>,
    update: &Option<Box<Expr>>,
    body: &Expr,
) -> EvalResult {
    // A `let` header gives the body a fresh cell each iteration; closures
    // formed in iteration N see iteration N's value forever. A `var` header
    // shares one cell across all iterations.
    let let_name = match init.as_deref() {
        Some(Expr::Declare {
            kind: DeclKind::Let,
            name,
            ..
        }) => Some(name.as_str()),
        _ => None,
    };
    if let Some(init) = init {
        operand!(init.evaluate(ctx));
    }
    loop {
        if let Some(test) = test {
            if !operand!(test.evaluate(ctx)).truthy() {
                break;
            }
        }
        let completion = match let_name {
            Some(name) => {
                let header_cell = match ctx.lookup(name) {
                    Some(cell) => cell,
                    None => ctx.declare(name, Value::Absent),
                };
                let current = header_cell.borrow().clone();
                ctx.scoped(|ctx| {
                    let iter_cell = ctx.declare(name, current);
                    let completion = body.evaluate(ctx);
                    // The body may have assigned the loop variable; fold
                    // that back into the header cell before the update runs.
                    *header_cell.borrow_mut() = iter_cell.borrow().clone();
                    completion
                })?
            }
            None => ctx.scoped(|ctx| body.evaluate(ctx))?,
        };
        match completion {
            Completion::Break => break,
            Completion::Continue | Completion::Normal(_) => {}
            ret @ Completion::Return(_) => return Ok(ret),
        }
        if let Some(update) = update {
            operand!(update.evaluate(ctx));
        }
    }
    Ok(Completion::Normal(Value::Absent))
}

fn eval_for_in(
    ctx: &mut EvalContext,
    name: &str,
    iterable: &Expr,
    body: &Expr,
) -> EvalResult {
    let source = operand!(iterable.evaluate(ctx));
    let items: Vec<Value> = match &source {
        Value::List(l) => l.borrow().clone(),
        Value::Map(m) => {
            let mut keys: Vec<String> = m.borrow().keys().cloned().collect();
            keys.sort();
            keys.into_iter().map(Value::Str).collect()
        }
        other => {
            return Err(ScriptError::Type(format!(
                "cannot iterate {}",
                other.type_name()
            )))
        }
    };
    for item in items {
        let completion = ctx.scoped(|ctx| {
            ctx.declare(name, item);
            body.evaluate(ctx)
        })?;
        match completion {
            Completion::Break => break,
            Completion::Continue | Completion::Normal(_) => {}
            ret @ Completion::Return(_) => return Ok(ret),
        }
    }
    Ok(Completion::Normal(Value::Absent))
}

fn eval_switch(ctx: &mut EvalContext, discriminant: &Expr, cases: &[SwitchCase]) -> EvalResult {
    let subject = operand!(discriminant.evaluate(ctx));
    ctx.scoped(|ctx| {
        let mut start = None;
        for (i, case) in cases.iter().enumerate() {
            if let Some(test) = &case.test {
                if operand!(test.evaluate(ctx)) == subject {
                    start = Some(i);
                    break;
                }
            }
        }
        if start.is_none() {
            start = cases.iter().position(|case| case.test.is_none());
        }
        let mut last = Value::Absent;
        if let Some(start) = start {
            // Fall through from the matched arm until a break.
            'arms: for case in &cases[start..] {
                for expr in &case.body {
                    match expr.evaluate(ctx)? {
                        Completion::Normal(v) => last = v,
                        Completion::Break => break 'arms,
                        sentinel => return Ok(sentinel),
                    }
                }
            }
        }
        Ok(Completion::Normal(last))
    })
}

fn eval_try(
    ctx: &mut EvalContext,
    block: &Expr,
    handler: Option<&crate::ast::CatchClause>,
    finalizer: Option<&Expr>,
) -> EvalResult {
    let mut outcome = ctx.scoped(|ctx| block.evaluate(ctx));
    if let Err(err) = &outcome {
        if err.is_catchable() {
            if let Some(clause) = handler {
                let payload = err.catch_payload();
                outcome = ctx.scoped(|ctx| {
                    ctx.declare(&clause.param, payload);
                    clause.body.evaluate(ctx)
                });
            }
        }
    }
    if let Some(finalizer) = finalizer {
        match ctx.scoped(|ctx| finalizer.evaluate(ctx))? {
            // The protected outcome stands unless the finalizer itself
            // completes abruptly.
            Completion::Normal(_) => {}
            abrupt => return Ok(abrupt),
        }
    }
    outcome
}
