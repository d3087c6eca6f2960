//! Literals, operators, assignment, declarations and function definition.

use std::collections::HashMap;

use crate::ast::{AssignTarget, BinaryOp, Expr, Literal, LogicalOp, UnaryOp};
use crate::runner::ds::context::EvalContext;
use crate::runner::ds::error::ScriptError;
use crate::runner::ds::function::FunctionValue;
use crate::runner::ds::value::Value;
use crate::runner::eval::{member, operand, Completion, EvalResult};

pub fn evaluate(expr: &Expr, ctx: &mut EvalContext) -> EvalResult {
    match expr {
        Expr::Literal(lit) => Ok(Completion::Normal(literal_value(lit))),

        Expr::Identifier(name) => match ctx.get_var(name) {
            Some(v) => Ok(Completion::Normal(v)),
            None => Err(ScriptError::UnresolvedReference(name.clone())),
        },

        Expr::ListLit(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(operand!(item.evaluate(ctx)));
            }
            Ok(Completion::Normal(Value::list(out)))
        }

        Expr::MapLit(entries) => {
            let mut out = HashMap::with_capacity(entries.len());
            for (key, value) in entries {
                out.insert(key.clone(), operand!(value.evaluate(ctx)));
            }
            Ok(Completion::Normal(Value::map(out)))
        }

        Expr::Unary { op, operand } => {
            let v = operand!(operand.evaluate(ctx));
            apply_unary(*op, v).map(Completion::Normal)
        }

        Expr::Binary { op, left, right } => {
            let l = operand!(left.evaluate(ctx));
            let r = operand!(right.evaluate(ctx));
            apply_binary(*op, l, r).map(Completion::Normal)
        }

        Expr::Logical { op, left, right } => {
            let l = operand!(left.evaluate(ctx));
            let short = match op {
                LogicalOp::And => !l.truthy(),
                LogicalOp::Or => l.truthy(),
            };
            if short {
                Ok(Completion::Normal(l))
            } else {
                Ok(Completion::Normal(operand!(right.evaluate(ctx))))
            }
        }

        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            if operand!(test.evaluate(ctx)).truthy() {
                consequent.evaluate(ctx)
            } else {
                alternate.evaluate(ctx)
            }
        }

        Expr::Assign { target, value } => {
            let v = operand!(value.evaluate(ctx));
            match target {
                AssignTarget::Name(name) => ctx.assign(name, v.clone()),
                AssignTarget::Member { object, property } => {
                    let base = operand!(object.evaluate(ctx));
                    member::write_property(&base, property, v.clone())?;
                }
                AssignTarget::Index { object, index } => {
                    let base = operand!(object.evaluate(ctx));
                    let idx = operand!(index.evaluate(ctx));
                    member::write_index(&base, &idx, v.clone())?;
                }
            }
            Ok(Completion::Normal(v))
        }

        Expr::Declare { name, init, .. } => {
            let v = match init {
                Some(init) => operand!(init.evaluate(ctx)),
                None => Value::Absent,
            };
            ctx.declare(name, v.clone());
            Ok(Completion::Normal(v))
        }

        Expr::FunctionDef { name, params, body } => {
            let func = FunctionValue::capture(name.clone(), params.clone(), body.clone(), ctx);
            let value = Value::Function(func);
            if let Some(name) = name {
                ctx.declare(name, value.clone());
            }
            Ok(Completion::Normal(value))
        }

        Expr::Throw(inner) => {
            let v = operand!(inner.evaluate(ctx));
            Err(ScriptError::UserThrow(v))
        }

        other => Err(ScriptError::Structural(format!(
            "node not handled by the expression evaluator: {:?}",
            other
        ))),
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(n) => Value::Int(*n),
        Literal::Float(f) => Value::Float(*f),
        Literal::Str(s) => Value::Str(s.clone()),
    }
}

fn apply_unary(op: UnaryOp, v: Value) -> Result<Value, ScriptError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!v.truthy())),
        UnaryOp::Neg => match v {
            Value::Int(n) => Ok(Value::Int(-n)),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(ScriptError::Type(format!(
                "cannot negate {}",
                other.type_name()
            ))),
        },
    }
}

fn apply_binary(op: BinaryOp, l: Value, r: Value) -> Result<Value, ScriptError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(l == r)),
        BinaryOp::Ne => Ok(Value::Bool(l != r)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => compare(op, &l, &r),
        BinaryOp::Add => add(l, r),
        BinaryOp::Sub => arith(op, l, r, "subtract"),
        BinaryOp::Mul => arith(op, l, r, "multiply"),
        BinaryOp::Div => arith(op, l, r, "divide"),
        BinaryOp::Mod => arith(op, l, r, "take modulo of"),
    }
}

// `+` concatenates as soon as either side is a string.
fn add(l: Value, r: Value) -> Result<Value, ScriptError> {
    match (&l, &r) {
        (Value::Str(_), _) | (_, Value::Str(_)) => {
            Ok(Value::Str(format!("{}{}", l, r)))
        }
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
        _ => match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Float(a + b)),
            _ => Err(ScriptError::Type(format!(
                "cannot add {} and {}",
                l.type_name(),
                r.type_name()
            ))),
        },
    }
}

fn arith(op: BinaryOp, l: Value, r: Value, verb: &str) -> Result<Value, ScriptError> {
    if let (Value::Int(a), Value::Int(b)) = (&l, &r) {
        return match op {
            BinaryOp::Sub => Ok(Value::Int(a - b)),
            BinaryOp::Mul => Ok(Value::Int(a * b)),
            BinaryOp::Div if *b != 0 => Ok(Value::Int(a / b)),
            BinaryOp::Mod if *b != 0 => Ok(Value::Int(a % b)),
            _ => Err(ScriptError::Type("division by zero".to_string())),
        };
    }
    match (l.as_f64(), r.as_f64()) {
        (Some(a), Some(b)) => match op {
            BinaryOp::Sub => Ok(Value::Float(a - b)),
            BinaryOp::Mul => Ok(Value::Float(a * b)),
            BinaryOp::Div => Ok(Value::Float(a / b)),
            BinaryOp::Mod => Ok(Value::Float(a % b)),
            _ => Err(ScriptError::Type("bad arithmetic operator".to_string())),
        },
        _ => Err(ScriptError::Type(format!(
            "cannot {} {} and {}",
            verb,
            l.type_name(),
            r.type_name()
        ))),
    }
}

fn compare(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, ScriptError> {
    let ordering = match (l, r) {
        (Value::Str(a), Value::Str(b)) => a.cmp(b) as i8,
        _ => match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) if a < b => -1,
            (Some(a), Some(b)) if a > b => 1,
            (Some(_), Some(_)) => 0,
            _ => {
                return Err(ScriptError::Type(format!(
                    "cannot order {} and {}",
                    l.type_name(),
                    r.type_name()
                )))
            }
        },
    };
    let out = match op {
        BinaryOp::Lt => ordering < 0,
        BinaryOp::Le => ordering <= 0,
        BinaryOp::Gt => ordering > 0,
        BinaryOp::Ge => ordering >= 0,
        _ => false,
    };
    Ok(Value::Bool(out))
}
