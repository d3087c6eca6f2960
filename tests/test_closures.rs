//! Tests for function values, closure capture and the apply entry points.

extern crate rill;

use std::collections::HashMap;
use std::rc::Rc;

use rill::ast::{build, BinaryOp, Expr};
use rill::{evaluate, FunctionValue, HostEnv, ScriptError, Value};

fn run(tree: Expr) -> Value {
    evaluate(&tree, HashMap::new(), Rc::new(HostEnv::new())).unwrap()
}

fn as_function(v: Value) -> Rc<FunctionValue> {
    match v {
        Value::Function(f) => f,
        other => panic!("expected a function value, got {:?}", other),
    }
}

/// `for (let i ...)` closures capture one cell per iteration.
#[test]
fn let_loop_closures_see_their_own_iteration() {
    let tree = build::block(vec![
        build::let_decl("fns", build::list(vec![])),
        build::for_loop(
            build::let_decl("i", build::int(0)),
            build::binary(BinaryOp::Lt, build::ident("i"), build::int(3)),
            build::assign("i", build::binary(BinaryOp::Add, build::ident("i"), build::int(1))),
            build::block(vec![build::method_call(
                build::ident("fns"),
                "push",
                vec![build::function(None, vec![], build::ret(build::ident("i")))],
            )]),
        ),
        build::list(vec![
            build::call(build::index(build::ident("fns"), build::int(0)), vec![]),
            build::call(build::index(build::ident("fns"), build::int(1)), vec![]),
            build::call(build::index(build::ident("fns"), build::int(2)), vec![]),
        ]),
    ]);
    match run(tree) {
        Value::List(items) => {
            assert_eq!(
                *items.borrow(),
                vec![Value::Int(0), Value::Int(1), Value::Int(2)]
            );
        }
        other => panic!("expected a list, got {:?}", other),
    }
}

/// `for (var i ...)` closures share the single header cell.
#[test]
fn var_loop_closures_share_one_cell() {
    let tree = build::block(vec![
        build::let_decl("fns", build::list(vec![])),
        build::for_loop(
            build::var_decl("i", build::int(0)),
            build::binary(BinaryOp::Lt, build::ident("i"), build::int(3)),
            build::assign("i", build::binary(BinaryOp::Add, build::ident("i"), build::int(1))),
            build::block(vec![build::method_call(
                build::ident("fns"),
                "push",
                vec![build::function(None, vec![], build::ret(build::ident("i")))],
            )]),
        ),
        build::list(vec![
            build::call(build::index(build::ident("fns"), build::int(0)), vec![]),
            build::call(build::index(build::ident("fns"), build::int(1)), vec![]),
            build::call(build::index(build::ident("fns"), build::int(2)), vec![]),
        ]),
    ]);
    match run(tree) {
        Value::List(items) => {
            assert_eq!(
                *items.borrow(),
                vec![Value::Int(3), Value::Int(3), Value::Int(3)]
            );
        }
        other => panic!("expected a list, got {:?}", other),
    }
}

/// A counter closure mutates the captured cell; the outer scope observes it.
#[test]
fn closures_share_cells_with_their_defining_scope() {
    let tree = build::block(vec![
        build::let_decl("count", build::int(0)),
        build::function(
            Some("bump"),
            vec![],
            build::block(vec![build::assign(
                "count",
                build::binary(BinaryOp::Add, build::ident("count"), build::int(1)),
            )]),
        ),
        build::call_name("bump", vec![]),
        build::call_name("bump", vec![]),
        build::ident("count"),
    ]);
    assert_eq!(run(tree), Value::Int(2));
}

#[test]
fn named_definition_binds_and_yields_the_function() {
    let tree = build::block(vec![
        build::function(Some("twice"), vec![build::param("n")], build::ret(
            build::binary(BinaryOp::Mul, build::ident("n"), build::int(2)),
        )),
        build::call_name("twice", vec![build::int(21)]),
    ]);
    assert_eq!(run(tree), Value::Int(42));
}

#[test]
fn missing_arguments_bind_the_absence_marker() {
    let tree = build::block(vec![
        build::function(
            Some("peek"),
            vec![build::param("a"), build::param("b")],
            build::ret(build::call_name("typeOf", vec![build::ident("b")])),
        ),
        build::call_name("peek", vec![build::int(1)]),
    ]);
    assert_eq!(run(tree), Value::Str("absent".to_string()));
}

#[test]
fn destructuring_parameter_binds_map_keys() {
    let tree = build::block(vec![
        build::function(
            Some("dist"),
            vec![build::destructure(vec!["x", "y"])],
            build::ret(build::binary(
                BinaryOp::Add,
                build::ident("x"),
                build::ident("y"),
            )),
        ),
        build::call_name(
            "dist",
            vec![build::map(vec![("x", build::int(3)), ("y", build::int(4))])],
        ),
    ]);
    assert_eq!(run(tree), Value::Int(7));
}

#[test]
fn destructuring_a_primitive_or_missing_argument_binds_absent() {
    let tree = build::block(vec![
        build::function(
            Some("peek"),
            vec![build::destructure(vec!["x"])],
            build::ret(build::call_name("typeOf", vec![build::ident("x")])),
        ),
        build::list(vec![
            build::call_name("peek", vec![build::int(5)]),
            build::call_name("peek", vec![]),
        ]),
    ]);
    match run(tree) {
        Value::List(items) => {
            let absent = Value::Str("absent".to_string());
            assert_eq!(*items.borrow(), vec![absent.clone(), absent]);
        }
        other => panic!("expected a list, got {:?}", other),
    }
}

#[test]
fn apply_runs_without_a_caller_context() {
    let tree = build::block(vec![
        build::let_decl("base", build::int(100)),
        build::function(
            None,
            vec![build::param("n")],
            build::ret(build::binary(
                BinaryOp::Add,
                build::ident("base"),
                build::ident("n"),
            )),
        ),
    ]);
    let func = as_function(run(tree));
    assert_eq!(func.apply(&[Value::Int(1)]).unwrap(), Value::Int(101));
    // Extra arguments are ignored; missing ones bind the absence marker.
    assert_eq!(
        func.apply(&[Value::Int(2), Value::Int(99)]).unwrap(),
        Value::Int(102)
    );
}

#[test]
fn thread_safe_apply_gets_a_private_stack_per_call() {
    let tree = build::block(vec![
        build::let_decl("total", build::int(0)),
        build::function(
            None,
            vec![build::param("n")],
            build::block(vec![
                build::assign(
                    "total",
                    build::binary(BinaryOp::Add, build::ident("total"), build::ident("n")),
                ),
                build::ret(build::ident("total")),
            ]),
        ),
    ]);
    let func = as_function(run(tree));
    // Captured cells stay shared across invocations even though each call
    // builds its own stack.
    assert_eq!(func.thread_safe_apply(&[Value::Int(5)]).unwrap(), Value::Int(5));
    assert_eq!(func.thread_safe_apply(&[Value::Int(5)]).unwrap(), Value::Int(10));
}

#[test]
fn apply_method_call_spreads_a_list() {
    let tree = build::block(vec![
        build::function(
            Some("add"),
            vec![build::param("a"), build::param("b")],
            build::ret(build::binary(
                BinaryOp::Add,
                build::ident("a"),
                build::ident("b"),
            )),
        ),
        build::method_call(
            build::ident("add"),
            "apply",
            vec![build::list(vec![build::int(2), build::int(3)])],
        ),
    ]);
    assert_eq!(run(tree), Value::Int(5));
}

/// `__args__` carries the raw argument list of the nearest call.
#[test]
fn ambient_args_slot_is_published() {
    let tree = build::block(vec![
        build::function(
            Some("first_arg"),
            vec![],
            build::ret(build::index(build::ident("__args__"), build::int(0))),
        ),
        build::call_name("first_arg", vec![build::str("hello"), build::int(2)]),
    ]);
    assert_eq!(run(tree), Value::Str("hello".to_string()));
}

#[test]
fn auto_apply_rebinds_from_the_ambient_args() {
    // `chain` auto-applies whatever function it is handed, using the
    // ambient argument list of the call it runs inside.
    let mut host = HostEnv::new();
    host.register_fun(
        "chain",
        rill::NativeFunction::new("chain", |ctx, args| match args.get(0) {
            Some(Value::Function(f)) => f.auto_apply(ctx),
            _ => Err(ScriptError::Type("chain() needs a function".to_string())),
        }),
    );
    let tree = build::block(vec![
        build::function(
            Some("inner"),
            vec![build::param("a"), build::param("b")],
            build::ret(build::binary(
                BinaryOp::Add,
                build::ident("a"),
                build::ident("b"),
            )),
        ),
        build::function(
            Some("relay"),
            vec![build::param("x"), build::param("y")],
            build::ret(build::call_name("chain", vec![build::ident("inner")])),
        ),
        build::call_name("relay", vec![build::int(4), build::int(5)]),
    ]);
    let out = evaluate(&tree, HashMap::new(), Rc::new(host)).unwrap();
    assert_eq!(out, Value::Int(9));
}

#[test]
fn auto_apply_without_ambient_args_rejects_destructuring() {
    let tree = build::function(
        None,
        vec![build::destructure(vec!["x"])],
        build::ret(build::ident("x")),
    );
    let func = as_function(run(tree));
    // No call published __args__, so a destructuring function cannot
    // auto-apply.
    let mut ctx = rill::EvalContext::new(Rc::new(HostEnv::new()));
    let err = func.auto_apply(&mut ctx).unwrap_err();
    assert!(matches!(err, ScriptError::Structural(_)));
}
