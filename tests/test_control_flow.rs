//! Tests for loops, switch, try/catch/finally and sentinel propagation.

extern crate rill;

use std::collections::HashMap;
use std::rc::Rc;

use rill::ast::{build, BinaryOp, Expr};
use rill::{evaluate, HostEnv, ScriptError, Value};

fn run(tree: Expr) -> Value {
    evaluate(&tree, HashMap::new(), Rc::new(HostEnv::new())).unwrap()
}

fn run_err(tree: Expr) -> ScriptError {
    evaluate(&tree, HashMap::new(), Rc::new(HostEnv::new())).unwrap_err()
}

fn bump(name: &str) -> Expr {
    build::assign(
        name,
        build::binary(BinaryOp::Add, build::ident(name), build::int(1)),
    )
}

#[test]
fn while_loop_with_break_and_continue() {
    // Sum odd numbers below 10, stopping at 7.
    let tree = build::block(vec![
        build::let_decl("i", build::int(0)),
        build::let_decl("sum", build::int(0)),
        build::while_loop(
            build::binary(BinaryOp::Lt, build::ident("i"), build::int(10)),
            build::block(vec![
                bump("i"),
                build::if_expr(
                    build::binary(
                        BinaryOp::Eq,
                        build::binary(BinaryOp::Mod, build::ident("i"), build::int(2)),
                        build::int(0),
                    ),
                    Expr::Continue,
                ),
                build::if_expr(
                    build::binary(BinaryOp::Gt, build::ident("i"), build::int(7)),
                    Expr::Break,
                ),
                build::assign(
                    "sum",
                    build::binary(BinaryOp::Add, build::ident("sum"), build::ident("i")),
                ),
            ]),
        ),
        build::ident("sum"),
    ]);
    // 1 + 3 + 5 + 7
    assert_eq!(run(tree), Value::Int(16));
}

#[test]
fn return_propagates_through_nested_loops() {
    let tree = build::block(vec![
        build::function(
            Some("find"),
            vec![],
            build::while_loop(
                build::boolean(true),
                build::while_loop(
                    build::boolean(true),
                    build::ret(build::int(99)),
                ),
            ),
        ),
        build::call_name("find", vec![]),
    ]);
    assert_eq!(run(tree), Value::Int(99));
}

/// A `return` raised while computing a declaration's initializer leaves
/// the function immediately; the rest of the body never runs.
#[test]
fn return_inside_an_initializer_leaves_the_function() {
    let tree = build::block(vec![
        build::function(
            Some("f"),
            vec![],
            build::block(vec![
                build::let_decl(
                    "x",
                    build::block(vec![build::ret(build::int(1)), build::int(0)]),
                ),
                build::int(99),
            ]),
        ),
        build::call_name("f", vec![]),
    ]);
    assert_eq!(run(tree), Value::Int(1));
}

#[test]
fn return_inside_a_call_argument_leaves_the_function() {
    let tree = build::block(vec![
        build::function(
            Some("id"),
            vec![build::param("v")],
            build::ret(build::ident("v")),
        ),
        build::function(
            Some("f"),
            vec![],
            build::block(vec![
                build::call_name(
                    "id",
                    vec![build::block(vec![build::ret(build::int(5))])],
                ),
                build::int(99),
            ]),
        ),
        build::call_name("f", vec![]),
    ]);
    assert_eq!(run(tree), Value::Int(5));
}

#[test]
fn return_inside_a_binary_operand_leaves_the_function() {
    let tree = build::block(vec![
        build::function(
            Some("f"),
            vec![],
            build::block(vec![
                build::binary(
                    BinaryOp::Add,
                    build::int(1),
                    build::block(vec![build::ret(build::int(7)), build::int(0)]),
                ),
                build::int(99),
            ]),
        ),
        build::call_name("f", vec![]),
    ]);
    assert_eq!(run(tree), Value::Int(7));
}

#[test]
fn stray_break_at_top_level_is_structural() {
    let err = run_err(build::block(vec![Expr::Break]));
    assert!(matches!(err, ScriptError::Structural(_)));
}

#[test]
fn empty_return_yields_null() {
    let tree = build::block(vec![
        build::function(Some("nothing"), vec![], build::block(vec![build::ret_empty()])),
        build::call_name("nothing", vec![]),
    ]);
    assert_eq!(run(tree), Value::Null);
}

#[test]
fn for_in_iterates_list_elements() {
    let tree = build::block(vec![
        build::let_decl("sum", build::int(0)),
        build::for_in(
            "n",
            build::list(vec![build::int(1), build::int(2), build::int(3)]),
            build::block(vec![build::assign(
                "sum",
                build::binary(BinaryOp::Add, build::ident("sum"), build::ident("n")),
            )]),
        ),
        build::ident("sum"),
    ]);
    assert_eq!(run(tree), Value::Int(6));
}

#[test]
fn for_in_iterates_map_keys() {
    let tree = build::block(vec![
        build::let_decl("joined", build::str("")),
        build::for_in(
            "k",
            build::map(vec![("b", build::int(2)), ("a", build::int(1))]),
            build::block(vec![build::assign(
                "joined",
                build::binary(BinaryOp::Add, build::ident("joined"), build::ident("k")),
            )]),
        ),
        build::ident("joined"),
    ]);
    // Keys come out in sorted order.
    assert_eq!(run(tree), Value::Str("ab".to_string()));
}

#[test]
fn for_in_variable_is_not_visible_after_the_loop() {
    let tree = build::block(vec![
        build::for_in("n", build::list(vec![build::int(1)]), build::block(vec![])),
        build::ident("n"),
    ]);
    assert!(matches!(run_err(tree), ScriptError::UnresolvedReference(_)));
}

#[test]
fn switch_matches_and_falls_through() {
    let tree = |subject: i64| {
        build::block(vec![
            build::let_decl("hits", build::str("")),
            build::switch(
                build::int(subject),
                vec![
                    build::case(
                        build::int(1),
                        vec![build::assign(
                            "hits",
                            build::binary(BinaryOp::Add, build::ident("hits"), build::str("a")),
                        )],
                    ),
                    build::case(
                        build::int(2),
                        vec![
                            build::assign(
                                "hits",
                                build::binary(BinaryOp::Add, build::ident("hits"), build::str("b")),
                            ),
                            Expr::Break,
                        ],
                    ),
                    build::default_case(vec![build::assign(
                        "hits",
                        build::binary(BinaryOp::Add, build::ident("hits"), build::str("d")),
                    )]),
                ],
            ),
            build::ident("hits"),
        ])
    };
    // Arm 1 has no break: falls into arm 2, whose break stops the walk.
    assert_eq!(run(tree(1)), Value::Str("ab".to_string()));
    assert_eq!(run(tree(2)), Value::Str("b".to_string()));
    assert_eq!(run(tree(7)), Value::Str("d".to_string()));
}

#[test]
fn thrown_values_bind_in_catch() {
    let tree = build::try_catch(
        build::block(vec![build::throw(build::str("boom"))]),
        "e",
        build::block(vec![build::binary(
            BinaryOp::Add,
            build::str("caught: "),
            build::ident("e"),
        )]),
    );
    assert_eq!(run(tree), Value::Str("caught: boom".to_string()));
}

#[test]
fn unresolved_reference_is_not_catchable() {
    let tree = build::try_catch(
        build::block(vec![build::ident("no_such")]),
        "e",
        build::str("swallowed"),
    );
    assert!(matches!(
        run_err(tree),
        ScriptError::UnresolvedReference(_)
    ));
}

#[test]
fn property_resolution_failure_is_not_catchable() {
    let tree = build::try_catch(
        build::block(vec![build::member(build::int(5), "anything")]),
        "e",
        build::str("swallowed"),
    );
    assert!(matches!(
        run_err(tree),
        ScriptError::PropertyResolution { .. }
    ));
}

/// `return` inside try still runs finally, exactly once.
#[test]
fn finally_runs_once_on_return() {
    let tree = build::block(vec![
        build::let_decl("cleanups", build::int(0)),
        build::function(
            Some("f"),
            vec![],
            build::try_finally(
                build::block(vec![build::ret(build::int(7))]),
                build::block(vec![bump("cleanups")]),
            ),
        ),
        build::let_decl("out", build::call_name("f", vec![])),
        build::list(vec![build::ident("out"), build::ident("cleanups")]),
    ]);
    match run(tree) {
        Value::List(items) => {
            assert_eq!(*items.borrow(), vec![Value::Int(7), Value::Int(1)]);
        }
        other => panic!("expected a list, got {:?}", other),
    }
}

#[test]
fn finally_runs_when_the_block_fails() {
    let tree = build::block(vec![
        build::let_decl("cleanups", build::int(0)),
        build::try_catch_finally(
            build::block(vec![build::throw(build::int(1))]),
            "e",
            build::block(vec![]),
            build::block(vec![bump("cleanups")]),
        ),
        build::ident("cleanups"),
    ]);
    assert_eq!(run(tree), Value::Int(1));
}

/// An abrupt finalizer overrides the protected outcome.
#[test]
fn finally_return_wins() {
    let tree = build::block(vec![
        build::function(
            Some("f"),
            vec![],
            build::try_finally(
                build::block(vec![build::ret(build::int(1))]),
                build::block(vec![build::ret(build::int(2))]),
            ),
        ),
        build::call_name("f", vec![]),
    ]);
    assert_eq!(run(tree), Value::Int(2));
}

#[test]
fn uncaught_throw_escapes_as_user_throw() {
    let err = run_err(build::throw(build::int(13)));
    assert!(matches!(err, ScriptError::UserThrow(Value::Int(13))));
}

#[test]
fn catch_rebinds_payload_across_a_host_boundary() {
    // A script function thrown through a host callable keeps its payload.
    let mut host = HostEnv::new();
    host.register_fun(
        "call_it",
        rill::NativeFunction::new("call_it", |ctx, args| match args.get(0) {
            Some(Value::Function(f)) => f.invoke(ctx, &[]),
            _ => Err(ScriptError::Type("call_it() needs a function".to_string())),
        }),
    );
    let tree = build::try_catch(
        build::block(vec![
            build::function(Some("angry"), vec![], build::throw(build::str("nope"))),
            build::call_name("call_it", vec![build::ident("angry")]),
        ]),
        "e",
        build::ident("e"),
    );
    let out = evaluate(&tree, HashMap::new(), Rc::new(host)).unwrap();
    assert_eq!(out, Value::Str("nope".to_string()));
}
