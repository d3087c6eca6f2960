//! Tests for script imports, the module cache, host registry imports and
//! export forms.

extern crate rill;

use std::any::Any;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use rill::ast::{build, BindingName, BinaryOp, Expr, ExportExpr, ImportExpr};
use rill::{
    evaluate, evaluate_module, HostClass, HostEnv, HostObject, ModuleResolver, NativeFunction,
    ScriptError, TypeTag, Value,
};

struct MapResolver {
    modules: HashMap<String, Expr>,
}

impl ModuleResolver for MapResolver {
    fn resolve(&self, path: &str) -> Result<Expr, ScriptError> {
        self.modules.get(path).cloned().ok_or_else(|| ScriptError::Import {
            path: path.to_string(),
            detail: "unknown module".to_string(),
        })
    }
}

fn host_with_modules(modules: Vec<(&str, Expr)>) -> HostEnv {
    let mut host = HostEnv::new();
    host.set_resolver(MapResolver {
        modules: modules
            .into_iter()
            .map(|(path, tree)| (path.to_string(), tree))
            .collect(),
    });
    host
}

fn script_import(path: &str, names: Vec<BindingName>) -> Expr {
    build::import(ImportExpr::Script {
        path: path.to_string(),
        binding: None,
        names,
    })
}

#[test]
fn module_evaluates_once_across_importers() {
    let counter_module = build::block(vec![
        build::call_name("tick", vec![]),
        build::export(ExportExpr::Decl(Box::new(build::let_decl(
            "value",
            build::int(5),
        )))),
    ]);
    let ticks = Rc::new(Cell::new(0));
    let sink = ticks.clone();
    let mut host = host_with_modules(vec![("counter.rl", counter_module)]);
    host.register_fun(
        "tick",
        NativeFunction::new("tick", move |_ctx, _args| {
            sink.set(sink.get() + 1);
            Ok(Value::Absent)
        }),
    );

    let tree = build::block(vec![
        build::let_decl("a", build::int(0)),
        build::let_decl("b", build::int(0)),
        build::block(vec![
            script_import("counter.rl", vec![BindingName::plain("value")]),
            build::assign("a", build::ident("value")),
        ]),
        build::block(vec![
            script_import("counter.rl", vec![BindingName::plain("value")]),
            build::assign("b", build::ident("value")),
        ]),
        build::binary(BinaryOp::Add, build::ident("a"), build::ident("b")),
    ]);
    let out = evaluate(&tree, HashMap::new(), Rc::new(host)).unwrap();
    assert_eq!(out, Value::Int(10));
    // The module body ran exactly once; the second import hit the cache.
    assert_eq!(ticks.get(), 1);
}

#[test]
fn bare_import_binds_the_whole_namespace() {
    let module = build::block(vec![
        build::export(ExportExpr::Decl(Box::new(build::let_decl(
            "greeting",
            build::str("hello"),
        )))),
    ]);
    let host = host_with_modules(vec![("greet.rl", module)]);
    let tree = build::block(vec![
        build::import(ImportExpr::Script {
            path: "greet.rl".to_string(),
            binding: Some("G".to_string()),
            names: vec![],
        }),
        build::member(build::ident("G"), "greeting"),
    ]);
    let out = evaluate(&tree, HashMap::new(), Rc::new(host)).unwrap();
    assert_eq!(out, Value::Str("hello".to_string()));
}

#[test]
fn renamed_exports_and_imports_round_trip() {
    let module = build::block(vec![
        build::let_decl("internal", build::int(9)),
        build::export(ExportExpr::Renamed(vec![BindingName::renamed(
            "internal", "nine",
        )])),
    ]);
    let host = Rc::new(host_with_modules(vec![("nums.rl", module)]));

    let tree = build::block(vec![
        script_import("nums.rl", vec![BindingName::renamed("nine", "n")]),
        build::ident("n"),
    ]);
    let out = evaluate(&tree, HashMap::new(), host.clone()).unwrap();
    assert_eq!(out, Value::Int(9));

    // Neither the module's internal name nor the export name leaks in.
    for leaked in ["internal", "nine"] {
        let tree = build::block(vec![
            script_import("nums.rl", vec![BindingName::renamed("nine", "n")]),
            build::ident(leaked),
        ]);
        let err = evaluate(&tree, HashMap::new(), host.clone()).unwrap_err();
        assert!(matches!(err, ScriptError::UnresolvedReference(_)));
    }
}

#[test]
fn default_export_uses_the_reserved_key() {
    let module = build::block(vec![build::export(ExportExpr::Default(Box::new(
        build::int(42),
    )))]);
    let host = host_with_modules(vec![("answer.rl", module)]);
    let tree = build::block(vec![
        script_import("answer.rl", vec![BindingName::renamed("default", "answer")]),
        build::ident("answer"),
    ]);
    let out = evaluate(&tree, HashMap::new(), Rc::new(host)).unwrap();
    assert_eq!(out, Value::Int(42));
}

#[test]
fn missing_export_fails_the_import() {
    let module = build::block(vec![]);
    let host = host_with_modules(vec![("empty.rl", module)]);
    let tree = script_import("empty.rl", vec![BindingName::plain("ghost")]);
    let err = evaluate(&tree, HashMap::new(), Rc::new(host)).unwrap_err();
    assert!(matches!(err, ScriptError::Import { .. }));
}

#[test]
fn cyclic_imports_are_reported() {
    let module = build::block(vec![script_import("loop.rl", vec![])]);
    let host = host_with_modules(vec![("loop.rl", module)]);
    let tree = script_import("loop.rl", vec![]);
    let err = evaluate(&tree, HashMap::new(), Rc::new(host)).unwrap_err();
    match err {
        ScriptError::Import { detail, .. } => assert!(detail.contains("cyclic")),
        other => panic!("expected an import error, got {:?}", other),
    }
}

#[test]
fn evaluate_module_surfaces_the_export_map() {
    let tree = build::block(vec![
        build::let_decl("x", build::int(1)),
        build::export(ExportExpr::Named("x".to_string())),
        build::export(ExportExpr::Default(Box::new(build::str("d")))),
    ]);
    let (_, exports) =
        evaluate_module(&tree, HashMap::new(), Rc::new(HostEnv::new())).unwrap();
    let exports = exports.borrow();
    assert_eq!(exports.get("x"), Some(&Value::Int(1)));
    assert_eq!(exports.get("default"), Some(&Value::Str("d".to_string())));
}

#[test]
fn registry_object_import_binds_object_and_members() {
    struct Echo {
        class: Rc<HostClass>,
    }
    impl HostObject for Echo {
        fn type_name(&self) -> &str {
            "Echo"
        }
        fn class(&self) -> Rc<HostClass> {
            self.class.clone()
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }
    let class = HostClass::builder("Echo")
        .accessor("tag", |_obj| Value::Str("echo-1".to_string()))
        .method("ping", vec![TypeTag::Str], |_ctx, _obj, args| {
            Ok(Value::Str(format!("pong:{}", args[0])))
        })
        .build();
    let mut host = HostEnv::new();
    host.register_object("echo", Value::Host(Rc::new(Echo { class }) as Rc<dyn HostObject>));

    // A property import binds the value; a method import binds a callable
    // already tied to the registry object.
    let tree = build::block(vec![
        build::import(ImportExpr::HostObject {
            name: "echo".to_string(),
            binding: None,
            names: vec![BindingName::plain("tag"), BindingName::plain("ping")],
        }),
        build::binary(
            BinaryOp::Add,
            build::ident("tag"),
            build::call_name("ping", vec![build::str("x")]),
        ),
    ]);
    let out = evaluate(&tree, HashMap::new(), Rc::new(host)).unwrap();
    assert_eq!(out, Value::Str("echo-1pong:x".to_string()));
}

#[test]
fn registry_map_object_import() {
    let mut config = HashMap::new();
    config.insert("url".to_string(), Value::Str("db://local".to_string()));
    let mut host = HostEnv::new();
    host.register_object("config", Value::map(config));

    let tree = build::block(vec![
        build::import(ImportExpr::HostObject {
            name: "config".to_string(),
            binding: Some("cfg".to_string()),
            names: vec![BindingName::plain("url")],
        }),
        build::list(vec![
            build::ident("url"),
            build::member(build::ident("cfg"), "url"),
        ]),
    ]);
    match evaluate(&tree, HashMap::new(), Rc::new(host)).unwrap() {
        Value::List(items) => {
            let url = Value::Str("db://local".to_string());
            assert_eq!(*items.borrow(), vec![url.clone(), url]);
        }
        other => panic!("expected a list, got {:?}", other),
    }
}

#[test]
fn unknown_registry_object_fails() {
    let tree = build::import(ImportExpr::HostObject {
        name: "nope".to_string(),
        binding: Some("x".to_string()),
        names: vec![],
    });
    let err = evaluate(&tree, HashMap::new(), Rc::new(HostEnv::new())).unwrap_err();
    assert!(matches!(err, ScriptError::Import { .. }));
}

#[test]
fn static_surface_import_spills_names() {
    let mut surface = HashMap::new();
    surface.insert(
        "shout".to_string(),
        NativeFunction::new("shout", |_ctx, args| match args.get(0) {
            Some(Value::Str(s)) => Ok(Value::Str(s.to_uppercase())),
            _ => Err(ScriptError::Type("shout() needs a string".to_string())),
        }),
    );
    let mut host = HostEnv::new();
    host.register_static("strutil", surface);

    let tree = build::block(vec![
        build::import(ImportExpr::HostStatic {
            name: "strutil".to_string(),
            binding: None,
        }),
        build::call_name("shout", vec![build::str("quiet")]),
    ]);
    let out = evaluate(&tree, HashMap::new(), Rc::new(host)).unwrap();
    assert_eq!(out, Value::Str("QUIET".to_string()));
}

#[test]
fn static_surface_import_under_a_binding() {
    let mut surface = HashMap::new();
    surface.insert(
        "one".to_string(),
        NativeFunction::new("one", |_ctx, _args| Ok(Value::Int(1))),
    );
    let mut host = HostEnv::new();
    host.register_static("consts", surface);

    let tree = build::block(vec![
        build::import(ImportExpr::HostStatic {
            name: "consts".to_string(),
            binding: Some("k".to_string()),
        }),
        build::method_call(build::ident("k"), "one", vec![]),
    ]);
    let out = evaluate(&tree, HashMap::new(), Rc::new(host)).unwrap();
    assert_eq!(out, Value::Int(1));
}

#[test]
fn export_of_an_unbound_name_fails() {
    let tree = build::export(ExportExpr::Named("ghost".to_string()));
    let err = evaluate(&tree, HashMap::new(), Rc::new(HostEnv::new())).unwrap_err();
    assert!(matches!(err, ScriptError::UnresolvedReference(_)));
}
