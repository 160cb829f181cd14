//! Integration tests for the semantic pipeline: populate, bind, analyze,
//! resolve imports.

use fab_common::{CompileErrorKind, ValueType};
use fab_compile::{CallTarget, Compilation, ImportTarget};
use fab_model::{
    App, ArgModel, ComponentKind, ComponentModel, ConstantModel, ConstantOption, ErrorModel,
    ErrorOption, FuncModel, StructField, StructModel,
};

// ── Helpers ────────────────────────────────────────────────────────────

fn arg(name: &str, value_type: &str) -> ArgModel {
    ArgModel {
        name: name.into(),
        value_type: value_type.into(),
    }
}

fn base_app() -> App {
    let mut app = App::new();
    app.add_component(ComponentModel {
        name: "db".into(),
        kind: ComponentKind::Db,
        comment: String::new(),
    });
    app.add_constant(ConstantModel {
        name: "base".into(),
        comment: String::new(),
        options: vec![ConstantOption {
            name: "userTable".into(),
            value_type: "string".into(),
            value: "tm_user".into(),
            comment: String::new(),
        }],
    });
    app.add_error(ErrorModel {
        name: "base".into(),
        comment: String::new(),
        options: vec![ErrorOption {
            name: "notFound".into(),
            code: "404".into(),
            msg: "record not found".into(),
            comment: String::new(),
        }],
    });
    app.add_struct(StructModel {
        name: "user/User".into(),
        comment: String::new(),
        fields: vec![
            StructField {
                name: "name".into(),
                value_type: "string".into(),
                comment: String::new(),
                json_name: None,
            },
            StructField {
                name: "age".into(),
                value_type: "int32".into(),
                comment: String::new(),
                json_name: None,
            },
        ],
    });
    app.add_func(FuncModel {
        name: "add".into(),
        comment: "add two numbers".into(),
        args: vec![arg("a", "int32"), arg("b", "int32")],
        result: "int32".into(),
        func: "return a + b;".into(),
    });
    app
}

fn service(app: &mut App, name: &str, args: Vec<ArgModel>, result: &str, func: &str) {
    app.add_service(FuncModel {
        name: name.into(),
        comment: String::new(),
        args,
        result: result.into(),
        func: func.into(),
    });
}

// ── Inference ──────────────────────────────────────────────────────────

#[test]
fn component_call_types_the_binding() {
    let mut app = base_app();
    service(
        &mut app,
        "user/list",
        vec![],
        "[]map",
        "var rows = db.query(constant.userTable);\nreturn rows;",
    );
    let compilation = Compilation::build(&app).unwrap();
    let m = compilation
        .graph
        .find_method("service", &["user"], "list")
        .unwrap();
    let method = compilation.graph.method(m);

    assert_eq!(method.vars.len(), 1);
    assert_eq!(method.vars[0].name, "rows");
    assert_eq!(
        method.vars[0].var_type.value_type(),
        Some(&ValueType::List(Box::new(ValueType::Map)))
    );

    let script = method.script.as_ref().unwrap();
    assert_eq!(script.caches.call.len(), 1);
    let target = script.caches.call.values().next().unwrap();
    assert!(target.has_error());
    assert!(matches!(target, CallTarget::Component { component, .. } if component == "db"));
    assert_eq!(method.calls.component.len(), 1);
    assert_eq!(method.calls.component[0].path, "db.query");
}

#[test]
fn map_subscripts_grow_children() {
    let mut app = base_app();
    service(
        &mut app,
        "user/shape",
        vec![arg("row", "map")],
        "",
        "var name;\nname = row[\"user\"][\"name\"];",
    );
    let compilation = Compilation::build(&app).unwrap();
    let m = compilation
        .graph
        .find_method("service", &["user"], "shape")
        .unwrap();
    let method = compilation.graph.method(m);
    let param = &method.params[0];
    assert_eq!(param.var_type.subs().len(), 1);
    assert_eq!(param.var_type.subs()[0].name, "user");
    assert_eq!(param.var_type.subs()[0].var_type.subs()[0].name, "name");
}

#[test]
fn struct_field_access_types_through_registry() {
    let mut app = base_app();
    service(
        &mut app,
        "user/age",
        vec![arg("user", "user/User")],
        "int32",
        "return user.age;",
    );
    let compilation = Compilation::build(&app).unwrap();
    let m = compilation
        .graph
        .find_method("service", &["user"], "age")
        .unwrap();
    assert_eq!(
        compilation.graph.method(m).result.value_type(),
        Some(&ValueType::Int32)
    );
}

#[test]
fn user_method_call_records_func_list_and_import() {
    let mut app = base_app();
    service(
        &mut app,
        "user/total",
        vec![],
        "int32",
        "var total = func.add(1, 2);\nreturn total;",
    );
    let compilation = Compilation::build(&app).unwrap();
    let m = compilation
        .graph
        .find_method("service", &["user"], "total")
        .unwrap();
    let method = compilation.graph.method(m);

    assert_eq!(
        method.vars[0].var_type.value_type(),
        Some(&ValueType::Int32)
    );
    assert_eq!(method.calls.func.len(), 1);
    let CallTarget::Method(target) = &method.calls.func[0].target else {
        panic!("expected method target");
    };
    assert_eq!(
        *target,
        compilation.graph.find_method("func", &[], "add").unwrap()
    );

    // The func class materialized as a class import.
    let class = compilation.graph.class(m.class);
    assert!(class
        .imports
        .iter()
        .any(|i| matches!(i.target, ImportTarget::Class(c) if c == target.class)));
}

#[test]
fn self_call_registers_this_sentinel() {
    let mut app = base_app();
    service(&mut app, "user/ping", vec![], "", "return;");
    service(
        &mut app,
        "user/poke",
        vec![],
        "",
        "service.user.ping();",
    );
    let compilation = Compilation::build(&app).unwrap();
    let m = compilation
        .graph
        .find_method("service", &["user"], "poke")
        .unwrap();
    let class = compilation.graph.class(m.class);
    let this_import = class
        .imports
        .iter()
        .find(|i| matches!(i.target, ImportTarget::Class(c) if c == m.class))
        .expect("self import missing");
    assert!(this_import.is_this);
    assert!(this_import.alias.is_none());
}

#[test]
fn imports_resolve_with_aliases() {
    let mut app = base_app();
    service(
        &mut app,
        "user/list",
        vec![],
        "[]map",
        "var rows = db.query(constant.userTable);\nif (rows == null) { throw error.notFound; }\nreturn rows;",
    );
    let compilation = Compilation::build(&app).unwrap();
    let m = compilation
        .graph
        .find_method("service", &["user"], "list")
        .unwrap();
    let class = compilation.graph.class(m.class);

    assert_eq!(class.import_as_name("db"), Some("db"));
    assert_eq!(class.import_as_name("constant"), Some("constant"));
    assert_eq!(class.import_as_name("error"), Some("apperror"));
}

// ── Idempotency ────────────────────────────────────────────────────────

#[test]
fn reanalysis_changes_nothing() {
    let mut app = base_app();
    service(
        &mut app,
        "user/list",
        vec![arg("name", "string")],
        "[]map",
        "var rows = db.query(`select * from ${constant.userTable} where name = ${name}`);\nreturn rows;",
    );
    let mut compilation = Compilation::build(&app).unwrap();
    let m = compilation
        .graph
        .find_method("service", &["user"], "list")
        .unwrap();

    let snapshot = |graph: &fab_compile::Graph| {
        let method = graph.method(m);
        let script = method.script.as_ref().unwrap();
        (
            method.vars.len(),
            method.calls.component.len(),
            graph.class(m.class).imports.len(),
            script.caches.call.len(),
            script.caches.binding.len(),
        )
    };
    let before = snapshot(&compilation.graph);

    compilation
        .graph
        .method_mut(m)
        .script
        .as_mut()
        .unwrap()
        .analyzed = false;
    fab_compile::analyze::analyze(&app, &mut compilation.graph).unwrap();

    assert_eq!(before, snapshot(&compilation.graph));
}

// ── Failures ───────────────────────────────────────────────────────────

#[test]
fn unknown_callee_halts_with_context() {
    let mut app = base_app();
    service(&mut app, "user/broken", vec![], "", "db.quary(\"select 1\");");
    let err = Compilation::build(&app).unwrap_err();
    assert!(matches!(err.kind, CompileErrorKind::UnknownCallee { .. }));
    assert_eq!(err.context.class_key.as_deref(), Some("service/user"));
    assert_eq!(err.context.method.as_deref(), Some("broken"));
    assert!(err.context.code.as_deref().unwrap().contains("db.quary"));
}

#[test]
fn undeclared_component_is_unknown() {
    let mut app = base_app();
    service(&mut app, "user/broken", vec![], "", "redis.get(\"k\");");
    let err = Compilation::build(&app).unwrap_err();
    assert!(matches!(err.kind, CompileErrorKind::UnknownCallee { .. }));
}

#[test]
fn incompatible_observations_fail() {
    let mut app = base_app();
    service(
        &mut app,
        "user/broken",
        vec![],
        "",
        "var x = 1;\nx = \"s\";",
    );
    let err = Compilation::build(&app).unwrap_err();
    assert!(matches!(err.kind, CompileErrorKind::TypeMismatch { .. }));
}

#[test]
fn parse_failure_carries_method_context() {
    let mut app = base_app();
    service(&mut app, "user/broken", vec![], "", "var = 1;");
    let err = Compilation::build(&app).unwrap_err();
    assert!(matches!(err.kind, CompileErrorKind::ScriptParse { .. }));
    assert_eq!(err.context.method.as_deref(), Some("broken"));
}
