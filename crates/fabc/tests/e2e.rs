//! End-to-end driver tests.
//!
//! Each test writes a model directory to a temp dir, runs the full
//! load -> compile -> emit pipeline in process, and asserts on the
//! emitted sources or the rendered diagnostic.

use std::fs;
use std::path::Path;

use fab_codegen::Options;

/// Write one model file, creating parent directories.
fn write_model(root: &Path, relative: &str, json: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).expect("failed to create model dir");
    fs::write(path, json).expect("failed to write model file");
}

/// A model directory with a db component, a constant pack, an error
/// pack, and one user service.
fn write_user_app(root: &Path) {
    write_model(root, "component/db.json", r#"{"kind": "db"}"#);
    write_model(
        root,
        "constant/base.json",
        r#"{
            "options": [
                {"name": "userTable", "type": "string", "value": "tm_user"}
            ]
        }"#,
    );
    write_model(
        root,
        "error/base.json",
        r#"{
            "options": [
                {"name": "notFound", "code": "404", "msg": "record not found"}
            ]
        }"#,
    );
    write_model(
        root,
        "service/user/get.json",
        r#"{
            "comment": "load one user",
            "args": [{"name": "id", "type": "int64"}],
            "result": "map",
            "func": "var row = db.queryOne(`select * from ${constant.userTable} where id = ${id}`);\nif (row == null) {\nthrow error.notFound;\n}\nreturn row;"
        }"#,
    );
}

#[test]
fn compile_dir_emits_expected_sources() {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    write_user_app(temp.path());

    let files = fabc::compile_dir(temp.path(), &Options::default()).expect("compile failed");
    let service = files
        .iter()
        .find(|f| f.key == "service/user")
        .expect("service file missing");

    assert_eq!(service.path, "service/user.go");
    assert!(service.source.contains("package service"), "{}", service.source);
    assert!(
        service.source.contains(
            "func (this_ *UserService) Get(id int64) (res map[string]any, err error) {"
        ),
        "{}",
        service.source
    );
    assert!(
        service.source.contains(
            "row, err = db.QueryOne(fmt.Sprintf(`select * from %v where id = %v`, constant.UserTable, id))"
        ),
        "{}",
        service.source
    );
    assert!(
        service.source.contains("err = apperror.NotFound"),
        "{}",
        service.source
    );

    // Constant and error packs came along.
    assert!(files.iter().any(|f| f.key == "constant/base"));
    assert!(files.iter().any(|f| f.key == "error/base"));
}

#[test]
fn model_names_come_from_file_paths() {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    write_user_app(temp.path());
    write_model(
        temp.path(),
        "func/add.json",
        r#"{
            "args": [{"name": "a", "type": "int32"}, {"name": "b", "type": "int32"}],
            "result": "int32",
            "func": "return a + b;"
        }"#,
    );

    let app = fabc::load::load_app(temp.path()).expect("load failed");
    assert!(app.func("add").is_some());
    assert!(app.service("user/get").is_some());
    assert_eq!(app.constants().len(), 1);

    let files = fabc::compile_app(&app, &Options::default()).expect("compile failed");
    assert!(files.iter().any(|f| f.key == "func/base"));
}

#[test]
fn repeated_runs_are_byte_identical() {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    write_user_app(temp.path());

    let first = fabc::compile_dir(temp.path(), &Options::default()).expect("compile failed");
    let second = fabc::compile_dir(temp.path(), &Options::default()).expect("compile failed");
    let join = |files: &[fab_codegen::GeneratedFile]| {
        files
            .iter()
            .map(|f| format!("{}\n{}\n{}", f.key, f.path, f.source))
            .collect::<Vec<_>>()
            .join("\x00")
    };
    assert_eq!(join(&first), join(&second));
}

#[test]
fn unknown_callee_renders_labeled_diagnostic() {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    write_user_app(temp.path());
    write_model(
        temp.path(),
        "service/user/broken.json",
        r#"{"func": "db.quary(\"select 1\");"}"#,
    );

    let app = fabc::load::load_app(temp.path()).expect("load failed");
    let err = fabc::compile_app(&app, &Options::default()).unwrap_err();
    let rendered = fabc::render_error(&app, &err);
    assert!(rendered.contains("db.quary"), "{rendered}");
    assert!(rendered.contains("known target"), "{rendered}");
}

#[test]
fn empty_model_dir_compiles_to_nothing() {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    let files = fabc::compile_dir(temp.path(), &Options::default()).expect("compile failed");
    assert!(files.is_empty());
}
