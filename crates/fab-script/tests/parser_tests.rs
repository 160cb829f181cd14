//! Parser integration tests.
//!
//! Each test parses a script fragment and asserts the shape of the arena
//! AST: node kinds, nesting, and the invariants later phases rely on
//! (single-binding var form, chunks = interpolations + 1, stable IDs).

use fab_script::{parse, BinaryOp, Expr, Stmt};

fn first_stmt(source: &str) -> (fab_script::Program, fab_script::StmtId) {
    let program = parse(source).expect("parse failed");
    assert!(!program.body.is_empty(), "no statements parsed");
    let id = program.body[0];
    (program, id)
}

// ── Statements ─────────────────────────────────────────────────────────

#[test]
fn var_without_initializer() {
    let (program, id) = first_stmt("var x;");
    match program.ast.stmt(id) {
        Stmt::Variable { name, init, .. } => {
            assert_eq!(name, "x");
            assert!(init.is_none());
        }
        other => panic!("expected var statement, got {}", other.kind_name()),
    }
}

#[test]
fn var_with_initializer() {
    let (program, id) = first_stmt("var total = a + 1;");
    match program.ast.stmt(id) {
        Stmt::Variable { name, init, .. } => {
            assert_eq!(name, "total");
            let init = init.expect("missing initializer");
            assert!(matches!(
                program.ast.expr(init),
                Expr::Binary {
                    op: BinaryOp::Add,
                    ..
                }
            ));
        }
        other => panic!("expected var statement, got {}", other.kind_name()),
    }
}

#[test]
fn if_else_if_chain() {
    let source = "if (a == 1) { return; } else if (a == 2) { return; } else { throw e; }";
    let (program, id) = first_stmt(source);
    let Stmt::If { alternate, .. } = program.ast.stmt(id) else {
        panic!("expected if statement");
    };
    let alt = alternate.expect("missing else branch");
    let Stmt::If {
        alternate: inner_alt,
        ..
    } = program.ast.stmt(alt)
    else {
        panic!("else-if should parse as a nested if");
    };
    let final_else = inner_alt.expect("missing final else");
    assert!(matches!(program.ast.stmt(final_else), Stmt::Block { .. }));
}

#[test]
fn return_with_and_without_argument() {
    let (program, id) = first_stmt("return a + b;");
    let Stmt::Return { argument, .. } = program.ast.stmt(id) else {
        panic!("expected return");
    };
    assert!(argument.is_some());

    let (program, id) = first_stmt("return;");
    let Stmt::Return { argument, .. } = program.ast.stmt(id) else {
        panic!("expected return");
    };
    assert!(argument.is_none());
}

#[test]
fn throw_statement() {
    let (program, id) = first_stmt("throw error.NotFound;");
    let Stmt::Throw { argument, .. } = program.ast.stmt(id) else {
        panic!("expected throw");
    };
    let Expr::Dot { name, .. } = program.ast.expr(*argument) else {
        panic!("expected member access argument");
    };
    assert_eq!(name, "NotFound");
}

#[test]
fn semicolons_are_optional_between_statements() {
    let program = parse("var a = 1\nvar b = 2\nreturn a").expect("parse failed");
    assert_eq!(program.body.len(), 3);
}

// ── Expressions ────────────────────────────────────────────────────────

#[test]
fn call_with_dotted_callee() {
    let (program, id) = first_stmt("db.query(\"select 1\");");
    let Stmt::Expression { expr, .. } = program.ast.stmt(id) else {
        panic!("expected expression statement");
    };
    let Expr::Call { callee, args, .. } = program.ast.expr(*expr) else {
        panic!("expected call");
    };
    assert_eq!(args.len(), 1);
    let Expr::Dot { left, name, .. } = program.ast.expr(*callee) else {
        panic!("expected dotted callee");
    };
    assert_eq!(name, "query");
    assert!(matches!(program.ast.expr(*left), Expr::Ident { name, .. } if name == "db"));
}

#[test]
fn template_literal_chunks_and_exprs() {
    let (program, id) = first_stmt("`hello ${name}!`");
    let Stmt::Expression { expr, .. } = program.ast.stmt(id) else {
        panic!("expected expression statement");
    };
    let Expr::Template { chunks, exprs, .. } = program.ast.expr(*expr) else {
        panic!("expected template literal");
    };
    assert_eq!(chunks, &["hello ".to_string(), "!".to_string()]);
    assert_eq!(exprs.len(), 1);
}

#[test]
fn object_literal_keys_normalize_to_strings() {
    let (program, id) = first_stmt("x = {a: 1, \"b\": \"x\"};");
    let Stmt::Expression { expr, .. } = program.ast.stmt(id) else {
        panic!("expected expression statement");
    };
    let Expr::Assign { value, .. } = program.ast.expr(*expr) else {
        panic!("expected assignment");
    };
    let Expr::Object { props, .. } = program.ast.expr(*value) else {
        panic!("expected object literal");
    };
    assert_eq!(props.len(), 2);
    for (prop, expected) in props.iter().zip(["a", "b"]) {
        let Expr::Str { value, .. } = program.ast.expr(prop.key) else {
            panic!("object key should be a string literal");
        };
        assert_eq!(value, expected);
    }
}

#[test]
fn bracket_access_and_assignment() {
    let (program, id) = first_stmt("row[\"name\"] = user.name;");
    let Stmt::Expression { expr, .. } = program.ast.stmt(id) else {
        panic!("expected expression statement");
    };
    let Expr::Assign { target, .. } = program.ast.expr(*expr) else {
        panic!("expected assignment");
    };
    assert!(matches!(program.ast.expr(*target), Expr::Bracket { .. }));
}

#[test]
fn iife_wrapper_shape() {
    let program = parse("(function () {\nvar a = 1;\nreturn a;\n})()").expect("parse failed");
    assert_eq!(program.body.len(), 1);
    let Stmt::Expression { expr, .. } = program.ast.stmt(program.body[0]) else {
        panic!("expected expression statement");
    };
    let Expr::Call { callee, args, .. } = program.ast.expr(*expr) else {
        panic!("expected call");
    };
    assert!(args.is_empty());
    let Expr::Paren { inner, .. } = program.ast.expr(*callee) else {
        panic!("expected parenthesized callee");
    };
    let Expr::Function { params, body, .. } = program.ast.expr(*inner) else {
        panic!("expected function literal");
    };
    assert!(params.is_empty());
    let Stmt::Block { body, .. } = program.ast.stmt(*body) else {
        panic!("expected block body");
    };
    assert_eq!(body.len(), 2);
}

#[test]
fn negative_number_literal() {
    let (program, id) = first_stmt("x = -3;");
    let Stmt::Expression { expr, .. } = program.ast.stmt(id) else {
        panic!("expected expression statement");
    };
    let Expr::Assign { value, .. } = program.ast.expr(*expr) else {
        panic!("expected assignment");
    };
    let Expr::Number { raw, .. } = program.ast.expr(*value) else {
        panic!("expected number literal");
    };
    assert_eq!(raw, "-3");
}

// ── Errors ─────────────────────────────────────────────────────────────

#[test]
fn error_on_invalid_assignment_target() {
    let err = parse("1 = 2;").unwrap_err();
    assert!(err.message.contains("assignment target"), "{}", err.message);
}

#[test]
fn error_on_unary_bang() {
    let err = parse("if (!a) { return; }").unwrap_err();
    assert!(err.message.contains("`!`"), "{}", err.message);
}

#[test]
fn error_on_unterminated_template() {
    assert!(parse("`oops").is_err());
}

#[test]
fn error_spans_point_at_offender() {
    let err = parse("var = 1;").unwrap_err();
    assert_eq!(err.span.start, 4);
}
