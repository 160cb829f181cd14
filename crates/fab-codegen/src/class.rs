//! Class-level emission: one Go file per class.
//!
//! Constant classes emit const blocks, error classes emit error values,
//! struct classes emit plain types with json tags, and storage, service,
//! and func classes emit a receiver type with its bean and methods.

use fab_common::{CompileError, ValueType};
use fab_compile::{
    imports::{class_dir, class_file, space_package},
    Class, ClassId, FieldOrigin, Graph, ImportTarget, Method,
};

use crate::method::{method_signature, MethodEmitter};
use crate::types::{class_type_name, first_to_upper, go_type, quote, struct_type_name};
use crate::writer::SourceWriter;
use crate::GeneratedFile;

pub(crate) fn emit_class(
    graph: &Graph,
    class_id: ClassId,
    module: &str,
) -> Result<Option<GeneratedFile>, CompileError> {
    let class = graph.class(class_id);
    let source = match class.space_name.as_str() {
        "constant" => constants_source(class),
        "error" => errors_source(class),
        "struct" => struct_source(class),
        "storage" | "service" | "func" => methods_source(graph, class, module)?,
        _ => return Ok(None),
    };
    Ok(Some(GeneratedFile {
        key: class.key(),
        path: class_file(class),
        source,
    }))
}

fn header(w: &mut SourceWriter, package: &str) {
    w.line("// Code generated by fab; DO NOT EDIT.");
    w.newline();
    w.line(&format!("package {package}"));
    w.newline();
}

// ── Constant classes ───────────────────────────────────────────────────

fn constants_source(class: &Class) -> String {
    let mut w = SourceWriter::new();
    header(&mut w, space_package(&class.space_name));
    if class.fields.is_empty() {
        return w.finish();
    }
    w.line("const (");
    w.indent();
    for field in &class.fields {
        let FieldOrigin::Constant(option) = &field.origin else {
            continue;
        };
        if !option.comment.is_empty() {
            w.line(&format!(
                "// {} {}",
                first_to_upper(&option.name),
                option.comment
            ));
        }
        let type_str = ValueType::from_name(&option.value_type)
            .map(|t| t.name())
            .unwrap_or_else(|| "string".to_string());
        w.line(&format!(
            "{} {} = {}",
            first_to_upper(&option.name),
            type_str,
            constant_literal(field.var_type.value_type(), &option.value)
        ));
    }
    w.dedent();
    w.line(")");
    w.finish()
}

fn constant_literal(value_type: Option<&ValueType>, value: &str) -> String {
    match value_type {
        Some(t) if t.is_number() => {
            if value.is_empty() {
                "0".to_string()
            } else {
                value.to_string()
            }
        }
        Some(ValueType::Bool) => {
            if value.is_empty() {
                "false".to_string()
            } else {
                value.to_string()
            }
        }
        _ => quote(value),
    }
}

// ── Error classes ──────────────────────────────────────────────────────

fn errors_source(class: &Class) -> String {
    let mut w = SourceWriter::new();
    header(&mut w, space_package(&class.space_name));
    w.line("import (");
    w.indent();
    w.line("\"errors\"");
    w.dedent();
    w.line(")");
    w.newline();
    if class.fields.is_empty() {
        return w.finish();
    }
    w.line("var (");
    w.indent();
    for field in &class.fields {
        let FieldOrigin::Error(option) = &field.origin else {
            continue;
        };
        if !option.comment.is_empty() {
            w.line(&format!(
                "// {} {}",
                first_to_upper(&option.name),
                option.comment
            ));
        }
        let message = if option.code.is_empty() {
            option.msg.clone()
        } else {
            format!("{}:{}", option.code, option.msg)
        };
        w.line(&format!(
            "{} error = errors.New({})",
            first_to_upper(&option.name),
            quote(&message)
        ));
    }
    w.dedent();
    w.line(")");
    w.finish()
}

// ── Struct classes ─────────────────────────────────────────────────────

fn struct_source(class: &Class) -> String {
    let mut w = SourceWriter::new();
    header(&mut w, space_package(&class.space_name));
    let type_name = class
        .strukt
        .as_ref()
        .map(|model| struct_type_name(&model.name))
        .unwrap_or_else(|| class_type_name(class));
    if let Some(comment) = class.strukt.as_ref().map(|m| m.comment.as_str()) {
        if !comment.is_empty() {
            w.line(&format!("// {type_name} {comment}"));
        }
    }
    w.line(&format!("type {type_name} struct {{"));
    w.indent();
    for field in &class.fields {
        let FieldOrigin::Struct(model_field) = &field.origin else {
            continue;
        };
        let json_name = model_field
            .json_name
            .clone()
            .unwrap_or_else(|| model_field.name.clone());
        let type_str = field
            .var_type
            .value_type()
            .map(|t| go_type(class, t))
            .unwrap_or_else(|| "any".to_string());
        w.line(&format!(
            "{} {} `json:\"{},omitempty\"`",
            first_to_upper(&model_field.name),
            type_str,
            json_name
        ));
    }
    w.dedent();
    w.line("}");
    w.finish()
}

// ── Method-bearing classes ─────────────────────────────────────────────

fn methods_source(graph: &Graph, class: &Class, module: &str) -> Result<String, CompileError> {
    let mut w = SourceWriter::new();
    header(&mut w, space_package(&class.space_name));

    let imports = import_block(graph, class, module);
    if !imports.is_empty() {
        w.line("import (");
        w.indent();
        for line in &imports {
            w.line(line);
        }
        w.dedent();
        w.line(")");
        w.newline();
    }

    let type_name = class_type_name(class);
    w.line(&format!("type {type_name} struct {{"));
    w.line("}");
    w.newline();
    w.line(&format!("var {type_name}Bean = &{type_name}{{}}"));
    w.newline();

    for method in &class.methods {
        if let Some(script) = &method.script {
            MethodEmitter::new(graph, class, method, script, &mut w)
                .gen()
                .map_err(|e| e.with_class(class.key()).with_method(&method.name))?;
            w.newline();
        } else if method.sql.is_some() {
            storage_method(&mut w, class, method);
            w.newline();
        }
    }
    Ok(w.finish())
}

/// The emitted import block lines, in registration order. Same-space
/// class imports are elided (same package), as are the call-only space
/// heads whose references always route through class imports.
fn import_block(graph: &Graph, class: &Class, module: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for import in &class.imports {
        if import.is_this {
            continue;
        }
        let path = match &import.target {
            ImportTarget::Class(target) => {
                let target = graph.class(*target);
                if target.space == class.space {
                    continue;
                }
                format!("{module}/{}", class_dir(target))
            }
            ImportTarget::Path(p) => {
                if matches!(p.as_str(), "service" | "storage" | "func") {
                    continue;
                }
                import_path_str(module, p)
            }
        };
        let base = path.rsplit('/').next().unwrap_or(&path);
        match import.alias.as_deref() {
            Some(alias) if alias != base => lines.push(format!("{alias} {}", quote(&path))),
            _ => lines.push(quote(&path)),
        }
    }
    lines
}

fn import_path_str(module: &str, import: &str) -> String {
    match import {
        "fmt" => "fmt".to_string(),
        "context" => "context".to_string(),
        "logger" => format!("{module}/common/logger"),
        "util" => format!("{module}/common/util"),
        "common" => format!("{module}/common"),
        "constant" | "error" | "struct" => {
            format!("{module}/{}", space_package(import))
        }
        other => match other.strip_prefix("component_") {
            Some(component) => format!("{module}/component/{component}"),
            None => other.to_string(),
        },
    }
}

/// Emit a storage (DAO) method from its declared SQL: bind the args,
/// dispatch on the declared result shape, guard, return.
fn storage_method(w: &mut SourceWriter, class: &Class, method: &Method) {
    let method_name = first_to_upper(&method.name);
    w.tabs();
    w.code("// ");
    w.code(&method_name);
    if !method.comment.is_empty() {
        w.code(" ");
        w.code(&method.comment);
    }
    w.newline();

    w.line(&method_signature(class, method));
    w.indent();

    if !method.params.is_empty() {
        let names: Vec<&str> = method.params.iter().map(|p| p.name.as_str()).collect();
        w.line(&format!("args := []any{{{}}}", names.join(", ")));
    }

    let db_alias = class.import_as_name("db").unwrap_or("db");
    let call_name = match method.result.value_type() {
        Some(ValueType::List(_)) => "Query",
        Some(ValueType::Map) => "QueryOne",
        Some(_) => "Count",
        None => "Exec",
    };
    let sql = method.sql.as_deref().unwrap_or_default();
    let mut call = String::new();
    if method.result.value_type().is_some() {
        call.push_str("res, err = ");
    } else {
        call.push_str("err = ");
    }
    call.push_str(&format!("{db_alias}.{call_name}(`{sql}`"));
    if !method.params.is_empty() {
        call.push_str(", args...");
    }
    call.push(')');
    w.line(&call);

    w.line("if err != nil {");
    w.indent();
    w.line("return");
    w.dedent();
    w.line("}");
    w.line("return");
    w.dedent();
    w.line("}");
}
