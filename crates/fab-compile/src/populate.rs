//! Graph population from the model registry.
//!
//! Creates the spaces in a fixed order, then one class per constant,
//! error, and struct model and one method per storage, service, and func
//! model. Everything downstream iterates insertion order, so this pass
//! pins the emission order.

use fab_common::{CompileError, ValueType};
use fab_model::{App, ArgModel};
use log::debug;

use crate::namespace::{ClassId, FieldOrigin, Graph};
use crate::value_type::VarType;

/// The spaces of every compile run, in emission order.
pub const SPACE_ORDER: &[&str] = &["constant", "error", "struct", "storage", "service", "func"];

pub(crate) fn populate(app: &App, graph: &mut Graph) -> Result<(), CompileError> {
    for space in SPACE_ORDER {
        graph.get_or_create_space(space);
    }

    for model in app.constants() {
        let (_, class) = graph.get_class("constant", &model.name, true);
        debug!("populate constant class [{}]", graph.class(class).key());
        for option in &model.options {
            let value_type = app
                .value_type(&option.value_type)
                .map_err(|e| e.with_class(graph.class(class).key()))?;
            graph.class_mut(class).add_field(
                &option.name,
                VarType::with(value_type),
                FieldOrigin::Constant(option.clone()),
            );
        }
        graph.class_mut(class).constant = Some(model.clone());
    }

    for model in app.errors() {
        let (_, class) = graph.get_class("error", &model.name, true);
        debug!("populate error class [{}]", graph.class(class).key());
        for option in &model.options {
            graph.class_mut(class).add_field(
                &option.name,
                VarType::new(),
                FieldOrigin::Error(option.clone()),
            );
        }
        graph.class_mut(class).error = Some(model.clone());
    }

    for model in app.structs() {
        let (_, class) = graph.get_class("struct", &model.name, true);
        debug!("populate struct class [{}]", graph.class(class).key());
        for field in &model.fields {
            let value_type = app
                .value_type(&field.value_type)
                .map_err(|e| e.with_class(graph.class(class).key()))?;
            graph.class_mut(class).add_field(
                &field.name,
                VarType::with(value_type),
                FieldOrigin::Struct(field.clone()),
            );
        }
        graph.class_mut(class).strukt = Some(model.clone());
    }

    for model in app.storages() {
        let (end_name, class) = graph.get_class("storage", &model.name, false);
        let name = end_name.unwrap_or_else(|| model.name.clone());
        let index = create_method(app, graph, class, &name, &model.comment, &model.args, &model.result)?;
        let class_mut = graph.class_mut(class);
        class_mut.methods[index].sql = Some(model.sql.clone());
        // Storage bodies run through the database component.
        class_mut.get_or_create_import_path("component_db");
    }

    for model in app.services() {
        let (end_name, class) = graph.get_class("service", &model.name, false);
        let name = end_name.unwrap_or_else(|| model.name.clone());
        let index = create_method(app, graph, class, &name, &model.comment, &model.args, &model.result)?;
        graph.class_mut(class).methods[index].source = Some(model.func.clone());
    }

    for model in app.funcs() {
        let (end_name, class) = graph.get_class("func", &model.name, false);
        let name = end_name.unwrap_or_else(|| model.name.clone());
        let index = create_method(app, graph, class, &name, &model.comment, &model.args, &model.result)?;
        graph.class_mut(class).methods[index].source = Some(model.func.clone());
    }

    Ok(())
}

fn create_method(
    app: &App,
    graph: &mut Graph,
    class: ClassId,
    name: &str,
    comment: &str,
    args: &[ArgModel],
    result: &str,
) -> Result<usize, CompileError> {
    let class_key = graph.class(class).key();
    debug!("populate {class_key} method [{name}]");

    let mut params = Vec::new();
    for arg in args {
        let value_type = app
            .value_type(&arg.value_type)
            .map_err(|e| e.with_class(&class_key).with_method(name))?;
        params.push((arg.name.clone(), value_type));
    }
    let result_type = if result.is_empty() {
        None
    } else {
        Some(
            app.value_type(result)
                .map_err(|e| e.with_class(&class_key).with_method(name))?,
        )
    };

    let needs_context = params.iter().any(|(_, t)| *t == ValueType::Context);
    let needs_struct = params.iter().any(|(_, t)| contains_struct(t))
        || result_type.as_ref().is_some_and(contains_struct);
    let class_mut = graph.class_mut(class);
    let index = class_mut.get_or_create_method(name);
    let method = &mut class_mut.methods[index];
    method.comment = comment.to_string();
    for (param_name, value_type) in params {
        method.add_param(&param_name, VarType::with(value_type));
    }
    if let Some(t) = result_type {
        method.result = VarType::with(t);
    }
    if needs_context {
        class_mut.get_or_create_import_path("context");
    }
    if needs_struct {
        // Struct-typed signatures reference the struct package.
        class_mut.get_or_create_import_path("struct");
    }
    Ok(index)
}

/// Whether a type mentions a struct reference anywhere.
fn contains_struct(t: &ValueType) -> bool {
    match t {
        ValueType::Struct(_) => true,
        ValueType::List(elem) => contains_struct(elem),
        _ => false,
    }
}
