//! Model record definitions.
//!
//! Every record carries a `name` that is its slash-joined path within the
//! model tree (e.g. `user/get`); the loader fills it from the file path.
//! Field names mirror the model-file keys.

use serde::{Deserialize, Serialize};

use crate::component::ComponentKind;

/// A constant pack: a named group of constant options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstantModel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub options: Vec<ConstantOption>,
}

/// One constant: name, declared value type, and literal value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstantOption {
    pub name: String,
    #[serde(default = "default_string_type", rename = "type")]
    pub value_type: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub comment: String,
}

/// An error pack: a named group of error options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorModel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub options: Vec<ErrorOption>,
}

/// One error value: name, wire code, and message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorOption {
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub comment: String,
}

/// A struct declaration with ordered fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructModel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub fields: Vec<StructField>,
}

/// One struct field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    #[serde(default = "default_string_type", rename = "type")]
    pub value_type: String,
    #[serde(default)]
    pub comment: String,
    /// Wire name override for the emitted json tag.
    #[serde(default)]
    pub json_name: Option<String>,
}

/// A declared method argument.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArgModel {
    pub name: String,
    #[serde(default = "default_string_type", rename = "type")]
    pub value_type: String,
}

/// A service or func method: declared signature plus script body.
///
/// Services and funcs share this shape; they differ only in which space
/// the compiler places them in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FuncModel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub args: Vec<ArgModel>,
    /// Result value type name; empty means the method returns nothing.
    #[serde(default)]
    pub result: String,
    /// The embedded script body.
    #[serde(default)]
    pub func: String,
}

/// A storage (DAO) method: declared signature plus the SQL it runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageModel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub args: Vec<ArgModel>,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub sql: String,
}

/// A component instance, e.g. the default `db` or a named `db_user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentModel {
    #[serde(default)]
    pub name: String,
    pub kind: ComponentKind,
    #[serde(default)]
    pub comment: String,
}

fn default_string_type() -> String {
    "string".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn func_model_deserializes_with_defaults() {
        let model: FuncModel = serde_json::from_str(
            r#"{
                "comment": "add two numbers",
                "args": [
                    {"name": "a", "type": "int32"},
                    {"name": "b", "type": "int32"}
                ],
                "result": "int32",
                "func": "return a + b;"
            }"#,
        )
        .unwrap();
        assert_eq!(model.args.len(), 2);
        assert_eq!(model.args[0].value_type, "int32");
        assert_eq!(model.result, "int32");
        assert!(model.name.is_empty());
    }

    #[test]
    fn struct_field_type_defaults_to_string() {
        let model: StructModel =
            serde_json::from_str(r#"{"fields": [{"name": "nick"}]}"#).unwrap();
        assert_eq!(model.fields[0].value_type, "string");
    }

    #[test]
    fn component_model_kind_is_lowercase() {
        let model: ComponentModel =
            serde_json::from_str(r#"{"name": "db_user", "kind": "db"}"#).unwrap();
        assert_eq!(model.kind, ComponentKind::Db);
    }
}
