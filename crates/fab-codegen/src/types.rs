//! Value type to Go type mapping, plus shared naming helpers.

use fab_common::ValueType;
use fab_compile::Class;

/// Upper-camel the first character, the way emitted members are named.
pub fn first_to_upper(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// The emitted type name of a class: all path segments upper-camelled
/// plus a space suffix, so classes stay unique within the flat package.
pub fn class_type_name(class: &Class) -> String {
    let mut name = String::new();
    for segment in &class.path {
        name.push_str(&first_to_upper(segment));
    }
    let suffix = match class.space_name.as_str() {
        "service" => "Service",
        "func" => "Func",
        "storage" => "Dao",
        _ => "",
    };
    name + suffix
}

/// The emitted singleton variable a class is addressed through.
pub fn class_bean_name(class: &Class) -> String {
    class_type_name(class) + "Bean"
}

/// The emitted type name of a struct model, from its last path segment.
pub fn struct_type_name(name_path: &str) -> String {
    first_to_upper(name_path.rsplit('/').next().unwrap_or(name_path))
}

/// Qualify a struct reference from the viewpoint of `current`: bare
/// inside the struct package, alias-qualified elsewhere.
pub fn struct_ref(current: &Class, name_path: &str) -> String {
    let type_name = struct_type_name(name_path);
    if current.space_name == "struct" {
        return type_name;
    }
    let alias = current.import_as_name("struct").unwrap_or("structs");
    format!("{alias}.{type_name}")
}

/// Map a value type to its Go type string.
pub fn go_type(current: &Class, t: &ValueType) -> String {
    match t {
        ValueType::Int8 => "int8".into(),
        ValueType::Int16 => "int16".into(),
        ValueType::Int32 => "int32".into(),
        ValueType::Int64 => "int64".into(),
        ValueType::Uint8 => "uint8".into(),
        ValueType::Uint16 => "uint16".into(),
        ValueType::Uint32 => "uint32".into(),
        ValueType::Uint64 => "uint64".into(),
        ValueType::Float32 => "float32".into(),
        ValueType::Float64 => "float64".into(),
        ValueType::Bool => "bool".into(),
        ValueType::String => "string".into(),
        ValueType::Bytes => "[]byte".into(),
        ValueType::Map => "map[string]any".into(),
        ValueType::List(elem) => format!("[]{}", go_type(current, elem)),
        ValueType::Null => "any".into(),
        ValueType::Context => "context.Context".into(),
        ValueType::Struct(name) => format!("*{}", struct_ref(current, name)),
    }
}

/// Quote a string literal for emission.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_to_upper_basics() {
        assert_eq!(first_to_upper("get"), "Get");
        assert_eq!(first_to_upper("Get"), "Get");
        assert_eq!(first_to_upper(""), "");
    }

    #[test]
    fn struct_type_name_uses_last_segment() {
        assert_eq!(struct_type_name("user/User"), "User");
        assert_eq!(struct_type_name("order"), "Order");
    }

    #[test]
    fn quote_escapes() {
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote("line\n"), "\"line\\n\"");
    }
}
