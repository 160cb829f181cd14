//! The value-type lattice.
//!
//! Every script expression and model field is described by a [`ValueType`]:
//! a named primitive, a string-keyed map, a list, `null`, the request
//! context, or a reference to a user-declared struct. Ambiguous
//! observations are reconciled by [`ValueType::join`], the *upgrade* rule.

use std::fmt;

use serde::Serialize;

use crate::error::{CompileError, CompileErrorKind};

/// A value type as seen by the analyzer and the emitter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ValueType {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Bool,
    String,
    Bytes,
    /// A string-keyed map with heterogeneous values.
    Map,
    /// A homogeneous list.
    List(Box<ValueType>),
    /// The null literal; absorbed by any other type on join.
    Null,
    /// The request context threaded through service calls.
    Context,
    /// A reference to a user-declared struct, by registry name path.
    Struct(String),
}

impl ValueType {
    /// Canonical table lookup for primitive type names.
    ///
    /// Struct names are not resolved here; callers fall back to the model
    /// registry when this returns `None`. A `[]` prefix denotes a list.
    pub fn from_name(name: &str) -> Option<ValueType> {
        if let Some(elem) = name.strip_prefix("[]") {
            return ValueType::from_name(elem).map(|t| ValueType::List(Box::new(t)));
        }
        let t = match name {
            "int8" => ValueType::Int8,
            "int16" => ValueType::Int16,
            "int32" | "int" => ValueType::Int32,
            "int64" | "long" => ValueType::Int64,
            "uint8" => ValueType::Uint8,
            "uint16" => ValueType::Uint16,
            "uint32" => ValueType::Uint32,
            "uint64" => ValueType::Uint64,
            "float32" | "float" => ValueType::Float32,
            "float64" | "double" => ValueType::Float64,
            "bool" | "boolean" => ValueType::Bool,
            "string" => ValueType::String,
            "bytes" => ValueType::Bytes,
            "map" => ValueType::Map,
            "null" => ValueType::Null,
            "context" => ValueType::Context,
            _ => return None,
        };
        Some(t)
    }

    /// Whether this is one of the numeric primitives.
    pub fn is_number(&self) -> bool {
        matches!(
            self,
            ValueType::Int8
                | ValueType::Int16
                | ValueType::Int32
                | ValueType::Int64
                | ValueType::Uint8
                | ValueType::Uint16
                | ValueType::Uint32
                | ValueType::Uint64
                | ValueType::Float32
                | ValueType::Float64
        )
    }

    /// The canonical model-facing name.
    pub fn name(&self) -> String {
        match self {
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
            ValueType::Bytes => "bytes".into(),
            ValueType::Map => "map".into(),
            ValueType::List(elem) => format!("[]{}", elem.name()),
            ValueType::Null => "null".into(),
            ValueType::Context => "context".into(),
            ValueType::Struct(name) => name.clone(),
        }
    }

    /// Join two observed types -- the *upgrade* rule.
    ///
    /// Identical types join to themselves. Two numerics join to the
    /// *second* observation. `null` on either side is absorbed by the
    /// non-null side. Anything else fails with `TypeMismatch`.
    pub fn join(&self, other: &ValueType) -> Result<ValueType, CompileError> {
        if self == other {
            return Ok(other.clone());
        }
        if self.is_number() && other.is_number() {
            return Ok(other.clone());
        }
        if *other == ValueType::Null {
            return Ok(self.clone());
        }
        if *self == ValueType::Null {
            return Ok(other.clone());
        }
        Err(CompileError::new(CompileErrorKind::TypeMismatch {
            from: self.name(),
            to: other.name(),
        }))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_primitives() {
        assert_eq!(ValueType::from_name("int64"), Some(ValueType::Int64));
        assert_eq!(ValueType::from_name("string"), Some(ValueType::String));
        assert_eq!(ValueType::from_name("map"), Some(ValueType::Map));
        assert_eq!(
            ValueType::from_name("[]string"),
            Some(ValueType::List(Box::new(ValueType::String)))
        );
        assert_eq!(
            ValueType::from_name("[][]map"),
            Some(ValueType::List(Box::new(ValueType::List(Box::new(
                ValueType::Map
            )))))
        );
        assert_eq!(ValueType::from_name("User"), None);
    }

    // ── Upgrade-rule laws ──────────────────────────────────────────────

    #[test]
    fn join_identical_is_identity() {
        let t = ValueType::Struct("User".into());
        assert_eq!(t.join(&t).unwrap(), t);
    }

    #[test]
    fn join_null_absorbs_either_side() {
        let t = ValueType::String;
        assert_eq!(t.join(&ValueType::Null).unwrap(), t);
        assert_eq!(ValueType::Null.join(&t).unwrap(), t);
    }

    #[test]
    fn join_numeric_prefers_second_observation() {
        assert_eq!(
            ValueType::Int32.join(&ValueType::Int64).unwrap(),
            ValueType::Int64
        );
        assert_eq!(
            ValueType::Int64.join(&ValueType::Int32).unwrap(),
            ValueType::Int32
        );
        assert_eq!(
            ValueType::Int64.join(&ValueType::Float64).unwrap(),
            ValueType::Float64
        );
    }

    #[test]
    fn join_incompatible_fails() {
        let err = ValueType::String.join(&ValueType::Map).unwrap_err();
        assert!(matches!(
            err.kind,
            CompileErrorKind::TypeMismatch { .. }
        ));
    }

    #[test]
    fn is_number_covers_all_numerics() {
        for name in [
            "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32", "uint64", "float32",
            "float64",
        ] {
            assert!(ValueType::from_name(name).unwrap().is_number(), "{name}");
        }
        assert!(!ValueType::String.is_number());
        assert!(!ValueType::Map.is_number());
    }
}
