//! Observed-type records for variables, params, fields, and results.
//!
//! A [`VarType`] accumulates the value types observed for one slot across
//! the analyzer pass, joining them with the lattice upgrade rule. Map
//! subscript paths lazily materialize insertion-ordered children, so a
//! variable first seen as `row["user"]["name"]` grows a two-level child
//! tree. The emitter only ever reads the frozen result.

use fab_common::{CompileError, CompileErrorKind, ValueType};
use fab_model::App;
use rustc_hash::FxHashMap;

/// The growing type record of one value slot.
#[derive(Debug, Clone, Default)]
pub struct VarType {
    /// Distinct observations, in order. The current type is their join.
    types: Vec<ValueType>,
    value_type: Option<ValueType>,
    subs: Vec<VarSub>,
    sub_index: FxHashMap<String, usize>,
}

/// A named child slot of a map- or struct-typed value.
#[derive(Debug, Clone)]
pub struct VarSub {
    pub name: String,
    pub var_type: VarType,
}

impl VarType {
    pub fn new() -> Self {
        Self::default()
    }

    /// A record that starts with one declared observation.
    pub fn with(value_type: ValueType) -> Self {
        let mut v = Self::default();
        v.types.push(value_type.clone());
        v.value_type = Some(value_type);
        v
    }

    /// The current joined type, if any observation has been made.
    pub fn value_type(&self) -> Option<&ValueType> {
        self.value_type.as_ref()
    }

    /// Child slots in insertion order.
    pub fn subs(&self) -> &[VarSub] {
        &self.subs
    }

    /// Record one more observation, joining it into the current type.
    ///
    /// Repeat observations of an already-seen type are no-ops, so
    /// re-running analysis never changes the record.
    pub fn observe(&mut self, observed: ValueType) -> Result<(), CompileError> {
        if self.types.contains(&observed) {
            return Ok(());
        }
        self.value_type = Some(match &self.value_type {
            None => observed.clone(),
            Some(current) => current.join(&observed)?,
        });
        self.types.push(observed);
        Ok(())
    }

    /// Walk (and grow) the child tree along a dotted/bracket path.
    ///
    /// An unset slot becomes `map` on first subscript. A map slot
    /// auto-creates an unknown child. A struct slot resolves the declared
    /// field through the registry or fails with `UnknownField`. Any other
    /// type yields `None`: the path does not resolve to a slot.
    pub fn get_path(
        &mut self,
        path: &str,
        app: &App,
    ) -> Result<Option<&mut VarType>, CompileError> {
        let (head, rest) = split_path(path);

        if !self.sub_index.contains_key(&head) {
            if self.value_type.is_none() {
                self.observe(ValueType::Map)?;
            }
            match self.value_type.clone() {
                Some(ValueType::Map) => {
                    self.add_sub(head.clone(), None);
                }
                Some(ValueType::Struct(struct_name)) => {
                    let model = app.struct_model(&struct_name).ok_or_else(|| {
                        CompileError::model_lookup(struct_name.clone())
                    })?;
                    let field = model.fields.iter().find(|f| f.name == head).ok_or_else(|| {
                        CompileError::new(CompileErrorKind::UnknownField {
                            type_name: struct_name.clone(),
                            field: head.clone(),
                        })
                    })?;
                    let field_type = app.value_type(&field.value_type)?;
                    self.add_sub(head.clone(), Some(field_type));
                }
                _ => return Ok(None),
            }
        }

        let index = self.sub_index[&head];
        let sub = &mut self.subs[index].var_type;
        match rest {
            Some(rest) => sub.get_path(&rest, app),
            None => Ok(Some(sub)),
        }
    }

    fn add_sub(&mut self, name: String, value_type: Option<ValueType>) {
        let var_type = match value_type {
            Some(t) => VarType::with(t),
            None => VarType::new(),
        };
        self.sub_index.insert(name.clone(), self.subs.len());
        self.subs.push(VarSub { name, var_type });
    }
}

/// Split an access path at its first separator.
///
/// Accepts both dotted and bracket-string forms: `a.b.c`, `a["b"].c`,
/// `a["b"]["c"]`. Returns the head segment (quote trimmed) and the
/// remaining path, if any.
pub fn split_path(path: &str) -> (String, Option<String>) {
    let dot = path.find('.');
    let bracket = path.find("[\"");
    let cut = match (dot, bracket) {
        (Some(d), Some(b)) => Some(d.min(b)),
        (Some(d), None) => Some(d),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    };
    let Some(cut) = cut else {
        return (path.trim_end_matches("\"]").to_string(), None);
    };
    let head = path[..cut].trim_end_matches("\"]").to_string();
    let mut rest = &path[cut..];
    if let Some(stripped) = rest.strip_prefix('.') {
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix("[\"") {
        rest = stripped;
    }
    (head, Some(rest.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fab_model::{StructField, StructModel};

    fn app_with_user() -> App {
        let mut app = App::new();
        app.add_struct(StructModel {
            name: "User".into(),
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
        app
    }

    #[test]
    fn split_path_forms() {
        assert_eq!(split_path("a"), ("a".into(), None));
        assert_eq!(split_path("a.b.c"), ("a".into(), Some("b.c".into())));
        assert_eq!(split_path("a[\"b\"]"), ("a".into(), Some("b\"]".into())));
        assert_eq!(split_path("b\"]"), ("b".into(), None));
        assert_eq!(
            split_path("a[\"b\"].c"),
            ("a".into(), Some("b\"].c".into()))
        );
        assert_eq!(split_path("b\"].c"), ("b".into(), Some("c".into())));
    }

    #[test]
    fn unset_slot_becomes_map_on_subscript() {
        let app = App::new();
        let mut v = VarType::new();
        let child = v.get_path("x", &app).unwrap();
        assert!(child.is_some());
        assert_eq!(v.value_type(), Some(&ValueType::Map));
        assert_eq!(v.subs().len(), 1);
        assert_eq!(v.subs()[0].name, "x");
    }

    #[test]
    fn bracket_path_grows_nested_children() {
        let app = App::new();
        let mut v = VarType::with(ValueType::Map);
        v.get_path("a[\"b\"]", &app).unwrap().unwrap();
        assert_eq!(v.subs().len(), 1);
        assert_eq!(v.subs()[0].name, "a");
        assert_eq!(v.subs()[0].var_type.subs()[0].name, "b");
    }

    #[test]
    fn struct_path_resolves_declared_field() {
        let app = app_with_user();
        let mut v = VarType::with(ValueType::Struct("User".into()));
        let child = v.get_path("age", &app).unwrap().unwrap();
        assert_eq!(child.value_type(), Some(&ValueType::Int32));
    }

    #[test]
    fn struct_path_unknown_field_fails() {
        let app = app_with_user();
        let mut v = VarType::with(ValueType::Struct("User".into()));
        let err = v.get_path("missing", &app).unwrap_err();
        assert!(matches!(
            err.kind,
            CompileErrorKind::UnknownField { .. }
        ));
    }

    #[test]
    fn primitive_path_yields_none() {
        let app = App::new();
        let mut v = VarType::with(ValueType::String);
        assert!(v.get_path("x", &app).unwrap().is_none());
    }

    #[test]
    fn observe_is_idempotent() {
        let mut v = VarType::new();
        v.observe(ValueType::Int32).unwrap();
        v.observe(ValueType::Int64).unwrap();
        v.observe(ValueType::Int32).unwrap();
        // Int32 was already recorded once; re-observation does not rejoin.
        assert_eq!(v.value_type(), Some(&ValueType::Int64));
        assert_eq!(v.types.len(), 2);
    }

    #[test]
    fn observe_null_keeps_current_type() {
        let mut v = VarType::with(ValueType::String);
        v.observe(ValueType::Null).unwrap();
        assert_eq!(v.value_type(), Some(&ValueType::String));
    }
}
