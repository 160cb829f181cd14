//! The in-memory model registry.
//!
//! Holds every loaded model record, insertion-ordered, with name indexes
//! for lookup. Insertion order is what the compiler later iterates, so
//! registry population order fully determines emission order.

use fab_common::{CompileError, ValueType};
use rustc_hash::FxHashMap;

use crate::component::ComponentMethod;
use crate::models::{
    ComponentModel, ConstantModel, ErrorModel, FuncModel, StorageModel, StructModel,
};

/// The application model registry.
#[derive(Debug, Default)]
pub struct App {
    constants: Vec<ConstantModel>,
    constant_index: FxHashMap<String, usize>,
    errors: Vec<ErrorModel>,
    error_index: FxHashMap<String, usize>,
    structs: Vec<StructModel>,
    struct_index: FxHashMap<String, usize>,
    storages: Vec<StorageModel>,
    storage_index: FxHashMap<String, usize>,
    services: Vec<FuncModel>,
    service_index: FxHashMap<String, usize>,
    funcs: Vec<FuncModel>,
    func_index: FxHashMap<String, usize>,
    components: Vec<ComponentModel>,
    component_index: FxHashMap<String, usize>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration ───────────────────────────────────────────────────
    // Re-registering a name replaces the earlier record in place, keeping
    // the original position.

    pub fn add_constant(&mut self, model: ConstantModel) {
        if let Some(&i) = self.constant_index.get(&model.name) {
            self.constants[i] = model;
            return;
        }
        self.constant_index
            .insert(model.name.clone(), self.constants.len());
        self.constants.push(model);
    }

    pub fn add_error(&mut self, model: ErrorModel) {
        if let Some(&i) = self.error_index.get(&model.name) {
            self.errors[i] = model;
            return;
        }
        self.error_index.insert(model.name.clone(), self.errors.len());
        self.errors.push(model);
    }

    pub fn add_struct(&mut self, model: StructModel) {
        if let Some(&i) = self.struct_index.get(&model.name) {
            self.structs[i] = model;
            return;
        }
        self.struct_index
            .insert(model.name.clone(), self.structs.len());
        self.structs.push(model);
    }

    pub fn add_storage(&mut self, model: StorageModel) {
        if let Some(&i) = self.storage_index.get(&model.name) {
            self.storages[i] = model;
            return;
        }
        self.storage_index
            .insert(model.name.clone(), self.storages.len());
        self.storages.push(model);
    }

    pub fn add_service(&mut self, model: FuncModel) {
        if let Some(&i) = self.service_index.get(&model.name) {
            self.services[i] = model;
            return;
        }
        self.service_index
            .insert(model.name.clone(), self.services.len());
        self.services.push(model);
    }

    pub fn add_func(&mut self, model: FuncModel) {
        if let Some(&i) = self.func_index.get(&model.name) {
            self.funcs[i] = model;
            return;
        }
        self.func_index.insert(model.name.clone(), self.funcs.len());
        self.funcs.push(model);
    }

    pub fn add_component(&mut self, model: ComponentModel) {
        if let Some(&i) = self.component_index.get(&model.name) {
            self.components[i] = model;
            return;
        }
        self.component_index
            .insert(model.name.clone(), self.components.len());
        self.components.push(model);
    }

    // ── Lookup ─────────────────────────────────────────────────────────

    pub fn constant(&self, name: &str) -> Option<&ConstantModel> {
        self.constant_index.get(name).map(|&i| &self.constants[i])
    }

    pub fn error(&self, name: &str) -> Option<&ErrorModel> {
        self.error_index.get(name).map(|&i| &self.errors[i])
    }

    pub fn struct_model(&self, name: &str) -> Option<&StructModel> {
        self.struct_index.get(name).map(|&i| &self.structs[i])
    }

    pub fn storage(&self, name: &str) -> Option<&StorageModel> {
        self.storage_index.get(name).map(|&i| &self.storages[i])
    }

    pub fn service(&self, name: &str) -> Option<&FuncModel> {
        self.service_index.get(name).map(|&i| &self.services[i])
    }

    pub fn func(&self, name: &str) -> Option<&FuncModel> {
        self.func_index.get(name).map(|&i| &self.funcs[i])
    }

    pub fn component(&self, name: &str) -> Option<&ComponentModel> {
        self.component_index.get(name).map(|&i| &self.components[i])
    }

    /// Look up a component method through the instance's kind table.
    pub fn component_method(
        &self,
        component: &str,
        method: &str,
    ) -> Option<&'static ComponentMethod> {
        self.component(component)?.kind.method(method)
    }

    // ── Iteration (insertion order) ────────────────────────────────────

    pub fn constants(&self) -> &[ConstantModel] {
        &self.constants
    }

    pub fn errors(&self) -> &[ErrorModel] {
        &self.errors
    }

    pub fn structs(&self) -> &[StructModel] {
        &self.structs
    }

    pub fn storages(&self) -> &[StorageModel] {
        &self.storages
    }

    pub fn services(&self) -> &[FuncModel] {
        &self.services
    }

    pub fn funcs(&self) -> &[FuncModel] {
        &self.funcs
    }

    pub fn components(&self) -> &[ComponentModel] {
        &self.components
    }

    // ── Type resolution ────────────────────────────────────────────────

    /// Resolve a model type name: primitives through the canonical table,
    /// anything else as a struct reference, `ModelLookup` on a miss.
    pub fn value_type(&self, name: &str) -> Result<ValueType, CompileError> {
        if let Some(t) = ValueType::from_name(name) {
            return Ok(t);
        }
        if let Some(elem) = name.strip_prefix("[]") {
            return Ok(ValueType::List(Box::new(self.value_type(elem)?)));
        }
        if self.struct_model(name).is_some() {
            return Ok(ValueType::Struct(name.to_string()));
        }
        Err(CompileError::model_lookup(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StructField;

    fn app_with_struct(name: &str) -> App {
        let mut app = App::new();
        app.add_struct(StructModel {
            name: name.into(),
            comment: String::new(),
            fields: vec![StructField {
                name: "name".into(),
                value_type: "string".into(),
                comment: String::new(),
                json_name: None,
            }],
        });
        app
    }

    #[test]
    fn value_type_resolves_primitives_and_structs() {
        let app = app_with_struct("user/User");
        assert_eq!(app.value_type("int64").unwrap(), ValueType::Int64);
        assert_eq!(
            app.value_type("user/User").unwrap(),
            ValueType::Struct("user/User".into())
        );
        assert_eq!(
            app.value_type("[]user/User").unwrap(),
            ValueType::List(Box::new(ValueType::Struct("user/User".into())))
        );
        assert!(app.value_type("user/Missing").is_err());
    }

    #[test]
    fn re_registration_replaces_in_place() {
        let mut app = App::new();
        app.add_func(FuncModel {
            name: "a".into(),
            result: "int32".into(),
            ..FuncModel::default()
        });
        app.add_func(FuncModel {
            name: "b".into(),
            ..FuncModel::default()
        });
        app.add_func(FuncModel {
            name: "a".into(),
            result: "int64".into(),
            ..FuncModel::default()
        });
        assert_eq!(app.funcs().len(), 2);
        assert_eq!(app.funcs()[0].result, "int64");
        assert_eq!(app.func("a").unwrap().result, "int64");
    }
}
