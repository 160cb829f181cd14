//! The namespace graph: space -> pack -> class -> method.
//!
//! All entities live in flat arenas on [`Graph`], identified by `u32` ID
//! newtypes, with every list paired with a hash index. Lists preserve
//! insertion order, which is what emission later iterates, so graph
//! construction order fully determines output order.

use fab_common::ValueType;
use fab_model::{
    ComponentMethod, ConstantModel, ConstantOption, ErrorModel, ErrorOption, StructField,
    StructModel,
};
use rustc_hash::FxHashMap;

use crate::bind::BoundScript;
use crate::value_type::{split_path, VarType};
use fab_model::App;

/// Identifier of a [`Space`] within the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpaceId(pub u32);

/// Identifier of a [`Pack`] within the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackId(pub u32);

/// Identifier of a [`Class`] within the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub u32);

/// A method, addressed by its owning class and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub class: ClassId,
    pub index: usize,
}

/// What a call expression resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum CallTarget {
    /// Another compiled method (service, func, or storage).
    Method(MethodRef),
    /// A fixed method of a declared component instance.
    Component {
        component: String,
        method: &'static ComponentMethod,
    },
    /// A utility/formatting/logging call; never fails, never returns.
    Util { path: String },
}

impl CallTarget {
    /// Whether a call to this target produces an error value.
    pub fn has_error(&self) -> bool {
        match self {
            CallTarget::Method(_) => true,
            CallTarget::Component { method, .. } => method.has_error,
            CallTarget::Util { .. } => false,
        }
    }

    /// Whether a call to this target produces a result value.
    pub fn has_return(&self, graph: &Graph) -> bool {
        match self {
            CallTarget::Method(m) => graph.method(*m).result.value_type().is_some(),
            CallTarget::Component { method, .. } => method.has_return,
            CallTarget::Util { .. } => false,
        }
    }

    /// The declared result type of a call to this target.
    pub fn result_type(&self, graph: &Graph) -> Option<ValueType> {
        match self {
            CallTarget::Method(m) => graph.method(*m).result.value_type().cloned(),
            CallTarget::Component { method, .. } => {
                method.result.and_then(ValueType::from_name)
            }
            CallTarget::Util { .. } => None,
        }
    }
}

// ── Graph ──────────────────────────────────────────────────────────────

/// The whole namespace of one compile run.
#[derive(Debug, Default)]
pub struct Graph {
    spaces: Vec<Space>,
    space_index: FxHashMap<String, SpaceId>,
    packs: Vec<Pack>,
    classes: Vec<Class>,
}

#[derive(Debug)]
pub struct Space {
    pub id: SpaceId,
    pub name: String,
    pub packs: Vec<PackId>,
    pack_index: FxHashMap<String, PackId>,
}

#[derive(Debug)]
pub struct Pack {
    pub id: PackId,
    pub space: SpaceId,
    pub name: String,
    pub classes: Vec<ClassId>,
    class_index: FxHashMap<String, ClassId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create_space(&mut self, name: &str) -> SpaceId {
        if let Some(&id) = self.space_index.get(name) {
            return id;
        }
        let id = SpaceId(self.spaces.len() as u32);
        self.spaces.push(Space {
            id,
            name: name.to_string(),
            packs: Vec::new(),
            pack_index: FxHashMap::default(),
        });
        self.space_index.insert(name.to_string(), id);
        id
    }

    pub fn get_or_create_pack(&mut self, space: SpaceId, name: &str) -> PackId {
        if let Some(&id) = self.spaces[space.0 as usize].pack_index.get(name) {
            return id;
        }
        let id = PackId(self.packs.len() as u32);
        self.packs.push(Pack {
            id,
            space,
            name: name.to_string(),
            classes: Vec::new(),
            class_index: FxHashMap::default(),
        });
        let s = &mut self.spaces[space.0 as usize];
        s.packs.push(id);
        s.pack_index.insert(name.to_string(), id);
        id
    }

    pub fn get_or_create_class(&mut self, pack: PackId, path: &[String]) -> ClassId {
        let key = path.join("/");
        if let Some(&id) = self.packs[pack.0 as usize].class_index.get(&key) {
            return id;
        }
        let id = ClassId(self.classes.len() as u32);
        let space = self.packs[pack.0 as usize].space;
        let space_name = self.spaces[space.0 as usize].name.clone();
        self.classes.push(Class {
            id,
            pack,
            space,
            space_name,
            path: path.to_vec(),
            imports: Vec::new(),
            import_path_index: FxHashMap::default(),
            import_class_index: FxHashMap::default(),
            fields: Vec::new(),
            field_index: FxHashMap::default(),
            methods: Vec::new(),
            method_index: FxHashMap::default(),
            constant: None,
            error: None,
            strukt: None,
        });
        let p = &mut self.packs[pack.0 as usize];
        p.classes.push(id);
        p.class_index.insert(key, id);
        id
    }

    /// Split a model path into its class and, when `file_is_class` is
    /// false, the trailing identifier (used as the method or field name).
    /// An empty class path defaults to `["base"]`.
    pub fn get_class(
        &mut self,
        space_name: &str,
        path: &str,
        file_is_class: bool,
    ) -> (Option<String>, ClassId) {
        let names: Vec<&str> = path.split('/').collect();
        let end_index = if file_is_class {
            None
        } else {
            Some(names.len() - 1)
        };
        let class_names: Vec<String> = match end_index {
            Some(i) => names[..i].iter().map(|s| s.to_string()).collect(),
            None => names.iter().map(|s| s.to_string()).collect(),
        };
        let class_names = if class_names.is_empty() {
            vec!["base".to_string()]
        } else {
            class_names
        };
        let space = self.get_or_create_space(space_name);
        let pack = self.get_or_create_pack(space, "");
        let class = self.get_or_create_class(pack, &class_names);
        let end_name = end_index.map(|i| names[i].to_string());
        (end_name, class)
    }

    // ── Lookup ─────────────────────────────────────────────────────────

    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    pub fn space(&self, id: SpaceId) -> &Space {
        &self.spaces[id.0 as usize]
    }

    pub fn space_by_name(&self, name: &str) -> Option<SpaceId> {
        self.space_index.get(name).copied()
    }

    pub fn pack(&self, id: PackId) -> &Pack {
        &self.packs[id.0 as usize]
    }

    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.0 as usize]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut Class {
        &mut self.classes[id.0 as usize]
    }

    /// All class IDs in creation order.
    pub fn class_ids(&self) -> Vec<ClassId> {
        (0..self.classes.len() as u32).map(ClassId).collect()
    }

    pub fn method(&self, m: MethodRef) -> &Method {
        &self.classes[m.class.0 as usize].methods[m.index]
    }

    pub fn method_mut(&mut self, m: MethodRef) -> &mut Method {
        &mut self.classes[m.class.0 as usize].methods[m.index]
    }

    /// Resolve `space / class path / method name` to a method reference.
    pub fn find_method(
        &self,
        space_name: &str,
        class_path: &[&str],
        method: &str,
    ) -> Option<MethodRef> {
        let space = self.space_by_name(space_name)?;
        let pack = *self.spaces[space.0 as usize].pack_index.get("")?;
        let key = if class_path.is_empty() {
            "base".to_string()
        } else {
            class_path.join("/")
        };
        let class = *self.packs[pack.0 as usize].class_index.get(&key)?;
        let index = self.classes[class.0 as usize].method_index.get(method)?;
        Some(MethodRef {
            class,
            index: *index,
        })
    }
}

// ── Class ──────────────────────────────────────────────────────────────

/// The unit of emission: one target-language type with fields and methods.
#[derive(Debug)]
pub struct Class {
    pub id: ClassId,
    pub pack: PackId,
    pub space: SpaceId,
    pub space_name: String,
    pub path: Vec<String>,
    pub imports: Vec<Import>,
    import_path_index: FxHashMap<String, usize>,
    import_class_index: FxHashMap<ClassId, usize>,
    pub fields: Vec<Field>,
    field_index: FxHashMap<String, usize>,
    pub methods: Vec<Method>,
    method_index: FxHashMap<String, usize>,
    pub constant: Option<ConstantModel>,
    pub error: Option<ErrorModel>,
    pub strukt: Option<StructModel>,
}

impl Class {
    /// The class key: space-qualified slash path, used as the output map key.
    pub fn key(&self) -> String {
        format!("{}/{}", self.space_name, self.path.join("/"))
    }

    pub fn get_or_create_import_path(&mut self, import: &str) -> usize {
        if let Some(&i) = self.import_path_index.get(import) {
            return i;
        }
        let index = self.imports.len();
        self.imports.push(Import {
            target: ImportTarget::Path(import.to_string()),
            alias: None,
            is_this: false,
        });
        self.import_path_index.insert(import.to_string(), index);
        index
    }

    pub fn get_or_create_import_class(&mut self, class: ClassId, is_this: bool) -> usize {
        if let Some(&i) = self.import_class_index.get(&class) {
            return i;
        }
        let index = self.imports.len();
        self.imports.push(Import {
            target: ImportTarget::Class(class),
            alias: None,
            is_this,
        });
        self.import_class_index.insert(class, index);
        index
    }

    /// The emitted alias for a script-visible import head, once the
    /// import resolver has run. `new` answers as the struct space.
    pub fn import_as_name(&self, script_name: &str) -> Option<&str> {
        let wanted = if script_name == "new" {
            "struct"
        } else {
            script_name
        };
        self.imports.iter().find_map(|import| {
            if import.script_name() == Some(wanted) {
                import.alias.as_deref()
            } else {
                None
            }
        })
    }

    pub fn add_field(&mut self, name: &str, var_type: VarType, origin: FieldOrigin) -> usize {
        if let Some(&i) = self.field_index.get(name) {
            return i;
        }
        let index = self.fields.len();
        self.fields.push(Field {
            name: name.to_string(),
            var_type,
            origin,
        });
        self.field_index.insert(name.to_string(), index);
        index
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.field_index.get(name).map(|&i| &self.fields[i])
    }

    pub fn get_or_create_method(&mut self, name: &str) -> usize {
        if let Some(&i) = self.method_index.get(name) {
            return i;
        }
        let index = self.methods.len();
        self.methods.push(Method::new(name));
        self.method_index.insert(name.to_string(), index);
        index
    }

    pub fn method_by_name(&self, name: &str) -> Option<&Method> {
        self.method_index.get(name).map(|&i| &self.methods[i])
    }
}

/// One import entry on a class. Unique by target class or import string.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub target: ImportTarget,
    /// Emitted package alias, assigned by the import resolver. `None`
    /// until resolution, and stays `None` for `is_this` entries.
    pub alias: Option<String>,
    /// Self-reference sentinel; elided from the emitted import block.
    pub is_this: bool,
}

impl Import {
    /// The script-visible head name for path imports (`component_db`
    /// registers the head `db`).
    pub fn script_name(&self) -> Option<&str> {
        match &self.target {
            ImportTarget::Path(p) => Some(p.strip_prefix("component_").unwrap_or(p)),
            ImportTarget::Class(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportTarget {
    /// Another class of this project.
    Class(ClassId),
    /// An external or space-level import string.
    Path(String),
}

/// A class field with its observed type and model origin.
#[derive(Debug)]
pub struct Field {
    pub name: String,
    pub var_type: VarType,
    pub origin: FieldOrigin,
}

#[derive(Debug, Clone)]
pub enum FieldOrigin {
    Constant(ConstantOption),
    Error(ErrorOption),
    Struct(StructField),
    Plain,
}

// ── Method ─────────────────────────────────────────────────────────────

/// A compiled method: declared signature, inferred locals, recorded call
/// lists, and (after binding) the parsed script with its caches.
#[derive(Debug)]
pub struct Method {
    pub name: String,
    pub comment: String,
    pub params: Vec<MethodParam>,
    param_index: FxHashMap<String, usize>,
    pub vars: Vec<MethodVar>,
    var_index: FxHashMap<String, usize>,
    pub result: VarType,
    pub calls: CallLists,
    /// Raw script text for service/func methods.
    pub source: Option<String>,
    /// SQL text for storage methods.
    pub sql: Option<String>,
    /// Set by the binder; caches filled by the analyzer.
    pub script: Option<BoundScript>,
}

#[derive(Debug)]
pub struct MethodParam {
    pub name: String,
    pub var_type: VarType,
}

#[derive(Debug)]
pub struct MethodVar {
    pub name: String,
    pub var_type: VarType,
}

/// Calls recorded per target category, set-like by written path.
#[derive(Debug, Default)]
pub struct CallLists {
    pub component: Vec<CallRecord>,
    pub util: Vec<CallRecord>,
    pub func: Vec<CallRecord>,
    pub storage: Vec<CallRecord>,
    pub service: Vec<CallRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub path: String,
    pub target: CallTarget,
}

/// Append a record unless an equal path is already recorded.
pub fn push_call(list: &mut Vec<CallRecord>, record: CallRecord) {
    if !list.iter().any(|r| r.path == record.path) {
        list.push(record);
    }
}

impl Method {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            comment: String::new(),
            params: Vec::new(),
            param_index: FxHashMap::default(),
            vars: Vec::new(),
            var_index: FxHashMap::default(),
            result: VarType::new(),
            calls: CallLists::default(),
            source: None,
            sql: None,
            script: None,
        }
    }

    pub fn add_param(&mut self, name: &str, var_type: VarType) -> usize {
        if let Some(&i) = self.param_index.get(name) {
            return i;
        }
        let index = self.params.len();
        self.params.push(MethodParam {
            name: name.to_string(),
            var_type,
        });
        self.param_index.insert(name.to_string(), index);
        index
    }

    pub fn get_or_create_var(&mut self, name: &str) -> usize {
        if let Some(&i) = self.var_index.get(name) {
            return i;
        }
        let index = self.vars.len();
        self.vars.push(MethodVar {
            name: name.to_string(),
            var_type: VarType::new(),
        });
        self.var_index.insert(name.to_string(), index);
        index
    }

    /// Whether the head of a path names a local or a param.
    pub fn binds(&self, head: &str) -> bool {
        self.var_index.contains_key(head) || self.param_index.contains_key(head)
    }

    /// Resolve a path into the var/param slot tree, growing map children
    /// along the way. `None` when the head is not a local or param.
    pub fn path_node_mut(
        &mut self,
        path: &str,
        app: &App,
    ) -> Result<Option<&mut VarType>, fab_common::CompileError> {
        let (head, rest) = split_path(path);
        let slot = if let Some(&i) = self.var_index.get(&head) {
            &mut self.vars[i].var_type
        } else if let Some(&i) = self.param_index.get(&head) {
            &mut self.params[i].var_type
        } else {
            return Ok(None);
        };
        match rest {
            None => Ok(Some(slot)),
            Some(rest) => slot.get_path(&rest, app),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_class_splits_member_name() {
        let mut graph = Graph::new();
        let (end, class) = graph.get_class("service", "user/get", false);
        assert_eq!(end.as_deref(), Some("get"));
        assert_eq!(graph.class(class).path, vec!["user".to_string()]);
        assert_eq!(graph.class(class).key(), "service/user");
    }

    #[test]
    fn get_class_defaults_to_base() {
        let mut graph = Graph::new();
        let (end, class) = graph.get_class("func", "add", false);
        assert_eq!(end.as_deref(), Some("add"));
        assert_eq!(graph.class(class).path, vec!["base".to_string()]);
    }

    #[test]
    fn get_class_file_is_class_keeps_whole_path() {
        let mut graph = Graph::new();
        let (end, class) = graph.get_class("struct", "user/User", true);
        assert!(end.is_none());
        assert_eq!(
            graph.class(class).path,
            vec!["user".to_string(), "User".to_string()]
        );
    }

    #[test]
    fn class_creation_is_idempotent() {
        let mut graph = Graph::new();
        let (_, a) = graph.get_class("service", "user/get", false);
        let (_, b) = graph.get_class("service", "user/del", false);
        assert_eq!(a, b);
        assert_eq!(graph.class_ids().len(), 1);
    }

    #[test]
    fn imports_unique_by_path_and_class() {
        let mut graph = Graph::new();
        let (_, a) = graph.get_class("service", "user/get", false);
        let (_, b) = graph.get_class("func", "calc/add", false);
        let class = graph.class_mut(a);
        assert_eq!(class.get_or_create_import_path("util"), 0);
        assert_eq!(class.get_or_create_import_path("util"), 0);
        assert_eq!(class.get_or_create_import_class(b, false), 1);
        assert_eq!(class.get_or_create_import_class(b, false), 1);
        assert_eq!(class.imports.len(), 2);
    }

    #[test]
    fn find_method_resolves_across_spaces() {
        let mut graph = Graph::new();
        let (end, class) = graph.get_class("service", "user/get", false);
        let index = graph
            .class_mut(class)
            .get_or_create_method(end.as_deref().unwrap());
        let found = graph.find_method("service", &["user"], "get").unwrap();
        assert_eq!(found, MethodRef { class, index });
        assert!(graph.find_method("service", &["user"], "missing").is_none());
        assert!(graph.find_method("storage", &["user"], "get").is_none());
    }
}
