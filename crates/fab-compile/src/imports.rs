//! Deterministic import materialization.
//!
//! After analysis, every registered import on a class receives its
//! emitted package alias: imports are walked in insertion order, each
//! derives a base package name, and later entries that would collide get
//! a numeric suffix (`util`, `util2`, ...). Self-reference entries keep
//! no alias; they map to the emitter's `this_` token.

use fab_common::{CompileError, CompileErrorKind};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::namespace::{Class, ClassId, Graph, Import, ImportTarget};

/// The emitted package name of a space. `struct` and `func` are target
/// keywords and `error` shadows the builtin type, so those spaces emit
/// under renamed packages.
pub fn space_package(space_name: &str) -> &str {
    match space_name {
        "struct" => "structs",
        "func" => "funcs",
        "error" => "apperror",
        other => other,
    }
}

/// The emitted directory of a class. Every class of a space lands in the
/// space's single package directory; nested class paths flatten into the
/// file name instead, so same-space classes can reference each other
/// without imports.
pub fn class_dir(class: &Class) -> String {
    space_package(&class.space_name).to_string()
}

/// The emitted file path of a class, relative to the output root.
pub fn class_file(class: &Class) -> String {
    format!("{}/{}.go", class_dir(class), class.path.join("_"))
}

/// The base package name an import would occupy in the emitted namespace.
pub fn import_base(graph: &Graph, import: &Import) -> String {
    match &import.target {
        ImportTarget::Path(path) => match path.strip_prefix("component_") {
            Some(component) => component.to_string(),
            None => space_package(path).to_string(),
        },
        ImportTarget::Class(class_id) => class_dir(graph.class(*class_id)),
    }
}

/// Assign aliases for every class's import list.
pub fn resolve(graph: &mut Graph) -> Result<(), CompileError> {
    for class_id in graph.class_ids() {
        resolve_class(graph, class_id)?;
    }
    Ok(())
}

fn resolve_class(graph: &mut Graph, class_id: ClassId) -> Result<(), CompileError> {
    let bases: Vec<Option<String>> = graph
        .class(class_id)
        .imports
        .iter()
        .map(|import| {
            if import.is_this {
                None
            } else {
                Some(import_base(graph, import))
            }
        })
        .collect();

    let mut used: FxHashMap<String, u32> = FxHashMap::default();
    let mut assigned: Vec<Option<String>> = Vec::with_capacity(bases.len());
    for base in bases {
        let Some(base) = base else {
            assigned.push(None);
            continue;
        };
        let count = used.entry(base.clone()).or_insert(0);
        *count += 1;
        let alias = if *count == 1 {
            base
        } else {
            format!("{base}{count}")
        };
        assigned.push(Some(alias));
    }

    // A suffixed alias can still collide with a base that appears later;
    // well-formed inputs never get here.
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for alias in assigned.iter().flatten() {
        if !seen.insert(alias) {
            return Err(CompileError::new(CompileErrorKind::NameCollision {
                name: alias.clone(),
            })
            .with_class(graph.class(class_id).key()));
        }
    }

    let class = graph.class_mut(class_id);
    for (import, alias) in class.imports.iter_mut().zip(assigned) {
        import.alias = alias;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_packages_avoid_target_keywords() {
        assert_eq!(space_package("struct"), "structs");
        assert_eq!(space_package("func"), "funcs");
        assert_eq!(space_package("error"), "apperror");
        assert_eq!(space_package("service"), "service");
    }

    #[test]
    fn aliases_suffix_on_collision() {
        let mut graph = Graph::new();
        let (_, class) = graph.get_class("service", "user/get", false);
        // Two distinct import strings that occupy the same package name
        // would be unusual, so fake the collision with components.
        graph.class_mut(class).get_or_create_import_path("util");
        graph.class_mut(class).get_or_create_import_path("component_util");
        resolve(&mut graph).unwrap();
        let imports = &graph.class(class).imports;
        assert_eq!(imports[0].alias.as_deref(), Some("util"));
        assert_eq!(imports[1].alias.as_deref(), Some("util2"));
    }

    #[test]
    fn this_import_keeps_no_alias() {
        let mut graph = Graph::new();
        let (_, class) = graph.get_class("service", "user/get", false);
        graph.class_mut(class).get_or_create_import_class(class, true);
        resolve(&mut graph).unwrap();
        assert!(graph.class(class).imports[0].alias.is_none());
        assert!(graph.class(class).imports[0].is_this);
    }

    #[test]
    fn class_files_flatten_nested_paths() {
        let mut graph = Graph::new();
        let (_, shallow) = graph.get_class("service", "user/get", false);
        assert_eq!(class_dir(graph.class(shallow)), "service");
        assert_eq!(class_file(graph.class(shallow)), "service/user.go");
        let (_, nested) = graph.get_class("struct", "user/User", true);
        assert_eq!(class_dir(graph.class(nested)), "structs");
        assert_eq!(class_file(graph.class(nested)), "structs/user_User.go");
    }
}
