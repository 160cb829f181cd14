//! Model-directory loader.
//!
//! A model directory holds one JSON file per model, grouped by space:
//!
//! ```text
//! app/
//!   component/db.json
//!   constant/base.json
//!   error/base.json
//!   struct/user/User.json
//!   storage/user/get.json
//!   service/user/get.json
//!   func/add.json
//! ```
//!
//! Each model's name is its path relative to the space directory, without
//! the extension. Files are visited in sorted order so registry insertion
//! order (and therefore emission order) is stable across runs.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fab_model::{App, ComponentModel, ConstantModel, ErrorModel, FuncModel, StorageModel, StructModel};
use log::debug;

/// A model file failed to read or parse.
#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, source: io::Error },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Load every model file under `root` into a registry.
pub fn load_app(root: &Path) -> Result<App, LoadError> {
    let mut app = App::new();

    for (name, path) in models_in(&root.join("component"))? {
        let mut model: ComponentModel = parse(&path)?;
        model.name = name;
        app.add_component(model);
    }
    for (name, path) in models_in(&root.join("constant"))? {
        let mut model: ConstantModel = parse(&path)?;
        model.name = name;
        app.add_constant(model);
    }
    for (name, path) in models_in(&root.join("error"))? {
        let mut model: ErrorModel = parse(&path)?;
        model.name = name;
        app.add_error(model);
    }
    for (name, path) in models_in(&root.join("struct"))? {
        let mut model: StructModel = parse(&path)?;
        model.name = name;
        app.add_struct(model);
    }
    for (name, path) in models_in(&root.join("storage"))? {
        let mut model: StorageModel = parse(&path)?;
        model.name = name;
        app.add_storage(model);
    }
    for (name, path) in models_in(&root.join("service"))? {
        let mut model: FuncModel = parse(&path)?;
        model.name = name;
        app.add_service(model);
    }
    for (name, path) in models_in(&root.join("func"))? {
        let mut model: FuncModel = parse(&path)?;
        model.name = name;
        app.add_func(model);
    }

    Ok(app)
}

fn parse<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// All model files under a space directory, as (name path, file path)
/// pairs in sorted order. A missing directory is simply empty.
fn models_in(dir: &Path) -> Result<Vec<(String, PathBuf)>, LoadError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    collect_json(dir, &mut files).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    files.sort();

    let mut models = Vec::new();
    for path in files {
        let Ok(relative) = path.strip_prefix(dir) else {
            continue;
        };
        let name = relative
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        debug!("load model [{name}] from {}", path.display());
        models.push((name, path));
    }
    Ok(models)
}

fn collect_json(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_json(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}
