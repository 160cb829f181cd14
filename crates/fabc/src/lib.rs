//! fabc: the fab compiler driver.
//!
//! Serial orchestration of one compile run: load model files, build the
//! semantic compilation, emit Go sources. Each phase fully completes
//! before the next; the first error aborts the run.

pub mod load;

use std::fmt;
use std::path::Path;

use fab_codegen::{GeneratedFile, Options};
use fab_common::CompileError;
use fab_compile::Compilation;
use fab_model::App;

use load::LoadError;

/// An error from either driver phase.
#[derive(Debug)]
pub enum DriverError {
    Load(LoadError),
    Compile(CompileError),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(e) => write!(f, "{e}"),
            Self::Compile(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DriverError {}

impl From<LoadError> for DriverError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

impl From<CompileError> for DriverError {
    fn from(e: CompileError) -> Self {
        Self::Compile(e)
    }
}

/// Compile a loaded registry into the emitted file set.
pub fn compile_app(app: &App, options: &Options) -> Result<Vec<GeneratedFile>, CompileError> {
    let compilation = Compilation::build(app)?;
    fab_codegen::generate(&compilation, options)
}

/// Load a model directory and compile it.
pub fn compile_dir(dir: &Path, options: &Options) -> Result<Vec<GeneratedFile>, DriverError> {
    let app = load::load_app(dir)?;
    Ok(compile_app(&app, options)?)
}

/// Render a compile error for the terminal. When the error points into a
/// method script, the script is re-wrapped and the error is rendered as
/// a labeled diagnostic against it.
pub fn render_error(app: &App, error: &CompileError) -> String {
    if let (Some(class_key), Some(method)) = (&error.context.class_key, &error.context.method) {
        if let Some(source) = find_script(app, class_key, method) {
            let wrapped = fab_compile::bind::wrap_source(&source);
            return fab_compile::diagnostics::render(error, &wrapped);
        }
    }
    format!("error: {error}")
}

/// Recover the script text an error's class key and method point at.
fn find_script(app: &App, class_key: &str, method: &str) -> Option<String> {
    let (space, class_path) = class_key.split_once('/')?;
    let model_name = if class_path == "base" {
        method.to_string()
    } else {
        format!("{class_path}/{method}")
    };
    match space {
        "service" => app.service(&model_name).map(|m| m.func.clone()),
        "func" => app.func(&model_name).map(|m| m.func.clone()),
        _ => None,
    }
}
