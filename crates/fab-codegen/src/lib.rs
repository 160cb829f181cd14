//! fab-codegen: Go source emission.
//!
//! Walks the analyzed namespace graph in insertion order and produces one
//! Go file per class. The emitter consumes the analyzer's caches
//! read-only; given the same compilation, the output is byte-identical.

mod class;
mod method;

pub mod types;
pub mod writer;

use fab_common::CompileError;
use fab_compile::Compilation;
use log::debug;

/// Emission options.
#[derive(Debug, Clone)]
pub struct Options {
    /// The Go module path emitted into import strings.
    pub module: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            module: "app".to_string(),
        }
    }
}

/// One emitted file: the class key it came from, its path relative to
/// the output root, and the source text.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub key: String,
    pub path: String,
    pub source: String,
}

/// Emit every class of the compilation. The result order follows space,
/// pack, and class insertion order, so it is deterministic.
pub fn generate(
    compilation: &Compilation,
    options: &Options,
) -> Result<Vec<GeneratedFile>, CompileError> {
    let graph = &compilation.graph;
    let mut files = Vec::new();
    for space in graph.spaces() {
        for &pack in &space.packs {
            for &class_id in &graph.pack(pack).classes {
                debug!("emit class [{}]", graph.class(class_id).key());
                if let Some(file) = class::emit_class(graph, class_id, &options.module)? {
                    files.push(file);
                }
            }
        }
    }
    Ok(files)
}
