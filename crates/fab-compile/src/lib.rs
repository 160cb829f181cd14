//! fab-compile: the semantic compiler.
//!
//! Turns a loaded model registry into a fully analyzed namespace graph:
//!
//! 1. populate -- spaces, packs, classes, and declared methods from the
//!    registry, in insertion order;
//! 2. bind -- parse each method script into an arena AST with per-node
//!    cache tables;
//! 3. analyze -- resolve identifiers, infer value types, classify calls,
//!    register imports;
//! 4. resolve imports -- assign deterministic emitted aliases.
//!
//! Each phase completes fully before the next and halts at its first
//! error. The emitter consumes the result read-only.

pub mod analyze;
pub mod bind;
pub mod diagnostics;
pub mod imports;
pub mod namespace;
pub mod value_type;

mod populate;

pub use bind::{BoundScript, ScriptCaches};
pub use namespace::{
    CallLists, CallRecord, CallTarget, Class, ClassId, Field, FieldOrigin, Graph, Import,
    ImportTarget, Method, MethodParam, MethodRef, MethodVar, Pack, PackId, Space, SpaceId,
};
pub use value_type::{VarSub, VarType};

use fab_common::CompileError;
use fab_model::App;
use log::debug;

/// The analyzed result of one compile run, ready for emission.
#[derive(Debug)]
pub struct Compilation {
    pub graph: Graph,
}

impl Compilation {
    /// Run the semantic phases over a model registry.
    pub fn build(app: &App) -> Result<Compilation, CompileError> {
        let mut graph = Graph::new();
        debug!("populate namespace graph");
        populate::populate(app, &mut graph)?;
        debug!("bind method scripts");
        bind::bind(&mut graph)?;
        debug!("analyze methods");
        analyze::analyze(app, &mut graph)?;
        debug!("resolve imports");
        imports::resolve(&mut graph)?;
        Ok(Compilation { graph })
    }
}
