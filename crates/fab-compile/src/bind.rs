//! Script binding: wrap, parse, attach caches.
//!
//! Each method script is wrapped as an immediately-invoked function and
//! parsed with `fab-script`. The per-method side tables are keyed by the
//! arena's stable node IDs; the analyzer fills them, the emitter reads
//! them.

use fab_common::{CompileError, CompileErrorKind, ValueType};
use fab_script::{Expr, ExprId, Program, Stmt, StmtId};
use log::debug;
use rustc_hash::FxHashMap;

use crate::namespace::{CallTarget, Graph};

/// A parsed method script and its per-node side tables.
#[derive(Debug)]
pub struct BoundScript {
    /// The wrapped source text the program was parsed from.
    pub code: String,
    pub program: Program,
    /// The statement list of the wrapping function's body.
    pub body: Vec<StmtId>,
    pub caches: ScriptCaches,
    /// Set once the analyzer has filled the caches; re-analysis skips.
    pub analyzed: bool,
}

/// Side tables published by the analyzer and consumed read-only by the
/// emitter.
#[derive(Debug, Default)]
pub struct ScriptCaches {
    /// Variable statement -> method var slot.
    pub binding: FxHashMap<StmtId, usize>,
    /// Call expression -> resolved target.
    pub call: FxHashMap<ExprId, CallTarget>,
    /// Call expression -> dotted path as written.
    pub call_script: FxHashMap<ExprId, String>,
    /// Variable statement -> declared name as written.
    pub binding_script: FxHashMap<StmtId, String>,
    /// Assign expression -> target path as written.
    pub assign_script: FxHashMap<ExprId, String>,
    /// Assign expression -> frozen target value type.
    pub assign_type: FxHashMap<ExprId, ValueType>,
}

/// Wrap a method body the way the binder parses it.
pub fn wrap_source(body: &str) -> String {
    format!("(function () {{\n{body}\n}})()")
}

/// Parse every method script in the graph. Halts at the first failure.
pub fn bind(graph: &mut Graph) -> Result<(), CompileError> {
    for class_id in graph.class_ids() {
        for index in 0..graph.class(class_id).methods.len() {
            let method = &graph.class(class_id).methods[index];
            if method.script.is_some() {
                continue;
            }
            let Some(source) = method.source.clone() else {
                continue;
            };
            let class_key = graph.class(class_id).key();
            let method_name = method.name.clone();
            debug!("bind {class_key} method [{method_name}]");

            let code = wrap_source(&source);
            let program = fab_script::parse(&code).map_err(|e| {
                CompileError::new(CompileErrorKind::ScriptParse {
                    message: e.to_string(),
                })
                .with_span(e.span)
                .with_code(e.span.slice(&code))
                .with_class(&class_key)
                .with_method(&method_name)
            })?;
            let body = unwrap_iife(&program).ok_or_else(|| {
                CompileError::new(CompileErrorKind::InvalidScriptShape)
                    .with_class(&class_key)
                    .with_method(&method_name)
            })?;
            graph.class_mut(class_id).methods[index].script = Some(BoundScript {
                code,
                program,
                body,
                caches: ScriptCaches::default(),
                analyzed: false,
            });
        }
    }
    Ok(())
}

/// Dig through `(function () { ... })()` to the wrapped statement list.
fn unwrap_iife(program: &Program) -> Option<Vec<StmtId>> {
    if program.body.len() != 1 {
        return None;
    }
    let Stmt::Expression { expr, .. } = program.ast.stmt(program.body[0]) else {
        return None;
    };
    let Expr::Call { callee, args, .. } = program.ast.expr(*expr) else {
        return None;
    };
    if !args.is_empty() {
        return None;
    }
    let mut callee = *callee;
    if let Expr::Paren { inner, .. } = program.ast.expr(callee) {
        callee = *inner;
    }
    let Expr::Function { body, .. } = program.ast.expr(callee) else {
        return None;
    };
    let Stmt::Block { body, .. } = program.ast.stmt(*body) else {
        return None;
    };
    Some(body.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_and_unwrap_roundtrip() {
        let code = wrap_source("var a = 1;\nreturn a;");
        let program = fab_script::parse(&code).unwrap();
        let body = unwrap_iife(&program).unwrap();
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn unwrap_rejects_non_iife() {
        let program = fab_script::parse("var a = 1;").unwrap();
        assert!(unwrap_iife(&program).is_none());
    }
}
