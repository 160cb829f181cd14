//! The semantic analyzer.
//!
//! One recursive traversal per method, run only after every class and
//! method exists so cross-method call targets resolve against the global
//! view. The walk resolves identifier paths, infers value types through
//! observation joins, classifies calls into tagged targets, and
//! auto-registers imports on the owning class. All registrations are
//! get-or-create, so re-running the pass changes nothing.

use fab_common::{CompileError, Span, ValueType};
use fab_model::{App, ComponentKind};
use fab_script::{Ast, Expr, ExprId, StmtId};
use log::debug;

use crate::bind::ScriptCaches;
use crate::namespace::{push_call, CallRecord, CallTarget, Graph, MethodRef};
use crate::value_type::split_path;

/// Space heads recognized during identifier resolution. Component heads
/// (`db`, `db_*`, ...) are matched separately through the kind table.
const SPACE_HEADS: &[&str] = &[
    "logger", "fmt", "util", "constant", "error", "struct", "storage", "service", "func",
    "common", "context",
];

/// Heads that classify a call as a utility call.
const UTIL_HEADS: &[&str] = &["util", "fmt", "logger", "common"];

/// Analyze every bound method in the graph. Halts at the first error.
pub fn analyze(app: &App, graph: &mut Graph) -> Result<(), CompileError> {
    for class_id in graph.class_ids() {
        for index in 0..graph.class(class_id).methods.len() {
            analyze_method(
                app,
                graph,
                MethodRef {
                    class: class_id,
                    index,
                },
            )?;
        }
    }
    Ok(())
}

fn analyze_method(app: &App, graph: &mut Graph, mr: MethodRef) -> Result<(), CompileError> {
    let Some(mut script) = graph.method_mut(mr).script.take() else {
        return Ok(());
    };
    if script.analyzed {
        graph.method_mut(mr).script = Some(script);
        return Ok(());
    }

    let class_key = graph.class(mr.class).key();
    let method_name = graph.method(mr).name.clone();
    debug!("analyze {class_key} method [{method_name}]");

    let mut caches = ScriptCaches::default();
    let body = script.body.clone();
    let result = {
        let mut analyzer = Analyzer {
            app,
            graph: &mut *graph,
            mr,
            ast: &script.program.ast,
            code: &script.code,
            caches: &mut caches,
        };
        analyzer.run(&body)
    };
    script.caches = caches;
    script.analyzed = result.is_ok();
    graph.method_mut(mr).script = Some(script);
    result.map_err(|e| e.with_class(class_key).with_method(method_name))
}

struct Analyzer<'a> {
    app: &'a App,
    graph: &'a mut Graph,
    mr: MethodRef,
    ast: &'a Ast,
    code: &'a str,
    caches: &'a mut ScriptCaches,
}

impl<'a> Analyzer<'a> {
    fn run(&mut self, body: &[StmtId]) -> Result<(), CompileError> {
        for &stmt in body {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn err_at(&self, error: CompileError, span: Span) -> CompileError {
        error.with_span(span).with_code(span.slice(self.code))
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn stmt(&mut self, id: StmtId) -> Result<(), CompileError> {
        let ast = self.ast;
        match ast.stmt(id) {
            fab_script::Stmt::Expression { expr, .. } => {
                self.expr_type(*expr)?;
                Ok(())
            }
            fab_script::Stmt::Variable { name, init, span } => {
                self.var_stmt(id, name.clone(), *init, *span)
            }
            fab_script::Stmt::Block { body, .. } => {
                for &stmt in body {
                    self.stmt(stmt)?;
                }
                Ok(())
            }
            fab_script::Stmt::If {
                test,
                consequent,
                alternate,
                ..
            } => {
                self.expr_type(*test)?;
                self.stmt(*consequent)?;
                if let Some(alternate) = alternate {
                    self.stmt(*alternate)?;
                }
                Ok(())
            }
            fab_script::Stmt::Throw { argument, .. } => {
                self.expr_type(*argument)?;
                Ok(())
            }
            fab_script::Stmt::Return { argument, span } => {
                let span = *span;
                if let Some(argument) = *argument {
                    if let Some(observed) = self.expr_type(argument)? {
                        let code = span.slice(self.code).to_string();
                        self.graph
                            .method_mut(self.mr)
                            .result
                            .observe(observed)
                            .map_err(|e| e.with_span(span).with_code(code))?;
                    }
                }
                Ok(())
            }
        }
    }

    fn var_stmt(
        &mut self,
        id: StmtId,
        name: String,
        init: Option<ExprId>,
        span: Span,
    ) -> Result<(), CompileError> {
        let slot = self.graph.method_mut(self.mr).get_or_create_var(&name);
        self.caches.binding.insert(id, slot);
        self.caches.binding_script.insert(id, name);

        if let Some(init) = init {
            if let Some(observed) = self.expr_type(init)? {
                let code = span.slice(self.code).to_string();
                self.graph.method_mut(self.mr).vars[slot]
                    .var_type
                    .observe(observed)
                    .map_err(|e| e.with_span(span).with_code(code))?;
            }
        }
        Ok(())
    }

    // ── Expressions ────────────────────────────────────────────────────

    /// Infer the value type of an expression, filling caches along the way.
    /// `None` means the type could not be determined, which is not an error.
    fn expr_type(&mut self, id: ExprId) -> Result<Option<ValueType>, CompileError> {
        let ast = self.ast;
        match ast.expr(id) {
            Expr::Number { raw, .. } => {
                let t = if raw.contains(['.', 'e', 'E']) {
                    ValueType::Float64
                } else {
                    ValueType::Int64
                };
                Ok(Some(t))
            }
            Expr::Str { .. } => Ok(Some(ValueType::String)),
            Expr::Bool { .. } => Ok(Some(ValueType::Bool)),
            Expr::Null { .. } => Ok(Some(ValueType::Null)),
            Expr::Template { exprs, .. } => {
                // Templates emit through the formatting package.
                self.register_import("fmt");
                for &expr in exprs {
                    self.expr_type(expr)?;
                }
                Ok(Some(ValueType::String))
            }
            Expr::Object { props, .. } => {
                for prop in props.clone() {
                    self.expr_type(prop.value)?;
                }
                Ok(Some(ValueType::Map))
            }
            Expr::Paren { inner, .. } => self.expr_type(*inner),
            Expr::Binary {
                op, left, right, ..
            } => {
                let op = *op;
                let (left, right) = (*left, *right);
                let left_type = self.expr_type(left)?;
                let right_type = self.expr_type(right)?;
                Ok(binary_result_type(op, left_type, right_type))
            }
            Expr::Ident { .. } | Expr::Dot { .. } | Expr::Bracket { .. } => {
                match self.path_of(id) {
                    Some(path) => {
                        let span = ast.expr(id).span();
                        self.resolve_path(&path, span)
                    }
                    None => {
                        // Dynamic subscript or member on a non-path base:
                        // type the parts, result unknown.
                        match ast.expr(id) {
                            Expr::Bracket { left, member, .. } => {
                                let (left, member) = (*left, *member);
                                self.expr_type(left)?;
                                self.expr_type(member)?;
                            }
                            Expr::Dot { left, .. } => {
                                let left = *left;
                                self.expr_type(left)?;
                            }
                            _ => {}
                        }
                        Ok(None)
                    }
                }
            }
            Expr::Call {
                callee, args, span, ..
            } => {
                let (callee, span) = (*callee, *span);
                let args = args.clone();
                self.call_expr(id, callee, &args, span)
            }
            Expr::Assign {
                target,
                value,
                span,
                ..
            } => {
                let (target, value, span) = (*target, *value, *span);
                self.assign_expr(id, target, value, span)
            }
            Expr::Function { span, .. } => Err(self.err_at(
                CompileError::unsupported(ast.expr(id).kind_name()),
                *span,
            )),
        }
    }

    /// Rebuild the dotted path of an identifier chain as written.
    /// `None` when any link is not an identifier, member, or string
    /// subscript.
    fn path_of(&self, id: ExprId) -> Option<String> {
        match self.ast.expr(id) {
            Expr::Ident { name, .. } => Some(name.clone()),
            Expr::Dot { left, name, .. } => Some(format!("{}.{name}", self.path_of(*left)?)),
            Expr::Bracket { left, member, .. } => {
                let Expr::Str { value, .. } = self.ast.expr(*member) else {
                    return None;
                };
                Some(format!("{}[\"{value}\"]", self.path_of(*left)?))
            }
            Expr::Paren { inner, .. } => self.path_of(*inner),
            _ => None,
        }
    }

    /// Resolve an identifier path: method vars, params, class fields,
    /// then imported spaces and components (auto-registering the import).
    fn resolve_path(
        &mut self,
        path: &str,
        span: Span,
    ) -> Result<Option<ValueType>, CompileError> {
        let (head, rest) = split_path(path);

        if self.graph.method(self.mr).binds(&head) {
            let code = span.slice(self.code).to_string();
            let node = self
                .graph
                .method_mut(self.mr)
                .path_node_mut(path, self.app)
                .map_err(|e| e.with_span(span).with_code(code))?;
            return Ok(node.and_then(|n| n.value_type().cloned()));
        }

        if let Some(field) = self.graph.class(self.mr.class).field(&head) {
            let base = field.var_type.value_type().cloned();
            return Ok(resolve_declared_path(self.app, base, rest.as_deref()));
        }

        self.register_import(&head);
        let resolved = match head.as_str() {
            "context" => Some(ValueType::Context),
            "struct" | "new" => rest.as_deref().and_then(|rest| {
                let (member, more) = split_path(rest);
                let name = self.find_struct(&member)?;
                resolve_declared_path(self.app, Some(ValueType::Struct(name)), more.as_deref())
            }),
            "constant" => rest.as_deref().and_then(|rest| {
                let (member, _) = split_path(rest);
                self.find_constant_field(&member)
            }),
            _ => None,
        };
        Ok(resolved)
    }

    /// Register the import a path head implies on the owning class.
    /// The class's own space name never registers.
    fn register_import(&mut self, head: &str) {
        if head == self.graph.class(self.mr.class).space_name {
            return;
        }
        if SPACE_HEADS.contains(&head) {
            self.graph
                .class_mut(self.mr.class)
                .get_or_create_import_path(head);
        } else if head == "new" {
            self.graph
                .class_mut(self.mr.class)
                .get_or_create_import_path("struct");
        } else if ComponentKind::from_head(head).is_some() {
            self.graph
                .class_mut(self.mr.class)
                .get_or_create_import_path(&format!("component_{head}"));
        }
    }

    /// Find a struct model whose last path segment matches `member`.
    fn find_struct(&self, member: &str) -> Option<String> {
        self.app
            .structs()
            .iter()
            .find(|model| model.name.rsplit('/').next() == Some(member))
            .map(|model| model.name.clone())
    }

    /// Find a constant field by name across the constant space.
    fn find_constant_field(&self, member: &str) -> Option<ValueType> {
        let space = self.graph.space_by_name("constant")?;
        for &pack in &self.graph.space(space).packs {
            for &class in &self.graph.pack(pack).classes {
                if let Some(field) = self.graph.class(class).field(member) {
                    return field.var_type.value_type().cloned();
                }
            }
        }
        None
    }

    // ── Calls ──────────────────────────────────────────────────────────

    fn call_expr(
        &mut self,
        id: ExprId,
        callee: ExprId,
        args: &[ExprId],
        span: Span,
    ) -> Result<Option<ValueType>, CompileError> {
        let code = span.slice(self.code).to_string();
        let path = self.path_of(callee).ok_or_else(|| {
            self.err_at(CompileError::unknown_callee(code.clone()), span)
        })?;
        let target = self
            .classify_call(&path)
            .map_err(|e| e.with_span(span).with_code(code))?;

        self.caches.call.insert(id, target.clone());
        self.caches.call_script.insert(id, path.clone());

        for &arg in args {
            self.expr_type(arg)?;
        }

        let result = target.result_type(self.graph);
        let target_space = match &target {
            CallTarget::Method(m) => Some(self.graph.class(m.class).space_name.clone()),
            _ => None,
        };
        let record = CallRecord {
            path,
            target: target.clone(),
        };
        let calls = &mut self.graph.method_mut(self.mr).calls;
        match &target {
            CallTarget::Component { .. } => push_call(&mut calls.component, record),
            CallTarget::Util { .. } => push_call(&mut calls.util, record),
            CallTarget::Method(_) => match target_space.as_deref() {
                Some("service") => push_call(&mut calls.service, record),
                Some("storage") => push_call(&mut calls.storage, record),
                _ => push_call(&mut calls.func, record),
            },
        }
        Ok(result)
    }

    /// Resolve a dotted call path to its tagged target.
    fn classify_call(&mut self, path: &str) -> Result<CallTarget, CompileError> {
        let segments: Vec<&str> = path.split('.').collect();
        let head = segments[0].to_string();
        self.register_import(&head);

        if UTIL_HEADS.contains(&head.as_str()) {
            if segments.len() < 2 {
                return Err(CompileError::unknown_callee(path));
            }
            return Ok(CallTarget::Util {
                path: path.to_string(),
            });
        }

        if ComponentKind::from_head(&head).is_some() {
            if segments.len() != 2 {
                return Err(CompileError::unknown_callee(path));
            }
            let component = self
                .app
                .component(&head)
                .ok_or_else(|| CompileError::unknown_callee(path))?;
            let method = component
                .kind
                .method(segments[1])
                .ok_or_else(|| CompileError::unknown_callee(path))?;
            return Ok(CallTarget::Component {
                component: head,
                method,
            });
        }

        if matches!(head.as_str(), "service" | "func" | "storage") {
            if segments.len() < 2 {
                return Err(CompileError::unknown_callee(path));
            }
            let class_path = &segments[1..segments.len() - 1];
            let method_name = segments[segments.len() - 1];
            let target = self
                .graph
                .find_method(&head, class_path, method_name)
                .ok_or_else(|| CompileError::unknown_callee(path))?;
            let is_this = target.class == self.mr.class;
            self.graph
                .class_mut(self.mr.class)
                .get_or_create_import_class(target.class, is_this);
            return Ok(CallTarget::Method(target));
        }

        Err(CompileError::unknown_callee(path))
    }

    // ── Assignment ─────────────────────────────────────────────────────

    fn assign_expr(
        &mut self,
        id: ExprId,
        target: ExprId,
        value: ExprId,
        span: Span,
    ) -> Result<Option<ValueType>, CompileError> {
        let target_span = self.ast.expr(target).span();
        let path = self.path_of(target).ok_or_else(|| {
            self.err_at(
                CompileError::unsupported(self.ast.expr(target).kind_name()),
                target_span,
            )
        })?;

        let value_is_null = matches!(self.ast.expr(value), Expr::Null { .. });
        let observed = self.expr_type(value)?;

        let (head, _) = split_path(&path);
        self.register_import(&head);

        let mut target_type = None;
        if self.graph.method(self.mr).binds(&head) {
            let code = span.slice(self.code).to_string();
            let node = self
                .graph
                .method_mut(self.mr)
                .path_node_mut(&path, self.app)
                .map_err(|e| e.with_span(span).with_code(code.clone()))?;
            if let Some(node) = node {
                if let Some(observed) = observed.clone() {
                    node.observe(observed)
                        .map_err(|e| e.with_span(span).with_code(code))?;
                }
                target_type = node.value_type().cloned();
            }
        }

        // Null assignments keep the slot's current type; the emitter
        // normalizes the literal against it.
        let frozen = if value_is_null {
            target_type.clone().filter(|t| *t != ValueType::Null)
        } else {
            target_type.clone().or_else(|| observed.clone())
        };
        self.caches.assign_script.insert(id, path);
        if let Some(t) = frozen {
            self.caches.assign_type.insert(id, t);
        }

        Ok(target_type.or(observed))
    }
}

/// Walk a declared type along the remainder of an access path.
///
/// Struct bases resolve each segment through the registry's declared
/// field table; a non-struct base with segments left, an undeclared
/// field, or an unknown base all yield `None`. Unlike
/// [`VarType::get_path`](crate::value_type::VarType::get_path), this
/// never grows anything: declared types (class fields, struct members)
/// are read-only during analysis.
fn resolve_declared_path(
    app: &App,
    base: Option<ValueType>,
    rest: Option<&str>,
) -> Option<ValueType> {
    let base = base?;
    let Some(rest) = rest else {
        return Some(base);
    };
    let ValueType::Struct(name) = base else {
        return None;
    };
    let (head, more) = split_path(rest);
    let model = app.struct_model(&name)?;
    let field = model.fields.iter().find(|f| f.name == head)?;
    let field_type = app.value_type(&field.value_type).ok()?;
    resolve_declared_path(app, Some(field_type), more.as_deref())
}

/// Result type of a binary expression: comparisons and logic yield bool;
/// arithmetic joins the operand types when they agree, otherwise stays
/// unknown (string concatenation with mixed operands is left untyped
/// rather than failing).
fn binary_result_type(
    op: fab_script::BinaryOp,
    left: Option<ValueType>,
    right: Option<ValueType>,
) -> Option<ValueType> {
    use fab_script::BinaryOp;
    match op {
        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Gt
        | BinaryOp::Le
        | BinaryOp::Ge
        | BinaryOp::And
        | BinaryOp::Or => Some(ValueType::Bool),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            match (left, right) {
                (Some(l), Some(r)) => l.join(&r).ok(),
                (l, r) => l.or(r),
            }
        }
    }
}
