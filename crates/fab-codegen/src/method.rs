//! Method body emission: the second AST walk.
//!
//! Walks the bound script of one method and prints Go source through the
//! tab-managed writer, consuming the analyzer's caches read-only. Every
//! fallible call is either consumed by an assignment that writes `err` or
//! followed by the stock err-guard, and every method body ends on a
//! `return` row.

use fab_common::{CompileError, Span, ValueType};
use fab_compile::{imports::space_package, BoundScript, CallTarget, Class, Graph, Method};
use fab_script::{Expr, ExprId, Stmt, StmtId};

use crate::types::{class_bean_name, class_type_name, first_to_upper, go_type, quote, struct_ref};
use crate::writer::SourceWriter;

pub(crate) struct MethodEmitter<'a> {
    graph: &'a Graph,
    class: &'a Class,
    method: &'a Method,
    script: &'a BoundScript,
    w: &'a mut SourceWriter,
    last_return_row: usize,
}

/// The emitted signature of a method, shared with storage emission.
pub(crate) fn method_signature(class: &Class, method: &Method) -> String {
    let mut signature = format!(
        "func (this_ *{}) {}(",
        class_type_name(class),
        first_to_upper(&method.name)
    );
    for (i, param) in method.params.iter().enumerate() {
        if i > 0 {
            signature.push_str(", ");
        }
        let type_str = param
            .var_type
            .value_type()
            .map(|t| go_type(class, t))
            .unwrap_or_else(|| "any".to_string());
        signature.push_str(&param.name);
        signature.push(' ');
        signature.push_str(&type_str);
    }
    signature.push_str(") (");
    if let Some(t) = method.result.value_type() {
        signature.push_str("res ");
        signature.push_str(&go_type(class, t));
        signature.push_str(", ");
    }
    signature.push_str("err error) {");
    signature
}

impl<'a> MethodEmitter<'a> {
    pub fn new(
        graph: &'a Graph,
        class: &'a Class,
        method: &'a Method,
        script: &'a BoundScript,
        w: &'a mut SourceWriter,
    ) -> Self {
        Self {
            graph,
            class,
            method,
            script,
            w,
            last_return_row: 0,
        }
    }

    pub fn gen(mut self) -> Result<(), CompileError> {
        let method_name = first_to_upper(&self.method.name);
        self.w.tabs();
        self.w.code("// ");
        self.w.code(&method_name);
        if !self.method.comment.is_empty() {
            self.w.code(" ");
            self.w.code(&self.method.comment);
        }
        self.w.newline();

        self.w.line(&method_signature(self.class, self.method));
        self.w.indent();

        let body = self.script.body.clone();
        self.statements(&body)?;

        if self.last_return_row != self.w.row() {
            self.w.line("return");
        }
        self.w.dedent();
        self.w.line("}");
        Ok(())
    }

    fn unsupported(&self, kind: &str, span: Span) -> CompileError {
        CompileError::unsupported(kind)
            .with_span(span)
            .with_code(span.slice(&self.script.code))
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn statements(&mut self, body: &[StmtId]) -> Result<(), CompileError> {
        for &stmt in body {
            self.statement(stmt)?;
        }
        Ok(())
    }

    fn statement(&mut self, id: StmtId) -> Result<(), CompileError> {
        let ast = &self.script.program.ast;
        match ast.stmt(id) {
            Stmt::Expression { expr, .. } => self.expression_statement(*expr),
            Stmt::Variable { .. } => self.binding(id),
            Stmt::Block { body, .. } => self.statements(body),
            Stmt::If { .. } => self.if_chain(id),
            Stmt::Throw { argument, .. } => self.throw_statement(*argument),
            Stmt::Return { argument, .. } => self.return_statement(*argument),
        }
    }

    fn expression_statement(&mut self, expr: ExprId) -> Result<(), CompileError> {
        let ast = &self.script.program.ast;
        match ast.expr(expr) {
            Expr::Call { .. } => self.call_statement(expr),
            Expr::Assign { .. } => self.assign_expr(expr, true),
            _ => {
                self.w.tabs();
                self.expr(expr)?;
                self.w.newline();
                Ok(())
            }
        }
    }

    /// Whether an expression is a call to an error-producing target.
    fn call_has_error(&self, id: ExprId) -> bool {
        matches!(self.script.program.ast.expr(id), Expr::Call { .. })
            && self
                .script
                .caches
                .call
                .get(&id)
                .is_some_and(|t| t.has_error())
    }

    fn call_statement(&mut self, call: ExprId) -> Result<(), CompileError> {
        let has_error = self.call_has_error(call);
        let has_return = self
            .script
            .caches
            .call
            .get(&call)
            .is_some_and(|t| t.has_return(self.graph));
        self.w.tabs();
        if has_error {
            if has_return {
                self.w.code("_, ");
            }
            self.w.code("err = ");
        }
        self.expr(call)?;
        self.w.newline();
        if has_error {
            self.err_guard();
        }
        Ok(())
    }

    fn binding(&mut self, id: StmtId) -> Result<(), CompileError> {
        let ast = &self.script.program.ast;
        let Stmt::Variable { name, init, .. } = ast.stmt(id) else {
            return Ok(());
        };
        let name = name.clone();
        let init = *init;

        let value_type = self
            .script
            .caches
            .binding
            .get(&id)
            .and_then(|&slot| self.method.vars.get(slot))
            .and_then(|v| v.var_type.value_type())
            .cloned();
        let type_str = value_type
            .as_ref()
            .map(|t| go_type(self.class, t))
            .unwrap_or_else(|| "any".to_string());
        let has_error = init.is_some_and(|e| self.call_has_error(e));

        if init.is_none() || has_error {
            self.w.line(&format!("var {name} {type_str}"));
        }

        match init {
            Some(init) => {
                self.w.tabs();
                if has_error {
                    self.w.code(&name);
                    self.w.code(", err = ");
                } else {
                    self.w.code("var ");
                    self.w.code(&name);
                    self.w.code(" = ");
                }
                self.expr(init)?;
                self.w.newline();
                if has_error {
                    self.err_guard();
                }
            }
            None => match value_type {
                Some(ValueType::Map) => {
                    self.w.line(&format!("{name} = make(map[string]any)"));
                }
                Some(ValueType::Struct(path)) => {
                    let struct_name = struct_ref(self.class, &path);
                    self.w.line(&format!("{name} = &{struct_name}{{}}"));
                }
                _ => {}
            },
        }
        Ok(())
    }

    fn throw_statement(&mut self, argument: ExprId) -> Result<(), CompileError> {
        self.w.tabs();
        self.w.code("err = ");
        self.expr(argument)?;
        self.w.newline();
        self.w.line("return");
        self.last_return_row = self.w.row();
        Ok(())
    }

    fn return_statement(&mut self, argument: Option<ExprId>) -> Result<(), CompileError> {
        if let Some(argument) = argument {
            self.w.tabs();
            if self.call_has_error(argument) {
                self.w.code("res, err = ");
            } else {
                self.w.code("res = ");
            }
            self.expr(argument)?;
            self.w.newline();
        }
        self.w.line("return");
        self.last_return_row = self.w.row();
        Ok(())
    }

    fn if_chain(&mut self, id: StmtId) -> Result<(), CompileError> {
        self.w.tabs();
        self.w.code("if ");
        let mut current = id;
        loop {
            let ast = &self.script.program.ast;
            let Stmt::If {
                test,
                consequent,
                alternate,
                ..
            } = ast.stmt(current)
            else {
                break;
            };
            let (test, consequent, alternate) = (*test, *consequent, *alternate);

            self.expr(test)?;
            self.w.code(" {");
            self.w.newline();
            self.w.indent();
            self.branch_body(consequent)?;
            self.w.dedent();
            self.w.tabs();
            self.w.code("}");

            let Some(alternate) = alternate else {
                break;
            };
            let alternate_is_if = matches!(
                self.script.program.ast.stmt(alternate),
                Stmt::If { .. }
            );
            if alternate_is_if {
                self.w.code(" else if ");
                current = alternate;
            } else {
                self.w.code(" else {");
                self.w.newline();
                self.w.indent();
                self.branch_body(alternate)?;
                self.w.dedent();
                self.w.tabs();
                self.w.code("}");
                break;
            }
        }
        self.w.newline();
        Ok(())
    }

    /// Emit an if/else branch: blocks flatten into their children.
    fn branch_body(&mut self, id: StmtId) -> Result<(), CompileError> {
        let ast = &self.script.program.ast;
        match ast.stmt(id) {
            Stmt::Block { body, .. } => self.statements(body),
            _ => self.statement(id),
        }
    }

    fn err_guard(&mut self) {
        self.w.line("if err != nil {");
        self.w.indent();
        self.w.line("return");
        self.w.dedent();
        self.w.line("}");
    }

    // ── Expressions ────────────────────────────────────────────────────

    fn expr(&mut self, id: ExprId) -> Result<(), CompileError> {
        let ast = &self.script.program.ast;
        match ast.expr(id) {
            // A bare identifier is always the head of its chain; members
            // of dot chains are upper-camelled directly by the Dot arm.
            Expr::Ident { name, .. } => {
                match self.class.import_as_name(name) {
                    Some(alias) => {
                        let alias = alias.to_string();
                        self.w.code(&alias);
                    }
                    None => self.w.code(name),
                }
                Ok(())
            }
            Expr::Number { raw, .. } => {
                self.w.code(raw);
                Ok(())
            }
            Expr::Str { value, .. } => {
                let quoted = quote(value);
                self.w.code(&quoted);
                Ok(())
            }
            Expr::Bool { value, .. } => {
                self.w.code(if *value { "true" } else { "false" });
                Ok(())
            }
            Expr::Null { .. } => {
                self.w.code("nil");
                Ok(())
            }
            Expr::Template { .. } => self.template(id),
            Expr::Object { .. } => self.object(id),
            Expr::Dot { left, name, .. } => {
                let left = *left;
                let upper = first_to_upper(name);
                self.expr(left)?;
                self.w.code(".");
                self.w.code(&upper);
                Ok(())
            }
            Expr::Bracket { left, member, .. } => {
                let (left, member) = (*left, *member);
                self.expr(left)?;
                self.w.code("[");
                self.expr(member)?;
                self.w.code("]");
                Ok(())
            }
            Expr::Call { .. } => self.call(id),
            Expr::Binary {
                op, left, right, ..
            } => {
                let (op, left, right) = (*op, *left, *right);
                self.expr(left)?;
                self.w.code(" ");
                self.w.code(op.as_str());
                self.w.code(" ");
                self.expr(right)
            }
            Expr::Assign { .. } => self.assign_expr(id, false),
            Expr::Paren { inner, .. } => {
                let inner = *inner;
                self.w.code("(");
                self.expr(inner)?;
                self.w.code(")");
                Ok(())
            }
            Expr::Function { span, .. } => {
                Err(self.unsupported(ast.expr(id).kind_name(), *span))
            }
        }
    }

    fn call(&mut self, id: ExprId) -> Result<(), CompileError> {
        let path = self
            .script
            .caches
            .call_script
            .get(&id)
            .cloned()
            .unwrap_or_default();
        let formatted = match self.script.caches.call.get(&id) {
            Some(target) => self.format_method(&path, target),
            None => path,
        };
        self.w.code(&formatted);
        self.w.code("(");
        let ast = &self.script.program.ast;
        if let Expr::Call { args, .. } = ast.expr(id) {
            for (i, &arg) in args.iter().enumerate() {
                if i > 0 {
                    self.w.code(", ");
                }
                self.argument(arg)?;
            }
        }
        self.w.code(")");
        Ok(())
    }

    /// Emit one call argument. A bare struct path in argument position
    /// emits as struct construction.
    fn argument(&mut self, arg: ExprId) -> Result<(), CompileError> {
        let ast = &self.script.program.ast;
        if let Expr::Dot { left, name, .. } = ast.expr(arg) {
            if let Expr::Ident { name: head, .. } = ast.expr(*left) {
                if head == "struct" || head == "new" {
                    let struct_name = struct_ref(self.class, name);
                    self.w.code(&format!("&{struct_name}{{}}"));
                    return Ok(());
                }
            }
        }
        self.expr(arg)
    }

    fn assign_expr(&mut self, id: ExprId, stmt_pos: bool) -> Result<(), CompileError> {
        let ast = &self.script.program.ast;
        let Expr::Assign { op, value, .. } = ast.expr(id) else {
            return Ok(());
        };
        let (op, value) = (*op, *value);
        let path = self
            .script
            .caches
            .assign_script
            .get(&id)
            .cloned()
            .unwrap_or_default();
        let formatted = self.format_assign(&path);
        let has_error = stmt_pos && self.call_has_error(value);

        if stmt_pos {
            self.w.tabs();
        }
        self.w.code(&formatted);
        if has_error {
            self.w.code(", err");
        }
        self.w.code(" ");
        self.w.code(op.as_str());
        self.w.code(" ");

        if matches!(self.script.program.ast.expr(value), Expr::Null { .. }) {
            // Null normalizes against the target's frozen type.
            match self.script.caches.assign_type.get(&id) {
                Some(t) if t.is_number() => self.w.code("0"),
                Some(ValueType::String) => self.w.code("\"\""),
                _ => self.w.code("nil"),
            }
        } else {
            self.expr(value)?;
        }

        if stmt_pos {
            self.w.newline();
            if has_error {
                self.err_guard();
            }
        }
        Ok(())
    }

    fn template(&mut self, id: ExprId) -> Result<(), CompileError> {
        let ast = &self.script.program.ast;
        let Expr::Template { chunks, exprs, .. } = ast.expr(id) else {
            return Ok(());
        };
        let alias = self
            .class
            .import_as_name("fmt")
            .unwrap_or("fmt")
            .to_string();
        self.w.code(&alias);
        self.w.code(".Sprintf(`");
        for (i, chunk) in chunks.iter().enumerate() {
            self.w.code(chunk);
            if i + 1 < chunks.len() {
                self.w.code("%v");
            }
        }
        self.w.code("`");
        for &expr in exprs {
            self.w.code(", ");
            self.expr(expr)?;
        }
        self.w.code(")");
        Ok(())
    }

    fn object(&mut self, id: ExprId) -> Result<(), CompileError> {
        let ast = &self.script.program.ast;
        let Expr::Object { props, .. } = ast.expr(id) else {
            return Ok(());
        };
        if props.is_empty() {
            self.w.code("map[string]any{}");
            return Ok(());
        }
        self.w.code("map[string]any{");
        for (i, prop) in props.iter().enumerate() {
            if i > 0 {
                self.w.code(", ");
            }
            self.expr(prop.key)?;
            self.w.code(" : ");
            self.expr(prop.value)?;
        }
        self.w.code("}");
        Ok(())
    }

    // ── Path rewriting ─────────────────────────────────────────────────

    /// Rewrite a call path: user methods route through the receiver or
    /// the target class bean; everything else rewrites like an
    /// assignment path.
    fn format_method(&self, path: &str, target: &CallTarget) -> String {
        match target {
            CallTarget::Method(mr) => {
                let method_name =
                    first_to_upper(path.rsplit('.').next().unwrap_or(path));
                if mr.class == self.class.id {
                    return format!("this_.{method_name}");
                }
                let target_class = self.graph.class(mr.class);
                let bean = class_bean_name(target_class);
                if target_class.space == self.class.space {
                    // Same emitted package; the bean is in scope.
                    format!("{bean}.{method_name}")
                } else {
                    let alias = self
                        .class_import_alias(mr.class)
                        .unwrap_or_else(|| space_package(&target_class.space_name).to_string());
                    format!("{alias}.{bean}.{method_name}")
                }
            }
            _ => self.format_assign(path),
        }
    }

    /// Rewrite a dotted path: alias-replace the head, upper-camel the
    /// rest. Single-segment paths pass through untouched.
    fn format_assign(&self, path: &str) -> String {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.len() < 2 {
            return path.to_string();
        }
        let mut out = String::new();
        match self.class.import_as_name(segments[0]) {
            Some(alias) => out.push_str(alias),
            None => out.push_str(segments[0]),
        }
        for segment in &segments[1..] {
            out.push('.');
            out.push_str(&first_to_upper(segment));
        }
        out
    }

    fn class_import_alias(&self, class: fab_compile::ClassId) -> Option<String> {
        self.class.imports.iter().find_map(|import| {
            match import.target {
                fab_compile::ImportTarget::Class(c) if c == class => import.alias.clone(),
                _ => None,
            }
        })
    }
}
