//! The arena AST for parsed script bodies.
//!
//! Nodes live in flat vectors inside [`Ast`] and reference each other by
//! [`StmtId`] / [`ExprId`]. The IDs are stable for the lifetime of the
//! parse, which lets later phases attach side-tables keyed by node ID
//! instead of relying on pointer identity.

use fab_common::Span;
use serde::Serialize;

/// A stable index of a statement node within its [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StmtId(pub u32);

/// A stable index of an expression node within its [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExprId(pub u32);

/// Node arena for one parsed program.
#[derive(Debug, Default)]
pub struct Ast {
    stmts: Vec<Stmt>,
    exprs: Vec<Expr>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(stmt);
        id
    }

    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0 as usize]
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0 as usize]
    }

    pub fn stmt_count(&self) -> usize {
        self.stmts.len()
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }
}

/// A statement node.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// A bare expression followed by an optional `;`.
    Expression { expr: ExprId, span: Span },
    /// A `var` declaration with a single binding.
    Variable {
        name: String,
        init: Option<ExprId>,
        span: Span,
    },
    /// A `{ ... }` block.
    Block { body: Vec<StmtId>, span: Span },
    If {
        test: ExprId,
        consequent: StmtId,
        alternate: Option<StmtId>,
        span: Span,
    },
    Throw { argument: ExprId, span: Span },
    Return {
        argument: Option<ExprId>,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expression { span, .. }
            | Stmt::Variable { span, .. }
            | Stmt::Block { span, .. }
            | Stmt::If { span, .. }
            | Stmt::Throw { span, .. }
            | Stmt::Return { span, .. } => *span,
        }
    }

    /// A short name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::Expression { .. } => "ExpressionStatement",
            Stmt::Variable { .. } => "VariableStatement",
            Stmt::Block { .. } => "BlockStatement",
            Stmt::If { .. } => "IfStatement",
            Stmt::Throw { .. } => "ThrowStatement",
            Stmt::Return { .. } => "ReturnStatement",
        }
    }
}

/// An expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    Ident { name: String, span: Span },
    /// A number literal, kept as written so emission is faithful.
    Number { raw: String, span: Span },
    Str { value: String, span: Span },
    Bool { value: bool, span: Span },
    Null { span: Span },
    /// A template literal: `chunks` always has one more entry than `exprs`.
    Template {
        chunks: Vec<String>,
        exprs: Vec<ExprId>,
        span: Span,
    },
    /// An object literal with insertion-ordered properties.
    Object { props: Vec<ObjectProp>, span: Span },
    /// `left.name` member access.
    Dot {
        left: ExprId,
        name: String,
        span: Span,
    },
    /// `left[member]` subscript access.
    Bracket {
        left: ExprId,
        member: ExprId,
        span: Span,
    },
    Call {
        callee: ExprId,
        args: Vec<ExprId>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
        span: Span,
    },
    Assign {
        op: AssignOp,
        target: ExprId,
        value: ExprId,
        span: Span,
    },
    /// A parenthesized expression, preserved so emitted precedence matches.
    Paren { inner: ExprId, span: Span },
    /// A function literal. Only occurs as the wrapping IIFE callee.
    Function {
        params: Vec<String>,
        body: StmtId,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Ident { span, .. }
            | Expr::Number { span, .. }
            | Expr::Str { span, .. }
            | Expr::Bool { span, .. }
            | Expr::Null { span }
            | Expr::Template { span, .. }
            | Expr::Object { span, .. }
            | Expr::Dot { span, .. }
            | Expr::Bracket { span, .. }
            | Expr::Call { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Assign { span, .. }
            | Expr::Paren { span, .. }
            | Expr::Function { span, .. } => *span,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Ident { .. } => "Identifier",
            Expr::Number { .. } => "NumberLiteral",
            Expr::Str { .. } => "StringLiteral",
            Expr::Bool { .. } => "BooleanLiteral",
            Expr::Null { .. } => "NullLiteral",
            Expr::Template { .. } => "TemplateLiteral",
            Expr::Object { .. } => "ObjectLiteral",
            Expr::Dot { .. } => "DotExpression",
            Expr::Bracket { .. } => "BracketExpression",
            Expr::Call { .. } => "CallExpression",
            Expr::Binary { .. } => "BinaryExpression",
            Expr::Assign { .. } => "AssignExpression",
            Expr::Paren { .. } => "ParenExpression",
            Expr::Function { .. } => "FunctionLiteral",
        }
    }
}

/// One `key: value` property of an object literal.
#[derive(Debug, Clone)]
pub struct ObjectProp {
    /// The key, always a string-literal expression (identifier keys are
    /// normalized to strings at parse time).
    pub key: ExprId,
    pub value: ExprId,
}

/// Binary operators, printed as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
        }
    }
}
