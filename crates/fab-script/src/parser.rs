//! Recursive-descent statement parser with Pratt expression parsing.
//!
//! Binding-power tables drive infix parsing; call, member, and subscript
//! forms are postfix with the tightest power. The parser allocates nodes
//! into the [`Ast`] arena and stops at the first error.

use fab_common::Span;

use crate::ast::{AssignOp, Ast, BinaryOp, Expr, ExprId, ObjectProp, Stmt, StmtId};
use crate::error::ParseError;
use crate::lexer::{resolve_keyword, Lexer};
use crate::token::{Token, TokenKind};
use crate::Program;

pub(crate) struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    ast: Ast,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        let tokens = Lexer::tokenize(source)
            .into_iter()
            .map(|t| Token {
                kind: resolve_keyword(source, t),
                span: t.span,
            })
            .collect();
        Self {
            source,
            tokens,
            pos: 0,
            ast: Ast::new(),
        }
    }

    pub fn parse_program(mut self) -> Result<Program, ParseError> {
        let mut body = Vec::new();
        while !self.at(TokenKind::Eof) {
            while self.eat(TokenKind::Semi) {}
            if self.at(TokenKind::Eof) {
                break;
            }
            body.push(self.stmt()?);
        }
        Ok(Program {
            ast: self.ast,
            body,
        })
    }

    // ── Token plumbing ─────────────────────────────────────────────────

    fn current(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    fn current_token(&self) -> Token {
        self.tokens[self.pos]
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos];
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            return true;
        }
        false
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.at(kind) {
            return Ok(self.bump());
        }
        let found = self.current_token();
        Err(ParseError::new(
            format!(
                "expected {}, found {}",
                kind.describe(),
                found.kind.describe()
            ),
            found.span,
        ))
    }

    fn text(&self, token: Token) -> &'src str {
        token.span.slice(self.source)
    }

    /// End position of the last consumed token.
    fn prev_end(&self) -> u32 {
        if self.pos == 0 {
            return 0;
        }
        self.tokens[self.pos - 1].span.end
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn stmt(&mut self) -> Result<StmtId, ParseError> {
        match self.current() {
            TokenKind::KwVar => self.var_stmt(),
            TokenKind::KwIf => self.if_stmt(),
            TokenKind::KwThrow => self.throw_stmt(),
            TokenKind::KwReturn => self.return_stmt(),
            TokenKind::LBrace => self.block_stmt(),
            _ => self.expr_stmt(),
        }
    }

    fn var_stmt(&mut self) -> Result<StmtId, ParseError> {
        let start = self.bump().span.start;
        let name_token = self.expect(TokenKind::Ident)?;
        let name = self.text(name_token).to_string();
        let init = if self.eat(TokenKind::Assign) {
            Some(self.expr()?)
        } else {
            None
        };
        self.eat(TokenKind::Semi);
        let span = Span::new(start, self.prev_end());
        Ok(self.ast.alloc_stmt(Stmt::Variable { name, init, span }))
    }

    fn if_stmt(&mut self) -> Result<StmtId, ParseError> {
        let start = self.bump().span.start;
        self.expect(TokenKind::LParen)?;
        let test = self.expr()?;
        self.expect(TokenKind::RParen)?;
        let consequent = self.stmt()?;
        let alternate = if self.eat(TokenKind::KwElse) {
            Some(self.stmt()?)
        } else {
            None
        };
        let span = Span::new(start, self.prev_end());
        Ok(self.ast.alloc_stmt(Stmt::If {
            test,
            consequent,
            alternate,
            span,
        }))
    }

    fn throw_stmt(&mut self) -> Result<StmtId, ParseError> {
        let start = self.bump().span.start;
        let argument = self.expr()?;
        self.eat(TokenKind::Semi);
        let span = Span::new(start, self.prev_end());
        Ok(self.ast.alloc_stmt(Stmt::Throw { argument, span }))
    }

    fn return_stmt(&mut self) -> Result<StmtId, ParseError> {
        let start = self.bump().span.start;
        let argument = if self.at(TokenKind::Semi)
            || self.at(TokenKind::RBrace)
            || self.at(TokenKind::Eof)
        {
            None
        } else {
            Some(self.expr()?)
        };
        self.eat(TokenKind::Semi);
        let span = Span::new(start, self.prev_end());
        Ok(self.ast.alloc_stmt(Stmt::Return { argument, span }))
    }

    fn block_stmt(&mut self) -> Result<StmtId, ParseError> {
        let start = self.expect(TokenKind::LBrace)?.span.start;
        let mut body = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            while self.eat(TokenKind::Semi) {}
            if self.at(TokenKind::RBrace) || self.at(TokenKind::Eof) {
                break;
            }
            body.push(self.stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        let span = Span::new(start, self.prev_end());
        Ok(self.ast.alloc_stmt(Stmt::Block { body, span }))
    }

    fn expr_stmt(&mut self) -> Result<StmtId, ParseError> {
        let expr = self.expr()?;
        self.eat(TokenKind::Semi);
        let span = self.ast.expr(expr).span();
        Ok(self.ast.alloc_stmt(Stmt::Expression { expr, span }))
    }

    // ── Expressions ────────────────────────────────────────────────────

    fn expr(&mut self) -> Result<ExprId, ParseError> {
        let lhs = self.binary_expr(0)?;
        let op = match self.current() {
            TokenKind::Assign => AssignOp::Assign,
            TokenKind::PlusAssign => AssignOp::Add,
            TokenKind::MinusAssign => AssignOp::Sub,
            TokenKind::StarAssign => AssignOp::Mul,
            TokenKind::SlashAssign => AssignOp::Div,
            _ => return Ok(lhs),
        };
        if !self.is_assign_target(lhs) {
            let span = self.ast.expr(lhs).span();
            return Err(ParseError::new("invalid assignment target", span));
        }
        self.bump();
        // Right-associative: `a = b = c` nests to the right.
        let value = self.expr()?;
        let span = self.ast.expr(lhs).span().merge(self.ast.expr(value).span());
        Ok(self.ast.alloc_expr(Expr::Assign {
            op,
            target: lhs,
            value,
            span,
        }))
    }

    fn is_assign_target(&self, id: ExprId) -> bool {
        matches!(
            self.ast.expr(id),
            Expr::Ident { .. } | Expr::Dot { .. } | Expr::Bracket { .. }
        )
    }

    /// (left, right) binding power for infix operators; left < right is
    /// left-associative.
    fn infix_binding_power(kind: TokenKind) -> Option<(BinaryOp, u8, u8)> {
        let entry = match kind {
            TokenKind::PipePipe => (BinaryOp::Or, 1, 2),
            TokenKind::AmpAmp => (BinaryOp::And, 3, 4),
            TokenKind::EqEq => (BinaryOp::Eq, 5, 6),
            TokenKind::NotEq => (BinaryOp::Ne, 5, 6),
            TokenKind::Lt => (BinaryOp::Lt, 7, 8),
            TokenKind::Gt => (BinaryOp::Gt, 7, 8),
            TokenKind::LtEq => (BinaryOp::Le, 7, 8),
            TokenKind::GtEq => (BinaryOp::Ge, 7, 8),
            TokenKind::Plus => (BinaryOp::Add, 9, 10),
            TokenKind::Minus => (BinaryOp::Sub, 9, 10),
            TokenKind::Star => (BinaryOp::Mul, 11, 12),
            TokenKind::Slash => (BinaryOp::Div, 11, 12),
            TokenKind::Percent => (BinaryOp::Rem, 11, 12),
            _ => return None,
        };
        Some(entry)
    }

    fn binary_expr(&mut self, min_bp: u8) -> Result<ExprId, ParseError> {
        let mut lhs = self.postfix_expr()?;
        while let Some((op, l_bp, r_bp)) = Self::infix_binding_power(self.current()) {
            if l_bp < min_bp {
                break;
            }
            self.bump();
            let rhs = self.binary_expr(r_bp)?;
            let span = self.ast.expr(lhs).span().merge(self.ast.expr(rhs).span());
            lhs = self.ast.alloc_expr(Expr::Binary {
                op,
                left: lhs,
                right: rhs,
                span,
            });
        }
        Ok(lhs)
    }

    fn postfix_expr(&mut self) -> Result<ExprId, ParseError> {
        let mut lhs = self.primary_expr()?;
        loop {
            match self.current() {
                TokenKind::Dot => {
                    self.bump();
                    let name_token = self.expect(TokenKind::Ident)?;
                    let name = self.text(name_token).to_string();
                    let span = Span::new(self.ast.expr(lhs).span().start, name_token.span.end);
                    lhs = self.ast.alloc_expr(Expr::Dot {
                        left: lhs,
                        name,
                        span,
                    });
                }
                TokenKind::LBracket => {
                    self.bump();
                    let member = self.expr()?;
                    let end = self.expect(TokenKind::RBracket)?.span.end;
                    let span = Span::new(self.ast.expr(lhs).span().start, end);
                    lhs = self.ast.alloc_expr(Expr::Bracket {
                        left: lhs,
                        member,
                        span,
                    });
                }
                TokenKind::LParen => {
                    self.bump();
                    let mut args = Vec::new();
                    while !self.at(TokenKind::RParen) {
                        args.push(self.expr()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    let end = self.expect(TokenKind::RParen)?.span.end;
                    let span = Span::new(self.ast.expr(lhs).span().start, end);
                    lhs = self.ast.alloc_expr(Expr::Call {
                        callee: lhs,
                        args,
                        span,
                    });
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn primary_expr(&mut self) -> Result<ExprId, ParseError> {
        match self.current() {
            TokenKind::Ident => {
                let token = self.bump();
                let name = self.text(token).to_string();
                Ok(self.ast.alloc_expr(Expr::Ident {
                    name,
                    span: token.span,
                }))
            }
            TokenKind::Number => {
                let token = self.bump();
                let raw = self.text(token).to_string();
                Ok(self.ast.alloc_expr(Expr::Number {
                    raw,
                    span: token.span,
                }))
            }
            TokenKind::Str => {
                let token = self.bump();
                let raw = self.text(token);
                let value = cook_string(&raw[1..raw.len().saturating_sub(1)]);
                Ok(self.ast.alloc_expr(Expr::Str {
                    value,
                    span: token.span,
                }))
            }
            TokenKind::KwNull => {
                let token = self.bump();
                Ok(self.ast.alloc_expr(Expr::Null { span: token.span }))
            }
            TokenKind::KwTrue | TokenKind::KwFalse => {
                let token = self.bump();
                Ok(self.ast.alloc_expr(Expr::Bool {
                    value: token.kind == TokenKind::KwTrue,
                    span: token.span,
                }))
            }
            TokenKind::TemplateStart => self.template_expr(),
            TokenKind::LBrace => self.object_expr(),
            TokenKind::LParen => {
                let start = self.bump().span.start;
                let inner = self.expr()?;
                let end = self.expect(TokenKind::RParen)?.span.end;
                Ok(self.ast.alloc_expr(Expr::Paren {
                    inner,
                    span: Span::new(start, end),
                }))
            }
            TokenKind::KwFunction => self.function_expr(),
            TokenKind::Minus => {
                // Negative number literals only; general unary operators
                // are outside the supported subset.
                let minus = self.bump();
                let token = self.expect(TokenKind::Number).map_err(|_| {
                    ParseError::new("unary `-` is only supported on number literals", minus.span)
                })?;
                let raw = format!("-{}", self.text(token));
                Ok(self.ast.alloc_expr(Expr::Number {
                    raw,
                    span: Span::new(minus.span.start, token.span.end),
                }))
            }
            TokenKind::Bang => {
                let token = self.current_token();
                Err(ParseError::new(
                    "unary `!` is not supported; compare against a literal instead",
                    token.span,
                ))
            }
            _ => {
                let token = self.current_token();
                Err(ParseError::new(
                    format!("expected expression, found {}", token.kind.describe()),
                    token.span,
                ))
            }
        }
    }

    fn template_expr(&mut self) -> Result<ExprId, ParseError> {
        let start = self.expect(TokenKind::TemplateStart)?.span.start;
        let mut chunks = Vec::new();
        let mut exprs = Vec::new();
        loop {
            let chunk = self.expect(TokenKind::TemplateChunk)?;
            chunks.push(cook_string(self.text(chunk)));
            match self.current() {
                TokenKind::InterpStart => {
                    self.bump();
                    exprs.push(self.expr()?);
                    self.expect(TokenKind::InterpEnd)?;
                }
                TokenKind::TemplateEnd => {
                    self.bump();
                    break;
                }
                _ => {
                    let token = self.current_token();
                    return Err(ParseError::new(
                        "unterminated template literal",
                        token.span,
                    ));
                }
            }
        }
        let span = Span::new(start, self.prev_end());
        Ok(self
            .ast
            .alloc_expr(Expr::Template { chunks, exprs, span }))
    }

    fn object_expr(&mut self) -> Result<ExprId, ParseError> {
        let start = self.expect(TokenKind::LBrace)?.span.start;
        let mut props = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let key = match self.current() {
                TokenKind::Ident => {
                    let token = self.bump();
                    let value = self.text(token).to_string();
                    self.ast.alloc_expr(Expr::Str {
                        value,
                        span: token.span,
                    })
                }
                TokenKind::Str => {
                    let token = self.bump();
                    let raw = self.text(token);
                    let value = cook_string(&raw[1..raw.len().saturating_sub(1)]);
                    self.ast.alloc_expr(Expr::Str {
                        value,
                        span: token.span,
                    })
                }
                _ => {
                    let token = self.current_token();
                    return Err(ParseError::new(
                        format!("expected property key, found {}", token.kind.describe()),
                        token.span,
                    ));
                }
            };
            self.expect(TokenKind::Colon)?;
            let value = self.expr()?;
            props.push(ObjectProp { key, value });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        let end = self.expect(TokenKind::RBrace)?.span.end;
        Ok(self.ast.alloc_expr(Expr::Object {
            props,
            span: Span::new(start, end),
        }))
    }

    fn function_expr(&mut self) -> Result<ExprId, ParseError> {
        let start = self.expect(TokenKind::KwFunction)?.span.start;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while self.at(TokenKind::Ident) {
            let token = self.bump();
            params.push(self.text(token).to_string());
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        if !self.at(TokenKind::LBrace) {
            let token = self.current_token();
            return Err(ParseError::new(
                "expected function body block",
                token.span,
            ));
        }
        let body = self.block_stmt()?;
        let span = Span::new(start, self.prev_end());
        Ok(self.ast.alloc_expr(Expr::Function { params, body, span }))
    }
}

/// Process escape sequences in string and template-chunk text.
fn cook_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
