//! fab-script: lexer and parser for the embedded script subset.
//!
//! Method bodies in fab models are written in an ECMAScript-like subset:
//! `var` declarations, expression statements, if/else, throw, return,
//! binary and assignment operators, calls, member and subscript access,
//! template literals, object literals, and string/number/null literals.
//! This crate turns that text into an arena [`Ast`] whose nodes are
//! addressed by stable IDs, so the semantic analyzer and the emitter can
//! attach side-tables without relying on pointer identity.

pub mod ast;
pub mod error;
pub mod token;

mod cursor;
mod lexer;
mod parser;

pub use ast::{AssignOp, Ast, BinaryOp, Expr, ExprId, ObjectProp, Stmt, StmtId};
pub use error::ParseError;

/// A parsed script: the node arena plus the top-level statement list.
#[derive(Debug)]
pub struct Program {
    pub ast: Ast,
    pub body: Vec<StmtId>,
}

/// Parse script source into a [`Program`]. Stops at the first error.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    parser::Parser::new(source).parse_program()
}
