//! Parse error type for the script parser.

use std::fmt;

use fab_common::Span;

/// A parse error with the source location where it was detected.
///
/// The parser stops at the first error; the driver wraps it into the
/// shared compile-error envelope together with class and method context.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}
