//! The compile-error envelope.
//!
//! Every phase halts at its first error and surfaces it with contextual
//! location: the class key, the method name, and the offending source
//! slice. Errors from the embedded script parser are wrapped with the
//! same envelope.

use std::fmt;

use serde::Serialize;

use crate::span::Span;

/// A compile error with its contextual envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub context: ErrorContext,
}

/// Where a compile error happened: class key, method name, and the
/// source slice that triggered it. All fields are optional because
/// errors acquire context as they bubble up through the phases.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorContext {
    pub class_key: Option<String>,
    pub method: Option<String>,
    pub span: Option<Span>,
    pub code: Option<String>,
}

/// The specific kind of compile error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CompileErrorKind {
    /// A referenced model name does not exist in the registry.
    ModelLookup { name: String },
    /// A method script body failed to parse.
    ScriptParse { message: String },
    /// An AST node of a kind the emitter does not handle.
    UnsupportedConstruct { kind: String },
    /// A dotted call path cannot be resolved to any known target.
    UnknownCallee { path: String },
    /// A struct-typed value has no field with the given name.
    UnknownField { type_name: String, field: String },
    /// Two observed value types cannot be joined.
    TypeMismatch { from: String, to: String },
    /// Two imports produce an unresolvable alias clash after suffixing.
    NameCollision { name: String },
    /// A bound method script is not the expected wrapped function body.
    InvalidScriptShape,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind) -> Self {
        Self {
            kind,
            context: ErrorContext::default(),
        }
    }

    pub fn model_lookup(name: impl Into<String>) -> Self {
        Self::new(CompileErrorKind::ModelLookup { name: name.into() })
    }

    pub fn unknown_callee(path: impl Into<String>) -> Self {
        Self::new(CompileErrorKind::UnknownCallee { path: path.into() })
    }

    pub fn unsupported(kind: impl Into<String>) -> Self {
        Self::new(CompileErrorKind::UnsupportedConstruct { kind: kind.into() })
    }

    /// Attach the class key this error belongs to. Does not overwrite an
    /// already-recorded key, so inner phases win over outer wrappers.
    pub fn with_class(mut self, key: impl Into<String>) -> Self {
        self.context.class_key.get_or_insert(key.into());
        self
    }

    /// Attach the method name this error belongs to.
    pub fn with_method(mut self, name: impl Into<String>) -> Self {
        self.context.method.get_or_insert(name.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.context.span.get_or_insert(span);
        self
    }

    /// Attach the offending source slice.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.context.code.get_or_insert(code.into());
        self
    }
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelLookup { name } => write!(f, "model [{name}] not found"),
            Self::ScriptParse { message } => write!(f, "script parse failed: {message}"),
            Self::UnsupportedConstruct { kind } => {
                write!(f, "construct [{kind}] is not supported")
            }
            Self::UnknownCallee { path } => {
                write!(f, "call [{path}] does not resolve to a known target")
            }
            Self::UnknownField { type_name, field } => {
                write!(f, "type [{type_name}] has no field [{field}]")
            }
            Self::TypeMismatch { from, to } => {
                write!(f, "types [{from}] and [{to}] are not compatible")
            }
            Self::NameCollision { name } => {
                write!(f, "import alias [{name}] still collides after suffixing")
            }
            Self::InvalidScriptShape => {
                write!(f, "method script is not a wrapped function body")
            }
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(key) = &self.context.class_key {
            write!(f, " in class [{key}]")?;
        }
        if let Some(method) = &self.context.method {
            write!(f, " method [{method}]")?;
        }
        if let Some(code) = &self.context.code {
            write!(f, ", code: {code}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let err = CompileError::unknown_callee("db.quary")
            .with_class("service/user")
            .with_method("get")
            .with_code("db.quary(sql)");
        assert_eq!(
            err.to_string(),
            "call [db.quary] does not resolve to a known target \
             in class [service/user] method [get], code: db.quary(sql)"
        );
    }

    #[test]
    fn context_is_first_writer_wins() {
        let err = CompileError::model_lookup("x")
            .with_class("inner")
            .with_class("outer");
        assert_eq!(err.context.class_key.as_deref(), Some("inner"));
    }
}
