// Shared types for the fab compiler: byte spans, the compile-error
// envelope, and the value-type lattice that every later phase speaks.

pub mod error;
pub mod span;
pub mod value_type;

pub use error::{CompileError, CompileErrorKind, ErrorContext};
pub use span::Span;
pub use value_type::ValueType;
