//! fab-model: the declarative application model.
//!
//! Model records are the input to the compiler: constants, errors,
//! structs, storages, services, funcs, and components, each parsed from a
//! model file by the host loader (serde-shaped, so YAML or JSON both
//! work). [`App`] is the in-memory registry that keys them all by name.

pub mod app;
pub mod component;
pub mod models;

pub use app::App;
pub use component::{ComponentKind, ComponentMethod};
pub use models::{
    ArgModel, ComponentModel, ConstantModel, ConstantOption, ErrorModel, ErrorOption, FuncModel,
    StorageModel, StructField, StructModel,
};
