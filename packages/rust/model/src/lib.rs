//! The modelling language: parsing, validation, linking, and remote resolution.
//!
//! A [`ModelGraph`] holds one source file's model together with the system
//! base model and every externally resolved dependency. The core pipeline
//! builds one graph per file and never shares it.

pub mod ast;
pub mod graph;
pub mod parser;
pub mod resolver;
pub mod system;
pub mod validate;

pub use ast::{
    DeclKind, Declaration, Identified, Import, ImportNames, Member, ModelFile, PRIMITIVES,
    is_primitive,
};
pub use graph::{ModelGraph, RegisteredModel, TypeRef};
pub use parser::parse_model;
pub use resolver::{HttpResolver, ModelResolver, update_external_models};
pub use system::{SYSTEM_MODEL, SYSTEM_MODEL_NAME};
pub use validate::{ValidationIssue, validate};
