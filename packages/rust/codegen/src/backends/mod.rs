//! The six built-in format backends.

mod go;
mod java;
mod jsonschema;
mod plantuml;
mod typescript;
mod xsd;

pub use go::GoEmitter;
pub use java::JavaEmitter;
pub use jsonschema::JsonSchemaEmitter;
pub use plantuml::PlantUmlEmitter;
pub use typescript::TypeScriptEmitter;
pub use xsd::XsdEmitter;
