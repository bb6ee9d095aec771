//! Format emitters for modelpub.
//!
//! Every model is published in six formats. Each backend implements
//! [`Emitter`] and writes through a [`modelpub_artifacts::FileSink`]; the
//! [`EmitterRegistry`] invokes them all and isolates their failures.

pub mod backends;
pub mod diagram_url;
pub mod emitter;
pub mod naming;

pub use emitter::{EmitContext, Emitter, EmitterRegistry, GeneratedArtifact, Scope};
