//! Error types for modelpub.
//!
//! Library crates use [`ModelPubError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Per-file outcomes that must never abort a batch have their own types:
//! [`RejectionReason`] for models that fail loading and [`EmitFailure`] for a
//! single format backend that could not produce its artifact.

use std::path::PathBuf;

use crate::types::FormatTag;

/// Top-level error type for modelpub operations.
#[derive(Debug, thiserror::Error)]
pub enum ModelPubError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while resolving a remote model.
    #[error("network error: {0}")]
    Network(String),

    /// Model text could not be parsed.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (structural rule violated, bad input, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Archive container could not be written.
    #[error("archive error: {0}")]
    Archive(String),

    /// Site index could not be rendered or written.
    #[error("index error: {0}")]
    Index(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ModelPubError>;

impl ModelPubError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error at the given (1-based) line.
    pub fn parse(line: usize, msg: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a model file was excluded from publishing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectionReason {
    /// The model text is not syntactically valid.
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// The model violates a structural rule (duplicate or undeclared types, etc.).
    #[error("invalid model: {0}")]
    Structure(String),

    /// An imported namespace could not be resolved or linked.
    #[error("unresolved import {namespace}: {message}")]
    Unresolved { namespace: String, message: String },

    /// The source file itself could not be read.
    #[error("unreadable model file: {0}")]
    Unreadable(String),
}

impl From<ModelPubError> for RejectionReason {
    fn from(err: ModelPubError) -> Self {
        match err {
            ModelPubError::Parse { line, message } => Self::Syntax { line, message },
            ModelPubError::Io { path, source } => {
                Self::Unreadable(format!("{}: {source}", path.display()))
            }
            other => Self::Structure(other.to_string()),
        }
    }
}

/// A format backend failed to produce its artifact.
#[derive(Debug, thiserror::Error)]
#[error("{format} generation failed for {}: {message}", destination.display())]
pub struct EmitFailure {
    /// Which backend failed.
    pub format: FormatTag,
    /// The destination the artifact was meant for.
    pub destination: PathBuf,
    /// What went wrong.
    pub message: String,
}

impl EmitFailure {
    pub fn new(format: FormatTag, destination: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self {
            format,
            destination: destination.into(),
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ModelPubError::config("missing input directory");
        assert_eq!(err.to_string(), "config error: missing input directory");

        let err = ModelPubError::parse(3, "expected '{'");
        assert_eq!(err.to_string(), "parse error at line 3: expected '{'");
    }

    #[test]
    fn parse_error_becomes_syntax_rejection() {
        let reason: RejectionReason = ModelPubError::parse(7, "unexpected token").into();
        assert_eq!(
            reason,
            RejectionReason::Syntax {
                line: 7,
                message: "unexpected token".into()
            }
        );
    }

    #[test]
    fn validation_error_becomes_structure_rejection() {
        let reason: RejectionReason =
            ModelPubError::validation("duplicate declaration 'Car'").into();
        assert!(matches!(reason, RejectionReason::Structure(ref m) if m.contains("Car")));
    }

    #[test]
    fn emit_failure_names_format_and_destination() {
        let err = EmitFailure::new(FormatTag::Java, "/site/org/acme.jar", "unknown type Foo");
        let msg = err.to_string();
        assert!(msg.contains("java"));
        assert!(msg.contains("/site/org/acme.jar"));
        assert!(msg.contains("unknown type Foo"));
    }
}
