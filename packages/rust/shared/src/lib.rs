//! Shared types, error model, and configuration for modelpub.
//!
//! This crate is the foundation depended on by all other modelpub crates.
//! It provides:
//! - [`ModelPubError`], [`RejectionReason`], [`EmitFailure`]: the error model
//! - Domain types ([`FormatTag`], [`SourceModelFile`], [`PublishRecord`], [`SiteIndex`])
//! - Configuration ([`AppConfig`], [`PublishConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, PublishConfig, PublishSettings, SiteConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{EmitFailure, ModelPubError, RejectionReason, Result};
pub use types::{
    ArtifactRef, FormatTag, PublishRecord, SiteIndex, SourceModelFile, short_name_of,
};
