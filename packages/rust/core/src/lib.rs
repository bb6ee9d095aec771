//! Publishing orchestration for modelpub.
//!
//! Ties the model graph, the format emitters and the artifact writers into
//! the end-to-end workflows: [`publish_site`] for a whole source tree and
//! [`check_files`] for validating individual files.

pub mod check;
pub mod collate;
pub mod index;
pub mod loader;
pub mod pipeline;
pub mod render;
pub mod version;

pub use check::{CheckOutcome, check_files};
pub use index::{SiteManifest, build_index, read_manifest, write_site_index};
pub use loader::{LoadedModel, ModelLoader, load_system_model};
pub use pipeline::{
    PersistenceFailure, ProgressReporter, PublishReport, RejectedModel, SilentProgress,
    discover_models, publish_site,
};
