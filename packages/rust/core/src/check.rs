//! Load and validate model files without generating anything.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use modelpub_model::ModelResolver;
use modelpub_shared::{ModelPubError, RejectionReason, SourceModelFile, short_name_of};

use crate::loader::{ModelLoader, declared_name};

/// Result of checking one file.
#[derive(Debug)]
pub struct CheckOutcome {
    pub path: PathBuf,
    /// Declared namespace, or the file's short name if none could be read.
    pub name: String,
    /// The graph size on success, the rejection otherwise.
    pub result: Result<usize, RejectionReason>,
}

impl CheckOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Check each file in order against a fresh graph.
#[instrument(skip_all, fields(files = paths.len(), force))]
pub async fn check_files(
    paths: &[PathBuf],
    system_model: &str,
    resolver: &dyn ModelResolver,
    force: bool,
) -> Vec<CheckOutcome> {
    let loader = ModelLoader::new(system_model, resolver, force);
    let mut outcomes = Vec::with_capacity(paths.len());

    for path in paths {
        let outcome = check_file(&loader, path).await;
        match &outcome.result {
            Ok(models) => info!(model = %outcome.name, models, "model is valid"),
            Err(e) => warn!(model = %outcome.name, error = %e, "model rejected"),
        }
        outcomes.push(outcome);
    }

    outcomes
}

async fn check_file(loader: &ModelLoader<'_>, path: &Path) -> CheckOutcome {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            return CheckOutcome {
                path: path.to_path_buf(),
                name: short_name_of(path),
                result: Err(ModelPubError::io(path, e).into()),
            };
        }
    };

    let file = SourceModelFile::new(path, text);
    match loader.load(&file).await {
        Ok(loaded) => CheckOutcome {
            path: path.to_path_buf(),
            name: loaded.qualified_namespace,
            result: Ok(loaded.graph.len()),
        },
        Err(reason) => CheckOutcome {
            path: path.to_path_buf(),
            name: declared_name(&file),
            result: Err(reason),
        },
    }
}
