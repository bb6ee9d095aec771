//! Site index: ordering published records and writing the site root files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use modelpub_artifacts::write_atomic;
use modelpub_shared::{ModelPubError, PublishRecord, Result, SiteIndex};

use crate::collate;
use crate::render::render_index;

/// Current manifest schema version.
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// Machine-readable listing of everything published, written to
/// `manifest.json` at the site root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteManifest {
    pub schema_version: u32,
    pub tool_version: String,
    pub models: Vec<PublishRecord>,
}

/// Order records by namespace for display.
///
/// The sort is stable, so records with equal namespaces keep discovery order.
pub fn build_index(mut records: Vec<PublishRecord>) -> SiteIndex {
    records.sort_by(|a, b| collate::compare(&a.namespace, &b.namespace));
    SiteIndex { entries: records }
}

/// Write `index.html` and `manifest.json` into the site root.
#[instrument(skip_all, fields(root = %root.display(), entries = index.len()))]
pub fn write_site_index(
    root: &Path,
    title: &str,
    tool_version: &str,
    index: &SiteIndex,
) -> Result<Vec<PathBuf>> {
    let index_path = root.join("index.html");
    write_atomic(&index_path, render_index(title, index, tool_version).as_bytes())
        .map_err(|e| ModelPubError::Index(format!("failed to write index page: {e}")))?;

    let manifest = SiteManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        tool_version: tool_version.to_string(),
        models: index.entries.clone(),
    };
    let json = serde_json::to_string_pretty(&manifest)
        .map_err(|e| ModelPubError::Index(format!("failed to serialize manifest: {e}")))?;
    let manifest_path = root.join("manifest.json");
    write_atomic(&manifest_path, json.as_bytes())
        .map_err(|e| ModelPubError::Index(format!("failed to write manifest: {e}")))?;

    info!(entries = index.len(), "site index written");
    Ok(vec![index_path, manifest_path])
}

/// Read a previously written manifest back.
pub fn read_manifest(root: &Path) -> Result<SiteManifest> {
    let path = root.join("manifest.json");
    let content = std::fs::read_to_string(&path).map_err(|e| ModelPubError::io(&path, e))?;
    let manifest: SiteManifest = serde_json::from_str(&content)
        .map_err(|e| ModelPubError::validation(format!("invalid manifest.json: {e}")))?;

    if manifest.schema_version != MANIFEST_SCHEMA_VERSION {
        return Err(ModelPubError::validation(format!(
            "unsupported schema_version: {} (expected {MANIFEST_SCHEMA_VERSION})",
            manifest.schema_version
        )));
    }
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(namespace: &str, name: &str) -> PublishRecord {
        PublishRecord {
            namespace: namespace.into(),
            name: name.into(),
            page: format!("/{name}.html"),
            version: String::new(),
            diagram_url: String::new(),
            artifacts: Vec::new(),
        }
    }

    #[test]
    fn index_is_sorted_independent_of_discovery_order() {
        let index = build_index(vec![
            record("org.zeta", "z"),
            record("Org.beta", "b"),
            record("org.alpha", "a"),
        ]);
        assert_eq!(index.namespaces(), ["org.alpha", "Org.beta", "org.zeta"]);
    }

    #[test]
    fn writes_index_and_manifest() {
        let root = std::env::temp_dir().join(format!("mp-index-test-{}", uuid::Uuid::now_v7()));
        let index = build_index(vec![record("b", "b"), record("a", "a")]);

        let written = write_site_index(&root, "Models", "0.1.0", &index).unwrap();
        assert_eq!(written, vec![root.join("index.html"), root.join("manifest.json")]);

        let html = std::fs::read_to_string(root.join("index.html")).unwrap();
        assert!(html.find("/a.html").unwrap() < html.find("/b.html").unwrap());

        let manifest = read_manifest(&root).unwrap();
        assert_eq!(manifest.tool_version, "0.1.0");
        let names: Vec<&str> = manifest.models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn unwritable_root_is_an_index_error() {
        let root = std::env::temp_dir().join(format!("mp-index-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&root).unwrap();
        // A regular file where the site root should be.
        let blocker = root.join("site");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = write_site_index(&blocker, "Models", "", &SiteIndex::default()).unwrap_err();
        assert!(matches!(err, ModelPubError::Index(_)));
        let _ = std::fs::remove_dir_all(&root);
    }
}
