//! Core domain types shared across the publishing pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FormatTag
// ---------------------------------------------------------------------------

/// The target formats every model is published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    /// PlantUML class diagram plus a hosted rendering link.
    PlantUml,
    /// TypeScript interface stubs.
    TypeScript,
    /// XML Schema, one document per namespace, archived.
    Xsd,
    /// A single JSON Schema document.
    JsonSchema,
    /// Java sources, archived as a jar.
    Java,
    /// Go sources, archived.
    Go,
}

impl FormatTag {
    /// Every format, in the order backends are invoked.
    pub const ALL: [FormatTag; 6] = [
        FormatTag::PlantUml,
        FormatTag::TypeScript,
        FormatTag::Xsd,
        FormatTag::JsonSchema,
        FormatTag::Java,
        FormatTag::Go,
    ];

    /// Short stable name used in logs and the site manifest.
    pub fn name(self) -> &'static str {
        match self {
            Self::PlantUml => "plantuml",
            Self::TypeScript => "typescript",
            Self::Xsd => "xsd",
            Self::JsonSchema => "jsonschema",
            Self::Java => "java",
            Self::Go => "go",
        }
    }
}

impl std::fmt::Display for FormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// SourceModelFile
// ---------------------------------------------------------------------------

/// One input model file, immutable once read.
#[derive(Debug, Clone)]
pub struct SourceModelFile {
    /// Location on disk.
    pub path: PathBuf,
    /// Raw model text.
    pub text: String,
    /// File name without extension (e.g. `vehicle` for `vehicle.cto`).
    pub short_name: String,
}

impl SourceModelFile {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let path = path.into();
        let short_name = short_name_of(&path);
        Self {
            path,
            text: text.into(),
            short_name,
        }
    }

    /// File name including extension, used as the model's registration name.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.short_name.clone())
    }
}

/// Derive the short name (file stem) of a model path.
pub fn short_name_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// PublishRecord / SiteIndex
// ---------------------------------------------------------------------------

/// One artifact written for a published model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Which backend produced it.
    pub format: FormatTag,
    /// Path relative to the site root, `/`-separated.
    pub path: String,
    /// SHA-256 of the file contents.
    pub sha256: String,
    /// File size in bytes.
    pub size_bytes: u64,
}

/// Durable summary of one successfully published model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRecord {
    /// The model's namespace (including any `@version` suffix).
    pub namespace: String,
    /// Short name of the source file.
    pub name: String,
    /// Link to the model's documentation page.
    pub page: String,
    /// Version label such as `" (v2.1)"`; empty when none was extracted.
    #[serde(default)]
    pub version: String,
    /// Hosted diagram rendering link; empty when the diagram failed.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub diagram_url: String,
    /// Artifacts written for this model.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<ArtifactRef>,
}

/// Published records in index order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteIndex {
    pub entries: Vec<PublishRecord>,
}

impl SiteIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Namespaces in index order.
    pub fn namespaces(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.namespace.as_str()).collect()
    }
}
