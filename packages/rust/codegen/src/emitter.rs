//! The uniform emitter contract and the registry that drives all backends.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use modelpub_artifacts::FileSink;
use modelpub_model::{Declaration, ModelGraph, RegisteredModel, TypeRef};
use modelpub_shared::{EmitFailure, FormatTag, ModelPubError, Result};

use crate::backends::{
    GoEmitter, JavaEmitter, JsonSchemaEmitter, PlantUmlEmitter, TypeScriptEmitter, XsdEmitter,
};

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Which part of the graph a backend traverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only the file being published.
    File,
    /// Every model in the graph: system model, imports and the file.
    Graph,
}

/// Everything a backend needs for one invocation.
#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    pub graph: &'a ModelGraph,
    /// Bare namespace of the file being published.
    pub namespace: &'a str,
    /// Directory the artifact is written into.
    pub dest_dir: &'a Path,
    /// Source file short name, used to name artifacts.
    pub base_name: &'a str,
}

impl<'a> EmitContext<'a> {
    /// The model being published.
    pub fn model(&self) -> Result<&'a RegisteredModel> {
        self.graph.get(self.namespace).ok_or_else(|| {
            ModelPubError::validation(format!("namespace {} is not in the graph", self.namespace))
        })
    }

    /// Models visible to a backend of the given scope, in namespace order.
    pub fn models(&self, scope: Scope) -> Result<Vec<&'a RegisteredModel>> {
        match scope {
            Scope::File => Ok(vec![self.model()?]),
            Scope::Graph => Ok(self.graph.models().collect()),
        }
    }

    /// Resolve a type reference or fail with a message naming it.
    pub fn resolve(&self, from_namespace: &str, type_name: &str) -> Result<TypeRef<'a>> {
        self.graph.resolve(from_namespace, type_name).ok_or_else(|| {
            ModelPubError::validation(format!(
                "type {type_name} referenced from {from_namespace} is not in the graph"
            ))
        })
    }

    /// Resolve the supertype of `decl`, explicit or implied.
    pub fn super_type(
        &self,
        namespace: &str,
        decl: &Declaration,
    ) -> Result<Option<TypeRef<'a>>> {
        match self.graph.super_type(namespace, decl) {
            None => Ok(None),
            Some(Ok(parent)) => Ok(Some(parent)),
            Some(Err(name)) => Err(ModelPubError::validation(format!(
                "supertype {name} of {namespace}.{} is not in the graph",
                decl.name
            ))),
        }
    }
}

/// The result of one successful backend invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub format: FormatTag,
    pub dest_dir: PathBuf,
    pub base_name: String,
    /// Files now on disk: standalone outputs or the archive container.
    /// Empty when the backend had nothing to emit.
    pub files: Vec<PathBuf>,
    /// Shareable rendering link (diagram backend only).
    pub link: Option<String>,
}

impl GeneratedArtifact {
    pub fn new(format: FormatTag, ctx: &EmitContext<'_>, files: Vec<PathBuf>) -> Self {
        Self {
            format,
            dest_dir: ctx.dest_dir.to_path_buf(),
            base_name: ctx.base_name.to_string(),
            files,
            link: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A code-generation backend for one target format.
pub trait Emitter: Send + Sync {
    fn format(&self) -> FormatTag;

    fn scope(&self) -> Scope;

    /// Where the artifact lands: the standalone file or the container.
    fn destination(&self, ctx: &EmitContext<'_>) -> PathBuf;

    /// The output strategy for this backend.
    fn sink(&self, ctx: &EmitContext<'_>) -> Box<dyn FileSink>;

    /// Traverse the graph and write files into `sink`.
    fn generate(&self, ctx: &EmitContext<'_>, sink: &mut dyn FileSink) -> Result<()>;

    /// Run the backend end to end.
    fn emit(&self, ctx: &EmitContext<'_>) -> std::result::Result<GeneratedArtifact, EmitFailure> {
        let files = run(self, ctx)?;
        Ok(GeneratedArtifact::new(self.format(), ctx, files))
    }
}

/// Generate through a fresh sink and finish it.
///
/// On failure anything already written is removed so the artifact is absent
/// rather than partial.
pub fn run<E: Emitter + ?Sized>(
    emitter: &E,
    ctx: &EmitContext<'_>,
) -> std::result::Result<Vec<PathBuf>, EmitFailure> {
    let destination = emitter.destination(ctx);
    let mut sink = emitter.sink(ctx);

    let outcome = emitter
        .generate(ctx, sink.as_mut())
        .and_then(|()| sink.finish());

    outcome.map_err(|e| {
        discard(sink.as_mut());
        EmitFailure::new(emitter.format(), &destination, e.to_string())
    })
}

fn discard(sink: &mut dyn FileSink) {
    let Ok(paths) = sink.finish() else {
        return;
    };
    for path in paths {
        if std::fs::remove_file(&path).is_ok() {
            debug!(path = %path.display(), "removed partial artifact");
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds the backends in invocation order.
pub struct EmitterRegistry {
    emitters: Vec<Box<dyn Emitter>>,
}

impl EmitterRegistry {
    /// All six built-in backends, in [`FormatTag::ALL`] order.
    pub fn new(diagram_server: impl Into<String>) -> Self {
        Self {
            emitters: vec![
                Box::new(PlantUmlEmitter::new(diagram_server)),
                Box::new(TypeScriptEmitter),
                Box::new(XsdEmitter),
                Box::new(JsonSchemaEmitter),
                Box::new(JavaEmitter),
                Box::new(GoEmitter),
            ],
        }
    }

    pub fn with_emitters(emitters: Vec<Box<dyn Emitter>>) -> Self {
        Self { emitters }
    }

    pub fn emitters(&self) -> impl Iterator<Item = &dyn Emitter> {
        self.emitters.iter().map(|e| e.as_ref())
    }

    /// Invoke every backend. A failing backend never stops the others.
    #[instrument(skip_all, fields(namespace = ctx.namespace, name = ctx.base_name))]
    pub fn emit_all(
        &self,
        ctx: &EmitContext<'_>,
    ) -> Vec<std::result::Result<GeneratedArtifact, EmitFailure>> {
        self.emitters
            .iter()
            .map(|emitter| {
                let result = emitter.emit(ctx);
                match &result {
                    Ok(artifact) => debug!(
                        format = %artifact.format,
                        files = artifact.files.len(),
                        "artifact generated"
                    ),
                    Err(failure) => warn!(
                        format = %failure.format,
                        destination = %failure.destination.display(),
                        error = %failure.message,
                        "artifact generation failed"
                    ),
                }
                result
            })
            .collect()
    }
}
