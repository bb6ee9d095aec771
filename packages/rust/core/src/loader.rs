//! Model loading: turn one source file into a validated, linked graph.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use modelpub_model::{ModelGraph, ModelResolver, SYSTEM_MODEL, update_external_models};
use modelpub_shared::{ModelPubError, RejectionReason, Result, SourceModelFile};

/// A model that passed loading and is ready for generation.
#[derive(Debug)]
pub struct LoadedModel {
    /// Graph holding the system model, the file and its dependencies.
    pub graph: ModelGraph,
    /// Bare namespace (graph key).
    pub namespace: String,
    /// Namespace including any `@version` suffix.
    pub qualified_namespace: String,
    /// File short name.
    pub short_name: String,
}

/// Builds a fresh graph per file.
pub struct ModelLoader<'a> {
    system_model: String,
    resolver: &'a dyn ModelResolver,
    force_publish: bool,
}

impl<'a> ModelLoader<'a> {
    pub fn new(
        system_model: impl Into<String>,
        resolver: &'a dyn ModelResolver,
        force_publish: bool,
    ) -> Self {
        Self {
            system_model: system_model.into(),
            resolver,
            force_publish,
        }
    }

    /// Validate and link one file.
    ///
    /// Unless force publish is set, external imports are fetched and the
    /// graph must link completely. Under force publish only inheritance
    /// cycles are checked and unresolved references are left for the
    /// emitters to report.
    #[instrument(skip_all, fields(file = %file.path.display()))]
    pub async fn load(
        &self,
        file: &SourceModelFile,
    ) -> std::result::Result<LoadedModel, RejectionReason> {
        let mut graph = ModelGraph::new();
        graph.add_system_model(&self.system_model)?;

        let model = graph.add_model(&file.text, &file.file_name(), true)?;
        let namespace = model.namespace.clone();
        let qualified_namespace = model.qualified_namespace();

        if self.force_publish {
            debug!("force publish: skipping external resolution");
            graph.check_inheritance()?;
        } else {
            let added = update_external_models(&mut graph, self.resolver).await?;
            debug!(added, "external models merged");
            graph.link()?;
        }

        Ok(LoadedModel {
            graph,
            namespace,
            qualified_namespace,
            short_name: file.short_name.clone(),
        })
    }
}

/// Read the system base model: the override file if configured, otherwise
/// the built-in one. Any failure here aborts the run.
pub async fn load_system_model(path: Option<&Path>) -> Result<String> {
    let text = match path {
        Some(p) => tokio::fs::read_to_string(p)
            .await
            .map_err(|e| ModelPubError::io(p, e))?,
        None => SYSTEM_MODEL.to_string(),
    };

    ModelGraph::new()
        .add_system_model(&text)
        .map_err(|e| ModelPubError::config(format!("system model is invalid: {e}")))?;
    Ok(text)
}

/// The name a model declares for itself, even when it does not parse.
/// Falls back to the file's short name.
pub fn declared_name(file: &SourceModelFile) -> String {
    static NAMESPACE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^\s*namespace\s+([A-Za-z_][\w.]*(?:@[\w.\-]+)?)").expect("valid regex")
    });

    NAMESPACE_RE
        .captures(&file.text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| file.short_name.clone())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use modelpub_model::HttpResolver;

    use super::*;

    /// Resolver that serves nothing; any fetch is a network failure.
    fn offline() -> HttpResolver {
        HttpResolver::with_timeout(1).unwrap()
    }

    fn source(name: &str, text: &str) -> SourceModelFile {
        SourceModelFile::new(format!("models/{name}.cto"), text)
    }

    #[tokio::test]
    async fn loads_self_contained_model() {
        let resolver = offline();
        let loader = ModelLoader::new(SYSTEM_MODEL, &resolver, false);
        let loaded = loader
            .load(&source(
                "car",
                "namespace org.acme.car@2.0.0\nasset Car identified by vin { o String vin }",
            ))
            .await
            .unwrap();

        assert_eq!(loaded.namespace, "org.acme.car");
        assert_eq!(loaded.qualified_namespace, "org.acme.car@2.0.0");
        assert_eq!(loaded.short_name, "car");
        assert!(loaded.graph.system_namespace().is_some());
        assert_eq!(loaded.graph.len(), 2);
    }

    #[tokio::test]
    async fn syntax_errors_are_rejected() {
        let resolver = offline();
        let loader = ModelLoader::new(SYSTEM_MODEL, &resolver, false);
        let err = loader
            .load(&source("bad", "namespace a\nconcept {"))
            .await
            .unwrap_err();
        assert!(matches!(err, RejectionReason::Syntax { line: 2, .. }));
    }

    #[tokio::test]
    async fn structural_errors_are_rejected() {
        let resolver = offline();
        let loader = ModelLoader::new(SYSTEM_MODEL, &resolver, false);
        let err = loader
            .load(&source("dup", "namespace a\nconcept X {}\nconcept X {}"))
            .await
            .unwrap_err();
        assert!(matches!(err, RejectionReason::Structure(ref m) if m.contains("duplicate")));
    }

    #[tokio::test]
    async fn unresolvable_import_is_rejected_unless_forced() {
        let resolver = offline();
        let text = "namespace a\nimport b.Thing\nconcept X { o Thing t }";

        let strict = ModelLoader::new(SYSTEM_MODEL, &resolver, false);
        let err = strict.load(&source("a", text)).await.unwrap_err();
        assert!(matches!(err, RejectionReason::Unresolved { ref namespace, .. } if namespace == "b"));

        let forced = ModelLoader::new(SYSTEM_MODEL, &resolver, true);
        let loaded = forced.load(&source("a", text)).await.unwrap();
        assert!(!loaded.graph.contains("b"));
    }

    #[tokio::test]
    async fn remote_imports_are_merged() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/party.cto"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string("namespace org.party\nparticipant Owner identified {}"),
            )
            .mount(&server)
            .await;

        let resolver = offline();
        let loader = ModelLoader::new(SYSTEM_MODEL, &resolver, false);
        let text = format!(
            "namespace org.car\nimport org.party.Owner from {}/party.cto\nasset Car identified {{ --> Owner owner }}",
            server.uri()
        );
        let loaded = loader.load(&source("car", &text)).await.unwrap();
        assert!(loaded.graph.contains("org.party"));
    }

    #[tokio::test]
    async fn graphs_are_never_shared_between_files() {
        let resolver = offline();
        let loader = ModelLoader::new(SYSTEM_MODEL, &resolver, false);
        let text = "namespace same\nconcept X {}";

        // The same namespace loads twice: no collision with the first graph.
        let first = loader.load(&source("one", text)).await.unwrap();
        let second = loader.load(&source("two", text)).await.unwrap();
        assert_eq!(first.graph.len(), second.graph.len());
    }

    #[tokio::test]
    async fn system_model_override() {
        let dir = std::env::temp_dir().join(format!("mp-loader-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();

        let good = dir.join("system.cto");
        std::fs::write(&good, "namespace base@1.0.0\nabstract concept Concept {}").unwrap();
        assert!(load_system_model(Some(&good)).await.unwrap().contains("base@1.0.0"));

        let bad = dir.join("broken.cto");
        std::fs::write(&bad, "not a model").unwrap();
        assert!(matches!(
            load_system_model(Some(&bad)).await.unwrap_err(),
            ModelPubError::Config { .. }
        ));

        assert!(matches!(
            load_system_model(Some(&dir.join("missing.cto"))).await.unwrap_err(),
            ModelPubError::Io { .. }
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn declared_name_survives_broken_models() {
        let names: HashMap<&str, &str> = [
            ("namespace org.acme@1.0.0\nconcept {", "org.acme@1.0.0"),
            ("// header\n  namespace org.x\n", "org.x"),
            ("garbage", "fallback"),
        ]
        .into_iter()
        .collect();
        for (text, expected) in names {
            assert_eq!(declared_name(&source("fallback", text)), expected);
        }
    }
}
