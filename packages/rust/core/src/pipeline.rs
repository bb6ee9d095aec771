//! End-to-end publish pipeline: discover → load → emit → persist → index.
//!
//! Files are processed strictly one after another. No per-file failure
//! aborts the batch: rejected models are skipped, failed formats are simply
//! absent, and a failed index write is reported in the run summary.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, instrument, warn};
use walkdir::WalkDir;

use modelpub_artifacts::{describe, write_atomic};
use modelpub_codegen::{EmitContext, EmitterRegistry};
use modelpub_model::ModelResolver;
use modelpub_shared::{
    ArtifactRef, EmitFailure, ModelPubError, PublishConfig, PublishRecord, RejectionReason,
    Result, SiteIndex, SourceModelFile, short_name_of,
};

use crate::index::{build_index, write_site_index};
use crate::loader::{ModelLoader, declared_name, load_system_model};
use crate::render::{ModelPage, render_model_page};
use crate::version::version_label;

/// Extension of model source files.
pub const MODEL_EXTENSION: &str = "cto";

/// A model file excluded from this run.
#[derive(Debug, Clone)]
pub struct RejectedModel {
    pub path: PathBuf,
    /// Declared namespace, or the file's short name if none could be read.
    pub name: String,
    pub reason: RejectionReason,
}

/// A file that could not be written to disk.
#[derive(Debug, Clone)]
pub struct PersistenceFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of a full publish run.
#[derive(Debug)]
pub struct PublishReport {
    /// Published records in index order.
    pub index: SiteIndex,
    /// Number of model files discovered.
    pub discovered: usize,
    pub rejected: Vec<RejectedModel>,
    pub emit_failures: Vec<EmitFailure>,
    pub persistence_failures: Vec<PersistenceFailure>,
    /// Set when the index page or manifest could not be written.
    pub index_failure: Option<String>,
    pub elapsed: Duration,
}

impl PublishReport {
    pub fn published(&self) -> usize {
        self.index.len()
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before a model file is processed.
    fn file_started(&self, path: &str, current: usize, total: usize);
    /// Called when a model file is rejected.
    fn file_rejected(&self, path: &str, reason: &RejectionReason);
    /// Called when the run completes.
    fn done(&self, report: &PublishReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_started(&self, _path: &str, _current: usize, _total: usize) {}
    fn file_rejected(&self, _path: &str, _reason: &RejectionReason) {}
    fn done(&self, _report: &PublishReport) {}
}

/// What happened to one discovered file.
enum FileOutcome {
    Rejected(RejectedModel),
    Recorded {
        record: PublishRecord,
        emit_failures: Vec<EmitFailure>,
        persistence_failures: Vec<PersistenceFailure>,
    },
}

/// Run the full publish pipeline.
///
/// 1. Read the system base model
/// 2. Discover model files under the input root
/// 3. Per file: load, emit every format, copy the source, render its page
/// 4. Sort the records and write the site index
///
/// Only an unreadable system model or input root is an error.
#[instrument(skip_all, fields(input = %config.input_root.display(), output = %config.output_root.display()))]
pub async fn publish_site(
    config: &PublishConfig,
    resolver: &dyn ModelResolver,
    progress: &dyn ProgressReporter,
) -> Result<PublishReport> {
    let start = Instant::now();
    info!(force = config.force_publish, "starting publish");

    // --- Phase 1: System model ---
    progress.phase("Loading system model");
    let system_model = load_system_model(config.system_model.as_deref()).await?;

    // --- Phase 2: Discovery ---
    progress.phase("Discovering models");
    let files = discover_models(&config.input_root, &config.output_root)?;
    info!(count = files.len(), "model files discovered");

    // --- Phase 3: Per-file publishing ---
    progress.phase("Publishing models");
    let loader = ModelLoader::new(system_model, resolver, config.force_publish);
    let emitters = EmitterRegistry::new(config.diagram_server.clone());

    let mut records = Vec::new();
    let mut rejected = Vec::new();
    let mut emit_failures = Vec::new();
    let mut persistence_failures = Vec::new();

    let total = files.len();
    for (i, path) in files.iter().enumerate() {
        let shown = path.display().to_string();
        progress.file_started(&shown, i + 1, total);

        match publish_file(config, &loader, &emitters, path).await {
            FileOutcome::Rejected(model) => {
                warn!(
                    model = %model.name,
                    path = %shown,
                    error = %model.reason,
                    "model rejected, skipping"
                );
                progress.file_rejected(&shown, &model.reason);
                rejected.push(model);
            }
            FileOutcome::Recorded {
                record,
                emit_failures: failed,
                persistence_failures: unwritten,
            } => {
                records.push(record);
                emit_failures.extend(failed);
                persistence_failures.extend(unwritten);
            }
        }
    }

    // --- Phase 4: Site index ---
    progress.phase("Writing site index");
    let index = build_index(records);
    let index_failure = match write_site_index(
        &config.output_root,
        &config.site_title,
        &config.tool_version,
        &index,
    ) {
        Ok(_) => None,
        Err(e) => {
            error!(error = %e, "site index could not be written");
            Some(e.to_string())
        }
    };

    let report = PublishReport {
        index,
        discovered: total,
        rejected,
        emit_failures,
        persistence_failures,
        index_failure,
        elapsed: start.elapsed(),
    };

    info!(
        published = report.published(),
        rejected = report.rejected.len(),
        emit_failures = report.emit_failures.len(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "publish complete"
    );

    progress.done(&report);
    Ok(report)
}

/// Recursively list model files under `root`, in walk order.
///
/// The walk is sorted by file name so batch order is stable. Anything under
/// `exclude` (the output root, when it lives inside the input) is skipped.
pub fn discover_models(root: &Path, exclude: &Path) -> Result<Vec<PathBuf>> {
    let meta = std::fs::metadata(root).map_err(|e| ModelPubError::io(root, e))?;
    if !meta.is_dir() {
        return Err(ModelPubError::config(format!(
            "input root {} is not a directory",
            root.display()
        )));
    }

    // Spellings of the same directory differ (`./build` vs `build`), so
    // compare resolved paths.
    let excluded = resolved(exclude);
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || !e.file_type().is_dir() || resolved(e.path()) != excluded
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(ModelPubError::config(format!(
                    "cannot read input root {}: {e}",
                    root.display()
                )));
            }
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };

        let is_model = entry.file_type().is_file()
            && entry.path().extension().and_then(|x| x.to_str()) == Some(MODEL_EXTENSION);
        if is_model {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Canonical form of `path`, or its absolute form when it does not exist yet.
fn resolved(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[instrument(skip_all, fields(path = %path.display()))]
async fn publish_file(
    config: &PublishConfig,
    loader: &ModelLoader<'_>,
    emitters: &EmitterRegistry,
    path: &Path,
) -> FileOutcome {
    let rel = path.strip_prefix(&config.input_root).unwrap_or(path);
    let rel_dir = rel.parent().unwrap_or(Path::new(""));

    // --- Read ---
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            return FileOutcome::Rejected(RejectedModel {
                path: path.to_path_buf(),
                name: short_name_of(path),
                reason: ModelPubError::io(path, e).into(),
            });
        }
    };
    let file = SourceModelFile::new(path, text);

    // --- Validate and link ---
    let loaded = match loader.load(&file).await {
        Ok(loaded) => loaded,
        Err(reason) => {
            return FileOutcome::Rejected(RejectedModel {
                path: path.to_path_buf(),
                name: declared_name(&file),
                reason,
            });
        }
    };
    let Some(registered) = loaded.graph.get(&loaded.namespace) else {
        return FileOutcome::Rejected(RejectedModel {
            path: path.to_path_buf(),
            name: loaded.qualified_namespace.clone(),
            reason: RejectionReason::Structure("model missing from its own graph".into()),
        });
    };

    // --- Generate every format ---
    let dest_dir = config.output_root.join(rel_dir);
    let ctx = EmitContext {
        graph: &loaded.graph,
        namespace: &loaded.namespace,
        dest_dir: &dest_dir,
        base_name: &file.short_name,
    };

    let mut emit_failures = Vec::new();
    let mut persistence_failures = Vec::new();
    let mut artifacts = Vec::new();
    let mut diagram_url = String::new();

    for result in emitters.emit_all(&ctx) {
        let artifact = match result {
            Ok(artifact) => artifact,
            Err(failure) => {
                emit_failures.push(failure);
                continue;
            }
        };
        if let Some(link) = artifact.link {
            diagram_url = link;
        }
        for written in &artifact.files {
            match describe(written) {
                Ok(meta) => artifacts.push(ArtifactRef {
                    format: artifact.format,
                    path: site_path(&config.output_root, &meta.path),
                    sha256: meta.sha256,
                    size_bytes: meta.size_bytes,
                }),
                Err(e) => persistence_failures.push(persistence_failure(written, e)),
            }
        }
    }

    // --- Verbatim source copy ---
    let source_name = file.file_name();
    let source_copy = dest_dir.join(&source_name);
    if let Err(e) = copy_source(path, &source_copy).await {
        persistence_failures.push(persistence_failure(&source_copy, e));
    }

    // --- Documentation page ---
    let version = version_label(rel_dir);
    let page = page_link(&config.server_root, rel_dir, &file.short_name);
    let html = render_model_page(&ModelPage {
        model: &registered.file,
        graph: &loaded.graph,
        version: &version,
        diagram_url: &diagram_url,
        artifacts: &artifacts,
        source_file: &source_name,
        index_href: &index_link(&config.server_root),
        tool_version: &config.tool_version,
    });
    let page_path = dest_dir.join(format!("{}.html", file.short_name));
    if let Err(e) = write_atomic(&page_path, html.as_bytes()) {
        persistence_failures.push(persistence_failure(&page_path, e));
    }

    info!(
        namespace = %loaded.qualified_namespace,
        artifacts = artifacts.len(),
        failed_formats = emit_failures.len(),
        "model published"
    );

    FileOutcome::Recorded {
        record: PublishRecord {
            namespace: loaded.qualified_namespace.clone(),
            name: file.short_name.clone(),
            page,
            version,
            diagram_url,
            artifacts,
        },
        emit_failures,
        persistence_failures,
    }
}

fn persistence_failure(path: &Path, err: ModelPubError) -> PersistenceFailure {
    warn!(path = %path.display(), error = %err, "failed to persist file");
    PersistenceFailure {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

async fn copy_source(from: &Path, to: &Path) -> Result<()> {
    if from == to {
        debug!(path = %from.display(), "source already in place");
        return Ok(());
    }
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ModelPubError::io(parent, e))?;
    }
    tokio::fs::copy(from, to)
        .await
        .map_err(|e| ModelPubError::io(to, e))?;
    Ok(())
}

fn segments(path: &Path) -> Vec<String> {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect()
}

/// Link to a model page: `<server_root>/<rel dir>/<name>.html`.
pub fn page_link(server_root: &str, rel_dir: &Path, short_name: &str) -> String {
    let mut parts = segments(rel_dir);
    parts.push(format!("{short_name}.html"));
    format!("{}/{}", server_root.trim_end_matches('/'), parts.join("/"))
}

fn index_link(server_root: &str) -> String {
    format!("{}/index.html", server_root.trim_end_matches('/'))
}

/// `/`-separated path of `path` relative to the site root.
fn site_path(root: &Path, path: &Path) -> String {
    segments(path.strip_prefix(root).unwrap_or(path)).join("/")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::io::Read;
    use std::sync::Mutex;

    use modelpub_model::HttpResolver;
    use modelpub_shared::{AppConfig, FormatTag};

    use super::*;
    use crate::index::read_manifest;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mp-pipeline-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    fn config(tmp: &Path, out: &str) -> PublishConfig {
        let mut config = PublishConfig::from(&AppConfig::default());
        config.input_root = tmp.join("src");
        config.output_root = tmp.join(out);
        config.server_root = "https://models.example.com/".into();
        config.tool_version = "0.1.0".into();
        config
    }

    fn resolver() -> HttpResolver {
        HttpResolver::with_timeout(2).unwrap()
    }

    const VEHICLE: &str = "namespace org.acme.vehicle@1.0.0\n\
        import org.acme.party.Owner from {PARTY_URL}\n\
        asset Vehicle identified by vin {\n o String vin\n --> Owner owner\n}";

    const PARTY: &str = "namespace org.acme.party\nparticipant Owner identified by email { o String email }";

    /// Serve the party model and write a small source tree.
    async fn fixture(tmp: &Path) -> wiremock::MockServer {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/party.cto"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(PARTY))
            .mount(&server)
            .await;

        let src = tmp.join("src");
        let vehicle = VEHICLE.replace("{PARTY_URL}", &format!("{}/party.cto", server.uri()));
        write(&src, "org/acme/v1.0/vehicle.cto", &vehicle);
        write(&src, "org/acme/broken.cto", "namespace org.acme.broken\nconcept {");
        write(&src, "org/acme/orphan.cto", "namespace org.acme.orphan\nimport org.nowhere.Thing\nconcept X { o Thing t }");
        write(&src, "alpha.cto", "namespace Alpha.models\nconcept Point { o Double x o Double y }");
        write(&src, "notes.txt", "not a model");
        server
    }

    #[test]
    fn discovery_is_sorted_and_filtered() {
        let tmp = temp_dir();
        let src = tmp.join("src");
        write(&src, "b/z.cto", "");
        write(&src, "b/a.cto", "");
        write(&src, "a.cto", "");
        write(&src, "readme.md", "");
        write(&src, "build/copied.cto", "");

        let files = discover_models(&src, &src.join("build")).unwrap();
        let rel: Vec<String> = files
            .iter()
            .map(|p| site_path(&src, p))
            .collect();
        assert_eq!(rel, ["a.cto", "b/a.cto", "b/z.cto"]);
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn output_root_is_excluded_however_it_is_spelled() {
        let tmp = temp_dir();
        let src = tmp.join("src");
        write(&src, "a.cto", "");
        write(&src, "build/a.cto", "");
        write(&src, "nested/b.cto", "");

        // The walk yields `src/./build`, never the excluded spelling itself.
        let root = src.join(".");
        let exclude = src.join("nested").join("..").join("build");
        let files = discover_models(&root, &exclude).unwrap();
        let names: Vec<String> = files.iter().map(|p| site_path(&root, p)).collect();
        assert_eq!(names, ["a.cto", "nested/b.cto"]);

        // An output root that does not exist yet excludes nothing.
        let files = discover_models(&src, &tmp.join("elsewhere")).unwrap();
        assert_eq!(files.len(), 3);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_input_root_is_an_error() {
        let tmp = temp_dir();
        assert!(discover_models(&tmp.join("nope"), &tmp.join("out")).is_err());
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn page_links_follow_server_root() {
        assert_eq!(
            page_link("https://m.example.com/", Path::new("org/acme/v1.0"), "vehicle"),
            "https://m.example.com/org/acme/v1.0/vehicle.html"
        );
        assert_eq!(page_link("", Path::new(""), "alpha"), "/alpha.html");
    }

    #[tokio::test]
    async fn publishes_valid_models_and_skips_rejected_ones() {
        let tmp = temp_dir();
        let _server = fixture(&tmp).await;
        let config = config(&tmp, "site");

        let report = publish_site(&config, &resolver(), &SilentProgress)
            .await
            .unwrap();

        assert_eq!(report.discovered, 4);
        assert_eq!(report.published(), 2);
        assert!(report.emit_failures.is_empty(), "{:?}", report.emit_failures);
        assert!(report.index_failure.is_none());

        let rejected: BTreeSet<&str> = report.rejected.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(rejected, BTreeSet::from(["org.acme.broken", "org.acme.orphan"]));
        assert!(report.rejected.iter().any(|r| matches!(r.reason, RejectionReason::Syntax { .. })));
        assert!(report.rejected.iter().any(|r| matches!(r.reason, RejectionReason::Unresolved { .. })));

        // Sorted case-insensitively, not in discovery order.
        assert_eq!(report.index.namespaces(), ["Alpha.models", "org.acme.vehicle@1.0.0"]);

        let vehicle = &report.index.entries[1];
        assert_eq!(vehicle.name, "vehicle");
        assert_eq!(vehicle.version, " (v1.0)");
        assert_eq!(vehicle.page, "https://models.example.com/org/acme/v1.0/vehicle.html");
        assert!(vehicle.diagram_url.starts_with("https://www.plantuml.com/plantuml/svg/"));
        let formats: BTreeSet<FormatTag> = vehicle.artifacts.iter().map(|a| a.format).collect();
        assert_eq!(formats.len(), 6);
        assert_eq!(report.index.entries[0].version, "");

        let out = tmp.join("site/org/acme/v1.0");
        for name in [
            "vehicle.puml",
            "org.acme.vehicle@1.0.0.ts",
            "vehicle.xsd.zip",
            "vehicle.json",
            "vehicle.jar",
            "vehicle.go.zip",
            "vehicle.cto",
            "vehicle.html",
        ] {
            assert!(out.join(name).exists(), "missing {name}");
        }
        assert_eq!(
            std::fs::read_to_string(out.join("vehicle.cto")).unwrap(),
            std::fs::read_to_string(tmp.join("src/org/acme/v1.0/vehicle.cto")).unwrap()
        );

        // Archives carry the whole resolved graph, including the remote model.
        let mut xsd = zip::ZipArchive::new(std::fs::File::open(out.join("vehicle.xsd.zip")).unwrap()).unwrap();
        let entries: BTreeSet<String> = xsd.file_names().map(String::from).collect();
        assert_eq!(
            entries,
            BTreeSet::from([
                "concerto.xsd".to_string(),
                "org.acme.party.xsd".to_string(),
                "org.acme.vehicle.xsd".to_string(),
            ])
        );
        let mut text = String::new();
        xsd.by_name("org.acme.party.xsd").unwrap().read_to_string(&mut text).unwrap();
        assert!(text.contains("name=\"Owner\""));

        // The diagram covers only the file itself.
        let puml = std::fs::read_to_string(out.join("vehicle.puml")).unwrap();
        assert!(!puml.contains("org.acme.party"));

        // Rejected files leave nothing behind.
        let acme = tmp.join("site/org/acme");
        assert!(!acme.join("broken.html").exists());
        assert!(!acme.join("broken.cto").exists());
        assert!(!acme.join("orphan.json").exists());

        let index = std::fs::read_to_string(tmp.join("site/index.html")).unwrap();
        assert!(index.contains("org.acme.vehicle@1.0.0</a> (v1.0)"));
        let manifest = read_manifest(&tmp.join("site")).unwrap();
        assert_eq!(manifest.models.len(), 2);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn force_publish_keeps_models_with_missing_imports() {
        let tmp = temp_dir();
        write(
            &tmp.join("src"),
            "orphan.cto",
            "namespace org.orphan\nimport org.nowhere.Thing\nconcept X { o Thing t }",
        );
        let mut config = config(&tmp, "site");
        config.force_publish = true;

        let report = publish_site(&config, &resolver(), &SilentProgress)
            .await
            .unwrap();

        assert_eq!(report.published(), 1);
        // Only the diagram can be drawn without the imported type.
        let failed: BTreeSet<FormatTag> = report.emit_failures.iter().map(|f| f.format).collect();
        assert_eq!(
            failed,
            BTreeSet::from([
                FormatTag::TypeScript,
                FormatTag::Xsd,
                FormatTag::JsonSchema,
                FormatTag::Java,
                FormatTag::Go,
            ])
        );
        let record = &report.index.entries[0];
        assert_eq!(record.artifacts.len(), 1);
        assert_eq!(record.artifacts[0].format, FormatTag::PlantUml);
        assert!(tmp.join("site/orphan.html").exists());
        assert!(!tmp.join("site/orphan.jar").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn repeated_runs_are_identical() {
        let tmp = temp_dir();
        let _server = fixture(&tmp).await;

        let first = config(&tmp, "one");
        let second = config(&tmp, "two");
        publish_site(&first, &resolver(), &SilentProgress).await.unwrap();
        publish_site(&second, &resolver(), &SilentProgress).await.unwrap();

        let dir = "org/acme/v1.0";
        for name in [
            "vehicle.puml",
            "org.acme.vehicle@1.0.0.ts",
            "vehicle.json",
            "vehicle.html",
            "vehicle.jar",
        ] {
            let a = std::fs::read(tmp.join("one").join(dir).join(name)).unwrap();
            let b = std::fs::read(tmp.join("two").join(dir).join(name)).unwrap();
            assert_eq!(a, b, "{name} differs between runs");
        }

        for name in ["vehicle.xsd.zip", "vehicle.jar", "vehicle.go.zip"] {
            let a = archive_entries(&tmp.join("one").join(dir).join(name));
            let b = archive_entries(&tmp.join("two").join(dir).join(name));
            assert!(!a.is_empty(), "{name} has no entries");
            assert_eq!(a, b, "{name} entries differ between runs");
        }

        let _ = std::fs::remove_dir_all(&tmp);
    }

    /// Entry name to contents for every entry of a zip container.
    fn archive_entries(path: &Path) -> std::collections::BTreeMap<String, Vec<u8>> {
        let mut archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
        let mut entries = std::collections::BTreeMap::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).unwrap();
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes).unwrap();
            entries.insert(entry.name().to_string(), bytes);
        }
        entries
    }

    #[tokio::test]
    async fn unreadable_system_model_aborts() {
        let tmp = temp_dir();
        write(&tmp.join("src"), "a.cto", "namespace a\nconcept X {}");
        let mut config = config(&tmp, "site");
        config.system_model = Some(tmp.join("missing-system.cto"));

        let err = publish_site(&config, &resolver(), &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, ModelPubError::Io { .. }));
        assert!(!tmp.join("site").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn index_failure_is_reported_not_fatal() {
        let tmp = temp_dir();
        write(&tmp.join("src"), "a.cto", "namespace a\nconcept X {}");
        let config = config(&tmp, "site");
        // Block index.html with a directory of the same name.
        std::fs::create_dir_all(tmp.join("site/index.html/blocker")).unwrap();

        let report = publish_site(&config, &resolver(), &SilentProgress)
            .await
            .unwrap();
        assert_eq!(report.published(), 1);
        assert!(report.index_failure.is_some());
        assert!(tmp.join("site/a.html").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    /// Records every callback for assertions.
    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.events.lock().unwrap().push(format!("phase:{name}"));
        }
        fn file_started(&self, _path: &str, current: usize, total: usize) {
            self.events.lock().unwrap().push(format!("file:{current}/{total}"));
        }
        fn file_rejected(&self, _path: &str, _reason: &RejectionReason) {
            self.events.lock().unwrap().push("rejected".into());
        }
        fn done(&self, report: &PublishReport) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done:{}", report.published()));
        }
    }

    #[tokio::test]
    async fn progress_is_reported_per_file() {
        let tmp = temp_dir();
        write(&tmp.join("src"), "a.cto", "namespace a\nconcept X {}");
        write(&tmp.join("src"), "b.cto", "namespace b\nconcept {");
        let config = config(&tmp, "site");
        let progress = RecordingProgress::default();

        publish_site(&config, &resolver(), &progress).await.unwrap();

        let events = progress.events.lock().unwrap();
        assert!(events.contains(&"file:1/2".to_string()));
        assert!(events.contains(&"file:2/2".to_string()));
        assert_eq!(events.iter().filter(|e| *e == "rejected").count(), 1);
        assert_eq!(events.last().unwrap(), "done:1");

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
