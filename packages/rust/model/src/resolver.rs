//! External model resolution.
//!
//! Imports that carry `from <url>` name a namespace published elsewhere.
//! [`update_external_models`] fetches those through a [`ModelResolver`],
//! validates them and merges them into the graph until nothing is missing.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

use modelpub_shared::{ModelPubError, RejectionReason, Result};

use crate::graph::ModelGraph;

/// Maximum number of redirects to follow when fetching a model.
const MAX_REDIRECTS: usize = 3;

/// Default timeout in seconds for fetching a model.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Maximum response size we accept (10 MB).
const MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

/// User-Agent string for resolution requests.
const USER_AGENT: &str = concat!("modelpub/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Resolver trait
// ---------------------------------------------------------------------------

/// Fetches the text of a remote model.
#[async_trait]
pub trait ModelResolver: Send + Sync {
    /// Fetch the model published at `url`.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Resolves models over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpResolver {
    client: Client,
}

impl HttpResolver {
    /// Build a resolver with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ModelPubError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ModelResolver for HttpResolver {
    async fn fetch(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url)
            .map_err(|e| ModelPubError::validation(format!("invalid model URL {url}: {e}")))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| ModelPubError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ModelPubError::Network(format!("{url}: HTTP {status}")));
        }

        if let Some(len) = response.content_length() {
            if len > MAX_RESPONSE_SIZE {
                return Err(ModelPubError::validation(format!(
                    "{url}: response too large ({len} bytes, max {MAX_RESPONSE_SIZE})"
                )));
            }
        }

        response
            .text()
            .await
            .map_err(|e| ModelPubError::Network(format!("{url}: failed to read body: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Graph update
// ---------------------------------------------------------------------------

/// Fetch and merge every externally published namespace the graph imports.
///
/// Loops until no import names a missing namespace. Each URL is fetched at
/// most once. Returns the number of models added.
#[instrument(skip_all, fields(models = graph.len()))]
pub async fn update_external_models(
    graph: &mut ModelGraph,
    resolver: &dyn ModelResolver,
) -> std::result::Result<usize, RejectionReason> {
    let mut fetched: HashSet<String> = HashSet::new();
    let mut added = 0;

    loop {
        let missing = graph.missing_imports();
        let Some(import) = missing.into_iter().next() else {
            break;
        };

        let unresolved = |message: String| RejectionReason::Unresolved {
            namespace: import.namespace.clone(),
            message,
        };

        let Some(url) = import.from.clone() else {
            return Err(unresolved(
                "namespace is not in the graph and the import has no 'from' location".into(),
            ));
        };
        if !fetched.insert(url.clone()) {
            return Err(unresolved(format!("{url} does not declare this namespace")));
        }

        debug!(namespace = %import.namespace, %url, "fetching external model");
        let text = resolver
            .fetch(&url)
            .await
            .map_err(|e| unresolved(e.to_string()))?;

        let namespace = graph
            .add_model(&text, &url, true)
            .map_err(|e| unresolved(format!("{url}: {e}")))?
            .namespace
            .clone();

        if namespace != import.namespace {
            return Err(unresolved(format!("{url} declares namespace {namespace} instead")));
        }

        info!(%namespace, %url, "external model resolved");
        added += 1;
    }

    Ok(added)
}
