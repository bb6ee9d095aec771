//! Application configuration for modelpub.
//!
//! User config lives at `~/.modelpub/modelpub.toml`.
//! CLI flags (and their environment variables) override config file values,
//! which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ModelPubError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "modelpub.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".modelpub";

// ---------------------------------------------------------------------------
// Config structs (matching modelpub.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input/output locations.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Site presentation settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Publishing behavior.
    #[serde(default)]
    pub publish: PublishSettings,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Root of the model source tree.
    #[serde(default = "default_input_dir")]
    pub input_dir: String,

    /// Root of the generated site.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_input_dir() -> String {
    "src".into()
}
fn default_output_dir() -> String {
    "build".into()
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base path or URL prepended to documentation page links.
    #[serde(default)]
    pub server_root: String,

    /// PlantUML server used for hosted diagram links.
    #[serde(default = "default_diagram_server")]
    pub diagram_server: String,

    /// Title of the index page.
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            server_root: String::new(),
            diagram_server: default_diagram_server(),
            title: default_title(),
        }
    }
}

fn default_diagram_server() -> String {
    "https://www.plantuml.com".into()
}
fn default_title() -> String {
    "Model Repository".into()
}

/// `[publish]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishSettings {
    /// Skip remote import resolution and publish whatever validates locally.
    #[serde(default)]
    pub force_publish: bool,

    /// Optional path to a system base model replacing the built-in one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_model: Option<String>,

    /// Timeout for fetching a remote model.
    #[serde(default = "default_resolve_timeout")]
    pub resolve_timeout_secs: u64,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            force_publish: false,
            system_model: None,
            resolve_timeout_secs: default_resolve_timeout(),
        }
    }
}

fn default_resolve_timeout() -> u64 {
    10
}

// ---------------------------------------------------------------------------
// Publish config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime publishing configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Root of the model source tree.
    pub input_root: PathBuf,
    /// Root of the generated site.
    pub output_root: PathBuf,
    /// Base path prepended to documentation page links.
    pub server_root: String,
    /// PlantUML server for diagram links.
    pub diagram_server: String,
    /// Index page title.
    pub site_title: String,
    /// Disable remote import resolution.
    pub force_publish: bool,
    /// Override for the system base model.
    pub system_model: Option<PathBuf>,
    /// Timeout for remote model fetches.
    pub resolve_timeout_secs: u64,
    /// Tool version string, shown in page footers.
    pub tool_version: String,
}

impl From<&AppConfig> for PublishConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            input_root: PathBuf::from(&config.defaults.input_dir),
            output_root: PathBuf::from(&config.defaults.output_dir),
            server_root: config.site.server_root.clone(),
            diagram_server: config.site.diagram_server.clone(),
            site_title: config.site.title.clone(),
            force_publish: config.publish.force_publish,
            system_model: config.publish.system_model.as_ref().map(PathBuf::from),
            resolve_timeout_secs: config.publish.resolve_timeout_secs,
            tool_version: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.modelpub/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ModelPubError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.modelpub/modelpub.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ModelPubError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ModelPubError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ModelPubError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ModelPubError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ModelPubError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
