//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use modelpub_core::{
    ProgressReporter, PublishReport, check_files, load_system_model, publish_site,
};
use modelpub_model::HttpResolver;
use modelpub_shared::{
    AppConfig, PublishConfig, RejectionReason, init_config, load_config, load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// modelpub: publish data models as documentation, code and schemas.
#[derive(Parser)]
#[command(
    name = "modelpub",
    version,
    about = "Publish a tree of data models as a browsable site with generated artifacts.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.modelpub/modelpub.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Publish every model under the input directory.
    Publish {
        /// Root of the model source tree.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Root of the generated site.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Skip remote import resolution and publish what validates locally.
        #[arg(long, env = "FORCE_PUBLISH")]
        force: bool,

        /// Base path or URL prepended to page links.
        #[arg(long, env = "SERVER_ROOT")]
        server_root: Option<String>,
    },

    /// Validate model files without generating anything.
    Check {
        /// Model files to check.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Skip remote import resolution.
        #[arg(long, env = "FORCE_PUBLISH")]
        force: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "modelpub=info",
        1 => "modelpub=debug",
        _ => "modelpub=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::Publish {
            input,
            out,
            force,
            server_root,
        } => cmd_publish(&config, input, out, force, server_root).await,
        Command::Check { files, force } => cmd_check(&config, &files, force).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_publish(
    config: &AppConfig,
    input: Option<PathBuf>,
    out: Option<PathBuf>,
    force: bool,
    server_root: Option<String>,
) -> Result<()> {
    let mut publish = PublishConfig::from(config);
    if let Some(input) = input {
        publish.input_root = input;
    }
    if let Some(out) = out {
        publish.output_root = out;
    }
    if let Some(root) = server_root {
        publish.server_root = root;
    }
    publish.force_publish |= force;
    publish.tool_version = env!("CARGO_PKG_VERSION").to_string();

    info!(
        input = %publish.input_root.display(),
        output = %publish.output_root.display(),
        force = publish.force_publish,
        "publishing models"
    );

    let resolver = HttpResolver::with_timeout(publish.resolve_timeout_secs)?;
    let reporter = CliProgress::new();
    let report = publish_site(&publish, &resolver, &reporter).await?;

    print_summary(&report, &publish);
    Ok(())
}

fn print_summary(report: &PublishReport, config: &PublishConfig) {
    println!();
    println!("  Site published.");
    println!("  Models:    {}", report.discovered);
    println!("  Published: {}", report.published());
    println!("  Rejected:  {}", report.rejected.len());
    for rejected in &report.rejected {
        println!("    - {}: {}", rejected.name, rejected.reason);
    }
    if !report.emit_failures.is_empty() {
        println!("  Failed artifacts: {}", report.emit_failures.len());
        for failure in &report.emit_failures {
            println!("    - {failure}");
        }
    }
    if !report.persistence_failures.is_empty() {
        println!("  Unwritten files: {}", report.persistence_failures.len());
        for failure in &report.persistence_failures {
            println!("    - {}: {}", failure.path.display(), failure.message);
        }
    }
    match &report.index_failure {
        Some(e) => println!("  Index:     FAILED ({e})"),
        None => println!(
            "  Index:     {}",
            config.output_root.join("index.html").display()
        ),
    }
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

async fn cmd_check(config: &AppConfig, files: &[PathBuf], force: bool) -> Result<()> {
    let settings = &config.publish;
    let override_path = settings.system_model.as_ref().map(PathBuf::from);
    let system_model = load_system_model(override_path.as_deref()).await?;
    let resolver = HttpResolver::with_timeout(settings.resolve_timeout_secs)?;

    let outcomes = check_files(
        files,
        &system_model,
        &resolver,
        force || settings.force_publish,
    )
    .await;

    let mut rejected = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(_) => println!("  ok      {} ({})", outcome.name, outcome.path.display()),
            Err(reason) => {
                rejected += 1;
                println!("  FAILED  {} ({}): {reason}", outcome.name, outcome.path.display());
            }
        }
    }

    if rejected > 0 {
        return Err(eyre!("{rejected} of {} model files rejected", outcomes.len()));
    }
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid progress template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_started(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Publishing [{current}/{total}] {path}"));
    }

    fn file_rejected(&self, path: &str, reason: &RejectionReason) {
        self.spinner.println(format!("  skipped {path}: {reason}"));
    }

    fn done(&self, _report: &PublishReport) {
        self.spinner.finish_and_clear();
    }
}
