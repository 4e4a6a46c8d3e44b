//! Vinetos de Sol concierge server
//!
//! Main entry point: loads configuration, builds the agent and serves the
//! chat UI and API until Ctrl-C.

use anyhow::Context;
use clap::Parser;
use concierge::{bind, serve, AppContext};
use concierge_core::config::{AppConfig, CliOverrides};
use concierge_core::logging;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Instrument;

/// Chat concierge for the Vinetos de Sol winery
#[derive(Parser, Debug)]
#[command(name = "concierge")]
#[command(about = "Chat concierge for the Vinetos de Sol winery", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, env = "CONCIERGE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, env = "CONCIERGE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "CONCIERGE_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "CONCIERGE_PORT")]
    port: Option<u16>,

    /// Source document for the retrieval tool
    #[arg(short, long, env = "CONCIERGE_DOCUMENT")]
    document: Option<PathBuf>,

    /// Chat model identifier
    #[arg(short, long, env = "CONCIERGE_MODEL")]
    model: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "CONCIERGE_JSON_LOGS")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // The workspace and config file decide which YAML file is read
    let config = AppConfig::load_with(cli.workspace.clone(), cli.config.clone())?.with_overrides(
        CliOverrides {
            workspace: cli.workspace,
            config_file: cli.config,
            host: cli.host,
            port: cli.port,
            document: cli.document,
            model: cli.model,
            log_level: cli.log_level,
            verbose: cli.verbose,
            no_color: cli.no_color,
            json_logs: cli.json_logs,
        },
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.json_logs)?;

    tracing::info!("Concierge starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.llm.provider);
    tracing::debug!("Model: {}", config.llm.model);

    config.validate().context("Invalid configuration")?;

    let context = AppContext::initialize(&config)
        .instrument(tracing::info_span!("startup"))
        .await
        .context("Failed to initialize the concierge")?;

    let listener = bind(&config.server.host, config.server.port).await?;
    serve(listener, Arc::new(context), shutdown_signal()).await?;

    tracing::info!("Concierge stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::warn!(error = %e, "Could not listen for Ctrl-C; running until killed");
            std::future::pending::<()>().await;
        }
    }
}
