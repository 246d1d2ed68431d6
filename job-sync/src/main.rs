//! job-sync - Main entry point
//!
//! Back up CI job configurations to a directory, or install them from one.

use anyhow::Result;
use clap::{Parser, Subcommand};
use job_sync::{commands, utils, Config, ConfigTransport, HttpTransport};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// CI server base URL (overrides config)
    #[arg(short, long, value_name = "URL", global = true)]
    server: Option<String>,

    /// Backup directory (overrides config)
    #[arg(long, value_name = "DIR", global = true)]
    store: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List jobs on the CI server
    List,
    /// Back up every job configuration into the backup directory
    Backup,
    /// Create or update jobs on the CI server from the backup directory
    Install,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };
    if let Some(server) = args.server {
        config.server.url = server;
    }
    if let Some(store) = args.store {
        config.store.root = store;
    }
    config.validate()?;

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    let http = HttpTransport::new(&config)?;
    tracing::info!(
        "Starting job-sync v{} against {}",
        env!("CARGO_PKG_VERSION"),
        http.base_url()
    );

    let transport: Arc<dyn ConfigTransport> = Arc::new(http);

    let ok = match args.command {
        Command::List => commands::list(transport, args.json).await?,
        Command::Backup => commands::backup(transport, &config, args.json).await?,
        Command::Install => commands::install(transport, &config, args.json).await?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
