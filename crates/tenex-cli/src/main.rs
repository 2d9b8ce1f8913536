mod cli;
mod commands;
mod completions;
mod config;
mod error;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use config::CliConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to a file so streamed replies keep the terminal to themselves.
    let _guard = match init_logging(cli.verbose) {
        Ok(guard) => Some(guard),
        Err(e) => {
            if cli.verbose {
                eprintln!("Logging disabled: {e:#}");
            }
            None
        }
    };

    if let Err(err) = run(cli).await {
        error::handle_error(err);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = CliConfig::load();
    let client = config.client_config(cli.base_url.as_deref(), cli.session.as_deref());
    let format = cli.format;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => commands::chat::run(client).await,
        Commands::Send(args) => commands::send::run(client, args, format).await,
        Commands::Whoami => commands::auth::whoami(client, format).await,
        Commands::Status => commands::auth::status(client, format).await,
        Commands::Logout => commands::auth::logout(client, format).await,
        Commands::Completions { shell } => {
            completions::generate_completions(shell);
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = config::log_dir().context("No data directory for log files")?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "tenex.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(guard)
}
