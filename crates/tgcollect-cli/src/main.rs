mod collect;
mod db;
mod scheduler;
mod session;

use clap::{Parser, Subcommand};
use tgcollect_core::LogLevel;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tgcollect")]
#[command(about = "Collect recent channel posts into Postgres on a schedule")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the scheduled collector until interrupted (default)
    Run,
    /// Run a single collection cycle and exit
    Once,
    /// Register or refresh the API session with the gateway
    Session,
    /// Database management
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Create the database if needed and initialize the schema
    Init,
    /// Verify the database is reachable
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = tgcollect_core::load_app_config()?;
    init_tracing(config.log_level)?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => collect::run_scheduled(&config).await,
        Commands::Once => collect::run_once(&config).await,
        Commands::Session => session::register(&config).await,
        Commands::Db {
            command: DbCommands::Init,
        } => db::init(&config).await,
        Commands::Db {
            command: DbCommands::Ping,
        } => db::ping(&config).await,
    }
}

/// `RUST_LOG` wins when set; otherwise the configured level applies to every
/// target.
fn init_tracing(level: LogLevel) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level.as_filter()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping collector");
}

#[cfg(test)]
mod tests;
