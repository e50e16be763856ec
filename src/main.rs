use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use postwatch::app::AppContext;
use postwatch::cli::{commands, Cli, Commands, ConfigAction, DaemonAction};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let ctx = Arc::new(AppContext::new(cli.db, cli.config)?);

    match cli.command {
        Commands::Run => {
            commands::run_once(&ctx).await?;
        }
        Commands::Preview => {
            commands::preview(&ctx).await?;
        }
        Commands::Clear => {
            commands::clear(&ctx)?;
        }
        Commands::Notified { limit } => {
            commands::list_notified(&ctx, limit)?;
        }
        Commands::Daemon { action } => match action {
            DaemonAction::Start {
                interval,
                no_initial_tick,
                log,
            } => {
                commands::start_daemon(ctx, interval.as_deref(), no_initial_tick, log).await?;
            }
            DaemonAction::Stop => {
                commands::stop()?;
            }
            DaemonAction::Status => {
                commands::status(&ctx)?;
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::Path => commands::config_path(&ctx),
            ConfigAction::Check => commands::config_check(&ctx)?,
        },
    }

    Ok(())
}
