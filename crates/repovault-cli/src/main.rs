use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod runner;
mod scheduler;

use cli::{Cli, Commands};
use config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repovault=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    tracing::info!("RepoVault v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Backs up Bitbucket repositories into object storage");

    let settings = Settings::from_env()?;

    match cli.command {
        Commands::Run => runner::execute_run(&settings).await,
        Commands::Serve { immediate } => {
            if immediate || settings.autoexecute {
                tracing::info!("immediate execution enabled, starting backup run");
                if let Err(err) = runner::execute_run(&settings).await {
                    tracing::error!("backup run failed: {:#}", err);
                }
            }

            tracing::info!("starting the backup scheduler");
            scheduler::run_forever(&settings).await
        }
        Commands::History { limit, detail } => runner::show_history(&settings, limit, detail).await,
    }
}
