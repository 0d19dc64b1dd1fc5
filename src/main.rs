//! shapboard - Main entry point

use clap::Parser;
use shapboard::cli::{cmd_explain, cmd_report, cmd_serve, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shapboard=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.pipeline_config();

    match cli.command {
        Some(Commands::Report) => {
            cmd_report(&config)?;
        }
        Some(Commands::Explain { row }) => {
            cmd_explain(&config, row)?;
        }
        Some(Commands::Serve { host, port }) => {
            cmd_serve(&config, host, port).await?;
        }
        None => {
            cmd_serve(&config, None, None).await?;
        }
    }

    Ok(())
}
