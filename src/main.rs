//! codesift entry point.

use clap::Parser;
use codesift::cli::{Cli, Commands};
use codesift::core::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load()?;

    let default_filter = if config.debug {
        "codesift=debug"
    } else {
        "codesift=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if matches!(&cli.command, Commands::Serve) {
        tracing::info!("starting codesift {}", env!("CARGO_PKG_VERSION"));
    }

    codesift::cli::run(cli, config).await?;
    Ok(())
}
