// Stickies - sticky notes kept in plain files
// Entry point and logging setup

use anyhow::Context;
use clap::Parser;
use stickies::commands::{self, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stickies=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    tracing::debug!("Running command: {:?}", cli.command);

    commands::run(cli).context("stickies command failed")?;

    Ok(())
}
