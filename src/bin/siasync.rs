//! siasync daemon
//!
//! Run with: siasync <folder>

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use siasync::{NodeClient, SyncFolder};

#[derive(Parser, Debug)]
#[command(name = "siasync")]
#[command(about = "Synchronize a folder to a Sia storage node")]
#[command(version)]
struct Cli {
    /// Folder to synchronize
    folder: PathBuf,

    /// Address of the node's API
    #[arg(long, default_value = "localhost:9980")]
    api_addr: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let client = NodeClient::new(&cli.api_addr);
    let folder = SyncFolder::start(&cli.folder, client)
        .await
        .with_context(|| format!("failed to start syncing {}", cli.folder.display()))?;

    tracing::info!("watching for changes to {}", cli.folder.display());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for the termination signal")?;

    tracing::info!("caught quit signal, exiting");
    folder.close().await;

    Ok(())
}
