//! roamer-headless binary
//!
//! Joins a world server without a browser and mirrors it: arrow keys are
//! typed on stdin (`press up`, `release up`), frames are rendered into a
//! recording surface and summarised in the log.
//!
//! ## Configuration (TOML file + `ROAMER_*` env via `config` crate)
//!
//! | Key / env                | Default               | Description                  |
//! |--------------------------|-----------------------|------------------------------|
//! | `--config` / `ROAMER_CONFIG` | none              | Optional TOML file           |
//! | `ROAMER_ENDPOINT`        | `ws://localhost:8080` | Server WebSocket URL         |
//! | `ROAMER_USERNAME`        | `guest`               | Display name                 |
//! | `ROAMER_ASSET_ROOT`      | `assets`              | Directory image URLs map to  |
//!
//! Command-line flags override both.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use roamer::{ClientConfig, HeadlessClient};
use tracing::Instrument;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "roamer-headless", about = "Headless Roamer client", version)]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "ROAMER_CONFIG")]
    config: Option<PathBuf>,

    /// Server WebSocket URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Display name
    #[arg(long)]
    username: Option<String>,

    /// Directory image URLs resolve into
    #[arg(long)]
    asset_root: Option<String>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("roamer=debug".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = ClientConfig::load(args.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(username) = args.username {
        config.username = username;
    }
    if let Some(asset_root) = args.asset_root {
        config.asset_root = asset_root;
    }
    config.validate()?;

    log::info!(
        "Starting roamer-headless (endpoint='{}', username='{}', assets='{}')",
        config.endpoint,
        config.username,
        config.asset_root,
    );

    let span = tracing::info_span!("session", username = %config.username);
    HeadlessClient::new(config).run().instrument(span).await
}
