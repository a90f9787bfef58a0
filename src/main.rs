//! `bastionctl` entry point

use anyhow::{bail, Result};
use clap::Parser;
use tracing::debug;
use wallix_bastion_provider::cli::{self, Cli};

const DEFAULT_LOG_FILTER: &str = "bastionctl=info,wallix_bastion_provider=info";
const VERBOSE_LOG_FILTER: &str = "bastionctl=debug,wallix_bastion_provider=debug";

#[tokio::main]
async fn main() -> Result<()> {
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        bail!("Failed to install the rustls crypto provider");
    }

    let cli = Cli::parse();

    let fallback = if cli.verbose { VERBOSE_LOG_FILTER } else { DEFAULT_LOG_FILTER };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    debug!(command = ?cli.command, "starting");
    cli::run(cli).await
}
