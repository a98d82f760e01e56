#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use anyhow::Result;
use clap::Parser;
use imagecheck::config::Config;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod cli;

use cli::commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_version = %config.version_tag,
        dry_run = config.policy.dry_run,
        "STARTING"
    );

    cli::dispatch(cli.command, config).await
}
