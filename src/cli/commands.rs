use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `imagecheck` - compliance gate for container registry pushes.
#[derive(Parser, Debug)]
#[command(name = "imagecheck")]
#[command(version)]
#[command(about = "Evaluate pushed container images against compliance checks.", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.imagecheck/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the queue and evaluate every pushed image
    Daemon,

    /// Evaluate an image that is already present locally and print the verdict
    Check {
        /// Image reference or id, as accepted by `docker image inspect`
        image: String,

        /// Mark the verdict as dry-run (nothing is ever deleted by this command)
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        dry_run: bool,
    },

    /// Print how an event file would be routed
    Route {
        /// CloudWatch event envelope or bare `detail` object (JSON)
        event: PathBuf,
    },
}
