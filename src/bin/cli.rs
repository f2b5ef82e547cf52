//! perm-watch CLI
//!
//! Meant to be invoked by an external scheduler such as cron; one invocation
//! is one check.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use perm_watch::{error::Result, logging, models::Config, pipeline};
use tracing::{error, info};

/// perm-watch - PERM processing-times watcher
#[derive(Parser, Debug)]
#[command(
    name = "perm-watch",
    version,
    about = "Emails a list when the DOL PERM processing dates change"
)]
struct Cli {
    /// Path to the TOML configuration (also holds [EmailCredentials])
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Enable verbose console logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Default)]
enum Command {
    /// Fetch the page, compare with the latest snapshot, notify and persist
    #[default]
    Check,

    /// Show the dates in the latest snapshot
    Show {
        /// Print a JSON report instead of log lines
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration and email credentials
    Validate,
}

/// Dispatch the subcommand, returning the process exit code.
async fn run(cli: Cli, config: Config) -> Result<u8> {
    match cli.command.unwrap_or_default() {
        Command::Check => {
            config.validate()?;
            let outcome = pipeline::run_check(&config, &cli.config).await?;
            info!("Run finished: {:?}", outcome);
            Ok(outcome.exit_code())
        }
        Command::Show { json } => {
            pipeline::run_show(&config, json).await?;
            Ok(0)
        }
        Command::Validate => {
            pipeline::run_validate(&config, &cli.config)?;
            Ok(0)
        }
    }
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(e.exit_code());
        }
    };

    let _guard = match logging::init(&config.logging, cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(e.exit_code());
        }
    };

    if !cli.config.exists() {
        info!(
            "Config file {} not found, using defaults.",
            cli.config.display()
        );
    }

    match run(cli, config).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
