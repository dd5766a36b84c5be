use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pomo_cli::commands::{history, pause, start, status, summary};
use pomo_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref())
        .context("failed to load configuration")?
        .with_overrides(cli.pomo, cli.short, cli.long);
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = io::stdout().lock();
    match &cli.command {
        Some(Commands::Start) => start::run(&mut stdout, &config)?,
        Some(Commands::Pause) => pause::run(&mut stdout, &config)?,
        Some(Commands::Status) => status::run(&mut stdout, &config)?,
        Some(Commands::History { limit, json }) => {
            history::run(&mut stdout, &config, *limit, *json)?;
        }
        Some(Commands::Summary) => summary::run(&mut stdout, &config)?,
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
