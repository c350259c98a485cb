use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use tollrec_cli::commands::{check, reconcile};
use tollrec_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .from_env_lossy()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = io::stdout().lock();
    match command {
        Commands::Reconcile {
            trips,
            crossings,
            output,
            format,
        } => {
            reconcile::run(
                &mut stdout,
                &config,
                reconcile::ReconcileArgs {
                    trips,
                    crossings,
                    output: output.as_deref(),
                    format: *format,
                },
            )?;
        }
        Commands::Check { trips, crossings } => {
            check::run(&mut stdout, &config, trips, crossings)?;
        }
    }

    Ok(())
}
