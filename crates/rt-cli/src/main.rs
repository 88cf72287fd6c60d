use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rt_cli::commands::{inspect, summary};
use rt_cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    tracing::debug!(?cli, "parsed arguments");

    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Some(Commands::Summary { file, json }) => {
            summary::run(&mut stdout, file, *json)?;
        }
        Some(Commands::Inspect { file }) => {
            inspect::run(&mut stdout, file)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
