//! Rollup CLI - group-by aggregation for tabular data.

mod cli;
mod commands;
mod settings;

use std::io;

use clap::Parser;
use cli::{Cli, Commands};
use settings::Settings;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Inspect { file, json } => Settings::resolve(cli.config.as_deref())
            .and_then(|settings| commands::inspect::run(file, json, &settings)),

        Commands::Aggregate(args) => Settings::resolve(cli.config.as_deref())
            .and_then(|settings| commands::aggregate::run(args, &settings)),

        // Works even when the existing settings file is broken
        Commands::InitConfig { output, force } => commands::init_config::run(output, force),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
