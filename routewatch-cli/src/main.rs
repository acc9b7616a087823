//! RouteWatch CLI
//!
//! Thin command-line frontend over the `routewatch` library: a live
//! simulation feed and a one-shot analytics run, both driven by an optional
//! INI configuration file.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use routewatch::app::AppConfig;
use routewatch::logging;

#[derive(Parser)]
#[command(
    name = "routewatch",
    version,
    about = "Shipment fleet simulation and route analytics"
)]
struct Cli {
    /// Path to an INI configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the live simulation and stream position events to stdout
    Run(commands::run::RunArgs),
    /// Generate a day of telemetry, aggregate it and print the records
    Analytics(commands::analytics::AnalyticsArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match logging::init_logging(logging::DEFAULT_LOG_DIR, logging::DEFAULT_LOG_FILE) {
        Ok(guard) => guard,
        Err(error) => {
            eprintln!("Failed to initialize logging: {}", error);
            return ExitCode::FAILURE;
        }
    };

    let config = match cli.config {
        Some(path) => match AppConfig::load_from(&path) {
            Ok(config) => config,
            Err(error) => {
                eprintln!("{}", error);
                return ExitCode::FAILURE;
            }
        },
        None => AppConfig::default(),
    };

    let result = match cli.command {
        Command::Run(args) => commands::run::execute(config, args).await,
        Command::Analytics(args) => commands::analytics::execute(config, args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {}", error);
            ExitCode::FAILURE
        }
    }
}
