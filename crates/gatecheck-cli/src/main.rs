//! # gatecheck CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//!
//! Exit codes: 0 pass, 1 validation failure, 2 operational error.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gatecheck_cli::inspect::{run_inspect, InspectArgs};
use gatecheck_cli::validate::{run_validate, ValidateArgs};

/// Offline tooling for gatecheck schema bundles.
#[derive(Parser, Debug)]
#[command(name = "gatecheck", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a request snapshot against a bundle.
    Validate(ValidateArgs),

    /// Compile a bundle and list its declared segments.
    Inspect(InspectArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args),
        Commands::Inspect(args) => run_inspect(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
