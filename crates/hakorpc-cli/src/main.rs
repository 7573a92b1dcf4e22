//! # hakorpc CLI entry point
//!
//! Parses command-line arguments, installs logging, and dispatches to the
//! subcommand handler. Exit status: 0 when every document is clean, 1 when
//! any diagnostic was reported, 2 when the run could not be set up.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hakorpc_cli::validate::{run_validate, ValidateArgs};
use hakorpc_cli::EXIT_SETUP_ERROR;

/// Validator for hakoniwa PDU RPC topology configurations.
///
/// Checks service documents against their schema, resolves every file
/// they reference, and cross-checks endpoint bindings, client channels,
/// and capacity limits.
#[derive(Parser, Debug)]
#[command(name = "hakorpc", version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging. Repeat for more (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate service documents and everything they reference.
    Validate(ValidateArgs),
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

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "hakorpc starting");

    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_SETUP_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_counts_across_subcommand() {
        let cli = Cli::try_parse_from(["hakorpc", "-vv", "validate", "svc.json", "-v"]).unwrap();
        assert_eq!(cli.verbose, 3);
        let Commands::Validate(args) = cli.command;
        assert_eq!(args.paths, [std::path::PathBuf::from("svc.json")]);
    }

    #[test]
    fn validate_requires_a_path() {
        assert!(Cli::try_parse_from(["hakorpc", "validate"]).is_err());
    }

    #[test]
    fn unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["hakorpc", "lint", "svc.json"]).is_err());
    }
}
