//! reelgen - AI media generation client.
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;

use reelgen::cli::{self, Cli, Commands};
use reelgen::core::logging;
use reelgen::error::ReelgenError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = cli
        .log_level
        .as_deref()
        .and_then(logging::LogLevel::from_arg)
        .or_else(logging::parse_log_level_from_env)
        .unwrap_or_default();
    let log_format = if cli.json_output {
        logging::LogFormat::Json
    } else {
        logging::parse_log_format_from_env().unwrap_or_default()
    };
    let log_file = logging::parse_log_file_from_env();
    logging::init(log_level, log_format, log_file, cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e} [{}]", "error:".red().bold(), e.code());
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<(), ReelgenError> {
    match cli.command {
        Commands::Generate(args) => cli::generate::run(args).await,
        Commands::Transcript(args) => cli::transcript::run(args).await,
        Commands::Estimate(args) => cli::credits::estimate(&args),
        Commands::Balance(args) => cli::credits::balance(args).await,
        Commands::Gallery(command) => cli::gallery::run(&command),
    }
}
