//! pgfixture - fixture bootstrap for PostgreSQL driver integration tests
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use pgfixture::cli::{Cli, Commands};
use pgfixture::core::logging::{self, LogFormat};
use pgfixture::util::ProcessEnv;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_format = if cli.json_output {
        LogFormat::Json
    } else {
        LogFormat::Human
    };
    logging::init(cli.log_level, log_format);

    let format = cli.effective_format();
    let result = match &cli.command {
        Commands::Env(args) => pgfixture::cli::env::execute(args, &ProcessEnv, format, cli.pretty),
        Commands::SleepSql(args) => pgfixture::cli::sleep::execute(args, format, cli.pretty),
    };

    match result {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(code = e.error_code(), "{}", e);
            eprintln!("error [{}]: {e}", e.error_code());
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
