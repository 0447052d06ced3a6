//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};

use crate::core::command::DEFAULT_SLEEP_SECONDS;

/// Inspect the environment pgfixture-based test suites will run in.
#[derive(Parser, Debug)]
#[command(name = "pgfixture")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    // === Global flags ===
    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Log level for pgfixture's own diagnostics (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    pub log_level: tracing_subscriber::filter::LevelFilter,

    /// Emit JSONL logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,
}

impl Cli {
    /// Resolve the effective output format.
    #[must_use]
    pub const fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the connection string, logging threshold and provisioning policy tests would use
    Env(EnvArgs),

    /// Print the sleep command generated for a server version
    SleepSql(SleepSqlArgs),
}

/// Arguments for the `env` command.
#[derive(Parser, Debug)]
pub struct EnvArgs {
    /// Treat this run as a build server (missing infrastructure fails instead of skipping)
    #[arg(long)]
    pub build_server: bool,
}

/// Arguments for the `sleep-sql` command.
#[derive(Parser, Debug)]
pub struct SleepSqlArgs {
    /// Server version, e.g. 9.0.0 or "13.4 (Debian 13.4-1)"
    #[arg(long, value_name = "VERSION")]
    pub server_version: String,

    /// Sleep duration in seconds
    #[arg(long, default_value_t = DEFAULT_SLEEP_SECONDS)]
    pub seconds: u32,
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Human,
    /// JSON
    Json,
}
