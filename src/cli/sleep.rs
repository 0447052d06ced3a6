//! `sleep-sql` command: show the generated sleep command.

use serde::Serialize;

use crate::cli::args::{OutputFormat, SleepSqlArgs};
use crate::core::command::{ServerVersion, sleep_cast_suffix, sleep_command_text};
use crate::error::Result;

#[derive(Debug, Serialize)]
struct SleepSqlReport {
    server_version: ServerVersion,
    seconds: u32,
    text_cast: bool,
    sql: String,
}

/// Execute the sleep-sql command.
///
/// # Errors
///
/// Fails if the server version cannot be parsed.
pub fn execute(args: &SleepSqlArgs, format: OutputFormat, pretty: bool) -> Result<String> {
    let version: ServerVersion = args.server_version.parse()?;
    let report = SleepSqlReport {
        server_version: version,
        seconds: args.seconds,
        text_cast: !sleep_cast_suffix(version).is_empty(),
        sql: sleep_command_text(version, args.seconds),
    };

    match format {
        OutputFormat::Human => Ok(format!("{}\n", report.sql)),
        OutputFormat::Json if pretty => Ok(serde_json::to_string_pretty(&report)? + "\n"),
        OutputFormat::Json => Ok(serde_json::to_string(&report)? + "\n"),
    }
}
