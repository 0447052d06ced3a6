//! `env` command: report the resolved fixture settings.

use crate::cli::args::{EnvArgs, OutputFormat};
use crate::config::FixtureSettings;
use crate::core::opener::ProvisioningPolicy;
use crate::error::Result;
use crate::util::env::Environment;

/// Execute the env command.
///
/// # Errors
///
/// Fails on an invalid `NPGSQL_TEST_LOGGING` value or an unparseable
/// `NPGSQL_TEST_DB`.
pub fn execute(
    args: &EnvArgs,
    env: &dyn Environment,
    format: OutputFormat,
    pretty: bool,
) -> Result<String> {
    let policy = ProvisioningPolicy::for_build_server(args.build_server);
    let settings = FixtureSettings::from_env(env, policy)?;
    tracing::debug!(?policy, "resolved fixture settings");

    match format {
        OutputFormat::Human => Ok(settings.render_human()),
        OutputFormat::Json if pretty => Ok(serde_json::to_string_pretty(&settings)? + "\n"),
        OutputFormat::Json => Ok(serde_json::to_string(&settings)? + "\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::logging::LOG_LEVEL_ENV;
    use crate::util::env::MapEnv;

    #[test]
    fn json_output_is_machine_readable() {
        let env = MapEnv::new().with(LOG_LEVEL_ENV, "Warning");
        let out = execute(
            &EnvArgs { build_server: true },
            &env,
            OutputFormat::Json,
            false,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["log_level"], "Warning");
        assert_eq!(value["provisioning"], "FailOnBuildServer");
        assert_eq!(value["sources"]["connection_string"], "default");
    }

    #[test]
    fn human_output() {
        let out = execute(
            &EnvArgs { build_server: false },
            &MapEnv::new(),
            OutputFormat::Human,
            false,
        )
        .unwrap();
        assert!(out.contains("provisioning: SkipLocally"));
    }
}
