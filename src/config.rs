//! Resolved fixture settings, for reporting.
//!
//! ## Precedence
//!
//! 1. Explicit override (e.g. a pinned connection string)
//! 2. Environment variables
//! 3. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `NPGSQL_TEST_DB`: full connection string for the test database
//! - `NPGSQL_TEST_LOGGING`: minimum console severity (Trace, Debug,
//!   Information, Warning, Error, Critical, None)

use serde::Serialize;

use crate::core::connection_string::ConnectionStringBuilder;
use crate::core::logging::{self, LOG_LEVEL_ENV, LogLevel};
use crate::core::opener::ProvisioningPolicy;
use crate::core::resolver::{CONNECTION_STRING_ENV, DEFAULT_CONNECTION_STRING};
use crate::error::Result;
use crate::util::env::Environment;

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Set explicitly by the caller.
    Override,
    /// Value from environment variable.
    Env,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Override => write!(f, "override"),
            Self::Env => write!(f, "environment variable"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Tracks the source of each setting.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ConfigSources {
    pub connection_string: ConfigSource,
    pub log_level: ConfigSource,
}

/// Everything a fixture would use, resolved up front.
#[derive(Debug, Clone, Serialize)]
pub struct FixtureSettings {
    /// Connection string with the password masked.
    pub connection_string: String,
    pub host: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
    /// Console threshold; `None` means capture only.
    pub log_level: Option<LogLevel>,
    pub provisioning: ProvisioningPolicy,
    pub sources: ConfigSources,
}

impl FixtureSettings {
    /// Resolve settings from `env`.
    ///
    /// # Errors
    ///
    /// Returns an error if `NPGSQL_TEST_LOGGING` names an unknown severity or
    /// the connection string cannot be parsed.
    pub fn from_env(env: &dyn Environment, provisioning: ProvisioningPolicy) -> Result<Self> {
        Self::resolve(env, None, provisioning)
    }

    /// Resolve settings, preferring `connection_override` over the environment.
    ///
    /// # Errors
    ///
    /// See [`FixtureSettings::from_env`].
    pub fn resolve(
        env: &dyn Environment,
        connection_override: Option<&str>,
        provisioning: ProvisioningPolicy,
    ) -> Result<Self> {
        let mut sources = ConfigSources::default();

        let raw = if let Some(value) = connection_override {
            sources.connection_string = ConfigSource::Override;
            value.to_string()
        } else if let Some(value) = env.var(CONNECTION_STRING_ENV) {
            sources.connection_string = ConfigSource::Env;
            value
        } else {
            DEFAULT_CONNECTION_STRING.to_string()
        };

        let log_level = logging::parse_log_level_from_env(env)?;
        if log_level.is_some() {
            sources.log_level = ConfigSource::Env;
        }

        let parsed = ConnectionStringBuilder::parse(&raw)?;
        Ok(Self {
            connection_string: parsed.masked(),
            host: parsed.host().map(str::to_string),
            database: parsed.database().map(str::to_string),
            username: parsed.username().map(str::to_string),
            log_level,
            provisioning,
            sources,
        })
    }

    /// Human-readable report, one setting per line.
    #[must_use]
    pub fn render_human(&self) -> String {
        let or_unset = |v: &Option<String>| v.clone().unwrap_or_else(|| "(unset)".to_string());
        let lines = [
            format!(
                "{CONNECTION_STRING_ENV}: {} ({})",
                self.connection_string, self.sources.connection_string
            ),
            format!("  host: {}", or_unset(&self.host)),
            format!("  database: {}", or_unset(&self.database)),
            format!("  username: {}", or_unset(&self.username)),
            format!(
                "{LOG_LEVEL_ENV}: {} ({})",
                self.log_level.map_or("capture only", LogLevel::as_str),
                self.sources.log_level
            ),
            format!("provisioning: {:?}", self.provisioning),
        ];
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FixtureError;
    use crate::util::env::MapEnv;

    #[test]
    fn defaults() {
        let settings =
            FixtureSettings::from_env(&MapEnv::new(), ProvisioningPolicy::SkipLocally).unwrap();
        assert_eq!(
            settings.connection_string,
            "Host=localhost;Username=npgsql_tests;Password=***;Database=npgsql_tests"
        );
        assert_eq!(settings.database.as_deref(), Some("npgsql_tests"));
        assert_eq!(settings.log_level, None);
        assert_eq!(settings.sources.connection_string, ConfigSource::Default);
        assert_eq!(settings.sources.log_level, ConfigSource::Default);
    }

    #[test]
    fn env_values_are_tracked() {
        let env = MapEnv::new()
            .with(CONNECTION_STRING_ENV, "Host=ci;Database=d;Password=p")
            .with(LOG_LEVEL_ENV, "debug");
        let settings =
            FixtureSettings::from_env(&env, ProvisioningPolicy::FailOnBuildServer).unwrap();
        assert_eq!(settings.host.as_deref(), Some("ci"));
        assert_eq!(settings.connection_string, "Host=ci;Database=d;Password=***");
        assert_eq!(settings.log_level, Some(LogLevel::Debug));
        assert_eq!(settings.sources.connection_string, ConfigSource::Env);
        assert_eq!(settings.sources.log_level, ConfigSource::Env);
    }

    #[test]
    fn override_wins_over_env() {
        let env = MapEnv::new().with(CONNECTION_STRING_ENV, "Host=env");
        let settings =
            FixtureSettings::resolve(&env, Some("Host=pinned"), ProvisioningPolicy::SkipLocally)
                .unwrap();
        assert_eq!(settings.host.as_deref(), Some("pinned"));
        assert_eq!(settings.sources.connection_string, ConfigSource::Override);
    }

    #[test]
    fn invalid_log_level_fails() {
        let env = MapEnv::new().with(LOG_LEVEL_ENV, "chatty");
        let err = FixtureSettings::from_env(&env, ProvisioningPolicy::SkipLocally).unwrap_err();
        assert!(matches!(err, FixtureError::InvalidLogLevel { .. }));
    }

    #[test]
    fn human_report_mentions_every_setting() {
        let settings =
            FixtureSettings::from_env(&MapEnv::new(), ProvisioningPolicy::SkipLocally).unwrap();
        let report = settings.render_human();
        assert!(report.contains("NPGSQL_TEST_DB: Host=localhost"));
        assert!(report.contains("capture only"));
        assert!(report.contains("SkipLocally"));
        assert!(!report.contains("Password=npgsql_tests"));
    }
}
