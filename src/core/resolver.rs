//! Per-fixture connection string resolution.

use std::sync::OnceLock;

use super::sink::TestLogSink;
use crate::util::env::Environment;

/// Overrides the connection string for every fixture.
pub const CONNECTION_STRING_ENV: &str = "NPGSQL_TEST_DB";

/// Used unless `NPGSQL_TEST_DB` is set.
pub const DEFAULT_CONNECTION_STRING: &str =
    "Server=localhost;User ID=npgsql_tests;Password=npgsql_tests;Database=npgsql_tests";

/// Connection string and log sink owned by one fixture instance.
///
/// The connection string is read from the environment on first use and then
/// never changes for the life of the instance.
#[derive(Debug, Clone)]
pub struct FixtureConnectionConfig {
    connection_string: OnceLock<String>,
    sink: TestLogSink,
}

impl FixtureConnectionConfig {
    #[must_use]
    pub fn new(sink: TestLogSink) -> Self {
        Self {
            connection_string: OnceLock::new(),
            sink,
        }
    }

    /// Pin the connection string up front; the environment is never consulted.
    #[must_use]
    pub fn with_connection_string(sink: TestLogSink, connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: OnceLock::from(connection_string.into()),
            sink,
        }
    }

    /// Point this config at a different sink, keeping any resolved string.
    #[must_use]
    pub fn with_sink(self, sink: TestLogSink) -> Self {
        Self {
            connection_string: self.connection_string,
            sink,
        }
    }

    /// The effective connection string, resolving it on first call.
    pub fn resolve(&self, env: &dyn Environment) -> &str {
        self.connection_string.get_or_init(|| {
            let resolved = env
                .var(CONNECTION_STRING_ENV)
                .unwrap_or_else(|| DEFAULT_CONNECTION_STRING.to_string());
            tracing::debug!(
                from_env = resolved != DEFAULT_CONNECTION_STRING,
                "resolved test connection string"
            );
            resolved
        })
    }

    /// Whether [`Self::resolve`] has produced a value yet.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.connection_string.get().is_some()
    }

    #[must_use]
    pub const fn sink(&self) -> &TestLogSink {
        &self.sink
    }
}
