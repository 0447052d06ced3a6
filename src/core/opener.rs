//! Opening connections with provisioning-aware error handling.
//!
//! A missing test database or role is reported as a skip on developer
//! machines and as a failure on build servers, where the fixture is expected
//! to exist. Every other error reaches the caller untouched. One attempt is
//! made per call.

use serde::Serialize;

use super::driver::{Connection, Driver, DriverError, ServerError, sql_state};
use crate::error::{FixtureError, Result};

/// Shown when the test database is missing.
pub const MISSING_DATABASE_MESSAGE: &str =
    "Please create a database npgsql_tests, owned by user npgsql_tests";

/// Shown when authentication for the test role fails.
pub const MISSING_ROLE_MESSAGE: &str = "Please create a user npgsql_tests as follows: create user npgsql_tests with password 'npgsql_tests'";

/// How to treat missing test infrastructure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ProvisioningPolicy {
    /// Skip the test.
    #[default]
    SkipLocally,
    /// Fail the test; used on build servers.
    FailOnBuildServer,
}

impl ProvisioningPolicy {
    /// Pick the policy from a "running on a build server" answer.
    #[must_use]
    pub const fn for_build_server(on_build_server: bool) -> Self {
        if on_build_server {
            Self::FailOnBuildServer
        } else {
            Self::SkipLocally
        }
    }

    /// Pick the policy by asking `is_build_server`.
    pub fn detect(is_build_server: impl FnOnce() -> bool) -> Self {
        Self::for_build_server(is_build_server())
    }

    /// Turn a provisioning problem into the error this policy calls for.
    #[must_use]
    pub fn resolve(self, sql_state: &str, message: &str) -> FixtureError {
        match self {
            Self::SkipLocally => FixtureError::Skipped {
                sql_state: sql_state.to_string(),
                message: message.to_string(),
            },
            Self::FailOnBuildServer => FixtureError::ProvisioningRequired {
                sql_state: sql_state.to_string(),
                message: message.to_string(),
            },
        }
    }
}

/// What to do with a server error raised while opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Test infrastructure is missing; the message tells the operator what to create.
    Provisioning(&'static str),
    /// Not ours to interpret.
    Propagate,
}

/// Map a server error onto its handling.
#[must_use]
pub fn classify(error: &ServerError) -> Classification {
    match error.sql_state.as_str() {
        sql_state::INVALID_CATALOG_NAME => Classification::Provisioning(MISSING_DATABASE_MESSAGE),
        sql_state::INVALID_PASSWORD => Classification::Provisioning(MISSING_ROLE_MESSAGE),
        _ => Classification::Propagate,
    }
}

/// Construct and open a connection.
///
/// # Errors
///
/// - [`FixtureError::Skipped`] or [`FixtureError::ProvisioningRequired`] when
///   the server reports a missing database (`3D000`) or role (`28P01`),
///   depending on `policy`.
/// - [`FixtureError::Driver`] for every other driver failure, unchanged.
pub fn open_connection<D: Driver>(
    driver: &D,
    connection_string: &str,
    policy: ProvisioningPolicy,
) -> Result<D::Connection> {
    let mut conn = driver.create(connection_string)?;
    tracing::debug!("opening test connection");

    match conn.open() {
        Ok(()) => {
            tracing::debug!(server_version = %conn.server_version(), "test connection open");
            Ok(conn)
        }
        Err(DriverError::Server(server)) => match classify(&server) {
            Classification::Provisioning(message) => {
                tracing::warn!(
                    sql_state = %server.sql_state,
                    policy = ?policy,
                    "test infrastructure missing: {}",
                    server.message
                );
                Err(policy.resolve(&server.sql_state, message))
            }
            Classification::Propagate => Err(DriverError::Server(server).into()),
        },
        Err(other) => Err(other.into()),
    }
}
