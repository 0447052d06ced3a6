//! Error types for pgfixture.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! Errors are categorized into four main categories:
//! - **Configuration**: malformed environment values (log level, connection string)
//! - **Provisioning**: the test database or role is missing on the server
//! - **Driver**: any other server-reported or transport failure, passed through untouched
//! - **Internal**: I/O and serialization failures
//!
//! Each error has a stable error code (e.g., `PGF-C001`) for programmatic handling.

use thiserror::Error;

use crate::core::driver::DriverError;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed configuration (environment variables, connection strings).
    Configuration,
    /// Missing server-side test infrastructure (database, role).
    Provisioning,
    /// Errors reported by the driver that are not interpreted here.
    Driver,
    /// Internal errors (I/O, serialization).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Configuration => "Configuration error",
            Self::Provisioning => "Provisioning error",
            Self::Driver => "Driver error",
            Self::Internal => "Internal error",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes used by the `pgfixture` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Invalid configuration value
    ConfigError = 2,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

/// Main error type for fixture operations.
#[derive(Error, Debug)]
pub enum FixtureError {
    // ==========================================================================
    // Configuration errors (Category: Configuration)
    // ==========================================================================
    /// `NPGSQL_TEST_LOGGING` holds something other than a known severity.
    #[error("Invalid loglevel in {var}: {value}")]
    InvalidLogLevel { var: &'static str, value: String },

    /// A connection string segment could not be parsed.
    #[error("invalid connection string segment '{segment}': {reason}")]
    InvalidConnectionString { segment: String, reason: String },

    /// A server version string could not be parsed.
    #[error("invalid server version '{0}'")]
    InvalidServerVersion(String),

    // ==========================================================================
    // Provisioning errors (Category: Provisioning)
    // ==========================================================================
    /// The test should be skipped: local infrastructure is not set up.
    #[error("test skipped: {message}")]
    Skipped { sql_state: String, message: String },

    /// Infrastructure is missing on a build server, where it must exist.
    #[error("{message} (SQLSTATE {sql_state})")]
    ProvisioningRequired { sql_state: String, message: String },

    // ==========================================================================
    // Driver errors (Category: Driver)
    // ==========================================================================
    /// Unclassified driver failure, passed through unchanged.
    #[error(transparent)]
    Driver(#[from] DriverError),

    // ==========================================================================
    // I/O errors (Category: Internal)
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FixtureError {
    /// Map error to a process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self.category() {
            ErrorCategory::Configuration => ExitCode::ConfigError,
            ErrorCategory::Provisioning | ErrorCategory::Driver | ErrorCategory::Internal => {
                ExitCode::GeneralError
            }
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidLogLevel { .. }
            | Self::InvalidConnectionString { .. }
            | Self::InvalidServerVersion(_) => ErrorCategory::Configuration,

            Self::Skipped { .. } | Self::ProvisioningRequired { .. } => {
                ErrorCategory::Provisioning
            }

            Self::Driver(_) => ErrorCategory::Driver,

            Self::Io(_) | Self::Json(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `PGF-{category}{number}` where category is:
    /// - C: Configuration
    /// - P: Provisioning
    /// - D: Driver
    /// - X: Internal
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidLogLevel { .. } => "PGF-C001",
            Self::InvalidConnectionString { .. } => "PGF-C002",
            Self::InvalidServerVersion(_) => "PGF-C003",

            Self::Skipped { .. } => "PGF-P001",
            Self::ProvisioningRequired { .. } => "PGF-P002",

            Self::Driver(_) => "PGF-D001",

            Self::Io(_) => "PGF-X001",
            Self::Json(_) => "PGF-X002",
        }
    }

    /// Whether this error asks the test runner to skip rather than fail.
    #[must_use]
    pub const fn is_skip(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// The SQLSTATE carried by this error, if the server reported one.
    #[must_use]
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Skipped { sql_state, .. } | Self::ProvisioningRequired { sql_state, .. } => {
                Some(sql_state)
            }
            Self::Driver(DriverError::Server(server)) => Some(server.sql_state.as_str()),
            _ => None,
        }
    }
}

/// Result type alias using [`FixtureError`].
pub type Result<T> = std::result::Result<T, FixtureError>;
