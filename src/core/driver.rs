//! Seam to the external database driver.
//!
//! The fixture never speaks the wire protocol itself. It constructs and opens
//! connections through these traits and reads back the negotiated server
//! version.

use thiserror::Error;

use super::command::ServerVersion;

/// SQLSTATE codes the fixture gives special treatment.
pub mod sql_state {
    /// `invalid_catalog_name`: the database does not exist.
    pub const INVALID_CATALOG_NAME: &str = "3D000";
    /// `invalid_password`: authentication failed for the role.
    pub const INVALID_PASSWORD: &str = "28P01";
}

/// An error reported by the server, carrying its SQLSTATE.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{sql_state}: {message}")]
pub struct ServerError {
    pub sql_state: String,
    pub message: String,
}

impl ServerError {
    pub fn new(sql_state: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sql_state: sql_state.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by a [`Driver`] or [`Connection`].
#[derive(Debug, Error)]
pub enum DriverError {
    /// The server rejected the request.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Network or socket failure before the server could answer.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The driver refused the connection string.
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),
}

/// Driver-wide logging switches.
pub trait LogManager: Send + Sync {
    /// Enable or disable logging of command parameter values.
    fn set_parameter_logging_enabled(&self, enabled: bool);
}

/// A connection object produced by a [`Driver`].
pub trait Connection {
    /// Perform the network and authentication handshake.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Server`] when the server rejects the session and
    /// [`DriverError::Transport`] on socket failures.
    fn open(&mut self) -> Result<(), DriverError>;

    /// Server version negotiated during [`Connection::open`].
    fn server_version(&self) -> ServerVersion;
}

/// Entry point to the external driver.
pub trait Driver {
    type Connection: Connection;

    /// Build an unopened connection. Must not perform I/O.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidConnectionString`] if the driver cannot
    /// interpret `connection_string`.
    fn create(&self, connection_string: &str) -> Result<Self::Connection, DriverError>;

    /// The driver's global log manager.
    fn log_manager(&self) -> &dyn LogManager;
}
