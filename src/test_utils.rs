//! Test utilities for pgfixture.
//!
//! Provides a simulated driver whose `open` outcome and server version are
//! chosen by the test, plus an in-memory writer for checking console output.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pgfixture::test_utils::*;
//!
//! let driver = SimulatedDriver::failing_with("28P01", "password authentication failed");
//! let fixture = TestBase::new(driver).with_env(MapEnv::new());
//! assert!(fixture.open_connection(None).unwrap_err().is_skip());
//! ```

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing_subscriber::fmt::MakeWriter;

use crate::core::command::ServerVersion;
use crate::core::connection_string::ConnectionStringBuilder;
use crate::core::driver::{Connection, Driver, DriverError, LogManager, ServerError};

// =============================================================================
// Simulated driver
// =============================================================================

/// What [`SimulatedConnection::open`] does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenBehavior {
    Succeed,
    ServerError { sql_state: String, message: String },
    TransportError(String),
}

/// Log manager that remembers the parameter logging switch.
#[derive(Debug, Default)]
pub struct RecordingLogManager {
    parameter_logging: AtomicBool,
    calls: AtomicUsize,
}

impl RecordingLogManager {
    #[must_use]
    pub fn is_parameter_logging_enabled(&self) -> bool {
        self.parameter_logging.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LogManager for RecordingLogManager {
    fn set_parameter_logging_enabled(&self, enabled: bool) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.parameter_logging.store(enabled, Ordering::SeqCst);
    }
}

/// A driver that never touches the network.
#[derive(Debug)]
pub struct SimulatedDriver {
    version: ServerVersion,
    behavior: OpenBehavior,
    log_manager: RecordingLogManager,
    created: Mutex<Vec<String>>,
    open_attempts: Arc<AtomicUsize>,
}

impl SimulatedDriver {
    /// Connections open successfully against `version`.
    #[must_use]
    pub fn new(version: ServerVersion) -> Self {
        Self {
            version,
            behavior: OpenBehavior::Succeed,
            log_manager: RecordingLogManager::default(),
            created: Mutex::new(Vec::new()),
            open_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Connections fail to open with the given SQLSTATE.
    #[must_use]
    pub fn failing_with(sql_state: &str, message: &str) -> Self {
        Self::new(ServerVersion::new(16, 0, 0)).with_behavior(OpenBehavior::ServerError {
            sql_state: sql_state.to_string(),
            message: message.to_string(),
        })
    }

    #[must_use]
    pub fn with_behavior(mut self, behavior: OpenBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    #[must_use]
    pub const fn recording_log_manager(&self) -> &RecordingLogManager {
        &self.log_manager
    }

    /// Connection strings passed to [`Driver::create`], in order.
    #[must_use]
    pub fn created(&self) -> Vec<String> {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn open_attempts(&self) -> usize {
        self.open_attempts.load(Ordering::SeqCst)
    }
}

impl Driver for SimulatedDriver {
    type Connection = SimulatedConnection;

    fn create(&self, connection_string: &str) -> Result<SimulatedConnection, DriverError> {
        ConnectionStringBuilder::parse(connection_string)
            .map_err(|e| DriverError::InvalidConnectionString(e.to_string()))?;
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(connection_string.to_string());
        Ok(SimulatedConnection {
            connection_string: connection_string.to_string(),
            version: self.version,
            behavior: self.behavior.clone(),
            open_attempts: Arc::clone(&self.open_attempts),
            is_open: false,
        })
    }

    fn log_manager(&self) -> &dyn LogManager {
        &self.log_manager
    }
}

/// Connection produced by [`SimulatedDriver`].
#[derive(Debug)]
pub struct SimulatedConnection {
    connection_string: String,
    version: ServerVersion,
    behavior: OpenBehavior,
    open_attempts: Arc<AtomicUsize>,
    is_open: bool,
}

impl SimulatedConnection {
    #[must_use]
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }
}

impl Connection for SimulatedConnection {
    /// Emits one event at each of trace, debug, info and warn before answering.
    fn open(&mut self) -> Result<(), DriverError> {
        self.open_attempts.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(target: "simulated_driver", "resolving host");
        tracing::debug!(target: "simulated_driver", "sending startup message");
        tracing::info!(target: "simulated_driver", "authenticating");
        tracing::warn!(target: "simulated_driver", "server certificate not verified");

        match &self.behavior {
            OpenBehavior::Succeed => {
                self.is_open = true;
                Ok(())
            }
            OpenBehavior::ServerError { sql_state, message } => {
                Err(ServerError::new(sql_state.clone(), message.clone()).into())
            }
            OpenBehavior::TransportError(message) => Err(DriverError::Transport(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                message.clone(),
            ))),
        }
    }

    fn server_version(&self) -> ServerVersion {
        self.version
    }
}

// =============================================================================
// Console capture
// =============================================================================

/// Cloneable in-memory writer, usable as a console sink.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    #[must_use]
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
