//! Helpers for building test commands.
//!
//! Servers older than 9.1 cannot send the `void` result of `pg_sleep` in binary
//! format, so the sleep command casts it to text on those versions.

use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use serde::Serialize;

use super::driver::Connection;
use crate::error::{FixtureError, Result};

/// Default duration for [`build_sleep_command`], long enough to outlive any test.
pub const DEFAULT_SLEEP_SECONDS: u32 = 1000;

/// First server version that can return `void` in binary.
pub const BINARY_VOID_MIN_VERSION: ServerVersion = ServerVersion::new(9, 1, 0);

/// A `major.minor.patch` server version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for ServerVersion {
    type Err = FixtureError;

    /// Parse `9.0.0`, `9.6`, `10` or a banner such as `13.4 (Debian 13.4-1)`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || FixtureError::InvalidServerVersion(s.to_string());
        let token = s.split_whitespace().next().ok_or_else(invalid)?;

        let mut parts = [0u32; 3];
        for (slot, component) in parts.iter_mut().zip(token.split('.')) {
            let digits: String = component.chars().take_while(char::is_ascii_digit).collect();
            if digits.is_empty() {
                break;
            }
            *slot = digits.parse().map_err(|_| invalid())?;
        }

        if !token.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(invalid());
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Suffix appended to `pg_sleep(..)` for the given server.
#[must_use]
pub fn sleep_cast_suffix(version: ServerVersion) -> &'static str {
    if version < BINARY_VOID_MIN_VERSION {
        "::TEXT"
    } else {
        ""
    }
}

/// Text of a sleep command for the given server.
#[must_use]
pub fn sleep_command_text(version: ServerVersion, seconds: u32) -> String {
    format!("SELECT pg_sleep({seconds}){}", sleep_cast_suffix(version))
}

/// A command bound to the connection it will run on.
#[derive(Debug)]
pub struct Command<'c, C> {
    text: String,
    connection: &'c C,
}

impl<'c, C: Connection> Command<'c, C> {
    pub fn new(text: impl Into<String>, connection: &'c C) -> Self {
        Self {
            text: text.into(),
            connection,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn connection(&self) -> &'c C {
        self.connection
    }
}

/// Build `SELECT pg_sleep(seconds)` for `connection`, casting on old servers.
pub fn build_sleep_command<C: Connection>(connection: &C, seconds: u32) -> Command<'_, C> {
    let text = sleep_command_text(connection.server_version(), seconds);
    tracing::trace!(command = %text, "built sleep command");
    Command::new(text, connection)
}

/// Flags describing how a command's results are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandBehavior(u32);

impl CommandBehavior {
    pub const DEFAULT: Self = Self(0);
    pub const SINGLE_RESULT: Self = Self(1);
    pub const SCHEMA_ONLY: Self = Self(1 << 1);
    pub const KEY_INFO: Self = Self(1 << 2);
    pub const SINGLE_ROW: Self = Self(1 << 3);
    pub const SEQUENTIAL_ACCESS: Self = Self(1 << 4);
    pub const CLOSE_CONNECTION: Self = Self(1 << 5);

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl BitOr for CommandBehavior {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Whether `behavior` requests sequential column access.
#[must_use]
pub const fn is_sequential(behavior: CommandBehavior) -> bool {
    behavior.contains(CommandBehavior::SEQUENTIAL_ACCESS)
}
