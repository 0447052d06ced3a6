//! pgfixture - fixture bootstrap for PostgreSQL driver integration tests
//!
//! Resolves the test connection string, configures capture logging once per
//! process, opens connections through a pluggable driver while turning missing
//! test infrastructure into skips, and builds version-aware test commands.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod util;

/// Test utilities module - included in test builds or when test-utils feature is enabled.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use core::{Connection, Driver, Fixture, TestBase};
pub use error::{FixtureError, Result};
