//! Base fixture for driver integration tests.
//!
//! [`TestBase`] bundles the driver, the per-instance connection string, the
//! shared log sink and the process logging state. The [`Fixture`] trait holds
//! the lifecycle hooks as default methods; a fixture type wraps a `TestBase`,
//! implements [`Fixture::base`], and overrides whatever hooks it needs.
//!
//! ```rust,ignore
//! struct MultiplexingTests {
//!     base: TestBase<MyDriver>,
//!     connection_string: String,
//! }
//!
//! impl Fixture for MultiplexingTests {
//!     type Driver = MyDriver;
//!
//!     fn base(&self) -> &TestBase<MyDriver> {
//!         &self.base
//!     }
//!
//!     fn connection_string(&self) -> &str {
//!         &self.connection_string
//!     }
//! }
//! ```

use std::sync::Arc;

use super::connection_string::ConnectionStringBuilder;
use super::driver::Driver;
use super::logging::ProcessLogging;
use super::opener::{self, ProvisioningPolicy};
use super::resolver::FixtureConnectionConfig;
use super::sink::TestLogSink;
use crate::error::Result;
use crate::util::env::{Environment, ProcessEnv};

/// Connection type produced by a fixture's driver.
pub type ConnectionOf<F> = <<F as Fixture>::Driver as Driver>::Connection;

/// State shared by all fixture hooks.
pub struct TestBase<D> {
    driver: D,
    config: FixtureConnectionConfig,
    logging: Arc<ProcessLogging>,
    env: Arc<dyn Environment>,
    policy: ProvisioningPolicy,
}

impl<D: Driver> TestBase<D> {
    /// A fixture on the process environment, the shared sink and the global
    /// logging state, skipping tests when infrastructure is missing.
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            config: FixtureConnectionConfig::new(TestLogSink::shared()),
            logging: ProcessLogging::global(),
            env: Arc::new(ProcessEnv),
            policy: ProvisioningPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_env(mut self, env: impl Environment + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: TestLogSink) -> Self {
        self.config = self.config.with_sink(sink);
        self
    }

    #[must_use]
    pub fn with_logging(mut self, logging: Arc<ProcessLogging>) -> Self {
        self.logging = logging;
        self
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: ProvisioningPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Pin the connection string instead of reading `NPGSQL_TEST_DB`.
    #[must_use]
    pub fn with_connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.config = FixtureConnectionConfig::with_connection_string(
            self.config.sink().clone(),
            connection_string,
        );
        self
    }

    pub const fn driver(&self) -> &D {
        &self.driver
    }

    #[must_use]
    pub const fn config(&self) -> &FixtureConnectionConfig {
        &self.config
    }

    #[must_use]
    pub const fn sink(&self) -> &TestLogSink {
        self.config.sink()
    }

    #[must_use]
    pub fn logging(&self) -> &ProcessLogging {
        &self.logging
    }

    #[must_use]
    pub fn env(&self) -> &dyn Environment {
        self.env.as_ref()
    }

    #[must_use]
    pub const fn policy(&self) -> ProvisioningPolicy {
        self.policy
    }

    /// The memoized connection string for this instance.
    pub fn resolved_connection_string(&self) -> &str {
        self.config.resolve(self.env.as_ref())
    }
}

/// Lifecycle hooks and connection helpers for a test fixture.
pub trait Fixture {
    type Driver: Driver;

    fn base(&self) -> &TestBase<Self::Driver>;

    /// Connection string used by [`Fixture::open_connection`] when none is given.
    fn connection_string(&self) -> &str {
        self.base().resolved_connection_string()
    }

    /// Run before each test: forget log entries from earlier tests.
    fn setup(&self) {
        self.base().sink().clear();
    }

    /// Run once per fixture: configure logging if no fixture has yet.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Fixture::setup_logging`].
    fn one_time_setup(&self) -> Result<()> {
        if !self.base().logging().is_configured() {
            self.setup_logging()?;
        }
        Ok(())
    }

    /// Install the capture sink and optional console output.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FixtureError::InvalidLogLevel`] for an unknown
    /// `NPGSQL_TEST_LOGGING` value.
    fn setup_logging(&self) -> Result<()> {
        let base = self.base();
        base.logging()
            .ensure_configured(base.sink(), base.env(), base.driver().log_manager())?;
        Ok(())
    }

    /// Open a connection to `connection_string`, or to
    /// [`Fixture::connection_string`] when `None`.
    ///
    /// # Errors
    ///
    /// See [`opener::open_connection`].
    fn open_connection(&self, connection_string: Option<&str>) -> Result<ConnectionOf<Self>> {
        let connection_string = connection_string.unwrap_or_else(|| self.connection_string());
        opener::open_connection(self.base().driver(), connection_string, self.base().policy())
    }

    /// Open a connection described by `builder`.
    ///
    /// # Errors
    ///
    /// See [`opener::open_connection`].
    fn open_connection_with(&self, builder: &ConnectionStringBuilder) -> Result<ConnectionOf<Self>> {
        self.open_connection(Some(&builder.to_string()))
    }
}

impl<D: Driver> Fixture for TestBase<D> {
    type Driver = D;

    fn base(&self) -> &TestBase<D> {
        self
    }
}

/// Open a connection from a fixture, or return early from the test if the
/// test infrastructure is missing and skipping is allowed. Other errors panic.
#[macro_export]
macro_rules! open_or_skip {
    ($fixture:expr) => {
        $crate::open_or_skip!($fixture, ::core::option::Option::None)
    };
    ($fixture:expr, $connection_string:expr) => {{
        use $crate::core::fixture::Fixture as _;
        match ($fixture).open_connection($connection_string) {
            ::core::result::Result::Ok(conn) => conn,
            ::core::result::Result::Err(err) if err.is_skip() => {
                eprintln!("{err}");
                return;
            }
            ::core::result::Result::Err(err) => panic!("{err}"),
        }
    }};
}
