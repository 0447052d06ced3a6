//! Process-wide logging bootstrap.
//!
//! The first fixture to run installs a `tracing` dispatcher that records every
//! event into the shared [`TestLogSink`]. When `NPGSQL_TEST_LOGGING` names a
//! severity, a console layer filtered to that severity is attached as well and
//! the driver is told to log command parameters. Later fixtures find the state
//! already configured and leave it alone.
//!
//! The binary uses [`init`] instead, which is a plain `fmt` subscriber.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use serde::Serialize;
use tracing::Dispatch;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::{Layer, SubscriberExt};

use super::driver::LogManager;
use super::sink::TestLogSink;
use crate::error::{FixtureError, Result};
use crate::util::env::{self, Environment};

/// Minimum console severity for fixture logging.
pub const LOG_LEVEL_ENV: &str = "NPGSQL_TEST_LOGGING";
/// Log filter for the `pgfixture` binary.
pub const CLI_LOG_ENV: &str = "PGFIXTURE_LOG";

/// Log severity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Information,
    Warning,
    Error,
    Critical,
    None,
}

impl LogLevel {
    pub const ALL: &'static [Self] = &[
        Self::Trace,
        Self::Debug,
        Self::Information,
        Self::Warning,
        Self::Error,
        Self::Critical,
        Self::None,
    ];

    /// Parse a severity name (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "Trace",
            Self::Debug => "Debug",
            Self::Information => "Information",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Critical => "Critical",
            Self::None => "None",
        }
    }

    /// Console filter for this threshold. `tracing` has no level above error,
    /// so nothing can reach `Critical` and it blocks everything like `None`.
    #[must_use]
    pub const fn as_level_filter(self) -> LevelFilter {
        match self {
            Self::Trace => LevelFilter::TRACE,
            Self::Debug => LevelFilter::DEBUG,
            Self::Information => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            Self::Error => LevelFilter::ERROR,
            Self::Critical | Self::None => LevelFilter::OFF,
        }
    }

    /// Convert from tracing level.
    #[must_use]
    pub const fn from_tracing_level(level: Level) -> Self {
        match level {
            Level::TRACE => Self::Trace,
            Level::DEBUG => Self::Debug,
            Level::INFO => Self::Information,
            Level::WARN => Self::Warning,
            Level::ERROR => Self::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read the console threshold from `NPGSQL_TEST_LOGGING`.
///
/// # Errors
///
/// Returns [`FixtureError::InvalidLogLevel`] if the variable is set to
/// anything but a known severity, including the empty string.
pub fn parse_log_level_from_env(env: &dyn Environment) -> Result<Option<LogLevel>> {
    env.var(LOG_LEVEL_ENV)
        .map(|value| {
            LogLevel::from_arg(&value).ok_or(FixtureError::InvalidLogLevel {
                var: LOG_LEVEL_ENV,
                value,
            })
        })
        .transpose()
}

// =============================================================================
// Process logging state
// =============================================================================

/// Where the built dispatcher goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingScope {
    /// Installed as the process-wide default dispatcher.
    Global,
    /// Kept on the state object; callers scope it themselves.
    Isolated,
}

#[derive(Default)]
struct LoggingState {
    configured: bool,
    threshold: Option<LogLevel>,
    dispatch: Option<Dispatch>,
}

/// One-shot logging configuration shared by every fixture in a process.
pub struct ProcessLogging {
    scope: LoggingScope,
    console_writer: Mutex<Option<BoxMakeWriter>>,
    state: Mutex<LoggingState>,
    installations: AtomicUsize,
}

impl ProcessLogging {
    /// The process-wide instance. Installs the global `tracing` dispatcher.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<ProcessLogging>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new(LoggingScope::Global))))
    }

    /// A private instance whose dispatcher is only reachable via [`Self::dispatch`].
    #[must_use]
    pub fn isolated() -> Self {
        Self::new(LoggingScope::Isolated)
    }

    fn new(scope: LoggingScope) -> Self {
        Self {
            scope,
            console_writer: Mutex::new(None),
            state: Mutex::new(LoggingState::default()),
            installations: AtomicUsize::new(0),
        }
    }

    /// Send console output to `writer` instead of stderr.
    #[must_use]
    pub fn with_console_writer<W>(self, writer: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        *self
            .console_writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(BoxMakeWriter::new(writer));
        self
    }

    fn lock(&self) -> MutexGuard<'_, LoggingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub const fn scope(&self) -> LoggingScope {
        self.scope
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.lock().configured
    }

    /// Console threshold chosen at configuration time.
    #[must_use]
    pub fn threshold(&self) -> Option<LogLevel> {
        self.lock().threshold
    }

    /// The dispatcher built during configuration.
    #[must_use]
    pub fn dispatch(&self) -> Option<Dispatch> {
        self.lock().dispatch.clone()
    }

    /// How many times a dispatcher has been built. At most one.
    #[must_use]
    pub fn installations(&self) -> usize {
        self.installations.load(Ordering::SeqCst)
    }

    /// Configure logging unless it already is.
    ///
    /// Returns `true` if this call did the configuring. A failed attempt leaves
    /// the state unconfigured, so the next fixture tries again.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::InvalidLogLevel`] if `NPGSQL_TEST_LOGGING` holds
    /// an unknown severity.
    pub fn ensure_configured(
        &self,
        sink: &TestLogSink,
        env: &dyn Environment,
        log_manager: &dyn LogManager,
    ) -> Result<bool> {
        let mut state = self.lock();
        if state.configured {
            return Ok(false);
        }

        let threshold = parse_log_level_from_env(env)?;
        let custom_writer = self
            .console_writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let console = threshold.map(|level| {
            let ansi = custom_writer.is_none() && env::should_use_color(env);
            let writer = custom_writer.unwrap_or_else(|| BoxMakeWriter::new(std::io::stderr));
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(ansi)
                .with_target(true)
                .without_time()
                .with_filter(level.as_level_filter())
        });

        let subscriber = tracing_subscriber::registry()
            .with(sink.layer())
            .with(console);
        let dispatch = Dispatch::new(subscriber);

        if threshold.is_some() {
            log_manager.set_parameter_logging_enabled(true);
        }

        if self.scope == LoggingScope::Global
            && tracing::dispatcher::set_global_default(dispatch.clone()).is_err()
        {
            tracing::warn!("a global tracing subscriber was already installed; fixture logs will not be captured");
        }

        self.installations.fetch_add(1, Ordering::SeqCst);
        state.configured = true;
        state.threshold = threshold;
        state.dispatch = Some(dispatch);

        tracing::debug!(
            threshold = threshold.map_or("off", LogLevel::as_str),
            scope = ?self.scope,
            "fixture logging configured"
        );
        Ok(true)
    }
}

impl fmt::Debug for ProcessLogging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ProcessLogging")
            .field("scope", &self.scope)
            .field("configured", &state.configured)
            .field("threshold", &state.threshold)
            .field("installations", &self.installations())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Binary logging
// =============================================================================

/// Log output format for the binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable logs.
    #[default]
    Human,
    /// JSON logs (one event per line).
    Json,
}

impl LogFormat {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Initialize stderr logging for the `pgfixture` binary.
///
/// `PGFIXTURE_LOG` (then `RUST_LOG`) overrides `level` when set.
pub fn init(level: LevelFilter, format: LogFormat) {
    let filter = EnvFilter::try_from_env(CLI_LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(format!("pgfixture={level}")));

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_writer(std::io::stderr)
                .try_init()
                .ok();
        }
        LogFormat::Human => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .try_init()
                .ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::env::MapEnv;

    #[test]
    fn parses_every_known_severity_case_insensitively() {
        assert_eq!(LogLevel::from_arg("trace"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::from_arg("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_arg("Information"), Some(LogLevel::Information));
        assert_eq!(LogLevel::from_arg("warning"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::from_arg("Error"), Some(LogLevel::Error));
        assert_eq!(LogLevel::from_arg("critical"), Some(LogLevel::Critical));
        assert_eq!(LogLevel::from_arg("none"), Some(LogLevel::None));
    }

    #[test]
    fn rejects_unknown_severities() {
        assert_eq!(LogLevel::from_arg("warn"), None);
        assert_eq!(LogLevel::from_arg("info"), None);
        assert_eq!(LogLevel::from_arg("loud"), None);
    }

    #[test]
    fn env_parsing() {
        let env = MapEnv::new();
        assert_eq!(parse_log_level_from_env(&env).unwrap(), None);

        let env = MapEnv::new().with(LOG_LEVEL_ENV, " Warning ");
        assert_eq!(parse_log_level_from_env(&env).unwrap(), Some(LogLevel::Warning));

        let env = MapEnv::new().with(LOG_LEVEL_ENV, "verbose");
        let err = parse_log_level_from_env(&env).unwrap_err();
        assert!(matches!(err, FixtureError::InvalidLogLevel { ref value, .. } if value == "verbose"));

        for blank in ["", "   "] {
            let env = MapEnv::new().with(LOG_LEVEL_ENV, blank);
            let err = parse_log_level_from_env(&env).unwrap_err();
            assert!(matches!(err, FixtureError::InvalidLogLevel { ref value, .. } if value == blank));
        }
    }

    #[test]
    fn severity_order() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Warning < LogLevel::Error);
        assert!(LogLevel::Critical < LogLevel::None);
    }

    #[test]
    fn filters_follow_threshold() {
        assert_eq!(LogLevel::Warning.as_level_filter(), LevelFilter::WARN);
        assert_eq!(LogLevel::Error.as_level_filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::Critical.as_level_filter(), LevelFilter::OFF);
        assert_eq!(LogLevel::None.as_level_filter(), LevelFilter::OFF);
    }

    #[test]
    fn log_format_from_arg() {
        assert_eq!(LogFormat::from_arg("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::from_arg("human"), Some(LogFormat::Human));
        assert_eq!(LogFormat::from_arg("xml"), None);
    }
}
