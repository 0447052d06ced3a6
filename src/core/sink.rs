//! In-memory capture of log events.
//!
//! [`TestLogSink`] is a cheap, cloneable handle to one shared list of
//! [`LogEntry`] values. Its [`SinkLayer`] plugs into a `tracing_subscriber`
//! registry and appends every event it sees, in emission order.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::logging::LogLevel;

/// One captured log event.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

/// Shared, ordered collection of captured log entries.
#[derive(Debug, Clone, Default)]
pub struct TestLogSink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The sink shared by every fixture in the process.
    #[must_use]
    pub fn shared() -> Self {
        static SHARED: OnceLock<TestLogSink> = OnceLock::new();
        SHARED.get_or_init(Self::new).clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an entry.
    pub fn push(&self, entry: LogEntry) {
        self.lock().push(entry);
    }

    /// Drop every captured entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Snapshot of all captured entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Captured messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|e| e.message.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether `other` is a handle to the same underlying list.
    #[must_use]
    pub fn same_sink(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    /// A `tracing` layer that forwards events into this sink.
    #[must_use]
    pub fn layer(&self) -> SinkLayer {
        SinkLayer { sink: self.clone() }
    }

    /// Assert a message was logged containing the given substring.
    ///
    /// # Panics
    ///
    /// Panics if no captured message contains `needle`.
    pub fn assert_logged(&self, needle: &str) {
        let entries = self.lock();
        let found = entries.iter().any(|e| e.message.contains(needle));
        assert!(
            found,
            "Expected log containing '{}'. Logged: {:#?}",
            needle,
            entries.iter().map(|e| &e.message).collect::<Vec<_>>()
        );
    }

    /// Assert a message was logged at the given level.
    ///
    /// # Panics
    ///
    /// Panics if no entry at `level` contains `needle`.
    pub fn assert_logged_at_level(&self, level: LogLevel, needle: &str) {
        let entries = self.lock();
        let found = entries
            .iter()
            .any(|e| e.level == level && e.message.contains(needle));
        assert!(
            found,
            "Expected {} log containing '{}'. Logged: {:#?}",
            level,
            needle,
            entries
                .iter()
                .filter(|e| e.level == level)
                .map(|e| &e.message)
                .collect::<Vec<_>>()
        );
    }

    /// Assert a structured field was logged.
    ///
    /// # Panics
    ///
    /// Panics if no entry carries `field_name` with a value containing `field_value`.
    pub fn assert_field_logged(&self, field_name: &str, field_value: &str) {
        let entries = self.lock();
        let found = entries.iter().any(|e| {
            e.fields
                .iter()
                .any(|(k, v)| k == field_name && v.contains(field_value))
        });
        assert!(
            found,
            "Expected field {}={}. Logged fields: {:#?}",
            field_name,
            field_value,
            entries.iter().map(|e| &e.fields).collect::<Vec<_>>()
        );
    }

    /// Assert nothing at error level or above was logged.
    ///
    /// # Panics
    ///
    /// Panics if any error entry was captured.
    pub fn assert_no_errors(&self) {
        let entries = self.lock();
        let errors: Vec<_> = entries
            .iter()
            .filter(|e| e.level >= LogLevel::Error)
            .collect();
        assert!(errors.is_empty(), "Unexpected errors: {errors:#?}");
    }
}

/// Tracing layer that captures into a [`TestLogSink`].
#[derive(Debug, Clone)]
pub struct SinkLayer {
    sink: TestLogSink,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for SinkLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        self.sink.push(LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::from_tracing_level(*event.metadata().level()),
            target: event.metadata().target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let name = field.name();
        if name == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push((name.to_string(), format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        let name = field.name();
        if name == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((name.to_string(), value.to_string()));
        }
    }
}
