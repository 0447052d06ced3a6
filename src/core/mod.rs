//! Fixture building blocks: logging, connection strings, opening, commands.

pub mod command;
pub mod connection_string;
pub mod driver;
pub mod fixture;
pub mod logging;
pub mod opener;
pub mod resolver;
pub mod sink;

pub use command::{
    BINARY_VOID_MIN_VERSION, Command, CommandBehavior, DEFAULT_SLEEP_SECONDS, ServerVersion,
    build_sleep_command, is_sequential, sleep_cast_suffix, sleep_command_text,
};
pub use connection_string::ConnectionStringBuilder;
pub use driver::{Connection, Driver, DriverError, LogManager, ServerError};
pub use fixture::{ConnectionOf, Fixture, TestBase};
pub use logging::{LogLevel, LoggingScope, ProcessLogging};
pub use opener::{Classification, ProvisioningPolicy, classify, open_connection};
pub use resolver::{CONNECTION_STRING_ENV, DEFAULT_CONNECTION_STRING, FixtureConnectionConfig};
pub use sink::{LogEntry, SinkLayer, TestLogSink};
