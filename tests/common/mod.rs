//! Common helpers for integration tests.
//!
//! Every fixture built here is isolated: its own sink, its own logging state
//! and a fixed environment, so tests can run in parallel without sharing the
//! process-wide defaults.
#![allow(dead_code)]

use std::sync::Arc;

use pgfixture::TestBase;
use pgfixture::core::ServerVersion;
use pgfixture::core::logging::ProcessLogging;
use pgfixture::core::sink::TestLogSink;
use pgfixture::test_utils::{SharedBuffer, SimulatedDriver};
use pgfixture::util::MapEnv;

/// An isolated fixture around `driver` with environment `env`.
pub fn isolated_fixture(driver: SimulatedDriver, env: MapEnv) -> TestBase<SimulatedDriver> {
    TestBase::new(driver)
        .with_env(env)
        .with_sink(TestLogSink::new())
        .with_logging(Arc::new(ProcessLogging::isolated()))
}

/// An isolated fixture whose driver connects to a 16.0 server.
pub fn healthy_fixture() -> TestBase<SimulatedDriver> {
    isolated_fixture(
        SimulatedDriver::new(ServerVersion::new(16, 0, 0)),
        MapEnv::new(),
    )
}

/// Isolated logging state that writes console output to the returned buffer.
pub fn logging_with_console() -> (Arc<ProcessLogging>, SharedBuffer) {
    let console = SharedBuffer::new();
    let logging = Arc::new(ProcessLogging::isolated().with_console_writer(console.clone()));
    (logging, console)
}
