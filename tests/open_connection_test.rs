//! Tests for opening connections through a fixture.

use pgfixture::core::driver::sql_state;
use pgfixture::core::opener::{MISSING_DATABASE_MESSAGE, MISSING_ROLE_MESSAGE};
use pgfixture::core::{
    CONNECTION_STRING_ENV, ConnectionStringBuilder, DEFAULT_CONNECTION_STRING, DriverError,
    ProvisioningPolicy, ServerVersion, build_sleep_command,
};
use pgfixture::error::ErrorCategory;
use pgfixture::test_utils::{OpenBehavior, SimulatedDriver};
use pgfixture::util::MapEnv;
use pgfixture::{Connection, Fixture, FixtureError, open_or_skip};

mod common;
use common::{healthy_fixture, isolated_fixture};

#[test]
fn test_open_uses_default_connection_string() {
    let fixture = healthy_fixture();
    let conn = fixture.open_connection(None).unwrap();

    assert!(conn.is_open());
    assert_eq!(conn.connection_string(), DEFAULT_CONNECTION_STRING);
    assert_eq!(conn.server_version(), ServerVersion::new(16, 0, 0));
    assert_eq!(fixture.driver().open_attempts(), 1);
}

#[test]
fn test_open_uses_env_connection_string() {
    let fixture = isolated_fixture(
        SimulatedDriver::new(ServerVersion::new(13, 4, 0)),
        MapEnv::new().with(CONNECTION_STRING_ENV, "Host=ci-db;Database=npgsql_tests"),
    );

    let conn = fixture.open_connection(None).unwrap();
    assert_eq!(conn.connection_string(), "Host=ci-db;Database=npgsql_tests");
}

#[test]
fn test_explicit_connection_string_wins() {
    let fixture = healthy_fixture();
    let conn = fixture.open_connection(Some("Host=elsewhere")).unwrap();

    assert_eq!(conn.connection_string(), "Host=elsewhere");
    assert_eq!(fixture.driver().created(), vec!["Host=elsewhere".to_string()]);
}

#[test]
fn test_builder_renders_before_opening() {
    let fixture = healthy_fixture();
    let builder = ConnectionStringBuilder::parse(fixture.connection_string())
        .unwrap()
        .with_database("other_db");

    let conn = fixture.open_connection_with(&builder).unwrap();
    assert_eq!(conn.connection_string(), builder.to_string());
    assert!(conn.connection_string().contains("Database=other_db"));
}

#[test]
fn test_connection_string_is_resolved_once() {
    let fixture = healthy_fixture();
    assert!(!fixture.config().is_resolved());

    let first = fixture.connection_string().as_ptr();
    fixture.open_connection(None).unwrap();
    fixture.open_connection(None).unwrap();

    assert!(fixture.config().is_resolved());
    assert_eq!(fixture.connection_string().as_ptr(), first);
    assert_eq!(fixture.driver().created().len(), 2);
}

#[test]
fn test_missing_database_skips_locally() {
    let fixture = isolated_fixture(
        SimulatedDriver::failing_with(sql_state::INVALID_CATALOG_NAME, "database \"npgsql_tests\" does not exist"),
        MapEnv::new(),
    );

    let err = fixture.open_connection(None).unwrap_err();
    assert!(err.is_skip());
    assert_eq!(err.sql_state(), Some("3D000"));
    assert_eq!(err.to_string(), format!("test skipped: {MISSING_DATABASE_MESSAGE}"));
    assert_eq!(fixture.driver().open_attempts(), 1);
}

#[test]
fn test_missing_role_skips_locally() {
    let fixture = isolated_fixture(
        SimulatedDriver::failing_with(sql_state::INVALID_PASSWORD, "password authentication failed"),
        MapEnv::new(),
    );

    let err = fixture.open_connection(None).unwrap_err();
    assert!(matches!(
        err,
        FixtureError::Skipped { ref message, .. } if message == MISSING_ROLE_MESSAGE
    ));
}

#[test]
fn test_missing_database_fails_on_build_server() {
    let fixture = isolated_fixture(
        SimulatedDriver::failing_with(sql_state::INVALID_CATALOG_NAME, "does not exist"),
        MapEnv::new(),
    )
    .with_policy(ProvisioningPolicy::detect(|| true));

    let err = fixture.open_connection(None).unwrap_err();
    assert!(!err.is_skip());
    assert_eq!(err.category(), ErrorCategory::Provisioning);
    assert!(matches!(
        err,
        FixtureError::ProvisioningRequired { ref sql_state, ref message }
            if sql_state == "3D000" && message == MISSING_DATABASE_MESSAGE
    ));
}

#[test]
fn test_missing_role_fails_on_build_server() {
    let fixture = isolated_fixture(
        SimulatedDriver::failing_with(sql_state::INVALID_PASSWORD, "password authentication failed"),
        MapEnv::new(),
    )
    .with_policy(ProvisioningPolicy::FailOnBuildServer);

    let err = fixture.open_connection(None).unwrap_err();
    assert!(!err.is_skip());
    assert_eq!(err.sql_state(), Some("28P01"));
    assert!(matches!(
        err,
        FixtureError::ProvisioningRequired { ref message, .. } if message == MISSING_ROLE_MESSAGE
    ));
    assert!(err.to_string().contains("create user npgsql_tests"));
    assert_eq!(fixture.driver().open_attempts(), 1);
}

#[test]
fn test_env_connection_string_is_passed_verbatim() {
    let raw = "Host=ci-db;Database=npgsql_tests;Password=abc ";
    let fixture = isolated_fixture(
        SimulatedDriver::new(ServerVersion::new(16, 0, 0)),
        MapEnv::new().with(CONNECTION_STRING_ENV, raw),
    );

    let conn = fixture.open_connection(None).unwrap();
    assert_eq!(conn.connection_string(), raw);
}

#[test]
fn test_other_server_errors_propagate_untouched() {
    let fixture = isolated_fixture(
        SimulatedDriver::failing_with("53300", "too many connections for role"),
        MapEnv::new(),
    );

    let err = fixture.open_connection(None).unwrap_err();
    assert!(!err.is_skip());
    assert_eq!(err.category(), ErrorCategory::Driver);
    assert_eq!(err.sql_state(), Some("53300"));
    assert_eq!(fixture.driver().open_attempts(), 1);
}

#[test]
fn test_transport_errors_propagate() {
    let fixture = isolated_fixture(
        SimulatedDriver::new(ServerVersion::new(16, 0, 0))
            .with_behavior(OpenBehavior::TransportError("connection refused".into())),
        MapEnv::new(),
    );

    let err = fixture.open_connection(None).unwrap_err();
    assert!(matches!(err, FixtureError::Driver(DriverError::Transport(_))));
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn test_malformed_connection_string_fails_before_opening() {
    let fixture = healthy_fixture();
    let err = fixture.open_connection(Some("Host")).unwrap_err();

    assert!(matches!(err, FixtureError::Driver(DriverError::InvalidConnectionString(_))));
    assert_eq!(fixture.driver().open_attempts(), 0);
}

fn open_and_mark<F: Fixture>(fixture: &F, reached: &mut bool) {
    let _conn = open_or_skip!(fixture);
    *reached = true;
}

#[test]
fn test_open_or_skip_returns_early_on_skip() {
    let fixture = isolated_fixture(
        SimulatedDriver::failing_with(sql_state::INVALID_PASSWORD, "nope"),
        MapEnv::new(),
    );
    let mut reached = false;
    open_and_mark(&fixture, &mut reached);
    assert!(!reached);
}

#[test]
fn test_open_or_skip_yields_connection() {
    let fixture = healthy_fixture();
    let mut reached = false;
    open_and_mark(&fixture, &mut reached);
    assert!(reached);
}

#[test]
#[should_panic(expected = "too many connections")]
fn test_open_or_skip_panics_on_real_failure() {
    let fixture = isolated_fixture(
        SimulatedDriver::failing_with("53300", "too many connections"),
        MapEnv::new(),
    );
    let mut reached = false;
    open_and_mark(&fixture, &mut reached);
}

#[test]
fn test_sleep_command_follows_negotiated_version() {
    let old = isolated_fixture(SimulatedDriver::new(ServerVersion::new(9, 0, 0)), MapEnv::new());
    let conn = old.open_connection(None).unwrap();
    let cmd = build_sleep_command(&conn, 5);
    assert!(cmd.text().ends_with("::TEXT"));
    assert!(std::ptr::eq(cmd.connection(), &conn));

    let new = isolated_fixture(SimulatedDriver::new(ServerVersion::new(9, 2, 0)), MapEnv::new());
    let conn = new.open_connection(None).unwrap();
    assert_eq!(build_sleep_command(&conn, 5).text(), "SELECT pg_sleep(5)");
}
