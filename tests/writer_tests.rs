//! End-to-end tests running the token writer against loopback listeners.

mod test_utils;

use std::{net::SocketAddr, time::Duration};

use chrono::{TimeZone, Utc};
use logentries_writer::{
    ConnectionStatus, JsonFormatter, LogEvent, Priority, TokenLogger, TokenWriter, WriterError,
};
use log::{LevelFilter, Log};
use rstest::rstest;
use serde_json::Value;
use test_utils::{LineServer, LocalConnector, line_server, refused_addr};

fn disk_low() -> LogEvent {
    LogEvent::new(Priority::Warning, "disk low")
        .with_timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
}

fn writer_for(addr: SocketAddr, persistent: bool) -> (TokenWriter, LocalConnector) {
    let connector = LocalConnector::new(addr);
    let writer = TokenWriter::builder("abc123")
        .with_persistent(persistent)
        .with_connect_timeout(Duration::from_secs(2))
        .with_connector(connector.clone())
        .build()
        .expect("build writer");
    (writer, connector)
}

#[rstest]
fn collector_receives_token_prefixed_lines(line_server: LineServer) {
    let (mut writer, connector) = writer_for(line_server.addr(), false);
    assert!(!writer.is_connected());

    writer.write(&disk_low());
    writer.write(&LogEvent::new(Priority::Critical, "fan stopped"));

    assert_eq!(
        line_server.next_line(),
        "abc123 2024-01-01T00:00:00Z - WARN - disk low \n"
    );
    let second = line_server.next_line();
    assert!(second.starts_with("abc123 "));
    assert!(second.ends_with(" - CRIT - fan stopped \n"));
    assert_eq!(connector.attempts(), 1);
}

#[rstest]
fn shutdown_closes_fresh_connection(line_server: LineServer) {
    let (mut writer, _connector) = writer_for(line_server.addr(), false);
    writer.write(&disk_low());
    line_server.next_line();

    writer.shutdown();

    assert_eq!(writer.status(), ConnectionStatus::Closed);
    assert!(!writer.is_connected());
}

#[rstest]
fn shutdown_keeps_persistent_connection(line_server: LineServer) {
    let (mut writer, _connector) = writer_for(line_server.addr(), true);
    writer.write(&disk_low());
    line_server.next_line();

    writer.shutdown();

    assert_eq!(writer.status(), ConnectionStatus::Connected);
}

#[rstest]
fn refused_connection_is_silent(refused_addr: SocketAddr) {
    let (mut writer, connector) = writer_for(refused_addr, false);

    writer.write(&disk_low());
    writer.write(&disk_low());

    assert!(!writer.is_connected());
    assert_eq!(connector.attempts(), 2);
    assert_eq!(writer.connect_failures(), 2);
    assert_eq!(writer.dropped_lines(), 2);
    assert!(writer.last_error().is_some());
}

#[rstest]
fn json_lines_follow_the_token(line_server: LineServer) {
    let connector = LocalConnector::new(line_server.addr());
    let mut writer = TokenWriter::builder("abc123")
        .with_formatter(JsonFormatter)
        .with_connector(connector)
        .build()
        .expect("build writer");

    writer.write(&disk_low().with_extra("mount", "/var"));

    let line = line_server.next_line();
    let json = line
        .strip_prefix("abc123 ")
        .and_then(|rest| rest.strip_suffix('\n'))
        .expect("token prefix and newline");
    let parsed: Value = serde_json::from_str(json).expect("valid json");
    assert_eq!(parsed["priorityName"], "WARN");
    assert_eq!(parsed["priority"], 4);
    assert_eq!(parsed["message"], "disk low");
    assert_eq!(parsed["extra"]["mount"], "/var");
}

#[rstest]
fn log_records_reach_the_collector(line_server: LineServer) {
    let (writer, _connector) = writer_for(line_server.addr(), true);
    let logger = TokenLogger::new(writer, LevelFilter::Info);

    logger.log(
        &log::Record::builder()
            .args(format_args!("cache warmed"))
            .level(log::Level::Info)
            .target("app::cache")
            .build(),
    );
    logger.log(
        &log::Record::builder()
            .args(format_args!("noise"))
            .level(log::Level::Debug)
            .target("app::cache")
            .build(),
    );

    let line = line_server.next_line();
    assert!(line.starts_with("abc123 "));
    assert!(line.ends_with(" - INFO - cache warmed {\"target\":\"app::cache\"}\n"));
    line_server.assert_quiet(Duration::from_millis(200));
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("0")]
fn blank_tokens_are_rejected(#[case] token: &str) {
    let err = TokenWriter::new(token).expect_err("blank token must fail");
    assert!(matches!(err, WriterError::InvalidConfiguration(_)));
}
