//! End-to-end runs against the mock connector.
//!
//! Drives the full pipeline (discovery, gate, validation, batch, artifacts)
//! through the public API with a scripted operator.

use db_sqlrun::config::{
    self, Config, ConnectionAuth, ErrorPolicy, OutputFormat, Overrides, RunConfig,
};
use db_sqlrun::db::{ColumnInfo, MockConnector, MockResponse, QueryResult, Value};
use db_sqlrun::discovery::discover_scripts;
use db_sqlrun::operator::ScriptedOperator;
use db_sqlrun::runner::{RunOutcome, Runner};
use db_sqlrun::validator::PROBE_QUERY;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn run_config(dir: &Path, format: OutputFormat, on_error: ErrorPolicy) -> RunConfig {
    let overrides = Overrides {
        script_dir: dir.to_path_buf(),
        server: "localhost".to_string(),
        database: "testdb".to_string(),
        port: Some(5432),
        format: Some(format),
        on_error: Some(on_error),
        ..Default::default()
    };
    config::resolve(&overrides, &Config::default(), ConnectionAuth::Integrated).unwrap()
}

fn select_x() -> MockResponse {
    MockResponse::Rows(QueryResult::with_data(
        vec![ColumnInfo::new("x", "INT4")],
        vec![vec![Value::Int(1)]],
    ))
}

#[tokio::test]
async fn test_listing_is_stable() {
    let dir = tempdir().unwrap();
    for name in ["c.sql", "a.sql", "b.sql"] {
        fs::write(dir.path().join(name), "select 1").unwrap();
    }

    let first = discover_scripts(dir.path()).unwrap();
    let second = discover_scripts(dir.path()).unwrap();

    assert_eq!(first, second);
    let names: Vec<_> = first.iter().map(|s| s.file_name()).collect();
    assert_eq!(names, ["a.sql", "b.sql", "c.sql"]);
}

#[tokio::test]
async fn test_empty_directory_runs_nothing() {
    let dir = tempdir().unwrap();
    let connector = MockConnector::new();
    let mut operator = ScriptedOperator::new(["y"]);

    let outcome = Runner::new(
        run_config(dir.path(), OutputFormat::Csv, ErrorPolicy::Continue),
        &connector,
        &mut operator,
    )
    .run()
    .await
    .unwrap();

    assert!(operator.shown()[0].contains("(no script files found)"));
    match outcome {
        RunOutcome::Completed(report) => assert!(report.artifacts.is_empty()),
        RunOutcome::Declined => panic!("expected the run to complete"),
    }
    // Only the probe ran.
    assert_eq!(connector.executed(), [PROBE_QUERY]);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_csv_and_table_artifacts() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("one.sql"), "select 1 as x").unwrap();
    let connector = MockConnector::new().with_response("select 1 as x", select_x());

    for format in [OutputFormat::Csv, OutputFormat::Table] {
        let mut operator = ScriptedOperator::new(["yes"]);
        Runner::new(
            run_config(dir.path(), format, ErrorPolicy::Continue),
            &connector,
            &mut operator,
        )
        .run()
        .await
        .unwrap();
    }

    let csv = fs::read_to_string(dir.path().join("one.csv")).unwrap();
    assert_eq!(csv, "x\n1\n");

    let table = fs::read_to_string(dir.path().join("one.txt")).unwrap();
    let header = table.lines().find(|l| l.contains('x')).unwrap();
    assert!(header.contains('|'));
    assert!(table.lines().any(|l| l.contains("| 1")));
}

#[tokio::test]
async fn test_unreachable_server_writes_nothing() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("one.sql"), "select 1 as x").unwrap();
    let connector = MockConnector::unreachable();
    let mut operator = ScriptedOperator::new(["y"]);

    let result = Runner::new(
        run_config(dir.path(), OutputFormat::Csv, ErrorPolicy::Continue),
        &connector,
        &mut operator,
    )
    .run()
    .await;

    assert!(result.is_err());
    assert!(connector.executed().is_empty());
    assert!(!dir.path().join("one.csv").exists());
}

#[tokio::test]
async fn test_decline_opens_no_connection() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("one.sql"), "select 1 as x").unwrap();
    let connector = MockConnector::new();
    let mut operator = ScriptedOperator::new(["nope"]);

    let outcome = Runner::new(
        run_config(dir.path(), OutputFormat::Csv, ErrorPolicy::Continue),
        &connector,
        &mut operator,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(connector.connections(), 0);
}

#[tokio::test]
async fn test_failures_are_collected_and_batch_continues() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("1_ok.sql"), "select 1 as x").unwrap();
    fs::write(dir.path().join("2_bad.sql"), "selec 1").unwrap();
    fs::write(dir.path().join("3_ok.sql"), " select 1 as x \n").unwrap();
    let connector = MockConnector::new()
        .with_response("select 1 as x", select_x())
        .with_response(
            "selec 1",
            MockResponse::QueryError("syntax error at or near \"selec\"".to_string()),
        );
    let mut operator = ScriptedOperator::new(["y"]);

    let outcome = Runner::new(
        run_config(dir.path(), OutputFormat::Csv, ErrorPolicy::Continue),
        &connector,
        &mut operator,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(outcome.exit_code(), 1);
    let RunOutcome::Completed(report) = outcome else {
        panic!("expected the run to complete");
    };
    assert_eq!(report.artifacts.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert!(dir.path().join("1_ok.csv").exists());
    assert!(!dir.path().join("2_bad.csv").exists());
    assert!(dir.path().join("3_ok.csv").exists());
}

#[tokio::test]
async fn test_abort_policy_stops_at_first_failure() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("1_bad.sql"), "selec 1").unwrap();
    fs::write(dir.path().join("2_ok.sql"), "select 1 as x").unwrap();
    let connector = MockConnector::new()
        .with_response("selec 1", MockResponse::QueryError("syntax error".to_string()));
    let mut operator = ScriptedOperator::new(["y"]);

    let result = Runner::new(
        run_config(dir.path(), OutputFormat::Csv, ErrorPolicy::Abort),
        &connector,
        &mut operator,
    )
    .run()
    .await;

    assert!(result.is_err());
    assert!(!dir.path().join("2_ok.csv").exists());
}
