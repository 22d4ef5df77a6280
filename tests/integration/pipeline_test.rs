// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{endpoint, mount_slow, mount_success};
use chrono::NaiveDate;
use psirs::application::use_cases::measurement_use_case::{MeasurementPlan, MeasurementUseCase};
use psirs::domain::models::measurement::Strategy;
use psirs::domain::models::result_row::RESULT_COLUMNS;
use psirs::domain::services::response_transformer::ResponseTransformer;
use psirs::engines::pagespeed_engine::PageSpeedEngine;
use psirs::infrastructure::storage::CsvFileSink;
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()
}

#[tokio::test]
async fn test_pipeline_skips_timed_out_target() {
    let server = MockServer::start().await;
    mount_success(&server, "https://a.example.com/", 0.87).await;
    mount_slow(&server, "https://slow.example.com/", Duration::from_millis(1500)).await;
    mount_success(&server, "https://b.example.com/", 0.42).await;

    let engine = PageSpeedEngine::new(
        endpoint(&server),
        "test-key",
        Duration::from_secs(5),
        Duration::from_millis(300),
    )
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(CsvFileSink::new(dir.path(), date()));
    let plan = MeasurementPlan::new(
        "ja",
        vec![Strategy::Mobile, Strategy::Desktop],
        vec![
            "https://a.example.com/".to_string(),
            "https://slow.example.com/".to_string(),
            "https://b.example.com/".to_string(),
        ],
    );

    let report = MeasurementUseCase::new(
        Arc::new(engine),
        sink.clone(),
        ResponseTransformer::new(date()),
        plan,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(report.attempted, 6);
    assert_eq!(report.succeeded, 4);
    assert_eq!(report.failed, 2);
    assert_eq!(report.rows, 8);
    assert_eq!(report.destination, sink.output_path().to_string_lossy());

    let mut reader = csv::Reader::from_path(sink.output_path()).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, RESULT_COLUMNS);

    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 8);
    assert!(records.iter().all(|r| &r[3] != "https://slow.example.com/"));

    let summary: Vec<(&str, &str, &str, &str)> = records
        .iter()
        .map(|r| (&r[2], &r[3], &r[4], &r[5]))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("mobile", "https://a.example.com/", "this url", "87"),
            ("mobile", "https://a.example.com/", "origin", "87"),
            ("mobile", "https://b.example.com/", "this url", "42"),
            ("mobile", "https://b.example.com/", "origin", "42"),
            ("desktop", "https://a.example.com/", "this url", "87"),
            ("desktop", "https://a.example.com/", "origin", "87"),
            ("desktop", "https://b.example.com/", "this url", "42"),
            ("desktop", "https://b.example.com/", "origin", "42"),
        ]
    );

    let first = &records[0];
    assert_eq!(&first[0], "2024-10-01");
    assert_eq!(&first[1], "ja");
    assert_eq!(&first[8], "85");
    assert_eq!(&first[14], "2100");
    assert_eq!(&records[1][14], "2600");
}

#[tokio::test]
async fn test_pipeline_with_every_call_failing_writes_header_only() {
    let server = MockServer::start().await;

    let engine = PageSpeedEngine::new(
        endpoint(&server),
        "test-key",
        Duration::from_secs(5),
        Duration::from_secs(5),
    )
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(CsvFileSink::new(dir.path(), date()));
    let plan = MeasurementPlan::new(
        "ja",
        vec![Strategy::Desktop],
        vec!["https://missing.example.com/".to_string()],
    );

    let report = MeasurementUseCase::new(
        Arc::new(engine),
        sink.clone(),
        ResponseTransformer::new(date()),
        plan,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.rows, 0);
    let contents = std::fs::read_to_string(sink.output_path()).unwrap();
    assert_eq!(contents.lines().count(), 1);
}
