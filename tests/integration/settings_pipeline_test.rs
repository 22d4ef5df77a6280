// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{endpoint, mount_success};
use psirs::application::use_cases::measurement_use_case::{MeasurementPlan, MeasurementUseCase};
use psirs::config::settings::Settings;
use psirs::domain::repositories::result_sink::ResultSink;
use psirs::domain::services::response_transformer::ResponseTransformer;
use psirs::engines::pagespeed_engine::PageSpeedEngine;
use psirs::infrastructure::storage::{create_archive, create_sink};
use psirs::utils::clock::{format_date, today};
use std::path::Path;
use std::sync::Arc;
use wiremock::MockServer;

fn settings_for(server: &MockServer, dir: &Path, archive: bool) -> Settings {
    let csv_path = dir.join("urls.csv");
    std::fs::write(&csv_path, "measurement_url\nhttps://csv.example.com/\n").unwrap();

    let config = Settings::defaults()
        .unwrap()
        .set_override("api.endpoint", endpoint(server))
        .unwrap()
        .set_override("api.key", "test-key")
        .unwrap()
        .set_override("measurement.strategies", vec!["desktop"])
        .unwrap()
        .set_override("targets.urls", vec!["https://inline.example.com/"])
        .unwrap()
        .set_override("targets.csv_path", csv_path.to_string_lossy().to_string())
        .unwrap()
        .set_override("output.data_dir", dir.join("data").to_string_lossy().to_string())
        .unwrap()
        .set_override("output.archive_raw_responses", archive)
        .unwrap()
        .build()
        .unwrap();
    Settings::from_config(config).unwrap()
}

#[tokio::test]
async fn test_settings_drive_a_csv_run() {
    let server = MockServer::start().await;
    mount_success(&server, "https://inline.example.com/", 0.7).await;
    mount_success(&server, "https://csv.example.com/", 0.6).await;

    let dir = tempfile::tempdir().unwrap();
    let settings = settings_for(&server, dir.path(), true);
    let date = today();

    let targets = settings.load_targets().unwrap();
    assert_eq!(targets, vec!["https://inline.example.com/", "https://csv.example.com/"]);

    let sink: Arc<dyn ResultSink> = Arc::from(create_sink(&settings, date).unwrap());
    assert_eq!(sink.name(), "csv");

    let plan = MeasurementPlan::new(
        settings.measurement.locale.clone(),
        settings.measurement.strategies.clone(),
        targets,
    );
    let report = MeasurementUseCase::new(
        Arc::new(PageSpeedEngine::from_settings(&settings.api).unwrap()),
        sink,
        ResponseTransformer::new(date),
        plan,
    )
    .with_archive(create_archive(&settings, date))
    .run()
    .await
    .unwrap();

    assert_eq!(report.rows, 4);
    let expected = dir
        .path()
        .join("data")
        .join(format!("{}_result.csv", format_date(date)));
    assert_eq!(Path::new(&report.destination), expected);

    let raw_files = std::fs::read_dir(dir.path().join("data").join("raw"))
        .unwrap()
        .count();
    assert_eq!(raw_files, 2);
}

#[tokio::test]
async fn test_archive_disabled_by_default() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_for(&server, dir.path(), false);

    assert!(create_archive(&settings, today()).is_none());
}
