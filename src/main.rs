// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Context;
use chrono::NaiveDate;
use psirs::application::use_cases::measurement_use_case::{
    MeasurementPlan, MeasurementUseCase, RunReport,
};
use psirs::config::settings::Settings;
use psirs::domain::repositories::result_sink::ResultSink;
use psirs::domain::services::response_transformer::ResponseTransformer;
use psirs::engines::pagespeed_engine::PageSpeedEngine;
use psirs::infrastructure::observability::metrics::describe_metrics;
use psirs::infrastructure::storage::{create_archive, create_sink};
use psirs::utils::{clock, telemetry};
use std::sync::Arc;
use tracing::instrument::WithSubscriber;
use tracing::{error, info};

/// 主函数
///
/// 读取配置，构建日志，然后执行一次完整的计测。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Settings::load().context("failed to load configuration")?;

    // 2. Initialize logging
    let today = clock::today();
    let telemetry = telemetry::build(&settings.logging, today)
        .context("failed to initialize logging")?;
    let dispatch = telemetry.dispatch().clone();

    // 3. Run the measurement with the explicit dispatch
    let result = run(settings, today).with_subscriber(dispatch).await;

    if let Err(e) = &result {
        tracing::dispatcher::with_default(telemetry.dispatch(), || {
            error!("Measurement run failed: {:#}", e);
        });
    }
    result.map(|_| ())
}

async fn run(settings: Settings, today: NaiveDate) -> anyhow::Result<RunReport> {
    info!(date = %clock::format_date(today), "Starting psirs...");
    describe_metrics();

    let targets = settings.load_targets()?;
    info!(count = targets.len(), "Measurement targets loaded");

    let client = Arc::new(PageSpeedEngine::from_settings(&settings.api)?);
    let sink: Arc<dyn ResultSink> = Arc::from(create_sink(&settings, today)?);
    let plan = MeasurementPlan::new(
        settings.measurement.locale.clone(),
        settings.measurement.strategies.clone(),
        targets,
    );

    let use_case = MeasurementUseCase::new(client, sink, ResponseTransformer::new(today), plan)
        .with_archive(create_archive(&settings, today));

    let report = use_case.run().await?;
    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        destination = %report.destination,
        "Done"
    );
    Ok(report)
}
