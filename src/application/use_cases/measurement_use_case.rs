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

use crate::{
    domain::{
        models::{
            measurement::{MeasurementRequest, Strategy},
            result_row::ResultTable,
        },
        repositories::result_sink::{ResultSink, SinkError},
        services::response_transformer::ResponseTransformer,
    },
    engines::traits::PageSpeedClient,
    infrastructure::{observability::metrics::record_rows, storage::RawResponseArchive},
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// 计测计划
///
/// 策略 × URL 的全部组合，按策略优先的顺序展开。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementPlan {
    pub locale: String,
    pub strategies: Vec<Strategy>,
    pub targets: Vec<String>,
}

impl MeasurementPlan {
    pub fn new(locale: impl Into<String>, strategies: Vec<Strategy>, targets: Vec<String>) -> Self {
        Self {
            locale: locale.into(),
            strategies,
            targets,
        }
    }

    /// 展开为请求列表
    pub fn requests(&self) -> impl Iterator<Item = MeasurementRequest> + '_ {
        self.strategies.iter().flat_map(move |strategy| {
            self.targets
                .iter()
                .map(move |url| MeasurementRequest::new(url.clone(), *strategy, self.locale.clone()))
        })
    }

    pub fn len(&self) -> usize {
        self.strategies.len() * self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 一次运行的汇总
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// 发起的请求数
    pub attempted: usize,
    /// 成功的请求数
    pub succeeded: usize,
    /// 失败被跳过的请求数
    pub failed: usize,
    /// 写出的行数
    pub rows: usize,
    /// 输出目的地
    pub destination: String,
}

/// 计测用例
///
/// 顺序执行全部请求：成功的响应转换为两行追加到结果表，失败的请求只记录日志后跳过。
/// 最后把结果表一次性交给输出。
pub struct MeasurementUseCase<C: ?Sized, S: ?Sized> {
    client: Arc<C>,
    sink: Arc<S>,
    transformer: ResponseTransformer,
    plan: MeasurementPlan,
    archive: Option<RawResponseArchive>,
}

impl<C, S> MeasurementUseCase<C, S>
where
    C: PageSpeedClient + ?Sized,
    S: ResultSink + ?Sized,
{
    pub fn new(
        client: Arc<C>,
        sink: Arc<S>,
        transformer: ResponseTransformer,
        plan: MeasurementPlan,
    ) -> Self {
        Self {
            client,
            sink,
            transformer,
            plan,
            archive: None,
        }
    }

    /// 启用原始响应存档
    pub fn with_archive(mut self, archive: Option<RawResponseArchive>) -> Self {
        self.archive = archive;
        self
    }

    /// 执行全部请求并累积结果表
    ///
    /// # 返回值
    ///
    /// `(结果表, 成功数, 失败数)`
    pub async fn collect(&self) -> (ResultTable, usize, usize) {
        let mut table = ResultTable::default();
        let mut succeeded = 0;
        let mut failed = 0;

        for request in self.plan.requests() {
            let Some(payload) = self.client.fetch(&request).await else {
                warn!(
                    url = %request.target_url,
                    strategy = %request.strategy,
                    "Skipping measurement without a result"
                );
                failed += 1;
                continue;
            };

            if let Some(archive) = &self.archive {
                if let Err(e) = archive.save(&request, &payload).await {
                    warn!(url = %request.target_url, "Failed to archive raw response: {}", e);
                }
            }

            table.push_pair(self.transformer.transform(&payload, &request));
            succeeded += 1;
        }

        (table, succeeded, failed)
    }

    /// 执行一次完整的计测并写出结果
    ///
    /// # 返回值
    ///
    /// * `Ok(RunReport)` - 运行汇总
    /// * `Err(SinkError)` - 输出失败，已写入的历史数据不受影响
    pub async fn run(&self) -> Result<RunReport, SinkError> {
        info!(
            client = self.client.name(),
            sink = self.sink.name(),
            requests = self.plan.len(),
            "Starting measurement run"
        );

        let (table, succeeded, failed) = self.collect().await;
        record_rows(table.len());

        let destination = match self.sink.write_rows(&table).await {
            Ok(destination) => destination,
            Err(e) => {
                error!(sink = self.sink.name(), rows = table.len(), "Failed to write results: {}", e);
                return Err(e);
            }
        };

        let report = RunReport {
            attempted: succeeded + failed,
            succeeded,
            failed,
            rows: table.len(),
            destination,
        };
        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            rows = report.rows,
            destination = %report.destination,
            "Measurement run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "measurement_use_case_test.rs"]
mod tests;
