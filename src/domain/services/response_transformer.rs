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

use crate::domain::models::measurement::{Category, MeasurementRequest};
use crate::domain::models::result_row::{
    CategoryScores, FieldMetric, FieldMetrics, ResultRow, Scope,
};
use crate::utils::json_path::{lookup_f64, lookup_number};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::warn;

/// 响应转换服务
///
/// 从 PageSpeed Insights 的响应中提取分类得分和实测指标，
/// 每次调用生成 this url / origin 两行。任何字段缺失都只会变成空值，不会中断处理。
#[derive(Debug, Clone)]
pub struct ResponseTransformer {
    date: NaiveDate,
}

impl ResponseTransformer {
    /// 创建转换服务
    ///
    /// # 参数
    ///
    /// * `date` - 写入每一行的计测日期
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    /// 转换一次 API 响应
    ///
    /// # 参数
    ///
    /// * `payload` - API 返回的完整 JSON
    /// * `request` - 产生该响应的请求
    ///
    /// # 返回值
    ///
    /// `(this url 行, origin 行)`，两行只有范围和六项指标不同
    pub fn transform(&self, payload: &Value, request: &MeasurementRequest) -> (ResultRow, ResultRow) {
        let scores = extract_scores(payload, &request.target_url);

        let build = |scope: Scope| ResultRow {
            date: self.date,
            locale: request.locale.clone(),
            strategy: request.strategy,
            url: request.target_url.clone(),
            scope,
            scores,
            metrics: extract_metrics(payload, scope, &request.target_url),
        };

        (build(Scope::ThisUrl), build(Scope::Origin))
    }
}

/// 提取某个范围的六项实测指标
pub fn extract_metrics(payload: &Value, scope: Scope, url: &str) -> FieldMetrics {
    let mut metrics = FieldMetrics::default();
    for metric in FieldMetric::ALL {
        let value = lookup_number(
            payload,
            &[scope.section(), "metrics", metric.api_key(), "percentile"],
        )
        .cloned();
        if value.is_none() {
            warn!(
                url = %url,
                scope = scope.label(),
                metric = metric.api_key(),
                "Json has no value."
            );
        }
        metrics.set(metric, value);
    }
    metrics
}

/// 提取四个分类得分
pub fn extract_scores(payload: &Value, url: &str) -> CategoryScores {
    let mut scores = [None; 4];
    for (slot, category) in scores.iter_mut().zip(Category::ALL) {
        let raw = lookup_f64(
            payload,
            &["lighthouseResult", "categories", category.api_name(), "score"],
        );
        *slot = raw.map(scale_score);
        if slot.is_none() {
            warn!(url = %url, category = category.api_name(), "Category score is missing");
        }
    }
    let [performance, accessibility, best_practices, seo] = scores;
    CategoryScores {
        performance,
        accessibility,
        best_practices,
        seo,
    }
}

/// 将 0-1 的得分转换为整数百分比
///
/// 截断前加上极小值，避免 0.29 * 100 = 28.999... 这类二进制误差。
/// 因此结果与直接截断浮点数不同：`scale_score(0.29)` 为 29 而不是 28。
pub fn scale_score(score: f64) -> i64 {
    ((score * 100.0 + 1e-9).trunc() as i64).clamp(0, 100)
}

#[cfg(test)]
#[path = "response_transformer_test.rs"]
mod tests;
