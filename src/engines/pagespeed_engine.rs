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

use crate::config::settings::ApiSettings;
use crate::domain::models::measurement::MeasurementRequest;
use crate::engines::traits::{EngineError, PageSpeedClient};
use crate::infrastructure::observability::metrics::{
    record_request_failure, record_request_timing, RequestTiming,
};
use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// 错误响应体在错误信息中保留的最大长度
const MAX_ERROR_BODY_CHARS: usize = 512;

/// PageSpeed Insights 引擎
///
/// 基于reqwest实现，每个 (策略, URL) 只发起一次 GET 请求。
pub struct PageSpeedEngine {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl PageSpeedEngine {
    /// 创建新的引擎实例
    ///
    /// # 参数
    ///
    /// * `endpoint` - API 地址
    /// * `api_key` - API key
    /// * `connect_timeout` - 连接超时
    /// * `read_timeout` - 读取超时
    ///
    /// # 返回值
    ///
    /// * `Ok(PageSpeedEngine)` - 引擎实例
    /// * `Err(EngineError)` - HTTP 客户端构建失败
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("psirs/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    /// 根据配置创建引擎
    pub fn from_settings(settings: &ApiSettings) -> Result<Self, EngineError> {
        Self::new(
            settings.endpoint.clone(),
            settings.key.clone(),
            Duration::from_secs(settings.connect_timeout_secs),
            Duration::from_secs(settings.read_timeout_secs),
        )
    }

    fn map_transport_error(e: reqwest::Error) -> EngineError {
        if e.is_timeout() {
            EngineError::Timeout
        } else {
            // the request url carries the api key
            EngineError::RequestFailed(e.without_url())
        }
    }
}

#[async_trait]
impl PageSpeedClient for PageSpeedEngine {
    async fn run_pagespeed(&self, request: &MeasurementRequest) -> Result<Value, EngineError> {
        let mut query = request.query_pairs();
        query.push(("key", self.api_key.clone()));

        debug!(url = %request.target_url, strategy = %request.strategy, "Requesting PageSpeed Insights");

        let start = Instant::now();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                record_request_failure(request.strategy);
                Self::map_transport_error(e)
            })?;
        let connect = start.elapsed();

        let status = response.status();
        if !status.is_success() {
            record_request_failure(request.strategy);
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            record_request_failure(request.strategy);
            Self::map_transport_error(e)
        })?;
        let total = start.elapsed();

        let timing = RequestTiming {
            connect,
            read: total.saturating_sub(connect),
            total,
        };
        info!("Connect Time: {:.3}", timing.connect.as_secs_f64());
        info!("Read Time: {:.3}", timing.read.as_secs_f64());
        info!("Total Time: {:.3}", timing.total.as_secs_f64());

        let payload = serde_json::from_slice::<Value>(&body).map_err(|e| {
            record_request_failure(request.strategy);
            EngineError::InvalidJson(e.to_string())
        })?;

        record_request_timing(request.strategy, &timing);
        info!(url = %request.target_url, strategy = %request.strategy, "Request successful");
        Ok(payload)
    }

    fn name(&self) -> &'static str {
        "pagespeed"
    }
}

#[cfg(test)]
#[path = "pagespeed_engine_test.rs"]
mod tests;
