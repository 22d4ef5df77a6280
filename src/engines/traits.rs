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

use crate::domain::models::measurement::MeasurementRequest;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// HTTP 状态码错误
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    /// 响应不是合法 JSON
    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl EngineError {
    /// 错误分类，用于日志
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::RequestFailed(e) if e.is_timeout() => "timeout",
            EngineError::RequestFailed(e) if e.is_connect() => "connect",
            EngineError::RequestFailed(e) if e.is_status() => "http_status",
            EngineError::RequestFailed(e) if e.is_decode() || e.is_body() => "decode",
            EngineError::RequestFailed(_) => "request",
            EngineError::Timeout => "timeout",
            EngineError::Status { .. } => "http_status",
            EngineError::InvalidJson(_) => "decode",
            EngineError::Other(_) => "other",
        }
    }
}

/// PageSpeed Insights 客户端特质
#[async_trait]
pub trait PageSpeedClient: Send + Sync {
    /// 执行一次计测，最多一次尝试，不重试
    async fn run_pagespeed(&self, request: &MeasurementRequest) -> Result<Value, EngineError>;

    /// 执行计测，失败时记录日志并返回 `None`
    async fn fetch(&self, request: &MeasurementRequest) -> Option<Value> {
        match self.run_pagespeed(request).await {
            Ok(payload) => Some(payload),
            Err(e) => {
                error!(
                    url = %request.target_url,
                    strategy = %request.strategy,
                    kind = e.kind(),
                    "Error on get data from API: {}",
                    e
                );
                None
            }
        }
    }

    /// 客户端名称
    fn name(&self) -> &'static str;
}
