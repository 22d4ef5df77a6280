// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::result_row::ResultTable;
use async_trait::async_trait;
use thiserror::Error;

/// 输出错误类型
#[derive(Error, Debug)]
pub enum SinkError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// CSV 写入错误
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// HTTP 请求错误
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// 认证失败
    #[error("Authentication failed: {0}")]
    Auth(String),
    /// 加载作业失败
    #[error("Load job failed: {0}")]
    LoadJob(String),
    /// 其他错误
    #[error("Sink error: {0}")]
    Other(String),
}

/// 结果输出特质
///
/// 将累积的结果表写入某个目的地，返回目的地的描述（文件路径或表名）。
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// 写入全部结果行
    async fn write_rows(&self, table: &ResultTable) -> Result<String, SinkError>;

    /// 输出名称
    fn name(&self) -> &'static str;
}
