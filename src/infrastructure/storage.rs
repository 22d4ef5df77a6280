// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::settings::{Settings, SinkKind};
use crate::domain::models::measurement::MeasurementRequest;
use crate::domain::models::result_row::ResultTable;
use crate::domain::repositories::result_sink::{ResultSink, SinkError};
use crate::infrastructure::bigquery::BigQuerySink;
use crate::utils::clock::format_date;
use crate::utils::folder::{create_folder, sanitize_file_component};

/// 本地 CSV 文件输出
///
/// 写入 `<data_dir>/<YYYY-MM-DD>_result.csv`，同一天重复运行时覆盖。
pub struct CsvFileSink {
    data_dir: PathBuf,
    date: NaiveDate,
}

impl CsvFileSink {
    pub fn new(data_dir: impl Into<PathBuf>, date: NaiveDate) -> Self {
        Self {
            data_dir: data_dir.into(),
            date,
        }
    }

    /// 输出文件路径
    pub fn output_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}_result.csv", format_date(self.date)))
    }
}

/// 将结果表编码为 CSV，列头在第一行，不输出索引列
pub fn encode_csv(table: &ResultTable) -> Result<Vec<u8>, SinkError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.to_record())?;
    }
    writer
        .into_inner()
        .map_err(|e| SinkError::Io(e.into_error()))
}

#[async_trait]
impl ResultSink for CsvFileSink {
    async fn write_rows(&self, table: &ResultTable) -> Result<String, SinkError> {
        // 确保目录存在
        create_folder(&self.data_dir).await?;

        let data = encode_csv(table)?;
        let path = self.output_path();
        fs::write(&path, data).await?;

        info!(path = %path.display(), rows = table.len(), "Result CSV written");
        Ok(path.to_string_lossy().to_string())
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

/// 原始响应存档
///
/// 每次成功调用的完整 JSON 保存为 `<dir>/<date>_<strategy>_<url>.json`。
pub struct RawResponseArchive {
    dir: PathBuf,
    date: NaiveDate,
}

impl RawResponseArchive {
    pub fn new(dir: impl Into<PathBuf>, date: NaiveDate) -> Self {
        Self {
            dir: dir.into(),
            date,
        }
    }

    /// 保存一次响应，返回文件路径
    pub async fn save(
        &self,
        request: &MeasurementRequest,
        payload: &Value,
    ) -> Result<PathBuf, SinkError> {
        create_folder(&self.dir).await?;

        let file_name = format!(
            "{}_{}_{}.json",
            format_date(self.date),
            request.strategy.as_str(),
            sanitize_file_component(&request.target_url)
        );
        let path = self.dir.join(file_name);
        let data = serde_json::to_vec(payload).map_err(|e| SinkError::Other(e.to_string()))?;
        fs::write(&path, data).await?;
        Ok(path)
    }
}

/// 输出工厂函数
pub fn create_sink(
    settings: &Settings,
    date: NaiveDate,
) -> Result<Box<dyn ResultSink>, SinkError> {
    match settings.output.sink {
        SinkKind::Csv => Ok(Box::new(CsvFileSink::new(&settings.output.data_dir, date))),
        SinkKind::Bigquery => Ok(Box::new(BigQuerySink::from_settings(&settings.bigquery)?)),
    }
}

/// 根据配置创建原始响应存档，未启用时返回 `None`
pub fn create_archive(settings: &Settings, date: NaiveDate) -> Option<RawResponseArchive> {
    settings
        .output
        .archive_raw_responses
        .then(|| RawResponseArchive::new(Path::new(&settings.output.data_dir).join("raw"), date))
}

/// 测试用的内存输出实现（用于单元测试）
#[derive(Clone, Default)]
pub struct InMemorySink {
    tables: Arc<RwLock<Vec<ResultTable>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已写入的全部结果表
    pub async fn tables(&self) -> Vec<ResultTable> {
        self.tables.read().await.clone()
    }
}

#[async_trait]
impl ResultSink for InMemorySink {
    async fn write_rows(&self, table: &ResultTable) -> Result<String, SinkError> {
        let mut tables = self.tables.write().await;
        tables.push(table.clone());
        Ok(format!("memory#{}", tables.len()))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
