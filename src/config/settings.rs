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

use crate::domain::models::measurement::Strategy;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;
use validator::Validate;

/// 默认的环境文件位置
pub const DEFAULT_ENV_FILE: &str = "env/.env";

/// 计测目标 CSV 中的列名
pub const MEASUREMENT_URL_COLUMN: &str = "measurement_url";

/// 配置错误类型
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Target list error: {0}")]
    Targets(String),
    #[error("Invalid measurement url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 应用程序配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    /// PageSpeed Insights API 配置
    #[validate(nested)]
    pub api: ApiSettings,
    /// 计测参数
    #[validate(nested)]
    pub measurement: MeasurementSettings,
    /// 计测目标
    pub targets: TargetSettings,
    /// 输出配置
    pub output: OutputSettings,
    /// BigQuery 配置
    pub bigquery: BigQuerySettings,
    /// 日志配置
    pub logging: LoggingSettings,
}

/// API 配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApiSettings {
    /// API 地址
    #[validate(url)]
    pub endpoint: String,
    /// API key
    pub key: String,
    /// 连接超时时间（秒）
    #[validate(range(min = 1))]
    pub connect_timeout_secs: u64,
    /// 读取超时时间（秒）
    #[validate(range(min = 1))]
    pub read_timeout_secs: u64,
}

/// 计测参数设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MeasurementSettings {
    /// 结果语言
    #[validate(length(min = 1))]
    pub locale: String,
    /// 计测策略，按顺序执行
    #[serde(default = "default_strategies")]
    #[validate(length(min = 1))]
    pub strategies: Vec<Strategy>,
}

// Arrays are kept out of `set_default` so that a configured list replaces
// the default instead of being merged into it index by index.
fn default_strategies() -> Vec<Strategy> {
    Strategy::ALL.to_vec()
}

/// 计测目标设置
#[derive(Debug, Clone, Deserialize)]
pub struct TargetSettings {
    /// 包含 `measurement_url` 列的 CSV 文件
    pub csv_path: String,
    /// 直接配置的URL
    #[serde(default)]
    pub urls: Vec<String>,
}

/// 输出方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// 本地 CSV 文件
    Csv,
    /// BigQuery 表
    Bigquery,
}

/// 输出配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    /// 输出方式
    pub sink: SinkKind,
    /// 数据目录
    pub data_dir: String,
    /// 是否保存原始响应
    pub archive_raw_responses: bool,
}

/// BigQuery 配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BigQuerySettings {
    /// 项目ID，未设置时从元数据服务器获取
    pub project_id: Option<String>,
    /// 数据集
    pub dataset_id: Option<String>,
    /// 表
    pub table_id: Option<String>,
    /// 访问令牌，未设置时从元数据服务器获取
    pub access_token: Option<String>,
    /// BigQuery REST API 地址
    pub api_base: String,
    /// GCE 元数据服务器地址
    pub metadata_base: String,
    /// 作业位置
    pub location: Option<String>,
    /// 作业状态轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 最大轮询次数
    pub max_polls: u32,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// 日志目录
    pub directory: String,
    /// 日志级别（EnvFilter 语法）
    pub level: String,
    /// 是否同时输出到终端
    pub console: bool,
}

impl Settings {
    /// 带默认值的配置构建器
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default(
                "api.endpoint",
                "https://www.googleapis.com/pagespeedonline/v5/runPagespeed",
            )?
            .set_default("api.key", "")?
            .set_default("api.connect_timeout_secs", 60)?
            .set_default("api.read_timeout_secs", 30)?
            .set_default("measurement.locale", "ja")?
            .set_default("targets.csv_path", "env/measurement_urls.csv")?
            .set_default("output.sink", "csv")?
            .set_default("output.data_dir", "data")?
            .set_default("output.archive_raw_responses", false)?
            .set_default("bigquery.api_base", "https://bigquery.googleapis.com")?
            .set_default("bigquery.metadata_base", "http://metadata.google.internal")?
            .set_default("bigquery.poll_interval_ms", 1000)?
            .set_default("bigquery.max_polls", 120)?
            .set_default("logging.directory", "logs")?
            .set_default("logging.level", "info")?
            .set_default("logging.console", true)
    }

    /// 加载配置
    ///
    /// 先读取环境文件，然后按 默认值 < 配置文件 < `PSI__*` 环境变量 < 旧版环境变量 的顺序合并。
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(SettingsError)` - 配置加载或校验失败
    pub fn load() -> Result<Self, SettingsError> {
        load_env_file();

        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("PSI")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("measurement.strategies")
                    .with_list_parse_key("targets.urls"),
            )
            .set_override_option("api.endpoint", legacy_var("API_URL"))?
            .set_override_option("api.key", legacy_var("API_KEY"))?
            .set_override_option("bigquery.dataset_id", legacy_var("DATASET_ID"))?
            .set_override_option("bigquery.table_id", legacy_var("TABLE_ID"))?
            .set_override_option(
                "targets.urls",
                legacy_var("MEASUREMENT_URL").map(|v| split_list(&v)),
            )?;

        Self::from_config(builder.build()?)
    }

    /// 从已构建的配置反序列化并校验
    pub fn from_config(config: Config) -> Result<Self, SettingsError> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;

        if settings.output.sink == SinkKind::Bigquery
            && (is_blank(&settings.bigquery.dataset_id) || is_blank(&settings.bigquery.table_id))
        {
            return Err(SettingsError::Invalid(
                "bigquery sink requires bigquery.dataset_id and bigquery.table_id".to_string(),
            ));
        }

        Ok(settings)
    }

    /// 读取计测目标列表
    ///
    /// 先是直接配置的URL，然后是 CSV 中的URL，保持顺序且不去重。
    /// CSV 文件不存在时，只要有直接配置的URL就不算错误。
    pub fn load_targets(&self) -> Result<Vec<String>, SettingsError> {
        let mut targets: Vec<String> = self
            .targets
            .urls
            .iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();

        let csv_path = Path::new(&self.targets.csv_path);
        if csv_path.exists() {
            targets.extend(read_target_csv(csv_path)?);
        } else if targets.is_empty() {
            return Err(SettingsError::Targets(format!(
                "no measurement urls configured and {} does not exist",
                csv_path.display()
            )));
        } else {
            warn!(path = %csv_path.display(), "Target CSV not found, using configured urls only");
        }

        for target in &targets {
            validate_target_url(target)?;
        }
        debug!(count = targets.len(), "Measurement targets loaded");
        Ok(targets)
    }
}

/// 读取环境文件，文件不存在时忽略
///
/// 路径可通过 `PSI_ENV_FILE` 指定。已存在的环境变量不会被覆盖。
pub fn load_env_file() -> Option<PathBuf> {
    let path = std::env::var("PSI_ENV_FILE").unwrap_or_else(|_| DEFAULT_ENV_FILE.to_string());
    let path = PathBuf::from(path);
    if !path.exists() {
        return None;
    }
    match dotenvy::from_path(&path) {
        Ok(()) => Some(path),
        Err(e) => {
            // Logging is not configured yet at this point
            eprintln!("Failed to load env file {}: {}", path.display(), e);
            None
        }
    }
}

/// 读取 CSV 的 `measurement_url` 列
pub fn read_target_csv(path: &Path) -> Result<Vec<String>, SettingsError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)?;

    let column = reader
        .headers()?
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == MEASUREMENT_URL_COLUMN)
        .ok_or_else(|| {
            SettingsError::Targets(format!(
                "{} has no {} column",
                path.display(),
                MEASUREMENT_URL_COLUMN
            ))
        })?;

    let mut urls = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(value) = record.get(column).filter(|v| !v.is_empty()) {
            urls.push(value.to_string());
        }
    }
    Ok(urls)
}

fn validate_target_url(raw: &str) -> Result<(), SettingsError> {
    let parsed = Url::parse(raw).map_err(|e| SettingsError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(SettingsError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {}", other),
        }),
    }
}

fn legacy_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or_default().is_empty()
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
