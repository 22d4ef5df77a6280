// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::LoggingSettings;
use crate::utils::clock::format_date;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Dispatch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// 日志初始化错误
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to create log directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to open log file: {0}")]
    Appender(#[from] InitError),
}

/// 显式构造的日志实例
///
/// 持有 `Dispatch` 以及文件写入线程的 guard。guard 被 drop 时缓冲的日志会被刷新，
/// 所以该实例需要存活到程序结束。
pub struct Telemetry {
    dispatch: Dispatch,
    log_file: PathBuf,
    _guard: WorkerGuard,
}

impl Telemetry {
    /// 获取可以传递给协作者的 dispatch
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// 当天日志文件路径
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

/// 构建日志实例
///
/// 每天一个日志文件 `<directory>/<YYYY-MM-DD>_logfile.log`，同一天多次运行追加写入。
/// `RUST_LOG` 优先于配置中的日志级别。不会安装全局 subscriber。
pub fn build(settings: &LoggingSettings, date: NaiveDate) -> Result<Telemetry, TelemetryError> {
    std::fs::create_dir_all(&settings.directory)?;

    let prefix = format!("{}_logfile", format_date(date));
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(prefix.clone())
        .filename_suffix("log")
        .build(&settings.directory)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    let console_layer = settings.console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
    });

    let subscriber = Registry::default()
        .with(filter)
        .with(file_layer)
        .with(console_layer);

    Ok(Telemetry {
        dispatch: Dispatch::new(subscriber),
        log_file: Path::new(&settings.directory).join(format!("{}.log", prefix)),
        _guard: guard,
    })
}
