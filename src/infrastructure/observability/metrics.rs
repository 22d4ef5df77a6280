// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::measurement::Strategy;
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Duration;

/// 单次请求的耗时
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTiming {
    /// 发出请求到收到响应头
    pub connect: Duration,
    /// 读取响应体
    pub read: Duration,
    /// 合计
    pub total: Duration,
}

/// 注册指标描述
///
/// 不安装 exporter，没有 recorder 时所有记录都是空操作。
pub fn describe_metrics() {
    describe_histogram!(
        "psi_request_connect_seconds",
        Unit::Seconds,
        "Time until response headers arrived"
    );
    describe_histogram!(
        "psi_request_read_seconds",
        Unit::Seconds,
        "Time spent reading the response body"
    );
    describe_histogram!(
        "psi_request_total_seconds",
        Unit::Seconds,
        "Total time of a PageSpeed Insights request"
    );
    describe_counter!("psi_requests_total", "PageSpeed Insights requests by outcome");
    describe_counter!("psi_rows_total", "Result rows produced");
}

/// 记录一次成功请求的耗时
pub fn record_request_timing(strategy: Strategy, timing: &RequestTiming) {
    let strategy = strategy.as_str();
    histogram!("psi_request_connect_seconds", "strategy" => strategy)
        .record(timing.connect.as_secs_f64());
    histogram!("psi_request_read_seconds", "strategy" => strategy)
        .record(timing.read.as_secs_f64());
    histogram!("psi_request_total_seconds", "strategy" => strategy)
        .record(timing.total.as_secs_f64());
    counter!("psi_requests_total", "strategy" => strategy, "outcome" => "success").increment(1);
}

/// 记录一次失败请求
pub fn record_request_failure(strategy: Strategy) {
    counter!("psi_requests_total", "strategy" => strategy.as_str(), "outcome" => "failure")
        .increment(1);
}

/// 记录生成的结果行数
pub fn record_rows(count: usize) {
    counter!("psi_rows_total").increment(count as u64);
}
