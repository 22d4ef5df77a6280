// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::measurement::Strategy;
use crate::utils::clock::format_date;
use chrono::NaiveDate;
use serde_json::{json, Number, Value};

/// 文件输出时的列头，顺序固定
pub const RESULT_COLUMNS: [&str; 15] = [
    "date",
    "locale",
    "strategy",
    "url",
    "this/origin",
    "performance",
    "accessibility",
    "best_practices",
    "seo",
    "cls",
    "ttfb(ms)",
    "fcp(ms)",
    "fid(ms)",
    "inp(ms)",
    "lcp(ms)",
];

/// 结果所属范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// 该URL自身的实测数据（`loadingExperience`）
    ThisUrl,
    /// 整个源站的实测数据（`originLoadingExperience`）
    Origin,
}

impl Scope {
    /// 输出中使用的标签
    pub fn label(&self) -> &'static str {
        match self {
            Scope::ThisUrl => "this url",
            Scope::Origin => "origin",
        }
    }

    /// API 响应中对应的顶层字段
    pub fn section(&self) -> &'static str {
        match self {
            Scope::ThisUrl => "loadingExperience",
            Scope::Origin => "originLoadingExperience",
        }
    }
}

/// 实测指标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldMetric {
    Cls,
    Ttfb,
    Fcp,
    Fid,
    Inp,
    Lcp,
}

impl FieldMetric {
    /// 结果列顺序
    pub const ALL: [FieldMetric; 6] = [
        FieldMetric::Cls,
        FieldMetric::Ttfb,
        FieldMetric::Fcp,
        FieldMetric::Fid,
        FieldMetric::Inp,
        FieldMetric::Lcp,
    ];

    /// `metrics` 下的键名
    pub fn api_key(&self) -> &'static str {
        match self {
            FieldMetric::Cls => "CUMULATIVE_LAYOUT_SHIFT_SCORE",
            FieldMetric::Ttfb => "EXPERIMENTAL_TIME_TO_FIRST_BYTE",
            FieldMetric::Fcp => "FIRST_CONTENTFUL_PAINT_MS",
            FieldMetric::Fid => "FIRST_INPUT_DELAY_MS",
            FieldMetric::Inp => "INTERACTION_TO_NEXT_PAINT",
            FieldMetric::Lcp => "LARGEST_CONTENTFUL_PAINT_MS",
        }
    }

    /// 数据仓库中的列名
    pub fn column(&self) -> &'static str {
        match self {
            FieldMetric::Cls => "cls",
            FieldMetric::Ttfb => "ttfb",
            FieldMetric::Fcp => "fcp",
            FieldMetric::Fid => "fid",
            FieldMetric::Inp => "inp",
            FieldMetric::Lcp => "lcp",
        }
    }
}

/// Lighthouse 分类得分，统一以 0-100 的整数百分比保存
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryScores {
    pub performance: Option<i64>,
    pub accessibility: Option<i64>,
    pub best_practices: Option<i64>,
    pub seo: Option<i64>,
}

impl CategoryScores {
    fn as_array(&self) -> [Option<i64>; 4] {
        [
            self.performance,
            self.accessibility,
            self.best_practices,
            self.seo,
        ]
    }
}

/// 六项实测指标的 percentile 值，原样保留 JSON 数字
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMetrics {
    pub cls: Option<Number>,
    pub ttfb: Option<Number>,
    pub fcp: Option<Number>,
    pub fid: Option<Number>,
    pub inp: Option<Number>,
    pub lcp: Option<Number>,
}

impl FieldMetrics {
    pub fn get(&self, metric: FieldMetric) -> Option<&Number> {
        match metric {
            FieldMetric::Cls => self.cls.as_ref(),
            FieldMetric::Ttfb => self.ttfb.as_ref(),
            FieldMetric::Fcp => self.fcp.as_ref(),
            FieldMetric::Fid => self.fid.as_ref(),
            FieldMetric::Inp => self.inp.as_ref(),
            FieldMetric::Lcp => self.lcp.as_ref(),
        }
    }

    pub fn set(&mut self, metric: FieldMetric, value: Option<Number>) {
        let slot = match metric {
            FieldMetric::Cls => &mut self.cls,
            FieldMetric::Ttfb => &mut self.ttfb,
            FieldMetric::Fcp => &mut self.fcp,
            FieldMetric::Fid => &mut self.fid,
            FieldMetric::Inp => &mut self.inp,
            FieldMetric::Lcp => &mut self.lcp,
        };
        *slot = value;
    }
}

/// 一行计测结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub date: NaiveDate,
    pub locale: String,
    pub strategy: Strategy,
    pub url: String,
    pub scope: Scope,
    pub scores: CategoryScores,
    pub metrics: FieldMetrics,
}

impl ResultRow {
    /// 转换为 CSV 记录，缺失值输出为空字符串
    pub fn to_record(&self) -> Vec<String> {
        let mut record = vec![
            format_date(self.date),
            self.locale.clone(),
            self.strategy.as_str().to_string(),
            self.url.clone(),
            self.scope.label().to_string(),
        ];
        record.extend(
            self.scores
                .as_array()
                .iter()
                .map(|s| s.map(|v| v.to_string()).unwrap_or_default()),
        );
        record.extend(FieldMetric::ALL.iter().map(|m| {
            self.metrics
                .get(*m)
                .map(|n| n.to_string())
                .unwrap_or_default()
        }));
        record
    }

    /// 转换为数据仓库的一行 JSON，缺失值为 `null`
    pub fn to_warehouse_json(&self) -> Value {
        let mut row = json!({
            "date": format_date(self.date),
            "locale": self.locale,
            "strategy": self.strategy.as_str(),
            "url": self.url,
            "thisurl_origin": self.scope.label(),
            "performance": self.scores.performance,
            "accessibility": self.scores.accessibility,
            "best_practices": self.scores.best_practices,
            "seo": self.scores.seo,
        });
        if let Some(obj) = row.as_object_mut() {
            for metric in FieldMetric::ALL {
                let value = self
                    .metrics
                    .get(metric)
                    .and_then(number_as_integer)
                    .map(Value::from)
                    .unwrap_or(Value::Null);
                obj.insert(metric.column().to_string(), value);
            }
        }
        row
    }
}

/// INT64 列使用的整数值，小数部分截断
fn number_as_integer(n: &Number) -> Option<i64> {
    n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64))
}

/// 计测结果表
///
/// 只追加，不做唯一性约束。列头由调用方指定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<ResultRow>,
}

impl Default for ResultTable {
    fn default() -> Self {
        Self::new(RESULT_COLUMNS.iter().map(|c| c.to_string()).collect())
    }
}

impl ResultTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// 追加一次成功调用产生的两行
    pub fn push_pair(&mut self, pair: (ResultRow, ResultRow)) {
        self.rows.push(pair.0);
        self.rows.push(pair.1);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
