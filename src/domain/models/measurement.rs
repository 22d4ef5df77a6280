// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 计测策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// 移动端
    Mobile,
    /// 桌面端
    Desktop,
}

impl Strategy {
    /// 默认的计测顺序
    pub const ALL: [Strategy; 2] = [Strategy::Mobile, Strategy::Desktop];

    /// API 参数值
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Mobile => "mobile",
            Strategy::Desktop => "desktop",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mobile" => Ok(Strategy::Mobile),
            "desktop" => Ok(Strategy::Desktop),
            other => Err(format!("Unknown strategy: {}", other)),
        }
    }
}

/// Lighthouse 分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Performance,
    Accessibility,
    BestPractices,
    Seo,
}

impl Category {
    /// 请求的全部分类，同时也是结果列的顺序
    pub const ALL: [Category; 4] = [
        Category::Performance,
        Category::Accessibility,
        Category::BestPractices,
        Category::Seo,
    ];

    /// API 中使用的分类名
    pub fn api_name(&self) -> &'static str {
        match self {
            Category::Performance => "performance",
            Category::Accessibility => "accessibility",
            Category::BestPractices => "best-practices",
            Category::Seo => "seo",
        }
    }
}

/// 单次计测请求
///
/// 由 目标URL × 策略 组合生成，只使用一次。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementRequest {
    /// 计测目标URL
    pub target_url: String,
    /// 计测策略
    pub strategy: Strategy,
    /// 结果语言
    pub locale: String,
}

impl MeasurementRequest {
    pub fn new(target_url: impl Into<String>, strategy: Strategy, locale: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            strategy,
            locale: locale.into(),
        }
    }

    /// 生成 API 查询参数
    ///
    /// `category` 对每个分类重复出现。API key 由调用方追加。
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("url", self.target_url.clone()),
            ("locale", self.locale.clone()),
            ("strategy", self.strategy.as_str().to_string()),
        ];
        pairs.extend(
            Category::ALL
                .iter()
                .map(|c| ("category", c.api_name().to_string())),
        );
        pairs
    }
}
