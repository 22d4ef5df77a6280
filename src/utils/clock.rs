// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{FixedOffset, NaiveDate, Utc};

/// 计测使用的时区偏移（JST, UTC+9）
pub const MEASUREMENT_UTC_OFFSET_SECS: i32 = 9 * 3600;

/// 获取计测时区下的今天日期
pub fn today() -> NaiveDate {
    let now = Utc::now();
    FixedOffset::east_opt(MEASUREMENT_UTC_OFFSET_SECS)
        .map(|offset| now.with_timezone(&offset).date_naive())
        .unwrap_or_else(|| now.date_naive())
}

/// 日期格式化为 `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
