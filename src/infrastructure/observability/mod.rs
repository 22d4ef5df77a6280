// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 可观测性模块
///
/// 提供请求耗时和结果行数的指标记录
pub mod metrics;
