// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含与外部系统交互的实现：
/// - BigQuery（bigquery）：通过 REST 加载作业追加结果
/// - 可观测性（observability）：请求耗时与结果行数指标
/// - 存储（storage）：本地 CSV 输出与原始响应存档
///
/// 基础设施层依赖于领域层的抽象接口。
pub mod bigquery;
pub mod observability;
pub mod storage;
