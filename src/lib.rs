// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含一次计测运行的用例
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含计测请求、结果行和输出接口
pub mod domain;

/// 引擎模块
///
/// 实现 PageSpeed Insights API 客户端
pub mod engines;

/// 基础设施模块
///
/// 提供外部服务集成，如 CSV 文件和 BigQuery
pub mod infrastructure;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;
