// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
/// 包括日期、目录、JSON 取值与日志初始化
pub mod clock;
pub mod folder;
pub mod json_path;
pub mod telemetry;
