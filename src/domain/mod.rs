// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含计测的核心逻辑：
/// - 领域模型（models）：计测请求、结果行与结果表
/// - 仓库接口（repositories）：结果输出的抽象接口
/// - 服务（services）：响应到结果行的转换规则
///
/// 领域层不依赖任何外部实现。
pub mod models;
pub mod repositories;
pub mod services;
