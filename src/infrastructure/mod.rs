// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含的子模块：
/// - 取消注册表（cancel_registry）：任务ID到取消标志的映射
/// - 指标（metrics）：抓取与批次指标
pub mod cancel_registry;
pub mod metrics;
