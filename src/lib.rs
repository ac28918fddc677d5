// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含抓取流水线用例与任务配置
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含取消令牌、候选记录、字段归一化、质量评分与提取器
pub mod domain;

/// 引擎模块
///
/// 传输层抽象、reqwest实现与有界并发抓取器
pub mod engines;

/// 基础设施模块
///
/// 任务取消注册表与指标
pub mod infrastructure;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;
