// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 取消令牌（cancel_token）：协作式取消的共享标志与谓词
/// - 候选记录（candidate）：单次提取尝试的结果及其评分
/// - 抓取结果（scrape_result）：每个URL的终止状态与批次统计
pub mod cancel_token;
pub mod candidate;
pub mod scrape_result;
