// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 提取服务（extraction_service）：提取器特质与基于规则的提取器
/// - 字段归一化（field_normalizer）：同义字段名映射为规范字段名
/// - LLM提取器（llm_extractor）：通过大语言模型提取字段
/// - LLM服务（llm_service）：OpenAI兼容接口客户端
/// - 质量评分（quality_scorer）：候选记录评分与最佳候选选择
pub mod extraction_service;
pub mod field_normalizer;
pub mod llm_extractor;
pub mod llm_service;
pub mod quality_scorer;
