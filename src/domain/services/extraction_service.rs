// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

use crate::domain::models::candidate::CandidateRecord;
use crate::utils::text_processing::find_price;

/// 描述字段的最小长度
pub const DESCRIPTION_MIN_LENGTH: usize = 50;

/// 描述字段的最大长度
pub const DESCRIPTION_MAX_LENGTH: usize = 1000;

/// 提取错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// 提取器返回的候选记录不可用
    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),
    /// 提取服务本身调用失败（网络、鉴权等）
    #[error("Extraction provider error: {0}")]
    Provider(String),
}

impl ExtractError {
    pub fn category(&self) -> &'static str {
        match self {
            ExtractError::SchemaValidation(_) => "schema_validation",
            ExtractError::Provider(_) => "provider_error",
        }
    }
}

/// 单次提取请求
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// 页面URL
    pub url: String,
    /// 页面可见正文
    pub page_text: String,
    /// 页面类型提示（如 `product`、`job`、`blog`）
    pub page_type: Option<String>,
    /// 第几次尝试，从1开始
    pub attempt: u32,
    /// 页面类型要求但当前最佳候选仍缺失的字段
    pub missing_fields: BTreeSet<String>,
}

impl ExtractionRequest {
    pub fn new(url: impl Into<String>, page_text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            page_text: page_text.into(),
            page_type: None,
            attempt: 1,
            missing_fields: BTreeSet::new(),
        }
    }

    pub fn is_retry(&self) -> bool {
        self.attempt > 1
    }
}

/// 提取器特质
///
/// 给定页面正文返回一条候选记录；字段名可以是同义词，由调用方归一化。
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, request: &ExtractionRequest) -> Result<CandidateRecord, ExtractError>;

    /// 提取器名称
    fn name(&self) -> &'static str;
}

/// 基于规则的提取器
///
/// 只用文本启发式推断 `title`、`description` 和 `price`，结果是确定的，
/// 因此重试不会得到不同的候选。
#[derive(Debug, Clone, Default)]
pub struct RuleBasedExtractor;

impl RuleBasedExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 第一个非空行作为标题
    pub fn guess_title(text: &str) -> Option<String> {
        text.lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
    }

    /// 第一个长度合适、且本身不是价格行的文本行作为描述
    pub fn guess_description(text: &str) -> Option<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| find_price(line).is_none())
            .find(|line| {
                let length = line.chars().count();
                (DESCRIPTION_MIN_LENGTH..=DESCRIPTION_MAX_LENGTH).contains(&length)
            })
            .map(str::to_string)
    }
}

#[async_trait]
impl Extractor for RuleBasedExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<CandidateRecord, ExtractError> {
        let title = Self::guess_title(&request.page_text);
        let description = Self::guess_description(&request.page_text);
        let price = find_price(&request.page_text);

        debug!(
            url = %request.url,
            has_title = title.is_some(),
            has_description = description.is_some(),
            has_price = price.is_some(),
            "Rule-based extraction finished"
        );

        let mut record = CandidateRecord::new();
        if let Some(title) = title {
            record.insert("title".to_string(), Value::String(title));
        }
        if let Some(description) = description {
            record.insert("description".to_string(), Value::String(description));
        }
        if let Some(price) = price {
            record.insert("price".to_string(), json!(price));
        }

        if record.is_empty() {
            return Err(ExtractError::SchemaValidation(format!(
                "no informative fields found for {}",
                request.url
            )));
        }
        Ok(record)
    }

    fn name(&self) -> &'static str {
        "rule_based"
    }
}

#[cfg(test)]
#[path = "extraction_service_test.rs"]
mod tests;
