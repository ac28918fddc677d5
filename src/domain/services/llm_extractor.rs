// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::models::candidate::CandidateRecord;
use crate::domain::services::extraction_service::{ExtractError, ExtractionRequest, Extractor};
use crate::domain::services::llm_service::LLMServiceTrait;

/// 发送给模型的正文最大字符数
const MAX_PROMPT_TEXT_CHARS: usize = 10_000;

const SYSTEM_PROMPT: &str = "You are a precise data extraction assistant. \
    You read web page text and output a single JSON object with the fields you find. \
    Output only valid JSON, no markdown formatting.";

const FIELD_HINTS: &str = "Typical fields: title, price, description, summary, author, \
    company, job_title, location, date, date_posted. \
    Include any other field that is clearly presented on the page.";

/// 基于LLM的提取器
///
/// 首次尝试使用通用提示；重试时提示中会列出仍然缺失的字段。
pub struct LlmExtractor {
    llm: Arc<dyn LLMServiceTrait>,
}

impl LlmExtractor {
    pub fn new(llm: Arc<dyn LLMServiceTrait>) -> Self {
        Self { llm }
    }

    fn build_prompt(request: &ExtractionRequest) -> String {
        let mut prompt = format!("URL: {}\n", request.url);
        if let Some(page_type) = &request.page_type {
            prompt.push_str(&format!("Page type: {}\n", page_type));
        }
        prompt.push_str(FIELD_HINTS);
        prompt.push('\n');

        if request.is_retry() && !request.missing_fields.is_empty() {
            let missing: Vec<&str> = request.missing_fields.iter().map(String::as_str).collect();
            prompt.push_str(&format!(
                "A previous extraction missed these fields, look for them carefully: {}\n",
                missing.join(", ")
            ));
        }

        prompt.push_str("\nPage text:\n");
        prompt.push_str(truncate_chars(&request.page_text, MAX_PROMPT_TEXT_CHARS));
        prompt
    }
}

/// 按字符数截断，保证落在UTF-8边界上
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// 解析模型输出，容忍markdown代码块包裹
pub fn parse_llm_output(content: &str) -> Result<CandidateRecord, ExtractError> {
    let clean = strip_code_fence(content.trim());

    let value: Value = serde_json::from_str(clean)
        .map_err(|e| ExtractError::SchemaValidation(format!("output is not valid JSON: {}", e)))?;

    match value {
        Value::Object(record) if !record.is_empty() => Ok(record),
        Value::Object(_) => Err(ExtractError::SchemaValidation(
            "output is an empty object".to_string(),
        )),
        other => Err(ExtractError::SchemaValidation(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

/// 去掉包裹输出的代码块标记，语言标签不区分大小写
fn strip_code_fence(content: &str) -> &str {
    let Some(body) = content.strip_prefix("```") else {
        return content;
    };
    let body = match body.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &body[4..],
        _ => body,
    };
    body.trim_end_matches("```").trim()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<CandidateRecord, ExtractError> {
        let prompt = Self::build_prompt(request);

        let (content, usage) = self
            .llm
            .chat_completion(SYSTEM_PROMPT, &prompt)
            .await
            .map_err(|e| {
                warn!(url = %request.url, attempt = request.attempt, error = %e, "LLM call failed");
                ExtractError::Provider(e.to_string())
            })?;

        debug!(
            url = %request.url,
            attempt = request.attempt,
            total_tokens = usage.total_tokens,
            "LLM extraction response received"
        );

        parse_llm_output(&content)
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

#[cfg(test)]
#[path = "llm_extractor_test.rs"]
mod tests;
