// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use agentscrape::application::dto::pipeline_config::PipelineConfig;
use agentscrape::domain::models::candidate::CandidateRecord;
use agentscrape::domain::services::extraction_service::{
    ExtractError, ExtractionRequest, Extractor,
};
use agentscrape::engines::traits::{FetchError, Transport, TransportResponse};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// 可编排的传输层
///
/// 记录调用次数和同时在途的最大请求数；未配置的URL返回一个简单的200页面。
#[derive(Default)]
pub struct FakeTransport {
    pages: HashMap<String, (u16, String)>,
    failures: HashMap<String, FetchError>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls_per_url: Mutex<HashMap<String, usize>>,
}

#[allow(dead_code)]
impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.pages.insert(url.to_string(), (status, body.to_string()));
        self
    }

    /// 该URL的每次请求都返回给定错误
    pub fn with_failure(mut self, url: &str, error: FetchError) -> Self {
        self.failures.insert(url.to_string(), error);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls_per_url.lock().get(url).copied().unwrap_or(0)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<TransportResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.calls_per_url.lock().entry(url.to_string()).or_insert(0) += 1;

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(error) = self.failures.get(url) {
            return Err(error.clone());
        }
        let (status_code, body) = self.pages.get(url).cloned().unwrap_or_else(|| {
            (
                200,
                format!("<html><head><title>{}</title></head><body></body></html>", url),
            )
        });
        Ok(TransportResponse {
            status_code,
            body,
            response_time_ms: self.delay.as_millis() as u64,
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// 按URL编排结果的提取器
///
/// 每个URL的脚本按顺序消费，耗尽后返回 `fallback`。
pub struct ScriptedExtractor {
    scripts: Mutex<HashMap<String, VecDeque<Result<Value, ExtractError>>>>,
    fallback: Result<Value, ExtractError>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedExtractor {
    pub fn new(fallback: Result<Value, ExtractError>) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_script(self, url: &str, script: Vec<Result<Value, ExtractError>>) -> Self {
        self.scripts.lock().insert(url.to_string(), script.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<CandidateRecord, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .scripts
            .lock()
            .get_mut(&request.url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.fallback.clone());

        next.and_then(|value| match value {
            Value::Object(record) => Ok(record),
            other => Err(ExtractError::SchemaValidation(format!(
                "not an object: {}",
                other
            ))),
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub fn schema_error(message: &str) -> Result<Value, ExtractError> {
    Err(ExtractError::SchemaValidation(message.to_string()))
}

pub fn urls(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// 重试间隔很短的配置，便于测试
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        fetch_concurrency: 4,
        request_timeout_ms: 1_000,
        retry_attempts: 3,
        retry_delay_ms: 10,
        llm_schema_retries: 2,
        page_type: None,
    }
}
