// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::config::settings::PipelineSettings;
use crate::utils::retry_policy::RetryPolicy;

/// 单次抓取任务的配置
///
/// 运行前必须通过校验，校验失败是整次调用唯一的致命错误。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct PipelineConfig {
    /// 同时在途的抓取请求上限
    #[validate(range(min = 1, max = 100))]
    pub fetch_concurrency: usize,
    /// 单次请求超时（毫秒）
    #[validate(range(min = 1))]
    pub request_timeout_ms: u64,
    /// 抓取最大尝试次数（含首次）
    #[validate(range(min = 1, max = 10))]
    pub retry_attempts: u32,
    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,
    /// 提取未通过校验时的额外尝试次数
    #[validate(range(max = 10))]
    pub llm_schema_retries: u32,
    /// 页面类型提示
    pub page_type: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: 10,
            request_timeout_ms: 10_000,
            retry_attempts: 3,
            retry_delay_ms: 1_000,
            llm_schema_retries: 2,
            page_type: None,
        }
    }
}

impl From<&PipelineSettings> for PipelineConfig {
    fn from(settings: &PipelineSettings) -> Self {
        Self {
            fetch_concurrency: settings.fetch_concurrency,
            request_timeout_ms: settings.request_timeout_secs.saturating_mul(1000),
            retry_attempts: settings.retry_attempts,
            retry_delay_ms: settings.retry_delay_ms,
            llm_schema_retries: settings.llm_schema_retries,
            page_type: settings.page_type.clone(),
        }
    }
}

impl PipelineConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.retry_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    /// 每个URL最多进行的提取尝试次数
    pub fn max_extraction_attempts(&self) -> u32 {
        self.llm_schema_retries + 1
    }
}
