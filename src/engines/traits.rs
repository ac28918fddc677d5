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

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::utils::retry_policy::is_retryable_status;

/// 抓取错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// 任务被取消，请求未发出
    #[error("Canceled")]
    Canceled,
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 传输层错误（连接重置、拒绝连接等）
    #[error("Transport error: {0}")]
    Transport(String),
    /// 非2xx的HTTP状态码
    #[error("HTTP status {0}")]
    HttpStatus(u16),
    /// URL格式错误
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 超时、传输错误、5xx和429返回true，其他返回false
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Transport(_) => true,
            FetchError::HttpStatus(status) => is_retryable_status(*status),
            FetchError::Canceled | FetchError::InvalidUrl(_) => false,
        }
    }

    /// 稳定的错误分类名，用于结果报告与指标标签
    pub fn category(&self) -> &'static str {
        match self {
            FetchError::Canceled => "canceled",
            FetchError::Timeout => "timeout",
            FetchError::Transport(_) => "transport_error",
            FetchError::HttpStatus(_) => "http_status_error",
            FetchError::InvalidUrl(_) => "invalid_url",
        }
    }
}

/// 传输层响应
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP状态码
    pub status_code: u16,
    /// 响应内容
    pub body: String,
    /// 响应时间（毫秒）
    pub response_time_ms: u64,
}

/// 传输层特质
///
/// 执行一次GET请求。DNS、TLS和连接池都在实现内部处理，
/// 应用层的重试由 `BoundedFetcher` 负责。
#[async_trait]
pub trait Transport: Send + Sync {
    /// 执行GET请求，非2xx状态码也应作为 `Ok` 返回
    async fn get(&self, url: &str, timeout: Duration) -> Result<TransportResponse, FetchError>;

    /// 传输层名称
    fn name(&self) -> &'static str;
}
