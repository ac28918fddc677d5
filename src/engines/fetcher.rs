// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use futures::stream::{self, StreamExt};
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::domain::models::cancel_token::CancelToken;
use crate::engines::traits::{FetchError, Transport, TransportResponse};
use crate::infrastructure::metrics::{FETCH_ATTEMPTS_TOTAL, FETCH_FAILURES_TOTAL};
use crate::utils::retry_policy::RetryPolicy;

/// 单个URL的抓取结果
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    /// 目标URL
    pub url: String,
    /// 成功时为响应正文，失败时为结构化原因
    pub result: Result<String, FetchError>,
    /// 实际发出的请求次数
    pub attempts: u32,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self.result, Err(FetchError::Canceled))
    }
}

/// 有界并发抓取器
///
/// 并发上限是保护出站网络负载的唯一共享资源；每个URL独立记录结果，
/// 一个URL的失败或取消不会中止其他URL。
pub struct BoundedFetcher {
    transport: Arc<dyn Transport>,
    retry_policy: RetryPolicy,
}

impl BoundedFetcher {
    pub fn new(transport: Arc<dyn Transport>, retry_policy: RetryPolicy) -> Self {
        Self {
            transport,
            retry_policy,
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// 并发抓取一组URL
    ///
    /// # 参数
    ///
    /// * `urls` - 目标URL，重复项各自独立抓取
    /// * `concurrency` - 同时在途的请求上限（小于1时按1处理）
    /// * `timeout` - 单次请求超时
    /// * `token` - 取消令牌
    ///
    /// # 返回值
    ///
    /// 与 `urls` 一一对应、顺序一致的结果
    pub async fn fetch_all(
        &self,
        urls: &[String],
        concurrency: usize,
        timeout: Duration,
        token: &CancelToken,
    ) -> Vec<FetchOutcome> {
        if urls.is_empty() {
            return Vec::new();
        }

        let concurrency = concurrency.max(1);
        debug!(count = urls.len(), concurrency, "Starting bounded fetch");

        let mut completed: Vec<(usize, FetchOutcome)> = stream::iter(urls.iter().enumerate())
            .map(|(index, url)| async move { (index, self.fetch_one(url, timeout, token).await) })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        completed.sort_by_key(|(index, _)| *index);
        let outcomes: Vec<FetchOutcome> = completed.into_iter().map(|(_, outcome)| outcome).collect();

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        info!(
            total = outcomes.len(),
            succeeded,
            failed = outcomes.len() - succeeded,
            "Fetch phase complete"
        );
        outcomes
    }

    /// 抓取单个URL，必要时按策略重试
    ///
    /// 每次发出请求前、每次等待重试前都会检查取消令牌；
    /// 已经发出的请求不会被中断。
    #[instrument(skip(self, token))]
    pub async fn fetch_one(&self, url: &str, timeout: Duration, token: &CancelToken) -> FetchOutcome {
        let mut attempts = 0;

        loop {
            if token.is_canceled() {
                debug!(attempts, "Fetch canceled before request");
                return self.finish(url, Err(FetchError::Canceled), attempts);
            }

            attempts += 1;
            counter!(FETCH_ATTEMPTS_TOTAL).increment(1);

            let result = match tokio::time::timeout(timeout, self.transport.get(url, timeout)).await {
                Ok(Ok(response)) => Self::check_status(response),
                Ok(Err(error)) => Err(error),
                Err(_) => Err(FetchError::Timeout),
            };

            match result {
                Ok(body) => return self.finish(url, Ok(body), attempts),
                Err(error) if self.retry_policy.should_retry_with_error(attempts, &error) => {
                    debug!(attempt = attempts, error = %error, "Retryable fetch failure");
                    if token.is_canceled() {
                        return self.finish(url, Err(FetchError::Canceled), attempts);
                    }
                    sleep(self.retry_policy.calculate_backoff(attempts)).await;
                }
                Err(error) => return self.finish(url, Err(error), attempts),
            }
        }
    }

    fn check_status(response: TransportResponse) -> Result<String, FetchError> {
        if (200..300).contains(&response.status_code) {
            Ok(response.body)
        } else {
            Err(FetchError::HttpStatus(response.status_code))
        }
    }

    fn finish(&self, url: &str, result: Result<String, FetchError>, attempts: u32) -> FetchOutcome {
        match &result {
            Ok(body) => info!(attempts, bytes = body.len(), "Fetch successful"),
            Err(FetchError::Canceled) => {
                counter!(FETCH_FAILURES_TOTAL, "category" => "canceled").increment(1);
            }
            Err(error) => {
                warn!(attempts, error = %error, "Fetch failed");
                counter!(FETCH_FAILURES_TOTAL, "category" => error.category())
                    .increment(1);
            }
        }
        FetchOutcome {
            url: url.to_string(),
            result,
            attempts,
        }
    }
}
