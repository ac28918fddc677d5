// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use crate::engines::traits::FetchError;

/// 默认最大尝试次数（含首次请求）
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// 默认重试间隔
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// 重试策略配置
///
/// 抓取是幂等的GET操作，只对可重试错误按固定间隔重试，
/// 总尝试次数不超过 `max_attempts`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大尝试次数（含首次请求）
    pub max_attempts: u32,
    /// 两次尝试之间的固定间隔
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// 创建固定间隔重试策略，尝试次数至少为1
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// 不重试
    pub fn none() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    /// 第 `attempt` 次尝试（从1开始）之后的等待时间
    pub fn calculate_backoff(&self, _attempt: u32) -> Duration {
        self.delay
    }

    /// 已完成 `attempt` 次尝试后是否还能再试
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// 根据错误类型判断是否应该重试
    pub fn should_retry_with_error(&self, attempt: u32, error: &FetchError) -> bool {
        self.should_retry(attempt) && error.is_retryable()
    }
}

/// 判断HTTP状态码是否可重试
///
/// 5xx 与 429（限流）可重试，其他状态码不重试。
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}
