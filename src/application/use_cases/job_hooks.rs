// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

use crate::domain::models::scrape_result::{FailureCause, RunStats, ScrapeResult};

/// 任务生命周期回调
///
/// 所有方法默认不做任何事。回调在流水线内部同步调用，应当尽快返回；
/// 回调中的panic会被捕获并记录，不影响任务本身。
pub trait JobHooks: Send + Sync {
    /// 任务开始，`total` 为URL总数
    fn on_started(&self, _total: usize) {}

    /// 每个URL进入终止状态后调用
    fn on_progress(&self, _done: usize, _total: usize) {}

    fn on_item_processed(&self, _result: &ScrapeResult) {}

    fn on_error(&self, _url: &str, _cause: &FailureCause) {}

    fn on_completed(&self, _stats: &RunStats) {}
}

/// 不做任何事的回调
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl JobHooks for NoopHooks {}

/// 调用回调并吞掉其中的panic
pub(crate) fn guarded<F>(hook: &'static str, call: F)
where
    F: FnOnce(),
{
    if panic::catch_unwind(AssertUnwindSafe(call)).is_err() {
        warn!(hook, "Job hook panicked, ignoring");
    }
}
