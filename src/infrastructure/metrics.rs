// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Duration;

use crate::domain::models::scrape_result::UrlState;

pub const FETCH_ATTEMPTS_TOTAL: &str = "agentscrape_fetch_attempts_total";
pub const FETCH_FAILURES_TOTAL: &str = "agentscrape_fetch_failures_total";
pub const URLS_TOTAL: &str = "agentscrape_urls_total";
pub const BATCH_DURATION_SECONDS: &str = "agentscrape_batch_duration_seconds";

/// 注册指标描述
///
/// 库本身不安装导出器，由宿主进程决定是否接入 recorder。
pub fn describe_metrics() {
    describe_counter!(FETCH_ATTEMPTS_TOTAL, "Number of outbound fetch attempts");
    describe_counter!(
        FETCH_FAILURES_TOTAL,
        "Number of URLs whose fetch ended in failure, by category"
    );
    describe_counter!(URLS_TOTAL, "Number of URLs reaching a terminal state, by status");
    describe_histogram!(
        BATCH_DURATION_SECONDS,
        Unit::Seconds,
        "End-to-end duration of a scrape batch"
    );
}

pub fn record_url_terminal(status: UrlState) {
    counter!(URLS_TOTAL, "status" => status.as_str()).increment(1);
}

pub fn record_batch_duration(duration: Duration) {
    histogram!(BATCH_DURATION_SECONDS).record(duration.as_secs_f64());
}
