// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use crate::domain::models::candidate::{CandidateRecord, ScoredCandidate};

/// 单个URL在流水线中的状态
///
/// `Pending -> Fetching -> (FetchFailed | Fetched) -> Extracting -> (ExtractFailed | Scored) -> Done`，
/// 任何非终止状态在下一个轮询点都可以直接转入 `Canceled`。
///
/// 非终止状态只描述处理进度，不会出现在 `ScrapeResult` 中；
/// 流水线产出的每个结果都处于终止状态（见 [`UrlState::is_terminal`]）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlState {
    Pending,
    Fetching,
    FetchFailed,
    Fetched,
    Extracting,
    ExtractFailed,
    Scored,
    Done,
    Canceled,
}

impl UrlState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            UrlState::FetchFailed | UrlState::ExtractFailed | UrlState::Done | UrlState::Canceled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UrlState::Pending => "pending",
            UrlState::Fetching => "fetching",
            UrlState::FetchFailed => "fetch_failed",
            UrlState::Fetched => "fetched",
            UrlState::Extracting => "extracting",
            UrlState::ExtractFailed => "extract_failed",
            UrlState::Scored => "scored",
            UrlState::Done => "done",
            UrlState::Canceled => "canceled",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 失败原因
///
/// `category` 是稳定的分类名（如 `timeout`、`http_status`、`schema_validation`），
/// `message` 是面向人的说明，不包含堆栈。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCause {
    pub category: String,
    pub message: String,
}

impl FailureCause {
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
        }
    }
}

/// 单个URL的最终结果
///
/// 每个请求的URL（包括重复项）恰好对应一个结果。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResult {
    /// 目标URL
    pub url: String,
    /// 终止状态
    pub status: UrlState,
    /// 胜出的归一化记录（仅 `Done` 时存在）
    pub record: Option<CandidateRecord>,
    /// 胜出记录的规范字段集合
    pub fields: BTreeSet<String>,
    /// 胜出记录的质量分数
    pub score: u32,
    /// 胜出的提取尝试序号
    pub winning_attempt: Option<u32>,
    /// 实际进行的提取尝试次数
    pub extraction_attempts: u32,
    /// 实际发出的抓取请求次数
    pub fetch_attempts: u32,
    /// 失败原因
    pub failure: Option<FailureCause>,
}

impl ScrapeResult {
    fn empty(url: String, status: UrlState, fetch_attempts: u32) -> Self {
        Self {
            url,
            status,
            record: None,
            fields: BTreeSet::new(),
            score: 0,
            winning_attempt: None,
            extraction_attempts: 0,
            fetch_attempts,
            failure: None,
        }
    }

    pub fn done(
        url: String,
        winner: ScoredCandidate,
        extraction_attempts: u32,
        fetch_attempts: u32,
    ) -> Self {
        Self {
            record: Some(winner.record),
            fields: winner.fields,
            score: winner.score,
            winning_attempt: Some(winner.attempt),
            extraction_attempts,
            ..Self::empty(url, UrlState::Done, fetch_attempts)
        }
    }

    pub fn fetch_failed(url: String, cause: FailureCause, fetch_attempts: u32) -> Self {
        Self {
            failure: Some(cause),
            ..Self::empty(url, UrlState::FetchFailed, fetch_attempts)
        }
    }

    pub fn extract_failed(
        url: String,
        cause: FailureCause,
        extraction_attempts: u32,
        fetch_attempts: u32,
    ) -> Self {
        Self {
            failure: Some(cause),
            extraction_attempts,
            ..Self::empty(url, UrlState::ExtractFailed, fetch_attempts)
        }
    }

    pub fn canceled(url: String, extraction_attempts: u32, fetch_attempts: u32) -> Self {
        Self {
            failure: Some(FailureCause::new("canceled", "job was canceled")),
            extraction_attempts,
            ..Self::empty(url, UrlState::Canceled, fetch_attempts)
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == UrlState::Done
    }
}

/// 批次聚合统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// 请求的URL总数
    pub total: usize,
    /// 成功（`Done`）数量
    pub succeeded: usize,
    /// 失败（抓取或提取失败）数量
    pub failed: usize,
    /// 被取消的数量
    pub canceled: usize,
    /// 整个批次的端到端耗时
    pub duration: Duration,
    /// 批次结束时令牌是否处于取消状态
    pub was_canceled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunStats {
    /// 在所有URL进入终止状态后统计
    pub fn tally(
        results: &[ScrapeResult],
        duration: Duration,
        was_canceled: bool,
        started_at: DateTime<Utc>,
    ) -> Self {
        let mut stats = Self {
            total: results.len(),
            succeeded: 0,
            failed: 0,
            canceled: 0,
            duration,
            was_canceled,
            started_at,
            finished_at: Utc::now(),
        };
        for result in results {
            match result.status {
                UrlState::Done => stats.succeeded += 1,
                UrlState::Canceled => stats.canceled += 1,
                _ => stats.failed += 1,
            }
        }
        stats
    }
}

/// 一次批量抓取的完整报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeReport {
    /// 与输入URL顺序一致的结果
    pub results: Vec<ScrapeResult>,
    pub stats: RunStats,
}
