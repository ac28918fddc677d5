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

use crate::{
    application::{
        dto::pipeline_config::PipelineConfig,
        use_cases::job_hooks::{guarded, JobHooks, NoopHooks},
    },
    domain::{
        models::{
            cancel_token::{CancelPredicate, CancelToken, Canceled},
            candidate::ScoredCandidate,
            scrape_result::{FailureCause, RunStats, ScrapeReport, ScrapeResult, UrlState},
        },
        services::{
            extraction_service::{ExtractError, ExtractionRequest, Extractor},
            field_normalizer::FieldNormalizer,
            quality_scorer::QualityScorer,
        },
    },
    engines::{
        fetcher::{BoundedFetcher, FetchOutcome},
        traits::{FetchError, Transport},
    },
    infrastructure::{cancel_registry::JobCancelRegistry, metrics},
    utils::{errors::PipelineError, text_processing::extract_main_text},
};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// 单个URL提取阶段的局部状态
#[derive(Debug, Default)]
struct ExtractionRun {
    best: Option<ScoredCandidate>,
    last_error: Option<ExtractError>,
    attempts: u32,
}

/// 抓取流水线
///
/// 先用 `BoundedFetcher` 并发抓取所有URL，再对每个抓取成功的页面
/// 多次调用提取器，归一化、评分并保留最佳候选，最后汇总统计。
///
/// 单个URL的失败不会中止整个批次，结果顺序与输入顺序一致。
pub struct ScrapePipeline {
    transport: Arc<dyn Transport>,
    extractor: Arc<dyn Extractor>,
    hooks: Arc<dyn JobHooks>,
}

impl ScrapePipeline {
    pub fn new(transport: Arc<dyn Transport>, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            transport,
            extractor,
            hooks: Arc::new(NoopHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn JobHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// 在注册表中登记任务后运行，结束时（包括future被丢弃时）恰好清理一次
    ///
    /// # 参数
    ///
    /// * `registry` - 注入的取消注册表
    /// * `job_id` - 任务ID
    /// * `urls` - 目标URL
    /// * `config` - 任务配置
    /// * `predicate` - 额外的取消谓词
    pub async fn run_job(
        &self,
        registry: &JobCancelRegistry,
        job_id: Uuid,
        urls: &[String],
        config: &PipelineConfig,
        predicate: Option<CancelPredicate>,
    ) -> Result<ScrapeReport, PipelineError> {
        let registration = registry.register_scoped(job_id);
        let token = CancelToken::new(Some(registration.flag().clone()), predicate);

        info!(%job_id, urls = urls.len(), "Starting scrape job");
        let report = self.run(urls, config, &token).await;
        if let Ok(report) = &report {
            info!(
                %job_id,
                succeeded = report.stats.succeeded,
                failed = report.stats.failed,
                canceled = report.stats.canceled,
                "Scrape job finished"
            );
        }
        report
    }

    /// 运行一个批次
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapeReport)` - 每个输入URL恰好一个结果，以及聚合统计
    /// * `Err(PipelineError)` - 配置无效，未发出任何请求
    pub async fn run(
        &self,
        urls: &[String],
        config: &PipelineConfig,
        token: &CancelToken,
    ) -> Result<ScrapeReport, PipelineError> {
        config.validate()?;

        let started_at = Utc::now();
        let start = Instant::now();
        let total = urls.len();
        guarded("on_started", || self.hooks.on_started(total));

        let fetcher = BoundedFetcher::new(self.transport.clone(), config.retry_policy());
        let outcomes = fetcher
            .fetch_all(urls, config.fetch_concurrency, config.request_timeout(), token)
            .await;

        let required = QualityScorer::required_fields(config.page_type.as_deref());
        let required = &required;
        let mut done = 0;

        let mut completed: Vec<(usize, ScrapeResult)> = stream::iter(outcomes.into_iter().enumerate())
            .map(|(index, outcome)| async move {
                (index, self.process_outcome(outcome, config, required, token).await)
            })
            .buffer_unordered(config.fetch_concurrency)
            .inspect(|(_, result)| {
                done += 1;
                self.report_item(result, done, total);
            })
            .collect()
            .await;

        completed.sort_by_key(|(index, _)| *index);
        let results: Vec<ScrapeResult> = completed.into_iter().map(|(_, result)| result).collect();

        let duration = start.elapsed();
        let stats = RunStats::tally(&results, duration, token.is_canceled(), started_at);
        metrics::record_batch_duration(duration);
        info!(
            total = stats.total,
            succeeded = stats.succeeded,
            failed = stats.failed,
            canceled = stats.canceled,
            duration_ms = duration.as_millis() as u64,
            "Scrape batch complete"
        );
        guarded("on_completed", || self.hooks.on_completed(&stats));

        Ok(ScrapeReport { results, stats })
    }

    #[instrument(skip_all, fields(url = %outcome.url))]
    async fn process_outcome(
        &self,
        outcome: FetchOutcome,
        config: &PipelineConfig,
        required: &BTreeSet<String>,
        token: &CancelToken,
    ) -> ScrapeResult {
        let FetchOutcome {
            url,
            result,
            attempts: fetch_attempts,
        } = outcome;

        let body = match result {
            Ok(body) => body,
            Err(FetchError::Canceled) => return ScrapeResult::canceled(url, 0, fetch_attempts),
            Err(error) => {
                let cause = FailureCause::new(error.category(), error.to_string());
                return ScrapeResult::fetch_failed(url, cause, fetch_attempts);
            }
        };

        let page_text = extract_main_text(&body);
        let mut run = ExtractionRun::default();

        if let Err(Canceled) = self
            .extract_attempts(&url, &page_text, config, required, token, &mut run)
            .await
        {
            debug!(attempts = run.attempts, "Extraction stopped by cancellation");
            return ScrapeResult::canceled(url, run.attempts, fetch_attempts);
        }

        match run.best {
            Some(winner) => ScrapeResult::done(url, winner, run.attempts, fetch_attempts),
            None => {
                let cause = match run.last_error {
                    Some(error) => FailureCause::new(error.category(), error.to_string()),
                    None => FailureCause::new("schema_validation", "no candidate produced"),
                };
                ScrapeResult::extract_failed(url, cause, run.attempts, fetch_attempts)
            }
        }
    }

    /// 提取尝试循环
    ///
    /// 每次尝试前检查取消；当前最佳候选覆盖页面类型的必需字段后提前结束。
    async fn extract_attempts(
        &self,
        url: &str,
        page_text: &str,
        config: &PipelineConfig,
        required: &BTreeSet<String>,
        token: &CancelToken,
        run: &mut ExtractionRun,
    ) -> Result<(), Canceled> {
        for attempt in 1..=config.max_extraction_attempts() {
            token.raise_if_canceled()?;
            run.attempts = attempt;

            let missing_fields = match &run.best {
                Some(best) => {
                    let unavailable = FieldNormalizer::unavailable_fields(&best.record);
                    required
                        .iter()
                        .filter(|field| {
                            !best.fields.contains(*field) && !unavailable.contains(*field)
                        })
                        .cloned()
                        .collect()
                }
                None => required.clone(),
            };
            let request = ExtractionRequest {
                url: url.to_string(),
                page_text: page_text.to_string(),
                page_type: config.page_type.clone(),
                attempt,
                missing_fields,
            };

            match self.extractor.extract(&request).await {
                Ok(raw) => {
                    let candidate = QualityScorer::evaluate(raw, attempt);
                    let best = QualityScorer::prefer(run.best.take(), candidate);
                    let covered = best.covers(required);
                    run.best = Some(best);
                    if covered {
                        break;
                    }
                }
                Err(error) => {
                    debug!(attempt, error = %error, "Extraction attempt failed");
                    run.last_error = Some(error);
                }
            }
        }
        Ok(())
    }

    fn report_item(&self, result: &ScrapeResult, done: usize, total: usize) {
        metrics::record_url_terminal(result.status);
        if let Some(cause) = &result.failure {
            if result.status != UrlState::Canceled {
                warn!(url = %result.url, status = %result.status, category = %cause.category, "URL failed");
                guarded("on_error", || self.hooks.on_error(&result.url, cause));
            }
        }
        guarded("on_item_processed", || self.hooks.on_item_processed(result));
        guarded("on_progress", || self.hooks.on_progress(done, total));
    }
}

#[cfg(test)]
#[path = "scrape_pipeline_test.rs"]
mod tests;
