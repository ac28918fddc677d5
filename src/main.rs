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

use agentscrape::application::dto::pipeline_config::PipelineConfig;
use agentscrape::application::use_cases::scrape_pipeline::ScrapePipeline;
use agentscrape::config::settings::Settings;
use agentscrape::domain::services::extraction_service::{Extractor, RuleBasedExtractor};
use agentscrape::domain::services::llm_extractor::LlmExtractor;
use agentscrape::domain::services::llm_service::LLMService;
use agentscrape::engines::reqwest_engine::ReqwestEngine;
use agentscrape::infrastructure::cancel_registry::JobCancelRegistry;
use agentscrape::infrastructure::metrics;
use agentscrape::utils::telemetry;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// 主函数
///
/// 对命令行给出的URL运行一次抓取任务，结果以JSON输出到标准输出。
/// Ctrl-C 会向该任务发送取消信号，已完成的结果仍会输出。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Settings::new()?;

    // 2. Initialize logging
    telemetry::init_telemetry(&settings.logging)?;
    metrics::describe_metrics();
    info!("Starting agentscrape...");

    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        anyhow::bail!("usage: agentscrape <url> [<url>...]");
    }

    // 3. Initialize transport and extractor
    let transport = Arc::new(ReqwestEngine::new()?);
    let extractor: Arc<dyn Extractor> = if settings.llm.api_key.is_some() {
        info!(model = %settings.llm.model, "Using LLM extractor");
        let llm = LLMService::from_settings(&settings.llm)?;
        Arc::new(LlmExtractor::new(Arc::new(llm)))
    } else {
        info!("No LLM API key configured, using rule-based extractor");
        Arc::new(RuleBasedExtractor::new())
    };

    let pipeline = ScrapePipeline::new(transport, extractor);
    let config = PipelineConfig::from(&settings.pipeline);

    // 4. Wire Ctrl-C to job cancellation
    let registry = JobCancelRegistry::new();
    let job_id = Uuid::new_v4();
    let canceller = registry.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!(%job_id, "Interrupt received, canceling job");
            canceller.signal_cancel(job_id);
        }
    });

    // 5. Run the job
    match pipeline.run_job(&registry, job_id, &urls, &config, None).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            error!(%job_id, error = %e, "Scrape job failed");
            Err(e.into())
        }
    }
}
