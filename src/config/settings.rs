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

use config::{Config, ConfigError, Environment, File, Map};
use serde::Deserialize;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "AGENTSCRAPE";

/// 应用程序配置设置
///
/// 包含抓取流水线、LLM提供商和日志等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 流水线配置
    pub pipeline: PipelineSettings,
    /// LLM配置
    pub llm: LlmSettings,
    /// 日志配置
    pub logging: LoggingSettings,
}

/// 流水线配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    /// 同时在途的抓取请求上限
    pub fetch_concurrency: usize,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 抓取最大尝试次数（含首次）
    pub retry_attempts: u32,
    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,
    /// 提取结果未通过校验时的额外尝试次数
    pub llm_schema_retries: u32,
    /// 页面类型提示
    pub page_type: Option<String>,
}

/// LLM配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    /// API密钥，未配置时使用规则提取器
    pub api_key: Option<String>,
    /// 模型名称
    pub model: String,
    /// OpenAI兼容接口的基础URL
    pub api_base_url: String,
    /// 单次补全的最大token数
    pub max_tokens: u32,
    /// 采样温度
    pub temperature: f32,
    /// 单次调用超时（秒）
    pub request_timeout_secs: u64,
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Json,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// 默认过滤指令，`RUST_LOG` 优先
    pub level: String,
    /// 输出格式
    pub format: LogFormat,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次合并内置默认值、`config/default.*`、`config/{APP_ENVIRONMENT}.*`
    /// 和 `AGENTSCRAPE__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// 使用给定的环境变量集合代替进程环境加载配置
    pub fn load(env_source: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Pipeline defaults
            .set_default("pipeline.fetch_concurrency", 10)?
            .set_default("pipeline.request_timeout_secs", 10)?
            .set_default("pipeline.retry_attempts", 3)?
            .set_default("pipeline.retry_delay_ms", 1000)?
            .set_default("pipeline.llm_schema_retries", 2)?
            // LLM defaults
            .set_default("llm.model", "gpt-3.5-turbo")?
            .set_default("llm.api_base_url", "https://api.openai.com/v1")?
            .set_default("llm.max_tokens", 500)?
            .set_default("llm.temperature", 0.0)?
            .set_default("llm.request_timeout_secs", 30)?
            // Logging defaults
            .set_default("logging.level", "info,agentscrape=debug")?
            .set_default("logging.format", "plain")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(env_source),
            );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
