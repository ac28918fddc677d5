// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;
use validator::ValidationErrors;

/// 流水线错误类型
///
/// 单个URL的失败记录在其结果里，不会出现在这里；
/// 只有调用方层面的错误才会让整次调用失败。
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

impl From<ValidationErrors> for PipelineError {
    fn from(errors: ValidationErrors) -> Self {
        PipelineError::InvalidConfig(errors.to_string())
    }
}
