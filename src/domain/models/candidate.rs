// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// 候选记录
///
/// 外部提取器单次尝试产出的字段映射，归一化之前字段名可能是同义词。
pub type CandidateRecord = Map<String, Value>;

/// 已评分的候选记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// 键名和值都已归一化的记录
    pub record: CandidateRecord,
    /// 实际存在（非占位符）的规范字段名
    pub fields: BTreeSet<String>,
    /// 质量分数
    pub score: u32,
    /// 产出该记录的提取尝试序号（从1开始）
    pub attempt: u32,
}

impl ScoredCandidate {
    /// 是否覆盖了全部必需字段
    pub fn covers(&self, required: &BTreeSet<String>) -> bool {
        required.is_subset(&self.fields)
    }
}
