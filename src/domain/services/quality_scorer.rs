// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::BTreeSet;
use tracing::debug;

use crate::domain::models::candidate::{CandidateRecord, ScoredCandidate};
use crate::domain::services::field_normalizer::FieldNormalizer;

/// 规范字段权重，未列出的字段权重为0
pub const FIELD_WEIGHTS: &[(&str, u32)] = &[
    ("title", 3),
    ("price", 3),
    ("summary", 2),
    ("description", 2),
    ("author", 2),
    ("company", 2),
    ("job_title", 2),
    ("location", 1),
    ("date", 1),
    ("date_posted", 1),
];

/// 页面类型对应的必需字段
pub const PAGE_TYPE_FIELDS: &[(&str, &[&str])] = &[
    ("product", &["title", "price", "description"]),
    ("job", &["job_title", "company", "location", "date_posted"]),
    ("blog", &["title", "author", "date", "summary"]),
];

/// 提取质量评分器
///
/// 分数是存在的规范字段权重之和。向集合中加入已知字段不会降低分数。
pub struct QualityScorer;

impl QualityScorer {
    pub fn weight(field: &str) -> u32 {
        FIELD_WEIGHTS
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, weight)| *weight)
            .unwrap_or(0)
    }

    /// 计算字段集合的质量分数
    pub fn score(fields: &BTreeSet<String>) -> u32 {
        fields.iter().map(|field| Self::weight(field)).sum()
    }

    /// 页面类型的必需字段
    ///
    /// 忽略大小写和首尾空白；未识别或缺省的页面类型返回空集合。
    pub fn required_fields(page_type: Option<&str>) -> BTreeSet<String> {
        let Some(page_type) = page_type else {
            return BTreeSet::new();
        };
        let page_type = page_type.trim().to_lowercase();
        PAGE_TYPE_FIELDS
            .iter()
            .find(|(name, _)| *name == page_type)
            .map(|(_, fields)| fields.iter().map(|field| field.to_string()).collect())
            .unwrap_or_default()
    }

    /// 归一化并评分一次提取尝试的结果
    pub fn evaluate(raw: CandidateRecord, attempt: u32) -> ScoredCandidate {
        let record = FieldNormalizer::normalize_values(FieldNormalizer::normalize(raw));
        let fields = FieldNormalizer::present_fields(&record);
        let score = Self::score(&fields);
        debug!(attempt, score, fields = ?fields, "Scored extraction candidate");
        ScoredCandidate {
            record,
            fields,
            score,
            attempt,
        }
    }

    /// 选择更好的候选
    ///
    /// 分数严格更高才替换当前最佳，同分时保留较早的尝试。
    pub fn prefer(best: Option<ScoredCandidate>, candidate: ScoredCandidate) -> ScoredCandidate {
        match best {
            Some(best) if best.score >= candidate.score => best,
            _ => candidate,
        }
    }

    /// 从多个候选中选出最佳者
    pub fn select_best<I>(candidates: I) -> Option<ScoredCandidate>
    where
        I: IntoIterator<Item = ScoredCandidate>,
    {
        candidates
            .into_iter()
            .fold(None, |best, candidate| Some(Self::prefer(best, candidate)))
    }
}
