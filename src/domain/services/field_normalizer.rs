// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::{Number, Value};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::domain::models::candidate::CandidateRecord;
use crate::utils::text_processing::parse_price;

/// 规范字段名及其同义词
///
/// 同义词按优先级排列。发生冲突时，原样出现的规范字段名优先，
/// 其次是排在前面的同义词。规范字段名不会出现在任何同义词列表中。
pub const FIELD_SYNONYMS: &[(&str, &[&str])] = &[
    ("title", &["name", "headline", "product_name", "heading"]),
    ("price", &["cost", "amount", "pricing", "price_value"]),
    ("description", &["desc", "details", "product_description"]),
    ("summary", &["abstract", "excerpt", "tldr"]),
    ("author", &["writer", "byline", "written_by"]),
    ("date", &["published_date", "publication_date", "date_published"]),
    ("date_posted", &["posted_on", "posting_date", "posted"]),
    ("company", &["employer", "company_name", "organization"]),
    ("location", &["job_location", "place"]),
    ("job_title", &["position", "role"]),
];

/// 表示"没有值"的占位文本（比较前去除空白并转小写）
pub const PLACEHOLDER_VALUES: &[&str] = &["not specified", "n/a", "none", "unknown", "-", ""];

/// 字段归一化器
///
/// 把提取器返回的同义字段名映射为规范字段名，使后续的比较和评分
/// 不受提取措辞影响。
pub struct FieldNormalizer;

impl FieldNormalizer {
    /// 返回字段名对应的规范名称，不在同义词表中的字段名原样返回
    pub fn canonical_name(key: &str) -> &str {
        Self::resolve(key).0
    }

    /// 归一化字段名
    ///
    /// 只修改键名，不修改值。两个键映射到同一规范名时按
    /// `FIELD_SYNONYMS` 的优先级保留一个，结果与输入的迭代顺序无关。
    pub fn normalize(raw: CandidateRecord) -> CandidateRecord {
        let mut normalized = CandidateRecord::new();
        let mut ranks: HashMap<String, usize> = HashMap::new();

        for (key, value) in raw {
            let (canonical, rank) = Self::resolve(&key);
            if let Some(&existing) = ranks.get(canonical) {
                if existing <= rank {
                    debug!(key = %key, canonical = %canonical, "Dropping lower-precedence synonym");
                    continue;
                }
            }
            let canonical = canonical.to_string();
            ranks.insert(canonical.clone(), rank);
            normalized.insert(canonical, value);
        }

        normalized
    }

    /// 归一化字段值
    ///
    /// - 字符串去除首尾空白，占位文本变为 `null`
    /// - `price` 转换为数字，无法解析时为 `null`
    ///
    /// 不会删除任何键。
    pub fn normalize_values(record: CandidateRecord) -> CandidateRecord {
        record
            .into_iter()
            .map(|(key, value)| {
                let value = if Self::is_placeholder(&value) {
                    Value::Null
                } else if key == "price" {
                    Self::normalize_price(value)
                } else {
                    match value {
                        Value::String(s) => Value::String(s.trim().to_string()),
                        other => other,
                    }
                };
                (key, value)
            })
            .collect()
    }

    /// 值是否表示"不可用"
    pub fn is_placeholder(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => PLACEHOLDER_VALUES.contains(&s.trim().to_lowercase().as_str()),
            _ => false,
        }
    }

    /// 值非占位符的字段名集合
    pub fn present_fields(record: &CandidateRecord) -> BTreeSet<String> {
        record
            .iter()
            .filter(|(_, value)| !Self::is_placeholder(value))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// 页面明确标为不可用的字段名集合（值为占位符的键）
    ///
    /// 这些字段即使是必需字段，也不必在重试时再次索取。
    pub fn unavailable_fields(record: &CandidateRecord) -> BTreeSet<String> {
        record
            .iter()
            .filter(|(_, value)| Self::is_placeholder(value))
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn normalize_price(value: Value) -> Value {
        let parsed = match &value {
            Value::Number(_) => return value,
            Value::String(s) => parse_price(s),
            _ => None,
        };
        parsed
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }

    /// 返回 (规范名, 优先级)，数值越小优先级越高
    fn resolve(key: &str) -> (&str, usize) {
        for (canonical, synonyms) in FIELD_SYNONYMS {
            if key == *canonical {
                return (*canonical, 0);
            }
            if let Some(position) = synonyms.iter().position(|synonym| *synonym == key) {
                return (*canonical, position + 1);
            }
        }
        (key, 0)
    }
}
