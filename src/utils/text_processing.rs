// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 页面文本处理
//!
//! - 从HTML中提取可见正文，交给提取器使用
//! - 价格字符串解析，供字段值归一化与规则提取共用

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node};

/// 不产生可见文本的标签
const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

static CURRENCY_PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[$€£¥]\s*(\d[\d.,]*\d|\d))|(?:(\d[\d.,]*\d|\d)\s*(?:[$€£¥]|USD|EUR|GBP))")
        .expect("currency price regex is valid")
});

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d[\d.,]*\d|\d").expect("number regex is valid"));

/// 提取HTML中的可见正文
///
/// 去除 `script`/`style`/`noscript` 内容，每个文本行去除首尾空白，
/// 丢弃空行后用换行连接。
pub fn extract_main_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| INVISIBLE_TAGS.contains(&element.name()))
        });
        if hidden {
            continue;
        }
        lines.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }

    lines.join("\n")
}

/// 在文本中查找第一个带货币符号的价格
pub fn find_price(text: &str) -> Option<f64> {
    let captures = CURRENCY_PRICE_RE.captures(text)?;
    let raw = captures.get(1).or_else(|| captures.get(2))?.as_str();
    parse_number(raw)
}

/// 把单个价格值（如 `"$12.50"`、`"1.234,99 €"`、`"12"`）解析为数字
pub fn parse_price(value: &str) -> Option<f64> {
    let raw = NUMBER_RE.find(value)?.as_str();
    parse_number(raw)
}

/// 统一数字中的分隔符
///
/// 同时出现 `,` 和 `.` 时，最后出现的那个是小数点；
/// 只出现一个 `,` 时，后面恰好三位数字视为千位分隔符（`2,500`），否则视为小数点（`12,50`）。
fn parse_number(raw: &str) -> Option<f64> {
    let last_comma = raw.rfind(',');
    let last_dot = raw.rfind('.');

    let normalized = match (last_comma, last_dot) {
        (Some(comma), Some(dot)) if comma > dot => raw.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => raw.replace(',', ""),
        (Some(_), None) => {
            let is_thousands = raw
                .rsplit(',')
                .next()
                .is_some_and(|tail| tail.len() == 3);
            if raw.matches(',').count() > 1 || is_thousands {
                raw.replace(',', "")
            } else {
                raw.replace(',', ".")
            }
        }
        (None, Some(_)) if raw.matches('.').count() > 1 => raw.replace('.', ""),
        _ => raw.to_string(),
    };

    normalized.parse::<f64>().ok()
}
