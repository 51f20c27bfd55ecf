//! 数组操作：包含 / 不包含 / 过滤 / 倒序 / 首尾 / 去重
use std::collections::HashSet;

use fancy_regex::Regex;

use super::Operation;
use crate::utils::{Diagnostic, DiagnosticKind, DiagnosticSink};

pub(crate) fn apply(
    items: Vec<String>,
    operation: Operation,
    arg: &str,
    sink: &dyn DiagnosticSink,
) -> Vec<String> {
    match operation {
        Operation::Include => include_all(items, arg),
        Operation::Exclude => exclude_any(items, arg),
        Operation::Filter => filter(items, arg, sink),
        Operation::Reverse => {
            let mut items = items;
            items.reverse();
            items
        }
        Operation::FirstLast => first_last(items),
        Operation::Dedupe => dedupe(items),
        _ => items,
    }
}

/// 保留包含全部关键词的元素（`&` 分隔）
pub fn include_all(items: Vec<String>, keywords: &str) -> Vec<String> {
    let keywords: Vec<&str> = keywords.split('&').collect();
    items
        .into_iter()
        .filter(|item| keywords.iter().all(|kw| item.contains(kw)))
        .collect()
}

/// 剔除包含任一关键词的元素，空关键词不参与匹配
pub fn exclude_any(items: Vec<String>, keywords: &str) -> Vec<String> {
    let keywords: Vec<&str> = keywords.split('&').filter(|kw| !kw.is_empty()).collect();
    items
        .into_iter()
        .filter(|item| !keywords.iter().any(|kw| item.contains(kw)))
        .collect()
}

/// 忽略大小写的正则过滤；正则非法时不生效，匹配超出回溯上限的元素视为不匹配
pub fn filter(items: Vec<String>, pattern: &str, sink: &dyn DiagnosticSink) -> Vec<String> {
    match Regex::new(&format!("(?i){}", pattern)) {
        Ok(re) => items
            .into_iter()
            .filter(|item| re.is_match(item).unwrap_or(false))
            .collect(),
        Err(e) => {
            sink.report(Diagnostic::new(
                DiagnosticKind::InvalidFilter,
                format!("过滤正则 \"{}\" 无效: {}", pattern, e),
            ));
            items
        }
    }
}

/// 只保留首尾元素，不足两个时原样返回
pub fn first_last(mut items: Vec<String>) -> Vec<String> {
    if items.len() <= 1 {
        return items;
    }
    let last = items.swap_remove(items.len() - 1);
    items.truncate(1);
    items.push(last);
    items
}

/// 去重，保留首次出现的顺序
pub fn dedupe(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::CollectingSink;

    fn v(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_include_and_exclude() {
        let items = v(&["第1集 高清", "第2集 标清", "预告 高清"]);
        assert_eq!(include_all(items.clone(), "集&高清"), v(&["第1集 高清"]));
        assert_eq!(exclude_any(items.clone(), "预告&标清"), v(&["第1集 高清"]));
        assert_eq!(exclude_any(items.clone(), ""), items);
    }

    #[test]
    fn test_filter_case_insensitive() {
        let sink = CollectingSink::new();
        let items = v(&["Video.MP4", "cover.jpg", "clip.mp4"]);
        assert_eq!(filter(items.clone(), r"\.mp4$", &sink), v(&["Video.MP4", "clip.mp4"]));
        assert!(!sink.contains(DiagnosticKind::InvalidFilter));

        assert_eq!(filter(items.clone(), "(", &sink), items);
        assert!(sink.contains(DiagnosticKind::InvalidFilter));
    }

    #[test]
    fn test_filter_with_lookahead() {
        let sink = CollectingSink::new();
        let items = v(&["第01集", "第02集预告", "第03集"]);
        assert_eq!(filter(items, r"^第\d+集(?!预告)", &sink), v(&["第01集", "第03集"]));
        assert!(!sink.contains(DiagnosticKind::InvalidFilter));
    }

    #[test]
    fn test_first_last() {
        assert_eq!(first_last(v(&["a", "b", "c", "d"])), v(&["a", "d"]));
        assert_eq!(first_last(v(&["a", "b"])), v(&["a", "b"]));
        assert_eq!(first_last(v(&["a"])), v(&["a"]));
        assert!(first_last(Vec::new()).is_empty());
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        assert_eq!(dedupe(v(&["b", "a", "b", "c", "a"])), v(&["b", "a", "c"]));
    }
}
