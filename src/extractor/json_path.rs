//! JSON 路径模式
//! 规则按 `.` 分段，`key[index]` 先取成员再取下标；任一段缺失即停止
use serde_json::Value;

use super::ExtractStrategy;
use crate::rule::Extracted;
use crate::utils::{Diagnostic, DiagnosticKind, DiagnosticSink, preview_compact};

pub struct JsonPathExtractor;

impl ExtractStrategy for JsonPathExtractor {
    const MODE_NAME: &'static str = "JSON";

    fn extract(source: &str, rule: &str, sink: &dyn DiagnosticSink) -> Extracted {
        if rule.is_empty() {
            return Extracted::Scalar(source.to_string());
        }

        // 解析失败回退为原始源码
        let json: Value = match serde_json::from_str(source.trim_start_matches('\u{feff}')) {
            Ok(v) => v,
            Err(e) => {
                sink.report(Diagnostic::new(
                    DiagnosticKind::JsonParse,
                    format!("源码不是合法 JSON ({})：{}", e, preview_compact(source, 60)),
                ));
                return Extracted::Scalar(source.to_string());
            }
        };

        match Self::resolve(&json, rule) {
            Some(value) => Self::to_extracted(value),
            None => Extracted::Missing,
        }
    }
}

impl JsonPathExtractor {
    /// 按路径逐段下钻
    pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
        path.split('.').try_fold(root, |node, segment| Self::step(node, segment))
    }

    fn step<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
        let Some((key, indexes)) = segment.split_once('[').filter(|_| segment.contains(']')) else {
            return Self::member(node, segment);
        };

        let mut current = if key.is_empty() { node } else { Self::member(node, key)? };
        // 支持连续下标 `a[0][1]`
        for raw in indexes.split('[') {
            let index = raw.trim_end_matches(']').trim();
            current = match index.parse::<usize>() {
                Ok(i) => Self::index(current, i)?,
                Err(_) => Self::member(current, index.trim_matches(|c: char| c == '"' || c == '\''))?,
            };
        }
        Some(current)
    }

    fn member<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
        match node {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    fn index(node: &Value, i: usize) -> Option<&Value> {
        match node {
            Value::Array(items) => items.get(i),
            Value::Object(map) => map.get(&i.to_string()),
            _ => None,
        }
    }

    /// 终值转换：数组展开为有序序列（跳过 null），对象序列化为 JSON 文本
    pub fn to_extracted(value: &Value) -> Extracted {
        match value {
            Value::Null => Extracted::Missing,
            Value::String(s) => Extracted::Scalar(s.clone()),
            Value::Array(items) => Extracted::Sequence(
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::Null => None,
                        Value::String(s) => Some(s.clone()),
                        other => Some(other.to_string()),
                    })
                    .collect(),
            ),
            other => Extracted::Scalar(other.to_string()),
        }
    }
}
