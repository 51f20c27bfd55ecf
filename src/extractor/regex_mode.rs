//! 正则模式
//! 恰好一个 `&&` 时按「转义前缀 + 非贪婪捕获 + 转义后缀」构造，否则整条规则即正则
//! 支持前后查找与反向引用（fancy-regex，无回溯特性时退回 regex 引擎）
use fancy_regex::Regex;

use super::ExtractStrategy;
use crate::rule::Extracted;
use crate::utils::{Diagnostic, DiagnosticKind, DiagnosticSink};

pub struct RegexExtractor;

impl ExtractStrategy for RegexExtractor {
    const MODE_NAME: &'static str = "正则";

    fn extract(source: &str, rule: &str, sink: &dyn DiagnosticSink) -> Extracted {
        if rule.is_empty() {
            return Extracted::Scalar(source.to_string());
        }

        let pattern = Self::build_pattern(rule);
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(e) => {
                sink.report(Diagnostic::new(
                    DiagnosticKind::InvalidRegex,
                    format!("正则 \"{}\" 编译失败: {}", pattern, e),
                ));
                return Extracted::Sequence(Vec::new());
            }
        };

        // 优先取第一个捕获组，捕获组为空时取整个匹配
        let mut matches = Vec::new();
        for cap in re.captures_iter(source) {
            let cap = match cap {
                Ok(cap) => cap,
                Err(e) => {
                    sink.report(Diagnostic::new(
                        DiagnosticKind::InvalidRegex,
                        format!("正则 \"{}\" 匹配中止: {}", pattern, e),
                    ));
                    break;
                }
            };
            let hit = cap
                .get(1)
                .filter(|m| !m.as_str().is_empty())
                .or_else(|| cap.get(0))
                .map(|m| m.as_str())
                .unwrap_or_default();
            if !hit.is_empty() {
                matches.push(hit.to_string());
            }
        }
        Extracted::Sequence(matches)
    }
}

impl RegexExtractor {
    pub fn build_pattern(rule: &str) -> String {
        let parts: Vec<&str> = rule.split("&&").collect();
        match parts.as_slice() {
            [prefix, suffix] => format!(r"{}([\s\S]*?){}", regex::escape(prefix), regex::escape(suffix)),
            _ => rule.to_string(),
        }
    }
}
