//! 自定义语法拆分
//! 将规则拆分为主规则与尾部 `[操作:参数]` 语法串，并解析为有序操作列表

use once_cell::sync::Lazy;
use regex::Regex;

use super::model::{SearchMode, SyntaxOp};
use crate::pipeline::Operation;

static SYNTAX_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(.*?)\]").unwrap());
static SYNTAX_KEY_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^:\]]+):?([^\]]*)$").unwrap());

/// 主规则 + 语法串
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitRule<'a> {
    pub main_rule: &'a str,
    pub syntax_suffix: &'a str,
}

pub struct RuleSyntax;

impl RuleSyntax {
    /// 匹配尾部最长的连续 `[...]` 串，之前的部分为主规则
    ///
    /// 标准模式下任何尾部方括号都视为语法；正则 / XPath / JSON 模式的方括号
    /// 属于表达式本身（字符类、谓词、下标），仅剥离键名为已知操作的方括号。
    pub fn split(rule: &str, mode: SearchMode) -> SplitRule<'_> {
        let trimmed = rule.trim_end();
        let mut boundary = trimmed.len();

        loop {
            let head = &trimmed[..boundary];
            if !head.ends_with(']') {
                break;
            }
            let close = boundary - 1;
            let Some(open) = head[..close].rfind('[') else {
                break;
            };
            let inner = &head[open + 1..close];
            if inner.contains(']') {
                break;
            }
            if mode != SearchMode::Standard && !Self::is_operation_token(inner) {
                break;
            }
            boundary = open;
        }

        SplitRule {
            main_rule: trimmed[..boundary].trim(),
            syntax_suffix: &trimmed[boundary..],
        }
    }

    /// 解析语法串为有序操作列表，格式不符的方括号忽略
    pub fn parse_ops(syntax: &str) -> Vec<SyntaxOp> {
        SYNTAX_TOKEN
            .captures_iter(syntax)
            .filter_map(|cap| {
                let inner = cap.get(1)?.as_str();
                let kv = SYNTAX_KEY_VALUE.captures(inner)?;
                Some(SyntaxOp {
                    key: kv.get(1)?.as_str().to_string(),
                    value: kv.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
                })
            })
            .collect()
    }

    fn is_operation_token(inner: &str) -> bool {
        let key = inner.split(':').next().unwrap_or_default();
        Operation::from_key(key).is_some()
    }
}
