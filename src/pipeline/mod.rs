//! 后处理流水线
//! 将尾部 `[操作:参数]` 语法串按从左到右顺序折叠到截取结果上，按当前值形态分派
pub mod scalar;
pub mod sequence;

use crate::rule::{Extracted, RuleSyntax};
use crate::utils::DiagnosticSink;

/// 流水线宿主：提供 `[截取]` 的嵌套解释能力与诊断通道
pub trait PipelineHost {
    /// 以标量为新源码、操作参数为新规则重新调用完整解释器
    fn nested_extract(&self, source: &str, rule: &str) -> Extracted;

    fn diagnostics(&self) -> &dyn DiagnosticSink;
}

/// 值形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Sequence,
    Scalar,
}

/// 后处理操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    // 数组操作
    Include,
    Exclude,
    Filter,
    Reverse,
    FirstLast,
    Dedupe,
    // 字符串操作
    Replace,
    Nested,
    Prefix,
    Suffix,
    Remove,
    Upper,
    Lower,
    StripSpaces,
    CollapseSpaces,
    UrlDecode,
    UrlEncode,
}

impl Operation {
    /// 未知键名返回 None（流水线中视为空操作）
    pub fn from_key(key: &str) -> Option<Self> {
        let op = match key {
            "包含" => Operation::Include,
            "不包含" => Operation::Exclude,
            "过滤" => Operation::Filter,
            "倒序" => Operation::Reverse,
            "首尾" => Operation::FirstLast,
            "去重" => Operation::Dedupe,
            "替换" => Operation::Replace,
            "截取" => Operation::Nested,
            "前缀" => Operation::Prefix,
            "后缀" | "连接" => Operation::Suffix,
            "移除" => Operation::Remove,
            "大写" => Operation::Upper,
            "小写" => Operation::Lower,
            "去空格" => Operation::StripSpaces,
            "整理空格" => Operation::CollapseSpaces,
            "URL解码" => Operation::UrlDecode,
            "URL编码" => Operation::UrlEncode,
            _ => return None,
        };
        Some(op)
    }

    /// 操作接受的值形态，形态不符时跳过
    pub fn accepts(self) -> Shape {
        match self {
            Operation::Include
            | Operation::Exclude
            | Operation::Filter
            | Operation::Reverse
            | Operation::FirstLast
            | Operation::Dedupe => Shape::Sequence,
            _ => Shape::Scalar,
        }
    }
}

pub struct Pipeline;

impl Pipeline {
    /// 对截取结果应用语法串；空语法串原样返回
    pub fn apply(value: Extracted, syntax: &str, host: &dyn PipelineHost) -> Extracted {
        if syntax.is_empty() {
            return value;
        }

        RuleSyntax::parse_ops(syntax)
            .into_iter()
            .fold(value, |current, op| {
                let Some(operation) = Operation::from_key(&op.key) else {
                    debug!("未知后处理操作，跳过: {}", op);
                    return current;
                };
                Self::apply_one(current, operation, &op.value, host)
            })
    }

    fn apply_one(value: Extracted, operation: Operation, arg: &str, host: &dyn PipelineHost) -> Extracted {
        match (value, operation.accepts()) {
            (Extracted::Sequence(items), Shape::Sequence) => {
                Extracted::Sequence(sequence::apply(items, operation, arg, host.diagnostics()))
            }
            (Extracted::Scalar(s), Shape::Scalar) => {
                if operation == Operation::Nested {
                    return host.nested_extract(&s, arg);
                }
                Extracted::Scalar(scalar::apply(s, operation, arg))
            }
            // 形态不符 / 路径缺失
            (other, _) => other,
        }
    }
}
