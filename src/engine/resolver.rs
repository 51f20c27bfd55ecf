//! 智能解析：指令解析 + 截取 + 后处理 + 结果形态归一

use super::Engine;
use crate::pipeline::{Pipeline, PipelineHost};
use crate::rule::{DirectiveParser, Extracted, FieldMeta, RuleSyntax};
use crate::utils::{Diagnostic, DiagnosticKind, DiagnosticSink};

/// 数组字段判定（可注入）
pub trait FieldClassifier: Send + Sync {
    fn is_array(&self, field: &dyn FieldMeta) -> bool;
}

/// 默认判定：类型为 `array`（忽略大小写），或字段ID / 名称包含任一关键字
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl KeywordClassifier {
    pub fn new(keywords: Vec<String>) -> Self {
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl FieldClassifier for KeywordClassifier {
    fn is_array(&self, field: &dyn FieldMeta) -> bool {
        field.field_type().eq_ignore_ascii_case("array")
            || self
                .keywords
                .iter()
                .filter(|kw| !kw.is_empty())
                .any(|kw| field.id().contains(kw.as_str()) || field.key().contains(kw.as_str()))
    }
}

/// `[截取]` 的嵌套解释作用域，携带当前嵌套深度
struct NestedScope<'e> {
    engine: &'e Engine,
    depth: usize,
}

impl PipelineHost for NestedScope<'_> {
    fn nested_extract(&self, source: &str, rule: &str) -> Extracted {
        if self.depth >= self.engine.config.max_nested_depth {
            self.engine.diagnostics().report(Diagnostic::new(
                DiagnosticKind::NestingLimit,
                format!("嵌套截取超过 {} 层，规则 \"{}\" 未执行", self.engine.config.max_nested_depth, rule),
            ));
            return Extracted::Scalar(source.to_string());
        }
        self.engine.evaluate_at(source, rule, self.depth + 1)
    }

    fn diagnostics(&self) -> &dyn DiagnosticSink {
        self.engine.diagnostics()
    }
}

impl Engine {
    /// 智能解析：对单个源码片段执行一条完整规则，并按字段是否为数组归一结果
    pub fn resolve(&self, source: &str, rule: &str, field: &dyn FieldMeta) -> Vec<String> {
        let is_array = self.classifier.is_array(field);
        let value = self.evaluate(source, rule);
        let items = Self::normalize(value, is_array);
        debug!(
            "字段 {} ({}) 解析完成 | 数组字段: {} | 结果数: {}",
            field.id(),
            field.key(),
            is_array,
            items.len()
        );
        items
    }

    /// 完整规则求值（主规则截取 + 后处理），不做形态归一
    pub fn evaluate(&self, source: &str, rule: &str) -> Extracted {
        self.evaluate_at(source, rule, 0)
    }

    fn evaluate_at(&self, source: &str, rule: &str, depth: usize) -> Extracted {
        // 1. 先确定搜索模式（决定尾部方括号的归属）
        let mode = DirectiveParser::detect_search_mode(rule).unwrap_or(self.config.default_search_mode);

        // 2. 拆分主规则与语法串
        let split = RuleSyntax::split(rule, mode);

        // 3. 截取 + 后处理
        let extracted = self.parse_rule_with_mode(source, split.main_rule, mode);
        if split.syntax_suffix.is_empty() {
            return extracted;
        }
        let scope = NestedScope { engine: self, depth };
        Pipeline::apply(extracted, split.syntax_suffix, &scope)
    }

    /// 结果形态归一
    /// 数组：数组字段保留全部非空元素，单值字段只取首个；单值：非空时包装为单元素
    pub fn normalize(value: Extracted, is_array: bool) -> Vec<String> {
        match value {
            Extracted::Sequence(items) if is_array => items.into_iter().filter(|s| !s.is_empty()).collect(),
            Extracted::Sequence(items) => items.into_iter().take(1).filter(|s| !s.is_empty()).collect(),
            Extracted::Scalar(s) if !s.is_empty() => vec![s],
            _ => Vec::new(),
        }
    }
}
