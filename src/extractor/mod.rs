//! 截取模块：四种可互换的搜索模式
//! 统一契约 `(源码, 规范化规则) -> 单值 | 有序数组`，内部失败降级为空结果并写入诊断通道
pub mod standard;
pub mod regex_mode;
pub mod json_path;
pub mod xpath;

use crate::rule::{Extracted, SearchMode};
use crate::utils::DiagnosticSink;

pub use self::json_path::JsonPathExtractor;
pub use self::regex_mode::RegexExtractor;
pub use self::standard::StandardExtractor;
pub use self::xpath::XPathExtractor;

/// 所有搜索模式的通用抽象特质
pub trait ExtractStrategy {
    /// 模式名称，用于日志标准化输出
    const MODE_NAME: &'static str;

    /// 核心截取逻辑 - 各模式唯一差异化实现点，不得 panic 或返回错误
    fn extract(source: &str, rule: &str, sink: &dyn DiagnosticSink) -> Extracted;
}

/// 按搜索模式分派的截取入口
pub struct Extractor;

impl Extractor {
    /// 空规则原样返回源码
    pub fn extract(source: &str, rule: &str, mode: SearchMode, sink: &dyn DiagnosticSink) -> Extracted {
        if rule.is_empty() {
            return Extracted::Scalar(source.to_string());
        }

        let result = match mode {
            SearchMode::Standard => StandardExtractor::extract(source, rule, sink),
            SearchMode::Regex => RegexExtractor::extract(source, rule, sink),
            SearchMode::XPath => XPathExtractor::extract(source, rule, sink),
            SearchMode::Json => JsonPathExtractor::extract(source, rule, sink),
        };

        debug!(
            "[{}]截取完成 | 规则: {} | 结果数: {}",
            Self::mode_name(mode),
            rule,
            result.len()
        );
        result
    }

    fn mode_name(mode: SearchMode) -> &'static str {
        match mode {
            SearchMode::Standard => StandardExtractor::MODE_NAME,
            SearchMode::Regex => RegexExtractor::MODE_NAME,
            SearchMode::XPath => XPathExtractor::MODE_NAME,
            SearchMode::Json => JsonPathExtractor::MODE_NAME,
        }
    }
}
