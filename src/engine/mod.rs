//! 解释器核心：智能解析、规则链执行、依赖上下文解析
pub mod chain;
pub mod context;
pub mod resolver;

use std::fmt;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::extractor::Extractor;
use crate::rule::{DirectiveParser, Extracted, SearchMode};
use crate::utils::{DiagnosticSink, TracingSink, preview_compact};

pub use self::context::{ROOT_CONTEXT_ID, ResolvedContext};
pub use self::resolver::{FieldClassifier, KeywordClassifier};

/// 规则解释器
/// 无内部可变状态，可跨线程共享并发求值
#[derive(Clone)]
pub struct Engine {
    config: Arc<EngineConfig>,
    classifier: Arc<dyn FieldClassifier>,
    sink: Arc<dyn DiagnosticSink>,
}

impl Engine {
    /// 使用配置中的数组关键字与 tracing 诊断通道创建解释器
    pub fn new(config: EngineConfig) -> Self {
        let classifier = Arc::new(KeywordClassifier::new(config.array_keywords.clone()));
        Self::with_parts(config, classifier, Arc::new(TracingSink))
    }

    /// 注入自定义的数组字段判定与诊断通道
    pub fn with_parts(
        config: EngineConfig,
        classifier: Arc<dyn FieldClassifier>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            classifier,
            sink,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn classifier(&self) -> &dyn FieldClassifier {
        self.classifier.as_ref()
    }

    pub fn diagnostics(&self) -> &dyn DiagnosticSink {
        self.sink.as_ref()
    }

    /// 解析单条主规则（不含后处理语法）
    /// 规则或源码为空、剥离指令后规则为空时原样返回源码
    pub fn parse_rule(&self, source: &str, rule: &str) -> Extracted {
        self.parse_rule_with_mode(source, rule, self.config.default_search_mode)
    }

    pub fn parse_rule_with_mode(&self, source: &str, rule: &str, default_mode: SearchMode) -> Extracted {
        if rule.is_empty() || source.is_empty() {
            return Extracted::Scalar(source.to_string());
        }

        // 1. 识别指令并剥离
        let parsed = DirectiveParser::parse(rule, default_mode);
        if parsed.cleaned.is_empty() {
            return Extracted::Scalar(source.to_string());
        }

        // 2. 按搜索模式分派截取
        debug!(
            "解析规则: {} | 模式: {} | 源码: {}",
            parsed.cleaned,
            parsed.search_mode,
            preview_compact(source, self.config.log_preview_len)
        );
        Extractor::extract(source, &parsed.cleaned, parsed.search_mode, self.diagnostics())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine").field("config", &self.config).finish_non_exhaustive()
    }
}
