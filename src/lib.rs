//! xbpq - XBPQ 规则解释器
//! 截取 / 正则 / XPath / JSON 四种搜索模式，`[操作:参数]` 后处理，字段依赖规则链

// 导出全局错误类型
pub use self::error::{XbpqError, XbpqResult};

// 导出配置模块
pub use self::config::{ConfigManager, CustomConfigBuilder, EngineConfig};

// 导出规则模块核心接口
pub use self::rule::{
    DirectiveParser, Encoding, ExecutionResult, Extracted, FieldCategory, FieldDefinition, FieldMeta,
    FieldRegistry, ParsedRule, RuleChainStep, RuleSet, RuleSyntax, SearchMode, SplitRule,
};

// 导出截取模块核心接口
pub use self::extractor::{ExtractStrategy, Extractor};

// 导出后处理模块核心接口
pub use self::pipeline::{Operation, Pipeline, PipelineHost};

// 导出解释器核心接口
pub use self::engine::{Engine, FieldClassifier, KeywordClassifier, ROOT_CONTEXT_ID, ResolvedContext};

// 导出工具模块核心接口
pub use self::utils::{CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};

// 导出源码协作接口
pub use self::source::{RequestTemplate, SourceProvider, SourceRequest, discover_detail_url, fetch_and_run};

// 声明所有子模块
#[macro_use]
mod macros;
pub mod config;
pub mod error;
pub mod rule;
pub mod extractor;
pub mod pipeline;
pub mod engine;
pub mod utils;
pub mod source;
