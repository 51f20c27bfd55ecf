//! 规则模块：规则数据模型、指令解析、语法拆分、字段元数据与规则集
pub mod model;
pub mod directive;
pub mod syntax;
pub mod registry;
pub mod rule_set;

// 导出核心接口
pub use self::model::{
    Encoding, ExecutionResult, Extracted, FieldDefinition, FieldMeta, MainPattern, RuleChainStep,
    SearchMode, SyntaxOp,
};
pub use self::directive::{DirectiveParser, ParsedRule};
pub use self::syntax::{RuleSyntax, SplitRule};
pub use self::registry::{FieldCategory, FieldRegistry};
pub use self::rule_set::RuleSet;
