//! XPath 模式
//! 源码按 HTML 文档解析，规则按 XPath 表达式求值，结果必须为节点集
mod dom;
mod eval;
mod lexer;
mod parser;

use scraper::Html;
use thiserror::Error;

use self::dom::Dom;
use self::eval::{Evaluator, Value};
use super::ExtractStrategy;
use crate::rule::Extracted;
use crate::utils::{Diagnostic, DiagnosticKind, DiagnosticSink};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum XPathError {
    #[error("非法字符 '{0}'（位置 {1}）")]
    UnexpectedChar(char, usize),

    #[error("字符串字面量未闭合（位置 {0}）")]
    UnterminatedLiteral(usize),

    #[error("意外的记号: {0}")]
    UnexpectedToken(String),

    #[error("表达式意外结束")]
    UnexpectedEnd,

    #[error("不支持的轴: {0}")]
    UnknownAxis(String),

    #[error("不支持的函数: {0}()")]
    UnknownFunction(String),

    #[error("函数 {name}() 参数个数错误: {given}")]
    ArgumentCount { name: String, given: usize },

    #[error("结果不是节点集")]
    NotNodeSet,

    #[error("表达式嵌套过深（上限 {0} 层）")]
    TooDeep(usize),

    #[error("表达式过长（上限 {0} 个记号）")]
    TooLong(usize),
}

/// 对 HTML 源码求值 XPath 表达式，按文档顺序输出各节点的文本
pub fn evaluate(source: &str, expression: &str) -> Result<Vec<String>, XPathError> {
    let tokens = lexer::tokenize(expression)?;
    let ast = parser::parse(&tokens)?;

    let html = Html::parse_document(source);
    let dom = Dom::build(&html);
    let evaluator = Evaluator::new(&dom);

    match evaluator.evaluate(&ast)? {
        Value::Nodes(items) => Ok(items
            .into_iter()
            .map(|item| evaluator.render(item))
            .filter(|s| !s.is_empty())
            .collect()),
        _ => Err(XPathError::NotNodeSet),
    }
}

pub struct XPathExtractor;

impl ExtractStrategy for XPathExtractor {
    const MODE_NAME: &'static str = "XPath";

    fn extract(source: &str, rule: &str, sink: &dyn DiagnosticSink) -> Extracted {
        if rule.is_empty() {
            return Extracted::Scalar(source.to_string());
        }

        match evaluate(source, rule) {
            Ok(items) => Extracted::Sequence(items),
            Err(e) => {
                sink.report(Diagnostic::new(
                    DiagnosticKind::InvalidXPath,
                    format!("XPath \"{}\" 求值失败: {}", rule, e),
                ));
                Extracted::Sequence(Vec::new())
            }
        }
    }
}
