//! 诊断通道
//! 非致命的降级情况（正则 / XPath 非法、JSON 解析失败等）写入诊断通道而不是抛出

use std::fmt;
use std::sync::Mutex;

/// 诊断类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// 正则模式编译或执行失败
    InvalidRegex,
    /// XPath 表达式非法或结果不是节点集
    InvalidXPath,
    /// JSON 模式源码解析失败（回退为原始源码）
    JsonParse,
    /// `[过滤]` 正则非法（过滤不生效）
    InvalidFilter,
    /// `[截取]` 嵌套超过上限
    NestingLimit,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::InvalidRegex => "正则错误",
            DiagnosticKind::InvalidXPath => "XPath错误",
            DiagnosticKind::JsonParse => "JSON解析失败",
            DiagnosticKind::InvalidFilter => "过滤正则错误",
            DiagnosticKind::NestingLimit => "嵌套截取超限",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// 只写诊断通道
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// 默认通道：转发到 tracing（`logging` 特性关闭时丢弃）
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
    }
}

/// 收集型通道，供调用方汇总展示
#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前已收集的诊断（拷贝）
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// 取出并清空
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn contains(&self, kind: DiagnosticKind) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|d| d.kind == kind)
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingSink::new();
        sink.report(Diagnostic::new(DiagnosticKind::InvalidRegex, "unclosed group"));
        assert!(sink.contains(DiagnosticKind::InvalidRegex));
        assert!(!sink.contains(DiagnosticKind::JsonParse));

        let taken = sink.take();
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].to_string(), "[正则错误] unclosed group");
        assert!(sink.snapshot().is_empty());
    }
}
