//! 工具模块：诊断通道、日志预览、URL 组件编解码
pub mod diagnostics;
pub mod preview;
pub mod url_codec;

pub use self::diagnostics::{CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
pub use self::preview::preview_compact;
pub use self::url_codec::{decode_component, encode_component};
