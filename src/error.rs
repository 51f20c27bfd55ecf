//! 全局错误类型定义
//! 规则解释器本身（截取 / 后处理 / 规则链）从不返回错误，失败降级为空结果并写入诊断通道；
//! 只有依赖上下文解析与外部协作模块（规则集、请求模板、源码拉取）使用 `XbpqResult`。

use serde_json::Error as SerdeJsonError;
use thiserror::Error;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum XbpqError {
    // 字段 / 规则集相关错误
    #[error("字段不存在：{0}")]
    UnknownField(String),
    #[error("规则集解析失败：{0}")]
    RuleSetParseError(String),

    // 依赖解析相关错误
    #[error("父规则 \"{parent}\" 在其上下文中未能找到任何元素")]
    ParentNoMatch { parent: String },
    #[error("字段依赖存在循环：{0}")]
    DependencyCycle(String),

    // 请求 / 源码相关错误
    #[error("无效的请求模板：{0}")]
    InvalidRequestTemplate(String),
    #[error("规则链执行失败：{0}")]
    ChainFailed(String),
    #[error("源码拉取失败：{0}")]
    SourceFetchError(String),
    #[cfg(feature = "http")]
    #[error("网络请求失败：{0}")]
    HttpError(#[from] reqwest::Error),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),

    // 基础错误
    #[error("URL解析失败：{0}")]
    UrlError(#[from] UrlParseError),
    #[error("无效输入：{0}")]
    InvalidInput(String),
}

// 全局Result类型
pub type XbpqResult<T> = Result<T, XbpqError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn join(base: &str, link: &str) -> XbpqResult<String> {
        Ok(url::Url::parse(base)?.join(link)?.to_string())
    }

    fn parse_rules(json: &str) -> XbpqResult<serde_json::Value> {
        Ok(serde_json::from_str(json)?)
    }

    #[test]
    fn test_library_errors_convert_with_question_mark() {
        assert_eq!(join("https://a.test/x/", "../y").unwrap(), "https://a.test/y");
        assert!(matches!(join("not a url", "/y"), Err(XbpqError::UrlError(_))));
        assert!(matches!(parse_rules("{"), Err(XbpqError::JsonError(_))));
    }

    #[test]
    fn test_messages() {
        let err = XbpqError::ParentNoMatch { parent: "数组".into() };
        assert_eq!(err.to_string(), "父规则 \"数组\" 在其上下文中未能找到任何元素");
        assert_eq!(XbpqError::SourceFetchError("超时".into()).to_string(), "源码拉取失败：超时");
    }
}
