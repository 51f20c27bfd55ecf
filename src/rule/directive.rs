//! 规则指令解析
//! 负责识别并剥离 `编码:` / `搜索模式:` 声明，以及处理 `+` 连接符

use once_cell::sync::Lazy;
use regex::Regex;

use super::model::{Encoding, SearchMode};

static ENCODING_DIRECTIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"编码[:：]([^#\s]+)").unwrap());
static ENCODING_STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"编码[:：][^#\s]*#?").unwrap());
static SEARCH_MODE_DIRECTIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"搜索模式[:：]?([0-9]+)").unwrap());
static SEARCH_MODE_STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"搜索模式[:：]?[0-9]+#?").unwrap());

/// 指令解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRule {
    pub encoding: Option<Encoding>,
    pub search_mode: SearchMode,
    /// 剥离指令、处理连接符后的规则文本
    pub cleaned: String,
}

/// 指令解析器（无状态，解析失败时原样保留规则）
pub struct DirectiveParser;

impl DirectiveParser {
    /// 解析原始规则：先确定搜索模式，再剥离指令，最后处理连接符
    pub fn parse(raw_rule: &str, default_mode: SearchMode) -> ParsedRule {
        let encoding = Self::detect_encoding(raw_rule);
        let search_mode = Self::detect_search_mode(raw_rule).unwrap_or(default_mode);

        let stripped = Self::strip_directives(raw_rule);
        let cleaned = if Self::joins_literals(search_mode, &stripped) {
            Self::resolve_connections(&stripped)
        } else {
            stripped
        };

        if encoding.is_some() || search_mode != SearchMode::Standard {
            debug!("规则指令：编码={:?}，搜索模式={}", encoding, search_mode);
        }

        ParsedRule {
            encoding,
            search_mode,
            cleaned,
        }
    }

    /// 识别编码声明
    pub fn detect_encoding(raw_rule: &str) -> Option<Encoding> {
        ENCODING_DIRECTIVE
            .captures(raw_rule)
            .and_then(|cap| cap.get(1))
            .map(|m| Encoding::from_label(m.as_str()))
    }

    /// 识别搜索模式声明
    pub fn detect_search_mode(raw_rule: &str) -> Option<SearchMode> {
        SEARCH_MODE_DIRECTIVE
            .captures(raw_rule)
            .and_then(|cap| cap.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .map(SearchMode::from_code)
    }

    /// 移除全部指令及其后的 `#` 分隔符
    pub fn strip_directives(raw_rule: &str) -> String {
        let without_encoding = ENCODING_STRIP.replace_all(raw_rule, "");
        SEARCH_MODE_STRIP
            .replace_all(&without_encoding, "")
            .trim()
            .to_string()
    }

    /// 处理 `+` 连接符：`前缀&&后缀` 两侧各自拼接，无 `&&` 时整体拼接
    pub fn resolve_connections(rule: &str) -> String {
        if rule.contains("&&") {
            let mut parts = rule.split("&&");
            let left = parts.next().unwrap_or_default().replace('+', "");
            let right = parts.next().unwrap_or_default().replace('+', "");
            format!("{}&&{}", left, right)
        } else if rule.contains('+') {
            rule.replace('+', "")
        } else {
            rule.to_string()
        }
    }

    /// 只有字面量片段参与 `+` 拼接：标准模式，以及单个 `&&` 的正则前后缀
    fn joins_literals(mode: SearchMode, rule: &str) -> bool {
        match mode {
            SearchMode::Standard => true,
            SearchMode::Regex => rule.matches("&&").count() == 1,
            SearchMode::XPath | SearchMode::Json => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_search_mode_and_encoding() {
        let parsed = DirectiveParser::parse("编码:gbk#搜索模式:1#<a>&&</a>", SearchMode::Standard);
        assert_eq!(parsed.encoding, Some(Encoding::Gbk));
        assert_eq!(parsed.search_mode, SearchMode::Regex);
        assert_eq!(parsed.cleaned, "<a>&&</a>");
    }

    #[test]
    fn test_full_width_colon() {
        let parsed = DirectiveParser::parse("搜索模式：3#data.list", SearchMode::Standard);
        assert_eq!(parsed.search_mode, SearchMode::Json);
        assert_eq!(parsed.cleaned, "data.list");
        assert_eq!(parsed.encoding, None);
    }

    #[test]
    fn test_default_mode_when_absent() {
        let parsed = DirectiveParser::parse("//li/a/@href", SearchMode::XPath);
        assert_eq!(parsed.search_mode, SearchMode::XPath);
        assert_eq!(parsed.cleaned, "//li/a/@href");
    }

    #[test]
    fn test_unknown_encoding_defaults_to_utf8() {
        let parsed = DirectiveParser::parse("编码:koi8-r#title=\"&&\"", SearchMode::Standard);
        assert_eq!(parsed.encoding, Some(Encoding::Utf8));
        assert_eq!(parsed.cleaned, "title=\"&&\"");
    }

    #[test]
    fn test_malformed_directive_is_kept() {
        let parsed = DirectiveParser::parse("搜索模式:x#abc", SearchMode::Standard);
        assert_eq!(parsed.search_mode, SearchMode::Standard);
        assert_eq!(parsed.cleaned, "搜索模式:x#abc");
    }

    #[test]
    fn test_connection_operators() {
        assert_eq!(DirectiveParser::resolve_connections("<a+ href=\"&&\"+>"), "<a href=\"&&\">");
        assert_eq!(DirectiveParser::resolve_connections("a+b+c"), "abc");
        assert_eq!(DirectiveParser::resolve_connections("a&&b&&c"), "a&&b");
        assert_eq!(DirectiveParser::resolve_connections("plain"), "plain");
    }

    #[test]
    fn test_raw_regex_keeps_plus() {
        let parsed = DirectiveParser::parse("搜索模式:1#id=(\\d+)", SearchMode::Standard);
        assert_eq!(parsed.cleaned, "id=(\\d+)");

        let pair = DirectiveParser::parse("搜索模式:1#<b+>&&</b>", SearchMode::Standard);
        assert_eq!(pair.cleaned, "<b>&&</b>");
    }
}
