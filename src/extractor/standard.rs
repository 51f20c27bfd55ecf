//! 标准截取模式
//! 按优先级依次尝试：标签数组 → 属性批量 → 标签内容批量 → 通用 `前缀&&后缀` → 字面分割
use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use super::ExtractStrategy;
use crate::rule::{Extracted, MainPattern};
use crate::utils::DiagnosticSink;

/// 支持数组截取的标签（`&&</tag>`）
const ARRAY_TAGS: [(&str, &str); 18] = [
    ("&&</a>", "a"),
    ("&&</li>", "li"),
    ("&&</div>", "div"),
    ("&&</span>", "span"),
    ("&&</p>", "p"),
    ("&&</h1>", "h1"),
    ("&&</h2>", "h2"),
    ("&&</h3>", "h3"),
    ("&&</h4>", "h4"),
    ("&&</h5>", "h5"),
    ("&&</h6>", "h6"),
    ("&&</td>", "td"),
    ("&&</tr>", "tr"),
    ("&&</dl>", "dl"),
    ("&&</dt>", "dt"),
    ("&&</dd>", "dd"),
    ("&&</ul>", "ul"),
    ("&&</ol>", "ol"),
];

static ATTRIBUTE_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^([^\s=]+)=["']&&["']$"#).unwrap());
static TAG_CONTENT_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<([a-zA-Z0-9]+)[^>]*>&&</([a-zA-Z0-9]+)>$").unwrap());

pub struct StandardExtractor;

impl ExtractStrategy for StandardExtractor {
    const MODE_NAME: &'static str = "标准";

    fn extract(source: &str, rule: &str, _sink: &dyn DiagnosticSink) -> Extracted {
        if rule.is_empty() {
            return Extracted::Scalar(source.to_string());
        }

        if rule.contains("&&</") {
            if let Some(tag) = Self::array_tag(rule) {
                return Extracted::Sequence(Self::extract_tag_array(source, rule, tag));
            }
        }

        if let Some(attr) = ATTRIBUTE_RULE.captures(rule).and_then(|c| c.get(1)) {
            return Extracted::Sequence(Self::extract_attributes(source, attr.as_str()));
        }

        if let Some(cap) = TAG_CONTENT_RULE.captures(rule) {
            let (open, close) = (&cap[1], &cap[2]);
            if open == close {
                return Extracted::Sequence(Self::extract_tag_contents(source, open));
            }
        }

        match MainPattern::of(rule) {
            MainPattern::Pair { prefix, suffix } => match Self::perform_string_extraction(source, prefix, suffix) {
                Some(slice) => Extracted::Scalar(slice.to_string()),
                None => Extracted::Sequence(Vec::new()),
            },
            MainPattern::Literal(delimiter) => {
                Extracted::Sequence(source.split(delimiter).map(str::to_string).collect())
            }
        }
    }
}

impl StandardExtractor {
    fn array_tag(rule: &str) -> Option<&'static str> {
        ARRAY_TAGS
            .iter()
            .find(|(pattern, _)| rule.contains(*pattern))
            .map(|(_, tag)| *tag)
    }

    /// 从上次结束位置起，依次定位「前缀起点 … 下一个闭合标签终点」作为一个数组元素
    pub fn extract_tag_array(source: &str, rule: &str, tag: &str) -> Vec<String> {
        let start = rule.split("&&").next().unwrap_or_default();
        let end_tag = format!("</{}>", tag);
        let open_tag = format!("<{}", tag);

        let mut items = Vec::new();
        let mut cursor = 0;
        while let Some(found) = source[cursor..].find(start) {
            let begin = cursor + found;
            let Some(rel_end) = source[begin..].find(&end_tag) else {
                break;
            };
            let end = begin + rel_end + end_tag.len();
            let content = &source[begin..end];
            if content.contains(&open_tag) || content.starts_with(start) {
                items.push(content.to_string());
            }
            cursor = end;
        }
        items
    }

    /// 依次尝试双引号、单引号、无引号三种属性写法，合并去重
    pub fn extract_attributes(source: &str, attr: &str) -> Vec<String> {
        let name = regex::escape(attr);
        let patterns = [
            format!(r#"{}\s*=\s*"([^"]*)""#, name),
            format!(r#"{}\s*=\s*'([^']*)'"#, name),
            format!(r#"{}\s*=\s*([^\s>"'][^\s>]*)"#, name),
        ];

        let mut seen = HashSet::new();
        let mut values = Vec::new();
        for pattern in &patterns {
            let Ok(re) = RegexBuilder::new(pattern).case_insensitive(true).build() else {
                continue;
            };
            for cap in re.captures_iter(source) {
                let Some(value) = cap.get(1).map(|m| m.as_str()) else {
                    continue;
                };
                if !value.is_empty() && seen.insert(value) {
                    values.push(value.to_string());
                }
            }
        }
        values
    }

    /// 同名标签对的内容（去首尾空白，跳过空内容）
    pub fn extract_tag_contents(source: &str, tag: &str) -> Vec<String> {
        let name = regex::escape(tag);
        let pattern = format!(r"<{}\b[^>]*>([\s\S]*?)</{}>", name, name);
        let Ok(re) = RegexBuilder::new(&pattern).case_insensitive(true).build() else {
            return Vec::new();
        };
        re.captures_iter(source)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// 通用前后缀截取
    ///
    /// 前缀未找到为硬失败（返回 None）；`+` 分段的后缀找不到时保留前缀截取结果，
    /// 单段后缀找不到同样为硬失败。
    pub fn perform_string_extraction<'a>(source: &'a str, prefix: &str, suffix: &str) -> Option<&'a str> {
        let mut result = source;

        if !prefix.is_empty() {
            if prefix.contains('+') {
                for segment in prefix.split('+').filter(|s| !s.is_empty()) {
                    let index = result.find(segment)?;
                    result = &result[index + segment.len()..];
                }
            } else {
                let index = result.find(prefix)?;
                result = &result[index + prefix.len()..];
            }
        }

        if !suffix.is_empty() {
            if suffix.contains('+') {
                let mut boundary = 0;
                for segment in suffix.split('+').filter(|s| !s.is_empty()) {
                    match result[boundary..].find(segment) {
                        Some(index) => boundary += index,
                        None => return Some(result),
                    }
                }
                result = &result[..boundary];
            } else {
                let index = result.find(suffix)?;
                result = &result[..index];
            }
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::TracingSink;

    fn extract(source: &str, rule: &str) -> Extracted {
        StandardExtractor::extract(source, rule, &TracingSink)
    }

    fn seq(items: &[&str]) -> Extracted {
        Extracted::Sequence(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_literal_split() {
        assert_eq!(extract("a#b##c", "#"), seq(&["a", "b", "", "c"]));
        assert_eq!(extract("abc", "|"), seq(&["abc"]));
    }

    #[test]
    fn test_tag_array() {
        let html = r#"<ul><li class="x">1</li><li class="x">2</li><li>3</li></ul>"#;
        assert_eq!(
            extract(html, r#"<li class="x">&&</li>"#),
            seq(&[r#"<li class="x">1</li>"#, r#"<li class="x">2</li>"#])
        );
        assert_eq!(extract(html, "<li&&</li>"), seq(&[
            r#"<li class="x">1</li>"#,
            r#"<li class="x">2</li>"#,
            "<li>3</li>",
        ]));
    }

    #[test]
    fn test_unknown_close_tag_falls_through() {
        // 非数组标签按标签内容批量截取
        let html = "<em>a</em><em> </em><EM class=k>b</EM>";
        assert_eq!(extract(html, "<em>&&</em>"), seq(&["a", "b"]));
    }

    #[test]
    fn test_attribute_batch() {
        let html = r#"<a href="/1.html">x</a><a href='/2.html'>y</a><a HREF=/3.html>z</a><a href="/1.html">dup</a>"#;
        assert_eq!(extract(html, r#"href="&&""#), seq(&["/1.html", "/2.html", "/3.html"]));
        assert_eq!(extract(html, "href='&&'"), seq(&["/1.html", "/2.html", "/3.html"]));
    }

    #[test]
    fn test_tag_content_does_not_match_prefixed_names() {
        let html = "<b>bold</b><br><br/><b id=1>  </b>";
        assert_eq!(extract(html, "<b>&&</b>"), seq(&["bold"]));
    }

    #[test]
    fn test_generic_pair() {
        let src = r#"var a = "Hello"; var b = 2;"#;
        assert_eq!(extract(src, r#"a = "&&""#), Extracted::Scalar("Hello".into()));
        assert_eq!(extract(src, "&&;"), Extracted::Scalar(r#"var a = "Hello""#.into()));
        assert_eq!(extract(src, "b = &&"), Extracted::Scalar("2;".into()));
        // 前缀缺失、单段后缀缺失均为硬失败
        assert_eq!(extract(src, "c = &&;"), Extracted::Sequence(Vec::new()));
        assert_eq!(extract(src, r#"a = "&&'"#), Extracted::Sequence(Vec::new()));
    }

    #[test]
    fn test_same_name_tag_pair_uses_content_batch() {
        let src = "xx<title>Hello</title>yy";
        assert_eq!(extract(src, "<title>&&</title>"), seq(&["Hello"]));
        assert_eq!(extract(src, "</title>&&"), Extracted::Scalar("yy".into()));
    }

    #[test]
    fn test_prefix_fragments() {
        let src = "id=1;name=a;id=2;name=b;";
        assert_eq!(StandardExtractor::perform_string_extraction(src, "id=2+name=", ";"), Some("b"));
        assert_eq!(StandardExtractor::perform_string_extraction(src, "id=3+name=", ";"), None);
    }

    #[test]
    fn test_suffix_fragments_degrade_softly() {
        let src = "<p>text<i>x</i></p>tail";
        // 截断位置为最后一个片段的起点
        assert_eq!(StandardExtractor::perform_string_extraction(src, "<p>", "<i>+</p>"), Some("text<i>x</i>"));
        assert_eq!(
            StandardExtractor::perform_string_extraction(src, "<p>", "<q>+</p>"),
            Some("text<i>x</i></p>tail")
        );
    }
}
