//! 日志预览工具
use std::fmt::{self, Write};

/// 空白字符折叠 + 截断，用于在日志中打印源码片段
/// 不修改原字符串，仅在格式化输出时折叠，超长时追加省略号
#[inline(always)]
pub fn preview_compact<'a>(s: &'a str, max_len: usize) -> impl fmt::Display + 'a {
    struct CompactView<'a> {
        source: &'a str,
        max_length: usize,
    }

    impl fmt::Display for CompactView<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let mut char_count = 0;
            let mut last_was_whitespace = false;

            for ch in self.source.trim().chars() {
                if char_count >= self.max_length {
                    f.write_char('…')?;
                    break;
                }

                if ch.is_whitespace() {
                    if !last_was_whitespace {
                        f.write_char(' ')?;
                        char_count += 1;
                        last_was_whitespace = true;
                    }
                } else {
                    f.write_char(ch)?;
                    char_count += 1;
                    last_was_whitespace = false;
                }
            }
            Ok(())
        }
    }

    CompactView {
        source: s,
        max_length: max_len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_folds_whitespace() {
        let view = preview_compact("  <li>\n\n   <a>x</a>\t</li>  ", 80);
        assert_eq!(view.to_string(), "<li> <a>x</a> </li>");
    }

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview_compact("abcdef", 3).to_string(), "abc…");
        assert_eq!(preview_compact("abc", 3).to_string(), "abc");
    }
}
