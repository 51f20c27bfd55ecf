//! 字符串操作（`截取` 由流水线宿主处理）
use once_cell::sync::Lazy;
use regex::Regex;

use super::Operation;
use crate::utils::{decode_component, encode_component};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub(crate) fn apply(value: String, operation: Operation, arg: &str) -> String {
    match operation {
        Operation::Replace => replace_pairs(value, arg),
        Operation::Prefix => format!("{}{}", arg, value),
        Operation::Suffix => value + arg,
        Operation::Remove if !arg.is_empty() => value.replace(arg, ""),
        Operation::Upper => value.to_uppercase(),
        Operation::Lower => value.to_lowercase(),
        Operation::StripSpaces => WHITESPACE_RUN.replace_all(&value, "").into_owned(),
        Operation::CollapseSpaces => WHITESPACE_RUN.replace_all(&value, " ").trim().to_string(),
        Operation::UrlDecode => match decode_component(&value) {
            Some(decoded) => decoded.into_owned(),
            None => value,
        },
        Operation::UrlEncode => encode_component(&value).into_owned(),
        _ => value,
    }
}

/// 多重替换 `old1=>new1&old2=>new2`，按顺序逐对全部替换
/// 不是恰好两段的替换对忽略
pub fn replace_pairs(value: String, pairs: &str) -> String {
    pairs.split('&').fold(value, |acc, pair| {
        let parts: Vec<&str> = pair.split("=>").collect();
        match parts.as_slice() {
            [old, new] if !old.is_empty() => acc.replace(*old, new),
            _ => acc,
        }
    })
}
