//! URL 组件编解码（与浏览器 encodeURIComponent / decodeURIComponent 同一保留字符集）
use std::borrow::Cow;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// 不编码：字母数字与 `-_.!~*'()`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(input: &str) -> Cow<'_, str> {
    utf8_percent_encode(input, URI_COMPONENT).into()
}

/// 解码失败（非法 UTF-8 序列）时返回 None，由调用方决定回退
pub fn decode_component(input: &str) -> Option<Cow<'_, str>> {
    percent_decode_str(input).decode_utf8().ok()
}
