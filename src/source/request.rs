//! 请求模板
//! URL 模板可用 `;post;` 携带 POST 数据；`{name}` 占位符在 GET URL 中原样替换，
//! 在 POST 数据中替换为 URL 编码后的值
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{XbpqError, XbpqResult};
use crate::rule::Encoding;
use crate::utils::encode_component;

const POST_SEPARATOR: &str = ";post;";

/// 未提供取值的筛选占位符，在 GET URL 中直接抹除
static FILTER_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(class|area|year|by|lang)\}").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// 一次源码请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRequest {
    pub url: String,
    pub method: HttpMethod,
    /// POST 表单数据（已编码）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// 源码编码提示（`编码:` 指令）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<Encoding>,
}

impl SourceRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            body: None,
            encoding: None,
        }
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Post,
            body: Some(body.into()),
            encoding: None,
        }
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }
}

/// 解析后的 URL 模板
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTemplate {
    url: String,
    post_body: Option<String>,
}

impl RequestTemplate {
    pub fn parse(template: &str) -> XbpqResult<Self> {
        let template = template.trim();
        if template.is_empty() {
            return Err(XbpqError::InvalidRequestTemplate("URL模板为空".to_string()));
        }

        let (url, post_body) = match template.split_once(POST_SEPARATOR) {
            Some((url, body)) => (url, Some(body).filter(|b| !b.is_empty())),
            None => (template, None),
        };
        if url.is_empty() {
            return Err(XbpqError::InvalidRequestTemplate(format!("缺少URL: {}", template)));
        }

        Ok(Self {
            url: url.to_string(),
            post_body: post_body.map(str::to_string),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_post(&self) -> bool {
        self.post_body.is_some()
    }

    /// 渲染为请求：POST 数据中占位符取值做 URL 编码，GET URL 原样替换并抹除未填写的筛选占位符
    pub fn render(&self, params: &[(&str, &str)]) -> SourceRequest {
        match &self.post_body {
            Some(body) => {
                let body = params.iter().fold(body.clone(), |acc, (name, value)| {
                    acc.replace(&placeholder(name), &encode_component(value))
                });
                SourceRequest::post(self.url.clone(), body)
            }
            None => {
                let url = params
                    .iter()
                    .fold(self.url.clone(), |acc, (name, value)| acc.replace(&placeholder(name), value));
                SourceRequest::get(FILTER_PLACEHOLDER.replace_all(&url, "").into_owned())
            }
        }
    }

    /// 分类页请求：取分类列表 `名称$id#...` 中的第一个分类，第 1 页
    pub fn category(&self, category_list: &str) -> SourceRequest {
        let cate_id = first_category_id(category_list);
        self.render(&[("cateId", cate_id), ("catePg", "1")])
    }

    /// 搜索页请求
    pub fn search(&self, keyword: &str, page: u32) -> SourceRequest {
        let page = page.to_string();
        self.render(&[("wd", keyword), ("SearchPg", page.as_str())])
    }
}

fn placeholder(name: &str) -> String {
    format!("{{{}}}", name)
}

/// `电影$1#剧集$2` -> `1`；无 `$` 时默认为 `1`
pub fn first_category_id(category_list: &str) -> &str {
    let first = category_list.split('#').next().unwrap_or_default();
    match first.split_once('$') {
        Some((_, id)) if !id.is_empty() => id,
        _ => "1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_template() {
        let get = RequestTemplate::parse("https://a.b/list/{cateId}-{catePg}.html").unwrap();
        assert!(!get.is_post());

        let post = RequestTemplate::parse("https://a.b/search;post;wd={wd}&page={SearchPg}").unwrap();
        assert!(post.is_post());
        assert_eq!(post.url(), "https://a.b/search");

        assert!(RequestTemplate::parse("  ").is_err());
        assert!(RequestTemplate::parse(";post;a=1").is_err());
    }

    #[test]
    fn test_category_get_erases_filters() {
        let template = RequestTemplate::parse("https://a.b/show/{cateId}-{area}-{by}-{class}-{lang}-{catePg}---{year}.html").unwrap();
        let request = template.category("电影$dianying#剧集$juji");
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.url, "https://a.b/show/dianying-----1---.html");
        assert_eq!(request.body, None);
    }

    #[test]
    fn test_search_post_encodes_values() {
        let template = RequestTemplate::parse("https://a.b/search;post;wd={wd}&p={SearchPg}").unwrap();
        let request = template.search("流浪 地球", 2);
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://a.b/search");
        assert_eq!(
            request.body.as_deref(),
            Some("wd=%E6%B5%81%E6%B5%AA%20%E5%9C%B0%E7%90%83&p=2")
        );
    }

    #[test]
    fn test_first_category_id() {
        assert_eq!(first_category_id("电影$1#剧集$2"), "1");
        assert_eq!(first_category_id("电影$movie"), "movie");
        assert_eq!(first_category_id("电影#剧集"), "1");
        assert_eq!(first_category_id(""), "1");
    }
}
