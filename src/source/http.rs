//! 基于 reqwest 的源码提供方
//! 配置了代理端点时，所有请求经代理转发（绕过浏览器跨域限制的同一接口）
use std::time::Duration;

use reqwest::{Client, RequestBuilder};

use super::{HttpMethod, SourceProvider, SourceRequest};
use crate::config::EngineConfig;
use crate::error::{XbpqError, XbpqResult};

const USER_AGENT: &str = concat!("xbpq/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpSourceProvider {
    client: Client,
    proxy_endpoint: Option<String>,
}

impl HttpSourceProvider {
    pub fn new(config: &EngineConfig) -> XbpqResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout))
            .build()?;
        Ok(Self {
            client,
            proxy_endpoint: config.proxy_endpoint.clone().filter(|p| !p.is_empty()),
        })
    }

    fn build_request(&self, request: &SourceRequest) -> RequestBuilder {
        let body = request.body.clone().unwrap_or_default();
        let builder = match (&self.proxy_endpoint, request.method) {
            // 代理 GET: proxy?target_url=...
            (Some(proxy), HttpMethod::Get) => self
                .client
                .get(proxy.as_str())
                .query(&[("target_url", request.url.as_str())]),
            // 代理 POST: 表单携带目标地址、方法与原始数据
            (Some(proxy), HttpMethod::Post) => self.client.post(proxy.as_str()).form(&[
                ("target_url", request.url.as_str()),
                ("method", "POST"),
                ("post_data", body.as_str()),
            ]),
            (None, HttpMethod::Get) => self.client.get(request.url.as_str()),
            (None, HttpMethod::Post) => self
                .client
                .post(request.url.as_str())
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(body),
        };
        builder.header("User-Agent", USER_AGENT)
    }
}

impl SourceProvider for HttpSourceProvider {
    async fn fetch(&self, request: &SourceRequest) -> XbpqResult<String> {
        debug!("拉取源码: {} {} | 代理: {:?}", request.method, request.url, self.proxy_endpoint);
        let response = self.build_request(request).send().await?;

        if !response.status().is_success() {
            warn!("源码拉取失败: {} 返回状态码 {}", request.url, response.status());
            return Err(XbpqError::SourceFetchError(format!(
                "URL {} 返回状态码 {}",
                request.url,
                response.status()
            )));
        }

        // 响应头未声明 charset 时按编码指令解码
        let charset = request.encoding.unwrap_or_default().canonical_name();
        Ok(response.text_with_charset(charset).await?)
    }
}
