//! 源码协作模块：请求模板、详情页地址发现、源码提供方
//! 解释器核心不做任何网络访问，源码统一由 `SourceProvider` 提供
pub mod detail;
#[cfg(feature = "http")]
pub mod http;
pub mod request;

use std::future::Future;

use crate::engine::Engine;
use crate::error::XbpqResult;
use crate::rule::{ExecutionResult, RuleChainStep};
use crate::utils::preview_compact;

pub use self::detail::discover_detail_url;
#[cfg(feature = "http")]
pub use self::http::HttpSourceProvider;
pub use self::request::{HttpMethod, RequestTemplate, SourceRequest, first_category_id};

/// 源码提供方
pub trait SourceProvider: Send + Sync {
    /// 按请求返回已解码的源码文本
    fn fetch(&self, request: &SourceRequest) -> impl Future<Output = XbpqResult<String>> + Send;
}

/// 拉取源码后执行规则链
pub async fn fetch_and_run<P: SourceProvider>(
    provider: &P,
    engine: &Engine,
    request: &SourceRequest,
    steps: &[RuleChainStep],
) -> XbpqResult<ExecutionResult> {
    let source = provider.fetch(request).await?;
    debug!(
        "{} {} 源码已获取: {}",
        request.method,
        request.url,
        preview_compact(&source, engine.config().log_preview_len)
    );
    Ok(engine.run(&source, steps))
}
