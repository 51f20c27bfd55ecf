//! 详情页地址发现：列表规则 -> 首个列表项 -> 链接规则 -> 相对地址补全
use url::Url;

use crate::engine::Engine;
use crate::error::{XbpqError, XbpqResult};
use crate::rule::RuleChainStep;

/// 从分类页源码中找出第一个详情页地址
pub fn discover_detail_url(
    engine: &Engine,
    list_page: &str,
    list_rule: &str,
    link_rule: &str,
    base_url: &str,
) -> XbpqResult<Url> {
    if list_rule.trim().is_empty() || link_rule.trim().is_empty() {
        return Err(XbpqError::InvalidInput("详情页测试依赖于 [数组, 链接] 规则".to_string()));
    }

    // 1. 列表规则按数组字段执行
    let list_step = RuleChainStep::new("数组", "数组", list_rule, "array");
    let items = engine.run(list_page, std::slice::from_ref(&list_step)).data;
    let Some(first_item) = items.first() else {
        return Err(XbpqError::ChainFailed("\"数组\"规则未能从来源页获取到任何项目".to_string()));
    };
    debug!("列表规则找到 {} 个项目", items.len());

    // 2. 在首个项目中取链接
    let link = engine.run_rule(first_item, link_rule);
    let Some(href) = link.first() else {
        return Err(XbpqError::ChainFailed("\"链接\"规则未能从列表项目中提取到URL".to_string()));
    };

    // 3. 相对地址按基础地址补全
    let url = Url::parse(base_url)?.join(href.trim())?;
    debug!("详情页地址: {}", url);
    Ok(url)
}
