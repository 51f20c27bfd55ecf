//! 全局配置管理,存储解释器的所有可配置项

use crate::rule::SearchMode;

/// 解释器配置
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // 规则未声明搜索模式时使用的模式
    pub default_search_mode: SearchMode,
    // `[截取]` 嵌套调用的最大深度
    pub max_nested_depth: usize,
    // 判定数组字段的关键字（匹配字段ID或名称）
    pub array_keywords: Vec<String>,
    // 日志中源码片段的最大预览长度
    pub log_preview_len: usize,
    // 源码代理地址（仅远程拉取使用）
    pub proxy_endpoint: Option<String>,
    // 超时配置（单位：秒）
    pub http_timeout: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_search_mode: SearchMode::Standard,
            max_nested_depth: 8,
            array_keywords: vec!["数组".to_string(), "组".to_string(), "列表".to_string()],
            log_preview_len: 80,
            proxy_endpoint: None,
            http_timeout: 30,
        }
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> EngineConfig {
        EngineConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: EngineConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_search_mode(mut self, mode: SearchMode) -> Self {
        self.config.default_search_mode = mode;
        self
    }

    pub fn max_nested_depth(mut self, depth: usize) -> Self {
        self.config.max_nested_depth = depth;
        self
    }

    pub fn array_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.array_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn log_preview_len(mut self, len: usize) -> Self {
        self.config.log_preview_len = len;
        self
    }

    pub fn proxy_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.proxy_endpoint = Some(endpoint.into());
        self
    }

    pub fn http_timeout(mut self, timeout: u64) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}
