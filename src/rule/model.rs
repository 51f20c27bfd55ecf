//! 规则数据模型定义
//! 仅存储规则数据，无任何业务逻辑，支持序列化/反序列化

use std::fmt;
use serde::{Deserialize, Serialize};

/// 搜索模式（`搜索模式:<数字>` 指令）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SearchMode {
    /// 标准截取模式
    #[default]
    Standard,
    /// 正则模式
    Regex,
    /// XPath模式
    XPath,
    /// JSON模式
    Json,
}

impl SearchMode {
    /// 从指令数字解析，未知数字回退到标准模式
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => SearchMode::Regex,
            2 => SearchMode::XPath,
            3 => SearchMode::Json,
            _ => SearchMode::Standard,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            SearchMode::Standard => 0,
            SearchMode::Regex => 1,
            SearchMode::XPath => 2,
            SearchMode::Json => 3,
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchMode::Standard => "标准",
            SearchMode::Regex => "正则",
            SearchMode::XPath => "XPath",
            SearchMode::Json => "JSON",
        };
        write!(f, "{}({})", name, self.code())
    }
}

/// 源码编码声明（`编码:<名称>` 指令）
/// 解释器内仅作提示，实际解码由源码提供方完成
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Encoding {
    #[default]
    Utf8,
    Gbk,
    Gb2312,
    Big5,
    Iso8859_1,
}

impl Encoding {
    /// 别名映射（忽略大小写），未知名称回退到 UTF-8
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Encoding::Utf8,
            "gbk" => Encoding::Gbk,
            "gb2312" => Encoding::Gb2312,
            "big5" => Encoding::Big5,
            "iso-8859-1" => Encoding::Iso8859_1,
            _ => Encoding::Utf8,
        }
    }

    /// 规范名称，可直接作为 charset 标签使用
    pub fn canonical_name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Gbk => "GBK",
            Encoding::Gb2312 => "GB2312",
            Encoding::Big5 => "Big5",
            Encoding::Iso8859_1 => "ISO-8859-1",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// 主规则的截取形态
/// `前缀&&后缀` 仅取前两段，与规则编辑器保持一致
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainPattern<'a> {
    Pair { prefix: &'a str, suffix: &'a str },
    Literal(&'a str),
}

impl<'a> MainPattern<'a> {
    pub fn of(rule: &'a str) -> Self {
        if !rule.contains("&&") {
            return MainPattern::Literal(rule);
        }
        let mut parts = rule.split("&&");
        let prefix = parts.next().unwrap_or_default();
        let suffix = parts.next().unwrap_or_default();
        MainPattern::Pair { prefix, suffix }
    }
}

/// 单个后处理指令 `[操作:参数]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxOp {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl fmt::Display for SyntaxOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            write!(f, "[{}]", self.key)
        } else {
            write!(f, "[{}:{}]", self.key, self.value)
        }
    }
}

/// 截取 / 后处理的中间值
/// 以标签区分数组与单值，后处理操作按形态分派
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Sequence(Vec<String>),
    Scalar(String),
    /// JSON 路径缺失
    Missing,
}

impl Extracted {
    pub fn is_sequence(&self) -> bool {
        matches!(self, Extracted::Sequence(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Extracted::Sequence(items) => items.len(),
            Extracted::Scalar(s) if !s.is_empty() => 1,
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<String>> for Extracted {
    fn from(items: Vec<String>) -> Self {
        Extracted::Sequence(items)
    }
}

impl From<String> for Extracted {
    fn from(s: String) -> Self {
        Extracted::Scalar(s)
    }
}

/// 字段元数据视图（字段定义与规则链步骤共用）
pub trait FieldMeta {
    fn id(&self) -> &str;
    fn key(&self) -> &str;
    fn field_type(&self) -> &str;
}

/// 字段定义（由外部字段元数据提供，解释器只读）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: String,
    #[serde(default)]
    pub key: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(rename = "dependsOn", default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
}

impl FieldDefinition {
    pub fn new(id: impl Into<String>, key: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            field_type: field_type.into(),
            depends_on: None,
        }
    }

    pub fn depends_on(mut self, parent: impl Into<String>) -> Self {
        self.depends_on = Some(parent.into());
        self
    }

    /// 父字段ID，空字符串视为无依赖
    pub fn parent(&self) -> Option<&str> {
        self.depends_on.as_deref().filter(|p| !p.is_empty())
    }
}

impl FieldMeta for FieldDefinition {
    fn id(&self) -> &str {
        &self.id
    }
    fn key(&self) -> &str {
        &self.key
    }
    fn field_type(&self) -> &str {
        &self.field_type
    }
}

/// 规则链中的一步（根在前，目标字段在后）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleChainStep {
    #[serde(rename = "id")]
    pub field_id: String,
    pub key: String,
    #[serde(default)]
    pub rule: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
}

impl RuleChainStep {
    pub fn new(
        field_id: impl Into<String>,
        key: impl Into<String>,
        rule: impl Into<String>,
        field_type: impl Into<String>,
    ) -> Self {
        Self {
            field_id: field_id.into(),
            key: key.into(),
            rule: rule.into(),
            field_type: field_type.into(),
        }
    }

    /// 单规则包装成的合成步骤
    pub fn single(rule: impl Into<String>) -> Self {
        Self::new("single", "单规则", rule, "string")
    }

    pub fn from_field(field: &FieldDefinition, rule: Option<&str>) -> Self {
        Self::new(
            field.id.clone(),
            field.key.clone(),
            rule.unwrap_or_default(),
            field.field_type.clone(),
        )
    }
}

impl FieldMeta for RuleChainStep {
    fn id(&self) -> &str {
        &self.field_id
    }
    fn key(&self) -> &str {
        &self.key
    }
    fn field_type(&self) -> &str {
        &self.field_type
    }
}

/// 规则链执行结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub data: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn from_context(context: Vec<String>) -> Self {
        if context.is_empty() {
            Self {
                success: false,
                data: context,
                error: Some("规则链执行无结果".to_string()),
            }
        } else {
            Self {
                success: true,
                data: context,
                error: None,
            }
        }
    }

    pub fn first(&self) -> Option<&str> {
        self.data.first().map(String::as_str)
    }
}
