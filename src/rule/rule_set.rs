//! 规则集：字段ID -> 规则文本 的扁平映射
//! 仅负责与 JSON 文本互转，读写文件由调用方负责

use serde_json::{Map, Value};

use crate::error::{XbpqError, XbpqResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Map<String, Value>,
}

impl RuleSet {
    /// 解析规则 JSON；容忍 UTF-8 BOM，非字符串标量转为文本
    pub fn from_json_str(json: &str) -> XbpqResult<Self> {
        let json = json.trim_start_matches('\u{feff}');
        let root: Value = serde_json::from_str(json)?;
        let Value::Object(map) = root else {
            return Err(XbpqError::RuleSetParseError("规则JSON根节点必须是对象".to_string()));
        };

        let rules = map
            .into_iter()
            .filter_map(|(k, v)| match v {
                Value::String(_) => Some((k, v)),
                Value::Number(n) => Some((k, Value::String(n.to_string()))),
                Value::Bool(b) => Some((k, Value::String(b.to_string()))),
                _ => None,
            })
            .collect();
        Ok(Self { rules })
    }

    /// 获取规则，不存在或为空时返回 None
    pub fn get(&self, field_id: &str) -> Option<&str> {
        self.rules
            .get(field_id)
            .and_then(Value::as_str)
            .filter(|r| !r.is_empty())
    }

    pub fn insert(&mut self, field_id: impl Into<String>, rule: impl Into<String>) {
        self.rules.insert(field_id.into(), Value::String(rule.into()));
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 序列化为两空格缩进的 JSON，忽略空规则
    pub fn to_pretty_json(&self) -> XbpqResult<String> {
        let non_empty: Map<String, Value> = self
            .rules
            .iter()
            .filter(|(_, v)| v.as_str().is_some_and(|s| !s.is_empty()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(serde_json::to_string_pretty(&Value::Object(non_empty))?)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RuleSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = RuleSet::default();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_get() {
        let rules = RuleSet::from_json_str("\u{feff}{\"数组\":\"<li>&&</li>\",\"空\":\"\",\"页数\":2,\"x\":null}").unwrap();
        assert_eq!(rules.get("数组"), Some("<li>&&</li>"));
        assert_eq!(rules.get("空"), None);
        assert_eq!(rules.get("页数"), Some("2"));
        assert_eq!(rules.get("x"), None);
        assert_eq!(rules.len(), 3);
    }

    #[test]
    fn test_pretty_json_skips_empty() {
        let rules: RuleSet = [("主页url", "https://example.com"), ("数组", "")].into_iter().collect();
        let json = rules.to_pretty_json().unwrap();
        assert_eq!(json, "{\n  \"主页url\": \"https://example.com\"\n}");
    }

    #[test]
    fn test_invalid_json() {
        assert!(RuleSet::from_json_str("{bad").is_err());
        assert!(RuleSet::from_json_str("\"str\"").is_err());
    }
}
