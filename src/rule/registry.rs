//! 字段元数据仓库
//! 分类 -> 有序字段列表，只读；负责按依赖关系构建规则链

use std::collections::HashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{FieldDefinition, RuleChainStep};
use super::rule_set::RuleSet;
use crate::error::{XbpqError, XbpqResult};

/// 单个分类
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCategory {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

/// 字段元数据仓库（保持分类与字段的声明顺序）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRegistry {
    categories: Vec<FieldCategory>,
}

impl FieldRegistry {
    pub fn new(categories: Vec<FieldCategory>) -> Self {
        Self { categories }
    }

    /// 从 `{ "分类": [ {id,key,type,dependsOn}, ... ] }` 形式的 JSON 解析
    pub fn from_json_str(json: &str) -> XbpqResult<Self> {
        let json = json.trim_start_matches('\u{feff}');
        let root: Value = serde_json::from_str(json)?;
        let Value::Object(map) = root else {
            return Err(XbpqError::RuleSetParseError("字段元数据根节点必须是对象".to_string()));
        };

        let mut categories = Vec::with_capacity(map.len());
        for (name, fields) in map {
            let fields: Vec<FieldDefinition> = serde_json::from_value(fields)?;
            categories.push(FieldCategory { name, fields });
        }
        debug!("字段元数据加载完成，分类数：{}", categories.len());
        Ok(Self { categories })
    }

    pub fn categories(&self) -> &[FieldCategory] {
        &self.categories
    }

    /// 跨分类查找字段定义（按声明顺序取第一个）
    pub fn find(&self, field_id: &str) -> Option<&FieldDefinition> {
        self.categories
            .iter()
            .flat_map(|c| c.fields.iter())
            .find(|f| f.id == field_id)
    }

    pub fn category_of(&self, field_id: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.fields.iter().any(|f| f.id == field_id))
            .map(|c| c.name.as_str())
    }

    /// 构建目标字段的规则链：沿 dependsOn 向上追溯，根在前
    /// 未配置规则的字段生成空规则步骤（执行时跳过）
    pub fn build_chain(&self, field_id: &str, rules: &RuleSet) -> XbpqResult<Vec<RuleChainStep>> {
        if self.find(field_id).is_none() {
            return Err(XbpqError::UnknownField(field_id.to_string()));
        }

        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(field_id);

        while let Some(id) = current {
            let Some(field) = self.find(id) else {
                break;
            };
            if !visited.insert(field.id.as_str()) {
                return Err(XbpqError::DependencyCycle(field.id.clone()));
            }
            chain.push(RuleChainStep::from_field(field, rules.get(&field.id)));
            current = field.parent();
        }

        chain.reverse();
        Ok(chain)
    }
}
