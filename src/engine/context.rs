//! 依赖上下文解析
//! 计算某字段规则实际运行的上下文：无依赖为页面源码，否则为父字段规则在其上下文中的结果
use serde::Serialize;

use super::Engine;
use crate::error::{XbpqError, XbpqResult};
use crate::rule::{FieldRegistry, RuleSet};

/// 根上下文的来源标识
pub const ROOT_CONTEXT_ID: &str = "页面源码";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedContext {
    pub context: String,
    /// 提供该上下文的父字段ID（根为 `页面源码`）
    #[serde(rename = "parentRuleId")]
    pub parent_rule_id: String,
}

impl ResolvedContext {
    fn root(source: &str) -> Self {
        Self {
            context: source.to_string(),
            parent_rule_id: ROOT_CONTEXT_ID.to_string(),
        }
    }
}

impl Engine {
    /// 解析字段的有效上下文
    ///
    /// 父字段为数组字段时只用于校验非空，子字段沿用祖父上下文；
    /// 父字段为单值字段时，上下文收窄为父规则的首个结果。
    pub fn resolve_context(
        &self,
        field_id: &str,
        root_source: &str,
        registry: &FieldRegistry,
        rules: &RuleSet,
    ) -> XbpqResult<ResolvedContext> {
        let mut visiting = Vec::new();
        self.resolve_context_inner(field_id, root_source, registry, rules, &mut visiting)
    }

    fn resolve_context_inner(
        &self,
        field_id: &str,
        root_source: &str,
        registry: &FieldRegistry,
        rules: &RuleSet,
        visiting: &mut Vec<String>,
    ) -> XbpqResult<ResolvedContext> {
        let Some(parent_id) = registry.find(field_id).and_then(|f| f.parent()) else {
            return Ok(ResolvedContext::root(root_source));
        };

        if visiting.iter().any(|id| id == field_id) {
            visiting.push(field_id.to_string());
            return Err(XbpqError::DependencyCycle(visiting.join(" -> ")));
        }
        visiting.push(field_id.to_string());

        // 1. 先解析父字段自身的上下文
        let grand_context = self.resolve_context_inner(parent_id, root_source, registry, rules, visiting)?;

        // 2. 父字段无规则：原样继承
        let Some(parent_rule) = rules.get(parent_id) else {
            debug!("父字段 {} 无规则，继承其上下文", parent_id);
            return Ok(grand_context);
        };

        // 3. 在父上下文中执行父规则
        let parent_result = self.run_rule(&grand_context.context, parent_rule);
        let Some(first) = parent_result.data.into_iter().next() else {
            return Err(XbpqError::ParentNoMatch {
                parent: parent_id.to_string(),
            });
        };

        // 4. 数组父字段只作为存在性校验
        let parent_is_array = registry
            .find(parent_id)
            .is_some_and(|parent| self.classifier.is_array(parent));
        let context = if parent_is_array { grand_context.context } else { first };

        Ok(ResolvedContext {
            context,
            parent_rule_id: parent_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{FieldCategory, FieldDefinition};

    const PAGE: &str = r#"<ul><li><a href="/v/1">一</a></li><li><a href="/v/2">二</a></li></ul><h1>标题</h1>"#;

    fn registry() -> FieldRegistry {
        FieldRegistry::new(vec![FieldCategory {
            name: "分类".into(),
            fields: vec![
                FieldDefinition::new("items", "items", "array"),
                FieldDefinition::new("link", "link", "text").depends_on("items"),
                FieldDefinition::new("first", "first", "text"),
                FieldDefinition::new("href", "href", "text").depends_on("first"),
                FieldDefinition::new("bare", "bare", "text"),
                FieldDefinition::new("child", "child", "text").depends_on("bare"),
            ],
        }])
    }

    fn rules() -> RuleSet {
        [
            ("items", "<li>&&</li>"),
            ("link", r#"href="&&""#),
            ("first", "<li>&&</li>"),
            ("href", r#"href="&&""#),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_root_field() {
        let engine = Engine::default();
        let ctx = engine.resolve_context("items", PAGE, &registry(), &rules()).unwrap();
        assert_eq!(ctx.context, PAGE);
        assert_eq!(ctx.parent_rule_id, ROOT_CONTEXT_ID);

        let unknown = engine.resolve_context("nope", PAGE, &registry(), &rules()).unwrap();
        assert_eq!(unknown.parent_rule_id, ROOT_CONTEXT_ID);
    }

    #[test]
    fn test_array_parent_keeps_grandparent_context() {
        let engine = Engine::default();
        let ctx = engine.resolve_context("link", PAGE, &registry(), &rules()).unwrap();
        assert_eq!(ctx.context, PAGE);
        assert_eq!(ctx.parent_rule_id, "items");
    }

    #[test]
    fn test_scalar_parent_narrows_to_first_match() {
        let engine = Engine::default();
        let ctx = engine.resolve_context("href", PAGE, &registry(), &rules()).unwrap();
        assert_eq!(ctx.context, r#"<li><a href="/v/1">一</a></li>"#);
        assert_eq!(ctx.parent_rule_id, "first");
    }

    #[test]
    fn test_ruleless_parent_passes_through() {
        let engine = Engine::default();
        let ctx = engine.resolve_context("child", PAGE, &registry(), &rules()).unwrap();
        assert_eq!(ctx.context, PAGE);
        assert_eq!(ctx.parent_rule_id, ROOT_CONTEXT_ID);
    }

    #[test]
    fn test_parent_without_match_fails() {
        let engine = Engine::default();
        let mut rules = rules();
        rules.insert("items", "<table>&&</table>");
        let err = engine.resolve_context("link", PAGE, &registry(), &rules).unwrap_err();
        assert!(matches!(err, XbpqError::ParentNoMatch { ref parent } if parent == "items"));
    }

    #[test]
    fn test_dependency_cycle_is_error() {
        let registry = FieldRegistry::new(vec![FieldCategory {
            name: "详情".into(),
            fields: vec![
                FieldDefinition::new("a", "a", "text").depends_on("b"),
                FieldDefinition::new("b", "b", "text").depends_on("a"),
            ],
        }]);
        let engine = Engine::default();
        let err = engine.resolve_context("a", PAGE, &registry, &RuleSet::default()).unwrap_err();
        assert!(matches!(err, XbpqError::DependencyCycle(_)));
    }
}
