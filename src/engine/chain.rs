//! 规则链执行
//! 上下文从 `[源码]` 开始，逐步对每个上下文元素执行智能解析并展平；某步无结果即中断

use super::Engine;
use crate::rule::{ExecutionResult, RuleChainStep};

impl Engine {
    /// 执行有序规则链（根在前）
    pub fn run(&self, source: &str, steps: &[RuleChainStep]) -> ExecutionResult {
        let mut context = vec![source.to_string()];

        for (i, step) in steps.iter().enumerate() {
            if step.rule.is_empty() {
                debug!("步骤 {} ({}): 规则为空，跳过", i + 1, step.key);
                continue;
            }

            context = self.run_step(&context, step);
            debug!("步骤 {} ({}): 找到 {} 个结果", i + 1, step.key, context.len());

            if context.is_empty() {
                debug!("规则链在步骤 {} ({}) 处中断", i + 1, step.key);
                break;
            }
        }

        ExecutionResult::from_context(context)
    }

    /// 单规则按合成步骤执行
    pub fn run_rule(&self, source: &str, rule: &str) -> ExecutionResult {
        self.run(source, &[RuleChainStep::single(rule)])
    }

    /// 对上下文中每个元素执行同一步骤，结果按顺序展平
    pub fn run_step(&self, context: &[String], step: &RuleChainStep) -> Vec<String> {
        context
            .iter()
            .flat_map(|item| self.resolve(item, &step.rule, step))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::{FieldClassifier, KeywordClassifier};
    use crate::rule::FieldMeta;
    use crate::utils::TracingSink;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 记录每个被解析步骤的字段ID
    struct CountingClassifier {
        inner: KeywordClassifier,
        calls: AtomicUsize,
        seen: std::sync::Mutex<Vec<String>>,
    }

    impl CountingClassifier {
        fn new() -> Self {
            Self {
                inner: KeywordClassifier::new(EngineConfig::default().array_keywords),
                calls: AtomicUsize::new(0),
                seen: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    impl FieldClassifier for CountingClassifier {
        fn is_array(&self, field: &dyn FieldMeta) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(field.id().to_string());
            self.inner.is_array(field)
        }
    }

    const PAGE: &str = r#"<ul><li><a href="/v/1">一</a></li><li><a href="/v/2">二</a></li></ul>"#;

    #[test]
    fn test_chain_flattens_in_order() {
        let engine = Engine::default();
        let steps = vec![
            RuleChainStep::new("数组", "数组", "<li>&&</li>", "text"),
            RuleChainStep::new("链接", "链接", r#"href="&&""#, "text"),
        ];
        let result = engine.run(PAGE, &steps);
        assert!(result.success);
        assert_eq!(result.data, vec!["/v/1", "/v/2"]);
        assert_eq!(result.error, None);
    }

    #[test]
    fn test_empty_rule_step_is_skipped() {
        let engine = Engine::default();
        let steps = vec![
            RuleChainStep::new("分类", "分类", "", "text"),
            RuleChainStep::new("数组", "数组", "<li>&&</li>", "text"),
        ];
        assert_eq!(engine.run(PAGE, &steps).data.len(), 2);
        assert_eq!(engine.run(PAGE, &[]).data, vec![PAGE.to_string()]);
    }

    #[test]
    fn test_chain_short_circuits() {
        let classifier = Arc::new(CountingClassifier::new());
        let engine = Engine::with_parts(EngineConfig::default(), classifier.clone(), Arc::new(TracingSink));

        let steps = vec![
            RuleChainStep::new("A", "A", "<table>&&</table>", "text"),
            RuleChainStep::new("B", "B", r#"href="&&""#, "text"),
        ];
        let result = engine.run(PAGE, &steps);

        assert!(!result.success);
        assert!(result.data.is_empty());
        assert_eq!(result.error.as_deref(), Some("规则链执行无结果"));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*classifier.seen.lock().unwrap(), vec!["A".to_string()]);
    }

    #[test]
    fn test_run_rule_wraps_single_step() {
        let engine = Engine::default();
        let result = engine.run_rule("xAyBzAwBv", "搜索模式:1#A&&B");
        // 单规则步骤不是数组字段，只保留首个结果
        assert_eq!(result.data, vec!["y"]);
        assert_eq!(result.first(), Some("y"));
    }
}
