//! XPath 求值
use std::cell::Cell;

use super::XPathError;
use super::dom::{Dom, NodeKind};
use super::parser::{Axis, CmpOp, Expr, NodeTest, Step};

/// 节点集成员：普通节点或元素的第 n 个属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Item {
    Node(usize),
    Attr(usize, usize),
}

impl Item {
    fn order_key(self) -> (usize, usize) {
        match self {
            Item::Node(i) => (i, 0),
            Item::Attr(i, k) => (i, k + 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nodes(Vec<Item>),
    Str(String),
    Num(f64),
    Bool(bool),
}

/// 求值递归的最大深度
const MAX_EVAL_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy)]
struct Context {
    item: Item,
    position: usize,
    size: usize,
}

pub struct Evaluator<'d, 'a> {
    dom: &'d Dom<'a>,
    depth: Cell<usize>,
}

impl<'d, 'a> Evaluator<'d, 'a> {
    pub fn new(dom: &'d Dom<'a>) -> Self {
        Self {
            dom,
            depth: Cell::new(0),
        }
    }

    /// 以文档节点为上下文求值
    pub fn evaluate(&self, expr: &Expr) -> Result<Value, XPathError> {
        let root = Context {
            item: Item::Node(0),
            position: 1,
            size: 1,
        };
        self.eval(expr, &root)
    }

    /// 节点的输出形式：文本 / 属性取值，元素优先取文本内容，否则取外层 HTML
    pub fn render(&self, item: Item) -> String {
        match item {
            Item::Attr(owner, nth) => self
                .dom
                .attribute(owner, nth)
                .map(|(_, value)| value.to_string())
                .unwrap_or_default(),
            Item::Node(idx) => match &self.dom.node(idx).kind {
                NodeKind::Text(text) | NodeKind::Comment(text) => text.to_string(),
                _ => {
                    let text = self.dom.string_value(idx);
                    if text.is_empty() { self.dom.outer_html(idx) } else { text }
                }
            },
        }
    }

    fn eval(&self, expr: &Expr, ctx: &Context) -> Result<Value, XPathError> {
        let depth = self.depth.get();
        if depth >= MAX_EVAL_DEPTH {
            return Err(XPathError::TooDeep(MAX_EVAL_DEPTH));
        }
        self.depth.set(depth + 1);
        let result = self.eval_expr(expr, ctx);
        self.depth.set(depth);
        result
    }

    fn eval_expr(&self, expr: &Expr, ctx: &Context) -> Result<Value, XPathError> {
        match expr {
            Expr::Literal(s) => Ok(Value::Str(s.clone())),
            Expr::Number(n) => Ok(Value::Num(*n)),
            Expr::Or(lhs, rhs) => {
                let l = self.eval(lhs, ctx)?;
                if self.boolean(&l) {
                    return Ok(Value::Bool(true));
                }
                let r = self.eval(rhs, ctx)?;
                Ok(Value::Bool(self.boolean(&r)))
            }
            Expr::And(lhs, rhs) => {
                let l = self.eval(lhs, ctx)?;
                if !self.boolean(&l) {
                    return Ok(Value::Bool(false));
                }
                let r = self.eval(rhs, ctx)?;
                Ok(Value::Bool(self.boolean(&r)))
            }
            Expr::Compare(op, lhs, rhs) => {
                let l = self.eval(lhs, ctx)?;
                let r = self.eval(rhs, ctx)?;
                Ok(Value::Bool(self.compare(*op, &l, &r)))
            }
            Expr::Add(lhs, rhs) => {
                let l = self.eval(lhs, ctx)?;
                let r = self.eval(rhs, ctx)?;
                Ok(Value::Num(self.number(&l) + self.number(&r)))
            }
            Expr::Sub(lhs, rhs) => {
                let l = self.eval(lhs, ctx)?;
                let r = self.eval(rhs, ctx)?;
                Ok(Value::Num(self.number(&l) - self.number(&r)))
            }
            Expr::Mul(lhs, rhs) | Expr::Div(lhs, rhs) | Expr::Mod(lhs, rhs) => {
                let l = self.number(&self.eval(lhs, ctx)?);
                let r = self.number(&self.eval(rhs, ctx)?);
                let n = match expr {
                    Expr::Mul(..) => l * r,
                    Expr::Div(..) => l / r,
                    // 截断取余，符号随被除数
                    _ => l % r,
                };
                Ok(Value::Num(n))
            }
            Expr::Neg(inner) => {
                let v = self.eval(inner, ctx)?;
                Ok(Value::Num(-self.number(&v)))
            }
            Expr::Union(lhs, rhs) => {
                let mut items = self.node_set(lhs, ctx)?;
                items.extend(self.node_set(rhs, ctx)?);
                Ok(Value::Nodes(sort_document_order(items)))
            }
            Expr::Path { absolute, steps } => {
                let start = if *absolute { Item::Node(0) } else { ctx.item };
                Ok(Value::Nodes(self.walk(vec![start], steps)?))
            }
            Expr::Filter {
                primary,
                predicates,
                steps,
            } => {
                let mut items = sort_document_order(self.node_set(primary, ctx)?);
                for predicate in predicates {
                    items = self.filter_by_predicate(items, predicate)?;
                }
                Ok(Value::Nodes(self.walk(items, steps)?))
            }
            Expr::Call(name, args) => self.call(name, args, ctx),
        }
    }

    fn node_set(&self, expr: &Expr, ctx: &Context) -> Result<Vec<Item>, XPathError> {
        match self.eval(expr, ctx)? {
            Value::Nodes(items) => Ok(items),
            _ => Err(XPathError::NotNodeSet),
        }
    }

    fn walk(&self, mut items: Vec<Item>, steps: &[Step]) -> Result<Vec<Item>, XPathError> {
        for step in steps {
            let mut next = Vec::new();
            for item in items {
                let mut candidates: Vec<Item> = self
                    .axis(item, step.axis)
                    .into_iter()
                    .filter(|candidate| self.matches(*candidate, step.axis, &step.test))
                    .collect();
                for predicate in &step.predicates {
                    candidates = self.filter_by_predicate(candidates, predicate)?;
                }
                next.extend(candidates);
            }
            items = sort_document_order(next);
        }
        Ok(items)
    }

    /// 数字谓词按位置比较，其余按布尔值
    fn filter_by_predicate(&self, items: Vec<Item>, predicate: &Expr) -> Result<Vec<Item>, XPathError> {
        let size = items.len();
        let mut kept = Vec::with_capacity(size);
        for (i, item) in items.into_iter().enumerate() {
            let ctx = Context {
                item,
                position: i + 1,
                size,
            };
            let keep = match self.eval(predicate, &ctx)? {
                Value::Num(n) => n == (i + 1) as f64,
                other => self.boolean(&other),
            };
            if keep {
                kept.push(item);
            }
        }
        Ok(kept)
    }

    /// 按轴方向列出候选节点（反向轴为文档逆序）
    fn axis(&self, item: Item, axis: Axis) -> Vec<Item> {
        let dom = self.dom;
        let idx = match item {
            Item::Node(idx) => idx,
            Item::Attr(owner, _) => {
                return match axis {
                    Axis::SelfAxis => vec![item],
                    Axis::Parent => vec![Item::Node(owner)],
                    Axis::Ancestor | Axis::AncestorOrSelf => {
                        let mut out = Vec::new();
                        if axis == Axis::AncestorOrSelf {
                            out.push(item);
                        }
                        out.push(Item::Node(owner));
                        out.extend(dom.ancestors(owner).into_iter().map(Item::Node));
                        out
                    }
                    Axis::Following => (owner + 1..dom.len()).map(Item::Node).collect(),
                    Axis::Preceding => self.axis(Item::Node(owner), Axis::Preceding),
                    _ => Vec::new(),
                };
            }
        };

        let node = dom.node(idx);
        match axis {
            Axis::SelfAxis => vec![item],
            Axis::Child => node.children.iter().copied().map(Item::Node).collect(),
            Axis::Descendant => (idx + 1..dom.subtree_end(idx)).map(Item::Node).collect(),
            Axis::DescendantOrSelf => (idx..dom.subtree_end(idx)).map(Item::Node).collect(),
            Axis::Parent => node.parent.map(Item::Node).into_iter().collect(),
            Axis::Ancestor => dom.ancestors(idx).into_iter().map(Item::Node).collect(),
            Axis::AncestorOrSelf => std::iter::once(idx)
                .chain(dom.ancestors(idx))
                .map(Item::Node)
                .collect(),
            Axis::FollowingSibling | Axis::PrecedingSibling => {
                let Some(parent) = node.parent else {
                    return Vec::new();
                };
                let siblings = &dom.node(parent).children;
                let Some(pos) = siblings.iter().position(|&s| s == idx) else {
                    return Vec::new();
                };
                if axis == Axis::FollowingSibling {
                    siblings[pos + 1..].iter().copied().map(Item::Node).collect()
                } else {
                    siblings[..pos].iter().rev().copied().map(Item::Node).collect()
                }
            }
            Axis::Following => (dom.subtree_end(idx)..dom.len()).map(Item::Node).collect(),
            Axis::Preceding => {
                let ancestors = dom.ancestors(idx);
                (0..idx)
                    .rev()
                    .filter(|i| !ancestors.contains(i))
                    .map(Item::Node)
                    .collect()
            }
            Axis::Attribute => (0..dom.attributes(idx).len())
                .map(|k| Item::Attr(idx, k))
                .collect(),
        }
    }

    /// 节点测试；属性轴的主节点类型为属性，其余为元素
    fn matches(&self, item: Item, axis: Axis, test: &NodeTest) -> bool {
        let principal_attr = axis == Axis::Attribute;
        match item {
            Item::Attr(owner, nth) => match test {
                NodeTest::AnyNode => true,
                NodeTest::Wildcard => principal_attr,
                NodeTest::Name(name) => {
                    principal_attr
                        && self
                            .dom
                            .attribute(owner, nth)
                            .is_some_and(|(attr, _)| attr.eq_ignore_ascii_case(name))
                }
                NodeTest::Text | NodeTest::Comment => false,
            },
            Item::Node(idx) => match (&self.dom.node(idx).kind, test) {
                (_, NodeTest::AnyNode) => true,
                (NodeKind::Text(_), NodeTest::Text) => true,
                (NodeKind::Comment(_), NodeTest::Comment) => true,
                (NodeKind::Element(_), NodeTest::Wildcard) => !principal_attr,
                (NodeKind::Element(el), NodeTest::Name(name)) => {
                    !principal_attr && el.value().name().eq_ignore_ascii_case(name)
                }
                _ => false,
            },
        }
    }

    fn item_string(&self, item: Item) -> String {
        match item {
            Item::Node(idx) => self.dom.string_value(idx),
            Item::Attr(owner, nth) => self
                .dom
                .attribute(owner, nth)
                .map(|(_, value)| value.to_string())
                .unwrap_or_default(),
        }
    }

    fn string(&self, value: &Value) -> String {
        match value {
            Value::Nodes(items) => items.first().map(|&i| self.item_string(i)).unwrap_or_default(),
            Value::Str(s) => s.clone(),
            Value::Num(n) => format_number(*n),
            Value::Bool(b) => b.to_string(),
        }
    }

    fn number(&self, value: &Value) -> f64 {
        match value {
            Value::Num(n) => *n,
            Value::Bool(b) => f64::from(u8::from(*b)),
            other => parse_number(&self.string(other)),
        }
    }

    fn boolean(&self, value: &Value) -> bool {
        match value {
            Value::Nodes(items) => !items.is_empty(),
            Value::Str(s) => !s.is_empty(),
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Bool(b) => *b,
        }
    }

    /// 节点集参与比较时，任一成员满足即为真
    fn compare(&self, op: CmpOp, lhs: &Value, rhs: &Value) -> bool {
        match (lhs, rhs) {
            (Value::Nodes(l), Value::Nodes(r)) => l.iter().any(|&a| {
                let a = self.item_string(a);
                r.iter().any(|&b| compare_strings(op, &a, &self.item_string(b)))
            }),
            (Value::Nodes(items), other) => self.compare_node_set(op, items, other, false),
            (other, Value::Nodes(items)) => self.compare_node_set(op, items, other, true),
            _ => self.compare_atomic(op, lhs, rhs),
        }
    }

    fn compare_node_set(&self, op: CmpOp, items: &[Item], other: &Value, swapped: bool) -> bool {
        if let Value::Bool(b) = other {
            let set = !items.is_empty();
            let (l, r) = if swapped { (*b, set) } else { (set, *b) };
            return compare_numbers(op, f64::from(u8::from(l)), f64::from(u8::from(r)));
        }
        items.iter().any(|&item| {
            let node_value = Value::Str(self.item_string(item));
            if swapped {
                self.compare_atomic(op, other, &node_value)
            } else {
                self.compare_atomic(op, &node_value, other)
            }
        })
    }

    fn compare_atomic(&self, op: CmpOp, lhs: &Value, rhs: &Value) -> bool {
        match op {
            CmpOp::Eq | CmpOp::NotEq => {
                if matches!(lhs, Value::Bool(_)) || matches!(rhs, Value::Bool(_)) {
                    let equal = self.boolean(lhs) == self.boolean(rhs);
                    return (op == CmpOp::Eq) == equal;
                }
                if matches!(lhs, Value::Num(_)) || matches!(rhs, Value::Num(_)) {
                    return compare_numbers(op, self.number(lhs), self.number(rhs));
                }
                compare_strings(op, &self.string(lhs), &self.string(rhs))
            }
            _ => compare_numbers(op, self.number(lhs), self.number(rhs)),
        }
    }

    fn call(&self, name: &str, args: &[Expr], ctx: &Context) -> Result<Value, XPathError> {
        let arity = |range: std::ops::RangeInclusive<usize>| {
            if range.contains(&args.len()) {
                Ok(())
            } else {
                Err(XPathError::ArgumentCount {
                    name: name.to_string(),
                    given: args.len(),
                })
            }
        };
        // 可选参数缺省为上下文节点
        let string_arg = |i: usize| -> Result<String, XPathError> {
            match args.get(i) {
                Some(arg) => Ok(self.string(&self.eval(arg, ctx)?)),
                None => Ok(self.item_string(ctx.item)),
            }
        };

        let value = match name {
            "last" => {
                arity(0..=0)?;
                Value::Num(ctx.size as f64)
            }
            "position" => {
                arity(0..=0)?;
                Value::Num(ctx.position as f64)
            }
            "count" => {
                arity(1..=1)?;
                Value::Num(self.node_set(&args[0], ctx)?.len() as f64)
            }
            "true" | "false" => {
                arity(0..=0)?;
                Value::Bool(name == "true")
            }
            "not" | "boolean" => {
                arity(1..=1)?;
                let b = self.boolean(&self.eval(&args[0], ctx)?);
                Value::Bool(if name == "not" { !b } else { b })
            }
            "string" => {
                arity(0..=1)?;
                Value::Str(string_arg(0)?)
            }
            "number" => {
                arity(0..=1)?;
                Value::Num(parse_number(&string_arg(0)?))
            }
            "string-length" => {
                arity(0..=1)?;
                Value::Num(string_arg(0)?.chars().count() as f64)
            }
            "normalize-space" => {
                arity(0..=1)?;
                Value::Str(string_arg(0)?.split_whitespace().collect::<Vec<_>>().join(" "))
            }
            "concat" => {
                if args.len() < 2 {
                    arity(2..=2)?;
                }
                let mut out = String::new();
                for i in 0..args.len() {
                    out.push_str(&string_arg(i)?);
                }
                Value::Str(out)
            }
            "contains" | "starts-with" | "ends-with" | "substring-before" | "substring-after" => {
                arity(2..=2)?;
                let haystack = string_arg(0)?;
                let needle = string_arg(1)?;
                match name {
                    "contains" => Value::Bool(haystack.contains(&needle)),
                    "starts-with" => Value::Bool(haystack.starts_with(&needle)),
                    "ends-with" => Value::Bool(haystack.ends_with(&needle)),
                    "substring-before" => Value::Str(
                        haystack
                            .split_once(needle.as_str())
                            .map(|(before, _)| before.to_string())
                            .unwrap_or_default(),
                    ),
                    _ => Value::Str(
                        haystack
                            .split_once(needle.as_str())
                            .map(|(_, after)| after.to_string())
                            .unwrap_or_default(),
                    ),
                }
            }
            "substring" => {
                arity(2..=3)?;
                let text = string_arg(0)?;
                let start = round_half_up(self.number(&self.eval(&args[1], ctx)?));
                let end = match args.get(2) {
                    Some(arg) => start + round_half_up(self.number(&self.eval(arg, ctx)?)),
                    None => f64::INFINITY,
                };
                // NaN 边界使所有比较为假，结果为空串
                let out = text
                    .chars()
                    .enumerate()
                    .filter(|(i, _)| {
                        let pos = (i + 1) as f64;
                        pos >= start && pos < end
                    })
                    .map(|(_, c)| c)
                    .collect();
                Value::Str(out)
            }
            "translate" => {
                arity(3..=3)?;
                let text = string_arg(0)?;
                let from: Vec<char> = string_arg(1)?.chars().collect();
                let to: Vec<char> = string_arg(2)?.chars().collect();
                let out = text
                    .chars()
                    .filter_map(|c| match from.iter().position(|&f| f == c) {
                        Some(i) => to.get(i).copied(),
                        None => Some(c),
                    })
                    .collect();
                Value::Str(out)
            }
            "sum" => {
                arity(1..=1)?;
                let total = self
                    .node_set(&args[0], ctx)?
                    .into_iter()
                    .map(|item| parse_number(&self.item_string(item)))
                    .sum();
                Value::Num(total)
            }
            "floor" | "ceiling" | "round" => {
                arity(1..=1)?;
                let n = self.number(&self.eval(&args[0], ctx)?);
                Value::Num(match name {
                    "floor" => n.floor(),
                    "ceiling" => n.ceil(),
                    _ => round_half_up(n),
                })
            }
            "lang" => {
                arity(1..=1)?;
                let wanted = string_arg(0)?.to_ascii_lowercase();
                Value::Bool(self.declared_lang(ctx.item).is_some_and(|lang| {
                    let lang = lang.to_ascii_lowercase();
                    lang == wanted || lang.strip_prefix(wanted.as_str()).is_some_and(|rest| rest.starts_with('-'))
                }))
            }
            "name" | "local-name" => {
                arity(0..=1)?;
                let target = match args.first() {
                    Some(arg) => self.node_set(arg, ctx)?.first().copied(),
                    None => Some(ctx.item),
                };
                let name = match target {
                    Some(Item::Node(idx)) => self.dom.element_name(idx).unwrap_or_default().to_string(),
                    Some(Item::Attr(owner, nth)) => self
                        .dom
                        .attribute(owner, nth)
                        .map(|(attr, _)| attr.to_string())
                        .unwrap_or_default(),
                    None => String::new(),
                };
                Value::Str(name)
            }
            other => return Err(XPathError::UnknownFunction(other.to_string())),
        };
        Ok(value)
    }

    /// 自身或最近祖先元素上声明的 `lang` / `xml:lang`
    fn declared_lang(&self, item: Item) -> Option<&'a str> {
        let start = match item {
            Item::Node(idx) | Item::Attr(idx, _) => idx,
        };
        std::iter::once(start).chain(self.dom.ancestors(start)).find_map(|idx| {
            self.dom
                .attributes(idx)
                .into_iter()
                .find(|(name, _)| name.eq_ignore_ascii_case("lang") || name.eq_ignore_ascii_case("xml:lang"))
                .map(|(_, value)| value)
        })
    }
}

fn sort_document_order(mut items: Vec<Item>) -> Vec<Item> {
    items.sort_by_key(|item| item.order_key());
    items.dedup();
    items
}

fn parse_number(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// 四舍五入，`.5` 向正无穷取整
fn round_half_up(n: f64) -> f64 {
    if n.is_finite() { (n + 0.5).floor() } else { n }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn compare_numbers(op: CmpOp, l: f64, r: f64) -> bool {
    match op {
        CmpOp::Eq => l == r,
        CmpOp::NotEq => l != r,
        CmpOp::Lt => l < r,
        CmpOp::Le => l <= r,
        CmpOp::Gt => l > r,
        CmpOp::Ge => l >= r,
    }
}

fn compare_strings(op: CmpOp, l: &str, r: &str) -> bool {
    match op {
        CmpOp::Eq => l == r,
        CmpOp::NotEq => l != r,
        _ => compare_numbers(op, parse_number(l), parse_number(r)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::xpath::lexer::tokenize;
    use crate::extractor::xpath::parser::parse;
    use scraper::Html;

    fn eval_strings(source: &str, expr: &str) -> Result<Vec<String>, XPathError> {
        let html = Html::parse_document(source);
        let dom = Dom::build(&html);
        let evaluator = Evaluator::new(&dom);
        let tokens = tokenize(expr)?;
        match evaluator.evaluate(&parse(&tokens)?)? {
            Value::Nodes(items) => Ok(items.into_iter().map(|i| evaluator.render(i)).collect()),
            _ => Err(XPathError::NotNodeSet),
        }
    }

    fn eval_scalar(source: &str, expr: &str) -> Result<String, XPathError> {
        let html = Html::parse_document(source);
        let dom = Dom::build(&html);
        let evaluator = Evaluator::new(&dom);
        let value = evaluator.evaluate(&parse(&tokenize(expr)?)?)?;
        Ok(evaluator.string(&value))
    }

    const PAGE: &str = r#"
        <div class="list">
          <ul>
            <li class="item"><a href="/v/1">One</a></li>
            <li class="item hot"><a href="/v/2">Two</a></li>
            <li><a href="/v/3" title="t3">Three</a></li>
          </ul>
        </div>"#;

    #[test]
    fn test_positions() {
        assert_eq!(eval_strings(PAGE, "//li[1]/a").unwrap(), vec!["One"]);
        assert_eq!(eval_strings(PAGE, "//li[last()]/a").unwrap(), vec!["Three"]);
        assert_eq!(eval_strings(PAGE, "//li[position()>1]/a/@href").unwrap(), vec!["/v/2", "/v/3"]);
        assert_eq!(eval_strings(PAGE, "(//a)[2]/@href").unwrap(), vec!["/v/2"]);
    }

    #[test]
    fn test_attribute_predicates() {
        assert_eq!(eval_strings(PAGE, "//li[@class='item']/a").unwrap(), vec!["One"]);
        assert_eq!(eval_strings(PAGE, "//li[contains(@class,'hot')]//text()").unwrap(), vec!["Two"]);
        assert_eq!(eval_strings(PAGE, "//a[@title]/@href").unwrap(), vec!["/v/3"]);
        assert_eq!(eval_strings(PAGE, "//li[not(@class)]/a").unwrap(), vec!["Three"]);
        assert_eq!(eval_strings(PAGE, "//a[starts-with(@href,'/v/') and text()!='Two']").unwrap(), vec!["One", "Three"]);
    }

    #[test]
    fn test_axes() {
        assert_eq!(eval_strings(PAGE, "//a[.='Two']/../following-sibling::li/a").unwrap(), vec!["Three"]);
        assert_eq!(eval_strings(PAGE, "//a[.='Two']/ancestor::div/@class").unwrap(), vec!["list"]);
        assert_eq!(eval_strings(PAGE, "//li[3]/preceding-sibling::li[1]/a").unwrap(), vec!["Two"]);
        assert_eq!(eval_strings(PAGE, "//a[@href='/v/1'] | //a[@href='/v/3']").unwrap(), vec!["One", "Three"]);
    }

    #[test]
    fn test_arithmetic_operators() {
        assert_eq!(eval_scalar(PAGE, "2 * 3").unwrap(), "6");
        assert_eq!(eval_scalar(PAGE, "7 div 2").unwrap(), "3.5");
        assert_eq!(eval_scalar(PAGE, "7 mod 3").unwrap(), "1");
        assert_eq!(eval_scalar(PAGE, "-7 mod 3").unwrap(), "-1");
        assert_eq!(eval_scalar(PAGE, "1 div 0").unwrap(), "Infinity");
        assert_eq!(eval_scalar(PAGE, "count(//li) * 2 + 1").unwrap(), "7");

        assert_eq!(eval_strings(PAGE, "//li[position() mod 2 = 0]/a").unwrap(), vec!["Two"]);
        assert_eq!(eval_strings(PAGE, "//li[position() mod 2 = 1]/a").unwrap(), vec!["One", "Three"]);
        assert_eq!(eval_strings(PAGE, "//div/ul/li[last() div 3]/a").unwrap(), vec!["One"]);
    }

    #[test]
    fn test_string_and_number_functions() {
        assert_eq!(eval_strings(PAGE, "//a[substring(@href,1,3)='/v/']").unwrap(), vec!["One", "Two", "Three"]);
        assert_eq!(eval_strings(PAGE, "//a[substring(@href,4)='2']").unwrap(), vec!["Two"]);
        assert_eq!(eval_scalar(PAGE, "substring('12345', 1.5, 2.6)").unwrap(), "234");
        assert_eq!(eval_scalar(PAGE, "substring('12345', 0 div 0, 3)").unwrap(), "");
        assert_eq!(eval_scalar(PAGE, "substring('第12集', 2, 2)").unwrap(), "12");

        assert_eq!(eval_scalar(PAGE, "translate('bar','abc','ABC')").unwrap(), "BAr");
        assert_eq!(eval_scalar(PAGE, "translate('--aaa--','abc-','ABC')").unwrap(), "AAA");

        assert_eq!(eval_scalar("<p>1</p><p>2.5</p><p>3</p>", "sum(//p)").unwrap(), "6.5");
        assert_eq!(eval_scalar(PAGE, "floor(2.7)").unwrap(), "2");
        assert_eq!(eval_scalar(PAGE, "ceiling(2.1)").unwrap(), "3");
        assert_eq!(eval_scalar(PAGE, "round(2.5)").unwrap(), "3");
        assert_eq!(eval_scalar(PAGE, "round(-2.5)").unwrap(), "-2");
        assert!(matches!(eval_scalar(PAGE, "round()"), Err(XPathError::ArgumentCount { .. })));
    }

    #[test]
    fn test_lang() {
        let page = r#"<div lang="zh-CN"><p>中文</p></div><div lang="en"><p>English</p></div><p>none</p>"#;
        assert_eq!(eval_strings(page, "//p[lang('zh')]").unwrap(), vec!["中文"]);
        assert_eq!(eval_strings(page, "//p[lang('EN')]").unwrap(), vec!["English"]);
        assert!(eval_strings(page, "//p[lang('z')]").unwrap().is_empty());
    }

    #[test]
    fn test_evaluation_depth_is_bounded() {
        let nested = (0..100).fold("1".to_string(), |acc, _| format!("({} + 1)", acc));
        assert!(matches!(eval_scalar(PAGE, &nested), Err(XPathError::TooDeep(_))));

        let chain = vec!["1"; 300].join(" + ");
        assert!(matches!(eval_scalar(PAGE, &chain), Err(XPathError::TooDeep(_))));

        let modest = vec!["1"; 100].join(" + ");
        assert_eq!(eval_scalar(PAGE, &modest).unwrap(), "100");
    }

    #[test]
    fn test_empty_element_renders_markup() {
        let out = eval_strings("<p><img src='x.png'></p>", "//img").unwrap();
        assert_eq!(out, vec![r#"<img src="x.png">"#]);
    }

    #[test]
    fn test_non_node_results_and_errors() {
        assert!(matches!(eval_strings(PAGE, "count(//li)"), Err(XPathError::NotNodeSet)));
        assert!(matches!(eval_strings(PAGE, "//li[foo()]"), Err(XPathError::UnknownFunction(_))));
    }
}
