//! XPath 语法分析（XPath 1.0，不含命名空间与变量引用）
//!
//! `*`、`div`、`mod` 在完整操作数之后才按运算符解释，其余位置 `*` 为名称通配符。
use super::XPathError;
use super::lexer::Token;

/// 括号、谓词、函数参数与一元负号的最大嵌套层数
pub const MAX_NESTING: usize = 64;

/// 单个表达式的最大记号数
pub const MAX_TOKENS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Attribute,
    SelfAxis,
}

impl Axis {
    fn from_name(name: &str) -> Option<Self> {
        let axis = match name {
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "following-sibling" => Axis::FollowingSibling,
            "preceding-sibling" => Axis::PrecedingSibling,
            "following" => Axis::Following,
            "preceding" => Axis::Preceding,
            "attribute" => Axis::Attribute,
            "self" => Axis::SelfAxis,
            _ => return None,
        };
        Some(axis)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// 元素名 / 属性名（已转小写）
    Name(String),
    Wildcard,
    Text,
    Comment,
    AnyNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare(CmpOp, Box<Expr>, Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Mod(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Union(Box<Expr>, Box<Expr>),
    /// 绝对 / 相对路径
    Path { absolute: bool, steps: Vec<Step> },
    /// 过滤表达式 `(expr)[pred]/steps`
    Filter {
        primary: Box<Expr>,
        predicates: Vec<Expr>,
        steps: Vec<Step>,
    },
    Literal(String),
    Number(f64),
    Call(String, Vec<Expr>),
}

pub fn parse(tokens: &[Token<'_>]) -> Result<Expr, XPathError> {
    if tokens.len() > MAX_TOKENS {
        return Err(XPathError::TooLong(MAX_TOKENS));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(XPathError::UnexpectedToken(format!("{:?}", token))),
    }
}

struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    depth: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
    fn peek(&self) -> Option<&'t Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'t Token<'a>> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<&'t Token<'a>> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token<'_>) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token<'_>) -> Result<(), XPathError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(XPathError::UnexpectedToken(format!("{:?}", token))),
            None => Err(XPathError::UnexpectedEnd),
        }
    }

    /// 进入一层嵌套，超过上限时报错
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, XPathError>) -> Result<T, XPathError> {
        if self.depth >= MAX_NESTING {
            return Err(XPathError::TooDeep(MAX_NESTING));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Name(n)) if *n == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Expr, XPathError> {
        let mut lhs = self.parse_and()?;
        while self.eat_keyword("or") {
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, XPathError> {
        let mut lhs = self.parse_equality()?;
        while self.eat_keyword("and") {
            let rhs = self.parse_equality()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, XPathError> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => CmpOp::Eq,
                Some(Token::NotEq) => CmpOp::NotEq,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_relational()?;
            lhs = Expr::Compare(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_relational(&mut self) -> Result<Expr, XPathError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => CmpOp::Lt,
                Some(Token::Le) => CmpOp::Le,
                Some(Token::Gt) => CmpOp::Gt,
                Some(Token::Ge) => CmpOp::Ge,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_additive()?;
            lhs = Expr::Compare(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, XPathError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            if self.eat(&Token::Plus) {
                let rhs = self.parse_multiplicative()?;
                lhs = Expr::Add(Box::new(lhs), Box::new(rhs));
            } else if self.eat(&Token::Minus) {
                let rhs = self.parse_multiplicative()?;
                lhs = Expr::Sub(Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, XPathError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let build: fn(Box<Expr>, Box<Expr>) -> Expr = if self.eat(&Token::Star) {
                Expr::Mul
            } else if self.eat_keyword("div") {
                Expr::Div
            } else if self.eat_keyword("mod") {
                Expr::Mod
            } else {
                return Ok(lhs);
            };
            let rhs = self.parse_unary()?;
            lhs = build(Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, XPathError> {
        if self.eat(&Token::Minus) {
            let inner = self.nested(Self::parse_unary)?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.parse_union()
    }

    fn parse_union(&mut self) -> Result<Expr, XPathError> {
        let mut lhs = self.parse_path()?;
        while self.eat(&Token::Pipe) {
            let rhs = self.parse_path()?;
            lhs = Expr::Union(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_path(&mut self) -> Result<Expr, XPathError> {
        if !self.starts_filter_expr() {
            return self.parse_location_path();
        }

        let primary = self.parse_primary()?;
        let predicates = self.parse_predicates()?;
        let steps = match self.peek() {
            Some(Token::Slash) | Some(Token::DoubleSlash) => self.parse_trailing_steps()?,
            _ => Vec::new(),
        };

        if predicates.is_empty() && steps.is_empty() {
            return Ok(primary);
        }
        Ok(Expr::Filter {
            primary: Box::new(primary),
            predicates,
            steps,
        })
    }

    /// 字面量、数字、括号或函数调用开头的为过滤表达式
    fn starts_filter_expr(&self) -> bool {
        match self.peek() {
            Some(Token::Literal(_)) | Some(Token::Number(_)) | Some(Token::LParen) => true,
            Some(Token::Name(name)) => {
                self.peek_at(1) == Some(&Token::LParen) && !matches!(*name, "text" | "node" | "comment")
            }
            _ => false,
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, XPathError> {
        match self.next() {
            Some(Token::Literal(s)) => Ok(Expr::Literal(s.to_string())),
            Some(Token::Number(n)) => Ok(Expr::Number(*n)),
            Some(Token::LParen) => {
                let inner = self.nested(Self::parse_or)?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Name(name)) => {
                self.expect(&Token::LParen)?;
                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.nested(Self::parse_or)?);
                        if self.eat(&Token::RParen) {
                            break;
                        }
                        self.expect(&Token::Comma)?;
                    }
                }
                Ok(Expr::Call(name.to_string(), args))
            }
            Some(token) => Err(XPathError::UnexpectedToken(format!("{:?}", token))),
            None => Err(XPathError::UnexpectedEnd),
        }
    }

    fn parse_location_path(&mut self) -> Result<Expr, XPathError> {
        match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                let steps = if self.starts_step() {
                    self.parse_relative_steps()?
                } else {
                    Vec::new()
                };
                Ok(Expr::Path { absolute: true, steps })
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                let mut steps = vec![descendant_or_self()];
                steps.extend(self.parse_relative_steps()?);
                Ok(Expr::Path { absolute: true, steps })
            }
            _ => Ok(Expr::Path {
                absolute: false,
                steps: self.parse_relative_steps()?,
            }),
        }
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Name(_)) | Some(Token::Star) | Some(Token::At) | Some(Token::Dot) | Some(Token::DotDot)
        )
    }

    fn parse_relative_steps(&mut self) -> Result<Vec<Step>, XPathError> {
        let mut steps = vec![self.parse_step()?];
        steps.extend(self.parse_trailing_steps()?);
        Ok(steps)
    }

    /// 连续的 `/step` 与 `//step`
    fn parse_trailing_steps(&mut self) -> Result<Vec<Step>, XPathError> {
        let mut steps = Vec::new();
        loop {
            if self.eat(&Token::Slash) {
                steps.push(self.parse_step()?);
            } else if self.eat(&Token::DoubleSlash) {
                steps.push(descendant_or_self());
                steps.push(self.parse_step()?);
            } else {
                return Ok(steps);
            }
        }
    }

    fn parse_step(&mut self) -> Result<Step, XPathError> {
        if self.eat(&Token::Dot) {
            return Ok(Step {
                axis: Axis::SelfAxis,
                test: NodeTest::AnyNode,
                predicates: Vec::new(),
            });
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step {
                axis: Axis::Parent,
                test: NodeTest::AnyNode,
                predicates: Vec::new(),
            });
        }

        let axis = if self.eat(&Token::At) {
            Axis::Attribute
        } else if let (Some(Token::Name(name)), Some(Token::ColonColon)) = (self.peek(), self.peek_at(1)) {
            let axis = Axis::from_name(name).ok_or_else(|| XPathError::UnknownAxis(name.to_string()))?;
            self.pos += 2;
            axis
        } else {
            Axis::Child
        };

        let test = self.parse_node_test()?;
        let predicates = self.parse_predicates()?;
        Ok(Step { axis, test, predicates })
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, XPathError> {
        match self.next() {
            Some(Token::Star) => Ok(NodeTest::Wildcard),
            Some(Token::Name(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    let test = match *name {
                        "text" => NodeTest::Text,
                        "node" => NodeTest::AnyNode,
                        "comment" => NodeTest::Comment,
                        other => return Err(XPathError::UnexpectedToken(other.to_string())),
                    };
                    self.pos += 1;
                    self.expect(&Token::RParen)?;
                    Ok(test)
                } else {
                    Ok(NodeTest::Name(name.to_ascii_lowercase()))
                }
            }
            Some(token) => Err(XPathError::UnexpectedToken(format!("{:?}", token))),
            None => Err(XPathError::UnexpectedEnd),
        }
    }

    fn parse_predicates(&mut self) -> Result<Vec<Expr>, XPathError> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LBracket) {
            predicates.push(self.nested(Self::parse_or)?);
            self.expect(&Token::RBracket)?;
        }
        Ok(predicates)
    }
}

fn descendant_or_self() -> Step {
    Step {
        axis: Axis::DescendantOrSelf,
        test: NodeTest::AnyNode,
        predicates: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::xpath::lexer::tokenize;

    fn parse_str(input: &str) -> Result<Expr, XPathError> {
        let tokens = tokenize(input)?;
        parse(&tokens)
    }

    #[test]
    fn test_parse_descendant_path() {
        let expr = parse_str("//ul/li").unwrap();
        let Expr::Path { absolute, steps } = expr else {
            panic!("expected path");
        };
        assert!(absolute);
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].axis, Axis::DescendantOrSelf);
        assert_eq!(steps[1].test, NodeTest::Name("ul".into()));
        assert_eq!(steps[2].axis, Axis::Child);
    }

    #[test]
    fn test_parse_predicates_and_attribute() {
        let expr = parse_str("//a[@class='x' and position()<3]/@HREF").unwrap();
        let Expr::Path { steps, .. } = expr else {
            panic!("expected path");
        };
        assert_eq!(steps[1].predicates.len(), 1);
        assert!(matches!(steps[1].predicates[0], Expr::And(_, _)));
        assert_eq!(steps[2].axis, Axis::Attribute);
        assert_eq!(steps[2].test, NodeTest::Name("href".into()));
    }

    #[test]
    fn test_parse_filter_and_union() {
        assert!(matches!(parse_str("(//a)[1]").unwrap(), Expr::Filter { .. }));
        assert!(matches!(parse_str("//a | //b").unwrap(), Expr::Union(_, _)));
        assert!(matches!(parse_str("count(//a)").unwrap(), Expr::Call(name, _) if name == "count"));
        assert!(matches!(parse_str("ancestor::div/text()").unwrap(), Expr::Path { absolute: false, .. }));
    }

    #[test]
    fn test_parse_multiplicative_operators() {
        assert!(matches!(parse_str("2 * 3").unwrap(), Expr::Mul(_, _)));
        assert!(matches!(parse_str("7 div 2").unwrap(), Expr::Div(_, _)));
        assert!(matches!(parse_str("1 + 7 mod 2").unwrap(), Expr::Add(_, rhs) if matches!(*rhs, Expr::Mod(_, _))));

        // 路径位置上的 `*` 与 `div` 仍是名称测试
        let Expr::Path { steps, .. } = parse_str("//div/*").unwrap() else {
            panic!("expected path");
        };
        assert_eq!(steps[1].test, NodeTest::Name("div".into()));
        assert_eq!(steps[2].test, NodeTest::Wildcard);

        let Expr::Path { steps, .. } = parse_str("//li[position() mod 2 = 0]").unwrap() else {
            panic!("expected path");
        };
        assert!(matches!(&steps[1].predicates[0], Expr::Compare(CmpOp::Eq, lhs, _) if matches!(**lhs, Expr::Mod(_, _))));
    }

    #[test]
    fn test_nesting_is_bounded() {
        let ok = format!("{}//a{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert!(parse_str(&ok).is_ok());

        let deep = format!("{}//a{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert!(matches!(parse_str(&deep), Err(XPathError::TooDeep(_))));

        let negations = format!("{}1", "-".repeat(500));
        assert!(matches!(parse_str(&negations), Err(XPathError::TooDeep(_))));

        let predicates = format!("//a{}", "[b".repeat(200) + &"]".repeat(200));
        assert!(matches!(parse_str(&predicates), Err(XPathError::TooDeep(_))));

        let long_chain = vec!["1"; MAX_TOKENS].join("+");
        assert!(matches!(parse_str(&long_chain), Err(XPathError::TooLong(_))));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_str("//a["), Err(XPathError::UnexpectedEnd)));
        assert!(matches!(parse_str("bogus::a"), Err(XPathError::UnknownAxis(_))));
        assert!(parse_str("//a]").is_err());
    }
}
