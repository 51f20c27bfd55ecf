//! XPath 词法分析
use super::XPathError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Pipe,
    Dot,
    DotDot,
    ColonColon,
    Star,
    Plus,
    Minus,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Literal(&'a str),
    Number(f64),
    Name(&'a str),
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, XPathError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let rest = &input[pos..];
        let (token, len) = match c {
            '/' if rest.starts_with("//") => (Token::DoubleSlash, 2),
            '/' => (Token::Slash, 1),
            '[' => (Token::LBracket, 1),
            ']' => (Token::RBracket, 1),
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            '@' => (Token::At, 1),
            ',' => (Token::Comma, 1),
            '|' => (Token::Pipe, 1),
            '*' => (Token::Star, 1),
            '+' => (Token::Plus, 1),
            '-' => (Token::Minus, 1),
            '=' => (Token::Eq, 1),
            '!' if rest.starts_with("!=") => (Token::NotEq, 2),
            '<' if rest.starts_with("<=") => (Token::Le, 2),
            '<' => (Token::Lt, 1),
            '>' if rest.starts_with(">=") => (Token::Ge, 2),
            '>' => (Token::Gt, 1),
            ':' if rest.starts_with("::") => (Token::ColonColon, 2),
            '.' if rest.starts_with("..") => (Token::DotDot, 2),
            '.' if rest[1..].starts_with(|d: char| d.is_ascii_digit()) => lex_number(rest),
            '.' => (Token::Dot, 1),
            '\'' | '"' => {
                let Some(close) = rest[1..].find(c) else {
                    return Err(XPathError::UnterminatedLiteral(pos));
                };
                (Token::Literal(&rest[1..1 + close]), close + 2)
            }
            d if d.is_ascii_digit() => lex_number(rest),
            n if is_name_start(n) => {
                let len = rest
                    .char_indices()
                    .find(|&(_, ch)| !is_name_char(ch))
                    .map(|(i, _)| i)
                    .unwrap_or(rest.len());
                (Token::Name(&rest[..len]), len)
            }
            other => return Err(XPathError::UnexpectedChar(other, pos)),
        };

        tokens.push(token);
        // 按字节长度前进
        let end = pos + len;
        while chars.peek().is_some_and(|&(i, _)| i < end) {
            chars.next();
        }
    }

    Ok(tokens)
}

fn lex_number(rest: &str) -> (Token<'_>, usize) {
    let mut seen_dot = false;
    let len = rest
        .char_indices()
        .find(|&(_, ch)| {
            if ch == '.' && !seen_dot {
                seen_dot = true;
                return false;
            }
            !ch.is_ascii_digit()
        })
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    let value = rest[..len].parse::<f64>().unwrap_or(f64::NAN);
    (Token::Number(value), len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_path() {
        let tokens = tokenize("//div[@class='a b']/a/@href").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::DoubleSlash,
                Token::Name("div"),
                Token::LBracket,
                Token::At,
                Token::Name("class"),
                Token::Eq,
                Token::Literal("a b"),
                Token::RBracket,
                Token::Slash,
                Token::Name("a"),
                Token::Slash,
                Token::At,
                Token::Name("href"),
            ]
        );
    }

    #[test]
    fn test_tokenize_functions_and_numbers() {
        let tokens = tokenize("li[last()-1 and starts-with(., \"第\")] | ../x[.5]").unwrap();
        assert!(tokens.contains(&Token::Name("starts-with")));
        assert!(tokens.contains(&Token::Number(1.0)));
        assert!(tokens.contains(&Token::Number(0.5)));
        assert!(tokens.contains(&Token::Literal("第")));
        assert!(tokens.contains(&Token::DotDot));
        assert!(tokens.contains(&Token::Pipe));
    }

    #[test]
    fn test_tokenize_errors() {
        assert!(matches!(tokenize("//a[@x='1]"), Err(XPathError::UnterminatedLiteral(_))));
        assert!(matches!(tokenize("//a#b"), Err(XPathError::UnexpectedChar('#', _))));
    }
}
