//! Safe arithmetic evaluation for the calculate intent.
//!
//! A small recursive-descent parser over numbers, `+ - * / % ^`, parentheses
//! and unary signs. Spoken operators ("times", "divided by", ...) are
//! rewritten to symbols first. Nothing here ever executes constructed code.
//!
//! Grammar:
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/' | '%') unary)*
//! unary  := ('-' | '+') unary | power
//! power  := atom ('^' unary)?
//! atom   := number | '(' expr ')'
//! ```
//!
//! Input is capped at [`MAX_EXPRESSION_LEN`] characters and nesting (parentheses,
//! stacked signs, exponent chains) at [`MAX_DEPTH`] levels, so hostile input is
//! rejected instead of exhausting the stack.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CoreError, Result};

/// Longest expression accepted, in characters, before word rewriting.
pub const MAX_EXPRESSION_LEN: usize = 256;

/// Deepest nesting the parser will follow.
pub const MAX_DEPTH: usize = 64;

/// Spoken operators, longest phrases first.
static WORD_OPERATORS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\bto the power of\b", " ^ "),
        (r"\bmultiplied by\b", " * "),
        (r"\bdivided by\b", " / "),
        (r"\bplus\b", " + "),
        (r"\bminus\b", " - "),
        (r"\btimes\b", " * "),
        (r"\bover\b", " / "),
        (r"\bmod(?:ulo)?\b", " % "),
        (r"(\d)\s*x\s*(\d)", "$1 * $2"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

/// Evaluate an arithmetic expression.
///
/// # Errors
/// Returns `CoreError::Expression` for malformed input, division by zero,
/// input that is too long or too deeply nested, or a non-finite result.
pub fn evaluate(expression: &str) -> Result<f64> {
    if expression.chars().count() > MAX_EXPRESSION_LEN {
        return Err(CoreError::Expression(format!(
            "expression longer than {MAX_EXPRESSION_LEN} characters"
        )));
    }
    let rewritten = rewrite_words(expression);
    let tokens = tokenize(&rewritten)?;
    if tokens.is_empty() {
        return Err(CoreError::Expression("empty expression".into()));
    }

    let mut parser = Parser { tokens: &tokens, pos: 0, depth: 0 };
    let value = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(CoreError::Expression(format!("unexpected {token:?}")));
    }
    if !value.is_finite() {
        return Err(CoreError::Expression("result is not a finite number".into()));
    }
    Ok(value)
}

/// Render a result for speech: integers without a fraction, otherwise up to
/// six decimals with trailing zeros trimmed.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{value:.0}");
    }
    let text = format!("{value:.6}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn rewrite_words(expression: &str) -> String {
    let mut text = expression.to_lowercase();
    for (re, replacement) in WORD_OPERATORS.iter() {
        text = re.replace_all(&text, *replacement).into_owned();
    }
    text
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Op(char),
    Open,
    Close,
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '=' | '?' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else if d == ',' {
                        // thousands separator
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| CoreError::Expression(format!("bad number '{literal}'")))?;
                tokens.push(Token::Num(value));
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            other => {
                return Err(CoreError::Expression(format!("unexpected character '{other}'")));
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/' | '%'))) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match op {
                '*' => value * rhs,
                _ if rhs == 0.0 => {
                    return Err(CoreError::Expression("division by zero".into()));
                }
                '/' => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    /// Every recursive path (parentheses, signs, exponents) passes through
    /// here, so this is where depth is counted.
    fn unary(&mut self) -> Result<f64> {
        if self.depth >= MAX_DEPTH {
            return Err(CoreError::Expression(format!("nested deeper than {MAX_DEPTH} levels")));
        }
        self.depth += 1;
        let value = match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                self.unary().map(|v| -v)
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        };
        self.depth -= 1;
        value
    }

    fn power(&mut self) -> Result<f64> {
        let base = self.atom()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::Open) => {
                let value = self.expr()?;
                match self.next() {
                    Some(Token::Close) => Ok(value),
                    _ => Err(CoreError::Expression("missing closing parenthesis".into())),
                }
            }
            Some(token) => Err(CoreError::Expression(format!("unexpected {token:?}"))),
            None => Err(CoreError::Expression("unexpected end of expression".into())),
        }
    }
}
