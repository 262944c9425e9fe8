//! Restricted numeric expression language for boundary predicates.
//!
//! A predicate is a boolean expression over one free variable `x`:
//!
//! - numbers: `12`, `1.5`, `.5`, `1e3`
//! - arithmetic: `+ - * / // %` and power written `^` or `**` (right-associative)
//! - comparisons, which chain: `-1.2 < x <= 4.3` means `-1.2 < x and x <= 4.3`
//! - boolean connectives `and`, `or`, `not` and parentheses
//!
//! Precedence, loosest first: `or`, `and`, `not`, comparisons, `+ -`,
//! `* / // %`, unary `+ -`, power. Nothing else is accepted; there is no way
//! to call functions or reach names other than `x`.
//!
//! # Example
//!
//! ```
//! use casegen::limits::predicate::Predicate;
//!
//! let p = Predicate::parse("1 <= x <= 10^6 and x % 10000 != 0").unwrap();
//! assert!(p.holds(10.0).unwrap());
//! assert!(!p.holds(20000.0).unwrap());
//! assert!(!p.holds(0.0).unwrap());
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Maximum nesting of parentheses, unary operators and powers.
///
/// Operator chains such as `a and b and c` or `1 + 2 + 3` are stored flat
/// and do not count towards it.
pub const MAX_NESTING: usize = 64;

/// Errors raised while parsing or evaluating a predicate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredicateError {
    /// The input holds no expression.
    #[error("empty expression")]
    Empty,

    /// A token appeared where something else was required.
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        /// What the parser expected.
        expected: &'static str,
        /// The text that was found.
        found: String,
        /// Byte offset in the input.
        position: usize,
    },

    /// An identifier other than the variable `x` or a keyword.
    #[error("unknown name `{name}`, the only variable is `x`")]
    UnknownName {
        /// The identifier.
        name: String,
        /// Byte offset in the input.
        position: usize,
    },

    /// A numeric literal that does not parse.
    #[error("invalid number `{raw}`")]
    InvalidNumber {
        /// The literal text.
        raw: String,
        /// Byte offset in the input.
        position: usize,
    },

    /// Parentheses or unary operators nest too deeply.
    #[error("expression nests deeper than {max} levels")]
    NestingTooDeep {
        /// The nesting limit.
        max: usize,
        /// Byte offset in the input.
        position: usize,
    },

    /// Division, floor division or modulo by zero.
    #[error("{operation} by zero")]
    DivisionByZero {
        /// The failing operation.
        operation: &'static str,
    },
}

impl PredicateError {
    /// Byte offset of a parse error, `0` for errors without a location.
    #[must_use]
    pub fn position(&self) -> usize {
        match self {
            Self::UnexpectedToken { position, .. }
            | Self::UnknownName { position, .. }
            | Self::InvalidNumber { position, .. }
            | Self::NestingTooDeep { position, .. } => *position,
            Self::Empty | Self::DivisionByZero { .. } => 0,
        }
    }

    /// Whether the error was raised by the parser rather than the evaluator.
    #[must_use]
    pub fn is_syntax(&self) -> bool {
        !matches!(self, Self::DivisionByZero { .. })
    }
}

/// Result of evaluating an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// A number.
    Number(f64),
    /// A truth value, produced by comparisons and `not`.
    Bool(bool),
}

impl Scalar {
    /// Numeric view; `true` is `1` and `false` is `0`.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Number(n) => n,
            Self::Bool(b) => f64::from(u8::from(b)),
        }
    }

    /// Truthiness: non-zero numbers and `true`.
    #[must_use]
    pub fn is_truthy(self) -> bool {
        match self {
            Self::Number(n) => n != 0.0,
            Self::Bool(b) => b,
        }
    }
}

/// A parsed predicate over `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    source: String,
    expr: Expr,
}

impl Predicate {
    /// Parse a predicate.
    ///
    /// # Errors
    ///
    /// Returns a [`PredicateError`] describing the first syntax error.
    pub fn parse(source: &str) -> Result<Self, PredicateError> {
        let expr = parse_expression(source)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// The predicate text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate the expression at `x`.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateError::DivisionByZero`] if a division, floor
    /// division or modulo has a zero divisor.
    pub fn evaluate(&self, x: f64) -> Result<Scalar, PredicateError> {
        self.expr.eval(x)
    }

    /// Whether the predicate holds at `x`.
    ///
    /// # Errors
    ///
    /// See [`Predicate::evaluate`].
    pub fn holds(&self, x: f64) -> Result<bool, PredicateError> {
        self.evaluate(x).map(Scalar::is_truthy)
    }
}

impl FromStr for Predicate {
    type Err = PredicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Evaluate an arithmetic expression that does not mention `x`.
///
/// # Errors
///
/// Returns a [`PredicateError`] if the text does not parse or evaluation fails.
pub fn evaluate_constant(text: &str) -> Result<f64, PredicateError> {
    parse_expression(text)?.eval(f64::NAN).map(Scalar::as_f64)
}

/// Find the numeric literal sub-expressions of a predicate's text.
///
/// A span is a number, optionally negative, followed by any chain of
/// `+ - * / ^` operators and further numbers, e.g. `10^6` or `-1.2`.
/// Scanning is textual and leftmost-longest: in `x >= -5 and x <= 2*50` the
/// spans are `-5` and `2*50`.
#[must_use]
pub fn literal_spans(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let Some(mut end) = match_number(bytes, offset) else {
            offset += 1;
            continue;
        };

        loop {
            let op = skip_spaces(bytes, end);
            if !matches!(bytes.get(op), Some(b'+' | b'-' | b'*' | b'/' | b'^')) {
                break;
            }
            match match_number(bytes, skip_spaces(bytes, op + 1)) {
                Some(next) => end = next,
                None => break,
            }
        }

        spans.push(&text[offset..end]);
        offset = end;
    }
    spans
}

/// Match `-?\d+(\.\d+)?` at `start`, returning the end offset.
fn match_number(bytes: &[u8], start: usize) -> Option<usize> {
    let mut offset = start;
    if bytes.get(offset) == Some(&b'-') {
        offset += 1;
    }
    let digits = count_digits(bytes, offset);
    if digits == 0 {
        return None;
    }
    offset += digits;
    if bytes.get(offset) == Some(&b'.') {
        let fraction = count_digits(bytes, offset + 1);
        if fraction > 0 {
            offset += 1 + fraction;
        }
    }
    Some(offset)
}

fn count_digits(bytes: &[u8], start: usize) -> usize {
    bytes
        .get(start..)
        .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
}

fn skip_spaces(bytes: &[u8], start: usize) -> usize {
    let mut offset = start;
    while bytes.get(offset).is_some_and(u8::is_ascii_whitespace) {
        offset += 1;
    }
    offset
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinaryOp {
    fn apply(self, a: f64, b: f64) -> Result<f64, PredicateError> {
        let value = match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => {
                nonzero(b, "division")?;
                a / b
            }
            Self::FloorDiv => {
                nonzero(b, "floor division")?;
                (a / b).floor()
            }
            Self::Mod => {
                nonzero(b, "modulo")?;
                // Result takes the sign of the divisor.
                let r = a % b;
                if r != 0.0 && (r < 0.0) != (b < 0.0) {
                    r + b
                } else {
                    r
                }
            }
            Self::Pow => a.powf(b),
        };
        Ok(value)
    }
}

fn nonzero(divisor: f64, operation: &'static str) -> Result<(), PredicateError> {
    if divisor == 0.0 {
        Err(PredicateError::DivisionByZero { operation })
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    #[allow(clippy::float_cmp)]
    fn apply(self, a: f64, b: f64) -> bool {
        match self {
            Self::Lt => a < b,
            Self::Le => a <= b,
            Self::Gt => a > b,
            Self::Ge => a >= b,
            Self::Eq => a == b,
            Self::Ne => a != b,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Variable,
    Negate(Box<Expr>),
    Not(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// Left-associative run of `+ -` or `* / // %`, folded in order.
    Chain(Box<Expr>, Vec<(BinaryOp, Expr)>),
    Compare(Box<Expr>, Vec<(CompareOp, Expr)>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    fn eval(&self, x: f64) -> Result<Scalar, PredicateError> {
        let value = match self {
            Self::Number(n) => Scalar::Number(*n),
            Self::Variable => Scalar::Number(x),
            Self::Negate(inner) => Scalar::Number(-inner.eval(x)?.as_f64()),
            Self::Not(inner) => Scalar::Bool(!inner.eval(x)?.is_truthy()),
            Self::Binary(op, left, right) => {
                let a = left.eval(x)?.as_f64();
                let b = right.eval(x)?.as_f64();
                Scalar::Number(op.apply(a, b)?)
            }
            Self::Chain(first, rest) => {
                let mut acc = first.eval(x)?.as_f64();
                for (op, operand) in rest {
                    acc = op.apply(acc, operand.eval(x)?.as_f64())?;
                }
                Scalar::Number(acc)
            }
            Self::Compare(first, rest) => {
                let mut left = first.eval(x)?.as_f64();
                for (op, operand) in rest {
                    let right = operand.eval(x)?.as_f64();
                    if !op.apply(left, right) {
                        return Ok(Scalar::Bool(false));
                    }
                    left = right;
                }
                Scalar::Bool(true)
            }
            // Both yield the deciding operand, or the last one.
            Self::And(operands) => short_circuit(operands, x, false)?,
            Self::Or(operands) => short_circuit(operands, x, true)?,
        };
        Ok(value)
    }
}

fn short_circuit(operands: &[Expr], x: f64, stop_when: bool) -> Result<Scalar, PredicateError> {
    let mut last = Scalar::Bool(!stop_when);
    for operand in operands {
        last = operand.eval(x)?;
        if last.is_truthy() == stop_when {
            break;
        }
    }
    Ok(last)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Number(&'a str),
    Ident(&'a str),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    Power,
    Compare(CompareOp),
    And,
    Or,
    Not,
    LParen,
    RParen,
    Eof,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Number(raw) | Self::Ident(raw) => *raw,
            Self::Plus => "`+`",
            Self::Minus => "`-`",
            Self::Star => "`*`",
            Self::Slash => "`/`",
            Self::DoubleSlash => "`//`",
            Self::Percent => "`%`",
            Self::Power => "power operator",
            Self::Compare(_) => "comparison",
            Self::And => "`and`",
            Self::Or => "`or`",
            Self::Not => "`not`",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::Eof => "end of input",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy)]
struct SpannedToken<'a> {
    token: Token<'a>,
    position: usize,
}

struct Lexer<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> Lexer<'a> {
    const fn new(input: &'a str) -> Self {
        Self { input, offset: 0 }
    }

    fn lex(&mut self) -> Result<Vec<SpannedToken<'a>>, PredicateError> {
        let bytes = self.input.as_bytes();
        let mut tokens = Vec::new();

        while let Some(&ch) = bytes.get(self.offset) {
            let start = self.offset;
            let (token, width) = match ch {
                b' ' | b'\t' | b'\n' | b'\r' => {
                    self.offset += 1;
                    continue;
                }
                b'(' => (Token::LParen, 1),
                b')' => (Token::RParen, 1),
                b'+' => (Token::Plus, 1),
                b'-' => (Token::Minus, 1),
                b'%' => (Token::Percent, 1),
                b'^' => (Token::Power, 1),
                b'*' if self.peek(bytes) == Some(b'*') => (Token::Power, 2),
                b'*' => (Token::Star, 1),
                b'/' if self.peek(bytes) == Some(b'/') => (Token::DoubleSlash, 2),
                b'/' => (Token::Slash, 1),
                b'<' if self.peek(bytes) == Some(b'=') => (Token::Compare(CompareOp::Le), 2),
                b'<' => (Token::Compare(CompareOp::Lt), 1),
                b'>' if self.peek(bytes) == Some(b'=') => (Token::Compare(CompareOp::Ge), 2),
                b'>' => (Token::Compare(CompareOp::Gt), 1),
                b'=' if self.peek(bytes) == Some(b'=') => (Token::Compare(CompareOp::Eq), 2),
                b'!' if self.peek(bytes) == Some(b'=') => (Token::Compare(CompareOp::Ne), 2),
                b'=' | b'!' => {
                    return Err(PredicateError::UnexpectedToken {
                        expected: "`==` or `!=`",
                        found: char::from(ch).to_string(),
                        position: start,
                    });
                }
                b'0'..=b'9' | b'.' => {
                    self.lex_number(bytes);
                    tokens.push(SpannedToken {
                        token: Token::Number(&self.input[start..self.offset]),
                        position: start,
                    });
                    continue;
                }
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                    self.consume_while(bytes, |b| b.is_ascii_alphanumeric() || b == b'_');
                    tokens.push(SpannedToken {
                        token: Self::keyword_or_ident(&self.input[start..self.offset]),
                        position: start,
                    });
                    continue;
                }
                _ => {
                    let found = self.input[start..].chars().next().unwrap_or('?');
                    return Err(PredicateError::UnexpectedToken {
                        expected: "number, `x`, operator or parenthesis",
                        found: found.to_string(),
                        position: start,
                    });
                }
            };
            tokens.push(SpannedToken {
                token,
                position: start,
            });
            self.offset += width;
        }

        if tokens.is_empty() {
            return Err(PredicateError::Empty);
        }
        tokens.push(SpannedToken {
            token: Token::Eof,
            position: self.offset,
        });
        Ok(tokens)
    }

    fn peek(&self, bytes: &[u8]) -> Option<u8> {
        bytes.get(self.offset + 1).copied()
    }

    fn consume_while<F>(&mut self, bytes: &[u8], condition: F)
    where
        F: Fn(u8) -> bool,
    {
        while bytes.get(self.offset).is_some_and(|&b| condition(b)) {
            self.offset += 1;
        }
    }

    /// Digits, an optional fraction and an optional exponent.
    fn lex_number(&mut self, bytes: &[u8]) {
        self.consume_while(bytes, |b| b.is_ascii_digit());
        if bytes.get(self.offset) == Some(&b'.') {
            self.offset += 1;
            self.consume_while(bytes, |b| b.is_ascii_digit());
        }
        if matches!(bytes.get(self.offset), Some(b'e' | b'E')) {
            let mut exponent = self.offset + 1;
            if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
                exponent += 1;
            }
            if bytes.get(exponent).is_some_and(u8::is_ascii_digit) {
                self.offset = exponent;
                self.consume_while(bytes, |b| b.is_ascii_digit());
            }
        }
    }

    fn keyword_or_ident(slice: &'a str) -> Token<'a> {
        match slice {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            _ => Token::Ident(slice),
        }
    }
}

fn chain(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
    if rest.is_empty() {
        first
    } else {
        Expr::Chain(Box::new(first), rest)
    }
}

fn parse_expression(input: &str) -> Result<Expr, PredicateError> {
    let tokens = Lexer::new(input).lex()?;
    let mut parser = Parser {
        tokens,
        index: 0,
        nesting: 0,
    };
    let expr = parser.parse_or()?;
    parser.expect_eof()?;
    Ok(expr)
}

/// Recursive-descent parser over the token stream.
struct Parser<'a> {
    tokens: Vec<SpannedToken<'a>>,
    index: usize,
    nesting: usize,
}

impl<'a> Parser<'a> {
    fn parse_or(&mut self) -> Result<Expr, PredicateError> {
        let first = self.parse_and()?;
        if self.current().token != Token::Or {
            return Ok(first);
        }
        let mut operands = vec![first];
        while self.matches(Token::Or) {
            operands.push(self.parse_and()?);
        }
        Ok(Expr::Or(operands))
    }

    fn parse_and(&mut self) -> Result<Expr, PredicateError> {
        let first = self.parse_not()?;
        if self.current().token != Token::And {
            return Ok(first);
        }
        let mut operands = vec![first];
        while self.matches(Token::And) {
            operands.push(self.parse_not()?);
        }
        Ok(Expr::And(operands))
    }

    fn parse_not(&mut self) -> Result<Expr, PredicateError> {
        if self.matches(Token::Not) {
            let inner = self.nested(Self::parse_not)?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, PredicateError> {
        let first = self.parse_sum()?;
        let mut rest = Vec::new();
        while let Token::Compare(op) = self.current().token {
            self.advance();
            rest.push((op, self.parse_sum()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), rest))
        }
    }

    fn parse_sum(&mut self) -> Result<Expr, PredicateError> {
        let first = self.parse_term()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.current().token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(chain(first, rest)),
            };
            self.advance();
            rest.push((op, self.parse_term()?));
        }
    }

    fn parse_term(&mut self) -> Result<Expr, PredicateError> {
        let first = self.parse_unary()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.current().token {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::DoubleSlash => BinaryOp::FloorDiv,
                Token::Percent => BinaryOp::Mod,
                _ => return Ok(chain(first, rest)),
            };
            self.advance();
            rest.push((op, self.parse_unary()?));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, PredicateError> {
        if self.matches(Token::Minus) {
            let inner = self.nested(Self::parse_unary)?;
            return Ok(Expr::Negate(Box::new(inner)));
        }
        if self.matches(Token::Plus) {
            return self.nested(Self::parse_unary);
        }
        self.parse_power()
    }

    /// Power binds tighter than a unary minus on its left: `-2^2` is `-4`.
    fn parse_power(&mut self) -> Result<Expr, PredicateError> {
        let base = self.parse_primary()?;
        if self.matches(Token::Power) {
            let exponent = self.nested(Self::parse_unary)?;
            return Ok(Expr::Binary(
                BinaryOp::Pow,
                Box::new(base),
                Box::new(exponent),
            ));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, PredicateError> {
        let SpannedToken { token, position } = *self.current();
        match token {
            Token::Number(raw) => {
                self.advance();
                raw.parse::<f64>()
                    .map(Expr::Number)
                    .map_err(|_| PredicateError::InvalidNumber {
                        raw: raw.to_string(),
                        position,
                    })
            }
            Token::Ident("x") => {
                self.advance();
                Ok(Expr::Variable)
            }
            Token::Ident(name) => Err(PredicateError::UnknownName {
                name: name.to_string(),
                position,
            }),
            Token::LParen => {
                self.advance();
                let inner = self.nested(Self::parse_or)?;
                if !self.matches(Token::RParen) {
                    return Err(self.unexpected("`)`"));
                }
                Ok(inner)
            }
            _ => Err(self.unexpected("number, `x` or `(`")),
        }
    }

    fn nested<F>(&mut self, parse: F) -> Result<Expr, PredicateError>
    where
        F: FnOnce(&mut Self) -> Result<Expr, PredicateError>,
    {
        if self.nesting >= MAX_NESTING {
            return Err(PredicateError::NestingTooDeep {
                max: MAX_NESTING,
                position: self.current().position,
            });
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    fn expect_eof(&self) -> Result<(), PredicateError> {
        if self.current().token == Token::Eof {
            Ok(())
        } else {
            Err(self.unexpected("operator or end of input"))
        }
    }

    fn matches(&mut self, token: Token<'_>) -> bool {
        if self.current().token == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn current(&self) -> &SpannedToken<'a> {
        // The stream always ends with `Eof` and `advance` never passes it.
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
    }

    fn unexpected(&self, expected: &'static str) -> PredicateError {
        let current = self.current();
        PredicateError::UnexpectedToken {
            expected,
            found: current.token.to_string(),
            position: current.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str, x: f64) -> f64 {
        Predicate::parse(source).unwrap().evaluate(x).unwrap().as_f64()
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(eval("1 + 2 * 3", 0.0), 7.0);
        assert_eq!(eval("(1 + 2) * 3", 0.0), 9.0);
        assert_eq!(eval("-2^2", 0.0), -4.0);
        assert_eq!(eval("2^3^2", 0.0), 512.0);
        assert_eq!(eval("2**-1", 0.0), 0.5);
        assert_eq!(eval("7 // 2", 0.0), 3.0);
        assert_eq!(eval("-7 // 2", 0.0), -4.0);
        assert_eq!(eval("x / 4", 10.0), 2.5);
        assert_eq!(eval("1e3 + .5", 0.0), 1000.5);
    }

    #[test]
    fn test_modulo_follows_divisor_sign() {
        assert_eq!(eval("x % 3", -1.0), 2.0);
        assert_eq!(eval("x % -3", 1.0), -2.0);
        assert_eq!(eval("x % 100", 200.0), 0.0);
    }

    #[test]
    fn test_chained_comparison() {
        let p = Predicate::parse("-1.2<x<=4.3").unwrap();
        assert!(!p.holds(-1.2).unwrap());
        assert!(p.holds(-1.1).unwrap());
        assert!(p.holds(4.3).unwrap());
        assert!(!p.holds(4.4).unwrap());
    }

    #[test]
    fn test_boolean_connectives() {
        let p = Predicate::parse("x < 0 or x > 10 and not x == 20").unwrap();
        assert!(p.holds(-1.0).unwrap());
        assert!(p.holds(11.0).unwrap());
        assert!(!p.holds(20.0).unwrap());
        assert!(!p.holds(5.0).unwrap());

        // `and`/`or` yield an operand, truthiness decides.
        assert!(Predicate::parse("x and 2").unwrap().holds(1.0).unwrap());
        assert!(!Predicate::parse("x and 2").unwrap().holds(0.0).unwrap());
    }

    #[test]
    fn test_division_by_zero() {
        let p = Predicate::parse("10 / x > 1").unwrap();
        assert_eq!(
            p.holds(0.0).unwrap_err(),
            PredicateError::DivisionByZero {
                operation: "division"
            }
        );
        assert!(!p.holds(0.0).unwrap_err().is_syntax());
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(
            Predicate::parse("10<=x<=1p00").unwrap_err(),
            PredicateError::UnexpectedToken { ref found, position: 8, .. } if found == "p00"
        ));
        assert!(matches!(
            Predicate::parse("x != 1 and X != 2").unwrap_err(),
            PredicateError::UnknownName { ref name, position: 11 } if name == "X"
        ));
        assert!(matches!(
            Predicate::parse("x = 1").unwrap_err(),
            PredicateError::UnexpectedToken { position: 2, .. }
        ));
        assert!(matches!(
            Predicate::parse("(x > 1").unwrap_err(),
            PredicateError::UnexpectedToken { expected: "`)`", .. }
        ));
        assert!(matches!(
            Predicate::parse("x > 1 1").unwrap_err(),
            PredicateError::UnexpectedToken { .. }
        ));
        assert!(matches!(
            Predicate::parse("x > .").unwrap_err(),
            PredicateError::InvalidNumber { .. }
        ));
        assert_eq!(Predicate::parse("   ").unwrap_err(), PredicateError::Empty);
        assert!(matches!(
            Predicate::parse("abs(x) > 1").unwrap_err(),
            PredicateError::UnknownName { .. }
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}x{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert!(matches!(
            Predicate::parse(&deep).unwrap_err(),
            PredicateError::NestingTooDeep { .. }
        ));

        let shallow = format!("{}x{} > 1", "(".repeat(8), ")".repeat(8));
        assert!(Predicate::parse(&shallow).is_ok());
    }

    #[test]
    fn test_long_operator_chains() {
        let conjunction = format!("x >= 0 and x <= 10{}", " and x >= 0".repeat(5000));
        let p = Predicate::parse(&conjunction).unwrap();
        assert!(p.holds(5.0).unwrap());
        assert!(!p.holds(11.0).unwrap());

        let disjunction = format!("x < 0{}", " or x > 100".repeat(5000));
        assert!(!Predicate::parse(&disjunction).unwrap().holds(5.0).unwrap());

        assert_eq!(eval(&format!("x{}", " + 1".repeat(5000)), 0.0), 5000.0);
        assert_eq!(eval(&format!("x{}", " * 1".repeat(5000)), 3.0), 3.0);
        assert_eq!(eval("10 - 2 - 3", 0.0), 5.0);
        assert_eq!(eval("100 / 10 / 5", 0.0), 2.0);
        assert_eq!(eval("7 // 2 * 2", 0.0), 6.0);
    }

    #[test]
    fn test_literal_spans() {
        assert_eq!(literal_spans("-1.2<x<=4.3"), vec!["-1.2", "4.3"]);
        assert_eq!(
            literal_spans("1<=x<=10^6 and x%10000!=0"),
            vec!["1", "10^6", "10000", "0"]
        );
        assert_eq!(
            literal_spans("x >= 100 and x <= 10000 and x % 100 == 0"),
            vec!["100", "10000", "100", "0"]
        );
        assert_eq!(literal_spans("x > 2 * 50 - 1"), vec!["2 * 50 - 1"]);
        assert_eq!(literal_spans("x > 3. and x < 4.5."), vec!["3", "4.5"]);
        assert!(literal_spans("x > y").is_empty());
    }

    #[test]
    fn test_evaluate_constant() {
        assert_eq!(evaluate_constant("10^6").unwrap(), 1_000_000.0);
        assert_eq!(evaluate_constant("2 * 50 - 1").unwrap(), 99.0);
        assert_eq!(evaluate_constant("-1.2").unwrap(), -1.2);
        assert!(evaluate_constant("1/0").is_err());
    }
}
