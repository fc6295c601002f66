//! A small expression language for declarative custom validation.
//!
//! Custom rules are conditions over the candidate value, evaluated by an
//! interpreter; no code is ever compiled from schema text. A rule passes when
//! its condition is truthy.
//!
//! ```text
//! condition  := or
//! or         := and ("or" and)*
//! and        := not ("and" not)*
//! not        := "not" not | comparison
//! comparison := operand (op operand | "in" operand | "not" "in" operand)?
//!             | "(" or ")"
//! op         := == | != | < | > | <= | >= | matches | contains | startswith | endswith
//! operand    := value | null | true | false | number | string | "[" operand,* "]"
//!             | len(operand) | lower(operand) | upper(operand) | trim(operand)
//!             | count(operand) | number(operand)
//! ```
//!
//! The right-hand side of `matches` must be a string literal; it is compiled
//! once at parse time and matched anywhere in the left-hand string.
//!
//! # Examples
//!
//! ```
//! use formcraft_forms::expression::Expression;
//! use formcraft_forms::value::FieldValue;
//!
//! let expr = Expression::parse("len(trim(value)) >= 3 and not value startswith 'x'").unwrap();
//! assert!(expr.evaluate(&FieldValue::from("abc")).unwrap());
//! assert!(!expr.evaluate(&FieldValue::from("xyz")).unwrap());
//! ```

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use formcraft_core::FormcraftError;

use crate::value::FieldValue;

/// An error raised while evaluating a parsed expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EvalError(String);

// ── Values ──────────────────────────────────────────────────────────────

/// A runtime value inside an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Num(f64),
    /// A string.
    Str(String),
    /// A list of values.
    List(Vec<Value>),
}

impl Value {
    /// Returns the truthiness of the value.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Num(n) => *n != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Self::Num(n) => Some(*n),
            Self::Str(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    fn to_display_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Num(n) => n.to_string(),
            Self::Str(s) => s.clone(),
            Self::List(items) => items
                .iter()
                .map(Self::to_display_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Null, _) | (_, Self::Null) => false,
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Self::List(_), _) | (_, Self::List(_)) => false,
            _ => match (self.as_float(), other.as_float()) {
                (Some(l), Some(r)) => (l - r).abs() < f64::EPSILON,
                _ => self.to_display_string() == other.to_display_string(),
            },
        }
    }

    fn map_str(self, f: fn(&str) -> String) -> Self {
        match self {
            Self::Str(s) => Self::Str(f(&s)),
            Self::List(items) => Self::List(items.into_iter().map(|v| v.map_str(f)).collect()),
            other => other,
        }
    }
}

impl From<&FieldValue> for Value {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Empty => Self::Null,
            FieldValue::Number(n) => Self::Num(*n),
            FieldValue::Text(s) => Self::Str(s.clone()),
            FieldValue::List(items) => Self::List(items.iter().cloned().map(Self::Str).collect()),
        }
    }
}

// ── Syntax tree ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Len,
    Lower,
    Upper,
    Trim,
    Count,
    Number,
}

impl Func {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "len" => Self::Len,
            "lower" => Self::Lower,
            "upper" => Self::Upper,
            "trim" => Self::Trim,
            "count" => Self::Count,
            "number" => Self::Number,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone)]
enum Operand {
    Input,
    Literal(Value),
    List(Vec<Operand>),
    Call(Func, Box<Operand>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextOp {
    Contains,
    StartsWith,
    EndsWith,
}

#[derive(Debug, Clone)]
enum Condition {
    Expr(Operand),
    Not(Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Compare(Operand, &'static str, Operand),
    In(Operand, Operand),
    NotIn(Operand, Operand),
    Text(Operand, TextOp, Operand),
    Matches(Operand, Regex),
}

// ── Lexer ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(f64),
    Op(&'static str),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

fn syntax_error(msg: impl fmt::Display) -> FormcraftError {
    FormcraftError::InvalidSchema(format!("Invalid rule expression: {msg}"))
}

fn tokenize(source: &str) -> Result<Vec<Token>, FormcraftError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '=' | '!' | '<' | '>' => {
                let next = chars.get(i + 1).copied();
                let op = match (c, next) {
                    ('=', Some('=')) => "==",
                    ('!', Some('=')) => "!=",
                    ('<', Some('=')) => "<=",
                    ('>', Some('=')) => ">=",
                    ('<', _) => "<",
                    ('>', _) => ">",
                    _ => return Err(syntax_error(format!("unexpected '{c}' at {i}"))),
                };
                i += op.len();
                tokens.push(Token::Op(op));
            }
            '\'' | '"' => {
                let quote = c;
                let mut s = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(syntax_error("unterminated string literal")),
                        Some(&ch) if ch == quote => {
                            i += 1;
                            break;
                        }
                        Some('\\') => {
                            let escaped = chars
                                .get(i + 1)
                                .ok_or_else(|| syntax_error("unterminated string literal"))?;
                            s.push(*escaped);
                            i += 2;
                        }
                        Some(&ch) => {
                            s.push(ch);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(s));
            }
            c if c.is_ascii_digit()
                || (c == '-' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) =>
            {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| syntax_error(format!("invalid number '{text}'")))?;
                tokens.push(Token::Num(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            _ => return Err(syntax_error(format!("unexpected '{c}' at {i}"))),
        }
    }

    Ok(tokens)
}

// ── Parser ──────────────────────────────────────────────────────────────

/// Deepest nesting of `not`, parentheses, lists and calls the parser accepts.
const MAX_NESTING: usize = 64;

/// Longest expression, in tokens. Bounds chains of `and`/`or`, which the
/// parser builds iteratively but evaluation walks recursively.
const MAX_TOKENS: usize = 1024;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    const fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, FormcraftError>,
    ) -> Result<T, FormcraftError> {
        if self.depth >= MAX_NESTING {
            return Err(syntax_error("expression nested too deeply"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_ident(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(w)) if w == word)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), FormcraftError> {
        match self.next() {
            Some(ref t) if t == expected => Ok(()),
            _ => Err(syntax_error(format!("expected {what}"))),
        }
    }

    fn parse_or(&mut self) -> Result<Condition, FormcraftError> {
        let mut left = self.parse_and()?;
        while self.peek_ident("or") {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Condition, FormcraftError> {
        let mut left = self.parse_not()?;
        while self.peek_ident("and") {
            self.pos += 1;
            let right = self.parse_not()?;
            left = Condition::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Condition, FormcraftError> {
        if self.peek_ident("not") {
            self.pos += 1;
            let inner = self.nested(Self::parse_not)?;
            Ok(Condition::Not(Box::new(inner)))
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> Result<Condition, FormcraftError> {
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            let inner = self.nested(Self::parse_or)?;
            self.expect(&Token::RParen, "')'")?;
            return Ok(inner);
        }

        let left = self.parse_operand()?;

        match self.peek().cloned() {
            Some(Token::Op(op)) => {
                self.pos += 1;
                let right = self.parse_operand()?;
                Ok(Condition::Compare(left, op, right))
            }
            Some(Token::Ident(word)) => match word.as_str() {
                "in" => {
                    self.pos += 1;
                    Ok(Condition::In(left, self.parse_operand()?))
                }
                "not" if matches!(self.tokens.get(self.pos + 1), Some(Token::Ident(w)) if w == "in") => {
                    self.pos += 2;
                    Ok(Condition::NotIn(left, self.parse_operand()?))
                }
                "contains" | "startswith" | "endswith" => {
                    self.pos += 1;
                    let op = match word.as_str() {
                        "contains" => TextOp::Contains,
                        "startswith" => TextOp::StartsWith,
                        _ => TextOp::EndsWith,
                    };
                    Ok(Condition::Text(left, op, self.parse_operand()?))
                }
                "matches" => {
                    self.pos += 1;
                    match self.next() {
                        Some(Token::Str(pattern)) => {
                            let re = Regex::new(&pattern).map_err(|e| {
                                syntax_error(format!("invalid pattern '{pattern}': {e}"))
                            })?;
                            Ok(Condition::Matches(left, re))
                        }
                        _ => Err(syntax_error("'matches' requires a string literal pattern")),
                    }
                }
                _ => Ok(Condition::Expr(left)),
            },
            _ => Ok(Condition::Expr(left)),
        }
    }

    fn parse_operand(&mut self) -> Result<Operand, FormcraftError> {
        match self.next() {
            Some(Token::Str(s)) => Ok(Operand::Literal(Value::Str(s))),
            Some(Token::Num(n)) => Ok(Operand::Literal(Value::Num(n))),
            Some(Token::LBracket) => {
                let mut items = Vec::new();
                if self.peek() == Some(&Token::RBracket) {
                    self.pos += 1;
                    return Ok(Operand::List(items));
                }
                loop {
                    items.push(self.nested(Self::parse_operand)?);
                    match self.next() {
                        Some(Token::Comma) => {}
                        Some(Token::RBracket) => break,
                        _ => return Err(syntax_error("expected ',' or ']' in list")),
                    }
                }
                Ok(Operand::List(items))
            }
            Some(Token::Ident(word)) => match word.as_str() {
                "value" => Ok(Operand::Input),
                "null" => Ok(Operand::Literal(Value::Null)),
                "true" => Ok(Operand::Literal(Value::Bool(true))),
                "false" => Ok(Operand::Literal(Value::Bool(false))),
                name => {
                    let func = Func::from_name(name)
                        .ok_or_else(|| syntax_error(format!("unknown name '{name}'")))?;
                    self.expect(&Token::LParen, &format!("'(' after '{name}'"))?;
                    let arg = self.nested(Self::parse_operand)?;
                    self.expect(&Token::RParen, "')'")?;
                    Ok(Operand::Call(func, Box::new(arg)))
                }
            },
            Some(token) => Err(syntax_error(format!("unexpected token {token:?}"))),
            None => Err(syntax_error("unexpected end of expression")),
        }
    }
}

// ── Evaluation ──────────────────────────────────────────────────────────

impl Operand {
    fn resolve(&self, input: &Value) -> Result<Value, EvalError> {
        match self {
            Self::Input => Ok(input.clone()),
            Self::Literal(v) => Ok(v.clone()),
            Self::List(items) => items
                .iter()
                .map(|item| item.resolve(input))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Self::Call(func, arg) => call(*func, arg.resolve(input)?),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn call(func: Func, arg: Value) -> Result<Value, EvalError> {
    Ok(match func {
        Func::Len => Value::Num(match &arg {
            Value::Null => 0.0,
            Value::List(items) => items.len() as f64,
            other => other.to_display_string().chars().count() as f64,
        }),
        Func::Count => Value::Num(match &arg {
            Value::Null => 0.0,
            Value::List(items) => items.len() as f64,
            _ => 1.0,
        }),
        Func::Lower => arg.map_str(str::to_lowercase),
        Func::Upper => arg.map_str(str::to_uppercase),
        Func::Trim => arg.map_str(|s| s.trim().to_string()),
        Func::Number => Value::Num(arg.as_float().ok_or_else(|| {
            EvalError(format!("'{}' is not a number", arg.to_display_string()))
        })?),
    })
}

fn value_in(needle: &Value, haystack: &Value) -> bool {
    match haystack {
        Value::List(items) => match needle {
            Value::List(wanted) => wanted.iter().all(|w| items.iter().any(|i| i.loose_eq(w))),
            _ => items.iter().any(|item| item.loose_eq(needle)),
        },
        Value::Str(s) => s.contains(&needle.to_display_string()),
        _ => false,
    }
}

fn compare_values(left: &Value, op: &str, right: &Value) -> bool {
    match op {
        "==" => left.loose_eq(right),
        "!=" => !left.loose_eq(right),
        "<" | ">" | "<=" | ">=" => {
            let ordering = match (left.as_float(), right.as_float()) {
                (Some(l), Some(r)) => l.partial_cmp(&r),
                _ => Some(left.to_display_string().cmp(&right.to_display_string())),
            };
            ordering.is_some_and(|o| match op {
                "<" => o.is_lt(),
                ">" => o.is_gt(),
                "<=" => o.is_le(),
                _ => o.is_ge(),
            })
        }
        _ => false,
    }
}

impl Condition {
    fn evaluate(&self, input: &Value) -> Result<bool, EvalError> {
        Ok(match self {
            Self::Expr(operand) => operand.resolve(input)?.is_truthy(),
            Self::Not(inner) => !inner.evaluate(input)?,
            Self::And(left, right) => left.evaluate(input)? && right.evaluate(input)?,
            Self::Or(left, right) => left.evaluate(input)? || right.evaluate(input)?,
            Self::Compare(left, op, right) => {
                compare_values(&left.resolve(input)?, op, &right.resolve(input)?)
            }
            Self::In(needle, haystack) => value_in(&needle.resolve(input)?, &haystack.resolve(input)?),
            Self::NotIn(needle, haystack) => {
                !value_in(&needle.resolve(input)?, &haystack.resolve(input)?)
            }
            Self::Text(left, op, right) => {
                let l = left.resolve(input)?;
                let r = right.resolve(input)?;
                match (op, &l) {
                    (TextOp::Contains, Value::List(items)) => items.iter().any(|i| i.loose_eq(&r)),
                    (TextOp::Contains, _) => l.to_display_string().contains(&r.to_display_string()),
                    (TextOp::StartsWith, _) => {
                        l.to_display_string().starts_with(&r.to_display_string())
                    }
                    (TextOp::EndsWith, _) => l.to_display_string().ends_with(&r.to_display_string()),
                }
            }
            Self::Matches(left, re) => re.is_match(&left.resolve(input)?.to_display_string()),
        })
    }
}

// ── Public expression type ──────────────────────────────────────────────

/// A parsed rule expression.
///
/// Serializes as its source text; deserializing parses it, so a schema with a
/// malformed expression is rejected when it is read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Expression {
    source: String,
    condition: Condition,
}

impl Expression {
    /// Parses an expression.
    ///
    /// # Errors
    ///
    /// Returns [`FormcraftError::InvalidSchema`] if the text is not a valid expression.
    pub fn parse(source: &str) -> Result<Self, FormcraftError> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(syntax_error("empty expression"));
        }
        if tokens.len() > MAX_TOKENS {
            return Err(syntax_error(format!("expression longer than {MAX_TOKENS} tokens")));
        }
        let mut parser = Parser::new(tokens);
        let condition = parser.parse_or()?;
        if let Some(token) = parser.peek() {
            return Err(syntax_error(format!("unexpected trailing token {token:?}")));
        }
        Ok(Self {
            source: source.to_string(),
            condition,
        })
    }

    /// The source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates the expression with `value` bound to the candidate value.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] when a function cannot be applied (e.g.
    /// `number()` on non-numeric text).
    pub fn evaluate(&self, value: &FieldValue) -> Result<bool, EvalError> {
        self.condition.evaluate(&Value::from(value))
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl TryFrom<String> for Expression {
    type Error = FormcraftError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::parse(&source)
    }
}

impl From<Expression> for String {
    fn from(expr: Expression) -> Self {
        expr.source
    }
}

impl std::str::FromStr for Expression {
    type Err = FormcraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
