use ordered_float::OrderedFloat;
use std::cell::OnceCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use super::runtime::{ErrorKind, RuntimeError};
use super::stack::Stack;
use crate::lexer::{Lexer, Token};

/// Runtime value manipulated by the stack machine
#[derive(Clone, Debug)]
pub enum Value {
    /// A single character, arithmetic works on its code point
    Character(char),

    /// 64-bit signed integer
    Integer(i64),

    /// 64-bit floating point (IEEE 754)
    Decimal(OrderedFloat<f64>),

    /// Owned text
    String(String),

    /// Ordered sequence of values, backed by the same structure as the evaluation stack
    Array(Stack),

    /// Unevaluated program text, run when invoked
    Block(Block),
}

/// Position of a value in the promotion lattice, narrowest first.
///
/// Blocks have no rank: any promotion involving one is a type error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Kind {
    Character,
    Integer,
    Decimal,
    String,
    Array,
}

/// Captured program text together with the position it was written at.
///
/// The text is only tokenized the first time the block runs; clones share
/// that token cache.
#[derive(Clone, Debug)]
pub struct Block {
    source: Rc<str>,
    line: u32,
    column: u32,
    tokens: Rc<OnceCell<Rc<[Token]>>>,
}

impl Block {
    pub fn new(source: impl Into<Rc<str>>, line: u32, column: u32) -> Self {
        Self {
            source: source.into(),
            line,
            column,
            tokens: Rc::new(OnceCell::new()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.source.trim().is_empty()
    }

    /// Tokens of the block body, lexed on first use
    pub fn tokens(&self) -> Result<Rc<[Token]>, RuntimeError> {
        if let Some(tokens) = self.tokens.get() {
            return Ok(Rc::clone(tokens));
        }
        let tokens: Rc<[Token]> = Lexer::at(&self.source, self.line, self.column)
            .tokenize()?
            .into();
        // A re-entrant run may have filled the cell already; either copy is identical.
        let _ = self.tokens.set(Rc::clone(&tokens));
        Ok(tokens)
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Block {}

impl Value {
    pub fn decimal(value: f64) -> Self {
        Value::Decimal(OrderedFloat(value))
    }

    pub fn string(text: impl Into<String>) -> Self {
        Value::String(text.into())
    }

    /// Builds a Character from an integer code point
    pub fn from_code(code: i64) -> Result<Self, RuntimeError> {
        u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .map(Value::Character)
            .ok_or_else(|| {
                RuntimeError::new(
                    ErrorKind::ConversionError,
                    format!("{code} is not a valid character code"),
                )
            })
    }

    /// Truthiness used by `!`, `?`, `w`, filters and comparators.
    ///
    /// Arrays are truthy when non-empty, blocks when their source is not blank.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Character(c) => *c != '\0',
            Value::Integer(n) => *n != 0,
            Value::Decimal(n) => n.0 != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Block(b) => !b.is_empty(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Character(_) => "Character",
            Value::Integer(_) => "Integer",
            Value::Decimal(_) => "Decimal",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Block(_) => "Block",
        }
    }

    /// Strings and arrays, the operands of the sequence overloads
    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::String(_) | Value::Array(_))
    }

    pub fn kind(&self) -> Result<Kind, RuntimeError> {
        match self {
            Value::Character(_) => Ok(Kind::Character),
            Value::Integer(_) => Ok(Kind::Integer),
            Value::Decimal(_) => Ok(Kind::Decimal),
            Value::String(_) => Ok(Kind::String),
            Value::Array(_) => Ok(Kind::Array),
            Value::Block(_) => Err(RuntimeError::new(
                ErrorKind::TypeError,
                "a Block cannot take part in promotion",
            )),
        }
    }

    pub fn convert(self, kind: Kind) -> Result<Value, RuntimeError> {
        match kind {
            Kind::Character => self.into_character(),
            Kind::Integer => self.into_integer(),
            Kind::Decimal => self.into_decimal(),
            Kind::String => self.into_text(),
            Kind::Array => self.into_array().map(Value::Array),
        }
    }

    pub fn into_character(self) -> Result<Value, RuntimeError> {
        match self {
            Value::Character(_) => Ok(self),
            Value::Integer(n) => Value::from_code(n),
            Value::Decimal(n) => Value::from_code(truncate(n.0)?),
            Value::String(s) => Ok(Value::Character(s.chars().next().unwrap_or('\0'))),
            Value::Array(_) => Err(scalar_from_array("Character")),
            Value::Block(_) => Err(block_conversion("Character")),
        }
    }

    pub fn into_integer(self) -> Result<Value, RuntimeError> {
        match self {
            Value::Character(c) => Ok(Value::Integer(i64::from(u32::from(c)))),
            Value::Integer(_) => Ok(self),
            Value::Decimal(n) => truncate(n.0).map(Value::Integer),
            Value::String(s) => parse_integer(&s).map(Value::Integer),
            Value::Array(_) => Err(scalar_from_array("Integer")),
            Value::Block(_) => Err(block_conversion("Integer")),
        }
    }

    pub fn into_decimal(self) -> Result<Value, RuntimeError> {
        match self {
            Value::Character(c) => Ok(Value::decimal(f64::from(u32::from(c)))),
            Value::Integer(n) => Ok(Value::decimal(n as f64)),
            Value::Decimal(_) => Ok(self),
            Value::String(s) => parse_decimal(&s).map(Value::decimal),
            Value::Array(_) => Err(scalar_from_array("Decimal")),
            Value::Block(_) => Err(block_conversion("Decimal")),
        }
    }

    pub fn into_text(self) -> Result<Value, RuntimeError> {
        match self {
            Value::String(_) => Ok(self),
            Value::Block(_) => Err(block_conversion("String")),
            other => Ok(Value::String(other.to_string())),
        }
    }

    /// Widens a value to an array: scalars become singletons, strings their characters
    pub fn into_array(self) -> Result<Stack, RuntimeError> {
        match self {
            Value::Array(stack) => Ok(stack),
            Value::String(s) => Ok(s.chars().map(Value::Character).collect()),
            Value::Block(_) => Err(block_conversion("Array")),
            scalar => Ok(Stack::from_iter([scalar])),
        }
    }

    /// Lattice ordering comparison used by `=`, `<`, `>`, `e<`, `e>` and natural sort
    pub fn compare(&self, other: &Value) -> Result<Ordering, RuntimeError> {
        let (a, b) = promote(self.clone(), other.clone())?;
        match (&a, &b) {
            (Value::Character(x), Value::Character(y)) => Ok(x.cmp(y)),
            (Value::Integer(x), Value::Integer(y)) => Ok(x.cmp(y)),
            (Value::Decimal(x), Value::Decimal(y)) => Ok(x.cmp(y)),
            (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
            (Value::Array(x), Value::Array(y)) => {
                for (p, q) in x.iter().zip(y.iter()) {
                    let ordering = p.compare(q)?;
                    if ordering != Ordering::Equal {
                        return Ok(ordering);
                    }
                }
                Ok(x.len().cmp(&y.len()))
            }
            _ => Err(RuntimeError::new(
                ErrorKind::TypeError,
                format!("cannot compare {} with {}", a.type_name(), b.type_name()),
            )),
        }
    }

    /// Source-like rendering used by the REPL and JSON output
    pub fn inspect(&self) -> String {
        match self {
            Value::Character(c) => format!("'{c}"),
            Value::Decimal(n) => {
                if !n.0.is_finite() {
                    return format_decimal(n.0);
                }
                let text = format_decimal(n.0);
                let trimmed = text.trim_end_matches('0');
                if trimmed.ends_with('.') {
                    format!("{trimmed}0")
                } else {
                    trimmed.to_string()
                }
            }
            Value::String(s) => format!("{s:?}"),
            Value::Array(elements) => {
                let inner: Vec<String> = elements.iter().map(Value::inspect).collect();
                format!("[{}]", inner.join(" "))
            }
            other => other.to_string(),
        }
    }
}

/// Coerces both operands to the wider of their two kinds
pub fn promote(a: Value, b: Value) -> Result<(Value, Value), RuntimeError> {
    let target = a.kind()?.max(b.kind()?);
    Ok((a.convert(target)?, b.convert(target)?))
}

/// Fixed-point rendering with six fractional digits
pub fn format_decimal(value: f64) -> String {
    format!("{value:.6}")
}

fn parse_integer(text: &str) -> Result<i64, RuntimeError> {
    let trimmed = text.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(n);
    }
    match trimmed.parse::<f64>() {
        Ok(n) => truncate(n),
        Err(_) => Err(RuntimeError::new(
            ErrorKind::ConversionError,
            format!("\"{text}\" is not an integer"),
        )),
    }
}

fn parse_decimal(text: &str) -> Result<f64, RuntimeError> {
    text.trim().parse::<f64>().map_err(|_| {
        RuntimeError::new(
            ErrorKind::ConversionError,
            format!("\"{text}\" is not a decimal"),
        )
    })
}

fn truncate(value: f64) -> Result<i64, RuntimeError> {
    let truncated = value.trunc();
    if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated <= i64::MAX as f64 {
        Ok(truncated as i64)
    } else {
        Err(RuntimeError::new(
            ErrorKind::ConversionError,
            format!("{value} does not fit in an Integer"),
        ))
    }
}

fn scalar_from_array(target: &str) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::ConversionError,
        format!("cannot convert an Array to {target}"),
    )
}

fn block_conversion(target: &str) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::TypeError,
        format!("cannot convert a Block to {target}"),
    )
}

/// Structural equality: values of different variants are never equal
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Character(a), Value::Character(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Block(a), Value::Block(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

/// String form, as printed by `p` and at the end of a run
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Character(c) => write!(f, "{c}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Decimal(n) => write!(f, "{}", format_decimal(n.0)),
            Value::String(s) => write!(f, "{s}"),
            Value::Array(elements) => {
                for elem in elements.iter() {
                    write!(f, "{elem}")?;
                }
                Ok(())
            }
            Value::Block(block) => write!(f, "{{{}}}", block.source()),
        }
    }
}
