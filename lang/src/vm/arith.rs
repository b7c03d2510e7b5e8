//! Numeric, comparison and logic operators.
//!
//! Binary operators promote both operands to their common kind first, then
//! dispatch on it. String and Array operands are routed to [`sequence`]
//! before promotion for the operators that overload them.

use std::cmp::Ordering;

use super::runtime::{ErrorKind, RuntimeError};
use super::sequence;
use super::value::{promote, Value};

type IntOp = fn(i64, i64) -> Result<i64, RuntimeError>;
type DecimalOp = fn(f64, f64) -> f64;

fn overflow(symbol: &str) -> RuntimeError {
    RuntimeError::new(ErrorKind::Overflow, format!("'{symbol}' overflowed"))
}

fn division_by_zero() -> RuntimeError {
    RuntimeError::new(ErrorKind::DivisionByZero, "divisor is zero")
}

/// Promotes and applies `int` to Integers and Character codes, `decimal` to Decimals
fn numeric(
    symbol: &str,
    a: Value,
    b: Value,
    int: IntOp,
    decimal: Option<DecimalOp>,
) -> Result<Value, RuntimeError> {
    let (a, b) = promote(a, b)?;
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => int(x, y).map(Value::Integer),
        (Value::Character(x), Value::Character(y)) => {
            let code = int(i64::from(u32::from(x)), i64::from(u32::from(y)))?;
            Value::from_code(code)
        }
        (Value::Decimal(x), Value::Decimal(y)) => match decimal {
            Some(f) => Ok(Value::decimal(f(x.0, y.0))),
            None => Err(RuntimeError::type_error(format!(
                "'{symbol}' is not defined for Decimal"
            ))),
        },
        (a, _) => Err(RuntimeError::type_error(format!(
            "'{symbol}' is not defined for {}",
            a.type_name()
        ))),
    }
}

pub fn sum(a: Value, b: Value) -> Result<Value, RuntimeError> {
    if a.is_sequence() || b.is_sequence() {
        return sequence::concat(a, b);
    }
    numeric(
        "+",
        a,
        b,
        |x, y| x.checked_add(y).ok_or_else(|| overflow("+")),
        Some(|x, y| x + y),
    )
}

pub fn subtract(a: Value, b: Value) -> Result<Value, RuntimeError> {
    numeric(
        "-",
        a,
        b,
        |x, y| x.checked_sub(y).ok_or_else(|| overflow("-")),
        Some(|x, y| x - y),
    )
}

pub fn multiply(a: Value, b: Value) -> Result<Value, RuntimeError> {
    match (a, b) {
        (seq, Value::Integer(n)) | (Value::Integer(n), seq) if seq.is_sequence() => {
            sequence::repeat(seq, n)
        }
        (a, b) => numeric(
            "*",
            a,
            b,
            |x, y| x.checked_mul(y).ok_or_else(|| overflow("*")),
            Some(|x, y| x * y),
        ),
    }
}

pub fn divide(a: Value, b: Value) -> Result<Value, RuntimeError> {
    if a.is_sequence() || b.is_sequence() {
        return sequence::split(a, b);
    }
    numeric(
        "/",
        a,
        b,
        |x, y| {
            if y == 0 {
                Err(division_by_zero())
            } else {
                x.checked_div(y).ok_or_else(|| overflow("/"))
            }
        },
        Some(|x, y| x / y),
    )
}

/// Integer remainder, or the floating remainder for Decimals
pub fn module(a: Value, b: Value) -> Result<Value, RuntimeError> {
    numeric(
        "%",
        a,
        b,
        |x, y| {
            if y == 0 {
                Err(division_by_zero())
            } else {
                x.checked_rem(y).ok_or_else(|| overflow("%"))
            }
        },
        Some(|x, y| x % y),
    )
}

/// Power, or the index of the first match when either operand is a sequence
pub fn exponentiate(a: Value, b: Value) -> Result<Value, RuntimeError> {
    if a.is_sequence() || b.is_sequence() {
        return sequence::index_of(a, b);
    }
    numeric(
        "#",
        a,
        b,
        |x, y| match u32::try_from(y) {
            Ok(exp) => x.checked_pow(exp).ok_or_else(|| overflow("#")),
            // Negative exponents go through the real power and truncate
            Err(_) => {
                let power = (x as f64).powf(y as f64);
                if power.is_finite() {
                    Ok(power as i64)
                } else {
                    Err(division_by_zero())
                }
            }
        },
        Some(f64::powf),
    )
}

pub fn bitwise_and(a: Value, b: Value) -> Result<Value, RuntimeError> {
    numeric("&", a, b, |x, y| Ok(x & y), None)
}

pub fn bitwise_or(a: Value, b: Value) -> Result<Value, RuntimeError> {
    numeric("|", a, b, |x, y| Ok(x | y), None)
}

pub fn bitwise_xor(a: Value, b: Value) -> Result<Value, RuntimeError> {
    numeric("^", a, b, |x, y| Ok(x ^ y), None)
}

/// `~` on scalars
pub fn negate(value: Value) -> Result<Value, RuntimeError> {
    match value {
        Value::Integer(n) => Ok(Value::Integer(!n)),
        Value::String(_) => Err(RuntimeError::new(
            ErrorKind::ConversionError,
            "a String cannot be run as a Block",
        )),
        other => Err(RuntimeError::type_error(format!(
            "'~' is not defined for {}",
            other.type_name()
        ))),
    }
}

/// `(` and `)` on scalars: move by one, keeping the variant
pub fn step(value: Value, delta: i64) -> Result<Value, RuntimeError> {
    match value {
        Value::Character(c) => Value::from_code(i64::from(u32::from(c)) + delta),
        Value::Integer(n) => n
            .checked_add(delta)
            .map(Value::Integer)
            .ok_or_else(|| overflow(if delta > 0 { ")" } else { "(" })),
        Value::Decimal(n) => Ok(Value::decimal(n.0 + delta as f64)),
        other => Err(RuntimeError::type_error(format!(
            "cannot step {}",
            other.type_name()
        ))),
    }
}

fn flag(condition: bool) -> Value {
    Value::Integer(i64::from(condition))
}

/// Element access when a sequence meets an Integer, otherwise equality
pub fn is_equal(a: Value, b: Value) -> Result<Value, RuntimeError> {
    match (a, b) {
        (seq, Value::Integer(n)) if seq.is_sequence() => sequence::element_at(seq, n),
        (a, b) => Ok(flag(a.compare(&b)? == Ordering::Equal)),
    }
}

/// First `n` elements of a sequence, otherwise less-than
pub fn is_less(a: Value, b: Value) -> Result<Value, RuntimeError> {
    match (a, b) {
        (seq, Value::Integer(n)) if seq.is_sequence() => sequence::take(seq, n),
        (a, b) => Ok(flag(a.compare(&b)? == Ordering::Less)),
    }
}

/// Elements of a sequence from index `n` on, otherwise greater-than
pub fn is_greater(a: Value, b: Value) -> Result<Value, RuntimeError> {
    match (a, b) {
        (seq, Value::Integer(n)) if seq.is_sequence() => sequence::drop(seq, n),
        (a, b) => Ok(flag(a.compare(&b)? == Ordering::Greater)),
    }
}

pub fn logic_not(value: Value) -> Result<Value, RuntimeError> {
    Ok(flag(!value.is_truthy()))
}

/// `e&`: the second operand if the first is truthy, else the first
pub fn shortcut_and(a: Value, b: Value) -> Result<Value, RuntimeError> {
    Ok(if a.is_truthy() { b } else { a })
}

/// `e|`: the first operand if it is truthy, else the second
pub fn shortcut_or(a: Value, b: Value) -> Result<Value, RuntimeError> {
    Ok(if a.is_truthy() { a } else { b })
}

pub fn minimum(a: Value, b: Value) -> Result<Value, RuntimeError> {
    Ok(match a.compare(&b)? {
        Ordering::Greater => b,
        _ => a,
    })
}

pub fn maximum(a: Value, b: Value) -> Result<Value, RuntimeError> {
    Ok(match a.compare(&b)? {
        Ordering::Less => b,
        _ => a,
    })
}

/// `?`: picks `then` or `otherwise` by the truthiness of `condition`
pub fn conditional(condition: Value, then: Value, otherwise: Value) -> Result<Value, RuntimeError> {
    Ok(if condition.is_truthy() { then } else { otherwise })
}
