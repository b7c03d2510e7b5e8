//! String and Array operations: search, split, slicing and sorting.
//!
//! Text is handled as a sequence of characters so indices and lengths count
//! characters, not bytes.

use super::runtime::{ErrorKind, RuntimeError};
use super::stack::Stack;
use super::value::{promote, Value};

/// Position of the first occurrence of `pattern`; an empty pattern matches at 0
pub fn find_subsequence<T: PartialEq>(haystack: &[T], pattern: &[T]) -> Option<usize> {
    if pattern.is_empty() {
        return Some(0);
    }
    if pattern.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - pattern.len()).find(|&i| haystack[i..i + pattern.len()] == *pattern)
}

/// Character index of the first occurrence of `pattern` in `haystack`, or -1
pub fn substr(haystack: &str, pattern: &str) -> i64 {
    let haystack: Vec<char> = haystack.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    find_subsequence(&haystack, &pattern).map_or(-1, |i| i as i64)
}

/// Pieces between non-overlapping occurrences of `pattern`.
///
/// Leading and interior empty pieces are kept; a single trailing empty piece
/// (input ending on the delimiter) is dropped.
pub fn split_subsequence<T: PartialEq + Clone>(
    items: &[T],
    pattern: &[T],
) -> Result<Vec<Vec<T>>, RuntimeError> {
    if pattern.is_empty() {
        return Err(RuntimeError::new(
            ErrorKind::InvalidPattern,
            "cannot split by an empty pattern",
        ));
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + pattern.len() <= items.len() {
        if items[i..i + pattern.len()] == *pattern {
            pieces.push(items[start..i].to_vec());
            i += pattern.len();
            start = i;
        } else {
            i += 1;
        }
    }
    if start < items.len() {
        pieces.push(items[start..].to_vec());
    }
    if pieces.is_empty() {
        pieces.push(items.to_vec());
    }
    Ok(pieces)
}

pub fn separate_by_substr(text: &str, pattern: &str) -> Result<Vec<String>, RuntimeError> {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    Ok(split_subsequence(&text, &pattern)?
        .into_iter()
        .map(|piece| piece.into_iter().collect())
        .collect())
}

fn sequence_error(symbol: &str, value: &Value) -> RuntimeError {
    RuntimeError::type_error(format!(
        "'{symbol}' expects a String or Array, got {}",
        value.type_name()
    ))
}

fn elements(stack: &Stack) -> Vec<Value> {
    stack.iter().cloned().collect()
}

/// `+` on sequences: both sides are promoted, then joined
pub fn concat(a: Value, b: Value) -> Result<Value, RuntimeError> {
    match promote(a, b)? {
        (Value::String(mut x), Value::String(y)) => {
            x.push_str(&y);
            Ok(Value::String(x))
        }
        (Value::Array(mut x), Value::Array(y)) => {
            x.merge(y);
            Ok(Value::Array(x))
        }
        (a, _) => Err(sequence_error("+", &a)),
    }
}

/// `*` with an Integer count; a negative count gives an empty sequence
pub fn repeat(seq: Value, times: i64) -> Result<Value, RuntimeError> {
    let times = usize::try_from(times).unwrap_or(0);
    match seq {
        Value::String(s) => {
            repeated_len(s.len(), times)?;
            Ok(Value::String(s.repeat(times)))
        }
        Value::Array(elements) => {
            let mut repeated = Stack::new();
            if elements.is_empty() {
                return Ok(Value::Array(repeated));
            }
            repeated_len(elements.len(), times)?;
            for _ in 0..times {
                repeated.merge(elements.clone());
            }
            Ok(Value::Array(repeated))
        }
        other => Err(sequence_error("*", &other)),
    }
}

/// Upper bound on the length a repetition may produce
const MAX_REPEAT_LEN: usize = 1 << 28;

fn repeated_len(len: usize, times: usize) -> Result<usize, RuntimeError> {
    len.checked_mul(times)
        .filter(|&total| total <= MAX_REPEAT_LEN)
        .ok_or_else(|| {
            RuntimeError::new(
                ErrorKind::Overflow,
                format!("repeating {len} element(s) {times} times is too long"),
            )
        })
}

/// `/` on sequences: Strings split into Strings, Arrays into Arrays
pub fn split(a: Value, b: Value) -> Result<Value, RuntimeError> {
    match promote(a, b)? {
        (Value::String(text), Value::String(pattern)) => {
            let pieces = separate_by_substr(&text, &pattern)?;
            Ok(Value::Array(pieces.into_iter().map(Value::String).collect()))
        }
        (Value::Array(items), Value::Array(pattern)) => {
            let pieces = split_subsequence(&elements(&items), &elements(&pattern))?;
            Ok(Value::Array(
                pieces
                    .into_iter()
                    .map(|piece| Value::Array(piece.into()))
                    .collect(),
            ))
        }
        (a, _) => Err(sequence_error("/", &a)),
    }
}

/// `#` on sequences: index of the first match, or -1
pub fn index_of(a: Value, b: Value) -> Result<Value, RuntimeError> {
    match promote(a, b)? {
        (Value::String(haystack), Value::String(pattern)) => {
            Ok(Value::Integer(substr(&haystack, &pattern)))
        }
        (Value::Array(haystack), Value::Array(pattern)) => Ok(Value::Integer(
            find_subsequence(&elements(&haystack), &elements(&pattern))
                .map_or(-1, |i| i as i64),
        )),
        (a, _) => Err(sequence_error("#", &a)),
    }
}

/// Element at `index`, counting from the end when negative
pub fn element_at(seq: Value, index: i64) -> Result<Value, RuntimeError> {
    let items = seq.into_array()?;
    let len = items.len() as i64;
    let position = if index < 0 { index + len } else { index };
    usize::try_from(position)
        .ok()
        .and_then(|p| items.get(p))
        .cloned()
        .ok_or_else(|| {
            RuntimeError::new(
                ErrorKind::IndexOutOfBounds,
                format!("index {index} is outside a sequence of length {len}"),
            )
        })
}

fn clamp(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}

/// The first `n` elements
pub fn take(seq: Value, n: i64) -> Result<Value, RuntimeError> {
    match seq {
        Value::String(s) => Ok(Value::String(s.chars().take(clamp(n)).collect())),
        Value::Array(items) => Ok(Value::Array(items.take_bottom(clamp(n)))),
        other => Err(sequence_error("<", &other)),
    }
}

/// Everything from index `n` on
pub fn drop(seq: Value, n: i64) -> Result<Value, RuntimeError> {
    match seq {
        Value::String(s) => Ok(Value::String(s.chars().skip(clamp(n)).collect())),
        Value::Array(items) => Ok(Value::Array(items.skip_bottom(clamp(n)))),
        other => Err(sequence_error(">", &other)),
    }
}

fn empty_sequence(symbol: &str) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::IndexOutOfBounds,
        format!("'{symbol}' on an empty sequence"),
    )
}

/// Splits off the first element: `(rest, first)`
pub fn uncons(seq: Value) -> Result<(Value, Value), RuntimeError> {
    match seq {
        Value::String(s) => {
            let mut chars = s.chars();
            let first = chars.next().ok_or_else(|| empty_sequence("("))?;
            Ok((Value::String(chars.collect()), Value::Character(first)))
        }
        Value::Array(mut items) => {
            let first = items.pop_bottom().ok_or_else(|| empty_sequence("("))?;
            Ok((Value::Array(items), first))
        }
        other => Err(sequence_error("(", &other)),
    }
}

/// Splits off the last element: `(rest, last)`
pub fn unsnoc(seq: Value) -> Result<(Value, Value), RuntimeError> {
    match seq {
        Value::String(mut s) => {
            let last = s.pop().ok_or_else(|| empty_sequence(")"))?;
            Ok((Value::String(s), Value::Character(last)))
        }
        Value::Array(mut items) => {
            let last = items.pop().map_err(|_| empty_sequence(")"))?;
            Ok((Value::Array(items), last))
        }
        other => Err(sequence_error(")", &other)),
    }
}

/// `n,`: the Integers `0..n`
pub fn range(n: i64) -> Value {
    Value::Array((0..n.max(0)).map(Value::Integer).collect())
}

fn expect_text(symbol: &str, value: Value) -> Result<String, RuntimeError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(RuntimeError::type_error(format!(
            "'{symbol}' expects a String, got {}",
            other.type_name()
        ))),
    }
}

fn strings<'a>(pieces: impl Iterator<Item = &'a str>) -> Value {
    Value::Array(pieces.map(Value::string).collect())
}

/// `S/`: words separated by runs of whitespace
pub fn split_by_whitespace(value: Value) -> Result<Value, RuntimeError> {
    let text = expect_text("S/", value)?;
    Ok(strings(text.split_whitespace()))
}

/// `N/`: lines, without their terminators
pub fn split_by_newline(value: Value) -> Result<Value, RuntimeError> {
    let text = expect_text("N/", value)?;
    Ok(strings(text.lines()))
}

/// Turns the result of an operation over a String back into a String,
/// as long as every element is still a Character
pub fn restore_text(items: Stack, was_text: bool) -> Value {
    if was_text && items.iter().all(|v| matches!(v, Value::Character(_))) {
        Value::String(items.iter().map(|v| v.to_string()).collect())
    } else {
        Value::Array(items)
    }
}

/// `$` on a sequence: stable sort by the promoted ordering
pub fn natural_sort(seq: Value) -> Result<Value, RuntimeError> {
    let was_text = matches!(seq, Value::String(_));
    let items = match seq {
        Value::String(_) | Value::Array(_) => seq.into_array()?,
        other => return Err(sequence_error("$", &other)),
    };
    let mut less = |a: &Value, b: &Value| -> Result<bool, RuntimeError> {
        Ok(a.compare(b)? == std::cmp::Ordering::Less)
    };
    let sorted = merge_sort(items, &mut less)?;
    Ok(restore_text(sorted, was_text))
}

/// Stable top-down merge sort driven by a strict `less` predicate.
///
/// The upper half is detached with [`Stack::split`] and becomes the right run.
pub fn merge_sort<F>(mut items: Stack, less: &mut F) -> Result<Stack, RuntimeError>
where
    F: FnMut(&Value, &Value) -> Result<bool, RuntimeError>,
{
    if items.len() < 2 {
        return Ok(items);
    }
    let right = items.split(items.len() / 2)?;
    let left = merge_sort(items, less)?;
    let right = merge_sort(right, less)?;
    merge_runs(left, right, less)
}

/// Ties, where neither side is less than the other, take from the left run
fn merge_runs<F>(left: Stack, right: Stack, less: &mut F) -> Result<Stack, RuntimeError>
where
    F: FnMut(&Value, &Value) -> Result<bool, RuntimeError>,
{
    let mut merged = Stack::new();
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => less(l, r)? || !less(r, l)?,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        if let Some(value) = next {
            merged.push(value);
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Stack {
        values.iter().map(|n| Value::Integer(*n)).collect()
    }

    fn pairs(values: &[(i64, char)]) -> Stack {
        values
            .iter()
            .map(|(n, tag)| Value::Array(Stack::from(vec![Value::Integer(*n), Value::Character(*tag)])))
            .collect()
    }

    fn by_key(a: &Value, b: &Value) -> Result<bool, RuntimeError> {
        let key = |v: &Value| element_at(v.clone(), 0);
        Ok(key(a)?.compare(&key(b)?)? == std::cmp::Ordering::Less)
    }

    #[test]
    fn substr_finds_first_occurrence() {
        assert_eq!(substr("abcabc", "bc"), 1);
        assert_eq!(substr("abc", "z"), -1);
        assert_eq!(substr("abc", ""), 0);
        assert_eq!(substr("", ""), 0);
        assert_eq!(substr("ab", "abc"), -1);
        assert_eq!(substr("héllo", "llo"), 2);
    }

    #[test]
    fn separate_keeps_interior_empties() {
        assert_eq!(separate_by_substr("a,b,,c", ",").unwrap(), vec!["a", "b", "", "c"]);
    }

    #[test]
    fn separate_drops_one_trailing_empty() {
        assert_eq!(separate_by_substr("a,b,", ",").unwrap(), vec!["a", "b"]);
        assert_eq!(separate_by_substr("a,,", ",").unwrap(), vec!["a", ""]);
        assert_eq!(separate_by_substr(",a", ",").unwrap(), vec!["", "a"]);
    }

    #[test]
    fn separate_without_delimiter_is_whole_text() {
        assert_eq!(separate_by_substr("abc", ",").unwrap(), vec!["abc"]);
        assert_eq!(separate_by_substr("", ",").unwrap(), vec![""]);
        assert_eq!(separate_by_substr("a--b", "--").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let err = separate_by_substr("abc", "").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPattern);
    }

    #[test]
    fn arrays_split_by_subarray() {
        let result = split(Value::Array(ints(&[1, 0, 2, 3, 0])), Value::Array(ints(&[0]))).unwrap();
        assert_eq!(
            result,
            Value::Array(Stack::from(vec![
                Value::Array(ints(&[1])),
                Value::Array(ints(&[2, 3])),
            ]))
        );
    }

    #[test]
    fn element_at_counts_from_either_end() {
        let items = Value::Array(ints(&[10, 20, 30]));
        assert_eq!(element_at(items.clone(), 0).unwrap(), Value::Integer(10));
        assert_eq!(element_at(items.clone(), -1).unwrap(), Value::Integer(30));
        assert_eq!(
            element_at(items, 3).unwrap_err().kind,
            ErrorKind::IndexOutOfBounds
        );
        assert_eq!(
            element_at(Value::string("abc"), 1).unwrap(),
            Value::Character('b')
        );
    }

    #[test]
    fn take_and_drop_clamp() {
        assert_eq!(take(Value::string("hello"), 2).unwrap(), Value::string("he"));
        assert_eq!(drop(Value::string("hello"), 2).unwrap(), Value::string("llo"));
        assert_eq!(take(Value::string("hi"), -1).unwrap(), Value::string(""));
        assert_eq!(drop(Value::Array(ints(&[1, 2])), 5).unwrap(), Value::Array(Stack::new()));
    }

    #[test]
    fn repeat_with_negative_count_is_empty() {
        assert_eq!(repeat(Value::string("ab"), 3).unwrap(), Value::string("ababab"));
        assert_eq!(repeat(Value::string("ab"), -2).unwrap(), Value::string(""));
        assert_eq!(
            repeat(Value::Array(ints(&[1, 2])), 2).unwrap(),
            Value::Array(ints(&[1, 2, 1, 2]))
        );
    }

    #[test]
    fn oversized_repeat_is_an_overflow() {
        let err = repeat(Value::string("abc"), i64::MAX).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Overflow);
        let err = repeat(Value::string("a"), i64::MAX).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Overflow);
        let err = repeat(Value::Array(ints(&[1])), i64::MAX).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Overflow);
        assert_eq!(
            repeat(Value::Array(Stack::new()), i64::MAX).unwrap(),
            Value::Array(Stack::new())
        );
        assert_eq!(repeat(Value::string(""), i64::MAX).unwrap(), Value::string(""));
    }

    #[test]
    fn uncons_and_unsnoc() {
        let (rest, first) = uncons(Value::string("abc")).unwrap();
        assert_eq!((rest, first), (Value::string("bc"), Value::Character('a')));
        let (rest, last) = unsnoc(Value::Array(ints(&[1, 2, 3]))).unwrap();
        assert_eq!((rest, last), (Value::Array(ints(&[1, 2])), Value::Integer(3)));
        assert!(uncons(Value::string("")).is_err());
    }

    #[test]
    fn whitespace_and_newline_splitting() {
        assert_eq!(
            split_by_whitespace(Value::string("  a  b\tc\n")).unwrap(),
            Value::Array(Stack::from(vec![
                Value::string("a"),
                Value::string("b"),
                Value::string("c"),
            ]))
        );
        assert_eq!(
            split_by_newline(Value::string("x\ny\n")).unwrap(),
            Value::Array(Stack::from(vec![Value::string("x"), Value::string("y")]))
        );
        assert!(split_by_newline(Value::Integer(1)).is_err());
    }

    #[test]
    fn sort_is_stable() {
        let input = pairs(&[(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd'), (0, 'e')]);
        let sorted = merge_sort(input, &mut by_key).unwrap();
        assert_eq!(sorted, pairs(&[(0, 'e'), (1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')]));
    }

    #[test]
    fn sort_is_idempotent() {
        let mut less = |a: &Value, b: &Value| -> Result<bool, RuntimeError> {
            Ok(a.compare(b)? == std::cmp::Ordering::Less)
        };
        let once = merge_sort(ints(&[5, 3, 9, 1, 3, 7]), &mut less).unwrap();
        let twice = merge_sort(once.clone(), &mut less).unwrap();
        assert_eq!(once, ints(&[1, 3, 3, 5, 7, 9]));
        assert_eq!(once, twice);
    }

    #[test]
    fn short_inputs_are_unchanged() {
        let mut calls = 0;
        let mut less = |_: &Value, _: &Value| -> Result<bool, RuntimeError> {
            calls += 1;
            Ok(false)
        };
        assert_eq!(merge_sort(Stack::new(), &mut less).unwrap(), Stack::new());
        assert_eq!(merge_sort(ints(&[4]), &mut less).unwrap(), ints(&[4]));
        assert_eq!(calls, 0);
    }

    #[test]
    fn natural_sort_restores_text() {
        assert_eq!(natural_sort(Value::string("golf")).unwrap(), Value::string("fglo"));
        assert_eq!(
            natural_sort(Value::Array(ints(&[3, 1, 2]))).unwrap(),
            Value::Array(ints(&[1, 2, 3]))
        );
    }

    #[test]
    fn range_from_zero() {
        assert_eq!(range(3), Value::Array(ints(&[0, 1, 2])));
        assert_eq!(range(-1), Value::Array(Stack::new()));
    }
}
