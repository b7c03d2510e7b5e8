use im_rc::Vector;

use super::runtime::RuntimeError;
use super::value::Value;

/// Ordered sequence of values; the last pushed value is the top.
///
/// The same structure is the evaluation stack and the payload of
/// [`Value::Array`], where the bottom element is index 0. It is backed by a
/// persistent vector so a copy is cheap yet never aliases the original.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stack {
    values: Vector<Value>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: Value) {
        self.values.push_back(value);
    }

    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.values
            .pop_back()
            .ok_or_else(|| RuntimeError::underflow(1, 0))
    }

    /// Fails unless at least `depth` values are present
    pub fn require(&self, depth: usize) -> Result<(), RuntimeError> {
        if self.values.len() < depth {
            Err(RuntimeError::underflow(depth, self.values.len()))
        } else {
            Ok(())
        }
    }

    pub fn top(&self) -> Option<&Value> {
        self.values.back()
    }

    /// Copy of the n-th value from the top (0 is the top)
    pub fn peek(&self, n: usize) -> Result<Value, RuntimeError> {
        self.require(n + 1)?;
        Ok(self.values[self.values.len() - 1 - n].clone())
    }

    /// Element by position from the bottom
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Cyclic shift of the top `n` values by one place.
    ///
    /// The value second from the top becomes the new top and the old top
    /// sinks to the bottom of the group: `rotate_top(2)` swaps, and
    /// `rotate_top(3)` turns `a b c` (bottom to top) into `c a b`.
    pub fn rotate_top(&mut self, n: usize) -> Result<(), RuntimeError> {
        let mut group = self.split(n)?;
        if let Some(top) = group.values.pop_back() {
            self.values.push_back(top);
        }
        self.values.append(group.values);
        Ok(())
    }

    pub fn duplicate(&mut self) -> Result<(), RuntimeError> {
        let top = self.peek(0)?;
        self.push(top);
        Ok(())
    }

    /// Drops the top value; does nothing on an empty stack
    pub fn erase_top(&mut self) {
        self.values.pop_back();
    }

    /// Appends every element of `src` on top, bottom first
    pub fn merge(&mut self, src: Stack) {
        self.values.append(src.values);
    }

    /// Detaches the top `k` values as a new stack, keeping their order
    pub fn split(&mut self, k: usize) -> Result<Stack, RuntimeError> {
        self.require(k)?;
        let at = self.values.len() - k;
        Ok(Stack {
            values: self.values.split_off(at),
        })
    }

    pub fn pop_bottom(&mut self) -> Option<Value> {
        self.values.pop_front()
    }

    /// The first `n` elements from the bottom
    pub fn take_bottom(&self, n: usize) -> Stack {
        Stack {
            values: self.values.take(n.min(self.values.len())),
        }
    }

    /// Everything after the first `n` elements from the bottom
    pub fn skip_bottom(&self, n: usize) -> Stack {
        Stack {
            values: self.values.skip(n.min(self.values.len())),
        }
    }

    /// Iterates bottom to top
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Value> + '_ {
        self.values.iter()
    }
}

impl FromIterator<Value> for Stack {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Stack {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Stack {
    type Item = Value;
    type IntoIter = im_rc::vector::ConsumingIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl From<Vec<Value>> for Stack {
    fn from(values: Vec<Value>) -> Self {
        values.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::runtime::ErrorKind;

    fn ints(values: &[i64]) -> Stack {
        values.iter().map(|n| Value::Integer(*n)).collect()
    }

    /// Top-first listing, the way stacks are usually drawn
    fn top_first(stack: &Stack) -> Vec<i64> {
        stack
            .iter()
            .rev()
            .map(|v| match v {
                Value::Integer(n) => *n,
                other => panic!("unexpected {other:?}"),
            })
            .collect()
    }

    #[test]
    fn pop_empty_is_underflow() {
        let mut stack = Stack::new();
        let err = stack.pop().unwrap_err();
        assert_eq!(err.kind, ErrorKind::StackUnderflow);
    }

    #[test]
    fn peek_copies_nth_from_top() {
        let stack = ints(&[3, 2, 1]);
        assert_eq!(stack.peek(0).unwrap(), Value::Integer(1));
        assert_eq!(stack.peek(2).unwrap(), Value::Integer(3));
        assert_eq!(stack.peek(3).unwrap_err().kind, ErrorKind::StackUnderflow);
        assert_eq!(stack.len(), 3);
    }

    #[test]
    fn rotate_two_swaps() {
        // top=1, 2, 3
        let mut stack = ints(&[3, 2, 1]);
        stack.rotate_top(2).unwrap();
        assert_eq!(top_first(&stack), vec![2, 1, 3]);
    }

    #[test]
    fn rotate_three_sinks_the_top() {
        // top=1, 2, 3
        let mut stack = ints(&[3, 2, 1]);
        stack.rotate_top(3).unwrap();
        assert_eq!(top_first(&stack), vec![2, 3, 1]);
    }

    #[test]
    fn rotate_leaves_values_below_the_group() {
        let mut stack = ints(&[9, 1, 2, 3]);
        stack.rotate_top(3).unwrap();
        assert_eq!(stack, ints(&[9, 3, 1, 2]));
    }

    #[test]
    fn rotate_needs_enough_values() {
        let mut stack = ints(&[1, 2]);
        assert_eq!(
            stack.rotate_top(3).unwrap_err().kind,
            ErrorKind::StackUnderflow
        );
        assert_eq!(stack, ints(&[1, 2]));
    }

    #[test]
    fn duplicate_is_independent() {
        let mut stack = Stack::new();
        stack.push(Value::string("ab"));
        stack.duplicate().unwrap();
        if let Some(Value::String(s)) = stack.values.back_mut() {
            s.push('c');
        }
        assert_eq!(stack.peek(0).unwrap(), Value::string("abc"));
        assert_eq!(stack.peek(1).unwrap(), Value::string("ab"));
    }

    #[test]
    fn erase_top_on_empty_is_noop() {
        let mut stack = Stack::new();
        stack.erase_top();
        assert!(stack.is_empty());
    }

    #[test]
    fn merge_appends_in_order() {
        let mut dst = ints(&[1, 2]);
        dst.merge(ints(&[3, 4]));
        assert_eq!(dst, ints(&[1, 2, 3, 4]));
    }

    #[test]
    fn split_detaches_top_values() {
        let mut stack = ints(&[1, 2, 3, 4, 5]);
        let upper = stack.split(2).unwrap();
        assert_eq!(stack, ints(&[1, 2, 3]));
        assert_eq!(upper, ints(&[4, 5]));
        assert!(stack.split(4).is_err());
    }

    #[test]
    fn take_and_skip_clamp() {
        let stack = ints(&[1, 2, 3]);
        assert_eq!(stack.take_bottom(2), ints(&[1, 2]));
        assert_eq!(stack.skip_bottom(2), ints(&[3]));
        assert_eq!(stack.take_bottom(10), ints(&[1, 2, 3]));
        assert!(stack.skip_bottom(10).is_empty());
    }
}
