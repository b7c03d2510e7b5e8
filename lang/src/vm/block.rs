use tracing::debug;

use super::runtime::{ActiveStack, Interpreter, RuntimeError};
use super::sequence;
use super::stack::Stack;
use super::value::{Block, Value};

/// Block evaluation: running a block on a given stack and the array
/// combinators built on top of it.
///
/// Map, filter and fold are plain loops; only block nesting in the program
/// text recurses.
impl Interpreter {
    /// Runs `block` with `stack` as the active stack and returns what it leaves.
    ///
    /// The caller's stack is back in place afterwards, also when the block fails.
    pub fn execute(&mut self, stack: Stack, block: &Block) -> Result<Stack, RuntimeError> {
        let tokens = block.tokens()?;
        debug!(source = block.source(), depth = stack.len(), "execute block");
        let mut active = ActiveStack::substitute(self, stack);
        active.run_tokens(&tokens)?;
        Ok(active.release())
    }

    /// Like [`Interpreter::execute`], keeping only the top of the result
    pub fn execute_value(&mut self, stack: Stack, block: &Block) -> Result<Value, RuntimeError> {
        self.execute(stack, block)?.pop()
    }

    /// Runs `block` directly on the live stack
    pub fn execute_live(&mut self, block: &Block) -> Result<(), RuntimeError> {
        let tokens = block.tokens()?;
        self.run_tokens(&tokens)
    }

    /// Repeats `block` while the stack is non-empty and its top is truthy
    pub fn execute_while_true(&mut self, block: &Block) -> Result<(), RuntimeError> {
        while self.stack.top().is_some_and(Value::is_truthy) {
            self.execute_live(block)?;
        }
        Ok(())
    }

    pub fn repeat_block(&mut self, block: &Block, times: i64) -> Result<(), RuntimeError> {
        for _ in 0..times.max(0) {
            self.execute_live(block)?;
        }
        Ok(())
    }

    /// Each element runs alone on a fresh stack; everything it leaves is kept
    pub fn map(&mut self, items: Stack, block: &Block) -> Result<Stack, RuntimeError> {
        debug!(len = items.len(), "map");
        let mut mapped = Stack::new();
        for item in items {
            let produced = self.execute(Stack::from_iter([item]), block)?;
            mapped.merge(produced);
        }
        Ok(mapped)
    }

    /// Keeps the elements whose one-element run leaves a truthy top
    pub fn filter(&mut self, items: Stack, block: &Block) -> Result<Stack, RuntimeError> {
        debug!(len = items.len(), "filter");
        let mut kept = Stack::new();
        for item in items {
            let verdict = self.execute_value(Stack::from_iter([item.clone()]), block)?;
            if verdict.is_truthy() {
                kept.push(item);
            }
        }
        Ok(kept)
    }

    /// Left fold seeded with the bottom element: `[1 2 3]{-}*` is `(1-2)-3`
    pub fn fold(&mut self, items: Stack, block: &Block) -> Result<Value, RuntimeError> {
        debug!(len = items.len(), "fold");
        let mut items = items.into_iter();
        let seed = items.next().ok_or_else(|| RuntimeError::underflow(1, 0))?;
        let mut accumulator = Stack::from_iter([seed]);
        for item in items {
            accumulator.push(item);
            accumulator = self.execute(accumulator, block)?;
        }
        accumulator.pop()
    }

    /// Stable sort where `block` receives `left right` and answers `left < right`
    pub fn sort_with_block(&mut self, items: Stack, block: &Block) -> Result<Stack, RuntimeError> {
        debug!(len = items.len(), "sort");
        let mut less = |left: &Value, right: &Value| -> Result<bool, RuntimeError> {
            let scratch = Stack::from(vec![left.clone(), right.clone()]);
            Ok(self.execute_value(scratch, block)?.is_truthy())
        };
        sequence::merge_sort(items, &mut less)
    }
}
