//! Operator table: the single place that maps a symbol to its behaviour.
//!
//! Each entry names the symbol and a [`Handler`]. The handler's shape fixes
//! how many operands are popped and whether its result is pushed back, so a
//! new operator is one more line in [`OperatorTable::standard`].

use std::collections::HashMap;
use std::sync::OnceLock;

use super::arith;
use super::runtime::{ErrorKind, Interpreter, RuntimeError};
use super::sequence;
use super::value::Value;

type Outcome = Result<(), RuntimeError>;

/// How an operator takes its operands
#[derive(Clone, Copy)]
pub enum Handler {
    /// Works on the live stack directly
    Stack(fn(&mut Interpreter) -> Outcome),
    /// Pops one value, pushes the result
    Unary(fn(Value) -> Result<Value, RuntimeError>),
    /// Pops two values (deeper first), pushes the result
    Binary(fn(Value, Value) -> Result<Value, RuntimeError>),
    /// Pops three values (deepest first), pushes the result
    Ternary(fn(Value, Value, Value) -> Result<Value, RuntimeError>),
    /// Pops one value and may run blocks or push any number of results
    UnaryState(fn(&mut Interpreter, Value) -> Outcome),
    /// Pops two values and may run blocks or push any number of results
    BinaryState(fn(&mut Interpreter, Value, Value) -> Outcome),
}

impl Handler {
    pub fn arity(&self) -> usize {
        match self {
            Handler::Stack(_) => 0,
            Handler::Unary(_) | Handler::UnaryState(_) => 1,
            Handler::Binary(_) | Handler::BinaryState(_) => 2,
            Handler::Ternary(_) => 3,
        }
    }

    /// Whether the dispatcher pushes the returned value
    pub fn pushes_result(&self) -> bool {
        matches!(
            self,
            Handler::Unary(_) | Handler::Binary(_) | Handler::Ternary(_)
        )
    }
}

#[derive(Clone, Copy)]
pub struct Operator {
    pub symbol: &'static str,
    pub handler: Handler,
}

impl Operator {
    const fn new(symbol: &'static str, handler: Handler) -> Self {
        Self { symbol, handler }
    }

    /// Checks the arity up front so an underflow leaves the stack untouched
    pub fn apply(&self, vm: &mut Interpreter) -> Outcome {
        vm.stack.require(self.handler.arity())?;
        match self.handler {
            Handler::Stack(f) => f(vm),
            Handler::Unary(f) => {
                let a = vm.pop()?;
                let result = f(a)?;
                vm.push(result);
                Ok(())
            }
            Handler::Binary(f) => {
                let b = vm.pop()?;
                let a = vm.pop()?;
                let result = f(a, b)?;
                vm.push(result);
                Ok(())
            }
            Handler::Ternary(f) => {
                let c = vm.pop()?;
                let b = vm.pop()?;
                let a = vm.pop()?;
                let result = f(a, b, c)?;
                vm.push(result);
                Ok(())
            }
            Handler::UnaryState(f) => {
                let a = vm.pop()?;
                f(vm, a)
            }
            Handler::BinaryState(f) => {
                let b = vm.pop()?;
                let a = vm.pop()?;
                f(vm, a, b)
            }
        }
    }
}

pub struct OperatorTable {
    operators: HashMap<&'static str, Operator>,
}

static TABLE: OnceLock<OperatorTable> = OnceLock::new();

impl OperatorTable {
    /// The table shared by the lexer and every interpreter, built on first use
    pub fn global() -> &'static OperatorTable {
        TABLE.get_or_init(OperatorTable::standard)
    }

    fn standard() -> Self {
        use Handler::*;

        let entries = [
            // Stack manipulation and I/O
            Operator::new("_", Stack(|vm| vm.stack.duplicate())),
            Operator::new(";", Stack(|vm| {
                vm.stack.erase_top();
                Ok(())
            })),
            Operator::new("\\", Stack(|vm| vm.stack.rotate_top(2))),
            Operator::new("@", Stack(|vm| vm.stack.rotate_top(3))),
            Operator::new("l", Stack(Interpreter::read_line)),
            Operator::new("t", Stack(Interpreter::read_all_lines)),
            Operator::new("p", Stack(Interpreter::print_top)),
            // Conversions
            Operator::new("i", Unary(Value::into_integer)),
            Operator::new("f", Unary(Value::into_decimal)),
            Operator::new("c", Unary(Value::into_character)),
            Operator::new("s", Unary(Value::into_text)),
            Operator::new("!", Unary(arith::logic_not)),
            Operator::new("S/", Unary(sequence::split_by_whitespace)),
            Operator::new("N/", Unary(sequence::split_by_newline)),
            // Type-directed unary operators
            Operator::new("~", UnaryState(tilde)),
            Operator::new("$", Stack(dollar)),
            Operator::new("(", UnaryState(|vm, v| step(vm, v, false))),
            Operator::new(")", UnaryState(|vm, v| step(vm, v, true))),
            Operator::new(",", Stack(comma)),
            Operator::new("w", UnaryState(while_true)),
            // Arithmetic
            Operator::new("+", Binary(arith::sum)),
            Operator::new("-", Binary(arith::subtract)),
            Operator::new("*", BinaryState(star)),
            Operator::new("/", Binary(arith::divide)),
            Operator::new("%", BinaryState(percent)),
            Operator::new("#", Binary(arith::exponentiate)),
            Operator::new("&", Binary(arith::bitwise_and)),
            Operator::new("|", Binary(arith::bitwise_or)),
            Operator::new("^", Binary(arith::bitwise_xor)),
            // Comparison and logic
            Operator::new("=", Binary(arith::is_equal)),
            Operator::new("<", Binary(arith::is_less)),
            Operator::new(">", Binary(arith::is_greater)),
            Operator::new("e&", Binary(arith::shortcut_and)),
            Operator::new("e|", Binary(arith::shortcut_or)),
            Operator::new("e<", Binary(arith::minimum)),
            Operator::new("e>", Binary(arith::maximum)),
            Operator::new("?", Ternary(arith::conditional)),
        ];

        Self {
            operators: entries.into_iter().map(|op| (op.symbol, op)).collect(),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&Operator> {
        self.operators.get(symbol)
    }

    /// The table's own copy of `symbol`, if it names an operator
    pub fn symbol(&self, text: &str) -> Option<&'static str> {
        self.operators.get(text).map(|op| op.symbol)
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

/// `~`: bitwise not, run a block, or spill an array onto the stack
fn tilde(vm: &mut Interpreter, value: Value) -> Outcome {
    match value {
        Value::Block(block) => vm.execute_live(&block),
        Value::Array(elements) => {
            vm.stack.merge(elements);
            Ok(())
        }
        other => {
            let result = arith::negate(other)?;
            vm.push(result);
            Ok(())
        }
    }
}

/// Top of the live stack, left in place
fn top_operand(vm: &Interpreter) -> Result<&Value, RuntimeError> {
    vm.stack.top().ok_or_else(|| RuntimeError::underflow(1, 0))
}

/// `$`: copy the n-th element, sort a sequence, or sort with a comparator block
///
/// The depth the chosen form needs is checked before anything is popped.
fn dollar(vm: &mut Interpreter) -> Outcome {
    let needed = match top_operand(vm)? {
        Value::Integer(n) => usize::try_from(*n)
            .ok()
            .and_then(|depth| depth.checked_add(2))
            .ok_or_else(|| {
                RuntimeError::new(
                    ErrorKind::IndexOutOfBounds,
                    format!("cannot copy element {n}"),
                )
            })?,
        Value::Block(_) => 2,
        _ => 1,
    };
    vm.stack.require(needed)?;

    let value = vm.pop()?;
    let result = match value {
        Value::Integer(n) => {
            let depth = usize::try_from(n).map_err(|_| {
                RuntimeError::new(
                    ErrorKind::IndexOutOfBounds,
                    format!("cannot copy element {n}"),
                )
            })?;
            vm.stack.peek(depth)?
        }
        Value::Block(block) => {
            let target = vm.pop()?;
            let was_text = matches!(target, Value::String(_));
            let sorted = vm.sort_with_block(target.into_array()?, &block)?;
            sequence::restore_text(sorted, was_text)
        }
        seq @ (Value::Array(_) | Value::String(_)) => sequence::natural_sort(seq)?,
        other => {
            return Err(RuntimeError::type_error(format!(
                "'$' is not defined for {}",
                other.type_name()
            )))
        }
    };
    vm.push(result);
    Ok(())
}

/// `(` and `)`: step a number, or split the first/last element off a sequence
fn step(vm: &mut Interpreter, value: Value, forward: bool) -> Outcome {
    if value.is_sequence() {
        let (rest, element) = if forward {
            sequence::unsnoc(value)?
        } else {
            sequence::uncons(value)?
        };
        vm.push(rest);
        vm.push(element);
    } else {
        let delta = if forward { 1 } else { -1 };
        let result = arith::step(value, delta)?;
        vm.push(result);
    }
    Ok(())
}

/// `,`: range, length, or filter the array below with a block
fn comma(vm: &mut Interpreter) -> Outcome {
    if matches!(top_operand(vm)?, Value::Block(_)) {
        vm.stack.require(2)?;
    }

    let value = vm.pop()?;
    let result = match value {
        Value::Integer(n) => sequence::range(n),
        Value::String(s) => Value::Integer(s.chars().count() as i64),
        Value::Array(elements) => Value::Integer(elements.len() as i64),
        Value::Block(block) => {
            let target = vm.pop()?;
            let was_text = matches!(target, Value::String(_));
            let kept = vm.filter(target.into_array()?, &block)?;
            sequence::restore_text(kept, was_text)
        }
        other => {
            return Err(RuntimeError::type_error(format!(
                "',' is not defined for {}",
                other.type_name()
            )))
        }
    };
    vm.push(result);
    Ok(())
}

fn while_true(vm: &mut Interpreter, value: Value) -> Outcome {
    match value {
        Value::Block(block) => vm.execute_while_true(&block),
        other => Err(RuntimeError::type_error(format!(
            "'w' expects a Block, got {}",
            other.type_name()
        ))),
    }
}

/// `*`: fold, run a block n times, repeat a sequence, or multiply
fn star(vm: &mut Interpreter, a: Value, b: Value) -> Outcome {
    match (a, b) {
        (Value::Block(block), Value::Integer(n)) | (Value::Integer(n), Value::Block(block)) => {
            vm.repeat_block(&block, n)
        }
        (seq, Value::Block(block)) if seq.is_sequence() => {
            let folded = vm.fold(seq.into_array()?, &block)?;
            vm.push(folded);
            Ok(())
        }
        (a, b) => {
            let result = arith::multiply(a, b)?;
            vm.push(result);
            Ok(())
        }
    }
}

/// `%`: map a block over a sequence, otherwise the remainder
fn percent(vm: &mut Interpreter, a: Value, b: Value) -> Outcome {
    let result = match (a, b) {
        (seq, Value::Block(block)) if seq.is_sequence() => {
            Value::Array(vm.map(seq.into_array()?, &block)?)
        }
        (a, b) => arith::module(a, b)?,
    };
    vm.push(result);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_symbol_resolves_to_itself() {
        let table = OperatorTable::global();
        for symbol in ["+", "e<", "S/", "N/", "\\", "?"] {
            assert_eq!(table.symbol(symbol), Some(symbol));
        }
        assert_eq!(table.symbol("e"), None);
        assert_eq!(table.symbol("x"), None);
        assert_eq!(table.len(), 37);
    }

    #[test]
    fn handler_shapes_encode_arity_and_push() {
        let table = OperatorTable::global();
        let plus = table.get("+").unwrap();
        assert_eq!(plus.handler.arity(), 2);
        assert!(plus.handler.pushes_result());

        let rotate = table.get("@").unwrap();
        assert_eq!(rotate.handler.arity(), 0);
        assert!(!rotate.handler.pushes_result());

        let conditional = table.get("?").unwrap();
        assert_eq!(conditional.handler.arity(), 3);
    }
}
