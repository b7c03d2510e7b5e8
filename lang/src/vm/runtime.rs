use std::fmt;
use std::io::{self, BufRead, Write};
use std::ops::{Deref, DerefMut};

use tracing::trace;

use super::stack::Stack;
use super::table::OperatorTable;
use super::value::{Block, Value};
use crate::error::GolfError;
use crate::lexer::{LexError, Lexer, Span, Token, TokenKind};

/// Category of a runtime failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    StackUnderflow,
    TypeError,
    ConversionError,
    DivisionByZero,
    InvalidPattern,
    SyntaxError,
    IndexOutOfBounds,
    UndefinedVariable,
    Overflow,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::StackUnderflow => "stack underflow",
            ErrorKind::TypeError => "type error",
            ErrorKind::ConversionError => "conversion error",
            ErrorKind::DivisionByZero => "division by zero",
            ErrorKind::InvalidPattern => "invalid pattern",
            ErrorKind::SyntaxError => "syntax error",
            ErrorKind::IndexOutOfBounds => "index out of bounds",
            ErrorKind::UndefinedVariable => "undefined variable",
            ErrorKind::Overflow => "integer overflow",
            ErrorKind::Io => "i/o error",
        };
        f.write_str(name)
    }
}

/// Runtime error with kind, message and the position of the token that raised it.
///
/// Line 0 means the error has not been attributed to a token yet.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: 0,
            column: 0,
        }
    }

    pub fn underflow(needed: usize, available: usize) -> Self {
        Self::new(
            ErrorKind::StackUnderflow,
            format!("needed {needed} value(s), stack holds {available}"),
        )
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    /// Attaches a position unless an inner token already did
    pub fn located(mut self, span: Span) -> Self {
        if self.line == 0 {
            self.line = span.line;
            self.column = span.column;
        }
        self
    }
}

impl From<LexError> for RuntimeError {
    fn from(err: LexError) -> Self {
        Self {
            kind: ErrorKind::SyntaxError,
            message: err.message,
            line: err.line,
            column: err.column,
        }
    }
}

fn io_error(err: io::Error) -> RuntimeError {
    RuntimeError::new(ErrorKind::Io, err.to_string())
}

/// Line that ends the `t` (read all lines) operator early
pub const END_OF_INPUT_SENTINEL: &str = "--ENDOFFILE--";

/// The interpreter state: the live stack, the variables A to Z and the I/O endpoints
pub struct Interpreter {
    pub(crate) stack: Stack,
    variables: [Option<Value>; 26],
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
    table: &'static OperatorTable,
}

impl Interpreter {
    /// Interpreter reading standard input and writing standard output
    pub fn new() -> Self {
        Self::with_io(
            Box::new(io::BufReader::new(io::stdin())),
            Box::new(io::stdout()),
        )
    }

    pub fn with_io(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        let mut interpreter = Self {
            stack: Stack::new(),
            variables: std::array::from_fn(|_| None),
            input,
            output,
            table: OperatorTable::global(),
        };
        interpreter.initialize_variables();
        interpreter
    }

    fn initialize_variables(&mut self) {
        for (offset, letter) in ('A'..='F').enumerate() {
            self.variables[variable_slot(letter)] = Some(Value::Integer(10 + offset as i64));
        }
        for (offset, letter) in ('X'..='Z').enumerate() {
            self.variables[variable_slot(letter)] = Some(Value::Integer(offset as i64));
        }
        self.variables[variable_slot('N')] = Some(Value::Character('\n'));
        self.variables[variable_slot('S')] = Some(Value::Character(' '));
    }

    /// Lexes and runs a whole program against the current stack
    pub fn run(&mut self, source: &str) -> Result<(), GolfError> {
        let tokens = Lexer::new(source).tokenize()?;
        self.run_tokens(&tokens)?;
        self.output.flush().map_err(io_error)?;
        Ok(())
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut Stack {
        &mut self.stack
    }

    pub fn take_stack(&mut self) -> Stack {
        std::mem::take(&mut self.stack)
    }

    pub fn variable(&self, name: char) -> Option<&Value> {
        self.variables.get(variable_slot(name))?.as_ref()
    }

    pub fn set_variable(&mut self, name: char, value: Value) {
        if let Some(slot) = self.variables.get_mut(variable_slot(name)) {
            *slot = Some(value);
        }
    }

    pub(crate) fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub(crate) fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop()
    }

    /// Dispatch loop over one token sequence: a program or a block body
    pub(crate) fn run_tokens(&mut self, tokens: &[Token]) -> Result<(), RuntimeError> {
        let mut frames: Vec<Stack> = Vec::new();
        for token in tokens {
            if let Err(err) = self.dispatch(token, &mut frames) {
                // Put back the stack that was live before the first open '['
                if !frames.is_empty() {
                    self.stack = frames.swap_remove(0);
                }
                return Err(err.located(token.span));
            }
        }
        if frames.is_empty() {
            Ok(())
        } else {
            Err(RuntimeError::new(ErrorKind::SyntaxError, "unclosed '['"))
        }
    }

    fn dispatch(&mut self, token: &Token, frames: &mut Vec<Stack>) -> Result<(), RuntimeError> {
        match &token.kind {
            TokenKind::Integer(n) => self.push(Value::Integer(*n)),
            TokenKind::Decimal(n) => self.push(Value::decimal(*n)),
            TokenKind::String(s) => self.push(Value::String(s.clone())),
            TokenKind::Character(c) => self.push(Value::Character(*c)),
            TokenKind::Block(source) => {
                // The body starts right after the opening brace
                let block = Block::new(source.as_str(), token.span.line, token.span.column + 1);
                self.push(Value::Block(block));
            }
            TokenKind::Variable(name) => {
                let value = self.variable(*name).cloned().ok_or_else(|| {
                    RuntimeError::new(
                        ErrorKind::UndefinedVariable,
                        format!("variable {name} has no value"),
                    )
                })?;
                self.push(value);
            }
            TokenKind::Assign(name) => {
                let value = self.stack.peek(0)?;
                self.set_variable(*name, value);
            }
            TokenKind::OpenBracket => frames.push(std::mem::take(&mut self.stack)),
            TokenKind::CloseBracket => {
                let outer = frames
                    .pop()
                    .ok_or_else(|| RuntimeError::new(ErrorKind::SyntaxError, "unmatched ']'"))?;
                let elements = std::mem::replace(&mut self.stack, outer);
                self.push(Value::Array(elements));
            }
            TokenKind::Operator(symbol) => {
                let table = self.table;
                let operator = table.get(symbol).ok_or_else(|| {
                    RuntimeError::new(
                        ErrorKind::SyntaxError,
                        format!("unknown operator '{symbol}'"),
                    )
                })?;
                trace!(symbol = *symbol, depth = self.stack.len(), "dispatch");
                operator.apply(self)?;
            }
            TokenKind::Eof => {}
        }
        Ok(())
    }

    /// `l`: one line of input without its line terminator, empty at end of input
    pub(crate) fn read_line(&mut self) -> Result<(), RuntimeError> {
        let line = self.next_line()?.unwrap_or_default();
        self.push(Value::String(line));
        Ok(())
    }

    /// `t`: every remaining line up to the sentinel, joined by spaces
    pub(crate) fn read_all_lines(&mut self) -> Result<(), RuntimeError> {
        let mut lines = Vec::new();
        while let Some(line) = self.next_line()? {
            if line == END_OF_INPUT_SENTINEL {
                break;
            }
            lines.push(line);
        }
        self.push(Value::String(lines.join(" ")));
        Ok(())
    }

    fn next_line(&mut self) -> Result<Option<String>, RuntimeError> {
        let mut line = String::new();
        if self.input.read_line(&mut line).map_err(io_error)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    /// `p`: writes the top value without popping it
    pub(crate) fn print_top(&mut self) -> Result<(), RuntimeError> {
        let text = self
            .stack
            .top()
            .ok_or_else(|| RuntimeError::underflow(1, 0))?
            .to_string();
        self.output.write_all(text.as_bytes()).map_err(io_error)?;
        self.output.flush().map_err(io_error)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn variable_slot(name: char) -> usize {
    (name as usize).wrapping_sub('A' as usize)
}

/// Substitutes the interpreter's active stack for the lifetime of the guard.
///
/// The caller's stack comes back on [`ActiveStack::release`] or, if the run
/// bails out with an error, when the guard is dropped.
pub(crate) struct ActiveStack<'a> {
    vm: &'a mut Interpreter,
    saved: Option<Stack>,
}

impl<'a> ActiveStack<'a> {
    pub(crate) fn substitute(vm: &'a mut Interpreter, stack: Stack) -> Self {
        let saved = std::mem::replace(&mut vm.stack, stack);
        Self {
            vm,
            saved: Some(saved),
        }
    }

    /// Restores the caller's stack and hands back the substituted one
    pub(crate) fn release(mut self) -> Stack {
        let saved = self.saved.take().unwrap_or_default();
        std::mem::replace(&mut self.vm.stack, saved)
    }
}

impl Deref for ActiveStack<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Interpreter {
        self.vm
    }
}

impl DerefMut for ActiveStack<'_> {
    fn deref_mut(&mut self) -> &mut Interpreter {
        self.vm
    }
}

impl Drop for ActiveStack<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.vm.stack = saved;
        }
    }
}
