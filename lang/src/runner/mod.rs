use std::cell::RefCell;
use std::io::{self, BufRead, Cursor, Write};
use std::rc::Rc;

use tracing::debug;

use crate::error::GolfError;
use crate::vm::runtime::Interpreter;
use crate::vm::stack::Stack;
use crate::vm::value::Value;


/// Output sink that can be read back while the interpreter still holds it
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs programs against one interpreter and its input/output streams.
///
/// The stack and variables persist between calls to [`Runner::run`], which is
/// what the REPL relies on.
pub struct Runner {
    interpreter: Interpreter,
}

impl Runner {
    /// Runner on standard input and output
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    pub fn with_io(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_io(input, output),
        }
    }

    /// Runner reading `input` and writing into `output`
    pub fn with_input(input: &str, output: SharedBuffer) -> Self {
        Self::with_io(Box::new(Cursor::new(input.to_owned())), Box::new(output))
    }

    /// Runs one program and returns the stack it leaves
    pub fn run(&mut self, source: &str) -> Result<&Stack, GolfError> {
        debug!(bytes = source.len(), "run program");
        self.interpreter.run(source)?;
        Ok(self.interpreter.stack())
    }

    pub fn stack(&self) -> &Stack {
        self.interpreter.stack()
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

/// Final output form: every value's string form, bottom to top, concatenated
pub fn render_stack(stack: &Stack) -> String {
    stack.iter().map(Value::to_string).collect()
}

/// REPL form, e.g. `[1 "a" [2 3]]`
pub fn inspect_stack(stack: &Stack) -> String {
    Value::Array(stack.clone()).inspect()
}

/// Runs `source` on `input` and returns everything a command-line run would
/// print: the text written by `p` followed by the rendered final stack
pub fn evaluate(source: &str, input: &str) -> Result<String, GolfError> {
    let output = SharedBuffer::new();
    let mut runner = Runner::with_input(input, output.clone());
    let rendered = render_stack(runner.run(source)?);
    Ok(output.contents() + &rendered)
}
