pub mod arith;
pub mod block;
pub mod runtime;
pub mod sequence;
pub mod stack;
pub mod table;
pub mod value;

// Re-export commonly used types
pub use runtime::{ErrorKind, Interpreter, RuntimeError};
pub use stack::Stack;
pub use value::{Block, Kind, Value};
