//! golfin: an interpreter for a GolfScript-style stack language.
//!
//! Programs are scanned by [`lexer::Lexer`] into tokens and driven through the
//! operator table by [`vm::Interpreter`]. [`runner`] wires an interpreter to
//! concrete input and output streams.

pub mod error;
pub mod lexer;
pub mod runner;
pub mod vm;
