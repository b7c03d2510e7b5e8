//! CLI output formatting for JSON mode.
//!
//! A run produces exactly one JSON object on stdout, so editors and scripts
//! can consume the final stack, the text written by `p` and any error.

use golfin::error::GolfError;
use golfin::vm::{Stack, Value};
use serde::Serialize;

/// Output mode for CLI execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputMode {
    /// Final stack as plain text (default)
    Text,
    /// Single JSON object after execution completes
    Json,
}

/// Error with kind and 1-indexed position.
#[derive(Debug, Clone, Serialize)]
pub struct JsonError {
    pub kind: String,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

/// JSON output for a program run.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRunOutput {
    pub status: &'static str,
    pub stack: Vec<String>,
    pub printed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
}

/// Format a GolfError as JSON error output.
pub fn format_error_json(error: &GolfError) -> JsonError {
    let (line, column) = error.position();
    JsonError {
        kind: error.kind().to_string(),
        message: error.message().to_string(),
        line,
        column,
    }
}

/// Format a run as JSON; `stack` is whatever the interpreter holds, also after an error.
pub fn format_run_json(stack: &Stack, printed: String, error: Option<&GolfError>) -> String {
    let output = JsonRunOutput {
        status: if error.is_some() { "error" } else { "complete" },
        stack: stack.iter().map(Value::inspect).collect(),
        printed,
        error: error.map(format_error_json),
    };
    serde_json::to_string(&output).unwrap_or_default()
}
