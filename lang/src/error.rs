use crate::lexer::LexError;
use crate::vm::runtime::{ErrorKind, RuntimeError};

/// Unified error type for everything a golfin program can fail with
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GolfError {
    #[error("Lexical error at line {}, column {}: {}", .0.line, .0.column, .0.message)]
    Lex(#[from] LexError),

    #[error("Runtime error at line {}, column {}: {}", .0.line, .0.column, .0)]
    Runtime(#[from] RuntimeError),
}

impl GolfError {
    /// Error category; lexing failures are syntax errors
    pub fn kind(&self) -> ErrorKind {
        match self {
            GolfError::Lex(_) => ErrorKind::SyntaxError,
            GolfError::Runtime(err) => err.kind,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            GolfError::Lex(err) => &err.message,
            GolfError::Runtime(err) => &err.message,
        }
    }

    /// Line and column, 1-based; 0 when unknown
    pub fn position(&self) -> (u32, u32) {
        match self {
            GolfError::Lex(err) => (err.line, err.column),
            GolfError::Runtime(err) => (err.line, err.column),
        }
    }

    /// Format error with source context
    pub fn format_with_source(&self, source: &str) -> String {
        let (line, column) = self.position();
        let (kind, message) = match self {
            GolfError::Lex(err) => ("Lexical error", err.message.clone()),
            GolfError::Runtime(err) => ("Runtime error", err.to_string()),
        };

        let mut output = String::new();

        output.push_str(&format!("\n{} at line {}", kind, line));
        if column > 0 {
            output.push_str(&format!(", column {}", column));
        }
        output.push_str(&format!(": {}\n\n", message));

        // Source context (5 lines around error)
        let lines: Vec<&str> = source.lines().collect();
        let error_line_idx = (line as usize).saturating_sub(1);

        let start = error_line_idx.saturating_sub(2);
        let end = (error_line_idx + 3).min(lines.len());

        for (idx, line_content) in lines.iter().enumerate().take(end).skip(start) {
            let line_num = idx + 1;

            if idx == error_line_idx {
                output.push_str(&format!(" → {:4} | {}\n", line_num, line_content));

                if column > 0 {
                    output.push_str("        | ");
                    output.push_str(&" ".repeat(column as usize - 1));
                    output.push_str("^\n");
                }
            } else {
                output.push_str(&format!("   {:4} | {}\n", line_num, line_content));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime(kind: ErrorKind, message: &str, line: u32, column: u32) -> GolfError {
        let mut err = RuntimeError::new(kind, message);
        err.line = line;
        err.column = column;
        GolfError::Runtime(err)
    }

    #[test]
    fn lex_error_display() {
        let err = GolfError::Lex(LexError {
            message: "Unexpected character: 'x'".to_string(),
            line: 5,
            column: 10,
        });

        let display = err.to_string();
        assert!(display.contains("Lexical error"));
        assert!(display.contains("line 5"));
        assert!(display.contains("column 10"));
        assert!(display.contains("Unexpected character: 'x'"));
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
    }

    #[test]
    fn runtime_error_display() {
        let err = runtime(ErrorKind::DivisionByZero, "divisor is zero", 2, 4);

        assert_eq!(
            err.to_string(),
            "Runtime error at line 2, column 4: division by zero: divisor is zero"
        );
        assert_eq!(err.position(), (2, 4));
        assert_eq!(err.message(), "divisor is zero");
    }

    #[test]
    fn error_with_source_context() {
        let source = "1 2+\n3 4*\n5 0/\n6 7-\n8 9\\";

        let err = runtime(ErrorKind::DivisionByZero, "divisor is zero", 3, 4);
        let formatted = err.format_with_source(source);

        // Should show 5 lines of context (2 before, error line, 2 after)
        assert!(formatted.contains("line 3"));
        assert!(formatted.contains("division by zero"));
        assert!(formatted.contains("1 2+"));
        assert!(formatted.contains("3 4*"));
        assert!(formatted.contains(" → "));
        assert!(formatted.contains("6 7-"));
        assert!(formatted.contains("8 9\\"));
    }

    #[test]
    fn error_with_caret_position() {
        let source = "1 2 + x";

        let err = GolfError::Lex(LexError {
            message: "Unexpected character: 'x'".to_string(),
            line: 1,
            column: 7,
        });

        let formatted = err.format_with_source(source);

        assert!(formatted.contains("        |       ^\n"));
    }

    #[test]
    fn error_at_file_boundaries() {
        let source = "1 0/";

        let err = runtime(ErrorKind::DivisionByZero, "divisor is zero", 1, 4);
        let formatted = err.format_with_source(source);
        assert!(formatted.contains("1 0/"));

        // Error beyond last line (should not panic)
        let err = runtime(ErrorKind::StackUnderflow, "needed 1 value(s)", 100, 1);
        let formatted = err.format_with_source(source);
        assert!(formatted.contains("Runtime error at line 100"));
    }

    #[test]
    fn unlocated_error_has_no_caret() {
        let err = runtime(ErrorKind::Io, "closed", 0, 0);
        let formatted = err.format_with_source("1");
        assert!(formatted.contains("Runtime error at line 0: i/o error: closed"));
        assert!(!formatted.contains('^'));
    }
}
