use golfin::runner::{inspect_stack, Runner};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::ExitCode;

/// Interactive loop over one persistent interpreter.
///
/// Every line runs against the stack the previous lines left; the stack is
/// shown in inspect form after each line and errors do not end the session.
pub(crate) fn run() -> Result<(), ExitCode> {
    println!("golfin {} (Ctrl-D to exit)", env!("CARGO_PKG_VERSION"));

    let mut runner = Runner::new();
    let mut editor = DefaultEditor::new().map_err(|e| {
        eprintln!("Failed to initialize REPL: {}", e);
        ExitCode::RuntimeError
    })?;

    loop {
        match editor.readline(">> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }

                editor.add_history_entry(&line).ok();

                if let Err(e) = runner.run(&line).map(|_| ()) {
                    eprintln!("{}", e);
                }
                println!("{}", inspect_stack(runner.stack()));
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return Err(ExitCode::RuntimeError);
            }
        }
    }

    Ok(())
}
