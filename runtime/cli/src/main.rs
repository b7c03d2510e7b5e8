mod output;
mod repl;

use clap::Parser;
use golfin::runner::{render_stack, Runner, SharedBuffer};
use output::OutputMode;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process;
use tracing::debug;

/// golfin: a GolfScript-style stack language interpreter
#[derive(Debug, Parser)]
#[command(name = "golfin", version, after_help = AFTER_HELP)]
struct Cli {
    /// Program file to run
    script: Option<PathBuf>,

    /// Evaluate an inline program
    #[arg(short, long, value_name = "CODE", conflicts_with = "script")]
    eval: Option<String>,

    /// Read program input from FILE instead of stdin
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputMode::Text)]
    output: OutputMode,

    /// Start the interactive REPL
    #[arg(short, long)]
    repl: bool,
}

const AFTER_HELP: &str = "\
With no SCRIPT or --eval and a piped stdin, the first stdin line is the
program and the remaining lines are its input.

ENVIRONMENT:
    GOLFIN_LOG    Log filter, e.g. golfin=debug (falls back to RUST_LOG)";

enum ExitCode {
    ArgumentError,
    RuntimeError,
}

impl ExitCode {
    fn code(&self) -> i32 {
        match self {
            ExitCode::ArgumentError => 1,
            ExitCode::RuntimeError => 2,
        }
    }
}

fn main() {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    let result = if cli.repl { repl::run() } else { run(&cli) };

    match result {
        Ok(()) => process::exit(0),
        Err(code) => process::exit(code.code()),
    }
}

/// Installs a stderr subscriber when GOLFIN_LOG or RUST_LOG is set
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = std::env::var("GOLFIN_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .map(EnvFilter::new);

    if let Some(filter) = filter {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(filter)
            .init();
    }
}

fn run(cli: &Cli) -> Result<(), ExitCode> {
    let mut stdin = BufReader::new(io::stdin());

    // Source: -e > file > first stdin line > REPL
    let source = if let Some(code) = &cli.eval {
        code.clone()
    } else if let Some(path) = &cli.script {
        fs::read_to_string(path).map_err(|e| {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            ExitCode::ArgumentError
        })?
    } else if !atty::is(atty::Stream::Stdin) {
        let mut line = String::new();
        stdin.read_line(&mut line).map_err(|e| {
            eprintln!("Error reading from stdin: {}", e);
            ExitCode::ArgumentError
        })?;
        line
    } else {
        return repl::run();
    };

    let input: Box<dyn BufRead> = match &cli.input {
        Some(path) => {
            let file = File::open(path).map_err(|e| {
                eprintln!("Error opening input '{}': {}", path.display(), e);
                ExitCode::ArgumentError
            })?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(stdin),
    };

    debug!(mode = ?cli.output, "running program");

    match cli.output {
        OutputMode::Text => run_text(&source, input),
        OutputMode::Json => run_json(&source, input),
    }
}

fn run_text(source: &str, input: Box<dyn BufRead>) -> Result<(), ExitCode> {
    let mut runner = Runner::with_io(input, Box::new(io::stdout()));
    match runner.run(source) {
        Ok(stack) => {
            println!("{}", render_stack(stack));
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e.format_with_source(source));
            Err(ExitCode::RuntimeError)
        }
    }
}

fn run_json(source: &str, input: Box<dyn BufRead>) -> Result<(), ExitCode> {
    let printed = SharedBuffer::new();
    let mut runner = Runner::with_io(input, Box::new(printed.clone()));
    let result = runner.run(source).map(|_| ());

    println!(
        "{}",
        output::format_run_json(runner.stack(), printed.contents(), result.as_ref().err())
    );

    result.map_err(|_| ExitCode::RuntimeError)
}
