use clap::Parser;
use log::debug;
use safecalc::{Evaluator, EvaluatorOptions, Number};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "sair"];

/// safecalc - evaluate arithmetic expressions without running anything else
#[derive(Parser, Debug)]
#[command(name = "safecalc")]
#[command(about = "Evaluate arithmetic expressions safely", long_about = None)]
struct Args {
    /// Longest accepted expression, in characters
    #[arg(long, default_value_t = EvaluatorOptions::default().max_length)]
    max_length: usize,

    /// Deepest accepted nesting of brackets, prefix operators and `**`
    #[arg(long, default_value_t = EvaluatorOptions::default().max_depth)]
    max_depth: usize,

    /// Expression to evaluate (if not provided, starts an interactive prompt)
    expression: Option<String>,
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let args = Args::parse();
    debug!("{:?}", args);

    let evaluator = Evaluator::new(EvaluatorOptions {
        max_length: args.max_length,
        max_depth: args.max_depth,
    });

    match args.expression {
        Some(expression) => match evaluator.evaluate_expression(expression.trim()) {
            Ok(value) => {
                println!("{}", format_result(value));
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
        None => {
            let stdin = io::stdin();
            match run_repl(&evaluator, stdin.lock(), io::stdout()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn run_repl(evaluator: &Evaluator, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
    writeln!(output, "Safe calculator. Type 'exit' or 'quit' to leave.")?;
    let mut lines = input.lines();
    loop {
        write!(output, ">>> ")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            break;
        };
        let line = line?;
        let expression = line.trim();

        if is_exit_command(expression) {
            break;
        }
        if expression.is_empty() {
            continue;
        }

        match evaluator.evaluate_expression(expression) {
            Ok(value) => writeln!(output, "{}", format_result(value))?,
            Err(e) => writeln!(output, "Error: {}", e)?,
        }
    }
    writeln!(output, "Bye.")
}

fn is_exit_command(input: &str) -> bool {
    EXIT_COMMANDS
        .iter()
        .any(|command| command.eq_ignore_ascii_case(input))
}

/// Prints integral floats without their fractional part; the value itself is
/// left alone.
fn format_result(value: Number) -> String {
    match value {
        Number::Float(f) if value.is_integral() => {
            if f == 0.0 {
                "0".to_string()
            } else {
                format!("{:.0}", f)
            }
        }
        _ => value.to_string(),
    }
}
