//! Interactive line REPL over a [`weft::Session`].
//!
//! Each line is compiled against the live stack (so a line may consume
//! what earlier lines left behind) and the stack is printed after every
//! run. `bye` exits.

use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result};
use weft::{Error, Session, Value};

fn main() -> Result<()> {
    println!("weft {}", env!("CARGO_PKG_VERSION"));
    println!("Type a line of words; `bye` to exit");
    println!();

    let mut session = Session::new();
    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline("weft> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed == "bye" {
                    break;
                }
                rl.add_history_entry(trimmed)?;
                match session.eval(trimmed) {
                    Ok(stack) => print_stack(&stack),
                    Err(Error::Compile(diag)) => {
                        print_caret(trimmed, &diag);
                        eprintln!("{}", diag);
                    }
                    Err(err) => eprintln!("{}", err),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("error: {}", err);
                break;
            }
        }
    }
    Ok(())
}

fn print_stack(stack: &[Value]) {
    if stack.is_empty() {
        println!("<empty>");
        return;
    }
    let rendered: Vec<String> = stack.iter().map(Value::to_string).collect();
    println!("{}", rendered.join(" "));
}

/// Underline the offending token of a compile diagnostic.
fn print_caret(line: &str, diag: &weft::Diagnostic) {
    let span = diag.span();
    if span.is_empty() || span.end().offset() as usize > line.len() {
        return;
    }
    eprintln!("  {}", line);
    let indent = " ".repeat(span.start().offset() as usize);
    let carets = "^".repeat(span.len().max(1) as usize);
    eprintln!("  {}{}", indent, carets);
}
