//! Script and string execution shared by the CLI entry points.

use marmoset_compiler::parse_program;
use marmoset_rt::{eval_program, Environment, Value};
use std::fs;
use std::path::Path;

fn red(s: &str) -> String {
    format!("\x1b[31m{}\x1b[0m", s)
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{}\x1b[0m", s)
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{}\x1b[0m", s)
}

/// Run a script file into `env`. Returns false when loading, parsing or
/// evaluation failed.
pub fn run_file(path: &Path, env: &Environment) -> bool {
    match fs::read_to_string(path) {
        Ok(source) => run_source(&source, Some(&path.display().to_string()), env),
        Err(err) => {
            eprintln!(
                "{} failed to load {}: {}",
                red(&bold("error:")),
                path.display(),
                err
            );
            false
        }
    }
}

/// Parse and evaluate `source`. Parse errors and a top-level error
/// value are rendered with the offending source line and a caret.
pub fn run_source(source: &str, file: Option<&str>, env: &Environment) -> bool {
    match parse_program(source) {
        Ok(program) => {
            let result = eval_program(&program, env);
            if let Value::Error(err) = &result {
                report(file, source, err.span.line, err.span.col, &err.message);
                return false;
            }
            true
        }
        Err(errors) => {
            for error in &errors {
                let span = error.span();
                report(file, source, span.line, span.col, &error.to_string());
            }
            false
        }
    }
}

fn report(file: Option<&str>, source: &str, line: usize, col: usize, message: &str) {
    eprintln!("{} {}", red(&bold("error:")), message);
    if line == 0 {
        return;
    }
    if let Some(text) = source.lines().nth(line - 1) {
        let location = match file {
            Some(name) => format!("{}:{}:{}", name, line, col),
            None => format!("{}:{}", line, col),
        };
        eprintln!("  {} {}", cyan("-->"), location);
        eprintln!("  {}", text);
        eprintln!("  {}{}", " ".repeat(col.saturating_sub(1)), red("^"));
    }
}
