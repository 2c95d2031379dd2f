//! Interactive REPL for the Marmoset language.

use marmoset_compiler::{Lexer, Parser};
use marmoset_rt::{eval_program, intrinsics, Environment, Value};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

const PROMPT: &str = ">> ";

fn red(s: &str) -> String {
    format!("\x1b[31m{}\x1b[0m", s)
}
fn gray(s: &str) -> String {
    format!("\x1b[90m{}\x1b[0m", s)
}

/// Keywords for tab completion.
const KEYWORDS: &[&str] = &[
    "case", "const", "default", "else", "false", "fn", "for", "foreach",
    "function", "if", "in", "let", "return", "switch", "true",
];

/// REPL commands for tab completion.
const COMMANDS: &[&str] = &[":help", ":quit"];

/// Completer over keywords, REPL commands and registered built-ins.
struct MarmosetHelper {
    names: Vec<String>,
}

impl MarmosetHelper {
    fn new() -> Self {
        let mut names: Vec<String> = KEYWORDS.iter().map(|s| s.to_string()).collect();
        names.extend(COMMANDS.iter().map(|s| s.to_string()));
        names.extend(intrinsics::all_names());
        names.sort();
        Self { names }
    }
}

impl Completer for MarmosetHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace() || matches!(c, '(' | '[' | '{' | ',' | ';'))
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = &line[start..pos];
        if word.is_empty() {
            return Ok((start, Vec::new()));
        }
        let candidates = self
            .names
            .iter()
            .filter(|name| name.starts_with(word))
            .map(|name| Pair {
                display: name.clone(),
                replacement: name.clone(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for MarmosetHelper {
    type Hint = String;
}
impl Highlighter for MarmosetHelper {}
impl Validator for MarmosetHelper {}
impl Helper for MarmosetHelper {}

/// Line-oriented read/eval/print loop: parse a line, list parser errors
/// if any, otherwise evaluate and echo the value's inspect form.
pub fn start(env: &Environment) {
    println!("marmoset {}", env!("CARGO_PKG_VERSION"));
    println!("{}", gray("type :quit to exit"));

    let config = rustyline::Config::builder().auto_add_history(true).build();
    let mut editor: Editor<MarmosetHelper, rustyline::history::DefaultHistory> =
        match Editor::with_config(config) {
            Ok(editor) => editor,
            Err(err) => {
                eprintln!("{} failed to start the line editor: {}", red("error:"), err);
                return;
            }
        };
    editor.set_helper(Some(MarmosetHelper::new()));

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match trimmed {
                    ":quit" => break,
                    ":help" => {
                        println!("enter marmoset code, or :quit to leave");
                        continue;
                    }
                    _ => {}
                }
                eval_line(trimmed, env);
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{} {}", red("error:"), err);
                break;
            }
        }
    }
}

fn eval_line(line: &str, env: &Environment) {
    let lexer = Lexer::new(line);
    let mut parser = Parser::new(lexer);
    let program = parser.parse_program();
    if !parser.errors().is_empty() {
        println!("{}", red("parser errors:"));
        for error in parser.errors() {
            println!("\t{}", error);
        }
        return;
    }
    let result = eval_program(&program, env);
    match &result {
        Value::Error(err) => println!("{}", red(&format!("ERROR: {}", err.message))),
        Value::Null => println!("{}", gray("null")),
        other => println!("{}", other.inspect()),
    }
}
