//! Marmoset CLI — run scripts, evaluate one-liners, or start the REPL.

mod repl;
mod runner;

use clap::Parser as ClapParser;
use marmoset_rt::Environment;
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(
    name = "marmoset",
    version,
    about = "The Marmoset scripting language",
    long_about = "Marmoset is a small dynamically typed scripting language.\n\n\
                  With no file and no --eval, an interactive REPL is started.",
    help_template = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}

Examples:
  marmoset script.mar              Run a script
  marmoset --eval 'puts(1 + 2)'   Evaluate a one-liner
  marmoset --autoload lib.mar      Preload definitions, then start the REPL
  marmoset --dump-ast script.mar   Print the parsed AST as JSON
"
)]
struct Cli {
    /// Code to execute instead of a script file
    #[arg(long, value_name = "CODE")]
    eval: Option<String>,

    /// File evaluated into the environment before the script or REPL
    #[arg(long, value_name = "FILE")]
    autoload: Option<PathBuf>,

    /// Parse only: print the AST as JSON and exit
    #[arg(long)]
    dump_ast: bool,

    /// Script to run
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let env = Environment::new_root();

    if cli.dump_ast {
        std::process::exit(if dump_ast(&cli) { 0 } else { 1 });
    }

    if let Some(path) = &cli.autoload {
        if !runner::run_file(path, &env) {
            std::process::exit(1);
        }
    }

    if let Some(code) = &cli.eval {
        let ok = runner::run_source(code, None, &env);
        std::process::exit(if ok { 0 } else { 1 });
    }

    match &cli.file {
        Some(path) => {
            let ok = runner::run_file(path, &env);
            std::process::exit(if ok { 0 } else { 1 });
        }
        None => repl::start(&env),
    }
}

/// Parse the input and print the AST as JSON, without evaluating.
fn dump_ast(cli: &Cli) -> bool {
    let source = if let Some(code) = &cli.eval {
        code.clone()
    } else if let Some(path) = &cli.file {
        match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("failed to load {}: {}", path.display(), err);
                return false;
            }
        }
    } else {
        eprintln!("--dump-ast needs a file or --eval");
        return false;
    };

    match marmoset_compiler::parse_program(&source) {
        Ok(program) => match serde_json::to_string_pretty(&program) {
            Ok(json) => {
                println!("{}", json);
                true
            }
            Err(err) => {
                eprintln!("failed to serialize the AST: {}", err);
                false
            }
        },
        Err(errors) => {
            for error in errors {
                eprintln!("{}", error);
            }
            false
        }
    }
}
