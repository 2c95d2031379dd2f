//! Marmoset Compiler
//!
//! Turns Marmoset source text into a typed AST: lexer → Pratt parser →
//! `Program`. Evaluation lives in `marmoset-rt`.

pub mod compiler;

pub use compiler::ast::Program;
pub use compiler::lexer::Lexer;
pub use compiler::parser::{ParseError, Parser};

/// Lex and parse a whole source file. All parse errors are collected;
/// a program is only returned when there are none.
pub fn parse_program(source: &str) -> Result<Program, Vec<ParseError>> {
    let lexer = Lexer::new(source);
    let mut parser = Parser::new(lexer);
    let program = parser.parse_program();
    if parser.errors().is_empty() {
        Ok(program)
    } else {
        Err(parser.errors().to_vec())
    }
}
