//! Pipeline glue: source text in, tokens / trees / effects out.
//!
//! A [`Session`] owns one [`Interpreter`], so globals defined by one call to
//! [`Session::run`] or [`Session::eval_line`] stay visible to the next.  The
//! free functions drive the front end only and back the `tokenize`, `parse`
//! and `evaluate` subcommands.

use std::io::Write;

use log::{debug, info};

use crate::ast::{Expr, Stmt};
use crate::error::{LoxError, Result};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;
use crate::value::Value;

/// Scans all of `source`, returning every token (ending with EOF) together
/// with every lexical error, in source order.
pub fn tokenize(source: &str) -> (Vec<Token<'_>>, Vec<LoxError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for item in Scanner::new(source) {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    debug!(
        "Scanned {} token(s) with {} error(s)",
        tokens.len(),
        errors.len()
    );

    (tokens, errors)
}

/// Scans and parses a whole program.  Lexical and parse errors are reported
/// together in one batch.
pub fn parse_program(source: &str) -> Result<Vec<Stmt>> {
    let (tokens, lex_errors) = tokenize(source);
    let parsed = Parser::new(&tokens).parse();

    combine(lex_errors, parsed)
}

/// Scans and parses `source` as a single expression.
pub fn parse_expression(source: &str) -> Result<Expr> {
    let (tokens, lex_errors) = tokenize(source);
    let parsed = Parser::new(&tokens).parse_expression();

    combine(lex_errors, parsed)
}

fn combine<T>(mut lex_errors: Vec<LoxError>, parsed: Result<T>) -> Result<T> {
    match parsed {
        Ok(value) if lex_errors.is_empty() => Ok(value),
        Ok(_) => Err(LoxError::batch(lex_errors)),
        Err(e) => {
            lex_errors.push(e);
            Err(LoxError::batch(lex_errors))
        }
    }
}

/// One interpreter lifetime: a script run, or a whole REPL conversation.
pub struct Session {
    interpreter: Interpreter,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    pub fn with_output(out: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
        }
    }

    pub fn set_max_call_depth(&mut self, max_depth: usize) {
        self.interpreter.set_max_call_depth(max_depth);
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Runs `source` as a program.  Nothing executes unless scanning,
    /// parsing and resolving all succeed.
    pub fn run(&mut self, source: &str) -> Result<()> {
        info!("Running program of {} byte(s)", source.len());

        let statements = parse_program(source)?;
        self.execute(&statements)
    }

    /// Evaluates `source` as one expression against the session's globals.
    pub fn evaluate(&mut self, source: &str) -> Result<Value> {
        let statements = vec![Stmt::Expression(parse_expression(source)?)];
        Resolver::new().resolve(&statements)?;

        match statements.as_slice() {
            [Stmt::Expression(expr)] => self.interpreter.evaluate(expr),
            _ => Ok(Value::Nil),
        }
    }

    /// REPL entry point.  A line holding a single expression (with or
    /// without its `;`) is evaluated and its value handed back for echoing.
    /// Anything else runs as a program and yields `None`.
    pub fn eval_line(&mut self, source: &str) -> Result<Option<Value>> {
        let (tokens, lex_errors) = tokenize(source);

        if !lex_errors.is_empty() {
            return Err(LoxError::batch(lex_errors));
        }

        let statements = match Parser::new(&tokens).parse() {
            Ok(statements) => statements,
            Err(program_error) => match Parser::new(&tokens).parse_expression() {
                Ok(expr) => vec![Stmt::Expression(expr)],
                Err(_) => return Err(program_error),
            },
        };

        match statements.as_slice() {
            [Stmt::Expression(expr)] => {
                Resolver::new().resolve(&statements)?;

                debug!("Echoing expression on line {}", expr.line());
                self.interpreter.evaluate(expr).map(Some)
            }
            _ => self.execute(&statements).map(|()| None),
        }
    }

    fn execute(&mut self, statements: &[Stmt]) -> Result<()> {
        Resolver::new().resolve(statements)?;
        self.interpreter.interpret(statements)
    }
}
