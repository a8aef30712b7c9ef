//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! Static errors (lex, parse, resolve) are gathered into a single
//! [`LoxError::Compile`] batch so one run reports every problem it found.
//! `return` and `break` are *not* errors; see
//! [`Completion`](crate::interpreter::Completion).
//!
//! The module **does not** print diagnostics itself

use std::io;
use thiserror::Error;

use log::info;

/// Exit status for static (lex/parse/resolve) failures.
pub const EXIT_STATIC: i32 = 65;

/// Exit status for an uncaught runtime error.
pub const EXIT_RUNTIME: i32 = 70;

/// Exit status for fatal conditions (stack exhaustion, broken invariants).
pub const EXIT_FATAL: i32 = 71;

/// Exit status for I/O failures.
pub const EXIT_IO: i32 = 74;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.  `location` is ` at 'lexeme'` or ` at end`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// Static‑analysis or resolution failure (e.g. early‑binding errors).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Every static error found in one pass, in source order.
    #[error("{}", render_batch(.0))]
    Compile(Vec<LoxError>),

    /// Runtime evaluation error.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Call depth exceeded the configured limit.
    #[error("Stack overflow.\n[line {line}]")]
    StackOverflow { line: usize },

    /// The resolver and the runtime disagree.  Never caused by user code.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

fn render_batch(errors: &[LoxError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.  `lexeme` of `None` means the
    /// error was found at end of input.
    pub fn parse<S: Into<String>>(line: usize, lexeme: Option<&str>, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        LoxError::Parse {
            message,
            location: location(lexeme),
            line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, lexeme: &str, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", line, message);

        LoxError::Resolve {
            message,
            location: location(Some(lexeme)),
            line,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", line, message);

        LoxError::Runtime { message, line }
    }

    /// Folds a list of static errors into one batch, flattening nested batches.
    pub fn batch(errors: Vec<LoxError>) -> Self {
        let mut flat = Vec::with_capacity(errors.len());

        for error in errors {
            match error {
                LoxError::Compile(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        LoxError::Compile(flat)
    }

    /// The individual errors of a batch; a lone error is its own batch.
    pub fn errors(&self) -> Vec<&LoxError> {
        match self {
            LoxError::Compile(inner) => inner.iter().collect(),
            other => vec![other],
        }
    }

    /// Unrecoverable conditions that should end the whole process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LoxError::StackOverflow { .. } | LoxError::Internal(_))
    }

    /// Process exit status conventionally associated with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoxError::Lex { .. }
            | LoxError::Parse { .. }
            | LoxError::Resolve { .. }
            | LoxError::Compile(_) => EXIT_STATIC,
            LoxError::Runtime { .. } => EXIT_RUNTIME,
            LoxError::StackOverflow { .. } | LoxError::Internal(_) => EXIT_FATAL,
            LoxError::Io(_) | LoxError::Utf8(_) => EXIT_IO,
        }
    }
}

fn location(lexeme: Option<&str>) -> String {
    match lexeme {
        Some(lexeme) => format!(" at '{}'", lexeme),
        None => " at end".to_string(),
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
