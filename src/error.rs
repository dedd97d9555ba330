//! Centralised error hierarchy for the **aq interpreter**.
//!
//! Every stage (scanner, parser, resolver, runtime) converts its failure modes
//! into one of the variants defined here, so the whole crate can share a single
//! `Result<T>` alias.  Rendering follows the diagnostics format the CLI prints:
//!
//! ```text
//! [line 3] Error at 'x': Expect ';' after value.
//! ```
//!
//! Runtime errors print the message first and the failing line second.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AqError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        /// `" at end"` or `" at '<lexeme>'"`.
        location: String,
        line: usize,
    },

    /// Static resolution failure (redeclaration, self‑reference, stray `return`).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Where a token‑anchored diagnostic points.
fn location(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl AqError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        AqError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        AqError::Parse {
            message,
            location: location(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        AqError::Resolve {
            message,
            location: location(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        AqError::Runtime {
            message,
            line: token.line,
        }
    }
}

/// Outcome signal of running one unit of source: either it never started
/// because of static errors, or it started and hit a runtime error.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("{} error(s) before execution", .0.len())]
    Compile(Vec<AqError>),

    #[error(transparent)]
    Runtime(AqError),
}

impl RunError {
    /// All diagnostics carried by this failure, in report order.
    pub fn diagnostics(&self) -> Vec<&AqError> {
        match self {
            RunError::Compile(errors) => errors.iter().collect(),
            RunError::Runtime(error) => vec![error],
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, AqError>;
