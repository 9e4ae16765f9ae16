//! Centralised error hierarchy for the **Rox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! failure modes into one of the variants defined here.  Static diagnostics
//! (lex, parse, resolve) may be accumulated into a [`LoxError::Batch`] so a
//! whole program's problems are reported before execution is refused.
//!
//! Non-local control flow (`return`, `break`, `continue`) is **not** an error
//! and never travels through this type; see [`crate::interpreter::Flow`].
//!
//! The module **does not** print diagnostics itself.

use std::fmt::Write as _;
use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenType};

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

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        location: String,
    },

    /// Static resolution failure; execution never starts.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error.  Unwinds the current top‑level batch only.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Several static diagnostics collected in one pass.
    #[error("{}", render_batch(.0))]
    Batch(Vec<LoxError>),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token<'_>, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token<'_>, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token<'_>, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            line: token.line,
        }
    }

    /// Collapse accumulated diagnostics: one error stays itself, several
    /// become a [`LoxError::Batch`].
    pub fn from_batch(mut errors: Vec<LoxError>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            LoxError::Batch(errors)
        }
    }

    /// `true` for diagnostics produced before execution starts.
    pub fn is_static(&self) -> bool {
        match self {
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. } => true,
            LoxError::Batch(errors) => errors.iter().all(LoxError::is_static),
            _ => false,
        }
    }

    /// Flattened view of every diagnostic carried by this error.
    pub fn diagnostics(&self) -> Vec<&LoxError> {
        match self {
            LoxError::Batch(errors) => errors.iter().flat_map(LoxError::diagnostics).collect(),
            other => vec![other],
        }
    }
}

fn location_of(token: &Token<'_>) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

fn render_batch(errors: &[LoxError]) -> String {
    let mut out = String::new();

    for (i, err) in errors.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{}", err);
    }

    out
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
