//! Error types for reading, converting and encoding value trees.

use std::fmt;

use thiserror::Error;

/// A 1-based line/column location in the input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// The single failure kind of the reader: malformed input, an unknown struct
/// name, too few struct initializers, or a non-numeric operand to unary minus.
///
/// Parsing stops at the first one; there is no recovery.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{position}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub position: Position,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Convenience alias for the lexer and deserializer.
pub type ParseResult<T> = std::result::Result<T, SyntaxError>;

/// Errors raised by the crate outside the parse boundary.
#[derive(Error, Debug)]
pub enum ValtreeError {
    /// The input text was not a well-formed value for the requested type.
    #[error("syntax error at {0}")]
    Syntax(#[from] SyntaxError),

    /// A schema file or type expression was invalid.
    #[error("schema error: {0}")]
    Schema(String),

    /// The input was not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A JSON value did not fit the requested type.
    #[error("conversion error: {0}")]
    Convert(String),

    /// A heap value could not be written as text (stale handle, non-finite float).
    #[error("encoding error: {0}")]
    Encode(String),
}

/// Convenience alias used throughout valtree-core.
pub type Result<T> = std::result::Result<T, ValtreeError>;
