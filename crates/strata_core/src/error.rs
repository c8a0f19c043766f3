//! Error types for path construction

use thiserror::Error;

/// Errors produced while parsing SVG path data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A character that is neither a command, a number nor a separator
    #[error("unexpected character '{character}' at offset {offset}")]
    UnexpectedCharacter { character: char, offset: usize },

    /// The data ended while a command still expected arguments
    #[error("unexpected end of path data after command '{0}'")]
    UnexpectedEnd(char),

    /// Path data must start with a move command
    #[error("path data must begin with a move command, found '{0}'")]
    MissingMoveTo(char),

    /// A numeric token could not be parsed
    #[error("invalid number at offset {0}")]
    InvalidNumber(usize),
}

/// Result type for path parsing
pub type Result<T> = std::result::Result<T, Error>;
