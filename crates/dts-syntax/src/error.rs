//! Syntax errors reported by swc.

use thiserror::Error;

/// A source file that swc could not parse.
#[derive(Debug, Clone, Error)]
#[error("{file}:{line}:{column}: {message}")]
pub struct SyntaxError {
    /// The file name the source was registered under.
    pub file: String,
    /// One-based line.
    pub line: u32,
    /// One-based column.
    pub column: u32,
    /// Byte offset of the error.
    pub offset: usize,
    /// swc's description of the problem.
    pub message: String,
}
