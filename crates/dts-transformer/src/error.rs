//! Transformer errors.

use camino::Utf8PathBuf;
use dts_syntax::SyntaxError;
use text_edit::EditError;
use thiserror::Error;

/// Errors that abort a transformer chain.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The chunk could not be parsed.
    #[error("failed to parse chunk: {0}")]
    Syntax(#[from] SyntaxError),

    /// A tag is still present after removal, in a position the remover does
    /// not understand.
    #[error("unhandled {} declarations detected", .tags.join(","))]
    UnhandledTags {
        /// Tag names still found in the output.
        tags: Vec<String>,
    },

    /// A tagged variable statement declares more than one binding.
    #[error("cannot remove `{}`: a tagged declaration must declare a single binding", .names.join(", "))]
    DuplicateDeclarator {
        /// The names declared by the statement.
        names: Vec<String>,
    },

    /// A tag name that does not form a valid pattern.
    #[error("invalid tag `{tag}`: {source}")]
    InvalidTag {
        tag: String,
        #[source]
        source: regex::Error,
    },

    /// An auxiliary file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An edit fell outside the chunk.
    #[error(transparent)]
    Edit(#[from] EditError),

    /// Raised by a user supplied transformer.
    #[error("{0}")]
    Custom(String),
}

impl TransformError {
    pub fn custom(message: impl Into<String>) -> Self {
        TransformError::Custom(message.into())
    }
}
