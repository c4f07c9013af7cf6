//! Script compilation errors.

use dts_syntax::SyntaxError;
use text_edit::Span;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CompileError {
    /// A script block that swc could not parse. `span` is in component
    /// coordinates.
    #[error("invalid <{block}> content: {source}")]
    Syntax {
        block: &'static str,
        span: Span,
        #[source]
        source: SyntaxError,
    },

    /// Script setup content the compiler does not accept.
    #[error("{message}")]
    Unsupported { message: String, span: Span },
}

impl CompileError {
    /// Where the problem is, in component coordinates.
    pub fn span(&self) -> Span {
        match self {
            CompileError::Syntax { span, .. } | CompileError::Unsupported { span, .. } => *span,
        }
    }
}
