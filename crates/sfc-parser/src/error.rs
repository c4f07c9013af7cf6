//! Parse error types.

use text_edit::Span;
use thiserror::Error;

/// An error that occurred during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct SfcError {
    /// The kind of error.
    pub kind: SfcErrorKind,
    /// The location in the source where the error occurred.
    pub span: Span,
}

impl SfcError {
    /// Creates a new parse error.
    pub fn new(kind: SfcErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SfcErrorKind {
    /// An unexpected token was encountered in a tag head.
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    /// A block without its closing tag.
    #[error("element is missing end tag: <{tag}>")]
    UnclosedBlock { tag: String },

    /// A block kind that may appear only once.
    #[error("a component can only contain one {block} block")]
    DuplicateBlock { block: String },

    /// `<script>` and `<script setup>` use different languages.
    #[error("<script> and <script setup> must have the same language type")]
    MismatchedLang {
        script: Option<String>,
        setup: Option<String>,
    },

    #[error("<script setup> cannot use the \"src\" attribute")]
    SrcOnScriptSetup,
}

#[cfg(test)]
mod tests {
    use super::*;
    use text_size::TextSize;

    #[test]
    fn test_error_display() {
        let error = SfcError::new(
            SfcErrorKind::DuplicateBlock {
                block: "<template>".to_string(),
            },
            Span::new(TextSize::from(0), TextSize::from(1)),
        );
        assert_eq!(
            error.to_string(),
            "a component can only contain one <template> block"
        );
    }
}
