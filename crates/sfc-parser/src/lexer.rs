//! Tag-head lexer using logos.
//!
//! Only the opening tag of a top-level block is tokenized: the tag name and
//! its attributes. Block content is raw text and is sliced out of the source
//! by the parser.

use logos::Logos;
use text_edit::Span;
use text_size::TextSize;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span of the token in the source.
    pub span: Span,
}

/// Token kinds inside a tag head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos, Default)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    /// `<`
    #[token("<")]
    LAngle,

    /// `>`
    #[token(">")]
    RAngle,

    /// `/>`
    #[token("/>")]
    SlashRAngle,

    /// `=`
    #[token("=")]
    Eq,

    /// A double-quoted attribute value, quotes included.
    #[regex(r#""[^"]*""#)]
    DoubleQuoted,

    /// A single-quoted attribute value, quotes included.
    #[regex(r"'[^']*'")]
    SingleQuoted,

    /// A tag name, attribute name or unquoted attribute value.
    #[regex(r#"[^\s"'=<>/`]+"#)]
    Word,

    /// A stray `/`.
    #[token("/")]
    Slash,

    /// End of input.
    Eof,

    /// Invalid/unknown token.
    #[default]
    Error,
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::LAngle => "'<'",
            TokenKind::RAngle => "'>'",
            TokenKind::SlashRAngle => "'/>'",
            TokenKind::Eq => "'='",
            TokenKind::DoubleQuoted | TokenKind::SingleQuoted => "quoted value",
            TokenKind::Word => "name",
            TokenKind::Slash => "'/'",
            TokenKind::Eof => "end of file",
            TokenKind::Error => "invalid token",
        }
    }
}

/// A lexer over a tag head, starting at an arbitrary offset of the source.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    source: &'src str,
    offset: usize,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a lexer for the whole source.
    pub fn new(source: &'src str) -> Self {
        Self::at(source, 0)
    }

    /// Creates a lexer that starts at `offset`; spans stay relative to the
    /// whole source.
    pub fn at(source: &'src str, offset: usize) -> Self {
        Self {
            inner: TokenKind::lexer(&source[offset..]),
            source,
            offset,
            finished: false,
        }
    }

    /// Returns the text of the current token.
    pub fn slice(&self) -> &'src str {
        self.inner.slice()
    }

    fn span(&self, range: std::ops::Range<usize>) -> Span {
        Span::new(
            TextSize::from((self.offset + range.start) as u32),
            TextSize::from((self.offset + range.end) as u32),
        )
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.inner.next() {
            Some(Ok(kind)) => Some(Token {
                kind,
                span: self.span(self.inner.span()),
            }),
            Some(Err(())) => Some(Token {
                kind: TokenKind::Error,
                span: self.span(self.inner.span()),
            }),
            None => {
                self.finished = true;
                let end = TextSize::from(self.source.len() as u32);
                Some(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(end, end),
                })
            }
        }
    }
}
