//! swc parsing with byte-offset bookkeeping.

use crate::comments::{collect_comments, leading_comments, Comment};
use crate::error::SyntaxError;
use std::ops::Range;
use std::sync::Arc;
use swc_common::comments::SingleThreadedComments;
use swc_common::{FileName, SourceMap, Span, Spanned};
use swc_ecma_ast::Module;
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};
use text_edit::LineIndex;

/// The TypeScript flavour a source is parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `.ts`, `.mts`, `.cts`
    TypeScript,
    /// `.tsx`
    Tsx,
    /// `.d.ts` and friends.
    Declaration,
}

impl Dialect {
    /// Picks the dialect from a file name.
    pub fn from_file_name(name: &str) -> Self {
        if name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts") {
            Dialect::Declaration
        } else if name.ends_with(".tsx") {
            Dialect::Tsx
        } else {
            Dialect::TypeScript
        }
    }

    fn syntax(self) -> Syntax {
        Syntax::Typescript(TsSyntax {
            tsx: self == Dialect::Tsx,
            dts: self == Dialect::Declaration,
            decorators: true,
            ..Default::default()
        })
    }
}

/// A parsed module together with its source and comments.
#[derive(Debug)]
pub struct ParsedModule<'src> {
    pub module: Module,
    pub source: &'src str,
    comments: Vec<Comment>,
    base: u32,
}

/// Parses `source` as an ES module.
///
/// Recoverable errors are treated like fatal ones: a declaration that swc had
/// to guess at is not something the pipeline should rewrite.
pub fn parse_module<'src>(
    file_name: &str,
    source: &'src str,
    dialect: Dialect,
) -> Result<ParsedModule<'src>, SyntaxError> {
    let cm: Arc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        FileName::Custom(file_name.to_string()).into(),
        source.to_string(),
    );
    let base = fm.start_pos.0;
    let comments = SingleThreadedComments::default();

    let mut parser = Parser::new(dialect.syntax(), StringInput::from(&*fm), Some(&comments));
    let parsed = parser.parse_module();
    let recovered = parser.take_errors();

    let error = |span: Span, message: String| {
        let offset = (span.lo.0.saturating_sub(base) as usize).min(source.len());
        let (line, column) = LineIndex::new(source)
            .line_col(text_edit::ByteOffset::from(offset as u32))
            .map(|pos| pos.one_based())
            .unwrap_or((1, 1));
        SyntaxError {
            file: file_name.to_string(),
            line,
            column,
            offset,
            message,
        }
    };

    let module = match parsed {
        Ok(module) => module,
        Err(err) => return Err(error(err.span(), err.kind().msg().into_owned())),
    };
    if let Some(err) = recovered.first() {
        return Err(error(err.span(), err.kind().msg().into_owned()));
    }

    Ok(ParsedModule {
        module,
        source,
        comments: collect_comments(&comments, source, base),
        base,
    })
}

impl<'src> ParsedModule<'src> {
    /// Byte range of a swc span in [`source`](Self::source).
    pub fn range(&self, span: Span) -> Range<usize> {
        let start = span.lo.0.saturating_sub(self.base) as usize;
        let end = span.hi.0.saturating_sub(self.base) as usize;
        start.min(self.source.len())..end.min(self.source.len())
    }

    /// Byte offset where `node` starts.
    pub fn start(&self, node: &impl Spanned) -> usize {
        self.range(node.span()).start
    }

    /// Byte offset where `node` ends.
    pub fn end(&self, node: &impl Spanned) -> usize {
        self.range(node.span()).end
    }

    /// Source text of `node`.
    pub fn text(&self, node: &impl Spanned) -> &'src str {
        &self.source[self.range(node.span())]
    }

    /// Every comment in the file, in source order.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// The comments directly attached in front of the node starting at `pos`.
    ///
    /// Modifier keywords between the comments and `pos` are skipped, so the
    /// result is the same whether a span includes `declare` or not.
    pub fn leading_comments(&self, pos: usize) -> Vec<&Comment> {
        leading_comments(&self.comments, self.source, pos)
    }
}
