//! Comment table and leading-comment lookup.

use std::ops::Range;
use swc_common::comments::{CommentKind as SwcCommentKind, SingleThreadedComments};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    Line,
    Block,
}

/// A comment with its byte range, delimiters included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
    pub range: Range<usize>,
    /// Full comment text including `//` or `/* */`.
    pub text: String,
}

/// Keywords that may sit between a doc comment and the span swc reports for
/// the declaration.
const MODIFIERS: &[&str] = &[
    "export",
    "default",
    "declare",
    "abstract",
    "readonly",
    "public",
    "private",
    "protected",
    "static",
    "override",
    "async",
    "accessor",
    "const",
];

pub(crate) fn collect_comments(
    comments: &SingleThreadedComments,
    source: &str,
    base: u32,
) -> Vec<Comment> {
    let (leading, trailing) = comments.borrow_all();
    let mut all: Vec<Comment> = leading
        .values()
        .chain(trailing.values())
        .flatten()
        .filter_map(|comment| {
            let mut start = comment.span.lo.0.checked_sub(base)? as usize;
            let mut end = comment.span.hi.0.checked_sub(base)? as usize;
            let kind = match comment.kind {
                SwcCommentKind::Line => CommentKind::Line,
                SwcCommentKind::Block => CommentKind::Block,
            };
            // Normalise to a range covering the delimiters.
            if !source.get(start..)?.starts_with('/') && start >= 2 {
                start -= 2;
            }
            if kind == CommentKind::Block && !source.get(..end)?.ends_with("*/") {
                end = (end + 2).min(source.len());
            }
            Some(Comment {
                kind,
                text: source.get(start..end)?.to_string(),
                range: start..end,
            })
        })
        .collect();
    all.sort_by_key(|c| c.range.start);
    all.dedup_by_key(|c| c.range.start);
    all
}

pub(crate) fn leading_comments<'a>(
    comments: &'a [Comment],
    source: &str,
    pos: usize,
) -> Vec<&'a Comment> {
    let mut found = Vec::new();
    let mut cursor = pos.min(source.len());

    loop {
        let before = source[..cursor].trim_end();
        let end = before.len();

        if let Some(comment) = comments.iter().find(|c| c.range.end == end) {
            if is_trailing(source, comment) {
                break;
            }
            found.push(comment);
            cursor = comment.range.start;
            continue;
        }

        let modifier = MODIFIERS.iter().find(|kw| {
            before.ends_with(*kw)
                && !before[..end - kw.len()]
                    .chars()
                    .next_back()
                    .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
        });
        match modifier {
            Some(kw) => cursor = end - kw.len(),
            None => break,
        }
    }

    found.reverse();
    found
}

/// A line comment that follows code on its line belongs to that code.
fn is_trailing(source: &str, comment: &Comment) -> bool {
    if comment.kind != CommentKind::Line {
        return false;
    }
    let line_start = source[..comment.range.start]
        .rfind('\n')
        .map_or(0, |idx| idx + 1);
    let code = source[line_start..comment.range.start].trim();
    code.ends_with(';') || code.ends_with('}')
}

#[cfg(test)]
mod tests {
    use crate::{parse_module, Dialect};
    use pretty_assertions::assert_eq;

    fn leading_texts(source: &str, item: usize) -> Vec<String> {
        let parsed = parse_module("test.d.ts", source, Dialect::Declaration).unwrap();
        let pos = parsed.start(&parsed.module.body[item]);
        parsed
            .leading_comments(pos)
            .into_iter()
            .map(|c| c.text.clone())
            .collect()
    }

    #[test]
    fn test_doc_comment_before_export() {
        let source = "/** Docs. */\nexport declare class A {}\n";
        assert_eq!(leading_texts(source, 0), vec!["/** Docs. */".to_string()]);
    }

    #[test]
    fn test_multiple_comments_in_order() {
        let source = "// one\n/* two */\ndeclare const a: 1;\n";
        assert_eq!(
            leading_texts(source, 0),
            vec!["// one".to_string(), "/* two */".to_string()]
        );
    }

    #[test]
    fn test_trailing_comment_of_previous_statement_is_skipped() {
        let source = "declare const a: 1; // about a\ndeclare const b: 2;\n";
        assert!(leading_texts(source, 1).is_empty());
    }

    #[test]
    fn test_comment_before_declare_keyword() {
        let source = "/** @internal */ declare class Hidden {}\n";
        let parsed = parse_module("test.d.ts", source, Dialect::Declaration).unwrap();
        let swc_ecma_ast::ModuleItem::Stmt(swc_ecma_ast::Stmt::Decl(swc_ecma_ast::Decl::Class(
            class,
        ))) = &parsed.module.body[0]
        else {
            panic!("expected class");
        };
        let comments = parsed.leading_comments(parsed.start(&*class.class));
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].range, 0..16);
    }
}
