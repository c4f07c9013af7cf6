//! Parsing support shared by the declaration emitter, bundler and
//! transformers.
//!
//! Sources are parsed with swc. [`ParsedModule`] keeps the source text next to
//! the AST and converts swc positions into plain byte offsets, so callers can
//! feed them straight into a [`text_edit::EditBuffer`].
//!
//! # Example
//!
//! ```
//! use dts_syntax::{parse_module, Dialect};
//!
//! let source = "/** @internal */\nexport declare const secret: string;\n";
//! let parsed = parse_module("index.d.ts", source, Dialect::Declaration).unwrap();
//! let item = &parsed.module.body[0];
//! let comments = parsed.leading_comments(parsed.start(item));
//! assert_eq!(comments.len(), 1);
//! assert!(comments[0].text.contains("@internal"));
//! ```

mod comments;
mod error;
mod names;
mod parse;

pub use comments::{Comment, CommentKind};
pub use error::SyntaxError;
pub use names::{
    decl_names, export_name, import_binding, pat_names, str_value, ImportBinding,
};
pub use parse::{parse_module, Dialect, ParsedModule};

/// Re-exported so dependants share one swc version.
pub use swc_common;
pub use swc_ecma_ast as ast;
pub use swc_ecma_visit as visit;

/// Skips spaces and tabs after `end`, then one `;` or `,` if present.
///
/// Removing a declaration or list element should take its terminator along,
/// but never the line break that follows it.
pub fn extend_over_terminator(source: &str, end: usize) -> usize {
    let rest = &source[end..];
    let trimmed = rest.trim_start_matches([' ', '\t']);
    match trimmed.as_bytes().first() {
        Some(b';') | Some(b',') => end + (rest.len() - trimmed.len()) + 1,
        _ => end,
    }
}

/// Extends `end` over trailing spaces and a single line break.
pub fn extend_over_line_break(source: &str, end: usize) -> usize {
    let rest = &source[end..];
    let trimmed = rest.trim_start_matches([' ', '\t']);
    let skipped = rest.len() - trimmed.len();
    if trimmed.starts_with("\r\n") {
        end + skipped + 2
    } else if trimmed.starts_with('\n') {
        end + skipped + 1
    } else {
        end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_over_terminator() {
        let source = "declare const a: 1 ;\nx";
        assert_eq!(extend_over_terminator(source, 18), 20);
        assert_eq!(extend_over_terminator(source, 20), 20);
        assert_eq!(extend_over_terminator("a\n;", 1), 1);
    }

    #[test]
    fn test_extend_over_line_break() {
        assert_eq!(extend_over_line_break("a;  \nb", 2), 5);
        assert_eq!(extend_over_line_break("a;\r\nb", 2), 4);
        assert_eq!(extend_over_line_break("a; b", 2), 2);
    }
}
