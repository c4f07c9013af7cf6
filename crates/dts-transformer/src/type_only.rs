//! Rewrites type-only import/export syntax into plain imports and exports.

use crate::TransformError;
use dts_syntax::ast::{ExportSpecifier, ImportSpecifier, ModuleDecl, ModuleItem};
use dts_syntax::ParsedModule;
use text_edit::EditBuffer;

/// Drops the `type` modifier from `import type`, `export type { }`,
/// `export type * from` and from individual specifiers.
///
/// Type alias declarations (`export type X = ...`) are declarations, not
/// type-only exports, and are left alone.
pub(crate) fn strip_type_keywords(
    parsed: &ParsedModule<'_>,
) -> Result<Option<String>, TransformError> {
    let mut buffer = EditBuffer::new(parsed.source);

    for item in &parsed.module.body {
        let ModuleItem::ModuleDecl(decl) = item else {
            continue;
        };
        match decl {
            ModuleDecl::Import(import) => {
                if import.type_only {
                    remove_keyword_after(&mut buffer, parsed.start(import), "import")?;
                }
                for specifier in &import.specifiers {
                    if let ImportSpecifier::Named(named) = specifier {
                        if named.is_type_only {
                            remove_keyword_at(&mut buffer, parsed.start(named))?;
                        }
                    }
                }
            }
            ModuleDecl::ExportNamed(export) => {
                if export.type_only {
                    remove_keyword_after(&mut buffer, parsed.start(export), "export")?;
                }
                for specifier in &export.specifiers {
                    if let ExportSpecifier::Named(named) = specifier {
                        if named.is_type_only {
                            remove_keyword_at(&mut buffer, parsed.start(named))?;
                        }
                    }
                }
            }
            ModuleDecl::ExportAll(export) if export.type_only => {
                remove_keyword_after(&mut buffer, parsed.start(export), "export")?;
            }
            _ => {}
        }
    }

    Ok(buffer.has_changes().then(|| buffer.finish()))
}

/// Removes the `type` that follows `keyword` at `start`.
fn remove_keyword_after(
    buffer: &mut EditBuffer<'_>,
    start: usize,
    keyword: &str,
) -> Result<(), TransformError> {
    let source = buffer.original();
    let after_keyword = start + keyword.len();
    let rest = &source[after_keyword..];
    let type_start = after_keyword + (rest.len() - rest.trim_start().len());
    remove_keyword_at(buffer, type_start)
}

/// Removes `type` and the whitespace after it, if `type` is at `start`.
fn remove_keyword_at(buffer: &mut EditBuffer<'_>, start: usize) -> Result<(), TransformError> {
    let source = buffer.original();
    let Some(rest) = source[start..].strip_prefix("type") else {
        return Ok(());
    };
    let trimmed = rest.trim_start();
    if trimmed.len() == rest.len() {
        // `type` is the imported name itself, e.g. `import { type } from`.
        return Ok(());
    }
    let end = start + 4 + (rest.len() - trimmed.len());
    buffer.remove(start, end)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dts_syntax::{parse_module, Dialect};
    use pretty_assertions::assert_eq;

    fn strip(source: &str) -> Option<String> {
        let parsed = parse_module("types.d.ts", source, Dialect::TypeScript).unwrap();
        strip_type_keywords(&parsed).unwrap()
    }

    #[test]
    fn test_statement_level_keywords() {
        let out = strip(
            "import type { A } from 'a';\nexport type { B } from 'b';\nexport type * from 'c';\n",
        );
        assert_eq!(
            out.as_deref(),
            Some("import { A } from 'a';\nexport { B } from 'b';\nexport * from 'c';\n")
        );
    }

    #[test]
    fn test_specifier_keywords() {
        let out = strip("import { type A, B } from 'a';\nexport { type A as C, B };\n");
        assert_eq!(
            out.as_deref(),
            Some("import { A, B } from 'a';\nexport { A as C, B };\n")
        );
    }

    #[test]
    fn test_type_alias_untouched() {
        assert_eq!(strip("export type X = { type: string };\n"), None);
    }
}
