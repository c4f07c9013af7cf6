//! Dead-import pruning.

use crate::lists::{remove_list_items, ListEdit};
use crate::TransformError;
use dts_syntax::ast::{ImportDecl, ImportSpecifier, Module, ModuleDecl, ModuleItem};
use dts_syntax::swc_common::Spanned;
use dts_syntax::visit::{Visit, VisitWith};
use dts_syntax::{extend_over_line_break, ParsedModule};
use rustc_hash::FxHashSet;
use text_edit::EditBuffer;

/// Every identifier referenced outside of import declarations.
pub(crate) fn referenced_names(module: &Module) -> FxHashSet<String> {
    struct References(FxHashSet<String>);

    impl Visit for References {
        fn visit_import_decl(&mut self, _: &ImportDecl) {}

        fn visit_ident(&mut self, ident: &dts_syntax::ast::Ident) {
            self.0.insert(ident.sym.to_string());
        }
    }

    let mut refs = References(FxHashSet::default());
    module.visit_with(&mut refs);
    refs.0
}

/// Removes import statements that bind nothing.
///
/// * `import {} from 'x'` is always removed.
/// * `import 'x'` is removed when `side_effects` is set.
/// * Bindings listed in `dead` are dropped, and the statement with them once
///   none is left. Callers pass the names an earlier stage stopped
///   referencing; bindings that were never referenced are left alone.
pub(crate) fn prune_imports(
    parsed: &ParsedModule<'_>,
    side_effects: bool,
    dead: Option<&FxHashSet<String>>,
) -> Result<Option<String>, TransformError> {
    let source = parsed.source;
    let mut buffer = EditBuffer::new(source);

    for item in &parsed.module.body {
        let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = item else {
            continue;
        };
        let span = parsed.range(import.span);
        let statement_end = extend_over_line_break(source, span.end);

        if import.specifiers.is_empty() {
            let head = &source[span.start..parsed.start(&*import.src)];
            if head.contains('{') || side_effects {
                buffer.remove(span.start, statement_end)?;
            }
            continue;
        }

        let Some(dead) = dead else {
            continue;
        };
        let is_dead = |specifier: &ImportSpecifier| {
            let local = match specifier {
                ImportSpecifier::Named(named) => &named.local,
                ImportSpecifier::Default(default) => &default.local,
                ImportSpecifier::Namespace(namespace) => &namespace.local,
            };
            dead.contains(&*local.sym)
        };
        if !import.specifiers.iter().any(is_dead) {
            continue;
        }
        if import.specifiers.iter().all(is_dead) {
            buffer.remove(span.start, statement_end)?;
            continue;
        }

        prune_specifiers(&mut buffer, parsed, import, &is_dead)?;
    }

    Ok(buffer.has_changes().then(|| buffer.finish()))
}

/// Drops some, but not all, specifiers of one import statement.
fn prune_specifiers(
    buffer: &mut EditBuffer<'_>,
    parsed: &ParsedModule<'_>,
    import: &ImportDecl,
    is_dead: &dyn Fn(&ImportSpecifier) -> bool,
) -> Result<(), TransformError> {
    let source = parsed.source;
    let named: Vec<&ImportSpecifier> = import
        .specifiers
        .iter()
        .filter(|s| matches!(s, ImportSpecifier::Named(_)))
        .collect();
    let leading = import
        .specifiers
        .iter()
        .find(|s| !matches!(s, ImportSpecifier::Named(_)));

    if !named.is_empty() {
        let ranges: Vec<_> = named.iter().map(|s| parsed.range(s.span())).collect();
        let marked: Vec<bool> = named.iter().map(|s| is_dead(s)).collect();
        if remove_list_items(buffer, &ranges, &marked)? == ListEdit::Emptied {
            // `import D, { a } from` -> `import D from`
            if let Some(leading) = leading {
                let leading_end = parsed.end(leading);
                let close = source[leading_end..]
                    .find('}')
                    .map_or(leading_end, |idx| leading_end + idx + 1);
                buffer.remove(leading_end, close)?;
            }
        }
    }

    if let Some(leading) = leading.filter(|s| is_dead(s)) {
        // `import D, { a } from` -> `import { a } from`
        let range = parsed.range(leading.span());
        let rest = &source[range.end..];
        let next = rest
            .find(|c: char| c != ',' && !c.is_whitespace())
            .map_or(range.end, |idx| range.end + idx);
        buffer.remove(range.start, next)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dts_syntax::{parse_module, Dialect};
    use pretty_assertions::assert_eq;

    fn prune(source: &str, side_effects: bool, dead: &[&str]) -> Option<String> {
        let parsed = parse_module("types.d.ts", source, Dialect::TypeScript).unwrap();
        let dead: FxHashSet<String> = dead.iter().map(|s| s.to_string()).collect();
        prune_imports(&parsed, side_effects, Some(&dead)).unwrap()
    }

    #[test]
    fn test_empty_braces_always_removed() {
        let out = prune("import {} from 'x';\nimport { B } from 'y';\nimport 'z';\n", false, &[]);
        assert_eq!(
            out.as_deref(),
            Some("import { B } from 'y';\nimport 'z';\n")
        );
    }

    #[test]
    fn test_side_effect_import_removed_on_request() {
        let out = prune("import {} from 'x';\nimport { B } from 'y';\nimport 'z';\n", true, &[]);
        assert_eq!(out.as_deref(), Some("import { B } from 'y';\n"));
    }

    #[test]
    fn test_dead_bindings() {
        let source = "import { A, B } from 'a';\nimport C from 'c';\nimport D, { E } from 'd';\n";
        let out = prune(source, false, &["A", "C", "E"]);
        assert_eq!(
            out.as_deref(),
            Some("import { B } from 'a';\nimport D from 'd';\n")
        );
    }

    #[test]
    fn test_dead_default_keeps_named() {
        let out = prune("import D, { E } from 'd';\n", false, &["D"]);
        assert_eq!(out.as_deref(), Some("import { E } from 'd';\n"));
    }

    #[test]
    fn test_nothing_to_do() {
        assert_eq!(prune("import { B } from 'y';\n", false, &[]), None);
    }

    #[test]
    fn test_referenced_names_skip_imports() {
        let parsed = parse_module(
            "types.d.ts",
            "import { A } from 'a';\nexport declare const b: B;\n",
            Dialect::TypeScript,
        )
        .unwrap();
        let names = referenced_names(&parsed.module);
        assert!(names.contains("B"));
        assert!(names.contains("b"));
        assert!(!names.contains("A"));
    }
}
