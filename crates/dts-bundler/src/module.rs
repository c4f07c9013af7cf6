//! Per-file analysis of a declaration module.

use crate::rename::{ImportTypeRef, Occurrence, ReferenceCollector};
use crate::BundleError;
use camino::{Utf8Path, Utf8PathBuf};
use dts_syntax::ast::{
    DefaultDecl, ExportSpecifier, Expr, ModuleDecl, ModuleItem, TsModuleRef,
};
use dts_syntax::swc_common::Spanned;
use dts_syntax::visit::VisitWith;
use dts_syntax::{
    decl_names, export_name, extend_over_line_break, import_binding, parse_module, str_value,
    CommentKind, Dialect, ImportBinding, ParsedModule,
};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// Local name given to an anonymous default export.
pub(crate) const DEFAULT_LOCAL: &str = "_default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportRecord {
    pub specifier: String,
    pub bindings: Vec<ImportBinding>,
    /// `import '...'`, kept for the module's side effects.
    pub side_effect: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExportRecord {
    /// `export { local as exported }` or an exported declaration.
    Local { exported: String, local: String },
    /// `export { imported as exported } from '...'`
    From {
        specifier: String,
        imported: String,
        exported: String,
    },
    /// `export * from '...'`
    Star { specifier: String },
    /// `export * as exported from '...'`
    StarAs { specifier: String, exported: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReferenceKind {
    Path,
    Types,
    Lib,
}

/// A `/// <reference ... />` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reference {
    pub kind: ReferenceKind,
    pub value: String,
}

impl Reference {
    pub fn directive(&self) -> String {
        let attribute = match self.kind {
            ReferenceKind::Path => "path",
            ReferenceKind::Types => "types",
            ReferenceKind::Lib => "lib",
        };
        format!("/// <reference {attribute}=\"{}\" />", self.value)
    }
}

/// A structural rewrite decided during analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Edit {
    Remove(Range<usize>),
    Replace(Range<usize>, String),
}

/// Everything the bundler needs from one declaration file, detached from the
/// syntax tree.
#[derive(Debug)]
pub(crate) struct ModuleRecord {
    pub path: Utf8PathBuf,
    pub source: String,
    pub imports: Vec<ImportRecord>,
    pub exports: Vec<ExportRecord>,
    /// Top-level names declared by the module, in order.
    pub declared: Vec<String>,
    pub references: Vec<Reference>,
    pub edits: Vec<Edit>,
    /// Where the name of an anonymous default export is inserted.
    pub default_name_at: Option<usize>,
    pub occurrences: Vec<Occurrence>,
    pub import_types: Vec<ImportTypeRef>,
    /// `export as namespace X;`
    pub global_name: Option<String>,
}

impl ModuleRecord {
    pub fn read(path: &Utf8Path) -> Result<Self, BundleError> {
        let source = std::fs::read_to_string(path).map_err(|source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::analyze(path.to_path_buf(), source)
    }

    pub fn analyze(path: Utf8PathBuf, source: String) -> Result<Self, BundleError> {
        let mut analysis = Analysis::default();
        {
            let parsed = parse_module(path.as_str(), &source, Dialect::Declaration)?;
            analysis.run(&parsed, &path)?;
        }
        let Analysis {
            imports,
            exports,
            declared,
            references,
            edits,
            default_name_at,
            occurrences,
            import_types,
            global_name,
        } = analysis;
        Ok(Self {
            path,
            source,
            imports,
            exports,
            declared,
            references,
            edits,
            default_name_at,
            occurrences,
            import_types,
            global_name,
        })
    }

    /// Every specifier the module depends on, in source order.
    pub fn specifiers(&self) -> impl Iterator<Item = &str> {
        let imports = self.imports.iter().map(|i| i.specifier.as_str());
        let exports = self.exports.iter().filter_map(|e| match e {
            ExportRecord::From { specifier, .. }
            | ExportRecord::Star { specifier }
            | ExportRecord::StarAs { specifier, .. } => Some(specifier.as_str()),
            ExportRecord::Local { .. } => None,
        });
        let import_types = self.import_types.iter().map(|r| r.specifier.as_str());
        imports.chain(exports).chain(import_types)
    }
}

#[derive(Default)]
struct Analysis {
    imports: Vec<ImportRecord>,
    exports: Vec<ExportRecord>,
    declared: Vec<String>,
    references: Vec<Reference>,
    edits: Vec<Edit>,
    default_name_at: Option<usize>,
    occurrences: Vec<Occurrence>,
    import_types: Vec<ImportTypeRef>,
    global_name: Option<String>,
}

fn reference_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r#"^///\s*<reference\s+(path|types|lib)\s*=\s*["']([^"']*)["']"#).ok()
        })
        .as_ref()
}

impl Analysis {
    fn run(&mut self, parsed: &ParsedModule<'_>, path: &Utf8Path) -> Result<(), BundleError> {
        let source = parsed.source;
        self.collect_references(parsed);

        let mut collector = ReferenceCollector::new(parsed);
        for item in &parsed.module.body {
            let span = parsed.range(item.span());
            let statement = span.start..extend_over_line_break(source, span.end);
            let ModuleItem::ModuleDecl(decl) = item else {
                if let ModuleItem::Stmt(dts_syntax::ast::Stmt::Decl(decl)) = item {
                    self.declare(decl_names(decl).into_iter().map(|i| i.sym.to_string()));
                }
                item.visit_with(&mut collector);
                continue;
            };

            match decl {
                ModuleDecl::Import(import) => {
                    let clause = keyword_range(source, span.start, "import").end;
                    self.imports.push(ImportRecord {
                        specifier: str_value(&import.src),
                        bindings: import.specifiers.iter().map(import_binding).collect(),
                        side_effect: source[clause..].starts_with(['"', '\'']),
                    });
                    self.edits.push(Edit::Remove(statement));
                }
                ModuleDecl::ExportDecl(export) => {
                    let names: Vec<String> = decl_names(&export.decl)
                        .into_iter()
                        .map(|i| i.sym.to_string())
                        .collect();
                    for name in &names {
                        self.exports.push(ExportRecord::Local {
                            exported: name.clone(),
                            local: name.clone(),
                        });
                    }
                    self.declare(names);
                    self.edits.push(Edit::Remove(keyword_range(source, span.start, "export")));
                    export.decl.visit_with(&mut collector);
                }
                ModuleDecl::ExportNamed(named) => {
                    let from = named.src.as_deref().map(str_value);
                    for specifier in &named.specifiers {
                        self.exports.push(match (specifier, &from) {
                            (ExportSpecifier::Named(named), Some(specifier)) => ExportRecord::From {
                                specifier: specifier.clone(),
                                imported: export_name(&named.orig),
                                exported: export_name(named.exported.as_ref().unwrap_or(&named.orig)),
                            },
                            (ExportSpecifier::Named(named), None) => ExportRecord::Local {
                                local: export_name(&named.orig),
                                exported: export_name(named.exported.as_ref().unwrap_or(&named.orig)),
                            },
                            (ExportSpecifier::Namespace(ns), Some(specifier)) => {
                                ExportRecord::StarAs {
                                    specifier: specifier.clone(),
                                    exported: export_name(&ns.name),
                                }
                            }
                            (ExportSpecifier::Default(default), Some(specifier)) => {
                                ExportRecord::From {
                                    specifier: specifier.clone(),
                                    imported: "default".into(),
                                    exported: default.exported.sym.to_string(),
                                }
                            }
                            (_, None) => {
                                return Err(unsupported(path, "namespace export without a source"))
                            }
                        });
                    }
                    self.edits.push(Edit::Remove(statement));
                }
                ModuleDecl::ExportAll(all) => {
                    self.exports.push(ExportRecord::Star {
                        specifier: str_value(&all.src),
                    });
                    self.edits.push(Edit::Remove(statement));
                }
                ModuleDecl::ExportDefaultDecl(default) => {
                    let ident = match &default.decl {
                        DefaultDecl::Class(class) => class.ident.as_ref(),
                        DefaultDecl::Fn(func) => func.ident.as_ref(),
                        DefaultDecl::TsInterfaceDecl(interface) => Some(&interface.id),
                    };
                    let local = ident.map_or(DEFAULT_LOCAL.to_string(), |i| i.sym.to_string());
                    self.declare([local.clone()]);
                    self.exports.push(ExportRecord::Local {
                        exported: "default".into(),
                        local,
                    });

                    let export = keyword_range(source, span.start, "export");
                    let head = span.start..keyword_range(source, export.end, "default").end;
                    let head_end = head.end;
                    let rest = &source[head_end..];
                    if rest.starts_with("declare") || rest.starts_with("interface") {
                        self.edits.push(Edit::Remove(head));
                    } else {
                        self.edits.push(Edit::Replace(head, "declare ".into()));
                    }
                    if ident.is_none() {
                        let keyword = ["class", "function"]
                            .iter()
                            .filter_map(|kw| rest.find(kw).map(|idx| (idx, kw.len())))
                            .min()
                            .map(|(idx, len)| head_end + idx + len);
                        match keyword {
                            Some(at) => self.default_name_at = Some(at),
                            None => return Err(unsupported(path, "anonymous default export")),
                        }
                    }
                    default.decl.visit_with(&mut collector);
                }
                ModuleDecl::ExportDefaultExpr(default) => {
                    let Expr::Ident(ident) = &*default.expr else {
                        return Err(unsupported(path, "default export of an expression"));
                    };
                    self.exports.push(ExportRecord::Local {
                        exported: "default".into(),
                        local: ident.sym.to_string(),
                    });
                    self.edits.push(Edit::Remove(statement));
                }
                ModuleDecl::TsExportAssignment(assignment) => {
                    let Expr::Ident(ident) = &*assignment.expr else {
                        return Err(unsupported(path, "`export =` of an expression"));
                    };
                    self.exports.push(ExportRecord::Local {
                        exported: "default".into(),
                        local: ident.sym.to_string(),
                    });
                    self.edits.push(Edit::Remove(statement));
                }
                ModuleDecl::TsImportEquals(equals) => {
                    let local = equals.id.sym.to_string();
                    if equals.is_export {
                        self.exports.push(ExportRecord::Local {
                            exported: local.clone(),
                            local: local.clone(),
                        });
                    }
                    match &equals.module_ref {
                        TsModuleRef::TsExternalModuleRef(external) => {
                            self.imports.push(ImportRecord {
                                specifier: str_value(&external.expr),
                                bindings: vec![ImportBinding::Namespace { local }],
                                side_effect: false,
                            });
                            self.edits.push(Edit::Remove(statement));
                        }
                        TsModuleRef::TsEntityName(_) => {
                            self.declare([local]);
                            if equals.is_export {
                                self.edits
                                    .push(Edit::Remove(keyword_range(source, span.start, "export")));
                            }
                            equals.visit_with(&mut collector);
                        }
                    }
                }
                ModuleDecl::TsNamespaceExport(namespace) => {
                    self.global_name = Some(namespace.id.sym.to_string());
                    self.edits.push(Edit::Remove(statement));
                }
            }
        }

        self.occurrences = collector.occurrences;
        self.import_types = collector.import_types;
        Ok(())
    }

    fn declare(&mut self, names: impl IntoIterator<Item = String>) {
        for name in names {
            if !self.declared.contains(&name) {
                self.declared.push(name);
            }
        }
    }

    fn collect_references(&mut self, parsed: &ParsedModule<'_>) {
        let Some(pattern) = reference_pattern() else {
            return;
        };
        for comment in parsed.comments() {
            if comment.kind != CommentKind::Line {
                continue;
            }
            let Some(captures) = pattern.captures(&comment.text) else {
                continue;
            };
            let kind = match &captures[1] {
                "path" => ReferenceKind::Path,
                "types" => ReferenceKind::Types,
                _ => ReferenceKind::Lib,
            };
            self.references.push(Reference {
                kind,
                value: captures[2].to_string(),
            });
            let end = extend_over_line_break(parsed.source, comment.range.end);
            self.edits.push(Edit::Remove(comment.range.start..end));
        }
    }
}

/// `keyword` at `start` plus the whitespace after it; empty when the text at
/// `start` is not `keyword`.
fn keyword_range(source: &str, start: usize, keyword: &str) -> Range<usize> {
    let Some(rest) = source[start..].strip_prefix(keyword) else {
        return start..start;
    };
    let trimmed = rest.trim_start();
    start..start + keyword.len() + (rest.len() - trimmed.len())
}

fn unsupported(path: &Utf8Path, message: &str) -> BundleError {
    BundleError::Unsupported {
        file: path.to_path_buf(),
        message: format!("unsupported {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn analyze(source: &str) -> ModuleRecord {
        ModuleRecord::analyze("/t/a.d.ts".into(), source.to_string()).unwrap()
    }

    #[test]
    fn test_imports_and_exports() {
        let record = analyze(
            "import { A, B as C } from './b';\nimport D from 'ext';\nexport { A, C as E };\nexport * from './f';\nexport * as g from './g';\nexport { default as H } from './h';\nexport declare class I {}\n",
        );
        assert_eq!(record.imports.len(), 2);
        assert_eq!(record.imports[1].specifier, "ext");
        assert_eq!(
            record.exports,
            vec![
                ExportRecord::Local { exported: "A".into(), local: "A".into() },
                ExportRecord::Local { exported: "E".into(), local: "C".into() },
                ExportRecord::Star { specifier: "./f".into() },
                ExportRecord::StarAs { specifier: "./g".into(), exported: "g".into() },
                ExportRecord::From {
                    specifier: "./h".into(),
                    imported: "default".into(),
                    exported: "H".into()
                },
                ExportRecord::Local { exported: "I".into(), local: "I".into() },
            ]
        );
        assert_eq!(record.declared, vec!["I".to_string()]);
        assert_eq!(
            record.specifiers().collect::<Vec<_>>(),
            vec!["./b", "ext", "./f", "./g", "./h"]
        );
    }

    #[test]
    fn test_side_effect_imports() {
        let record = analyze("import 'vue/jsx';\nimport {} from 'vue';\nimport \"./aug\";\n");
        let side_effects: Vec<(&str, bool)> = record
            .imports
            .iter()
            .map(|import| (import.specifier.as_str(), import.side_effect))
            .collect();
        assert_eq!(
            side_effects,
            vec![("vue/jsx", true), ("vue", false), ("./aug", true)]
        );
    }

    #[test]
    fn test_default_exports() {
        let record = analyze("export default function (a: string): void;\n");
        assert_eq!(record.declared, vec![DEFAULT_LOCAL.to_string()]);
        let at = record.default_name_at.unwrap();
        assert_eq!(&record.source[at - "function".len()..at], "function");
        assert_eq!(
            record.edits,
            vec![Edit::Replace(0.."export default ".len(), "declare ".into())]
        );

        let record = analyze("declare const _default: number;\nexport default _default;\n");
        assert_eq!(
            record.exports,
            vec![ExportRecord::Local {
                exported: "default".into(),
                local: "_default".into()
            }]
        );
    }

    #[test]
    fn test_reference_directives() {
        let record = analyze(
            "/// <reference types=\"node\" />\n/// <reference path=\"./globals.d.ts\" />\nexport declare const a: 1;\n",
        );
        assert_eq!(
            record.references,
            vec![
                Reference { kind: ReferenceKind::Types, value: "node".into() },
                Reference { kind: ReferenceKind::Path, value: "./globals.d.ts".into() },
            ]
        );
        assert_eq!(record.references[0].directive(), "/// <reference types=\"node\" />");
    }

    #[test]
    fn test_expression_default_is_rejected() {
        let err = ModuleRecord::analyze("/t/a.d.ts".into(), "export default 1 + 1;\n".into())
            .unwrap_err();
        assert!(matches!(err, BundleError::Unsupported { .. }));
    }
}
