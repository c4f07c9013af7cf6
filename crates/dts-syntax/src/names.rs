//! Names bound by declarations, imports and exports.

use swc_ecma_ast::{
    Decl, Ident, ImportSpecifier, ModuleExportName, ObjectPatProp, Pat, Str, TsModuleName,
};

/// Text of a string literal.
pub fn str_value(s: &Str) -> String {
    s.value.to_string_lossy().into_owned()
}

/// Text of an export/import name, whether an identifier or a string.
pub fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        ModuleExportName::Str(value) => str_value(value),
    }
}

/// Identifiers bound at the top level by `decl`.
///
/// Global augmentations and string-named modules bind nothing.
pub fn decl_names(decl: &Decl) -> Vec<&Ident> {
    match decl {
        Decl::Class(class) => vec![&class.ident],
        Decl::Fn(func) => vec![&func.ident],
        Decl::Var(var) => {
            let mut names = Vec::new();
            for declarator in &var.decls {
                pat_names(&declarator.name, &mut names);
            }
            names
        }
        Decl::Using(using) => {
            let mut names = Vec::new();
            for declarator in &using.decls {
                pat_names(&declarator.name, &mut names);
            }
            names
        }
        Decl::TsInterface(interface) => vec![&interface.id],
        Decl::TsTypeAlias(alias) => vec![&alias.id],
        Decl::TsEnum(ts_enum) => vec![&ts_enum.id],
        Decl::TsModule(module) => match &module.id {
            TsModuleName::Ident(ident) if !module.global => vec![ident],
            _ => Vec::new(),
        },
    }
}

/// Collects the identifiers bound by a binding pattern.
pub fn pat_names<'a>(pat: &'a Pat, out: &mut Vec<&'a Ident>) {
    match pat {
        Pat::Ident(binding) => out.push(&binding.id),
        Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                pat_names(elem, out);
            }
        }
        Pat::Rest(rest) => pat_names(&rest.arg, out),
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => pat_names(&kv.value, out),
                    ObjectPatProp::Assign(assign) => out.push(&assign.key.id),
                    ObjectPatProp::Rest(rest) => pat_names(&rest.arg, out),
                }
            }
        }
        Pat::Assign(assign) => pat_names(&assign.left, out),
        Pat::Invalid(_) | Pat::Expr(_) => {}
    }
}

/// What an import specifier brings into scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportBinding {
    /// `import { imported as local }`
    Named { imported: String, local: String },
    /// `import local from`
    Default { local: String },
    /// `import * as local from`
    Namespace { local: String },
}

impl ImportBinding {
    pub fn local(&self) -> &str {
        match self {
            ImportBinding::Named { local, .. }
            | ImportBinding::Default { local }
            | ImportBinding::Namespace { local } => local,
        }
    }
}

pub fn import_binding(specifier: &ImportSpecifier) -> ImportBinding {
    match specifier {
        ImportSpecifier::Named(named) => {
            let local = named.local.sym.to_string();
            let imported = named
                .imported
                .as_ref()
                .map(export_name)
                .unwrap_or_else(|| local.clone());
            if imported == "default" {
                ImportBinding::Default { local }
            } else {
                ImportBinding::Named { imported, local }
            }
        }
        ImportSpecifier::Default(default) => ImportBinding::Default {
            local: default.local.sym.to_string(),
        },
        ImportSpecifier::Namespace(namespace) => ImportBinding::Namespace {
            local: namespace.local.sym.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_module, Dialect};
    use pretty_assertions::assert_eq;
    use swc_ecma_ast::{ModuleDecl, ModuleItem, Stmt};

    fn names_of(source: &str) -> Vec<String> {
        let parsed = parse_module("names.d.ts", source, Dialect::Declaration).unwrap();
        parsed
            .module
            .body
            .iter()
            .flat_map(|item| match item {
                ModuleItem::Stmt(Stmt::Decl(decl)) => decl_names(decl),
                ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => decl_names(&export.decl),
                _ => Vec::new(),
            })
            .map(|ident| ident.sym.to_string())
            .collect()
    }

    #[test]
    fn test_decl_names() {
        let source = r#"
declare class A {}
export declare function b(): void;
declare const c: number, d: string;
interface E {}
type F = E;
declare enum G { X }
declare namespace H {}
declare module "i" {}
declare global {}
"#;
        assert_eq!(names_of(source), vec!["A", "b", "c", "d", "E", "F", "G", "H"]);
    }

    #[test]
    fn test_import_bindings() {
        let source = "import D, { a, b as c, default as e } from 'm';\nimport * as ns from 'n';\n";
        let parsed = parse_module("imports.d.ts", source, Dialect::Declaration).unwrap();
        let bindings: Vec<ImportBinding> = parsed
            .module
            .body
            .iter()
            .filter_map(|item| match item {
                ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => Some(import),
                _ => None,
            })
            .flat_map(|import| import.specifiers.iter().map(import_binding))
            .collect();

        assert_eq!(
            bindings,
            vec![
                ImportBinding::Default { local: "D".into() },
                ImportBinding::Named {
                    imported: "a".into(),
                    local: "a".into()
                },
                ImportBinding::Named {
                    imported: "b".into(),
                    local: "c".into()
                },
                ImportBinding::Default { local: "e".into() },
                ImportBinding::Namespace { local: "ns".into() },
            ]
        );
    }
}
