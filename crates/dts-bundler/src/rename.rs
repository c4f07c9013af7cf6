//! Collection of the identifier references a bundle may need to rename.

use dts_syntax::ast::{
    Class, Function, Ident, ModuleItem, Param, Pat, Stmt, TsCallSignatureDecl,
    TsConditionalType, TsConstructSignatureDecl, TsConstructorType, TsEntityName, TsEnumMember,
    TsFnParam, TsFnType, TsGetterSignature, TsImportType, TsInferType, TsInterfaceDecl,
    TsMappedType, TsMethodSignature, TsModuleDecl, TsModuleName, TsNamespaceBody,
    TsParamProp, TsParamPropParam, TsPropertySignature, TsSetterSignature, TsTypeAliasDecl,
    TsTypeParamDecl,
};
use dts_syntax::{decl_names, str_value};
use dts_syntax::visit::{Visit, VisitWith};
use dts_syntax::ParsedModule;
use std::ops::Range;

/// An identifier that refers to a module-level binding, unless shadowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Occurrence {
    pub range: Range<usize>,
    pub name: String,
}

/// An `import("...")` type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportTypeRef {
    /// From `import` to the end of the first qualifier segment, or to the
    /// closing parenthesis when there is no qualifier.
    pub range: Range<usize>,
    pub specifier: String,
    /// The first qualifier segment: the name imported from the module.
    pub member: Option<String>,
}

/// Walks kept items and records the identifiers that may need renaming.
///
/// Property keys, enum member names, the right side of qualified names,
/// parameter names and type parameters are not references to module-level
/// bindings and are skipped.
pub(crate) struct ReferenceCollector<'a, 'src> {
    parsed: &'a ParsedModule<'src>,
    shadowed: Vec<Vec<String>>,
    pub occurrences: Vec<Occurrence>,
    pub import_types: Vec<ImportTypeRef>,
}

impl<'a, 'src> ReferenceCollector<'a, 'src> {
    pub fn new(parsed: &'a ParsedModule<'src>) -> Self {
        Self {
            parsed,
            shadowed: Vec::new(),
            occurrences: Vec::new(),
            import_types: Vec::new(),
        }
    }

    fn is_shadowed(&self, name: &str) -> bool {
        self.shadowed.iter().any(|scope| scope.iter().any(|n| n == name))
    }

    fn scoped(&mut self, names: Vec<String>, f: impl FnOnce(&mut Self)) {
        self.shadowed.push(names);
        f(self);
        self.shadowed.pop();
    }

    fn pat_annotations(&mut self, pat: &Pat) {
        match pat {
            Pat::Ident(binding) => binding.type_ann.visit_with(self),
            Pat::Array(array) => array.type_ann.visit_with(self),
            Pat::Object(object) => object.type_ann.visit_with(self),
            Pat::Rest(rest) => {
                rest.type_ann.visit_with(self);
                self.pat_annotations(&rest.arg);
            }
            Pat::Assign(assign) => self.pat_annotations(&assign.left),
            Pat::Invalid(_) | Pat::Expr(_) => {}
        }
    }
}

fn type_param_names(params: Option<&TsTypeParamDecl>) -> Vec<String> {
    params
        .map(|decl| decl.params.iter().map(|p| p.name.sym.to_string()).collect())
        .unwrap_or_default()
}

fn block_names(items: &[ModuleItem]) -> Vec<String> {
    let mut names = Vec::new();
    for item in items {
        let decl = match item {
            ModuleItem::Stmt(Stmt::Decl(decl)) => decl,
            ModuleItem::ModuleDecl(dts_syntax::ast::ModuleDecl::ExportDecl(export)) => &export.decl,
            _ => continue,
        };
        names.extend(decl_names(decl).into_iter().map(|ident| ident.sym.to_string()));
    }
    names
}

fn entity_head(name: &TsEntityName) -> &Ident {
    match name {
        TsEntityName::Ident(ident) => ident,
        TsEntityName::TsQualifiedName(qualified) => entity_head(&qualified.left),
    }
}

impl Visit for ReferenceCollector<'_, '_> {
    fn visit_ident(&mut self, ident: &Ident) {
        if self.is_shadowed(&ident.sym) {
            return;
        }
        self.occurrences.push(Occurrence {
            range: self.parsed.range(ident.span),
            name: ident.sym.to_string(),
        });
    }

    fn visit_ts_import_type(&mut self, node: &TsImportType) {
        let start = self.parsed.start(node);
        let arg_end = self.parsed.end(&node.arg);
        let (end, member) = match &node.qualifier {
            Some(qualifier) => {
                let head = entity_head(qualifier);
                (self.parsed.end(head), Some(head.sym.to_string()))
            }
            None => {
                let rest = &self.parsed.source[arg_end..];
                (arg_end + rest.find(')').map_or(0, |idx| idx + 1), None)
            }
        };
        self.import_types.push(ImportTypeRef {
            range: start..end,
            specifier: str_value(&node.arg),
            member,
        });
        node.type_args.visit_with(self);
    }

    fn visit_ts_property_signature(&mut self, node: &TsPropertySignature) {
        if node.computed {
            node.key.visit_with(self);
        }
        node.type_ann.visit_with(self);
    }

    fn visit_ts_method_signature(&mut self, node: &TsMethodSignature) {
        if node.computed {
            node.key.visit_with(self);
        }
        self.scoped(type_param_names(node.type_params.as_deref()), |v| {
            node.type_params.visit_with(v);
            node.params.visit_with(v);
            node.type_ann.visit_with(v);
        });
    }

    fn visit_ts_getter_signature(&mut self, node: &TsGetterSignature) {
        if node.computed {
            node.key.visit_with(self);
        }
        node.type_ann.visit_with(self);
    }

    fn visit_ts_setter_signature(&mut self, node: &TsSetterSignature) {
        if node.computed {
            node.key.visit_with(self);
        }
        node.param.visit_with(self);
    }

    fn visit_ts_enum_member(&mut self, node: &TsEnumMember) {
        node.init.visit_with(self);
    }

    fn visit_param(&mut self, node: &Param) {
        node.decorators.visit_with(self);
        self.pat_annotations(&node.pat);
    }

    fn visit_ts_fn_param(&mut self, node: &TsFnParam) {
        match node {
            TsFnParam::Ident(binding) => binding.type_ann.visit_with(self),
            TsFnParam::Array(array) => array.type_ann.visit_with(self),
            TsFnParam::Rest(rest) => {
                rest.type_ann.visit_with(self);
                self.pat_annotations(&rest.arg);
            }
            TsFnParam::Object(object) => object.type_ann.visit_with(self),
        }
    }

    fn visit_ts_param_prop(&mut self, node: &TsParamProp) {
        match &node.param {
            TsParamPropParam::Ident(binding) => binding.type_ann.visit_with(self),
            TsParamPropParam::Assign(assign) => self.pat_annotations(&assign.left),
        }
    }

    fn visit_ts_type_alias_decl(&mut self, node: &TsTypeAliasDecl) {
        node.id.visit_with(self);
        self.scoped(type_param_names(node.type_params.as_deref()), |v| {
            node.type_params.visit_with(v);
            node.type_ann.visit_with(v);
        });
    }

    fn visit_ts_interface_decl(&mut self, node: &TsInterfaceDecl) {
        node.id.visit_with(self);
        self.scoped(type_param_names(node.type_params.as_deref()), |v| {
            node.type_params.visit_with(v);
            node.extends.visit_with(v);
            node.body.visit_with(v);
        });
    }

    fn visit_class(&mut self, node: &Class) {
        self.scoped(type_param_names(node.type_params.as_deref()), |v| {
            node.visit_children_with(v)
        });
    }

    fn visit_function(&mut self, node: &Function) {
        self.scoped(type_param_names(node.type_params.as_deref()), |v| {
            node.visit_children_with(v)
        });
    }

    fn visit_ts_fn_type(&mut self, node: &TsFnType) {
        self.scoped(type_param_names(node.type_params.as_deref()), |v| {
            node.visit_children_with(v)
        });
    }

    fn visit_ts_constructor_type(&mut self, node: &TsConstructorType) {
        self.scoped(type_param_names(node.type_params.as_deref()), |v| {
            node.visit_children_with(v)
        });
    }

    fn visit_ts_call_signature_decl(&mut self, node: &TsCallSignatureDecl) {
        self.scoped(type_param_names(node.type_params.as_deref()), |v| {
            node.visit_children_with(v)
        });
    }

    fn visit_ts_construct_signature_decl(&mut self, node: &TsConstructSignatureDecl) {
        self.scoped(type_param_names(node.type_params.as_deref()), |v| {
            node.visit_children_with(v)
        });
    }

    fn visit_ts_mapped_type(&mut self, node: &TsMappedType) {
        self.scoped(vec![node.type_param.name.sym.to_string()], |v| {
            node.visit_children_with(v)
        });
    }

    fn visit_ts_conditional_type(&mut self, node: &TsConditionalType) {
        struct Infers(Vec<String>);
        impl Visit for Infers {
            fn visit_ts_infer_type(&mut self, node: &TsInferType) {
                self.0.push(node.type_param.name.sym.to_string());
                node.visit_children_with(self);
            }
        }
        let mut infers = Infers(Vec::new());
        node.extends_type.visit_with(&mut infers);

        node.check_type.visit_with(self);
        self.scoped(infers.0, |v| {
            node.extends_type.visit_with(v);
            node.true_type.visit_with(v);
        });
        node.false_type.visit_with(self);
    }

    fn visit_ts_module_decl(&mut self, node: &TsModuleDecl) {
        if let TsModuleName::Ident(ident) = &node.id {
            if !node.global {
                self.visit_ident(ident);
            }
        }
        let mut body = node.body.as_ref();
        let mut names = Vec::new();
        while let Some(TsNamespaceBody::TsNamespaceDecl(inner)) = body {
            names.push(inner.id.sym.to_string());
            body = Some(&*inner.body);
        }
        if let Some(TsNamespaceBody::TsModuleBlock(block)) = body {
            names.extend(block_names(&block.body));
            self.scoped(names, |v| block.body.visit_with(v));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dts_syntax::{parse_module, Dialect};
    use pretty_assertions::assert_eq;

    fn names(source: &str) -> Vec<String> {
        let parsed = parse_module("a.d.ts", source, Dialect::Declaration).unwrap();
        let mut collector = ReferenceCollector::new(&parsed);
        parsed.module.visit_with(&mut collector);
        collector.occurrences.into_iter().map(|o| o.name).collect()
    }

    #[test]
    fn test_keys_and_params_are_skipped() {
        let found = names(
            "interface A extends B { key: C; method(arg: D): E; }\nenum F { G = 1 }\ndeclare function f(p: H): void;\n",
        );
        assert_eq!(found, vec!["A", "B", "C", "D", "E", "F", "f", "H"]);
    }

    #[test]
    fn test_type_parameters_shadow() {
        let found = names("type Box<T> = { value: T; other: U };\ntype M = { [K in keyof N]: K };\n");
        assert_eq!(found, vec!["Box", "U", "M", "N"]);
    }

    #[test]
    fn test_infer_is_scoped_to_true_branch() {
        let found = names("type R<X> = X extends Promise<infer V> ? V : V;\n");
        assert_eq!(found, vec!["R", "Promise", "V"]);
    }

    #[test]
    fn test_qualified_names_keep_their_head() {
        let found = names("declare const a: ns.Inner.Type;\n");
        assert_eq!(found, vec!["a", "ns"]);
    }

    #[test]
    fn test_namespace_members_are_local() {
        let found = names("declare namespace NS { interface Inner {} const x: Inner | Outer; }\n");
        assert_eq!(found, vec!["NS", "Outer"]);
    }

    #[test]
    fn test_import_types() {
        let source = "declare const a: import('./b').Foo.Bar<Baz>;\ndeclare const c: typeof import('./d');\n";
        let parsed = parse_module("a.d.ts", source, Dialect::Declaration).unwrap();
        let mut collector = ReferenceCollector::new(&parsed);
        parsed.module.visit_with(&mut collector);

        let refs: Vec<_> = collector
            .import_types
            .iter()
            .map(|r| (&source[r.range.clone()], r.specifier.as_str(), r.member.as_deref()))
            .collect();
        assert_eq!(
            refs,
            vec![
                ("import('./b').Foo", "./b", Some("Foo")),
                ("import('./d')", "./d", None),
            ]
        );
        let names: Vec<_> = collector.occurrences.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["a", "Baz", "c"]);
    }
}
