//! Removal of declarations whose doc comment carries a configured tag.

use crate::lists::{remove_list_items, ListEdit};
use crate::tags::TagSet;
use crate::TransformError;
use dts_syntax::ast::{
    Class, ClassMember, Decl, DefaultDecl, Expr, Key, Lit, ModuleDecl, ModuleItem, Pat,
    PropName, Stmt, TsEnumMemberId, TsNamespaceBody, TsType, TsTypeElement,
    TsUnionOrIntersectionType,
};
use dts_syntax::swc_common::Spanned;
use dts_syntax::{
    decl_names, export_name, extend_over_line_break, extend_over_terminator, str_value,
    ParsedModule,
};
use std::collections::BTreeSet;
use std::ops::Range;
use text_edit::EditBuffer;

/// Result of one removal pass.
#[derive(Debug)]
pub(crate) struct Removal {
    pub code: String,
    pub changed: bool,
    /// Top-level names whose declaration was removed.
    pub removed: BTreeSet<String>,
}

/// Removes tagged declarations and the export specifiers that named them.
pub(crate) fn remove_tagged(
    parsed: &ParsedModule<'_>,
    tags: &TagSet,
) -> Result<Removal, TransformError> {
    let mut pass = TagRemoval {
        parsed,
        tags,
        buffer: EditBuffer::new(parsed.source),
        removed: BTreeSet::new(),
        kept: BTreeSet::new(),
    };
    pass.visit_items(&parsed.module.body, true)?;
    // An overload or merged declaration that survives keeps the name exported.
    pass.removed.retain(|name| !pass.kept.contains(name));
    pass.prune_exports()?;

    Ok(Removal {
        code: pass.buffer.finish(),
        changed: pass.buffer.has_changes(),
        removed: pass.removed,
    })
}

struct TagRemoval<'a, 'src> {
    parsed: &'a ParsedModule<'src>,
    tags: &'a TagSet,
    buffer: EditBuffer<'src>,
    removed: BTreeSet<String>,
    /// Top-level names with at least one declaration left in place.
    kept: BTreeSet<String>,
}

impl<'a, 'src> TagRemoval<'a, 'src> {
    /// `top_level` items record their names for export pruning; items nested
    /// in a namespace do not.
    fn visit_items(&mut self, items: &[ModuleItem], top_level: bool) -> Result<(), TransformError> {
        for item in items {
            let span = self.parsed.range(item.span());
            match item {
                ModuleItem::Stmt(Stmt::Decl(decl)) => self.visit_decl(decl, span, top_level)?,
                ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                    self.visit_decl(&export.decl, span, top_level)?
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(default)) => {
                    let name = match &default.decl {
                        DefaultDecl::Class(class) => class.ident.as_ref().map(|i| i.sym.to_string()),
                        DefaultDecl::Fn(func) => func.ident.as_ref().map(|i| i.sym.to_string()),
                        DefaultDecl::TsInterfaceDecl(interface) => Some(interface.id.sym.to_string()),
                    };
                    let removed = self.try_remove(span, name.as_deref())?;
                    if let (Some(name), true) = (name, top_level) {
                        if removed {
                            self.removed.insert(name);
                        } else {
                            self.kept.insert(name);
                        }
                    }
                    if removed {
                        continue;
                    }
                    match &default.decl {
                        DefaultDecl::Class(class) => self.visit_class(&class.class)?,
                        DefaultDecl::TsInterfaceDecl(interface) => {
                            self.visit_type_elements(&interface.body.body)?
                        }
                        DefaultDecl::Fn(_) => {}
                    }
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(_)) => {
                    self.try_remove(span, None)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn visit_decl(
        &mut self,
        decl: &Decl,
        span: Range<usize>,
        top_level: bool,
    ) -> Result<(), TransformError> {
        if let Some((comment_start, tag)) = self.tag_at(span.start) {
            let names: Vec<String> = decl_names(decl)
                .into_iter()
                .map(|ident| ident.sym.to_string())
                .collect();
            if matches!(decl, Decl::Var(_)) && names.len() > 1 {
                return Err(TransformError::DuplicateDeclarator { names });
            }
            self.remove(comment_start, span.end, &tag, names.first().map(String::as_str))?;
            if top_level {
                self.removed.extend(names);
            }
            return Ok(());
        }
        if top_level {
            self.kept
                .extend(decl_names(decl).into_iter().map(|ident| ident.sym.to_string()));
        }

        match decl {
            Decl::Class(class) => self.visit_class(&class.class),
            Decl::TsInterface(interface) => self.visit_type_elements(&interface.body.body),
            Decl::TsEnum(ts_enum) => {
                for member in &ts_enum.members {
                    let name = match &member.id {
                        TsEnumMemberId::Ident(ident) => ident.sym.to_string(),
                        TsEnumMemberId::Str(s) => str_value(s),
                    };
                    self.try_remove(self.parsed.range(member.span), Some(name.as_str()))?;
                }
                Ok(())
            }
            Decl::TsTypeAlias(alias) => {
                self.walk_type(&alias.type_ann)?;
                if let Some(params) = &alias.type_params {
                    for param in &params.params {
                        if let Some(constraint) = &param.constraint {
                            self.walk_type(constraint)?;
                        }
                    }
                }
                Ok(())
            }
            Decl::Var(var) => {
                for declarator in &var.decls {
                    if let Pat::Ident(binding) = &declarator.name {
                        if let Some(ann) = &binding.type_ann {
                            self.walk_type(&ann.type_ann)?;
                        }
                    }
                }
                Ok(())
            }
            Decl::TsModule(module) => match &module.body {
                Some(TsNamespaceBody::TsModuleBlock(block)) => self.visit_items(&block.body, false),
                _ => Ok(()),
            },
            Decl::Fn(_) | Decl::Using(_) => Ok(()),
        }
    }

    fn visit_class(&mut self, class: &Class) -> Result<(), TransformError> {
        for member in &class.body {
            let name = match member {
                ClassMember::Constructor(_) => Some("constructor".to_string()),
                ClassMember::Method(method) => prop_name(&method.key),
                ClassMember::PrivateMethod(method) => Some(format!("#{}", method.key.name)),
                ClassMember::ClassProp(prop) => prop_name(&prop.key),
                ClassMember::PrivateProp(prop) => Some(format!("#{}", prop.key.name)),
                ClassMember::AutoAccessor(accessor) => match &accessor.key {
                    Key::Private(private) => Some(format!("#{}", private.name)),
                    Key::Public(key) => prop_name(key),
                },
                ClassMember::TsIndexSignature(_) => None,
                ClassMember::Empty(_) | ClassMember::StaticBlock(_) => continue,
            };
            let removed = self.try_remove(self.parsed.range(member.span()), name.as_deref())?;
            if !removed {
                if let ClassMember::ClassProp(prop) = member {
                    if let Some(ann) = &prop.type_ann {
                        self.walk_type(&ann.type_ann)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn visit_type_elements(&mut self, elements: &[TsTypeElement]) -> Result<(), TransformError> {
        for element in elements {
            let name = match element {
                TsTypeElement::TsPropertySignature(prop) => key_name(&prop.key, prop.computed),
                TsTypeElement::TsMethodSignature(method) => key_name(&method.key, method.computed),
                TsTypeElement::TsGetterSignature(getter) => key_name(&getter.key, getter.computed),
                TsTypeElement::TsSetterSignature(setter) => key_name(&setter.key, setter.computed),
                TsTypeElement::TsCallSignatureDecl(_)
                | TsTypeElement::TsConstructSignatureDecl(_)
                | TsTypeElement::TsIndexSignature(_) => None,
            };
            let removed = self.try_remove(self.parsed.range(element.span()), name.as_deref())?;
            if !removed {
                if let TsTypeElement::TsPropertySignature(prop) = element {
                    if let Some(ann) = &prop.type_ann {
                        self.walk_type(&ann.type_ann)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn walk_type(&mut self, ty: &TsType) -> Result<(), TransformError> {
        match ty {
            TsType::TsTypeLit(lit) => self.visit_type_elements(&lit.members),
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union)) => {
                self.visit_type_list(&union.types)
            }
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsIntersectionType(
                intersection,
            )) => self.visit_type_list(&intersection.types),
            TsType::TsArrayType(array) => self.walk_type(&array.elem_type),
            TsType::TsParenthesizedType(paren) => self.walk_type(&paren.type_ann),
            TsType::TsTypeRef(reference) => match &reference.type_params {
                Some(args) => self.visit_type_list(&args.params),
                None => Ok(()),
            },
            TsType::TsTupleType(tuple) => {
                for element in &tuple.elem_types {
                    self.walk_type(&element.ty)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Members of unions, intersections and type argument lists carry no
    /// name, so tagged ones are deleted together with one separator.
    fn visit_type_list(&mut self, types: &[Box<TsType>]) -> Result<(), TransformError> {
        let mut ranges = Vec::with_capacity(types.len());
        let mut marked = Vec::with_capacity(types.len());
        for ty in types {
            let span = self.parsed.range(ty.span());
            let leading = self.parsed.leading_comments(span.start);
            let start = leading.first().map_or(span.start, |c| c.range.start);
            marked.push(leading.iter().any(|c| self.tags.find(&c.text).is_some()));
            ranges.push(start..span.end);
        }

        match remove_list_items(&mut self.buffer, &ranges, &marked)? {
            ListEdit::Emptied => {
                let (Some(first), Some(last)) = (ranges.first(), ranges.last()) else {
                    return Ok(());
                };
                self.buffer.overwrite(first.start, last.end, "never")?;
            }
            ListEdit::Pruned | ListEdit::Unchanged => {
                for (ty, marked) in types.iter().zip(&marked) {
                    if !marked {
                        self.walk_type(ty)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Second pass: drop export specifiers of removed declarations.
    fn prune_exports(&mut self) -> Result<(), TransformError> {
        if self.removed.is_empty() {
            return Ok(());
        }
        let parsed = self.parsed;
        for item in &parsed.module.body {
            let ModuleItem::ModuleDecl(decl) = item else {
                continue;
            };
            let span = parsed.range(item.span());
            match decl {
                ModuleDecl::ExportNamed(named) if named.src.is_none() => {
                    let mut ranges = Vec::with_capacity(named.specifiers.len());
                    let mut marked = Vec::with_capacity(named.specifiers.len());
                    for specifier in &named.specifiers {
                        ranges.push(self.parsed.range(specifier.span()));
                        marked.push(match specifier {
                            dts_syntax::ast::ExportSpecifier::Named(named) => {
                                self.removed.contains(&export_name(&named.orig))
                            }
                            _ => false,
                        });
                    }
                    if remove_list_items(&mut self.buffer, &ranges, &marked)? == ListEdit::Emptied
                    {
                        self.remove_statement(span)?;
                    }
                }
                ModuleDecl::ExportDefaultExpr(default) => {
                    if let Expr::Ident(ident) = &*default.expr {
                        if self.removed.contains(&*ident.sym) {
                            self.remove_statement(span)?;
                        }
                    }
                }
                ModuleDecl::TsExportAssignment(assignment) => {
                    if let Expr::Ident(ident) = &*assignment.expr {
                        if self.removed.contains(&*ident.sym) {
                            self.remove_statement(span)?;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// The start of the first tagged comment in front of `pos`, and its tag.
    fn tag_at(&self, pos: usize) -> Option<(usize, String)> {
        self.parsed
            .leading_comments(pos)
            .into_iter()
            .find_map(|comment| {
                self.tags
                    .find(&comment.text)
                    .map(|tag| (comment.range.start, tag.to_string()))
            })
    }

    fn try_remove(&mut self, span: Range<usize>, name: Option<&str>) -> Result<bool, TransformError> {
        match self.tag_at(span.start) {
            Some((comment_start, tag)) => {
                self.remove(comment_start, span.end, &tag, name)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Named declarations leave a marker so line positions below stay put;
    /// anonymous ones are deleted with their line.
    fn remove(
        &mut self,
        start: usize,
        end: usize,
        tag: &str,
        name: Option<&str>,
    ) -> Result<(), TransformError> {
        let source = self.parsed.source;
        let end = extend_over_terminator(source, end);
        match name {
            Some(name) => self
                .buffer
                .overwrite(start, end, format!("/* removed {tag}: {name} */"))?,
            None => self
                .buffer
                .remove(start, extend_over_line_break(source, end))?,
        }
        Ok(())
    }

    fn remove_statement(&mut self, span: Range<usize>) -> Result<(), TransformError> {
        let end = extend_over_line_break(self.parsed.source, span.end);
        self.buffer.remove(span.start, end)?;
        Ok(())
    }
}

fn prop_name(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => Some(str_value(s)),
        PropName::Num(num) => Some(num.value.to_string()),
        PropName::Computed(_) | PropName::BigInt(_) => None,
    }
}

fn key_name(key: &Expr, computed: bool) -> Option<String> {
    if computed {
        return None;
    }
    match key {
        Expr::Ident(ident) => Some(ident.sym.to_string()),
        Expr::Lit(Lit::Str(s)) => Some(str_value(s)),
        Expr::Lit(Lit::Num(num)) => Some(num.value.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dts_syntax::{parse_module, Dialect};
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> Result<Removal, TransformError> {
        let tags = TagSet::new(&["internal".to_string()])?;
        let parsed = parse_module("types.d.ts", source, Dialect::TypeScript)?;
        remove_tagged(&parsed, &tags)
    }

    #[test]
    fn test_named_declaration_leaves_marker() {
        let out = run("/** @internal */\nexport declare class A {}\nexport declare class B {}\n")
            .unwrap();
        assert_eq!(
            out.code,
            "/* removed internal: A */\nexport declare class B {}\n"
        );
        assert!(out.removed.contains("A"));
    }

    #[test]
    fn test_member_with_terminator() {
        let out = run("interface A {\n  /** @internal */\n  a: string;\n  b: number;\n}\n").unwrap();
        assert_eq!(
            out.code,
            "interface A {\n  /* removed internal: a */\n  b: number;\n}\n"
        );
        assert!(out.removed.is_empty());
    }

    #[test]
    fn test_union_member_takes_separator() {
        let out = run("type A = B | /** @internal */ { x: 1 } | C;\n").unwrap();
        assert_eq!(out.code, "type A = B | C;\n");
    }

    #[test]
    fn test_export_specifiers_pruned() {
        let source = "export { A, B, C };\n/** @internal */\ndeclare class B {}\n/** @internal */\ndeclare class C {}\n";
        let out = run(source).unwrap();
        assert_eq!(
            out.code,
            "export { A };\n/* removed internal: B */\n/* removed internal: C */\n"
        );
    }

    #[test]
    fn test_emptied_export_clause_is_removed() {
        let source = "/** @internal */\ndeclare const a: 1;\nexport { a };\n";
        let out = run(source).unwrap();
        assert_eq!(out.code, "/* removed internal: a */\n");
    }

    #[test]
    fn test_remaining_overload_keeps_the_export() {
        let source = "/** @internal */\ndeclare function f(a: string): void;\ndeclare function f(a: number): void;\nexport { f };\n";
        let out = run(source).unwrap();
        assert_eq!(
            out.code,
            "/* removed internal: f */\ndeclare function f(a: number): void;\nexport { f };\n"
        );
        assert!(out.removed.is_empty());
    }

    #[test]
    fn test_duplicate_declarator_is_fatal() {
        let err = run("/** @internal */\ndeclare const a: 1, b: 2;\n").unwrap_err();
        assert!(matches!(
            err,
            TransformError::DuplicateDeclarator { ref names } if names == &["a", "b"]
        ));
    }

    #[test]
    fn test_untagged_source_is_unchanged() {
        let source = "/** Public. */\nexport declare function f(): void;\n";
        let out = run(source).unwrap();
        assert!(!out.changed);
        assert_eq!(out.code, source);
    }
}
