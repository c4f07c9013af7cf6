//! In-process declaration emission without type information.
//!
//! Declarations are produced by rewriting the source in place: bodies and
//! initialisers are dropped, `declare` is added and statements disappear.
//! Anything whose type would need inference beyond literals and explicit
//! annotations is reported instead of guessed.

use crate::diagnostic::Diagnostic;
use crate::emitter::{DeclarationEmitter, EmitReport, EmitRequest};
use crate::error::TscError;
use crate::process::{clear_output, collect_files, write_declaration};
use crate::unit::CheckUnit;
use camino::Utf8PathBuf;
use dts_syntax::ast::{
    Accessibility, Callee, Class, ClassMember, Decl, DefaultDecl, Expr, Function, Lit, MethodKind,
    ModuleDecl, ModuleExportName, ModuleItem, ParamOrTsParamProp, Pat, Stmt, TsModuleDecl,
    TsNamespaceBody, TsParamPropParam, TsTypeAnn, TsTypeParamDecl, UnaryOp, VarDeclKind,
};
use dts_syntax::swc_common::Spanned;
use dts_syntax::{
    decl_names, extend_over_line_break, extend_over_terminator, parse_module, Dialect,
    ParsedModule,
};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use text_edit::{ByteOffset, EditBuffer, LineIndex};
use tracing::debug;

/// The source does not parse.
pub const SYNTAX_ERROR: &str = "LT9001";
/// A function, parameter or accessor lacks a type annotation.
pub const MISSING_ANNOTATION: &str = "LT9002";
/// A declaration shape that cannot be expressed without type information.
pub const UNSUPPORTED: &str = "LT9003";
/// A variable or default export whose type cannot be read off its initialiser.
pub const CANNOT_INFER: &str = "LT9004";

/// A problem found while writing declarations, at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub offset: usize,
    pub code: &'static str,
    pub message: String,
}

impl Issue {
    fn new(offset: usize, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            offset,
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IsolatedEmitter;

impl IsolatedEmitter {
    pub fn new() -> Self {
        Self
    }
}

/// What became of one unit, by index into the request.
enum Outcome {
    Declaration(usize, String),
    Copy(usize),
    Rejected(Vec<Diagnostic>),
    Skipped,
}

impl DeclarationEmitter for IsolatedEmitter {
    async fn emit(&self, request: &EmitRequest) -> Result<EmitReport, TscError> {
        let outcomes: Vec<Outcome> = request
            .units
            .par_iter()
            .enumerate()
            .map(|(idx, unit)| emit_unit(idx, unit))
            .collect::<Result<_, TscError>>()?;

        let mut diagnostics = Vec::new();
        let mut declarations = Vec::new();
        let mut copies = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Declaration(idx, text) => declarations.push((idx, text)),
                Outcome::Copy(idx) => copies.push(idx),
                Outcome::Rejected(found) => diagnostics.extend(found),
                Outcome::Skipped => {}
            }
        }
        if !diagnostics.is_empty() {
            diagnostics.sort_by(|a, b| (&a.file, a.line, a.column).cmp(&(&b.file, b.line, b.column)));
            return Err(TscError::Diagnostics(diagnostics));
        }
        if request.no_emit {
            return Ok(EmitReport::default());
        }

        clear_output(&request.out_dir)?;
        for (idx, text) in declarations {
            let target = request.output_path(&request.units[idx]);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(TscError::io(parent))?;
            }
            std::fs::write(&target, text).map_err(TscError::io(&target))?;
        }
        for idx in copies {
            write_declaration(request, &request.units[idx])?;
        }

        let files: Vec<Utf8PathBuf> = collect_files(&request.out_dir);
        debug!(files = files.len(), "isolated declarations written");
        Ok(EmitReport {
            files,
            warnings: Vec::new(),
        })
    }
}

fn emit_unit(idx: usize, unit: &CheckUnit) -> Result<Outcome, TscError> {
    if unit.is_declaration() {
        return Ok(Outcome::Copy(idx));
    }
    let dialect = match unit.path.extension() {
        Some("ts" | "mts" | "cts" | "js" | "mjs" | "cjs") => Dialect::TypeScript,
        Some("tsx" | "jsx") => Dialect::Tsx,
        _ => return Ok(Outcome::Skipped),
    };
    let source = unit.read()?;
    match emit_declaration(unit.path.as_str(), &source, dialect) {
        Ok(text) => Ok(Outcome::Declaration(idx, text)),
        Err(issues) => {
            let index = LineIndex::new(&source);
            let diagnostics = issues
                .into_iter()
                .map(|issue| {
                    let (line, column) = index
                        .line_col(ByteOffset::from(issue.offset as u32))
                        .map_or((1, 1), |pos| pos.one_based());
                    Diagnostic::error(
                        unit.original_path.clone(),
                        unit.original_position(line, column),
                        issue.code,
                        issue.message,
                    )
                })
                .collect();
            Ok(Outcome::Rejected(diagnostics))
        }
    }
}

/// Writes the declaration text of one typed source.
pub fn emit_declaration(
    file_name: &str,
    source: &str,
    dialect: Dialect,
) -> Result<String, Vec<Issue>> {
    let parsed = parse_module(file_name, source, dialect)
        .map_err(|err| vec![Issue::new(err.offset, SYNTAX_ERROR, err.message)])?;
    let mut writer = DeclarationWriter::new(&parsed);
    writer.write();
    if writer.issues.is_empty() {
        let mut text = writer.buffer.finish();
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    } else {
        Err(writer.issues)
    }
}

/// What happens to one declaration.
enum Rendered {
    Keep,
    Replace(String),
    Remove,
}

struct DeclarationWriter<'a, 'src> {
    parsed: &'a ParsedModule<'src>,
    buffer: EditBuffer<'src>,
    issues: Vec<Issue>,
    /// Locals exported through `export { name }` or `export default name`.
    exported_locals: FxHashSet<String>,
    /// Functions declared with overload signatures.
    overloaded: FxHashSet<String>,
}

impl<'a, 'src> DeclarationWriter<'a, 'src> {
    fn new(parsed: &'a ParsedModule<'src>) -> Self {
        let mut exported_locals = FxHashSet::default();
        let mut overloaded = FxHashSet::default();
        for item in &parsed.module.body {
            match item {
                ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(export)) if export.src.is_none() => {
                    for specifier in &export.specifiers {
                        if let dts_syntax::ast::ExportSpecifier::Named(named) = specifier {
                            if let ModuleExportName::Ident(ident) = &named.orig {
                                exported_locals.insert(ident.sym.to_string());
                            }
                        }
                    }
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(export)) => {
                    if let Expr::Ident(ident) = &*export.expr {
                        exported_locals.insert(ident.sym.to_string());
                    }
                }
                ModuleItem::ModuleDecl(ModuleDecl::TsExportAssignment(export)) => {
                    if let Expr::Ident(ident) = &*export.expr {
                        exported_locals.insert(ident.sym.to_string());
                    }
                }
                _ => {}
            }
            let decl = match item {
                ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => &export.decl,
                ModuleItem::Stmt(Stmt::Decl(decl)) => decl,
                _ => continue,
            };
            if let Decl::Fn(function) = decl {
                if function.function.body.is_none() {
                    overloaded.insert(function.ident.sym.to_string());
                }
            }
        }

        Self {
            parsed,
            buffer: EditBuffer::new(parsed.source),
            issues: Vec::new(),
            exported_locals,
            overloaded,
        }
    }

    fn write(&mut self) {
        let parsed = self.parsed;
        for item in &parsed.module.body {
            match item {
                ModuleItem::ModuleDecl(decl) => self.module_decl(item, decl),
                ModuleItem::Stmt(Stmt::Decl(decl)) => {
                    let exported = decl_names(decl)
                        .iter()
                        .any(|ident| self.exported_locals.contains(&*ident.sym));
                    let start = self.decl_start(decl);
                    let rendered = self.render_decl(decl);
                    self.apply(rendered, start, parsed.end(item), exported);
                }
                ModuleItem::Stmt(_) => self.remove(parsed.start(item), parsed.end(item)),
            }
        }
    }

    fn module_decl(&mut self, item: &ModuleItem, decl: &ModuleDecl) {
        let parsed = self.parsed;
        match decl {
            ModuleDecl::ExportDecl(export) => {
                let start = skip_keyword(parsed.source, parsed.start(export), "export");
                match self.render_decl(&export.decl) {
                    Ok(Rendered::Remove) => self.remove(parsed.start(item), parsed.end(item)),
                    rendered => self.apply(rendered, start, parsed.end(export), true),
                }
            }
            ModuleDecl::ExportDefaultDecl(export) => {
                let start = skip_keyword(
                    parsed.source,
                    skip_keyword(parsed.source, parsed.start(export), "export"),
                    "default",
                );
                let rendered = match &export.decl {
                    DefaultDecl::Class(class) => {
                        let name = class.ident.as_ref().map(|ident| ident.sym.to_string());
                        self.render_class(name.as_deref(), &class.class, "")
                            .map(Rendered::Replace)
                    }
                    DefaultDecl::Fn(function) => {
                        let name = function.ident.as_ref().map(|ident| ident.sym.to_string());
                        self.render_function(name.as_deref().unwrap_or(""), &function.function, "")
                            .map(Rendered::Replace)
                    }
                    DefaultDecl::TsInterfaceDecl(_) => Ok(Rendered::Keep),
                };
                self.apply(rendered, start, parsed.end(export), true);
            }
            ModuleDecl::ExportDefaultExpr(export) => {
                if matches!(&*export.expr, Expr::Ident(_)) {
                    return;
                }
                match self.infer(&export.expr, true) {
                    Ok(ty) => self.overwrite(
                        parsed.start(export),
                        parsed.end(export),
                        format!("declare const _default: {ty};\nexport default _default;"),
                    ),
                    Err(issue) => self.issues.push(issue),
                }
            }
            _ => {}
        }
    }

    /// Applies a rendering to the declaration at `start..end`. Failures of
    /// declarations that are not exported drop the declaration instead.
    fn apply(
        &mut self,
        rendered: Result<Rendered, Issue>,
        start: usize,
        end: usize,
        exported: bool,
    ) {
        match rendered {
            Ok(Rendered::Keep) => {}
            Ok(Rendered::Replace(text)) => self.overwrite(start, end, text),
            Ok(Rendered::Remove) => self.remove(start, end),
            Err(issue) if exported => self.issues.push(issue),
            Err(_) => self.remove(start, end),
        }
    }

    fn overwrite(&mut self, start: usize, end: usize, text: String) {
        let end = extend_over_terminator(self.parsed.source, end);
        if let Err(err) = self.buffer.overwrite(start, end, text) {
            self.issues
                .push(Issue::new(start, UNSUPPORTED, err.to_string()));
        }
    }

    fn remove(&mut self, start: usize, end: usize) {
        let source = self.parsed.source;
        let end = extend_over_line_break(source, extend_over_terminator(source, end));
        if let Err(err) = self.buffer.remove(start, end) {
            self.issues
                .push(Issue::new(start, UNSUPPORTED, err.to_string()));
        }
    }

    /// Start of a declaration, including an `abstract` or `async` modifier
    /// its span may leave out.
    fn decl_start(&self, decl: &Decl) -> usize {
        let start = self.parsed.start(decl);
        let before = self.parsed.source[..start].trim_end();
        for keyword in ["abstract", "async"] {
            if let Some(head) = before.strip_suffix(keyword) {
                if !head.ends_with(|c: char| c.is_alphanumeric() || c == '_' || c == '$' || c == '.') {
                    return head.len();
                }
            }
        }
        start
    }

    fn text(&self, node: &impl Spanned) -> &'src str {
        self.parsed.text(node)
    }

    fn type_text(&self, ann: &TsTypeAnn) -> &'src str {
        self.text(&*ann.type_ann)
    }

    fn render_decl(&self, decl: &Decl) -> Result<Rendered, Issue> {
        match decl {
            Decl::Var(var) if var.declare => Ok(Rendered::Keep),
            Decl::Var(var) => {
                let kind = match var.kind {
                    VarDeclKind::Const => "const",
                    VarDeclKind::Let => "let",
                    VarDeclKind::Var => "var",
                };
                let mut declarators = Vec::new();
                for declarator in &var.decls {
                    let Pat::Ident(binding) = &declarator.name else {
                        return Err(Issue::new(
                            self.parsed.start(declarator),
                            UNSUPPORTED,
                            "destructuring declarations cannot be emitted without type information",
                        ));
                    };
                    let ty = match (&binding.type_ann, &declarator.init) {
                        (Some(ann), _) => self.type_text(ann).to_string(),
                        (None, Some(init)) => self.infer(init, kind == "const")?,
                        (None, None) => {
                            return Err(Issue::new(
                                self.parsed.start(declarator),
                                CANNOT_INFER,
                                format!("`{}` needs an explicit type annotation", binding.id.sym),
                            ))
                        }
                    };
                    declarators.push(format!("{}: {ty}", binding.id.sym));
                }
                Ok(Rendered::Replace(format!(
                    "declare {kind} {};",
                    declarators.join(", ")
                )))
            }
            Decl::Fn(function) if function.declare => Ok(Rendered::Keep),
            Decl::Fn(function) => {
                let name = function.ident.sym.to_string();
                if function.function.body.is_some() && self.overloaded.contains(&name) {
                    return Ok(Rendered::Remove);
                }
                self.render_function(&name, &function.function, "declare ")
                    .map(Rendered::Replace)
            }
            Decl::Class(class) if class.declare => Ok(Rendered::Keep),
            Decl::Class(class) => self
                .render_class(Some(&*class.ident.sym), &class.class, "declare ")
                .map(Rendered::Replace),
            Decl::TsInterface(_) | Decl::TsTypeAlias(_) => Ok(Rendered::Keep),
            Decl::TsEnum(ts_enum) if ts_enum.declare => Ok(Rendered::Keep),
            Decl::TsEnum(ts_enum) => Ok(Rendered::Replace(format!(
                "declare {}",
                self.text(&**ts_enum)
            ))),
            Decl::TsModule(module) if module.declare || module.global => Ok(Rendered::Keep),
            Decl::TsModule(module) => {
                if is_type_only_namespace(module) {
                    Ok(Rendered::Replace(format!("declare {}", self.text(&**module))))
                } else {
                    Err(Issue::new(
                        self.parsed.start(&**module),
                        UNSUPPORTED,
                        "namespaces containing values cannot be emitted without type information",
                    ))
                }
            }
            Decl::Using(_) => Ok(Rendered::Remove),
        }
    }

    fn render_function(
        &self,
        name: &str,
        function: &Function,
        prefix: &str,
    ) -> Result<String, Issue> {
        let type_params = self.type_params(function.type_params.as_deref());
        let params = self.params(function.params.iter().map(|param| &param.pat))?;
        let ret = self.return_type(function.return_type.as_deref(), function.span)?;
        let name = if name.is_empty() {
            String::new()
        } else {
            format!(" {name}")
        };
        Ok(format!("{prefix}function{name}{type_params}({params}): {ret};"))
    }

    fn return_type(
        &self,
        ann: Option<&TsTypeAnn>,
        at: dts_syntax::swc_common::Span,
    ) -> Result<&'src str, Issue> {
        ann.map(|ann| self.type_text(ann)).ok_or_else(|| {
            Issue::new(
                self.parsed.range(at).start,
                MISSING_ANNOTATION,
                "function needs an explicit return type",
            )
        })
    }

    fn type_params(&self, params: Option<&TsTypeParamDecl>) -> &'src str {
        params.map_or("", |params| self.text(params))
    }

    fn params<'p>(&self, params: impl Iterator<Item = &'p Pat>) -> Result<String, Issue> {
        let mut out = Vec::new();
        for (idx, pat) in params.enumerate() {
            out.push(self.param(pat, idx)?);
        }
        Ok(out.join(", "))
    }

    fn param(&self, pat: &Pat, idx: usize) -> Result<String, Issue> {
        let missing = |node: &dyn Spanned, what: String| {
            Issue::new(
                self.parsed.range(node.span()).start,
                MISSING_ANNOTATION,
                format!("{what} needs an explicit type annotation"),
            )
        };
        match pat {
            Pat::Ident(binding) => {
                let ann = binding.type_ann.as_deref().ok_or_else(|| {
                    missing(binding, format!("parameter `{}`", binding.id.sym))
                })?;
                let optional = if binding.id.optional { "?" } else { "" };
                Ok(format!(
                    "{}{optional}: {}",
                    binding.id.sym,
                    self.type_text(ann)
                ))
            }
            Pat::Assign(assign) => match &*assign.left {
                Pat::Ident(binding) => {
                    let ty = match &binding.type_ann {
                        Some(ann) => self.type_text(ann).to_string(),
                        None => self.infer(&assign.right, false)?,
                    };
                    Ok(format!("{}?: {ty}", binding.id.sym))
                }
                Pat::Object(object) => object
                    .type_ann
                    .as_deref()
                    .map(|ann| format!("__{idx}?: {}", self.type_text(ann)))
                    .ok_or_else(|| missing(object, format!("parameter {}", idx + 1))),
                Pat::Array(array) => array
                    .type_ann
                    .as_deref()
                    .map(|ann| format!("__{idx}?: {}", self.type_text(ann)))
                    .ok_or_else(|| missing(array, format!("parameter {}", idx + 1))),
                other => Err(missing(other, format!("parameter {}", idx + 1))),
            },
            Pat::Rest(rest) => {
                let (name, inner_ann) = match &*rest.arg {
                    Pat::Ident(binding) => (binding.id.sym.to_string(), binding.type_ann.as_deref()),
                    _ => (format!("__{idx}"), None),
                };
                let ann = rest
                    .type_ann
                    .as_deref()
                    .or(inner_ann)
                    .ok_or_else(|| missing(rest, format!("rest parameter `{name}`")))?;
                Ok(format!("...{name}: {}", self.type_text(ann)))
            }
            Pat::Object(object) => {
                let ann = object
                    .type_ann
                    .as_deref()
                    .ok_or_else(|| missing(object, format!("parameter {}", idx + 1)))?;
                let optional = if object.optional { "?" } else { "" };
                Ok(format!("__{idx}{optional}: {}", self.type_text(ann)))
            }
            Pat::Array(array) => {
                let ann = array
                    .type_ann
                    .as_deref()
                    .ok_or_else(|| missing(array, format!("parameter {}", idx + 1)))?;
                let optional = if array.optional { "?" } else { "" };
                Ok(format!("__{idx}{optional}: {}", self.type_text(ann)))
            }
            other => Err(Issue::new(
                self.parsed.start(other),
                UNSUPPORTED,
                "unsupported parameter",
            )),
        }
    }

    /// The declared type of an initialiser. Literals keep their literal type
    /// when `literal` is set (`const`, `readonly`).
    fn infer(&self, expr: &Expr, literal: bool) -> Result<String, Issue> {
        let widen = |text: &str, wide: &str| {
            if literal {
                text.to_string()
            } else {
                wide.to_string()
            }
        };
        match expr {
            Expr::Paren(paren) => self.infer(&paren.expr, literal),
            Expr::Lit(Lit::Str(s)) => Ok(widen(self.text(s), "string")),
            Expr::Lit(Lit::Num(n)) => Ok(widen(self.text(n), "number")),
            Expr::Lit(Lit::Bool(b)) => Ok(widen(self.text(b), "boolean")),
            Expr::Lit(Lit::BigInt(b)) => Ok(widen(self.text(b), "bigint")),
            Expr::Unary(unary) if unary.op == UnaryOp::Minus => match &*unary.arg {
                Expr::Lit(Lit::Num(_)) => Ok(widen(self.text(unary), "number")),
                Expr::Lit(Lit::BigInt(_)) => Ok(widen(self.text(unary), "bigint")),
                _ => Err(self.cannot_infer(expr)),
            },
            Expr::Tpl(tpl) if tpl.exprs.is_empty() => Ok("string".to_string()),
            Expr::TsAs(cast) => Ok(self.text(&*cast.type_ann).to_string()),
            Expr::TsTypeAssertion(cast) => Ok(self.text(&*cast.type_ann).to_string()),
            Expr::Arrow(arrow) => {
                let type_params = self.type_params(arrow.type_params.as_deref());
                let params = self.params(arrow.params.iter())?;
                let ret = self.return_type(arrow.return_type.as_deref(), arrow.span)?;
                Ok(format!("{type_params}({params}) => {ret}"))
            }
            Expr::Fn(function) => {
                let function = &function.function;
                let type_params = self.type_params(function.type_params.as_deref());
                let params = self.params(function.params.iter().map(|param| &param.pat))?;
                let ret = self.return_type(function.return_type.as_deref(), function.span)?;
                Ok(format!("{type_params}({params}) => {ret}"))
            }
            Expr::New(new) => match &*new.callee {
                Expr::Ident(ident) => {
                    let args = new.type_args.as_deref().map_or("", |args| self.text(args));
                    Ok(format!("{}{args}", ident.sym))
                }
                _ => Err(self.cannot_infer(expr)),
            },
            Expr::Call(call) if call.type_args.is_none() => match &call.callee {
                Callee::Expr(callee) => match &**callee {
                    Expr::Ident(ident) => Ok(format!("ReturnType<typeof {}>", ident.sym)),
                    _ => Err(self.cannot_infer(expr)),
                },
                _ => Err(self.cannot_infer(expr)),
            },
            _ => Err(self.cannot_infer(expr)),
        }
    }

    fn cannot_infer(&self, expr: &Expr) -> Issue {
        Issue::new(
            self.parsed.start(expr),
            CANNOT_INFER,
            "the type of this expression needs an explicit annotation",
        )
    }

    fn render_class(
        &self,
        name: Option<&str>,
        class: &Class,
        prefix: &str,
    ) -> Result<String, Issue> {
        let mut header = prefix.to_string();
        if class.is_abstract {
            header.push_str("abstract ");
        }
        header.push_str("class");
        if let Some(name) = name {
            header.push(' ');
            header.push_str(name);
        }
        header.push_str(self.type_params(class.type_params.as_deref()));
        if let Some(super_class) = &class.super_class {
            if !matches!(&**super_class, Expr::Ident(_) | Expr::Member(_)) {
                return Err(Issue::new(
                    self.parsed.start(&**super_class),
                    UNSUPPORTED,
                    "a class may only extend an identifier or property access",
                ));
            }
            header.push_str(" extends ");
            header.push_str(self.text(&**super_class));
            if let Some(args) = &class.super_type_params {
                header.push_str(self.text(&**args));
            }
        }
        if !class.implements.is_empty() {
            let implements: Vec<&str> = class.implements.iter().map(|i| self.text(i)).collect();
            header.push_str(" implements ");
            header.push_str(&implements.join(", "));
        }

        let mut members = Vec::new();
        let mut private_names = false;
        let mut private_keys = FxHashSet::default();
        let overloaded: FxHashSet<&str> = class
            .body
            .iter()
            .filter_map(|member| match member {
                ClassMember::Method(method) if method.function.body.is_none() => {
                    Some(self.text(&method.key))
                }
                ClassMember::Constructor(ctor) if ctor.body.is_none() => Some("constructor"),
                _ => None,
            })
            .collect();

        for member in &class.body {
            match member {
                ClassMember::Constructor(ctor) => {
                    if ctor.body.is_some() && overloaded.contains("constructor") {
                        continue;
                    }
                    let access = modifiers(ctor.accessibility, false, false, false, false);
                    if ctor.accessibility == Some(Accessibility::Private) {
                        members.push(format!("{access}constructor();"));
                        continue;
                    }
                    let mut params = Vec::new();
                    for (idx, param) in ctor.params.iter().enumerate() {
                        match param {
                            ParamOrTsParamProp::Param(param) => params.push(self.param(&param.pat, idx)?),
                            ParamOrTsParamProp::TsParamProp(prop) => {
                                let (name, ty, optional) = match &prop.param {
                                    TsParamPropParam::Ident(binding) => {
                                        let ann = binding.type_ann.as_deref().ok_or_else(|| {
                                            Issue::new(
                                                self.parsed.start(binding),
                                                MISSING_ANNOTATION,
                                                format!("parameter `{}` needs an explicit type annotation", binding.id.sym),
                                            )
                                        })?;
                                        (binding.id.sym.to_string(), self.type_text(ann).to_string(), binding.id.optional)
                                    }
                                    TsParamPropParam::Assign(assign) => {
                                        let Pat::Ident(binding) = &*assign.left else {
                                            return Err(Issue::new(self.parsed.start(assign), UNSUPPORTED, "unsupported parameter property"));
                                        };
                                        let ty = match &binding.type_ann {
                                            Some(ann) => self.type_text(ann).to_string(),
                                            None => self.infer(&assign.right, false)?,
                                        };
                                        (binding.id.sym.to_string(), ty, true)
                                    }
                                };
                                let optional = if optional { "?" } else { "" };
                                let mods = modifiers(prop.accessibility, false, false, prop.is_override, prop.readonly);
                                if prop.accessibility == Some(Accessibility::Private) {
                                    members.push(format!("{mods}{name};"));
                                } else {
                                    members.push(format!("{mods}{name}{optional}: {ty};"));
                                }
                                params.push(format!("{name}{optional}: {ty}"));
                            }
                        }
                    }
                    members.push(format!("{access}constructor({});", params.join(", ")));
                }
                ClassMember::Method(method) => {
                    let key = self.text(&method.key);
                    if method.function.body.is_some() && overloaded.contains(key) {
                        continue;
                    }
                    let mods = modifiers(
                        method.accessibility,
                        method.is_static,
                        method.is_abstract,
                        method.is_override,
                        false,
                    );
                    if method.accessibility == Some(Accessibility::Private) {
                        if private_keys.insert(key) {
                            members.push(format!("{mods}{key};"));
                        }
                        continue;
                    }
                    let function = &method.function;
                    let params = self.params(function.params.iter().map(|param| &param.pat))?;
                    match method.kind {
                        MethodKind::Method => {
                            let optional = if method.is_optional { "?" } else { "" };
                            let type_params = self.type_params(function.type_params.as_deref());
                            let ret = self.return_type(function.return_type.as_deref(), method.span)?;
                            members.push(format!("{mods}{key}{optional}{type_params}({params}): {ret};"));
                        }
                        MethodKind::Getter => {
                            let ret = self.return_type(function.return_type.as_deref(), method.span)?;
                            members.push(format!("{mods}get {key}(): {ret};"));
                        }
                        MethodKind::Setter => members.push(format!("{mods}set {key}({params});")),
                    }
                }
                ClassMember::ClassProp(prop) => {
                    let key = self.text(&prop.key);
                    let mods = modifiers(
                        prop.accessibility,
                        prop.is_static,
                        prop.is_abstract,
                        prop.is_override,
                        prop.readonly,
                    );
                    if prop.accessibility == Some(Accessibility::Private) {
                        if private_keys.insert(key) {
                            members.push(format!("{mods}{key};"));
                        }
                        continue;
                    }
                    let ty = match (&prop.type_ann, &prop.value) {
                        (Some(ann), _) => self.type_text(ann).to_string(),
                        (None, Some(value)) => self.infer(value, prop.readonly)?,
                        (None, None) => {
                            return Err(Issue::new(
                                self.parsed.start(prop),
                                CANNOT_INFER,
                                format!("property `{key}` needs an explicit type annotation"),
                            ))
                        }
                    };
                    let optional = if prop.is_optional { "?" } else { "" };
                    members.push(format!("{mods}{key}{optional}: {ty};"));
                }
                ClassMember::AutoAccessor(accessor) => match &accessor.key {
                    dts_syntax::ast::Key::Private(_) => private_names = true,
                    dts_syntax::ast::Key::Public(key) => {
                        let key = self.text(key);
                        let mods = modifiers(
                            accessor.accessibility,
                            accessor.is_static,
                            accessor.is_abstract,
                            accessor.is_override,
                            false,
                        );
                        let ty = match (&accessor.type_ann, &accessor.value) {
                            (Some(ann), _) => self.type_text(ann).to_string(),
                            (None, Some(value)) => self.infer(value, false)?,
                            (None, None) => {
                                return Err(Issue::new(
                                    self.parsed.start(accessor),
                                    CANNOT_INFER,
                                    format!("accessor `{key}` needs an explicit type annotation"),
                                ))
                            }
                        };
                        members.push(format!("{mods}accessor {key}: {ty};"));
                    }
                },
                ClassMember::TsIndexSignature(signature) => {
                    let text = self.text(signature).trim_end().trim_end_matches(';');
                    members.push(format!("{text};"));
                }
                ClassMember::PrivateMethod(_) | ClassMember::PrivateProp(_) => private_names = true,
                ClassMember::Empty(_) | ClassMember::StaticBlock(_) => {}
            }
        }
        if private_names {
            members.insert(0, "#private;".to_string());
        }

        let mut out = header;
        out.push_str(" {\n");
        for member in members {
            out.push_str("    ");
            out.push_str(&member);
            out.push('\n');
        }
        out.push('}');
        Ok(out)
    }
}

fn modifiers(
    accessibility: Option<Accessibility>,
    is_static: bool,
    is_abstract: bool,
    is_override: bool,
    readonly: bool,
) -> String {
    let mut out = String::new();
    match accessibility {
        Some(Accessibility::Public) => out.push_str("public "),
        Some(Accessibility::Protected) => out.push_str("protected "),
        Some(Accessibility::Private) => out.push_str("private "),
        None => {}
    }
    for (set, keyword) in [
        (is_static, "static "),
        (is_abstract, "abstract "),
        (is_override, "override "),
        (readonly, "readonly "),
    ] {
        if set {
            out.push_str(keyword);
        }
    }
    out
}

fn is_type_only_namespace(module: &TsModuleDecl) -> bool {
    fn body_is_type_only(body: &TsNamespaceBody) -> bool {
        match body {
            TsNamespaceBody::TsModuleBlock(block) => block.body.iter().all(|item| {
                let decl = match item {
                    ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => &export.decl,
                    ModuleItem::Stmt(Stmt::Decl(decl)) => decl,
                    _ => return false,
                };
                match decl {
                    Decl::TsInterface(_) | Decl::TsTypeAlias(_) => true,
                    Decl::TsModule(inner) => inner.declare || is_type_only_namespace(inner),
                    _ => false,
                }
            }),
            TsNamespaceBody::TsNamespaceDecl(decl) => body_is_type_only(&decl.body),
        }
    }
    module.body.as_ref().map_or(true, body_is_type_only)
}

/// Position after `keyword` and the whitespace that follows it, if the
/// text at `pos` starts with it.
fn skip_keyword(source: &str, pos: usize, keyword: &str) -> usize {
    match source[pos..].strip_prefix(keyword) {
        Some(rest) => {
            let trimmed = rest.trim_start();
            source.len() - trimmed.len()
        }
        None => pos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn emit(source: &str) -> String {
        emit_declaration("index.ts", source, Dialect::TypeScript).unwrap()
    }

    fn issues(source: &str) -> Vec<(&'static str, String)> {
        emit_declaration("index.ts", source, Dialect::TypeScript)
            .unwrap_err()
            .into_iter()
            .map(|issue| (issue.code, source[issue.offset..].lines().next().unwrap_or("").to_string()))
            .collect()
    }

    #[test]
    fn test_variables() {
        assert_eq!(
            emit("export const a = 1;\nexport let b = 'x';\nexport const c = -2, d = true;\nexport const e: Foo = make();\n"),
            "export declare const a: 1;\nexport declare let b: string;\nexport declare const c: -2, d: true;\nexport declare const e: Foo;\n"
        );
    }

    #[test]
    fn test_functions_and_statements() {
        let source = "import { x } from './x';\n\
                      console.log(x);\n\
                      export function add(a: number, b = 1, ...rest: number[]): number {\n  return a + b;\n}\n\
                      function helper() { return 1; }\n\
                      export const f = <T,>(value: T): T[] => [value];\n";
        assert_eq!(
            emit(source),
            "import { x } from './x';\n\
             export declare function add(a: number, b?: number, ...rest: number[]): number;\n\
             export declare const f: <T,>(value: T) => T[];\n"
        );
    }

    #[test]
    fn test_overloads_drop_implementation() {
        assert_eq!(
            emit("export function f(a: string): string;\nexport function f(a: number): number;\nexport function f(a: any): any { return a; }\n"),
            "export declare function f(a: string): string;\nexport declare function f(a: number): number;\n"
        );
    }

    #[test]
    fn test_class() {
        let source = "export class Counter extends Base implements Ticker {\n  #count = 0;\n  static readonly step = 1;\n  private cache = new Map();\n  label: string = '';\n  constructor(public readonly name: string, size = 2) { super(); }\n  get value(): number { return this.#count; }\n  tick(by?: number): void {}\n}\n";
        insta::assert_snapshot!(emit(source), @r###"
        export declare class Counter extends Base implements Ticker {
            #private;
            static readonly step: 1;
            private cache;
            label: string;
            public readonly name: string;
            constructor(name: string, size?: number);
            get value(): number;
            tick(by?: number): void;
        }
        "###);
    }

    #[test]
    fn test_default_exports_and_locals() {
        assert_eq!(
            emit("const impl = (n: number): string => `${n}`;\nexport { impl };\nexport default defineComponent({});\n"),
            "declare const impl: (n: number) => string;\nexport { impl };\ndeclare const _default: ReturnType<typeof defineComponent>;\nexport default _default;\n"
        );
        assert_eq!(
            emit("export default function (a: string): void {}\n"),
            "export default function(a: string): void;\n"
        );
    }

    #[test]
    fn test_types_are_kept_and_enums_declared() {
        assert_eq!(
            emit("export interface A { a: string }\ntype B = A[];\nexport enum E { X = 1 }\nnamespace N { export type T = B; }\n"),
            "export interface A { a: string }\ntype B = A[];\nexport declare enum E { X = 1 }\ndeclare namespace N { export type T = B; }\n"
        );
    }

    #[test]
    fn test_unexported_values_without_types_are_dropped() {
        assert_eq!(
            emit("const table = { a: 1 };\nexport type T = string;\n"),
            "export type T = string;\n"
        );
    }

    #[test]
    fn test_missing_annotations_are_reported() {
        let found = issues("export function f(a) { return a; }\nexport const o = { a: 1 };\n");
        assert_eq!(
            found,
            vec![
                (MISSING_ANNOTATION, "a) { return a; }".to_string()),
                (CANNOT_INFER, "{ a: 1 };".to_string()),
            ]
        );
        assert_eq!(issues("export const = ;")[0].0, SYNTAX_ERROR);
    }

    #[test]
    fn test_default_declarations_report_missing_annotations() {
        assert_eq!(
            issues("export default function (a) { return a; }\n"),
            vec![(MISSING_ANNOTATION, "a) { return a; }".to_string())]
        );
    }
}
