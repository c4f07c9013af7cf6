//! Compiles the script blocks of a component into one typed module.

use crate::error::CompileError;
use crate::macros::{Declared, MacroCollector};
use dts_syntax::ast::{Decl, DefaultDecl, ModuleDecl, ModuleItem, Stmt};
use dts_syntax::swc_common::Spanned;
use dts_syntax::visit::VisitWith;
use dts_syntax::{decl_names, parse_module, Dialect, ParsedModule};
use sfc_parser::{SfcBlock, SfcDescriptor};
use smol_str::SmolStr;
use std::ops::Range;
use text_edit::{ByteOffset, SourceMap, SourceMapBuilder, Span};

/// Module text used for components without any script block.
pub const DEFAULT_COMPONENT: &str =
    "import { defineComponent } from 'vue';\nexport default defineComponent({});\n";

const EMITS_HELPERS: &str = "type __EmitsOptions<T> = T extends (...args: any[]) => any ? string[] : { [K in keyof T]: (...args: T[K] extends any[] ? T[K] : any[]) => any };\n\
type __EmitFn<T> = T extends (...args: any[]) => any ? T : <K extends keyof T>(event: K, ...args: T[K] extends any[] ? T[K] : any[]) => void;\n";

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Path of the component, used in syntax errors.
    pub filename: String,
}

#[derive(Debug, Clone)]
pub struct CompiledScript {
    pub code: String,
    /// The effective language of [`code`](Self::code), e.g. `ts` or `tsx`.
    pub lang: SmolStr,
    /// Maps offsets in `code` back to the component source.
    pub source_map: SourceMap,
}

/// Produces the typed module the checker sees in place of a component.
pub fn compile_script(
    descriptor: &SfcDescriptor,
    options: &CompileOptions,
) -> Result<CompiledScript, CompileError> {
    let lang = descriptor.script_lang().unwrap_or("ts");

    match (&descriptor.script, &descriptor.script_setup) {
        (None, None) => Ok(CompiledScript {
            code: DEFAULT_COMPONENT.to_string(),
            lang: SmolStr::new(lang),
            source_map: SourceMap::new(),
        }),
        (Some(script), None) => {
            let mut out = Output::default();
            out.copy(usize::from(script.content_span.start), &script.content);
            Ok(out.finish(lang))
        }
        (script, Some(setup)) => {
            // The generated module uses type syntax whatever the block says.
            let lang = match lang {
                "js" => "ts",
                "jsx" => "tsx",
                other => other,
            };
            compile_setup(script.as_ref(), setup, lang, options)
        }
    }
}

fn dialect(lang: &str) -> Dialect {
    match lang {
        "tsx" | "jsx" => Dialect::Tsx,
        _ => Dialect::TypeScript,
    }
}

fn parse_block<'a>(
    block: &'a SfcBlock,
    name: &'static str,
    lang: &str,
    options: &CompileOptions,
) -> Result<ParsedModule<'a>, CompileError> {
    parse_module(&options.filename, &block.content, dialect(lang)).map_err(|source| {
        let offset = usize::from(block.content_span.start) + source.offset;
        CompileError::Syntax {
            block: name,
            span: Span::from_range(offset..offset),
            source,
        }
    })
}

fn compile_setup(
    script: Option<&SfcBlock>,
    setup: &SfcBlock,
    lang: &str,
    options: &CompileOptions,
) -> Result<CompiledScript, CompileError> {
    if setup.has_attr("generic") {
        return Err(CompileError::Unsupported {
            message: "generic components are not supported".to_string(),
            span: setup.span,
        });
    }

    let setup_parsed = parse_block(setup, "script setup", lang, options)?;
    let setup_base = usize::from(setup.content_span.start);

    let mut hoisted = Vec::new();
    let mut body = Vec::new();
    for item in &setup_parsed.module.body {
        match classify(item) {
            Placement::Hoist => hoisted.push(item),
            Placement::Body => body.push(item),
            Placement::Reject => {
                let range = setup_parsed.range(item.span());
                return Err(CompileError::Unsupported {
                    message: "<script setup> cannot contain ES module exports".to_string(),
                    span: Span::from_range(setup_base + range.start..setup_base + range.end),
                });
            }
        }
    }

    let mut macros = MacroCollector::new(&setup_parsed);
    for item in &body {
        item.visit_with(&mut macros);
    }
    macros.replacements.sort_by_key(|(range, _)| range.start);

    let props = PropsShape::from(macros.props.as_ref());
    let emits = EmitsShape::from(macros.emits.as_ref());

    let mut out = Output::default();
    if props.runtime.is_some() {
        out.generated("import type { DefineComponent as __DefineComponent, ExtractPropTypes as __ExtractPropTypes } from 'vue';\n");
    } else {
        out.generated("import type { DefineComponent as __DefineComponent } from 'vue';\n");
    }

    let has_default = match script {
        Some(script) => compile_normal_script(&mut out, script, lang, options)?,
        None => false,
    };

    for item in &hoisted {
        let range = setup_parsed.range(item.span());
        out.copy(setup_base + range.start, &setup.content[range]);
        out.generated("\n");
    }

    if let Some(object) = &props.runtime {
        out.generated(&format!("const __propsOptions = {object};\n"));
    }
    if let Some(object) = &emits.runtime {
        out.generated(&format!("const __emitsOptions = {object};\n"));
    }
    if emits.needs_helpers {
        out.generated(EMITS_HELPERS);
    }

    out.generated(&format!(
        "function __setup(__props: {}, __emit: {}) {{\n",
        props.local, emits.local
    ));
    let mut bindings = Vec::new();
    for item in &body {
        let range = setup_parsed.range(item.span());
        out.rewrite(&setup.content, setup_base, range, &macros.replacements);
        out.generated("\n");
        collect_bindings(item, &mut bindings);
    }
    if bindings.is_empty() {
        out.generated("return {};\n}\n");
    } else {
        out.generated(&format!("return {{ {} }};\n}}\n", bindings.join(", ")));
    }
    out.generated("void __setup;\n");
    if has_default {
        out.generated("void __default__;\n");
    }

    out.generated(&format!(
        "declare const _default: __DefineComponent<{}, {{}}, {{}}, {{}}, {{}}, {{}}, {{}}, {}>;\nexport default _default;\n",
        props.public, emits.public
    ));

    Ok(out.finish(lang))
}

/// Copies the normal `<script>` of a setup component. Its default export is
/// kept as `__default__`; returns whether there was one.
fn compile_normal_script(
    out: &mut Output,
    script: &SfcBlock,
    lang: &str,
    options: &CompileOptions,
) -> Result<bool, CompileError> {
    let parsed = parse_block(script, "script", lang, options)?;
    let base = usize::from(script.content_span.start);

    let mut replacements = Vec::new();
    for item in &parsed.module.body {
        let ModuleItem::ModuleDecl(decl) = item else {
            continue;
        };
        let value_start = match decl {
            ModuleDecl::ExportDefaultExpr(export) => parsed.start(&*export.expr),
            ModuleDecl::ExportDefaultDecl(export) => match &export.decl {
                DefaultDecl::Class(class) => parsed.start(class),
                DefaultDecl::Fn(function) => parsed.start(function),
                DefaultDecl::TsInterfaceDecl(_) => {
                    let range = parsed.range(export.span);
                    return Err(CompileError::Unsupported {
                        message: "a default-exported interface cannot be combined with <script setup>"
                            .to_string(),
                        span: Span::from_range(base + range.start..base + range.end),
                    });
                }
            },
            _ => continue,
        };
        replacements.push((parsed.start(decl)..value_start, "const __default__ = ".to_string()));
    }

    out.rewrite(&script.content, base, 0..script.content.len(), &replacements);
    if !script.content.ends_with('\n') {
        out.generated("\n");
    }
    Ok(!replacements.is_empty())
}

enum Placement {
    Hoist,
    Body,
    Reject,
}

fn classify(item: &ModuleItem) -> Placement {
    match item {
        ModuleItem::ModuleDecl(ModuleDecl::Import(_)) => Placement::Hoist,
        ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) if is_type_decl(&export.decl) => {
            Placement::Hoist
        }
        ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(export))
            if export.type_only && export.src.is_none() =>
        {
            Placement::Hoist
        }
        ModuleItem::ModuleDecl(ModuleDecl::ExportAll(export)) if export.type_only => {
            Placement::Hoist
        }
        ModuleItem::ModuleDecl(_) => Placement::Reject,
        ModuleItem::Stmt(Stmt::Decl(decl)) if is_type_decl(decl) || is_ambient(decl) => {
            Placement::Hoist
        }
        ModuleItem::Stmt(_) => Placement::Body,
    }
}

fn is_type_decl(decl: &Decl) -> bool {
    matches!(
        decl,
        Decl::TsInterface(_) | Decl::TsTypeAlias(_) | Decl::TsEnum(_) | Decl::TsModule(_)
    )
}

fn is_ambient(decl: &Decl) -> bool {
    match decl {
        Decl::Var(var) => var.declare,
        Decl::Fn(function) => function.declare,
        Decl::Class(class) => class.declare,
        _ => false,
    }
}

/// Names declared at the top of the setup body.
fn collect_bindings(item: &ModuleItem, out: &mut Vec<String>) {
    let ModuleItem::Stmt(Stmt::Decl(decl)) = item else {
        return;
    };
    out.extend(decl_names(decl).into_iter().map(|ident| ident.sym.to_string()));
}

/// Types derived from the props macro.
struct PropsShape {
    /// The `__props` parameter type.
    local: String,
    /// The first `DefineComponent` argument.
    public: String,
    /// Runtime options object to emit as `__propsOptions`.
    runtime: Option<String>,
}

impl PropsShape {
    fn from(declared: Option<&Declared>) -> Self {
        match declared {
            Some(Declared::Type(ty)) => Self {
                local: ty.clone(),
                public: ty.clone(),
                runtime: None,
            },
            Some(Declared::Runtime(object)) => Self {
                local: "__ExtractPropTypes<typeof __propsOptions>".to_string(),
                public: "typeof __propsOptions".to_string(),
                runtime: Some(object.clone()),
            },
            Some(Declared::Names(names)) => {
                let members: Vec<String> = names
                    .iter()
                    .map(|name| format!("{}?: any", property_key(name)))
                    .collect();
                let ty = if members.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{ {} }}", members.join("; "))
                };
                Self {
                    local: ty.clone(),
                    public: ty,
                    runtime: None,
                }
            }
            None => Self {
                local: "{}".to_string(),
                public: "{}".to_string(),
                runtime: None,
            },
        }
    }
}

/// Types derived from the emits macro.
struct EmitsShape {
    /// The `__emit` parameter type.
    local: String,
    /// The last `DefineComponent` argument.
    public: String,
    runtime: Option<String>,
    needs_helpers: bool,
}

impl EmitsShape {
    fn from(declared: Option<&Declared>) -> Self {
        let untyped = |event: &str| format!("(event: {event}, ...args: any[]) => void");
        match declared {
            Some(Declared::Type(ty)) => Self {
                local: format!("__EmitFn<{ty}>"),
                public: format!("__EmitsOptions<{ty}>"),
                runtime: None,
                needs_helpers: true,
            },
            Some(Declared::Runtime(object)) => Self {
                local: untyped("keyof typeof __emitsOptions"),
                public: "typeof __emitsOptions".to_string(),
                runtime: Some(object.clone()),
                needs_helpers: false,
            },
            Some(Declared::Names(names)) if !names.is_empty() => {
                let union = names
                    .iter()
                    .map(|name| quote(name))
                    .collect::<Vec<_>>()
                    .join(" | ");
                Self {
                    local: untyped(&union),
                    public: format!("({union})[]"),
                    runtime: None,
                    needs_helpers: false,
                }
            }
            _ => Self {
                local: untyped("string"),
                public: "{}".to_string(),
                runtime: None,
                needs_helpers: false,
            },
        }
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

fn property_key(name: &str) -> String {
    let mut chars = name.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_identifier {
        name.to_string()
    } else {
        quote(name)
    }
}

/// Generated text with its mapping back to the component.
#[derive(Default)]
struct Output {
    code: String,
    map: SourceMapBuilder,
}

impl Output {
    fn generated(&mut self, text: &str) {
        self.map.add_generated(text);
        self.code.push_str(text);
    }

    fn copy(&mut self, offset: usize, text: &str) {
        self.map.add_source(ByteOffset::from(offset as u32), text);
        self.code.push_str(text);
    }

    fn transformed(&mut self, original: Span, text: &str) {
        self.map.add_transformed(original, text);
        self.code.push_str(text);
    }

    /// Copies `content[range]`, substituting the replacements that fall
    /// inside it. Replacements must be sorted and must not overlap.
    fn rewrite(
        &mut self,
        content: &str,
        base: usize,
        range: Range<usize>,
        replacements: &[(Range<usize>, String)],
    ) {
        let mut pos = range.start;
        for (replaced, text) in replacements
            .iter()
            .filter(|(r, _)| r.start >= range.start && r.end <= range.end)
        {
            self.copy(base + pos, &content[pos..replaced.start]);
            self.transformed(
                Span::from_range(base + replaced.start..base + replaced.end),
                text,
            );
            pos = replaced.end;
        }
        self.copy(base + pos, &content[pos..range.end]);
    }

    fn finish(self, lang: &str) -> CompiledScript {
        CompiledScript {
            code: self.code,
            lang: SmolStr::new(lang),
            source_map: self.map.build(),
        }
    }
}
