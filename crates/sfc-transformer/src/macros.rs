//! Compiler macro detection in `<script setup>`.

use dts_syntax::ast::{CallExpr, Callee, Expr, ExprOrSpread, Lit};
use dts_syntax::visit::{Visit, VisitWith};
use dts_syntax::{str_value, ParsedModule};
use std::ops::Range;

/// How the component declares something through a macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Declared {
    /// `defineX<T>()`, with the text of `T`.
    Type(String),
    /// `defineX({ ... })`, with the text of the object.
    Runtime(String),
    /// `defineX(['a', 'b'])`
    Names(Vec<String>),
}

/// Walks setup statements, recording macro calls and their replacements.
pub(crate) struct MacroCollector<'a, 'src> {
    parsed: &'a ParsedModule<'src>,
    pub replacements: Vec<(Range<usize>, String)>,
    pub props: Option<Declared>,
    pub emits: Option<Declared>,
}

const OPAQUE_MACROS: &[&str] = &["defineExpose", "defineOptions", "defineSlots", "defineModel"];

impl<'a, 'src> MacroCollector<'a, 'src> {
    pub fn new(parsed: &'a ParsedModule<'src>) -> Self {
        Self {
            parsed,
            replacements: Vec::new(),
            props: None,
            emits: None,
        }
    }

    fn declared(&self, call: &CallExpr) -> Option<Declared> {
        if let Some(ty) = call.type_args.as_ref().and_then(|args| args.params.first()) {
            return Some(Declared::Type(self.parsed.text(&**ty).to_string()));
        }
        match call.args.first().map(|arg| &*arg.expr)? {
            Expr::Object(object) => Some(Declared::Runtime(self.parsed.text(object).to_string())),
            Expr::Array(array) => Some(Declared::Names(
                array
                    .elems
                    .iter()
                    .flatten()
                    .filter_map(|ExprOrSpread { expr, .. }| match &**expr {
                        Expr::Lit(Lit::Str(s)) => Some(str_value(s)),
                        _ => None,
                    })
                    .collect(),
            )),
            _ => None,
        }
    }

    fn replace(&mut self, call: &CallExpr, text: &str) {
        self.replacements
            .push((self.parsed.range(call.span), text.to_string()));
    }
}

fn callee_name(call: &CallExpr) -> Option<&str> {
    match &call.callee {
        Callee::Expr(expr) => match &**expr {
            Expr::Ident(ident) => Some(&*ident.sym),
            _ => None,
        },
        _ => None,
    }
}

impl Visit for MacroCollector<'_, '_> {
    fn visit_call_expr(&mut self, call: &CallExpr) {
        match callee_name(call) {
            Some("withDefaults") => {
                let inner = call.args.first().and_then(|arg| match &*arg.expr {
                    Expr::Call(inner) if callee_name(inner) == Some("defineProps") => Some(inner),
                    _ => None,
                });
                match inner {
                    Some(inner) => {
                        self.props = self.declared(inner);
                        self.replace(call, "__props");
                    }
                    None => call.visit_children_with(self),
                }
            }
            Some("defineProps") => {
                self.props = self.declared(call);
                self.replace(call, "__props");
            }
            Some("defineEmits") => {
                self.emits = self.declared(call);
                self.replace(call, "__emit");
            }
            Some(name) if OPAQUE_MACROS.contains(&name) => {
                self.replace(call, "(undefined as any)");
            }
            _ => call.visit_children_with(self),
        }
    }
}
