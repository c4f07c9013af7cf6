//! Pre-parsers: turn files the checker cannot read into typed source.

use camino::{Utf8Path, Utf8PathBuf};
use sfc_parser::SfcError;
use sfc_transformer::{compile_script, CompileError, CompileOptions};
use std::sync::Arc;
use text_edit::{LineIndex, SourceMap, Span};
use thiserror::Error;
use tracing::debug;
use tsc_runner::CheckUnit;

/// What a pre-parser knows about the file it is given.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub root: &'a Utf8Path,
    pub file_path: &'a Utf8Path,
}

/// A pre-parser's result for a file it accepted.
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    /// New text under the file's own name.
    Replace(String),
    /// New text registered as `file_name`, in the file's directory.
    Rename {
        code: String,
        file_name: String,
        source_map: Option<SourceMap>,
    },
}

#[derive(Debug, Error)]
pub enum PreParseError {
    #[error("{path}:{line}:{column}: {source}")]
    Component {
        path: Utf8PathBuf,
        line: u32,
        column: u32,
        #[source]
        source: SfcError,
    },

    #[error("{path}:{line}:{column}: {source}")]
    Script {
        path: Utf8PathBuf,
        line: u32,
        column: u32,
        #[source]
        source: CompileError,
    },

    #[error("{path}: {message}")]
    Custom { path: Utf8PathBuf, message: String },
}

/// Converts a file before it reaches the checker, or declines with `None`.
pub trait UnitParser: Send + Sync {
    fn parse(&self, code: &str, ctx: &ParseContext<'_>) -> Result<Option<ParseOutcome>, PreParseError>;

    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> UnitParser for F
where
    F: Fn(&str, &ParseContext<'_>) -> Result<Option<ParseOutcome>, PreParseError> + Send + Sync,
{
    fn parse(&self, code: &str, ctx: &ParseContext<'_>) -> Result<Option<ParseOutcome>, PreParseError> {
        self(code, ctx)
    }
}

pub type SharedParser = Arc<dyn UnitParser>;

/// The parsers used when none are configured.
pub fn default_parsers() -> Vec<SharedParser> {
    vec![Arc::new(VueParser)]
}

/// Compiles `.vue` components into a module registered as
/// `<name>.vue.<lang>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VueParser;

impl UnitParser for VueParser {
    fn parse(&self, code: &str, ctx: &ParseContext<'_>) -> Result<Option<ParseOutcome>, PreParseError> {
        if ctx.file_path.extension() != Some("vue") {
            return Ok(None);
        }
        let index = LineIndex::new(code);
        let position = |span: Span| {
            index
                .line_col(span.start)
                .map_or((1, 1), |pos| pos.one_based())
        };

        let descriptor = sfc_parser::parse(code).map_err(|source| {
            let (line, column) = position(source.span);
            PreParseError::Component {
                path: ctx.file_path.to_path_buf(),
                line,
                column,
                source,
            }
        })?;
        let options = CompileOptions {
            filename: ctx.file_path.to_string(),
        };
        let compiled = compile_script(&descriptor, &options).map_err(|source| {
            let (line, column) = position(source.span());
            PreParseError::Script {
                path: ctx.file_path.to_path_buf(),
                line,
                column,
                source,
            }
        })?;

        let base = ctx.file_path.file_name().unwrap_or("component.vue");
        Ok(Some(ParseOutcome::Rename {
            code: compiled.code,
            file_name: format!("{base}.{}", compiled.lang),
            source_map: Some(compiled.source_map),
        }))
    }

    fn name(&self) -> &str {
        "vue"
    }
}

/// Runs `parsers` in order; the first one that accepts the file wins.
pub fn parse_unit(
    parsers: &[SharedParser],
    code: &str,
    ctx: &ParseContext<'_>,
) -> Result<Option<ParseOutcome>, PreParseError> {
    for parser in parsers {
        if let Some(outcome) = parser.parse(code, ctx)? {
            debug!(parser = parser.name(), file = %ctx.file_path, "pre-parsed");
            return Ok(Some(outcome));
        }
    }
    Ok(None)
}

/// The checker slot for `path` after pre-parsing.
pub(crate) fn check_unit(path: &Utf8Path, outcome: Option<ParseOutcome>) -> CheckUnit {
    match outcome {
        None => CheckUnit::on_disk(path),
        Some(ParseOutcome::Replace(code)) => CheckUnit::text(path, path, code, None),
        Some(ParseOutcome::Rename {
            code,
            file_name,
            source_map,
        }) => {
            let logical = path
                .parent()
                .map_or_else(|| Utf8PathBuf::from(&file_name), |dir| dir.join(&file_name));
            debug!(from = %path, to = %logical, "registered under a new name");
            CheckUnit::text(path, logical, code, source_map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tsc_runner::UnitContent;

    fn ctx(path: &str) -> ParseContext<'_> {
        ParseContext {
            root: Utf8Path::new("/p"),
            file_path: Utf8Path::new(path),
        }
    }

    #[test]
    fn test_vue_parser_declines_other_files() {
        let outcome = VueParser.parse("export {}", &ctx("/p/src/a.ts")).unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn test_vue_component_is_renamed_by_lang() {
        let source = "<script setup lang=\"tsx\">\nconst n = 1;\n</script>\n";
        let Some(ParseOutcome::Rename { file_name, .. }) =
            VueParser.parse(source, &ctx("/p/src/Comp.vue")).unwrap()
        else {
            panic!("expected a renamed unit");
        };
        assert_eq!(file_name, "Comp.vue.tsx");

        let Some(ParseOutcome::Rename { code, file_name, .. }) =
            VueParser.parse("<template><div/></template>\n", &ctx("/p/src/Empty.vue")).unwrap()
        else {
            panic!("expected a renamed unit");
        };
        assert_eq!(file_name, "Empty.vue.ts");
        assert_eq!(code, sfc_transformer::DEFAULT_COMPONENT);
    }

    #[test]
    fn test_component_errors_carry_position() {
        let err = VueParser
            .parse("<template>\n</template>\n<script>\nlet a = 1;\n", &ctx("/p/src/Bad.vue"))
            .unwrap_err();
        match err {
            PreParseError::Component { line, column, .. } => assert_eq!((line, column), (3, 1)),
            other => panic!("expected a component error, got {other:?}"),
        }
    }

    #[test]
    fn test_first_accepting_parser_wins() {
        let upper: SharedParser = Arc::new(|code: &str, _: &ParseContext<'_>| {
            Ok::<_, PreParseError>(Some(ParseOutcome::Replace(code.to_uppercase())))
        });
        let never: SharedParser = Arc::new(|_: &str, _: &ParseContext<'_>| {
            Err::<Option<ParseOutcome>, _>(PreParseError::Custom {
                path: "x".into(),
                message: "unreachable".into(),
            })
        });
        let decline: SharedParser =
            Arc::new(|_: &str, _: &ParseContext<'_>| Ok::<Option<ParseOutcome>, PreParseError>(None));

        let outcome = parse_unit(&[decline, upper, never], "abc", &ctx("/p/a.txt")).unwrap();
        assert!(matches!(outcome, Some(ParseOutcome::Replace(ref code)) if code == "ABC"));
    }

    #[test]
    fn test_check_unit_paths() {
        let unit = check_unit(
            Utf8Path::new("/p/src/Comp.vue"),
            Some(ParseOutcome::Rename {
                code: "export {}".into(),
                file_name: "Comp.vue.ts".into(),
                source_map: None,
            }),
        );
        assert_eq!(unit.original_path, "/p/src/Comp.vue");
        assert_eq!(unit.path, "/p/src/Comp.vue.ts");
        assert!(matches!(unit.content, UnitContent::Text { .. }));

        let unit = check_unit(Utf8Path::new("/p/src/a.ts"), None);
        assert!(matches!(unit.content, UnitContent::OnDisk));
    }
}
