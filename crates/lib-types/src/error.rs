//! Build errors.

use crate::config::ConfigError;
use crate::output::format_report;
use crate::parsers::PreParseError;
use camino::{Utf8Path, Utf8PathBuf};
use dts_bundler::BundleError;
use dts_transformer::TransformError;
use miette::Diagnostic;
use thiserror::Error;
use tsc_runner::TscError;

/// Everything that can abort a build.
#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    #[error(transparent)]
    #[diagnostic(code(lib_types::config))]
    Config(#[from] ConfigError),

    /// The checker reported errors; `report` lists them all.
    #[error("type-check failed with {count} error(s)\n\n{report}")]
    #[diagnostic(
        code(lib_types::diagnostics),
        help("no declarations were written; fix the errors above and rebuild")
    )]
    Diagnostics { count: usize, report: String },

    #[error("{0}")]
    #[diagnostic(code(lib_types::process))]
    Process(String),

    #[error("could not resolve `{specifier}` imported by {importer}")]
    #[diagnostic(
        code(lib_types::unresolved),
        help("check the entry paths and the tsconfig `paths` aliases")
    )]
    Unresolved {
        specifier: String,
        importer: Utf8PathBuf,
    },

    #[error(transparent)]
    #[diagnostic(code(lib_types::bundle))]
    Bundle(BundleError),

    #[error("{chunk}: unhandled {} declarations detected", .tags.join(","))]
    #[diagnostic(
        code(lib_types::unhandled_tag),
        help("the tag sits on a declaration the remover cannot scrub; move it or set `ignoreCheck`")
    )]
    UnhandledTags { chunk: String, tags: Vec<String> },

    #[error("{chunk}: a tagged declaration must declare a single binding, found `{}`", .names.join(", "))]
    #[diagnostic(code(lib_types::declarator))]
    Declarator { chunk: String, names: Vec<String> },

    #[error("{chunk}: {source}")]
    #[diagnostic(code(lib_types::transform))]
    Transform {
        chunk: String,
        #[source]
        source: TransformError,
    },

    #[error(transparent)]
    #[diagnostic(code(lib_types::parse))]
    PreParse(#[from] PreParseError),

    #[error("{message}")]
    #[diagnostic(code(lib_types::parse))]
    Syntax { message: String },

    #[error("{path}: {source}")]
    #[diagnostic(code(lib_types::io))]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>) -> impl FnOnce(std::io::Error) -> BuildError {
        let path = path.into();
        move |source| BuildError::Io { path, source }
    }

    /// Converts a checker error, rendering diagnostics relative to `root`.
    pub fn from_tsc(err: TscError, root: &Utf8Path) -> Self {
        match err {
            TscError::Diagnostics(diagnostics) => BuildError::Diagnostics {
                count: diagnostics.len(),
                report: format_report(&diagnostics, root),
            },
            TscError::TsconfigNotFound(path) => {
                BuildError::Config(ConfigError::TsconfigNotFound(path))
            }
            TscError::Io { path, source } => BuildError::Io { path, source },
            other @ (TscError::ProcessFailed { .. }
            | TscError::Spawn { .. }
            | TscError::NotFound { .. }
            | TscError::Json(_)) => BuildError::Process(other.to_string()),
        }
    }

    /// Attributes a transformer failure to `chunk`.
    pub fn transform(chunk: &str, err: TransformError) -> Self {
        let chunk = chunk.to_string();
        match err {
            TransformError::UnhandledTags { tags } => BuildError::UnhandledTags { chunk, tags },
            TransformError::DuplicateDeclarator { names } => BuildError::Declarator { chunk, names },
            source => BuildError::Transform { chunk, source },
        }
    }
}

impl From<BundleError> for BuildError {
    fn from(err: BundleError) -> Self {
        match err {
            BundleError::Unresolved {
                specifier,
                importer,
            } => BuildError::Unresolved {
                specifier,
                importer,
            },
            BundleError::Io { path, source } => BuildError::Io { path, source },
            BundleError::Syntax(err) => BuildError::Syntax {
                message: err.to_string(),
            },
            other => BuildError::Bundle(other),
        }
    }
}
