//! Bundler errors.

use crate::ExportsMode;
use camino::Utf8PathBuf;
use dts_syntax::SyntaxError;
use text_edit::EditError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("failed to parse declaration: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A local import whose target is not in the declaration tree.
    #[error("could not resolve `{specifier}` imported by {importer}")]
    Unresolved {
        specifier: String,
        importer: Utf8PathBuf,
    },

    #[error("`{name}` is not exported by {module}")]
    MissingExport { name: String, module: Utf8PathBuf },

    #[error("entries {} would all be written to `{file_name}`", .entries.join(", "))]
    DuplicateFileName {
        file_name: String,
        entries: Vec<String>,
    },

    #[error("entry `{entry}` cannot use exports mode \"{mode}\": {reason}")]
    ExportsMode {
        entry: String,
        mode: ExportsMode,
        reason: String,
    },

    /// Declaration syntax the bundler does not know how to merge.
    #[error("{file}: {message}")]
    Unsupported { file: Utf8PathBuf, message: String },

    #[error("invalid module pattern `{pattern}`: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("invalid external pattern `{pattern}`: {source}")]
    ExternalPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Edit(#[from] EditError),
}
