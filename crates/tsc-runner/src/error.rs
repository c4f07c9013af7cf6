//! Type-check and emit errors.

use crate::diagnostic::Diagnostic;
use crate::CheckerKind;
use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TscError {
    /// The checker reported errors. Nothing was emitted.
    #[error("type-check failed with {} error(s)", .0.len())]
    Diagnostics(Vec<Diagnostic>),

    /// The checker exited unsuccessfully without reporting diagnostics.
    #[error("{program} exited with {}: {stderr}", exit_status(.code))]
    ProcessFailed {
        program: Utf8PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{checker} binary not found; install it in node_modules or put it on PATH")]
    NotFound { checker: CheckerKind },

    #[error("tsconfig not found at: {0}")]
    TsconfigNotFound(Utf8PathBuf),

    #[error("{path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write tsconfig overlay: {0}")]
    Json(#[from] serde_json::Error),
}

impl TscError {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>) -> impl FnOnce(std::io::Error) -> TscError {
        let path = path.into();
        move |source| TscError::Io { path, source }
    }
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}
