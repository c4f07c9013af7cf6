//! The declaration emitter contract and strategy selection.

use crate::error::TscError;
use crate::isolated::IsolatedEmitter;
use crate::process::ProcessEmitter;
use crate::unit::CheckUnit;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Everything an emitter needs for one run.
#[derive(Debug, Clone)]
pub struct EmitRequest {
    /// Project root. Unit paths are laid out relative to it.
    pub root: Utf8PathBuf,
    /// The project's resolved tsconfig.
    pub tsconfig: Utf8PathBuf,
    /// Resolved `baseUrl`, if the project sets one.
    pub base_url: Option<Utf8PathBuf>,
    /// Every file to check, registered together.
    pub units: Vec<CheckUnit>,
    /// Where declaration files are written, mirroring paths under `root`.
    pub out_dir: Utf8PathBuf,
    /// Working area the emitter may fill freely.
    pub work_dir: Utf8PathBuf,
    /// Extra compiler options, applied over the project's.
    pub compiler_options: Map<String, Value>,
    /// Check without writing anything.
    pub no_emit: bool,
}

impl EmitRequest {
    pub fn new(
        root: impl Into<Utf8PathBuf>,
        tsconfig: impl Into<Utf8PathBuf>,
        out_dir: impl Into<Utf8PathBuf>,
        work_dir: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            root: root.into(),
            tsconfig: tsconfig.into(),
            base_url: None,
            units: Vec::new(),
            out_dir: out_dir.into(),
            work_dir: work_dir.into(),
            compiler_options: Map::new(),
            no_emit: false,
        }
    }

    /// Where the declaration of `unit` ends up.
    pub fn output_path(&self, unit: &CheckUnit) -> Utf8PathBuf {
        let relative = crate::unit::relative_to(&unit.path, &self.root);
        self.out_dir
            .join(crate::unit::declaration_file_name(&relative))
    }
}

/// What an emitter produced.
#[derive(Debug, Clone, Default)]
pub struct EmitReport {
    /// Declaration files written, sorted.
    pub files: Vec<Utf8PathBuf>,
    /// Non-blocking diagnostics, e.g. warnings.
    pub warnings: Vec<crate::Diagnostic>,
}

/// Produces a declaration tree for a set of units, or fails without
/// leaving partial output.
#[allow(async_fn_in_trait)]
pub trait DeclarationEmitter {
    async fn emit(&self, request: &EmitRequest) -> Result<EmitReport, TscError>;
}

/// The checker a build runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckerKind {
    /// `tsc` from the `typescript` package.
    #[default]
    Tsc,
    /// `tsgo`, the native TypeScript preview.
    Tsgo,
    /// In-process emission without type-checking.
    Isolated,
}

impl CheckerKind {
    /// The executable name, for process checkers.
    pub fn binary_name(self) -> Option<&'static str> {
        match self {
            CheckerKind::Tsc => Some("tsc"),
            CheckerKind::Tsgo => Some("tsgo"),
            CheckerKind::Isolated => None,
        }
    }
}

impl fmt::Display for CheckerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckerKind::Tsc => "tsc",
            CheckerKind::Tsgo => "tsgo",
            CheckerKind::Isolated => "isolated",
        })
    }
}

impl FromStr for CheckerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tsc" => Ok(CheckerKind::Tsc),
            "tsgo" => Ok(CheckerKind::Tsgo),
            "isolated" => Ok(CheckerKind::Isolated),
            other => Err(format!(
                "unknown checker `{other}` (expected tsc, tsgo or isolated)"
            )),
        }
    }
}

/// The emitter selected for a build.
#[derive(Debug, Clone)]
pub enum EmitStrategy {
    Process(ProcessEmitter),
    Isolated(IsolatedEmitter),
}

impl EmitStrategy {
    /// Picks the emitter for `kind`, locating the checker binary from `root`.
    pub fn for_checker(kind: CheckerKind, root: &Utf8Path) -> Result<Self, TscError> {
        match kind {
            CheckerKind::Isolated => Ok(EmitStrategy::Isolated(IsolatedEmitter::new())),
            kind => ProcessEmitter::find(kind, root)
                .map(EmitStrategy::Process)
                .ok_or(TscError::NotFound { checker: kind }),
        }
    }

    pub fn checker(&self) -> CheckerKind {
        match self {
            EmitStrategy::Process(emitter) => emitter.kind(),
            EmitStrategy::Isolated(_) => CheckerKind::Isolated,
        }
    }
}

impl DeclarationEmitter for EmitStrategy {
    async fn emit(&self, request: &EmitRequest) -> Result<EmitReport, TscError> {
        match self {
            EmitStrategy::Process(emitter) => emitter.emit(request).await,
            EmitStrategy::Isolated(emitter) => emitter.emit(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_checker_kind_round_trip() {
        for kind in [CheckerKind::Tsc, CheckerKind::Tsgo, CheckerKind::Isolated] {
            assert_eq!(kind.to_string().parse::<CheckerKind>(), Ok(kind));
        }
        assert!("swc".parse::<CheckerKind>().is_err());
    }

    #[test]
    fn test_output_path() {
        let request = EmitRequest::new("/p", "/p/tsconfig.json", "/p/dist/.temp/dts", "/p/dist/.temp");
        assert_eq!(
            request.output_path(&CheckUnit::on_disk("/p/src/a/b.ts")),
            "/p/dist/.temp/dts/src/a/b.d.ts"
        );
        let component =
            CheckUnit::text("/p/src/App.vue", "/p/src/App.vue.ts", String::new(), None);
        assert_eq!(
            request.output_path(&component),
            "/p/dist/.temp/dts/src/App.vue.d.ts"
        );
    }

    #[test]
    fn test_isolated_needs_no_binary() {
        let strategy = EmitStrategy::for_checker(CheckerKind::Isolated, Utf8Path::new("/nowhere"))
            .unwrap();
        assert_eq!(strategy.checker(), CheckerKind::Isolated);
    }
}
