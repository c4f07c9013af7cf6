//! Runs `tsc` or `tsgo` as a child process.

use crate::diagnostic::{parse_output, Diagnostic};
use crate::emitter::{CheckerKind, DeclarationEmitter, EmitReport, EmitRequest};
use crate::error::TscError;
use crate::unit::{relative_to, CheckUnit, UnitContent};
use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;
use serde_json::{json, Map, Value};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};
use walkdir::WalkDir;

const OVERLAY_FILE_NAME: &str = "tsconfig.lib-types.json";

/// Emits declarations with an external checker binary.
///
/// Units are staged into a private tree so rewritten units can sit next to
/// the files that import them, and the checker runs against an overlay
/// tsconfig that extends the project's.
#[derive(Debug, Clone)]
pub struct ProcessEmitter {
    kind: CheckerKind,
    binary: Utf8PathBuf,
}

impl ProcessEmitter {
    pub fn new(kind: CheckerKind, binary: impl Into<Utf8PathBuf>) -> Self {
        Self {
            kind,
            binary: binary.into(),
        }
    }

    /// Locates the checker binary and builds an emitter for it.
    pub fn find(kind: CheckerKind, root: &Utf8Path) -> Option<Self> {
        let name = kind.binary_name()?;
        find_binary(name, root).map(|binary| Self::new(kind, binary))
    }

    pub fn kind(&self) -> CheckerKind {
        self.kind
    }

    pub fn binary(&self) -> &Utf8Path {
        &self.binary
    }

    /// Compiler arguments for a run against `overlay`.
    pub fn arguments(
        &self,
        request: &EmitRequest,
        staging: &Utf8Path,
        overlay: &Utf8Path,
    ) -> Vec<String> {
        let mut args = Vec::new();
        if request.no_emit {
            args.push("--noEmit".to_string());
        } else {
            args.extend(
                ["--declaration", "--emitDeclarationOnly"]
                    .iter()
                    .map(|s| s.to_string()),
            );
        }
        args.extend(["--pretty".to_string(), "false".to_string()]);
        if !request.no_emit {
            args.extend([
                "--outDir".to_string(),
                request.out_dir.to_string(),
                "--rootDir".to_string(),
                staging.to_string(),
            ]);
        }
        args.extend(["--project".to_string(), overlay.to_string()]);
        args
    }
}

/// Finds `name` in `node_modules/.bin` from `root` upward, then on `PATH`,
/// then in common install locations.
pub fn find_binary(name: &str, root: &Utf8Path) -> Option<Utf8PathBuf> {
    for dir in root.ancestors() {
        let candidate = dir.join("node_modules/.bin").join(name);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(path) = which::which(name) {
        if let Ok(path) = Utf8PathBuf::try_from(path) {
            return Some(path);
        }
    }

    let common = [
        format!("/usr/local/bin/{name}"),
        format!("/usr/bin/{name}"),
        format!("~/.local/bin/{name}"),
    ];
    common.iter().find_map(|path| {
        let expanded = shellexpand::tilde(path);
        let path = Utf8Path::new(expanded.as_ref());
        path.exists().then(|| path.to_owned())
    })
}

impl DeclarationEmitter for ProcessEmitter {
    async fn emit(&self, request: &EmitRequest) -> Result<EmitReport, TscError> {
        if !request.tsconfig.exists() {
            return Err(TscError::TsconfigNotFound(request.tsconfig.clone()));
        }

        let staging = request.work_dir.join("staging");
        let staged = stage_units(request, &staging)?;
        link_node_modules(&request.root, &staging)?;
        let overlay = write_overlay(request, &staging, &staged)?;

        let args = self.arguments(request, &staging, &overlay);
        info!(checker = %self.kind, "{} {}", self.binary, args.join(" "));
        let output = Command::new(&self.binary)
            .args(&args)
            .current_dir(&staging)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| TscError::Spawn {
                program: self.binary.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostics: Vec<Diagnostic> = parse_output(&stdout)
            .into_iter()
            .chain(parse_output(&stderr))
            .map(|diagnostic| map_to_original(diagnostic, request, &staging, &staged))
            .collect();
        let (errors, warnings): (Vec<_>, Vec<_>) =
            diagnostics.into_iter().partition(Diagnostic::is_error);

        if !errors.is_empty() {
            clear_output(&request.out_dir)?;
            return Err(TscError::Diagnostics(errors));
        }
        if !output.status.success() {
            clear_output(&request.out_dir)?;
            let stderr = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(TscError::ProcessFailed {
                program: self.binary.clone(),
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }
        if request.no_emit {
            return Ok(EmitReport {
                files: Vec::new(),
                warnings,
            });
        }

        copy_declaration_units(request)?;
        Ok(EmitReport {
            files: collect_files(&request.out_dir),
            warnings,
        })
    }
}

/// Staged path to unit index.
type Staged = FxHashMap<Utf8PathBuf, usize>;

fn stage_units(request: &EmitRequest, staging: &Utf8Path) -> Result<Staged, TscError> {
    if staging.exists() {
        std::fs::remove_dir_all(staging).map_err(TscError::io(staging))?;
    }
    std::fs::create_dir_all(staging).map_err(TscError::io(staging))?;

    let mut staged = Staged::default();
    for (idx, unit) in request.units.iter().enumerate() {
        let target = staging.join(relative_to(&unit.path, &request.root));
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(TscError::io(parent))?;
        }
        match &unit.content {
            UnitContent::OnDisk => {
                // Hard links keep the tree cheap; copy across devices.
                if std::fs::hard_link(&unit.path, &target).is_err() {
                    std::fs::copy(&unit.path, &target).map_err(TscError::io(&unit.path))?;
                }
            }
            UnitContent::Text { code, .. } => {
                std::fs::write(&target, code).map_err(TscError::io(&target))?;
            }
        }
        staged.insert(target, idx);
    }
    debug!(units = staged.len(), %staging, "staged units");
    Ok(staged)
}

fn link_node_modules(root: &Utf8Path, staging: &Utf8Path) -> Result<(), TscError> {
    let Some(source) = root
        .ancestors()
        .map(|dir| dir.join("node_modules"))
        .find(|dir| dir.is_dir())
    else {
        return Ok(());
    };
    let target = staging.join("node_modules");
    if target.exists() {
        return Ok(());
    }
    #[cfg(unix)]
    std::os::unix::fs::symlink(&source, &target).map_err(TscError::io(&target))?;
    #[cfg(windows)]
    std::os::windows::fs::symlink_dir(&source, &target).map_err(TscError::io(&target))?;
    Ok(())
}

/// Writes the tsconfig the checker runs against.
fn write_overlay(
    request: &EmitRequest,
    staging: &Utf8Path,
    staged: &Staged,
) -> Result<Utf8PathBuf, TscError> {
    let mut files: Vec<String> = staged
        .keys()
        .map(|path| relative_to(path, staging).to_string())
        .collect();
    files.sort();

    let mut options = request.compiler_options.clone();
    options.insert("rootDir".to_string(), json!(staging.as_str()));
    if let Some(base_url) = &request.base_url {
        let base_url = match base_url.strip_prefix(&request.root) {
            Ok(relative) => staging.join(relative),
            Err(_) => base_url.clone(),
        };
        options.insert("baseUrl".to_string(), json!(base_url.as_str()));
    }
    for (key, value) in [
        ("noEmitOnError", true),
        ("incremental", false),
        ("composite", false),
        ("declarationMap", false),
        ("sourceMap", false),
    ] {
        options.insert(key.to_string(), Value::Bool(value));
    }

    let mut overlay = Map::new();
    overlay.insert("extends".to_string(), json!(request.tsconfig.as_str()));
    overlay.insert("compilerOptions".to_string(), Value::Object(options));
    overlay.insert("files".to_string(), json!(files));
    overlay.insert("include".to_string(), json!([]));

    let path = staging.join(OVERLAY_FILE_NAME);
    let content = serde_json::to_string_pretty(&Value::Object(overlay))?;
    std::fs::write(&path, content).map_err(TscError::io(&path))?;
    Ok(path)
}

/// Rewrites a diagnostic's location from the staging tree to the project.
fn map_to_original(
    mut diagnostic: Diagnostic,
    request: &EmitRequest,
    staging: &Utf8Path,
    staged: &Staged,
) -> Diagnostic {
    let Some(file) = &diagnostic.file else {
        return diagnostic;
    };
    let absolute = if file.is_absolute() {
        file.clone()
    } else {
        staging.join(file)
    };

    if let Some(unit) = staged.get(&absolute).map(|&idx| &request.units[idx]) {
        let (line, column) = unit.original_position(diagnostic.line, diagnostic.column);
        diagnostic.file = Some(unit.original_path.clone());
        diagnostic.line = line;
        diagnostic.column = column;
    } else if let Ok(relative) = absolute.strip_prefix(staging) {
        diagnostic.file = Some(request.root.join(relative));
    }
    diagnostic
}

/// The checker does not emit anything for `.d.ts` inputs, but the bundler
/// follows imports into them.
fn copy_declaration_units(request: &EmitRequest) -> Result<(), TscError> {
    for unit in request.units.iter().filter(|unit| unit.is_declaration()) {
        write_declaration(request, unit)?;
    }
    Ok(())
}

pub(crate) fn write_declaration(request: &EmitRequest, unit: &CheckUnit) -> Result<(), TscError> {
    let target = request.output_path(unit);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(TscError::io(parent))?;
    }
    let text = unit.read()?;
    std::fs::write(&target, text.as_bytes()).map_err(TscError::io(&target))
}

pub(crate) fn clear_output(out_dir: &Utf8Path) -> Result<(), TscError> {
    if out_dir.exists() {
        std::fs::remove_dir_all(out_dir).map_err(TscError::io(out_dir))?;
    }
    Ok(())
}

pub(crate) fn collect_files(dir: &Utf8Path) -> Vec<Utf8PathBuf> {
    let mut files: Vec<Utf8PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| Utf8PathBuf::from_path_buf(entry.into_path()).ok())
        .collect();
    files.sort();
    files
}
