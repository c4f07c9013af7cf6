//! The build pipeline: discover, pre-parse, emit, bundle, transform.

use crate::config::{ModulePatterns, TsConfig, TsConfigOverrides};
use crate::error::BuildError;
use crate::package::PackageJson;
use crate::parsers::{check_unit, default_parsers, parse_unit, ParseContext, SharedParser};
use camino::{Utf8Path, Utf8PathBuf};
use dts_bundler::{
    normalize_entries, normalize_path, BundleOptions, BundledChunk, Bundler, EntrySpec,
    ExportsMode, ExternalPredicate, FileNamePolicy, ModuleFilter, OutputOptions,
};
use dts_transformer::{apply_transformers, SharedTransformer, TransformContext};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::fs;
use tracing::{debug, info, warn};
use tsc_runner::{
    CheckUnit, CheckerKind, DeclarationEmitter, EmitRequest, EmitStrategy, ScratchDir,
};
use walkdir::WalkDir;

/// Directory names never walked during discovery.
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git"];

/// A finished declaration file, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmittedAsset {
    /// The entry alias.
    pub name: String,
    /// Destination, relative to the output directory.
    pub file_name: String,
    pub source: String,
}

/// Everything a build needs. Relative paths resolve against `root`.
#[derive(Clone)]
pub struct BuildOptions {
    pub root: Utf8PathBuf,
    pub entry: EntrySpec,
    pub out_dir: Utf8PathBuf,
    /// Defaults to `<out_dir>/.temp`.
    pub temp_dir: Option<Utf8PathBuf>,
    /// Defaults to the nearest `tsconfig.json` at or above `root`.
    pub tsconfig_path: Option<Utf8PathBuf>,
    pub tsconfig: TsConfigOverrides,
    /// Tried in order for every discovered file.
    pub parsers: Vec<SharedParser>,
    pub checker: CheckerKind,
    /// Type-check only.
    pub no_emit: bool,
    pub external: ExternalPredicate,
    pub respect_external: bool,
    pub file_name: FileNamePolicy,
    pub exports: ExportsMode,
    /// Applied in order to every chunk.
    pub transformers: Vec<SharedTransformer>,
    /// Bundler include/exclude, relative to the declaration tree.
    pub module_filter: ModulePatterns,
}

impl BuildOptions {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            entry: EntrySpec::default(),
            out_dir: Utf8PathBuf::from("dist"),
            temp_dir: None,
            tsconfig_path: None,
            tsconfig: TsConfigOverrides::default(),
            parsers: default_parsers(),
            checker: CheckerKind::default(),
            no_emit: false,
            external: ExternalPredicate::default(),
            respect_external: false,
            file_name: FileNamePolicy::default(),
            exports: ExportsMode::default(),
            transformers: Vec::new(),
            module_filter: ModulePatterns::default(),
        }
    }

    pub fn entry(mut self, entry: EntrySpec) -> Self {
        self.entry = entry;
        self
    }

    pub fn out_dir(mut self, out_dir: impl Into<Utf8PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    pub fn temp_dir(mut self, temp_dir: impl Into<Utf8PathBuf>) -> Self {
        self.temp_dir = Some(temp_dir.into());
        self
    }

    pub fn checker(mut self, checker: CheckerKind) -> Self {
        self.checker = checker;
        self
    }

    pub fn no_emit(mut self, no_emit: bool) -> Self {
        self.no_emit = no_emit;
        self
    }

    pub fn external(mut self, external: ExternalPredicate) -> Self {
        self.external = external;
        self
    }

    pub fn file_name(mut self, file_name: FileNamePolicy) -> Self {
        self.file_name = file_name;
        self
    }

    pub fn parser(mut self, parser: SharedParser) -> Self {
        self.parsers.push(parser);
        self
    }

    pub fn transformer(mut self, transformer: SharedTransformer) -> Self {
        self.transformers.push(transformer);
        self
    }

    /// `root` made absolute against the working directory.
    fn absolute_root(&self) -> Result<Utf8PathBuf, BuildError> {
        if self.root.is_absolute() {
            return Ok(normalize_path(&self.root));
        }
        let cwd = std::env::current_dir().map_err(BuildError::io(&self.root))?;
        let cwd = Utf8PathBuf::try_from(cwd).map_err(|err| BuildError::Io {
            path: self.root.clone(),
            source: err.into_io_error(),
        })?;
        Ok(normalize_path(&cwd.join(&self.root)))
    }
}

impl fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |names: Vec<&str>| names.join(", ");
        f.debug_struct("BuildOptions")
            .field("root", &self.root)
            .field("entry", &self.entry)
            .field("out_dir", &self.out_dir)
            .field("temp_dir", &self.temp_dir)
            .field("tsconfig_path", &self.tsconfig_path)
            .field("tsconfig", &self.tsconfig)
            .field("parsers", &names(self.parsers.iter().map(|p| p.name()).collect()))
            .field("checker", &self.checker)
            .field("no_emit", &self.no_emit)
            .field("external", &self.external)
            .field("respect_external", &self.respect_external)
            .field("file_name", &self.file_name)
            .field("exports", &self.exports)
            .field(
                "transformers",
                &names(self.transformers.iter().map(|t| t.name()).collect()),
            )
            .field("module_filter", &self.module_filter)
            .finish()
    }
}

/// Runs a full build and returns the finished declaration files.
///
/// The temporary declaration tree is removed before returning, whether the
/// build succeeded or not. With `no_emit` the project is only checked and
/// no assets are returned.
pub async fn build(options: &BuildOptions) -> Result<Vec<EmittedAsset>, BuildError> {
    let root = options.absolute_root()?;
    let tsconfig = TsConfig::find(&root, options.tsconfig_path.as_deref())?;
    let strategy =
        EmitStrategy::for_checker(options.checker, &root).map_err(|e| BuildError::from_tsc(e, &root))?;

    let out_dir = normalize_path(&root.join(&options.out_dir));
    let temp_dir = match &options.temp_dir {
        Some(dir) => normalize_path(&root.join(dir)),
        None => out_dir.join(".temp"),
    };

    let include = tsconfig.include_patterns(&root, &options.tsconfig.include);
    let exclude = tsconfig.exclude_patterns(&root, &options.tsconfig.exclude);
    let files = discover(&root, &include, &exclude, &[out_dir.as_path(), temp_dir.as_path()])?;
    info!(count = files.len(), "discovered source files");

    let units = files
        .par_iter()
        .map(|file| -> Result<CheckUnit, BuildError> {
            let code = fs::read_to_string(file).map_err(BuildError::io(file))?;
            let ctx = ParseContext {
                root: &root,
                file_path: file,
            };
            let outcome = parse_unit(&options.parsers, &code, &ctx)?;
            Ok(check_unit(file, outcome))
        })
        .collect::<Result<Vec<CheckUnit>, BuildError>>()?;

    let scratch = ScratchDir::acquire(&temp_dir).map_err(|e| BuildError::from_tsc(e, &root))?;
    let decl_root = scratch.join("dts");

    let mut request = EmitRequest::new(&root, &tsconfig.path, &decl_root, scratch.path());
    request.base_url = tsconfig.compiler_options.base_url.clone();
    request.units = units;
    request.compiler_options = options.tsconfig.compiler_options.clone();
    request.no_emit = options.no_emit;

    info!(checker = %strategy.checker(), units = request.units.len(), "type-checking");
    let report = strategy
        .emit(&request)
        .await
        .map_err(|e| BuildError::from_tsc(e, &root))?;
    for warning in &report.warnings {
        warn!("{warning}");
    }
    if options.no_emit {
        info!("check passed; nothing emitted");
        return Ok(Vec::new());
    }
    debug!(files = report.files.len(), "declaration tree written");

    let entries = normalize_entries(&options.entry, &root, &decl_root);
    let package_name = PackageJson::find(&root, None)?.and_then(|package| package.name);

    let mut bundle_options = BundleOptions::new(&root, &decl_root);
    bundle_options.external = options.external.clone();
    bundle_options.respect_external = options.respect_external;
    bundle_options.aliases = tsconfig.path_aliases(&root);
    bundle_options.filter = ModuleFilter::new(
        &decl_root,
        options.module_filter.include.as_slice(),
        options.module_filter.exclude.as_slice(),
    )?;
    bundle_options.file_name = options.file_name.clone();
    bundle_options.package_name = package_name;
    bundle_options.output = OutputOptions {
        dir: out_dir,
        exports: options.exports,
    };

    let bundler = Bundler::new(bundle_options);
    let chunks = bundler.bundle(&entries)?;
    let assets = transform_chunks(&chunks, &options.transformers, &root, &bundler.options().output)?;

    drop(scratch);
    Ok(assets)
}

/// Runs the transformer chain over every chunk.
fn transform_chunks(
    chunks: &indexmap::IndexMap<String, BundledChunk>,
    transformers: &[SharedTransformer],
    root: &Utf8Path,
    output: &OutputOptions,
) -> Result<Vec<EmittedAsset>, BuildError> {
    let ctx = TransformContext {
        root,
        chunks,
        output,
    };
    let ordered: Vec<&BundledChunk> = chunks.values().collect();
    ordered
        .par_iter()
        .map(|chunk| -> Result<EmittedAsset, BuildError> {
            let source = apply_transformers(transformers, chunk, &ctx)
                .map_err(|err| BuildError::transform(&chunk.file_name, err))?;
            Ok(EmittedAsset {
                name: chunk.name.clone(),
                file_name: chunk.file_name.clone(),
                source,
            })
        })
        .collect()
}

/// Files under `root` matching `include` and not `exclude`, sorted.
fn discover(
    root: &Utf8Path,
    include: &[String],
    exclude: &[String],
    skip: &[&Utf8Path],
) -> Result<Vec<Utf8PathBuf>, BuildError> {
    let include = glob_set(include)?;
    let exclude = glob_set(exclude)?;

    let mut files: Vec<Utf8PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !SKIPPED_DIRS.contains(&name.as_ref())
                && !skip.iter().any(|dir| entry.path() == dir.as_std_path())
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
        .filter(|path| {
            let relative = path.strip_prefix(root).unwrap_or(path);
            include.is_match(relative.as_str()) && !exclude.is_match(relative.as_str())
        })
        .collect();
    files.sort();
    Ok(files)
}

fn glob_set(patterns: &[String]) -> Result<GlobSet, BuildError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| {
            BuildError::Bundle(dts_bundler::BundleError::Glob {
                pattern: pattern.clone(),
                source,
            })
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| {
        BuildError::Bundle(dts_bundler::BundleError::Glob {
            pattern: patterns.join(", "),
            source,
        })
    })
}

/// Writes `assets` under `out_dir`, returning the written paths.
pub fn write_assets(out_dir: &Utf8Path, assets: &[EmittedAsset]) -> Result<Vec<Utf8PathBuf>, BuildError> {
    let mut written = Vec::with_capacity(assets.len());
    for asset in assets {
        let path = out_dir.join(&asset.file_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(BuildError::io(parent))?;
        }
        fs::write(&path, &asset.source).map_err(BuildError::io(&path))?;
        debug!(path = %path, "wrote declaration bundle");
        written.push(path);
    }
    Ok(written)
}
