//! CLI argument parsing.

use crate::build::BuildOptions;
use crate::config::{ProjectConfig, PROJECT_CONFIG_FILE};
use crate::error::BuildError;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use dts_bundler::{normalize_path, EntrySpec, ExternalPredicate, FileNamePolicy};
use tsc_runner::CheckerKind;

/// Bundles a library's TypeScript declarations into one file per entry.
#[derive(Debug, Parser)]
#[command(name = "lib-types")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Entry file, relative to the working directory [default: ./src/index.ts]
    #[arg(value_name = "ENTRY")]
    pub entry: Option<Utf8PathBuf>,

    /// Project root
    #[arg(long, default_value = ".")]
    pub root: Utf8PathBuf,

    /// Output directory, relative to the root [default: dist]
    #[arg(long = "outDir")]
    pub out_dir: Option<Utf8PathBuf>,

    /// Temporary declaration directory [default: <outDir>/.temp]
    #[arg(long = "tempDir")]
    pub temp_dir: Option<Utf8PathBuf>,

    /// Path to tsconfig.json, relative to the root
    #[arg(long)]
    pub tsconfig: Option<Utf8PathBuf>,

    /// Path to lib-types.json [default: <root>/lib-types.json]
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Checker used to emit declarations (tsc, tsgo or isolated)
    #[arg(long)]
    pub checker: Option<CheckerKind>,

    /// Module kept as an import instead of being inlined; `/regex/` allowed
    #[arg(long)]
    pub external: Vec<String>,

    /// Inline declarations of installed packages that are not external
    #[arg(long = "respect-external")]
    pub respect_external: bool,

    /// Output file name template; `[name]` is the entry alias
    #[arg(long = "file-name")]
    pub file_name: Option<String>,

    /// Type-check without writing declarations
    #[arg(long = "no-emit")]
    pub no_emit: bool,

    /// Log every pipeline step
    #[arg(long, short)]
    pub verbose: bool,
}

impl Args {
    /// Merges the flags over `lib-types.json`, resolving paths against `cwd`.
    pub fn into_options(self, cwd: &Utf8Path) -> Result<BuildOptions, BuildError> {
        let root = normalize_path(&cwd.join(&self.root));
        let (config, config_path) = match &self.config {
            Some(path) => {
                let path = cwd.join(path);
                (ProjectConfig::load(&path)?, path)
            }
            None => (
                ProjectConfig::find(&root)?.unwrap_or_default(),
                root.join(PROJECT_CONFIG_FILE),
            ),
        };

        let mut options = BuildOptions::new(&root);
        options.entry = match self.entry {
            Some(entry) => EntrySpec::Single(normalize_path(&cwd.join(entry))),
            None => config.entry.clone().unwrap_or_default(),
        };
        if let Some(out_dir) = self.out_dir.or_else(|| config.out_dir.clone()) {
            options.out_dir = out_dir;
        }
        options.temp_dir = self.temp_dir.or_else(|| config.temp_dir.clone());
        options.tsconfig_path = self.tsconfig.or_else(|| config.tsconfig_path.clone());
        options.tsconfig = config.tsconfig.clone();
        options.checker = self.checker.or(config.checker).unwrap_or_default();
        options.no_emit = self.no_emit || config.no_emit.unwrap_or(false);

        let external = if self.external.is_empty() {
            &config.external
        } else {
            &self.external
        };
        options.external = ExternalPredicate::from_list(external.as_slice())?;
        options.respect_external = self.respect_external || config.respect_external.unwrap_or(false);
        if let Some(template) = self.file_name.or_else(|| config.file_name.clone()) {
            options.file_name = FileNamePolicy::Template(template);
        }
        options.exports = config.exports.unwrap_or_default();
        options.transformers = config.build_transformers(&config_path)?;
        options.module_filter = config.modules;
        Ok(options)
    }
}
