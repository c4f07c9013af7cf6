//! Declaration bundling.
//!
//! Rolls the per-file declarations emitted for a project into one
//! self-contained declaration file per entry point:
//!
//! - [`normalize_entries`] turns the user's entry specification into an
//!   [`EntryTable`] pointing into the declaration tree.
//! - [`Bundler`] follows local imports from every entry, inlines what lives in
//!   the tree, keeps external imports, stubs out modules rejected by the
//!   [`ModuleFilter`] and renames colliding top-level names.

mod bundle;
mod entry;
mod error;
mod external;
mod filter;
mod module;
mod naming;
mod rename;
mod resolve;

pub use bundle::{BundleOptions, Bundler};
pub use entry::{declaration_path, entry_alias, normalize_entries, EntrySpec, EntryTable};
pub use error::BundleError;
pub use external::ExternalPredicate;
pub use filter::ModuleFilter;
pub use naming::{unscoped_name, FileNamePolicy};
pub use resolve::{normalize_path, PathAliases};

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One bundled output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundledChunk {
    /// The entry alias.
    pub name: String,
    /// Output file name, relative to the output directory.
    pub file_name: String,
    pub code: String,
    pub is_entry: bool,
    /// The declaration file the chunk was rolled up from.
    pub facade_module_id: Option<Utf8PathBuf>,
    /// Every inlined declaration file, dependencies first.
    pub module_ids: Vec<Utf8PathBuf>,
    /// Names exported by the chunk.
    pub exports: Vec<String>,
}

/// How the entry's exports are validated, after rollup's `output.exports`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportsMode {
    #[default]
    Auto,
    Named,
    /// The entry must export exactly a default export.
    Default,
    /// The entry must not export anything.
    None,
}

impl fmt::Display for ExportsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportsMode::Auto => "auto",
            ExportsMode::Named => "named",
            ExportsMode::Default => "default",
            ExportsMode::None => "none",
        })
    }
}

/// Output settings shared by every chunk of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputOptions {
    pub dir: Utf8PathBuf,
    pub exports: ExportsMode,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            dir: Utf8PathBuf::from("dist"),
            exports: ExportsMode::Auto,
        }
    }
}
