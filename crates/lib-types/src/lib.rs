//! Declaration bundling for TypeScript libraries.
//!
//! [`build`] discovers a project's sources, pre-parses component files,
//! type-checks and emits one declaration per source, rolls the declarations
//! up into one file per entry point and runs the configured transformers
//! over every bundle.
//!
//! ```ignore
//! use lib_types::{build, write_assets, BuildOptions};
//! use dts_transformer::{RemoveOptions, RemoveTransformer};
//! use camino::Utf8Path;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), lib_types::BuildError> {
//! let remove = RemoveTransformer::new(RemoveOptions {
//!     annotation_tags: vec!["internal".into()],
//!     ..RemoveOptions::default()
//! })
//! .map_err(|err| lib_types::BuildError::transform("setup", err))?;
//! let options = BuildOptions::new("/path/to/lib").transformer(Arc::new(remove));
//!
//! let assets = build(&options).await?;
//! write_assets(Utf8Path::new("/path/to/lib/dist"), &assets)?;
//! # Ok(())
//! # }
//! ```

pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod package;
pub mod parsers;

pub use build::{build, write_assets, BuildOptions, EmittedAsset};
pub use config::{
    ConfigError, ModulePatterns, ProjectConfig, TransformerConfig, TsConfig, TsConfigOverrides,
};
pub use error::BuildError;
pub use output::{format_report, format_summary};
pub use package::{find_package_json, PackageJson};
pub use parsers::{
    default_parsers, parse_unit, ParseContext, ParseOutcome, PreParseError, SharedParser,
    UnitParser, VueParser,
};
