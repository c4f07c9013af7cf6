//! Module exclusion filter.

use crate::BundleError;
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Include/exclude globs, matched against paths relative to the declaration
/// tree root.
///
/// Modules rejected by the filter are replaced with empty stubs while
/// bundling. Entry modules are never filtered.
#[derive(Debug, Clone)]
pub struct ModuleFilter {
    root: Utf8PathBuf,
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl ModuleFilter {
    pub fn new<S: AsRef<str>>(
        root: impl Into<Utf8PathBuf>,
        include: &[S],
        exclude: &[S],
    ) -> Result<Self, BundleError> {
        Ok(Self {
            root: root.into(),
            include: build_set(include)?,
            exclude: build_set(exclude)?,
        })
    }

    /// A filter that accepts every module.
    pub fn allow_all(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            include: None,
            exclude: None,
        }
    }

    pub fn includes(&self, path: &Utf8Path) -> bool {
        let candidate = path.strip_prefix(&self.root).unwrap_or(path);
        let included = self
            .include
            .as_ref()
            .map_or(true, |set| set.is_match(candidate.as_str()));
        let excluded = self
            .exclude
            .as_ref()
            .is_some_and(|set| set.is_match(candidate.as_str()));
        included && !excluded
    }
}

fn build_set<S: AsRef<str>>(patterns: &[S]) -> Result<Option<GlobSet>, BundleError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let glob = Glob::new(pattern.trim_start_matches("./")).map_err(|source| BundleError::Glob {
            pattern: pattern.to_string(),
            source,
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map(Some)
        .map_err(|source| BundleError::Glob {
            pattern: patterns
                .iter()
                .map(|p| p.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
            source,
        })
}
