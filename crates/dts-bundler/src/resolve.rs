//! Import specifier resolution inside the declaration tree.

use crate::external::ExternalPredicate;
use crate::filter::ModuleFilter;
use crate::BundleError;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use tracing::debug;

/// Lexically resolves `.` and `..` components.
pub fn normalize_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_str()),
        }
    }
    out
}

/// tsconfig `paths`, relative to `base_url`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathAliases {
    /// `baseUrl` relative to the project root.
    pub base_url: Utf8PathBuf,
    pub paths: IndexMap<String, Vec<String>>,
}

impl PathAliases {
    /// Candidate targets for `specifier`, relative to the project root.
    fn candidates(&self, specifier: &str) -> Option<Vec<Utf8PathBuf>> {
        for (pattern, targets) in &self.paths {
            let captured = match pattern.split_once('*') {
                Some((prefix, suffix)) => specifier
                    .strip_prefix(prefix)
                    .and_then(|rest| rest.strip_suffix(suffix)),
                None => (pattern == specifier).then_some(""),
            };
            if let Some(captured) = captured {
                return Some(
                    targets
                        .iter()
                        .map(|target| self.base_url.join(target.replacen('*', captured, 1)))
                        .collect(),
                );
            }
        }
        None
    }
}

/// How an import specifier is satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// A declaration file to inline.
    Local(Utf8PathBuf),
    /// Kept as an import.
    External,
    /// A declaration file excluded by the module filter.
    Stub(Utf8PathBuf),
}

pub(crate) struct Resolver<'a> {
    pub decl_root: &'a Utf8Path,
    pub aliases: &'a PathAliases,
    pub external: &'a ExternalPredicate,
    pub filter: &'a ModuleFilter,
    /// Set when bare specifiers are looked up in `node_modules`.
    pub node_modules: Option<&'a Utf8Path>,
}

impl Resolver<'_> {
    pub fn resolve(&self, specifier: &str, importer: &Utf8Path) -> Result<Resolution, BundleError> {
        let unresolved = || BundleError::Unresolved {
            specifier: specifier.to_string(),
            importer: importer.to_path_buf(),
        };

        if self.external.is_external(specifier) {
            return Ok(Resolution::External);
        }

        if is_path_like(specifier) {
            let base = importer.parent().unwrap_or(self.decl_root);
            let found = probe(&normalize_path(&base.join(specifier))).ok_or_else(unresolved)?;
            return Ok(self.filtered(found));
        }

        if let Some(candidates) = self.aliases.candidates(specifier) {
            return candidates
                .iter()
                .find_map(|candidate| probe(&normalize_path(&self.decl_root.join(candidate))))
                .map(|found| self.filtered(found))
                .ok_or_else(unresolved);
        }

        if let Some(node_modules) = self.node_modules {
            if let Some(found) = resolve_package(node_modules, specifier) {
                debug!(specifier, path = %found, "inlining package declarations");
                return Ok(self.filtered(found));
            }
        }
        Ok(Resolution::External)
    }

    fn filtered(&self, path: Utf8PathBuf) -> Resolution {
        if self.filter.includes(&path) {
            Resolution::Local(path)
        } else {
            debug!(path = %path, "module excluded, using an empty stub");
            Resolution::Stub(path)
        }
    }
}

fn is_path_like(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier == "."
        || specifier == ".."
        || Utf8Path::new(specifier).is_absolute()
}

fn is_declaration(path: &Utf8Path) -> bool {
    let name = path.as_str();
    name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts")
}

/// The declaration file `path` refers to, trying in order: `path` itself,
/// `path.d.ts`, `path` with its script extension swapped, `path/index.d.ts`.
pub(crate) fn probe(path: &Utf8Path) -> Option<Utf8PathBuf> {
    let mut candidates = Vec::with_capacity(4);
    if is_declaration(path) {
        candidates.push(path.to_path_buf());
    }
    candidates.push(Utf8PathBuf::from(format!("{path}.d.ts")));
    if let Some(ext) = path.extension() {
        let declaration = match ext {
            "js" | "ts" | "jsx" | "tsx" => Some("d.ts"),
            "mjs" | "mts" => Some("d.mts"),
            "cjs" | "cts" => Some("d.cts"),
            _ => None,
        };
        if let Some(declaration) = declaration {
            candidates.push(path.with_extension(declaration));
        }
    }
    candidates.push(path.join("index.d.ts"));

    candidates.into_iter().find(|candidate| candidate.is_file())
}

/// Splits `@scope/pkg/sub/path` into the package name and the sub-path.
fn split_package(specifier: &str) -> Option<(&str, Option<&str>)> {
    let mut slashes = specifier.match_indices('/').map(|(idx, _)| idx);
    let scoped = specifier.starts_with('@');
    let end = if scoped { slashes.nth(1) } else { slashes.next() };
    match end {
        Some(end) => Some((&specifier[..end], Some(&specifier[end + 1..]))),
        None if scoped && !specifier.contains('/') => None,
        None => Some((specifier, None)),
    }
}

/// Declarations of a package installed under `node_modules`.
fn resolve_package(node_modules: &Utf8Path, specifier: &str) -> Option<Utf8PathBuf> {
    let (name, subpath) = split_package(specifier)?;
    let package_dir = node_modules.join(name);
    if let Some(subpath) = subpath {
        return probe(&package_dir.join(subpath));
    }

    let manifest = package_dir.join("package.json");
    if let Ok(text) = std::fs::read_to_string(&manifest) {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(&text) {
            let types = json
                .get("types")
                .or_else(|| json.get("typings"))
                .and_then(serde_json::Value::as_str);
            if let Some(found) =
                types.and_then(|types| probe(&normalize_path(&package_dir.join(types))))
            {
                return Some(found);
            }
        }
    }
    probe(&package_dir.join("index"))
}
