//! Configuration loading: the project's tsconfig and `lib-types.json`.

use camino::{Utf8Path, Utf8PathBuf};
use dts_bundler::{EntrySpec, ExportsMode, PathAliases};
use dts_transformer::{
    DeclareOptions, DeclareTransformer, IgnoreOptions, RemoveOptions, RemoveTransformer,
    SharedTransformer, TransformError,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use tsc_runner::CheckerKind;

/// Name of the optional project configuration file.
pub const PROJECT_CONFIG_FILE: &str = "lib-types.json";

/// Files picked up when the tsconfig has no `include`.
pub const DEFAULT_INCLUDE: &[&str] = &["**/*.{ts,tsx}", "**/*.vue"];

/// Files skipped when the tsconfig has no `exclude`.
pub const DEFAULT_EXCLUDE: &[&str] = &["node_modules/**", "dist/**"];

/// Glob appended to directory-valued patterns.
const DIRECTORY_GLOB: &str = "**/*.{ts,tsx}";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tsconfig not found from {0}")]
    TsconfigNotFound(Utf8PathBuf),

    #[error("cannot resolve `extends: \"{specifier}\"` in {from}")]
    ExtendsNotFound { specifier: String, from: Utf8PathBuf },

    #[error("circular `extends` through {0}")]
    CircularExtends(Utf8PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid transformer in {path}: {source}")]
    Transformer {
        path: Utf8PathBuf,
        #[source]
        source: TransformError,
    },
}

/// The typed subset of `compilerOptions` the build looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerOptions {
    /// Absolute after loading.
    pub base_url: Option<Utf8PathBuf>,
    pub paths: IndexMap<String, Vec<String>>,
    pub root_dir: Option<Utf8PathBuf>,
    pub declaration: Option<bool>,
    pub strict: Option<bool>,
}

/// A resolved tsconfig, with its `extends` chain merged.
#[derive(Debug, Clone, Default)]
pub struct TsConfig {
    pub path: Utf8PathBuf,
    pub compiler_options: CompilerOptions,
    /// The merged `compilerOptions` as written.
    pub raw_compiler_options: Map<String, Value>,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawTsConfig {
    extends: Option<Extends>,
    compiler_options: Map<String, Value>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Extends {
    One(String),
    Many(Vec<String>),
}

impl TsConfig {
    /// Loads `path`, following `extends`.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let mut chain = Vec::new();
        let (raw_compiler_options, include, exclude) = load_merged(path, &mut chain)?;
        let compiler_options = serde_json::from_value(Value::Object(raw_compiler_options.clone()))
            .map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            compiler_options,
            raw_compiler_options,
            include,
            exclude,
        })
    }

    /// Loads the tsconfig at `explicit` (relative to `root`), or the nearest
    /// `tsconfig.json` at or above `root`.
    pub fn find(root: &Utf8Path, explicit: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => {
                let path = root.join(path);
                if !path.is_file() {
                    return Err(ConfigError::TsconfigNotFound(path));
                }
                path
            }
            None => root
                .ancestors()
                .map(|dir| dir.join("tsconfig.json"))
                .find(|candidate| candidate.is_file())
                .ok_or_else(|| ConfigError::TsconfigNotFound(root.to_path_buf()))?,
        };
        debug!(path = %path, "using tsconfig");
        Self::load(&path)
    }

    /// Include globs relative to `root`, with `extra` appended.
    pub fn include_patterns(&self, root: &Utf8Path, extra: &[String]) -> Vec<String> {
        patterns(root, self.include.as_deref(), DEFAULT_INCLUDE, extra)
    }

    /// Exclude globs relative to `root`, with `extra` appended.
    pub fn exclude_patterns(&self, root: &Utf8Path, extra: &[String]) -> Vec<String> {
        patterns(root, self.exclude.as_deref(), DEFAULT_EXCLUDE, extra)
    }

    /// `paths` aliases for the bundler, relative to `root`.
    pub fn path_aliases(&self, root: &Utf8Path) -> PathAliases {
        let base = self
            .compiler_options
            .base_url
            .clone()
            .or_else(|| self.path.parent().map(Utf8Path::to_path_buf))
            .unwrap_or_else(|| root.to_path_buf());
        PathAliases {
            base_url: base
                .strip_prefix(root)
                .map(Utf8Path::to_path_buf)
                .unwrap_or_default(),
            paths: self.compiler_options.paths.clone(),
        }
    }
}

type Merged = (Map<String, Value>, Option<Vec<String>>, Option<Vec<String>>);

fn load_merged(path: &Utf8Path, chain: &mut Vec<Utf8PathBuf>) -> Result<Merged, ConfigError> {
    if chain.iter().any(|seen| seen == path) {
        return Err(ConfigError::CircularExtends(path.to_path_buf()));
    }
    chain.push(path.to_path_buf());

    let raw: RawTsConfig = read_json(path)?;
    let dir = path.parent().unwrap_or(Utf8Path::new("."));

    let mut options = Map::new();
    let mut include = None;
    let mut exclude = None;
    let parents = match raw.extends {
        None => Vec::new(),
        Some(Extends::One(specifier)) => vec![specifier],
        Some(Extends::Many(specifiers)) => specifiers,
    };
    for specifier in parents {
        let parent = resolve_extends(&specifier, dir).ok_or_else(|| ConfigError::ExtendsNotFound {
            specifier: specifier.clone(),
            from: path.to_path_buf(),
        })?;
        debug!(parent = %parent, "tsconfig extends");
        let (parent_options, parent_include, parent_exclude) = load_merged(&parent, chain)?;
        options.extend(parent_options);
        include = parent_include.or(include);
        exclude = parent_exclude.or(exclude);
    }

    let mut own = raw.compiler_options;
    if let Some(Value::String(base_url)) = own.get("baseUrl") {
        let absolute = dts_bundler::normalize_path(&dir.join(base_url));
        own.insert("baseUrl".into(), Value::String(absolute.into_string()));
    }
    options.extend(own);
    chain.pop();

    Ok((options, raw.include.or(include), raw.exclude.or(exclude)))
}

fn resolve_extends(specifier: &str, dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let with_json = |path: Utf8PathBuf| {
        if path.is_file() {
            Some(path)
        } else if path.is_dir() {
            Some(path.join("tsconfig.json")).filter(|p| p.is_file())
        } else {
            Some(Utf8PathBuf::from(format!("{path}.json"))).filter(|p| p.is_file())
        }
    };
    if specifier.starts_with('.') || Utf8Path::new(specifier).is_absolute() {
        return with_json(dts_bundler::normalize_path(&dir.join(specifier)));
    }
    dir.ancestors()
        .map(|ancestor| ancestor.join("node_modules").join(specifier))
        .find_map(with_json)
}

fn patterns(root: &Utf8Path, configured: Option<&[String]>, default: &[&str], extra: &[String]) -> Vec<String> {
    let base: Vec<String> = match configured {
        Some(patterns) => patterns.to_vec(),
        None => default.iter().map(|p| p.to_string()).collect(),
    };
    base.iter()
        .map(|pattern| format_pattern(root, pattern))
        .chain(extra.iter().map(|pattern| format_pattern(root, pattern)))
        .collect()
}

/// Normalises a tsconfig pattern: `./` is dropped and directories get
/// `/**/*.{ts,tsx}` appended.
pub fn format_pattern(root: &Utf8Path, pattern: &str) -> String {
    let trimmed = pattern.trim_start_matches("./").trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        return DIRECTORY_GLOB.to_string();
    }
    if root.join(trimmed).is_dir() {
        format!("{trimmed}/{DIRECTORY_GLOB}")
    } else {
        trimmed.to_string()
    }
}

pub(crate) fn read_json<T: for<'de> Deserialize<'de>>(path: &Utf8Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cleaned = strip_trailing_commas(&remove_json_comments(&content));
    serde_json::from_str(&cleaned).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Removes `//` and `/* */` comments outside strings.
fn remove_json_comments(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if c == '"' {
                in_string = false;
            } else if c == '\\' {
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            }
        } else if c == '"' {
            result.push(c);
            in_string = true;
        } else if c == '/' {
            match chars.peek() {
                Some('/') => {
                    while let Some(&next) = chars.peek() {
                        if next == '\n' {
                            break;
                        }
                        chars.next();
                    }
                }
                Some('*') => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == '*' && chars.peek() == Some(&'/') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => result.push(c),
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Drops commas directly followed by `}` or `]`.
fn strip_trailing_commas(json: &str) -> String {
    let bytes = json.as_bytes();
    let mut result = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in json.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = bytes[idx + 1..]
                .iter()
                .find(|b| !b.is_ascii_whitespace());
            if matches!(next, Some(b'}') | Some(b']')) {
                continue;
            }
        }
        result.push(c);
    }
    result
}

/// `tsconfig` overrides given to the build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TsConfigOverrides {
    /// Applied over the project's compiler options.
    pub compiler_options: Map<String, Value>,
    /// Appended to the project's include patterns.
    pub include: Vec<String>,
    /// Appended to the project's exclude patterns.
    pub exclude: Vec<String>,
}

/// Include/exclude globs for the bundler's module filter, relative to the
/// declaration tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModulePatterns {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// A transformer written declaratively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransformerConfig {
    Remove(RemoveOptions),
    Ignore(IgnoreOptions),
    Declare(DeclareOptions),
}

impl TransformerConfig {
    pub fn build(&self) -> Result<SharedTransformer, TransformError> {
        Ok(match self {
            TransformerConfig::Remove(options) => Arc::new(RemoveTransformer::new(options.clone())?),
            TransformerConfig::Ignore(options) => {
                Arc::new(RemoveTransformer::ignore(options.clone())?)
            }
            TransformerConfig::Declare(options) => {
                Arc::new(DeclareTransformer::new(options.clone()))
            }
        })
    }
}

/// Contents of `lib-types.json`. Every field is optional; CLI flags win.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    pub entry: Option<EntrySpec>,
    pub out_dir: Option<Utf8PathBuf>,
    pub temp_dir: Option<Utf8PathBuf>,
    pub tsconfig_path: Option<Utf8PathBuf>,
    pub tsconfig: TsConfigOverrides,
    pub checker: Option<CheckerKind>,
    pub no_emit: Option<bool>,
    pub external: Vec<String>,
    pub respect_external: Option<bool>,
    /// `[name]` is replaced by the entry alias.
    pub file_name: Option<String>,
    pub exports: Option<ExportsMode>,
    pub transformers: Vec<TransformerConfig>,
    pub modules: ModulePatterns,
}

impl ProjectConfig {
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        read_json(path)
    }

    /// Loads `lib-types.json` from `root` if there is one.
    pub fn find(root: &Utf8Path) -> Result<Option<Self>, ConfigError> {
        let path = root.join(PROJECT_CONFIG_FILE);
        if path.is_file() {
            debug!(path = %path, "using project configuration");
            Self::load(&path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Builds the configured transformers, in order.
    pub fn build_transformers(&self, path: &Utf8Path) -> Result<Vec<SharedTransformer>, ConfigError> {
        self.transformers
            .iter()
            .map(|config| {
                config.build().map_err(|source| ConfigError::Transformer {
                    path: path.to_path_buf(),
                    source,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(root: &Utf8Path, files: &[(&str, &str)]) {
        for (path, text) in files {
            let path = root.join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, text).unwrap();
        }
    }

    fn tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    #[test]
    fn test_remove_comments() {
        let json = r#"{
            // This is a comment
            "key": "value /* not a comment */" /* inline comment */
        }"#;

        let cleaned = remove_json_comments(json);
        assert!(!cleaned.contains("// This"));
        assert!(!cleaned.contains("inline comment"));
        assert!(cleaned.contains("\"value /* not a comment */\""));
    }

    #[test]
    fn test_strip_trailing_commas() {
        assert_eq!(
            strip_trailing_commas(r#"{"a": [1, 2, ], "b": ",]", }"#),
            r#"{"a": [1, 2 ], "b": ",]" }"#
        );
    }

    #[test]
    fn test_extends_chain() {
        let (_dir, root) = tempdir();
        write(
            &root,
            &[
                (
                    "node_modules/@tsconfig/base/tsconfig.json",
                    r#"{ "compilerOptions": { "strict": true, "declaration": false }, "include": ["lib"] }"#,
                ),
                (
                    "configs/shared.json",
                    r#"{
                        "extends": "@tsconfig/base/tsconfig.json",
                        "compilerOptions": { "baseUrl": "..", "paths": { "@/*": ["src/*"] }, },
                    }"#,
                ),
                (
                    "tsconfig.json",
                    r#"{ "extends": "./configs/shared", "compilerOptions": { "declaration": true } }"#,
                ),
            ],
        );

        let config = TsConfig::find(&root, None).unwrap();
        assert_eq!(config.path, root.join("tsconfig.json"));
        assert_eq!(config.compiler_options.strict, Some(true));
        assert_eq!(config.compiler_options.declaration, Some(true));
        assert_eq!(config.compiler_options.base_url.as_ref(), Some(&root));
        assert_eq!(config.include, Some(vec!["lib".to_string()]));

        let aliases = config.path_aliases(&root);
        assert_eq!(aliases.base_url, Utf8PathBuf::new());
        assert_eq!(aliases.paths["@/*"], vec!["src/*".to_string()]);
    }

    #[test]
    fn test_missing_tsconfig() {
        let (_dir, root) = tempdir();
        let err = TsConfig::find(&root, Some(Utf8Path::new("tsconfig.build.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::TsconfigNotFound(_)));
    }

    #[test]
    fn test_patterns_expand_directories() {
        let (_dir, root) = tempdir();
        fs::create_dir_all(root.join("src")).unwrap();
        let config = TsConfig {
            include: Some(vec!["./src".into(), "types/*.d.ts".into()]),
            ..TsConfig::default()
        };
        assert_eq!(
            config.include_patterns(&root, &["extra".into()]),
            vec!["src/**/*.{ts,tsx}", "types/*.d.ts", "extra"]
        );
        assert_eq!(
            config.exclude_patterns(&root, &[]),
            vec!["node_modules/**", "dist/**"]
        );
    }

    #[test]
    fn test_project_config_transformers() {
        let config: ProjectConfig = serde_json::from_str(
            r#"{
                "entry": { "index": "src/index.ts", "utils": "src/utils.ts" },
                "checker": "isolated",
                "transformers": [
                    { "kind": "remove", "annotationTags": ["internal"], "removeTypeKeyword": true },
                    { "kind": "declare", "imports": ["import 'vue';"], "addEmptyExport": true }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.checker, Some(CheckerKind::Isolated));
        assert!(matches!(config.entry, Some(EntrySpec::Map(ref map)) if map.len() == 2));
        assert_eq!(
            config.transformers[0],
            TransformerConfig::Remove(RemoveOptions {
                annotation_tags: vec!["internal".into()],
                remove_type_keyword: true,
                ..RemoveOptions::default()
            })
        );
        let built = config.build_transformers(Utf8Path::new("lib-types.json")).unwrap();
        assert_eq!(built.len(), 2);
        assert_eq!(built[0].name(), "remove");
    }
}
