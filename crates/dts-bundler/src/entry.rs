//! Entry normalisation.

use crate::resolve::normalize_path;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Entry points as the user wrote them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntrySpec {
    Single(Utf8PathBuf),
    List(Vec<Utf8PathBuf>),
    /// Alias to path; aliases are kept verbatim.
    Map(IndexMap<String, Utf8PathBuf>),
}

impl Default for EntrySpec {
    fn default() -> Self {
        EntrySpec::Single(Utf8PathBuf::from("src/index.ts"))
    }
}

impl EntrySpec {
    /// The source paths, in order.
    pub fn paths(&self) -> Vec<&Utf8Path> {
        match self {
            EntrySpec::Single(path) => vec![path.as_path()],
            EntrySpec::List(paths) => paths.iter().map(Utf8PathBuf::as_path).collect(),
            EntrySpec::Map(map) => map.values().map(Utf8PathBuf::as_path).collect(),
        }
    }
}

/// Entry alias to the entry's emitted declaration file.
pub type EntryTable = IndexMap<String, Utf8PathBuf>;

/// Maps every entry to its declaration file under `decl_root`.
///
/// Unnamed entries are aliased by their base name; repeated base names get
/// `2`, `3`, … appended in input order.
pub fn normalize_entries(spec: &EntrySpec, root: &Utf8Path, decl_root: &Utf8Path) -> EntryTable {
    let mut table = EntryTable::new();
    match spec {
        EntrySpec::Map(map) => {
            for (alias, path) in map {
                table.insert(alias.clone(), declaration_path(path, root, decl_root));
            }
        }
        EntrySpec::Single(_) | EntrySpec::List(_) => {
            let mut seen: FxHashMap<String, usize> = FxHashMap::default();
            for path in spec.paths() {
                let base = entry_alias(path);
                let count = seen.entry(base.clone()).or_insert(0);
                *count += 1;
                let mut alias = if *count == 1 {
                    base.clone()
                } else {
                    format!("{base}{count}")
                };
                while table.contains_key(&alias) {
                    *count += 1;
                    alias = format!("{base}{count}");
                }
                table.insert(alias, declaration_path(path, root, decl_root));
            }
        }
    }
    table
}

/// Base name of an entry without its extension (`src/foo.ts` -> `foo`).
pub fn entry_alias(path: &Utf8Path) -> String {
    let name = path.file_name().unwrap_or(path.as_str());
    for suffix in [".d.ts", ".d.mts", ".d.cts"] {
        if let Some(stem) = name.strip_suffix(suffix) {
            return stem.to_string();
        }
    }
    match name.rfind('.') {
        Some(dot) if dot > 0 => name[..dot].to_string(),
        _ => name.to_string(),
    }
}

/// Where the checker writes the declaration of `source`.
///
/// The directory relative to `root` is kept. Script extensions become their
/// declaration counterpart; component files keep their extension
/// (`Comp.vue` -> `Comp.vue.d.ts`).
pub fn declaration_path(source: &Utf8Path, root: &Utf8Path, decl_root: &Utf8Path) -> Utf8PathBuf {
    let absolute = normalize_path(&root.join(source));
    let relative = absolute
        .strip_prefix(normalize_path(root))
        .map(Utf8Path::to_path_buf)
        .unwrap_or_else(|_| Utf8PathBuf::from(absolute.file_name().unwrap_or_default()));

    let name = relative.file_name().unwrap_or_default();
    let declaration = if [".d.ts", ".d.mts", ".d.cts"]
        .iter()
        .any(|suffix| name.ends_with(suffix))
    {
        name.to_string()
    } else {
        match relative.extension() {
            Some("mts" | "mjs") => format!("{}.d.mts", stem(name)),
            Some("cts" | "cjs") => format!("{}.d.cts", stem(name)),
            Some("ts" | "tsx" | "js" | "jsx") => format!("{}.d.ts", stem(name)),
            _ => format!("{name}.d.ts"),
        }
    };
    decl_root.join(relative.with_file_name(declaration))
}

fn stem(name: &str) -> &str {
    name.rfind('.').map_or(name, |dot| &name[..dot])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(spec: EntrySpec) -> Vec<(String, String)> {
        normalize_entries(&spec, Utf8Path::new("/p"), Utf8Path::new("/p/dist/.temp"))
            .into_iter()
            .map(|(alias, path)| (alias, path.to_string()))
            .collect()
    }

    #[test]
    fn test_duplicate_basenames_get_counters() {
        let spec = EntrySpec::List(vec![
            "a/foo.ts".into(),
            "b/foo.ts".into(),
            "bar.ts".into(),
            "c/foo.ts".into(),
        ]);
        assert_eq!(
            table(spec),
            vec![
                ("foo".into(), "/p/dist/.temp/a/foo.d.ts".into()),
                ("foo2".into(), "/p/dist/.temp/b/foo.d.ts".into()),
                ("bar".into(), "/p/dist/.temp/bar.d.ts".into()),
                ("foo3".into(), "/p/dist/.temp/c/foo.d.ts".into()),
            ]
        );
    }

    #[test]
    fn test_map_keeps_aliases() {
        let mut map = IndexMap::new();
        map.insert("main".to_string(), Utf8PathBuf::from("./src/index.ts"));
        map.insert("comp".to_string(), Utf8PathBuf::from("/p/src/Comp.vue"));
        assert_eq!(
            table(EntrySpec::Map(map)),
            vec![
                ("main".into(), "/p/dist/.temp/src/index.d.ts".into()),
                ("comp".into(), "/p/dist/.temp/src/Comp.vue.d.ts".into()),
            ]
        );
    }

    #[test]
    fn test_declaration_extensions() {
        let path = |p: &str| {
            declaration_path(Utf8Path::new(p), Utf8Path::new("/p"), Utf8Path::new("/t")).to_string()
        };
        assert_eq!(path("src/a.mts"), "/t/src/a.d.mts");
        assert_eq!(path("src/a.cts"), "/t/src/a.d.cts");
        assert_eq!(path("src/types.d.ts"), "/t/src/types.d.ts");
        assert_eq!(path("src/App.tsx"), "/t/src/App.d.ts");
    }

    #[test]
    fn test_entry_alias() {
        assert_eq!(entry_alias(Utf8Path::new("src/index.d.ts")), "index");
        assert_eq!(entry_alias(Utf8Path::new("Comp.vue")), "Comp");
        assert_eq!(entry_alias(Utf8Path::new(".hidden")), ".hidden");
    }

    #[test]
    fn test_entry_spec_deserializes_every_shape() {
        let single: EntrySpec = serde_json::from_str(r#""src/index.ts""#).unwrap();
        assert_eq!(single, EntrySpec::Single("src/index.ts".into()));
        let list: EntrySpec = serde_json::from_str(r#"["a.ts", "b.ts"]"#).unwrap();
        assert_eq!(list.paths().len(), 2);
        let map: EntrySpec = serde_json::from_str(r#"{"main": "a.ts"}"#).unwrap();
        assert!(matches!(map, EntrySpec::Map(_)));
    }
}
