//! Package metadata lookup.

use crate::config::{read_json, ConfigError};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// The fields of `package.json` the build uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageJson {
    pub name: Option<String>,
    pub version: Option<String>,
}

impl PackageJson {
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        read_json(path)
    }

    /// Loads the nearest `package.json` at or above `start`, not looking
    /// past `stop` when given.
    pub fn find(start: &Utf8Path, stop: Option<&Utf8Path>) -> Result<Option<Self>, ConfigError> {
        find_package_json(start, stop)
            .map(|path| Self::load(&path))
            .transpose()
    }
}

/// Path of the nearest `package.json` at or above `start`.
pub fn find_package_json(start: &Utf8Path, stop: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
    for dir in start.ancestors() {
        let candidate = dir.join("package.json");
        if candidate.is_file() {
            return Some(candidate);
        }
        if stop == Some(dir) {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_finds_nearest_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        fs::write(
            root.join("package.json"),
            r#"{ "name": "@scope/mylib", "version": "1.2.3", "private": true }"#,
        )
        .unwrap();
        let nested = root.join("packages/ui/src");
        fs::create_dir_all(&nested).unwrap();

        let package = PackageJson::find(&nested, None).unwrap().unwrap();
        assert_eq!(package.name.as_deref(), Some("@scope/mylib"));
        assert_eq!(package.version.as_deref(), Some("1.2.3"));

        let bounded = PackageJson::find(&nested, Some(root.join("packages").as_path())).unwrap();
        assert_eq!(bounded, None);
    }
}
