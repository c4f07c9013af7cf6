//! Output file names.

use std::fmt;
use std::sync::Arc;

type FileNameFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// How an entry's output file is named.
#[derive(Clone, Default)]
pub enum FileNamePolicy {
    /// The unscoped package name for a single entry, the entry alias
    /// otherwise, with `.d.ts` appended.
    #[default]
    Default,
    /// A template where `[name]` is replaced by the entry alias.
    Template(String),
    /// Called with the entry alias.
    Func(FileNameFn),
}

impl FileNamePolicy {
    pub fn func(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        FileNamePolicy::Func(Arc::new(f))
    }

    pub fn file_name(&self, entry: &str, entry_count: usize, package_name: Option<&str>) -> String {
        match self {
            FileNamePolicy::Default => match package_name {
                Some(package) if entry_count == 1 && !unscoped_name(package).is_empty() => {
                    format!("{}.d.ts", unscoped_name(package))
                }
                _ => format!("{entry}.d.ts"),
            },
            FileNamePolicy::Template(template) => template.replace("[name]", entry),
            FileNamePolicy::Func(f) => f(entry),
        }
    }
}

impl fmt::Debug for FileNamePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileNamePolicy::Default => f.write_str("Default"),
            FileNamePolicy::Template(template) => f.debug_tuple("Template").field(template).finish(),
            FileNamePolicy::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// A package name without its scope (`@scope/mylib` -> `mylib`).
pub fn unscoped_name(name: &str) -> &str {
    match name.strip_prefix('@') {
        Some(scoped) => scoped.split_once('/').map_or(name, |(_, rest)| rest),
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_entry_uses_package_name() {
        let policy = FileNamePolicy::Default;
        assert_eq!(policy.file_name("index", 1, Some("@scope/mylib")), "mylib.d.ts");
        assert_eq!(policy.file_name("index", 1, Some("plain")), "plain.d.ts");
        assert_eq!(policy.file_name("index", 1, None), "index.d.ts");
    }

    #[test]
    fn test_multiple_entries_use_aliases() {
        let policy = FileNamePolicy::Default;
        assert_eq!(policy.file_name("foo2", 3, Some("@scope/mylib")), "foo2.d.ts");
    }

    #[test]
    fn test_template_and_function() {
        let template = FileNamePolicy::Template("types/[name].d.ts".into());
        assert_eq!(template.file_name("main", 1, Some("pkg")), "types/main.d.ts");
        let func = FileNamePolicy::func(|name| format!("{name}.d.mts"));
        assert_eq!(func.file_name("main", 1, None), "main.d.mts");
    }

    #[test]
    fn test_unscoped_name() {
        assert_eq!(unscoped_name("@scope/mylib"), "mylib");
        assert_eq!(unscoped_name("mylib"), "mylib");
        assert_eq!(unscoped_name("@broken"), "@broken");
    }
}
