//! Files handed to the checker.

use crate::error::TscError;
use camino::{Utf8Path, Utf8PathBuf};
use std::borrow::Cow;
use text_edit::{LineCol, LineIndex, SourceMap};

/// Where a unit's text comes from.
#[derive(Debug, Clone)]
pub enum UnitContent {
    /// Read from [`CheckUnit::path`].
    OnDisk,
    /// Rewritten by a pre-parser.
    Text {
        code: String,
        /// Maps `code` back to the original file, when the pre-parser kept one.
        source_map: Option<SourceMap>,
    },
}

/// One file slot of the checker.
#[derive(Debug, Clone)]
pub struct CheckUnit {
    /// The file on disk the unit stands for.
    pub original_path: Utf8PathBuf,
    /// The name the checker sees. Differs from `original_path` for units
    /// registered under another extension, e.g. `Comp.vue.ts`.
    pub path: Utf8PathBuf,
    pub content: UnitContent,
}

impl CheckUnit {
    pub fn on_disk(path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();
        Self {
            original_path: path.clone(),
            path,
            content: UnitContent::OnDisk,
        }
    }

    pub fn text(
        original_path: impl Into<Utf8PathBuf>,
        path: impl Into<Utf8PathBuf>,
        code: String,
        source_map: Option<SourceMap>,
    ) -> Self {
        Self {
            original_path: original_path.into(),
            path: path.into(),
            content: UnitContent::Text { code, source_map },
        }
    }

    /// True for `.d.ts`, `.d.mts` and `.d.cts` units.
    pub fn is_declaration(&self) -> bool {
        is_declaration_file(&self.path)
    }

    /// The unit's text.
    pub fn read(&self) -> Result<Cow<'_, str>, TscError> {
        match &self.content {
            UnitContent::OnDisk => std::fs::read_to_string(&self.path)
                .map(Cow::Owned)
                .map_err(TscError::io(&self.path)),
            UnitContent::Text { code, .. } => Ok(Cow::Borrowed(code)),
        }
    }

    /// Maps a one-based position in the unit's text to the original file.
    pub fn original_position(&self, line: u32, column: u32) -> (u32, u32) {
        let UnitContent::Text {
            code,
            source_map: Some(map),
        } = &self.content
        else {
            return (line, column);
        };
        let mapped = LineIndex::new(code)
            .offset(LineCol::from_one_based(line, column))
            .and_then(|offset| map.nearest_original_position(offset))
            .and_then(|offset| {
                let original = std::fs::read_to_string(&self.original_path).ok()?;
                LineIndex::new(&original).line_col(offset)
            });
        mapped.map_or((line, column), LineCol::one_based)
    }
}

pub(crate) fn is_declaration_file(path: &Utf8Path) -> bool {
    let name = path.file_name().unwrap_or_default();
    [".d.ts", ".d.mts", ".d.cts"]
        .iter()
        .any(|suffix| name.ends_with(suffix))
}

/// Declaration file name for a unit path.
///
/// `.mts`/`.cts` keep their module flavour; every other script extension
/// becomes `.d.ts`. Declaration units keep their name.
///
/// ```
/// use tsc_runner::declaration_file_name;
/// use camino::Utf8Path;
///
/// assert_eq!(declaration_file_name(Utf8Path::new("src/a.mts")), "src/a.d.mts");
/// assert_eq!(declaration_file_name(Utf8Path::new("src/Comp.vue.ts")), "src/Comp.vue.d.ts");
/// ```
pub fn declaration_file_name(path: &Utf8Path) -> Utf8PathBuf {
    if is_declaration_file(path) {
        return path.to_path_buf();
    }
    let name = path.file_name().unwrap_or_default();
    let stem = path.file_stem().unwrap_or(name);
    let declaration = match path.extension() {
        Some("mts" | "mjs") => format!("{stem}.d.mts"),
        Some("cts" | "cjs") => format!("{stem}.d.cts"),
        Some("ts" | "tsx" | "js" | "jsx") => format!("{stem}.d.ts"),
        _ => format!("{name}.d.ts"),
    };
    path.with_file_name(declaration)
}

/// `path` relative to `root`, or just its file name when it lies outside.
pub(crate) fn relative_to(path: &Utf8Path, root: &Utf8Path) -> Utf8PathBuf {
    path.strip_prefix(root)
        .map(Utf8Path::to_path_buf)
        .unwrap_or_else(|_| Utf8PathBuf::from(path.file_name().unwrap_or(path.as_str())))
}
