//! The `declare` transformer: static import lines and ambient module blocks.

use crate::{TransformContext, TransformError, Transformer};
use camino::Utf8PathBuf;
use dts_bundler::BundledChunk;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use text_edit::EditBuffer;

/// Options of the `declare` transformer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeclareOptions {
    /// Files, relative to the project root, whose `declare module` blocks
    /// are appended to every chunk.
    pub files: Vec<Utf8PathBuf>,
    /// Raw lines prepended to every chunk.
    pub imports: Vec<String>,
    /// Append `export {};` so the chunk is always a module.
    pub add_empty_export: bool,
}

#[derive(Debug, Clone)]
pub struct DeclareTransformer {
    options: DeclareOptions,
}

impl DeclareTransformer {
    pub fn new(options: DeclareOptions) -> Self {
        Self { options }
    }

    pub fn from_files(files: impl IntoIterator<Item = impl Into<Utf8PathBuf>>) -> Self {
        Self::new(DeclareOptions {
            files: files.into_iter().map(Into::into).collect(),
            ..DeclareOptions::default()
        })
    }
}

impl Transformer for DeclareTransformer {
    fn transform(
        &self,
        code: &str,
        _chunk: &BundledChunk,
        ctx: &TransformContext<'_>,
    ) -> Result<Option<String>, TransformError> {
        let mut blocks = Vec::new();
        for file in &self.options.files {
            let path = ctx.root.join(file);
            let text = std::fs::read_to_string(&path)
                .map_err(|source| TransformError::Io { path, source })?;
            blocks.extend(extract_module_blocks(&text));
        }

        if blocks.is_empty() && self.options.imports.is_empty() && !self.options.add_empty_export {
            return Ok(None);
        }

        let mut buffer = EditBuffer::new(code);
        if !self.options.imports.is_empty() {
            buffer.prepend(format!("{}\n", self.options.imports.join("\n")));
        }
        if !blocks.is_empty() {
            buffer.append("\n");
            buffer.append(&blocks.join("\n"));
        }
        if self.options.add_empty_export {
            buffer.append("\nexport {};\n");
        }
        Ok(Some(buffer.finish()))
    }

    fn name(&self) -> &str {
        "declare"
    }
}

fn module_header() -> Option<&'static Regex> {
    static HEADER: OnceLock<Option<Regex>> = OnceLock::new();
    HEADER
        .get_or_init(|| Regex::new(r#"declare\s+module\s+(?:'[^'\n]*'|"[^"\n]*")\s*\{"#).ok())
        .as_ref()
}

/// Every top-level `declare module '...' { ... }` block of `code`, verbatim.
///
/// Blocks nested in another block are part of the outer one. A block whose
/// braces never balance is ignored.
pub fn extract_module_blocks(code: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let Some(header_pattern) = module_header() else {
        return blocks;
    };
    let mut consumed = 0;
    for header in header_pattern.find_iter(code) {
        if header.start() < consumed {
            continue;
        }
        if let Some(end) = block_end(code, header.end() - 1) {
            blocks.push(code[header.start()..end].to_string());
            consumed = end;
        }
    }
    blocks
}

/// Offset just past the `}` closing the `{` at `open`.
fn block_end(code: &str, open: usize) -> Option<usize> {
    let bytes = code.as_bytes();
    let mut depth = 0usize;
    let mut idx = open;
    while idx < bytes.len() {
        match bytes[idx] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            quote @ (b'\'' | b'"' | b'`') => {
                idx += 1;
                while idx < bytes.len() && bytes[idx] != quote {
                    if bytes[idx] == b'\\' {
                        idx += 1;
                    }
                    idx += 1;
                }
            }
            b'/' if bytes.get(idx + 1) == Some(&b'/') => {
                while idx < bytes.len() && bytes[idx] != b'\n' {
                    idx += 1;
                }
            }
            b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                idx += 2;
                while idx + 1 < bytes.len() && !(bytes[idx] == b'*' && bytes[idx + 1] == b'/') {
                    idx += 1;
                }
                idx += 1;
            }
            _ => {}
        }
        idx += 1;
    }
    None
}
