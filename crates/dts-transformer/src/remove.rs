//! The `remove` and `ignore` transformers.

use crate::imports::{prune_imports, referenced_names};
use crate::internal::remove_tagged;
use crate::tags::TagSet;
use crate::type_only::strip_type_keywords;
use crate::{TransformContext, TransformError, Transformer};
use dts_bundler::BundledChunk;
use dts_syntax::{parse_module, Dialect};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Options of the `remove` transformer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoveOptions {
    /// Doc-comment tags (without `@`) whose declarations are removed.
    pub annotation_tags: Vec<String>,
    /// Also remove side-effect imports (`import 'x'`).
    pub remove_empty_import: bool,
    /// Rewrite type-only imports and exports into plain ones.
    pub remove_type_keyword: bool,
    /// Skip the check that no tag survived the removal.
    pub ignore_check: bool,
}

/// Options of the `ignore` transformer, a tag-only flavour of `remove`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IgnoreOptions {
    pub ignore_tags: Vec<String>,
    pub ignore_check: bool,
}

impl From<IgnoreOptions> for RemoveOptions {
    fn from(options: IgnoreOptions) -> Self {
        RemoveOptions {
            annotation_tags: options.ignore_tags,
            ignore_check: options.ignore_check,
            ..RemoveOptions::default()
        }
    }
}

/// Removes tagged declarations, then the imports they left dead, then
/// optionally the `type` modifiers of imports and exports.
#[derive(Debug, Clone)]
pub struct RemoveTransformer {
    name: &'static str,
    tags: TagSet,
    options: RemoveOptions,
}

impl RemoveTransformer {
    pub fn new(options: RemoveOptions) -> Result<Self, TransformError> {
        Ok(Self {
            name: "remove",
            tags: TagSet::new(&options.annotation_tags)?,
            options,
        })
    }

    pub fn ignore(options: IgnoreOptions) -> Result<Self, TransformError> {
        let mut transformer = Self::new(options.into())?;
        transformer.name = "ignore";
        Ok(transformer)
    }

    pub fn options(&self) -> &RemoveOptions {
        &self.options
    }

    fn needs_transform(&self) -> bool {
        !self.tags.is_empty() || self.options.remove_empty_import || self.options.remove_type_keyword
    }

    /// Runs every enabled step over `code`. `file_name` only labels parse
    /// errors.
    pub fn run(&self, code: &str, file_name: &str) -> Result<Option<String>, TransformError> {
        if !self.needs_transform() {
            return Ok(None);
        }

        let mut current = code.to_owned();
        let mut changed = false;
        let mut referenced = None;

        if !self.tags.is_empty() {
            let parsed = parse_module(file_name, code, Dialect::TypeScript)?;
            let removal = remove_tagged(&parsed, &self.tags)?;
            if removal.changed {
                debug!(file = file_name, removed = ?removal.removed, "tagged declarations removed");
                referenced = Some(referenced_names(&parsed.module));
                current = removal.code;
                changed = true;
            }
        }

        if referenced.is_some() || self.options.remove_empty_import {
            let pruned = {
                let parsed = parse_module(file_name, &current, Dialect::TypeScript)?;
                let dead = referenced.map(|before| {
                    let after = referenced_names(&parsed.module);
                    before
                        .into_iter()
                        .filter(|name| !after.contains(name))
                        .collect::<FxHashSet<_>>()
                });
                prune_imports(&parsed, self.options.remove_empty_import, dead.as_ref())?
            };
            if let Some(next) = pruned {
                current = next;
                changed = true;
            }
        }

        if self.options.remove_type_keyword {
            let stripped = {
                let parsed = parse_module(file_name, &current, Dialect::TypeScript)?;
                strip_type_keywords(&parsed)?
            };
            if let Some(next) = stripped {
                current = next;
                changed = true;
            }
        }

        if !self.options.ignore_check {
            let unhandled = self.tags.remaining(&current);
            if !unhandled.is_empty() {
                return Err(TransformError::UnhandledTags { tags: unhandled });
            }
        }

        Ok(changed.then_some(current))
    }
}

impl Transformer for RemoveTransformer {
    fn transform(
        &self,
        code: &str,
        chunk: &BundledChunk,
        _ctx: &TransformContext<'_>,
    ) -> Result<Option<String>, TransformError> {
        self.run(code, &chunk.file_name)
    }

    fn name(&self) -> &str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn internal() -> RemoveTransformer {
        RemoveTransformer::new(RemoveOptions {
            annotation_tags: vec!["internal".into()],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_options_deserialize_camel_case() {
        let options: RemoveOptions = serde_json::from_str(
            r#"{"annotationTags": ["internal"], "removeTypeKeyword": true}"#,
        )
        .unwrap();
        assert_eq!(options.annotation_tags, vec!["internal".to_string()]);
        assert!(options.remove_type_keyword);
        assert!(!options.remove_empty_import);
    }

    #[test]
    fn test_nothing_configured_passes_through() {
        let transformer = RemoveTransformer::new(RemoveOptions::default()).unwrap();
        assert_eq!(transformer.run("import {} from 'x';\n", "a.d.ts").unwrap(), None);
    }

    #[test]
    fn test_no_tag_passes_through() {
        let code = "export declare class A {}\nimport { B } from 'b';\n";
        assert_eq!(internal().run(code, "a.d.ts").unwrap(), None);
    }

    #[test]
    fn test_import_only_used_by_removed_declaration_is_dropped() {
        let code = "import { Hidden } from './hidden';\nimport { Shown } from './shown';\n/** @internal */\nexport declare const a: Hidden;\nexport declare const b: Shown;\n";
        let out = internal().run(code, "a.d.ts").unwrap().unwrap();
        assert_eq!(
            out,
            "import { Shown } from './shown';\n/* removed internal: a */\nexport declare const b: Shown;\n"
        );
    }

    #[test]
    fn test_leftover_tag_is_reported() {
        let code = "declare function f(/** @internal */ a: string): void;\n";
        let err = internal().run(code, "a.d.ts").unwrap_err();
        assert_eq!(err.to_string(), "unhandled internal declarations detected");
    }

    #[test]
    fn test_leftover_tag_tolerated_with_ignore_check() {
        let transformer = RemoveTransformer::ignore(IgnoreOptions {
            ignore_tags: vec!["internal".into()],
            ignore_check: true,
        })
        .unwrap();
        let code = "declare function f(/** @internal */ a: string): void;\n";
        assert_eq!(transformer.run(code, "a.d.ts").unwrap(), None);
        assert_eq!(transformer.name(), "ignore");
    }
}
