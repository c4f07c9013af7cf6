//! Transformer chain for bundled declaration chunks.
//!
//! A transformer receives the current chunk text and either returns a
//! rewritten text or `None` to leave it untouched. Transformers run in order,
//! each one seeing the output of the previous one. Closures with the right
//! signature are transformers too:
//!
//! ```
//! use dts_bundler::BundledChunk;
//! use dts_transformer::{TransformContext, TransformError, Transformer};
//!
//! let banner = |code: &str, _: &BundledChunk, _: &TransformContext<'_>| {
//!     Ok::<_, TransformError>(Some(format!("// generated\n{code}")))
//! };
//! let _: &dyn Transformer = &banner;
//! ```

mod declare;
mod error;
mod imports;
mod internal;
mod lists;
mod remove;
mod tags;
mod type_only;

pub use declare::{extract_module_blocks, DeclareOptions, DeclareTransformer};
pub use error::TransformError;
pub use remove::{IgnoreOptions, RemoveOptions, RemoveTransformer};

use camino::Utf8Path;
use dts_bundler::{BundledChunk, OutputOptions};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

/// Everything a transformer may look at besides the chunk itself.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    /// The project root.
    pub root: &'a Utf8Path,
    /// Every chunk of the build, keyed by file name.
    pub chunks: &'a IndexMap<String, BundledChunk>,
    /// Output settings of the build.
    pub output: &'a OutputOptions,
}

/// One stage of the chain.
pub trait Transformer: Send + Sync {
    /// Rewrites `code`, or returns `None` to pass it through unchanged.
    fn transform(
        &self,
        code: &str,
        chunk: &BundledChunk,
        ctx: &TransformContext<'_>,
    ) -> Result<Option<String>, TransformError>;

    /// A label for logs.
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> Transformer for F
where
    F: Fn(&str, &BundledChunk, &TransformContext<'_>) -> Result<Option<String>, TransformError>
        + Send
        + Sync,
{
    fn transform(
        &self,
        code: &str,
        chunk: &BundledChunk,
        ctx: &TransformContext<'_>,
    ) -> Result<Option<String>, TransformError> {
        self(code, chunk, ctx)
    }
}

/// A shareable transformer.
pub type SharedTransformer = Arc<dyn Transformer>;

/// Runs `transformers` over the chunk's code in order.
pub fn apply_transformers(
    transformers: &[SharedTransformer],
    chunk: &BundledChunk,
    ctx: &TransformContext<'_>,
) -> Result<String, TransformError> {
    let mut code = chunk.code.clone();
    for transformer in transformers {
        if let Some(next) = transformer.transform(&code, chunk, ctx)? {
            debug!(
                transformer = transformer.name(),
                chunk = %chunk.file_name,
                "chunk rewritten"
            );
            code = next;
        }
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use pretty_assertions::assert_eq;

    fn chunk(code: &str) -> BundledChunk {
        BundledChunk {
            name: "index".into(),
            file_name: "index.d.ts".into(),
            code: code.into(),
            is_entry: true,
            facade_module_id: None,
            module_ids: Vec::new(),
            exports: Vec::new(),
        }
    }

    #[test]
    fn test_stages_compose_left_to_right() {
        let append_a: SharedTransformer = Arc::new(
            |code: &str, _: &BundledChunk, _: &TransformContext<'_>| {
                Ok::<_, TransformError>(Some(format!("{code}a")))
            },
        );
        let skip: SharedTransformer =
            Arc::new(|_: &str, _: &BundledChunk, _: &TransformContext<'_>| {
            Ok::<Option<String>, TransformError>(None)
        });
        let append_b: SharedTransformer = Arc::new(
            |code: &str, _: &BundledChunk, _: &TransformContext<'_>| {
                Ok::<_, TransformError>(Some(format!("{code}b")))
            },
        );

        let chunk = chunk("x");
        let root = Utf8PathBuf::from("/project");
        let chunks = IndexMap::new();
        let output = OutputOptions::default();
        let ctx = TransformContext {
            root: &root,
            chunks: &chunks,
            output: &output,
        };

        let out = apply_transformers(&[append_a, skip, append_b], &chunk, &ctx).unwrap();
        assert_eq!(out, "xab");
    }

    #[test]
    fn test_error_stops_the_chain() {
        let fail: SharedTransformer = Arc::new(
            |_: &str, _: &BundledChunk, _: &TransformContext<'_>| {
                Err(TransformError::custom("boom"))
            },
        );
        let chunk = chunk("x");
        let root = Utf8PathBuf::from("/project");
        let chunks = IndexMap::new();
        let output = OutputOptions::default();
        let ctx = TransformContext {
            root: &root,
            chunks: &chunks,
            output: &output,
        };

        let err = apply_transformers(&[fail], &chunk, &ctx).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
