//! Source positions and text surgery for lib-types.
//!
//! Every rewrite in the pipeline (component script compilation, declaration
//! emission, bundling and the transformer chain) is expressed as edits against
//! the original text through [`EditBuffer`]. Edits are recorded in original
//! coordinates and applied in a single final pass, so the order in which a
//! stage discovers them does not matter.

mod buffer;
mod line_index;
mod source_map;
mod span;

pub use buffer::{EditBuffer, EditError};
pub use line_index::{LineCol, LineIndex};
pub use source_map::{Mapping, SourceMap, SourceMapBuilder};
pub use span::{ByteOffset, Span};
