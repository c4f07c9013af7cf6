//! Generated-to-original offset mapping for rewritten units.
//!
//! Component scripts are compiled into a plain TypeScript unit before
//! type-checking. Diagnostics reported against the compiled text are mapped
//! back into the component through a [`SourceMap`].

use crate::{ByteOffset, Span};
use text_size::TextSize;

/// A generated span paired with the original span it was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub generated: Span,
    pub original: Span,
}

/// Mappings from generated text back to its source, sorted by generated offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    mappings: Vec<Mapping>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> SourceMapBuilder {
        SourceMapBuilder::new()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    /// Maps a generated offset back to the original text.
    ///
    /// Offsets inside a transformed mapping whose lengths differ are clamped
    /// to the end of the original span.
    pub fn original_position(&self, generated: ByteOffset) -> Option<ByteOffset> {
        let mapping = self.mapping_at(generated)?;
        let delta = generated - mapping.generated.start;
        Some(std::cmp::min(
            mapping.original.start + delta,
            mapping.original.end,
        ))
    }

    /// Like [`original_position`](Self::original_position) but falls back to
    /// the closest preceding mapping, so synthetic text still lands near
    /// the code it was generated for.
    pub fn nearest_original_position(&self, generated: ByteOffset) -> Option<ByteOffset> {
        if let Some(position) = self.original_position(generated) {
            return Some(position);
        }
        self.mappings
            .iter()
            .take_while(|m| m.generated.start <= generated)
            .last()
            .map(|m| m.original.end)
    }

    /// Maps an original offset forward into the generated text.
    pub fn generated_position(&self, original: ByteOffset) -> Option<ByteOffset> {
        self.mappings
            .iter()
            .find(|m| m.original.contains(original))
            .map(|m| {
                let delta = original - m.original.start;
                std::cmp::min(m.generated.start + delta, m.generated.end)
            })
    }

    fn mapping_at(&self, generated: ByteOffset) -> Option<&Mapping> {
        let idx = match self
            .mappings
            .binary_search_by(|m| m.generated.start.cmp(&generated))
        {
            Ok(idx) => idx,
            Err(idx) => idx.checked_sub(1)?,
        };

        self.mappings
            .get(idx)
            .filter(|m| m.generated.contains(generated))
    }
}

/// Incrementally records mappings while output text is appended.
#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    mappings: Vec<Mapping>,
    generated_offset: ByteOffset,
}

impl SourceMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn generated_offset(&self) -> ByteOffset {
        self.generated_offset
    }

    /// Records `text` copied unchanged from `original_start`.
    pub fn add_source(&mut self, original_start: ByteOffset, text: &str) {
        let len = TextSize::from(text.len() as u32);
        if len == TextSize::from(0) {
            return;
        }
        self.mappings.push(Mapping {
            generated: Span::new(self.generated_offset, self.generated_offset + len),
            original: Span::new(original_start, original_start + len),
        });
        self.generated_offset += len;
    }

    /// Records synthetic text with no original counterpart.
    pub fn add_generated(&mut self, text: &str) {
        self.generated_offset += TextSize::from(text.len() as u32);
    }

    /// Records `generated_text` as a rewrite of `original`.
    pub fn add_transformed(&mut self, original: Span, generated_text: &str) {
        let len = TextSize::from(generated_text.len() as u32);
        if len == TextSize::from(0) {
            return;
        }
        self.mappings.push(Mapping {
            generated: Span::new(self.generated_offset, self.generated_offset + len),
            original,
        });
        self.generated_offset += len;
    }

    pub fn build(mut self) -> SourceMap {
        self.mappings.sort_by_key(|m| m.generated.start);
        SourceMap {
            mappings: self.mappings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_map() {
        let map = SourceMap::new();
        assert!(map.is_empty());
        assert_eq!(map.original_position(TextSize::from(0)), None);
    }

    #[test]
    fn test_copied_and_synthetic_segments() {
        let mut builder = SourceMapBuilder::new();
        builder.add_generated("// header\n");
        builder.add_source(TextSize::from(20), "let a = 1;");
        let map = builder.build();

        assert_eq!(map.len(), 1);
        assert_eq!(map.original_position(TextSize::from(3)), None);
        assert_eq!(
            map.original_position(TextSize::from(10)),
            Some(TextSize::from(20))
        );
        assert_eq!(
            map.original_position(TextSize::from(14)),
            Some(TextSize::from(24))
        );
        assert_eq!(
            map.generated_position(TextSize::from(25)),
            Some(TextSize::from(15))
        );
    }

    #[test]
    fn test_transformed_segment_is_clamped() {
        let mut builder = SourceMapBuilder::new();
        builder.add_transformed(Span::new(4u32, 6u32), "__props");
        let map = builder.build();

        assert_eq!(
            map.original_position(TextSize::from(0)),
            Some(TextSize::from(4))
        );
        assert_eq!(
            map.original_position(TextSize::from(6)),
            Some(TextSize::from(6))
        );
    }

    #[test]
    fn test_nearest_position_falls_back() {
        let mut builder = SourceMapBuilder::new();
        builder.add_source(TextSize::from(0), "abc");
        builder.add_generated("\nfunction __setup() {}\n");
        let map = builder.build();

        assert_eq!(
            map.nearest_original_position(TextSize::from(10)),
            Some(TextSize::from(3))
        );
    }
}
