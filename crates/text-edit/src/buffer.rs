//! Position-tracked rewriting of a source text.

use crate::{SourceMap, SourceMapBuilder, Span};
use text_size::TextSize;
use thiserror::Error;

/// An edit that could not be recorded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// The range lies outside the original text or is reversed.
    #[error("edit range {start}..{end} is outside of the source (length {len})")]
    OutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },

    /// The offset splits a multi-byte character.
    #[error("offset {0} is not on a character boundary")]
    NotCharBoundary(usize),
}

#[derive(Debug, Clone)]
struct Replacement {
    start: usize,
    end: usize,
    text: String,
}

#[derive(Debug, Clone)]
struct Insertion {
    pos: usize,
    seq: usize,
    text: String,
}

/// A source text plus the edits recorded against it.
///
/// All offsets refer to the original text, no matter how many edits were
/// recorded before. Overlapping replacements are merged into one covering
/// replacement; insertions that fall strictly inside a replaced range are
/// dropped when the buffer is rendered.
#[derive(Debug, Clone)]
pub struct EditBuffer<'src> {
    original: &'src str,
    replacements: Vec<Replacement>,
    insertions: Vec<Insertion>,
    head: Vec<String>,
    tail: String,
}

impl<'src> EditBuffer<'src> {
    pub fn new(original: &'src str) -> Self {
        Self {
            original,
            replacements: Vec::new(),
            insertions: Vec::new(),
            head: Vec::new(),
            tail: String::new(),
        }
    }

    /// The unedited text.
    pub fn original(&self) -> &'src str {
        self.original
    }

    /// True once any edit has been recorded.
    pub fn has_changes(&self) -> bool {
        !self.replacements.is_empty()
            || !self.insertions.is_empty()
            || !self.head.is_empty()
            || !self.tail.is_empty()
    }

    /// Original text in `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Result<&'src str, EditError> {
        self.check_range(start, end)?;
        Ok(&self.original[start..end])
    }

    /// Returns true if `pos` lies inside an already replaced range.
    pub fn is_replaced(&self, pos: usize) -> bool {
        self.replacements
            .iter()
            .any(|r| r.start <= pos && pos < r.end)
    }

    /// Inserts `text` at `pos`. Insertions at the same offset keep their
    /// call order.
    pub fn insert(&mut self, pos: usize, text: impl Into<String>) -> Result<(), EditError> {
        self.check_range(pos, pos)?;
        let seq = self.insertions.len();
        self.insertions.push(Insertion {
            pos,
            seq,
            text: text.into(),
        });
        Ok(())
    }

    /// Inserts `text` before everything else, including earlier prepends.
    pub fn prepend(&mut self, text: impl Into<String>) {
        self.head.push(text.into());
    }

    /// Appends `text` after everything else.
    pub fn append(&mut self, text: &str) {
        self.tail.push_str(text);
    }

    /// Replaces `start..end` with `text`.
    pub fn overwrite(
        &mut self,
        start: usize,
        end: usize,
        text: impl Into<String>,
    ) -> Result<(), EditError> {
        self.check_range(start, end)?;
        let text = text.into();
        if start == end {
            return self.insert(start, text);
        }
        self.record(Replacement { start, end, text });
        Ok(())
    }

    /// Deletes `start..end`.
    pub fn remove(&mut self, start: usize, end: usize) -> Result<(), EditError> {
        self.check_range(start, end)?;
        if start == end {
            return Ok(());
        }
        self.record(Replacement {
            start,
            end,
            text: String::new(),
        });
        Ok(())
    }

    /// Deletes the text covered by `span`.
    pub fn remove_span(&mut self, span: Span) -> Result<(), EditError> {
        let range = span.range();
        self.remove(range.start, range.end)
    }

    /// Renders the edited text.
    pub fn finish(&self) -> String {
        self.render(None)
    }

    /// Renders the edited text together with a map back to the original.
    pub fn finish_with_map(&self) -> (String, SourceMap) {
        let mut builder = SourceMapBuilder::new();
        let out = self.render(Some(&mut builder));
        (out, builder.build())
    }

    fn check_range(&self, start: usize, end: usize) -> Result<(), EditError> {
        if start > end || end > self.original.len() {
            return Err(EditError::OutOfBounds {
                start,
                end,
                len: self.original.len(),
            });
        }
        for offset in [start, end] {
            if !self.original.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary(offset));
            }
        }
        Ok(())
    }

    fn record(&mut self, mut new: Replacement) {
        // Absorb every replacement touching the new range; texts are kept in
        // source order so merged removals stay removals.
        if self
            .replacements
            .iter()
            .any(|r| r.start <= new.start && new.end <= r.end)
        {
            return;
        }
        let mut before = String::new();
        let mut after = String::new();
        let mut kept = Vec::with_capacity(self.replacements.len() + 1);
        for existing in self.replacements.drain(..) {
            if existing.end <= new.start || new.end <= existing.start {
                kept.push(existing);
                continue;
            }
            if existing.start < new.start {
                before.push_str(&existing.text);
            } else if existing.end > new.end {
                after.push_str(&existing.text);
            }
            new.start = new.start.min(existing.start);
            new.end = new.end.max(existing.end);
        }
        new.text = format!("{before}{}{after}", new.text);
        let idx = kept.partition_point(|r| r.start < new.start);
        kept.insert(idx, new);
        self.replacements = kept;
    }

    fn render(&self, mut map: Option<&mut SourceMapBuilder>) -> String {
        let mut out = String::with_capacity(self.original.len());
        for text in self.head.iter().rev() {
            push_generated(&mut out, &mut map, text);
        }

        let mut insertions: Vec<&Insertion> = self.insertions.iter().collect();
        insertions.sort_by_key(|i| (i.pos, i.seq));
        let mut pending = insertions.into_iter().peekable();
        let mut cursor = 0;

        for replacement in &self.replacements {
            while let Some(ins) = pending.next_if(|i| i.pos <= replacement.start) {
                self.copy(&mut out, &mut map, cursor, ins.pos);
                cursor = ins.pos;
                push_generated(&mut out, &mut map, &ins.text);
            }
            self.copy(&mut out, &mut map, cursor, replacement.start);
            if let Some(builder) = map.as_deref_mut() {
                builder.add_transformed(
                    Span::from_range(replacement.start..replacement.end),
                    &replacement.text,
                );
            }
            out.push_str(&replacement.text);
            while pending.next_if(|i| i.pos < replacement.end).is_some() {}
            cursor = replacement.end;
        }

        for ins in pending {
            self.copy(&mut out, &mut map, cursor, ins.pos);
            cursor = ins.pos;
            push_generated(&mut out, &mut map, &ins.text);
        }
        self.copy(&mut out, &mut map, cursor, self.original.len());
        push_generated(&mut out, &mut map, &self.tail);
        out
    }

    fn copy(
        &self,
        out: &mut String,
        map: &mut Option<&mut SourceMapBuilder>,
        start: usize,
        end: usize,
    ) {
        if start >= end {
            return;
        }
        let text = &self.original[start..end];
        if let Some(builder) = map.as_deref_mut() {
            builder.add_source(TextSize::from(start as u32), text);
        }
        out.push_str(text);
    }
}

fn push_generated(out: &mut String, map: &mut Option<&mut SourceMapBuilder>, text: &str) {
    if let Some(builder) = map.as_deref_mut() {
        builder.add_generated(text);
    }
    out.push_str(text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_untouched_buffer_renders_original() {
        let buffer = EditBuffer::new("export {};\n");
        assert!(!buffer.has_changes());
        assert_eq!(buffer.finish(), "export {};\n");
    }

    #[test]
    fn test_edits_use_original_offsets() {
        let source = "export type { A, B } from './x';";
        let mut buffer = EditBuffer::new(source);
        buffer.remove(7, 12).unwrap();
        buffer.overwrite(14, 15, "Alpha").unwrap();
        buffer.remove(15, 18).unwrap();
        assert_eq!(buffer.finish(), "export { Alpha } from './x';");
    }

    #[test]
    fn test_nested_removal_is_absorbed() {
        let source = "interface A { b: string; c: number; }";
        let mut buffer = EditBuffer::new(source);
        buffer.remove(0, source.len()).unwrap();
        buffer.remove(14, 24).unwrap();
        assert_eq!(buffer.finish(), "");
    }

    #[test]
    fn test_partial_overlap_merges_into_union() {
        let mut buffer = EditBuffer::new("0123456789");
        buffer.remove(2, 5).unwrap();
        buffer.remove(4, 7).unwrap();
        assert_eq!(buffer.finish(), "01789");
    }

    #[test]
    fn test_insertions_keep_call_order_and_skip_removed_ranges() {
        let mut buffer = EditBuffer::new("abcdef");
        buffer.insert(3, "1").unwrap();
        buffer.insert(3, "2").unwrap();
        buffer.remove(1, 5).unwrap();
        buffer.insert(1, "<").unwrap();
        buffer.insert(5, ">").unwrap();
        assert_eq!(buffer.finish(), "a<>f");
    }

    #[test]
    fn test_prepend_and_append() {
        let mut buffer = EditBuffer::new("body");
        buffer.prepend("b;");
        buffer.prepend("a;");
        buffer.append(";z");
        assert_eq!(buffer.finish(), "a;b;body;z");
    }

    #[test]
    fn test_out_of_bounds_and_char_boundary() {
        let mut buffer = EditBuffer::new("é");
        assert_eq!(
            buffer.remove(0, 5),
            Err(EditError::OutOfBounds {
                start: 0,
                end: 5,
                len: 2
            })
        );
        assert_eq!(buffer.remove(0, 1), Err(EditError::NotCharBoundary(1)));
    }

    #[test]
    fn test_finish_with_map_tracks_copied_text() {
        let source = "const a = 1;\nconst b = 2;\n";
        let mut buffer = EditBuffer::new(source);
        buffer.remove(0, 13).unwrap();
        buffer.prepend("// generated\n");
        let (out, map) = buffer.finish_with_map();

        assert_eq!(out, "// generated\nconst b = 2;\n");
        assert_eq!(
            map.original_position(TextSize::from(13)),
            Some(TextSize::from(13))
        );
        assert_eq!(
            map.original_position(TextSize::from(19)),
            Some(TextSize::from(19))
        );
    }
}
