//! Offset to line/column conversion, used when reporting diagnostics.

use crate::ByteOffset;
use text_size::TextSize;

/// A zero-based line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Builds a position from the one-based line and column printed by
    /// TypeScript compilers.
    pub fn from_one_based(line: u32, col: u32) -> Self {
        Self {
            line: line.saturating_sub(1),
            col: col.saturating_sub(1),
        }
    }

    /// The one-based `(line, column)` pair for display.
    pub fn one_based(self) -> (u32, u32) {
        (self.line + 1, self.col + 1)
    }
}

/// Start offsets of every line of a text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<ByteOffset>,
    len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let line_starts = std::iter::once(TextSize::from(0))
            .chain(
                text.match_indices('\n')
                    .map(|(offset, _)| TextSize::from((offset + 1) as u32)),
            )
            .collect();

        Self {
            line_starts,
            len: TextSize::from(text.len() as u32),
        }
    }

    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts a byte offset to a line/column position.
    ///
    /// Returns `None` past the end of the text.
    pub fn line_col(&self, offset: ByteOffset) -> Option<LineCol> {
        if offset > self.len {
            return None;
        }
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let line_start = self.line_starts[line];

        Some(LineCol {
            line: line as u32,
            col: u32::from(offset - line_start),
        })
    }

    /// Converts a line/column position back to a byte offset.
    pub fn offset(&self, line_col: LineCol) -> Option<ByteOffset> {
        let line_start = *self.line_starts.get(line_col.line as usize)?;
        let offset = line_start + TextSize::from(line_col.col);
        (offset <= self.len).then_some(offset)
    }

    pub fn line_start(&self, line: u32) -> Option<ByteOffset> {
        self.line_starts.get(line as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_lines() {
        let index = LineIndex::new("export {\n  a,\n};");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_col(TextSize::from(0)), Some(LineCol::new(0, 0)));
        assert_eq!(index.line_col(TextSize::from(11)), Some(LineCol::new(1, 2)));
        assert_eq!(index.line_col(TextSize::from(14)), Some(LineCol::new(2, 0)));
        assert_eq!(index.line_col(TextSize::from(99)), None);
    }

    #[test]
    fn test_offset_roundtrip() {
        let text = "interface A {}\ntype B = A;\n";
        let index = LineIndex::new(text);

        for offset in 0..=text.len() {
            let offset = TextSize::from(offset as u32);
            let line_col = index.line_col(offset).unwrap();
            assert_eq!(index.offset(line_col), Some(offset));
        }
    }

    #[test]
    fn test_one_based_conversion() {
        let pos = LineCol::from_one_based(3, 7);
        assert_eq!(pos, LineCol::new(2, 6));
        assert_eq!(pos.one_based(), (3, 7));
    }
}
