//! Line index for offset ↔ line/column conversion.

use crate::span::to_size;
use crate::ByteOffset;
use serde::{Deserialize, Serialize};
use text_size::TextSize;

/// A line and column position (0-indexed).
///
/// Columns count UTF-16 code units, matching what JavaScript engines report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// An index of line starts over one text.
///
/// Lines that are pure ASCII convert columns by subtraction; other lines are
/// walked char by char to count UTF-16 units.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// `line_starts[i]` is the byte offset where line `i` begins.
    line_starts: Vec<ByteOffset>,
    /// Lines containing at least one non-ASCII character.
    wide_lines: Vec<u32>,
    text_len: ByteOffset,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        let mut wide_lines = Vec::new();

        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(to_size(offset + 1));
            } else if !byte.is_ascii() {
                let line = (line_starts.len() - 1) as u32;
                if wide_lines.last() != Some(&line) {
                    wide_lines.push(line);
                }
            }
        }

        Self {
            line_starts,
            wide_lines,
            text_len: to_size(text.len()),
        }
    }

    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts a byte offset to a line/column position.
    ///
    /// `text` must be the text this index was built from. Returns `None` past the end.
    pub fn line_col(&self, text: &str, offset: ByteOffset) -> Option<LineCol> {
        if offset > self.text_len {
            return None;
        }
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let line_start = self.line_starts[line];
        let col = if self.wide_lines.binary_search(&(line as u32)).is_ok() {
            let start = u32::from(line_start) as usize;
            let end = u32::from(offset) as usize;
            text.get(start..end)?.encode_utf16().count() as u32
        } else {
            u32::from(offset) - u32::from(line_start)
        };

        Some(LineCol {
            line: line as u32,
            col,
        })
    }

    /// Converts a line/column position back to a byte offset.
    pub fn offset(&self, text: &str, line_col: LineCol) -> Option<ByteOffset> {
        let line_start = *self.line_starts.get(line_col.line as usize)?;
        if self.wide_lines.binary_search(&line_col.line).is_err() {
            return Some(line_start + TextSize::from(line_col.col));
        }

        let rest = text.get(u32::from(line_start) as usize..)?;
        let mut units = 0u32;
        for (byte, ch) in rest.char_indices() {
            if units >= line_col.col {
                return Some(line_start + to_size(byte));
            }
            units += ch.len_utf16() as u32;
        }
        Some(self.text_len)
    }

    /// Returns the byte offset where a line starts.
    pub fn line_start(&self, line: u32) -> Option<ByteOffset> {
        self.line_starts.get(line as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_multiple_lines() {
        let text = "hello\nworld\nfoo";
        let index = LineIndex::new(text);
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_col(text, TextSize::from(5)), Some(LineCol::new(0, 5)));
        assert_eq!(index.line_col(text, TextSize::from(6)), Some(LineCol::new(1, 0)));
        assert_eq!(index.line_col(text, TextSize::from(12)), Some(LineCol::new(2, 0)));
        assert_eq!(index.line_col(text, TextSize::from(99)), None);
    }

    #[test]
    fn test_utf16_columns() {
        // 'é' is two bytes and one UTF-16 unit; the emoji is four bytes and two units.
        let text = "a\né😀x";
        let index = LineIndex::new(text);
        let x = TextSize::from(text.find('x').unwrap() as u32);
        assert_eq!(index.line_col(text, x), Some(LineCol::new(1, 3)));
        assert_eq!(index.offset(text, LineCol::new(1, 3)), Some(x));
    }

    #[test]
    fn test_offset_roundtrip() {
        let text = "hello\nworld\nfoo";
        let index = LineIndex::new(text);
        for offset in 0..text.len() {
            let offset = TextSize::from(offset as u32);
            let line_col = index.line_col(text, offset).unwrap();
            assert_eq!(index.offset(text, line_col), Some(offset));
        }
    }
}
