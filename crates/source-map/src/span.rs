//! Span and byte offset types for source positions.

use serde::{Deserialize, Serialize};
use text_size::TextSize;

/// A byte offset into a source string.
pub type ByteOffset = TextSize;

/// A half-open byte range `[start, end)` into a snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: ByteOffset,
    pub end: ByteOffset,
}

impl Span {
    /// Creates a new span from start and end byte offsets.
    #[inline]
    pub fn new(start: impl Into<ByteOffset>, end: impl Into<ByteOffset>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Creates a span from `usize` offsets, as produced by string slicing.
    #[inline]
    pub fn from_usize(start: usize, end: usize) -> Self {
        Self::new(to_size(start), to_size(end))
    }

    #[inline]
    pub fn len(&self) -> TextSize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Start offset as a `usize` for slicing.
    #[inline]
    pub fn start_usize(&self) -> usize {
        u32::from(self.start) as usize
    }

    /// End offset as a `usize` for slicing.
    #[inline]
    pub fn end_usize(&self) -> usize {
        u32::from(self.end) as usize
    }

    /// Returns the text this span covers, or `""` when it is out of bounds.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source
            .get(self.start_usize()..self.end_usize())
            .unwrap_or_default()
    }
}

/// Converts a `usize` offset into a [`ByteOffset`], saturating at `u32::MAX`.
#[inline]
pub(crate) fn to_size(offset: usize) -> ByteOffset {
    TextSize::from(u32::try_from(offset).unwrap_or(u32::MAX))
}
