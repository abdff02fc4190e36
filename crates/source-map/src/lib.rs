//! Source position tracking and source maps for compiled snippets.
//!
//! Offsets are byte offsets into UTF-8 text. Source map columns are emitted in UTF-16
//! code units, which is what JavaScript engines report in stack traces.

mod builder;
mod line_index;
mod mappings;
mod span;
pub mod vlq;

pub use builder::{Mapping, OriginalPosition, SourceMap, SourceMapBuilder};
pub use line_index::{LineCol, LineIndex};
pub use mappings::{Mappings, Segment};
pub use span::{ByteOffset, Span};
pub use vlq::DecodeError;
