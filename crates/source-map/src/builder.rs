//! Source map construction from token-level offset pairs, and lookup.

use crate::mappings::{Mappings, Segment};
use crate::span::to_size;
use crate::vlq::DecodeError;
use crate::{ByteOffset, LineIndex};
use serde::{Deserialize, Serialize};

/// A generated offset paired with the original offset it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub generated: ByteOffset,
    pub original: ByteOffset,
}

/// A resolved original position: 0-based line, 0-based UTF-16 column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalPosition {
    pub source: u32,
    pub line: u32,
    pub column: u32,
}

/// A version 3 source map as it is serialized to JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources_content: Vec<Option<String>>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl Default for SourceMap {
    fn default() -> Self {
        Self {
            version: 3,
            file: None,
            sources: Vec::new(),
            sources_content: Vec::new(),
            names: Vec::new(),
            mappings: String::new(),
        }
    }
}

impl SourceMap {
    pub fn builder(source_name: impl Into<String>) -> SourceMapBuilder {
        SourceMapBuilder::new(source_name)
    }

    /// Decodes the `mappings` string into per-line segments.
    pub fn decode(&self) -> Result<Mappings, DecodeError> {
        Mappings::decode(&self.mappings)
    }

    /// Looks up the original position of a segment starting exactly at the given
    /// 0-based generated line and column.
    pub fn original_position_for(
        &self,
        line: u32,
        column: u32,
    ) -> Result<Option<OriginalPosition>, DecodeError> {
        let mappings = self.decode()?;
        Ok(mappings
            .find_exact(line, column)
            .and_then(|s| s.source)
            .map(|s| OriginalPosition {
                source: s.source,
                line: s.line,
                column: s.column,
            }))
    }

    /// Like [`SourceMap::original_position_for`], but falls back to the closest
    /// segment starting before `column`.
    pub fn nearest_original_position_for(
        &self,
        line: u32,
        column: u32,
    ) -> Result<Option<OriginalPosition>, DecodeError> {
        let mappings = self.decode()?;
        Ok(mappings
            .find_nearest(line, column)
            .and_then(|s| s.source)
            .map(|s| OriginalPosition {
                source: s.source,
                line: s.line,
                column: s.column,
            }))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Collects offset pairs while code is generated and turns them into a [`SourceMap`].
#[derive(Debug)]
pub struct SourceMapBuilder {
    source_name: String,
    file: Option<String>,
    include_content: bool,
    mappings: Vec<Mapping>,
}

impl SourceMapBuilder {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            file: None,
            include_content: false,
            mappings: Vec::new(),
        }
    }

    /// Sets the `file` field of the produced map.
    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Embeds the original text as `sourcesContent`.
    pub fn include_content(mut self, include: bool) -> Self {
        self.include_content = include;
        self
    }

    /// Records that generated text at `generated` came from `original`.
    pub fn add_mapping(&mut self, generated: ByteOffset, original: ByteOffset) {
        self.mappings.push(Mapping {
            generated,
            original,
        });
    }

    /// [`SourceMapBuilder::add_mapping`] for offsets taken from string slicing.
    pub fn add_offsets(&mut self, generated: usize, original: usize) {
        self.add_mapping(to_size(generated), to_size(original));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Resolves every recorded pair to line/column form and encodes the map.
    pub fn build(self, original: &str, generated: &str) -> SourceMap {
        let original_index = LineIndex::new(original);
        let generated_index = LineIndex::new(generated);
        let mut mappings = Mappings::new();

        for mapping in &self.mappings {
            let (Some(target), Some(orig)) = (
                generated_index.line_col(generated, mapping.generated),
                original_index.line_col(original, mapping.original),
            ) else {
                continue;
            };
            mappings.push(target.line, Segment::mapped(target.col, 0, orig.line, orig.col));
        }
        mappings.prune();

        SourceMap {
            version: 3,
            file: self.file,
            sources: vec![self.source_name],
            sources_content: if self.include_content {
                vec![Some(original.to_string())]
            } else {
                Vec::new()
            },
            names: Vec::new(),
            mappings: mappings.encode(),
        }
    }
}
