//! Maps a runtime error thrown by generated code back to the snippet.
//!
//! The generated code runs as the body of `new Function(...)`, so the positions an
//! engine reports are relative to the synthesized function source. That source
//! starts with a prologue (`function anonymous(React,render,...\n) {\n`) whose
//! lines are subtracted before the source map is consulted.

use crate::thrown::{Location, ThrownError};
use regex::Regex;
use source_map::{DecodeError, Mappings, SourceMap};
use std::sync::OnceLock;

/// Stack frames for code compiled by `new Function` (`<anonymous>:3:7` in V8,
/// `> Function:3:7` in SpiderMonkey).
const FRAME_PATTERN: &str = r"(?:<anonymous>|> Function):(\d+):(\d+)";

fn frame_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(FRAME_PATTERN).ok()).as_ref()
}

/// Lines the function prologue adds before the first line of the body.
///
/// Counts newlines up to the opening `{` of the body, plus one when a newline
/// directly follows it.
pub fn wrapper_line_offset(prologue: &str) -> u32 {
    let Some(brace) = prologue.rfind('{') else {
        return 0;
    };
    let before = prologue[..brace].matches('\n').count() as u32;
    let after = u32::from(prologue[brace + 1..].starts_with('\n'));
    before + after
}

/// The 1-based line and column the engine reports for `error`, in the
/// coordinates of the whole function source.
pub fn reported_position(error: &ThrownError) -> Option<(u32, u32)> {
    if let (Some(line), Some(column)) = (error.line_number, error.column_number) {
        return Some((line, column));
    }
    let stack = error.stack.as_deref()?;
    let captures = frame_pattern()?.captures(stack)?;
    let line = captures.get(1)?.as_str().parse().ok()?;
    let column = captures.get(2)?.as_str().parse().ok()?;
    Some((line, column))
}

/// Resolves thrown errors against one compile's source map.
#[derive(Debug, Clone)]
pub struct ErrorLocationResolver {
    mappings: Mappings,
    line_offset: u32,
}

impl ErrorLocationResolver {
    /// Decodes `map` once; `prologue` is the function source text before the body.
    pub fn new(map: &SourceMap, prologue: &str) -> Result<Self, DecodeError> {
        Ok(Self::with_line_offset(map.decode()?, wrapper_line_offset(prologue)))
    }

    pub fn with_line_offset(mappings: Mappings, line_offset: u32) -> Self {
        Self {
            mappings,
            line_offset,
        }
    }

    pub fn line_offset(&self) -> u32 {
        self.line_offset
    }

    /// The original location of `error`, if the engine reported a position that
    /// starts a mapped segment. Nothing is guessed for positions between segments.
    pub fn locate(&self, error: &ThrownError) -> Option<Location> {
        let (line, column) = reported_position(error)?;
        let generated_line = line.checked_sub(1)?.checked_sub(self.line_offset)?;
        let generated_column = column.saturating_sub(1);
        let segment = self.mappings.find_exact(generated_line, generated_column)?;
        let source = segment.source?;
        Some(Location {
            line: source.line + 1,
            column: source.column,
        })
    }

    /// Attaches the original location to `error` and returns it.
    pub fn resolve(&self, error: &mut ThrownError) -> Option<Location> {
        let location = self.locate(error);
        match location {
            Some(location) => tracing::debug!(%location, "resolved runtime error"),
            None => tracing::debug!(message = %error.message, "runtime error left unlocated"),
        }
        error.location = location;
        location
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use source_map::Segment;

    const V8_PROLOGUE: &str = "function anonymous(React,render,require,exports\n) {\n";

    fn resolver(line_offset: u32) -> ErrorLocationResolver {
        let mut mappings = Mappings::new();
        mappings.push(0, Segment::mapped(0, 0, 0, 0));
        mappings.push(1, Segment::mapped(8, 0, 1, 0));
        mappings.push(1, Segment::mapped(11, 0, 1, 3));
        ErrorLocationResolver::with_line_offset(mappings, line_offset)
    }

    #[test]
    fn test_wrapper_line_offset() {
        assert_eq!(wrapper_line_offset(V8_PROLOGUE), 2);
        assert_eq!(wrapper_line_offset("function anonymous(a) {"), 0);
        assert_eq!(wrapper_line_offset("(function anonymous(a\n) {\n"), 2);
        assert_eq!(wrapper_line_offset(""), 0);
    }

    #[test]
    fn test_reported_position_from_fields() {
        let error = ThrownError::new("Error", "boom")
            .with_position(5, 2)
            .with_stack("Error: boom\n    at <anonymous>:9:9");
        assert_eq!(reported_position(&error), Some((5, 2)));
    }

    #[test]
    fn test_reported_position_from_v8_stack() {
        let error = ThrownError::new("ReferenceError", "foo is not defined").with_stack(
            "ReferenceError: foo is not defined\n    at eval (eval at run (file:///w.mjs:40:12), <anonymous>:4:9)",
        );
        assert_eq!(reported_position(&error), Some((4, 9)));
    }

    #[test]
    fn test_reported_position_from_firefox_stack() {
        let error = ThrownError::new("Error", "boom")
            .with_stack("anonymous@file:///w.mjs line 40 > Function:3:1\n");
        assert_eq!(reported_position(&error), Some((3, 1)));
    }

    #[test]
    fn test_reported_position_missing() {
        let error = ThrownError::new("Error", "boom").with_stack("Error: boom\n    at main (w.mjs:1:1)");
        assert_eq!(reported_position(&error), None);
    }

    #[test]
    fn test_locate_exact_segment() {
        let resolver = resolver(2);
        let mut error = ThrownError::new("Error", "boom").with_position(4, 9);
        assert_eq!(resolver.resolve(&mut error), Some(Location { line: 2, column: 0 }));
        assert_eq!(error.location, Some(Location { line: 2, column: 0 }));
    }

    #[test]
    fn test_locate_between_segments_is_unlocated() {
        let resolver = resolver(2);
        let mut error = ThrownError::new("Error", "boom").with_position(4, 10);
        assert_eq!(resolver.resolve(&mut error), None);
        assert_eq!(error.location, None);
    }

    #[test]
    fn test_locate_inside_prologue_is_unlocated() {
        let resolver = resolver(2);
        let error = ThrownError::new("Error", "boom").with_position(2, 1);
        assert_eq!(resolver.locate(&error), None);
    }

    #[test]
    fn test_new_decodes_map() {
        let map = SourceMap {
            sources: vec!["snippet".to_string()],
            mappings: "AAAA;QACA".to_string(),
            ..SourceMap::default()
        };
        let resolver = ErrorLocationResolver::new(&map, V8_PROLOGUE).unwrap();
        assert_eq!(resolver.line_offset(), 2);
        let error = ThrownError::new("Error", "boom").with_position(4, 9);
        assert_eq!(resolver.locate(&error), Some(Location { line: 2, column: 0 }));
    }
}
