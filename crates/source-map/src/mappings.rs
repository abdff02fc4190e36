//! Decoded source map segments and their `mappings` string encoding.

use crate::vlq::{self, DecodeError};

/// Where a generated column points in an original source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRef {
    pub source: u32,
    pub line: u32,
    pub column: u32,
    pub name: Option<u32>,
}

/// One segment of a generated line. A segment without a source marks unmapped output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    pub gen_column: u32,
    pub source: Option<SourceRef>,
}

impl Segment {
    pub fn mapped(gen_column: u32, source: u32, line: u32, column: u32) -> Self {
        Self {
            gen_column,
            source: Some(SourceRef {
                source,
                line,
                column,
                name: None,
            }),
        }
    }

    pub fn unmapped(gen_column: u32) -> Self {
        Self {
            gen_column,
            source: None,
        }
    }
}

/// Segments grouped by generated line, each line sorted by generated column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mappings {
    lines: Vec<Vec<Segment>>,
}

impl Mappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a segment on the given generated line, keeping the line sorted.
    pub fn push(&mut self, line: u32, segment: Segment) {
        let line = line as usize;
        if self.lines.len() <= line {
            self.lines.resize_with(line + 1, Vec::new);
        }
        let segments = &mut self.lines[line];
        let at = segments.partition_point(|s| s.gen_column <= segment.gen_column);
        segments.insert(at, segment);
    }

    pub fn lines(&self) -> &[Vec<Segment>] {
        &self.lines
    }

    pub fn line(&self, line: u32) -> &[Segment] {
        self.lines
            .get(line as usize)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Finds the segment starting exactly at `column` on `line`.
    pub fn find_exact(&self, line: u32, column: u32) -> Option<&Segment> {
        let segments = self.line(line);
        segments
            .binary_search_by_key(&column, |s| s.gen_column)
            .ok()
            .map(|idx| &segments[idx])
    }

    /// Finds the last segment starting at or before `column` on `line`.
    pub fn find_nearest(&self, line: u32, column: u32) -> Option<&Segment> {
        let segments = self.line(line);
        let idx = segments.partition_point(|s| s.gen_column <= column);
        idx.checked_sub(1).map(|idx| &segments[idx])
    }

    /// Drops segments that do not change any lookup: a segment sharing the previous
    /// segment's generated column, an unmapped segment that opens a line or follows
    /// another unmapped segment. Segments at distinct columns that point at the same
    /// original position are kept, since exact lookups need each of them.
    pub fn prune(&mut self) {
        for segments in &mut self.lines {
            let mut kept: Vec<Segment> = Vec::with_capacity(segments.len());
            for segment in segments.drain(..) {
                match kept.last() {
                    None if segment.source.is_none() => {}
                    None => kept.push(segment),
                    Some(prev) if prev.gen_column == segment.gen_column => {}
                    Some(prev) if prev.source.is_none() && segment.source.is_none() => {}
                    Some(_) => kept.push(segment),
                }
            }
            *segments = kept;
        }
        while self.lines.last().is_some_and(Vec::is_empty) {
            self.lines.pop();
        }
    }

    /// Serializes to a `mappings` string.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        let mut prev_source = 0i64;
        let mut prev_line = 0i64;
        let mut prev_column = 0i64;
        let mut prev_name = 0i64;

        for (line_idx, segments) in self.lines.iter().enumerate() {
            if line_idx > 0 {
                out.push(';');
            }
            let mut prev_gen = 0i64;
            for (seg_idx, segment) in segments.iter().enumerate() {
                if seg_idx > 0 {
                    out.push(',');
                }
                vlq::encode(i64::from(segment.gen_column) - prev_gen, &mut out);
                prev_gen = i64::from(segment.gen_column);

                let Some(source) = segment.source else {
                    continue;
                };
                vlq::encode(i64::from(source.source) - prev_source, &mut out);
                vlq::encode(i64::from(source.line) - prev_line, &mut out);
                vlq::encode(i64::from(source.column) - prev_column, &mut out);
                prev_source = i64::from(source.source);
                prev_line = i64::from(source.line);
                prev_column = i64::from(source.column);
                if let Some(name) = source.name {
                    vlq::encode(i64::from(name) - prev_name, &mut out);
                    prev_name = i64::from(name);
                }
            }
        }
        out
    }

    /// Parses a `mappings` string.
    pub fn decode(input: &str) -> Result<Self, DecodeError> {
        let bytes = input.as_bytes();
        let mut lines = vec![Vec::new()];
        let mut pos = 0usize;
        let mut prev_gen = 0i64;
        let mut prev_source = 0i64;
        let mut prev_line = 0i64;
        let mut prev_column = 0i64;
        let mut prev_name = 0i64;

        while pos < bytes.len() {
            match bytes[pos] {
                b';' => {
                    pos += 1;
                    prev_gen = 0;
                    lines.push(Vec::new());
                    continue;
                }
                b',' => {
                    pos += 1;
                    continue;
                }
                _ => {}
            }

            let mut fields = [0i64; 5];
            let mut count = 0usize;
            while pos < bytes.len() && bytes[pos] != b',' && bytes[pos] != b';' {
                if count == fields.len() {
                    return Err(DecodeError::BadSegmentLength(count + 1));
                }
                fields[count] = vlq::decode(bytes, &mut pos)?;
                count += 1;
            }

            accumulate(&mut prev_gen, fields[0])?;
            let source = match count {
                1 => None,
                4 | 5 => {
                    accumulate(&mut prev_source, fields[1])?;
                    accumulate(&mut prev_line, fields[2])?;
                    accumulate(&mut prev_column, fields[3])?;
                    let name = if count == 5 {
                        accumulate(&mut prev_name, fields[4])?;
                        Some(non_negative(prev_name)?)
                    } else {
                        None
                    };
                    Some(SourceRef {
                        source: non_negative(prev_source)?,
                        line: non_negative(prev_line)?,
                        column: non_negative(prev_column)?,
                        name,
                    })
                }
                n => return Err(DecodeError::BadSegmentLength(n)),
            };

            if let Some(segments) = lines.last_mut() {
                segments.push(Segment {
                    gen_column: non_negative(prev_gen)?,
                    source,
                });
            }
        }

        for segments in &mut lines {
            segments.sort_by_key(|s| s.gen_column);
        }
        while lines.last().is_some_and(Vec::is_empty) {
            lines.pop();
        }
        Ok(Self { lines })
    }
}

/// Applies a delta, rejecting sums that leave the `i64` range.
fn accumulate(total: &mut i64, delta: i64) -> Result<(), DecodeError> {
    *total = total.checked_add(delta).ok_or(DecodeError::Overflow)?;
    Ok(())
}

fn non_negative(value: i64) -> Result<u32, DecodeError> {
    u32::try_from(value).map_err(|_| DecodeError::NegativeValue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Mappings {
        let mut mappings = Mappings::new();
        mappings.push(0, Segment::mapped(0, 0, 0, 0));
        mappings.push(0, Segment::mapped(4, 0, 0, 4));
        mappings.push(2, Segment::mapped(2, 0, 1, 0));
        mappings.push(2, Segment::unmapped(9));
        mappings
    }

    #[test]
    fn test_encode() {
        assert_eq!(sample().encode(), "AAAA,IAAI;;EACJ,O");
    }

    #[test]
    fn test_decode_reverses_encode() {
        let mappings = sample();
        assert_eq!(Mappings::decode(&mappings.encode()), Ok(mappings));
    }

    #[test]
    fn test_decode_with_names() {
        let decoded = Mappings::decode("AAAAA,CAACC").unwrap();
        assert_eq!(decoded.line(0)[1].source.unwrap().name, Some(1));
    }

    #[test]
    fn test_decode_rejects_two_field_segment() {
        assert_eq!(
            Mappings::decode("AA"),
            Err(DecodeError::BadSegmentLength(2))
        );
    }

    #[test]
    fn test_decode_rejects_overflowing_deltas() {
        let mut huge = String::new();
        vlq::encode(i64::MAX, &mut huge);
        let input = format!("C,{huge}");
        assert_eq!(Mappings::decode(&input), Err(DecodeError::Overflow));
    }

    #[test]
    fn test_prune_removes_redundant_segments() {
        let mut mappings = Mappings::new();
        mappings.push(0, Segment::unmapped(0));
        mappings.push(0, Segment::mapped(3, 0, 0, 3));
        mappings.push(0, Segment::mapped(3, 0, 0, 7));
        mappings.push(0, Segment::mapped(5, 0, 0, 3));
        mappings.push(0, Segment::unmapped(6));
        mappings.push(0, Segment::unmapped(7));
        mappings.push(0, Segment::mapped(8, 0, 0, 8));
        mappings.prune();
        assert_eq!(
            mappings.line(0),
            &[
                Segment::mapped(3, 0, 0, 3),
                Segment::mapped(5, 0, 0, 3),
                Segment::unmapped(6),
                Segment::mapped(8, 0, 0, 8),
            ]
        );
    }

    #[test]
    fn test_prune_is_idempotent_and_preserves_resolution() {
        let mut pruned = sample();
        pruned.push(0, Segment::mapped(6, 0, 0, 4));
        let original = pruned.clone();
        pruned.prune();
        let twice = {
            let mut again = pruned.clone();
            again.prune();
            again
        };
        assert_eq!(pruned, twice);
        for column in 0..12 {
            assert_eq!(
                original.find_nearest(0, column).and_then(|s| s.source),
                pruned.find_nearest(0, column).and_then(|s| s.source),
            );
            assert_eq!(
                original.find_exact(0, column).and_then(|s| s.source),
                pruned.find_exact(0, column).and_then(|s| s.source),
            );
        }
    }

    #[test]
    fn test_find_exact_and_nearest() {
        let mappings = sample();
        assert!(mappings.find_exact(0, 4).is_some());
        assert!(mappings.find_exact(0, 5).is_none());
        assert_eq!(mappings.find_nearest(0, 5).map(|s| s.gen_column), Some(4));
        assert!(mappings.find_nearest(1, 0).is_none());
    }
}
