//! Token cursor and edit log.
//!
//! Transforms walk the token array front to back and record, for every token, whether
//! it is copied, replaced or removed, plus any code inserted around it. Nothing is
//! rendered until [`TokenProcessor::finish`], which concatenates for each token its
//! leading gap (whitespace and comments), insertions, and its text or replacement.
//! Copying every token reproduces the input byte for byte.

use crate::error::CompileError;
use snippet_parser::{ContextualKeyword, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenOp {
    Copy,
    Replace(String),
    /// Drops the token; only line breaks of its gap and text survive.
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Edit {
    /// Code inserted between tokens.
    Insert(String),
    Token {
        index: usize,
        op: TokenOp,
        /// Code placed after the gap, directly before the token text.
        prefix: String,
        /// Offsets into `prefix` that map to the token's original start.
        marks: Vec<usize>,
        /// Keep only the line breaks of the gap.
        trim_gap: bool,
    },
}

/// A restorable position of a [`TokenProcessor`].
#[derive(Debug, Clone)]
pub struct ProcessorSnapshot {
    index: usize,
    log_len: usize,
    pending_prefix: String,
    pending_marks: Vec<usize>,
    trim_next_gap: bool,
}

/// The rendered output of a [`TokenProcessor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    pub code: String,
    /// `(generated offset, original offset)` for every token whose text or
    /// replacement was emitted, in output order.
    pub mappings: Vec<(usize, usize)>,
}

#[derive(Debug)]
pub struct TokenProcessor<'a> {
    source: &'a str,
    tokens: &'a [Token],
    index: usize,
    log: Vec<Edit>,
    pending_prefix: String,
    pending_marks: Vec<usize>,
    trim_next_gap: bool,
}

impl<'a> TokenProcessor<'a> {
    /// `tokens` must end with an `Eof` token, as produced by the parser.
    pub fn new(source: &'a str, tokens: &'a [Token]) -> Self {
        Self {
            source,
            tokens,
            index: 0,
            log: Vec::with_capacity(tokens.len()),
            pending_prefix: String::new(),
            pending_marks: Vec::new(),
            trim_next_gap: false,
        }
    }

    // === Inspection ===

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn tokens(&self) -> &'a [Token] {
        self.tokens
    }

    #[inline]
    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn token_at(&self, index: usize) -> Option<&'a Token> {
        self.tokens.get(index)
    }

    /// The current token, or the final `Eof` once everything is processed.
    pub fn current_token(&self) -> Token {
        self.tokens
            .get(self.index)
            .or_else(|| self.tokens.last())
            .copied()
            .unwrap_or_default()
    }

    pub fn is_at_end(&self) -> bool {
        self.current_token().kind == TokenKind::Eof
    }

    pub fn current_text(&self) -> &'a str {
        self.text_at(self.index)
    }

    pub fn text_at(&self, index: usize) -> &'a str {
        self.tokens
            .get(index)
            .map(|t| t.text(self.source))
            .unwrap_or_default()
    }

    /// Whether the tokens starting at the current one have exactly these kinds.
    pub fn matches(&self, kinds: &[TokenKind]) -> bool {
        self.matches_at(self.index, kinds)
    }

    pub fn matches_at(&self, index: usize, kinds: &[TokenKind]) -> bool {
        kinds
            .iter()
            .enumerate()
            .all(|(offset, kind)| self.tokens.get(index + offset).is_some_and(|t| t.kind == *kind))
    }

    pub fn matches_contextual(&self, keyword: ContextualKeyword) -> bool {
        self.matches_contextual_at(self.index, keyword)
    }

    pub fn matches_contextual_at(&self, index: usize, keyword: ContextualKeyword) -> bool {
        self.tokens
            .get(index)
            .is_some_and(|t| t.is_contextual(keyword))
    }

    /// An error pointing at the current token.
    pub fn invariant(&self, message: impl Into<String>) -> CompileError {
        CompileError::invariant(message, self.current_token().start())
    }

    // === Edits ===

    fn push_token_edit(&mut self, op: TokenOp, trim_gap: bool) {
        if self.index >= self.tokens.len().saturating_sub(1) {
            // The `Eof` token is rendered by `finish`.
            return;
        }
        self.log.push(Edit::Token {
            index: self.index,
            op,
            prefix: std::mem::take(&mut self.pending_prefix),
            marks: std::mem::take(&mut self.pending_marks),
            trim_gap: trim_gap || std::mem::take(&mut self.trim_next_gap),
        });
        self.index += 1;
    }

    pub fn copy_token(&mut self) {
        self.push_token_edit(TokenOp::Copy, false);
    }

    /// Copies the current token, failing if it is not of `kind`.
    pub fn copy_expected_token(&mut self, kind: TokenKind) -> Result<(), CompileError> {
        if self.current_token().kind != kind {
            return Err(self.invariant(format!("Expected token {}", kind.label())));
        }
        self.copy_token();
        Ok(())
    }

    pub fn replace_token(&mut self, text: impl Into<String>) {
        self.push_token_edit(TokenOp::Replace(text.into()), false);
    }

    /// Replaces the current token and drops everything but line breaks before it.
    pub fn replace_token_trimming_left_whitespace(&mut self, text: impl Into<String>) {
        self.push_token_edit(TokenOp::Replace(text.into()), true);
    }

    /// Removes the current token, keeping only the line breaks of its gap and text.
    pub fn remove_token(&mut self) {
        self.push_token_edit(TokenOp::Remove, true);
    }

    /// Removes the current token but keeps the whitespace before it, for the first
    /// token of a removed range.
    pub fn remove_initial_token(&mut self) {
        self.push_token_edit(TokenOp::Replace(String::new()), false);
    }

    /// Inserts code at the current position, before the current token's gap.
    pub fn append_code(&mut self, code: &str) {
        if !code.is_empty() {
            self.log.push(Edit::Insert(code.to_string()));
        }
    }

    /// Inserts code after the current token's gap, directly before its text.
    pub fn prepend_code(&mut self, code: &str) {
        self.pending_prefix.push_str(code);
    }

    /// [`TokenProcessor::prepend_code`] for code that stands in for the current token's
    /// position: the start of `code` maps to the token's original start.
    pub fn prepend_mapped_code(&mut self, code: &str) {
        if !code.is_empty() {
            self.pending_marks.push(self.pending_prefix.len());
            self.pending_prefix.push_str(code);
        }
    }

    /// Drops the whitespace (but not line breaks) before the next processed token.
    pub fn trim_next_whitespace(&mut self) {
        self.trim_next_gap = true;
    }

    // === Speculation ===

    pub fn snapshot(&self) -> ProcessorSnapshot {
        ProcessorSnapshot {
            index: self.index,
            log_len: self.log.len(),
            pending_prefix: self.pending_prefix.clone(),
            pending_marks: self.pending_marks.clone(),
            trim_next_gap: self.trim_next_gap,
        }
    }

    pub fn restore(&mut self, snapshot: ProcessorSnapshot) {
        self.index = snapshot.index;
        self.log.truncate(snapshot.log_len);
        self.pending_prefix = snapshot.pending_prefix;
        self.pending_marks = snapshot.pending_marks;
        self.trim_next_gap = snapshot.trim_next_gap;
    }

    /// Renders and forgets the edits recorded since `snapshot`, keeping the cursor
    /// where it is. Used to move already-processed code somewhere else.
    pub fn dangerously_get_and_remove_code_since_snapshot(
        &mut self,
        snapshot: &ProcessorSnapshot,
    ) -> String {
        let mut code = String::new();
        let mut discarded = Vec::new();
        for edit in self.log.drain(snapshot.log_len..) {
            render_edit(self.source, self.tokens, &edit, &mut code, &mut discarded);
        }
        code
    }

    // === Output ===

    /// Renders the edit log. Every token up to `Eof` must have been processed.
    pub fn finish(self) -> Result<Processed, CompileError> {
        if !self.is_at_end() {
            return Err(self.invariant("Did not process all tokens"));
        }
        let mut code = String::with_capacity(self.source.len() + self.source.len() / 4);
        let mut mappings = Vec::with_capacity(self.log.len());
        for edit in &self.log {
            render_edit(self.source, self.tokens, edit, &mut code, &mut mappings);
        }
        let eof = self.tokens.len().saturating_sub(1);
        let tail = gap_before(self.source, self.tokens, eof);
        if self.trim_next_gap {
            push_line_breaks(&mut code, tail);
        } else {
            code.push_str(tail);
        }
        code.push_str(&self.pending_prefix);
        Ok(Processed { code, mappings })
    }
}

/// Whitespace and comments between the previous token and the token at `index`.
fn gap_before<'s>(source: &'s str, tokens: &[Token], index: usize) -> &'s str {
    let start = match index.checked_sub(1).and_then(|i| tokens.get(i)) {
        Some(previous) => previous.end(),
        None => 0,
    };
    let end = tokens.get(index).map_or(source.len(), Token::start);
    source.get(start..end).unwrap_or_default()
}

fn push_line_breaks(out: &mut String, text: &str) {
    out.extend(text.chars().filter(|&c| c == '\n'));
}

/// Renders one edit, recording `(generated, original)` pairs for emitted token text
/// and mapped prefix code.
fn render_edit(
    source: &str,
    tokens: &[Token],
    edit: &Edit,
    out: &mut String,
    mappings: &mut Vec<(usize, usize)>,
) {
    let (index, op, prefix, marks, trim_gap) = match edit {
        Edit::Insert(code) => {
            out.push_str(code);
            return;
        }
        Edit::Token {
            index,
            op,
            prefix,
            marks,
            trim_gap,
        } => (*index, op, prefix, marks, *trim_gap),
    };
    let Some(token) = tokens.get(index) else {
        return;
    };
    let gap = gap_before(source, tokens, index);
    if trim_gap {
        push_line_breaks(out, gap);
    } else {
        out.push_str(gap);
    }
    let prefix_start = out.len();
    mappings.extend(marks.iter().map(|mark| (prefix_start + mark, token.start())));
    out.push_str(prefix);
    let generated = out.len();
    match op {
        TokenOp::Copy => {
            out.push_str(token.text(source));
            mappings.push((generated, token.start()));
        }
        TokenOp::Replace(text) => {
            out.push_str(text);
            if !text.is_empty() {
                mappings.push((generated, token.start()));
            }
        }
        TokenOp::Remove => push_line_breaks(out, token.text(source)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use snippet_parser::{parse, ParseOptions};

    fn with_processor(source: &str, f: impl FnOnce(&mut TokenProcessor<'_>)) -> Processed {
        let stream = parse(source, ParseOptions::default()).unwrap();
        let mut processor = TokenProcessor::new(source, &stream.tokens);
        f(&mut processor);
        processor.finish().unwrap()
    }

    fn copy_all(processor: &mut TokenProcessor<'_>) {
        while !processor.is_at_end() {
            processor.copy_token();
        }
    }

    #[test]
    fn test_copy_everything_is_identity() {
        let source = "#!/usr/bin/env node\n// lead\nconst a = 1; /* mid */ f(a)\n\n";
        let processed = with_processor(source, copy_all);
        assert_eq!(processed.code, source);
        assert_eq!(processed.mappings.first(), Some(&(28, 28)));
    }

    #[test]
    fn test_remove_keeps_line_breaks() {
        let processed = with_processor("a\n  /* x\n */ b;", |p| {
            p.copy_token();
            p.remove_token();
            copy_all(p);
        });
        assert_eq!(processed.code, "a\n\n;");
    }

    #[test]
    fn test_replace_and_insertions() {
        let processed = with_processor("a + b", |p| {
            p.copy_token();
            p.append_code(" /*before gap*/");
            p.prepend_code("(");
            p.replace_token("-");
            p.replace_token_trimming_left_whitespace("c");
            p.append_code(")");
            copy_all(p);
        });
        assert_eq!(processed.code, "a /*before gap*/ (-c)");
        assert_eq!(processed.mappings, vec![(0, 0), (18, 2), (19, 4)]);
    }

    #[test]
    fn test_mapped_prefix_points_at_token() {
        let processed = with_processor("a;\nf(a)", |p| {
            p.copy_token();
            p.copy_token();
            p.prepend_code(";\n");
            p.prepend_mapped_code("return (");
            copy_all(p);
        });
        assert_eq!(processed.code, "a;\n;\nreturn (f(a)");
        assert_eq!(
            processed.mappings,
            vec![(0, 0), (1, 1), (5, 3), (13, 3), (14, 4), (15, 5), (16, 6)]
        );
    }

    #[test]
    fn test_remove_initial_token_keeps_gap() {
        let processed = with_processor("x; export const a = 1;", |p| {
            p.copy_token();
            p.copy_token();
            p.remove_initial_token();
            p.trim_next_whitespace();
            copy_all(p);
        });
        assert_eq!(processed.code, "x; const a = 1;");
    }

    #[test]
    fn test_extract_code_since_snapshot() {
        let processed = with_processor("f(a,\n b)", |p| {
            p.copy_token();
            p.copy_token();
            let snapshot = p.snapshot();
            p.copy_token();
            p.remove_token();
            let extracted = p.dangerously_get_and_remove_code_since_snapshot(&snapshot);
            assert_eq!(extracted, "a");
            p.copy_token();
            p.append_code(", a");
            copy_all(p);
        });
        assert_eq!(processed.code, "f(\n b, a)");
    }

    #[test]
    fn test_matches() {
        let source = "import x from 'y';";
        let stream = parse(source, ParseOptions::default()).unwrap();
        let processor = TokenProcessor::new(source, &stream.tokens);
        assert!(processor.matches(&[TokenKind::Import, TokenKind::Name]));
        assert!(processor.matches_at(3, &[TokenKind::String, TokenKind::Semi, TokenKind::Eof]));
        assert!(!processor.matches_at(
            3,
            &[TokenKind::String, TokenKind::Semi, TokenKind::Eof, TokenKind::Eof]
        ));
        assert!(processor.matches_contextual_at(2, ContextualKeyword::From));
        assert!(!processor.matches_contextual(ContextualKeyword::From));
    }

    #[test]
    fn test_finish_requires_all_tokens() {
        let source = "a; b;";
        let stream = parse(source, ParseOptions::default()).unwrap();
        let mut processor = TokenProcessor::new(source, &stream.tokens);
        processor.copy_token();
        let error = processor.finish().unwrap_err();
        assert_eq!(error.offset(), 1);
    }
}
