//! Scanning: turns input text into the parser's current token.
//!
//! Normal-mode tokens go through the logos DFA in [`crate::lexer`]. Whitespace,
//! comments, template chunks, regular expressions and JSX are scanned here because
//! they depend on what the parser expects next.

use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{self, RawToken};
use crate::parser::Parser;
use crate::state::Snapshot;
use crate::token::{ContextualKeyword, Token, TokenKind};
use source_map::Span;

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_jsx_name_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_jsx_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '$' | '-')
}

impl<'src> Parser<'src> {
    /// Pushes the current token and scans the next one in normal mode.
    pub(crate) fn next(&mut self) {
        self.push_current_token();
        self.next_token();
    }

    pub(crate) fn push_current_token(&mut self) {
        let state = &self.state;
        let token = Token {
            kind: state.kind,
            contextual_keyword: state.contextual_keyword,
            span: Span::from_usize(state.start, state.end),
            scope_depth: state.scope_depth,
            is_type: state.is_type,
            identifier_role: None,
            jsx_role: None,
            shadows_global: false,
            rhs_end_index: None,
        };
        self.state.last_token_end = token.end();
        self.tokens.push(token);
    }

    /// Scans the token at the current position in normal mode.
    pub(crate) fn next_token(&mut self) {
        if self.state.error.is_some() {
            self.finish_eof();
            return;
        }
        self.skip_space();
        if self.state.error.is_some() {
            return;
        }
        self.state.start = self.state.pos;
        if self.state.pos >= self.input.len() {
            self.finish_token(TokenKind::Eof, self.state.pos);
            return;
        }
        self.read_token();
    }

    fn read_token(&mut self) {
        let pos = self.state.pos;
        let Some((raw, len)) = lexer::lex_at(self.input, pos) else {
            let ch = self.input[pos..].chars().next().unwrap_or('\0');
            self.raise_at(
                ParseErrorKind::UnexpectedCharacter(ch),
                pos,
                pos + ch.len_utf8(),
            );
            return;
        };
        if raw == RawToken::UnterminatedString {
            self.raise_at(ParseErrorKind::UnterminatedString, pos, pos + len);
            return;
        }

        let (mut kind, keyword) = raw.classify();
        let mut end = pos + len;
        let bytes = self.input.as_bytes();
        match kind {
            TokenKind::BraceBarL if !self.options.flow => {
                kind = TokenKind::BraceL;
                end = pos + 1;
            }
            TokenKind::BraceBarR if !self.options.flow => {
                kind = TokenKind::BitwiseOr;
                end = pos + 1;
            }
            // `a?.5:b` is a conditional, not optional chaining.
            TokenKind::QuestionDot if bytes.get(pos + 2).is_some_and(u8::is_ascii_digit) => {
                kind = TokenKind::Question;
                end = pos + 1;
            }
            // Inside types, `<` and `>` never combine: `Array<Array<T>>` closes twice.
            TokenKind::BitShiftL
            | TokenKind::BitShiftR
            | TokenKind::RelationalOrEqual
            | TokenKind::Assign
                if self.state.is_type && matches!(bytes[pos], b'<' | b'>') =>
            {
                kind = if bytes[pos] == b'<' {
                    TokenKind::LessThan
                } else {
                    TokenKind::GreaterThan
                };
                end = pos + 1;
            }
            _ => {}
        }
        self.state.contextual_keyword = keyword;
        self.state.kind = kind;
        self.state.end = end;
        self.state.pos = end;
    }

    fn finish_token(&mut self, kind: TokenKind, end: usize) {
        self.state.kind = kind;
        self.state.contextual_keyword = ContextualKeyword::None;
        self.state.end = end;
        self.state.pos = end;
    }

    fn finish_eof(&mut self) {
        let len = self.input.len();
        self.state.kind = TokenKind::Eof;
        self.state.contextual_keyword = ContextualKeyword::None;
        self.state.start = len;
        self.state.end = len;
        self.state.pos = len;
    }

    /// Records the first error and fast-forwards to end of input.
    pub(crate) fn raise_at(&mut self, kind: ParseErrorKind, start: usize, end: usize) {
        if self.state.error.is_none() {
            let end = end.min(self.input.len()).max(start);
            self.state.error = Some(ParseError::new(kind, Span::from_usize(start, end)));
        }
        self.finish_eof();
    }

    fn skip_space(&mut self) {
        let bytes = self.input.as_bytes();
        loop {
            let pos = self.state.pos;
            let Some(&byte) = bytes.get(pos) else {
                return;
            };
            match byte {
                b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C => self.state.pos += 1,
                b'/' if bytes.get(pos + 1) == Some(&b'/') => self.skip_line_comment(pos + 2),
                b'#' if pos == 0 && bytes.get(1) == Some(&b'!') => self.skip_line_comment(2),
                b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                    match self.input[pos + 2..].find("*/") {
                        Some(offset) => self.state.pos = pos + 2 + offset + 2,
                        None => {
                            self.raise_at(ParseErrorKind::UnterminatedComment, pos, pos + 2);
                            return;
                        }
                    }
                }
                _ if byte >= 0x80 => {
                    let ch = self.input[pos..].chars().next().unwrap_or('\0');
                    if ch.is_whitespace() || ch == '\u{feff}' {
                        self.state.pos += ch.len_utf8();
                    } else {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    fn skip_line_comment(&mut self, from: usize) {
        self.state.pos = match self.input[from..].find(is_line_terminator) {
            Some(offset) => from + offset,
            None => self.input.len(),
        };
    }

    /// Whether a line break separates the previous token from the current one.
    pub(crate) fn has_preceding_line_break(&self) -> bool {
        let from = self.state.last_token_end.min(self.state.start);
        self.input[from..self.state.start].contains(is_line_terminator)
    }

    /// Rescans the current `/` or `/=` token as a regular expression literal.
    pub(crate) fn retokenize_slash_as_regex(&mut self) {
        let start = self.state.start;
        let mut pos = start + 1;
        let mut in_class = false;
        loop {
            let Some(ch) = self.input[pos..].chars().next() else {
                self.raise_at(ParseErrorKind::UnterminatedRegex, start, pos);
                return;
            };
            if is_line_terminator(ch) {
                self.raise_at(ParseErrorKind::UnterminatedRegex, start, pos);
                return;
            }
            pos += ch.len_utf8();
            match ch {
                '\\' => match self.input[pos..].chars().next() {
                    Some(escaped) if !is_line_terminator(escaped) => pos += escaped.len_utf8(),
                    _ => {
                        self.raise_at(ParseErrorKind::UnterminatedRegex, start, pos);
                        return;
                    }
                },
                '[' => in_class = true,
                ']' if in_class => in_class = false,
                '/' if !in_class => break,
                _ => {}
            }
        }
        for ch in self.input[pos..].chars() {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                pos += ch.len_utf8();
            } else {
                break;
            }
        }
        self.finish_token(TokenKind::Regexp, pos);
    }

    /// Pushes the current token (`` ` `` or `}`) and scans a raw template chunk.
    pub(crate) fn next_template_chunk(&mut self) {
        self.push_current_token();
        if self.state.error.is_some() {
            self.finish_eof();
            return;
        }
        let bytes = self.input.as_bytes();
        let start = self.state.pos;
        let mut pos = start;
        loop {
            match bytes.get(pos) {
                None => {
                    self.raise_at(ParseErrorKind::UnterminatedTemplate, start, pos);
                    return;
                }
                Some(b'`') => break,
                Some(b'$') if bytes.get(pos + 1) == Some(&b'{') => break,
                Some(b'\\') => pos += 2,
                Some(_) => pos += 1,
            }
        }
        self.state.start = start;
        self.finish_token(TokenKind::Template, pos.min(bytes.len()));
    }

    /// Pushes the current token and scans the next one inside a JSX tag.
    pub(crate) fn next_jsx_tag_token(&mut self) {
        self.push_current_token();
        if self.state.error.is_some() {
            self.finish_eof();
            return;
        }
        self.skip_space();
        if self.state.error.is_some() {
            return;
        }
        let pos = self.state.pos;
        self.state.start = pos;
        let Some(ch) = self.input[pos..].chars().next() else {
            self.finish_token(TokenKind::Eof, pos);
            return;
        };
        let kind = match ch {
            '>' => TokenKind::JsxTagEnd,
            '<' => TokenKind::JsxTagStart,
            '/' => TokenKind::Slash,
            '=' => TokenKind::Eq,
            '{' => TokenKind::BraceL,
            '}' => TokenKind::BraceR,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            '"' | '\'' => {
                match self.input[pos + 1..].find(ch) {
                    Some(offset) => self.finish_token(TokenKind::String, pos + 1 + offset + 1),
                    None => self.raise_at(
                        ParseErrorKind::UnterminatedJsxString,
                        pos,
                        self.input.len(),
                    ),
                }
                return;
            }
            ch if is_jsx_name_start(ch) => {
                let len = self.input[pos..]
                    .find(|c: char| !is_jsx_name_char(c))
                    .unwrap_or(self.input.len() - pos);
                self.finish_token(TokenKind::JsxName, pos + len);
                return;
            }
            ch => {
                self.raise_at(
                    ParseErrorKind::UnexpectedCharacter(ch),
                    pos,
                    pos + ch.len_utf8(),
                );
                return;
            }
        };
        self.finish_token(kind, pos + 1);
    }

    /// Pushes the current token and scans the next JSX child: text, `{` or `<`.
    pub(crate) fn next_jsx_expr_token(&mut self) {
        self.push_current_token();
        if self.state.error.is_some() {
            self.finish_eof();
            return;
        }
        let pos = self.state.pos;
        self.state.start = pos;
        match self.input.as_bytes().get(pos) {
            None => self.raise_at(ParseErrorKind::UnterminatedJsxContents, pos, pos),
            Some(b'<') => self.finish_token(TokenKind::JsxTagStart, pos + 1),
            Some(b'{') => self.finish_token(TokenKind::BraceL, pos + 1),
            Some(_) => {
                let len = self.input[pos..]
                    .find(['<', '{'])
                    .unwrap_or(self.input.len() - pos);
                let text = &self.input[pos..pos + len];
                let kind = if text.chars().all(char::is_whitespace)
                    && text.contains(is_line_terminator)
                {
                    TokenKind::JsxEmptyText
                } else {
                    TokenKind::JsxText
                };
                self.finish_token(kind, pos + len);
            }
        }
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state.clone(),
            tokens_len: self.tokens.len(),
            scopes_len: self.scopes.len(),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: Snapshot) {
        self.state = snapshot.state;
        self.tokens.truncate(snapshot.tokens_len);
        self.scopes.truncate(snapshot.scopes_len);
    }
}
