//! Parse error types.

use source_map::Span;
use thiserror::Error;

/// The first error encountered while tokenizing or parsing.
///
/// Parsing stops at the first error: the tokenizer enters a sticky error state and
/// every later read produces an end-of-input token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Byte offset where the error was detected.
    pub fn offset(&self) -> usize {
        self.span.start_usize()
    }
}

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("Unterminated string constant")]
    UnterminatedString,

    #[error("Unterminated template")]
    UnterminatedTemplate,

    #[error("Unterminated comment")]
    UnterminatedComment,

    #[error("Unterminated regular expression")]
    UnterminatedRegex,

    #[error("Unterminated string constant in JSX attribute")]
    UnterminatedJsxString,

    #[error("Unterminated JSX contents")]
    UnterminatedJsxContents,

    #[error("Unexpected character '{0}'")]
    UnexpectedCharacter(char),

    #[error("Unexpected token {found}, expected {expected}")]
    UnexpectedToken {
        expected: String,
        found: String,
    },

    #[error("Unexpected token {found}")]
    Unexpected { found: String },

    #[error("Expected corresponding JSX closing tag for <{expected}>, found </{found}>")]
    MismatchedClosingTag { expected: String, found: String },

    #[error("{0} is not supported")]
    Unsupported(String),
}
