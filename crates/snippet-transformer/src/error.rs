//! Compile error types.

use snippet_parser::ParseError;
use source_map::{LineCol, LineIndex, Span};
use thiserror::Error;

/// Why a compile produced no code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The snippet is not valid syntax for the enabled transforms.
    #[error(transparent)]
    Syntax(#[from] ParseError),

    /// A transform met a token shape it cannot rewrite.
    #[error("{message}")]
    Invariant { message: String, offset: usize },
}

impl CompileError {
    pub(crate) fn invariant(message: impl Into<String>, offset: usize) -> Self {
        Self::Invariant {
            message: message.into(),
            offset,
        }
    }

    /// Byte offset into the snippet where the error was detected.
    pub fn offset(&self) -> usize {
        match self {
            Self::Syntax(error) => error.offset(),
            Self::Invariant { offset, .. } => *offset,
        }
    }

    /// The source range to highlight when reporting the error.
    pub fn span(&self) -> Span {
        match self {
            Self::Syntax(error) => error.span,
            Self::Invariant { offset, .. } => Span::from_usize(*offset, *offset),
        }
    }

    /// 0-based line and UTF-16 column of the error in `source`.
    pub fn location(&self, source: &str) -> Option<LineCol> {
        let offset = self.span().start;
        LineIndex::new(source).line_col(source, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_invariant_location() {
        let error = CompileError::invariant("Expected either /> or > at the end of the tag", 4);
        assert_eq!(error.offset(), 4);
        let location = error.location("ab\ncd").unwrap();
        assert_eq!((location.line, location.col), (1, 1));
        assert_eq!(
            error.to_string(),
            "Expected either /> or > at the end of the tag"
        );
    }
}
