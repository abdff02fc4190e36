//! Tokenizer and token-stream parser for JSX/TypeScript snippets.
//!
//! This crate does not build a syntax tree. It produces a flat token array annotated
//! with everything the code transforms need:
//! - whether a token belongs to a type-only construct
//! - identifier roles (declaration, access, object shorthand, import and export names)
//! - JSX child shapes on opening tags
//! - lexical scopes as token ranges
//! - top-level statement boundaries
//!
//! # Example
//!
//! ```
//! use snippet_parser::{parse, ParseOptions, TokenKind};
//!
//! let stream = parse("const a = <div>{b}</div>;", ParseOptions::default()).unwrap();
//! assert_eq!(stream.tokens[0].kind, TokenKind::Const);
//! assert_eq!(stream.statements.len(), 1);
//! ```

mod error;
mod lexer;
mod parser;
mod state;
mod token;
mod tokenizer;

pub use error::{ParseError, ParseErrorKind};
pub use parser::is_component_tag;
pub use source_map::Span;
pub use token::{
    ContextualKeyword, IdentifierRole, JsxRole, Scope, StatementKind, Token, TokenKind,
    TopLevelStatement,
};

/// Syntax extensions to recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// JSX elements in expression position. On by default; whether JSX is compiled
    /// away is decided by the transforms.
    pub jsx: bool,
    pub typescript: bool,
    pub flow: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            jsx: true,
            typescript: false,
            flow: false,
        }
    }
}

/// The annotated token stream of one snippet.
#[derive(Debug, Clone)]
pub struct TokenStream {
    /// All tokens in source order. The last one is always [`TokenKind::Eof`].
    pub tokens: Vec<Token>,
    /// Scopes in the order they were closed; the whole program is last.
    pub scopes: Vec<Scope>,
    pub statements: Vec<TopLevelStatement>,
    /// The first syntax error, if any. Tokens after it are not reliable.
    pub error: Option<ParseError>,
}

impl TokenStream {
    /// The `Eof` token, whose leading gap holds trailing whitespace and comments.
    pub fn eof(&self) -> Option<&Token> {
        self.tokens.last()
    }
}

/// Tokenizes and parses `source`, keeping a partial stream on error.
pub fn tokenize(source: &str, options: ParseOptions) -> TokenStream {
    parser::Parser::new(source, options).parse()
}

/// Parses `source`, failing on the first syntax error.
pub fn parse(source: &str, options: ParseOptions) -> Result<TokenStream, ParseError> {
    let mut stream = tokenize(source, options);
    match stream.error.take() {
        Some(error) => Err(error),
        None => Ok(stream),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        parse(source, ParseOptions::default())
            .unwrap()
            .tokens
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_parse_empty() {
        let stream = parse("", ParseOptions::default()).unwrap();
        assert_eq!(stream.tokens.len(), 1);
        assert_eq!(stream.tokens[0].kind, TokenKind::Eof);
        assert!(stream.statements.is_empty());
        assert_eq!(stream.scopes.len(), 1);
    }

    #[test]
    fn test_parse_simple_statement() {
        use TokenKind::*;
        assert_eq!(kinds("let a = 1;"), vec![Let, Name, Eq, Num, Semi, Eof]);
    }

    #[test]
    fn test_regex_versus_division() {
        use TokenKind::*;
        assert_eq!(kinds("a / b / c"), vec![Name, Slash, Name, Slash, Name, Eof]);
        assert_eq!(kinds("x = /ab+c/gi.test(s)"), vec![
            Name, Eq, Regexp, Dot, Name, ParenL, Name, ParenR, Eof
        ]);
    }

    #[test]
    fn test_template_literal() {
        use TokenKind::*;
        assert_eq!(kinds("`a${b}c`"), vec![
            BackQuote,
            Template,
            DollarBraceL,
            Name,
            BraceR,
            Template,
            BackQuote,
            Eof
        ]);
    }

    #[test]
    fn test_error_is_reported_once() {
        let error = parse("let = ;\nfoo(", ParseOptions::default()).unwrap_err();
        assert_eq!(error.offset(), 4);
    }

    #[test]
    fn test_unterminated_string() {
        let error = parse("'abc", ParseOptions::default()).unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::UnterminatedString);
    }

    #[test]
    fn test_tokenize_keeps_partial_stream() {
        let stream = tokenize("a(;", ParseOptions::default());
        assert!(stream.error.is_some());
        assert_eq!(stream.tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }
}
