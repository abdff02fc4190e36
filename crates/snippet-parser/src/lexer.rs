//! Context-free token recognition using logos.
//!
//! Punctuators, reserved words and contextual keywords are compiled by logos into one
//! DFA, so classifying an identifier is a single linear scan. Everything that depends on
//! parser state (regular expressions, template chunks, JSX, whitespace and comments) is
//! scanned by hand in the tokenizer, which calls [`lex_at`] for the rest.

use crate::token::{ContextualKeyword, TokenKind};
use logos::Logos;

/// Raw token classes recognized without context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Logos)]
pub(crate) enum RawToken {
    #[token("[", |_| TokenKind::BracketL)]
    #[token("]", |_| TokenKind::BracketR)]
    #[token("{", |_| TokenKind::BraceL)]
    #[token("{|", |_| TokenKind::BraceBarL)]
    #[token("}", |_| TokenKind::BraceR)]
    #[token("|}", |_| TokenKind::BraceBarR)]
    #[token("(", |_| TokenKind::ParenL)]
    #[token(")", |_| TokenKind::ParenR)]
    #[token(",", |_| TokenKind::Comma)]
    #[token(";", |_| TokenKind::Semi)]
    #[token(":", |_| TokenKind::Colon)]
    #[token(".", |_| TokenKind::Dot)]
    #[token("?", |_| TokenKind::Question)]
    #[token("?.", |_| TokenKind::QuestionDot)]
    #[token("=>", |_| TokenKind::Arrow)]
    #[token("...", |_| TokenKind::Ellipsis)]
    #[token("`", |_| TokenKind::BackQuote)]
    #[token("${", |_| TokenKind::DollarBraceL)]
    #[token("@", |_| TokenKind::At)]
    #[token("=", |_| TokenKind::Eq)]
    #[token("+=", |_| TokenKind::Assign)]
    #[token("-=", |_| TokenKind::Assign)]
    #[token("*=", |_| TokenKind::Assign)]
    #[token("/=", |_| TokenKind::Assign)]
    #[token("%=", |_| TokenKind::Assign)]
    #[token("**=", |_| TokenKind::Assign)]
    #[token("<<=", |_| TokenKind::Assign)]
    #[token(">>=", |_| TokenKind::Assign)]
    #[token(">>>=", |_| TokenKind::Assign)]
    #[token("&=", |_| TokenKind::Assign)]
    #[token("|=", |_| TokenKind::Assign)]
    #[token("^=", |_| TokenKind::Assign)]
    #[token("&&=", |_| TokenKind::Assign)]
    #[token("||=", |_| TokenKind::Assign)]
    #[token("??=", |_| TokenKind::Assign)]
    #[token("++", |_| TokenKind::IncDec)]
    #[token("--", |_| TokenKind::IncDec)]
    #[token("!", |_| TokenKind::Bang)]
    #[token("~", |_| TokenKind::Tilde)]
    #[token("??", |_| TokenKind::NullishCoalescing)]
    #[token("||", |_| TokenKind::LogicalOr)]
    #[token("&&", |_| TokenKind::LogicalAnd)]
    #[token("|", |_| TokenKind::BitwiseOr)]
    #[token("^", |_| TokenKind::BitwiseXor)]
    #[token("&", |_| TokenKind::BitwiseAnd)]
    #[token("==", |_| TokenKind::Equality)]
    #[token("!=", |_| TokenKind::Equality)]
    #[token("===", |_| TokenKind::Equality)]
    #[token("!==", |_| TokenKind::Equality)]
    #[token("<", |_| TokenKind::LessThan)]
    #[token(">", |_| TokenKind::GreaterThan)]
    #[token("<=", |_| TokenKind::RelationalOrEqual)]
    #[token(">=", |_| TokenKind::RelationalOrEqual)]
    #[token("<<", |_| TokenKind::BitShiftL)]
    #[token(">>", |_| TokenKind::BitShiftR)]
    #[token(">>>", |_| TokenKind::BitShiftR)]
    #[token("+", |_| TokenKind::PlusMin)]
    #[token("-", |_| TokenKind::PlusMin)]
    #[token("%", |_| TokenKind::Modulo)]
    #[token("*", |_| TokenKind::Star)]
    #[token("/", |_| TokenKind::Slash)]
    #[token("**", |_| TokenKind::Exponent)]
    Punct(TokenKind),

    #[token("break", |_| TokenKind::Break)]
    #[token("case", |_| TokenKind::Case)]
    #[token("catch", |_| TokenKind::Catch)]
    #[token("continue", |_| TokenKind::Continue)]
    #[token("debugger", |_| TokenKind::Debugger)]
    #[token("default", |_| TokenKind::Default)]
    #[token("do", |_| TokenKind::Do)]
    #[token("else", |_| TokenKind::Else)]
    #[token("finally", |_| TokenKind::Finally)]
    #[token("for", |_| TokenKind::For)]
    #[token("function", |_| TokenKind::Function)]
    #[token("if", |_| TokenKind::If)]
    #[token("return", |_| TokenKind::Return)]
    #[token("switch", |_| TokenKind::Switch)]
    #[token("throw", |_| TokenKind::Throw)]
    #[token("try", |_| TokenKind::Try)]
    #[token("var", |_| TokenKind::Var)]
    #[token("let", |_| TokenKind::Let)]
    #[token("const", |_| TokenKind::Const)]
    #[token("while", |_| TokenKind::While)]
    #[token("with", |_| TokenKind::With)]
    #[token("new", |_| TokenKind::New)]
    #[token("this", |_| TokenKind::This)]
    #[token("super", |_| TokenKind::Super)]
    #[token("class", |_| TokenKind::Class)]
    #[token("extends", |_| TokenKind::Extends)]
    #[token("export", |_| TokenKind::Export)]
    #[token("import", |_| TokenKind::Import)]
    #[token("yield", |_| TokenKind::Yield)]
    #[token("null", |_| TokenKind::Null)]
    #[token("true", |_| TokenKind::True)]
    #[token("false", |_| TokenKind::False)]
    #[token("in", |_| TokenKind::In)]
    #[token("instanceof", |_| TokenKind::Instanceof)]
    #[token("typeof", |_| TokenKind::Typeof)]
    #[token("void", |_| TokenKind::Void)]
    #[token("delete", |_| TokenKind::Delete)]
    Keyword(TokenKind),

    #[token("abstract", |_| ContextualKeyword::Abstract)]
    #[token("accessor", |_| ContextualKeyword::Accessor)]
    #[token("as", |_| ContextualKeyword::As)]
    #[token("assert", |_| ContextualKeyword::Assert)]
    #[token("asserts", |_| ContextualKeyword::Asserts)]
    #[token("async", |_| ContextualKeyword::Async)]
    #[token("await", |_| ContextualKeyword::Await)]
    #[token("constructor", |_| ContextualKeyword::Constructor)]
    #[token("declare", |_| ContextualKeyword::Declare)]
    #[token("enum", |_| ContextualKeyword::Enum)]
    #[token("exports", |_| ContextualKeyword::Exports)]
    #[token("from", |_| ContextualKeyword::From)]
    #[token("get", |_| ContextualKeyword::Get)]
    #[token("global", |_| ContextualKeyword::Global)]
    #[token("implements", |_| ContextualKeyword::Implements)]
    #[token("infer", |_| ContextualKeyword::Infer)]
    #[token("interface", |_| ContextualKeyword::Interface)]
    #[token("is", |_| ContextualKeyword::Is)]
    #[token("keyof", |_| ContextualKeyword::Keyof)]
    #[token("mixins", |_| ContextualKeyword::Mixins)]
    #[token("module", |_| ContextualKeyword::Module)]
    #[token("namespace", |_| ContextualKeyword::Namespace)]
    #[token("of", |_| ContextualKeyword::Of)]
    #[token("opaque", |_| ContextualKeyword::Opaque)]
    #[token("out", |_| ContextualKeyword::Out)]
    #[token("override", |_| ContextualKeyword::Override)]
    #[token("private", |_| ContextualKeyword::Private)]
    #[token("protected", |_| ContextualKeyword::Protected)]
    #[token("public", |_| ContextualKeyword::Public)]
    #[token("readonly", |_| ContextualKeyword::Readonly)]
    #[token("require", |_| ContextualKeyword::Require)]
    #[token("satisfies", |_| ContextualKeyword::Satisfies)]
    #[token("set", |_| ContextualKeyword::Set)]
    #[token("static", |_| ContextualKeyword::Static)]
    #[token("symbol", |_| ContextualKeyword::Symbol)]
    #[token("type", |_| ContextualKeyword::Type)]
    #[token("unique", |_| ContextualKeyword::Unique)]
    #[token("using", |_| ContextualKeyword::Using)]
    Contextual(ContextualKeyword),

    #[regex(r"[a-zA-Z_$\x{80}-\x{10FFFF}][a-zA-Z0-9_$\x{80}-\x{10FFFF}]*")]
    Name,

    #[regex(r"#[a-zA-Z_$\x{80}-\x{10FFFF}][a-zA-Z0-9_$\x{80}-\x{10FFFF}]*")]
    PrivateName,

    #[regex(r"[0-9][0-9_]*")]
    #[regex(r"[0-9][0-9_]*\.[0-9_]*")]
    #[regex(r"\.[0-9][0-9_]*")]
    #[regex(r"([0-9][0-9_]*(\.[0-9_]*)?|\.[0-9][0-9_]*)[eE][+-]?[0-9][0-9_]*")]
    #[regex(r"0[xX][0-9a-fA-F][0-9a-fA-F_]*")]
    #[regex(r"0[oO][0-7][0-7_]*")]
    #[regex(r"0[bB][01][01_]*")]
    Num,

    #[regex(r"([0-9][0-9_]*|0[xX][0-9a-fA-F_]+|0[oO][0-7_]+|0[bB][01_]+)n")]
    BigInt,

    #[regex(r#""([^"\\\n\r]|\\[^\r]|\\\r\n?)*""#)]
    #[regex(r#"'([^'\\\n\r]|\\[^\r]|\\\r\n?)*'"#)]
    String,

    #[regex(r#""([^"\\\n\r]|\\[^\r]|\\\r\n?)*"#)]
    #[regex(r#"'([^'\\\n\r]|\\[^\r]|\\\r\n?)*"#)]
    UnterminatedString,
}

impl RawToken {
    /// The token kind and contextual keyword this raw token stands for.
    pub(crate) fn classify(self) -> (TokenKind, ContextualKeyword) {
        match self {
            RawToken::Punct(kind) | RawToken::Keyword(kind) => (kind, ContextualKeyword::None),
            RawToken::Contextual(keyword) => (TokenKind::Name, keyword),
            RawToken::Name => (TokenKind::Name, ContextualKeyword::None),
            RawToken::PrivateName => (TokenKind::PrivateName, ContextualKeyword::None),
            RawToken::Num => (TokenKind::Num, ContextualKeyword::None),
            RawToken::BigInt => (TokenKind::BigInt, ContextualKeyword::None),
            RawToken::String | RawToken::UnterminatedString => {
                (TokenKind::String, ContextualKeyword::None)
            }
        }
    }
}

/// Recognizes the longest token starting at byte `pos`.
///
/// Returns the raw token and its length in bytes, or `None` when nothing matches.
pub(crate) fn lex_at(input: &str, pos: usize) -> Option<(RawToken, usize)> {
    let rest = input.get(pos..)?;
    let mut lexer = RawToken::lexer(rest);
    match lexer.next()? {
        Ok(token) => Some((token, lexer.span().end)),
        Err(()) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex(input: &str) -> Option<(RawToken, usize)> {
        lex_at(input, 0)
    }

    #[test]
    fn test_punctuators_take_longest_match() {
        assert_eq!(lex(">>>= 1"), Some((RawToken::Punct(TokenKind::Assign), 4)));
        assert_eq!(lex("...rest"), Some((RawToken::Punct(TokenKind::Ellipsis), 3)));
        assert_eq!(lex("?.x"), Some((RawToken::Punct(TokenKind::QuestionDot), 2)));
        assert_eq!(lex("=> x"), Some((RawToken::Punct(TokenKind::Arrow), 2)));
    }

    #[test]
    fn test_keywords_versus_names() {
        assert_eq!(lex("return;"), Some((RawToken::Keyword(TokenKind::Return), 6)));
        assert_eq!(lex("returned"), Some((RawToken::Name, 8)));
        assert_eq!(
            lex("async ()"),
            Some((RawToken::Contextual(ContextualKeyword::Async), 5))
        );
        assert_eq!(lex("$el"), Some((RawToken::Name, 3)));
        assert_eq!(lex("été"), Some((RawToken::Name, "été".len())));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(lex("1_000.5e-3;"), Some((RawToken::Num, 10)));
        assert_eq!(lex("0xFFn"), Some((RawToken::BigInt, 5)));
        assert_eq!(lex(".5"), Some((RawToken::Num, 2)));
        assert_eq!(lex("12n"), Some((RawToken::BigInt, 3)));
    }

    #[test]
    fn test_strings() {
        assert_eq!(lex(r#""a\"b" + c"#), Some((RawToken::String, 6)));
        assert_eq!(lex("'it\\'s'"), Some((RawToken::String, 7)));
        assert_eq!(lex("\"open\nclose\""), Some((RawToken::UnterminatedString, 5)));
    }

    #[test]
    fn test_private_name() {
        assert_eq!(lex("#count = 0"), Some((RawToken::PrivateName, 6)));
        assert_eq!(lex("#"), None);
    }
}
