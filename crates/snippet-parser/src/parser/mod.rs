//! Token-stream parser.
//!
//! The parser validates syntax and annotates tokens (type context, identifier roles,
//! JSX roles, scopes) without building a tree. Ambiguous productions are resolved by
//! taking a [`Snapshot`](crate::state::Snapshot), trying one reading and restoring on
//! failure.

mod expression;
mod jsx;
mod statement;
mod types;

pub use jsx::is_component_tag;

use crate::error::ParseErrorKind;
use crate::state::State;
use crate::token::{
    ContextualKeyword, IdentifierRole, Scope, StatementKind, Token, TokenKind, TopLevelStatement,
};
use crate::{ParseOptions, TokenStream};

/// What kind of binding a declaration introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindingKind {
    /// `var`, function declarations and parameters.
    FunctionScoped,
    /// `let`, `const`, classes, catch parameters.
    BlockScoped,
    Import,
}

/// One token of lookahead, captured without consuming anything.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Lookahead {
    pub kind: TokenKind,
    pub contextual_keyword: ContextualKeyword,
    pub line_break_before: bool,
}

impl Lookahead {
    fn is_contextual(&self, keyword: ContextualKeyword) -> bool {
        self.kind == TokenKind::Name && self.contextual_keyword == keyword
    }
}

pub(crate) struct Parser<'src> {
    pub(crate) input: &'src str,
    pub(crate) options: ParseOptions,
    pub(crate) state: State,
    pub(crate) tokens: Vec<Token>,
    pub(crate) scopes: Vec<Scope>,
    statements: Vec<TopLevelStatement>,
}

impl<'src> Parser<'src> {
    pub fn new(input: &'src str, options: ParseOptions) -> Self {
        Self {
            input,
            options,
            state: State::default(),
            tokens: Vec::new(),
            scopes: Vec::new(),
            statements: Vec::new(),
        }
    }

    /// Parses the whole input as a sequence of top-level statements.
    pub fn parse(mut self) -> TokenStream {
        self.next_token();
        while !self.is(TokenKind::Eof) {
            let start = self.tokens.len();
            let mut kind = self.parse_statement();
            let end = self.tokens.len();
            if end == start {
                // A statement must consume at least one token.
                self.unexpected();
                break;
            }
            if self.tokens[start..end].iter().all(|t| t.is_type) {
                kind = StatementKind::TypeOnly;
            }
            let expression_end = if kind == StatementKind::Expression
                && self.tokens[end - 1].kind == TokenKind::Semi
            {
                end - 1
            } else {
                end
            };
            self.statements.push(TopLevelStatement {
                kind,
                start,
                end,
                expression_end,
            });
        }

        // The final token is always `Eof`; its gap holds trailing whitespace and comments.
        self.push_current_token();
        self.scopes.push(Scope {
            start_token_index: 0,
            end_token_index: self.tokens.len(),
            is_function_scope: true,
        });

        if let Some(error) = &self.state.error {
            tracing::debug!(offset = error.offset(), %error, "parse failed");
        }

        TokenStream {
            tokens: self.tokens,
            scopes: self.scopes,
            statements: self.statements,
            error: self.state.error,
        }
    }

    // === Token helpers ===

    #[inline]
    pub(crate) fn is(&self, kind: TokenKind) -> bool {
        self.state.kind == kind
    }

    #[inline]
    pub(crate) fn is_contextual(&self, keyword: ContextualKeyword) -> bool {
        self.state.kind == TokenKind::Name && self.state.contextual_keyword == keyword
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.is(kind) {
            self.next();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_contextual(&mut self, keyword: ContextualKeyword) -> bool {
        if self.is_contextual(keyword) {
            self.next();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) {
        if !self.eat(kind) {
            self.unexpected_expecting(kind.label());
        }
    }

    pub(crate) fn expect_contextual(&mut self, keyword: ContextualKeyword, label: &str) {
        if !self.eat_contextual(keyword) {
            self.unexpected_expecting(label);
        }
    }

    /// Text of the current token.
    pub(crate) fn current_text(&self) -> &'src str {
        self.input
            .get(self.state.start..self.state.end)
            .unwrap_or_default()
    }

    fn found_label(&self) -> String {
        match self.current_text() {
            "" => self.state.kind.label().to_string(),
            text => text.to_string(),
        }
    }

    pub(crate) fn unexpected(&mut self) {
        let found = self.found_label();
        let (start, end) = (self.state.start, self.state.end);
        self.raise_at(ParseErrorKind::Unexpected { found }, start, end);
    }

    pub(crate) fn unexpected_expecting(&mut self, expected: &str) {
        let found = self.found_label();
        let (start, end) = (self.state.start, self.state.end);
        self.raise_at(
            ParseErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found,
            },
            start,
            end,
        );
    }

    pub(crate) fn unsupported(&mut self, what: &str) {
        let (start, end) = (self.state.start, self.state.end);
        self.raise_at(ParseErrorKind::Unsupported(what.to_string()), start, end);
    }

    pub(crate) fn has_error(&self) -> bool {
        self.state.error.is_some()
    }

    /// Captures the next token without consuming the current one.
    pub(crate) fn lookahead(&mut self) -> Lookahead {
        let snapshot = self.snapshot();
        self.next();
        let lookahead = Lookahead {
            kind: self.state.kind,
            contextual_keyword: self.state.contextual_keyword,
            line_break_before: self.has_preceding_line_break(),
        };
        self.restore(snapshot);
        lookahead
    }

    /// Whether the current statement may end here by automatic semicolon insertion.
    pub(crate) fn is_line_terminator(&self) -> bool {
        self.is(TokenKind::Semi)
            || self.is(TokenKind::BraceR)
            || self.is(TokenKind::Eof)
            || self.has_preceding_line_break()
    }

    pub(crate) fn semicolon(&mut self) {
        if !self.eat(TokenKind::Semi)
            && !self.is(TokenKind::BraceR)
            && !self.is(TokenKind::Eof)
            && !self.has_preceding_line_break()
        {
            self.unexpected_expecting(";");
        }
    }

    // === Type context ===

    /// Enters a type-only context; tokens consumed until the matching pop are marked
    /// `is_type`. Returns the previous flag for [`Parser::pop_type_context`].
    pub(crate) fn push_type_context(&mut self) -> bool {
        std::mem::replace(&mut self.state.is_type, true)
    }

    pub(crate) fn pop_type_context(&mut self, previous: bool) {
        self.state.is_type = previous;
    }

    /// Marks every token pushed since `start` as type-only.
    pub(crate) fn mark_type_from(&mut self, start: usize) {
        for token in self.tokens.iter_mut().skip(start) {
            token.is_type = true;
        }
    }

    /// Consumes the current token as a type-only token.
    pub(crate) fn next_as_type(&mut self) {
        let previous = self.push_type_context();
        self.next();
        self.pop_type_context(previous);
    }

    pub(crate) fn is_ts(&self) -> bool {
        self.options.typescript
    }

    pub(crate) fn has_types(&self) -> bool {
        self.options.typescript || self.options.flow
    }

    // === Scopes and roles ===

    pub(crate) fn push_scope(&mut self, start_token_index: usize, is_function_scope: bool) {
        self.scopes.push(Scope {
            start_token_index,
            end_token_index: self.tokens.len(),
            is_function_scope,
        });
    }

    pub(crate) fn set_role(&mut self, index: usize, role: IdentifierRole) {
        if let Some(token) = self.tokens.get_mut(index) {
            token.identifier_role = Some(role);
        }
    }

    /// The role for a binding identifier declared at the current depth.
    pub(crate) fn declaration_role(&self, kind: BindingKind, shorthand: bool) -> IdentifierRole {
        use IdentifierRole::*;
        match (kind, self.state.scope_depth == 0, shorthand) {
            (BindingKind::Import, _, _) => ImportDeclaration,
            (_, true, false) => TopLevelDeclaration,
            (_, true, true) => ObjectShorthandTopLevelDeclaration,
            (BindingKind::FunctionScoped, false, false) => FunctionScopedDeclaration,
            (BindingKind::FunctionScoped, false, true) => ObjectShorthandFunctionScopedDeclaration,
            (BindingKind::BlockScoped, false, false) => BlockScopedDeclaration,
            (BindingKind::BlockScoped, false, true) => ObjectShorthandBlockScopedDeclaration,
        }
    }

    /// Consumes an identifier (or a keyword used as a property name) as a `Name`.
    pub(crate) fn parse_identifier_name(&mut self) {
        if self.is(TokenKind::Name) || self.state.kind.is_keyword() {
            self.state.kind = TokenKind::Name;
            self.next();
        } else {
            self.unexpected_expecting("identifier");
        }
    }

    /// Consumes an identifier, recording `role` on it.
    pub(crate) fn parse_identifier_with_role(&mut self, role: Option<IdentifierRole>) {
        if !self.is(TokenKind::Name) {
            self.unexpected_expecting("identifier");
            return;
        }
        let index = self.tokens.len();
        self.next();
        if let Some(role) = role {
            self.set_role(index, role);
        }
    }
}
