//! TypeScript and Flow type syntax.
//!
//! Types are never transformed, only skipped: every entry point here pushes a type
//! context so the consumed tokens are marked `is_type` and removed from the output.

use super::Parser;
use crate::token::{ContextualKeyword as Kw, TokenKind as T};

impl<'src> Parser<'src> {
    /// `: Type`, with the current token at the colon.
    pub(crate) fn parse_type_annotation(&mut self) {
        let previous = self.push_type_context();
        self.next();
        self.parse_type();
        self.pop_type_context(previous);
    }

    /// `: Type` in return position, where type predicates are allowed.
    pub(crate) fn parse_return_type_annotation(&mut self) {
        let previous = self.push_type_context();
        self.next();
        self.parse_type_or_type_predicate();
        self.pop_type_context(previous);
    }

    fn parse_type_or_type_predicate(&mut self) {
        let next = self.lookahead();
        if self.is_contextual(Kw::Asserts)
            && !next.line_break_before
            && matches!(next.kind, T::Name | T::This)
        {
            self.next();
            self.next();
            if self.eat_contextual(Kw::Is) {
                self.parse_type();
            }
            return;
        }
        if matches!(self.state.kind, T::Name | T::This)
            && next.is_contextual(Kw::Is)
            && !next.line_break_before
        {
            self.next();
            self.next();
            self.parse_type();
            return;
        }
        self.parse_type();
    }

    /// `<T extends U = V, ...>` declaration, with the current token at `<`.
    pub(crate) fn parse_type_parameters(&mut self) {
        let previous = self.push_type_context();
        self.next();
        while !self.is(T::GreaterThan) && !self.is(T::Eof) {
            while self.is(T::Const)
                || self.is(T::In)
                || (self.is_contextual(Kw::Out) && self.lookahead().kind == T::Name)
            {
                self.next();
            }
            if self.options.flow && self.is(T::PlusMin) {
                self.next();
            }
            self.parse_identifier_with_role(None);
            if self.options.flow && self.is(T::Colon) {
                self.next();
                self.parse_type();
            }
            if self.eat(T::Extends) {
                self.parse_type();
            }
            if self.eat(T::Eq) {
                self.parse_type();
            }
            if !self.is(T::GreaterThan) {
                self.expect(T::Comma);
            }
        }
        self.expect(T::GreaterThan);
        self.pop_type_context(previous);
    }

    /// `<A, B>` arguments, with the current token at `<`.
    pub(crate) fn parse_type_arguments(&mut self) {
        let previous = self.push_type_context();
        self.next();
        while !self.is(T::GreaterThan) && !self.is(T::Eof) {
            self.parse_type();
            if !self.is(T::GreaterThan) {
                self.expect(T::Comma);
            }
        }
        self.expect(T::GreaterThan);
        self.pop_type_context(previous);
    }

    /// Parses a full type, including conditional types. Callers push the type context.
    pub(crate) fn parse_type(&mut self) {
        self.parse_non_conditional_type();
        if !self.has_preceding_line_break() && self.eat(T::Extends) {
            self.parse_non_conditional_type();
            self.expect(T::Question);
            self.parse_type();
            self.expect(T::Colon);
            self.parse_type();
        }
    }

    fn parse_non_conditional_type(&mut self) {
        if self.is(T::LessThan) {
            self.parse_type_parameters();
            self.parse_function_type_rest();
            return;
        }
        if self.is(T::ParenL) && self.try_parse_function_type() {
            return;
        }
        if self.is(T::New)
            || (self.is_contextual(Kw::Abstract) && self.lookahead().kind == T::New)
        {
            self.eat_contextual(Kw::Abstract);
            self.next();
            if self.is(T::LessThan) {
                self.parse_type_parameters();
            }
            self.parse_function_type_rest();
            return;
        }
        self.parse_union_type();
    }

    fn try_parse_function_type(&mut self) -> bool {
        let snapshot = self.snapshot();
        self.parse_function_params();
        if self.has_error() || !self.is(T::Arrow) {
            self.restore(snapshot);
            return false;
        }
        self.next();
        self.parse_type_or_type_predicate();
        true
    }

    /// `(params) => Return`, after any type parameters.
    fn parse_function_type_rest(&mut self) {
        self.parse_function_params();
        self.expect(T::Arrow);
        self.parse_type_or_type_predicate();
    }

    fn parse_union_type(&mut self) {
        self.eat(T::BitwiseOr);
        self.parse_intersection_type();
        while self.eat(T::BitwiseOr) {
            self.parse_intersection_type();
        }
    }

    fn parse_intersection_type(&mut self) {
        self.eat(T::BitwiseAnd);
        self.parse_type_operator();
        while self.eat(T::BitwiseAnd) {
            self.parse_type_operator();
        }
    }

    fn parse_type_operator(&mut self) {
        if matches!(
            self.state.contextual_keyword,
            Kw::Keyof | Kw::Unique | Kw::Readonly
        ) && self.is(T::Name)
            && !matches!(
                self.lookahead().kind,
                T::Comma | T::GreaterThan | T::ParenR | T::BracketR | T::Semi | T::Eq | T::BraceR
            )
        {
            self.next();
            self.parse_type_operator();
            return;
        }
        if self.is_contextual(Kw::Infer) && self.lookahead().kind == T::Name {
            self.next();
            self.next();
            if self.is(T::Extends) {
                // `infer U extends X ? ...` is a conditional, not a constraint.
                let snapshot = self.snapshot();
                self.next();
                self.parse_non_conditional_type();
                if self.has_error() || self.is(T::Question) {
                    self.restore(snapshot);
                }
            }
            return;
        }
        if self.options.flow && self.is(T::Question) {
            self.next();
            self.parse_type_operator();
            return;
        }
        self.parse_array_type_or_higher();
    }

    fn parse_array_type_or_higher(&mut self) {
        self.parse_primary_type();
        while !self.has_preceding_line_break() && self.eat(T::BracketL) {
            if !self.is(T::BracketR) {
                self.parse_type();
            }
            self.expect(T::BracketR);
        }
    }

    fn parse_primary_type(&mut self) {
        match self.state.kind {
            T::Name => self.parse_type_reference(),
            T::Void | T::Null | T::This | T::True | T::False | T::Num | T::BigInt | T::String => {
                self.next();
            }
            T::PlusMin => {
                self.next();
                if !self.eat(T::Num) && !self.eat(T::BigInt) {
                    self.unexpected_expecting("number");
                }
            }
            T::Typeof => {
                self.next();
                if self.is(T::Import) {
                    self.parse_import_type();
                } else {
                    self.parse_type_reference();
                }
            }
            T::Import => self.parse_import_type(),
            T::BraceL | T::BraceBarL => {
                if !self.try_parse_mapped_type() {
                    self.parse_object_type();
                }
            }
            T::BracketL => self.parse_tuple_type(),
            T::ParenL => {
                self.next();
                self.parse_type();
                self.expect(T::ParenR);
            }
            T::BackQuote => self.parse_template_with(Self::parse_type),
            T::Star if self.options.flow => self.next(),
            _ => self.unexpected_expecting("type"),
        }
    }

    /// `A.B.C<Args>`
    fn parse_type_reference(&mut self) {
        self.parse_identifier_name();
        while self.eat(T::Dot) {
            self.parse_identifier_name();
        }
        if self.is(T::LessThan) && !self.has_preceding_line_break() {
            self.parse_type_arguments();
        }
    }

    /// `import('x').A<B>`
    fn parse_import_type(&mut self) {
        self.next();
        self.expect(T::ParenL);
        self.expect(T::String);
        self.expect(T::ParenR);
        while self.eat(T::Dot) {
            self.parse_identifier_name();
        }
        if self.is(T::LessThan) {
            self.parse_type_arguments();
        }
    }

    fn parse_tuple_type(&mut self) {
        self.next();
        while !self.is(T::BracketR) && !self.is(T::Eof) {
            self.eat(T::Ellipsis);
            // Covers `T`, `T?`, `name: T` and `name?: T`.
            self.parse_type();
            self.eat(T::Question);
            if self.eat(T::Colon) {
                self.parse_type();
            }
            if !self.is(T::BracketR) {
                self.expect(T::Comma);
            }
        }
        self.expect(T::BracketR);
    }

    /// `{ readonly [K in T as U]?: V }`
    fn try_parse_mapped_type(&mut self) -> bool {
        if !self.is(T::BraceL) {
            return false;
        }
        let snapshot = self.snapshot();
        self.next();
        if self.is(T::PlusMin) {
            self.next();
        }
        self.eat_contextual(Kw::Readonly);
        let is_mapped = self.eat(T::BracketL) && self.eat(T::Name) && self.is(T::In);
        if !is_mapped {
            self.restore(snapshot);
            return false;
        }
        self.next();
        self.parse_type();
        if self.eat_contextual(Kw::As) {
            self.parse_type();
        }
        self.expect(T::BracketR);
        if self.is(T::PlusMin) {
            self.next();
        }
        self.eat(T::Question);
        if self.eat(T::Colon) {
            self.parse_type();
        }
        if !self.eat(T::Semi) {
            self.eat(T::Comma);
        }
        self.expect(T::BraceR);
        true
    }

    /// `{ member; member }` object type, also used for interface bodies.
    pub(crate) fn parse_object_type(&mut self) {
        let close = if self.is(T::BraceBarL) {
            T::BraceBarR
        } else {
            T::BraceR
        };
        if !self.eat(T::BraceL) && !self.eat(T::BraceBarL) {
            self.unexpected_expecting("{");
            return;
        }
        while !self.is(close) && !self.is(T::Eof) {
            self.parse_type_member();
            if !self.eat(T::Comma)
                && !self.eat(T::Semi)
                && !self.is(close)
                && !self.has_preceding_line_break()
            {
                self.unexpected_expecting(";");
            }
        }
        self.expect(close);
    }

    fn parse_type_member(&mut self) {
        if self.is(T::ParenL) || self.is(T::LessThan) {
            self.parse_signature_rest();
            return;
        }
        if self.is(T::New) && matches!(self.lookahead().kind, T::ParenL | T::LessThan) {
            self.next();
            self.parse_signature_rest();
            return;
        }
        if self.eat(T::Ellipsis) {
            self.parse_type();
            return;
        }
        if self.is_contextual(Kw::Readonly)
            && !matches!(
                self.lookahead().kind,
                T::ParenL | T::Colon | T::Question | T::Comma | T::Semi | T::BraceR
            )
        {
            self.next();
        }
        if self.options.flow && self.is(T::PlusMin) {
            self.next();
        }

        if self.eat(T::BracketL) {
            if self.is(T::Name) && self.lookahead().kind == T::Colon {
                self.next();
                self.next();
            }
            self.parse_type();
            self.expect(T::BracketR);
        } else {
            if matches!(self.state.contextual_keyword, Kw::Get | Kw::Set)
                && self.is(T::Name)
                && matches!(
                    self.lookahead().kind,
                    T::Name | T::String | T::Num | T::BracketL
                )
            {
                self.next();
            }
            self.parse_property_name();
        }

        self.eat(T::Question);
        if self.is(T::ParenL) || self.is(T::LessThan) {
            self.parse_signature_rest();
        } else if self.eat(T::Colon) {
            self.parse_type();
        }
    }

    /// `<T>(params): Return` of a call, construct or method signature.
    fn parse_signature_rest(&mut self) {
        if self.is(T::LessThan) {
            self.parse_type_parameters();
        }
        self.parse_function_params();
        if self.is(T::Colon) {
            self.next();
            self.parse_type_or_type_predicate();
        }
    }
}
