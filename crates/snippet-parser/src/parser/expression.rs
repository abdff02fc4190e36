//! Expressions: precedence climbing, atoms, arrows, templates and literals.
//!
//! Functions that may end in an arrow function return `true` when they did, so the
//! callers skip member access and binary operators after it.

use super::Parser;
use crate::token::{ContextualKeyword as Kw, IdentifierRole, TokenKind as T};

/// Binding power of `as` and `satisfies`, equal to relational operators.
const AS_PRECEDENCE: i8 = 7;

fn binary_precedence(kind: T) -> Option<i8> {
    let precedence = match kind {
        T::NullishCoalescing | T::LogicalOr => 1,
        T::LogicalAnd => 2,
        T::BitwiseOr => 3,
        T::BitwiseXor => 4,
        T::BitwiseAnd => 5,
        T::Equality => 6,
        T::LessThan | T::GreaterThan | T::RelationalOrEqual | T::Instanceof | T::In => 7,
        T::BitShiftL | T::BitShiftR => 8,
        T::PlusMin => 9,
        T::Star | T::Slash | T::Modulo => 10,
        T::Exponent => 11,
        _ => return None,
    };
    Some(precedence)
}

/// Tokens that can begin an expression, used to tell `await x` from `await`.
fn starts_expression(kind: T) -> bool {
    matches!(
        kind,
        T::Name
            | T::Num
            | T::BigInt
            | T::String
            | T::PrivateName
            | T::ParenL
            | T::BracketL
            | T::BraceL
            | T::BackQuote
            | T::New
            | T::This
            | T::Super
            | T::Function
            | T::Class
            | T::Import
            | T::Null
            | T::True
            | T::False
            | T::Typeof
            | T::Void
            | T::Delete
            | T::Bang
            | T::Tilde
            | T::PlusMin
            | T::IncDec
            | T::LessThan
            | T::Slash
    )
}

impl<'src> Parser<'src> {
    /// Parses a comma-separated expression.
    pub(crate) fn parse_expression(&mut self) {
        self.parse_expression_with(false);
    }

    pub(crate) fn parse_expression_with(&mut self, no_in: bool) {
        self.parse_maybe_assign(no_in);
        while self.eat(T::Comma) {
            self.parse_maybe_assign(no_in);
        }
    }

    /// Parses an assignment expression. Returns `true` if it was an arrow function.
    pub(crate) fn parse_maybe_assign(&mut self, no_in: bool) -> bool {
        if self.is(T::Yield) {
            self.parse_yield(no_in);
            return false;
        }

        // `<T>(x) => x`; in TSX anything that fails this reading is JSX.
        if self.is_ts() && self.is(T::LessThan) && self.try_parse_generic_arrow() {
            return true;
        }

        self.parse_maybe_assign_base(no_in)
    }

    fn parse_maybe_assign_base(&mut self, no_in: bool) -> bool {
        if self.parse_maybe_conditional(no_in) {
            return true;
        }
        if self.state.kind.is_assign() {
            let eq_index = self.tokens.len();
            self.next();
            self.parse_maybe_assign(no_in);
            let rhs_end = self.tokens.len();
            self.tokens[eq_index].rhs_end_index = Some(rhs_end);
        }
        false
    }

    fn parse_yield(&mut self, no_in: bool) {
        self.next();
        if self.has_preceding_line_break()
            || matches!(
                self.state.kind,
                T::ParenR | T::BracketR | T::BraceR | T::Comma | T::Semi | T::Colon | T::Eof
            )
        {
            return;
        }
        self.eat(T::Star);
        self.parse_maybe_assign(no_in);
    }

    fn parse_maybe_conditional(&mut self, no_in: bool) -> bool {
        if self.parse_expr_ops(no_in) {
            return true;
        }
        if self.eat(T::Question) {
            self.parse_maybe_assign(false);
            self.expect(T::Colon);
            self.parse_maybe_assign(no_in);
        }
        false
    }

    fn parse_expr_ops(&mut self, no_in: bool) -> bool {
        if self.parse_maybe_unary() {
            return true;
        }
        self.parse_expr_op(-1, no_in);
        false
    }

    fn parse_expr_op(&mut self, min_precedence: i8, no_in: bool) {
        loop {
            if self.is_ts()
                && (self.is_contextual(Kw::As) || self.is_contextual(Kw::Satisfies))
                && !self.has_preceding_line_break()
                && AS_PRECEDENCE > min_precedence
            {
                let previous = self.push_type_context();
                self.next();
                if !self.eat(T::Const) {
                    self.parse_type();
                }
                self.pop_type_context(previous);
                continue;
            }

            let precedence = match binary_precedence(self.state.kind) {
                Some(_) if no_in && self.is(T::In) => return,
                Some(precedence) if precedence > min_precedence => precedence,
                _ => return,
            };
            let right_associative = self.is(T::Exponent);
            self.next();
            if self.parse_maybe_unary() {
                continue;
            }
            let next_min = if right_associative {
                precedence - 1
            } else {
                precedence
            };
            self.parse_expr_op(next_min, no_in);
        }
    }

    fn parse_maybe_unary(&mut self) -> bool {
        if self.is_ts() && !self.options.jsx && self.is(T::LessThan) {
            // Legacy `<T>expr` type assertion.
            self.parse_type_arguments();
            return self.parse_maybe_unary();
        }

        match self.state.kind {
            T::IncDec | T::Bang | T::Tilde | T::PlusMin | T::Typeof | T::Void | T::Delete => {
                self.next();
                self.parse_maybe_unary();
                return false;
            }
            T::Name if self.is_contextual(Kw::Await) => {
                if starts_expression(self.lookahead().kind) {
                    self.next();
                    self.parse_maybe_unary();
                    return false;
                }
            }
            _ => {}
        }

        if self.parse_expr_subscripts() {
            return true;
        }
        if self.is(T::IncDec) && !self.has_preceding_line_break() {
            self.next();
        }
        false
    }

    fn parse_expr_subscripts(&mut self) -> bool {
        if self.parse_expr_atom() {
            return true;
        }
        self.parse_subscripts(false);
        false
    }

    /// Parses member accesses, calls, tagged templates and non-null assertions.
    pub(crate) fn parse_subscripts(&mut self, no_calls: bool) {
        loop {
            match self.state.kind {
                T::Dot => {
                    self.next();
                    self.parse_member_name();
                }
                T::QuestionDot => {
                    self.next();
                    match self.state.kind {
                        T::ParenL => self.parse_call_args(),
                        T::BracketL => {
                            self.next();
                            self.parse_expression();
                            self.expect(T::BracketR);
                        }
                        T::LessThan if self.is_ts() => {
                            if !self.try_parse_type_arguments(true) {
                                self.unexpected();
                                return;
                            }
                        }
                        _ => self.parse_member_name(),
                    }
                }
                T::BracketL => {
                    self.next();
                    self.parse_expression();
                    self.expect(T::BracketR);
                }
                T::ParenL if !no_calls => self.parse_call_args(),
                T::BackQuote => self.parse_template(),
                T::Bang if self.is_ts() && !self.has_preceding_line_break() => {
                    self.next_as_type();
                }
                T::LessThan | T::BitShiftL if self.is_ts() && !no_calls => {
                    if !self.try_parse_type_arguments(true) {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    fn parse_member_name(&mut self) {
        if self.is(T::PrivateName) {
            self.next();
        } else {
            self.parse_identifier_name();
        }
    }

    /// Speculatively parses `<...>` type arguments. With `require_call`, they are kept
    /// only when a call or tagged template follows.
    pub(crate) fn try_parse_type_arguments(&mut self, require_call: bool) -> bool {
        let snapshot = self.snapshot();
        if self.is(T::BitShiftL) {
            self.state.kind = T::LessThan;
            self.state.end = self.state.start + 1;
            self.state.pos = self.state.end;
        }
        self.parse_type_arguments();
        let accepted = !self.has_error()
            && (!require_call || self.is(T::ParenL) || self.is(T::BackQuote));
        if !accepted {
            self.restore(snapshot);
        }
        accepted
    }

    pub(crate) fn parse_call_args(&mut self) {
        self.expect(T::ParenL);
        while !self.is(T::ParenR) && !self.is(T::Eof) {
            self.eat(T::Ellipsis);
            self.parse_maybe_assign(false);
            if !self.is(T::ParenR) {
                self.expect(T::Comma);
            }
        }
        self.expect(T::ParenR);
    }

    /// Parses a primary expression. Returns `true` if it was an arrow function.
    pub(crate) fn parse_expr_atom(&mut self) -> bool {
        match self.state.kind {
            T::Slash => {
                self.retokenize_slash_as_regex();
                self.next();
            }
            T::Assign if self.current_text() == "/=" => {
                self.retokenize_slash_as_regex();
                self.next();
            }
            T::LessThan if self.options.jsx => {
                self.parse_jsx_element();
                self.next();
            }
            T::Name => return self.parse_name_atom(),
            T::Num
            | T::BigInt
            | T::String
            | T::Null
            | T::True
            | T::False
            | T::This
            | T::Super
            | T::PrivateName => self.next(),
            T::ParenL => {
                if self.try_parse_paren_arrow() {
                    return true;
                }
                self.next();
                self.parse_expression();
                if self.options.flow && self.is(T::Colon) {
                    self.parse_type_annotation();
                }
                self.expect(T::ParenR);
            }
            T::BracketL => {
                self.next();
                while !self.is(T::BracketR) && !self.is(T::Eof) {
                    if self.eat(T::Comma) {
                        continue;
                    }
                    self.eat(T::Ellipsis);
                    self.parse_maybe_assign(false);
                    if !self.is(T::BracketR) {
                        self.expect(T::Comma);
                    }
                }
                self.expect(T::BracketR);
            }
            T::BraceL | T::BraceBarL => self.parse_object_literal(),
            T::Function => {
                let start = self.tokens.len();
                self.parse_function(start, false, false);
            }
            T::Class => self.parse_class(false, false),
            T::At => {
                while self.is(T::At) {
                    self.parse_decorator();
                }
                if self.is(T::Class) {
                    self.parse_class(false, false);
                } else {
                    self.unexpected_expecting("class");
                }
            }
            T::New => self.parse_new(),
            T::BackQuote => self.parse_template(),
            T::Import => {
                self.next();
                if self.eat(T::Dot) {
                    self.parse_identifier_name();
                } else if self.is(T::ParenL) {
                    self.parse_call_args();
                } else {
                    self.unexpected_expecting("(");
                }
            }
            _ => self.unexpected(),
        }
        false
    }

    fn parse_name_atom(&mut self) -> bool {
        let next = self.lookahead();

        if self.is_contextual(Kw::Async) && !next.line_break_before {
            match next.kind {
                T::Function => {
                    let start = self.tokens.len();
                    self.next();
                    self.parse_function(start, false, false);
                    return false;
                }
                T::Name => {
                    self.next();
                    return self.parse_single_param_arrow();
                }
                T::ParenL => {
                    let snapshot = self.snapshot();
                    self.next();
                    if self.try_parse_paren_arrow() {
                        return true;
                    }
                    self.restore(snapshot);
                }
                _ => {}
            }
        }

        if next.kind == T::Arrow && !next.line_break_before {
            return self.parse_single_param_arrow();
        }

        self.parse_identifier_with_role(Some(IdentifierRole::Access));
        false
    }

    /// `x => body`, with the current token at `x`.
    fn parse_single_param_arrow(&mut self) -> bool {
        let scope_start = self.tokens.len();
        self.state.scope_depth += 1;
        self.parse_identifier_with_role(Some(IdentifierRole::FunctionScopedDeclaration));
        if !self.is(T::Arrow) {
            self.unexpected_expecting("=>");
        }
        self.parse_arrow_body(scope_start);
        true
    }

    /// Tries `(params) [: type] => body` from the current `(`, restoring on failure.
    fn try_parse_paren_arrow(&mut self) -> bool {
        let snapshot = self.snapshot();
        let scope_start = self.tokens.len();
        self.state.scope_depth += 1;
        self.parse_function_params();
        if self.has_types() && self.is(T::Colon) {
            self.parse_return_type_annotation();
        }
        if self.has_error() || !self.is(T::Arrow) || self.has_preceding_line_break() {
            self.restore(snapshot);
            return false;
        }
        self.parse_arrow_body(scope_start);
        true
    }

    /// `<T>(params) => body` in TypeScript.
    fn try_parse_generic_arrow(&mut self) -> bool {
        let snapshot = self.snapshot();
        self.parse_type_parameters();
        if !self.has_error() && self.is(T::ParenL) && self.try_parse_paren_arrow() {
            return true;
        }
        self.restore(snapshot);
        false
    }

    /// Parses from `=>` through the body and closes the function scope opened by the
    /// caller at `scope_start`.
    fn parse_arrow_body(&mut self, scope_start: usize) {
        self.next();
        if self.is(T::BraceL) {
            self.parse_block(true);
        } else {
            self.parse_maybe_assign(false);
        }
        self.push_scope(scope_start, true);
        self.state.scope_depth -= 1;
    }

    fn parse_new(&mut self) {
        self.next();
        if self.eat(T::Dot) {
            self.parse_identifier_name();
            return;
        }
        if self.is(T::New) {
            self.parse_new();
        } else {
            self.parse_expr_atom();
        }
        self.parse_subscripts(true);
        if self.is_ts() && matches!(self.state.kind, T::LessThan | T::BitShiftL) {
            self.try_parse_type_arguments(false);
        }
        if self.is(T::ParenL) {
            self.parse_call_args();
        }
    }

    /// Parses a template literal, with the current token at the opening backquote.
    pub(crate) fn parse_template(&mut self) {
        self.parse_template_with(Self::parse_expression);
    }

    /// Shared by template literals and template literal types; `inner` parses each
    /// `${...}` substitution.
    pub(crate) fn parse_template_with(&mut self, inner: fn(&mut Self)) {
        self.next_template_chunk();
        loop {
            self.next();
            match self.state.kind {
                T::BackQuote => {
                    self.next();
                    return;
                }
                T::DollarBraceL => {
                    self.next();
                    inner(self);
                    if !self.is(T::BraceR) {
                        self.unexpected_expecting("}");
                        return;
                    }
                    self.next_template_chunk();
                }
                _ => {
                    self.unexpected_expecting("`");
                    return;
                }
            }
        }
    }

    fn parse_object_literal(&mut self) {
        let close = if self.is(T::BraceBarL) {
            T::BraceBarR
        } else {
            T::BraceR
        };
        self.next();
        while !self.is(close) && !self.is(T::Eof) {
            if self.eat(T::Ellipsis) {
                self.parse_maybe_assign(false);
            } else {
                self.parse_object_member(close);
            }
            if !self.is(close) {
                self.expect(T::Comma);
            }
        }
        self.expect(close);
    }

    fn parse_object_member(&mut self, close: T) {
        let member_start = self.tokens.len();

        let mut has_prefix = false;
        if self.eat(T::Star) {
            has_prefix = true;
        } else if matches!(self.state.contextual_keyword, Kw::Async | Kw::Get | Kw::Set)
            && self.is(T::Name)
        {
            let next = self.lookahead();
            let is_prefix = matches!(
                next.kind,
                T::Name | T::String | T::Num | T::BigInt | T::BracketL | T::Star | T::PrivateName
            ) || next.kind.is_keyword();
            if is_prefix && !(self.is_contextual(Kw::Async) && next.line_break_before) {
                self.next();
                self.eat(T::Star);
                has_prefix = true;
            }
        }

        if !has_prefix && self.is(T::Name) {
            let next = self.lookahead();
            if next.kind == T::Comma || next.kind == T::Eq || next.kind == close {
                self.parse_identifier_with_role(Some(IdentifierRole::ObjectShorthand));
                if self.eat(T::Eq) {
                    self.parse_maybe_assign(false);
                }
                return;
            }
        }

        if self.is(T::Name) {
            self.parse_identifier_with_role(Some(IdentifierRole::ObjectKey));
        } else {
            self.parse_property_name();
        }

        if self.is(T::ParenL) || self.is(T::LessThan) {
            self.parse_method(member_start, false);
        } else {
            self.expect(T::Colon);
            self.parse_maybe_assign(false);
        }
    }

    /// Parses a property key: identifier, keyword, string, number or `[computed]`.
    pub(crate) fn parse_property_name(&mut self) {
        match self.state.kind {
            T::BracketL => {
                self.next();
                self.parse_maybe_assign(false);
                self.expect(T::BracketR);
            }
            T::String | T::Num | T::BigInt | T::PrivateName => self.next(),
            _ => self.parse_identifier_name(),
        }
    }
}
