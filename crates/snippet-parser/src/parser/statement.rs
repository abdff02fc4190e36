//! Statements, declarations, classes, imports and exports.

use super::{BindingKind, Parser};
use crate::token::{ContextualKeyword as Kw, IdentifierRole, StatementKind, TokenKind as T};

impl<'src> Parser<'src> {
    pub(crate) fn parse_statement(&mut self) -> StatementKind {
        while self.is(T::At) {
            self.parse_decorator();
        }

        match self.state.kind {
            T::BraceL => {
                self.parse_block(false);
                StatementKind::Other
            }
            T::Semi => {
                self.next();
                StatementKind::Empty
            }
            T::Var => {
                self.parse_var_statement(BindingKind::FunctionScoped);
                StatementKind::Declaration
            }
            T::Let => {
                self.parse_var_statement(BindingKind::BlockScoped);
                StatementKind::Declaration
            }
            T::Const => {
                if self.is_ts() && self.lookahead().is_contextual(Kw::Enum) {
                    self.next();
                    self.parse_enum();
                } else {
                    self.parse_var_statement(BindingKind::BlockScoped);
                }
                StatementKind::Declaration
            }
            T::Function => {
                let start = self.tokens.len();
                self.parse_function(start, true, false);
                StatementKind::Declaration
            }
            T::Class => {
                self.parse_class(true, false);
                StatementKind::Declaration
            }
            T::Import => {
                let next = self.lookahead();
                if matches!(next.kind, T::ParenL | T::Dot) {
                    self.parse_expression_statement()
                } else {
                    self.parse_import();
                    StatementKind::Import
                }
            }
            T::Export => self.parse_export(),
            T::Return => {
                self.next();
                if !self.is_line_terminator() {
                    self.parse_expression();
                }
                self.semicolon();
                StatementKind::Return
            }
            T::If => {
                self.next();
                self.parse_paren_expression();
                self.parse_statement();
                if self.eat(T::Else) {
                    self.parse_statement();
                }
                StatementKind::Other
            }
            T::For => {
                self.parse_for_statement();
                StatementKind::Other
            }
            T::While | T::With => {
                self.next();
                self.parse_paren_expression();
                self.parse_statement();
                StatementKind::Other
            }
            T::Do => {
                self.next();
                self.parse_statement();
                self.expect(T::While);
                self.parse_paren_expression();
                self.eat(T::Semi);
                StatementKind::Other
            }
            T::Switch => {
                self.parse_switch_statement();
                StatementKind::Other
            }
            T::Try => {
                self.parse_try_statement();
                StatementKind::Other
            }
            T::Throw => {
                self.next();
                self.parse_expression();
                self.semicolon();
                StatementKind::Other
            }
            T::Break | T::Continue => {
                self.next();
                if !self.is_line_terminator() && self.is(T::Name) {
                    self.next();
                }
                self.semicolon();
                StatementKind::Other
            }
            T::Debugger => {
                self.next();
                self.semicolon();
                StatementKind::Other
            }
            T::Name => self.parse_name_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    /// Statements starting with an identifier: contextual declarations, labels or
    /// plain expressions.
    fn parse_name_statement(&mut self) -> StatementKind {
        let next = self.lookahead();
        let same_line = !next.line_break_before;

        if next.kind == T::Colon {
            self.next();
            self.next();
            self.parse_statement();
            return StatementKind::Other;
        }

        match self.state.contextual_keyword {
            Kw::Async if same_line && next.kind == T::Function => {
                let start = self.tokens.len();
                self.next();
                self.parse_function(start, true, false);
                StatementKind::Declaration
            }
            Kw::Type if self.has_types() && same_line && next.kind == T::Name => {
                self.parse_type_alias();
                StatementKind::TypeOnly
            }
            Kw::Opaque if self.options.flow && same_line && next.is_contextual(Kw::Type) => {
                let start = self.tokens.len();
                self.next_as_type();
                self.parse_type_alias();
                self.mark_type_from(start);
                StatementKind::TypeOnly
            }
            Kw::Interface if self.has_types() && same_line && next.kind == T::Name => {
                self.parse_interface();
                StatementKind::TypeOnly
            }
            Kw::Declare
                if self.has_types()
                    && same_line
                    && (next.kind == T::Name || next.kind.is_keyword()) =>
            {
                self.parse_declare();
                StatementKind::TypeOnly
            }
            Kw::Enum if self.is_ts() && same_line && next.kind == T::Name => {
                self.parse_enum();
                StatementKind::Declaration
            }
            Kw::Abstract if self.is_ts() && same_line && next.kind == T::Class => {
                self.next_as_type();
                self.parse_class(true, false);
                StatementKind::Declaration
            }
            Kw::Namespace | Kw::Module
                if self.is_ts() && same_line && matches!(next.kind, T::Name | T::String) =>
            {
                self.unsupported("Non-declare namespace");
                StatementKind::Other
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> StatementKind {
        self.parse_expression();
        self.semicolon();
        StatementKind::Expression
    }

    fn parse_paren_expression(&mut self) {
        self.expect(T::ParenL);
        self.parse_expression();
        self.expect(T::ParenR);
    }

    /// Parses `{ ... }`, recording it as a scope.
    pub(crate) fn parse_block(&mut self, is_function_scope: bool) {
        let start = self.tokens.len();
        self.state.scope_depth += 1;
        self.expect(T::BraceL);
        while !self.is(T::BraceR) && !self.is(T::Eof) {
            self.parse_statement();
        }
        self.expect(T::BraceR);
        self.state.scope_depth -= 1;
        self.push_scope(start, is_function_scope);
    }

    fn parse_var_statement(&mut self, kind: BindingKind) {
        self.next();
        self.parse_var_declarations(kind, false);
        self.semicolon();
    }

    /// Parses a comma-separated declarator list after `var`, `let` or `const`.
    fn parse_var_declarations(&mut self, kind: BindingKind, no_in: bool) {
        loop {
            self.parse_binding_atom(kind);
            if self.is_ts() && self.is(T::Bang) {
                self.next_as_type();
            }
            if self.has_types() && self.is(T::Colon) {
                self.parse_type_annotation();
            }
            if self.is(T::Eq) {
                let eq_index = self.tokens.len();
                self.next();
                self.parse_maybe_assign(no_in);
                let rhs_end = self.tokens.len();
                self.tokens[eq_index].rhs_end_index = Some(rhs_end);
            }
            if !self.eat(T::Comma) {
                break;
            }
        }
    }

    fn parse_for_statement(&mut self) {
        self.next();
        self.state.scope_depth += 1;
        let start = self.tokens.len();
        self.eat_contextual(Kw::Await);
        self.expect(T::ParenL);

        if !self.is(T::Semi) {
            match self.state.kind {
                T::Var => {
                    self.next();
                    self.parse_var_declarations(BindingKind::FunctionScoped, true);
                }
                T::Let | T::Const => {
                    self.next();
                    self.parse_var_declarations(BindingKind::BlockScoped, true);
                }
                _ => self.parse_expression_with(true),
            }
        }

        if self.is(T::In) || self.is_contextual(Kw::Of) {
            self.next();
            self.parse_expression();
        } else {
            self.expect(T::Semi);
            if !self.is(T::Semi) {
                self.parse_expression();
            }
            self.expect(T::Semi);
            if !self.is(T::ParenR) {
                self.parse_expression();
            }
        }
        self.expect(T::ParenR);
        self.parse_statement();

        self.push_scope(start, false);
        self.state.scope_depth -= 1;
    }

    fn parse_switch_statement(&mut self) {
        self.next();
        self.parse_paren_expression();
        let start = self.tokens.len();
        self.state.scope_depth += 1;
        self.expect(T::BraceL);
        while !self.is(T::BraceR) && !self.is(T::Eof) {
            if self.eat(T::Case) {
                self.parse_expression();
                self.expect(T::Colon);
            } else if self.eat(T::Default) {
                self.expect(T::Colon);
            } else {
                self.parse_statement();
            }
        }
        self.expect(T::BraceR);
        self.state.scope_depth -= 1;
        self.push_scope(start, false);
    }

    fn parse_try_statement(&mut self) {
        self.next();
        self.parse_block(false);
        let mut has_handler = false;
        if self.eat(T::Catch) {
            has_handler = true;
            if self.is(T::ParenL) {
                self.state.scope_depth += 1;
                let start = self.tokens.len();
                self.next();
                self.parse_binding_atom(BindingKind::BlockScoped);
                if self.has_types() && self.is(T::Colon) {
                    self.parse_type_annotation();
                }
                self.expect(T::ParenR);
                self.parse_block(false);
                self.push_scope(start, false);
                self.state.scope_depth -= 1;
            } else {
                self.parse_block(false);
            }
        }
        if self.eat(T::Finally) {
            has_handler = true;
            self.parse_block(false);
        }
        if !has_handler {
            self.unexpected_expecting("catch or finally");
        }
    }

    // === Bindings ===

    /// Parses a binding identifier or destructuring pattern.
    pub(crate) fn parse_binding_atom(&mut self, kind: BindingKind) {
        match self.state.kind {
            T::Name => {
                let role = self.declaration_role(kind, false);
                self.parse_identifier_with_role(Some(role));
            }
            T::BracketL => {
                self.next();
                while !self.is(T::BracketR) && !self.is(T::Eof) {
                    if self.eat(T::Comma) {
                        continue;
                    }
                    self.parse_binding_element(kind);
                    if !self.is(T::BracketR) {
                        self.expect(T::Comma);
                    }
                }
                self.expect(T::BracketR);
            }
            T::BraceL => self.parse_object_pattern(kind),
            _ => self.unexpected_expecting("binding pattern"),
        }
    }

    fn parse_object_pattern(&mut self, kind: BindingKind) {
        self.next();
        while !self.is(T::BraceR) && !self.is(T::Eof) {
            if self.eat(T::Ellipsis) {
                self.parse_binding_atom(kind);
            } else if self.is(T::Name) && self.lookahead().kind != T::Colon {
                let role = self.declaration_role(kind, true);
                self.parse_identifier_with_role(Some(role));
                if self.eat(T::Eq) {
                    self.parse_maybe_assign(false);
                }
            } else {
                self.parse_property_name();
                self.expect(T::Colon);
                self.parse_binding_atom(kind);
                if self.eat(T::Eq) {
                    self.parse_maybe_assign(false);
                }
            }
            if !self.is(T::BraceR) {
                self.expect(T::Comma);
            }
        }
        self.expect(T::BraceR);
    }

    /// A binding with an optional type annotation and default value.
    fn parse_binding_element(&mut self, kind: BindingKind) {
        self.eat(T::Ellipsis);
        self.parse_binding_atom(kind);
        if self.has_types() {
            if self.is(T::Question) {
                self.next_as_type();
            }
            if self.is(T::Colon) {
                self.parse_type_annotation();
            }
        }
        if self.eat(T::Eq) {
            self.parse_maybe_assign(false);
        }
    }

    /// Parses `( params )` of a function, method or arrow.
    pub(crate) fn parse_function_params(&mut self) {
        self.expect(T::ParenL);
        while !self.is(T::ParenR) && !self.is(T::Eof) {
            let param_start = self.tokens.len();
            while self.is(T::At) {
                self.parse_decorator();
            }
            if self.is_ts() && self.is(T::This) && self.lookahead().kind == T::Colon {
                self.next();
                self.parse_type_annotation();
                if !self.is(T::ParenR) {
                    self.expect(T::Comma);
                }
                self.mark_type_from(param_start);
                continue;
            }
            if self.is_ts() {
                while matches!(
                    self.state.contextual_keyword,
                    Kw::Public | Kw::Private | Kw::Protected | Kw::Readonly | Kw::Override
                ) && self.is(T::Name)
                    && matches!(self.lookahead().kind, T::Name | T::BraceL | T::BracketL)
                {
                    self.next_as_type();
                }
            }
            self.parse_binding_element(BindingKind::FunctionScoped);
            if !self.is(T::ParenR) {
                self.expect(T::Comma);
            }
        }
        self.expect(T::ParenR);
    }

    // === Functions ===

    /// Parses a function declaration or expression. The current token is `function`.
    pub(crate) fn parse_function(&mut self, function_start: usize, is_statement: bool, optional_id: bool) {
        self.next();
        self.eat(T::Star);

        let mut name_scope_start = None;
        if self.is(T::Name) {
            if is_statement {
                let role = self.declaration_role(BindingKind::FunctionScoped, false);
                self.parse_identifier_with_role(Some(role));
            } else {
                name_scope_start = Some(self.tokens.len());
                self.state.scope_depth += 1;
                self.parse_identifier_with_role(Some(IdentifierRole::FunctionScopedDeclaration));
            }
        } else if is_statement && !optional_id {
            self.unexpected_expecting("function name");
            return;
        }

        self.parse_method(function_start, is_statement);

        if let Some(start) = name_scope_start {
            self.push_scope(start, true);
            self.state.scope_depth -= 1;
        }
    }

    /// Parses type parameters, parameters, return type and body.
    ///
    /// In TypeScript a missing body marks everything from `function_start` as type-only
    /// (overload signatures and abstract members).
    pub(crate) fn parse_method(&mut self, function_start: usize, allow_bodyless: bool) {
        let start = self.tokens.len();
        self.state.scope_depth += 1;
        if self.has_types() && self.is(T::LessThan) {
            self.parse_type_parameters();
        }
        self.parse_function_params();
        if self.has_types() && self.is(T::Colon) {
            self.parse_return_type_annotation();
        }
        if self.is(T::BraceL) {
            self.parse_block(true);
        } else if allow_bodyless && self.is_ts() && self.is_line_terminator() {
            self.eat(T::Semi);
            self.mark_type_from(function_start);
        } else {
            self.unexpected_expecting("{");
        }
        self.push_scope(start, true);
        self.state.scope_depth -= 1;
    }

    // === Classes ===

    /// Parses a class declaration or expression. The current token is `class`.
    pub(crate) fn parse_class(&mut self, is_statement: bool, optional_id: bool) {
        self.next();

        let mut name_scope_start = None;
        if !is_statement {
            name_scope_start = Some(self.tokens.len());
            self.state.scope_depth += 1;
        }

        if self.is(T::Name) && !self.is_contextual(Kw::Implements) {
            let role = if is_statement {
                self.declaration_role(BindingKind::BlockScoped, false)
            } else {
                IdentifierRole::BlockScopedDeclaration
            };
            self.parse_identifier_with_role(Some(role));
        } else if is_statement && !optional_id {
            self.unexpected_expecting("class name");
            return;
        }

        if self.has_types() && self.is(T::LessThan) {
            self.parse_type_parameters();
        }
        if self.eat(T::Extends) {
            self.parse_expr_atom();
            self.parse_subscripts(true);
            if self.has_types() && matches!(self.state.kind, T::LessThan | T::BitShiftL) {
                self.parse_type_arguments();
            }
        }
        if self.is_contextual(Kw::Implements) && self.has_types() {
            let previous = self.push_type_context();
            self.next();
            loop {
                self.parse_type();
                if !self.eat(T::Comma) {
                    break;
                }
            }
            self.pop_type_context(previous);
        }

        self.parse_class_body();

        if let Some(start) = name_scope_start {
            self.push_scope(start, false);
            self.state.scope_depth -= 1;
        }
    }

    fn parse_class_body(&mut self) {
        self.expect(T::BraceL);
        while !self.is(T::BraceR) && !self.is(T::Eof) {
            if self.eat(T::Semi) {
                continue;
            }
            self.parse_class_member();
        }
        self.expect(T::BraceR);
    }

    /// Whether the current contextual keyword is a modifier rather than a member name.
    fn modifier_applies(&mut self) -> bool {
        let next = self.lookahead();
        matches!(
            next.kind,
            T::Name
                | T::String
                | T::Num
                | T::BigInt
                | T::PrivateName
                | T::BracketL
                | T::Star
                | T::BraceL
        ) || next.kind.is_keyword()
    }

    fn parse_class_member(&mut self) {
        let member_start = self.tokens.len();
        while self.is(T::At) {
            self.parse_decorator();
        }

        if self.is_contextual(Kw::Static) && self.lookahead().kind == T::BraceL {
            self.next();
            self.parse_block(false);
            return;
        }

        let mut erased = false;
        while self.is(T::Name) {
            let keyword = self.state.contextual_keyword;
            let ts_modifier = matches!(
                keyword,
                Kw::Declare
                    | Kw::Abstract
                    | Kw::Override
                    | Kw::Readonly
                    | Kw::Public
                    | Kw::Private
                    | Kw::Protected
            );
            if !(keyword == Kw::Static || keyword == Kw::Accessor || (ts_modifier && self.is_ts())) {
                break;
            }
            if !self.modifier_applies() {
                break;
            }
            if ts_modifier {
                erased |= matches!(keyword, Kw::Declare | Kw::Abstract);
                self.next_as_type();
            } else {
                self.next();
            }
        }

        if self.is_ts() && self.is(T::BracketL) && self.is_index_signature_start() {
            self.parse_index_signature();
            self.mark_type_from(member_start);
            return;
        }

        if matches!(self.state.contextual_keyword, Kw::Async | Kw::Get | Kw::Set)
            && self.is(T::Name)
            && self.modifier_applies()
            && !(self.is_contextual(Kw::Async) && self.lookahead().line_break_before)
        {
            self.next();
        }
        self.eat(T::Star);

        self.parse_property_name();
        if self.has_types() && (self.is(T::Question) || self.is(T::Bang)) {
            self.next_as_type();
        }

        if self.is(T::ParenL) || self.is(T::LessThan) {
            self.parse_method(member_start, true);
        } else {
            if self.has_types() && self.is(T::Colon) {
                self.parse_type_annotation();
            }
            if self.is(T::Eq) {
                let eq_index = self.tokens.len();
                self.next();
                self.parse_maybe_assign(false);
                let rhs_end = self.tokens.len();
                self.tokens[eq_index].rhs_end_index = Some(rhs_end);
            }
            self.semicolon();
        }

        if erased {
            self.mark_type_from(member_start);
        }
    }

    fn is_index_signature_start(&mut self) -> bool {
        let snapshot = self.snapshot();
        self.next();
        let result = self.is(T::Name) && {
            self.next();
            self.is(T::Colon)
        };
        self.restore(snapshot);
        result
    }

    fn parse_index_signature(&mut self) {
        let previous = self.push_type_context();
        self.next();
        self.next();
        self.parse_type_annotation();
        self.expect(T::BracketR);
        self.eat(T::Question);
        if self.is(T::Colon) {
            self.parse_type_annotation();
        }
        if !self.eat(T::Semi) {
            self.eat(T::Comma);
        }
        self.pop_type_context(previous);
    }

    /// Parses `@expr` where `expr` is a member chain with an optional call.
    pub(crate) fn parse_decorator(&mut self) {
        self.next();
        if self.is(T::ParenL) {
            self.next();
            self.parse_expression();
            self.expect(T::ParenR);
        } else {
            self.parse_identifier_with_role(Some(IdentifierRole::Access));
            while self.eat(T::Dot) {
                self.parse_identifier_name();
            }
        }
        if self.is(T::ParenL) {
            self.parse_call_args();
        }
    }

    // === TypeScript and Flow declarations ===

    fn parse_type_alias(&mut self) {
        let previous = self.push_type_context();
        self.next();
        self.parse_identifier_with_role(None);
        if self.is(T::LessThan) {
            self.parse_type_parameters();
        }
        if self.options.flow && self.is(T::Colon) {
            self.next();
            self.parse_type();
        }
        if self.eat(T::Eq) {
            self.parse_type();
        }
        self.semicolon();
        self.pop_type_context(previous);
    }

    fn parse_interface(&mut self) {
        let previous = self.push_type_context();
        self.next();
        self.parse_identifier_with_role(None);
        if self.is(T::LessThan) {
            self.parse_type_parameters();
        }
        if self.eat(T::Extends) {
            loop {
                self.parse_type();
                if !self.eat(T::Comma) {
                    break;
                }
            }
        }
        self.parse_object_type();
        self.pop_type_context(previous);
    }

    /// `declare ...`: everything up to the end of the declared statement is erased.
    fn parse_declare(&mut self) {
        let start = self.tokens.len();
        let previous = self.push_type_context();
        self.next();
        if matches!(
            self.state.contextual_keyword,
            Kw::Global | Kw::Namespace | Kw::Module
        ) && self.is(T::Name)
        {
            self.parse_module_block();
        } else {
            self.parse_statement();
        }
        self.pop_type_context(previous);
        self.mark_type_from(start);
    }

    /// `namespace A.B { }`, `module 'x' { }` or `global { }` inside a declaration.
    fn parse_module_block(&mut self) {
        let is_global = self.is_contextual(Kw::Global);
        self.next();
        if !is_global && !self.eat(T::String) {
            self.parse_identifier_name();
            while self.eat(T::Dot) {
                self.parse_identifier_name();
            }
        }
        if self.is(T::BraceL) {
            self.parse_block(false);
        } else {
            self.semicolon();
        }
    }

    fn parse_enum(&mut self) {
        self.next();
        let role = self.declaration_role(BindingKind::BlockScoped, false);
        self.parse_identifier_with_role(Some(role));
        self.expect(T::BraceL);
        while !self.is(T::BraceR) && !self.is(T::Eof) {
            if !self.eat(T::String) {
                self.parse_identifier_name();
            }
            if self.is(T::Eq) {
                let eq_index = self.tokens.len();
                self.next();
                self.parse_maybe_assign(false);
                let rhs_end = self.tokens.len();
                self.tokens[eq_index].rhs_end_index = Some(rhs_end);
            }
            if !self.is(T::BraceR) {
                self.expect(T::Comma);
            }
        }
        self.expect(T::BraceR);
    }

    // === Modules ===

    fn parse_import(&mut self) {
        let start = self.tokens.len();
        self.next();

        if self.has_types() && self.is_import_kind_modifier() {
            let previous = self.push_type_context();
            self.next();
            self.parse_import_clause_and_source();
            self.pop_type_context(previous);
            self.mark_type_from(start);
            return;
        }

        if self.is(T::Name) && self.lookahead().kind == T::Eq {
            self.unsupported("import = require()");
            return;
        }

        self.parse_import_clause_and_source();
    }

    /// Whether the current `type`/`typeof` turns the whole import into a type import.
    fn is_import_kind_modifier(&mut self) -> bool {
        let is_modifier = self.is_contextual(Kw::Type) || (self.options.flow && self.is(T::Typeof));
        if !is_modifier {
            return false;
        }
        let next = self.lookahead();
        match next.kind {
            T::BraceL | T::Star => true,
            T::Name => !next.is_contextual(Kw::From),
            _ => false,
        }
    }

    fn parse_import_clause_and_source(&mut self) {
        if self.is(T::String) {
            self.next();
            self.parse_import_attributes();
            self.semicolon();
            return;
        }

        if self.is(T::Name) {
            self.parse_identifier_with_role(Some(self.declaration_role(BindingKind::Import, false)));
            if !self.eat(T::Comma) {
                self.finish_import_source();
                return;
            }
        }

        if self.eat(T::Star) {
            self.expect_contextual(Kw::As, "as");
            self.parse_identifier_with_role(Some(self.declaration_role(BindingKind::Import, false)));
        } else if self.is(T::BraceL) {
            self.parse_import_specifiers();
        }
        self.finish_import_source();
    }

    fn finish_import_source(&mut self) {
        self.expect_contextual(Kw::From, "from");
        self.expect(T::String);
        self.parse_import_attributes();
        self.semicolon();
    }

    fn parse_import_attributes(&mut self) {
        let is_attributes = self.is(T::With)
            || (self.is_contextual(Kw::Assert) && !self.has_preceding_line_break());
        if !is_attributes {
            return;
        }
        self.next();
        self.expect(T::BraceL);
        while !self.is(T::BraceR) && !self.is(T::Eof) {
            self.parse_property_name();
            self.expect(T::Colon);
            self.expect(T::String);
            if !self.is(T::BraceR) {
                self.expect(T::Comma);
            }
        }
        self.expect(T::BraceR);
    }

    fn parse_import_specifiers(&mut self) {
        self.next();
        while !self.is(T::BraceR) && !self.is(T::Eof) {
            let start = self.tokens.len();
            let is_type = self.has_types() && self.is_specifier_type_modifier();
            if is_type {
                self.next();
            }

            let imported = self.tokens.len();
            if self.is(T::String) {
                self.next();
            } else {
                self.parse_identifier_name();
            }
            if self.eat_contextual(Kw::As) {
                self.set_role(imported, IdentifierRole::ImportAccess);
                self.parse_identifier_with_role(Some(self.declaration_role(BindingKind::Import, false)));
            } else {
                self.set_role(imported, self.declaration_role(BindingKind::Import, false));
            }

            if !self.is(T::BraceR) {
                self.expect(T::Comma);
            }
            if is_type {
                self.mark_type_from(start);
            }
        }
        self.expect(T::BraceR);
    }

    /// Whether a specifier starts with a `type` modifier (`{ type A }`, `{ type as as b }`).
    fn is_specifier_type_modifier(&mut self) -> bool {
        if !self.is_contextual(Kw::Type) {
            return false;
        }
        let next = self.lookahead();
        match next.kind {
            T::Comma | T::BraceR => false,
            T::Name if next.is_contextual(Kw::As) => {
                // `type as` alone imports a binding called `type`.
                let snapshot = self.snapshot();
                self.next();
                self.next();
                let result = self.is(T::Name) || self.is(T::String);
                self.restore(snapshot);
                result
            }
            T::Name | T::String => true,
            kind => kind.is_keyword(),
        }
    }

    fn parse_export(&mut self) -> StatementKind {
        let export_index = self.tokens.len();
        self.next();

        if self.is(T::Default) {
            return self.parse_export_default(export_index);
        }

        if self.is(T::Eq) {
            if self.state.is_type {
                self.next();
                self.parse_expression();
                self.semicolon();
            } else {
                self.unsupported("export =");
            }
            return StatementKind::Export;
        }

        if self.is_contextual(Kw::As) && self.is_ts() {
            let previous = self.push_type_context();
            self.next();
            self.expect_contextual(Kw::Namespace, "namespace");
            self.parse_identifier_name();
            self.semicolon();
            self.pop_type_context(previous);
            self.mark_type_from(export_index);
            return StatementKind::TypeOnly;
        }

        let type_only = self.has_types()
            && self.is_contextual(Kw::Type)
            && matches!(self.lookahead().kind, T::BraceL | T::Star);
        if type_only {
            let previous = self.push_type_context();
            self.next();
            self.parse_export_clause();
            self.pop_type_context(previous);
            self.mark_type_from(export_index);
            return StatementKind::TypeOnly;
        }

        if self.is(T::Star) || self.is(T::BraceL) {
            self.parse_export_clause();
            return StatementKind::Export;
        }

        self.parse_statement();
        let end = self.tokens.len();
        self.tokens[export_index].rhs_end_index = Some(end);
        if self.tokens[export_index + 1..end].iter().all(|t| t.is_type) {
            self.mark_type_from(export_index);
            return StatementKind::TypeOnly;
        }
        StatementKind::Export
    }

    fn parse_export_default(&mut self, export_index: usize) -> StatementKind {
        let default_index = self.tokens.len();
        self.next();

        let next = self.lookahead();
        if self.is(T::Function) {
            let start = self.tokens.len();
            self.parse_function(start, true, true);
        } else if self.is_contextual(Kw::Async) && next.kind == T::Function && !next.line_break_before {
            let start = self.tokens.len();
            self.next();
            self.parse_function(start, true, true);
        } else if self.is(T::Class) || self.is(T::At) {
            while self.is(T::At) {
                self.parse_decorator();
            }
            self.parse_class(true, true);
        } else if self.is_ts() && self.is_contextual(Kw::Abstract) && next.kind == T::Class {
            self.next_as_type();
            self.parse_class(true, true);
        } else if self.has_types() && self.is_contextual(Kw::Interface) && next.kind == T::Name {
            self.parse_interface();
            self.mark_type_from(export_index);
            return StatementKind::TypeOnly;
        } else {
            self.parse_maybe_assign(false);
            let end = self.tokens.len();
            self.tokens[default_index].rhs_end_index = Some(end);
            self.semicolon();
            return StatementKind::ExportDefault;
        }

        let end = self.tokens.len();
        self.tokens[default_index].rhs_end_index = Some(end);
        if self.tokens[default_index + 1..end].iter().all(|t| t.is_type) {
            self.mark_type_from(export_index);
            return StatementKind::TypeOnly;
        }
        StatementKind::ExportDefault
    }

    /// `* [as name] from 'x'` or `{ a, b as c } [from 'x']`.
    fn parse_export_clause(&mut self) {
        if self.eat(T::Star) {
            if self.eat_contextual(Kw::As) {
                if self.is(T::String) {
                    self.next();
                } else {
                    self.parse_identifier_name();
                }
            }
            self.finish_import_source();
            return;
        }

        let mut locals = Vec::new();
        self.expect(T::BraceL);
        while !self.is(T::BraceR) && !self.is(T::Eof) {
            let start = self.tokens.len();
            let is_type = self.has_types() && self.is_specifier_type_modifier();
            if is_type {
                self.next();
            }
            locals.push(self.tokens.len());
            if self.is(T::String) {
                self.next();
            } else {
                self.parse_identifier_name();
            }
            if self.eat_contextual(Kw::As) {
                if self.is(T::String) {
                    self.next();
                } else {
                    self.parse_identifier_name();
                }
            }
            if !self.is(T::BraceR) {
                self.expect(T::Comma);
            }
            if is_type {
                self.mark_type_from(start);
            }
        }
        self.expect(T::BraceR);

        if self.is_contextual(Kw::From) {
            self.finish_import_source();
        } else {
            for index in locals {
                if self.tokens[index].kind == T::Name {
                    self.set_role(index, IdentifierRole::ExportAccess);
                }
            }
            self.semicolon();
        }
    }
}
