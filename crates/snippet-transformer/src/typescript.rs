//! Type syntax removal and enum compilation.

use crate::error::CompileError;
use crate::names::is_identifier;
use crate::root::RootTransformer;
use snippet_parser::{ContextualKeyword, TokenKind as T};

impl RootTransformer<'_> {
    /// Removes a run of type-only tokens, keeping the whitespace before the first.
    pub(crate) fn remove_type_range(&mut self) {
        self.tokens.remove_initial_token();
        while self.tokens.current_token().is_type && !self.tokens.is_at_end() {
            self.tokens.remove_token();
        }
    }

    /// Rewrites `(a): T =>` to `(a) =>`.
    ///
    /// The return type sits between `)` and `=>`; removing it as a normal type range
    /// would leave a line break before `=>` when the annotation spans lines, which is
    /// a syntax error.
    pub(crate) fn process_possible_arrow_param_end(&mut self) -> bool {
        let index = self.tokens.current_index();
        if !self.tokens.matches(&[T::ParenR, T::Colon])
            || !self.tokens.token_at(index + 1).is_some_and(|t| t.is_type)
        {
            return false;
        }
        let mut next = index + 1;
        while self.tokens.token_at(next).is_some_and(|t| t.is_type) {
            next += 1;
        }
        if !self.tokens.matches_at(next, &[T::Arrow]) {
            return false;
        }
        self.tokens.remove_initial_token();
        while self.tokens.current_index() < next {
            self.tokens.remove_token();
        }
        self.tokens.replace_token_trimming_left_whitespace(") =>");
        true
    }

    /// `enum Name {` or `const enum Name {` with a declared name.
    pub(crate) fn is_enum_start(&self) -> bool {
        let index = self.tokens.current_index();
        let keyword = if self.tokens.matches(&[T::Const]) {
            index + 1
        } else {
            index
        };
        self.tokens
            .matches_contextual_at(keyword, ContextualKeyword::Enum)
            && self
                .tokens
                .token_at(keyword + 1)
                .and_then(|t| t.identifier_role)
                .is_some_and(|role| role.is_declaration())
    }

    /// Compiles an enum to a function populating a forward and reverse mapping:
    ///
    /// ```text
    /// var E; (function (E) { const A = 0; E[E["A"] = A] = "A"; })(E || (E = {}));
    /// ```
    pub(crate) fn process_enum(&mut self) -> Result<(), CompileError> {
        if self.tokens.matches(&[T::Const]) {
            self.tokens.remove_initial_token();
            self.tokens.remove_token();
        } else {
            self.tokens.remove_initial_token();
        }
        let name = self.tokens.current_text();
        self.tokens.remove_token();
        self.tokens
            .append_code(&format!("var {name}; (function ({name})"));
        self.tokens.copy_expected_token(T::BraceL)?;
        self.process_enum_body(name)?;
        self.tokens.copy_expected_token(T::BraceR)?;
        self.tokens
            .append_code(&format!(")({name} || ({name} = {{}}));"));
        Ok(())
    }

    fn process_enum_body(&mut self, enum_name: &str) -> Result<(), CompileError> {
        let mut previous_value: Option<String> = None;
        while !self.tokens.matches(&[T::BraceR]) {
            if self.tokens.is_at_end() {
                return Err(self.tokens.invariant("Unterminated enum body"));
            }
            let token = self.tokens.current_token();
            let text = self.tokens.current_text();
            let (name_code, variable) = if token.kind == T::String {
                let value = text.get(1..text.len().saturating_sub(1)).unwrap_or_default();
                (text.to_string(), is_identifier(value).then(|| value.to_string()))
            } else {
                (format!("\"{text}\""), Some(text.to_string()))
            };
            self.tokens.remove_initial_token();

            if self.tokens.matches(&[T::Eq, T::String, T::Comma])
                || self.tokens.matches(&[T::Eq, T::String, T::BraceR])
            {
                self.process_string_enum_member(enum_name, &name_code, variable.as_deref());
            } else if self.tokens.matches(&[T::Eq]) {
                self.process_explicit_enum_member(enum_name, &name_code, variable.as_deref())?;
            } else {
                self.process_implicit_enum_member(
                    enum_name,
                    &name_code,
                    variable.as_deref(),
                    previous_value.as_deref(),
                );
            }
            previous_value = Some(variable.unwrap_or_else(|| format!("{enum_name}[{name_code}]")));

            if self.tokens.matches(&[T::Comma]) {
                self.tokens.remove_token();
            }
        }
        Ok(())
    }

    /// String members get no reverse mapping.
    fn process_string_enum_member(&mut self, enum_name: &str, name_code: &str, variable: Option<&str>) {
        match variable {
            Some(variable) => {
                self.tokens.append_code(&format!("const {variable}"));
                self.tokens.copy_token();
                self.tokens.copy_token();
                self.tokens
                    .append_code(&format!("; {enum_name}[{name_code}] = {variable};"));
            }
            None => {
                self.tokens.append_code(&format!("{enum_name}[{name_code}]"));
                self.tokens.copy_token();
                self.tokens.copy_token();
                self.tokens.append_code(";");
            }
        }
    }

    fn process_explicit_enum_member(
        &mut self,
        enum_name: &str,
        name_code: &str,
        variable: Option<&str>,
    ) -> Result<(), CompileError> {
        let rhs_end = self
            .tokens
            .current_token()
            .rhs_end_index
            .ok_or_else(|| self.tokens.invariant("Expected rhs end on enum member initializer"))?;
        match variable {
            Some(variable) => {
                self.tokens.append_code(&format!("const {variable}"));
                self.tokens.copy_token();
                while self.tokens.current_index() < rhs_end && !self.tokens.is_at_end() {
                    self.process_token()?;
                }
                self.tokens.append_code(&format!(
                    "; {enum_name}[{enum_name}[{name_code}] = {variable}] = {name_code};"
                ));
            }
            None => {
                self.tokens
                    .append_code(&format!("{enum_name}[{enum_name}[{name_code}]"));
                self.tokens.copy_token();
                while self.tokens.current_index() < rhs_end && !self.tokens.is_at_end() {
                    self.process_token()?;
                }
                self.tokens.append_code(&format!("] = {name_code};"));
            }
        }
        Ok(())
    }

    fn process_implicit_enum_member(
        &mut self,
        enum_name: &str,
        name_code: &str,
        variable: Option<&str>,
        previous_value: Option<&str>,
    ) {
        let mut value = match previous_value {
            Some(previous) => format!("{previous} + 1"),
            None => "0".to_string(),
        };
        if let Some(variable) = variable {
            self.tokens
                .append_code(&format!("const {variable} = {value}; "));
            value = variable.to_string();
        }
        self.tokens.append_code(&format!(
            "{enum_name}[{enum_name}[{name_code}] = {value}] = {name_code};"
        ));
    }
}
