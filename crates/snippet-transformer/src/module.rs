//! Rewriting top-level `import` and `export` statements to CommonJS.

use crate::error::CompileError;
use crate::imports::{declared_names, export_specifiers, member, StatementPlan};
use crate::root::RootTransformer;
use snippet_parser::{ContextualKeyword, StatementKind, TokenKind as T, TopLevelStatement};

impl RootTransformer<'_> {
    /// Rewrites the import or export statement starting at `index`.
    pub(crate) fn process_module_statement(&mut self, index: usize) -> Result<(), CompileError> {
        let Some(statement) = self.module_statement(index) else {
            self.tokens.copy_token();
            return Ok(());
        };
        match statement.kind {
            StatementKind::Import => {
                self.process_import(&statement);
                Ok(())
            }
            StatementKind::ExportDefault => self.process_export_default(&statement),
            StatementKind::Export => self.process_export(&statement),
            _ => {
                self.tokens.copy_token();
                Ok(())
            }
        }
    }

    /// Replaces the claimed scaffold code for the statement's path, or nothing.
    fn claimed_code(&mut self, statement: &TopLevelStatement) -> String {
        if self.options.remove_imports {
            return String::new();
        }
        let Some(analyzer) = self.analyzer.as_mut() else {
            return String::new();
        };
        match analyzer.plan(statement.start).cloned() {
            Some(StatementPlan::Claim(path)) => analyzer.claim_import_code(&path),
            Some(StatementPlan::Elide) | None => String::new(),
        }
    }

    fn remove_until(&mut self, end: usize) {
        while self.tokens.current_index() < end && !self.tokens.is_at_end() {
            self.tokens.remove_token();
        }
    }

    fn process_import(&mut self, statement: &TopLevelStatement) {
        let code = self.claimed_code(statement);
        self.tokens.replace_token(code);
        self.remove_until(statement.end);
    }

    fn process_export(&mut self, statement: &TopLevelStatement) -> Result<(), CompileError> {
        let next = statement.start + 1;
        if self.tokens.matches_at(next, &[T::Star]) {
            let code = self.claimed_code(statement);
            self.tokens.replace_token(code);
            self.remove_until(statement.end);
            return Ok(());
        }
        if self.tokens.matches_at(next, &[T::BraceL]) {
            let has_source = (next..statement.end)
                .any(|i| self.tokens.matches_contextual_at(i, ContextualKeyword::From));
            let code = if has_source {
                self.claimed_code(statement)
            } else {
                self.local_export_code(next, statement.end)
            };
            self.tokens.replace_token(code);
            self.remove_until(statement.end);
            return Ok(());
        }

        // `export <declaration>`
        let end = self
            .tokens
            .current_token()
            .rhs_end_index
            .unwrap_or(statement.end);
        let names = declared_names(self.tokens.source(), self.tokens.tokens(), next, end);
        self.tokens.remove_initial_token();
        self.tokens.trim_next_whitespace();
        while self.tokens.current_index() < end && !self.tokens.is_at_end() {
            self.process_token()?;
        }
        let assignments: String = names
            .iter()
            .map(|name| format!(" {} = {name};", member("exports", name)))
            .collect();
        self.tokens.append_code(&assignments);
        Ok(())
    }

    /// `exports.b = a;` for each specifier of `export { a as b }`.
    fn local_export_code(&self, brace: usize, end: usize) -> String {
        export_specifiers(self.tokens.source(), self.tokens.tokens(), brace, end)
            .into_iter()
            .map(|(local, exported)| {
                let value = self
                    .replacement_for(local)
                    .unwrap_or_else(|| local.to_string());
                format!("{} = {value};", member("exports", exported))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn process_export_default(&mut self, statement: &TopLevelStatement) -> Result<(), CompileError> {
        let default_index = statement.start + 1;
        if let Some(name) = self.default_declaration_name(default_index) {
            // `export default function f() {}` keeps `f` in scope.
            self.tokens.remove_initial_token();
            self.tokens.remove_token();
            self.tokens.trim_next_whitespace();
            while self.tokens.current_index() < statement.end && !self.tokens.is_at_end() {
                self.process_token()?;
            }
            self.tokens
                .append_code(&format!(" exports.default = {name};"));
            return Ok(());
        }

        self.tokens.replace_token("exports.default =");
        self.tokens.remove_token();
        while self.tokens.current_index() < statement.end && !self.tokens.is_at_end() {
            self.process_token()?;
        }
        Ok(())
    }

    /// The name of a named function or class after `export default`.
    fn default_declaration_name(&self, default_index: usize) -> Option<String> {
        let mut index = default_index + 1;
        while self.tokens.token_at(index).is_some_and(|t| t.is_type) {
            index += 1;
        }
        if self
            .tokens
            .matches_contextual_at(index, ContextualKeyword::Async)
            && self.tokens.matches_at(index + 1, &[T::Function])
        {
            index += 1;
        }
        if self.tokens.matches_at(index, &[T::Function]) {
            index += 1;
            if self.tokens.matches_at(index, &[T::Star]) {
                index += 1;
            }
        } else if self.tokens.matches_at(index, &[T::Class]) {
            index += 1;
        } else {
            return None;
        }
        let token = self.tokens.token_at(index)?;
        let is_declared = token.kind == T::Name
            && token
                .identifier_role
                .is_some_and(|role| role.is_declaration());
        is_declared.then(|| self.tokens.text_at(index).to_string())
    }
}
