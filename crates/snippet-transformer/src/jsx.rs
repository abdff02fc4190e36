//! JSX elements to function calls.
//!
//! The classic runtime calls the pragma with the tag, a props object (or `null`)
//! and the children as trailing arguments:
//!
//! ```text
//! <div a={1}>hi {name}</div>  =>  React.createElement('div', { a: 1 }, "hi ", name)
//! ```
//!
//! The automatic runtime calls `jsx`, `jsxs` or `jsxDEV` from the runtime module
//! with the children moved into the props object and `key` passed separately.

use crate::compile::JsxRuntime;
use crate::entities::decode_entity;
use crate::error::CompileError;
use crate::imports::quote;
use crate::names::{base_name_for_path, is_identifier};
use crate::root::RootTransformer;
use snippet_parser::{is_component_tag, JsxRole, TokenKind as T};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributeKind {
    Spread,
    Key,
    Named,
}

impl RootTransformer<'_> {
    /// Rewrites the element whose `<` is the current token.
    pub(crate) fn process_jsx_element(&mut self) -> Result<(), CompileError> {
        let role = self
            .tokens
            .current_token()
            .jsx_role
            .ok_or_else(|| self.tokens.invariant("Expected JSX role on tag start"))?;
        if self.options.jsx_runtime != JsxRuntime::Automatic {
            let (pragma, fragment) = match &self.jsx {
                Some(settings) => (settings.pragma.clone(), settings.fragment_pragma.clone()),
                None => (self.options.jsx_pragma.clone(), self.options.jsx_fragment_pragma.clone()),
            };
            return self.process_classic_element(&pragma, &fragment);
        }
        if role == JsxRole::KeyAfterPropSpread {
            // `{...props} key="k"` has no automatic-runtime equivalent.
            let source = self.options.jsx_import_source.clone();
            let base = self.runtime_import(&source, &base_name_for_path(&source));
            return self.process_classic_element(
                &format!("{base}.createElement"),
                &format!("{base}.Fragment"),
            );
        }
        self.process_automatic_element(role)
    }

    // === Classic runtime ===

    fn process_classic_element(&mut self, pragma: &str, fragment: &str) -> Result<(), CompileError> {
        self.tokens.replace_token(format!("{pragma}("));
        if self.tokens.matches(&[T::JsxTagEnd]) {
            self.tokens.replace_token(format!("{fragment}, null"));
            self.process_children(true)?;
            return self.process_closing_tag(")");
        }

        self.process_tag_name()?;
        self.process_classic_props()?;
        if self.tokens.matches(&[T::Slash, T::JsxTagEnd]) {
            self.tokens.remove_token();
            self.tokens.replace_token(")");
            return Ok(());
        }
        self.expect_tag_end()?;
        self.tokens.remove_token();
        self.process_children(true)?;
        self.process_closing_tag(")")
    }

    fn process_classic_props(&mut self) -> Result<(), CompileError> {
        let attributes = self.scan_attributes()?;
        if attributes.is_empty() {
            self.tokens.append_code(", null");
            return Ok(());
        }
        if attributes == [AttributeKind::Spread] {
            self.tokens.append_code(",");
            return self.process_spread_attribute(false);
        }

        let has_spread = attributes.contains(&AttributeKind::Spread);
        match self.options.object_assign.clone() {
            Some(assign) if has_spread => {
                self.tokens.append_code(&format!(", {assign}({{}}"));
                let mut group_open = false;
                for kind in attributes {
                    if kind == AttributeKind::Spread {
                        if group_open {
                            self.tokens.append_code(" }");
                            group_open = false;
                        }
                        self.tokens.append_code(",");
                        self.process_spread_attribute(false)?;
                    } else {
                        self.tokens
                            .append_code(if group_open { "," } else { ", {" });
                        group_open = true;
                        self.process_named_attribute()?;
                    }
                }
                if group_open {
                    self.tokens.append_code(" }");
                }
                self.tokens.append_code(")");
            }
            _ => {
                self.tokens.append_code(", {");
                for (i, kind) in attributes.into_iter().enumerate() {
                    if i > 0 {
                        self.tokens.append_code(",");
                    }
                    if kind == AttributeKind::Spread {
                        self.process_spread_attribute(true)?;
                    } else {
                        self.process_named_attribute()?;
                    }
                }
                self.tokens.append_code(" }");
            }
        }
        Ok(())
    }

    // === Automatic runtime ===

    fn process_automatic_element(&mut self, role: JsxRole) -> Result<(), CompileError> {
        let start = self.tokens.current_token();
        let module = self.options.automatic_runtime_module();
        let runtime = self.runtime_import(&module, "jsxRuntime");
        let function = match (self.options.production, role) {
            (false, _) => "jsxDEV",
            (true, JsxRole::StaticChildren) => "jsxs",
            (true, _) => "jsx",
        };
        self.tokens.replace_token(format!("{runtime}.{function}("));

        let (entries, key) = if self.tokens.matches(&[T::JsxTagEnd]) {
            self.tokens
                .append_code(&format!("{runtime}.Fragment, {{"));
            (0, None)
        } else {
            self.process_tag_name()?;
            self.process_automatic_props()?
        };
        let tail = self.automatic_tail(key, role, start.span.start);

        if self.tokens.matches(&[T::Slash, T::JsxTagEnd]) {
            self.tokens
                .append_code(if entries > 0 { " }" } else { "}" });
            self.tokens.append_code(&tail);
            self.tokens.remove_token();
            self.tokens.replace_token(")");
            return Ok(());
        }
        self.expect_tag_end()?;

        let has_children = matches!(role, JsxRole::OneChild | JsxRole::StaticChildren);
        let is_static = role == JsxRole::StaticChildren;
        if has_children {
            if entries > 0 {
                self.tokens.append_code(",");
            }
            self.tokens
                .append_code(if is_static { " children: [" } else { " children: " });
        }
        self.tokens.remove_token();
        self.process_children(false)?;

        let mut close = String::new();
        if is_static {
            close.push(']');
        }
        close.push_str(if has_children || entries > 0 { " }" } else { "}" });
        close.push_str(&tail);
        close.push(')');
        self.process_closing_tag(&close)
    }

    /// Emits `, {` and the props; returns the number of entries and the key code.
    fn process_automatic_props(&mut self) -> Result<(usize, Option<String>), CompileError> {
        let attributes = self.scan_attributes()?;
        self.tokens.append_code(", {");
        let mut entries = 0;
        let mut key: Option<String> = None;
        for kind in attributes {
            match kind {
                AttributeKind::Key => {
                    // The last key wins; earlier ones only keep their line breaks.
                    if let Some(previous) = key.take() {
                        let line_breaks: String = previous.chars().filter(|&c| c == '\n').collect();
                        self.tokens.append_code(&line_breaks);
                    }
                    self.tokens.remove_token();
                    if self.tokens.matches(&[T::Eq]) {
                        self.tokens.remove_token();
                        let snapshot = self.tokens.snapshot();
                        self.process_attribute_value()?;
                        let code = self
                            .tokens
                            .dangerously_get_and_remove_code_since_snapshot(&snapshot);
                        key = Some(code.trim_start().to_string());
                    } else {
                        key = Some("true".to_string());
                    }
                }
                AttributeKind::Spread => {
                    if entries > 0 {
                        self.tokens.append_code(",");
                    }
                    self.process_spread_attribute(true)?;
                    entries += 1;
                }
                AttributeKind::Named => {
                    if entries > 0 {
                        self.tokens.append_code(",");
                    }
                    self.process_named_attribute()?;
                    entries += 1;
                }
            }
        }
        Ok((entries, key))
    }

    /// Arguments after the props object: the key, and in development the static
    /// flag, the source position and `this`.
    fn automatic_tail(&self, key: Option<String>, role: JsxRole, start: source_map::ByteOffset) -> String {
        if self.options.production {
            return key.map(|key| format!(", {key}")).unwrap_or_default();
        }
        let key = key.unwrap_or_else(|| "void 0".to_string());
        let is_static = role == JsxRole::StaticChildren;
        let position = self
            .line_index
            .line_col(self.tokens.source(), start)
            .unwrap_or_default();
        let file_name = match &self.options.file_path {
            Some(path) => format!(
                "fileName: {}, ",
                serde_json::to_string(path).unwrap_or_default()
            ),
            None => String::new(),
        };
        format!(
            ", {key}, {is_static}, {{ {file_name}lineNumber: {}, columnNumber: {} }}, this",
            position.line + 1,
            position.col + 1
        )
    }

    // === Shared ===

    fn expect_tag_end(&self) -> Result<(), CompileError> {
        if self.tokens.matches(&[T::JsxTagEnd]) {
            Ok(())
        } else {
            Err(self
                .tokens
                .invariant("Expected either /> or > at the end of the tag"))
        }
    }

    /// Emits the tag as a string for intrinsic elements or an expression for components.
    fn process_tag_name(&mut self) -> Result<(), CompileError> {
        let start = self.tokens.current_index();
        if !self.tokens.matches(&[T::JsxName]) {
            return Err(self.tokens.invariant("Expected JSX tag name"));
        }
        let mut end = start + 1;
        while (self.tokens.matches_at(end, &[T::Dot]) || self.tokens.matches_at(end, &[T::Colon]))
            && self.tokens.matches_at(end + 1, &[T::JsxName])
        {
            end += 2;
        }
        let name: String = (start..end).map(|i| self.tokens.text_at(i)).collect();

        if is_component_tag(&name) {
            if !self.process_identifier() {
                self.tokens.copy_token();
            }
            while self.tokens.current_index() < end {
                self.tokens.copy_token();
            }
        } else {
            self.tokens.replace_token(quote(&name));
            while self.tokens.current_index() < end {
                self.tokens.remove_token();
            }
        }
        Ok(())
    }

    /// Classifies the attributes of the current tag without consuming them.
    fn scan_attributes(&self) -> Result<Vec<AttributeKind>, CompileError> {
        let tokens = self.tokens.tokens();
        let kind_at = |i: usize| tokens.get(i).map_or(T::Eof, |t| t.kind);
        let mut attributes = Vec::new();
        let mut index = self.tokens.current_index();
        loop {
            match kind_at(index) {
                T::Slash | T::JsxTagEnd => return Ok(attributes),
                T::BraceL => {
                    index = self.matching_brace(index)? + 1;
                    attributes.push(AttributeKind::Spread);
                }
                T::JsxName => {
                    let is_key = self.tokens.text_at(index) == "key" && kind_at(index + 1) != T::Colon;
                    index += 1;
                    if kind_at(index) == T::Colon {
                        index += 2;
                    }
                    if kind_at(index) == T::Eq {
                        index += 1;
                        index = match kind_at(index) {
                            T::String => index + 1,
                            T::BraceL => self.matching_brace(index)? + 1,
                            T::JsxTagStart => self.element_end(index)?,
                            _ => {
                                return Err(CompileError::invariant(
                                    "Expected JSX attribute value",
                                    tokens.get(index).map_or(0, |t| t.start()),
                                ))
                            }
                        };
                    }
                    attributes.push(if is_key {
                        AttributeKind::Key
                    } else {
                        AttributeKind::Named
                    });
                }
                _ => {
                    return Err(CompileError::invariant(
                        "Unexpected token in JSX tag",
                        tokens.get(index).map_or(0, |t| t.start()),
                    ))
                }
            }
        }
    }

    /// Index of the `}` closing the `{` at `index`.
    fn matching_brace(&self, index: usize) -> Result<usize, CompileError> {
        let mut depth = 0usize;
        for (i, token) in self.tokens.tokens().iter().enumerate().skip(index) {
            match token.kind {
                T::BraceL | T::DollarBraceL | T::BraceBarL => depth += 1,
                T::BraceR | T::BraceBarR => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(i);
                    }
                }
                _ => {}
            }
        }
        Err(self.tokens.invariant("Unbalanced braces in JSX"))
    }

    /// Index just past the element whose `<` is at `index`.
    fn element_end(&self, index: usize) -> Result<usize, CompileError> {
        let tokens = self.tokens.tokens();
        let kind_at = |i: usize| tokens.get(i).map_or(T::Eof, |t| t.kind);
        let mut depth = 0usize;
        let mut i = index;
        while i < tokens.len() {
            match kind_at(i) {
                T::JsxTagStart if kind_at(i + 1) == T::Slash => {
                    while i < tokens.len() && kind_at(i) != T::JsxTagEnd {
                        i += 1;
                    }
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(i + 1);
                    }
                }
                T::JsxTagStart => depth += 1,
                T::Slash if kind_at(i + 1) == T::JsxTagEnd => {
                    i += 1;
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(i + 1);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        Err(self.tokens.invariant("Unterminated JSX element"))
    }

    /// `name: value`, quoting names that are not identifiers.
    fn process_named_attribute(&mut self) -> Result<(), CompileError> {
        if self.tokens.matches(&[T::JsxName, T::Colon, T::JsxName]) {
            let index = self.tokens.current_index();
            let name = format!("{}:{}", self.tokens.text_at(index), self.tokens.text_at(index + 2));
            self.tokens.replace_token(quote(&name));
            self.tokens.remove_token();
            self.tokens.remove_token();
        } else {
            let name = self.tokens.current_text();
            if is_identifier(name) {
                self.tokens.copy_token();
            } else {
                self.tokens.replace_token(quote(name));
            }
        }

        if self.tokens.matches(&[T::Eq]) {
            self.tokens.replace_token(": ");
            self.process_attribute_value()
        } else {
            self.tokens.append_code(": true");
            Ok(())
        }
    }

    fn process_attribute_value(&mut self) -> Result<(), CompileError> {
        match self.tokens.current_token().kind {
            T::String => {
                let text = self.tokens.current_text();
                match jsx_string_value(text) {
                    Some(code) => self.tokens.replace_token(code),
                    None => self.tokens.copy_token(),
                }
                Ok(())
            }
            T::BraceL => {
                self.tokens.remove_token();
                self.process_balanced_code()?;
                self.remove_expected(T::BraceR)
            }
            T::JsxTagStart => self.process_jsx_element(),
            _ => Err(self.tokens.invariant("Expected JSX attribute value")),
        }
    }

    /// `{...expr}` as an object spread entry, or as a bare argument.
    fn process_spread_attribute(&mut self, as_entry: bool) -> Result<(), CompileError> {
        self.tokens.remove_initial_token();
        if as_entry {
            self.tokens.copy_expected_token(T::Ellipsis)?;
        } else {
            self.remove_expected(T::Ellipsis)?;
        }
        self.process_balanced_code()?;
        self.remove_expected(T::BraceR)
    }

    fn remove_expected(&mut self, kind: T) -> Result<(), CompileError> {
        if !self.tokens.matches(&[kind]) {
            return Err(self
                .tokens
                .invariant(format!("Expected token {}", kind.label())));
        }
        self.tokens.remove_token();
        Ok(())
    }

    /// Emits children up to the closing tag, each preceded by `, ` unless it is the
    /// first and `leading_comma` is off.
    fn process_children(&mut self, leading_comma: bool) -> Result<(), CompileError> {
        let mut needs_comma = leading_comma;
        loop {
            let index = self.tokens.current_index();
            match self.tokens.current_token().kind {
                T::JsxTagStart if self.tokens.matches_at(index + 1, &[T::Slash]) => return Ok(()),
                T::JsxTagStart => {
                    if needs_comma {
                        self.tokens.append_code(", ");
                    }
                    self.process_jsx_element()?;
                    needs_comma = true;
                }
                T::JsxText => {
                    let text = self.tokens.current_text();
                    let line_breaks: String = text.chars().filter(|&c| c == '\n').collect();
                    let cleaned = clean_jsx_text(text);
                    if cleaned.is_empty() {
                        self.tokens.remove_token();
                        continue;
                    }
                    let literal = serde_json::to_string(&cleaned)
                        .map_err(|error| self.tokens.invariant(error.to_string()))?;
                    let separator = if needs_comma { ", " } else { "" };
                    self.tokens
                        .replace_token(format!("{separator}{literal}{line_breaks}"));
                    needs_comma = true;
                }
                T::JsxEmptyText => self.tokens.remove_token(),
                T::BraceL if self.tokens.matches(&[T::BraceL, T::BraceR]) => {
                    self.tokens.remove_token();
                    self.tokens.remove_token();
                }
                T::BraceL => {
                    self.tokens
                        .replace_token(if needs_comma { ", " } else { "" });
                    self.process_balanced_code()?;
                    self.remove_expected(T::BraceR)?;
                    needs_comma = true;
                }
                _ => return Err(self.tokens.invariant("Unexpected token in JSX children")),
            }
        }
    }

    /// Removes `</name>`, replacing its `>` with `close`.
    fn process_closing_tag(&mut self, close: &str) -> Result<(), CompileError> {
        self.remove_expected(T::JsxTagStart)?;
        self.remove_expected(T::Slash)?;
        while !self.tokens.matches(&[T::JsxTagEnd]) {
            if self.tokens.is_at_end() {
                return Err(self.tokens.invariant("Unterminated JSX closing tag"));
            }
            self.tokens.remove_token();
        }
        self.tokens.replace_token(close);
        Ok(())
    }
}

/// Collapses JSX text the way React does: lines are trimmed, blank lines dropped,
/// and the remaining lines joined with single spaces. Entities are decoded.
pub(crate) fn clean_jsx_text(text: &str) -> String {
    let mut result = String::new();
    let mut whitespace = String::new();
    let mut in_initial_whitespace = false;
    let mut seen_non_whitespace = false;
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        rest = &rest[ch.len_utf8()..];
        match ch {
            ' ' | '\t' | '\r' => {
                if !in_initial_whitespace {
                    whitespace.push(ch);
                }
            }
            '\n' => {
                whitespace.clear();
                in_initial_whitespace = true;
            }
            _ => {
                if seen_non_whitespace && in_initial_whitespace {
                    result.push(' ');
                }
                result.push_str(&whitespace);
                whitespace.clear();
                match ch {
                    '&' => match decode_entity(rest) {
                        Some((decoded, consumed)) => {
                            result.push(decoded);
                            rest = &rest[consumed..];
                        }
                        None => result.push('&'),
                    },
                    _ => result.push(ch),
                }
                seen_non_whitespace = true;
                in_initial_whitespace = false;
            }
        }
    }
    if !in_initial_whitespace {
        result.push_str(&whitespace);
    }
    result
}

/// A double-quoted replacement for a string attribute whose value spans lines or
/// contains entities; `None` when the literal can be copied.
fn jsx_string_value(literal: &str) -> Option<String> {
    let value = literal.get(1..literal.len().saturating_sub(1))?;
    if !value.contains('\n') && !value.contains('&') {
        return None;
    }
    let mut result = String::new();
    let mut rest = value;
    while let Some(ch) = rest.chars().next() {
        rest = &rest[ch.len_utf8()..];
        match ch {
            '\n' if rest.starts_with(char::is_whitespace) => {
                result.push(' ');
                rest = rest.trim_start();
            }
            '&' => match decode_entity(rest) {
                Some((decoded, consumed)) => {
                    result.push(decoded);
                    rest = &rest[consumed..];
                }
                None => result.push('&'),
            },
            _ => result.push(ch),
        }
    }
    let line_breaks: String = value.chars().filter(|&c| c == '\n').collect();
    let quoted = serde_json::to_string(&result).ok()?;
    Some(format!("{quoted}{line_breaks}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean_jsx_text() {
        assert_eq!(clean_jsx_text("Hello "), "Hello ");
        assert_eq!(clean_jsx_text("\n    Hello\n    world\n  "), "Hello world");
        assert_eq!(clean_jsx_text("\n   \n"), "");
        assert_eq!(clean_jsx_text(" a &amp; b "), " a & b ");
        assert_eq!(clean_jsx_text("&#x41;&bogus;"), "A&bogus;");
    }

    #[test]
    fn test_jsx_string_value() {
        assert_eq!(jsx_string_value("\"plain\""), None);
        assert_eq!(jsx_string_value("'a &lt; b'"), Some("\"a < b\"".to_string()));
        assert_eq!(
            jsx_string_value("\"one\n   two\""),
            Some("\"one two\"\n".to_string())
        );
    }
}
