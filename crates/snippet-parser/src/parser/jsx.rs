//! JSX elements.
//!
//! Elements are scanned with the JSX tag and child tokenizers. After an element is
//! parsed the current token is its final `>`, which the caller consumes in whatever
//! mode comes next (expression, attribute or child).

use super::Parser;
use crate::error::ParseErrorKind;
use crate::token::{IdentifierRole, JsxRole, TokenKind as T};

/// Whether a tag name refers to a component (an expression) rather than an intrinsic
/// element (a string).
pub fn is_component_tag(name: &str) -> bool {
    if name.contains(':') {
        return false;
    }
    name.contains('.') || name.chars().next().is_some_and(|ch| !ch.is_lowercase())
}

impl<'src> Parser<'src> {
    /// Parses an element starting at the current `<` in expression position.
    pub(crate) fn parse_jsx_element(&mut self) {
        self.state.kind = T::JsxTagStart;
        let start = self.tokens.len();
        self.next_jsx_tag_token();
        self.parse_jsx_element_at(start);
    }

    /// Parses the rest of an element whose `<` was pushed at `start`.
    fn parse_jsx_element_at(&mut self, start: usize) {
        let name = if self.is(T::JsxTagEnd) {
            None
        } else {
            Some(self.parse_jsx_element_name(true))
        };

        let mut saw_spread = false;
        let mut key_after_spread = false;
        if name.is_some() {
            while !self.is(T::Slash) && !self.is(T::JsxTagEnd) && !self.has_error() {
                if self.is(T::BraceL) {
                    saw_spread = true;
                    self.next();
                    self.expect(T::Ellipsis);
                    self.parse_maybe_assign(false);
                    if !self.is(T::BraceR) {
                        self.unexpected_expecting("}");
                        return;
                    }
                    self.next_jsx_tag_token();
                } else {
                    if saw_spread && self.current_text() == "key" {
                        key_after_spread = true;
                    }
                    self.parse_jsx_attribute();
                }
            }
        }

        if self.is(T::Slash) {
            self.next_jsx_tag_token();
            if !self.is(T::JsxTagEnd) {
                self.unexpected_expecting(">");
                return;
            }
            let role = if key_after_spread {
                JsxRole::KeyAfterPropSpread
            } else {
                JsxRole::NoChildren
            };
            self.tokens[start].jsx_role = Some(role);
            return;
        }
        if !self.is(T::JsxTagEnd) {
            self.unexpected_expecting(">");
            return;
        }

        let mut children = 0usize;
        loop {
            self.next_jsx_expr_token();
            match self.state.kind {
                T::JsxTagStart => {
                    let child_start = self.tokens.len();
                    self.next_jsx_tag_token();
                    if self.is(T::Slash) {
                        self.parse_jsx_closing_tag(name.as_deref());
                        break;
                    }
                    self.parse_jsx_element_at(child_start);
                    children += 1;
                }
                T::JsxText => children += 1,
                T::JsxEmptyText => {}
                T::BraceL => {
                    self.next();
                    if self.eat(T::Ellipsis) {
                        self.parse_expression();
                        children += 2;
                    } else if !self.is(T::BraceR) {
                        self.parse_expression();
                        children += 1;
                    }
                    if !self.is(T::BraceR) {
                        self.unexpected_expecting("}");
                        return;
                    }
                }
                _ => return,
            }
            if self.has_error() {
                return;
            }
        }

        let role = match (key_after_spread, children) {
            (true, _) => JsxRole::KeyAfterPropSpread,
            (false, 0) => JsxRole::NoChildren,
            (false, 1) => JsxRole::OneChild,
            (false, _) => JsxRole::StaticChildren,
        };
        self.tokens[start].jsx_role = Some(role);
    }

    /// `</name>`, with the current token at `/`. Leaves the closing `>` current.
    fn parse_jsx_closing_tag(&mut self, expected: Option<&str>) {
        let tag_start = self.state.start;
        self.next_jsx_tag_token();
        let found = if self.is(T::JsxTagEnd) {
            None
        } else {
            Some(self.parse_jsx_element_name(false))
        };
        if self.has_error() {
            return;
        }
        if found.as_deref() != expected {
            let end = self.state.end;
            self.raise_at(
                ParseErrorKind::MismatchedClosingTag {
                    expected: expected.unwrap_or_default().to_string(),
                    found: found.unwrap_or_default(),
                },
                tag_start,
                end,
            );
            return;
        }
        if !self.is(T::JsxTagEnd) {
            self.unexpected_expecting(">");
        }
    }

    /// Parses `a`, `a.b.c` or `a:b` and returns the name as written without spaces.
    ///
    /// In an opening tag, the first segment of a component name is an identifier access.
    fn parse_jsx_element_name(&mut self, is_opening: bool) -> String {
        let first = self.tokens.len();
        if !self.is(T::JsxName) {
            self.unexpected_expecting("JSX element name");
            return String::new();
        }
        let mut name = self.current_text().to_string();
        self.next_jsx_tag_token();
        if self.is(T::Colon) {
            self.next_jsx_tag_token();
            name.push(':');
            name.push_str(self.current_text());
            self.expect_jsx_name();
        } else {
            while self.is(T::Dot) {
                self.next_jsx_tag_token();
                name.push('.');
                name.push_str(self.current_text());
                self.expect_jsx_name();
            }
        }
        if is_opening && is_component_tag(&name) {
            self.set_role(first, IdentifierRole::Access);
        }
        name
    }

    fn expect_jsx_name(&mut self) {
        if self.is(T::JsxName) {
            self.next_jsx_tag_token();
        } else {
            self.unexpected_expecting("JSX identifier");
        }
    }

    /// `name`, `name="x"`, `name={expr}`, `name=<el/>` or `ns:name=...`.
    fn parse_jsx_attribute(&mut self) {
        if !self.is(T::JsxName) {
            self.unexpected_expecting("JSX attribute");
            return;
        }
        self.next_jsx_tag_token();
        if self.is(T::Colon) {
            self.next_jsx_tag_token();
            self.expect_jsx_name();
        }
        if !self.is(T::Eq) {
            return;
        }
        self.next_jsx_tag_token();
        match self.state.kind {
            T::String => self.next_jsx_tag_token(),
            T::BraceL => {
                self.next();
                self.parse_maybe_assign(false);
                if !self.is(T::BraceR) {
                    self.unexpected_expecting("}");
                    return;
                }
                self.next_jsx_tag_token();
            }
            T::JsxTagStart => {
                let start = self.tokens.len();
                self.next_jsx_tag_token();
                self.parse_jsx_element_at(start);
                self.next_jsx_tag_token();
            }
            _ => self.unexpected_expecting("JSX attribute value"),
        }
    }
}
