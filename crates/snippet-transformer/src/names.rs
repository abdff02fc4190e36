//! Collision-free synthetic identifiers.

use rustc_hash::FxHashSet;
use snippet_parser::{Token, TokenKind};

/// Hands out identifiers of the form `base$N` that no snippet identifier uses.
#[derive(Debug, Default)]
pub struct NameManager {
    used: FxHashSet<String>,
}

impl NameManager {
    /// Reserves every identifier that appears in the snippet.
    pub fn new(source: &str, tokens: &[Token]) -> Self {
        let used = tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::Name | TokenKind::JsxName))
            .map(|t| t.text(source).to_string())
            .collect();
        Self { used }
    }

    /// Returns the first free `base$N`, counting from zero, and reserves it.
    pub fn claim_free_name(&mut self, base: &str) -> String {
        let base = sanitize(base);
        let mut n = 0usize;
        loop {
            let candidate = format!("{base}${n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.used.contains(name)
    }
}

/// A readable identifier base for an import path: the last segment without its
/// extension, camel-cased (`./foo` → `foo`, `@scope/pkg-name` → `pkgName`).
pub fn base_name_for_path(path: &str) -> String {
    let segment = path
        .trim_end_matches('/')
        .rsplit('/')
        .find(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or_default();
    let stem = match segment.rfind('.') {
        Some(dot) if dot > 0 => &segment[..dot],
        _ => segment,
    };
    sanitize(stem)
}

fn sanitize(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len());
    let mut upper_next = false;
    for ch in raw.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == '$' {
            if upper_next && !name.is_empty() {
                name.extend(ch.to_uppercase());
            } else {
                name.push(ch);
            }
            upper_next = false;
        } else {
            upper_next = true;
        }
    }
    if name.is_empty() {
        return "module".to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Whether `name` can be written as a bare identifier or after a `.`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_base_name_for_path() {
        assert_eq!(base_name_for_path("./foo"), "foo");
        assert_eq!(base_name_for_path("react"), "react");
        assert_eq!(base_name_for_path("@scope/pkg-name"), "pkgName");
        assert_eq!(base_name_for_path("../components/Button.tsx"), "Button");
        assert_eq!(base_name_for_path("react/jsx-runtime"), "jsxRuntime");
        assert_eq!(base_name_for_path("./"), "module");
        assert_eq!(base_name_for_path("./3d"), "_3d");
    }

    #[test]
    fn test_claim_skips_used_names() {
        let mut names = NameManager::default();
        names.used.insert("foo$0".to_string());
        assert_eq!(names.claim_free_name("foo"), "foo$1");
        assert_eq!(names.claim_free_name("foo"), "foo$2");
        assert_eq!(names.claim_free_name("bar"), "bar$0");
        assert!(names.is_used("bar$0"));
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("default"));
        assert!(is_identifier("$a_1"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier("1a"));
        assert!(!is_identifier(""));
    }
}
