//! Returning the value of the last top-level expression.
//!
//! Snippets run as the body of a function, so the value of a trailing expression
//! statement is only observable if it is returned. The plan is computed up front
//! from the statement list and applied by the root transform while it emits tokens.

use snippet_parser::{StatementKind, Token, TokenKind, TopLevelStatement};

/// Where to insert `return (` and the matching `)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapPlan {
    /// Token index of the first token of the expression statement.
    pub start: usize,
    /// Exclusive end of the expression, before any `;`.
    pub expression_end: usize,
    /// The preceding token is not a `;`, so the return starts a fresh statement.
    pub needs_separator: bool,
    pub has_semicolon: bool,
}

impl WrapPlan {
    /// Ends the previous statement when it has no `;` of its own.
    pub fn separator(&self) -> &'static str {
        if self.needs_separator {
            ";\n"
        } else {
            ""
        }
    }

    /// Opens the return. Engines report errors in the returned expression at the
    /// start of this text, so it is mapped to the expression start.
    pub fn opening(&self) -> &'static str {
        "return ("
    }

    pub fn suffix(&self) -> &'static str {
        if self.has_semicolon {
            ")"
        } else {
            ");"
        }
    }
}

/// Picks the last top-level expression statement that is still the last thing
/// evaluated. Returns `None` when the snippet returns or exports on its own.
pub fn plan_wrap(source: &str, tokens: &[Token], statements: &[TopLevelStatement]) -> Option<WrapPlan> {
    let mut candidate = None;
    for statement in statements {
        match statement.kind {
            StatementKind::Return | StatementKind::ExportDefault => {
                tracing::debug!(kind = ?statement.kind, "snippet produces its own result");
                return None;
            }
            StatementKind::Expression if assigns_exports(source, tokens, statement) => {
                tracing::debug!("snippet assigns to exports");
                return None;
            }
            StatementKind::Expression => candidate = Some(*statement),
            StatementKind::Declaration
            | StatementKind::TypeOnly
            | StatementKind::Import
            | StatementKind::Export
            | StatementKind::Empty => {}
            StatementKind::Other => candidate = None,
        }
    }

    let statement = candidate?;
    let needs_separator = statement
        .start
        .checked_sub(1)
        .and_then(|i| tokens.get(i))
        .map_or(true, |t| t.kind != TokenKind::Semi);
    Some(WrapPlan {
        start: statement.start,
        expression_end: statement.expression_end,
        needs_separator,
        has_semicolon: statement.expression_end < statement.end,
    })
}

fn assigns_exports(source: &str, tokens: &[Token], statement: &TopLevelStatement) -> bool {
    let Some(first) = tokens.get(statement.start) else {
        return false;
    };
    first.kind == TokenKind::Name
        && first.text(source) == "exports"
        && tokens
            .get(statement.start + 1)
            .is_some_and(|t| matches!(t.kind, TokenKind::Dot | TokenKind::BracketL))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use snippet_parser::{parse, ParseOptions};

    fn plan(source: &str) -> Option<WrapPlan> {
        let stream = parse(source, ParseOptions::default()).unwrap();
        plan_wrap(source, &stream.tokens, &stream.statements)
    }

    #[test]
    fn test_last_expression() {
        assert_eq!(
            plan("let a = 1;\na + 1;"),
            Some(WrapPlan {
                start: 5,
                expression_end: 8,
                needs_separator: false,
                has_semicolon: true,
            })
        );
    }

    #[test]
    fn test_first_statement_needs_separator() {
        let plan = plan("foo()").unwrap();
        assert!(plan.needs_separator);
        assert!(!plan.has_semicolon);
        assert_eq!(plan.separator(), ";\n");
        assert_eq!(plan.opening(), "return (");
        assert_eq!(plan.suffix(), ");");
    }

    #[test]
    fn test_declarations_keep_candidate() {
        assert_eq!(plan("a;\nfunction f() {}").map(|p| p.start), Some(0));
    }

    #[test]
    fn test_control_flow_resets_candidate() {
        assert_eq!(plan("a;\nif (b) c;"), None);
        assert_eq!(plan("if (b) c;\na;").map(|p| p.start), Some(6));
    }

    #[test]
    fn test_disqualified() {
        assert_eq!(plan("return <span />;\n<div />;"), None);
        assert_eq!(plan("exports.a = 1;\na;"), None);
        assert_eq!(plan("a;\nexport default b;"), None);
    }
}
