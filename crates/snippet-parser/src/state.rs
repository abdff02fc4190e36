//! Tokenizer state and snapshots for speculative parsing.

use crate::error::ParseError;
use crate::token::{ContextualKeyword, TokenKind};

/// The cursor over the input plus the token currently being looked at.
///
/// The current token is not yet in the token array; it is pushed when the parser
/// advances past it.
#[derive(Debug, Clone, Default)]
pub(crate) struct State {
    pub pos: usize,
    pub kind: TokenKind,
    pub contextual_keyword: ContextualKeyword,
    pub start: usize,
    pub end: usize,
    /// End of the most recently pushed token, for line-break checks.
    pub last_token_end: usize,
    pub is_type: bool,
    pub scope_depth: u32,
    /// Sticky: once set, every read produces `Eof`.
    pub error: Option<ParseError>,
}

/// A value copy of the parser position. Restoring it truncates the token and scope
/// arrays back to their lengths at capture time.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    pub state: State,
    pub tokens_len: usize,
    pub scopes_len: usize,
}
