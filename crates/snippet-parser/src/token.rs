//! Token, scope and statement records produced by the parser.

use source_map::Span;

/// Token kinds.
///
/// Keywords that can also be plain identifiers (`async`, `type`, `of`, ...) are
/// [`TokenKind::Name`] tokens carrying a [`ContextualKeyword`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenKind {
    // === Literals ===
    Num,
    BigInt,
    String,
    Regexp,
    /// A raw chunk of a template literal between `` ` ``, `${` and `}`.
    Template,
    Name,
    /// `#name`
    PrivateName,
    #[default]
    Eof,

    // === Punctuation ===
    BracketL,
    BracketR,
    BraceL,
    /// `{|` (Flow exact object)
    BraceBarL,
    BraceR,
    /// `|}` (Flow exact object)
    BraceBarR,
    ParenL,
    ParenR,
    Comma,
    Semi,
    Colon,
    Dot,
    Question,
    QuestionDot,
    Arrow,
    Ellipsis,
    BackQuote,
    DollarBraceL,
    At,

    // === Operators ===
    Eq,
    /// Compound assignment: `+=`, `&&=`, `>>>=`, ...
    Assign,
    IncDec,
    Bang,
    Tilde,
    NullishCoalescing,
    LogicalOr,
    LogicalAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,
    Equality,
    LessThan,
    GreaterThan,
    RelationalOrEqual,
    BitShiftL,
    /// `>>` and `>>>`
    BitShiftR,
    PlusMin,
    Modulo,
    Star,
    Slash,
    Exponent,

    // === JSX ===
    JsxName,
    JsxText,
    /// Whitespace-only text containing a line break; not a child.
    JsxEmptyText,
    JsxTagStart,
    JsxTagEnd,

    // === Keywords ===
    Break,
    Case,
    Catch,
    Continue,
    Debugger,
    Default,
    Do,
    Else,
    Finally,
    For,
    Function,
    If,
    Return,
    Switch,
    Throw,
    Try,
    Var,
    Let,
    Const,
    While,
    With,
    New,
    This,
    Super,
    Class,
    Extends,
    Export,
    Import,
    Yield,
    Null,
    True,
    False,
    In,
    Instanceof,
    Typeof,
    Void,
    Delete,
}

impl TokenKind {
    /// Reserved words. These may still be used as property names.
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Break
                | Case
                | Catch
                | Continue
                | Debugger
                | Default
                | Do
                | Else
                | Finally
                | For
                | Function
                | If
                | Return
                | Switch
                | Throw
                | Try
                | Var
                | Let
                | Const
                | While
                | With
                | New
                | This
                | Super
                | Class
                | Extends
                | Export
                | Import
                | Yield
                | Null
                | True
                | False
                | In
                | Instanceof
                | Typeof
                | Void
                | Delete
        )
    }

    /// Operators that take a left and a right operand (excluding assignment).
    pub fn is_binary_operator(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            NullishCoalescing
                | LogicalOr
                | LogicalAnd
                | BitwiseOr
                | BitwiseXor
                | BitwiseAnd
                | Equality
                | LessThan
                | GreaterThan
                | RelationalOrEqual
                | BitShiftL
                | BitShiftR
                | PlusMin
                | Modulo
                | Star
                | Slash
                | Exponent
                | In
                | Instanceof
        )
    }

    #[inline]
    pub fn is_assign(self) -> bool {
        matches!(self, TokenKind::Eq | TokenKind::Assign)
    }

    /// Whether a token of this kind can end an expression, so that a following `/`
    /// is division and a following `<` is not a JSX tag.
    pub fn ends_expression(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Num | BigInt
                | String
                | Regexp
                | Name
                | PrivateName
                | BracketR
                | BraceR
                | ParenR
                | BackQuote
                | IncDec
                | This
                | Super
                | Null
                | True
                | False
                | JsxTagEnd
        )
    }

    /// A short human-readable label used in diagnostics.
    pub fn label(self) -> &'static str {
        use TokenKind::*;
        match self {
            Num | BigInt => "number",
            String => "string",
            Regexp => "regular expression",
            Template => "template",
            Name => "name",
            PrivateName => "private name",
            Eof => "end of input",
            BracketL => "[",
            BracketR => "]",
            BraceL => "{",
            BraceBarL => "{|",
            BraceR => "}",
            BraceBarR => "|}",
            ParenL => "(",
            ParenR => ")",
            Comma => ",",
            Semi => ";",
            Colon => ":",
            Dot => ".",
            Question => "?",
            QuestionDot => "?.",
            Arrow => "=>",
            Ellipsis => "...",
            BackQuote => "`",
            DollarBraceL => "${",
            At => "@",
            Eq => "=",
            Assign => "_=",
            IncDec => "++/--",
            Bang => "!",
            Tilde => "~",
            NullishCoalescing => "??",
            LogicalOr => "||",
            LogicalAnd => "&&",
            BitwiseOr => "|",
            BitwiseXor => "^",
            BitwiseAnd => "&",
            Equality => "==/!=",
            LessThan => "<",
            GreaterThan => ">",
            RelationalOrEqual => "<=/>=",
            BitShiftL => "<<",
            BitShiftR => ">>",
            PlusMin => "+/-",
            Modulo => "%",
            Star => "*",
            Slash => "/",
            Exponent => "**",
            JsxName => "jsx name",
            JsxText | JsxEmptyText => "jsx text",
            JsxTagStart => "jsx tag start",
            JsxTagEnd => "jsx tag end",
            Break => "break",
            Case => "case",
            Catch => "catch",
            Continue => "continue",
            Debugger => "debugger",
            Default => "default",
            Do => "do",
            Else => "else",
            Finally => "finally",
            For => "for",
            Function => "function",
            If => "if",
            Return => "return",
            Switch => "switch",
            Throw => "throw",
            Try => "try",
            Var => "var",
            Let => "let",
            Const => "const",
            While => "while",
            With => "with",
            New => "new",
            This => "this",
            Super => "super",
            Class => "class",
            Extends => "extends",
            Export => "export",
            Import => "import",
            Yield => "yield",
            Null => "null",
            True => "true",
            False => "false",
            In => "in",
            Instanceof => "instanceof",
            Typeof => "typeof",
            Void => "void",
            Delete => "delete",
        }
    }
}

/// Identifiers that act as keywords only in some positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContextualKeyword {
    #[default]
    None,
    Abstract,
    Accessor,
    As,
    Assert,
    Asserts,
    Async,
    Await,
    Constructor,
    Declare,
    Enum,
    Exports,
    From,
    Get,
    Global,
    Implements,
    Infer,
    Interface,
    Is,
    Keyof,
    Mixins,
    Module,
    Namespace,
    Of,
    Opaque,
    Out,
    Override,
    Private,
    Protected,
    Public,
    Readonly,
    Require,
    Satisfies,
    Set,
    Static,
    Symbol,
    Type,
    Unique,
    Using,
}

/// How an identifier token is used, as far as the transforms care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IdentifierRole {
    Access,
    /// A local name in `export { a as b }`.
    ExportAccess,
    TopLevelDeclaration,
    FunctionScopedDeclaration,
    BlockScopedDeclaration,
    ObjectShorthandTopLevelDeclaration,
    ObjectShorthandFunctionScopedDeclaration,
    ObjectShorthandBlockScopedDeclaration,
    /// `{ a }` in an expression.
    ObjectShorthand,
    /// The local binding of an import specifier.
    ImportDeclaration,
    /// The imported name in `import { a as b }`.
    ImportAccess,
    ObjectKey,
}

impl IdentifierRole {
    pub fn is_declaration(self) -> bool {
        use IdentifierRole::*;
        matches!(
            self,
            TopLevelDeclaration
                | FunctionScopedDeclaration
                | BlockScopedDeclaration
                | ObjectShorthandTopLevelDeclaration
                | ObjectShorthandFunctionScopedDeclaration
                | ObjectShorthandBlockScopedDeclaration
                | ImportDeclaration
        )
    }

    pub fn is_top_level_declaration(self) -> bool {
        matches!(
            self,
            IdentifierRole::TopLevelDeclaration | IdentifierRole::ObjectShorthandTopLevelDeclaration
        )
    }

    pub fn is_block_scoped_declaration(self) -> bool {
        matches!(
            self,
            IdentifierRole::BlockScopedDeclaration
                | IdentifierRole::ObjectShorthandBlockScopedDeclaration
        )
    }

    pub fn is_function_scoped_declaration(self) -> bool {
        matches!(
            self,
            IdentifierRole::FunctionScopedDeclaration
                | IdentifierRole::ObjectShorthandFunctionScopedDeclaration
        )
    }

    pub fn is_object_shorthand(self) -> bool {
        matches!(
            self,
            IdentifierRole::ObjectShorthand
                | IdentifierRole::ObjectShorthandTopLevelDeclaration
                | IdentifierRole::ObjectShorthandFunctionScopedDeclaration
                | IdentifierRole::ObjectShorthandBlockScopedDeclaration
        )
    }
}

/// Shape of a JSX element's children, stored on its opening `<` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JsxRole {
    NoChildren,
    OneChild,
    StaticChildren,
    /// A `key` prop follows a spread prop; the automatic runtime cannot express it.
    KeyAfterPropSpread,
}

/// A classified, positioned unit of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    pub kind: TokenKind,
    pub contextual_keyword: ContextualKeyword,
    pub span: Span,
    pub scope_depth: u32,
    /// Set for tokens inside a type-only construct; they are removed from output.
    pub is_type: bool,
    pub identifier_role: Option<IdentifierRole>,
    pub jsx_role: Option<JsxRole>,
    pub shadows_global: bool,
    /// Index of the first token after the right-hand side or declaration this token opens.
    pub rhs_end_index: Option<usize>,
}

impl Token {
    #[inline]
    pub fn start(&self) -> usize {
        self.span.start_usize()
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.span.end_usize()
    }

    #[inline]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    #[inline]
    pub fn is_contextual(&self, keyword: ContextualKeyword) -> bool {
        self.kind == TokenKind::Name && self.contextual_keyword == keyword
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}

/// A lexical scope as a half-open range of token indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scope {
    pub start_token_index: usize,
    pub end_token_index: usize,
    pub is_function_scope: bool,
}

/// Coarse classification of a top-level statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatementKind {
    Expression,
    /// `var`/`let`/`const`, function, class or enum declarations.
    Declaration,
    /// Interfaces, type aliases, `declare` and other constructs erased entirely.
    TypeOnly,
    Import,
    ExportDefault,
    /// Any other `export` statement.
    Export,
    Return,
    Empty,
    Other,
}

/// Token range of one top-level statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TopLevelStatement {
    pub kind: StatementKind,
    pub start: usize,
    /// Exclusive end token index.
    pub end: usize,
    /// For expression statements, the exclusive end of the expression (before any `;`).
    pub expression_end: usize,
}
