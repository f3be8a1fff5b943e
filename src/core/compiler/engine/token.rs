//! Markup token definitions.
//!
//! Every token remembers the byte range it was read from, so any run of
//! tokens can be turned back into the exact source text it covers.

use std::fmt;
use std::ops::Range;

/// Characters that a backslash turns into literal text.
pub const ESCAPABLE: &[char] = &['$', '#', '%', '&', '_', '{', '}', '~', '^', '\\'];

/// The category of a markup token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A command like `\textbf`. The string does NOT include the backslash.
    ControlSeq(String),

    /// A backslash followed by an escapable character, e.g. `\$` or `\\`.
    Escaped(char),

    /// A backslash followed by anything else (`\,`, `\ `, a lone `\`).
    ControlSymbol(Option<char>),

    /// Begin group token `{`
    BeginGroup,

    /// End group token `}`
    EndGroup,

    /// Inline math shift `$`
    MathShift,

    /// Display math shift `$$`
    DisplayMathShift,

    /// Alignment tab `&`
    AlignTab,

    /// `#`, significant only at the start of a line
    Hash,

    /// A run of spaces and tabs
    Space,

    /// A single line break (`\n` or `\r\n`)
    Newline,

    /// A run of ordinary characters
    Text,
}

/// A token together with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
    /// For a `{`, how many tokens ahead its matching `}` sits. Filled in by
    /// [`tokenize`](super::lexer::tokenize).
    pub group_len: Option<usize>,
}

impl Token {
    pub fn new(kind: TokenKind, span: Range<usize>) -> Self {
        Token {
            kind,
            span,
            group_len: None,
        }
    }

    /// Returns true for spaces and line breaks
    pub fn is_whitespace(&self) -> bool {
        matches!(self.kind, TokenKind::Space | TokenKind::Newline)
    }

    /// Returns true if this token is a begin group `{`
    pub fn is_begin_group(&self) -> bool {
        matches!(self.kind, TokenKind::BeginGroup)
    }

    /// Returns true if this token is an end group `}`
    pub fn is_end_group(&self) -> bool {
        matches!(self.kind, TokenKind::EndGroup)
    }

    /// Returns the command name if this is a ControlSeq token
    pub fn as_control_seq(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::ControlSeq(name) => Some(name),
            _ => None,
        }
    }

    /// Check if this is a specific command
    pub fn is_cs(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::ControlSeq(n) if n == name)
    }

    /// The source text of this token.
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.span.clone()]
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::ControlSeq(name) => write!(f, "\\{}", name),
            TokenKind::Escaped(c) => write!(f, "\\{}", c),
            TokenKind::ControlSymbol(Some(c)) => write!(f, "\\{}", c),
            TokenKind::ControlSymbol(None) => write!(f, "\\"),
            TokenKind::BeginGroup => write!(f, "{{"),
            TokenKind::EndGroup => write!(f, "}}"),
            TokenKind::MathShift => write!(f, "$"),
            TokenKind::DisplayMathShift => write!(f, "$$"),
            TokenKind::AlignTab => write!(f, "&"),
            TokenKind::Hash => write!(f, "#"),
            TokenKind::Space => write!(f, "space"),
            TokenKind::Newline => write!(f, "newline"),
            TokenKind::Text => write!(f, "text"),
        }
    }
}
