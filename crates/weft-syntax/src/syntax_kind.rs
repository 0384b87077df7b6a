//! Kinds and policies attached to tree nodes.
//!
//! Blocks are tagged with a [`BlockKind`] and spans with a [`SpanKind`]. Every
//! span also records which characters it will accept at its boundary
//! ([`AcceptedCharacters`]) and how an editor may treat edits inside it
//! ([`EditHandler`]).

use std::fmt;

/// Semantic tag of a composite [`Block`](crate::tree::Block).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockKind {
    /// Literal template text, including nested tags inside code
    Markup,
    /// `@{ ... }` blocks and keyword statements (`@if`, `@foreach`, ...)
    Statement,
    /// Implicit (`@name`) and explicit (`@(...)`) expressions
    Expression,
    /// `@inherits`, `@using`, `@functions`
    Directive,
    /// `@* ... *@`
    Comment,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Classification of a leaf [`Span`](crate::tree::Span).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpanKind {
    /// The `@` transition, or a `<text>` wrapper tag
    Transition,
    /// Delimiters and keywords that belong to the template language itself
    MetaCode,
    /// Body of a `@* ... *@` comment
    Comment,
    /// Embedded code
    Code,
    /// Literal markup
    Markup,
}

impl fmt::Display for SpanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Which characters a span accepts at its trailing boundary.
///
/// This decides whether whitespace next to a transition stays with the span
/// or belongs to its neighbour, and tells incremental tooling whether typing
/// at the end of the span can extend it without a reparse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AcceptedCharacters {
    #[default]
    None,
    NewLine,
    WhiteSpace,
    NonWhiteSpace,
    AllWhiteSpace,
    AnyExceptNewline,
    Any,
}

impl AcceptedCharacters {
    /// Whether a character typed at the end of the span may extend it.
    pub fn accepts(self, c: char) -> bool {
        let newline = c == '\n' || c == '\r';
        match self {
            AcceptedCharacters::None => false,
            AcceptedCharacters::NewLine => newline,
            AcceptedCharacters::WhiteSpace => c.is_whitespace() && !newline,
            AcceptedCharacters::NonWhiteSpace => !c.is_whitespace(),
            AcceptedCharacters::AllWhiteSpace => c.is_whitespace(),
            AcceptedCharacters::AnyExceptNewline => !newline,
            AcceptedCharacters::Any => true,
        }
    }
}

/// How tooling may treat edits inside a span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EditHandler {
    #[default]
    Default,
    /// Code of an implicit expression such as `@user.Name`.
    ///
    /// `accept_trailing_dot` is set in design-time mode, where `@user.` keeps
    /// the dot inside the expression so completion has something to anchor to.
    ImplicitExpression { accept_trailing_dot: bool },
}
