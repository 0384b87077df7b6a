//! # Parser - Event-Based Tree Construction
//!
//! Templates interleave two languages, so parsing is split between two
//! grammars that hand control back and forth through one shared
//! [`ParseContext`]:
//!
//! ```text
//! foo @bar baz
//! └─┬┘└┬┘└─┬─┘
//!   │  │   └── markup grammar again
//!   │  └────── code grammar (entered at "@")
//!   └───────── markup grammar
//! ```
//!
//! The markup grammar calls [`ParseContext::enter_code_mode`] when it meets a
//! transition. The code grammar calls [`ParseContext::enter_markup_mode`] when
//! a tag opens where a statement could start. Each call returns once the
//! embedded region ends, so nesting is plain recursion.
//!
//! ## Events and Markers
//!
//! Neither grammar builds nodes. They move a cursor over the source, cut
//! spans with [`ParseContext::output_span`], and open blocks with
//! [`ParseContext::start_block`], which hands out a [`Marker`]:
//!
//! ```ignore
//! let m = ctx.start_block();     // reserve a slot for the block
//! ctx.bump(1);
//! ctx.output_span(SpanKind::Transition, AcceptedCharacters::None, None);
//! m.complete(ctx, BlockKind::Expression);   // MUST complete
//! ```
//!
//! Dropping a marker without completing it panics. The resulting flat
//! [`Event`] list is replayed by the [`Sink`] into a
//! [`TreeBuilder`](crate::builder::TreeBuilder).
//!
//! ## Module Structure
//!
//! - [`event`] - The Event enum
//! - [`sink`] - Converts events to the Block/Span tree
//! - `grammar` - Markup and code grammar rules

pub mod event;
pub mod sink;

mod grammar;

use codespan_reporting::diagnostic::Severity;
use rowan::TextRange;
use thiserror::Error;

use crate::builder::TreeError;
use crate::chunks::ChunkGenerator;
use crate::diagnostic::Diagnostic;
use crate::lexer::{CodeToken, MarkupToken, Token, code_tokens, markup_tokens};
use crate::source::{SourceError, SourceText};
use crate::syntax_kind::{AcceptedCharacters, BlockKind, EditHandler, SpanKind};
use crate::tree::{SyntaxTree, text_size};
use event::{Event, SpanEvent};
use sink::Sink;

/// Everything that can stop a parse from producing a tree.
///
/// Malformed templates are not errors: they come back as a tree with
/// [`diagnostics`](SyntaxTree::diagnostics).
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read template source")]
    Source(#[from] SourceError),
    #[error("parser produced an inconsistent tree")]
    Tree(#[from] TreeError),
}

/// Which grammar currently owns the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserMode {
    Markup,
    Code,
}

/// An open bracket in code, waiting for its partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Brace,
    Paren,
    Bracket,
}

impl Delimiter {
    pub fn from_token(token: CodeToken) -> Option<Delimiter> {
        match token {
            CodeToken::LBrace => Some(Delimiter::Brace),
            CodeToken::LParen => Some(Delimiter::Paren),
            CodeToken::LBracket => Some(Delimiter::Bracket),
            _ => None,
        }
    }

    pub fn opening(self) -> char {
        match self {
            Delimiter::Brace => '{',
            Delimiter::Paren => '(',
            Delimiter::Bracket => '[',
        }
    }

    pub fn closing(self) -> CodeToken {
        match self {
            Delimiter::Brace => CodeToken::RBrace,
            Delimiter::Paren => CodeToken::RParen,
            Delimiter::Bracket => CodeToken::RBracket,
        }
    }
}

/// A [`Delimiter`] and the byte offset where it opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nesting {
    pub delimiter: Delimiter,
    pub offset: usize,
}

/// State shared by both grammars for one parse.
///
/// Holds the cursor into the source, the start of the span being
/// accumulated, the mode and bracket nesting stacks, and the events and
/// diagnostics collected so far.
pub struct ParseContext<'src> {
    source: &'src str,
    pos: usize,
    span_start: usize,
    design_time: bool,
    modes: Vec<ParserMode>,
    nesting: Vec<Nesting>,
    events: Vec<Event>,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> ParseContext<'src> {
    pub fn new(source: &'src str, design_time: bool) -> Self {
        Self {
            source,
            pos: 0,
            span_start: 0,
            design_time,
            modes: vec![ParserMode::Markup],
            nesting: Vec::new(),
            events: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Parse a whole document and build the tree.
    pub fn parse(mut self) -> Result<SyntaxTree, TreeError> {
        grammar::document(&mut self);
        self.finish()
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn design_time(&self) -> bool {
        self.design_time
    }

    pub fn mode(&self) -> ParserMode {
        self.modes.last().copied().unwrap_or(ParserMode::Markup)
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Source from the cursor on.
    pub fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    pub fn at_str(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    pub fn current_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn nth_char(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    /// The character just before the cursor.
    pub fn previous_char(&self) -> Option<char> {
        self.source[..self.pos].chars().next_back()
    }

    /// Advance the cursor by `len` bytes, stopping at end of input.
    pub fn bump(&mut self, len: usize) {
        self.pos = (self.pos + len).min(self.source.len());
    }

    pub fn bump_char(&mut self) -> Option<char> {
        let c = self.current_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Advance over characters matching `pred`; returns the bytes consumed.
    pub fn bump_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let start = self.pos;
        while let Some(c) = self.current_char()
            && pred(c)
        {
            self.pos += c.len_utf8();
        }
        self.pos - start
    }

    pub fn peek_markup(&self) -> Option<Token<'src, MarkupToken>> {
        markup_tokens(self.rest()).next()
    }

    pub fn peek_code(&self) -> Option<Token<'src, CodeToken>> {
        code_tokens(self.rest()).next()
    }

    /// Code tokens from the cursor on, for lookahead. Does not move the
    /// cursor.
    pub fn code_lookahead(&self) -> impl Iterator<Item = Token<'src, CodeToken>> + use<'src> {
        code_tokens(self.rest())
    }

    /// The first code token that is not whitespace or a newline, with its
    /// byte offset from the cursor.
    pub fn peek_code_significant(&self) -> Option<(usize, Token<'src, CodeToken>)> {
        let mut offset = 0;
        for token in self.code_lookahead() {
            if !token.kind.is_trivia() {
                return Some((offset, token));
            }
            offset += token.len();
        }
        None
    }

    /// Whether text has been consumed since the last span was cut.
    pub fn has_pending(&self) -> bool {
        self.pos > self.span_start
    }

    /// Open a block at the cursor.
    ///
    /// All consumed text must already be cut into spans, or it would end up
    /// inside the new block.
    pub fn start_block(&mut self) -> Marker {
        debug_assert!(!self.has_pending(), "start_block with unflushed text");
        let pos = self.events.len();
        self.events.push(Event::Placeholder);
        Marker {
            pos,
            completed: false,
        }
    }

    /// Cut the text consumed since the last span into a new span. The span
    /// may be empty.
    pub fn output_span(&mut self, kind: SpanKind, accepted: AcceptedCharacters, generator: Option<ChunkGenerator>) {
        self.output_span_with(kind, accepted, generator, EditHandler::Default);
    }

    pub fn output_span_with(
        &mut self,
        kind: SpanKind,
        accepted: AcceptedCharacters,
        generator: Option<ChunkGenerator>,
        edit_handler: EditHandler,
    ) {
        let len = self.pos - self.span_start;
        self.span_start = self.pos;
        self.events.push(Event::Span(SpanEvent {
            kind,
            len,
            accepted,
            generator,
            edit_handler,
        }));
    }

    /// Cut pending text as literal markup. Does nothing when no text is
    /// pending.
    pub fn output_markup_span(&mut self) {
        if self.has_pending() {
            self.output_span(SpanKind::Markup, AcceptedCharacters::Any, Some(ChunkGenerator::Markup));
        }
    }

    pub fn push_nesting(&mut self, delimiter: Delimiter, offset: usize) {
        self.nesting.push(Nesting { delimiter, offset });
    }

    pub fn pop_nesting(&mut self) -> Option<Nesting> {
        self.nesting.pop()
    }

    pub fn nesting_depth(&self) -> usize {
        self.nesting.len()
    }

    /// Open delimiters from depth `base` upward, innermost last.
    pub fn nesting_above(&self, base: usize) -> &[Nesting] {
        self.nesting.get(base..).unwrap_or_default()
    }

    /// Record a diagnostic covering `start..cursor`.
    pub fn error(&mut self, message: impl Into<String>, start: usize) {
        let range = self.range_from(start);
        self.diagnostics.push(Diagnostic::error(message, range));
    }

    /// Record that input ended while a construct starting at `start` was
    /// still open. Tooling expects unfinished input while typing, so this
    /// is only a warning in design-time mode.
    pub fn unterminated(&mut self, message: impl Into<String>, start: usize) {
        let severity = if self.design_time {
            Severity::Warning
        } else {
            Severity::Error
        };
        let range = self.range_from(start);
        self.diagnostics.push(Diagnostic {
            severity,
            message: message.into(),
            range,
        });
    }

    fn range_from(&self, start: usize) -> TextRange {
        TextRange::new(text_size(start.min(self.pos)), text_size(self.pos))
    }

    /// Hand control to the code grammar at an `@`. Returns once the code
    /// construct has ended.
    pub fn enter_code_mode(&mut self) {
        debug_assert!(self.at_str("@"), "code mode must start at a transition");
        debug_assert_eq!(self.mode(), ParserMode::Markup, "code mode entered from code");
        self.modes.push(ParserMode::Code);
        log::trace!("code mode at {} (depth {})", self.pos, self.modes.len());
        grammar::code::transition(self);
        self.modes.pop();
    }

    /// Hand control to the markup grammar at a tag or `@:`. Returns once the
    /// markup construct has ended.
    pub fn enter_markup_mode(&mut self) {
        debug_assert_eq!(self.mode(), ParserMode::Code, "markup mode entered from markup");
        self.modes.push(ParserMode::Markup);
        log::trace!("markup mode at {} (depth {})", self.pos, self.modes.len());
        grammar::markup::nested(self);
        self.modes.pop();
    }

    /// Replay the events into a tree.
    pub fn finish(self) -> Result<SyntaxTree, TreeError> {
        debug_assert!(!self.has_pending(), "finish with unflushed text");
        let root = Sink::new(self.source, self.events).finish()?;
        Ok(SyntaxTree::new(root, self.diagnostics))
    }
}

/// A block being constructed.
///
/// [`ParseContext::start_block`] pushes a `Placeholder` event and returns a
/// marker pointing at it. Completing the marker turns the placeholder into a
/// `Start` event and pushes the matching `Finish`. Dropping a marker without
/// completing it panics.
#[must_use = "Markers must be completed, dropping them is a bug"]
pub struct Marker {
    /// Position in the events vector where our Placeholder lives
    pos: usize,
    completed: bool,
}

impl Marker {
    /// Close the block normally.
    pub fn complete(self, ctx: &mut ParseContext<'_>, kind: BlockKind) {
        self.close(ctx, kind, true);
    }

    /// Close the block, flagging that input ran out before its terminator.
    pub fn complete_unterminated(self, ctx: &mut ParseContext<'_>, kind: BlockKind) {
        self.close(ctx, kind, false);
    }

    fn close(mut self, ctx: &mut ParseContext<'_>, kind: BlockKind, terminated: bool) {
        self.completed = true;
        let event_at_pos = &mut ctx.events[self.pos];
        assert!(matches!(event_at_pos, Event::Placeholder));
        *event_at_pos = Event::Start { kind };
        ctx.events.push(Event::Finish { terminated });
    }
}

impl Drop for Marker {
    fn drop(&mut self) {
        if !self.completed && !std::thread::panicking() {
            panic!("Marker must be completed");
        }
    }
}

/// Options for a parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Parse for editor tooling: unfinished constructs at end of input are
    /// warnings, and `@user.` keeps its trailing dot.
    pub design_time: bool,
}

/// Entry point for parsing templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateParser {
    options: ParserOptions,
}

impl TemplateParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn design_time() -> Self {
        Self::new(ParserOptions { design_time: true })
    }

    pub fn options(&self) -> ParserOptions {
        self.options
    }

    /// Decode `source` and parse it.
    pub fn parse(&self, source: &SourceText) -> Result<SyntaxTree, ParseError> {
        let text = source.text()?;
        let tree = self.parse_str(text)?;
        log::debug!(
            "parsed {} ({} bytes, {} diagnostics)",
            source.filename().unwrap_or("<anonymous>"),
            text.len(),
            tree.diagnostics().len()
        );
        Ok(tree)
    }

    /// Parse already-decoded text.
    pub fn parse_str(&self, input: &str) -> Result<SyntaxTree, ParseError> {
        let tree = ParseContext::new(input, self.options.design_time).parse()?;
        Ok(tree)
    }
}

/// Parse a template with default options.
pub fn parse(input: &str) -> Result<SyntaxTree, ParseError> {
    TemplateParser::default().parse_str(input)
}
