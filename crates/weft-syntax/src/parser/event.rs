//! # Parser Events
//!
//! Grammar code never touches the tree directly. It emits a flat sequence of
//! events that describe it:
//!
//! ```text
//! Start(Expression)          ← open an Expression block
//!   Span(Transition, 1)      ← the next 1 byte of source is a Transition span
//!   Span(Code, 3)
//! Finish(terminated)         ← close it
//! ```
//!
//! Spans carry only a length. The [`Sink`](super::sink::Sink) walks the
//! source with a cursor and slices each span's text out of it, so the spans
//! tile the input by construction.

use crate::chunks::ChunkGenerator;
use crate::syntax_kind::{AcceptedCharacters, BlockKind, EditHandler, SpanKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Open a block. The kind is only known once the marker completes, which
    /// is why this replaces a [`Event::Placeholder`].
    Start { kind: BlockKind },

    /// The next `len` bytes of source form one span.
    Span(SpanEvent),

    /// Close the innermost block. `terminated` is false when input ended
    /// before the construct's terminator.
    Finish { terminated: bool },

    /// Reserved slot for a block whose marker has not completed yet.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanEvent {
    pub kind: SpanKind,
    pub len: usize,
    pub accepted: AcceptedCharacters,
    pub generator: Option<ChunkGenerator>,
    pub edit_handler: EditHandler,
}

impl Event {
    pub fn span(kind: SpanKind, len: usize, accepted: AcceptedCharacters, generator: Option<ChunkGenerator>) -> Self {
        Event::Span(SpanEvent {
            kind,
            len,
            accepted,
            generator,
            edit_handler: EditHandler::Default,
        })
    }
}
