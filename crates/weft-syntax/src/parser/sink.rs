//! Sink for replaying parser events into a [`TreeBuilder`].

use crate::builder::{TreeBuilder, TreeError};
use crate::parser::event::Event;
use crate::tree::{Block, Span, text_size};

/// Converts parser events and the source they describe into a tree.
pub struct Sink<'src> {
    builder: TreeBuilder,
    source: &'src str,
    cursor: usize,
    events: Vec<Event>,
}

impl<'src> Sink<'src> {
    pub fn new(source: &'src str, events: Vec<Event>) -> Self {
        Self {
            builder: TreeBuilder::new(),
            source,
            cursor: 0,
            events,
        }
    }

    /// Consume the sink and build the tree. Blocks still open at the end are
    /// force-closed and marked incomplete.
    pub fn finish(mut self) -> Result<Block, TreeError> {
        for event in std::mem::take(&mut self.events) {
            match event {
                Event::Start { kind } => self.builder.start_block(kind),
                Event::Span(span) => {
                    let start = self.cursor;
                    let end = (start + span.len).min(self.source.len());
                    self.cursor = end;
                    let node = Span::new(
                        span.kind,
                        text_size(start),
                        &self.source[start..end],
                        span.accepted,
                        span.generator,
                    )
                    .with_edit_handler(span.edit_handler);
                    self.builder.accept_span(node)?;
                }
                Event::Finish { terminated } => self.builder.end_block(terminated)?,
                Event::Placeholder => {}
            }
        }

        self.builder.finish(text_size(self.source.len()))
    }
}
