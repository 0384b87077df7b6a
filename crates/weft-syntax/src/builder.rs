//! Stack-based construction of the Block/Span tree.
//!
//! The parser never builds nodes directly. It opens blocks, adds spans and
//! closes blocks on a [`TreeBuilder`], which keeps the invariants: spans live
//! inside blocks, blocks close in LIFO order, and exactly one root comes out.

use rowan::{TextRange, TextSize};
use thiserror::Error;

use crate::syntax_kind::BlockKind;
use crate::tree::{Block, Node, Span, cover};

/// Misuse of the builder. These are bugs in the grammar, never in the input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("end_block called with no open block")]
    UnbalancedEnd,
    #[error("span at {0:?} added while no block is open")]
    SpanOutsideBlock(TextRange),
    #[error("a second root block was closed")]
    MultipleRoots,
    #[error("no block was ever opened")]
    EmptyTree,
    #[error("span starts at {found:?} but the previous one ended at {expected:?}")]
    NonContiguousSpan { expected: TextSize, found: TextSize },
}

#[derive(Debug)]
struct OpenBlock {
    kind: BlockKind,
    start: TextSize,
    children: Vec<Node>,
}

#[derive(Debug, Default)]
pub struct TreeBuilder {
    stack: Vec<OpenBlock>,
    root: Option<Block>,
    /// End of the last accepted span
    cursor: TextSize,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Open a block at the current position.
    pub fn start_block(&mut self, kind: BlockKind) {
        self.stack.push(OpenBlock {
            kind,
            start: self.cursor,
            children: Vec::new(),
        });
    }

    /// Append a span to the innermost open block. Spans must follow each
    /// other with no gap or overlap.
    pub fn accept_span(&mut self, span: Span) -> Result<(), TreeError> {
        let Some(open) = self.stack.last_mut() else {
            return Err(TreeError::SpanOutsideBlock(span.range()));
        };
        if span.start() != self.cursor {
            return Err(TreeError::NonContiguousSpan {
                expected: self.cursor,
                found: span.start(),
            });
        }
        self.cursor = span.end();
        open.children.push(Node::Span(span));
        Ok(())
    }

    /// Close the innermost open block. `complete` is false when the
    /// construct ran out of input before its terminator.
    pub fn end_block(&mut self, complete: bool) -> Result<(), TreeError> {
        let open = self.stack.pop().ok_or(TreeError::UnbalancedEnd)?;
        let range = cover(&open.children).unwrap_or_else(|| TextRange::empty(open.start));
        self.close(open, range, complete)
    }

    /// Close every block still open, marking each incomplete and stretching
    /// it to `end`, then return the root.
    pub fn finish(mut self, end: TextSize) -> Result<Block, TreeError> {
        while let Some(open) = self.stack.pop() {
            log::trace!("force-closing unterminated {} block", open.kind);
            let range = TextRange::new(open.start, end.max(open.start));
            self.close(open, range, false)?;
        }
        self.root.ok_or(TreeError::EmptyTree)
    }

    fn close(&mut self, open: OpenBlock, range: TextRange, complete: bool) -> Result<(), TreeError> {
        let block = Block::from_parts(open.kind, open.children, range, complete);
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(Node::Block(block)),
            None if self.root.is_some() => return Err(TreeError::MultipleRoots),
            None => self.root = Some(block),
        }
        Ok(())
    }
}
