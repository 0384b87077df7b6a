//! # Chunk Lowering
//!
//! Spans that affect output carry a [`ChunkGenerator`]. Lowering walks the
//! tree in document order and lets each generator append to a
//! [`ChunkTreeBuilder`]; the resulting [`ChunkTree`] is what a code
//! generator consumes.
//!
//! ```text
//! Markup "foo "          ──Markup──▶  Literal("foo ")
//! Transition "@"         (no generator)
//! Code "bar"             ──Expr────▶  Expression("bar")
//! Markup " baz"          ──Markup──▶  Literal(" baz")
//! ```

mod generator;
mod tree;

pub use generator::ChunkGenerator;
pub use tree::{Chunk, ChunkKind, ChunkTree, ChunkTreeBuilder};

use crate::tree::{Block, Span, SyntaxTree};
use crate::visitor::Visitor;

/// Visitor that runs each span's generator.
#[derive(Debug, Default)]
pub struct ChunkLowering {
    builder: ChunkTreeBuilder,
}

impl ChunkLowering {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> ChunkTree {
        self.builder.finish()
    }
}

impl Visitor for ChunkLowering {
    fn visit_span(&mut self, span: &Span) {
        if let Some(generator) = span.generator() {
            generator.generate(span, &mut self.builder);
        }
    }
}

/// Lower a whole tree.
pub fn lower(tree: &SyntaxTree) -> ChunkTree {
    let chunks = lower_block(tree.root());
    log::trace!("lowered {} chunks", chunks.len());
    chunks
}

/// Lower one block and everything below it.
pub fn lower_block(block: &Block) -> ChunkTree {
    let mut lowering = ChunkLowering::new();
    block.accept(&mut lowering);
    lowering.finish()
}
