//! Depth-first traversal of the Block/Span tree.
//!
//! Implement [`Visitor`] and override only the callbacks you need. For every
//! block the order is `enter_block`, then each child in source order, then
//! `exit_block`, so consumers can keep their own stack in step with the
//! tree.

use std::fmt::Write;

use crate::syntax_kind::EditHandler;
use crate::tree::{Block, Span};

pub trait Visitor {
    fn enter_block(&mut self, _block: &Block) {}

    fn visit_span(&mut self, _span: &Span) {}

    fn exit_block(&mut self, _block: &Block) {}

    /// Override to skip or reorder a block's children; most visitors keep the
    /// default.
    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }
}

/// The default block traversal: enter, children, exit.
pub fn walk_block<V: Visitor + ?Sized>(visitor: &mut V, block: &Block) {
    visitor.enter_block(block);
    for child in block.children() {
        child.accept(visitor);
    }
    visitor.exit_block(block);
}

/// Renders a tree one node per line, indented by depth.
#[derive(Debug, Default)]
pub(crate) struct TreePrinter {
    out: String,
    depth: usize,
}

impl TreePrinter {
    pub(crate) fn finish(self) -> String {
        self.out
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }
}

// Writing to a String cannot fail, so the fmt::Results below are dropped.
impl Visitor for TreePrinter {
    fn enter_block(&mut self, block: &Block) {
        self.indent();
        let _ = write!(self.out, "{}@{:?}", block.kind(), block.range());
        if !block.is_complete() {
            self.out.push_str(" (incomplete)");
        }
        self.out.push('\n');
        self.depth += 1;
    }

    fn visit_span(&mut self, span: &Span) {
        self.indent();
        let _ = write!(
            self.out,
            "{}@{:?} {:?} [{:?}]",
            span.kind(),
            span.range(),
            span.text(),
            span.accepted()
        );
        if let Some(generator) = span.generator() {
            let _ = write!(self.out, " {generator}");
        }
        if let EditHandler::ImplicitExpression { accept_trailing_dot } = span.edit_handler() {
            self.out.push_str(if accept_trailing_dot {
                " (implicit, trailing dot)"
            } else {
                " (implicit)"
            });
        }
        self.out.push('\n');
    }

    fn exit_block(&mut self, _block: &Block) {
        self.depth -= 1;
    }
}
