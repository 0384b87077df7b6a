//! # Block/Span Tree
//!
//! The parser output is a tree of composite [`Block`]s and leaf [`Span`]s:
//!
//! ```text
//! Markup@0..12
//!   Markup@0..4 "foo "
//!   Expression@4..8
//!     Transition@4..5 "@"
//!     Code@5..8 "bar"
//!   Markup@8..12 " baz"
//! ```
//!
//! ## Lossless tiling
//!
//! Every span holds the exact source text of its extent, and the children of
//! a block tile the block's extent with no gaps or overlaps. Concatenating
//! all span texts in order therefore gives back the input unchanged, however
//! malformed it was.
//!
//! Offsets are UTF-8 byte offsets into the decoded source text.

use rowan::{TextRange, TextSize};

use crate::chunks::ChunkGenerator;
use crate::diagnostic::Diagnostic;
use crate::syntax_kind::{AcceptedCharacters, BlockKind, EditHandler, SpanKind};
use crate::visitor::{TreePrinter, Visitor};

/// Convert a byte offset to a [`TextSize`]. Templates never approach 4 GiB,
/// so offsets beyond `u32::MAX` saturate.
pub(crate) fn text_size(offset: usize) -> TextSize {
    TextSize::try_from(offset).unwrap_or(TextSize::from(u32::MAX))
}

/// A child of a [`Block`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Block(Block),
    Span(Span),
}

impl Node {
    pub fn range(&self) -> TextRange {
        match self {
            Node::Block(block) => block.range(),
            Node::Span(span) => span.range(),
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Node::Block(block) => Some(block),
            Node::Span(_) => None,
        }
    }

    pub fn as_span(&self) -> Option<&Span> {
        match self {
            Node::Span(span) => Some(span),
            Node::Block(_) => None,
        }
    }

    /// Dispatch to the visitor callback for this node's shape.
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            Node::Block(block) => visitor.visit_block(block),
            Node::Span(span) => visitor.visit_span(span),
        }
    }
}

impl From<Block> for Node {
    fn from(block: Block) -> Self {
        Node::Block(block)
    }
}

impl From<Span> for Node {
    fn from(span: Span) -> Self {
        Node::Span(span)
    }
}

/// A composite node grouping children under a [`BlockKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    kind: BlockKind,
    children: Vec<Node>,
    range: TextRange,
    complete: bool,
}

impl Block {
    /// Create a complete block whose extent is derived from its children.
    ///
    /// A block without children gets an empty extent at offset zero; use
    /// [`TreeBuilder`](crate::builder::TreeBuilder) when the position of an
    /// empty block matters.
    pub fn new(kind: BlockKind, children: Vec<Node>) -> Self {
        let range = cover(&children).unwrap_or_default();
        Self::from_parts(kind, children, range, true)
    }

    pub(crate) fn from_parts(kind: BlockKind, children: Vec<Node>, range: TextRange, complete: bool) -> Self {
        Block {
            kind,
            children,
            range,
            complete,
        }
    }

    /// Mark whether the construct was closed before input ran out.
    pub fn with_complete(mut self, complete: bool) -> Self {
        self.complete = complete;
        self
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    /// False when input ended while the construct was still open.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// All spans below this block in source order.
    pub fn spans(&self) -> Spans<'_> {
        Spans {
            stack: vec![self.children.iter()],
        }
    }

    /// The source text covered by this block.
    pub fn text(&self) -> String {
        self.spans().map(Span::text).collect()
    }

    /// Walk this block with a visitor.
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_block(self);
    }
}

/// Smallest range covering all nodes, if there are any.
pub(crate) fn cover(nodes: &[Node]) -> Option<TextRange> {
    let first = nodes.first()?.range();
    let last = nodes.last()?.range();
    Some(first.cover(last))
}

/// Depth-first iterator over the spans of a block.
pub struct Spans<'a> {
    stack: Vec<std::slice::Iter<'a, Node>>,
}

impl<'a> Iterator for Spans<'a> {
    type Item = &'a Span;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(Node::Span(span)) => return Some(span),
                Some(Node::Block(block)) => self.stack.push(block.children.iter()),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// A leaf node holding an exact slice of the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    kind: SpanKind,
    range: TextRange,
    text: String,
    accepted: AcceptedCharacters,
    generator: Option<ChunkGenerator>,
    edit_handler: EditHandler,
}

impl Span {
    pub fn new(
        kind: SpanKind,
        start: TextSize,
        text: impl Into<String>,
        accepted: AcceptedCharacters,
        generator: Option<ChunkGenerator>,
    ) -> Self {
        let text = text.into();
        Span {
            kind,
            range: TextRange::at(start, text_size(text.len())),
            text,
            accepted,
            generator,
            edit_handler: EditHandler::Default,
        }
    }

    pub fn with_edit_handler(mut self, edit_handler: EditHandler) -> Self {
        self.edit_handler = edit_handler;
        self
    }

    pub fn kind(&self) -> SpanKind {
        self.kind
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn start(&self) -> TextSize {
        self.range.start()
    }

    pub fn end(&self) -> TextSize {
        self.range.end()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn accepted(&self) -> AcceptedCharacters {
        self.accepted
    }

    pub fn generator(&self) -> Option<&ChunkGenerator> {
        self.generator.as_ref()
    }

    pub fn edit_handler(&self) -> EditHandler {
        self.edit_handler
    }
}

/// The result of one parse: the root block plus everything that went wrong
/// along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    root: Block,
    diagnostics: Vec<Diagnostic>,
}

impl SyntaxTree {
    pub fn new(root: Block, diagnostics: Vec<Diagnostic>) -> Self {
        Self { root, diagnostics }
    }

    pub fn root(&self) -> &Block {
        &self.root
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        use codespan_reporting::diagnostic::Severity;
        self.diagnostics
            .iter()
            .any(|d| d.severity >= Severity::Error)
    }

    /// Reconstruct the source text from the spans.
    pub fn text(&self) -> String {
        self.root.text()
    }

    pub fn walk<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        self.root.accept(visitor);
    }

    /// Indented, one-node-per-line rendering for debugging and snapshots.
    pub fn dump(&self) -> String {
        let mut printer = TreePrinter::default();
        self.walk(&mut printer);
        printer.finish()
    }
}
