use rowan::TextRange;

use crate::tree::Span;

/// What a chunk asks the code generator to emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkKind {
    Literal(String),
    Expression(String),
    Statement(String),
    SetBaseType(String),
    AddImport(String),
    TypeMember(String),
}

/// One unit of lowered output, traceable to the source it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub kind: ChunkKind,
    /// Extent of the originating span(s) in the source text.
    pub range: TextRange,
}

/// The ordered chunk sequence handed to a code generator.
///
/// Chunks appear in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkTree {
    chunks: Vec<Chunk>,
}

impl ChunkTree {
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }
}

impl<'a> IntoIterator for &'a ChunkTree {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

/// Accumulates chunks while a tree is lowered.
#[derive(Debug, Default)]
pub struct ChunkTreeBuilder {
    tree: ChunkTree,
}

impl ChunkTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add literal output. Literal text from a span that directly follows the
    /// previous literal chunk is merged into that chunk.
    pub fn add_literal(&mut self, text: &str, span: &Span) {
        if text.is_empty() {
            return;
        }

        if let Some(Chunk {
            kind: ChunkKind::Literal(previous),
            range,
        }) = self.tree.chunks.last_mut()
            && range.end() == span.start()
        {
            previous.push_str(text);
            *range = range.cover(span.range());
            return;
        }

        self.push(ChunkKind::Literal(text.to_string()), span);
    }

    pub fn add_expression(&mut self, code: &str, span: &Span) {
        self.push(ChunkKind::Expression(code.to_string()), span);
    }

    pub fn add_statement(&mut self, code: &str, span: &Span) {
        self.push(ChunkKind::Statement(code.to_string()), span);
    }

    pub fn add_set_base_type(&mut self, base_type: &str, span: &Span) {
        self.push(ChunkKind::SetBaseType(base_type.to_string()), span);
    }

    pub fn add_import(&mut self, namespace: &str, span: &Span) {
        self.push(ChunkKind::AddImport(namespace.to_string()), span);
    }

    pub fn add_type_member(&mut self, code: &str, span: &Span) {
        self.push(ChunkKind::TypeMember(code.to_string()), span);
    }

    pub fn finish(self) -> ChunkTree {
        self.tree
    }

    fn push(&mut self, kind: ChunkKind, span: &Span) {
        self.tree.chunks.push(Chunk {
            kind,
            range: span.range(),
        });
    }
}
