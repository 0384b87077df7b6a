use std::fmt;

use crate::chunks::tree::ChunkTreeBuilder;
use crate::tree::Span;

/// The lowering strategy attached to a span.
///
/// Each variant carries only the data its lowering needs. Equality and
/// hashing are structural: two generators of the same kind with the same
/// data are interchangeable, which is what lets trees be compared and cached
/// by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChunkGenerator {
    /// Literal markup written to the output as-is
    Markup,
    /// Code whose value is written to the output
    Expression,
    /// Code executed for its effect
    Statement,
    /// `@inherits`: the generated type derives from `base_type`
    SetBaseType { base_type: String },
    /// `@using`: the generated code imports `namespace`
    AddImport { namespace: String },
    /// `@functions`: members added to the generated type
    TypeMember,
}

impl ChunkGenerator {
    pub fn set_base_type(base_type: impl Into<String>) -> Self {
        ChunkGenerator::SetBaseType {
            base_type: base_type.into(),
        }
    }

    pub fn add_import(namespace: impl Into<String>) -> Self {
        ChunkGenerator::AddImport {
            namespace: namespace.into(),
        }
    }

    /// Append the chunks for `span` to `builder`.
    ///
    /// Only reads the span; the tree is never modified.
    pub fn generate(&self, span: &Span, builder: &mut ChunkTreeBuilder) {
        match self {
            ChunkGenerator::Markup => builder.add_literal(span.text(), span),
            ChunkGenerator::Expression => builder.add_expression(span.text(), span),
            ChunkGenerator::Statement => builder.add_statement(span.text(), span),
            ChunkGenerator::SetBaseType { base_type } => builder.add_set_base_type(base_type, span),
            ChunkGenerator::AddImport { namespace } => builder.add_import(namespace, span),
            ChunkGenerator::TypeMember => builder.add_type_member(span.text(), span),
        }
    }
}

impl fmt::Display for ChunkGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkGenerator::Markup => f.write_str("Markup"),
            ChunkGenerator::Expression => f.write_str("Expr"),
            ChunkGenerator::Statement => f.write_str("Stmt"),
            ChunkGenerator::SetBaseType { base_type } => write!(f, "Base:{base_type}"),
            ChunkGenerator::AddImport { namespace } => write!(f, "Import:{namespace}"),
            ChunkGenerator::TypeMember => f.write_str("Members"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::tree::ChunkKind;
    use crate::syntax_kind::{AcceptedCharacters, SpanKind};
    use pretty_assertions::assert_eq;
    use rowan::TextSize;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(generator: &ChunkGenerator) -> u64 {
        let mut hasher = DefaultHasher::new();
        generator.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn equal_generators_hash_equally() {
        let first = ChunkGenerator::set_base_type("MyBase");
        let second = ChunkGenerator::set_base_type(String::from("MyBase"));

        assert_eq!(first, second);
        assert_eq!(hash_of(&first), hash_of(&second));
    }

    #[test]
    fn different_data_or_kind_is_never_equal() {
        let base = ChunkGenerator::set_base_type("MyBase");

        assert_ne!(base, ChunkGenerator::set_base_type("OtherBase"));
        assert_ne!(base, ChunkGenerator::add_import("MyBase"));
        assert_ne!(ChunkGenerator::Expression, ChunkGenerator::Statement);
    }

    #[test]
    fn set_base_type_appends_one_chunk() {
        let generator = ChunkGenerator::set_base_type("MyBase");
        let span = Span::new(
            SpanKind::Code,
            TextSize::from(10),
            "MyBase",
            AcceptedCharacters::AnyExceptNewline,
            Some(generator.clone()),
        );
        let mut builder = ChunkTreeBuilder::new();

        generator.generate(&span, &mut builder);
        let chunks = builder.finish();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks.chunks()[0].kind, ChunkKind::SetBaseType("MyBase".to_string()));
        assert_eq!(chunks.chunks()[0].range, span.range());
    }

    #[test]
    fn display_names_the_action() {
        assert_eq!(ChunkGenerator::set_base_type("MyBase").to_string(), "Base:MyBase");
        assert_eq!(ChunkGenerator::add_import("System").to_string(), "Import:System");
        assert_eq!(ChunkGenerator::Expression.to_string(), "Expr");
    }
}
