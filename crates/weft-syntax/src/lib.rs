//! # weft-syntax
//!
//! A lossless syntax tree for templates that mix literal markup with an
//! embedded code dialect, entered with `@`:
//!
//! ```text
//! <ul>
//! @foreach (var item in items) {
//!     <li>@item.Name</li>
//! }
//! </ul>
//! ```
//!
//! Parsing is built on [Logos] lexers and follows the [rust-analyzer] event
//! model. The output is a tree of Blocks and Spans rather than a [Rowan] green
//! tree, but positions use Rowan's `TextRange`/`TextSize`.
//!
//! [Logos]: https://docs.rs/logos
//! [Rowan]: https://docs.rs/rowan
//! [rust-analyzer]: https://rust-analyzer.github.io/book/contributing/syntax.html
//!
//! ## Architecture Overview
//!
//! ```text
//! bytes → SourceText → &str → ParseContext ⇄ grammars → Events → Sink → TreeBuilder
//!         (decoding)           (markup ⇄ code)                           │
//!                                                                        ▼
//!                                     ChunkTree ← ChunkLowering ← SyntaxTree
//! ```
//!
//! ### 1. Source ([`source`] module)
//!
//! [`SourceText`] holds raw bytes and decodes them on first use, detecting
//! the encoding from a byte-order mark when none is declared.
//!
//! ### 2. Parser ([`parser`] module)
//!
//! Two grammars, markup and code, share one [`ParseContext`]. Each hands the
//! cursor to the other at a mode transition and gets it back when the
//! embedded region ends. Grammar rules emit events; the sink replays them
//! into a [`TreeBuilder`].
//!
//! ### 3. Tree ([`tree`], [`visitor`] modules)
//!
//! The [`SyntaxTree`] holds a root [`Block`] whose spans tile the input
//! exactly, plus the [`Diagnostic`]s found along the way. A [`Visitor`]
//! walks it in document order.
//!
//! ### 4. Chunks ([`chunks`] module)
//!
//! Spans carry a [`ChunkGenerator`]; [`lower`] runs them to build the
//! [`ChunkTree`] a code generator consumes.
//!
//! ## Module Structure
//!
//! ```text
//! weft-syntax/
//! ├── lib.rs           # This file - public API and tree tests
//! ├── source.rs        # SourceText, Encoding, lazy decoding
//! ├── lexer.rs         # Logos tokenizers for markup and code
//! ├── syntax_kind.rs   # BlockKind, SpanKind, AcceptedCharacters, EditHandler
//! ├── tree.rs          # Block, Span, Node, SyntaxTree
//! ├── builder.rs       # TreeBuilder and its stack discipline
//! ├── visitor.rs       # Visitor trait and tree printer
//! ├── diagnostic.rs    # Diagnostic and codespan conversion
//! ├── chunks/          # ChunkGenerator, ChunkTree, lowering
//! └── parser/
//!     ├── mod.rs       # ParseContext, Marker, TemplateParser
//!     ├── event.rs     # Event enum (Start, Span, Finish, Placeholder)
//!     ├── sink.rs      # Replays events into a TreeBuilder
//!     └── grammar/
//!         ├── mod.rs   # Document root and comments
//!         ├── markup.rs# Literal text, escapes, nested tags
//!         └── code.rs  # Expressions, statements, directives
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use weft_syntax::{BlockKind, ChunkKind, lower, parse};
//!
//! let tree = parse("foo @bar baz").unwrap();
//!
//! // The tree preserves all text
//! assert_eq!(tree.text(), "foo @bar baz");
//! assert!(tree.diagnostics().is_empty());
//!
//! let expression = tree.root().children()[1].as_block().unwrap();
//! assert_eq!(expression.kind(), BlockKind::Expression);
//!
//! let chunks = lower(&tree);
//! assert_eq!(chunks.chunks()[1].kind, ChunkKind::Expression("bar".to_string()));
//! ```
//!
//! ## Error Tolerance
//!
//! Malformed templates never fail to parse. Problems become diagnostics, and
//! a construct still open at end of input is closed and flagged incomplete.
//! In design-time mode ([`TemplateParser::design_time`]) those end-of-input
//! problems are warnings, since an editor sees half-typed input all the
//! time.

pub mod builder;
pub mod chunks;
pub mod diagnostic;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod syntax_kind;
pub mod tree;
pub mod visitor;

pub use builder::{TreeBuilder, TreeError};
pub use chunks::{Chunk, ChunkGenerator, ChunkKind, ChunkTree, ChunkTreeBuilder, lower};
pub use diagnostic::Diagnostic;
pub use parser::{ParseContext, ParseError, ParserOptions, TemplateParser, parse};
pub use source::{Encoding, SourceError, SourceText};
pub use syntax_kind::{AcceptedCharacters, BlockKind, EditHandler, SpanKind};
pub use tree::{Block, Node, Span, SyntaxTree};
pub use visitor::{Visitor, walk_block};

#[cfg(test)]
mod tests {
    use super::*;
    use codespan_reporting::diagnostic::Severity;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rowan::TextSize;

    /// Builds expected spans with consecutive offsets.
    struct SpanFactory {
        offset: u32,
    }

    impl SpanFactory {
        fn new() -> Self {
            Self { offset: 0 }
        }

        fn span(
            &mut self,
            kind: SpanKind,
            text: &str,
            accepted: AcceptedCharacters,
            generator: Option<ChunkGenerator>,
        ) -> Span {
            let span = Span::new(kind, TextSize::from(self.offset), text, accepted, generator);
            self.offset += u32::try_from(text.len()).unwrap();
            span
        }

        fn markup(&mut self, text: &str) -> Node {
            self.span(SpanKind::Markup, text, AcceptedCharacters::Any, Some(ChunkGenerator::Markup))
                .into()
        }

        fn transition(&mut self) -> Node {
            self.span(SpanKind::Transition, "@", AcceptedCharacters::None, None)
                .into()
        }

        fn implicit(&mut self, text: &str) -> Node {
            self.span(
                SpanKind::Code,
                text,
                AcceptedCharacters::NonWhiteSpace,
                Some(ChunkGenerator::Expression),
            )
            .with_edit_handler(EditHandler::ImplicitExpression {
                accept_trailing_dot: false,
            })
            .into()
        }
    }

    fn block(kind: BlockKind, children: Vec<Node>) -> Node {
        Block::new(kind, children).into()
    }

    fn design_time(input: &str) -> SyntaxTree {
        TemplateParser::design_time().parse_str(input).unwrap()
    }

    #[test]
    fn implicit_expression_between_markup() {
        let mut f = SpanFactory::new();
        let expected = Block::new(
            BlockKind::Markup,
            vec![
                f.markup("foo "),
                block(BlockKind::Expression, vec![f.transition(), f.implicit("bar")]),
                f.markup(" baz"),
            ],
        );

        let tree = parse("foo @bar baz").unwrap();

        assert_eq!(tree.root(), &expected);
        assert_eq!(tree.text(), "foo @bar baz");
    }

    #[test]
    fn snapshot_implicit_expression() {
        let tree = parse("foo @bar baz").unwrap();
        assert_snapshot!(tree.dump(), @r#"
        Markup@0..12
          Markup@0..4 "foo " [Any] Markup
          Expression@4..8
            Transition@4..5 "@" [None]
            Code@5..8 "bar" [NonWhiteSpace] Expr (implicit)
          Markup@8..12 " baz" [Any] Markup
        "#);
    }

    #[test]
    fn snapshot_statement_with_markup() {
        let tree = parse("@{ <p>Hi</p> }").unwrap();
        assert_snapshot!(tree.dump(), @r#"
        Markup@0..14
          Statement@0..14
            Transition@0..1 "@" [None]
            MetaCode@1..2 "{" [None]
            Code@2..3 " " [Any] Stmt
            Markup@3..12
              Markup@3..12 "<p>Hi</p>" [Any] Markup
            Code@12..13 " " [Any] Stmt
            MetaCode@13..14 "}" [None]
        "#);
    }

    #[test]
    fn snapshot_foreach_with_nested_markup() {
        let tree = parse("@foreach (var i in items) {\n<li>@i</li>\n}\n").unwrap();
        assert!(tree.diagnostics().is_empty());
        assert_snapshot!(tree.dump(), @r#"
        Markup@0..42
          Statement@0..41
            Transition@0..1 "@" [None]
            Code@1..28 "foreach (var i in items) {\n" [Any] Stmt
            Markup@28..40
              Markup@28..32 "<li>" [Any] Markup
              Expression@32..34
                Transition@32..33 "@" [None]
                Code@33..34 "i" [NonWhiteSpace] Expr (implicit)
              Markup@34..40 "</li>\n" [Any] Markup
            Code@40..41 "}" [Any] Stmt
          Markup@41..42 "\n" [Any] Markup
        "#);
    }

    #[test]
    fn snapshot_escapes_and_email() {
        let tree = parse("Email me at a@b.com or @@ here").unwrap();
        assert_snapshot!(tree.dump(), @r#"
        Markup@0..30
          Markup@0..23 "Email me at a@b.com or " [Any] Markup
          Markup@23..24 "@" [None]
          Markup@24..30 "@ here" [Any] Markup
        "#);
    }

    #[test]
    fn snapshot_unterminated_explicit_expression() {
        let tree = parse("@(a + ").unwrap();
        assert_snapshot!(tree.dump(), @r#"
        Markup@0..6
          Expression@0..6 (incomplete)
            Transition@0..1 "@" [None]
            MetaCode@1..2 "(" [None]
            Code@2..6 "a + " [Any] Expr
        "#);
        assert_eq!(tree.diagnostics().len(), 1);
        assert_eq!(tree.diagnostics()[0].severity, Severity::Error);
    }

    #[test]
    fn design_time_downgrades_end_of_input_problems() {
        let tree = design_time("@(a + ");
        assert_eq!(tree.diagnostics().len(), 1);
        assert_eq!(tree.diagnostics()[0].severity, Severity::Warning);
        assert!(!tree.has_errors());
    }

    #[test]
    fn trailing_dot_depends_on_mode() {
        assert_snapshot!(parse("@user.").unwrap().dump(), @r#"
        Markup@0..6
          Expression@0..5
            Transition@0..1 "@" [None]
            Code@1..5 "user" [NonWhiteSpace] Expr (implicit)
          Markup@5..6 "." [Any] Markup
        "#);
        assert_snapshot!(design_time("@user.").dump(), @r#"
        Markup@0..6
          Expression@0..6
            Transition@0..1 "@" [None]
            Code@1..6 "user." [NonWhiteSpace] Expr (implicit, trailing dot)
        "#);
    }

    #[test]
    fn member_access_calls_and_indexers() {
        let tree = parse("<b>@user.Orders[0].Total(\"c\")!</b>").unwrap();
        let expression = tree.root().children()[1].as_block().unwrap();
        assert_eq!(expression.text(), "@user.Orders[0].Total(\"c\")");
        assert!(tree.diagnostics().is_empty());
    }

    #[test]
    fn identifiers_in_any_script() {
        let tree = parse("<p>@café.größe</p>").unwrap();
        let kinds: Vec<_> = lower(&tree).iter().map(|c| c.kind.clone()).collect();

        assert_eq!(
            kinds,
            vec![
                ChunkKind::Literal("<p>".to_string()),
                ChunkKind::Expression("café.größe".to_string()),
                ChunkKind::Literal("</p>".to_string()),
            ]
        );
    }

    #[test]
    fn invalid_character_after_transition() {
        let tree = parse("a @! b").unwrap();
        assert_eq!(tree.text(), "a @! b");

        let expression = tree.root().children()[1].as_block().unwrap();
        assert_eq!(expression.kind(), BlockKind::Expression);
        let code = expression.children()[1].as_span().unwrap();
        assert_eq!(code.text(), "");
        assert_eq!(code.kind(), SpanKind::Code);

        let diagnostics = tree.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "unexpected character '!' after '@'");
    }

    #[test]
    fn if_else_chain_is_one_statement() {
        let input = "@if (a) { <p>1</p> } else if (b) { <p>2</p> } else { @:three\n}";
        let tree = parse(input).unwrap();

        assert_eq!(tree.root().children().len(), 1);
        let statement = tree.root().children()[0].as_block().unwrap();
        assert_eq!(statement.kind(), BlockKind::Statement);
        assert_eq!(statement.text(), input);
        assert!(tree.diagnostics().is_empty());
    }

    #[test]
    fn do_while_and_try_catch() {
        for input in ["@do { i++; } while (i < 3);", "@try { a(); } catch (E e) { b(); } finally { c(); }"] {
            let tree = parse(input).unwrap();
            assert_eq!(tree.root().children().len(), 1, "{input}");
            assert!(tree.diagnostics().is_empty(), "{input}");
        }
    }

    #[test]
    fn using_statement_versus_directive() {
        let statement = parse("@using (var s = Open()) { }").unwrap();
        let directive = parse("@using System.IO").unwrap();

        let kind_of = |tree: &SyntaxTree| tree.root().children()[0].as_block().unwrap().kind();
        assert_eq!(kind_of(&statement), BlockKind::Statement);
        assert_eq!(kind_of(&directive), BlockKind::Directive);
    }

    #[test]
    fn comment_in_code_block() {
        let tree = parse("@{ var x = 1; @* note *@ }").unwrap();
        let statement = tree.root().children()[0].as_block().unwrap();
        let kinds: Vec<_> = statement
            .children()
            .iter()
            .filter_map(Node::as_block)
            .map(Block::kind)
            .collect();
        assert_eq!(kinds, vec![BlockKind::Comment]);
        assert!(tree.diagnostics().is_empty());
    }

    #[test]
    fn strings_hide_braces_and_tags() {
        let tree = parse("@{ var s = \"}<p>\"; var c = '}'; }").unwrap();
        let statement = tree.root().children()[0].as_block().unwrap();
        assert!(statement.is_complete());
        assert!(statement.children().iter().all(|c| c.as_span().is_some()));
        assert!(tree.diagnostics().is_empty());
    }

    #[test]
    fn void_and_self_closing_elements_end_at_their_tag() {
        let tree = parse("@{ <br> <img src=\"x\" /> var y = 2; }").unwrap();
        let statement = tree.root().children()[0].as_block().unwrap();
        let markup: Vec<_> = statement
            .children()
            .iter()
            .filter_map(Node::as_block)
            .map(Block::text)
            .collect();
        assert_eq!(markup, vec!["<br>", "<img src=\"x\" />"]);
        assert!(tree.diagnostics().is_empty());
    }

    #[test]
    fn text_tag_wrappers_are_transitions() {
        let tree = parse("@{ <text>hi @name</text> }").unwrap();
        let statement = tree.root().children()[0].as_block().unwrap();
        let markup = statement.children()[3].as_block().unwrap();

        let first = markup.children()[0].as_span().unwrap();
        let last = markup.children().last().and_then(Node::as_span).unwrap();
        assert_eq!((first.kind(), first.text()), (SpanKind::Transition, "<text>"));
        assert_eq!((last.kind(), last.text()), (SpanKind::Transition, "</text>"));

        let chunks = lower(&tree);
        assert!(chunks.iter().all(|c| !matches!(&c.kind, ChunkKind::Literal(l) if l.contains("text>"))));
    }

    #[test]
    fn text_tag_attributes_are_rejected_and_never_output() {
        let tree = parse("@{ <text class=\"@c\">hi</text> }").unwrap();
        let statement = tree.root().children()[0].as_block().unwrap();
        let markup = statement.children()[3].as_block().unwrap();

        let first = markup.children()[0].as_span().unwrap();
        assert_eq!((first.kind(), first.text()), (SpanKind::Transition, "<text class=\"@c\">"));

        let kinds: Vec<_> = lower(&tree).iter().map(|c| c.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                ChunkKind::Statement(" ".to_string()),
                ChunkKind::Literal("hi".to_string()),
                ChunkKind::Statement(" ".to_string()),
            ]
        );

        let messages: Vec<_> = tree.diagnostics().iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["<text> tags cannot have attributes"]);
    }

    #[test]
    fn missing_end_tag_marks_markup_incomplete() {
        let tree = parse("@{ <div><span></span>").unwrap();
        assert_eq!(tree.text(), "@{ <div><span></span>");

        let statement = tree.root().children()[0].as_block().unwrap();
        assert!(!statement.is_complete());
        let markup = statement.children()[3].as_block().unwrap();
        assert!(!markup.is_complete());

        let messages: Vec<_> = tree.diagnostics().iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "element <div> is missing its end tag",
                "code block is missing its closing '}'",
            ]
        );
    }

    #[test]
    fn mismatched_brackets_are_reported() {
        let tree = parse("@(a]b)").unwrap();
        assert_eq!(tree.text(), "@(a]b)");
        assert_eq!(tree.diagnostics().len(), 1);
        assert_eq!(tree.diagnostics()[0].message, "unexpected ']'");
        assert!(tree.root().children()[0].as_block().unwrap().is_complete());
    }

    #[test]
    fn unterminated_string_stops_at_line_end() {
        let tree = parse("@{ var s = \"oops\n}").unwrap();
        let statement = tree.root().children()[0].as_block().unwrap();
        assert!(statement.is_complete());
        assert_eq!(tree.diagnostics()[0].message, "unterminated string literal");
        assert_eq!(tree.diagnostics()[0].severity, Severity::Error);
    }

    #[test]
    fn missing_directive_value() {
        let tree = parse("@inherits\n").unwrap();
        let directive = tree.root().children()[0].as_block().unwrap();
        assert_eq!(directive.kind(), BlockKind::Directive);
        assert_eq!(tree.diagnostics()[0].message, "'inherits' needs a base type name");
        assert!(lower(&tree).iter().all(|c| !matches!(c.kind, ChunkKind::SetBaseType(_))));
    }

    #[test]
    fn parses_decoded_source() {
        let source = SourceText::new(
            Encoding::Utf16Le.encode_with_bom("<p>@name</p>"),
            None,
            Some("index.cshtml".to_string()),
        );
        let tree = TemplateParser::default().parse(&source).unwrap();
        assert_eq!(tree.text(), "<p>@name</p>");
    }
}
