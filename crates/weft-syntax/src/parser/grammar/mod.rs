//! # Grammar Rules
//!
//! Each function takes a `&mut ParseContext` and uses its methods to:
//!
//! 1. Inspect the input (`ctx.peek_markup()`, `ctx.peek_code()`, `ctx.at_str()`)
//! 2. Move the cursor (`ctx.bump()`, `ctx.bump_while()`)
//! 3. Cut spans and build blocks (`ctx.output_span()`, `ctx.start_block()`)
//!
//! ## Module Structure
//!
//! - [`markup`] - Literal text, escapes, and tags nested inside code
//! - [`code`] - Everything after an `@`: expressions, statements, directives
//!
//! ## Error Recovery
//!
//! Grammar functions never fail. Unexpected input becomes part of the
//! current span and a diagnostic is recorded; a construct still open at end
//! of input is closed as incomplete. Every byte ends up in exactly one span.

pub(crate) mod code;
pub(crate) mod markup;

use crate::parser::ParseContext;
use crate::syntax_kind::{AcceptedCharacters, BlockKind, SpanKind};

/// Parse the root document: a single Markup block holding everything.
pub fn document(ctx: &mut ParseContext<'_>) {
    let m = ctx.start_block();
    markup::top_level(ctx);
    ctx.output_markup_span();
    m.complete(ctx, BlockKind::Markup);
}

/// Parse a `@* ... *@` comment. Valid in both markup and code.
pub fn comment(ctx: &mut ParseContext<'_>) {
    let m = ctx.start_block();
    let start = ctx.position();

    ctx.bump(1);
    ctx.output_span(SpanKind::Transition, AcceptedCharacters::None, None);
    ctx.bump(1);
    ctx.output_span(SpanKind::MetaCode, AcceptedCharacters::None, None);

    match ctx.rest().find("*@") {
        Some(end) => {
            ctx.bump(end);
            ctx.output_span(SpanKind::Comment, AcceptedCharacters::Any, None);
            ctx.bump(1);
            ctx.output_span(SpanKind::MetaCode, AcceptedCharacters::None, None);
            ctx.bump(1);
            ctx.output_span(SpanKind::Transition, AcceptedCharacters::None, None);
            m.complete(ctx, BlockKind::Comment);
        }
        None => {
            ctx.bump(ctx.rest().len());
            ctx.output_span(SpanKind::Comment, AcceptedCharacters::Any, None);
            ctx.unterminated("comment is missing its closing '*@'", start);
            m.complete_unterminated(ctx, BlockKind::Comment);
        }
    }
}
