//! # Markup Grammar
//!
//! Markup is literal output. At the top level the grammar only looks for
//! `@`; tags are plain text there. Inside code, a tag at the start of a
//! statement switches back to markup for exactly one element:
//!
//! ```text
//! @foreach (var item in items) { <li>@item</li> }
//!                                └──────┬─────┘
//!                          nested Markup block, ends at the matching </li>
//! ```
//!
//! ## Transitions
//!
//! | Input         | Result                                       |
//! |---------------|----------------------------------------------|
//! | `@@`          | escaped `@`, literal text                    |
//! | `a@b`         | email address, literal text                  |
//! | `@* ... *@`   | Comment block                                |
//! | `@` otherwise | handed to the code grammar                   |
//!
//! ## Nested markup
//!
//! - `<tag ...>` up to its matching end tag, counting same-name nesting
//! - void elements (`<br>`, `<img>`, ...) and `<tag />` end at their `>`
//! - `<text>...</text>` groups markup; the wrapper tags become Transition
//!   spans and are not output
//! - `@:` makes the rest of the line markup

use crate::parser::ParseContext;
use crate::parser::grammar::comment;
use crate::lexer::MarkupToken;
use crate::syntax_kind::{AcceptedCharacters, BlockKind, SpanKind};

/// HTML void elements, which never have end tags.
const HTML_VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

fn is_void_element(name: &str) -> bool {
    HTML_VOID_ELEMENTS.contains(&name.to_lowercase().as_str())
}

/// The head of a tag: `<name` or `</name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHead<'a> {
    pub name: &'a str,
    pub is_end: bool,
    pub self_closing: bool,
}

/// Recognize a tag head at the start of `rest`.
pub fn tag_head(rest: &str) -> Option<TagHead<'_>> {
    let after = rest.strip_prefix('<')?;
    let (is_end, after) = match after.strip_prefix('/') {
        Some(after) => (true, after),
        None => (false, after),
    };
    if !after.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let len = after
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | ':' | '_' | '.')))
        .unwrap_or(after.len());
    let self_closing = !is_end
        && after
            .find('>')
            .is_some_and(|gt| after[..gt].trim_end().ends_with('/'));

    Some(TagHead {
        name: &after[..len],
        is_end,
        self_closing,
    })
}

/// Where a run of markup content stops.
#[derive(Debug, Clone, Copy)]
enum Until<'a> {
    EndOfInput,
    /// After the next newline
    EndOfLine,
    /// Before the end tag closing the element `name`
    EndTag(&'a str),
}

/// Top-level document content: everything up to end of input.
pub fn top_level(ctx: &mut ParseContext<'_>) {
    content(ctx, Until::EndOfInput);
}

/// Parse one markup construct embedded in code: a `@:` line or an element.
pub fn nested(ctx: &mut ParseContext<'_>) {
    let m = ctx.start_block();

    if ctx.at_str("@:") {
        ctx.bump(1);
        ctx.output_span(SpanKind::Transition, AcceptedCharacters::None, None);
        ctx.bump(1);
        ctx.output_span(SpanKind::MetaCode, AcceptedCharacters::Any, None);
        content(ctx, Until::EndOfLine);
        ctx.output_markup_span();
        m.complete(ctx, BlockKind::Markup);
        return;
    }

    let terminated = element(ctx);
    if terminated {
        line_break(ctx);
    }
    ctx.output_markup_span();

    if terminated {
        m.complete(ctx, BlockKind::Markup);
    } else {
        m.complete_unterminated(ctx, BlockKind::Markup);
    }
}

/// Consume markup until `until` is met. Returns false if input ran out
/// first while looking for an end tag.
fn content(ctx: &mut ParseContext<'_>, until: Until<'_>) -> bool {
    // Open elements with the same name as the one we are closing
    let mut depth = 0usize;

    while let Some(token) = ctx.peek_markup() {
        match token.kind {
            MarkupToken::Transition => transition(ctx),
            MarkupToken::Newline if matches!(until, Until::EndOfLine) => {
                ctx.bump(token.len());
                return true;
            }
            MarkupToken::OpenAngle => {
                if let Until::EndTag(name) = until
                    && let Some(tag) = tag_head(ctx.rest())
                    && tag.name == name
                {
                    if tag.is_end {
                        if depth == 0 {
                            return true;
                        }
                        depth -= 1;
                    } else if !tag.self_closing {
                        depth += 1;
                    }
                }
                ctx.bump(token.len());
            }
            _ => ctx.bump(token.len()),
        }
    }

    !matches!(until, Until::EndTag(_))
}

/// Handle an `@` met in markup.
fn transition(ctx: &mut ParseContext<'_>) {
    match ctx.nth_char(1) {
        Some('@') => {
            // The first `@` is swallowed, the second is literal text
            ctx.output_markup_span();
            ctx.bump(1);
            ctx.output_span(SpanKind::Markup, AcceptedCharacters::None, None);
            ctx.bump(1);
        }
        Some('*') => {
            ctx.output_markup_span();
            comment(ctx);
        }
        Some(next) if next.is_alphanumeric() && ctx.previous_char().is_some_and(char::is_alphanumeric) => {
            // user@example.com
            ctx.bump(1);
        }
        _ => {
            ctx.output_markup_span();
            ctx.enter_code_mode();
        }
    }
}

/// Parse one element starting at `<`. Returns false if input ran out
/// before the element was closed.
fn element(ctx: &mut ParseContext<'_>) -> bool {
    let start = ctx.position();
    let Some(head) = tag_head(ctx.rest()) else {
        ctx.bump(1);
        return true;
    };

    if head.name == "text" {
        return text_element(ctx, start);
    }

    let Some(self_closing) = start_tag(ctx, head.name, true) else {
        ctx.unterminated(format!("start tag <{}> is missing its closing '>'", head.name), start);
        return false;
    };
    if self_closing || is_void_element(head.name) {
        return true;
    }

    if !content(ctx, Until::EndTag(head.name)) {
        ctx.unterminated(format!("element <{}> is missing its end tag", head.name), start);
        return false;
    }
    end_tag(ctx)
}

/// `<text>` groups markup without being output itself. Its start tag is
/// taken verbatim, so nothing inside it reaches the output either.
fn text_element(ctx: &mut ParseContext<'_>, start: usize) -> bool {
    let Some(self_closing) = start_tag(ctx, "text", false) else {
        ctx.output_span(SpanKind::Transition, AcceptedCharacters::None, None);
        ctx.unterminated("start tag <text> is missing its closing '>'", start);
        return false;
    };
    let attributes = ctx.source()[start + "<text".len()..ctx.position()]
        .trim_end_matches('>')
        .trim_end_matches('/')
        .trim();
    if !attributes.is_empty() {
        ctx.error("<text> tags cannot have attributes", start);
    }
    ctx.output_span(SpanKind::Transition, AcceptedCharacters::None, None);
    if self_closing {
        return true;
    }

    if !content(ctx, Until::EndTag("text")) {
        ctx.unterminated("element <text> is missing its end tag", start);
        return false;
    }
    ctx.output_markup_span();
    let closed = end_tag(ctx);
    ctx.output_span(SpanKind::Transition, AcceptedCharacters::None, None);
    closed
}

/// Consume `<name ...>`, including code transitions inside attributes when
/// `transitions` is set. Returns whether the tag was self-closing, or `None`
/// if input ran out first.
fn start_tag(ctx: &mut ParseContext<'_>, name: &str, transitions: bool) -> Option<bool> {
    ctx.bump(1 + name.len());
    let mut quote: Option<MarkupToken> = None;
    let mut slash = false;

    while let Some(token) = ctx.peek_markup() {
        match token.kind {
            MarkupToken::Transition if transitions => {
                transition(ctx);
                slash = false;
                continue;
            }
            MarkupToken::CloseAngle if quote.is_none() => {
                ctx.bump(token.len());
                return Some(slash);
            }
            MarkupToken::DoubleQuote | MarkupToken::SingleQuote => {
                quote = match quote {
                    Some(open) if open == token.kind => None,
                    Some(open) => Some(open),
                    None => Some(token.kind),
                };
            }
            _ => {}
        }
        if !token.kind.is_trivia() {
            slash = quote.is_none() && token.kind == MarkupToken::ForwardSlash;
        }
        ctx.bump(token.len());
    }

    None
}

/// Consume `</name ...>`. Returns false if input ran out before the `>`.
fn end_tag(ctx: &mut ParseContext<'_>) -> bool {
    let start = ctx.position();
    while let Some(token) = ctx.peek_markup() {
        ctx.bump(token.len());
        if token.kind == MarkupToken::CloseAngle {
            return true;
        }
    }
    ctx.unterminated("end tag is missing its closing '>'", start);
    false
}

/// Take trailing spaces and the newline after an element, if nothing else
/// follows it on the line.
fn line_break(ctx: &mut ParseContext<'_>) {
    let rest = ctx.rest();
    let trimmed = rest.trim_start_matches([' ', '\t']);
    let newline = if trimmed.starts_with("\r\n") {
        2
    } else if trimmed.starts_with('\n') {
        1
    } else {
        return;
    };
    ctx.bump(rest.len() - trimmed.len() + newline);
}
