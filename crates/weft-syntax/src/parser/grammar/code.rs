//! # Code Grammar
//!
//! Everything after an `@` in markup. The first token decides the construct:
//!
//! | After `@`                      | Block      | Example                   |
//! |--------------------------------|------------|---------------------------|
//! | `(`                            | Expression | `@(a + b)`                |
//! | `{`                            | Statement  | `@{ var x = 1; }`         |
//! | `inherits`, `using <ns>`       | Directive  | `@inherits MyBase`        |
//! | `functions`                    | Directive  | `@functions { int x; }`   |
//! | `if`, `foreach`, `using (`...  | Statement  | `@if (ok) { <b>yes</b> }` |
//! | any other identifier           | Expression | `@user.Name`              |
//!
//! ## Code scanning
//!
//! Code is not parsed, only scanned: [`code_until`] walks tokens, keeping
//! brackets balanced on the context's nesting stack and skipping over
//! strings and comments, until it finds a stop token at the level it
//! started at.
//!
//! ## Markup inside code
//!
//! Inside statement bodies, a tag or `@:` where a statement could start (at
//! the beginning of the body or after `{`, `}`, `;` or `:`) hands control to
//! the markup grammar for one element or line.

use crate::chunks::ChunkGenerator;
use crate::lexer::CodeToken;
use crate::parser::grammar::{comment, markup};
use crate::parser::{Delimiter, Marker, ParseContext};
use crate::syntax_kind::{AcceptedCharacters, BlockKind, EditHandler, SpanKind};

/// Keywords that start a statement with a braced body.
const BLOCK_KEYWORDS: &[&str] = &[
    "if", "for", "foreach", "while", "switch", "lock", "do", "try", "using",
];

/// Parse the construct starting at an `@` met in markup.
pub fn transition(ctx: &mut ParseContext<'_>) {
    let m = ctx.start_block();
    ctx.bump(1);
    ctx.output_span(SpanKind::Transition, AcceptedCharacters::None, None);

    let Some(token) = ctx.peek_code() else {
        invalid_start(ctx, m);
        return;
    };

    match token.kind {
        CodeToken::LParen => explicit_expression(ctx, m),
        CodeToken::LBrace => statement_block(ctx, m),
        CodeToken::Identifier => match token.text {
            "inherits" => line_directive(ctx, m, LineDirective::Inherits),
            "using" if !followed_by_paren(ctx) => line_directive(ctx, m, LineDirective::Using),
            "functions" => functions_directive(ctx, m),
            keyword if BLOCK_KEYWORDS.contains(&keyword) => keyword_statement(ctx, m),
            _ => implicit_expression(ctx, m),
        },
        _ => invalid_start(ctx, m),
    }
}

/// Whether the identifier at the cursor is followed by `(`.
fn followed_by_paren(ctx: &ParseContext<'_>) -> bool {
    ctx.code_lookahead()
        .skip(1)
        .find(|t| !t.kind.is_trivia())
        .is_some_and(|t| t.kind == CodeToken::LParen)
}

/// `@` followed by something that cannot start code. An empty code span
/// keeps the block's shape so tooling can complete at this position.
fn invalid_start(ctx: &mut ParseContext<'_>, m: Marker) {
    let at = ctx.position().saturating_sub(1);
    ctx.output_span_with(
        SpanKind::Code,
        AcceptedCharacters::NonWhiteSpace,
        Some(ChunkGenerator::Expression),
        EditHandler::ImplicitExpression {
            accept_trailing_dot: ctx.design_time(),
        },
    );

    match ctx.current_char() {
        None => {
            ctx.unterminated("expected code after '@' but found end of input", at);
            m.complete_unterminated(ctx, BlockKind::Expression);
        }
        Some(c) => {
            let message = if c.is_whitespace() {
                "unexpected whitespace after '@'".to_string()
            } else {
                format!("unexpected character '{c}' after '@'")
            };
            ctx.error(message, at);
            m.complete(ctx, BlockKind::Expression);
        }
    }
}

/// `@name`, `@user.Name`, `@items[0].Format("x")`
fn implicit_expression(ctx: &mut ParseContext<'_>, m: Marker) {
    let accept_trailing_dot = ctx.design_time();
    let mut terminated = true;

    'member: loop {
        if let Some(identifier) = ctx.peek_code() {
            ctx.bump(identifier.len());
        }

        // Calls and indexers
        while let Some(token) = ctx.peek_code()
            && matches!(token.kind, CodeToken::LParen | CodeToken::LBracket)
        {
            if !balanced(ctx) {
                terminated = false;
                break 'member;
            }
        }

        let next = {
            let mut ahead = ctx.code_lookahead();
            (ahead.next().map(|t| t.kind), ahead.next().map(|t| t.kind))
        };
        match next {
            (Some(CodeToken::Dot), Some(CodeToken::Identifier)) => ctx.bump(1),
            (Some(CodeToken::Dot), _) if accept_trailing_dot => {
                ctx.bump(1);
                break;
            }
            _ => break,
        }
    }

    ctx.output_span_with(
        SpanKind::Code,
        AcceptedCharacters::NonWhiteSpace,
        Some(ChunkGenerator::Expression),
        EditHandler::ImplicitExpression { accept_trailing_dot },
    );
    if terminated {
        m.complete(ctx, BlockKind::Expression);
    } else {
        m.complete_unterminated(ctx, BlockKind::Expression);
    }
}

/// `@( ... )`
fn explicit_expression(ctx: &mut ParseContext<'_>, m: Marker) {
    let start = ctx.position();
    ctx.bump(1);
    ctx.output_span(SpanKind::MetaCode, AcceptedCharacters::None, None);

    ctx.push_nesting(Delimiter::Paren, start);
    let closed = code_until(ctx, &[CodeToken::RParen], None).is_some();
    ctx.pop_nesting();
    ctx.output_span(SpanKind::Code, AcceptedCharacters::Any, Some(ChunkGenerator::Expression));

    if closed {
        ctx.bump(1);
        ctx.output_span(SpanKind::MetaCode, AcceptedCharacters::None, None);
        m.complete(ctx, BlockKind::Expression);
    } else {
        ctx.unterminated("explicit expression is missing its closing ')'", start);
        m.complete_unterminated(ctx, BlockKind::Expression);
    }
}

/// `@{ ... }`
fn statement_block(ctx: &mut ParseContext<'_>, m: Marker) {
    let start = ctx.position();
    ctx.bump(1);
    ctx.output_span(SpanKind::MetaCode, AcceptedCharacters::None, None);

    ctx.push_nesting(Delimiter::Brace, start);
    let closed = code_until(ctx, &[CodeToken::RBrace], Some(&ChunkGenerator::Statement)).is_some();
    ctx.pop_nesting();
    ctx.output_span(SpanKind::Code, AcceptedCharacters::Any, Some(ChunkGenerator::Statement));

    if closed {
        ctx.bump(1);
        ctx.output_span(SpanKind::MetaCode, AcceptedCharacters::None, None);
        m.complete(ctx, BlockKind::Statement);
    } else {
        ctx.unterminated("code block is missing its closing '}'", start);
        m.complete_unterminated(ctx, BlockKind::Statement);
    }
}

/// `@if (...) { ... } else { ... }` and the other block keywords, including
/// `else`, `catch`, `finally` and `do ... while` continuations.
fn keyword_statement(ctx: &mut ParseContext<'_>, m: Marker) {
    let mut terminated = true;

    while let Some(keyword) = ctx.peek_code() {
        ctx.bump(keyword.len());
        if !keyword_body(ctx) {
            terminated = false;
            break;
        }
        match ctx.peek_code_significant() {
            Some((offset, next)) if next.kind == CodeToken::Identifier && continues(keyword.text, next.text) => {
                ctx.bump(offset);
            }
            _ => break,
        }
    }

    ctx.output_span(SpanKind::Code, AcceptedCharacters::Any, Some(ChunkGenerator::Statement));
    if terminated {
        m.complete(ctx, BlockKind::Statement);
    } else {
        m.complete_unterminated(ctx, BlockKind::Statement);
    }
}

/// Whether keyword `next` continues the statement started by `previous`.
fn continues(previous: &str, next: &str) -> bool {
    matches!(
        (previous, next),
        ("if" | "else", "else") | ("try" | "catch", "catch" | "finally") | ("do", "while")
    )
}

/// Everything after a keyword: a header, then either `{ body }` or `;`.
/// Returns false if input ran out first.
fn keyword_body(ctx: &mut ParseContext<'_>) -> bool {
    let start = ctx.position();
    match code_until(ctx, &[CodeToken::LBrace, CodeToken::Semicolon], None) {
        Some(CodeToken::Semicolon) => {
            ctx.bump(1);
            true
        }
        Some(_) => {
            let open = ctx.position();
            ctx.bump(1);
            ctx.push_nesting(Delimiter::Brace, open);
            let closed = code_until(ctx, &[CodeToken::RBrace], Some(&ChunkGenerator::Statement)).is_some();
            ctx.pop_nesting();
            if closed {
                ctx.bump(1);
            } else {
                ctx.unterminated("statement block is missing its closing '}'", open);
            }
            closed
        }
        None => {
            ctx.unterminated("expected '{' to start the statement body", start);
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineDirective {
    Inherits,
    Using,
}

impl LineDirective {
    fn missing_value(self) -> &'static str {
        match self {
            LineDirective::Inherits => "'inherits' needs a base type name",
            LineDirective::Using => "'using' needs a namespace",
        }
    }

    fn generator(self, value: &str) -> Option<ChunkGenerator> {
        let value = match self {
            LineDirective::Inherits => value,
            LineDirective::Using => value.trim_end_matches(';').trim_end(),
        };
        if value.is_empty() {
            return None;
        }
        Some(match self {
            LineDirective::Inherits => ChunkGenerator::set_base_type(value),
            LineDirective::Using => ChunkGenerator::add_import(value),
        })
    }
}

/// `@inherits Type` and `@using Namespace`, which run to the end of the line.
fn line_directive(ctx: &mut ParseContext<'_>, m: Marker, directive: LineDirective) {
    let start = ctx.position();
    ctx.bump_while(|c| c.is_ascii_alphabetic());
    ctx.bump_while(|c| c == ' ' || c == '\t');
    ctx.output_span(SpanKind::MetaCode, AcceptedCharacters::Any, None);

    let value_start = ctx.position();
    ctx.bump_while(|c| c != '\n' && c != '\r');
    let value = ctx.source()[value_start..ctx.position()].trim();

    let generator = directive.generator(value);
    if generator.is_none() {
        ctx.error(directive.missing_value(), start);
    }
    ctx.output_span(SpanKind::Code, AcceptedCharacters::AnyExceptNewline, generator);
    m.complete(ctx, BlockKind::Directive);
}

/// `@functions { ... }`: members of the generated type.
fn functions_directive(ctx: &mut ParseContext<'_>, m: Marker) {
    let start = ctx.position();
    ctx.bump_while(|c| c.is_ascii_alphabetic());
    ctx.bump_while(char::is_whitespace);

    if ctx.current_char() != Some('{') {
        ctx.output_span(SpanKind::MetaCode, AcceptedCharacters::Any, None);
        if ctx.at_end() {
            ctx.unterminated("expected '{' after 'functions'", start);
            m.complete_unterminated(ctx, BlockKind::Directive);
        } else {
            ctx.error("expected '{' after 'functions'", start);
            m.complete(ctx, BlockKind::Directive);
        }
        return;
    }

    let open = ctx.position();
    ctx.bump(1);
    ctx.output_span(SpanKind::MetaCode, AcceptedCharacters::None, None);

    ctx.push_nesting(Delimiter::Brace, open);
    let closed = code_until(ctx, &[CodeToken::RBrace], None).is_some();
    ctx.pop_nesting();
    ctx.output_span(SpanKind::Code, AcceptedCharacters::Any, Some(ChunkGenerator::TypeMember));

    if closed {
        ctx.bump(1);
        ctx.output_span(SpanKind::MetaCode, AcceptedCharacters::None, None);
        m.complete(ctx, BlockKind::Directive);
    } else {
        ctx.unterminated("'functions' block is missing its closing '}'", open);
        m.complete_unterminated(ctx, BlockKind::Directive);
    }
}

/// Consume a bracketed group at the cursor. Returns false if input ran out
/// before it closed.
fn balanced(ctx: &mut ParseContext<'_>) -> bool {
    let start = ctx.position();
    let Some(delimiter) = ctx.peek_code().and_then(|t| Delimiter::from_token(t.kind)) else {
        return true;
    };
    ctx.bump(1);

    ctx.push_nesting(delimiter, start);
    let closed = code_until(ctx, &[delimiter.closing()], None).is_some();
    ctx.pop_nesting();

    if closed {
        ctx.bump(1);
    } else {
        ctx.unterminated(format!("'{}' is never closed", delimiter.opening()), start);
    }
    closed
}

/// Scan code until one of `stops` appears outside any bracket opened during
/// the scan. Returns the stop found without consuming it, or `None` at end
/// of input.
///
/// With a `statement` generator, markup and comments may appear where a
/// statement could start; pending code is cut into a span carrying that
/// generator before they are parsed.
fn code_until(
    ctx: &mut ParseContext<'_>,
    stops: &[CodeToken],
    statement: Option<&ChunkGenerator>,
) -> Option<CodeToken> {
    let base = ctx.nesting_depth();
    let mut statement_start = true;

    while let Some(token) = ctx.peek_code() {
        if ctx.nesting_depth() == base && stops.contains(&token.kind) {
            return Some(token.kind);
        }

        if let Some(generator) = statement {
            let comment_start = token.kind == CodeToken::Transition && ctx.nth_char(1) == Some('*');
            let markup_start = statement_start
                && match token.kind {
                    CodeToken::Transition => ctx.nth_char(1) == Some(':'),
                    CodeToken::LessThan => markup::tag_head(ctx.rest()).is_some_and(|tag| !tag.is_end),
                    _ => false,
                };
            if comment_start || markup_start {
                if ctx.has_pending() {
                    ctx.output_span(SpanKind::Code, AcceptedCharacters::Any, Some(generator.clone()));
                }
                if comment_start {
                    comment(ctx);
                } else {
                    ctx.enter_markup_mode();
                    statement_start = true;
                }
                continue;
            }
        }

        if let Some(delimiter) = Delimiter::from_token(token.kind) {
            let at = ctx.position();
            ctx.push_nesting(delimiter, at);
            ctx.bump(token.len());
            statement_start = token.kind == CodeToken::LBrace;
            continue;
        }

        match token.kind {
            kind if kind.is_closing_bracket() => {
                if let Some(stop) = close_bracket(ctx, kind, base, stops) {
                    return Some(stop);
                }
            }
            CodeToken::DoubleQuote => quoted(ctx, '"', "string"),
            CodeToken::SingleQuote => quoted(ctx, '\'', "character"),
            CodeToken::VerbatimQuote => verbatim_string(ctx),
            CodeToken::LineComment => {
                ctx.bump_while(|c| c != '\n' && c != '\r');
                continue;
            }
            CodeToken::BlockCommentOpen => {
                block_comment(ctx);
                continue;
            }
            _ => ctx.bump(token.len()),
        }

        if !token.kind.is_trivia() {
            statement_start = matches!(
                token.kind,
                CodeToken::RBrace | CodeToken::Semicolon | CodeToken::Colon
            );
        }
    }

    while ctx.nesting_depth() > base {
        if let Some(unclosed) = ctx.pop_nesting() {
            ctx.unterminated(format!("'{}' is never closed", unclosed.delimiter.opening()), unclosed.offset);
        }
    }
    None
}

/// Handle a closing bracket met while scanning. Returns `Some` when the
/// bracket ends the scan.
fn close_bracket(
    ctx: &mut ParseContext<'_>,
    closer: CodeToken,
    base: usize,
    stops: &[CodeToken],
) -> Option<CodeToken> {
    let start = ctx.position();
    let matching = ctx
        .nesting_above(base)
        .iter()
        .rposition(|n| n.delimiter.closing() == closer);

    match matching {
        Some(index) => {
            // Anything opened after the matching bracket was never closed
            unwind_nesting(ctx, base + index + 1);
            ctx.pop_nesting();
            ctx.bump(1);
            None
        }
        None if stops.contains(&closer) => {
            unwind_nesting(ctx, base);
            Some(closer)
        }
        None => {
            ctx.bump(1);
            ctx.error(format!("unexpected '{}'", &ctx.source()[start..ctx.position()]), start);
            None
        }
    }
}

fn unwind_nesting(ctx: &mut ParseContext<'_>, depth: usize) {
    while ctx.nesting_depth() > depth {
        if let Some(unclosed) = ctx.pop_nesting() {
            ctx.error(format!("'{}' is never closed", unclosed.delimiter.opening()), unclosed.offset);
        }
    }
}

/// A string or character literal; ends at the closing quote or, unclosed,
/// at the end of the line.
fn quoted(ctx: &mut ParseContext<'_>, quote: char, what: &str) {
    let start = ctx.position();
    ctx.bump(1);
    loop {
        match ctx.current_char() {
            None => {
                ctx.unterminated(format!("unterminated {what} literal"), start);
                return;
            }
            Some('\n' | '\r') => {
                ctx.error(format!("unterminated {what} literal"), start);
                return;
            }
            Some('\\') => {
                ctx.bump(1);
                if !matches!(ctx.current_char(), Some('\n' | '\r')) {
                    ctx.bump_char();
                }
            }
            Some(c) => {
                ctx.bump_char();
                if c == quote {
                    return;
                }
            }
        }
    }
}

/// `@"..."`, where `""` is an escaped quote and newlines are allowed.
fn verbatim_string(ctx: &mut ParseContext<'_>) {
    let start = ctx.position();
    ctx.bump(2);
    loop {
        match ctx.bump_char() {
            None => {
                ctx.unterminated("unterminated verbatim string literal", start);
                return;
            }
            Some('"') if ctx.current_char() == Some('"') => ctx.bump(1),
            Some('"') => return,
            Some(_) => {}
        }
    }
}

fn block_comment(ctx: &mut ParseContext<'_>) {
    let start = ctx.position();
    ctx.bump(2);
    match ctx.rest().find("*/") {
        Some(end) => ctx.bump(end + 2),
        None => {
            ctx.bump(ctx.rest().len());
            ctx.unterminated("unterminated block comment", start);
        }
    }
}
