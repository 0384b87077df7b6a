//! # Lexers - Tokenizing Both Grammars
//!
//! A template interleaves two languages over one character stream, so there
//! are two token sets, both generated by [Logos]:
//!
//! - [`MarkupToken`] for literal template text (tags, attributes, prose)
//! - [`CodeToken`] for the embedded code dialect
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## Lexing on demand
//!
//! Neither grammar pre-tokenizes the document. The cursor lives in the
//! [`ParseContext`](crate::parser::ParseContext), and whichever grammar is
//! active lexes forward from that cursor with its own token set. After a
//! handoff the other grammar simply starts lexing from the new position, so a
//! transition never leaves stale tokens behind.
//!
//! ## The Lossless Guarantee
//!
//! As in any lossless lexer, **every byte in the input appears in exactly one
//! token**. Characters that no rule matches become `Text` (markup) or `Other`
//! (code) tokens instead of being skipped:
//!
//! ```
//! use weft_syntax::lexer::lex_markup;
//!
//! let input = "<p>Hello @name</p>";
//! let reconstructed: String = lex_markup(input).iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Token Design
//!
//! Tokens are minimal and context-free. The markup lexer does not know
//! whether `@` starts an expression, an escape or an email address; the code
//! lexer does not know whether `<` is a comparison or the start of a nested
//! tag. Those decisions belong to the grammar rules.
//!
//! String, character and comment *openers* are tokens but their bodies are
//! not: the code grammar scans bodies itself so it can report unterminated
//! literals with a useful location.

use logos::Logos;

/// Tokens of the markup grammar.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupToken {
    /// The `@` transition character
    #[token("@")]
    Transition,

    /// Horizontal whitespace (spaces, tabs)
    #[regex(r"[ \t]+")]
    Whitespace,

    /// Line ending (LF or CRLF)
    #[regex(r"\r?\n")]
    Newline,

    #[token("<")]
    OpenAngle,

    #[token(">")]
    CloseAngle,

    #[token("/")]
    ForwardSlash,

    #[token("=")]
    Equals,

    #[token("\"")]
    DoubleQuote,

    #[token("'")]
    SingleQuote,

    /// Runs of anything else
    #[regex(r#"[^@<>/="' \t\r\n]+"#)]
    Text,
}

impl MarkupToken {
    pub fn is_trivia(self) -> bool {
        matches!(self, MarkupToken::Whitespace | MarkupToken::Newline)
    }
}

/// Tokens of the embedded code grammar.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeToken {
    /// Horizontal whitespace (spaces, tabs)
    #[regex(r"[ \t]+")]
    Whitespace,

    /// Line ending (LF or CRLF)
    #[regex(r"\r?\n")]
    Newline,

    /// Letters in any script, as in `@café` or `@größe`
    #[regex(r"[\p{L}_][\p{L}\p{N}_]*", priority = 3)]
    Identifier,

    #[regex(r"[0-9][0-9A-Za-z_]*")]
    Number,

    /// Opens a string literal
    #[token("\"")]
    DoubleQuote,

    /// Opens a verbatim string literal (`@"..."`)
    #[token("@\"")]
    VerbatimQuote,

    /// Opens a character literal
    #[token("'")]
    SingleQuote,

    #[token("//")]
    LineComment,

    #[token("/*")]
    BlockCommentOpen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("@")]
    Transition,

    #[token("<")]
    LessThan,

    #[token(".")]
    Dot,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    /// Single-character operators and punctuation
    #[regex(r"[!#$%&*+,\-=>?^|~\\/]")]
    Punct,

    /// Non-ASCII characters that start no other token; stray bytes such as a
    /// lone `\r` also map here
    #[regex(r"[^\x00-\x7F]")]
    Other,
}

impl CodeToken {
    pub fn is_trivia(self) -> bool {
        matches!(self, CodeToken::Whitespace | CodeToken::Newline)
    }

    pub fn is_closing_bracket(self) -> bool {
        matches!(
            self,
            CodeToken::RBrace | CodeToken::RParen | CodeToken::RBracket
        )
    }
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a, K> {
    pub kind: K,
    pub text: &'a str,
}

impl<K> Token<'_, K> {
    /// Length of the token in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Lazily lex markup tokens from the start of `input`.
pub fn markup_tokens(input: &str) -> impl Iterator<Item = Token<'_, MarkupToken>> + '_ {
    let mut lexer = MarkupToken::lexer(input);
    std::iter::from_fn(move || {
        let result = lexer.next()?;
        // Unrecognized characters are still markup text
        let kind = result.unwrap_or(MarkupToken::Text);
        Some(Token {
            kind,
            text: lexer.slice(),
        })
    })
}

/// Lazily lex code tokens from the start of `input`.
pub fn code_tokens(input: &str) -> impl Iterator<Item = Token<'_, CodeToken>> + '_ {
    let mut lexer = CodeToken::lexer(input);
    std::iter::from_fn(move || {
        let result = lexer.next()?;
        let kind = result.unwrap_or(CodeToken::Other);
        Some(Token {
            kind,
            text: lexer.slice(),
        })
    })
}

/// Lex all of `input` as markup.
pub fn lex_markup(input: &str) -> Vec<Token<'_, MarkupToken>> {
    markup_tokens(input).collect()
}

/// Lex all of `input` as code.
pub fn lex_code(input: &str) -> Vec<Token<'_, CodeToken>> {
    code_tokens(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn markup(kind: MarkupToken, text: &str) -> Token<'_, MarkupToken> {
        Token { kind, text }
    }

    fn code(kind: CodeToken, text: &str) -> Token<'_, CodeToken> {
        Token { kind, text }
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(lex_markup(""), vec![]);
        assert_eq!(lex_code(""), vec![]);
    }

    #[test]
    fn lex_markup_text_and_transition() {
        assert_eq!(
            lex_markup("foo @bar baz"),
            vec![
                markup(MarkupToken::Text, "foo"),
                markup(MarkupToken::Whitespace, " "),
                markup(MarkupToken::Transition, "@"),
                markup(MarkupToken::Text, "bar"),
                markup(MarkupToken::Whitespace, " "),
                markup(MarkupToken::Text, "baz"),
            ]
        );
    }

    #[test]
    fn lex_markup_tag() {
        assert_eq!(
            lex_markup("<a href=\"x\"/>"),
            vec![
                markup(MarkupToken::OpenAngle, "<"),
                markup(MarkupToken::Text, "a"),
                markup(MarkupToken::Whitespace, " "),
                markup(MarkupToken::Text, "href"),
                markup(MarkupToken::Equals, "="),
                markup(MarkupToken::DoubleQuote, "\""),
                markup(MarkupToken::Text, "x"),
                markup(MarkupToken::DoubleQuote, "\""),
                markup(MarkupToken::ForwardSlash, "/"),
                markup(MarkupToken::CloseAngle, ">"),
            ]
        );
    }

    #[test]
    fn lex_markup_newlines() {
        assert_eq!(
            lex_markup("a\r\nb\n"),
            vec![
                markup(MarkupToken::Text, "a"),
                markup(MarkupToken::Newline, "\r\n"),
                markup(MarkupToken::Text, "b"),
                markup(MarkupToken::Newline, "\n"),
            ]
        );
    }

    #[test]
    fn lex_code_member_access() {
        assert_eq!(
            lex_code("user.Name(1)"),
            vec![
                code(CodeToken::Identifier, "user"),
                code(CodeToken::Dot, "."),
                code(CodeToken::Identifier, "Name"),
                code(CodeToken::LParen, "("),
                code(CodeToken::Number, "1"),
                code(CodeToken::RParen, ")"),
            ]
        );
    }

    #[test]
    fn lex_code_unicode_identifiers() {
        assert_eq!(
            lex_code("café.größe_2 €"),
            vec![
                code(CodeToken::Identifier, "café"),
                code(CodeToken::Dot, "."),
                code(CodeToken::Identifier, "größe_2"),
                code(CodeToken::Whitespace, " "),
                code(CodeToken::Other, "€"),
            ]
        );
    }

    #[test]
    fn lex_code_literal_openers() {
        assert_eq!(
            lex_code("@\"a\" // c"),
            vec![
                code(CodeToken::VerbatimQuote, "@\""),
                code(CodeToken::Identifier, "a"),
                code(CodeToken::DoubleQuote, "\""),
                code(CodeToken::Whitespace, " "),
                code(CodeToken::LineComment, "//"),
                code(CodeToken::Whitespace, " "),
                code(CodeToken::Identifier, "c"),
            ]
        );
    }

    #[test]
    fn lex_code_punctuation_is_single_characters() {
        assert_eq!(
            lex_code("a+=b/c"),
            vec![
                code(CodeToken::Identifier, "a"),
                code(CodeToken::Punct, "+"),
                code(CodeToken::Punct, "="),
                code(CodeToken::Identifier, "b"),
                code(CodeToken::Punct, "/"),
                code(CodeToken::Identifier, "c"),
            ]
        );
    }

    #[test]
    fn unrecognized_characters_are_kept() {
        assert_eq!(lex_code("€"), vec![code(CodeToken::Other, "€")]);
        assert_eq!(lex_markup("\u{a0}"), vec![markup(MarkupToken::Text, "\u{a0}")]);
    }

    #[test]
    fn all_bytes_preserved() {
        let input = "@{ var x = \"<p>\"; } <div class='a'>@x</div>\r\n@* note *@";
        let markup_text: String = lex_markup(input).iter().map(|t| t.text).collect();
        let code_text: String = lex_code(input).iter().map(|t| t.text).collect();
        assert_eq!(markup_text, input);
        assert_eq!(code_text, input);
    }

    #[test]
    fn closing_brackets() {
        assert!(CodeToken::RBracket.is_closing_bracket());
        assert!(!CodeToken::LBrace.is_closing_bracket());
    }
}
