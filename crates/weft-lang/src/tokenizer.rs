//! Tokenizer for Weft source text.
//!
//! Tokens are separated by whitespace; the only exception is the
//! double-quoted string literal, which may contain spaces.

use weft_core::{Diagnostic, ErrorCode, Pos, Span};

/// Lexical class of a token.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum TokenKind<'src> {
    /// A decimal integer or float literal.
    Number(f64),
    /// A quoted string, quotes stripped.
    Str(&'src str),
    /// Anything else: an identifier to look up in the vocabulary.
    Word(&'src str),
}

/// A raw source token.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Token<'src> {
    pub text: &'src str,
    pub span: Span,
    pub kind: TokenKind<'src>,
}

/// Pull-based tokenizer over a source string.
pub struct Tokenizer<'src> {
    source: &'src str,
    pos: usize,
}

impl<'src> Tokenizer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self { source, pos: 0 }
    }

    /// The next token, `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token<'src>>, Diagnostic> {
        let bytes = self.source.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return Ok(None);
        }
        if bytes[self.pos] == b'"' {
            return self.string_literal().map(Some);
        }

        let start = self.pos;
        while self.pos < bytes.len() && !bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        let text = &self.source[start..self.pos];
        let span = span_of(start, self.pos);

        if let Ok(n) = text.parse::<f64>() {
            return Ok(Some(Token {
                text,
                span,
                kind: TokenKind::Number(n),
            }));
        }
        // Everything else is a word. Digit-leading tokens that fail to
        // parse may still be vocabulary words (`0=`, `0BRANCH`); the parser
        // reports them as malformed literals only when lookup fails too.
        Ok(Some(Token {
            text,
            span,
            kind: TokenKind::Word(text),
        }))
    }

    fn string_literal(&mut self) -> Result<Token<'src>, Diagnostic> {
        let bytes = self.source.as_bytes();
        let start = self.pos;
        self.pos += 1; // opening quote
        while self.pos < bytes.len() && bytes[self.pos] != b'"' {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return Err(
                Diagnostic::error(ErrorCode::E002, span_of(start, self.pos)).build(),
            );
        }
        self.pos += 1; // closing quote
        let text = &self.source[start..self.pos];
        Ok(Token {
            text,
            span: span_of(start, self.pos),
            kind: TokenKind::Str(&text[1..text.len() - 1]),
        })
    }
}

fn span_of(start: usize, end: usize) -> Span {
    Span::new(Pos::new(start as u32), Pos::new(end as u32))
}

/// True if a token starts the way a number does. Used by the parser to
/// tell a typo'd literal from a plain unknown word.
pub fn looks_numeric(text: &str) -> bool {
    let bytes = text.as_bytes();
    match bytes {
        [] => false,
        [first, ..] if first.is_ascii_digit() => true,
        [b'-' | b'+' | b'.', second, ..] => second.is_ascii_digit(),
        _ => false,
    }
}
