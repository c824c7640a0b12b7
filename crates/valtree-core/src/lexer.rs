//! Tokenizer for the value-tree text format.
//!
//! The lexer is pulled one token at a time by the deserializer. Line breaks are
//! significant (they separate container elements), so they surface as
//! [`TokenKind::Linefeed`] tokens, with these rules:
//!
//! - a run of line breaks, blank lines and comment-only lines is one `Linefeed`
//! - no `Linefeed` is produced at the start of input or right after a comma
//!
//! `//` starts a comment that runs to the end of the line. Numeric literals are
//! unsigned; a leading `-` is its own [`TokenKind::Minus`] token.

use std::borrow::Cow;
use std::fmt;

use crate::error::{ParseResult, Position, SyntaxError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Int,
    Float,
    Str,
    Nil,
    Minus,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Ident,
    Comma,
    Linefeed,
    EndOfFile,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Int => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::Str => "string literal",
            TokenKind::Nil => "`nil`",
            TokenKind::Minus => "`-`",
            TokenKind::LeftBracket => "`[`",
            TokenKind::RightBracket => "`]`",
            TokenKind::LeftBrace => "`{`",
            TokenKind::RightBrace => "`}`",
            TokenKind::Ident => "identifier",
            TokenKind::Comma => "`,`",
            TokenKind::Linefeed => "line break",
            TokenKind::EndOfFile => "end of input",
        };
        f.write_str(s)
    }
}

/// A single token with its literal payload and start position.
///
/// `text` borrows from the source except for string literals, which carry
/// their unescaped contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: Cow<'src, str>,
    pub position: Position,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Int | TokenKind::Float | TokenKind::Ident => {
                write!(f, "`{}`", self.text)
            }
            TokenKind::Str => write!(f, "{:?}", self.text),
            other => fmt::Display::fmt(&other, f),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    src: &'src str,
    offset: usize,
    line: u32,
    column: u32,
    suppress_linefeed: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            src,
            offset: 0,
            line: 1,
            column: 1,
            suppress_linefeed: true,
        }
    }

    /// Current position in the source.
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Scan the next token. Once the input is exhausted every call yields
    /// [`TokenKind::EndOfFile`].
    pub fn next_token(&mut self) -> ParseResult<Token<'src>> {
        let token = self.scan()?;
        self.suppress_linefeed = matches!(token.kind, TokenKind::Comma | TokenKind::Linefeed);
        Ok(token)
    }

    fn scan(&mut self) -> ParseResult<Token<'src>> {
        let mut linefeed_at = None;
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.bump();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.bump();
                    }
                }
                Some('\n') => {
                    if linefeed_at.is_none() && !self.suppress_linefeed {
                        linefeed_at = Some((self.offset, self.position()));
                    }
                    self.bump();
                }
                _ => break,
            }
        }

        if let Some((start, position)) = linefeed_at {
            return Ok(Token {
                kind: TokenKind::Linefeed,
                text: Cow::Borrowed(&self.src[start..start + 1]),
                position,
            });
        }

        let start = self.offset;
        let position = self.position();
        let Some(c) = self.bump() else {
            return Ok(self.token(TokenKind::EndOfFile, start, position));
        };

        let kind = match c {
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            ',' => TokenKind::Comma,
            '-' => TokenKind::Minus,
            '"' => return self.string(position),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => {
                while self
                    .peek()
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    self.bump();
                }
                if &self.src[start..self.offset] == "nil" {
                    TokenKind::Nil
                } else {
                    TokenKind::Ident
                }
            }
            other => {
                return Err(SyntaxError::new(
                    format!("illegal character: {other:?}"),
                    position,
                ))
            }
        };
        Ok(self.token(kind, start, position))
    }

    /// Scan the rest of a numeric literal whose first digit is consumed.
    fn number(&mut self) -> TokenKind {
        let mut kind = TokenKind::Int;
        self.digits();
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.digits();
            kind = TokenKind::Float;
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let mut rest = self.src[self.offset..].chars().skip(1);
            let has_exponent = match rest.next() {
                Some('+' | '-') => rest.next().is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if has_exponent {
                self.bump();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.bump();
                }
                self.digits();
                kind = TokenKind::Float;
            }
        }
        kind
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn string(&mut self, position: Position) -> ParseResult<Token<'src>> {
        let mut out = String::new();
        loop {
            let escape_at = self.position();
            match self.bump() {
                None => return Err(SyntaxError::new("unterminated string literal", position)),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    Some('0') => out.push('\0'),
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    Some('\'') => out.push('\''),
                    Some('x') => out.push(self.hex_escape(escape_at)?),
                    Some(other) => {
                        return Err(SyntaxError::new(
                            format!("unknown escape sequence: \\{other}"),
                            escape_at,
                        ))
                    }
                    None => return Err(SyntaxError::new("unterminated string literal", position)),
                },
                Some(c) => out.push(c),
            }
        }
        Ok(Token {
            kind: TokenKind::Str,
            text: Cow::Owned(out),
            position,
        })
    }

    fn hex_escape(&mut self, escape_at: Position) -> ParseResult<char> {
        let mut code = 0u32;
        for _ in 0..2 {
            let digit = self.bump().and_then(|c| c.to_digit(16)).ok_or_else(|| {
                SyntaxError::new("\\x escape needs two hex digits", escape_at)
            })?;
            code = code * 16 + digit;
        }
        if code > 0x7f {
            return Err(SyntaxError::new(
                format!("\\x{code:02x} is outside the ASCII range"),
                escape_at,
            ));
        }
        char::from_u32(code)
            .ok_or_else(|| SyntaxError::new("invalid \\x escape", escape_at))
    }

    fn token(&self, kind: TokenKind, start: usize, position: Position) -> Token<'src> {
        Token {
            kind,
            text: Cow::Borrowed(&self.src[start..self.offset]),
            position,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.offset..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.src[self.offset..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }
}
