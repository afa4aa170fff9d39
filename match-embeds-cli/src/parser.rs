// Copyright (c) The match-embeds Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parses the textual structure format: two `structure`s back-to-back per
//! file, per the grammar:
//!
//! ```text
//! structure := '{' prop (',' prop)* '}'
//! prop      := symbol
//!            | symbol '(' arg (',' arg)* ')'
//! symbol, arg := bare-identifier | single-quoted | double-quoted
//! ```
//!
//! Whitespace is insignificant; `#` begins a line comment. This hand-rolled
//! scanner mirrors the state machine of the original `formats.h` reader, just
//! expressed as an explicit token stream plus a small recursive-descent parser
//! instead of a character-at-a-time switch.

use thiserror::Error;

/// A parsed but not-yet-interned proposition: a symbol name plus its ordered
/// argument names (empty for a 0-ary proposition).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawProp {
    pub symbol: String,
    pub args: Vec<String>,
}

/// A parsed but not-yet-interned structure: an ordered list of propositions.
pub type RawStructure = Vec<RawProp>;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unterminated quoted identifier starting at byte {0}")]
    UnterminatedString(usize),
    #[error("expected {expected} at byte {pos}, found {found:?}")]
    Unexpected {
        expected: &'static str,
        found: String,
        pos: usize,
    },
    #[error("trailing input after the second structure, starting at byte {0}")]
    TrailingInput(usize),
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Ident(String),
}

fn is_structural(c: char) -> bool {
    matches!(c, '{' | '}' | '(' | ')' | ',' | '#' | '\'' | '"')
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '#' {
            while let Some(&(_, c)) = chars.peek() {
                if c == '\n' {
                    break;
                }
                chars.next();
            }
            continue;
        }
        match c {
            '{' => {
                tokens.push((Token::LBrace, pos));
                chars.next();
            }
            '}' => {
                tokens.push((Token::RBrace, pos));
                chars.next();
            }
            '(' => {
                tokens.push((Token::LParen, pos));
                chars.next();
            }
            ')' => {
                tokens.push((Token::RParen, pos));
                chars.next();
            }
            ',' => {
                tokens.push((Token::Comma, pos));
                chars.next();
            }
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let start = pos;
                let mut ident = String::new();
                loop {
                    match chars.next() {
                        Some((_, c)) if c == quote => break,
                        Some((_, c)) => ident.push(c),
                        None => return Err(ParseError::UnterminatedString(start)),
                    }
                }
                tokens.push((Token::Ident(ident), start));
            }
            _ => {
                let start = pos;
                let mut end = pos;
                while let Some(&(p, c)) = chars.peek() {
                    if c.is_whitespace() || is_structural(c) {
                        break;
                    }
                    end = p + c.len_utf8();
                    chars.next();
                }
                tokens.push((Token::Ident(bytes_to_str(bytes, start, end)), start));
            }
        }
    }
    Ok(tokens)
}

fn bytes_to_str(bytes: &[u8], start: usize, end: usize) -> String {
    std::str::from_utf8(&bytes[start..end])
        .expect("token boundaries fall on char boundaries")
        .to_owned()
}

struct Parser<'a> {
    tokens: &'a [(Token, usize)],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&(Token, usize)> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&(Token, usize)> {
        let t = self.tokens.get(self.pos);
        self.pos += 1;
        t
    }

    fn expect(&mut self, expected: &'static str, matcher: impl Fn(&Token) -> bool) -> Result<usize, ParseError> {
        match self.advance() {
            Some((tok, pos)) if matcher(tok) => Ok(*pos),
            Some((tok, pos)) => Err(ParseError::Unexpected {
                expected,
                found: format!("{tok:?}"),
                pos: *pos,
            }),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn parse_ident(&mut self) -> Result<String, ParseError> {
        match self.advance() {
            Some((Token::Ident(s), _)) => Ok(s.clone()),
            Some((tok, pos)) => Err(ParseError::Unexpected {
                expected: "identifier",
                found: format!("{tok:?}"),
                pos: *pos,
            }),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn parse_prop(&mut self) -> Result<RawProp, ParseError> {
        let symbol = self.parse_ident()?;
        let args = if matches!(self.peek(), Some((Token::LParen, _))) {
            self.advance();
            let mut args = vec![self.parse_ident()?];
            while matches!(self.peek(), Some((Token::Comma, _))) {
                self.advance();
                args.push(self.parse_ident()?);
            }
            self.expect("')'", |t| *t == Token::RParen)?;
            args
        } else {
            Vec::new()
        };
        Ok(RawProp { symbol, args })
    }

    fn parse_structure(&mut self) -> Result<RawStructure, ParseError> {
        self.expect("'{'", |t| *t == Token::LBrace)?;
        let mut props = vec![self.parse_prop()?];
        while matches!(self.peek(), Some((Token::Comma, _))) {
            self.advance();
            props.push(self.parse_prop()?);
        }
        self.expect("'}'", |t| *t == Token::RBrace)?;
        Ok(props)
    }
}

/// Parses a file's two back-to-back structures (A, then B).
pub fn parse_structures(input: &str) -> Result<(RawStructure, RawStructure), ParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let a = parser.parse_structure()?;
    let b = parser.parse_structure()?;
    if let Some((_, pos)) = parser.peek() {
        return Err(ParseError::TrailingInput(*pos));
    }
    Ok((a, b))
}
