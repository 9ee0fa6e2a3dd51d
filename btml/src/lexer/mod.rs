pub mod token;

use thiserror::Error;

pub use token::{Position, Spanned, Token, TokenKind};

/// Marker that switches on the `<!DOCTYPE html>` preamble.
const DOCTYPE_MARKER: &str = "!html!";

/// Problems found while lexing. Carried inside [`Token::Invalid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("invalid character `{0}`")]
    InvalidCharacter(char),
}

/// Tokenize BTML source lazily.
///
/// Never fails: bad input becomes [`Token::Invalid`]. The sequence always ends
/// with exactly one [`Token::EndOfInput`].
pub fn tokenize(source: &str) -> Lexer<'_> {
    Lexer::new(source)
}

/// Iterator over the tokens of a source string.
pub struct Lexer<'a> {
    source: &'a str,
    /// Byte offset of the next unread character.
    offset: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            offset: 0,
            line: 1,
            column: 1,
            finished: false,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn cursor(&self) -> Position {
        Position {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Skip whitespace and `//` line comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.rest().starts_with("//") => {
                    while let Some(ch) = self.bump() {
                        if ch == '\n' {
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    /// Called with the opening quote already consumed.
    fn string(&mut self) -> Token {
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Token::Invalid(LexError::UnterminatedString),
                Some('"') => return Token::String(value),
                Some('\\') => match self.bump() {
                    Some(escaped @ ('"' | '\\')) => value.push(escaped),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return Token::Invalid(LexError::UnterminatedString),
                },
                Some(ch) => value.push(ch),
            }
        }
    }

    /// Called with the leading `!` already consumed.
    fn bang(&mut self) -> Token {
        let tail = &DOCTYPE_MARKER[1..];
        if self.rest().starts_with(tail) {
            for _ in 0..tail.len() {
                self.bump();
            }
            Token::Bang
        } else {
            Token::Invalid(LexError::InvalidCharacter('!'))
        }
    }

    fn identifier(&mut self, start: usize) -> Token {
        while self.peek().is_some_and(is_identifier_continue) {
            self.bump();
        }
        Token::Identifier(self.source[start..self.offset].to_string())
    }
}

impl Iterator for Lexer<'_> {
    type Item = Spanned;

    fn next(&mut self) -> Option<Spanned> {
        if self.finished {
            return None;
        }

        self.skip_trivia();
        let start = self.cursor();

        let Some(ch) = self.bump() else {
            self.finished = true;
            return Some(Spanned {
                token: Token::EndOfInput,
                span: start.offset..start.offset,
                position: start,
                end: start,
            });
        };

        let token = match ch {
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '=' => Token::Equals,
            ',' => Token::Comma,
            '.' => Token::Dot,
            '"' => self.string(),
            '!' => self.bang(),
            c if is_identifier_start(c) => self.identifier(start.offset),
            c => Token::Invalid(LexError::InvalidCharacter(c)),
        };

        Some(Spanned {
            token,
            span: start.offset..self.offset,
            position: start,
            end: self.cursor(),
        })
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_identifier_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}
