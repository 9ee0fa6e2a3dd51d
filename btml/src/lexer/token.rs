use std::fmt;
use std::ops::Range;

use crate::lexer::LexError;

/// A lexical unit of BTML source, with its payload where it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// The `!html!` doctype marker.
    Bang,
    Identifier(String),
    /// A string literal, escapes already decoded.
    String(String),
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Equals,
    Comma,
    Dot,
    /// Input the lexer could not classify. Rejected by the parser.
    Invalid(LexError),
    EndOfInput,
}

/// Token kind (for matching without payloads).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Bang,
    Identifier,
    String,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Equals,
    Comma,
    Dot,
    Invalid,
    EndOfInput,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Bang => TokenKind::Bang,
            Token::Identifier(_) => TokenKind::Identifier,
            Token::String(_) => TokenKind::String,
            Token::LBracket => TokenKind::LBracket,
            Token::RBracket => TokenKind::RBracket,
            Token::LBrace => TokenKind::LBrace,
            Token::RBrace => TokenKind::RBrace,
            Token::Equals => TokenKind::Equals,
            Token::Comma => TokenKind::Comma,
            Token::Dot => TokenKind::Dot,
            Token::Invalid(_) => TokenKind::Invalid,
            Token::EndOfInput => TokenKind::EndOfInput,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Bang => "`!html!`",
            TokenKind::Identifier => "identifier",
            TokenKind::String => "string",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::Equals => "`=`",
            TokenKind::Comma => "`,`",
            TokenKind::Dot => "`.`",
            TokenKind::Invalid => "invalid input",
            TokenKind::EndOfInput => "end of input",
        };
        f.write_str(text)
    }
}

/// Location of a token in the source.
///
/// `line` and `column` are 1-based; `column` counts characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn start() -> Self {
        Position {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A token together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    /// Byte span in source for error reporting.
    pub span: Range<usize>,
    pub position: Position,
    /// Position just past the token.
    pub end: Position,
}

impl Spanned {
    pub fn kind(&self) -> TokenKind {
        self.token.kind()
    }
}
