pub mod document;
pub mod lexer;
pub mod parser;

pub use document::{Attribute, Content, Document, Element};
pub use lexer::{LexError, tokenize};
pub use parser::{
    MAX_NESTING_DEPTH, ParseError, ParseErrorKind, Parser, Warning, WarningKind, parse_tokens,
};

/// Version of the BTML source grammar accepted by this crate.
///
/// Bumped whenever the grammar changes in a way that alters which sources
/// parse or what they parse into.
pub const GRAMMAR_VERSION: &str = "1";

/// Parse BTML source text into a [`Document`].
///
/// Warnings are discarded; use [`Parser::parse_with_warnings`] to keep them.
pub fn parse(source: &str) -> Result<Document, ParseError> {
    parser::parse_source(source, 0).map(|(document, _)| document)
}
