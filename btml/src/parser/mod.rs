pub mod error;
mod structural;

pub use error::{ParseError, ParseErrorKind, Warning, WarningKind};
pub use structural::MAX_NESTING_DEPTH;

use tracing::debug;

use crate::document::Document;
use crate::lexer::{Spanned, tokenize};

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    /// `file_id` is threaded into every error and warning so callers can
    /// resolve spans against their codespan file database.
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the source into a complete Document.
    pub fn parse(&self) -> Result<Document, ParseError> {
        self.parse_with_warnings().map(|(document, _)| document)
    }

    /// Parse the source, keeping the warnings found along the way.
    pub fn parse_with_warnings(&self) -> Result<(Document, Vec<Warning>), ParseError> {
        parse_source(&self.source, self.file_id)
    }
}

pub(crate) fn parse_source(
    source: &str,
    file_id: usize,
) -> Result<(Document, Vec<Warning>), ParseError> {
    debug!(bytes = source.len(), file_id, "parsing btml source");
    structural::parse_document(tokenize(source), file_id)
}

/// Parse an already tokenized stream.
///
/// The stream does not need to end with an end-of-input token; one is
/// synthesized after the last token.
pub fn parse_tokens<I>(tokens: I) -> Result<Document, ParseError>
where
    I: IntoIterator<Item = Spanned>,
{
    structural::parse_document(tokens.into_iter(), 0).map(|(document, _)| document)
}
