use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use thiserror::Error;

use crate::lexer::{LexError, Position, TokenKind};

/// What went wrong while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("element has no body")]
    MissingBody,
    #[error("unclosed block")]
    UnclosedBlock,
    #[error("unexpected token")]
    UnexpectedToken,
    #[error("unexpected content after the root element")]
    TrailingContent,
    #[error("blocks nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
    #[error(transparent)]
    Lex(#[from] LexError),
}

/// Parse errors with source location information.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {position}{}", found_suffix(.kind, .found))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Kind of the offending token.
    pub found: TokenKind,
    pub position: Position,
    pub span: Range<usize>,
    pub file_id: usize,
    /// Related source ranges, shown as secondary labels.
    pub related: Vec<(Range<usize>, String)>,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        found: TokenKind,
        position: Position,
        span: Range<usize>,
        file_id: usize,
    ) -> Self {
        ParseError {
            kind,
            found,
            position,
            span,
            file_id,
            related: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_related(mut self, span: Range<usize>, message: impl Into<String>) -> Self {
        self.related.push((span, message.into()));
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let mut labels = vec![
            Label::primary(self.file_id, self.span.clone())
                .with_message(format!("found {}", self.found)),
        ];
        labels.extend(self.related.iter().map(|(span, message)| {
            Label::secondary(self.file_id, span.clone()).with_message(message.clone())
        }));
        Diagnostic::new(Severity::Error)
            .with_message(self.kind.to_string())
            .with_labels(labels)
            .with_notes(self.notes.clone())
    }
}

/// Lexical errors already name the culprit, so they skip the `found` part.
fn found_suffix(kind: &ParseErrorKind, found: &TokenKind) -> String {
    match kind {
        ParseErrorKind::Lex(_) => String::new(),
        _ => format!(", found {found}"),
    }
}

/// Non-fatal findings collected while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WarningKind {
    #[error("duplicate attribute `{name}`")]
    DuplicateAttribute { name: String },
    #[error("`{tag}` is not a void element but is written self-closing")]
    SelfClosingNonVoid { tag: String },
    #[error("void element `{tag}` cannot have content")]
    VoidWithContent { tag: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {position}")]
pub struct Warning {
    pub kind: WarningKind,
    pub position: Position,
    pub span: Range<usize>,
    pub file_id: usize,
}

impl Warning {
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let diagnostic = Diagnostic::new(Severity::Warning)
            .with_message(self.kind.to_string())
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())]);
        match &self.kind {
            WarningKind::SelfClosingNonVoid { tag } => diagnostic.with_notes(vec![format!(
                "HTML parsers treat `<{tag} />` as an open tag; use `{tag} {{ }}` instead"
            )]),
            _ => diagnostic,
        }
    }
}
