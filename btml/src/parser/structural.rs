use std::collections::HashSet;

use tracing::{debug, trace};

use crate::document::{Attribute, Content, Document, Element, is_void_element};
use crate::lexer::{Position, Spanned, Token, TokenKind};
use crate::parser::error::{ParseError, ParseErrorKind, Warning, WarningKind};

/// Deepest block nesting the parser accepts.
///
/// Every later stage walks the tree recursively, so this also bounds their
/// stack use.
pub const MAX_NESTING_DEPTH: usize = 256;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a token stream into a Document plus the warnings found on the way.
pub(crate) fn parse_document<I>(
    tokens: I,
    file_id: usize,
) -> Result<(Document, Vec<Warning>), ParseError>
where
    I: Iterator<Item = Spanned>,
{
    let mut parser = DocumentParser::new(tokens, file_id);
    let document = parser.document()?;
    debug!(
        elements = document.element_count(),
        warnings = parser.warnings.len(),
        "parsed btml document"
    );
    Ok((document, parser.warnings))
}

// ---------------------------------------------------------------------------
// Recursive descent
// ---------------------------------------------------------------------------

struct DocumentParser<I: Iterator<Item = Spanned>> {
    tokens: I,
    /// The single token of lookahead.
    current: Spanned,
    file_id: usize,
    /// Blocks currently open.
    depth: usize,
    warnings: Vec<Warning>,
}

impl<I: Iterator<Item = Spanned>> DocumentParser<I> {
    fn new(mut tokens: I, file_id: usize) -> Self {
        let current = tokens.next().unwrap_or_else(|| Spanned {
            token: Token::EndOfInput,
            span: 0..0,
            position: Position::start(),
            end: Position::start(),
        });
        DocumentParser {
            tokens,
            current,
            file_id,
            depth: 0,
            warnings: Vec::new(),
        }
    }

    fn peek_kind(&self) -> TokenKind {
        self.current.kind()
    }

    /// Consume the current token and move the lookahead forward.
    ///
    /// Once the underlying stream runs dry the lookahead stays on an
    /// end-of-input token placed right after the last real token.
    fn advance(&mut self) -> Spanned {
        let next = match self.tokens.next() {
            Some(next) => next,
            None => {
                let end = self.current.end;
                Spanned {
                    token: Token::EndOfInput,
                    span: end.offset..end.offset,
                    position: end,
                    end,
                }
            }
        };
        trace!(token = ?self.current.token, "consumed token");
        std::mem::replace(&mut self.current, next)
    }

    fn error_at(&self, kind: ParseErrorKind, token: &Spanned) -> ParseError {
        // Lexical problems win over whatever the grammar expected here.
        let kind = match &token.token {
            Token::Invalid(lex) => ParseErrorKind::Lex(*lex),
            _ => kind,
        };
        ParseError::new(
            kind,
            token.kind(),
            token.position,
            token.span.clone(),
            self.file_id,
        )
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        self.error_at(kind, &self.current)
    }

    fn warn(&mut self, kind: WarningKind, token: &Spanned) {
        self.warnings.push(Warning {
            kind,
            position: token.position,
            span: token.span.clone(),
            file_id: self.file_id,
        });
    }

    fn expect_identifier(&mut self) -> Result<(String, Spanned), ParseError> {
        if self.peek_kind() != TokenKind::Identifier {
            return Err(self.error(ParseErrorKind::UnexpectedToken)
                .with_note("expected an identifier"));
        }
        let spanned = self.advance();
        let name = match &spanned.token {
            Token::Identifier(name) => name.clone(),
            _ => return Err(self.error_at(ParseErrorKind::UnexpectedToken, &spanned)),
        };
        Ok((name, spanned))
    }

    fn expect_string(&mut self) -> Result<String, ParseError> {
        match &self.current.token {
            Token::String(value) => {
                let value = value.clone();
                self.advance();
                Ok(value)
            }
            _ => Err(self.error(ParseErrorKind::UnexpectedToken)
                .with_note("expected a double-quoted string")),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Spanned, ParseError> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            Err(self.error(ParseErrorKind::UnexpectedToken)
                .with_note(format!("expected {}", kind)))
        }
    }

    // document := Bang? element
    fn document(&mut self) -> Result<Document, ParseError> {
        let has_doctype = if self.peek_kind() == TokenKind::Bang {
            self.advance();
            true
        } else {
            false
        };

        let root = self.element()?;

        match self.peek_kind() {
            TokenKind::EndOfInput => Ok(Document { has_doctype, root }),
            _ => Err(self.error(ParseErrorKind::TrailingContent)
                .with_note("a document has exactly one root element")),
        }
    }

    // element := Identifier attr_list? body
    fn element(&mut self) -> Result<Element, ParseError> {
        let (tag, tag_token) = self.expect_identifier()?;

        let attributes = if self.peek_kind() == TokenKind::LBracket {
            self.attribute_list()?
        } else {
            Vec::new()
        };

        let content = match &self.current.token {
            Token::LBrace => {
                if self.depth == MAX_NESTING_DEPTH {
                    return Err(self.error(ParseErrorKind::NestingTooDeep {
                        limit: MAX_NESTING_DEPTH,
                    }));
                }
                let open = self.advance();
                self.depth += 1;
                let children = self.block(&open);
                self.depth -= 1;
                Content::Children(children?)
            }
            Token::String(text) => {
                let text = text.clone();
                self.advance();
                Content::Text(text)
            }
            Token::Dot => {
                self.advance();
                Content::SelfClosing
            }
            _ => {
                return Err(self.error(ParseErrorKind::MissingBody).with_note(format!(
                    "`{tag}` needs `{{ ... }}`, a string, or `.` to say what it contains"
                )));
            }
        };

        let void = is_void_element(&tag);
        match &content {
            Content::SelfClosing if !void => {
                self.warn(WarningKind::SelfClosingNonVoid { tag: tag.clone() }, &tag_token)
            }
            Content::Text(_) | Content::Children(_) if void => {
                self.warn(WarningKind::VoidWithContent { tag: tag.clone() }, &tag_token)
            }
            _ => {}
        }

        Ok(Element {
            tag,
            attributes,
            content,
        })
    }

    // attr_list := '[' (attr (',' attr)*)? ']'
    fn attribute_list(&mut self) -> Result<Vec<Attribute>, ParseError> {
        self.expect(TokenKind::LBracket)?;

        let mut attributes = Vec::new();
        let mut seen = HashSet::new();

        if self.peek_kind() == TokenKind::RBracket {
            self.advance();
            return Ok(attributes);
        }

        loop {
            let (attribute, name_token) = self.attribute()?;
            if !seen.insert(attribute.name.clone()) {
                self.warn(
                    WarningKind::DuplicateAttribute {
                        name: attribute.name.clone(),
                    },
                    &name_token,
                );
            }
            attributes.push(attribute);

            match self.peek_kind() {
                TokenKind::Comma => {
                    let comma = self.advance();
                    if self.peek_kind() == TokenKind::RBracket {
                        return Err(self
                            .error_at(ParseErrorKind::UnexpectedToken, &comma)
                            .with_note("trailing commas are not allowed in attribute lists"));
                    }
                }
                TokenKind::RBracket => {
                    self.advance();
                    return Ok(attributes);
                }
                _ => {
                    return Err(self.error(ParseErrorKind::UnexpectedToken)
                        .with_note("expected `,` or `]` after an attribute"));
                }
            }
        }
    }

    // attr := Identifier '=' String
    fn attribute(&mut self) -> Result<(Attribute, Spanned), ParseError> {
        let (name, name_token) = self.expect_identifier()?;
        self.expect(TokenKind::Equals)?;
        let value = self.expect_string()?;
        Ok((Attribute { name, value }, name_token))
    }

    // block := element* '}'   (the '{' is already consumed)
    fn block(&mut self, open: &Spanned) -> Result<Vec<Element>, ParseError> {
        let mut children = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Identifier => children.push(self.element()?),
                TokenKind::RBrace => {
                    self.advance();
                    return Ok(children);
                }
                _ => {
                    let opened = format!("block opened at {}", open.position);
                    return Err(self
                        .error(ParseErrorKind::UnclosedBlock)
                        .with_related(open.span.clone(), opened));
                }
            }
        }
    }
}
