//! Parse errors for the Python subset.

use crate::span::Span;
use std::fmt;
use thiserror::Error;

/// Errors produced by the lexer, the layout pass, and the parser.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("line {}: unexpected token '{found}', expected {expected}", span.line)]
    UnexpectedToken {
        found: String,
        expected: String,
        span: Span,
    },

    #[error("line {}: unexpected end of input, expected {expected}", span.line)]
    UnexpectedEof { expected: String, span: Span },

    #[error("line {}: unrecognized character sequence '{text}'", span.line)]
    InvalidToken { text: String, span: Span },

    #[error("line {}: invalid numeric literal '{text}'", span.line)]
    InvalidNumber { text: String, span: Span },

    #[error("line {}: unindent does not match any outer indentation level", span.line)]
    BadIndent { span: Span },

    #[error("line {}: '{word}' is outside the supported subset", span.line)]
    ReservedWord { word: String, span: Span },

    #[error("line {}: {construct} is not supported", span.line)]
    Unsupported { construct: String, span: Span },
}

impl ParseError {
    pub fn unexpected_token(
        found: impl Into<String>,
        expected: impl Into<String>,
        span: Span,
    ) -> Self {
        ParseError::UnexpectedToken {
            found: found.into(),
            expected: expected.into(),
            span,
        }
    }

    pub fn unexpected_eof(expected: impl Into<String>, span: Span) -> Self {
        ParseError::UnexpectedEof {
            expected: expected.into(),
            span,
        }
    }

    pub fn invalid_token(text: impl Into<String>, span: Span) -> Self {
        ParseError::InvalidToken {
            text: text.into(),
            span,
        }
    }

    pub fn invalid_number(text: impl Into<String>, span: Span) -> Self {
        ParseError::InvalidNumber {
            text: text.into(),
            span,
        }
    }

    pub fn bad_indent(span: Span) -> Self {
        ParseError::BadIndent { span }
    }

    pub fn reserved_word(word: impl Into<String>, span: Span) -> Self {
        ParseError::ReservedWord {
            word: word.into(),
            span,
        }
    }

    pub fn unsupported(construct: impl Into<String>, span: Span) -> Self {
        ParseError::Unsupported {
            construct: construct.into(),
            span,
        }
    }

    /// The source span the error points at.
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEof { span, .. }
            | ParseError::InvalidToken { span, .. }
            | ParseError::InvalidNumber { span, .. }
            | ParseError::BadIndent { span }
            | ParseError::ReservedWord { span, .. }
            | ParseError::Unsupported { span, .. } => *span,
        }
    }

    /// The source line the error points at.
    pub fn line(&self) -> usize {
        self.span().line
    }
}

/// Result alias for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// All errors collected during one parse (the parser recovers at statement
/// boundaries and keeps going).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    pub fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", e)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}
