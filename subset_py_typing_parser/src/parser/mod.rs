//! Recursive descent parser for the Python subset.
//!
//! Consumes the layout-processed token stream from [`crate::lexer`] and
//! builds the normalized AST of [`crate::ast`].

mod expressions;
mod statements;

use crate::ast::Module;
use crate::error::{ParseError, ParseErrors, ParseResult};
use crate::lexer::{Lexer, SpannedToken};
use crate::span::Span;
use crate::token::Token;

/// Python-subset parser.
pub struct Parser<'a> {
    /// Layout-processed tokens
    tokens: Vec<SpannedToken<'a>>,
    /// Cursor into `tokens`
    pos: usize,
    /// Collected errors (for error recovery)
    errors: ParseErrors,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<SpannedToken<'a>>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: ParseErrors::new(),
        }
    }

    /// Parse the token stream into a [`Module`], collecting every error the
    /// parser can recover from.
    pub fn parse(mut self) -> Result<Module, ParseErrors> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            // Skip separators and any layout tokens left behind by recovery.
            while self.check_any(&[Token::Newline, Token::Indent, Token::Dedent]) {
                self.advance();
            }
            if self.is_at_end() {
                break;
            }

            match self.parse_line() {
                Ok(stmts) => body.extend(stmts),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }

        if self.errors.is_empty() {
            Ok(Module::new(body))
        } else {
            Err(self.errors)
        }
    }

    // ==================== Token Management ====================

    pub(crate) fn current(&self) -> Option<&SpannedToken<'a>> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn check(&self, expected: &Token) -> bool {
        self.current().map(|t| &t.token == expected).unwrap_or(false)
    }

    pub(crate) fn check_any(&self, expected: &[Token]) -> bool {
        self.current()
            .map(|t| expected.contains(&t.token))
            .unwrap_or(false)
    }

    /// Look ahead `n` tokens without consuming (0 is the current token).
    pub(crate) fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|t| &t.token)
    }

    pub(crate) fn advance(&mut self) -> Option<SpannedToken<'a>> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    /// Consume the current token if it matches, error otherwise.
    pub(crate) fn expect(&mut self, expected: Token) -> ParseResult<SpannedToken<'a>> {
        if self.check(&expected) {
            // Checked above, advance cannot fail here.
            Ok(self.advance().ok_or_else(|| {
                ParseError::unexpected_eof(expected.to_string(), self.current_span())
            })?)
        } else {
            match self.current() {
                Some(t) => Err(ParseError::unexpected_token(
                    t.text,
                    expected.to_string(),
                    t.span,
                )),
                None => Err(ParseError::unexpected_eof(
                    expected.to_string(),
                    self.current_span(),
                )),
            }
        }
    }

    /// Span of the current token, or a zero-width span at the end of input.
    pub(crate) fn current_span(&self) -> Span {
        match self.current() {
            Some(t) => t.span,
            None => self
                .tokens
                .last()
                .map(|t| Span::new(t.span.end, t.span.end, t.span.line, 1))
                .unwrap_or_else(Span::empty),
        }
    }

    /// Source line of the current token.
    pub(crate) fn current_line(&self) -> usize {
        self.current_span().line
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Error recovery: skip to just past the next logical line break.
    pub(crate) fn synchronize(&mut self) {
        while let Some(t) = self.advance() {
            if t.token == Token::Newline {
                return;
            }
        }
    }

    /// Error for a token that cannot start whatever `expected` names.
    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        match self.current() {
            Some(t) => {
                let found = if t.text.is_empty() {
                    t.token.to_string()
                } else {
                    t.text.to_string()
                };
                ParseError::unexpected_token(found, expected, t.span)
            }
            None => ParseError::unexpected_eof(expected, self.current_span()),
        }
    }
}

/// Parse Python-subset source code into a [`Module`].
pub fn parse_module(source: &str) -> Result<Module, ParseErrors> {
    let tokens = match Lexer::new(source).tokenize() {
        Ok(tokens) => tokens,
        Err(e) => {
            let mut errors = ParseErrors::new();
            errors.push(e);
            return Err(errors);
        }
    };
    Parser::new(tokens).parse()
}
