//! Lexer for the Python subset.
//!
//! Runs the logos-generated lexer over the whole source, then applies a
//! layout pass that turns physical lines into logical ones: blank and
//! comment-only lines disappear, newlines inside parentheses/brackets are
//! joined, and changes of line start column become synthetic
//! `Indent`/`Dedent` tokens against an indent stack, Python-style.
//!
//! Indentation is measured in characters from the line start, so sources
//! should indent with spaces.

use logos::Logos;

use crate::error::{ParseError, ParseResult};
use crate::span::{SourceMap, Span};
use crate::token::Token;

/// A token with its span and source text.
#[derive(Debug, Clone)]
pub struct SpannedToken<'a> {
    pub token: Token,
    pub span: Span,
    pub text: &'a str,
}

impl<'a> SpannedToken<'a> {
    pub fn new(token: Token, span: Span, text: &'a str) -> Self {
        Self { token, span, text }
    }
}

/// Python-subset lexer.
pub struct Lexer<'a> {
    source: &'a str,
    source_map: SourceMap,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            source_map: SourceMap::new(source),
        }
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// Tokenize the whole source, layout applied. Fails on the first
    /// unrecognized character sequence or inconsistent dedent.
    pub fn tokenize(&self) -> ParseResult<Vec<SpannedToken<'a>>> {
        let raw = self.raw_tokens()?;
        self.layout(raw)
    }

    /// The logos token stream with spans, before layout.
    fn raw_tokens(&self) -> ParseResult<Vec<SpannedToken<'a>>> {
        let mut lexer = Token::lexer(self.source);
        let mut tokens = Vec::new();
        while let Some(result) = lexer.next() {
            let range = lexer.span();
            let span = self.source_map.span(range.start, range.end);
            let text = &self.source[range.start..range.end];
            match result {
                Ok(token) => tokens.push(SpannedToken::new(token, span, text)),
                Err(()) => return Err(ParseError::invalid_token(text, span)),
            }
        }
        Ok(tokens)
    }

    /// Collapse physical lines into logical ones and synthesize
    /// `Indent`/`Dedent` from line start columns.
    fn layout(&self, raw: Vec<SpannedToken<'a>>) -> ParseResult<Vec<SpannedToken<'a>>> {
        let mut out: Vec<SpannedToken<'a>> = Vec::with_capacity(raw.len());
        let mut stack: Vec<usize> = vec![0];
        let mut depth: usize = 0;
        let mut at_line_start = true;
        let mut line_has_content = false;
        let mut last_span = Span::empty();

        for st in raw {
            match st.token {
                Token::Newline => {
                    if depth > 0 {
                        continue; // implicit line joining inside ( ) [ ]
                    }
                    if line_has_content {
                        out.push(SpannedToken::new(Token::Newline, st.span, st.text));
                        line_has_content = false;
                    }
                    at_line_start = true;
                }
                _ => {
                    if at_line_start && depth == 0 {
                        let indent = st.span.column - 1;
                        let mark = Span::new(st.span.start, st.span.start, st.span.line, 1);
                        if indent > *stack.last().unwrap_or(&0) {
                            stack.push(indent);
                            out.push(SpannedToken::new(Token::Indent, mark, ""));
                        } else {
                            while indent < *stack.last().unwrap_or(&0) {
                                stack.pop();
                                out.push(SpannedToken::new(Token::Dedent, mark, ""));
                            }
                            if indent != *stack.last().unwrap_or(&0) {
                                return Err(ParseError::bad_indent(mark));
                            }
                        }
                    }
                    at_line_start = false;
                    line_has_content = true;
                    match st.token {
                        Token::LParen | Token::LBracket => depth += 1,
                        Token::RParen | Token::RBracket => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                    last_span = st.span;
                    out.push(st);
                }
            }
        }

        let eof = Span::new(last_span.end, last_span.end, last_span.line, 1);
        if line_has_content {
            out.push(SpannedToken::new(Token::Newline, eof, ""));
        }
        while stack.len() > 1 {
            stack.pop();
            out.push(SpannedToken::new(Token::Dedent, eof, ""));
        }
        Ok(out)
    }
}
