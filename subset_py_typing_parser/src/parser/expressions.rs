//! Expression grammar: precedence climbing from comparisons down to atoms.

use super::Parser;
use crate::ast::{BinOpKind, CmpOpKind, Expr, ExprKind, Keyword, Literal, UnaryOpKind};
use crate::error::{ParseError, ParseResult};
use crate::token::Token;

impl<'a> Parser<'a> {
    /// `'not' expr | comparison`
    pub(crate) fn parse_expr(&mut self) -> ParseResult<Expr> {
        if self.check(&Token::KwNot) {
            let line = self.current_line();
            self.advance();
            let operand = self.parse_expr()?;
            return Ok(Expr::new(
                ExprKind::UnaryOp {
                    op: UnaryOpKind::Not,
                    operand: Box::new(operand),
                },
                line,
            ));
        }
        self.parse_comparison()
    }

    /// `expr (',' expr)* [',']`, parsed as a tuple when a comma appears.
    pub(crate) fn parse_testlist(&mut self) -> ParseResult<Expr> {
        let line = self.current_line();
        let first = self.parse_expr()?;
        if !self.check(&Token::Comma) {
            return Ok(first);
        }

        let mut elems = vec![first];
        while self.check(&Token::Comma) {
            self.advance();
            let starts = self
                .current()
                .map(|t| t.token.starts_expression())
                .unwrap_or(false);
            if !starts {
                break; // trailing comma
            }
            elems.push(self.parse_expr()?);
        }
        Ok(Expr::new(ExprKind::Tuple { elems }, line))
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let left = self.parse_arith()?;
        let op = match self.current().map(|t| &t.token) {
            Some(t) if t.is_comparison() => comparison_op(t),
            _ => return Ok(left),
        };
        let line = left.line;
        self.advance();
        let right = self.parse_arith()?;
        if self
            .current()
            .map(|t| t.token.is_comparison())
            .unwrap_or(false)
        {
            return Err(ParseError::unsupported(
                "chained comparison",
                self.current_span(),
            ));
        }
        Ok(Expr::new(
            ExprKind::Compare {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            line,
        ))
    }

    fn parse_arith(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.current().map(|t| &t.token) {
                Some(Token::Plus) => BinOpKind::Add,
                Some(Token::Minus) => BinOpKind::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            let line = left.line;
            left = Expr::new(
                ExprKind::BinOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.current().map(|t| &t.token) {
                Some(Token::Star) => BinOpKind::Mult,
                Some(Token::Slash) => BinOpKind::Div,
                Some(Token::SlashSlash) => BinOpKind::FloorDiv,
                Some(Token::Percent) => BinOpKind::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            let line = left.line;
            left = Expr::new(
                ExprKind::BinOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(left)
    }

    /// Unary sign binds tighter than `*`/`/` but looser than `**`.
    fn parse_factor(&mut self) -> ParseResult<Expr> {
        let op = match self.current().map(|t| &t.token) {
            Some(Token::Plus) => Some(UnaryOpKind::Plus),
            Some(Token::Minus) => Some(UnaryOpKind::Minus),
            _ => None,
        };
        if let Some(op) = op {
            let line = self.current_line();
            self.advance();
            let operand = self.parse_factor()?;
            return Ok(Expr::new(
                ExprKind::UnaryOp {
                    op,
                    operand: Box::new(operand),
                },
                line,
            ));
        }
        self.parse_power()
    }

    /// `postfix ['**' factor]`, right associative; the exponent may be signed.
    fn parse_power(&mut self) -> ParseResult<Expr> {
        let base = self.parse_postfix()?;
        if self.check(&Token::StarStar) {
            self.advance();
            let exponent = self.parse_factor()?;
            let line = base.line;
            return Ok(Expr::new(
                ExprKind::BinOp {
                    left: Box::new(base),
                    op: BinOpKind::Pow,
                    right: Box::new(exponent),
                },
                line,
            ));
        }
        Ok(base)
    }

    /// Atom followed by call, subscript, and attribute trailers.
    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.current().map(|t| &t.token) {
                Some(Token::LParen) => {
                    self.advance();
                    let (args, keywords) = self.parse_call_args()?;
                    self.expect(Token::RParen)?;
                    let line = expr.line;
                    expr = Expr::new(
                        ExprKind::Call {
                            func: Box::new(expr),
                            args,
                            keywords,
                        },
                        line,
                    );
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let index = self.parse_expr()?;
                    if self.check(&Token::Comma) {
                        return Err(ParseError::unsupported(
                            "tuple subscript",
                            self.current_span(),
                        ));
                    }
                    if self.check(&Token::Colon) {
                        return Err(ParseError::unsupported("slice", self.current_span()));
                    }
                    self.expect(Token::RBracket)?;
                    let line = expr.line;
                    expr = Expr::new(
                        ExprKind::Subscript {
                            value: Box::new(expr),
                            index: Box::new(index),
                        },
                        line,
                    );
                }
                Some(Token::Dot) => {
                    self.advance();
                    let attr = self.expect(Token::Identifier)?.text.to_string();
                    let line = expr.line;
                    expr = Expr::new(
                        ExprKind::Attribute {
                            value: Box::new(expr),
                            attr,
                        },
                        line,
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// `(expr (',' expr)*)? (name '=' expr (',' name '=' expr)*)?`
    fn parse_call_args(&mut self) -> ParseResult<(Vec<Expr>, Vec<Keyword>)> {
        let mut args = Vec::new();
        let mut keywords: Vec<Keyword> = Vec::new();

        if self.check(&Token::RParen) {
            return Ok((args, keywords));
        }

        loop {
            let is_keyword =
                self.check(&Token::Identifier) && self.peek_nth(1) == Some(&Token::Eq);
            if is_keyword {
                let name = self.expect(Token::Identifier)?.text.to_string();
                self.expect(Token::Eq)?;
                let value = self.parse_expr()?;
                keywords.push(Keyword { name, value });
            } else {
                if !keywords.is_empty() {
                    return Err(ParseError::unsupported(
                        "positional argument after keyword argument",
                        self.current_span(),
                    ));
                }
                args.push(self.parse_expr()?);
            }

            if self.check(&Token::Comma) {
                self.advance();
                if self.check(&Token::RParen) {
                    break; // trailing comma
                }
            } else {
                break;
            }
        }
        Ok((args, keywords))
    }

    fn parse_atom(&mut self) -> ParseResult<Expr> {
        let (token, span, text) = match self.current() {
            Some(t) => (t.token.clone(), t.span, t.text),
            None => return Err(self.unexpected("expression")),
        };
        let line = span.line;

        match token {
            Token::IntLiteral => {
                self.advance();
                let value: i64 = text
                    .parse()
                    .map_err(|_| ParseError::invalid_number(text, span))?;
                Ok(Expr::new(ExprKind::Literal(Literal::Int(value)), line))
            }
            Token::FloatLiteral => {
                self.advance();
                let value: f64 = text
                    .parse()
                    .map_err(|_| ParseError::invalid_number(text, span))?;
                Ok(Expr::new(ExprKind::Literal(Literal::Float(value)), line))
            }
            Token::StringLiteral => {
                self.advance();
                Ok(Expr::new(
                    ExprKind::Literal(Literal::Str(unquote(text))),
                    line,
                ))
            }
            Token::True => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::Bool(true)), line))
            }
            Token::False => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::Bool(false)), line))
            }
            Token::None => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::None), line))
            }
            Token::Identifier => {
                self.advance();
                Ok(Expr::new(ExprKind::Name(text.to_string()), line))
            }
            Token::LParen => {
                self.advance();
                if self.check(&Token::RParen) {
                    self.advance();
                    return Ok(Expr::new(ExprKind::Tuple { elems: Vec::new() }, line));
                }
                let inner = self.parse_testlist()?;
                self.expect(Token::RParen)?;
                // Plain grouping introduces no node; a comma made a tuple
                // inside parse_testlist already.
                Ok(inner)
            }
            Token::LBracket => {
                self.advance();
                let mut elems = Vec::new();
                if !self.check(&Token::RBracket) {
                    loop {
                        elems.push(self.parse_expr()?);
                        if self.check(&Token::Comma) {
                            self.advance();
                            if self.check(&Token::RBracket) {
                                break; // trailing comma
                            }
                        } else {
                            break;
                        }
                    }
                }
                self.expect(Token::RBracket)?;
                Ok(Expr::new(ExprKind::List { elems }, line))
            }
            Token::Reserved => Err(ParseError::reserved_word(text, span)),
            _ => Err(self.unexpected("expression")),
        }
    }
}

fn comparison_op(token: &Token) -> CmpOpKind {
    match token {
        Token::EqEq => CmpOpKind::Eq,
        Token::NotEq => CmpOpKind::NotEq,
        Token::Lt => CmpOpKind::Lt,
        Token::LtEq => CmpOpKind::LtE,
        Token::Gt => CmpOpKind::Gt,
        Token::GtEq => CmpOpKind::GtE,
        // parse_comparison only calls this for comparison tokens
        _ => CmpOpKind::Eq,
    }
}

/// Strip the quotes and decode the common escapes.
fn unquote(text: &str) -> String {
    let body = &text[1..text.len().saturating_sub(1)];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
