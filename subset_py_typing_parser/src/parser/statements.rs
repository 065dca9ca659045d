//! Statement-level grammar: lines, suites, definitions, control flow.

use super::Parser;
use crate::ast::{BinOpKind, Expr, ExprKind, Param, Stmt, StmtKind};
use crate::error::{ParseError, ParseResult};
use crate::span::Span;
use crate::token::Token;

impl<'a> Parser<'a> {
    /// Parse one logical line: either a single compound statement or a run
    /// of `;`-separated simple statements terminated by a newline.
    pub(crate) fn parse_line(&mut self) -> ParseResult<Vec<Stmt>> {
        match self.current().map(|t| t.token.clone()) {
            Some(Token::KwDef) => Ok(vec![self.parse_function_def()?]),
            Some(Token::KwIf) => Ok(vec![self.parse_if()?]),
            Some(Token::KwFor) => Ok(vec![self.parse_for()?]),
            Some(Token::KwWhile) => Ok(vec![self.parse_while()?]),
            Some(Token::KwElif) | Some(Token::KwElse) => Err(self.unexpected("statement")),
            _ => self.parse_simple_line(),
        }
    }

    /// `stmt (';' stmt)* [';'] NEWLINE`
    fn parse_simple_line(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = vec![self.parse_simple_statement()?];
        loop {
            if self.check(&Token::Semicolon) {
                self.advance();
                if self.check(&Token::Newline) {
                    self.advance();
                    break;
                }
                stmts.push(self.parse_simple_statement()?);
            } else if self.check(&Token::Newline) {
                self.advance();
                break;
            } else if self.is_at_end() {
                break;
            } else if self.check(&Token::Reserved) {
                let (word, span) = self
                    .current()
                    .map(|t| (t.text.to_string(), t.span))
                    .unwrap_or_default();
                return Err(ParseError::reserved_word(word, span));
            } else {
                return Err(self.unexpected("newline or ';'"));
            }
        }
        Ok(stmts)
    }

    /// A statement legal inside an inline suite: no nested blocks.
    fn parse_simple_statement(&mut self) -> ParseResult<Stmt> {
        match self.current().map(|t| t.token.clone()) {
            Some(Token::KwReturn) => self.parse_return(),
            Some(Token::KwPass) => {
                let line = self.current_line();
                self.advance();
                Ok(Stmt::new(StmtKind::Pass, line))
            }
            Some(Token::Reserved) => {
                // Checked just above, current() is present.
                let (word, span) = self
                    .current()
                    .map(|t| (t.text.to_string(), t.span))
                    .unwrap_or_default();
                Err(ParseError::reserved_word(word, span))
            }
            _ => self.parse_assignment_or_expr(),
        }
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let line = self.current_line();
        self.expect(Token::KwReturn)?;
        let value = if self.check_any(&[Token::Newline, Token::Semicolon]) || self.is_at_end() {
            None
        } else {
            Some(self.parse_testlist()?)
        };
        Ok(Stmt::new(StmtKind::Return { value }, line))
    }

    /// `target = value`, `target op= value`, or a bare expression.
    fn parse_assignment_or_expr(&mut self) -> ParseResult<Stmt> {
        let line = self.current_line();
        let first = self.parse_testlist()?;

        if self.check(&Token::Eq) {
            let eq_span = self.current_span();
            self.advance();
            check_assign_target(&first, eq_span)?;
            let value = self.parse_testlist()?;
            if self.check(&Token::Eq) {
                return Err(ParseError::unsupported(
                    "chained assignment",
                    self.current_span(),
                ));
            }
            return Ok(Stmt::new(
                StmtKind::Assign {
                    target: first,
                    value,
                },
                line,
            ));
        }

        if let Some(op) = self.current().and_then(|t| augmented_op(&t.token)) {
            let op_span = self.current_span();
            if first.as_name().is_none() {
                return Err(ParseError::unsupported(
                    "augmented assignment to anything but a name",
                    op_span,
                ));
            }
            self.advance();
            let value = self.parse_testlist()?;
            return Ok(Stmt::new(
                StmtKind::AugAssign {
                    target: first,
                    op,
                    value,
                },
                line,
            ));
        }

        Ok(Stmt::new(StmtKind::Expr { value: first }, line))
    }

    // ==================== Compound Statements ====================

    fn parse_function_def(&mut self) -> ParseResult<Stmt> {
        let line = self.current_line();
        self.expect(Token::KwDef)?;
        let name = self.expect(Token::Identifier)?.text.to_string();
        self.expect(Token::LParen)?;

        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                let ident = self.expect(Token::Identifier)?;
                if self.check(&Token::Colon) {
                    return Err(ParseError::unsupported(
                        "parameter annotation",
                        self.current_span(),
                    ));
                }
                if self.check(&Token::Eq) {
                    return Err(ParseError::unsupported(
                        "default parameter value",
                        self.current_span(),
                    ));
                }
                params.push(Param::new(ident.text, ident.span.line));
                if self.check(&Token::Comma) {
                    self.advance();
                    if self.check(&Token::RParen) {
                        break; // trailing comma
                    }
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen)?;

        let body = self.parse_suite()?;
        Ok(Stmt::new(StmtKind::FunctionDef { name, params, body }, line))
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let line = self.current_line();
        self.advance(); // 'if' or 'elif'
        let test = self.parse_expr()?;
        let body = self.parse_suite()?;

        let orelse = if self.check(&Token::KwElif) {
            // elif normalizes to a nested If in the else block
            vec![self.parse_if()?]
        } else if self.check(&Token::KwElse) {
            self.advance();
            self.parse_suite()?
        } else {
            Vec::new()
        };

        Ok(Stmt::new(StmtKind::If { test, body, orelse }, line))
    }

    fn parse_for(&mut self) -> ParseResult<Stmt> {
        let line = self.current_line();
        self.expect(Token::KwFor)?;
        let target = self.parse_testlist()?;
        check_assign_target(&target, self.current_span())?;
        self.expect(Token::KwIn)?;
        let iter = self.parse_testlist()?;
        let body = self.parse_suite()?;
        Ok(Stmt::new(StmtKind::For { target, iter, body }, line))
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let line = self.current_line();
        self.expect(Token::KwWhile)?;
        let test = self.parse_expr()?;
        let body = self.parse_suite()?;
        Ok(Stmt::new(StmtKind::While { test, body }, line))
    }

    /// `':' NEWLINE INDENT line+ DEDENT` or an inline `':' simple_line`.
    fn parse_suite(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(Token::Colon)?;

        if self.check(&Token::Newline) {
            self.advance();
            self.expect(Token::Indent)?;
            let mut body = Vec::new();
            while !self.check(&Token::Dedent) && !self.is_at_end() {
                body.extend(self.parse_line()?);
            }
            self.expect(Token::Dedent)?;
            Ok(body)
        } else {
            self.parse_simple_line()
        }
    }
}

fn augmented_op(token: &Token) -> Option<BinOpKind> {
    match token {
        Token::PlusEq => Some(BinOpKind::Add),
        Token::MinusEq => Some(BinOpKind::Sub),
        Token::StarEq => Some(BinOpKind::Mult),
        Token::SlashEq => Some(BinOpKind::Div),
        Token::SlashSlashEq => Some(BinOpKind::FloorDiv),
        Token::PercentEq => Some(BinOpKind::Mod),
        Token::StarStarEq => Some(BinOpKind::Pow),
        _ => None,
    }
}

/// Only names and tuples/lists of assignable targets can be assigned to.
fn check_assign_target(target: &Expr, span: Span) -> ParseResult<()> {
    match &target.kind {
        ExprKind::Name(_) => Ok(()),
        ExprKind::Tuple { elems } | ExprKind::List { elems } => {
            for e in elems {
                check_assign_target(e, span)?;
            }
            Ok(())
        }
        ExprKind::Attribute { .. } => Err(ParseError::unsupported("attribute assignment", span)),
        ExprKind::Subscript { .. } => Err(ParseError::unsupported("subscript assignment", span)),
        ExprKind::Literal(_) => Err(ParseError::unsupported("assignment to a literal", span)),
        _ => Err(ParseError::unsupported("assignment to an expression", span)),
    }
}
