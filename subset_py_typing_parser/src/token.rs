//! Token definitions for the Python-subset lexer.
//!
//! Indentation is not lexed here: the layout pass in [`crate::lexer`]
//! synthesizes `Indent`/`Dedent` from token start columns.

use logos::Logos;
use std::fmt;

/// Tokens of the supported Python subset.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\f]+")] // Skip whitespace (but not newlines)
#[logos(skip r"#[^\n]*")] // Line comments
pub enum Token {
    // ==================== Keywords ====================
    #[token("def")]
    KwDef,
    #[token("return")]
    KwReturn,
    #[token("if")]
    KwIf,
    #[token("elif")]
    KwElif,
    #[token("else")]
    KwElse,
    #[token("for")]
    KwFor,
    #[token("while")]
    KwWhile,
    #[token("in")]
    KwIn,
    #[token("pass")]
    KwPass,
    #[token("not")]
    KwNot,

    // Python keywords outside the subset. Lexed so they fail with a clear
    // parse error instead of being treated as identifiers.
    #[token("and")]
    #[token("or")]
    #[token("is")]
    #[token("lambda")]
    #[token("import")]
    #[token("from")]
    #[token("class")]
    #[token("break")]
    #[token("continue")]
    #[token("del")]
    #[token("global")]
    #[token("nonlocal")]
    #[token("with")]
    #[token("try")]
    #[token("except")]
    #[token("finally")]
    #[token("raise")]
    #[token("yield")]
    #[token("assert")]
    #[token("as")]
    #[token("async")]
    #[token("await")]
    Reserved,

    // ==================== Constants ====================
    #[token("True")]
    True,
    #[token("False")]
    False,
    #[token("None")]
    None,

    // ==================== Delimiters ====================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,

    // ==================== Assignment Operators ====================
    #[token("=")]
    Eq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("//=")]
    SlashSlashEq,
    #[token("%=")]
    PercentEq,
    #[token("**=")]
    StarStarEq,

    // ==================== Arithmetic Operators ====================
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("**")]
    StarStar,
    #[token("*")]
    Star,
    #[token("//")]
    SlashSlash,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    // ==================== Comparison Operators ====================
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    // ==================== Newline ====================
    #[regex(r"\r?\n")]
    Newline,

    // ==================== Literals ====================
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    FloatLiteral,
    #[regex(r"[0-9]+")]
    IntLiteral,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r#"'([^'\\\n]|\\.)*'"#)]
    StringLiteral,

    // ==================== Identifiers ====================
    #[regex(r"[_\p{XID_Start}][_\p{XID_Continue}]*")]
    Identifier,

    // ==================== Layout (synthesized, never lexed) ====================
    Indent,
    Dedent,
}

impl Token {
    /// True for tokens that can begin an expression.
    pub fn starts_expression(&self) -> bool {
        matches!(
            self,
            Token::Identifier
                | Token::IntLiteral
                | Token::FloatLiteral
                | Token::StringLiteral
                | Token::True
                | Token::False
                | Token::None
                | Token::LParen
                | Token::LBracket
                | Token::Plus
                | Token::Minus
                | Token::KwNot
        )
    }

    /// True for the compound assignment operators.
    pub fn is_augmented_assign(&self) -> bool {
        matches!(
            self,
            Token::PlusEq
                | Token::MinusEq
                | Token::StarEq
                | Token::SlashEq
                | Token::SlashSlashEq
                | Token::PercentEq
                | Token::StarStarEq
        )
    }

    /// True for the comparison operators.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Token::EqEq | Token::NotEq | Token::LtEq | Token::GtEq | Token::Lt | Token::Gt
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Token::KwDef => "def",
            Token::KwReturn => "return",
            Token::KwIf => "if",
            Token::KwElif => "elif",
            Token::KwElse => "else",
            Token::KwFor => "for",
            Token::KwWhile => "while",
            Token::KwIn => "in",
            Token::KwPass => "pass",
            Token::KwNot => "not",
            Token::Reserved => "reserved word",
            Token::True => "True",
            Token::False => "False",
            Token::None => "None",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Semicolon => ";",
            Token::Dot => ".",
            Token::Eq => "=",
            Token::PlusEq => "+=",
            Token::MinusEq => "-=",
            Token::StarEq => "*=",
            Token::SlashEq => "/=",
            Token::SlashSlashEq => "//=",
            Token::PercentEq => "%=",
            Token::StarStarEq => "**=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::StarStar => "**",
            Token::Star => "*",
            Token::SlashSlash => "//",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::LtEq => "<=",
            Token::GtEq => ">=",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::Newline => "newline",
            Token::FloatLiteral => "float literal",
            Token::IntLiteral => "int literal",
            Token::StringLiteral => "string literal",
            Token::Identifier => "identifier",
            Token::Indent => "indent",
            Token::Dedent => "dedent",
        };
        write!(f, "{}", s)
    }
}
