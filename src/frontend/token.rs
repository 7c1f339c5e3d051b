//! Token definitions for Pascal8

use crate::utils::Span;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Literal source text of the lexeme
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    pub fn eof(offset: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            text: String::new(),
            span: Span::new(offset, offset),
        }
    }
}

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // ============ Keywords ============
    /// program
    Program,
    /// procedure
    Procedure,
    /// begin
    Begin,
    /// end
    End,
    /// var
    Var,
    /// const
    Const,
    /// if
    If,
    /// then
    Then,
    /// else
    Else,

    // ============ Identifiers and Literals ============
    Ident,
    /// Decimal integer literal; the value stays in `Token::text`
    IntLit,

    // ============ Operators ============
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// :=
    ColonEq,

    // ============ Delimiters ============
    /// (
    LParen,
    /// )
    RParen,
    /// ,
    Comma,
    /// .
    Dot,
    /// :
    Colon,
    /// ;
    Semicolon,

    // ============ Special ============
    /// End of file
    Eof,
}

impl TokenKind {
    /// Try to convert an identifier to a keyword
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "program" => Some(TokenKind::Program),
            "procedure" => Some(TokenKind::Procedure),
            "begin" => Some(TokenKind::Begin),
            "end" => Some(TokenKind::End),
            "var" => Some(TokenKind::Var),
            "const" => Some(TokenKind::Const),
            "if" => Some(TokenKind::If),
            "then" => Some(TokenKind::Then),
            "else" => Some(TokenKind::Else),
            _ => None,
        }
    }

    /// Get the precedence of a binary operator (for Pratt parsing)
    /// Returns None if not a binary operator
    pub fn binary_precedence(&self) -> Option<u8> {
        match self {
            // Additive
            TokenKind::Plus | TokenKind::Minus => Some(1),

            // Multiplicative
            TokenKind::Star | TokenKind::Slash => Some(2),

            _ => None,
        }
    }

    /// Human readable name used in syntax errors
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Program => "'program'",
            TokenKind::Procedure => "'procedure'",
            TokenKind::Begin => "'begin'",
            TokenKind::End => "'end'",
            TokenKind::Var => "'var'",
            TokenKind::Const => "'const'",
            TokenKind::If => "'if'",
            TokenKind::Then => "'then'",
            TokenKind::Else => "'else'",
            TokenKind::Ident => "identifier",
            TokenKind::IntLit => "integer literal",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::ColonEq => "':='",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Eof => "end of file",
        }
    }
}
