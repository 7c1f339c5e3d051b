//! Lexer for Pascal8
//!
//! Converts source code into a flat stream of tokens terminated by `Eof`.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Span};

/// The lexer state
pub struct Lexer<'src> {
    source: &'src str,
    /// Characters paired with their byte offsets
    chars: Vec<(usize, char)>,
    /// Current position in `chars`
    pos: usize,
    /// Start position of current token
    start: usize,
    errors: Vec<Error>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
            start: 0,
            errors: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).map(|&(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Byte offset of a char index
    fn offset(&self, index: usize) -> usize {
        self.chars
            .get(index)
            .map(|&(off, _)| off)
            .unwrap_or(self.source.len())
    }

    fn make_span(&self) -> Span {
        Span::new(self.offset(self.start), self.offset(self.pos))
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        let span = self.make_span();
        Token::new(kind, &self.source[span.start..span.end], span)
    }

    /// Skip whitespace and comments
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                // Line comment
                '/' if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                // Block comment, not nested
                '/' if self.peek_next() == Some('*') => {
                    self.advance();
                    self.advance();
                    while !self.is_at_end() {
                        if self.peek() == Some('*') && self.peek_next() == Some('/') {
                            self.advance();
                            self.advance();
                            break;
                        }
                        self.advance();
                    }
                }
                // Pascal brace comment
                '{' => {
                    while let Some(c) = self.advance() {
                        if c == '}' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn read_identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let span = self.make_span();
        let kind = TokenKind::keyword_from_str(&self.source[span.start..span.end])
            .unwrap_or(TokenKind::Ident);
        self.make_token(kind)
    }

    fn read_number(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
        self.make_token(TokenKind::IntLit)
    }

    /// Get the next token, recording illegal characters as errors
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();
            self.start = self.pos;

            let Some(c) = self.advance() else {
                return Token::eof(self.source.len());
            };

            if c.is_ascii_alphabetic() || c == '_' {
                return self.read_identifier();
            }

            if c.is_ascii_digit() {
                return self.read_number();
            }

            let kind = match c {
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Star,
                '/' => TokenKind::Slash,
                ':' => {
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::ColonEq
                    } else {
                        TokenKind::Colon
                    }
                }
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                ',' => TokenKind::Comma,
                '.' => TokenKind::Dot,
                ';' => TokenKind::Semicolon,
                _ => {
                    self.errors.push(Error::IllegalCharacter {
                        ch: c,
                        span: self.make_span(),
                    });
                    continue;
                }
            };

            return self.make_token(kind);
        }
    }

    /// Tokenize the entire source, returning the tokens and any lexical errors
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Error>) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        (tokens, self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, errors) = Lexer::new(source).tokenize();
        assert!(errors.is_empty(), "{:?}", errors);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_tokens() {
        assert_eq!(
            kinds("program p; begin end."),
            vec![
                TokenKind::Program,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Begin,
                TokenKind::End,
                TokenKind::Dot,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_assignment_operators() {
        assert_eq!(
            kinds("x := -a + 12 * (b / c)"),
            vec![
                TokenKind::Ident,
                TokenKind::ColonEq,
                TokenKind::Minus,
                TokenKind::Ident,
                TokenKind::Plus,
                TokenKind::IntLit,
                TokenKind::Star,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::Slash,
                TokenKind::Ident,
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("// line\nvar /* block */ x { pascal } : long;"),
            vec![
                TokenKind::Var,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_token_text_and_offsets() {
        let (tokens, _) = Lexer::new("var  count: integer;").tokenize();
        assert_eq!(tokens[1].text, "count");
        assert_eq!(tokens[1].span, Span::new(5, 10));
        assert_eq!(tokens[3].text, "integer");
        assert_eq!(tokens.last().map(|t| t.span.start), Some(20));
    }

    #[test]
    fn test_illegal_character() {
        let (tokens, errors) = Lexer::new("x := 1 # 2").tokenize();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], Error::IllegalCharacter { ch: '#', .. }));
        assert_eq!(tokens.len(), 5);
    }
}
