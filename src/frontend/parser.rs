//! Parser for Pascal8
//!
//! Recursive descent parser with Pratt parsing for expressions. Syntax errors
//! are collected and the parser resynchronises at the next statement or
//! declaration boundary, so one bad statement yields one diagnostic.

use crate::frontend::ast::*;
use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result, Span};

/// The parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<Error>,
}

impl Parser {
    /// Create a new parser from a lexer, keeping its lexical errors
    pub fn new(lexer: Lexer<'_>) -> Self {
        let (tokens, errors) = lexer.tokenize();
        Self {
            tokens,
            pos: 0,
            errors,
        }
    }

    // ==================== Helper Methods ====================

    fn current(&self) -> &Token {
        // The token list always ends with Eof and `advance` never moves past it
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens
            .get(self.pos + 1)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn previous_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    fn unexpected(&self, expected: &str) -> Error {
        let token = self.current();
        let got = match token.kind {
            TokenKind::Ident | TokenKind::IntLit => format!("'{}'", token.text),
            kind => kind.describe().to_string(),
        };
        Error::UnexpectedToken {
            expected: expected.to_string(),
            got,
            span: token.span,
        }
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token> {
        if self.check(expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected.describe()))
        }
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skip to just past the next `;`, or up to the next token that can
    /// start a declaration or close a block
    fn synchronise(&mut self) {
        let start = self.pos;
        while !self.is_at_end() {
            match self.current_kind() {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::End => return,
                TokenKind::Procedure | TokenKind::Var | TokenKind::Const | TokenKind::Begin
                    if self.pos != start =>
                {
                    return
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ==================== Parsing Methods ====================

    /// Parse a complete program. Always produces a tree; syntax errors are
    /// returned alongside it.
    pub fn parse_program(mut self) -> (Program, Vec<Error>) {
        let name = match self.parse_header() {
            Ok(name) => name,
            Err(e) => {
                self.errors.push(e);
                self.synchronise();
                Ident::new("main", Span::dummy())
            }
        };

        let mut decls = Vec::new();
        while !self.check(TokenKind::Begin) && !self.check(TokenKind::End) && !self.is_at_end()
        {
            match self.parse_decl() {
                Ok(mut parsed) => decls.append(&mut parsed),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronise();
                }
            }
        }

        let body = match self.parse_compound() {
            Ok(body) => body,
            Err(e) => {
                self.errors.push(e);
                Compound {
                    stmts: Vec::new(),
                    span: self.current().span,
                }
            }
        };

        if let Err(e) = self.expect(TokenKind::Dot) {
            self.errors.push(e);
        }

        (Program { name, decls, body }, self.errors)
    }

    /// `program NAME;` is optional; a nameless program is called `main`
    fn parse_header(&mut self) -> Result<Ident> {
        if !self.consume(TokenKind::Program) {
            return Ok(Ident::new("main", Span::dummy()));
        }
        let name = self.parse_ident()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(name)
    }

    fn parse_decl(&mut self) -> Result<Vec<Decl>> {
        match self.current_kind() {
            TokenKind::Var | TokenKind::Const => Ok(self
                .parse_var_section()?
                .into_iter()
                .map(Decl::Var)
                .collect()),
            TokenKind::Procedure => Ok(vec![Decl::Proc(self.parse_proc_decl()?)]),
            _ => Err(self.unexpected("declaration")),
        }
    }

    /// `var a: integer; b: long;` (or `const`)
    fn parse_var_section(&mut self) -> Result<Vec<VarDecl>> {
        let is_const = self.advance().kind == TokenKind::Const;
        let mut decls = vec![self.parse_var_decl(is_const)?];
        while self.check(TokenKind::Ident) && self.peek_kind() == TokenKind::Colon {
            decls.push(self.parse_var_decl(is_const)?);
        }
        Ok(decls)
    }

    fn parse_var_decl(&mut self, is_const: bool) -> Result<VarDecl> {
        let name = self.parse_ident()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(VarDecl { name, ty, is_const })
    }

    fn parse_param(&mut self) -> Result<VarDecl> {
        let name = self.parse_ident()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        Ok(VarDecl {
            name,
            ty,
            is_const: false,
        })
    }

    fn parse_type(&mut self) -> Result<TypeRef> {
        if !self.check(TokenKind::Ident) {
            return Err(self.unexpected("type specifier"));
        }
        Ok(TypeRef {
            name: self.parse_ident()?,
        })
    }

    fn parse_proc_decl(&mut self) -> Result<ProcDecl> {
        self.expect(TokenKind::Procedure)?;
        let name = self.parse_ident()?;

        let mut params = Vec::new();
        if self.consume(TokenKind::LParen) {
            if self.check(TokenKind::Ident) {
                params.push(self.parse_param()?);
                while self.consume(TokenKind::Semicolon) {
                    params.push(self.parse_param()?);
                }
            }
            self.expect(TokenKind::RParen)?;
        }
        self.expect(TokenKind::Semicolon)?;

        let mut decls = Vec::new();
        while self.check(TokenKind::Var) || self.check(TokenKind::Const) {
            decls.append(&mut self.parse_var_section()?);
        }

        let body = self.parse_compound()?;
        self.consume(TokenKind::Semicolon);

        Ok(ProcDecl {
            name,
            params,
            decls,
            body,
        })
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let start = self.expect(TokenKind::Begin)?.span;

        let mut stmts = Vec::new();
        while !self.check(TokenKind::End) && !self.is_at_end() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronise();
                    continue;
                }
            }

            if !self.consume(TokenKind::Semicolon) && !self.check(TokenKind::End) {
                let e = self.unexpected("';'");
                self.errors.push(e);
                self.synchronise();
            }
        }

        self.expect(TokenKind::End)?;

        Ok(Compound {
            stmts,
            span: start.merge(&self.previous_span()),
        })
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        match self.current_kind() {
            TokenKind::Begin => Ok(Stmt::Compound(self.parse_compound()?)),
            TokenKind::If => Ok(Stmt::If(self.parse_if()?)),
            TokenKind::Ident if self.peek_kind() == TokenKind::ColonEq => {
                let target = self.parse_ident()?;
                self.advance();
                let value = self.parse_expr()?;
                Ok(Stmt::Assign(Assignment { target, value }))
            }
            TokenKind::Ident => Ok(Stmt::Call(self.parse_call()?)),
            _ => Err(self.unexpected("statement")),
        }
    }

    fn parse_if(&mut self) -> Result<IfStmt> {
        let start = self.expect(TokenKind::If)?.span;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Then)?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.consume(TokenKind::Else) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };

        Ok(IfStmt {
            cond,
            then_branch,
            else_branch,
            span: start.merge(&self.previous_span()),
        })
    }

    fn parse_call(&mut self) -> Result<ProcCall> {
        let name = self.parse_ident()?;
        let mut args = Vec::new();
        if self.consume(TokenKind::LParen) {
            if !self.check(TokenKind::RParen) {
                args.push(self.parse_expr()?);
                while self.consume(TokenKind::Comma) {
                    args.push(self.parse_expr()?);
                }
            }
            self.expect(TokenKind::RParen)?;
        }
        Ok(ProcCall { name, args })
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        if !self.check(TokenKind::Ident) {
            return Err(self.unexpected("identifier"));
        }
        let token = self.advance();
        Ok(Ident::new(token.text, token.span))
    }

    // ==================== Expression Parsing (Pratt) ====================

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(0)
    }

    /// Parse expression with binding power; all binary operators are
    /// left-associative
    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let kind = self.current_kind();
            let Some(bp) = kind.binary_precedence() else {
                break;
            };
            if bp < min_bp {
                break;
            }
            self.advance();

            let op = match kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                TokenKind::Star => BinOp::Mul,
                _ => BinOp::Div,
            };

            let right = self.parse_expr_bp(bp + 1)?;
            let span = left.span().merge(&right.span());
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.current_kind() {
            TokenKind::Minus => UnOp::Neg,
            TokenKind::Plus => UnOp::Plus,
            _ => return self.parse_primary(),
        };
        let start = self.advance().span;
        let expr = self.parse_unary()?;
        let span = start.merge(&expr.span());
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
            span,
        })
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.current_kind() {
            TokenKind::IntLit => {
                let token = self.advance();
                Ok(Expr::IntLit {
                    text: token.text,
                    span: token.span,
                })
            }
            TokenKind::Ident => Ok(Expr::Var(self.parse_ident()?)),
            TokenKind::LParen => {
                self.advance();
                // Parentheses leave no node behind
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            _ => Err(self.unexpected("expression")),
        }
    }
}

/// Lex and parse a source string
pub fn parse_source(source: &str) -> (Program, Vec<Error>) {
    Parser::new(Lexer::new(source)).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        let (program, errors) = parse_source(source);
        assert!(errors.is_empty(), "{:?}", errors);
        program
    }

    #[test]
    fn test_empty_program() {
        let program = parse("program p; begin end.");
        assert_eq!(program.name.name, "p");
        assert!(program.decls.is_empty());
        assert!(program.body.stmts.is_empty());
    }

    #[test]
    fn test_header_is_optional() {
        let program = parse("var x: integer; begin x := 1 end.");
        assert_eq!(program.name.name, "main");
        assert_eq!(program.decls.len(), 1);
    }

    #[test]
    fn test_var_section_with_several_names() {
        let program = parse("program p; var a: integer; b: long; const c: integer; begin end.");
        assert_eq!(program.decls.len(), 3);
        match &program.decls[2] {
            Decl::Var(v) => {
                assert_eq!(v.name.name, "c");
                assert!(v.is_const);
            }
            other => panic!("expected var decl, got {:?}", other),
        }
    }

    #[test]
    fn test_procedure_with_params() {
        let program = parse(
            "program p;
             procedure add(a: integer; b: long);
             var t: integer;
             begin t := a end;
             begin add(1, 2) end.",
        );
        match &program.decls[0] {
            Decl::Proc(p) => {
                assert_eq!(p.name.name, "add");
                assert_eq!(p.params.len(), 2);
                assert_eq!(p.params[1].ty.name.name, "long");
                assert_eq!(p.decls.len(), 1);
            }
            other => panic!("expected procedure, got {:?}", other),
        }
        assert!(matches!(&program.body.stmts[0], Stmt::Call(c) if c.args.len() == 2));
    }

    #[test]
    fn test_precedence_and_associativity() {
        let program = parse("begin x := a - b - c * d end.");
        let Stmt::Assign(assign) = &program.body.stmts[0] else {
            panic!("expected assignment");
        };
        // (a - b) - (c * d)
        let Expr::Binary { left, op, right, .. } = &assign.value else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinOp::Sub);
        assert!(matches!(**left, Expr::Binary { op: BinOp::Sub, .. }));
        assert!(matches!(**right, Expr::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn test_parentheses_leave_no_node() {
        let program = parse("begin x := a + (b) end.");
        let Stmt::Assign(assign) = &program.body.stmts[0] else {
            panic!("expected assignment");
        };
        let Expr::Binary { right, .. } = &assign.value else {
            panic!("expected binary");
        };
        assert!(right.is_leaf());
    }

    #[test]
    fn test_if_else_chain() {
        let program = parse("begin if a then x := 1 else if b then x := 2 else begin x := 3 end end.");
        let Stmt::If(stmt) = &program.body.stmts[0] else {
            panic!("expected if");
        };
        assert!(matches!(stmt.else_branch.as_deref(), Some(Stmt::If(_))));
    }

    #[test]
    fn test_unary_minus() {
        let program = parse("begin x := -a + 1 end.");
        let Stmt::Assign(assign) = &program.body.stmts[0] else {
            panic!("expected assignment");
        };
        let Expr::Binary { left, .. } = &assign.value else {
            panic!("expected binary");
        };
        assert!(matches!(**left, Expr::Unary { op: UnOp::Neg, .. }));
    }

    #[test]
    fn test_recovers_at_statement_boundary() {
        let (program, errors) = parse_source("begin x := ; y := 2; z := 3 end.");
        assert_eq!(errors.len(), 1);
        assert_eq!(program.body.stmts.len(), 2);
    }

    #[test]
    fn test_recovers_in_declarations() {
        let (program, errors) = parse_source("var x integer; var y: long; begin end.");
        assert_eq!(errors.len(), 1);
        assert_eq!(program.decls.len(), 1);
    }
}
