//! Statement parsing

use crate::error::ParseResult;
use crate::parser::Parser;
use mica_ast::*;
use mica_lexer::TokenKind;

impl Parser {
    pub(crate) fn parse_statement(&mut self) -> ParseResult<Node<Stmt>> {
        let start = self.current_token().span;

        let stmt = match self.current_token().kind {
            TokenKind::Let | TokenKind::Const => self.parse_var_decl()?,
            TokenKind::Function => self.parse_function_decl()?,
            TokenKind::Return => self.parse_return()?,
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::LBrace => self.parse_block()?,
            _ => {
                let expr = self.parse_expression()?;
                self.consume_semicolon();
                Stmt::Expr(expr)
            }
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(stmt, span))
    }

    fn parse_var_decl(&mut self) -> ParseResult<Stmt> {
        let kind = if self.check(&TokenKind::Const) {
            self.advance();
            VarDeclKind::Const
        } else {
            self.advance();
            VarDeclKind::Let
        };

        let name = self.parse_identifier()?;

        let init = if self.check(&TokenKind::Eq) {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.consume_semicolon();

        Ok(Stmt::VarDecl(VarDecl { kind, name, init }))
    }

    pub(crate) fn parse_function_decl(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::Function)?;
        let name = self.parse_identifier()?;

        self.consume(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            params.push(self.parse_identifier()?);
            if !self.check(&TokenKind::RParen) {
                self.consume(TokenKind::Comma)?;
            }
        }
        self.consume(TokenKind::RParen)?;

        self.consume(TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            body.push(self.parse_statement()?);
        }
        self.consume(TokenKind::RBrace)?;

        Ok(Stmt::Function(FunctionDecl { name, params, body }))
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::Return)?;

        let value = if self.check(&TokenKind::Semicolon) || self.check(&TokenKind::RBrace) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon();

        Ok(Stmt::Return(value))
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::If)?;
        self.consume(TokenKind::LParen)?;
        let cond = self.parse_expression()?;
        self.consume(TokenKind::RParen)?;

        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.check(&TokenKind::Else) {
            self.advance();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::While)?;
        self.consume(TokenKind::LParen)?;
        let cond = self.parse_expression()?;
        self.consume(TokenKind::RParen)?;
        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::While { cond, body })
    }

    fn parse_block(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            stmts.push(self.parse_statement()?);
        }
        self.consume(TokenKind::RBrace)?;

        Ok(Stmt::Block(stmts))
    }
}
