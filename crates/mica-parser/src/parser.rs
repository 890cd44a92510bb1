//! Core Parser struct, module items, and import/export declarations

use crate::error::{ParseError, ParseResult};
use mica_ast::*;
use mica_lexer::{Token, TokenKind};

/// Recursive descent parser for Mica
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) current: usize,
}

impl Parser {
    /// Creates a new parser from a token stream
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    /// Parses a complete program
    pub fn parse_program(&mut self) -> Result<Program, Vec<ParseError>> {
        let start_span = self.current_token().span;
        let mut items = Vec::new();
        let mut errors = Vec::new();

        while !self.is_at_end() {
            match self.parse_module_item() {
                Ok(item) => items.push(item),
                Err(err) => {
                    errors.push(err);
                    self.synchronize();
                }
            }
        }

        if errors.is_empty() {
            let end_span = items.last().map(|i| i.span).unwrap_or(start_span);
            Ok(Program {
                items,
                span: start_span.merge(&end_span),
            })
        } else {
            Err(errors)
        }
    }

    // =========================================================================
    // Module Items
    // =========================================================================

    pub(crate) fn parse_module_item(&mut self) -> ParseResult<Node<ModuleItem>> {
        let start = self.current_token().span;

        let item = match self.current_token().kind {
            TokenKind::Import => ModuleItem::Import(self.parse_import_decl()?),
            TokenKind::Export => ModuleItem::Export(self.parse_export_decl()?),
            _ => ModuleItem::Stmt(self.parse_statement()?),
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(item, span))
    }

    // =========================================================================
    // Import/Export
    // =========================================================================

    pub(crate) fn parse_import_decl(&mut self) -> ParseResult<ImportDecl> {
        self.consume(TokenKind::Import)?;

        let mut specifiers = Vec::new();

        // import "module" (side-effect only)
        if self.check(&TokenKind::StringLiteral) {
            let source = self.parse_module_source()?;
            self.consume_semicolon();
            return Ok(ImportDecl { specifiers, source });
        }

        // import * as ns from "module"
        if self.check(&TokenKind::Star) {
            let star_span = self.advance().span;
            if !self.check(&TokenKind::As) {
                return Err(ParseError {
                    message: "Expected `as` after `*` in import (wildcard imports \
                              must bind a namespace)"
                        .to_string(),
                    span: star_span,
                });
            }
            self.advance();
            let name = self.parse_identifier()?;
            specifiers.push(ImportSpecifier::Namespace(name));
        } else {
            // Optional default specifier
            if self.check(&TokenKind::Identifier) {
                let name = self.parse_identifier()?;
                specifiers.push(ImportSpecifier::Default(name));
                if self.check(&TokenKind::Comma) {
                    self.advance();
                }
            }

            // Named specifiers
            if self.check(&TokenKind::LBrace) {
                self.advance();
                while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
                    let imported = self.parse_identifier()?;
                    let local = if self.check(&TokenKind::As) {
                        self.advance();
                        Some(self.parse_identifier()?)
                    } else {
                        None
                    };
                    specifiers.push(ImportSpecifier::Named { imported, local });
                    if !self.check(&TokenKind::RBrace) {
                        self.consume(TokenKind::Comma)?;
                    }
                }
                self.consume(TokenKind::RBrace)?;
            }
        }

        if specifiers.is_empty() {
            return Err(self.error("Expected import specifiers".to_string()));
        }

        self.consume(TokenKind::From)?;
        let source = self.parse_module_source()?;
        self.consume_semicolon();

        Ok(ImportDecl { specifiers, source })
    }

    pub(crate) fn parse_export_decl(&mut self) -> ParseResult<ExportDecl> {
        self.consume(TokenKind::Export)?;

        match self.current_token().kind {
            // export default expr; / export default function f() {}
            TokenKind::Default => {
                self.advance();
                if self.check(&TokenKind::Function) {
                    let stmt = self.parse_statement()?;
                    Ok(ExportDecl::DefaultDecl(Box::new(stmt)))
                } else {
                    let expr = self.parse_expression()?;
                    self.consume_semicolon();
                    Ok(ExportDecl::Default(expr))
                }
            }

            // export * from "m"; / export * as ns from "m";
            TokenKind::Star => {
                self.advance();
                let as_name = if self.check(&TokenKind::As) {
                    self.advance();
                    Some(self.parse_identifier()?)
                } else {
                    None
                };
                self.consume(TokenKind::From)?;
                let source = self.parse_module_source()?;
                self.consume_semicolon();
                Ok(ExportDecl::All { source, as_name })
            }

            // export { a, b as c } [from "m"];
            TokenKind::LBrace => {
                self.advance();
                let mut specifiers = Vec::new();
                while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
                    let local = self.parse_identifier()?;
                    let exported = if self.check(&TokenKind::As) {
                        self.advance();
                        Some(self.parse_identifier()?)
                    } else {
                        None
                    };
                    specifiers.push(ExportSpecifier { local, exported });
                    if !self.check(&TokenKind::RBrace) {
                        self.consume(TokenKind::Comma)?;
                    }
                }
                self.consume(TokenKind::RBrace)?;

                let source = if self.check(&TokenKind::From) {
                    self.advance();
                    Some(self.parse_module_source()?)
                } else {
                    None
                };
                self.consume_semicolon();
                Ok(ExportDecl::Named { specifiers, source })
            }

            // export const x = e; / export let x = e; / export function f() {}
            TokenKind::Const | TokenKind::Let | TokenKind::Function => {
                let stmt = self.parse_statement()?;
                Ok(ExportDecl::Decl(Box::new(stmt)))
            }

            _ => Err(self.error("Expected export declaration".to_string())),
        }
    }

    /// Parses a module source string literal, keeping its span for
    /// resolution diagnostics.
    fn parse_module_source(&mut self) -> ParseResult<Node<String>> {
        let token = self.consume(TokenKind::StringLiteral)?;
        Ok(Node::new(token.value.clone(), token.span))
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    pub(crate) fn current_token(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    pub(crate) fn previous_token(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current_token().kind == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        &self.current_token().kind == kind
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous_token()
    }

    pub(crate) fn consume(&mut self, kind: TokenKind) -> ParseResult<&Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!(
                "Expected {:?}, found {:?}",
                kind,
                self.current_token().kind
            )))
        }
    }

    /// Semicolons terminate declarations but a missing one before `}` or
    /// EOF is tolerated.
    pub(crate) fn consume_semicolon(&mut self) {
        if self.check(&TokenKind::Semicolon) {
            self.advance();
        }
    }

    pub(crate) fn parse_identifier(&mut self) -> ParseResult<Node<Ident>> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(Node::new(Ident::new(token.value.clone()), token.span))
    }

    pub(crate) fn error(&self, message: String) -> ParseError {
        ParseError {
            message,
            span: self.current_token().span,
        }
    }

    /// Skips tokens until a likely statement boundary after a parse error.
    pub(crate) fn synchronize(&mut self) {
        while !self.is_at_end() {
            if self.previous_token().kind == TokenKind::Semicolon {
                return;
            }
            match self.current_token().kind {
                TokenKind::Import
                | TokenKind::Export
                | TokenKind::Const
                | TokenKind::Let
                | TokenKind::Function
                | TokenKind::Return
                | TokenKind::If
                | TokenKind::While => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}
