//! Expression parsing (precedence climbing)

use crate::error::ParseResult;
use crate::parser::Parser;
use mica_ast::*;
use mica_lexer::TokenKind;

impl Parser {
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Node<Expr>> {
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, min_prec: u8) -> ParseResult<Node<Expr>> {
        let mut left = self.parse_unary()?;

        while let Some((op, prec)) = binary_op(&self.current_token().kind) {
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.parse_binary(prec + 1)?;
            let span = left.span.merge(&right.span);
            left = Node::new(
                Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Node<Expr>> {
        let start = self.current_token().span;
        let op = match self.current_token().kind {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            let span = start.merge(&operand.span);
            return Ok(Node::new(
                Expr::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }

        self.parse_postfix()
    }

    /// Calls, member access, and indexing bind tighter than any operator.
    fn parse_postfix(&mut self) -> ParseResult<Node<Expr>> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current_token().kind {
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    while !self.check(&TokenKind::RParen) && !self.is_at_end() {
                        args.push(self.parse_expression()?);
                        if !self.check(&TokenKind::RParen) {
                            self.consume(TokenKind::Comma)?;
                        }
                    }
                    let end = self.consume(TokenKind::RParen)?.span;
                    let span = expr.span.merge(&end);
                    expr = Node::new(
                        Expr::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let property = self.parse_identifier()?;
                    let span = expr.span.merge(&property.span);
                    expr = Node::new(
                        Expr::Member {
                            object: Box::new(expr),
                            property,
                        },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    let end = self.consume(TokenKind::RBracket)?.span;
                    let span = expr.span.merge(&end);
                    expr = Node::new(
                        Expr::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Node<Expr>> {
        let token = self.current_token().clone();

        let expr = match token.kind {
            TokenKind::NumberLiteral => {
                self.advance();
                let value = token.value.parse::<f64>().map_err(|_| {
                    self.error(format!("Invalid number literal: {}", token.value))
                })?;
                Expr::Literal(Literal::Number(value))
            }
            TokenKind::StringLiteral => {
                self.advance();
                Expr::Literal(Literal::String(token.value.clone()))
            }
            TokenKind::True => {
                self.advance();
                Expr::Literal(Literal::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                Expr::Literal(Literal::Bool(false))
            }
            TokenKind::Null => {
                self.advance();
                Expr::Literal(Literal::Null)
            }
            TokenKind::Identifier => {
                self.advance();
                Expr::Ident(Ident::new(token.value.clone()))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                while !self.check(&TokenKind::RBracket) && !self.is_at_end() {
                    elements.push(self.parse_expression()?);
                    if !self.check(&TokenKind::RBracket) {
                        self.consume(TokenKind::Comma)?;
                    }
                }
                let end = self.consume(TokenKind::RBracket)?.span;
                return Ok(Node::new(Expr::Array(elements), token.span.merge(&end)));
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(TokenKind::RParen)?;
                return Ok(expr);
            }
            _ => {
                return Err(self.error(format!(
                    "Expected expression, found {:?}",
                    token.kind
                )))
            }
        };

        Ok(Node::new(expr, token.span))
    }
}

/// Operator precedence table. Higher binds tighter.
fn binary_op(kind: &TokenKind) -> Option<(BinaryOp, u8)> {
    let entry = match kind {
        TokenKind::PipePipe => (BinaryOp::Or, 1),
        TokenKind::AmpAmp => (BinaryOp::And, 2),
        TokenKind::EqEq => (BinaryOp::Eq, 3),
        TokenKind::BangEq => (BinaryOp::NotEq, 3),
        TokenKind::Lt => (BinaryOp::Lt, 4),
        TokenKind::Gt => (BinaryOp::Gt, 4),
        TokenKind::LtEq => (BinaryOp::LtEq, 4),
        TokenKind::GtEq => (BinaryOp::GtEq, 4),
        TokenKind::Plus => (BinaryOp::Add, 5),
        TokenKind::Minus => (BinaryOp::Sub, 5),
        TokenKind::Star => (BinaryOp::Mul, 6),
        TokenKind::Slash => (BinaryOp::Div, 6),
        _ => return None,
    };
    Some(entry)
}
