//! Statement parsing
//!
//! Control-flow bodies are parsed as statement vectors; a braced body
//! contributes its statements directly, an unbraced body contributes the
//! single statement that follows (C's dangling-else resolves to the nearest
//! `if` because `parse_statement` is called recursively).

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse statements until the closing brace of the enclosing block
    pub(crate) fn parse_block_statements(&mut self) -> Result<Vec<AstNode>, ParseError> {
        let mut statements = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        Ok(statements)
    }

    /// Parse a single statement
    pub(crate) fn parse_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        if self.at_type_keyword() {
            let var_type = self.parse_type_spec()?;
            let name = self.expect_identifier()?;
            return self.parse_var_decl_rest(var_type, name, loc);
        }

        match self.peek_kind() {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => {
                self.advance()?;
                self.expect(&TokenKind::Semicolon, "Expected ';' after 'break'")?;
                Ok(AstNode::Break { location: loc })
            }
            TokenKind::Continue => {
                self.advance()?;
                self.expect(&TokenKind::Semicolon, "Expected ';' after 'continue'")?;
                Ok(AstNode::Continue { location: loc })
            }
            TokenKind::LBrace => {
                self.advance()?;
                let statements = self.parse_block_statements()?;
                self.expect(&TokenKind::RBrace, "Expected '}' after block")?;
                Ok(AstNode::Block {
                    statements,
                    location: loc,
                })
            }
            _ => {
                let expr = Box::new(self.parse_expression()?);
                self.expect(&TokenKind::Semicolon, "Expected ';' after expression")?;
                Ok(AstNode::ExpressionStatement {
                    expr,
                    location: loc,
                })
            }
        }
    }

    /// Parse a statement as a body: `{ ... }` or a single statement
    fn parse_body(&mut self) -> Result<Vec<AstNode>, ParseError> {
        if self.match_kind(&TokenKind::LBrace)? {
            let statements = self.parse_block_statements()?;
            self.expect(&TokenKind::RBrace, "Expected '}' after block")?;
            Ok(statements)
        } else {
            Ok(vec![self.parse_statement()?])
        }
    }

    fn parse_if(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.advance()?; // consume 'if'

        self.expect(&TokenKind::LParen, "Expected '(' after 'if'")?;
        let condition = Box::new(self.parse_expression()?);
        self.expect(&TokenKind::RParen, "Expected ')' after condition")?;

        let then_branch = self.parse_body()?;

        let else_branch = if self.match_kind(&TokenKind::Else)? {
            Some(self.parse_body()?)
        } else {
            None
        };

        Ok(AstNode::If {
            condition,
            then_branch,
            else_branch,
            location: loc,
        })
    }

    fn parse_while(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.advance()?; // consume 'while'

        self.expect(&TokenKind::LParen, "Expected '(' after 'while'")?;
        let condition = Box::new(self.parse_expression()?);
        self.expect(&TokenKind::RParen, "Expected ')' after condition")?;

        let body = self.parse_body()?;

        Ok(AstNode::While {
            condition,
            body,
            location: loc,
        })
    }

    fn parse_for(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.advance()?; // consume 'for'

        self.expect(&TokenKind::LParen, "Expected '(' after 'for'")?;

        // Init clause: declaration, expression, or empty
        let init = if self.match_kind(&TokenKind::Semicolon)? {
            None
        } else if self.at_type_keyword() {
            let init_loc = self.current_location();
            let var_type = self.parse_type_spec()?;
            let name = self.expect_identifier()?;
            // consumes the ';'
            Some(Box::new(self.parse_var_decl_rest(var_type, name, init_loc)?))
        } else {
            let expr_loc = self.current_location();
            let expr = Box::new(self.parse_expression()?);
            self.expect(&TokenKind::Semicolon, "Expected ';' after for-init")?;
            Some(Box::new(AstNode::ExpressionStatement {
                expr,
                location: expr_loc,
            }))
        };

        let condition = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect(&TokenKind::Semicolon, "Expected ';' after for-condition")?;

        let increment = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect(&TokenKind::RParen, "Expected ')' after for-clauses")?;

        let body = self.parse_body()?;

        Ok(AstNode::For {
            init,
            condition,
            increment,
            body,
            location: loc,
        })
    }

    fn parse_return(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.advance()?; // consume 'return'

        let expr = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect(&TokenKind::Semicolon, "Expected ';' after return value")?;

        Ok(AstNode::Return {
            expr,
            location: loc,
        })
    }
}
