//! Top-level declaration and type parsing
//!
//! A top-level declaration is either a function definition or a global
//! variable declaration; both start with a type, so the parser reads
//! `type identifier` and then branches on the next token.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse a top-level declaration: function definition or global variable
    pub(crate) fn parse_top_level_declaration(&mut self) -> Result<AstNode, ParseError> {
        let decl_type = self.parse_type_spec()?;
        let name = self.expect_identifier()?;
        let loc = self.current_location();

        if self.check(&TokenKind::LParen) {
            self.parse_function_definition(decl_type, name, loc)
        } else {
            self.parse_var_decl_rest(decl_type, name, loc)
        }
    }

    /// Parse a function definition after `type name`: (params) { body }
    fn parse_function_definition(
        &mut self,
        return_type: TypeSpec,
        name: String,
        location: SourceLocation,
    ) -> Result<AstNode, ParseError> {
        self.expect(&TokenKind::LParen, "Expected '(' after function name")?;
        let params = self.parse_parameter_list()?;
        self.expect(&TokenKind::RParen, "Expected ')' after parameters")?;
        self.expect(&TokenKind::LBrace, "Expected '{' before function body")?;

        let body = self.parse_block_statements()?;
        self.expect(&TokenKind::RBrace, "Expected '}' after function body")?;

        Ok(AstNode::FunctionDef(FunctionDef {
            name,
            params,
            return_type,
            body,
            location,
        }))
    }

    /// Parse parameter list: type name, type name, ...
    fn parse_parameter_list(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params = Vec::new();

        if self.check(&TokenKind::RParen) {
            return Ok(params);
        }

        // (void) means no parameters in C
        if self.check(&TokenKind::Void) {
            self.advance()?;
            return Ok(params);
        }

        loop {
            let param_type = self.parse_type_spec()?;
            let param_name = self.expect_identifier()?;
            params.push(Param {
                name: param_name,
                param_type,
            });

            if !self.match_kind(&TokenKind::Comma)? {
                break;
            }
        }

        Ok(params)
    }

    /// Parse the rest of a variable declaration after `type name`:
    /// optional array dimensions, optional initializer, semicolon
    pub(crate) fn parse_var_decl_rest(
        &mut self,
        mut var_type: TypeSpec,
        name: String,
        location: SourceLocation,
    ) -> Result<AstNode, ParseError> {
        while self.match_kind(&TokenKind::LBracket)? {
            let dim_loc = self.current_location();
            let size = match self.peek_kind() {
                TokenKind::IntLiteral(n) if *n > 0 => *n as usize,
                other => {
                    return Err(ParseError {
                        message: format!("Expected positive array size, got {}", other),
                        location: dim_loc,
                    });
                }
            };
            self.advance()?;
            self.expect(&TokenKind::RBracket, "Expected ']' after array size")?;
            var_type = var_type.with_array(size);
        }

        let init = if self.match_kind(&TokenKind::Eq)? {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        self.expect(&TokenKind::Semicolon, "Expected ';' after declaration")?;

        Ok(AstNode::VarDecl {
            name,
            var_type,
            init,
            location,
        })
    }

    /// Parse a type: base keyword followed by pointer stars
    pub(crate) fn parse_type_spec(&mut self) -> Result<TypeSpec, ParseError> {
        let base = match self.peek_kind() {
            TokenKind::Int => BaseType::Int,
            TokenKind::Double => BaseType::Double,
            TokenKind::Void => BaseType::Void,
            other => {
                return Err(ParseError {
                    message: format!("Expected type, got {}", other),
                    location: self.current_location(),
                });
            }
        };
        self.advance()?;

        let mut spec = TypeSpec::new(base);
        while self.match_kind(&TokenKind::Star)? {
            spec = spec.with_pointer();
        }

        Ok(spec)
    }
}
