//! Expression parsing
//!
//! C precedence and associativity via a precedence-climbing ladder:
//! assignment (right-assoc) → ternary → logical or → logical and →
//! equality → relational → additive → multiplicative → unary → postfix →
//! primary. Assignment targets are validated by the evaluator, not here.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<AstNode, ParseError> {
        self.parse_assignment()
    }

    /// Parse assignment (right-associative)
    fn parse_assignment(&mut self) -> Result<AstNode, ParseError> {
        let expr = self.parse_ternary()?;
        let loc = self.current_location();

        if self.match_kind(&TokenKind::Eq)? {
            let rhs = Box::new(self.parse_assignment()?);
            return Ok(AstNode::Assignment {
                lhs: Box::new(expr),
                rhs,
                location: loc,
            });
        }

        let compound_op = if self.match_kind(&TokenKind::PlusEq)? {
            Some(BinOp::Add)
        } else if self.match_kind(&TokenKind::MinusEq)? {
            Some(BinOp::Sub)
        } else if self.match_kind(&TokenKind::StarEq)? {
            Some(BinOp::Mul)
        } else if self.match_kind(&TokenKind::SlashEq)? {
            Some(BinOp::Div)
        } else if self.match_kind(&TokenKind::PercentEq)? {
            Some(BinOp::Mod)
        } else {
            None
        };

        if let Some(op) = compound_op {
            let rhs = Box::new(self.parse_assignment()?);
            return Ok(AstNode::CompoundAssignment {
                lhs: Box::new(expr),
                op,
                rhs,
                location: loc,
            });
        }

        Ok(expr)
    }

    /// Parse ternary: condition ? true_expr : false_expr
    fn parse_ternary(&mut self) -> Result<AstNode, ParseError> {
        let expr = self.parse_logical_or()?;

        if self.match_kind(&TokenKind::Question)? {
            let loc = self.current_location();
            let true_expr = Box::new(self.parse_expression()?);
            self.expect(&TokenKind::Colon, "Expected ':' in ternary expression")?;
            let false_expr = Box::new(self.parse_ternary()?);

            return Ok(AstNode::TernaryOp {
                condition: Box::new(expr),
                true_expr,
                false_expr,
                location: loc,
            });
        }

        Ok(expr)
    }

    /// Parse logical OR (||)
    fn parse_logical_or(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_logical_and()?;

        while self.check(&TokenKind::OrOr) {
            let loc = self.current_location();
            self.advance()?;
            let right = Box::new(self.parse_logical_and()?);
            left = AstNode::BinaryOp {
                op: BinOp::Or,
                left: Box::new(left),
                right,
                location: loc,
            };
        }

        Ok(left)
    }

    /// Parse logical AND (&&)
    fn parse_logical_and(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_equality()?;

        while self.check(&TokenKind::AndAnd) {
            let loc = self.current_location();
            self.advance()?;
            let right = Box::new(self.parse_equality()?);
            left = AstNode::BinaryOp {
                op: BinOp::And,
                left: Box::new(left),
                right,
                location: loc,
            };
        }

        Ok(left)
    }

    /// Parse equality (== !=)
    fn parse_equality(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_relational()?;

        loop {
            let loc = self.current_location();
            let op = if self.match_kind(&TokenKind::EqEq)? {
                BinOp::Eq
            } else if self.match_kind(&TokenKind::NotEq)? {
                BinOp::Ne
            } else {
                break;
            };

            let right = Box::new(self.parse_relational()?);
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right,
                location: loc,
            };
        }

        Ok(left)
    }

    /// Parse relational (< <= > >=)
    fn parse_relational(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_additive()?;

        loop {
            let loc = self.current_location();
            let op = if self.match_kind(&TokenKind::Lt)? {
                BinOp::Lt
            } else if self.match_kind(&TokenKind::Le)? {
                BinOp::Le
            } else if self.match_kind(&TokenKind::Gt)? {
                BinOp::Gt
            } else if self.match_kind(&TokenKind::Ge)? {
                BinOp::Ge
            } else {
                break;
            };

            let right = Box::new(self.parse_additive()?);
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right,
                location: loc,
            };
        }

        Ok(left)
    }

    /// Parse additive (+ -)
    fn parse_additive(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let loc = self.current_location();
            let op = if self.match_kind(&TokenKind::Plus)? {
                BinOp::Add
            } else if self.match_kind(&TokenKind::Minus)? {
                BinOp::Sub
            } else {
                break;
            };

            let right = Box::new(self.parse_multiplicative()?);
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right,
                location: loc,
            };
        }

        Ok(left)
    }

    /// Parse multiplicative (* / %)
    fn parse_multiplicative(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let loc = self.current_location();
            let op = if self.match_kind(&TokenKind::Star)? {
                BinOp::Mul
            } else if self.match_kind(&TokenKind::Slash)? {
                BinOp::Div
            } else if self.match_kind(&TokenKind::Percent)? {
                BinOp::Mod
            } else {
                break;
            };

            let right = Box::new(self.parse_unary()?);
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right,
                location: loc,
            };
        }

        Ok(left)
    }

    /// Parse unary (- ! * ++ --)
    fn parse_unary(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        let op = if self.match_kind(&TokenKind::Minus)? {
            UnOp::Neg
        } else if self.match_kind(&TokenKind::Bang)? {
            UnOp::Not
        } else if self.match_kind(&TokenKind::Star)? {
            UnOp::Deref
        } else if self.match_kind(&TokenKind::PlusPlus)? {
            UnOp::PreInc
        } else if self.match_kind(&TokenKind::MinusMinus)? {
            UnOp::PreDec
        } else if self.match_kind(&TokenKind::Plus)? {
            // Unary plus: just return the operand
            return self.parse_unary();
        } else {
            return self.parse_postfix();
        };

        let operand = Box::new(self.parse_unary()?);
        Ok(AstNode::UnaryOp {
            op,
            operand,
            location: loc,
        })
    }

    /// Parse postfix (++ -- [] ())
    fn parse_postfix(&mut self) -> Result<AstNode, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            let loc = self.current_location();

            if self.match_kind(&TokenKind::PlusPlus)? {
                expr = AstNode::UnaryOp {
                    op: UnOp::PostInc,
                    operand: Box::new(expr),
                    location: loc,
                };
            } else if self.match_kind(&TokenKind::MinusMinus)? {
                expr = AstNode::UnaryOp {
                    op: UnOp::PostDec,
                    operand: Box::new(expr),
                    location: loc,
                };
            } else if self.match_kind(&TokenKind::LBracket)? {
                let index = Box::new(self.parse_expression()?);
                self.expect(&TokenKind::RBracket, "Expected ']' after array index")?;
                expr = AstNode::ArrayAccess {
                    array: Box::new(expr),
                    index,
                    location: loc,
                };
            } else if self.check(&TokenKind::LParen) {
                let name = match expr {
                    AstNode::Variable(n, _) => n,
                    _ => {
                        return Err(ParseError {
                            message: "Function call must be on an identifier".to_string(),
                            location: loc,
                        });
                    }
                };
                self.advance()?; // consume '('
                let args = self.parse_argument_list()?;
                self.expect(&TokenKind::RParen, "Expected ')' after function arguments")?;
                expr = AstNode::FunctionCall {
                    name,
                    args,
                    location: loc,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse argument list: expr, expr, ...
    fn parse_argument_list(&mut self) -> Result<Vec<AstNode>, ParseError> {
        let mut args = Vec::new();

        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);
            if !self.match_kind(&TokenKind::Comma)? {
                break;
            }
        }

        Ok(args)
    }

    /// Parse primary (literals, variables, parenthesized expressions)
    fn parse_primary(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        match self.peek_kind() {
            TokenKind::IntLiteral(n) => {
                let n = *n;
                self.advance()?;
                Ok(AstNode::IntLiteral(n, loc))
            }
            TokenKind::DoubleLiteral(d) => {
                let d = *d;
                self.advance()?;
                Ok(AstNode::DoubleLiteral(d, loc))
            }
            TokenKind::Ident(_) => {
                let name = self.expect_identifier()?;
                Ok(AstNode::Variable(name, loc))
            }
            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RParen, "Expected ')' after expression")?;
                Ok(expr)
            }
            other => Err(ParseError {
                message: format!("Unexpected token: {}", other),
                location: loc,
            }),
        }
    }
}
