//! Parser core: token stream management and shared helpers
//!
//! The parser pulls tokens lazily from the [`Lexer`] with exactly one token
//! of lookahead. Grammar productions live in the sibling modules
//! (`declarations`, `statements`, `expressions`) as `pub(crate)` methods on
//! [`Parser`].

use crate::parser::ast::{Program, SourceLocation};
use crate::parser::lexer::{LexError, Lexer, Token, TokenKind};
use std::fmt;
use std::mem;

/// Parser error type
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Recursive descent parser with one token of lookahead
pub struct Parser {
    lexer: Lexer,
    current: Token,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse the entire program (top-level declarations in source order)
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::new();

        while !self.is_at_end() {
            let decl = self.parse_top_level_declaration()?;
            program.nodes.push(decl);
        }

        Ok(program)
    }

    /// Consume the current token and pull the next one from the lexer
    pub(crate) fn advance(&mut self) -> Result<Token, ParseError> {
        let next = self.lexer.next_token()?;
        Ok(mem::replace(&mut self.current, next))
    }

    /// Kind of the lookahead token
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.current.kind
    }

    /// Check the lookahead token without consuming it
    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.current.kind == *kind
    }

    /// Consume the lookahead token if it matches
    pub(crate) fn match_kind(&mut self, kind: &TokenKind) -> Result<bool, ParseError> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consume the lookahead token, failing with `message` if it differs
    pub(crate) fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            self.advance()
        } else {
            Err(ParseError {
                message: format!("{}, got {}", message, self.current.kind),
                location: self.current.location,
            })
        }
    }

    /// Consume an identifier token and return its name
    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match &self.current.kind {
            TokenKind::Ident(_) => {
                let tok = self.advance()?;
                match tok.kind {
                    TokenKind::Ident(name) => Ok(name),
                    _ => unreachable!(),
                }
            }
            other => Err(ParseError {
                message: format!("Expected identifier, got {}", other),
                location: self.current.location,
            }),
        }
    }

    /// Location of the lookahead token
    pub(crate) fn current_location(&self) -> SourceLocation {
        self.current.location
    }

    /// Whether the lookahead token is a type keyword
    pub(crate) fn at_type_keyword(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Int | TokenKind::Double | TokenKind::Void
        )
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }
}
