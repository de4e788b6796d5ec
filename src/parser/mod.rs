//! Source code parser for the C-subset language
//!
//! This module transforms source text into a small abstract syntax tree:
//! - [`lexer`]: tokenization (source text → lazy token stream)
//! - [`parse`]: parser core (token management, error type)
//! - [`ast`]: AST node definitions
//!
//! Grammar productions are split across `declarations`, `statements` and
//! `expressions`, all implemented as methods on [`parse::Parser`].
//!
//! # Supported subset
//!
//! - Types: `int`, `double` (`float` aliases to it), `void`, pointers,
//!   fixed-size arrays
//! - Statements: declarations, assignment, `if`/`else`, `while`, `for`,
//!   `break`, `continue`, `return`, blocks
//! - Expressions: arithmetic, comparison, short-circuit logical, ternary,
//!   calls, array indexing, increment/decrement
//! - No preprocessor (`#` lines are skipped), no structs, no strings
//!
//! Hand-written recursive descent with one token of lookahead and
//! precedence climbing for binary operators.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;

pub use parse::{ParseError, Parser};
