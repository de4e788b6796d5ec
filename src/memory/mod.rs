//! Memory model for the interpreter
//!
//! This module provides the core memory abstractions:
//! - [`value`]: Runtime value representation (Int, Double, Pointer, Array)
//! - [`scopes`]: Scoped symbol table (global scope plus call frames)
//! - [`arena`]: Bump allocator backing aggregates created during evaluation
//!
//! # Ownership
//!
//! One interpreter session owns exactly one [`arena::Arena`] and one
//! [`scopes::ScopeStack`]. Neither hands out anything that outlives the
//! session: arena cells are addressed by plain indices
//! ([`value::Handle`]) and the whole arena is released in one step on
//! teardown, never piecemeal.

pub mod arena;
pub mod scopes;
pub mod value;
