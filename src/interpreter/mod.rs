//! Tree-walking interpreter for the C subset
//!
//! The interpreter turns parsed source into callable math: a [`Session`]
//! loads a program once and then answers repeated entry calls, one per
//! sample. Modules:
//!
//! - [`session`]: the [`Session`] facade (load, call_entry, reset)
//! - [`types`]: interned type table and the promotion rule
//! - [`builtins`]: the `<math.h>` slice exposed to user source
//! - [`statements`] / [`expressions`]: evaluation proper
//! - [`errors`]: fault taxonomy and the [`Diagnostic`] boundary type

pub mod builtins;
pub mod errors;
mod expressions;
pub mod session;
mod statements;
pub mod types;

pub use errors::{Diagnostic, EvalError};
pub use session::Session;
