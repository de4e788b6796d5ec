//! Runtime value representation
//!
//! This module defines the [`Value`] enum, which represents all possible
//! runtime values in the interpreter. Unlike C's raw memory model, values are
//! tagged and type-safe.
//!
//! # Value Types
//!
//! - [`Value::Int`]: 64-bit signed integer
//! - [`Value::Double`]: 64-bit IEEE floating point
//! - [`Value::Pointer`]: handle into the session arena
//! - [`Value::Array`]: fixed-size array whose elements live in the arena
//! - [`Value::Uninitialized`]: marker for uninitialized memory
//!
//! Aggregates never own their elements directly; they reference arena cells
//! so that the whole session can be torn down in one step.

use crate::interpreter::types::TypeId;

/// Handle into the session arena (cell index, not a raw pointer).
pub type Handle = usize;

/// Runtime values in the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    Int(i64),
    Double(f64),
    Pointer(Handle),
    Array {
        elems: Handle,
        len: usize,
        elem_ty: TypeId,
    },
    #[default]
    Uninitialized,
}

impl Value {
    /// Check if this value is initialized
    pub fn is_initialized(&self) -> bool {
        !matches!(self, Value::Uninitialized)
    }

    /// Get the integer value, returns None if not an Int
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the floating-point value, promoting an Int if needed
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Truthiness for conditionals: nonzero numbers are true
    pub fn is_truthy(&self) -> Option<bool> {
        match self {
            Value::Int(n) => Some(*n != 0),
            Value::Double(d) => Some(*d != 0.0),
            Value::Pointer(_) => Some(true),
            _ => None,
        }
    }
}
