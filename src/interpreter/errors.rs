//! Error types for the interpreter
//!
//! [`EvalError`] covers every fault that can occur while loading or running
//! user source: type errors, undefined identifiers, arithmetic faults,
//! resource ceilings, and entry-point contract violations. A fault inside
//! user source must never escape a session method as anything but a value,
//! so every public session operation converts an `EvalError` (or a parse
//! error) into a [`Diagnostic`] — one human-readable message plus an
//! optional source location. Contract violations are a property of the
//! whole program, not of one site, and carry no location.

use crate::parser::ast::SourceLocation;
use crate::parser::lexer::LexError;
use crate::parser::parse::ParseError;
use std::fmt;

/// Faults raised during evaluation
#[derive(Debug, Clone)]
pub enum EvalError {
    /// Undefined variable reference
    UndefinedVariable {
        name: String,
        location: SourceLocation,
    },

    /// Undefined function call
    UndefinedFunction {
        name: String,
        location: SourceLocation,
    },

    /// Read from a variable or array cell that was never assigned
    UninitializedRead {
        what: String,
        location: SourceLocation,
    },

    /// Incompatible operand or assignment types
    TypeMismatch {
        expected: String,
        got: String,
        location: SourceLocation,
    },

    /// Division or modulo by zero
    DivisionByZero { location: SourceLocation },

    /// Integer arithmetic overflow
    IntegerOverflow {
        operation: String,
        location: SourceLocation,
    },

    /// Function argument count mismatch
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        got: usize,
        location: SourceLocation,
    },

    /// A library function produced a non-finite result for these arguments
    InvalidLibraryArgument {
        function: String,
        location: SourceLocation,
    },

    /// Array index out of bounds
    BufferOverrun {
        index: i64,
        len: usize,
        location: SourceLocation,
    },

    /// Dereference of something that is not a valid pointer
    InvalidPointer {
        message: String,
        location: SourceLocation,
    },

    /// Expression is not assignable
    NotAssignable { location: SourceLocation },

    /// `break` or `continue` outside a loop
    LoopControlOutsideLoop {
        keyword: &'static str,
        location: SourceLocation,
    },

    /// Arena cell ceiling exceeded
    OutOfMemory {
        message: String,
        location: SourceLocation,
    },

    /// Per-call step budget exhausted (runaway loop or recursion)
    StepLimitExceeded {
        limit: u64,
        location: SourceLocation,
    },

    /// Call stack depth ceiling exceeded
    CallDepthExceeded {
        limit: usize,
        location: SourceLocation,
    },

    /// Entry-point contract: no such symbol
    MissingEntryPoint { name: String },

    /// Entry-point contract: wrong arity or parameter/return types
    EntrySignature { name: String, message: String },
}

impl EvalError {
    /// Source location of the fault. Contract violations have none: they
    /// describe the whole program, not one site.
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            EvalError::UndefinedVariable { location, .. }
            | EvalError::UndefinedFunction { location, .. }
            | EvalError::UninitializedRead { location, .. }
            | EvalError::TypeMismatch { location, .. }
            | EvalError::DivisionByZero { location }
            | EvalError::IntegerOverflow { location, .. }
            | EvalError::ArgumentCountMismatch { location, .. }
            | EvalError::InvalidLibraryArgument { location, .. }
            | EvalError::BufferOverrun { location, .. }
            | EvalError::InvalidPointer { location, .. }
            | EvalError::NotAssignable { location }
            | EvalError::LoopControlOutsideLoop { location, .. }
            | EvalError::OutOfMemory { location, .. }
            | EvalError::StepLimitExceeded { location, .. }
            | EvalError::CallDepthExceeded { location, .. } => Some(*location),
            EvalError::MissingEntryPoint { .. } | EvalError::EntrySignature { .. } => None,
        }
    }

    /// Whether this is an entry-point contract violation
    pub fn is_contract_error(&self) -> bool {
        matches!(
            self,
            EvalError::MissingEntryPoint { .. } | EvalError::EntrySignature { .. }
        )
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UndefinedVariable { name, .. } => {
                write!(f, "Undefined variable '{}'", name)
            }
            EvalError::UndefinedFunction { name, .. } => {
                write!(f, "Undefined function '{}'", name)
            }
            EvalError::UninitializedRead { what, .. } => {
                write!(f, "Read of uninitialized {}", what)
            }
            EvalError::TypeMismatch { expected, got, .. } => {
                write!(f, "Type error: expected {}, got {}", expected, got)
            }
            EvalError::DivisionByZero { .. } => {
                write!(f, "Division by zero")
            }
            EvalError::IntegerOverflow { operation, .. } => {
                write!(f, "Integer overflow in {}", operation)
            }
            EvalError::ArgumentCountMismatch {
                function,
                expected,
                got,
                ..
            } => {
                write!(
                    f,
                    "Function '{}' expects {} argument{}, got {}",
                    function,
                    expected,
                    if *expected == 1 { "" } else { "s" },
                    got
                )
            }
            EvalError::InvalidLibraryArgument { function, .. } => {
                write!(f, "Invalid argument to library function '{}'", function)
            }
            EvalError::BufferOverrun { index, len, .. } => {
                write!(f, "Index {} out of bounds for array of size {}", index, len)
            }
            EvalError::InvalidPointer { message, .. } => {
                write!(f, "Invalid pointer: {}", message)
            }
            EvalError::NotAssignable { .. } => {
                write!(f, "Expression is not assignable")
            }
            EvalError::LoopControlOutsideLoop { keyword, .. } => {
                write!(f, "'{}' outside of a loop", keyword)
            }
            EvalError::OutOfMemory { message, .. } => {
                write!(f, "{}", message)
            }
            EvalError::StepLimitExceeded { limit, .. } => {
                write!(f, "Evaluation exceeded the step budget of {}", limit)
            }
            EvalError::CallDepthExceeded { limit, .. } => {
                write!(f, "Call depth exceeded the limit of {}", limit)
            }
            EvalError::MissingEntryPoint { name } => {
                write!(f, "{}() is not defined", name)
            }
            EvalError::EntrySignature { name, message } => {
                write!(f, "{}: {}", name, message)
            }
        }
    }
}

impl std::error::Error for EvalError {}

/// The single error shape every session operation reports:
/// a message plus an optional source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(f, "line {}: {}", loc.line, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for Diagnostic {}

impl From<EvalError> for Diagnostic {
    fn from(err: EvalError) -> Self {
        Diagnostic {
            location: err.location(),
            message: err.to_string(),
        }
    }
}

impl From<ParseError> for Diagnostic {
    fn from(err: ParseError) -> Self {
        Diagnostic {
            message: err.message,
            location: Some(err.location),
        }
    }
}

impl From<LexError> for Diagnostic {
    fn from(err: LexError) -> Self {
        Diagnostic {
            message: err.message,
            location: Some(err.location),
        }
    }
}
