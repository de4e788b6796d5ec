//! Scoped symbol table
//!
//! This module provides the name → value mapping for evaluation:
//! - [`ScopeStack`]: global scope plus a stack of call frames
//! - [`Frame`]: a single function's activation record
//! - [`Symbol`]: a bound value together with its declared type
//!
//! Block scopes inside a frame support shadowing: entering a scope records
//! which names it declared and which outer bindings it shadowed, so leaving
//! the scope restores the previous bindings exactly. The global scope lives
//! for the whole session; frames are pushed and popped around function calls.

use super::value::Value;
use crate::interpreter::types::TypeId;
use rustc_hash::FxHashMap;

/// A bound symbol: current value plus declared type
#[derive(Debug, Clone, Copy)]
pub struct Symbol {
    pub value: Value,
    pub ty: TypeId,
}

#[derive(Debug, Default)]
struct ScopeData {
    shadowed: Vec<(String, Symbol)>,
    declared: Vec<String>,
}

/// Activation record for one function call
#[derive(Debug, Default)]
pub struct Frame {
    locals: FxHashMap<String, Symbol>,
    scope_stack: Vec<ScopeData>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a new block scope
    pub fn push_scope(&mut self) {
        self.scope_stack.push(ScopeData::default());
    }

    /// Exit the current block scope, restoring shadowed bindings
    pub fn pop_scope(&mut self) {
        if let Some(scope) = self.scope_stack.pop() {
            for name in scope.declared {
                self.locals.remove(&name);
            }
            for (name, sym) in scope.shadowed {
                self.locals.insert(name, sym);
            }
        }
    }

    /// Declare a variable in the innermost scope of this frame. Declaring
    /// the same name twice in one scope replaces the binding without
    /// recording a second shadow entry, so popping the scope still
    /// restores exactly the binding it originally hid.
    pub fn declare(&mut self, name: String, symbol: Symbol) {
        if let Some(scope) = self.scope_stack.last_mut() {
            let seen = scope.declared.iter().any(|n| *n == name)
                || scope.shadowed.iter().any(|(n, _)| *n == name);
            if seen {
                self.locals.insert(name, symbol);
            } else if let Some(old) = self.locals.insert(name.clone(), symbol) {
                scope.shadowed.push((name, old));
            } else {
                scope.declared.push(name);
            }
        } else {
            self.locals.insert(name, symbol);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.locals.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.locals.get_mut(name)
    }
}

/// Global scope plus the call-frame stack
#[derive(Debug, Default)]
pub struct ScopeStack {
    globals: FxHashMap<String, Symbol>,
    frames: Vec<Frame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or replace) a symbol in the global scope
    pub fn define_global(&mut self, name: String, symbol: Symbol) {
        self.globals.insert(name, symbol);
    }

    /// Push a new call frame
    pub fn push_frame(&mut self) {
        self.frames.push(Frame::new());
    }

    /// Pop the top call frame
    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Current (top) frame, if any
    pub fn current_frame_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// Declare a variable: in the current frame if one exists, else global
    pub fn declare(&mut self, name: String, symbol: Symbol) {
        match self.frames.last_mut() {
            Some(frame) => frame.declare(name, symbol),
            None => self.define_global(name, symbol),
        }
    }

    /// Look up a name: current frame first (innermost wins), then globals.
    /// Enclosing frames are not visible, matching C scoping.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        if let Some(frame) = self.frames.last() {
            if let Some(sym) = frame.get(name) {
                return Some(sym);
            }
        }
        self.globals.get(name)
    }

    /// Mutable lookup with the same resolution rule as [`lookup`](Self::lookup)
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        if let Some(frame) = self.frames.last_mut() {
            if frame.get(name).is_some() {
                return frame.get_mut(name);
            }
        }
        self.globals.get_mut(name)
    }

    /// Depth of the call stack
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Drop all frames and globals at once (session reset)
    pub fn reset(&mut self) {
        self.globals.clear();
        self.frames.clear();
    }
}
