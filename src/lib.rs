//! # Introduction
//!
//! cplot is an interactive function plotter: you type a small C program
//! into the editor and the plot redraws as you type. The program's `main`
//! function is evaluated once per sample by an embedded interpreter for a
//! subset of C, on a background worker that never blocks the UI.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Session → Sampler → TUI
//! ```
//!
//! 1. [`parser`] — tokenises the source and builds an AST.
//! 2. [`interpreter`] — loads the AST into a [`interpreter::Session`] and
//!    answers entry calls, one per sample.
//! 3. [`memory`] — the in-process memory model: tagged
//!    [`memory::value::Value`] variants in a scoped symbol table backed by
//!    a session arena.
//! 4. [`sampler`] — worker thread that evaluates sampling passes and
//!    publishes geometry plus diagnostics.
//! 5. [`ui`] — ratatui-based TUI; not part of the stable library API.
//!
//! ## Supported C subset
//!
//! Types: `int`, `double` (`float` is an alias), `void`, pointers,
//! fixed-size arrays. Control flow: `if/else`, `while`, `for`, `break`,
//! `continue`, the ternary operator, `return`. Built-ins: the `<math.h>`
//! slice listed in [`interpreter::builtins`] plus `M_PI` and `M_E`.

pub mod interpreter;
pub mod memory;
pub mod parser;
pub mod sampler;
pub mod ui;
