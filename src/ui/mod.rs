//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! - **[`app`]** — application state, keyboard event loop, the source editor
//! - **[`panes`]** — stateless render functions (editor, plot, status bar, help)
//! - **[`theme`]** — centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a running
//! [`Sampler`] and call [`App::run`] to start the event loop. The app polls
//! the sampler every frame, so partial progress and diagnostics appear as
//! soon as the worker publishes them.
//!
//! [`Sampler`]: crate::sampler::Sampler
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
