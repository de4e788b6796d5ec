//! Concurrent sampling of user programs into plot geometry
//!
//! [`domain`] describes the window being plotted and the coordinate
//! modes; [`engine`] owns the worker thread that evaluates passes and
//! publishes [`engine::PlotResult`]s for the UI to poll.

pub mod domain;
pub mod engine;

pub use domain::{CoordinateMode, Domain};
pub use engine::{PlotResult, PointSet, Sampler, CURVE_POINTS, SURFACE_GRID};
