//! Cadence engine crate.
//!
//! Frame callback scheduling for a single execution context, the clock sources
//! that drive it, staggered group starts, and a winit runtime that hands each
//! window its own context.

pub mod context;
pub mod core;
pub mod logging;
pub mod stagger;
pub mod time;
pub mod window;
