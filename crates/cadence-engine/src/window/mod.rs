//! winit runtime.
//!
//! Every window gets its own execution context whose scheduler is driven by a
//! [`RedrawClock`], so frame callbacks run in step with the window's redraws.

mod redraw_clock;
mod runtime;

pub use redraw_clock::RedrawClock;
pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
