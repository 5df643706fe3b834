//! Clock sources that do not depend on a window.
//!
//! The vsync-aligned source lives with the winit runtime in `window`.

mod interval;
mod manual;

pub use interval::{IntervalClock, IntervalConfig};
pub use manual::ManualClock;
