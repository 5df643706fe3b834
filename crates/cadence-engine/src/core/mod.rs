//! Application contract between the winit runtime and higher layers.
//!
//! Callbacks receive an [`AppCtx`] with the window, the window's frame
//! scheduler and a command buffer; runtime internals stay private.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{AppCtx, WindowCtx};
