use std::sync::Arc;

use winit::window::{Window, WindowId};

use crate::time::FrameScheduler;
use crate::window::RuntimeCtx;

/// Per-window handles.
pub struct WindowCtx<'a> {
    pub id:     WindowId,
    pub window: &'a Arc<Window>,
}

/// Context passed to every [`App`](super::App) callback.
pub struct AppCtx<'a> {
    pub window:    WindowCtx<'a>,
    /// Scheduler of this window's execution context.
    pub scheduler: FrameScheduler,
    pub runtime:   &'a mut RuntimeCtx,
}

impl AppCtx<'_> {
    /// Timestamp of the window's most recent frame pass.
    pub fn frame_time_ms(&self) -> u64 {
        self.scheduler.current_tick_time()
    }
}
