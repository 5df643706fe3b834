use winit::event::WindowEvent;

use super::ctx::AppCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
pub trait App {
    /// Called once after a window and its execution context exist.
    ///
    /// The usual place to register the window's first frame callbacks.
    fn on_window_created(&mut self, ctx: &mut AppCtx<'_>);

    /// Called for window events.
    fn on_window_event(&mut self, ctx: &mut AppCtx<'_>, event: &WindowEvent) -> AppControl {
        let _ = (ctx, event);
        AppControl::Continue
    }

    /// Called after the window's scheduler finished a pass.
    fn on_frame(&mut self, ctx: &mut AppCtx<'_>) -> AppControl {
        let _ = ctx;
        AppControl::Continue
    }
}
