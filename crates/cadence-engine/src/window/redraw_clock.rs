use std::cell::RefCell;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use winit::window::Window;

use crate::time::{ClockSource, TickNotify};

/// Display-refresh clock source for one winit window.
///
/// A tick request asks the window for a redraw; the runtime calls
/// [`fire`](Self::fire) when `WindowEvent::RedrawRequested` arrives, which the
/// platform paces to the display. Nothing is requested while the scheduler is
/// idle, so an idle window costs no frames.
pub struct RedrawClock {
    window: Arc<Window>,
    pending: RefCell<Option<TickNotify>>,
    owner: ThreadId,
}

impl RedrawClock {
    /// Binds the clock to `window`. Must be created on the event loop thread.
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            pending: RefCell::new(None),
            owner: thread::current().id(),
        }
    }

    /// Runs the pending notify, if any. Returns whether one ran.
    ///
    /// Redraws the platform issues on its own (expose, resize) find nothing
    /// pending and are ignored.
    pub fn fire(&self) -> bool {
        let notify = self.pending.borrow_mut().take();
        match notify {
            Some(notify) => {
                notify();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.borrow().is_some()
    }
}

impl ClockSource for RedrawClock {
    fn request_tick(&self, notify: TickNotify) {
        if self.pending.borrow_mut().replace(notify).is_some() {
            log::warn!("redraw clock: tick requested while one is pending; replaced");
        }
        self.window.request_redraw();
    }

    fn is_owning_thread(&self) -> bool {
        thread::current().id() == self.owner
    }
}
