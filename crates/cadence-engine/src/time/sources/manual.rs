use std::cell::{Cell, RefCell};
use std::thread::{self, ThreadId};

use crate::time::{ClockSource, TickNotify};

/// Deterministic clock source driven by hand.
///
/// Time only moves through [`set_now`](Self::set_now) or
/// [`advance`](Self::advance), and a requested tick only fires through
/// [`fire`](Self::fire). At most one request is held; a second request while
/// one is pending replaces it and is logged, since the scheduler never does that.
pub struct ManualClock {
    now: Cell<u64>,
    pending: RefCell<Option<TickNotify>>,
    requests: Cell<usize>,
    owner: ThreadId,
}

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now: Cell::new(now_ms),
            pending: RefCell::new(None),
            requests: Cell::new(0),
            owner: thread::current().id(),
        }
    }

    pub fn set_now(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get().saturating_add(delta_ms));
    }

    /// Runs the pending notify, if any. Returns whether one ran.
    pub fn fire(&self) -> bool {
        // Taken before running: the notify usually re-arms this clock.
        let notify = self.pending.borrow_mut().take();
        match notify {
            Some(notify) => {
                notify();
                true
            }
            None => false,
        }
    }

    pub fn advance_and_fire(&self, delta_ms: u64) -> bool {
        self.advance(delta_ms);
        self.fire()
    }

    /// Whether a request is outstanding.
    pub fn is_armed(&self) -> bool {
        self.pending.borrow().is_some()
    }

    /// Total number of `request_tick` calls received.
    pub fn requests(&self) -> usize {
        self.requests.get()
    }
}

impl ClockSource for ManualClock {
    fn request_tick(&self, notify: TickNotify) {
        self.requests.set(self.requests.get() + 1);
        if self.pending.borrow_mut().replace(notify).is_some() {
            log::warn!("manual clock: tick requested while one is pending; replaced");
        }
    }

    fn is_owning_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    fn uptime_ms(&self) -> u64 {
        self.now.get()
    }
}
