use std::cell::{Cell, RefCell};
use std::thread::{self, ThreadId};
use std::time::Duration;

use crate::time::{ClockSource, TickNotify};

/// Interval clock configuration.
#[derive(Debug, Clone)]
pub struct IntervalConfig {
    /// Target spacing between consecutive fires.
    pub frame_delay: Duration,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            frame_delay: Duration::from_millis(10),
        }
    }
}

struct Pending {
    deadline_ms: u64,
    notify: TickNotify,
}

/// Fixed-interval fallback for hosts without a display refresh signal.
///
/// A request fires `frame_delay` after the previous fire, or immediately if
/// that moment has already passed, so lateness does not accumulate across
/// frames. The clock does not own a thread: the owning thread drives it with
/// [`pump`](Self::pump) or [`run`](Self::run).
pub struct IntervalClock {
    frame_delay_ms: u64,
    last_fire_ms: Cell<u64>,
    pending: RefCell<Option<Pending>>,
    owner: ThreadId,
}

impl IntervalClock {
    pub fn new(config: IntervalConfig) -> Self {
        Self {
            frame_delay_ms: config.frame_delay.as_millis() as u64,
            last_fire_ms: Cell::new(0),
            pending: RefCell::new(None),
            owner: thread::current().id(),
        }
    }

    /// Whether a request is outstanding.
    pub fn is_armed(&self) -> bool {
        self.pending.borrow().is_some()
    }

    /// Deadline of the outstanding request, in uptime milliseconds.
    pub fn deadline_ms(&self) -> Option<u64> {
        self.pending.borrow().as_ref().map(|p| p.deadline_ms)
    }

    /// Waits for the outstanding request and fires it.
    ///
    /// Returns `false` without blocking when nothing is pending.
    pub fn pump(&self) -> bool {
        let Some(pending) = self.pending.borrow_mut().take() else {
            return false;
        };

        let now = self.uptime_ms();
        if pending.deadline_ms > now {
            thread::sleep(Duration::from_millis(pending.deadline_ms - now));
        }

        self.last_fire_ms.set(self.uptime_ms());
        (pending.notify)();
        true
    }

    /// Pumps until no request is outstanding. Returns the number of fires.
    pub fn run(&self) -> u64 {
        let mut fired = 0;
        while self.pump() {
            fired += 1;
        }
        log::debug!("interval clock drained after {fired} ticks");
        fired
    }
}

impl Default for IntervalClock {
    fn default() -> Self {
        Self::new(IntervalConfig::default())
    }
}

impl ClockSource for IntervalClock {
    fn request_tick(&self, notify: TickNotify) {
        let now = self.uptime_ms();
        let since_last = now.saturating_sub(self.last_fire_ms.get());
        let delay = self.frame_delay_ms.saturating_sub(since_last);

        let previous = self.pending.borrow_mut().replace(Pending {
            deadline_ms: now + delay,
            notify,
        });
        if previous.is_some() {
            log::warn!("interval clock: tick requested while one is pending; replaced");
        }
    }

    fn is_owning_thread(&self) -> bool {
        thread::current().id() == self.owner
    }
}
