use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::callback::{CallbackKey, FrameCallbackRef, FrameControl};
use super::clock::ClockSource;
use super::registry::CallbackRegistry;

/// What the scheduler does with a listener that returns [`FrameControl::Finished`].
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum FinishPolicy {
    /// The return value never alters dispatch; listeners remove themselves.
    #[default]
    Ignore,
    /// A `Finished` listener is removed right after its frame.
    AutoRemove,
}

/// Scheduler configuration.
#[derive(Debug, Copy, Clone, Default)]
pub struct SchedulerConfig {
    pub finish_policy: FinishPolicy,
}

/// Dispatch state relative to the clock source.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SchedulerState {
    /// No tick request outstanding.
    Idle,
    /// Exactly one tick request outstanding.
    Armed,
    /// Inside a tick fan-out.
    Dispatching,
}

struct Inner {
    clock: Rc<dyn ClockSource>,
    config: SchedulerConfig,
    state: RefCell<State>,
}

struct State {
    registry: CallbackRegistry,
    phase: SchedulerState,
    frame_time_ms: u64,
    frame_index: u64,
}

/// Fans clock ticks out to registered frame callbacks.
///
/// One scheduler serves one execution context. It is `!Send`: every
/// registration and every pass happens on the thread that owns it, so no
/// locking is involved. Use [`is_caller_on_owning_thread`] to assert that
/// discipline from outside.
///
/// The handle is cheap to clone; clones share the same registry.
///
/// Listeners may register or remove any listener, themselves included, from
/// inside their own `on_frame`. A listener added during a pass is first
/// visited on the next pass. A listener removed during a pass is skipped if its
/// turn has not come yet.
///
/// The clock source is armed while at least one listener is live and left
/// alone otherwise.
///
/// [`is_caller_on_owning_thread`]: Self::is_caller_on_owning_thread
#[derive(Clone)]
pub struct FrameScheduler {
    inner: Rc<Inner>,
}

impl FrameScheduler {
    pub fn new(clock: Rc<dyn ClockSource>) -> Self {
        Self::with_config(clock, SchedulerConfig::default())
    }

    pub fn with_config(clock: Rc<dyn ClockSource>, config: SchedulerConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                clock,
                config,
                state: RefCell::new(State {
                    registry: CallbackRegistry::new(),
                    phase: SchedulerState::Idle,
                    frame_time_ms: 0,
                    frame_index: 0,
                }),
            }),
        }
    }

    /// Registers `callback` to receive frames once `delay_ms` has elapsed.
    ///
    /// Registering a listener that is already live only updates its delay
    /// (when `delay_ms > 0`). Arms the clock source if the scheduler was idle.
    pub fn register(&self, callback: &FrameCallbackRef, delay_ms: u64) {
        let now = self.inner.clock.uptime_ms();
        let arm = {
            let mut st = self.inner.state.borrow_mut();
            if st.registry.add(callback, delay_ms, now) {
                log::trace!(
                    "frame callback registered (delay {delay_ms} ms, {} live)",
                    st.registry.live_count()
                );
            }

            if st.phase == SchedulerState::Idle {
                st.phase = SchedulerState::Armed;
                true
            } else {
                false
            }
        };

        if arm {
            log::debug!("frame scheduler armed");
            self.inner.request_tick();
        }
    }

    /// Stops delivering frames to `callback`. Removing an absent listener is a no-op.
    pub fn remove(&self, callback: &FrameCallbackRef) {
        let mut st = self.inner.state.borrow_mut();
        if st.registry.remove(callback) {
            log::trace!(
                "frame callback removed ({} live)",
                st.registry.live_count()
            );
        }
    }

    /// Timestamp captured at the start of the most recent pass.
    pub fn current_tick_time(&self) -> u64 {
        self.inner.state.borrow().frame_time_ms
    }

    /// Number of passes started so far.
    pub fn frame_index(&self) -> u64 {
        self.inner.state.borrow().frame_index
    }

    pub fn is_caller_on_owning_thread(&self) -> bool {
        self.inner.clock.is_owning_thread()
    }

    pub fn state(&self) -> SchedulerState {
        self.inner.state.borrow().phase
    }

    pub fn live_count(&self) -> usize {
        self.inner.state.borrow().registry.live_count()
    }

    pub fn is_registered(&self, callback: &FrameCallbackRef) -> bool {
        self.inner.state.borrow().registry.contains(callback)
    }

    /// Whether both handles refer to the same scheduler.
    pub fn ptr_eq(&self, other: &FrameScheduler) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Inner {
    fn request_tick(self: &Rc<Self>) {
        let weak: Weak<Inner> = Rc::downgrade(self);
        self.clock.request_tick(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.dispatch();
            }
        }));
    }

    /// One fan-out pass. Runs when the clock source fires a requested tick.
    fn dispatch(self: &Rc<Self>) {
        let now = self.clock.uptime_ms();
        let bound = {
            let mut st = self.state.borrow_mut();
            if st.phase == SchedulerState::Dispatching {
                log::warn!("frame tick delivered during a pass; ignored");
                return;
            }
            st.phase = SchedulerState::Dispatching;
            st.frame_time_ms = now;
            st.frame_index = st.frame_index.wrapping_add(1);
            st.registry.slot_count()
        };

        let mut visited = 0usize;
        for index in 0..bound {
            // The registry borrow ends before the listener runs so it may
            // register or remove listeners.
            let due = {
                let mut st = self.state.borrow_mut();
                let slot = st.registry.get(index).cloned();
                slot.filter(|cb| st.registry.is_due(CallbackKey::of(cb), now))
            };
            let Some(callback) = due else {
                continue;
            };

            visited += 1;
            let control = callback.borrow_mut().on_frame(now);
            if control == FrameControl::Finished
                && self.config.finish_policy == FinishPolicy::AutoRemove
            {
                self.state.borrow_mut().registry.remove(&callback);
            }
        }

        let rearm = {
            let mut st = self.state.borrow_mut();
            let compacted = st.registry.compact_if_dirty();
            let live = st.registry.live_count();
            log::trace!(
                "frame {} at {now} ms: {visited} invoked, {compacted} compacted, {live} live",
                st.frame_index
            );

            if live > 0 {
                st.phase = SchedulerState::Armed;
                true
            } else {
                st.phase = SchedulerState::Idle;
                false
            }
        };

        if rearm {
            self.request_tick();
        } else {
            log::debug!("frame scheduler idle");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::time::sources::ManualClock;
    use crate::time::FrameCallback;

    type Log = Rc<RefCell<Vec<(&'static str, u64)>>>;

    /// Records every frame it receives, then runs an optional hook.
    struct Recorder {
        name: &'static str,
        log: Log,
        hook: Option<Box<dyn FnMut(u64)>>,
        control: FrameControl,
    }

    impl FrameCallback for Recorder {
        fn on_frame(&mut self, frame_time_ms: u64) -> FrameControl {
            self.log.borrow_mut().push((self.name, frame_time_ms));
            if let Some(hook) = self.hook.as_mut() {
                hook(frame_time_ms);
            }
            self.control
        }
    }

    fn recorder(name: &'static str, log: &Log) -> FrameCallbackRef {
        Rc::new(RefCell::new(Recorder {
            name,
            log: log.clone(),
            hook: None,
            control: FrameControl::Continue,
        }))
    }

    fn recorder_with(
        name: &'static str,
        log: &Log,
        hook: impl FnMut(u64) + 'static,
    ) -> FrameCallbackRef {
        Rc::new(RefCell::new(Recorder {
            name,
            log: log.clone(),
            hook: Some(Box::new(hook)),
            control: FrameControl::Continue,
        }))
    }

    fn setup(now: u64) -> (Rc<ManualClock>, FrameScheduler, Log) {
        let clock = Rc::new(ManualClock::new(now));
        let scheduler = FrameScheduler::new(clock.clone());
        (clock, scheduler, Rc::new(RefCell::new(Vec::new())))
    }

    fn take(log: &Log) -> Vec<(&'static str, u64)> {
        std::mem::take(&mut *log.borrow_mut())
    }

    // ── arming ────────────────────────────────────────────────────────────

    #[test]
    fn new_scheduler_is_idle_and_never_requests() {
        let (clock, scheduler, _) = setup(0);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(clock.requests(), 0);
        assert!(!clock.fire());
    }

    #[test]
    fn first_register_arms_once() {
        let (clock, scheduler, log) = setup(0);
        let a = recorder("a", &log);
        let b = recorder("b", &log);

        scheduler.register(&a, 0);
        scheduler.register(&b, 0);
        scheduler.register(&a, 0);

        assert_eq!(scheduler.state(), SchedulerState::Armed);
        assert_eq!(clock.requests(), 1);
        assert!(clock.is_armed());
    }

    #[test]
    fn pass_rearms_while_listeners_remain() {
        let (clock, scheduler, log) = setup(0);
        let a = recorder("a", &log);
        scheduler.register(&a, 0);

        assert!(clock.advance_and_fire(16));
        assert!(clock.advance_and_fire(16));
        assert_eq!(clock.requests(), 3);
        assert_eq!(scheduler.state(), SchedulerState::Armed);
        assert_eq!(take(&log), vec![("a", 16), ("a", 32)]);
        assert_eq!(scheduler.frame_index(), 2);
    }

    #[test]
    fn frame_index_counts_the_running_pass() {
        let (clock, scheduler, log) = setup(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let a = {
            let scheduler = scheduler.clone();
            let seen = seen.clone();
            recorder_with("a", &log, move |_| {
                seen.borrow_mut().push(scheduler.frame_index());
            })
        };

        scheduler.register(&a, 0);
        assert_eq!(scheduler.frame_index(), 0);

        clock.advance_and_fire(16);
        clock.advance_and_fire(16);
        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(scheduler.frame_index(), 2);
    }

    // ── no duplicates ─────────────────────────────────────────────────────

    #[test]
    fn duplicate_register_keeps_single_entry() {
        let (clock, scheduler, log) = setup(0);
        let a = recorder("a", &log);
        for delay in [0, 5, 0, 20] {
            scheduler.register(&a, delay);
        }
        assert_eq!(scheduler.live_count(), 1);

        clock.advance_and_fire(100);
        assert_eq!(take(&log), vec![("a", 100)]);
        assert_eq!(scheduler.live_count(), 1);
    }

    // ── delay gating ──────────────────────────────────────────────────────

    #[test]
    fn delayed_listener_waits_for_start_time() {
        let (clock, scheduler, log) = setup(500);
        let a = recorder("a", &log);
        scheduler.register(&a, 40);

        clock.advance_and_fire(10);
        clock.advance_and_fire(29);
        assert!(take(&log).is_empty());
        // Still armed even though nothing was due.
        assert_eq!(scheduler.state(), SchedulerState::Armed);

        clock.advance_and_fire(1);
        assert_eq!(take(&log), vec![("a", 540)]);

        clock.advance_and_fire(1);
        assert_eq!(take(&log), vec![("a", 541)]);
    }

    #[test]
    fn scenario_two_listeners_with_delay() {
        let (clock, scheduler, log) = setup(1000);
        let a = recorder("a", &log);
        let b = recorder("b", &log);

        scheduler.register(&a, 0);
        clock.set_now(1005);
        assert!(clock.fire());
        assert_eq!(take(&log), vec![("a", 1005)]);
        assert_eq!(scheduler.current_tick_time(), 1005);

        scheduler.register(&b, 50);
        clock.set_now(1010);
        assert!(clock.fire());
        assert_eq!(take(&log), vec![("a", 1010)]);

        clock.set_now(1060);
        assert!(clock.fire());
        assert_eq!(take(&log), vec![("a", 1060), ("b", 1060)]);
    }

    // ── self-disarming ────────────────────────────────────────────────────

    #[test]
    fn removing_last_listener_idles_after_next_pass() {
        let (clock, scheduler, log) = setup(0);
        let a = recorder("a", &log);
        scheduler.register(&a, 0);
        scheduler.remove(&a);

        // The request issued while armed still fires, finds nobody and idles.
        assert!(clock.advance_and_fire(16));
        assert!(take(&log).is_empty());
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(clock.requests(), 1);
        assert!(!clock.is_armed());
    }

    #[test]
    fn self_removal_empties_and_disarms() {
        let (clock, scheduler, log) = setup(0);
        let slot: Rc<RefCell<Option<FrameCallbackRef>>> = Rc::new(RefCell::new(None));
        let a = {
            let scheduler = scheduler.clone();
            let slot = slot.clone();
            recorder_with("a", &log, move |_| {
                if let Some(me) = slot.borrow_mut().take() {
                    scheduler.remove(&me);
                }
            })
        };
        *slot.borrow_mut() = Some(a.clone());

        scheduler.register(&a, 0);
        clock.advance_and_fire(16);

        assert_eq!(take(&log), vec![("a", 16)]);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.live_count(), 0);
        assert_eq!(clock.requests(), 1);
        assert!(!clock.fire());
    }

    #[test]
    fn register_after_idle_rearms() {
        let (clock, scheduler, log) = setup(0);
        let a = recorder("a", &log);
        scheduler.register(&a, 0);
        scheduler.remove(&a);
        clock.advance_and_fire(1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        scheduler.register(&a, 0);
        assert_eq!(scheduler.state(), SchedulerState::Armed);
        assert_eq!(clock.requests(), 2);
        clock.advance_and_fire(1);
        assert_eq!(take(&log), vec![("a", 2)]);
    }

    // ── reentrancy ────────────────────────────────────────────────────────

    #[test]
    fn removing_later_listener_mid_pass_skips_it() {
        let (clock, scheduler, log) = setup(0);
        let b = recorder("b", &log);
        let a = {
            let scheduler = scheduler.clone();
            let b = b.clone();
            recorder_with("a", &log, move |_| scheduler.remove(&b))
        };

        scheduler.register(&a, 0);
        scheduler.register(&b, 0);
        clock.advance_and_fire(1);
        clock.advance_and_fire(1);

        assert_eq!(take(&log), vec![("a", 1), ("a", 2)]);
        assert!(!scheduler.is_registered(&b));
    }

    #[test]
    fn removing_earlier_listener_mid_pass_is_not_retroactive() {
        let (clock, scheduler, log) = setup(0);
        let a = recorder("a", &log);
        let b = {
            let scheduler = scheduler.clone();
            let a = a.clone();
            recorder_with("b", &log, move |_| scheduler.remove(&a))
        };

        scheduler.register(&a, 0);
        scheduler.register(&b, 0);
        clock.advance_and_fire(1);
        assert_eq!(take(&log), vec![("a", 1), ("b", 1)]);

        clock.advance_and_fire(1);
        assert_eq!(take(&log), vec![("b", 2)]);
    }

    #[test]
    fn listener_added_mid_pass_waits_for_next_pass() {
        let (clock, scheduler, log) = setup(0);
        let late = recorder("late", &log);
        let a = {
            let scheduler = scheduler.clone();
            let late = late.clone();
            recorder_with("a", &log, move |_| scheduler.register(&late, 0))
        };

        scheduler.register(&a, 0);
        clock.advance_and_fire(1);
        assert_eq!(take(&log), vec![("a", 1)]);
        assert_eq!(clock.requests(), 2);

        clock.advance_and_fire(1);
        assert_eq!(take(&log), vec![("a", 2), ("late", 2)]);
    }

    #[test]
    fn remove_then_readd_mid_pass_moves_to_end() {
        let (clock, scheduler, log) = setup(0);
        let b = recorder("b", &log);
        let c = recorder("c", &log);
        let a = {
            let scheduler = scheduler.clone();
            let b = b.clone();
            recorder_with("a", &log, move |t| {
                if t == 1 {
                    scheduler.remove(&b);
                    scheduler.register(&b, 0);
                }
            })
        };

        scheduler.register(&a, 0);
        scheduler.register(&b, 0);
        scheduler.register(&c, 0);
        clock.advance_and_fire(1);
        assert_eq!(take(&log), vec![("a", 1), ("c", 1)]);

        clock.advance_and_fire(1);
        assert_eq!(take(&log), vec![("a", 2), ("c", 2), ("b", 2)]);
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn order_survives_compaction() {
        let (clock, scheduler, log) = setup(0);
        let a = recorder("a", &log);
        let b = recorder("b", &log);
        let c = recorder("c", &log);
        scheduler.register(&a, 0);
        scheduler.register(&b, 0);
        scheduler.register(&c, 0);

        scheduler.remove(&b);
        clock.advance_and_fire(1);
        clock.advance_and_fire(1);

        assert_eq!(take(&log), vec![("a", 1), ("c", 1), ("a", 2), ("c", 2)]);
    }

    // ── finish policy ─────────────────────────────────────────────────────

    fn finishing(name: &'static str, log: &Log) -> FrameCallbackRef {
        Rc::new(RefCell::new(Recorder {
            name,
            log: log.clone(),
            hook: None,
            control: FrameControl::Finished,
        }))
    }

    #[test]
    fn finished_is_ignored_by_default() {
        let (clock, scheduler, log) = setup(0);
        let a = finishing("a", &log);
        scheduler.register(&a, 0);

        clock.advance_and_fire(1);
        clock.advance_and_fire(1);
        assert_eq!(take(&log), vec![("a", 1), ("a", 2)]);
        assert!(scheduler.is_registered(&a));
    }

    #[test]
    fn finished_auto_removes_when_configured() {
        let clock = Rc::new(ManualClock::new(0));
        let scheduler = FrameScheduler::with_config(
            clock.clone(),
            SchedulerConfig {
                finish_policy: FinishPolicy::AutoRemove,
            },
        );
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let a = finishing("a", &log);
        let b = recorder("b", &log);
        scheduler.register(&a, 0);
        scheduler.register(&b, 0);

        clock.advance_and_fire(1);
        clock.advance_and_fire(1);
        assert_eq!(take(&log), vec![("a", 1), ("b", 1), ("b", 2)]);
        assert!(!scheduler.is_registered(&a));
    }

    // ── misc ──────────────────────────────────────────────────────────────

    #[test]
    fn dropped_scheduler_ignores_pending_tick() {
        let (clock, scheduler, log) = setup(0);
        let a = recorder("a", &log);
        scheduler.register(&a, 0);
        drop(scheduler);

        assert!(clock.fire());
        assert!(take(&log).is_empty());
    }

    #[test]
    fn owning_thread_is_delegated_to_clock() {
        let (_clock, scheduler, _) = setup(0);
        assert!(scheduler.is_caller_on_owning_thread());
    }
}
