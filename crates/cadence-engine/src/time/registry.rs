use std::collections::HashMap;

use super::callback::{CallbackKey, FrameCallbackRef};

/// Ordered listener storage that tolerates removal during iteration.
///
/// Removal tombstones a slot instead of splicing it out, so slot indices stay
/// stable while a pass walks them. Tombstones are dropped by
/// [`compact_if_dirty`](Self::compact_if_dirty), which callers must only run
/// between passes.
///
/// A side table holds absolute "not due before" times for listeners
/// registered with a delay.
#[derive(Default)]
pub struct CallbackRegistry {
    slots: Vec<Option<FrameCallbackRef>>,
    start_times: HashMap<CallbackKey, u64>,
    live: usize,
    dirty: bool,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `callback` unless it already holds a live slot.
    ///
    /// A positive `delay_ms` records `now_ms + delay_ms` as the start time,
    /// replacing any earlier one. A zero delay leaves the table untouched.
    ///
    /// Returns `true` when a new slot was appended.
    pub fn add(&mut self, callback: &FrameCallbackRef, delay_ms: u64, now_ms: u64) -> bool {
        let key = CallbackKey::of(callback);
        let appended = if self.position(key).is_some() {
            false
        } else {
            self.slots.push(Some(callback.clone()));
            self.live += 1;
            true
        };

        if delay_ms > 0 {
            self.start_times.insert(key, now_ms.saturating_add(delay_ms));
        }

        appended
    }

    /// Tombstones the slot of `callback` and forgets its start time.
    ///
    /// Returns `false` if it was not registered; that is not an error.
    pub fn remove(&mut self, callback: &FrameCallbackRef) -> bool {
        let key = CallbackKey::of(callback);
        self.start_times.remove(&key);

        let Some(index) = self.position(key) else {
            return false;
        };

        self.slots[index] = None;
        self.live -= 1;
        self.dirty = true;
        true
    }

    /// Whether `key` may receive a frame at `now_ms`.
    ///
    /// A listener without a start time is always due. An expired start time is
    /// deleted here, so it is consulted at most once after it passes.
    pub fn is_due(&mut self, key: CallbackKey, now_ms: u64) -> bool {
        match self.start_times.get(&key) {
            None => true,
            Some(&start) if start <= now_ms => {
                self.start_times.remove(&key);
                true
            }
            Some(_) => false,
        }
    }

    /// Drops tombstoned slots, keeping survivors in registration order.
    ///
    /// Returns the number of slots removed.
    pub fn compact_if_dirty(&mut self) -> usize {
        if !self.dirty {
            return 0;
        }

        let before = self.slots.len();
        self.slots.retain(Option::is_some);
        self.dirty = false;
        before - self.slots.len()
    }

    /// Live listener at `index`, or `None` for a tombstone or out-of-range index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&FrameCallbackRef> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    #[inline]
    pub fn contains(&self, callback: &FrameCallbackRef) -> bool {
        self.position(CallbackKey::of(callback)).is_some()
    }

    /// Number of non-tombstoned slots.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Number of slots including tombstones; the iteration bound of a pass.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Start time recorded for `callback`, if it is still waiting.
    pub fn start_time(&self, callback: &FrameCallbackRef) -> Option<u64> {
        self.start_times.get(&CallbackKey::of(callback)).copied()
    }

    fn position(&self, key: CallbackKey) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|cb| CallbackKey::of(cb) == key))
    }
}
