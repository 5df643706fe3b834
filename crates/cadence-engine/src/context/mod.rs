//! Execution contexts.
//!
//! An execution context is the unit that owns exactly one [`FrameScheduler`]:
//! a thread, a window, a worker. The owner of that lifecycle holds the
//! [`ExecutionContext`] and passes it to whatever needs frame callbacks; there
//! is no hidden per-thread global.
//!
//! Contexts are `!Send`. Each thread builds its own, so contexts on different
//! threads never contend.

use std::cell::LazyCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use crate::time::{ClockSource, FrameScheduler, SchedulerConfig};

type SchedulerInit = Box<dyn FnOnce() -> FrameScheduler>;

/// Owner of one lazily created [`FrameScheduler`].
pub struct ExecutionContext {
    scheduler: LazyCell<FrameScheduler, SchedulerInit>,
}

impl ExecutionContext {
    /// Creates a context whose scheduler will be driven by the clock `factory` returns.
    ///
    /// Neither the clock nor the scheduler exists until the first [`current`](Self::current).
    pub fn new<F>(factory: F) -> Self
    where
        F: FnOnce() -> Rc<dyn ClockSource> + 'static,
    {
        Self::with_config(factory, SchedulerConfig::default())
    }

    /// Like [`new`](Self::new), with an explicit scheduler configuration.
    pub fn with_config<F>(factory: F, config: SchedulerConfig) -> Self
    where
        F: FnOnce() -> Rc<dyn ClockSource> + 'static,
    {
        let init: SchedulerInit = Box::new(move || {
            log::debug!("frame scheduler created for execution context");
            FrameScheduler::with_config(factory(), config)
        });
        Self {
            scheduler: LazyCell::new(init),
        }
    }

    /// Creates a context around an existing clock source.
    pub fn with_clock(clock: Rc<dyn ClockSource>, config: SchedulerConfig) -> Self {
        Self::with_config(move || clock, config)
    }

    /// The scheduler of this context, created on first call.
    ///
    /// Every call returns a handle to the same scheduler.
    pub fn current(&self) -> FrameScheduler {
        LazyCell::force(&self.scheduler).clone()
    }
}

/// Lazily created contexts keyed by surface, for owners of several on one thread.
pub struct ContextRegistry<K> {
    contexts: HashMap<K, ExecutionContext>,
}

impl<K> Default for ContextRegistry<K> {
    fn default() -> Self {
        Self {
            contexts: HashMap::new(),
        }
    }
}

impl<K> ContextRegistry<K>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for `key`, built from `make` the first time `key` is seen.
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> &ExecutionContext
    where
        F: FnOnce() -> ExecutionContext,
    {
        self.contexts.entry(key).or_insert_with(make)
    }

    pub fn get(&self, key: &K) -> Option<&ExecutionContext> {
        self.contexts.get(key)
    }

    /// Ends the context for `key`. Its scheduler lives on while handles to it remain.
    pub fn remove(&mut self, key: &K) -> Option<ExecutionContext> {
        self.contexts.remove(key)
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
