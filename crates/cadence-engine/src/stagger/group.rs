use crate::time::{FrameCallbackRef, FrameScheduler};

use super::sort::Timed;

/// Frame callbacks started and cancelled as one unit.
#[derive(Clone, Default)]
pub struct FrameGroup {
    members: Vec<Timed<FrameCallbackRef>>,
}

impl FrameGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// A group whose members all start on the same frame.
    pub fn together<I>(callbacks: I) -> Self
    where
        I: IntoIterator<Item = FrameCallbackRef>,
    {
        Self {
            members: callbacks
                .into_iter()
                .map(|item| Timed { item, delay_ms: 0 })
                .collect(),
        }
    }

    /// A group with per-member delays, usually the output of a [`Stagger`](super::Stagger).
    pub fn staggered(members: Vec<Timed<FrameCallbackRef>>) -> Self {
        Self { members }
    }

    pub fn push(&mut self, callback: FrameCallbackRef, delay_ms: u64) {
        self.members.push(Timed {
            item: callback,
            delay_ms,
        });
    }

    /// Registers every member with its delay, measured from now.
    pub fn start(&self, scheduler: &FrameScheduler) {
        for member in &self.members {
            scheduler.register(&member.item, member.delay_ms);
        }
        log::debug!("frame group started ({} members)", self.members.len());
    }

    /// Removes every member, running or still waiting out its delay.
    pub fn cancel(&self, scheduler: &FrameScheduler) {
        for member in &self.members {
            scheduler.remove(&member.item);
        }
        log::debug!("frame group cancelled ({} members)", self.members.len());
    }

    /// Number of members currently registered with `scheduler`.
    pub fn running(&self, scheduler: &FrameScheduler) -> usize {
        self.members
            .iter()
            .filter(|m| scheduler.is_registered(&m.item))
            .count()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
