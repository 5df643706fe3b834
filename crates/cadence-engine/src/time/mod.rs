//! Time subsystem.
//!
//! Owns the per-context frame callback machinery:
//! - `ClockSource`: one future tick per request, plus a thread-identity check
//! - `CallbackRegistry`: ordered, tombstone-tolerant listener storage with delays
//! - `FrameScheduler`: fans each tick out to the registered listeners
//!
//! Timestamps are milliseconds of process uptime (see [`uptime_ms`]).

mod callback;
mod clock;
mod registry;
mod scheduler;

pub mod sources;

pub use callback::{CallbackKey, FrameCallback, FrameCallbackRef, FrameControl};
pub use clock::{uptime_ms, ClockSource, TickNotify};
pub use registry::CallbackRegistry;
pub use scheduler::{FinishPolicy, FrameScheduler, SchedulerConfig, SchedulerState};
