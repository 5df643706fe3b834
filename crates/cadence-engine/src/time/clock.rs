use std::sync::OnceLock;
use std::time::Instant;

/// One-shot notification handed to a clock source.
///
/// The source runs it exactly once, on its owning thread, when the requested
/// tick arrives.
pub type TickNotify = Box<dyn FnOnce()>;

/// Provider of tick-request/notify pairs.
///
/// Implementations decide when a requested tick fires: aligned to display
/// refresh, on a fixed interval, or manually from a test. A source must not run
/// `notify` from inside `request_tick` unless it is documented as synchronous;
/// a synchronous source that fires re-armed requests recurses without bound.
pub trait ClockSource {
    /// Schedules exactly one future invocation of `notify`.
    fn request_tick(&self, notify: TickNotify);

    /// Returns `true` when the caller runs on the thread this source is bound to.
    ///
    /// Advisory only. The scheduler never checks it.
    fn is_owning_thread(&self) -> bool;

    /// Monotonic "now" in milliseconds.
    fn uptime_ms(&self) -> u64 {
        uptime_ms()
    }
}

static ORIGIN: OnceLock<Instant> = OnceLock::new();

/// Milliseconds elapsed since the first call in this process.
pub fn uptime_ms() -> u64 {
    let origin = *ORIGIN.get_or_init(Instant::now);
    origin.elapsed().as_millis() as u64
}
