use std::cell::RefCell;
use std::rc::Rc;

/// Directive returned by a listener after handling a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameControl {
    Continue,
    Finished,
}

/// Listener advanced once per scheduler pass.
pub trait FrameCallback {
    /// Advances to `frame_time_ms`, the timestamp captured at the start of the pass.
    fn on_frame(&mut self, frame_time_ms: u64) -> FrameControl;
}

/// Shared listener handle as stored by the scheduler.
pub type FrameCallbackRef = Rc<RefCell<dyn FrameCallback>>;

/// Identity of a listener: the address of its shared allocation.
///
/// Stable for as long as any handle to the listener is alive, which the
/// registry guarantees while the listener is registered.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct CallbackKey(usize);

impl CallbackKey {
    #[inline]
    pub fn of(callback: &FrameCallbackRef) -> Self {
        Self(Rc::as_ptr(callback) as *const () as usize)
    }
}
