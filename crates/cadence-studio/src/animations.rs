use std::rc::Rc;

use cadence_engine::time::{FrameCallback, FrameControl};

/// Receives each distinct progress line.
pub type Sink = Rc<dyn Fn(&str)>;

const BAR_WIDTH: usize = 20;

/// Progress bar that fills over `duration_ms` starting at its first frame.
pub struct Progress {
    label: &'static str,
    duration_ms: u64,
    started_at: Option<u64>,
    last: String,
    sink: Sink,
}

impl Progress {
    pub fn new(label: &'static str, duration_ms: u64, sink: Sink) -> Self {
        Self {
            label,
            duration_ms: duration_ms.max(1),
            started_at: None,
            last: String::new(),
            sink,
        }
    }

    /// Starts over from an empty bar on the next frame.
    pub fn restart(&mut self) {
        self.started_at = None;
    }

    fn render(&self, fraction: f32) -> String {
        let filled = ((fraction * BAR_WIDTH as f32).round() as usize).min(BAR_WIDTH);
        format!(
            "{} [{}{}] {:>3}%",
            self.label,
            "#".repeat(filled),
            "-".repeat(BAR_WIDTH - filled),
            (fraction * 100.0).round() as u32
        )
    }
}

impl FrameCallback for Progress {
    fn on_frame(&mut self, frame_time_ms: u64) -> FrameControl {
        let start = *self.started_at.get_or_insert(frame_time_ms);
        let elapsed = frame_time_ms.saturating_sub(start);
        let fraction = (elapsed as f32 / self.duration_ms as f32).min(1.0);

        let line = self.render(fraction);
        if line != self.last {
            (self.sink)(&line);
            self.last = line;
        }

        if fraction >= 1.0 {
            FrameControl::Finished
        } else {
            FrameControl::Continue
        }
    }
}

/// Logs a beat every `period_ms`, `beats` times.
pub struct Pulse {
    lane: usize,
    period_ms: u64,
    remaining: u32,
    next_at: Option<u64>,
}

impl Pulse {
    pub fn new(lane: usize, period_ms: u64, beats: u32) -> Self {
        Self {
            lane,
            period_ms,
            remaining: beats,
            next_at: None,
        }
    }
}

impl FrameCallback for Pulse {
    fn on_frame(&mut self, frame_time_ms: u64) -> FrameControl {
        let next = *self.next_at.get_or_insert(frame_time_ms);
        if self.remaining > 0 && frame_time_ms >= next {
            self.remaining -= 1;
            self.next_at = Some(frame_time_ms + self.period_ms);
            log::info!(
                "pulse {} at {frame_time_ms} ms ({} left)",
                self.lane,
                self.remaining
            );
        }

        if self.remaining == 0 {
            FrameControl::Finished
        } else {
            FrameControl::Continue
        }
    }
}
