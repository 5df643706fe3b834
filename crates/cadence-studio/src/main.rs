mod animations;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use cadence_engine::context::ExecutionContext;
use cadence_engine::core::{App, AppControl, AppCtx};
use cadence_engine::logging::{init_logging, LoggingConfig};
use cadence_engine::stagger::{
    Bounds, Direction, FrameGroup, LinearStagger, Stagger, Target, Vec2,
};
use cadence_engine::time::sources::{IntervalClock, IntervalConfig};
use cadence_engine::time::{FinishPolicy, FrameCallbackRef, SchedulerConfig};
use cadence_engine::window::{Runtime, RuntimeConfig};

use animations::{Progress, Pulse, Sink};

const PROGRESS_MS: u64 = 3000;
const PULSE_STAGGER_MS: u64 = 500;
const PULSE_PERIOD_MS: u64 = 1000;
const PULSE_BEATS: u32 = 4;
const PULSE_LANES: usize = 3;
const LANE_WIDTH: f32 = 40.0;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    // Finished animations drop out of the scheduler on their own.
    let scheduler = SchedulerConfig {
        finish_policy: FinishPolicy::AutoRemove,
    };

    if std::env::args().skip(1).any(|arg| arg == "--headless") {
        return run_headless(scheduler);
    }

    Runtime::run(
        RuntimeConfig {
            title: "cadence studio".to_string(),
            scheduler,
            ..RuntimeConfig::default()
        },
        Studio::default(),
    )
}

/// Runs the same animations on a fixed-interval clock without a window.
fn run_headless(config: SchedulerConfig) -> Result<()> {
    let clock = Rc::new(IntervalClock::new(IntervalConfig {
        frame_delay: Duration::from_millis(16),
    }));
    let context = ExecutionContext::with_clock(clock.clone(), config);
    let scheduler = context.current();

    let sink: Sink = Rc::new(|line: &str| log::info!("{line}"));
    let progress: FrameCallbackRef =
        Rc::new(RefCell::new(Progress::new("headless", PROGRESS_MS, sink)));

    scheduler.register(&progress, 0);
    pulse_row().start(&scheduler);

    let ticks = clock.run();
    anyhow::ensure!(
        scheduler.live_count() == 0,
        "{} frame callbacks still registered after the clock drained",
        scheduler.live_count()
    );

    log::info!("headless run finished: {ticks} ticks, {} passes", scheduler.frame_index());
    Ok(())
}

/// A row of pulses that start one lane after another, left to right.
fn pulse_row() -> FrameGroup {
    let targets: Vec<Target<FrameCallbackRef>> = (0..PULSE_LANES)
        .map(|lane| {
            let pulse: FrameCallbackRef =
                Rc::new(RefCell::new(Pulse::new(lane, PULSE_PERIOD_MS, PULSE_BEATS)));
            Target::new(pulse, Vec2::new(lane as f32 * LANE_WIDTH, 0.0))
        })
        .collect();

    let stagger = LinearStagger {
        interval_ms: PULSE_STAGGER_MS,
        reversed: false,
        direction: Direction::LeftToRight,
    };
    let bounds = Bounds::new(PULSE_LANES as f32 * LANE_WIDTH, LANE_WIDTH);
    FrameGroup::staggered(stagger.schedule(targets, bounds))
}

#[derive(Default)]
struct Studio {
    progress: Option<Rc<RefCell<Progress>>>,
}

impl App for Studio {
    fn on_window_created(&mut self, ctx: &mut AppCtx<'_>) {
        let window = ctx.window.window.clone();
        let sink: Sink = Rc::new(move |line: &str| window.set_title(line));
        let progress = Rc::new(RefCell::new(Progress::new("cadence", PROGRESS_MS, sink)));

        let handle: FrameCallbackRef = progress.clone();
        ctx.scheduler.register(&handle, 0);
        pulse_row().start(&ctx.scheduler);

        self.progress = Some(progress);
        log::info!("space restarts the progress bar, escape quits");
    }

    fn on_window_event(&mut self, ctx: &mut AppCtx<'_>, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return AppControl::Continue;
        };
        if event.state != ElementState::Pressed || event.repeat {
            return AppControl::Continue;
        }

        match event.physical_key {
            PhysicalKey::Code(KeyCode::Escape) => AppControl::Exit,
            PhysicalKey::Code(KeyCode::Space) => {
                if let Some(progress) = &self.progress {
                    progress.borrow_mut().restart();
                    let handle: FrameCallbackRef = progress.clone();
                    ctx.scheduler.register(&handle, 0);
                }
                AppControl::Continue
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut AppCtx<'_>) -> AppControl {
        log::trace!(
            "window {:?} frame at {} ms",
            ctx.window.id,
            ctx.frame_time_ms()
        );
        AppControl::Continue
    }
}
