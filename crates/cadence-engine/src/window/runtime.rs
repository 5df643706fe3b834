use anyhow::{Context, Result};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::context::{ContextRegistry, ExecutionContext};
use crate::core::{App as CoreApp, AppControl, AppCtx, WindowCtx};
use crate::time::{ClockSource, SchedulerConfig};

use super::RedrawClock;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Configuration of the window's frame scheduler.
    pub scheduler: SchedulerConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "cadence".to_string(),
            initial_size: LogicalSize::new(640.0, 360.0),
            scheduler: SchedulerConfig::default(),
        }
    }
}

/// Runtime context passed to the application.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    pub fn create_window(&mut self, config: RuntimeConfig) {
        self.commands.push(Command::CreateWindow(config));
    }

    pub fn close_window(&mut self, id: WindowId) {
        self.commands.push(Command::CloseWindow(id));
    }

    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }
}

enum Command {
    CreateWindow(RuntimeConfig),
    CloseWindow(WindowId),
    Exit,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    pub fn run<A>(initial: RuntimeConfig, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(initial, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

struct WindowEntry {
    window: Arc<Window>,
    clock: Rc<RedrawClock>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    initial: RuntimeConfig,
    app: A,

    windows: HashMap<WindowId, WindowEntry>,
    contexts: ContextRegistry<WindowId>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(initial: RuntimeConfig, app: A) -> Self {
        Self {
            initial,
            app,
            windows: HashMap::new(),
            contexts: ContextRegistry::new(),
            exit_requested: false,
        }
    }

    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    fn create_window_entry(
        &mut self,
        event_loop: &ActiveEventLoop,
        config: RuntimeConfig,
    ) -> Result<WindowId> {
        let attrs = Window::default_attributes()
            .with_title(config.title)
            .with_inner_size(config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;
        let window = Arc::new(window);

        let id = window.id();
        let clock = Rc::new(RedrawClock::new(window.clone()));
        let context_clock: Rc<dyn ClockSource> = clock.clone();
        let scheduler = config.scheduler;

        self.contexts.get_or_insert_with(id, move || {
            ExecutionContext::with_clock(context_clock, scheduler)
        });
        self.windows.insert(id, WindowEntry { window, clock });

        log::debug!("window {id:?} created with its own execution context");
        Ok(id)
    }

    fn destroy_window_entry(&mut self, id: WindowId) {
        self.windows.remove(&id);
        self.contexts.remove(&id);
    }

    /// Runs `f` with the app and a context for window `id`, if it still exists.
    fn with_app_ctx<R>(
        &mut self,
        id: WindowId,
        runtime: &mut RuntimeCtx,
        f: impl FnOnce(&mut A, &mut AppCtx<'_>) -> R,
    ) -> Option<R> {
        let entry = self.windows.get(&id)?;
        let scheduler = self.contexts.get(&id)?.current();

        let mut ctx = AppCtx {
            window: WindowCtx {
                id,
                window: &entry.window,
            },
            scheduler,
            runtime,
        };

        Some(f(&mut self.app, &mut ctx))
    }

    fn open_window(
        &mut self,
        event_loop: &ActiveEventLoop,
        config: RuntimeConfig,
        runtime: &mut RuntimeCtx,
    ) {
        match self.create_window_entry(event_loop, config) {
            Ok(id) => {
                self.with_app_ctx(id, runtime, |app, ctx| app.on_window_created(ctx));
            }
            Err(e) => {
                log::error!("failed to create window: {e:#}");
                self.request_exit();
            }
        }
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, mut ctx: RuntimeCtx) {
        // Callbacks of newly created windows may queue further commands.
        while !ctx.commands.is_empty() {
            for cmd in std::mem::take(&mut ctx.commands) {
                match cmd {
                    Command::CreateWindow(cfg) => self.open_window(event_loop, cfg, &mut ctx),
                    Command::CloseWindow(id) => self.destroy_window_entry(id),
                    Command::Exit => self.request_exit(),
                }
            }
        }

        if self.windows.is_empty() {
            self.request_exit();
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.windows.is_empty() {
            return;
        }

        let mut runtime_ctx = RuntimeCtx::default();
        self.open_window(event_loop, self.initial.clone(), &mut runtime_ctx);
        self.apply_commands(event_loop, runtime_ctx);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Frames are pulled by the redraw clocks; with no listener armed the
        // loop sleeps until the next platform event.
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let mut runtime_ctx = RuntimeCtx::default();

        let control = self
            .with_app_ctx(window_id, &mut runtime_ctx, |app, ctx| {
                app.on_window_event(ctx, &event)
            })
            .unwrap_or(AppControl::Continue);

        if control == AppControl::Exit {
            runtime_ctx.exit();
        }

        match &event {
            WindowEvent::CloseRequested => {
                runtime_ctx.close_window(window_id);
            }

            WindowEvent::RedrawRequested => {
                let fired = self
                    .windows
                    .get(&window_id)
                    .map(|entry| entry.clock.clone())
                    .is_some_and(|clock| clock.fire());

                if fired {
                    let control = self
                        .with_app_ctx(window_id, &mut runtime_ctx, |app, ctx| app.on_frame(ctx))
                        .unwrap_or(AppControl::Continue);

                    if control == AppControl::Exit {
                        runtime_ctx.exit();
                    }
                }
            }

            _ => {}
        }

        self.apply_commands(event_loop, runtime_ctx);
    }
}
