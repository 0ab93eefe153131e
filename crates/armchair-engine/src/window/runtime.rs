use std::sync::Arc;
use std::task::Poll;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::config::EngineConfig;
use crate::coords::Viewport;
use crate::core::{App, AppControl, FrameCtx};
use crate::device::{Gpu, NegotiationPhase, Negotiator, WgpuBackend};
use crate::input::DragTracker;
use crate::render::{FrameOutcome, Renderer};
use crate::time::FrameClock;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "armchair".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Runs the event loop until the window closes or a fatal error occurs.
    ///
    /// Fatal errors (failed negotiation, lost device, out-of-memory surface) are
    /// returned after the loop exits.
    pub fn run<A>(config: RuntimeConfig, engine: EngineConfig, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, engine, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

enum GpuState {
    Idle,
    Negotiating {
        window: Arc<Window>,
        negotiator: Negotiator<WgpuBackend>,
    },
    Ready {
        window: Arc<Window>,
        renderer: Box<Renderer>,
    },
}

impl GpuState {
    fn window(&self) -> Option<&Arc<Window>> {
        match self {
            GpuState::Idle => None,
            GpuState::Negotiating { window, .. } | GpuState::Ready { window, .. } => Some(window),
        }
    }

    fn phase(&self) -> NegotiationPhase {
        match self {
            GpuState::Idle => NegotiationPhase::Uninitialized,
            GpuState::Negotiating { negotiator, .. } => negotiator.phase(),
            GpuState::Ready { .. } => NegotiationPhase::DeviceReady,
        }
    }
}

struct AppState<A: App + 'static> {
    config: RuntimeConfig,
    engine: EngineConfig,
    app: A,

    gpu: GpuState,
    drag: DragTracker,
    clock: FrameClock,
    last_outcome: Option<FrameOutcome>,

    fatal: Option<anyhow::Error>,
}

impl<A: App + 'static> AppState<A> {
    fn new(config: RuntimeConfig, engine: EngineConfig, app: A) -> Self {
        let drag = DragTracker::new(engine.scene.drag_sensitivity);
        Self {
            config,
            engine,
            app,
            gpu: GpuState::Idle,
            drag,
            clock: FrameClock::new(),
            last_outcome: None,
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        if self.fatal.is_none() {
            self.fatal = Some(err);
        }
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let viewport = Viewport::of_window(&window);
        log::info!(
            "viewport {}x{} logical at scale {} ({}x{} px)",
            viewport.logical.width,
            viewport.logical.height,
            viewport.scale_factor,
            viewport.pixel_size().width,
            viewport.pixel_size().height
        );

        let backend = WgpuBackend::for_window(window.clone())?;
        let negotiator = Negotiator::new(backend, self.engine.negotiation.clone());

        window.request_redraw();
        self.gpu = GpuState::Negotiating { window, negotiator };
        Ok(())
    }

    /// Polls negotiation; on success configures the renderer.
    fn poll_negotiation(&mut self) -> Result<()> {
        let GpuState::Negotiating { negotiator, .. } = &mut self.gpu else {
            return Ok(());
        };

        let negotiated = match negotiator.poll() {
            Poll::Pending => return Ok(()),
            Poll::Ready(result) => result.context("GPU negotiation failed")?,
        };

        let GpuState::Negotiating { window, negotiator } =
            std::mem::replace(&mut self.gpu, GpuState::Idle)
        else {
            return Ok(());
        };

        let size = Viewport::of_window(&window).pixel_size();
        let gpu = Gpu::new(negotiated, negotiator.into_backend(), size, &self.engine.surface)
            .context("failed to configure the GPU surface")?;
        let renderer = Box::new(Renderer::configure(gpu, &self.engine.scene));

        self.clock.reset();
        window.request_redraw();
        self.gpu = GpuState::Ready { window, renderer };
        Ok(())
    }

    fn redraw(&mut self) -> Result<AppControl> {
        if matches!(self.gpu, GpuState::Negotiating { .. }) {
            self.poll_negotiation()?;
        }

        let phase = self.gpu.phase();
        let GpuState::Ready { renderer, .. } = &mut self.gpu else {
            return Ok(AppControl::Continue);
        };

        let health = renderer.gpu().health();
        anyhow::ensure!(!health.is_lost(), "GPU device lost");

        let ctx = FrameCtx {
            time: self.clock.tick(),
            size: renderer.gpu().size(),
            last_outcome: self.last_outcome,
            phase,
            uncaptured_errors: health.uncaptured_errors(),
            shader_errors: renderer.shader_errors(),
        };
        if self.app.on_frame(&ctx) == AppControl::Exit {
            return Ok(AppControl::Exit);
        }

        let drag = self.drag.take_rotation();
        let outcome = renderer.render(drag, self.app.overlay())?;
        if outcome == FrameOutcome::Skipped && self.last_outcome != Some(FrameOutcome::Skipped) {
            log::debug!("frame skipped");
        }
        self.last_outcome = Some(outcome);

        Ok(AppControl::Continue)
    }

    fn resize(&mut self) {
        if let GpuState::Ready { window, renderer } = &mut self.gpu {
            renderer.resize(Viewport::of_window(window).pixel_size());
            window.request_redraw();
        }
    }
}

impl<A: App + 'static> ApplicationHandler for AppState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !matches!(self.gpu, GpuState::Idle) {
            return;
        }

        if let Err(e) = self.start(event_loop) {
            self.fail(event_loop, e.context("failed to start the renderer"));
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.fatal.is_some() {
            event_loop.exit();
            return;
        }

        // Continuous redraw: the scene animates every tick.
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(window) = self.gpu.window() {
            window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.fatal.is_some() {
            event_loop.exit();
            return;
        }

        self.drag.handle_event(&event);

        if self.app.on_window_event(&event) == AppControl::Exit {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.gpu = GpuState::Idle;
                event_loop.exit();
            }

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => self.resize(),

            WindowEvent::RedrawRequested => match self.redraw() {
                Ok(AppControl::Continue) => {}
                Ok(AppControl::Exit) => event_loop.exit(),
                Err(e) => self.fail(event_loop, e),
            },

            _ => {}
        }
    }
}
