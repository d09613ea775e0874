//! Application runner and event loop.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use trigon_gpu::shader::load_spirv;
use trigon_gpu::{RenderContext, RenderContextBuilder};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::config::AppConfig;
use crate::frame::{draw_frame, FrameOutcome};

/// Run the renderer until the window is closed.
///
/// Initializes logging, creates the window and render context, then drives
/// the frame loop from redraw events.
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("{} starting...", config.title);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut runner = AppRunner {
        config,
        state: None,
    };
    event_loop.run_app(&mut runner)?;

    Ok(())
}

/// Internal application runner implementing winit's handler trait.
struct AppRunner {
    config: AppConfig,
    state: Option<AppState>,
}

struct AppState {
    window: Arc<Window>,
    ctx: RenderContext,
    frame_count: u64,
}

impl ApplicationHandler for AppRunner {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match self.create_state(event_loop) {
            Ok(state) => {
                self.state = Some(state);
                info!("Render context ready");
            }
            Err(e) => {
                error!("Failed to initialize renderer: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested");
                if let Some(mut state) = self.state.take() {
                    // SAFETY: No further frames are submitted after this.
                    unsafe { state.ctx.teardown() };
                    info!("Rendered {} frames", state.frame_count);
                }
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let Some(state) = &mut self.state else { return };

                match draw_frame(&state.ctx) {
                    Ok(FrameOutcome::Presented) => {
                        state.frame_count += 1;
                    }
                    Ok(FrameOutcome::OutOfDate) => {
                        // The swapchain is fixed-size; there is nothing to
                        // rebuild, so just keep going.
                        warn!("Presentation chain out of date, frame skipped");
                    }
                    Err(e) => {
                        error!("Frame failed: {e}");
                        event_loop.exit();
                        return;
                    }
                }

                state.window.request_redraw();
            }
            WindowEvent::Resized(size) => {
                // The window is created non-resizable and the swapchain is
                // fixed-size for its whole lifetime.
                debug!("Ignoring resize to {}x{}", size.width, size.height);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }
}

impl AppRunner {
    fn create_state(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<AppState> {
        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_resizable(false);
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let vertex_spirv = load_spirv(&self.config.vertex_shader)?;
        let fragment_spirv = load_spirv(&self.config.fragment_shader)?;

        let ctx = RenderContextBuilder::new()
            .app_name(&self.config.title)
            .fallback_extent(self.config.width, self.config.height)
            .diagnostics(self.config.diagnostics)
            .shaders(vertex_spirv, fragment_spirv)
            .build(window.as_ref())?;

        Ok(AppState {
            window,
            ctx,
            frame_count: 0,
        })
    }
}
